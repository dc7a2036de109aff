use std::path::Path;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use uuid::Uuid;

use crate::error::ApiError;

pub struct DecodedImage {
    pub extension: String,
    pub bytes: Vec<u8>,
}

/// Parses a `data:image/<ext>;base64,<payload>` URI into raw image bytes.
pub fn decode_data_uri(data: &str) -> Result<DecodedImage, ApiError> {
    let invalid = |message| ApiError::validation("image", message);

    let rest = data
        .strip_prefix("data:image/")
        .ok_or_else(|| invalid("Expected a data:image/<ext>;base64 URI"))?;
    let (extension, payload) = rest
        .split_once(";base64,")
        .ok_or_else(|| invalid("Expected a base64-encoded image payload"))?;

    if extension.is_empty() || !extension.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(invalid("Invalid image extension"));
    }

    let bytes = STANDARD
        .decode(payload)
        .map_err(|_| invalid("Invalid base64 payload"))?;

    Ok(DecodedImage {
        extension: extension.to_string(),
        bytes,
    })
}

/// Persists a decoded image under the media root with a fresh uuid filename
/// and returns the relative URL clients read it back from.
pub fn store_image(media_root: &Path, data: &str) -> Result<String, ApiError> {
    let image = decode_data_uri(data)?;
    let filename = format!("{}.{}", Uuid::new_v4(), image.extension);

    std::fs::create_dir_all(media_root)
        .map_err(|e| ApiError::Config(format!("Could not create media root: {e}")))?;
    std::fs::write(media_root.join(&filename), &image.bytes)
        .map_err(|e| ApiError::Config(format!("Could not store image: {e}")))?;

    Ok(format!("media/{filename}"))
}

/// Write-time image handling: data URIs are decoded and stored, anything
/// else is kept as-is (an already-stored reference on partial update).
pub fn resolve_image(media_root: &Path, value: &str) -> Result<String, ApiError> {
    if value.starts_with("data:image") {
        store_image(media_root, value)
    } else {
        Ok(value.to_string())
    }
}

/// Best-effort removal of a stored image, for when the recipe write it was
/// stored for fails afterwards. Only touches files under the media root.
pub fn discard_image(media_root: &Path, url: &str) {
    if let Some(filename) = url.strip_prefix("media/") {
        if let Err(e) = std::fs::remove_file(media_root.join(filename)) {
            log::warn!("Could not remove stored image {url}: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_png_data_uri() {
        let image = decode_data_uri("data:image/png;base64,aGVsbG8=").unwrap();
        assert_eq!(image.extension, "png");
        assert_eq!(image.bytes, b"hello");
    }

    #[test]
    fn rejects_non_image_uri() {
        assert!(decode_data_uri("data:text/plain;base64,aGk=").is_err());
        assert!(decode_data_uri("plain string").is_err());
    }

    #[test]
    fn rejects_broken_base64() {
        assert!(decode_data_uri("data:image/png;base64,###").is_err());
    }

    #[test]
    fn stores_image_and_returns_relative_url() {
        let dir = tempfile::tempdir().unwrap();
        let url = store_image(dir.path(), "data:image/jpeg;base64,aGVsbG8=").unwrap();

        assert!(url.starts_with("media/"));
        assert!(url.ends_with(".jpeg"));
        let filename = url.strip_prefix("media/").unwrap();
        assert_eq!(std::fs::read(dir.path().join(filename)).unwrap(), b"hello");
    }

    #[test]
    fn discarding_a_stored_image_removes_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let url = store_image(dir.path(), "data:image/png;base64,aGVsbG8=").unwrap();
        let filename = url.strip_prefix("media/").unwrap().to_string();
        assert!(dir.path().join(&filename).exists());

        discard_image(dir.path(), &url);
        assert!(!dir.path().join(&filename).exists());
    }

    #[test]
    fn discard_ignores_external_references() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("keep.png"), b"hello").unwrap();

        discard_image(dir.path(), "https://elsewhere.example/keep.png");
        discard_image(dir.path(), "keep.png");
        assert!(dir.path().join("keep.png").exists());
    }

    #[test]
    fn stored_reference_passes_through_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let url = resolve_image(dir.path(), "media/existing.png").unwrap();
        assert_eq!(url, "media/existing.png");
    }
}
