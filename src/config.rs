use std::net::SocketAddr;
use std::path::PathBuf;

use crate::error::ApiError;

/// Process configuration, read once at startup from the environment.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub bind_addr: SocketAddr,
    pub media_root: PathBuf,
}

impl Config {
    pub fn from_env() -> Result<Self, ApiError> {
        let database_url = std::env::var("DATABASE_URL")
            .map_err(|_| ApiError::Config(String::from("DATABASE_URL must be set")))?;

        let bind_addr = std::env::var("BIND_ADDR")
            .unwrap_or_else(|_| String::from("127.0.0.1:8080"))
            .parse()
            .map_err(|e| ApiError::Config(format!("Invalid BIND_ADDR: {e}")))?;

        let media_root = std::env::var("MEDIA_ROOT")
            .unwrap_or_else(|_| String::from("media"))
            .into();

        Ok(Self {
            database_url,
            bind_addr,
            media_root,
        })
    }
}
