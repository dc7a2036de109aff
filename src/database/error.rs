use thiserror::Error;
use warp::http::StatusCode;
use warp::reject::Reject;

/// Error surface of the whole SDK. Every database action, validator and
/// handler funnels into this taxonomy; the rejection recovery turns it into
/// a JSON reply with the matching status code.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{field}: {message}")]
    Validation { field: &'static str, message: String },
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    InvalidSession(String),
    #[error("{0}")]
    Query(String),
    #[error("{0}")]
    Config(String),
}

impl ApiError {
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Self::Validation {
            field,
            message: message.into(),
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation { .. } | Self::Conflict(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized(_) => StatusCode::FORBIDDEN,
            Self::InvalidSession(_) => StatusCode::UNAUTHORIZED,
            Self::Query(_) | Self::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl Reject for ApiError {}

impl From<sqlx::Error> for ApiError {
    fn from(value: sqlx::Error) -> Self {
        match value {
            sqlx::Error::Configuration(e) => Self::Query(format!("{e}")),
            sqlx::Error::Database(e) => Self::Query(format!("{e}")),
            sqlx::Error::Io(e) => Self::Query(format!("{e}")),
            sqlx::Error::Tls(e) => Self::Query(format!("{e}")),
            sqlx::Error::Protocol(e) => Self::Query(format!("{e}")),
            sqlx::Error::RowNotFound => Self::Query(String::from("RowNotFound")),
            sqlx::Error::TypeNotFound { type_name } => {
                Self::Query(format!("Type not found: {type_name}"))
            }
            sqlx::Error::ColumnIndexOutOfBounds { index, len } => {
                Self::Query(format!("Column index out of bounds {index} ({len})"))
            }
            sqlx::Error::ColumnNotFound(e) => Self::Query(format!("{e}")),
            sqlx::Error::ColumnDecode { index, source } => {
                Self::Query(format!("Column decode {index} ({source})"))
            }
            sqlx::Error::Decode(e) => Self::Query(format!("{e}")),
            sqlx::Error::AnyDriverError(e) => Self::Query(format!("{e}")),
            sqlx::Error::PoolTimedOut => Self::Query(String::from("Pool timed out")),
            sqlx::Error::PoolClosed => Self::Query(String::from("Pool closed")),
            sqlx::Error::WorkerCrashed => Self::Query(String::from("Worker crashed")),
            sqlx::Error::Migrate(e) => Self::Query(format!("{e}")),
            _ => Self::Query(String::from("Unknown error")),
        }
    }
}
