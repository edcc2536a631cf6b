use serde::{Deserialize, Serialize};

use crate::types::ErrorBody;

/// Client-side error codes following the backend's E{area}{sequence} pattern.
///
/// Ranges:
/// - E0xxx: Shared/infrastructure errors
/// - E5xxx: Notification errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCode {
    // Shared (E0xxx)
    InternalError,
    ValidationError,
    NotFound,
    Unauthorized,
    Forbidden,
    RateLimited,
    ServiceUnavailable,
    BadRequest,

    // Notification (E5xxx)
    NotificationNotFound,
    SyncTransportFailed,
    SyncRejected,
    SyncDecodeFailed,
    InvalidEndpoint,
}

impl ErrorCode {
    pub fn code(&self) -> &'static str {
        match self {
            // Shared
            Self::InternalError => "E0001",
            Self::ValidationError => "E0002",
            Self::NotFound => "E0003",
            Self::Unauthorized => "E0004",
            Self::Forbidden => "E0005",
            Self::RateLimited => "E0006",
            Self::ServiceUnavailable => "E0007",
            Self::BadRequest => "E0008",

            // Notification
            Self::NotificationNotFound => "E5001",
            Self::SyncTransportFailed => "E5002",
            Self::SyncRejected => "E5003",
            Self::SyncDecodeFailed => "E5004",
            Self::InvalidEndpoint => "E5005",
        }
    }

    /// Best-effort classification of a non-2xx HTTP status.
    pub fn from_status(status: u16) -> Self {
        match status {
            400 => Self::BadRequest,
            401 => Self::Unauthorized,
            403 => Self::Forbidden,
            404 => Self::NotFound,
            422 => Self::ValidationError,
            429 => Self::RateLimited,
            502..=504 => Self::ServiceUnavailable,
            _ => Self::InternalError,
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("server responded {status}: {message}")]
    Status {
        status: u16,
        code: Option<String>,
        message: String,
    },

    #[error("server rejected request: {0}")]
    Rejected(String),

    #[error("malformed response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("invalid endpoint url: {0}")]
    InvalidUrl(String),
}

impl ClientError {
    /// Build a `Status` error from a non-2xx response body. Bodies that are
    /// not a recognizable error envelope fall back to the raw text.
    pub fn from_response(status: u16, body: &[u8]) -> Self {
        match serde_json::from_slice::<ErrorBody>(body) {
            Ok(parsed) => {
                let (code, message) = parsed.into_parts();
                Self::Status { status, code, message }
            }
            Err(_) => {
                let text = String::from_utf8_lossy(body).trim().to_string();
                let message = if text.is_empty() {
                    format!("HTTP {status}")
                } else {
                    text
                };
                Self::Status {
                    status,
                    code: None,
                    message,
                }
            }
        }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Transport(_) => ErrorCode::SyncTransportFailed,
            Self::Status { status, code, .. } => {
                if code.as_deref() == Some(ErrorCode::NotificationNotFound.code()) {
                    ErrorCode::NotificationNotFound
                } else {
                    ErrorCode::from_status(*status)
                }
            }
            Self::Rejected(_) => ErrorCode::SyncRejected,
            Self::Decode(_) => ErrorCode::SyncDecodeFailed,
            Self::InvalidUrl(_) => ErrorCode::InvalidEndpoint,
        }
    }

    /// Whether retrying the same call later could plausibly succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(_) => true,
            Self::Status { status, .. } => *status == 429 || *status >= 500,
            Self::Rejected(_) | Self::Decode(_) | Self::InvalidUrl(_) => false,
        }
    }
}

pub type ClientResult<T> = Result<T, ClientError>;
