//! Error taxonomy for panel operations.
//!
//! [`ApiError`] is what the HTTP client reports for a single request.
//! [`PanelError`] is what the dashboard controller surfaces to callers, and
//! decides how the session reacts:
//!
//! | Variant      | Session effect                          |
//! |--------------|-----------------------------------------|
//! | `Auth`       | forces `LoggedOut`                      |
//! | `Validation` | none, rejected before any request       |
//! | `Transport`  | none, transient and safe to retry       |
//! | `Server`     | none, message taken from the body       |

use thiserror::Error;

/// Failure of a single panel API request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// The server answered with a non-2xx status.
    #[error("{message} (HTTP {status})")]
    Status { status: u16, message: String },
    /// The request never got an HTTP answer (DNS, refused, timeout).
    #[error("connection error: {0}")]
    Transport(String),
    /// A 2xx answer whose body did not have the expected shape.
    #[error("unexpected response: {0}")]
    Decode(String),
}

impl ApiError {
    /// HTTP status for server-side failures, `None` for transport errors.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Transport(_) | Self::Decode(_) => None,
        }
    }
}

/// Error surfaced by dashboard operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PanelError {
    #[error("authentication failed: {0}")]
    Auth(String),
    #[error("{0}")]
    Validation(String),
    #[error("connection error: {0}")]
    Transport(String),
    #[error("{message}")]
    Server { status: u16, message: String },
}

impl PanelError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// HTTP status when the error came from a server answer.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Server { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Convert a failed login or validation request into an auth error,
    /// keeping transport failures distinct.
    pub fn auth_from(err: ApiError) -> Self {
        match err {
            ApiError::Status { message, .. } => Self::Auth(message),
            ApiError::Decode(message) => Self::Auth(message),
            ApiError::Transport(message) => Self::Transport(message),
        }
    }
}

impl From<ApiError> for PanelError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::Status { status, message } => Self::Server { status, message },
            ApiError::Transport(message) => Self::Transport(message),
            // A 2xx with a body we cannot read is still the server's answer.
            ApiError::Decode(message) => Self::Server {
                status: 200,
                message,
            },
        }
    }
}

/// Result alias for panel API requests.
pub type ApiResult<T> = Result<T, ApiError>;
