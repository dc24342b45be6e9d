use std::error::Error;
use std::fmt;
use std::sync::PoisonError;

use crate::constants::{FOREIGN_KEY_VIOLATION_CODE, UNIQUE_VIOLATION_CODE};
use crate::validation::WordError;

#[derive(Debug, Clone, PartialEq)]
pub enum OneWordError {
    // Input errors
    InvalidWord(WordError),
    InvalidInput(String),

    // Rate limiting
    RateLimited { retry_after_secs: u64 },

    // Remote write errors
    ConstraintViolation { code: String, message: String },
    WriteFailed { code: Option<String>, message: String },
    NotFound(String),

    // Object storage errors
    UploadFailed(String),

    // Auth errors
    AuthError(String),
    Unauthorized,
    Forbidden,

    // Local state errors
    StateLock(String),

    // Configuration errors
    ConfigError(String),
}

impl OneWordError {
    /// Classify a backend rejection by its error code
    pub fn from_backend(code: Option<&str>, message: impl Into<String>) -> Self {
        let message = message.into();
        match code {
            Some(code) if code == UNIQUE_VIOLATION_CODE || code == FOREIGN_KEY_VIOLATION_CODE => {
                Self::ConstraintViolation {
                    code: code.to_string(),
                    message,
                }
            }
            _ => Self::WriteFailed {
                code: code.map(str::to_string),
                message,
            },
        }
    }

    pub fn is_constraint_violation(&self) -> bool {
        matches!(self, Self::ConstraintViolation { .. })
    }

    pub fn is_unique_violation(&self) -> bool {
        matches!(self, Self::ConstraintViolation { code, .. } if code == UNIQUE_VIOLATION_CODE)
    }

    /// Inline text shown next to the control that triggered the error
    pub fn user_message(&self) -> String {
        match self {
            Self::InvalidWord(kind) => kind.message().to_string(),
            Self::InvalidInput(msg) => msg.clone(),
            Self::RateLimited { retry_after_secs } => {
                format!("Slow down. Try again in {}s.", retry_after_secs)
            }
            Self::ConstraintViolation { .. } => "Already done.".to_string(),
            Self::WriteFailed { .. } | Self::StateLock(_) => {
                "Something went wrong. Try again.".to_string()
            }
            Self::NotFound(_) => "Not found.".to_string(),
            Self::UploadFailed(msg) | Self::AuthError(msg) => msg.clone(),
            Self::Unauthorized => "Sign in first.".to_string(),
            Self::Forbidden => "You can't do that.".to_string(),
            Self::ConfigError(msg) => msg.clone(),
        }
    }
}

impl fmt::Display for OneWordError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidWord(kind) => write!(f, "Invalid word: {}", kind.message()),
            Self::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
            Self::RateLimited { retry_after_secs } => {
                write!(f, "Rate limited: retry after {}s", retry_after_secs)
            }
            Self::ConstraintViolation { code, message } => {
                write!(f, "Constraint violation ({}): {}", code, message)
            }
            Self::WriteFailed { code: Some(code), message } => {
                write!(f, "Write failed ({}): {}", code, message)
            }
            Self::WriteFailed { code: None, message } => write!(f, "Write failed: {}", message),
            Self::NotFound(what) => write!(f, "Not found: {}", what),
            Self::UploadFailed(msg) => write!(f, "Upload failed: {}", msg),
            Self::AuthError(msg) => write!(f, "Authentication error: {}", msg),
            Self::Unauthorized => write!(f, "Unauthorized access"),
            Self::Forbidden => write!(f, "Forbidden: insufficient permissions"),
            Self::StateLock(msg) => write!(f, "State lock error: {}", msg),
            Self::ConfigError(msg) => write!(f, "Configuration error: {}", msg),
        }
    }
}

impl Error for OneWordError {}

impl From<WordError> for OneWordError {
    fn from(kind: WordError) -> Self {
        OneWordError::InvalidWord(kind)
    }
}

impl<T> From<PoisonError<T>> for OneWordError {
    fn from(err: PoisonError<T>) -> Self {
        OneWordError::StateLock(format!("Mutex poisoned: {}", err))
    }
}

pub type Result<T> = std::result::Result<T, OneWordError>;
