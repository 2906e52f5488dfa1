// Error types for the keyword-spotting front-end
//
// This module defines custom error types for capture and configuration,
// providing structured error handling with stable numeric codes so callers
// (CLI, supervising firmware) can branch on them without string matching.

mod capture;
mod config;

pub use capture::{log_capture_error, CaptureError, CaptureErrorCodes};
pub use config::{log_config_error, ConfigError, ConfigErrorCodes};

/// Error codes for structured error reporting
///
/// This trait provides a standard way to get error codes and messages
/// from custom error types.
pub trait ErrorCode {
    /// Get the numeric error code
    fn code(&self) -> i32;

    /// Get the human-readable error message
    fn message(&self) -> String;
}

/// Start-up failure of the whole front-end
///
/// Either the parameters were rejected before any table was built, or the
/// sampling side could not be brought up. Both are fatal.
#[derive(Debug, Clone, PartialEq)]
pub enum FrontEndError {
    Config(ConfigError),
    Capture(CaptureError),
}

impl ErrorCode for FrontEndError {
    fn code(&self) -> i32 {
        match self {
            FrontEndError::Config(err) => err.code(),
            FrontEndError::Capture(err) => err.code(),
        }
    }

    fn message(&self) -> String {
        match self {
            FrontEndError::Config(err) => err.message(),
            FrontEndError::Capture(err) => err.message(),
        }
    }
}

impl std::fmt::Display for FrontEndError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FrontEndError::Config(err) => write!(f, "{}", err),
            FrontEndError::Capture(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for FrontEndError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FrontEndError::Config(err) => Some(err),
            FrontEndError::Capture(err) => Some(err),
        }
    }
}

impl From<ConfigError> for FrontEndError {
    fn from(err: ConfigError) -> Self {
        FrontEndError::Config(err)
    }
}

impl From<CaptureError> for FrontEndError {
    fn from(err: CaptureError) -> Self {
        FrontEndError::Capture(err)
    }
}
