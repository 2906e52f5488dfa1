// Capture error types and constants

use crate::error::ErrorCode;
use log::error;
use std::fmt;

/// Capture error code constants
///
/// Error code range: 1001-1006
pub struct CaptureErrorCodes;

impl CaptureErrorCodes {
    /// Sample rate of zero was requested
    pub const SAMPLE_RATE_INVALID: i32 = 1001;

    /// The periodic timer is already armed
    pub const TIMER_ALREADY_ARMED: i32 = 1002;

    /// The periodic timer could not be armed
    pub const TIMER_ARM_FAILED: i32 = 1003;

    /// Failed to open an input stream
    pub const STREAM_OPEN_FAILED: i32 = 1004;

    /// Hardware or host audio error
    pub const HARDWARE_ERROR: i32 = 1005;

    /// Recorded audio could not be read
    pub const RECORDING_READ_FAILED: i32 = 1006;
}

/// Log a capture error with structured context
///
/// The logging is non-blocking and will not panic on failure.
pub fn log_capture_error(err: &CaptureError, context: &str) {
    error!(
        "Capture error in {}: code={}, component=SampleSource, message={}",
        context,
        err.code(),
        err.message()
    );
}

/// Errors raised while bringing up the sampling side of the pipeline
///
/// All of these are fatal at startup: there is no degraded mode.
#[derive(Debug, Clone, PartialEq)]
pub enum CaptureError {
    /// Sample rate must be greater than zero
    SampleRateInvalid { sample_rate_hz: u32 },

    /// The timer already drives a sampler
    TimerAlreadyArmed,

    /// The timer could not be started
    TimerArmFailed { reason: String },

    /// Failed to open an input stream
    StreamOpenFailed { reason: String },

    /// Host audio error
    HardwareError { details: String },

    /// Recording could not be opened or decoded
    RecordingReadFailed { reason: String },
}

impl ErrorCode for CaptureError {
    fn code(&self) -> i32 {
        match self {
            CaptureError::SampleRateInvalid { .. } => CaptureErrorCodes::SAMPLE_RATE_INVALID,
            CaptureError::TimerAlreadyArmed => CaptureErrorCodes::TIMER_ALREADY_ARMED,
            CaptureError::TimerArmFailed { .. } => CaptureErrorCodes::TIMER_ARM_FAILED,
            CaptureError::StreamOpenFailed { .. } => CaptureErrorCodes::STREAM_OPEN_FAILED,
            CaptureError::HardwareError { .. } => CaptureErrorCodes::HARDWARE_ERROR,
            CaptureError::RecordingReadFailed { .. } => CaptureErrorCodes::RECORDING_READ_FAILED,
        }
    }

    fn message(&self) -> String {
        match self {
            CaptureError::SampleRateInvalid { sample_rate_hz } => {
                format!("Sample rate must be greater than 0 (got {})", sample_rate_hz)
            }
            CaptureError::TimerAlreadyArmed => {
                "Sampling timer already armed. Disarm it first.".to_string()
            }
            CaptureError::TimerArmFailed { reason } => {
                format!("Failed to arm sampling timer: {}", reason)
            }
            CaptureError::StreamOpenFailed { reason } => {
                format!("Failed to open input stream: {}", reason)
            }
            CaptureError::HardwareError { details } => {
                format!("Hardware error: {}", details)
            }
            CaptureError::RecordingReadFailed { reason } => {
                format!("Failed to read recording: {}", reason)
            }
        }
    }
}

impl fmt::Display for CaptureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "CaptureError::{:?} (code {}): {}",
            self,
            self.code(),
            self.message()
        )
    }
}

impl std::error::Error for CaptureError {}

impl From<std::io::Error> for CaptureError {
    fn from(err: std::io::Error) -> Self {
        CaptureError::HardwareError {
            details: err.to_string(),
        }
    }
}

impl From<hound::Error> for CaptureError {
    fn from(err: hound::Error) -> Self {
        CaptureError::RecordingReadFailed {
            reason: err.to_string(),
        }
    }
}
