// Configuration error types and constants

use crate::error::ErrorCode;
use log::error;
use std::fmt;

/// Configuration error code constants
///
/// Error code range: 2001-2009
pub struct ConfigErrorCodes;

impl ConfigErrorCodes {
    pub const SAMPLE_RATE_INVALID: i32 = 2001;
    pub const FFT_SIZE_NOT_POWER_OF_TWO: i32 = 2002;
    pub const FRAME_EXCEEDS_FFT: i32 = 2003;
    pub const HOP_INVALID: i32 = 2004;
    pub const MEL_BANDS_INVALID: i32 = 2005;
    pub const MFCC_COUNT_INVALID: i32 = 2006;
    pub const NYQUIST_BELOW_MEL_FLOOR: i32 = 2007;
    pub const RING_CAPACITY_INVALID: i32 = 2008;
    pub const PRE_EMPHASIS_INVALID: i32 = 2009;
}

/// Log a configuration error with structured context
pub fn log_config_error(err: &ConfigError, context: &str) {
    error!(
        "Config error in {}: code={}, component=FeatureConfig, message={}",
        context,
        err.code(),
        err.message()
    );
}

/// Invalid combinations of feature-extraction parameters
///
/// These are rejected before any table is built.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    SampleRateInvalid { sample_rate_hz: u32 },
    FftSizeNotPowerOfTwo { fft_size: usize },
    FrameExceedsFft { frame_len: usize, fft_size: usize },
    HopInvalid { hop_len: usize, frame_len: usize },
    MelBandsInvalid { num_mel_bands: usize },
    MfccCountInvalid { num_mfcc: usize, num_mel_bands: usize },
    NyquistBelowMelFloor { nyquist_hz: f32, floor_hz: f32 },
    RingCapacityInvalid { capacity: usize, frame_len: usize },
    PreEmphasisInvalid { coefficient: f32 },
}

impl ErrorCode for ConfigError {
    fn code(&self) -> i32 {
        match self {
            ConfigError::SampleRateInvalid { .. } => ConfigErrorCodes::SAMPLE_RATE_INVALID,
            ConfigError::FftSizeNotPowerOfTwo { .. } => {
                ConfigErrorCodes::FFT_SIZE_NOT_POWER_OF_TWO
            }
            ConfigError::FrameExceedsFft { .. } => ConfigErrorCodes::FRAME_EXCEEDS_FFT,
            ConfigError::HopInvalid { .. } => ConfigErrorCodes::HOP_INVALID,
            ConfigError::MelBandsInvalid { .. } => ConfigErrorCodes::MEL_BANDS_INVALID,
            ConfigError::MfccCountInvalid { .. } => ConfigErrorCodes::MFCC_COUNT_INVALID,
            ConfigError::NyquistBelowMelFloor { .. } => ConfigErrorCodes::NYQUIST_BELOW_MEL_FLOOR,
            ConfigError::RingCapacityInvalid { .. } => ConfigErrorCodes::RING_CAPACITY_INVALID,
            ConfigError::PreEmphasisInvalid { .. } => ConfigErrorCodes::PRE_EMPHASIS_INVALID,
        }
    }

    fn message(&self) -> String {
        match self {
            ConfigError::SampleRateInvalid { sample_rate_hz } => {
                format!("Sample rate must be greater than 0 (got {})", sample_rate_hz)
            }
            ConfigError::FftSizeNotPowerOfTwo { fft_size } => {
                format!("FFT size must be a power of two (got {})", fft_size)
            }
            ConfigError::FrameExceedsFft {
                frame_len,
                fft_size,
            } => format!(
                "Frame length {} exceeds FFT size {}",
                frame_len, fft_size
            ),
            ConfigError::HopInvalid { hop_len, frame_len } => format!(
                "Hop length must be in 1..={} (got {})",
                frame_len, hop_len
            ),
            ConfigError::MelBandsInvalid { num_mel_bands } => {
                format!("Mel band count must be greater than 0 (got {})", num_mel_bands)
            }
            ConfigError::MfccCountInvalid {
                num_mfcc,
                num_mel_bands,
            } => format!(
                "MFCC count must be in 1..={} (got {})",
                num_mel_bands, num_mfcc
            ),
            ConfigError::NyquistBelowMelFloor {
                nyquist_hz,
                floor_hz,
            } => format!(
                "Nyquist frequency {} Hz must exceed the mel floor of {} Hz",
                nyquist_hz, floor_hz
            ),
            ConfigError::RingCapacityInvalid {
                capacity,
                frame_len,
            } => format!(
                "Ring capacity must be a power of two greater than the frame length {} (got {})",
                frame_len, capacity
            ),
            ConfigError::PreEmphasisInvalid { coefficient } => {
                format!("Pre-emphasis coefficient must be in [0, 1) (got {})", coefficient)
            }
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ConfigError::{:?} (code {}): {}",
            self,
            self.code(),
            self.message()
        )
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_codes_are_distinct() {
        let errors = [
            ConfigError::SampleRateInvalid { sample_rate_hz: 0 },
            ConfigError::FftSizeNotPowerOfTwo { fft_size: 500 },
            ConfigError::FrameExceedsFft {
                frame_len: 600,
                fft_size: 512,
            },
            ConfigError::HopInvalid {
                hop_len: 0,
                frame_len: 400,
            },
            ConfigError::MelBandsInvalid { num_mel_bands: 0 },
            ConfigError::MfccCountInvalid {
                num_mfcc: 40,
                num_mel_bands: 32,
            },
            ConfigError::NyquistBelowMelFloor {
                nyquist_hz: 250.0,
                floor_hz: 300.0,
            },
            ConfigError::RingCapacityInvalid {
                capacity: 100,
                frame_len: 400,
            },
            ConfigError::PreEmphasisInvalid { coefficient: 1.5 },
        ];

        let mut codes: Vec<i32> = errors.iter().map(|e| e.code()).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), errors.len());
        assert!(codes.iter().all(|c| (2001..=2009).contains(c)));
    }

    #[test]
    fn test_config_error_message() {
        let err = ConfigError::FftSizeNotPowerOfTwo { fft_size: 500 };
        assert_eq!(err.message(), "FFT size must be a power of two (got 500)");
        assert!(format!("{}", err).contains("2002"));
    }
}
