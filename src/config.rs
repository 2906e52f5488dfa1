//! Configuration management for the feature front-end
//!
//! All parameters are fixed once the pipeline is built. They can be loaded
//! from a JSON file so a bench setup can try other frame/hop/band layouts
//! without recompiling; anything missing or malformed falls back to the
//! reference layout (16 kHz, 25 ms frames, 10 ms hop, 512-point FFT,
//! 32 mel bands, 13 coefficients).

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::analysis::features::{FftBackendKind, MEL_FMIN_HZ};
use crate::audio::WaitStrategy;
use crate::error::ConfigError;

/// Complete application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub features: FeatureConfig,
    #[serde(default)]
    pub capture: CaptureConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

/// MFCC extraction parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureConfig {
    /// Sampling rate in Hz
    pub sample_rate_hz: u32,
    /// Analysis window length in samples
    pub frame_len_samples: usize,
    /// Stride between consecutive windows in samples
    pub hop_len_samples: usize,
    /// FFT length (power of two, at least the frame length)
    pub fft_size: usize,
    /// Number of triangular mel filters
    pub num_mel_bands: usize,
    /// Number of cepstral coefficients per feature vector
    pub num_mfcc: usize,
    /// First-order pre-emphasis coefficient
    pub pre_emphasis: f32,
    /// FFT implementation used by the spectral engine
    pub fft_backend: FftBackendKind,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            sample_rate_hz: 16_000,
            // 25 ms window, 10 ms hop at 16 kHz
            frame_len_samples: 400,
            hop_len_samples: 160,
            fft_size: 512,
            num_mel_bands: 32,
            num_mfcc: 13,
            pre_emphasis: 0.97,
            fft_backend: FftBackendKind::Radix2,
        }
    }
}

impl FeatureConfig {
    /// Reject parameter combinations the pipeline cannot honour.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sample_rate_hz == 0 {
            return Err(ConfigError::SampleRateInvalid {
                sample_rate_hz: self.sample_rate_hz,
            });
        }
        if self.fft_size < 2 || !self.fft_size.is_power_of_two() {
            return Err(ConfigError::FftSizeNotPowerOfTwo {
                fft_size: self.fft_size,
            });
        }
        if self.frame_len_samples < 2 || self.frame_len_samples > self.fft_size {
            return Err(ConfigError::FrameExceedsFft {
                frame_len: self.frame_len_samples,
                fft_size: self.fft_size,
            });
        }
        if self.hop_len_samples == 0 || self.hop_len_samples > self.frame_len_samples {
            return Err(ConfigError::HopInvalid {
                hop_len: self.hop_len_samples,
                frame_len: self.frame_len_samples,
            });
        }
        if self.num_mel_bands == 0 {
            return Err(ConfigError::MelBandsInvalid {
                num_mel_bands: self.num_mel_bands,
            });
        }
        if self.num_mfcc == 0 || self.num_mfcc > self.num_mel_bands {
            return Err(ConfigError::MfccCountInvalid {
                num_mfcc: self.num_mfcc,
                num_mel_bands: self.num_mel_bands,
            });
        }
        let nyquist_hz = self.sample_rate_hz as f32 * 0.5;
        if nyquist_hz <= MEL_FMIN_HZ {
            return Err(ConfigError::NyquistBelowMelFloor {
                nyquist_hz,
                floor_hz: MEL_FMIN_HZ,
            });
        }
        if !(0.0..1.0).contains(&self.pre_emphasis) {
            return Err(ConfigError::PreEmphasisInvalid {
                coefficient: self.pre_emphasis,
            });
        }
        Ok(())
    }

    /// Milliseconds covered by one hop.
    pub fn hop_duration_ms(&self) -> f64 {
        self.hop_len_samples as f64 * 1000.0 / self.sample_rate_hz as f64
    }
}

/// Sampling side parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Ring buffer capacity in samples (power of two)
    pub ring_capacity: usize,
    /// How the consumer waits for samples
    pub wait_strategy: WaitStrategy,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            ring_capacity: 8192,
            wait_strategy: WaitStrategy::Spin,
        }
    }
}

impl CaptureConfig {
    /// The ring must hold a whole frame with one slot to spare.
    pub fn validate(&self, frame_len: usize) -> Result<(), ConfigError> {
        if !self.ring_capacity.is_power_of_two() || self.ring_capacity <= frame_len {
            return Err(ConfigError::RingCapacityInvalid {
                capacity: self.ring_capacity,
                frame_len,
            });
        }
        Ok(())
    }
}

/// Logging cadence for the extraction loop
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    /// Log a hop summary every N hops (0 disables)
    pub log_every_n_hops: u64,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_every_n_hops: 100,
        }
    }
}

impl AppConfig {
    /// Validate every section.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.features.validate()?;
        self.capture.validate(self.features.frame_len_samples)
    }

    /// Load configuration from JSON file
    ///
    /// # Returns
    /// The parsed configuration, or defaults if the file doesn't exist or
    /// the JSON is invalid. Validation is left to the caller.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Self {
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(config) => {
                    log::info!("[Config] Loaded configuration from {:?}", path.as_ref());
                    config
                }
                Err(err) => {
                    log::warn!(
                        "[Config] Failed to parse JSON from {:?}: {}. Using defaults.",
                        path.as_ref(),
                        err
                    );
                    Self::default()
                }
            },
            Err(err) => {
                log::warn!(
                    "[Config] Failed to read config file {:?}: {}. Using defaults.",
                    path.as_ref(),
                    err
                );
                Self::default()
            }
        }
    }
}
