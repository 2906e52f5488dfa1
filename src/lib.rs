// KWS Front-End - MFCC feature extraction for keyword spotting
// Timer-driven 12-bit sampling into a lock-free ring, sliding frames,
// pre-emphasis, Hamming window, radix-2 FFT, mel filter bank, DCT-II.

// Module declarations
pub mod analysis;
pub mod audio;
pub mod config;
pub mod error;
pub mod telemetry;

// Re-exports for convenience
pub use analysis::features::{FeatureVector, MfccPipeline};
pub use analysis::sink::{BroadcastSink, FeatureSink, QueueSink};
pub use analysis::{replay_samples, spawn_extraction_thread, ExtractionStats, FrontEnd};
pub use config::{AppConfig, CaptureConfig, FeatureConfig, TelemetryConfig};
pub use error::{CaptureError, ConfigError, ErrorCode, FrontEndError};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_module_structure() {
        // Verify public API surface resolves
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert!(MfccPipeline::new(&config.features).is_ok());
    }
}
