// MfccPipeline - frame to MFCC vector
//
// Module organization:
// - fft: FFT backends (radix-2 reference, rustfft)
// - spectral: pre-emphasis, Hamming window, zero pad, power spectrum
// - mel: triangular mel filter bank and log compression
// - dct: orthonormal DCT-II
// - types: FeatureVector
// - mod.rs: Coordinator (MfccPipeline)
//
// All tables are built once in `MfccPipeline::new`. Per-hop work reuses the
// same scratch buffers and never allocates.

pub mod dct;
pub mod fft;
pub mod mel;
pub mod spectral;
mod types;

pub use dct::DctMatrix;
pub use fft::{make_backend, FftBackend, FftBackendKind, Radix2Fft, RustFftBackend};
pub use mel::{MelFilterBank, LOG_FLOOR_EPSILON, MEL_FMIN_HZ};
pub use spectral::SpectralEngine;
pub use types::FeatureVector;

use crate::config::FeatureConfig;
use crate::error::{log_config_error, ConfigError};

/// Owns the immutable tables and the scratch space for one hop.
pub struct MfccPipeline {
    config: FeatureConfig,
    spectral: SpectralEngine,
    mel: MelFilterBank,
    dct: DctMatrix,
    log_mel: Vec<f32>,
    mfcc: Vec<f32>,
}

impl MfccPipeline {
    /// Validate `config` and build the window, filter bank and DCT tables.
    ///
    /// # Errors
    /// Returns the first configuration rule `config` breaks
    pub fn new(config: &FeatureConfig) -> Result<Self, ConfigError> {
        if let Err(err) = config.validate() {
            log_config_error(&err, "MfccPipeline::new");
            return Err(err);
        }

        let fft = make_backend(config.fft_backend, config.fft_size);
        let spectral = SpectralEngine::new(config.frame_len_samples, config.pre_emphasis, fft);
        let mel = MelFilterBank::new(config.sample_rate_hz, config.fft_size, config.num_mel_bands);
        let dct = DctMatrix::new(config.num_mfcc, config.num_mel_bands);

        tracing::debug!(
            "[MfccPipeline] Tables ready: frame={} fft={} mels={} mfcc={} backend={:?}",
            config.frame_len_samples,
            config.fft_size,
            config.num_mel_bands,
            config.num_mfcc,
            config.fft_backend
        );

        Ok(Self {
            config: config.clone(),
            spectral,
            mel,
            dct,
            log_mel: vec![0.0; config.num_mel_bands],
            mfcc: vec![0.0; config.num_mfcc],
        })
    }

    pub fn config(&self) -> &FeatureConfig {
        &self.config
    }

    pub fn filter_bank(&self) -> &MelFilterBank {
        &self.mel
    }

    pub fn dct(&self) -> &DctMatrix {
        &self.dct
    }

    /// Log mel energies of the last computed frame
    pub fn log_mel(&self) -> &[f32] {
        &self.log_mel
    }

    /// Compute the MFCCs of one `frame_len` frame.
    ///
    /// The returned slice is overwritten by the next call.
    pub fn compute(&mut self, pcm: &[i16]) -> &[f32] {
        let power = self.spectral.power_spectrum(pcm);
        self.mel.apply(power, &mut self.log_mel);
        self.dct.apply(&self.log_mel, &mut self.mfcc);
        &self.mfcc
    }

    /// Compute one frame and wrap it with its stream position.
    pub fn extract(&mut self, pcm: &[i16], hop_index: u64, timestamp_ms: u64) -> FeatureVector {
        let coefficients = self.compute(pcm).to_vec();
        FeatureVector {
            coefficients,
            hop_index,
            timestamp_ms,
        }
    }
}
