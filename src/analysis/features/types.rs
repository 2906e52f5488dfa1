// Types module - data handed downstream once per hop

use serde::{Deserialize, Serialize};

/// One MFCC vector plus where in the stream it came from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    /// `num_mfcc` cepstral coefficients, c0 first
    pub coefficients: Vec<f32>,

    /// Zero-based hop counter since priming
    pub hop_index: u64,

    /// Stream time of the newest sample in the frame, in milliseconds
    ///
    /// Derived from the number of samples consumed, not from the wall clock,
    /// so offline replay and live capture agree.
    pub timestamp_ms: u64,
}

impl FeatureVector {
    pub fn len(&self) -> usize {
        self.coefficients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coefficients.is_empty()
    }
}
