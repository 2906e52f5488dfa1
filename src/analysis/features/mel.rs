// Mel module - triangular filter bank over the one-sided power spectrum
//
// Band edges are spaced evenly on the mel scale between MEL_FMIN_HZ and
// Nyquist, mapped back to Hz and then to FFT bins. Each band is a triangle
// rising from bin b0 to b1 and falling from b1 to b2. The table is built
// once and never mutated.

/// Lower edge of the first band in Hz
pub const MEL_FMIN_HZ: f32 = 300.0;

/// Added to every band energy before the log so silence stays finite
pub const LOG_FLOOR_EPSILON: f32 = 1e-10;

#[inline]
pub fn hz_to_mel(hz: f32) -> f32 {
    2595.0 * (1.0 + hz / 700.0).log10()
}

#[inline]
pub fn mel_to_hz(mel: f32) -> f32 {
    700.0 * (10f32.powf(mel / 2595.0) - 1.0)
}

/// Row-major `num_bands x (fft_size/2 + 1)` triangular weights
#[derive(Debug, Clone)]
pub struct MelFilterBank {
    num_bands: usize,
    num_bins: usize,
    edges_hz: Vec<f32>,
    bins: Vec<usize>,
    weights: Vec<f32>,
}

impl MelFilterBank {
    /// Build the filter bank.
    ///
    /// Callers validate that `sample_rate_hz / 2 > MEL_FMIN_HZ` and that
    /// `num_bands > 0`; see `FeatureConfig::validate`.
    pub fn new(sample_rate_hz: u32, fft_size: usize, num_bands: usize) -> Self {
        let num_bins = fft_size / 2 + 1;
        let sr = sample_rate_hz as f32;
        let mel_min = hz_to_mel(MEL_FMIN_HZ);
        let mel_max = hz_to_mel(sr * 0.5);

        let edges_hz: Vec<f32> = (0..num_bands + 2)
            .map(|i| {
                let mel = mel_min + (mel_max - mel_min) * i as f32 / (num_bands + 1) as f32;
                mel_to_hz(mel)
            })
            .collect();

        let bins: Vec<usize> = edges_hz
            .iter()
            .map(|&hz| {
                let bin = (fft_size as f32 * hz / sr).floor();
                (bin.max(0.0) as usize).min(num_bins - 1)
            })
            .collect();

        let mut weights = vec![0.0f32; num_bands * num_bins];
        for m in 0..num_bands {
            let (b0, b1, b2) = (bins[m], bins[m + 1], bins[m + 2]);
            let row = &mut weights[m * num_bins..(m + 1) * num_bins];
            // Empty ranges when adjacent edges collapse onto one bin.
            for (k, w) in row.iter_mut().enumerate().take(b1).skip(b0) {
                *w = (k - b0) as f32 / (b1 - b0) as f32;
            }
            for (k, w) in row.iter_mut().enumerate().take(b2).skip(b1) {
                *w = (b2 - k) as f32 / (b2 - b1) as f32;
            }
        }

        Self {
            num_bands,
            num_bins,
            edges_hz,
            bins,
            weights,
        }
    }

    pub fn num_bands(&self) -> usize {
        self.num_bands
    }

    /// Spectrum length this bank expects
    pub fn num_bins(&self) -> usize {
        self.num_bins
    }

    /// The `num_bands + 2` edge frequencies in Hz
    pub fn edges_hz(&self) -> &[f32] {
        &self.edges_hz
    }

    /// The `num_bands + 2` edge bins after clamping
    pub fn bins(&self) -> &[usize] {
        &self.bins
    }

    /// Weights of band `m` over every bin
    pub fn weights(&self, m: usize) -> &[f32] {
        &self.weights[m * self.num_bins..(m + 1) * self.num_bins]
    }

    /// Half-open bin range `[b0, b2)` where band `m` can be non-zero
    pub fn support(&self, m: usize) -> std::ops::Range<usize> {
        self.bins[m]..self.bins[m + 2]
    }

    /// Log band energies: `out[m] = ln(sum_k power[k] * w[m][k] + 1e-10)`
    pub fn apply(&self, power: &[f32], out: &mut [f32]) {
        debug_assert_eq!(power.len(), self.num_bins);
        debug_assert_eq!(out.len(), self.num_bands);
        for (m, dst) in out.iter_mut().enumerate() {
            let energy: f32 = self
                .weights(m)
                .iter()
                .zip(power.iter())
                .map(|(w, p)| w * p)
                .sum();
            *dst = (energy + LOG_FLOOR_EPSILON).ln();
        }
    }
}
