// Spectral module - PCM frame to one-sided power spectrum
//
// Steps per frame:
// 1. Normalise to [-1, 1), pre-emphasise, multiply by the Hamming window
// 2. Zero pad to the FFT size
// 3. Forward FFT through the configured backend
// 4. |X[k]|^2 for k in 0..=fft_size/2
//
// The pre-emphasis filter state starts at zero for every frame, so
// overlapping frames see the same first sample treatment.

use std::f32::consts::PI;

use super::fft::FftBackend;

/// `w[n] = 0.54 - 0.46 * cos(2*pi*n / (N - 1))`
pub fn hamming_window(len: usize) -> Vec<f32> {
    if len < 2 {
        return vec![1.0; len];
    }
    let denom = (len - 1) as f32;
    (0..len)
        .map(|n| 0.54 - 0.46 * (2.0 * PI * n as f32 / denom).cos())
        .collect()
}

pub struct SpectralEngine {
    window: Vec<f32>,
    pre_emphasis: f32,
    fft: Box<dyn FftBackend>,
    re: Vec<f32>,
    im: Vec<f32>,
    power: Vec<f32>,
}

impl SpectralEngine {
    /// # Arguments
    /// * `frame_len` - Samples per frame, at most the FFT length
    /// * `pre_emphasis` - First-order high-pass coefficient
    /// * `fft` - Transform sized to the zero-padded length
    pub fn new(frame_len: usize, pre_emphasis: f32, fft: Box<dyn FftBackend>) -> Self {
        let fft_size = fft.len();
        debug_assert!(frame_len <= fft_size);
        Self {
            window: hamming_window(frame_len),
            pre_emphasis,
            fft,
            re: vec![0.0; fft_size],
            im: vec![0.0; fft_size],
            power: vec![0.0; fft_size / 2 + 1],
        }
    }

    pub fn frame_len(&self) -> usize {
        self.window.len()
    }

    pub fn fft_size(&self) -> usize {
        self.re.len()
    }

    pub fn window(&self) -> &[f32] {
        &self.window
    }

    /// Compute the power spectrum of one frame. The returned slice has
    /// `fft_size/2 + 1` entries and is overwritten on the next call.
    pub fn power_spectrum(&mut self, pcm: &[i16]) -> &[f32] {
        debug_assert_eq!(pcm.len(), self.window.len());

        let mut prev = 0.0f32;
        for (n, (&s, &w)) in pcm.iter().zip(self.window.iter()).enumerate() {
            let x = s as f32 / 32768.0;
            let y = x - self.pre_emphasis * prev;
            prev = x;
            self.re[n] = y * w;
        }
        self.re[pcm.len()..].fill(0.0);
        self.im.fill(0.0);

        self.fft.forward(&mut self.re, &mut self.im);

        for (k, p) in self.power.iter_mut().enumerate() {
            let (r, i) = (self.re[k], self.im[k]);
            *p = r * r + i * i;
        }
        &self.power
    }
}
