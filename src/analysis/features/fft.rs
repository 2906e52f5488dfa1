// FFT module - in-place complex transforms on split real/imaginary arrays
//
// The reference transform is an iterative radix-2 Cooley-Tukey FFT: a
// bit-reversal permutation followed by log2(N) butterfly stages with
// twiddles cos/sin(-2*pi*k/len). A rustfft-backed implementation is
// available behind the same trait for hosts where a planned FFT is faster.

use rustfft::{num_complex::Complex, Fft, FftPlanner};
use serde::{Deserialize, Serialize};
use std::f32::consts::PI;
use std::sync::Arc;

/// Which FFT implementation the spectral engine uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FftBackendKind {
    /// Hand-written radix-2 transform
    #[default]
    Radix2,
    /// rustfft planner
    #[serde(rename = "rustfft")]
    RustFft,
}

/// Forward complex FFT over split arrays of equal, fixed length
pub trait FftBackend: Send {
    /// Transform length
    fn len(&self) -> usize;

    /// In-place forward transform. Both slices must have length `len()`.
    fn forward(&mut self, re: &mut [f32], im: &mut [f32]);
}

/// Build the backend selected by configuration.
pub fn make_backend(kind: FftBackendKind, size: usize) -> Box<dyn FftBackend> {
    match kind {
        FftBackendKind::Radix2 => Box::new(Radix2Fft::new(size)),
        FftBackendKind::RustFft => Box::new(RustFftBackend::new(size)),
    }
}

/// Iterative radix-2 Cooley-Tukey FFT
#[derive(Debug, Clone)]
pub struct Radix2Fft {
    size: usize,
}

impl Radix2Fft {
    /// # Panics
    /// Panics if `size` is not a power of two
    pub fn new(size: usize) -> Self {
        assert!(size.is_power_of_two(), "FFT size must be a power of two");
        Self { size }
    }

    /// In-place inverse transform, scaled by 1/N.
    ///
    /// Implemented as conj(FFT(conj(x))) / N.
    pub fn inverse(&self, re: &mut [f32], im: &mut [f32]) {
        for v in im.iter_mut() {
            *v = -*v;
        }
        fft_radix2(re, im);
        let scale = 1.0 / self.size as f32;
        for (r, i) in re.iter_mut().zip(im.iter_mut()) {
            *r *= scale;
            *i = -*i * scale;
        }
    }
}

impl FftBackend for Radix2Fft {
    fn len(&self) -> usize {
        self.size
    }

    fn forward(&mut self, re: &mut [f32], im: &mut [f32]) {
        debug_assert_eq!(re.len(), self.size);
        debug_assert_eq!(im.len(), self.size);
        fft_radix2(re, im);
    }
}

/// Swap every element with the one at its bit-reversed index.
fn bit_reverse(re: &mut [f32], im: &mut [f32]) {
    let n = re.len();
    let mut j = 0usize;
    for i in 0..n {
        if i < j {
            re.swap(i, j);
            im.swap(i, j);
        }
        let mut m = n >> 1;
        while m >= 1 && j >= m {
            j -= m;
            m >>= 1;
        }
        j += m;
    }
}

fn fft_radix2(re: &mut [f32], im: &mut [f32]) {
    let n = re.len();
    bit_reverse(re, im);

    let mut len = 2;
    while len <= n {
        let half = len / 2;
        let angle = -2.0 * PI / len as f32;
        for start in (0..n).step_by(len) {
            for k in 0..half {
                let (s, c) = (angle * k as f32).sin_cos();
                let i0 = start + k;
                let i1 = i0 + half;
                let tr = re[i1] * c - im[i1] * s;
                let ti = re[i1] * s + im[i1] * c;
                re[i1] = re[i0] - tr;
                im[i1] = im[i0] - ti;
                re[i0] += tr;
                im[i0] += ti;
            }
        }
        len <<= 1;
    }
}

/// rustfft-backed transform with a pre-planned FFT and reusable buffers
pub struct RustFftBackend {
    fft: Arc<dyn Fft<f32>>,
    buffer: Vec<Complex<f32>>,
    scratch: Vec<Complex<f32>>,
}

impl RustFftBackend {
    pub fn new(size: usize) -> Self {
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(size);
        let scratch = vec![Complex::new(0.0, 0.0); fft.get_inplace_scratch_len()];
        Self {
            fft,
            buffer: vec![Complex::new(0.0, 0.0); size],
            scratch,
        }
    }
}

impl FftBackend for RustFftBackend {
    fn len(&self) -> usize {
        self.buffer.len()
    }

    fn forward(&mut self, re: &mut [f32], im: &mut [f32]) {
        for ((dst, &r), &i) in self.buffer.iter_mut().zip(re.iter()).zip(im.iter()) {
            *dst = Complex::new(r, i);
        }
        self.fft
            .process_with_scratch(&mut self.buffer, &mut self.scratch);
        for ((src, r), i) in self.buffer.iter().zip(re.iter_mut()).zip(im.iter_mut()) {
            *r = src.re;
            *i = src.im;
        }
    }
}
