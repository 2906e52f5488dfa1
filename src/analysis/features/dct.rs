// DCT module - orthonormal DCT-II from log mel energies to cepstral coefficients

use std::f32::consts::PI;

/// Row-major `num_mfcc x num_bands` DCT-II matrix
#[derive(Debug, Clone)]
pub struct DctMatrix {
    num_mfcc: usize,
    num_bands: usize,
    table: Vec<f32>,
}

impl DctMatrix {
    /// `dct[i][j] = s_i * cos(pi * (j + 0.5) * i / B)` with
    /// `s_0 = sqrt(1/B)` and `s_i = sqrt(2/B)` otherwise.
    pub fn new(num_mfcc: usize, num_bands: usize) -> Self {
        let b = num_bands as f32;
        let scale0 = (1.0 / b).sqrt();
        let scale = (2.0 / b).sqrt();

        let mut table = Vec::with_capacity(num_mfcc * num_bands);
        for i in 0..num_mfcc {
            let s = if i == 0 { scale0 } else { scale };
            for j in 0..num_bands {
                table.push(s * (PI * (j as f32 + 0.5) * i as f32 / b).cos());
            }
        }

        Self {
            num_mfcc,
            num_bands,
            table,
        }
    }

    pub fn num_mfcc(&self) -> usize {
        self.num_mfcc
    }

    pub fn num_bands(&self) -> usize {
        self.num_bands
    }

    pub fn row(&self, i: usize) -> &[f32] {
        &self.table[i * self.num_bands..(i + 1) * self.num_bands]
    }

    /// `out[i] = sum_j dct[i][j] * log_mel[j]`
    pub fn apply(&self, log_mel: &[f32], out: &mut [f32]) {
        debug_assert_eq!(log_mel.len(), self.num_bands);
        debug_assert_eq!(out.len(), self.num_mfcc);
        for (i, dst) in out.iter_mut().enumerate() {
            *dst = self
                .row(i)
                .iter()
                .zip(log_mel.iter())
                .map(|(c, x)| c * x)
                .sum();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rows_are_orthonormal() {
        let dct = DctMatrix::new(13, 32);
        for i in 0..13 {
            for k in 0..13 {
                let dot: f32 = dct
                    .row(i)
                    .iter()
                    .zip(dct.row(k).iter())
                    .map(|(a, b)| a * b)
                    .sum();
                let expected = if i == k { 1.0 } else { 0.0 };
                assert!(
                    (dot - expected).abs() < 1e-5,
                    "rows {} and {} dot {}",
                    i,
                    k,
                    dot
                );
            }
        }
    }

    #[test]
    fn test_constant_input_only_excites_c0() {
        let dct = DctMatrix::new(13, 32);
        let log_mel = vec![-2.0f32; 32];
        let mut out = vec![0.0f32; 13];
        dct.apply(&log_mel, &mut out);

        let expected_c0 = (1.0f32 / 32.0).sqrt() * 32.0 * -2.0;
        assert!((out[0] - expected_c0).abs() < 1e-4);
        for &c in &out[1..] {
            assert!(c.abs() < 1e-4);
        }
    }

    #[test]
    fn test_square_matrix_is_invertible_by_transpose() {
        let n = 8;
        let dct = DctMatrix::new(n, n);
        let x: Vec<f32> = (0..n).map(|j| (j as f32 * 0.7).sin()).collect();
        let mut y = vec![0.0f32; n];
        dct.apply(&x, &mut y);

        for j in 0..n {
            let back: f32 = (0..n).map(|i| dct.row(i)[j] * y[i]).sum();
            assert!((back - x[j]).abs() < 1e-5);
        }
    }
}
