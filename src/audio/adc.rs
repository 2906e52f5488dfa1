//! Analog front-end seam
//!
//! The reference hardware samples an analog microphone through a 12-bit ADC
//! (codes 0..=4095, silence near mid-scale). Everything upstream of the ring
//! buffer only needs "give me the next raw code", so that is the whole trait.
//! Hosted builds get synthetic readers and a replay reader for recordings.

use std::f32::consts::PI;
use std::path::Path;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::CaptureError;

/// Bit depth of the reference converter
pub const ADC_BITS: u32 = 12;
/// Largest raw code
pub const ADC_MAX_CODE: u16 = (1 << ADC_BITS) - 1;
/// Code corresponding to zero input
pub const ADC_MID_SCALE: i32 = 1 << (ADC_BITS - 1);
/// Left shift that maps a centered 12-bit code onto the i16 range
pub const PCM16_SHIFT: u32 = 16 - ADC_BITS;

/// One raw reading per call. Implementations run in the sampling context,
/// so `read_raw` must not block or allocate.
pub trait AdcReader: Send {
    fn read_raw(&mut self) -> u16;
}

impl<F> AdcReader for F
where
    F: FnMut() -> u16 + Send,
{
    fn read_raw(&mut self) -> u16 {
        self()
    }
}

/// Center a raw code at zero and scale it to PCM16.
///
/// Codes wider than 12 bits are masked first.
#[inline]
pub fn code_to_pcm16(code: u16) -> i16 {
    let centered = (code & ADC_MAX_CODE) as i32 - ADC_MID_SCALE;
    (centered << PCM16_SHIFT) as i16
}

/// Quantize a normalized sample in [-1, 1] the way the converter would.
#[inline]
pub fn f32_to_code(sample: f32) -> u16 {
    let scaled = (sample.clamp(-1.0, 1.0) * ADC_MID_SCALE as f32).round() as i32 + ADC_MID_SCALE;
    scaled.clamp(0, ADC_MAX_CODE as i32) as u16
}

/// Quantize a PCM16 sample onto the converter's 12-bit grid.
#[inline]
pub fn pcm16_to_code(sample: i16) -> u16 {
    ((sample as i32 >> PCM16_SHIFT) + ADC_MID_SCALE) as u16
}

/// Pure tone generator, useful for bench checks of the mel layout.
pub struct ToneAdc {
    phase: f32,
    phase_step: f32,
    amplitude: f32,
}

impl ToneAdc {
    /// # Arguments
    /// * `frequency_hz` - Tone frequency
    /// * `sample_rate_hz` - Rate at which `read_raw` will be called
    /// * `amplitude` - Peak amplitude relative to full scale (0.0-1.0)
    pub fn new(frequency_hz: f32, sample_rate_hz: u32, amplitude: f32) -> Self {
        Self {
            phase: 0.0,
            phase_step: 2.0 * PI * frequency_hz / sample_rate_hz as f32,
            amplitude: amplitude.clamp(0.0, 1.0),
        }
    }
}

impl AdcReader for ToneAdc {
    fn read_raw(&mut self) -> u16 {
        let value = self.amplitude * self.phase.sin();
        self.phase += self.phase_step;
        if self.phase >= 2.0 * PI {
            self.phase -= 2.0 * PI;
        }
        f32_to_code(value)
    }
}

/// Uniform white noise around mid-scale.
pub struct NoiseAdc {
    rng: StdRng,
    amplitude: f32,
}

impl NoiseAdc {
    pub fn new(amplitude: f32) -> Self {
        Self {
            rng: StdRng::from_entropy(),
            amplitude: amplitude.clamp(0.0, 1.0),
        }
    }

    /// Deterministic noise for tests.
    pub fn seeded(amplitude: f32, seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            amplitude: amplitude.clamp(0.0, 1.0),
        }
    }
}

impl AdcReader for NoiseAdc {
    fn read_raw(&mut self) -> u16 {
        let value = self.rng.gen_range(-1.0f32..=1.0) * self.amplitude;
        f32_to_code(value)
    }
}

/// Plays back pre-quantized codes, then holds mid-scale (silence).
pub struct ReplayAdc {
    codes: Vec<u16>,
    position: usize,
}

impl ReplayAdc {
    pub fn from_codes(codes: Vec<u16>) -> Self {
        Self { codes, position: 0 }
    }

    pub fn from_pcm16(samples: &[i16]) -> Self {
        Self::from_codes(samples.iter().map(|&s| pcm16_to_code(s)).collect())
    }

    /// Load the first channel of a WAV file.
    ///
    /// # Returns
    /// The reader together with the file's sample rate
    pub fn from_wav<P: AsRef<Path>>(path: P) -> Result<(Self, u32), CaptureError> {
        let (samples, sample_rate) = read_wav_mono(path)?;
        Ok((Self::from_pcm16(&samples), sample_rate))
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    pub fn remaining(&self) -> usize {
        self.codes.len().saturating_sub(self.position)
    }
}

impl AdcReader for ReplayAdc {
    fn read_raw(&mut self) -> u16 {
        match self.codes.get(self.position) {
            Some(&code) => {
                self.position += 1;
                code
            }
            None => ADC_MID_SCALE as u16,
        }
    }
}

/// Decode a WAV file into PCM16, keeping only the first channel.
pub fn read_wav_mono<P: AsRef<Path>>(path: P) -> Result<(Vec<i16>, u32), CaptureError> {
    let mut reader = hound::WavReader::open(path.as_ref())?;
    let spec = reader.spec();
    let channels = spec.channels.max(1) as usize;

    let interleaved: Vec<i16> = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .samples::<f32>()
            .map(|s| s.map(|v| (v.clamp(-1.0, 1.0) * i16::MAX as f32) as i16))
            .collect::<Result<_, _>>()?,
        hound::SampleFormat::Int => {
            let bits = spec.bits_per_sample as u32;
            reader
                .samples::<i32>()
                .map(|s| {
                    s.map(|v| {
                        if bits > 16 {
                            (v >> (bits - 16)) as i16
                        } else {
                            (v << (16 - bits)) as i16
                        }
                    })
                })
                .collect::<Result<_, _>>()?
        }
    };

    let mono = interleaved.into_iter().step_by(channels).collect();
    Ok((mono, spec.sample_rate))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_to_pcm16_mapping() {
        assert_eq!(code_to_pcm16(2048), 0);
        assert_eq!(code_to_pcm16(0), -32768);
        assert_eq!(code_to_pcm16(4095), 2047 << 4);
        assert_eq!(code_to_pcm16(2049), 16);
        assert_eq!(code_to_pcm16(2047), -16);
    }

    #[test]
    fn test_code_is_masked_to_twelve_bits() {
        assert_eq!(code_to_pcm16(0x1000 | 2048), 0);
    }

    #[test]
    fn test_f32_quantization() {
        assert_eq!(f32_to_code(0.0), 2048);
        assert_eq!(f32_to_code(-1.0), 0);
        assert_eq!(f32_to_code(1.0), 4095);
        assert_eq!(f32_to_code(7.5), 4095);
    }

    #[test]
    fn test_pcm16_code_roundtrip_on_grid() {
        for code in [0u16, 1, 1000, 2048, 3000, 4095] {
            assert_eq!(pcm16_to_code(code_to_pcm16(code)), code);
        }
    }

    #[test]
    fn test_replay_holds_mid_scale_after_end() {
        let mut adc = ReplayAdc::from_codes(vec![10, 20]);
        assert_eq!(adc.remaining(), 2);
        assert_eq!(adc.read_raw(), 10);
        assert_eq!(adc.read_raw(), 20);
        assert_eq!(adc.read_raw(), 2048);
        assert_eq!(adc.remaining(), 0);
    }

    #[test]
    fn test_tone_stays_in_range_and_oscillates() {
        let mut adc = ToneAdc::new(1000.0, 16_000, 0.5);
        let codes: Vec<u16> = (0..160).map(|_| adc.read_raw()).collect();
        assert!(codes.iter().all(|&c| c <= ADC_MAX_CODE));
        assert!(codes.iter().any(|&c| c > 2800));
        assert!(codes.iter().any(|&c| c < 1300));
    }

    #[test]
    fn test_seeded_noise_is_deterministic() {
        let mut a = NoiseAdc::seeded(0.3, 7);
        let mut b = NoiseAdc::seeded(0.3, 7);
        for _ in 0..64 {
            assert_eq!(a.read_raw(), b.read_raw());
        }
    }

    #[test]
    fn test_closure_reader() {
        let mut value = 100u16;
        let mut reader = move || {
            value += 1;
            value
        };
        assert_eq!(AdcReader::read_raw(&mut reader), 101);
    }
}
