//! MicCapture - cpal-based microphone input for desktop runs
//!
//! The host delivers f32 blocks from its own callback thread. Each sample is
//! pushed through the same 12-bit transfer function the board's ADC applies,
//! so features computed from a laptop microphone are quantized like the
//! firmware's. Only the first channel is kept.

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};

use super::adc::{code_to_pcm16, f32_to_code};
use super::ring_buffer::RingProducer;
use crate::error::CaptureError;

pub struct MicCapture {
    stream: Option<cpal::Stream>,
    sample_rate_hz: u32,
}

impl MicCapture {
    /// Open the default input device at `sample_rate_hz` and start pushing
    /// into `producer`.
    ///
    /// # Errors
    /// Returns error if no device exists, the device cannot run at the
    /// requested rate with f32 samples, or the stream fails to start
    pub fn start(sample_rate_hz: u32, mut producer: RingProducer) -> Result<Self, CaptureError> {
        let host = cpal::default_host();
        let device = host
            .default_input_device()
            .ok_or_else(|| CaptureError::StreamOpenFailed {
                reason: "No default input device found".to_string(),
            })?;

        let rate = cpal::SampleRate(sample_rate_hz);
        let supported = device
            .supported_input_configs()
            .map_err(|e| CaptureError::StreamOpenFailed {
                reason: format!("Failed to query input configs: {:?}", e),
            })?
            .filter(|range| range.sample_format() == cpal::SampleFormat::F32)
            .find(|range| range.min_sample_rate() <= rate && rate <= range.max_sample_rate())
            .ok_or_else(|| CaptureError::StreamOpenFailed {
                reason: format!("Input device cannot capture f32 at {} Hz", sample_rate_hz),
            })?
            .with_sample_rate(rate);

        let stream_config: cpal::StreamConfig = supported.into();
        let channels_count = (stream_config.channels as usize).max(1);

        let err_fn = |err| tracing::error!("[MicCapture] Input stream error: {}", err);

        let stream = device
            .build_input_stream(
                &stream_config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    for frame in data.chunks(channels_count) {
                        let code = f32_to_code(frame[0]);
                        producer.push(code_to_pcm16(code));
                    }
                },
                err_fn,
                None,
            )
            .map_err(|e| CaptureError::StreamOpenFailed {
                reason: format!("{:?}", e),
            })?;

        stream.play().map_err(|e| CaptureError::HardwareError {
            details: format!("Input start failed: {}", e),
        })?;

        tracing::info!(
            "[MicCapture] Capturing {} channel(s) at {} Hz",
            channels_count,
            sample_rate_hz
        );

        Ok(Self {
            stream: Some(stream),
            sample_rate_hz,
        })
    }

    pub fn sample_rate_hz(&self) -> u32 {
        self.sample_rate_hz
    }

    pub fn stop(&mut self) {
        if let Some(stream) = self.stream.take() {
            drop(stream);
            tracing::info!("[MicCapture] Stopped");
        }
    }
}

impl Drop for MicCapture {
    fn drop(&mut self) {
        self.stop();
    }
}
