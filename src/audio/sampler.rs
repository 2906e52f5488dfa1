// SampleSource - timer-driven producer feeding the ring buffer
//
// One tick = one ADC read = one PCM16 sample pushed. The tick runs in the
// sampling context (interrupt on the board, timer thread when hosted), so it
// is O(1) and never allocates.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use super::adc::{code_to_pcm16, AdcReader};
use super::ring_buffer::RingProducer;
use super::timer::PeriodicTimer;
use crate::error::{log_capture_error, CaptureError};

/// ADC reader bound to the producer half of the ring.
pub struct SampleSource<A: AdcReader> {
    adc: A,
    producer: RingProducer,
    ticks: Arc<AtomicU64>,
}

impl<A: AdcReader + 'static> SampleSource<A> {
    pub fn new(adc: A, producer: RingProducer) -> Self {
        Self {
            adc,
            producer,
            ticks: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Read one raw code, center it, widen to 16 bits and push.
    #[inline]
    pub fn tick(&mut self) {
        let sample = code_to_pcm16(self.adc.read_raw());
        self.producer.push(sample);
        self.ticks.fetch_add(1, Ordering::Relaxed);
    }

    /// Run `n` ticks back to back. Used for offline replay.
    pub fn tick_n(&mut self, n: usize) {
        for _ in 0..n {
            self.tick();
        }
    }

    pub fn ticks(&self) -> u64 {
        self.ticks.load(Ordering::Relaxed)
    }

    pub fn producer(&self) -> &RingProducer {
        &self.producer
    }

    /// Arm `timer` at a period of `1 / sample_rate_hz` and hand it this source.
    ///
    /// # Errors
    /// Fails if the rate is zero or the timer refuses to arm. Callers treat
    /// either as fatal; there is no retry.
    pub fn init<T: PeriodicTimer>(
        self,
        sample_rate_hz: u32,
        mut timer: T,
    ) -> Result<ArmedSampler<T>, CaptureError> {
        if sample_rate_hz == 0 {
            let err = CaptureError::SampleRateInvalid { sample_rate_hz };
            log_capture_error(&err, "SampleSource::init");
            return Err(err);
        }

        let period = Duration::from_nanos(1_000_000_000 / sample_rate_hz as u64);
        let ticks = Arc::clone(&self.ticks);
        // The timer context owns the source for as long as it stays armed.
        let mut source = self;
        let tick = move || source.tick();

        if let Err(err) = timer.arm(period, Box::new(tick)) {
            log_capture_error(&err, "SampleSource::init");
            return Err(err);
        }

        tracing::info!(
            "[SampleSource] Sampling at {} Hz (period {:?})",
            sample_rate_hz,
            period
        );

        Ok(ArmedSampler {
            timer,
            ticks,
            sample_rate_hz,
        })
    }
}

/// A sampler whose timer is running. Dropping it stops sampling.
pub struct ArmedSampler<T: PeriodicTimer> {
    timer: T,
    ticks: Arc<AtomicU64>,
    sample_rate_hz: u32,
}

impl<T: PeriodicTimer> ArmedSampler<T> {
    /// Samples produced so far.
    pub fn ticks(&self) -> u64 {
        self.ticks.load(Ordering::Relaxed)
    }

    pub fn sample_rate_hz(&self) -> u32 {
        self.sample_rate_hz
    }

    /// Stop the timer explicitly.
    pub fn stop(mut self) {
        self.timer.disarm();
    }
}

impl<T: PeriodicTimer> Drop for ArmedSampler<T> {
    fn drop(&mut self) {
        self.timer.disarm();
    }
}
