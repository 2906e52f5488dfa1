// Analysis module - frame assembly, MFCC extraction and hop orchestration
//
// Architecture:
// - Sampler: timer context pushes one PCM16 sample per tick into the ring
// - ExtractionWorker: dedicated thread, one iteration per hop
//   FrameAssembler → MfccPipeline → FeatureSink
// - FrontEnd: Init (validate, build tables, arm sampler) then hands the
//   consumer half to the worker
//
// Startup failures are fatal and reported as FrontEndError. Once running
// there are no recoverable errors: a slow consumer shows up only as ring
// overruns in telemetry.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Instant;

use crate::audio::{
    AdcReader, ArmedSampler, PeriodicTimer, ReplayAdc, RingBuffer, RingConsumer, SampleSource,
};
use crate::config::{AppConfig, FeatureConfig};
use crate::error::{log_capture_error, CaptureError, ConfigError, ErrorCode, FrontEndError};
use crate::telemetry::{self, LifecyclePhase};

pub mod features;
pub mod frame;
pub mod sink;


use features::MfccPipeline;
use frame::FrameAssembler;
use sink::FeatureSink;

/// Counters reported when extraction ends
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct ExtractionStats {
    /// Feature vectors delivered
    pub hops: u64,
    /// Samples pulled from the ring
    pub samples_consumed: u64,
    /// Ring overruns observed at exit
    pub overruns: u64,
}

/// Stream time of the newest consumed sample
fn stream_time_ms(samples: u64, sample_rate_hz: u32) -> u64 {
    samples * 1000 / sample_rate_hz as u64
}

struct ExtractionWorker<S: FeatureSink> {
    consumer: RingConsumer,
    assembler: FrameAssembler,
    pipeline: MfccPipeline,
    sink: S,
    running: Arc<AtomicBool>,
    log_every_n_hops: u64,
    max_hops: Option<u64>,
    hop_index: u64,
    overruns_reported: u64,
}

impl<S: FeatureSink> ExtractionWorker<S> {
    fn new(
        consumer: RingConsumer,
        pipeline: MfccPipeline,
        sink: S,
        running: Arc<AtomicBool>,
        log_every_n_hops: u64,
        max_hops: Option<u64>,
    ) -> Self {
        let config = pipeline.config();
        let assembler = FrameAssembler::new(config.frame_len_samples, config.hop_len_samples);
        Self {
            consumer,
            assembler,
            pipeline,
            sink,
            running,
            log_every_n_hops,
            max_hops,
            hop_index: 0,
            overruns_reported: 0,
        }
    }

    fn stats(&self) -> ExtractionStats {
        ExtractionStats {
            hops: self.hop_index,
            samples_consumed: self.assembler.samples_consumed(),
            overruns: self.consumer.overruns(),
        }
    }

    fn run(mut self) -> ExtractionStats {
        let sample_rate_hz = self.pipeline.config().sample_rate_hz;
        let hub = telemetry::hub();
        let log_interval = (self.log_every_n_hops > 0).then_some(self.log_every_n_hops);

        tracing::info!(
            "[ExtractionThread] Starting: frame={} hop={} ring={}",
            self.assembler.frame_len(),
            self.assembler.hop_len(),
            self.consumer.capacity()
        );

        while self.running.load(Ordering::Acquire) {
            if self.max_hops.is_some_and(|max| self.hop_index >= max) {
                tracing::info!("[ExtractionThread] Hop limit reached");
                break;
            }

            let was_primed = self.assembler.is_primed();
            let Some(frame) = self
                .assembler
                .next_frame_until(&mut self.consumer, &self.running)
            else {
                tracing::info!("[ExtractionThread] Shutdown flag cleared while waiting, exiting");
                break;
            };
            if !was_primed {
                // The priming frame only fills the window; the first vector
                // comes from the first slide-and-fill.
                tracing::info!("[ExtractionThread] Primed with first full frame");
                hub.record_phase(LifecyclePhase::Primed);
                continue;
            }

            let started = Instant::now();
            let mut features = self.pipeline.extract(frame, self.hop_index, 0);
            features.timestamp_ms =
                stream_time_ms(self.assembler.samples_consumed(), sample_rate_hz);
            self.sink.deliver(&features);
            let elapsed_ms = started.elapsed().as_secs_f32() * 1000.0;

            hub.record_hop_latency(elapsed_ms);
            hub.record_ring_occupancy(self.consumer.occupancy_percent());
            let overruns = self.consumer.overruns();
            if overruns > self.overruns_reported {
                hub.record_ring_overruns(overruns, overruns - self.overruns_reported);
                self.overruns_reported = overruns;
            }

            if let Some(interval) = log_interval {
                if self.hop_index % interval == 0 {
                    tracing::debug!(
                        "[ExtractionThread] hop={} t={}ms c0={:.3} ring={:.1}% latency={:.3}ms",
                        self.hop_index,
                        features.timestamp_ms,
                        features.coefficients.first().copied().unwrap_or_default(),
                        self.consumer.occupancy_percent(),
                        elapsed_ms
                    );
                }
            }

            self.hop_index += 1;
        }

        let stats = self.stats();
        hub.record_phase(LifecyclePhase::Stopped);
        tracing::info!(
            "[ExtractionThread] Stopped after {} hops ({} samples, {} overruns)",
            stats.hops,
            stats.samples_consumed,
            stats.overruns
        );
        stats
    }
}

/// Spawn the extraction loop on its own thread.
///
/// The loop runs until `running` is cleared (checked between hops and while
/// waiting for samples) or `max_hops` vectors have been delivered.
///
/// # Errors
/// Returns error if the OS refuses to create the thread
pub fn spawn_extraction_thread<S: FeatureSink + 'static>(
    consumer: RingConsumer,
    pipeline: MfccPipeline,
    sink: S,
    running: Arc<AtomicBool>,
    log_every_n_hops: u64,
    max_hops: Option<u64>,
) -> Result<JoinHandle<ExtractionStats>, CaptureError> {
    let worker = ExtractionWorker::new(
        consumer,
        pipeline,
        sink,
        running,
        log_every_n_hops,
        max_hops,
    );
    let handle = thread::Builder::new()
        .name("kws-extract".to_string())
        .spawn(move || worker.run())?;
    Ok(handle)
}

/// Running sampler plus extraction thread
pub struct FrontEnd<T: PeriodicTimer> {
    sampler: Option<ArmedSampler<T>>,
    worker: Option<JoinHandle<ExtractionStats>>,
    running: Arc<AtomicBool>,
}

impl<T: PeriodicTimer> FrontEnd<T> {
    /// Validate `config`, build the tables, arm the sampler on `timer` and
    /// start the extraction thread.
    ///
    /// # Errors
    /// Any configuration or capture failure; nothing is left running
    pub fn start<A, S>(
        config: &AppConfig,
        adc: A,
        timer: T,
        sink: S,
        max_hops: Option<u64>,
    ) -> Result<Self, FrontEndError>
    where
        A: AdcReader + 'static,
        S: FeatureSink + 'static,
    {
        Self::launch(config, adc, timer, sink, max_hops).map_err(|err| {
            telemetry::hub().record_error(err.code(), "FrontEnd::start");
            err
        })
    }

    fn launch<A, S>(
        config: &AppConfig,
        adc: A,
        timer: T,
        sink: S,
        max_hops: Option<u64>,
    ) -> Result<Self, FrontEndError>
    where
        A: AdcReader + 'static,
        S: FeatureSink + 'static,
    {
        config.validate()?;
        let pipeline = MfccPipeline::new(&config.features)?;

        let (producer, consumer) = RingBuffer::new(config.capture.ring_capacity);
        let consumer = consumer.with_wait_strategy(config.capture.wait_strategy);

        let sampler = SampleSource::new(adc, producer).init(config.features.sample_rate_hz, timer)?;
        telemetry::hub().record_phase(LifecyclePhase::Initialized);

        let running = Arc::new(AtomicBool::new(true));
        let worker = spawn_extraction_thread(
            consumer,
            pipeline,
            sink,
            Arc::clone(&running),
            config.telemetry.log_every_n_hops,
            max_hops,
        )
        .map_err(|err| {
            log_capture_error(&err, "FrontEnd::start");
            err
        })?;

        Ok(Self {
            sampler: Some(sampler),
            worker: Some(worker),
            running,
        })
    }

    /// Shared flag; clearing it stops extraction.
    pub fn running_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.running)
    }

    /// Samples produced by the sampler so far.
    pub fn ticks(&self) -> u64 {
        self.sampler.as_ref().map(|s| s.ticks()).unwrap_or(0)
    }

    /// True once the extraction thread has exited on its own.
    pub fn is_finished(&self) -> bool {
        self.worker.as_ref().map_or(true, |w| w.is_finished())
    }

    /// Stop sampling and extraction and wait for the worker.
    pub fn stop(mut self) -> ExtractionStats {
        self.shutdown()
    }

    fn shutdown(&mut self) -> ExtractionStats {
        self.running.store(false, Ordering::Release);
        if let Some(sampler) = self.sampler.take() {
            sampler.stop();
        }
        match self.worker.take().map(|w| w.join()) {
            Some(Ok(stats)) => stats,
            Some(Err(_)) => {
                tracing::error!("[FrontEnd] Extraction thread panicked");
                ExtractionStats::default()
            }
            None => ExtractionStats::default(),
        }
    }
}

impl<T: PeriodicTimer> Drop for FrontEnd<T> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Run the chain over recorded PCM with no timer and no threads.
///
/// Samples go through the same ADC transfer function and ring as live
/// capture. The sampler is ticked by hand exactly as far as each hop needs,
/// so the output is deterministic. The first `frame_len` samples only prime
/// the window, so a vector is emitted per completed hop after that. Trailing
/// samples that do not complete a hop are ignored.
///
/// # Errors
/// Returns error if `config` is invalid
pub fn replay_samples<S: FeatureSink>(
    config: &FeatureConfig,
    samples: &[i16],
    sink: &mut S,
) -> Result<ExtractionStats, ConfigError> {
    let mut pipeline = MfccPipeline::new(config)?;
    let frame_len = config.frame_len_samples;
    let hop_len = config.hop_len_samples;

    let (producer, mut consumer) = RingBuffer::new((frame_len + 1).next_power_of_two());
    let mut source = SampleSource::new(ReplayAdc::from_pcm16(samples), producer);
    let mut assembler = FrameAssembler::new(frame_len, hop_len);

    let mut remaining = samples.len();
    let mut hop_index = 0u64;
    if remaining >= frame_len {
        source.tick_n(frame_len);
        remaining -= frame_len;
        assembler.next_frame(&mut consumer);

        while remaining >= hop_len {
            source.tick_n(hop_len);
            remaining -= hop_len;

            let frame = assembler.next_frame(&mut consumer);
            let mut features = pipeline.extract(frame, hop_index, 0);
            features.timestamp_ms =
                stream_time_ms(assembler.samples_consumed(), config.sample_rate_hz);
            sink.deliver(&features);

            hop_index += 1;
        }
    }

    tracing::debug!(
        "[Replay] {} samples -> {} hops ({} trailing samples dropped)",
        samples.len(),
        hop_index,
        remaining
    );

    Ok(ExtractionStats {
        hops: hop_index,
        samples_consumed: assembler.samples_consumed(),
        overruns: consumer.overruns(),
    })
}
