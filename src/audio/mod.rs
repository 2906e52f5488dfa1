// Audio module - sample acquisition up to the ring buffer

pub mod adc;
#[cfg(feature = "mic")]
pub mod capture;
pub mod ring_buffer;
pub mod sampler;
pub mod timer;

// Re-export commonly used types for convenience
pub use adc::{AdcReader, NoiseAdc, ReplayAdc, ToneAdc};
#[cfg(feature = "mic")]
pub use capture::MicCapture;
pub use ring_buffer::{
    RingBuffer, RingConsumer, RingProducer, WaitStrategy, DEFAULT_RING_CAPACITY,
};
pub use sampler::{ArmedSampler, SampleSource};
pub use timer::{PeriodicTimer, ThreadTimer};
