//! Metric event types published by the sampler and the extraction thread.

use serde::{Deserialize, Serialize};

/// Extraction lifecycle stages.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LifecyclePhase {
    /// Tables built, sampler armed
    Initialized,
    /// First full frame read from the ring
    Primed,
    /// Extraction thread exited
    Stopped,
}

/// Rich metric events covering hop latency, ring health and lifecycle.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum MetricEvent {
    /// Rolling compute time per hop (FFT through DCT plus sink)
    HopLatency {
        avg_ms: f32,
        max_ms: f32,
        sample_count: usize,
    },
    RingOccupancy {
        percent: f32,
    },
    /// Cumulative count of pushes that overwrote unread samples
    RingOverrun {
        total: u64,
    },
    Lifecycle {
        phase: LifecyclePhase,
        timestamp_ms: u64,
    },
    Error {
        code: i32,
        context: String,
    },
}
