// FeatureSink - handoff of feature vectors to the downstream consumer
//
// The extractor calls `deliver` once per hop from its own thread. Sinks must
// not block for long: a slow sink delays the next pop from the ring and the
// sampler starts overwriting unread audio.

use tokio::sync::broadcast;

use super::features::FeatureVector;

/// Receives one feature vector per hop.
pub trait FeatureSink: Send {
    fn deliver(&mut self, features: &FeatureVector);
}

impl<F> FeatureSink for F
where
    F: FnMut(&FeatureVector) + Send,
{
    fn deliver(&mut self, features: &FeatureVector) {
        self(features)
    }
}

/// Lock-free SPSC handoff to a single consumer thread.
///
/// Vectors are dropped (with a warning) while the queue is full.
pub struct QueueSink {
    producer: rtrb::Producer<FeatureVector>,
}

impl QueueSink {
    /// Create the sink and the consumer half the downstream thread polls.
    pub fn new(capacity: usize) -> (Self, rtrb::Consumer<FeatureVector>) {
        let (producer, consumer) = rtrb::RingBuffer::new(capacity);
        (Self { producer }, consumer)
    }
}

impl FeatureSink for QueueSink {
    fn deliver(&mut self, features: &FeatureVector) {
        if self.producer.push(features.clone()).is_err() {
            tracing::warn!(
                "[FeatureSink] Queue full, dropping hop {}",
                features.hop_index
            );
        }
    }
}

/// Fan-out to any number of async subscribers.
pub struct BroadcastSink {
    tx: broadcast::Sender<FeatureVector>,
}

impl BroadcastSink {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn from_sender(tx: broadcast::Sender<FeatureVector>) -> Self {
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<FeatureVector> {
        self.tx.subscribe()
    }

    pub fn sender(&self) -> broadcast::Sender<FeatureVector> {
        self.tx.clone()
    }
}

impl FeatureSink for BroadcastSink {
    fn deliver(&mut self, features: &FeatureVector) {
        // No subscribers is not an error; the vector is simply discarded.
        let _ = self.tx.send(features.clone());
    }
}
