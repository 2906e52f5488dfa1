// RingBuffer - lock-free SPSC sample ring between the sampler and the extractor
//
// A fixed-capacity circular buffer of PCM16 samples shared by exactly one
// producer (the sampling tick) and one consumer (the frame assembler).
//
// Architecture:
// - Producer: writes slot W mod C, then publishes W+1 (Release)
// - Consumer: observes W (Acquire), copies the oldest n slots, publishes R+n
//
// Overflow policy:
// - push never blocks and never rejects. When the consumer falls behind the
//   producer overwrites unread samples. Each such overwrite bumps an atomic
//   overrun counter so the condition is observable without changing what
//   the data path does.
//
// Slots are AtomicI16 so a producer lapping the consumer can never race on
// plain memory; the relaxed slot accesses are ordered by the index fences.

use std::sync::atomic::{AtomicBool, AtomicI16, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default ring capacity in samples (~0.5 s at 16 kHz)
pub const DEFAULT_RING_CAPACITY: usize = 8192;

/// How `pop_block` waits for the producer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WaitStrategy {
    /// Busy-wait with a spin hint. Matches a single-core run-to-completion loop.
    Spin,
    /// Yield the thread to the OS scheduler between polls.
    Yield,
    /// Sleep between polls.
    Sleep { micros: u64 },
}

impl WaitStrategy {
    #[inline]
    fn pause(self) {
        match self {
            WaitStrategy::Spin => std::hint::spin_loop(),
            WaitStrategy::Yield => std::thread::yield_now(),
            WaitStrategy::Sleep { micros } => std::thread::sleep(Duration::from_micros(micros)),
        }
    }
}

struct Shared {
    slots: Box<[AtomicI16]>,
    mask: usize,
    write_idx: AtomicUsize,
    read_idx: AtomicUsize,
    overruns: AtomicU64,
}

impl Shared {
    #[inline]
    fn unread(&self) -> usize {
        let w = self.write_idx.load(Ordering::Acquire);
        let r = self.read_idx.load(Ordering::Acquire);
        w.wrapping_sub(r) & self.mask
    }
}

/// Constructor for the producer/consumer pair.
pub struct RingBuffer;

impl RingBuffer {
    /// Create a new ring of `capacity` samples and split it.
    ///
    /// # Panics
    /// Panics if capacity is not a power of two or is smaller than 2
    #[allow(clippy::new_ret_no_self)]
    pub fn new(capacity: usize) -> (RingProducer, RingConsumer) {
        assert!(
            capacity >= 2 && capacity.is_power_of_two(),
            "ring capacity must be a power of two >= 2"
        );

        let slots = (0..capacity)
            .map(|_| AtomicI16::new(0))
            .collect::<Vec<_>>()
            .into_boxed_slice();

        let shared = Arc::new(Shared {
            slots,
            mask: capacity - 1,
            write_idx: AtomicUsize::new(0),
            read_idx: AtomicUsize::new(0),
            overruns: AtomicU64::new(0),
        });

        (
            RingProducer {
                shared: Arc::clone(&shared),
            },
            RingConsumer {
                shared,
                wait: WaitStrategy::Spin,
            },
        )
    }
}

/// Write half. Owned by the sampling context.
pub struct RingProducer {
    shared: Arc<Shared>,
}

impl RingProducer {
    /// Append one sample. Never blocks, O(1), allocation-free.
    #[inline]
    pub fn push(&mut self, sample: i16) {
        let shared = &*self.shared;
        // Only this side writes W, so a relaxed load of it is exact.
        let w = shared.write_idx.load(Ordering::Relaxed);
        let r = shared.read_idx.load(Ordering::Acquire);
        if w.wrapping_sub(r) >= shared.mask {
            shared.overruns.fetch_add(1, Ordering::Relaxed);
        }
        shared.slots[w & shared.mask].store(sample, Ordering::Relaxed);
        shared.write_idx.store(w.wrapping_add(1), Ordering::Release);
    }

    /// Unread samples as seen by the producer.
    pub fn available(&self) -> usize {
        self.shared.unread()
    }

    /// Number of pushes that overwrote (or made unreadable) unread samples.
    pub fn overruns(&self) -> u64 {
        self.shared.overruns.load(Ordering::Relaxed)
    }

    pub fn capacity(&self) -> usize {
        self.shared.slots.len()
    }
}

/// Read half. Owned by the single consumer.
pub struct RingConsumer {
    shared: Arc<Shared>,
    wait: WaitStrategy,
}

impl RingConsumer {
    /// Replace the strategy used while waiting for samples.
    pub fn with_wait_strategy(mut self, wait: WaitStrategy) -> Self {
        self.wait = wait;
        self
    }

    pub fn wait_strategy(&self) -> WaitStrategy {
        self.wait
    }

    /// `(W - R) mod C`
    #[inline]
    pub fn available(&self) -> usize {
        self.shared.unread()
    }

    pub fn capacity(&self) -> usize {
        self.shared.slots.len()
    }

    pub fn overruns(&self) -> u64 {
        self.shared.overruns.load(Ordering::Relaxed)
    }

    /// Fill percentage, for occupancy gauges.
    pub fn occupancy_percent(&self) -> f32 {
        self.available() as f32 / self.capacity() as f32 * 100.0
    }

    /// Block until `dst.len()` samples are unread, then copy them out in
    /// FIFO order and advance the read index by exactly that many.
    ///
    /// # Panics
    /// Panics if `dst` is not shorter than the ring capacity, since such a
    /// request could never be satisfied.
    pub fn pop_block(&mut self, dst: &mut [i16]) {
        self.assert_request(dst.len());
        while self.shared.unread() < dst.len() {
            self.wait.pause();
        }
        self.copy_out(dst);
    }

    /// Same contract as [`pop_block`](Self::pop_block), but gives up without
    /// consuming anything once `running` is cleared.
    ///
    /// # Returns
    /// `true` if `dst` was filled, `false` if the wait was abandoned
    pub fn pop_block_until(&mut self, dst: &mut [i16], running: &AtomicBool) -> bool {
        self.assert_request(dst.len());
        while self.shared.unread() < dst.len() {
            if !running.load(Ordering::Acquire) {
                return false;
            }
            self.wait.pause();
        }
        self.copy_out(dst);
        true
    }

    fn assert_request(&self, n: usize) {
        assert!(
            n < self.capacity(),
            "pop of {} samples can never be satisfied by a ring of capacity {}",
            n,
            self.capacity()
        );
    }

    #[inline]
    fn copy_out(&mut self, dst: &mut [i16]) {
        let shared = &*self.shared;
        let r = shared.read_idx.load(Ordering::Relaxed);
        for (i, out) in dst.iter_mut().enumerate() {
            *out = shared.slots[r.wrapping_add(i) & shared.mask].load(Ordering::Relaxed);
        }
        shared
            .read_idx
            .store(r.wrapping_add(dst.len()), Ordering::Release);
    }
}
