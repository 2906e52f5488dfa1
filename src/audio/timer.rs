//! Periodic timer seam
//!
//! On the reference board the sampler runs from a repeating hardware timer
//! interrupt. Hosted builds emulate it with a dedicated thread that fires the
//! tick callback on an absolute schedule, catching up in a burst whenever the
//! OS wakes it late, so the long-run tick rate matches the requested period.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::error::CaptureError;

/// Callback fired once per period.
pub type TickFn = Box<dyn FnMut() + Send + 'static>;

/// Something that can call a tick function periodically.
pub trait PeriodicTimer: Send {
    /// Start firing `tick` every `period`.
    fn arm(&mut self, period: Duration, tick: TickFn) -> Result<(), CaptureError>;

    /// Stop firing. Idempotent.
    fn disarm(&mut self);

    fn is_armed(&self) -> bool;
}

/// Longest single sleep between deadline checks
const MAX_SLEEP: Duration = Duration::from_millis(1);

/// Thread-backed periodic timer
pub struct ThreadTimer {
    running: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl ThreadTimer {
    pub fn new() -> Self {
        Self {
            running: Arc::new(AtomicBool::new(false)),
            handle: None,
        }
    }
}

impl Default for ThreadTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl PeriodicTimer for ThreadTimer {
    fn arm(&mut self, period: Duration, mut tick: TickFn) -> Result<(), CaptureError> {
        if self.handle.is_some() {
            return Err(CaptureError::TimerAlreadyArmed);
        }
        if period.is_zero() {
            return Err(CaptureError::TimerArmFailed {
                reason: "period must be non-zero".to_string(),
            });
        }

        self.running.store(true, Ordering::SeqCst);
        let running = Arc::clone(&self.running);

        let handle = thread::Builder::new()
            .name("kws-sampler".to_string())
            .spawn(move || {
                let mut next_deadline = Instant::now() + period;
                while running.load(Ordering::Acquire) {
                    let now = Instant::now();
                    while next_deadline <= now {
                        tick();
                        next_deadline += period;
                    }
                    let wait = next_deadline.saturating_duration_since(Instant::now());
                    thread::sleep(wait.min(MAX_SLEEP));
                }
            })
            .map_err(|e| {
                self.running.store(false, Ordering::SeqCst);
                CaptureError::TimerArmFailed {
                    reason: e.to_string(),
                }
            })?;

        self.handle = Some(handle);
        tracing::debug!("[Timer] Armed with period {:?}", period);
        Ok(())
    }

    fn disarm(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                tracing::warn!("[Timer] Sampler thread panicked");
            }
            tracing::debug!("[Timer] Disarmed");
        }
    }

    fn is_armed(&self) -> bool {
        self.handle.is_some()
    }
}

impl Drop for ThreadTimer {
    fn drop(&mut self) {
        self.disarm();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicU64;

    #[test]
    fn test_timer_fires_repeatedly() {
        let count = Arc::new(AtomicU64::new(0));
        let counter = Arc::clone(&count);

        let mut timer = ThreadTimer::new();
        timer
            .arm(
                Duration::from_micros(500),
                Box::new(move || {
                    counter.fetch_add(1, Ordering::Relaxed);
                }),
            )
            .unwrap();
        assert!(timer.is_armed());

        thread::sleep(Duration::from_millis(50));
        timer.disarm();
        assert!(!timer.is_armed());

        let fired = count.load(Ordering::Relaxed);
        assert!(fired >= 20, "expected at least 20 ticks, got {}", fired);

        // No more ticks after disarm
        thread::sleep(Duration::from_millis(5));
        assert_eq!(count.load(Ordering::Relaxed), fired);
    }

    #[test]
    fn test_double_arm_rejected() {
        let mut timer = ThreadTimer::new();
        timer.arm(Duration::from_millis(1), Box::new(|| {})).unwrap();
        let err = timer
            .arm(Duration::from_millis(1), Box::new(|| {}))
            .unwrap_err();
        assert_eq!(err, CaptureError::TimerAlreadyArmed);
    }

    #[test]
    fn test_zero_period_rejected() {
        let mut timer = ThreadTimer::new();
        assert!(matches!(
            timer.arm(Duration::ZERO, Box::new(|| {})),
            Err(CaptureError::TimerArmFailed { .. })
        ));
        assert!(!timer.is_armed());
    }
}
