//! Wall-clock deadline checker with an injectable time source. Grounded on
//! the shape of the teacher's `gas::timer::GasTimer` (a started-at instant
//! compared against elapsed time at charge points), simplified to a single
//! before/after check since this sandbox needs no per-charge duration
//! telemetry, only a boundary check.

use std::sync::Arc;
use std::time::Instant;

use crate::error::ResourceSignal;

/// A millisecond clock. The default implementation reads the monotonic
/// system clock; tests inject a deterministic stand-in.
pub type ClockFn = Arc<dyn Fn() -> u64 + Send + Sync>;

pub struct DeadlineChecker {
    limit_ms: u64,
    clock: ClockFn,
    base_ms: u64,
    timed_out: bool,
}

impl DeadlineChecker {
    pub fn new(limit_ms: u64) -> Self {
        let epoch = Instant::now();
        Self::with_clock(
            limit_ms,
            Arc::new(move || epoch.elapsed().as_millis() as u64),
        )
    }

    pub fn with_clock(limit_ms: u64, clock: ClockFn) -> Self {
        DeadlineChecker {
            limit_ms,
            clock,
            base_ms: 0,
            timed_out: false,
        }
    }

    /// Record the base timestamp for this execution. Re-entry clears any
    /// prior timed-out flag.
    pub fn start(&mut self) {
        self.base_ms = (self.clock)();
        self.timed_out = false;
    }

    /// `elapsed == limit` passes; `elapsed > limit` raises the signal.
    pub fn check(&mut self) -> Result<(), ResourceSignal> {
        let elapsed = (self.clock)().saturating_sub(self.base_ms);
        if self.timed_out || elapsed > self.limit_ms {
            self.timed_out = true;
            log::trace!("deadline exceeded: {}ms of {}ms", elapsed, self.limit_ms);
            return Err(ResourceSignal::DeadlineExceeded {
                elapsed_ms: elapsed,
                limit_ms: self.limit_ms,
            });
        }
        Ok(())
    }

    pub fn elapsed_ms(&self) -> u64 {
        (self.clock)().saturating_sub(self.base_ms)
    }

    pub fn limit_ms(&self) -> u64 {
        self.limit_ms
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};

    fn fake_clock() -> (ClockFn, Arc<AtomicU64>) {
        let now = Arc::new(AtomicU64::new(0));
        let reader = now.clone();
        (Arc::new(move || reader.load(Ordering::SeqCst)), now)
    }

    #[test]
    fn exact_deadline_passes() {
        let (clock, now) = fake_clock();
        let mut d = DeadlineChecker::with_clock(100, clock);
        d.start();
        now.store(100, Ordering::SeqCst);
        assert!(d.check().is_ok());
    }

    #[test]
    fn one_over_fails() {
        let (clock, now) = fake_clock();
        let mut d = DeadlineChecker::with_clock(100, clock);
        d.start();
        now.store(101, Ordering::SeqCst);
        let err = d.check().unwrap_err();
        match err {
            ResourceSignal::DeadlineExceeded { elapsed_ms, limit_ms } => {
                assert_eq!(elapsed_ms, 101);
                assert_eq!(limit_ms, 100);
            }
            _ => panic!("wrong signal"),
        }
    }

    #[test]
    fn restart_resets_timed_out() {
        let (clock, now) = fake_clock();
        let mut d = DeadlineChecker::with_clock(10, clock);
        d.start();
        now.store(20, Ordering::SeqCst);
        assert!(d.check().is_err());
        d.start();
        now.store(25, Ordering::SeqCst);
        assert!(d.check().is_ok());
    }
}
