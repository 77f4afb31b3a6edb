use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// Completion counter shared between the GPU completion side and the CPU thread.
///
/// The GPU side calls [`Timeline::advance`] from completion callbacks; the CPU
/// thread blocks in [`Timeline::wait_until`] on a condition variable instead of
/// polling the value.
///
/// Invariant: the stored value never decreases.
#[derive(Debug, Default)]
pub struct Timeline {
    completed: Mutex<u64>,
    advanced: Condvar,
}

impl Timeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the highest value completed so far.
    pub fn value(&self) -> u64 {
        *self.lock()
    }

    /// Marks `value` as completed and wakes all waiters.
    ///
    /// Values at or below the current one are ignored.
    pub fn advance(&self, value: u64) {
        let mut completed = self.lock();
        if value > *completed {
            *completed = value;
            self.advanced.notify_all();
        }
    }

    /// Blocks until the completed value reaches `target` or `timeout` elapses.
    ///
    /// `None` waits without a deadline. Returns the value observed on wake-up,
    /// which is below `target` only when the timeout elapsed.
    pub fn wait_until(&self, target: u64, timeout: Option<Duration>) -> u64 {
        let guard = self.lock();

        let guard = match timeout {
            None => self
                .advanced
                .wait_while(guard, |completed| *completed < target)
                .unwrap_or_else(PoisonError::into_inner),
            Some(timeout) => {
                self.advanced
                    .wait_timeout_while(guard, timeout, |completed| *completed < target)
                    .unwrap_or_else(PoisonError::into_inner)
                    .0
            }
        };

        *guard
    }

    // A panicking completion callback must not wedge the CPU thread.
    fn lock(&self) -> MutexGuard<'_, u64> {
        self.completed.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn starts_at_zero() {
        assert_eq!(Timeline::new().value(), 0);
    }

    #[test]
    fn advance_never_moves_backwards() {
        let t = Timeline::new();
        t.advance(5);
        t.advance(3);
        assert_eq!(t.value(), 5);
    }

    #[test]
    fn wait_returns_immediately_when_reached() {
        let t = Timeline::new();
        t.advance(2);
        assert_eq!(t.wait_until(2, Some(Duration::ZERO)), 2);
    }

    #[test]
    fn wait_times_out_below_target() {
        let t = Timeline::new();
        t.advance(1);
        assert_eq!(t.wait_until(4, Some(Duration::from_millis(10))), 1);
    }

    #[test]
    fn wait_wakes_when_another_thread_advances() {
        let t = Arc::new(Timeline::new());
        let producer = {
            let t = Arc::clone(&t);
            thread::spawn(move || {
                for v in 1..=3 {
                    thread::sleep(Duration::from_millis(2));
                    t.advance(v);
                }
            })
        };

        let observed = t.wait_until(3, None);
        assert!(observed >= 3);
        producer.join().unwrap();
    }
}
