use std::time::Duration;

use anyhow::Result;

use super::SyncError;

/// GPU-side half of a fence: the object the queue signals and the CPU observes.
///
/// Implementations must block on an OS primitive in [`block_until`](Self::block_until);
/// spinning on [`completed_value`](Self::completed_value) is not acceptable.
pub trait FenceBackend {
    /// Highest value the GPU has completed, queried live.
    fn completed_value(&self) -> u64;

    /// Enqueues a signal of `value` behind all work submitted so far.
    fn signal(&mut self, value: u64) -> Result<()>;

    /// Blocks until `value` completes or `timeout` elapses.
    ///
    /// Returns the completed value observed on return.
    fn block_until(&mut self, value: u64, timeout: Option<Duration>) -> Result<u64>;
}

/// CPU-side fence synchronizer.
///
/// Owns the monotonic counter handed out to submissions and the protocol for
/// waiting on them. Values start at 1; a recorded value of 0 is always complete.
pub struct Fence<B> {
    backend: B,

    /// Last value handed to the backend. The next signal uses `last_signaled + 1`.
    last_signaled: u64,

    /// Highest completed value seen so far.
    observed: u64,

    /// Work was submitted after the last signal.
    unsignaled_work: bool,
}

impl<B: FenceBackend> Fence<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            last_signaled: 0,
            observed: 0,
            unsignaled_work: false,
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Last value returned by [`signal`](Self::signal).
    pub fn last_signaled(&self) -> u64 {
        self.last_signaled
    }

    /// Queries the completed value from the backend.
    pub fn completed_value(&mut self) -> u64 {
        let completed = self.backend.completed_value();
        self.observe(completed)
    }

    /// Records that a command list was submitted and is not yet covered by a signal.
    pub fn note_submission(&mut self) {
        self.unsignaled_work = true;
    }

    /// Signals the next value on the queue and returns it.
    pub fn signal(&mut self) -> Result<u64, SyncError> {
        let value = self.last_signaled + 1;
        self.backend.signal(value)?;

        self.last_signaled = value;
        self.unsignaled_work = false;

        log::trace!("fence signal {value}");
        Ok(value)
    }

    /// Blocks until `value` has completed on the GPU.
    ///
    /// Returns without blocking when the value is already complete. `None`
    /// waits without a deadline.
    ///
    /// # Panics
    ///
    /// Panics if `value` was never signaled; such a wait could never finish.
    pub fn wait_until(&mut self, value: u64, timeout: Option<Duration>) -> Result<(), SyncError> {
        assert!(
            value <= self.last_signaled,
            "wait on fence value {value} which was never signaled (last signaled: {})",
            self.last_signaled
        );

        if self.completed_value() >= value {
            return Ok(());
        }

        log::trace!("fence wait {value} (completed: {})", self.observed);
        let completed = self.backend.block_until(value, timeout)?;
        let completed = self.observe(completed);

        if completed < value {
            return Err(SyncError::Timeout {
                target: value,
                completed,
            });
        }

        Ok(())
    }

    /// Waits until every submission made so far has retired.
    ///
    /// A new value is signaled only when work was submitted after the last
    /// signal. Returns the value waited on.
    pub fn flush(&mut self) -> Result<u64, SyncError> {
        let target = if self.unsignaled_work {
            self.signal()?
        } else {
            self.last_signaled
        };

        self.wait_until(target, None)?;
        Ok(target)
    }

    fn observe(&mut self, completed: u64) -> u64 {
        debug_assert!(
            completed >= self.observed,
            "fence completed value went backwards: {completed} < {}",
            self.observed
        );
        self.observed = self.observed.max(completed);
        self.observed
    }
}
