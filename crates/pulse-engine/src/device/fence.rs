use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::sync::{FenceBackend, Timeline};

/// Fence built from wgpu submission indices and completion callbacks.
///
/// Each signal submits an empty batch and registers a callback that advances
/// the shared [`Timeline`] once all prior work on the queue has finished.
/// Callbacks only run while the device is polled, so waits block inside
/// `Device::poll` on the submission index covering the target value.
pub struct WgpuFence {
    device: wgpu::Device,
    queue: wgpu::Queue,
    timeline: Arc<Timeline>,

    /// Signaled values not yet observed complete, oldest first.
    pending: VecDeque<(u64, wgpu::SubmissionIndex)>,
}

impl WgpuFence {
    pub fn new(device: wgpu::Device, queue: wgpu::Queue) -> Self {
        Self {
            device,
            queue,
            timeline: Arc::new(Timeline::new()),
            pending: VecDeque::new(),
        }
    }

    fn retire(&mut self, completed: u64) {
        while self.pending.front().is_some_and(|(v, _)| *v <= completed) {
            self.pending.pop_front();
        }
    }
}

impl FenceBackend for WgpuFence {
    fn completed_value(&self) -> u64 {
        if let Err(err) = self.device.poll(wgpu::PollType::Poll) {
            log::warn!("device poll failed: {err}");
        }
        self.timeline.value()
    }

    fn signal(&mut self, value: u64) -> Result<()> {
        // Most waits finish without reaching the backend; drop what already retired.
        self.retire(self.timeline.value());

        let index = self.queue.submit(std::iter::empty());

        let timeline = Arc::clone(&self.timeline);
        self.queue
            .on_submitted_work_done(move || timeline.advance(value));

        self.pending.push_back((value, index));
        Ok(())
    }

    fn block_until(&mut self, value: u64, timeout: Option<Duration>) -> Result<u64> {
        let index = self
            .pending
            .iter()
            .find(|(v, _)| *v >= value)
            .map(|(_, index)| index.clone());

        if let Some(index) = index {
            match self.device.poll(wgpu::PollType::Wait {
                submission_index: Some(index),
                timeout,
            }) {
                Ok(_) | Err(wgpu::PollError::Timeout) => {}
                Err(err) => return Err(err).context("device poll failed"),
            }
        }

        let completed = self.timeline.value();
        self.retire(completed);
        Ok(completed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::Fence;

    fn noop_fence() -> Fence<WgpuFence> {
        let (device, queue) = wgpu::Device::noop(&wgpu::DeviceDescriptor::default());
        Fence::new(WgpuFence::new(device, queue))
    }

    #[test]
    fn wait_reaches_the_signaled_value() {
        let mut fence = noop_fence();
        let v = fence.signal().unwrap();

        fence.wait_until(v, None).unwrap();
        assert!(fence.completed_value() >= v);
    }

    #[test]
    fn pending_stays_bounded_when_waits_are_already_complete() {
        let mut fence = noop_fence();

        for _ in 0..1000 {
            let v = fence.signal().unwrap();
            fence.wait_until(v.saturating_sub(2), None).unwrap();
        }

        let pending = fence.backend().pending.len();
        assert!(pending <= 3, "pending grew to {pending}");
    }

    #[test]
    fn signal_after_flush_keeps_only_the_new_value() {
        let mut fence = noop_fence();
        for _ in 0..5 {
            fence.note_submission();
            fence.signal().unwrap();
        }
        assert_eq!(fence.flush().unwrap(), 5);

        fence.signal().unwrap();
        let pending: Vec<u64> = fence.backend().pending.iter().map(|(v, _)| *v).collect();
        assert_eq!(pending, vec![6]);
    }
}
