//! In-process fake GPU for exercising the frame loop without a device.
//!
//! All fakes share a [`Journal`]: an ordered event log plus the completion
//! [`Timeline`] the fake fence advances from a worker thread.

use std::cell::Cell;
use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result, bail};

use crate::frame::{CommandList, CommandQueue, PresentParams, StateTracker, Submission, Swapchain};
use crate::sync::{FenceBackend, Timeline};

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Event {
    Submit { slot: usize, completed: u64 },
    Present(PresentParams),
    Signal(u64),
    Block(u64),
    Resize { width: u32, height: u32, completed: u64 },
}

#[derive(Clone, Default)]
pub(crate) struct Journal {
    events: Arc<Mutex<Vec<Event>>>,
    timeline: Arc<Timeline>,
}

impl Journal {
    fn push(&self, event: Event) {
        self.events.lock().unwrap().push(event);
    }

    fn completed(&self) -> u64 {
        self.timeline.value()
    }

    pub(crate) fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    pub(crate) fn signals(&self) -> Vec<u64> {
        self.filter(|e| match e {
            Event::Signal(v) => Some(*v),
            _ => None,
        })
    }

    pub(crate) fn blocks(&self) -> Vec<u64> {
        self.filter(|e| match e {
            Event::Block(v) => Some(*v),
            _ => None,
        })
    }

    pub(crate) fn presents(&self) -> Vec<PresentParams> {
        self.filter(|e| match e {
            Event::Present(p) => Some(*p),
            _ => None,
        })
    }

    pub(crate) fn submitted_slots(&self) -> Vec<usize> {
        self.filter(|e| match e {
            Event::Submit { slot, .. } => Some(*slot),
            _ => None,
        })
    }

    fn filter<T>(&self, f: impl Fn(&Event) -> Option<T>) -> Vec<T> {
        self.events.lock().unwrap().iter().filter_map(f).collect()
    }
}

/// Swapchain handing out slots in a fixed cyclic order.
pub(crate) struct FakeSwapchain {
    journal: Journal,
    buffer_count: usize,
    order: Vec<usize>,
    presented: usize,
    tearing: bool,
    extent: (u32, u32),
}

impl FakeSwapchain {
    pub(crate) fn rotating(journal: Journal, buffer_count: usize) -> Self {
        Self::with_order(journal, buffer_count, (0..buffer_count).collect())
    }

    pub(crate) fn with_order(journal: Journal, buffer_count: usize, order: Vec<usize>) -> Self {
        assert!(order.iter().all(|s| *s < buffer_count));
        Self {
            journal,
            buffer_count,
            order,
            presented: 0,
            tearing: true,
            extent: (1280, 720),
        }
    }

    pub(crate) fn without_tearing(mut self) -> Self {
        self.tearing = false;
        self
    }
}

impl Swapchain for FakeSwapchain {
    fn buffer_count(&self) -> usize {
        self.buffer_count
    }

    fn current_slot_index(&self) -> usize {
        self.order[self.presented % self.order.len()]
    }

    fn tearing_supported(&self) -> bool {
        self.tearing
    }

    fn is_drawable(&self) -> bool {
        self.extent.0 > 0 && self.extent.1 > 0
    }

    fn present(&mut self, params: PresentParams) -> Result<()> {
        if params.allow_tearing && !self.tearing {
            bail!("tearing requested on an output without support");
        }
        self.journal.push(Event::Present(params));
        self.presented += 1;
        Ok(())
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.journal.push(Event::Resize {
            width,
            height,
            completed: self.journal.completed(),
        });
        self.extent = (width, height);
        self.presented = 0;
    }
}

/// Queue that validates and journals submissions.
pub(crate) struct FakeQueue {
    journal: Journal,
    skip_next: Cell<bool>,
    fail_next: Cell<bool>,
}

impl FakeQueue {
    pub(crate) fn new(journal: Journal) -> Self {
        Self {
            journal,
            skip_next: Cell::new(false),
            fail_next: Cell::new(false),
        }
    }

    /// Reports the next submission as skipped, as a lost surface would.
    pub(crate) fn skip_next(&self) {
        self.skip_next.set(true);
    }

    pub(crate) fn fail_next(&self) {
        self.fail_next.set(true);
    }
}

impl CommandQueue<FakeSwapchain> for FakeQueue {
    fn execute(&mut self, list: CommandList<'_>, surface: &mut FakeSwapchain) -> Result<Submission> {
        if self.fail_next.take() {
            bail!("device lost");
        }

        StateTracker::validate(list.slot(), list.commands())?;
        assert_eq!(list.slot(), surface.current_slot_index());

        if self.skip_next.take() {
            return Ok(Submission::Skipped);
        }

        self.journal.push(Event::Submit {
            slot: list.slot(),
            completed: self.journal.completed(),
        });
        Ok(Submission::Submitted)
    }
}

/// Fence completed by a worker thread `latency` after each signal, in order.
pub(crate) struct FakeFence {
    journal: Journal,
    lost: bool,
    sender: Option<mpsc::Sender<u64>>,
    worker: Option<thread::JoinHandle<()>>,
}

impl FakeFence {
    pub(crate) fn new(journal: Journal, latency: Duration) -> Self {
        let (sender, receiver) = mpsc::channel::<u64>();
        let timeline = Arc::clone(&journal.timeline);

        let worker = thread::spawn(move || {
            for value in receiver {
                if !latency.is_zero() {
                    thread::sleep(latency);
                }
                timeline.advance(value);
            }
        });

        Self {
            journal,
            lost: false,
            sender: Some(sender),
            worker: Some(worker),
        }
    }

    /// A fence whose GPU never completes anything.
    pub(crate) fn stalled(journal: Journal) -> Self {
        Self {
            journal,
            lost: false,
            sender: None,
            worker: None,
        }
    }

    /// A stalled fence whose device is gone: every blocking wait fails.
    pub(crate) fn lost(journal: Journal) -> Self {
        Self {
            journal,
            lost: true,
            sender: None,
            worker: None,
        }
    }

    pub(crate) fn timeline(&self) -> &Timeline {
        &self.journal.timeline
    }
}

impl FenceBackend for FakeFence {
    fn completed_value(&self) -> u64 {
        self.journal.completed()
    }

    fn signal(&mut self, value: u64) -> Result<()> {
        self.journal.push(Event::Signal(value));
        if let Some(sender) = &self.sender {
            sender.send(value).context("fake GPU worker exited")?;
        }
        Ok(())
    }

    fn block_until(&mut self, value: u64, timeout: Option<Duration>) -> Result<u64> {
        self.journal.push(Event::Block(value));
        if self.lost {
            bail!("device lost while waiting for fence value {value}");
        }
        Ok(self.journal.timeline.wait_until(value, timeout))
    }
}

impl Drop for FakeFence {
    fn drop(&mut self) {
        self.sender.take();
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}
