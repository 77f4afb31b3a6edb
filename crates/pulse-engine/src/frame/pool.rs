use crate::paint::Color;

use super::command::{Command, ResourceState};

/// Backing storage for one slot's recorded commands.
///
/// Resetting keeps the allocation; only the contents are discarded.
#[derive(Debug, Default)]
pub struct CommandAllocator {
    commands: Vec<Command>,
}

impl CommandAllocator {
    fn reset(&mut self) {
        self.commands.clear();
    }
}

/// One entry of the slot ring: an allocator plus the fence value guarding it.
#[derive(Debug, Default)]
struct FrameSlot {
    allocator: CommandAllocator,

    /// Value that must complete before `allocator` may be reset. 0 = never submitted.
    fence_value: u64,
}

/// Recorder shared by all slots; open against at most one allocator at a time.
#[derive(Debug, Default)]
struct CommandRecorder {
    open_slot: Option<usize>,
}

/// A closed command list, submittable once.
///
/// Borrows the slot's allocator, so the pool cannot reopen that slot while the
/// list is alive.
#[derive(Debug)]
pub struct CommandList<'a> {
    slot: usize,
    commands: &'a [Command],
}

impl<'a> CommandList<'a> {
    pub fn slot(&self) -> usize {
        self.slot
    }

    pub fn commands(&self) -> &'a [Command] {
        self.commands
    }
}

/// Per-slot command allocators, one shared recorder, and the slot → fence value table.
#[derive(Debug)]
pub struct FramePool {
    slots: Vec<FrameSlot>,
    recorder: CommandRecorder,
}

impl FramePool {
    /// # Panics
    ///
    /// Panics if `slot_count` is below 2; a single slot leaves nothing to rotate.
    pub fn new(slot_count: usize) -> Self {
        assert!(slot_count >= 2, "frame pool needs at least 2 slots, got {slot_count}");
        Self {
            slots: (0..slot_count).map(|_| FrameSlot::default()).collect(),
            recorder: CommandRecorder::default(),
        }
    }

    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// Fence value recorded for `slot` by its most recent submission.
    pub fn fence_value(&self, slot: usize) -> u64 {
        self.slots[slot].fence_value
    }

    /// Records the value signaled after `slot`'s submission.
    ///
    /// # Panics
    ///
    /// Panics if `value` does not exceed the slot's previous value.
    pub fn set_fence_value(&mut self, slot: usize, value: u64) {
        let entry = &mut self.slots[slot];
        assert!(
            value > entry.fence_value,
            "slot {slot}: fence value must increase ({value} <= {})",
            entry.fence_value
        );
        entry.fence_value = value;
    }

    /// Resets `slot`'s allocator and opens the recorder against it.
    ///
    /// `completed` is the fence value the CPU has observed complete.
    ///
    /// # Panics
    ///
    /// Panics if the slot's last submission has not retired, or if the
    /// recorder is already open.
    pub fn begin_frame(&mut self, slot: usize, completed: u64) {
        if let Some(open) = self.recorder.open_slot {
            panic!("begin_frame({slot}) while recorder is still open on slot {open}");
        }

        let entry = &mut self.slots[slot];
        assert!(
            completed >= entry.fence_value,
            "slot {slot}: allocator reset while GPU work is in flight (needs {}, completed {completed})",
            entry.fence_value
        );

        entry.allocator.reset();
        self.recorder.open_slot = Some(slot);
    }

    /// Records one command into the open slot.
    ///
    /// # Panics
    ///
    /// Panics if no frame is open.
    pub fn record(&mut self, cmd: Command) {
        let slot = self.open_slot();
        self.slots[slot].allocator.commands.push(cmd);
    }

    /// Records the per-frame workload: present → render target, clear, back to present.
    pub fn record_clear(&mut self, color: Color) {
        let slot = self.open_slot();

        self.record(Command::Transition {
            slot,
            before: ResourceState::Present,
            after: ResourceState::RenderTarget,
        });
        self.record(Command::Clear { slot, color });
        self.record(Command::Transition {
            slot,
            before: ResourceState::RenderTarget,
            after: ResourceState::Present,
        });
    }

    /// Closes the recorder and returns the list for submission.
    ///
    /// # Panics
    ///
    /// Panics if no frame is open.
    pub fn end_frame(&mut self) -> CommandList<'_> {
        let slot = self.open_slot();
        self.recorder.open_slot = None;

        CommandList {
            slot,
            commands: &self.slots[slot].allocator.commands,
        }
    }

    fn open_slot(&self) -> usize {
        match self.recorder.open_slot {
            Some(slot) => slot,
            None => panic!("command recorder is closed; call begin_frame first"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_slots_need_no_completion() {
        let pool = FramePool::new(3);
        assert_eq!(pool.slot_count(), 3);
        assert!((0..3).all(|s| pool.fence_value(s) == 0));
    }

    #[test]
    fn records_the_three_step_sequence() {
        let mut pool = FramePool::new(3);
        pool.begin_frame(1, 0);
        pool.record_clear(Color::CORNFLOWER_BLUE);
        let list = pool.end_frame();

        assert_eq!(list.slot(), 1);
        assert_eq!(
            list.commands(),
            &[
                Command::Transition {
                    slot: 1,
                    before: ResourceState::Present,
                    after: ResourceState::RenderTarget,
                },
                Command::Clear {
                    slot: 1,
                    color: Color::CORNFLOWER_BLUE,
                },
                Command::Transition {
                    slot: 1,
                    before: ResourceState::RenderTarget,
                    after: ResourceState::Present,
                },
            ]
        );
    }

    #[test]
    fn reset_discards_previous_frame() {
        let mut pool = FramePool::new(2);
        pool.begin_frame(0, 0);
        pool.record_clear(Color::BLACK);
        pool.end_frame();
        pool.set_fence_value(0, 1);

        pool.begin_frame(0, 1);
        assert!(pool.end_frame().commands().is_empty());
    }

    #[test]
    #[should_panic(expected = "in flight")]
    fn reset_before_completion_panics() {
        let mut pool = FramePool::new(3);
        pool.set_fence_value(2, 5);
        pool.begin_frame(2, 4);
    }

    #[test]
    #[should_panic(expected = "still open")]
    fn double_begin_panics() {
        let mut pool = FramePool::new(3);
        pool.begin_frame(0, 0);
        pool.begin_frame(1, 0);
    }

    #[test]
    #[should_panic(expected = "recorder is closed")]
    fn end_without_begin_panics() {
        let mut pool = FramePool::new(3);
        pool.end_frame();
    }

    #[test]
    #[should_panic(expected = "must increase")]
    fn fence_value_cannot_repeat() {
        let mut pool = FramePool::new(3);
        pool.set_fence_value(0, 2);
        pool.set_fence_value(0, 2);
    }

    #[test]
    #[should_panic(expected = "at least 2")]
    fn single_slot_pool_is_rejected() {
        FramePool::new(1);
    }
}
