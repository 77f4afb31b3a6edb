use anyhow::{Result, bail};

use crate::paint::Color;

/// Declared usage of a back-buffer.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ResourceState {
    /// Owned by the presentation engine; may be handed to the display.
    Present,
    /// Bound as a color attachment; may be cleared or drawn into.
    RenderTarget,
}

/// Backend-neutral command stream recorded once per frame.
///
/// Backends lower a closed list into native GPU commands at submission.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum Command {
    /// Resource-state transition of the slot's back-buffer.
    Transition {
        slot: usize,
        before: ResourceState,
        after: ResourceState,
    },
    /// Clear of the slot's back-buffer view.
    Clear { slot: usize, color: Color },
}

/// Tracks a back-buffer's state across a command stream.
///
/// Back-buffers enter and leave every frame in [`ResourceState::Present`].
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct StateTracker {
    slot: usize,
    state: ResourceState,
}

impl StateTracker {
    pub fn new(slot: usize) -> Self {
        Self {
            slot,
            state: ResourceState::Present,
        }
    }

    pub fn state(&self) -> ResourceState {
        self.state
    }

    /// Applies `cmd`, rejecting commands that assume a state the buffer is not in.
    pub fn apply(&mut self, cmd: &Command) -> Result<()> {
        match *cmd {
            Command::Transition { slot, before, after } => {
                self.check_slot(slot)?;
                if before != self.state {
                    bail!(
                        "slot {slot}: transition declares {before:?} but buffer is {:?}",
                        self.state
                    );
                }
                self.state = after;
            }
            Command::Clear { slot, .. } => {
                self.check_slot(slot)?;
                if self.state != ResourceState::RenderTarget {
                    bail!("slot {slot}: clear issued while buffer is {:?}", self.state);
                }
            }
        }
        Ok(())
    }

    /// Validates a whole frame: every command applies and the buffer ends presentable.
    pub fn validate(slot: usize, commands: &[Command]) -> Result<()> {
        let mut tracker = Self::new(slot);
        for cmd in commands {
            tracker.apply(cmd)?;
        }
        if tracker.state != ResourceState::Present {
            bail!("slot {slot}: frame ends with buffer in {:?}", tracker.state);
        }
        Ok(())
    }

    fn check_slot(&self, slot: usize) -> Result<()> {
        if slot != self.slot {
            bail!("command targets slot {slot} inside a frame recorded for slot {}", self.slot);
        }
        Ok(())
    }
}
