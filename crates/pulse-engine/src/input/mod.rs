//! Input subsystem.
//!
//! Public API is platform-agnostic and does not expose winit types.
//! Runtime code translates platform events into `InputEvent`s; `binding`
//! decides which of them drive the frame loop.

mod binding;
mod types;

pub use binding::{VSYNC_TOGGLE_KEY, loop_event_for};
pub use types::{InputEvent, Key, KeyState};
