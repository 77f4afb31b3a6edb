use crate::frame::LoopEvent;

use super::{InputEvent, Key, KeyState};

/// Key that flips vsync.
pub const VSYNC_TOGGLE_KEY: Key = Key::V;

/// Maps an input event to the loop action bound to it.
///
/// Only fresh presses count; auto-repeat is ignored so holding the key
/// toggles once.
pub fn loop_event_for(event: &InputEvent) -> Option<LoopEvent> {
    match *event {
        InputEvent::Key {
            key: VSYNC_TOGGLE_KEY,
            state: KeyState::Pressed,
            repeat: false,
        } => Some(LoopEvent::ToggleVsync),
        _ => None,
    }
}
