//! Window + message pump.
//!
//! Owns the `winit` EventLoop and Window, and drives the frame loop once per
//! pump of pending window events.

mod runtime;

pub use runtime::{Runtime, RuntimeConfig};
