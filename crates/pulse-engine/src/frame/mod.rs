//! Frame submission core.
//!
//! This module is responsible for:
//! - the presentation contract ([`Swapchain`]) and per-present arguments
//! - per-slot command allocators and the shared recorder ([`FramePool`])
//! - the backend-neutral command stream and its state validation
//! - the loop controller tying surface, queue and fence together ([`FrameLoop`])
//!
//! Backends implement [`Swapchain`] and [`CommandQueue`]; see `crate::device`
//! for the wgpu implementation.

mod command;
mod controller;
mod pool;
mod present;
mod queue;

pub use command::{Command, ResourceState, StateTracker};
pub use controller::{FrameLoop, LoopConfig, LoopEvent, LoopState};
pub use pool::{CommandAllocator, CommandList, FramePool};
pub use present::{PresentParams, Swapchain};
pub use queue::{CommandQueue, Submission};
