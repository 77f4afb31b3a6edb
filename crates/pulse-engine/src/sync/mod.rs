//! CPU/GPU synchronization.
//!
//! A single fence counter orders every submission. The CPU records the value a
//! submission will signal and later blocks until the GPU reports it complete:
//! - [`Timeline`] is the blocking "wait until counter >= target" primitive
//! - [`FenceBackend`] is the GPU-side object the queue signals
//! - [`Fence`] hands out values and implements wait/flush on top of a backend

mod error;
mod fence;
mod timeline;

pub use error::SyncError;
pub use fence::{Fence, FenceBackend};
pub use timeline::Timeline;
