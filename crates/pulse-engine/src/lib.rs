//! Pulse engine crate.
//!
//! A fence-synchronized frame loop: a ring of back-buffers, one command
//! allocator per buffer, and a monotonic fence that keeps the CPU from
//! reusing an allocator the GPU has not finished with.

pub mod device;
pub mod frame;
pub mod input;
pub mod sync;
pub mod time;
pub mod window;

pub mod logging;
pub mod paint;

#[cfg(test)]
mod testing;
