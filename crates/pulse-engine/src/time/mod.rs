//! Time subsystem.
//!
//! Frame pacing statistics for the loop's update step. Nothing here feeds back
//! into rendering; the counter exists to report frames per second.

mod fps;

pub use fps::{FpsCounter, FpsSample};
