//! Color types used by recorded commands.

mod color;

pub use color::Color;
