use anyhow::Result;

use super::pool::CommandList;
use super::present::Swapchain;

/// Outcome of handing a command list to the queue.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Submission {
    /// Commands were submitted; the back-buffer must be presented.
    Submitted,
    /// The surface could not provide a back-buffer; nothing was submitted.
    Skipped,
}

/// Command queue executing closed lists against a surface's back-buffers.
///
/// Lists execute in submission order.
pub trait CommandQueue<S: Swapchain> {
    /// Lowers `list` into native commands and submits them.
    ///
    /// Errors are fatal to the frame loop; recoverable surface conditions are
    /// reported as [`Submission::Skipped`].
    fn execute(&mut self, list: CommandList<'_>, surface: &mut S) -> Result<Submission>;
}
