use anyhow::Result;

/// Arguments for a single present call.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct PresentParams {
    /// Vertical blanks to wait before display: 1 with vsync, 0 without.
    pub sync_interval: u32,
    /// Display immediately, mid-scan if necessary.
    pub allow_tearing: bool,
}

impl PresentParams {
    /// Builds the arguments for the next present.
    ///
    /// Tearing is requested only when vsync is off and the output supports it.
    pub fn new(vsync: bool, tearing_supported: bool) -> Self {
        Self {
            sync_interval: u32::from(vsync),
            allow_tearing: tearing_supported && !vsync,
        }
    }

    pub fn vsync(&self) -> bool {
        self.sync_interval > 0
    }
}

/// Presentation surface owning the rotating back-buffers.
///
/// The surface is the only authority on which slot is current. Consumers query
/// [`current_slot_index`](Self::current_slot_index) after each present rather
/// than incrementing locally: present modes may hand buffers back out of order.
pub trait Swapchain {
    /// Number of back-buffers, fixed at creation.
    fn buffer_count(&self) -> usize;

    /// Slot to render the next frame into.
    fn current_slot_index(&self) -> usize;

    /// Whether the output can present with tearing. Queried once at creation.
    fn tearing_supported(&self) -> bool;

    /// Whether the back-buffers have a drawable area. False while the window
    /// is minimized; no frame may be rendered until a non-zero resize.
    fn is_drawable(&self) -> bool;

    /// Hands the finished frame to the display.
    fn present(&mut self, params: PresentParams) -> Result<()>;

    /// Recreates the back-buffers at a new size.
    ///
    /// Callers must flush the queue first; no back-buffer may be in flight.
    fn resize(&mut self, width: u32, height: u32);
}
