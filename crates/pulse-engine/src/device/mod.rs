//! wgpu backend.
//!
//! This module is responsible for:
//! - acquiring the wgpu Instance/Adapter/Device/Queue once at startup
//! - creating & configuring the Surface as a ring of back-buffers
//! - lowering recorded frames into render passes
//! - a fence built on submission indices and completion callbacks

mod context;
mod error;
mod fence;
mod init;
mod provider;
mod queue;
mod surface;

pub use context::{WgpuFrameLoop, create_frame_loop};
pub use error::SurfaceErrorAction;
pub use fence::WgpuFence;
pub use init::GpuInit;
pub use provider::{create_device, create_instance, enumerate_adapters};
pub use queue::WgpuQueue;
pub use surface::WgpuSwapchain;
