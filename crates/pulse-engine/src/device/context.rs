use anyhow::{Context, Result};
use winit::window::Window;

use crate::frame::{FrameLoop, LoopConfig};

use super::{GpuInit, WgpuFence, WgpuQueue, WgpuSwapchain, provider};

/// Frame loop driven by the wgpu backend for a window borrowed for `'w`.
pub type WgpuFrameLoop<'w> = FrameLoop<WgpuSwapchain<'w>, WgpuQueue, WgpuFence>;

/// Performs the one-time GPU setup for `window` and assembles the frame loop.
///
/// Order: instance → surface → adapter → device/queue → swapchain → fence.
/// Adapter/device acquisition is asynchronous under wgpu. The returned loop
/// is `Uninitialized`; call `start` to enter `Running`.
pub async fn create_frame_loop<'w>(
    window: &'w Window,
    init: GpuInit,
    config: LoopConfig,
) -> Result<WgpuFrameLoop<'w>> {
    let instance = provider::create_instance();

    // Surface lifetime is tied to `window` via `'w`.
    let surface = instance
        .create_surface(window)
        .context("failed to create wgpu surface")?;

    let adapter = provider::enumerate_adapters(&instance, &surface, init.prefer_software).await?;
    let (device, queue) = provider::create_device(&adapter, &init).await?;

    let swapchain = WgpuSwapchain::new(window, surface, &adapter, &device, &init)
        .context("failed to create swapchain")?;
    let command_queue = WgpuQueue::new(device.clone(), queue.clone());
    let fence = WgpuFence::new(device, queue);

    Ok(FrameLoop::new(swapchain, command_queue, fence, config))
}
