use anyhow::{Result, bail};

use crate::frame::{Command, CommandList, CommandQueue, StateTracker, Submission};

use super::{SurfaceErrorAction, WgpuSwapchain};

/// wgpu command queue lowering recorded frames into render passes.
///
/// wgpu derives resource barriers from how a pass uses a texture, so explicit
/// transitions are validated but emit nothing.
pub struct WgpuQueue {
    device: wgpu::Device,
    queue: wgpu::Queue,
}

impl WgpuQueue {
    pub fn new(device: wgpu::Device, queue: wgpu::Queue) -> Self {
        Self { device, queue }
    }
}

impl<'w> CommandQueue<WgpuSwapchain<'w>> for WgpuQueue {
    fn execute(
        &mut self,
        list: CommandList<'_>,
        surface: &mut WgpuSwapchain<'w>,
    ) -> Result<Submission> {
        let slot = list.slot();
        StateTracker::validate(slot, list.commands())?;

        let view = match surface.acquire() {
            Ok(view) => view,
            Err(SurfaceErrorAction::Fatal) => bail!("slot {slot}: surface out of memory"),
            Err(action) => {
                log::warn!("slot {slot}: no back-buffer ({action:?}); skipping frame");
                return Ok(Submission::Skipped);
            }
        };

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("pulse frame encoder"),
            });

        for cmd in list.commands() {
            match *cmd {
                Command::Transition { .. } => {}
                Command::Clear { color, .. } => {
                    let _rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                        label: Some("pulse clear"),
                        color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                            view,
                            resolve_target: None,
                            ops: wgpu::Operations {
                                load: wgpu::LoadOp::Clear(color.to_wgpu()),
                                store: wgpu::StoreOp::Store,
                            },
                            depth_slice: None,
                        })],
                        depth_stencil_attachment: None,
                        timestamp_writes: None,
                        occlusion_query_set: None,
                        multiview_mask: None,
                    });
                }
            }
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        Ok(Submission::Submitted)
    }
}
