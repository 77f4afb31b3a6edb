use anyhow::{Context, Result, ensure};
use winit::dpi::PhysicalSize;
use winit::window::Window;

use crate::frame::{PresentParams, Swapchain};

use super::{GpuInit, SurfaceErrorAction};

/// A back-buffer acquired from the surface and not yet presented.
struct AcquiredFrame {
    texture: wgpu::SurfaceTexture,
    view: wgpu::TextureView,
}

/// wgpu surface driven as a fixed ring of back-buffers.
///
/// wgpu does not expose swapchain image indices, so the current slot comes
/// from this surface's own present accounting. Present arguments map onto
/// present modes; a change of mode reconfigures the surface after the present
/// that requested it.
pub struct WgpuSwapchain<'w> {
    /// Window the surface is bound to; outlives the swapchain via `'w`.
    window: &'w Window,

    surface: wgpu::Surface<'w>,
    device: wgpu::Device,

    /// Active surface configuration.
    config: wgpu::SurfaceConfiguration,

    /// Current drawable size in physical pixels.
    size: PhysicalSize<u32>,

    /// Present modes reported by the adapter at creation.
    present_modes: Vec<wgpu::PresentMode>,
    tearing_supported: bool,

    buffer_count: usize,

    /// Frames presented since the buffers were last (re)created.
    presented: u64,

    frame: Option<AcquiredFrame>,
}

impl<'w> WgpuSwapchain<'w> {
    /// Configures `surface` for `init.buffer_count` back-buffers at the window's size.
    pub fn new(
        window: &'w Window,
        surface: wgpu::Surface<'w>,
        adapter: &wgpu::Adapter,
        device: &wgpu::Device,
        init: &GpuInit,
    ) -> Result<Self> {
        let size = window.inner_size();
        ensure!(size.width > 0 && size.height > 0, "window has zero size");
        ensure!(
            init.buffer_count >= 2,
            "swapchain needs at least 2 buffers, got {}",
            init.buffer_count
        );

        let caps = surface.get_capabilities(adapter);
        ensure!(
            !caps.present_modes.is_empty(),
            "surface cannot present with the selected adapter"
        );

        let format = choose_surface_format(&caps, init.prefer_srgb)
            .context("no supported surface formats")?;
        let alpha_mode = choose_alpha_mode(&caps, init.alpha_mode);

        let tearing_supported = caps.present_modes.contains(&wgpu::PresentMode::Immediate);
        let present_mode = present_mode_for(
            PresentParams::new(init.vsync, tearing_supported),
            &caps.present_modes,
        );

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: size.width,
            height: size.height,
            present_mode,
            alpha_mode,
            view_formats: vec![],
            // Frames queued ahead of the one being displayed.
            desired_maximum_frame_latency: (init.buffer_count - 1) as u32,
        };

        surface.configure(device, &config);

        log::info!(
            "surface: {}x{} {format:?}, {} buffers, {present_mode:?}, modes {:?}, tearing {}",
            size.width,
            size.height,
            init.buffer_count,
            caps.present_modes,
            if tearing_supported { "supported" } else { "unsupported" },
        );

        Ok(Self {
            window,
            surface,
            device: device.clone(),
            config,
            size,
            present_modes: caps.present_modes,
            tearing_supported,
            buffer_count: init.buffer_count,
            presented: 0,
            frame: None,
        })
    }

    /// Returns the view of the current back-buffer, acquiring it on first use.
    pub(crate) fn acquire(&mut self) -> Result<&wgpu::TextureView, SurfaceErrorAction> {
        let frame = match self.frame.take() {
            Some(frame) => frame,
            None => {
                let texture = match self.surface.get_current_texture() {
                    Ok(texture) => texture,
                    Err(err) => {
                        log::warn!("back-buffer acquisition failed: {err}");
                        return Err(self.handle_surface_error(err));
                    }
                };
                let view = texture
                    .texture
                    .create_view(&wgpu::TextureViewDescriptor::default());
                AcquiredFrame { texture, view }
            }
        };

        Ok(&self.frame.insert(frame).view)
    }

    /// Converts a `SurfaceError` into a higher-level action.
    fn handle_surface_error(&mut self, err: wgpu::SurfaceError) -> SurfaceErrorAction {
        map_surface_error(&self.surface, &self.device, &self.config, self.size, err)
    }
}

impl Swapchain for WgpuSwapchain<'_> {
    fn buffer_count(&self) -> usize {
        self.buffer_count
    }

    fn current_slot_index(&self) -> usize {
        (self.presented % self.buffer_count as u64) as usize
    }

    fn tearing_supported(&self) -> bool {
        self.tearing_supported
    }

    fn is_drawable(&self) -> bool {
        self.size.width > 0 && self.size.height > 0
    }

    fn present(&mut self, params: PresentParams) -> Result<()> {
        let AcquiredFrame { texture, view } = self
            .frame
            .take()
            .context("present without an acquired back-buffer")?;

        drop(view);
        self.window.pre_present_notify();
        texture.present();
        self.presented += 1;

        let mode = present_mode_for(params, &self.present_modes);
        if mode != self.config.present_mode {
            log::info!("present mode {:?} -> {mode:?}", self.config.present_mode);
            self.config.present_mode = mode;
            if self.is_drawable() {
                self.surface.configure(&self.device, &self.config);
            }
        }

        Ok(())
    }

    fn resize(&mut self, width: u32, height: u32) {
        debug_assert!(self.frame.is_none(), "resize while a back-buffer is acquired");
        self.frame = None;

        apply_resize(
            &self.surface,
            &self.device,
            &mut self.config,
            &mut self.size,
            PhysicalSize::new(width, height),
        );
        self.presented = 0;
    }
}

/// Picks the present mode matching `params` from the modes the surface supports.
///
/// Without vsync, tearing uses `Immediate`; otherwise `Mailbox` avoids waiting
/// for vblank without tearing. `Fifo` is always supported and is the fallback.
pub(crate) fn present_mode_for(
    params: PresentParams,
    supported: &[wgpu::PresentMode],
) -> wgpu::PresentMode {
    if params.vsync() {
        return wgpu::PresentMode::Fifo;
    }
    if params.allow_tearing && supported.contains(&wgpu::PresentMode::Immediate) {
        return wgpu::PresentMode::Immediate;
    }
    if supported.contains(&wgpu::PresentMode::Mailbox) {
        return wgpu::PresentMode::Mailbox;
    }
    wgpu::PresentMode::Fifo
}

pub(crate) fn choose_surface_format(
    caps: &wgpu::SurfaceCapabilities,
    prefer_srgb: bool,
) -> Option<wgpu::TextureFormat> {
    if prefer_srgb {
        let preferred = [
            wgpu::TextureFormat::Bgra8UnormSrgb,
            wgpu::TextureFormat::Rgba8UnormSrgb,
        ];
        if let Some(f) = preferred.into_iter().find(|f| caps.formats.contains(f)) {
            return Some(f);
        }
    }

    caps.formats.first().copied()
}

pub(crate) fn choose_alpha_mode(
    caps: &wgpu::SurfaceCapabilities,
    requested: Option<wgpu::CompositeAlphaMode>,
) -> wgpu::CompositeAlphaMode {
    requested
        .filter(|m| caps.alpha_modes.contains(m))
        .or_else(|| caps.alpha_modes.first().copied())
        .unwrap_or(wgpu::CompositeAlphaMode::Auto)
}

/// wgpu cannot configure a 0x0 surface; in that case only the size is recorded.
pub(crate) fn apply_resize(
    surface: &wgpu::Surface,
    device: &wgpu::Device,
    config: &mut wgpu::SurfaceConfiguration,
    size: &mut PhysicalSize<u32>,
    new_size: PhysicalSize<u32>,
) {
    *size = new_size;
    if new_size.width == 0 || new_size.height == 0 {
        return;
    }

    config.width = new_size.width;
    config.height = new_size.height;
    surface.configure(device, config);
}

pub(crate) fn map_surface_error(
    surface: &wgpu::Surface,
    device: &wgpu::Device,
    config: &wgpu::SurfaceConfiguration,
    size: PhysicalSize<u32>,
    err: wgpu::SurfaceError,
) -> SurfaceErrorAction {
    match err {
        wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated => {
            if size.width > 0 && size.height > 0 {
                surface.configure(device, config);
            }
            SurfaceErrorAction::Reconfigured
        }
        wgpu::SurfaceError::OutOfMemory => SurfaceErrorAction::Fatal,
        wgpu::SurfaceError::Timeout | wgpu::SurfaceError::Other => SurfaceErrorAction::SkipFrame,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wgpu::PresentMode::{Fifo, Immediate, Mailbox};

    fn caps(formats: Vec<wgpu::TextureFormat>, alpha: Vec<wgpu::CompositeAlphaMode>) -> wgpu::SurfaceCapabilities {
        wgpu::SurfaceCapabilities {
            formats,
            present_modes: vec![Fifo],
            alpha_modes: alpha,
            usages: wgpu::TextureUsages::RENDER_ATTACHMENT,
        }
    }

    #[test]
    fn vsync_always_uses_fifo() {
        let p = PresentParams::new(true, true);
        assert_eq!(present_mode_for(p, &[Fifo, Mailbox, Immediate]), Fifo);
    }

    #[test]
    fn tearing_uses_immediate() {
        let p = PresentParams::new(false, true);
        assert_eq!(present_mode_for(p, &[Fifo, Mailbox, Immediate]), Immediate);
    }

    #[test]
    fn no_tearing_prefers_mailbox() {
        let p = PresentParams::new(false, false);
        assert_eq!(present_mode_for(p, &[Fifo, Mailbox, Immediate]), Mailbox);
    }

    #[test]
    fn no_vsync_falls_back_to_fifo() {
        let p = PresentParams::new(false, false);
        assert_eq!(present_mode_for(p, &[Fifo]), Fifo);
    }

    #[test]
    fn srgb_format_is_preferred() {
        let c = caps(
            vec![wgpu::TextureFormat::Bgra8Unorm, wgpu::TextureFormat::Rgba8UnormSrgb],
            vec![],
        );
        assert_eq!(
            choose_surface_format(&c, true),
            Some(wgpu::TextureFormat::Rgba8UnormSrgb)
        );
        assert_eq!(
            choose_surface_format(&c, false),
            Some(wgpu::TextureFormat::Bgra8Unorm)
        );
    }

    #[test]
    fn empty_formats_yield_none() {
        assert_eq!(choose_surface_format(&caps(vec![], vec![]), true), None);
    }

    #[test]
    fn unsupported_alpha_mode_falls_back() {
        let c = caps(vec![], vec![wgpu::CompositeAlphaMode::Opaque]);
        assert_eq!(
            choose_alpha_mode(&c, Some(wgpu::CompositeAlphaMode::PreMultiplied)),
            wgpu::CompositeAlphaMode::Opaque
        );
        assert_eq!(
            choose_alpha_mode(&caps(vec![], vec![]), None),
            wgpu::CompositeAlphaMode::Auto
        );
    }
}
