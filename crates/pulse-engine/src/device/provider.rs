use anyhow::{Context, Result};

use super::GpuInit;

/// Creates the wgpu instance used for adapter enumeration and surface creation.
pub fn create_instance() -> wgpu::Instance {
    // Use all backends to allow wgpu to select the optimal platform backend.
    wgpu::Instance::new(&wgpu::InstanceDescriptor {
        backends: wgpu::Backends::all(),
        ..Default::default()
    })
}

/// Selects an adapter able to present to `surface`.
///
/// `prefer_software` forces the fallback (software) adapter.
pub async fn enumerate_adapters(
    instance: &wgpu::Instance,
    surface: &wgpu::Surface<'_>,
    prefer_software: bool,
) -> Result<wgpu::Adapter> {
    let adapter = instance
        .request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: Some(surface),
            force_fallback_adapter: prefer_software,
        })
        .await
        .context("failed to find a suitable GPU adapter")?;

    let info = adapter.get_info();
    log::info!(
        "adapter: {} ({:?}, {:?}, driver {})",
        info.name,
        info.backend,
        info.device_type,
        info.driver
    );

    Ok(adapter)
}

/// Creates the logical device and its command queue.
///
/// wgpu hands both out together; the queue is the only one the process uses.
pub async fn create_device(
    adapter: &wgpu::Adapter,
    init: &GpuInit,
) -> Result<(wgpu::Device, wgpu::Queue)> {
    adapter
        .request_device(&wgpu::DeviceDescriptor {
            label: Some("pulse device"),
            required_features: init.required_features,
            required_limits: init.required_limits.clone(),
            experimental_features: wgpu::ExperimentalFeatures::disabled(),
            memory_hints: wgpu::MemoryHints::Performance,
            trace: wgpu::Trace::Off,
        })
        .await
        .context("failed to create wgpu device/queue")
}
