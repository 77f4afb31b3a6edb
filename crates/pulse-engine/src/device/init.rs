/// Initialization parameters for the GPU layer.
///
/// Defaults carry the process constants; nothing here is read from the
/// environment.
#[derive(Debug, Clone)]
pub struct GpuInit {
    /// Number of back-buffers in the swapchain ring.
    pub buffer_count: usize,

    /// Initial vsync state. Toggled at runtime by the vsync key.
    pub vsync: bool,

    /// Select a software (fallback) adapter instead of a hardware one.
    pub prefer_software: bool,

    /// Prefer an sRGB surface format when available.
    pub prefer_srgb: bool,

    /// Optional alpha mode preference for the surface.
    ///
    /// If provided but unsupported on the current surface, a supported mode is selected.
    pub alpha_mode: Option<wgpu::CompositeAlphaMode>,

    /// Required wgpu features.
    pub required_features: wgpu::Features,

    /// Limits requested from the adapter/device.
    pub required_limits: wgpu::Limits,
}

impl Default for GpuInit {
    fn default() -> Self {
        Self {
            buffer_count: 3,
            vsync: true,
            prefer_software: false,
            prefer_srgb: true,
            alpha_mode: None,
            required_features: wgpu::Features::empty(),
            required_limits: wgpu::Limits::default(),
        }
    }
}
