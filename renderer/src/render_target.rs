use gpu_utils::Gpu;

/// A render destination sized to the device render resolution. Either an
/// offscreen texture created here, or a borrowed surface view supplied by
/// the host.
pub struct RenderTarget {
    // Held only for offscreen targets; surface-backed targets borrow a view
    // owned by the swapchain.
    _texture: Option<wgpu::Texture>,
    view: wgpu::TextureView,
    format: wgpu::TextureFormat,
    width: u32,
    height: u32,
}

impl RenderTarget {
    /// Creates an offscreen target.
    pub fn offscreen(gpu: &Gpu, width: u32, height: u32) -> Self {
        let format = gpu.preferred_format();
        let texture = gpu.device().create_texture(&wgpu::TextureDescriptor {
            label: Some("RenderTarget"),
            size: wgpu::Extent3d {
                width: width.max(1),
                height: height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self {
            _texture: Some(texture),
            view,
            format,
            width,
            height,
        }
    }

    /// Wraps a view the host already owns (typically the surface texture).
    pub fn from_view(
        view: wgpu::TextureView,
        format: wgpu::TextureFormat,
        width: u32,
        height: u32,
    ) -> Self {
        Self {
            _texture: None,
            view,
            format,
            width,
            height,
        }
    }

    pub fn view(&self) -> &wgpu::TextureView {
        &self.view
    }

    pub fn format(&self) -> wgpu::TextureFormat {
        self.format
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }
}
