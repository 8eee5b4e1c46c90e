use gpu_utils::Gpu;

/// A GPU-resident RGBA texture plus its default view.
pub struct GpuTexture {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    width: u32,
    height: u32,
}

impl GpuTexture {
    /// Uploads tightly-packed RGBA8 pixels.
    ///
    /// # Panics
    ///
    /// Panics if `pixels.len() != width * height * 4` or either dimension is
    /// zero; callers validate decoded images before upload.
    pub fn from_rgba(gpu: &Gpu, pixels: &[u8], width: u32, height: u32) -> Self {
        assert!(width > 0 && height > 0, "texture dimensions must be nonzero");
        assert_eq!(
            pixels.len(),
            (width * height * 4) as usize,
            "pixel buffer does not match dimensions"
        );

        let texture = gpu.device().create_texture(&wgpu::TextureDescriptor {
            label: Some("GpuTexture"),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        gpu.queue().write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            pixels,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(width * 4),
                rows_per_image: Some(height),
            },
            wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        Self {
            texture,
            view,
            width,
            height,
        }
    }

    /// A 1x1 opaque white texture, used for untextured quads.
    pub fn white(gpu: &Gpu) -> Self {
        Self::from_rgba(gpu, &[255, 255, 255, 255], 1, 1)
    }

    pub fn texture(&self) -> &wgpu::Texture {
        &self.texture
    }

    pub fn view(&self) -> &wgpu::TextureView {
        &self.view
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }
}
