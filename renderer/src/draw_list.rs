use std::sync::Arc;

use crate::blend::BlendMode;
use crate::gpu_texture::GpuTexture;

/// One textured or solid-color rectangle, in target pixels with the origin
/// at the top-left and Y increasing downward.
pub struct Quad {
    /// [x, y, width, height] in target pixels.
    pub rect: [f32; 4],
    /// [u, v, width, height] in normalized texture coordinates.
    pub uv: [f32; 4],
    /// Straight-alpha RGBA multiplier; premultiplied before upload.
    pub color: [f32; 4],
    pub blend: BlendMode,
    /// `None` draws an untextured (color-only) quad.
    pub texture: Option<Arc<GpuTexture>>,
}

/// CPU-side list of draw commands for a single frame. Views push quads
/// during their render pass; the window submits the whole list once.
#[derive(Default)]
pub struct DrawList {
    quads: Vec<Quad>,
}

impl DrawList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.quads.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.quads.is_empty()
    }

    pub fn len(&self) -> usize {
        self.quads.len()
    }

    pub fn quads(&self) -> &[Quad] {
        &self.quads
    }

    pub fn push(&mut self, quad: Quad) {
        self.quads.push(quad);
    }

    /// Solid-color rectangle with normal blending.
    pub fn fill_rect(&mut self, rect: [f32; 4], color: [f32; 4]) {
        self.push(Quad {
            rect,
            uv: [0.0, 0.0, 1.0, 1.0],
            color,
            blend: BlendMode::Normal,
            texture: None,
        });
    }

    /// Full-texture rectangle tinted by `color`.
    pub fn textured_rect(&mut self, rect: [f32; 4], texture: Arc<GpuTexture>, color: [f32; 4]) {
        self.push(Quad {
            rect,
            uv: [0.0, 0.0, 1.0, 1.0],
            color,
            blend: BlendMode::Normal,
            texture: Some(texture),
        });
    }

    /// Sub-texture rectangle, for glyphs and atlas regions. `uv` is in
    /// normalized texture coordinates.
    pub fn textured_sub_rect(
        &mut self,
        rect: [f32; 4],
        uv: [f32; 4],
        texture: Arc<GpuTexture>,
        color: [f32; 4],
    ) {
        self.push(Quad {
            rect,
            uv,
            color,
            blend: BlendMode::Normal,
            texture: Some(texture),
        });
    }
}
