use std::ops::Range;
use std::sync::Arc;

use fxhash::FxHashMap;
use gpu_utils::Gpu;
use log::trace;
use thiserror::Error;
use wgpu::util::DeviceExt;

use crate::blend::BlendMode;
use crate::draw_list::{DrawList, Quad};
use crate::gpu_texture::GpuTexture;
use crate::render_target::RenderTarget;

const QUAD_WGSL: &str = include_str!("quad_renderer/quad.wgsl");

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("render target has zero size")]
    ZeroSizedTarget,
}

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
struct Vertex {
    /// NDC position; pixel-to-NDC conversion happens on the CPU.
    position: [f32; 2],
    uv: [f32; 2],
    /// Premultiplied RGBA.
    color: [f32; 4],
}

impl Vertex {
    const LAYOUT: wgpu::VertexBufferLayout<'static> = wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &wgpu::vertex_attr_array![0 => Float32x2, 1 => Float32x2, 2 => Float32x4],
    };
}

/// One draw call: a vertex range sharing a pipeline (blend mode) and a
/// texture binding.
struct Batch {
    blend: BlendMode,
    texture: Option<Arc<GpuTexture>>,
    vertices: Range<u32>,
}

/// Renders a `DrawList` of quads into a `RenderTarget`.
///
/// Pipelines are created once per blend mode for the target format chosen at
/// construction.
pub struct QuadRenderer {
    pipelines: FxHashMap<BlendMode, wgpu::RenderPipeline>,
    bind_group_layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
    white: Arc<GpuTexture>,
    format: wgpu::TextureFormat,
}

impl QuadRenderer {
    pub fn new(gpu: &Gpu, format: wgpu::TextureFormat) -> Self {
        let device = gpu.device();

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("QuadRenderer shader"),
            source: wgpu::ShaderSource::Wgsl(QUAD_WGSL.into()),
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("QuadRenderer bind group layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("QuadRenderer pipeline layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let mut pipelines = FxHashMap::default();
        for blend in [BlendMode::Normal, BlendMode::Erasure, BlendMode::AlphaLock] {
            let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some("QuadRenderer pipeline"),
                layout: Some(&pipeline_layout),
                vertex: wgpu::VertexState {
                    module: &shader,
                    entry_point: Some("vs_main"),
                    buffers: &[Vertex::LAYOUT],
                    compilation_options: Default::default(),
                },
                fragment: Some(wgpu::FragmentState {
                    module: &shader,
                    entry_point: Some("fs_main"),
                    targets: &[Some(wgpu::ColorTargetState {
                        format,
                        blend: Some(blend.state()),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                    compilation_options: Default::default(),
                }),
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    ..Default::default()
                },
                depth_stencil: None,
                multisample: wgpu::MultisampleState::default(),
                multiview: None,
                cache: None,
            });
            pipelines.insert(blend, pipeline);
        }

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("QuadRenderer sampler"),
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        Self {
            pipelines,
            bind_group_layout,
            sampler,
            white: Arc::new(GpuTexture::white(gpu)),
            format,
        }
    }

    pub fn format(&self) -> wgpu::TextureFormat {
        self.format
    }

    /// Clears the target and draws every quad of the list in order.
    pub fn render(
        &self,
        gpu: &Gpu,
        target: &RenderTarget,
        clear_color: wgpu::Color,
        list: &DrawList,
    ) -> Result<(), RenderError> {
        if target.width() == 0 || target.height() == 0 {
            return Err(RenderError::ZeroSizedTarget);
        }

        let (vertices, batches) = Self::build_batches(list, target);
        trace!(
            "QuadRenderer::render: {} quads in {} batches",
            list.len(),
            batches.len()
        );

        let device = gpu.device();
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("QuadRenderer vertices"),
            contents: bytemuck::cast_slice(&vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("QuadRenderer encoder"),
        });
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("QuadRenderer pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: target.view(),
                    depth_slice: None,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(clear_color),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            pass.set_vertex_buffer(0, vertex_buffer.slice(..));
            for batch in &batches {
                let texture = batch.texture.as_ref().unwrap_or(&self.white);
                let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
                    label: Some("QuadRenderer bind group"),
                    layout: &self.bind_group_layout,
                    entries: &[
                        wgpu::BindGroupEntry {
                            binding: 0,
                            resource: wgpu::BindingResource::TextureView(texture.view()),
                        },
                        wgpu::BindGroupEntry {
                            binding: 1,
                            resource: wgpu::BindingResource::Sampler(&self.sampler),
                        },
                    ],
                });

                pass.set_pipeline(&self.pipelines[&batch.blend]);
                pass.set_bind_group(0, &bind_group, &[]);
                pass.draw(batch.vertices.clone(), 0..1);
            }
        }

        gpu.queue().submit([encoder.finish()]);
        Ok(())
    }

    fn build_batches(list: &DrawList, target: &RenderTarget) -> (Vec<Vertex>, Vec<Batch>) {
        let width = target.width() as f32;
        let height = target.height() as f32;

        let mut vertices: Vec<Vertex> = Vec::with_capacity(list.len() * 6);
        let mut batches: Vec<Batch> = Vec::new();

        for quad in list.quads() {
            let start = vertices.len() as u32;
            Self::push_quad_vertices(&mut vertices, quad, width, height);

            let same_batch = batches.last().is_some_and(|batch| {
                batch.blend == quad.blend && texture_identity_eq(&batch.texture, &quad.texture)
            });
            if same_batch {
                if let Some(batch) = batches.last_mut() {
                    batch.vertices.end = vertices.len() as u32;
                }
            } else {
                batches.push(Batch {
                    blend: quad.blend,
                    texture: quad.texture.clone(),
                    vertices: start..vertices.len() as u32,
                });
            }
        }

        (vertices, batches)
    }

    fn push_quad_vertices(vertices: &mut Vec<Vertex>, quad: &Quad, width: f32, height: f32) {
        let [x, y, w, h] = quad.rect;
        let [u, v, uw, uh] = quad.uv;
        let [r, g, b, a] = quad.color;
        let color = [r * a, g * a, b * a, a];

        let to_ndc = |px: f32, py: f32| [px / width * 2.0 - 1.0, 1.0 - py / height * 2.0];

        let corners = [
            (to_ndc(x, y), [u, v]),
            (to_ndc(x + w, y), [u + uw, v]),
            (to_ndc(x + w, y + h), [u + uw, v + uh]),
            (to_ndc(x, y + h), [u, v + uh]),
        ];

        for &index in &[0usize, 1, 2, 0, 2, 3] {
            let (position, uv) = corners[index];
            vertices.push(Vertex {
                position,
                uv,
                color,
            });
        }
    }
}

fn texture_identity_eq(a: &Option<Arc<GpuTexture>>, b: &Option<Arc<GpuTexture>>) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(a), Some(b)) => Arc::ptr_eq(a, b),
        _ => false,
    }
}
