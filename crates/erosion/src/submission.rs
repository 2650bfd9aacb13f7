//! Draw submission.
//!
//! Terrain and water draws are recorded once into render bundles bound to the
//! stable mesh buffers and replayed every frame.

use std::collections::HashMap;

use glam::Mat4;
use terrain::{Grid, Surface};

use crate::mesh::{self, MeshBuffers};
use crate::params::DrawUniforms;
use crate::program::DRAW_WGSL;

/// Attachment formats the host renders into.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct TargetFormats {
    pub color: wgpu::TextureFormat,
    pub depth: Option<wgpu::TextureFormat>,
}

/// Attachments for one frame.
pub struct FrameTarget<'a> {
    pub color: &'a wgpu::TextureView,
    pub depth: Option<&'a wgpu::TextureView>,
    /// `None` keeps whatever the host already drew.
    pub clear: Option<wgpu::Color>,
}

pub struct RenderSubmission {
    formats: TargetFormats,
    uniform_buffer: wgpu::Buffer,
    uniforms: DrawUniforms,
    bundles: HashMap<Surface, wgpu::RenderBundle>,
}

fn draw_pipeline(
    device: &wgpu::Device,
    layout: &wgpu::PipelineLayout,
    shader: &wgpu::ShaderModule,
    formats: TargetFormats,
    surface: Surface,
) -> wgpu::RenderPipeline {
    let (label, fs, blend, depth_write) = match surface {
        Surface::Terrain => (
            "Terrain Render Pipeline",
            "fs_terrain",
            wgpu::BlendState::REPLACE,
            true,
        ),
        Surface::Water => (
            "Water Render Pipeline",
            "fs_water",
            wgpu::BlendState::ALPHA_BLENDING,
            false,
        ),
    };

    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(label),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: shader,
            entry_point: Some("vs_main"),
            buffers: &[mesh::vertex_layout()],
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: shader,
            entry_point: Some(fs),
            targets: &[Some(wgpu::ColorTargetState {
                format: formats.color,
                blend: Some(blend),
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: Default::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            front_face: mesh::FRONT_FACE,
            cull_mode: Some(wgpu::Face::Back),
            ..Default::default()
        },
        depth_stencil: formats.depth.map(|format| wgpu::DepthStencilState {
            format,
            depth_write_enabled: depth_write,
            depth_compare: wgpu::CompareFunction::Less,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        }),
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
        cache: None,
    })
}

impl RenderSubmission {
    pub fn new(
        device: &wgpu::Device,
        grid: &Grid,
        meshes: &MeshBuffers,
        formats: TargetFormats,
    ) -> Self {
        let uniforms = DrawUniforms::overview(grid, 16.0 / 9.0);
        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Draw Uniform Buffer"),
            size: std::mem::size_of::<DrawUniforms>() as wgpu::BufferAddress,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Draw Bind Group Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Draw Bind Group"),
            layout: &layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Terrain Draw Shader"),
            source: wgpu::ShaderSource::Wgsl(DRAW_WGSL.into()),
        });
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Draw Pipeline Layout"),
            bind_group_layouts: &[&layout],
            push_constant_ranges: &[],
        });

        let mut bundles = HashMap::new();
        for surface in [Surface::Terrain, Surface::Water] {
            let Some(vertices) = meshes.buffer(surface) else {
                continue;
            };
            let pipeline = draw_pipeline(device, &pipeline_layout, &shader, formats, surface);
            let mut encoder =
                device.create_render_bundle_encoder(&wgpu::RenderBundleEncoderDescriptor {
                    label: Some("Terrain Draw Bundle"),
                    color_formats: &[Some(formats.color)],
                    depth_stencil: formats.depth.map(|format| wgpu::RenderBundleDepthStencil {
                        format,
                        depth_read_only: false,
                        stencil_read_only: true,
                    }),
                    sample_count: 1,
                    multiview: None,
                });
            encoder.set_pipeline(&pipeline);
            encoder.set_bind_group(0, &bind_group, &[]);
            encoder.set_vertex_buffer(0, vertices.slice(..));
            encoder.draw(0..meshes.vertex_count(), 0..1);
            let bundle = encoder.finish(&wgpu::RenderBundleDescriptor {
                label: Some(match surface {
                    Surface::Terrain => "Terrain Draw",
                    Surface::Water => "Water Draw",
                }),
            });
            bundles.insert(surface, bundle);
        }

        log::info!(
            "Recorded {} draw bundle(s), {} vertices each",
            bundles.len(),
            meshes.vertex_count()
        );

        Self {
            formats,
            uniform_buffer,
            uniforms,
            bundles,
        }
    }

    pub fn set_view_proj(&mut self, view_proj: Mat4) {
        self.uniforms.view_proj = view_proj.to_cols_array_2d();
    }

    pub fn write_uniforms(&self, queue: &wgpu::Queue) {
        queue.write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(&self.uniforms));
    }

    /// Whether `target` has the attachments the bundles were recorded for.
    pub fn accepts(&self, target: &FrameTarget<'_>) -> bool {
        self.formats.depth.is_some() == target.depth.is_some()
    }

    /// One render pass replaying the bundles for `surfaces` in order.
    ///
    /// A target whose depth attachment does not match the recorded formats is
    /// refused with a warning and nothing is encoded.
    pub fn encode_draws(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        target: &FrameTarget<'_>,
        surfaces: &[Surface],
    ) {
        if !self.accepts(target) {
            log::warn!(
                "Draw target depth attachment {} but bundles were recorded with depth {:?}, skipping {} draw(s)",
                if target.depth.is_some() { "present" } else { "absent" },
                self.formats.depth,
                surfaces.len()
            );
            return;
        }
        let load = target.clear.map_or(wgpu::LoadOp::Load, wgpu::LoadOp::Clear);
        let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Terrain Render Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target.color,
                resolve_target: None,
                ops: wgpu::Operations {
                    load,
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: target.depth.map(|view| {
                wgpu::RenderPassDepthStencilAttachment {
                    view,
                    depth_ops: Some(wgpu::Operations {
                        load: if target.clear.is_some() {
                            wgpu::LoadOp::Clear(1.0)
                        } else {
                            wgpu::LoadOp::Load
                        },
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        let bundles: Vec<&wgpu::RenderBundle> = surfaces
            .iter()
            .filter_map(|s| {
                let bundle = self.bundles.get(s);
                if bundle.is_none() {
                    log::warn!("No draw bundle for {:?}", s);
                }
                bundle
            })
            .collect();
        rpass.execute_bundles(bundles);
    }

    pub(crate) fn release(self) {
        self.uniform_buffer.destroy();
    }
}
