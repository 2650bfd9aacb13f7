//! Kernel orchestration.
//!
//! Owns one compute pipeline per resolved kernel and the bind groups that
//! wire it to the store, mesh buffers and texture. Bind groups are built once:
//! every kernel except `Simulate` binds the published buffer, and `Simulate`
//! gets one bind group per ping-pong parity.

use std::collections::HashMap;

use terrain::{DispatchGrid, Grid};

use crate::error::SetupError;
use crate::kernel::{Binding, Kernel};
use crate::mesh::MeshBuffers;
use crate::params::GridUniforms;
use crate::pipeline_builder::PipelineBuilder;
use crate::program::{DeviceProgram, ResolvedKernel};
use crate::store::HeightfieldStore;
use crate::texture::TextureSurface;

struct KernelPipeline {
    pipeline: wgpu::ComputePipeline,
    /// One entry, or one per ping-pong parity for `Simulate`.
    bind_groups: Vec<wgpu::BindGroup>,
    grid: DispatchGrid,
}

/// Resources a bind group can draw from.
struct Bindable<'a> {
    uniforms: &'a wgpu::Buffer,
    store: &'a HeightfieldStore,
    meshes: &'a MeshBuffers,
    texture: Option<&'a TextureSurface>,
}

impl<'a> Bindable<'a> {
    fn resource(
        &self,
        kernel: Kernel,
        binding: Binding,
        parity: usize,
    ) -> Result<wgpu::BindingResource<'a>, SetupError> {
        let missing = SetupError::MissingBinding {
            kernel: kernel.entry_point(),
            binding: binding.name(),
        };
        let resource = match binding {
            Binding::Params => self.uniforms.as_entire_binding(),
            Binding::Data => self.store.published().as_entire_binding(),
            Binding::DataA => self.store.slots().ok_or(missing)?[parity].as_entire_binding(),
            Binding::DataB => self.store.slots().ok_or(missing)?[1 - parity].as_entire_binding(),
            Binding::TerrainMesh => self.meshes.terrain().as_entire_binding(),
            Binding::WaterMesh => self
                .meshes
                .buffer(terrain::Surface::Water)
                .ok_or(missing)?
                .as_entire_binding(),
            Binding::Texture => {
                wgpu::BindingResource::TextureView(self.texture.ok_or(missing)?.storage_view())
            }
        };
        Ok(resource)
    }
}

pub struct Orchestrator {
    pipelines: HashMap<Kernel, KernelPipeline>,
    uniforms: wgpu::Buffer,
    state: GridUniforms,
}

impl Orchestrator {
    pub fn uniform_buffer(device: &wgpu::Device) -> wgpu::Buffer {
        device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Grid Uniforms"),
            size: std::mem::size_of::<GridUniforms>() as wgpu::BufferAddress,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        })
    }

    #[allow(clippy::too_many_arguments)]
    pub fn new(
        device: &wgpu::Device,
        program: &DeviceProgram,
        resolved: &[ResolvedKernel],
        grid: &Grid,
        uniforms: wgpu::Buffer,
        store: &HeightfieldStore,
        meshes: &MeshBuffers,
        texture: Option<&TextureSurface>,
    ) -> Result<Self, SetupError> {
        let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(program.label()),
            source: wgpu::ShaderSource::Wgsl(program.source().into()),
        });

        let bindable = Bindable {
            uniforms: &uniforms,
            store,
            meshes,
            texture,
        };

        let mut pipelines = HashMap::new();
        for r in resolved {
            let kernel = r.kernel;
            let (pipeline, layout) = PipelineBuilder::new(device, &module, kernel).build();

            let parities: &[usize] = if kernel == Kernel::Simulate { &[0, 1] } else { &[0] };
            let mut bind_groups = Vec::with_capacity(parities.len());
            for &parity in parities {
                let entries = kernel
                    .bindings()
                    .iter()
                    .map(|&b| {
                        Ok(wgpu::BindGroupEntry {
                            binding: b.index(),
                            resource: bindable.resource(kernel, b, parity)?,
                        })
                    })
                    .collect::<Result<Vec<_>, SetupError>>()?;
                bind_groups.push(device.create_bind_group(&wgpu::BindGroupDescriptor {
                    label: Some(&format!("{} Bind Group {}", kernel.entry_point(), parity)),
                    layout: &layout,
                    entries: &entries,
                }));
            }

            let dispatch =
                DispatchGrid::for_domain(kernel.domain(), grid.resolution(), grid.tile_size());
            log::debug!(
                "{}: {}x{} workgroups of {:?}",
                kernel.entry_point(),
                dispatch.x,
                dispatch.y,
                r.workgroup_size
            );
            pipelines.insert(
                kernel,
                KernelPipeline {
                    pipeline,
                    bind_groups,
                    grid: dispatch,
                },
            );
        }

        Ok(Self {
            pipelines,
            uniforms,
            state: GridUniforms::new(grid),
        })
    }

    pub fn has(&self, kernel: Kernel) -> bool {
        self.pipelines.contains_key(&kernel)
    }

    pub fn dispatch_grid(&self, kernel: Kernel) -> Option<DispatchGrid> {
        self.pipelines.get(&kernel).map(|p| p.grid)
    }

    pub fn uniforms(&self) -> &GridUniforms {
        &self.state
    }

    pub fn write_uniforms(&mut self, queue: &wgpu::Queue, state: GridUniforms) {
        self.state = state;
        queue.write_buffer(&self.uniforms, 0, bytemuck::bytes_of(&self.state));
    }

    /// Record one dispatch. `parity` is the store's current index and only
    /// matters for `Simulate`.
    pub fn encode_dispatch(&self, pass: &mut wgpu::ComputePass<'_>, kernel: Kernel, parity: usize) {
        let Some(p) = self.pipelines.get(&kernel) else {
            log::warn!("{} was not resolved, skipping dispatch", kernel.entry_point());
            return;
        };
        let group = &p.bind_groups[parity.min(p.bind_groups.len() - 1)];
        pass.set_pipeline(&p.pipeline);
        pass.set_bind_group(0, group, &[]);
        pass.dispatch_workgroups(p.grid.x, p.grid.y, 1);
    }

    /// Initial noise and normals into the published buffer, then seed the
    /// ping-pong pair from it.
    pub fn encode_init(&self, encoder: &mut wgpu::CommandEncoder, store: &mut HeightfieldStore) {
        {
            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("Terrain Init Pass"),
                timestamp_writes: None,
            });
            self.encode_dispatch(&mut pass, Kernel::GenerateNoise, 0);
            self.encode_dispatch(&mut pass, Kernel::GenerateNormals, 0);
        }
        store.encode_seed(encoder);
    }

    pub(crate) fn release(self) {
        self.uniforms.destroy();
    }
}
