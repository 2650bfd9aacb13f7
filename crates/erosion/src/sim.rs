//! Terrain simulation lifecycle: `initialize / tick / frame / shutdown`.

use std::sync::Arc;

use glam::Mat4;
use terrain::{Cell, Grid, GridParams, HeightStats, Surface, Vertex};

use crate::context::GpuContext;
use crate::error::{GpuError, SetupError};
use crate::kernel::Kernel;
use crate::mesh::MeshBuffers;
use crate::orchestrator::Orchestrator;
use crate::plan::{FramePlan, Pass};
use crate::program::{DeviceProgram, ResolvedKernel};
use crate::readback;
use crate::store::HeightfieldStore;
use crate::submission::{FrameTarget, RenderSubmission, TargetFormats};
use crate::texture::TextureSurface;

/// GPU terrain simulation.
///
/// Everything is sized and allocated in [`TerrainSim::initialize`]; frames only
/// rewrite contents. [`TerrainSim::shutdown`] consumes the simulation, so its
/// resources are released exactly once.
pub struct TerrainSim {
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    grid: Grid,
    plan: FramePlan,
    store: HeightfieldStore,
    meshes: MeshBuffers,
    texture: Option<TextureSurface>,
    orchestrator: Orchestrator,
    submission: Option<RenderSubmission>,
    frames: u64,
}

/// Everything [`TerrainSim`] setup decides before touching the device.
///
/// Holds no device handle, so a failure here cannot leave anything allocated.
pub struct PreparedSetup {
    grid: Grid,
    program: DeviceProgram,
    resolved: Vec<ResolvedKernel>,
    plan: FramePlan,
}

impl PreparedSetup {
    /// Validate the config, resolve the required kernels, check the frame plan
    /// and the buffer sizes against `limits`.
    pub fn prepare(
        params: GridParams,
        program: DeviceProgram,
        limits: &wgpu::Limits,
    ) -> Result<Self, SetupError> {
        let grid = Grid::new(params)?;
        let resolved = program.resolve_all(&Kernel::required(&grid), grid.tile_size())?;
        let plan = FramePlan::record(&grid);
        plan.validate()?;
        HeightfieldStore::check_size(&grid, limits)?;
        MeshBuffers::check_size(&grid, limits)?;
        Ok(Self {
            grid,
            program,
            resolved,
            plan,
        })
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn resolved(&self) -> &[ResolvedKernel] {
        &self.resolved
    }
}

impl TerrainSim {
    /// Validate, resolve, allocate and run the one-time generation passes
    /// with the shipped erosion program.
    ///
    /// `formats` is `None` for headless use; the plan's draws are then skipped.
    pub fn initialize(
        context: &GpuContext,
        params: GridParams,
        formats: Option<TargetFormats>,
    ) -> Result<Self, SetupError> {
        Self::initialize_with_program(context, params, DeviceProgram::erosion()?, formats)
    }

    /// [`TerrainSim::initialize`] with a caller-supplied device program.
    pub fn initialize_with_program(
        context: &GpuContext,
        params: GridParams,
        program: DeviceProgram,
        formats: Option<TargetFormats>,
    ) -> Result<Self, SetupError> {
        let device = context.device.clone();
        let queue = context.queue.clone();

        let PreparedSetup {
            grid,
            program,
            resolved,
            plan,
        } = PreparedSetup::prepare(params, program, &device.limits())?;

        let mut store = HeightfieldStore::allocate(&device, &grid)?;
        let meshes = MeshBuffers::allocate(&device, &grid)?;
        let texture = grid
            .has_preview_texture()
            .then(|| TextureSurface::new(&device, &grid));
        let uniforms = Orchestrator::uniform_buffer(&device);
        let mut orchestrator = Orchestrator::new(
            &device,
            &program,
            &resolved,
            &grid,
            uniforms,
            &store,
            &meshes,
            texture.as_ref(),
        )?;

        let state = *orchestrator.uniforms();
        orchestrator.write_uniforms(&queue, state);

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Terrain Init Encoder"),
        });
        orchestrator.encode_init(&mut encoder, &mut store);
        queue.submit(Some(encoder.finish()));

        let submission = formats.map(|f| RenderSubmission::new(&device, &grid, &meshes, f));
        if let Some(s) = &submission {
            s.write_uniforms(&queue);
        }

        log::info!(
            "Terrain initialized: {}x{} cells, tile {}, {:?} mode, {} kernels, {} ops per frame",
            grid.resolution(),
            grid.resolution(),
            grid.tile_size(),
            grid.mode(),
            resolved.len(),
            plan.ops().len()
        );

        Ok(Self {
            device,
            queue,
            grid,
            plan,
            store,
            meshes,
            texture,
            orchestrator,
            submission,
            frames: 0,
        })
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn plan(&self) -> &FramePlan {
        &self.plan
    }

    pub fn store(&self) -> &HeightfieldStore {
        &self.store
    }

    pub fn meshes(&self) -> &MeshBuffers {
        &self.meshes
    }

    pub fn orchestrator(&self) -> &Orchestrator {
        &self.orchestrator
    }

    /// Completed simulation steps in the published heightfield.
    pub fn generation(&self) -> u64 {
        self.store.generation()
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Preview texture for an external presentation layer.
    pub fn texture_view(&self) -> Option<&wgpu::TextureView> {
        self.texture.as_ref().map(|t| t.view())
    }

    pub fn set_view_proj(&mut self, view_proj: Mat4) {
        if let Some(s) = &mut self.submission {
            s.set_view_proj(view_proj);
            s.write_uniforms(&self.queue);
        }
    }

    /// Record one frame into a host-owned encoder.
    ///
    /// Uniforms are staged on the queue, so submit the encoder before
    /// recording the next frame.
    pub fn encode_frame(
        &mut self,
        encoder: &mut wgpu::CommandEncoder,
        dt: f32,
        target: Option<&FrameTarget<'_>>,
    ) {
        let state = self
            .orchestrator
            .uniforms()
            .with_step(self.store.generation() as u32, dt);
        self.orchestrator.write_uniforms(&self.queue, state);

        for pass in self.plan.passes() {
            match pass {
                Pass::Compute(kernels) => {
                    let parity = self.store.current_index();
                    let mut cpass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                        label: Some("Terrain Compute Pass"),
                        timestamp_writes: None,
                    });
                    for kernel in kernels {
                        self.orchestrator.encode_dispatch(&mut cpass, kernel, parity);
                    }
                }
                Pass::Publish => {
                    self.store.swap();
                    self.store.encode_publish(encoder);
                }
                Pass::Render(surfaces) => match (&self.submission, target) {
                    (Some(submission), Some(target)) => {
                        submission.encode_draws(encoder, target, &surfaces)
                    }
                    _ => log::trace!("No render target, skipping {} draw(s)", surfaces.len()),
                },
            }
        }

        self.frames += 1;
        log::debug!(
            "Frame {} encoded, generation {}",
            self.frames,
            self.store.generation()
        );
    }

    /// Advance one step and refresh the derived data without drawing.
    pub fn tick(&mut self, dt: f32) -> u64 {
        self.submit_frame(dt, None);
        self.generation()
    }

    /// Advance one step and draw into `target`.
    pub fn frame(&mut self, dt: f32, target: &FrameTarget<'_>) -> u64 {
        self.submit_frame(dt, Some(target));
        self.generation()
    }

    fn submit_frame(&mut self, dt: f32, target: Option<&FrameTarget<'_>>) {
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Terrain Frame Encoder"),
            });
        self.encode_frame(&mut encoder, dt, target);
        self.queue.submit(Some(encoder.finish()));
    }

    /// Blocking copy of the published heightfield.
    pub fn read_heightfield(&self) -> Result<Vec<Cell>, GpuError> {
        readback::read_buffer(
            &self.device,
            &self.queue,
            self.store.published(),
            self.store.byte_size(),
        )
    }

    /// Blocking copy of one vertex stream, `None` if the surface is disabled.
    pub fn read_mesh(&self, surface: Surface) -> Result<Option<Vec<Vertex>>, GpuError> {
        let Some(buffer) = self.meshes.buffer(surface) else {
            return Ok(None);
        };
        readback::read_buffer(
            &self.device,
            &self.queue,
            buffer,
            self.grid.vertex_buffer_size(),
        )
        .map(Some)
    }

    /// Blocking copy of the preview texture as packed RGBA8 rows.
    pub fn read_texture(&self) -> Result<Option<Vec<u8>>, GpuError> {
        let Some(texture) = &self.texture else {
            return Ok(None);
        };
        readback::read_texture_rgba8(&self.device, &self.queue, texture.texture(), texture.size())
            .map(Some)
    }

    pub fn stats(&self) -> Result<HeightStats, GpuError> {
        Ok(HeightStats::from_cells(&self.read_heightfield()?))
    }

    /// Release every device resource. Consumes the simulation.
    pub fn shutdown(self) {
        log::info!("Terrain shutdown after {} frames", self.frames);
        self.store.release();
        self.meshes.release();
        if let Some(texture) = self.texture {
            texture.release();
        }
        self.orchestrator.release();
        if let Some(submission) = self.submission {
            submission.release();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use terrain::SimulationMode;

    const NOISE_ONLY: &str = r#"
struct Cell { height: f32, nx: f32, ny: f32, nz: f32, water: f32 }
@group(0) @binding(0) var<uniform> _params: vec4<u32>;
@group(0) @binding(1) var<storage, read_write> _data: array<Cell>;

@compute @workgroup_size(32, 32, 1)
fn GenerateNoise(@builtin(global_invocation_id) id: vec3<u32>) {
    _data[id.x].height = 0.0;
}
"#;

    fn params(mode: SimulationMode) -> GridParams {
        GridParams {
            resolution: 64,
            mode,
            ..Default::default()
        }
    }

    #[test]
    fn missing_entry_point_fails_before_any_device_work() {
        let program = DeviceProgram::from_wgsl("noise-only", NOISE_ONLY).unwrap();
        let err = PreparedSetup::prepare(
            params(SimulationMode::Static),
            program,
            &wgpu::Limits::default(),
        )
        .err()
        .unwrap();
        assert!(matches!(
            err,
            SetupError::MissingEntryPoint {
                name: "GenerateNormals"
            }
        ));
    }

    #[test]
    fn shipped_program_prepares_for_both_modes() {
        for (mode, kernels) in [(SimulationMode::Static, 5), (SimulationMode::Iterative, 6)] {
            let setup = PreparedSetup::prepare(
                params(mode),
                DeviceProgram::erosion().unwrap(),
                &wgpu::Limits::default(),
            )
            .unwrap();
            assert_eq!(setup.resolved().len(), kernels, "{:?}", mode);
            assert_eq!(setup.grid().resolution(), 64);
        }
    }

    #[test]
    fn oversized_grid_is_rejected_by_limits() {
        let limits = wgpu::Limits {
            max_storage_buffer_binding_size: 1 << 16,
            ..wgpu::Limits::default()
        };
        let err = PreparedSetup::prepare(
            params(SimulationMode::Static),
            DeviceProgram::erosion().unwrap(),
            &limits,
        )
        .err()
        .unwrap();
        assert!(matches!(err, SetupError::BufferTooLarge { .. }));
    }
}
