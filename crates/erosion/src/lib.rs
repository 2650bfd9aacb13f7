//! GPU heightfield erosion on wgpu.
//!
//! The device half of the terrain pipeline. A [`TerrainSim`] owns:
//!
//! - a [`HeightfieldStore`]: one buffer for static grids, or a ping-pong pair
//!   plus a stable published buffer for iterative ones
//! - the vertex streams written by the mesh kernels ([`MeshBuffers`])
//! - an optional preview [`TextureSurface`]
//! - an [`Orchestrator`] holding a compute pipeline per resolved [`Kernel`]
//! - a [`FramePlan`] of dispatches, publish, fence and draws, validated once
//!   and replayed every frame through pre-recorded render bundles
//!
//! ```no_run
//! use erosion::{GpuContext, TerrainSim};
//! use terrain::GridParams;
//!
//! let ctx = GpuContext::headless_blocking(32).unwrap();
//! let mut sim = TerrainSim::initialize(&ctx, GridParams::default(), None).unwrap();
//! for _ in 0..10 {
//!     sim.tick(1.0 / 60.0);
//! }
//! println!("{:?}", sim.stats().unwrap());
//! sim.shutdown();
//! ```

pub mod context;
pub mod error;
pub mod kernel;
pub mod mesh;
pub mod orchestrator;
pub mod params;
pub mod pipeline_builder;
pub mod plan;
pub mod program;
pub mod readback;
pub mod sim;
pub mod store;
pub mod submission;
pub mod texture;

pub use context::{is_device_lost, reset_device_lost, GpuContext};
pub use error::{GpuError, SetupError};
pub use kernel::{Binding, Kernel, Resource};
pub use mesh::MeshBuffers;
pub use orchestrator::Orchestrator;
pub use params::{DrawUniforms, GridUniforms};
pub use plan::{FrameOp, FramePlan, Pass, PlanError};
pub use program::{DeviceProgram, ResolvedKernel};
pub use sim::{PreparedSetup, TerrainSim};
pub use store::HeightfieldStore;
pub use submission::{FrameTarget, RenderSubmission, TargetFormats};
pub use texture::TextureSurface;
