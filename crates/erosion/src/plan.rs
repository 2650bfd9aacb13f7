//! Per-frame operation sequence.
//!
//! A [`FramePlan`] is recorded once from the grid configuration and replayed
//! every frame. [`FramePlan::validate`] walks the sequence with explicit
//! dependency tracking over the logical resources each op reads and writes.
//! Each write is stamped with the publish epoch it happened in, so a draw of a
//! mesh extracted before the latest `Publish` or before the last fence is
//! rejected.

use std::collections::{HashMap, HashSet};
use std::fmt;

use terrain::{Grid, Surface};

use crate::kernel::{Kernel, Resource};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FrameOp {
    Dispatch(Kernel),
    /// Swap ping-pong roles and copy the new current slot into the published buffer.
    Publish,
    /// All prior compute writes are visible to everything after this point.
    Fence,
    Draw(Surface),
}

/// A run of ops that encodes as one pass.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Pass {
    /// Consecutive dispatches. The pass ends at the next fence, publish or draw.
    Compute(Vec<Kernel>),
    Publish,
    /// Consecutive draws.
    Render(Vec<Surface>),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PlanError {
    /// A draw reads a mesh written since the last fence.
    UnfencedDraw { index: usize, surface: Surface },
    /// A draw reads a mesh nothing in the frame produces.
    MissingProducer { index: usize, surface: Surface },
    /// A draw reads a mesh extracted before the latest `Publish`.
    StaleProducer { index: usize, surface: Surface },
    /// A kernel reads the published buffer while a simulate result is unpublished.
    ConsumerBeforePublish { index: usize, kernel: Kernel },
    /// `Simulate` or `Publish` in a plan for a static grid.
    StaticPlanSimulates { index: usize },
    /// `Publish` with no preceding `Simulate`.
    PublishWithoutSimulate { index: usize },
    /// One-time setup work scheduled per frame.
    SetupKernelInFrame { index: usize, kernel: Kernel },
}

impl fmt::Display for PlanError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlanError::UnfencedDraw { index, surface } => {
                write!(f, "op {}: draw {:?} without a fence after its producer", index, surface)
            }
            PlanError::MissingProducer { index, surface } => {
                write!(f, "op {}: draw {:?} but no kernel writes its mesh", index, surface)
            }
            PlanError::StaleProducer { index, surface } => write!(
                f,
                "op {}: draw {:?} reads a mesh extracted before the last Publish",
                index, surface
            ),
            PlanError::ConsumerBeforePublish { index, kernel } => write!(
                f,
                "op {}: {:?} reads the published heightfield before Publish",
                index, kernel
            ),
            PlanError::StaticPlanSimulates { index } => {
                write!(f, "op {}: static grids do not simulate", index)
            }
            PlanError::PublishWithoutSimulate { index } => {
                write!(f, "op {}: Publish with nothing to publish", index)
            }
            PlanError::SetupKernelInFrame { index, kernel } => {
                write!(f, "op {}: {:?} only runs at setup", index, kernel)
            }
        }
    }
}

impl std::error::Error for PlanError {}

fn mesh_resource(surface: Surface) -> Resource {
    match surface {
        Surface::Terrain => Resource::TerrainMesh,
        Surface::Water => Resource::WaterMesh,
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FramePlan {
    ops: Vec<FrameOp>,
    iterative: bool,
}

impl FramePlan {
    /// The canonical frame for a configuration.
    ///
    /// `Simulate` shares the submission with extraction and sits ahead of the
    /// fence, so the drawn geometry is never a frame behind the state.
    pub fn record(grid: &Grid) -> Self {
        let mut ops = Vec::new();
        if grid.is_iterative() {
            ops.push(FrameOp::Dispatch(Kernel::Simulate));
            ops.push(FrameOp::Publish);
        }
        ops.push(FrameOp::Dispatch(Kernel::GenerateNormals));
        ops.push(FrameOp::Dispatch(Kernel::MeshTerrain));
        if grid.has_water_surface() {
            ops.push(FrameOp::Dispatch(Kernel::MeshWater));
        }
        if grid.has_preview_texture() {
            ops.push(FrameOp::Dispatch(Kernel::ToTexture));
        }
        ops.push(FrameOp::Fence);
        ops.push(FrameOp::Draw(Surface::Terrain));
        if grid.has_water_surface() {
            ops.push(FrameOp::Draw(Surface::Water));
        }
        Self {
            ops,
            iterative: grid.is_iterative(),
        }
    }

    pub fn from_ops(ops: Vec<FrameOp>, iterative: bool) -> Self {
        Self { ops, iterative }
    }

    pub fn ops(&self) -> &[FrameOp] {
        &self.ops
    }

    pub fn is_iterative(&self) -> bool {
        self.iterative
    }

    pub fn kernels(&self) -> impl Iterator<Item = Kernel> + '_ {
        self.ops.iter().filter_map(|op| match op {
            FrameOp::Dispatch(k) => Some(*k),
            _ => None,
        })
    }

    pub fn draws(&self) -> impl Iterator<Item = Surface> + '_ {
        self.ops.iter().filter_map(|op| match op {
            FrameOp::Draw(s) => Some(*s),
            _ => None,
        })
    }

    /// Group ops into encoder passes. A fence closes the open pass and the
    /// pass boundary is the synchronisation point.
    pub fn passes(&self) -> Vec<Pass> {
        let mut passes = Vec::new();
        let mut open: Option<Pass> = None;
        for &op in &self.ops {
            match op {
                FrameOp::Dispatch(k) => {
                    if let Some(Pass::Compute(ks)) = &mut open {
                        ks.push(k);
                        continue;
                    }
                    passes.extend(open.take());
                    open = Some(Pass::Compute(vec![k]));
                }
                FrameOp::Draw(s) => {
                    if let Some(Pass::Render(ss)) = &mut open {
                        ss.push(s);
                        continue;
                    }
                    passes.extend(open.take());
                    open = Some(Pass::Render(vec![s]));
                }
                FrameOp::Publish => {
                    passes.extend(open.take());
                    passes.push(Pass::Publish);
                }
                FrameOp::Fence => passes.extend(open.take()),
            }
        }
        passes.extend(open);
        passes
    }

    pub fn validate(&self) -> Result<(), PlanError> {
        // Resource -> publish epoch of its latest write.
        let mut written: HashMap<Resource, u32> = HashMap::new();
        let mut unfenced: HashSet<Resource> = HashSet::new();
        let mut unpublished = false;
        let mut epoch = 0u32;

        for (index, op) in self.ops.iter().enumerate() {
            match *op {
                FrameOp::Dispatch(Kernel::GenerateNoise) => {
                    return Err(PlanError::SetupKernelInFrame {
                        index,
                        kernel: Kernel::GenerateNoise,
                    });
                }
                FrameOp::Dispatch(Kernel::Simulate) if !self.iterative => {
                    return Err(PlanError::StaticPlanSimulates { index });
                }
                FrameOp::Dispatch(kernel) => {
                    if unpublished && kernel.reads().contains(&Resource::Published) {
                        return Err(PlanError::ConsumerBeforePublish { index, kernel });
                    }
                    if kernel == Kernel::Simulate {
                        unpublished = true;
                    }
                    for &r in kernel.writes() {
                        written.insert(r, epoch);
                        unfenced.insert(r);
                    }
                }
                FrameOp::Publish => {
                    if !self.iterative {
                        return Err(PlanError::StaticPlanSimulates { index });
                    }
                    if !unpublished {
                        return Err(PlanError::PublishWithoutSimulate { index });
                    }
                    unpublished = false;
                    epoch += 1;
                    written.insert(Resource::Published, epoch);
                    unfenced.insert(Resource::Published);
                }
                FrameOp::Fence => unfenced.clear(),
                FrameOp::Draw(surface) => {
                    let mesh = mesh_resource(surface);
                    match written.get(&mesh) {
                        None => return Err(PlanError::MissingProducer { index, surface }),
                        Some(&at) if at < epoch => {
                            return Err(PlanError::StaleProducer { index, surface });
                        }
                        Some(_) => {}
                    }
                    if unfenced.contains(&mesh) {
                        return Err(PlanError::UnfencedDraw { index, surface });
                    }
                }
            }
        }
        Ok(())
    }
}
