//! Device-program reflection.
//!
//! The WGSL source is parsed with naga before any device object exists, so a
//! missing entry point or binding is caught while nothing is allocated yet.

use std::collections::HashMap;

use crate::error::SetupError;
use crate::kernel::Kernel;

pub const EROSION_WGSL: &str = include_str!("shaders/erosion.wgsl");
pub const DRAW_WGSL: &str = include_str!("shaders/draw.wgsl");

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EntryInfo {
    pub stage: naga::ShaderStage,
    pub workgroup_size: [u32; 3],
}

/// A kernel whose entry point was found and checked against the tile size.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ResolvedKernel {
    pub kernel: Kernel,
    pub workgroup_size: [u32; 3],
}

/// Parsed device program: source plus reflected entry points and bindings.
pub struct DeviceProgram {
    label: String,
    source: String,
    entry_points: HashMap<String, EntryInfo>,
    /// Global name -> (group, binding)
    globals: HashMap<String, (u32, u32)>,
}

impl DeviceProgram {
    pub fn from_wgsl(label: &str, source: &str) -> Result<Self, SetupError> {
        let module =
            naga::front::wgsl::parse_str(source).map_err(|e| SetupError::ShaderParse {
                label: label.to_string(),
                message: e.emit_to_string(source),
            })?;

        let entry_points = module
            .entry_points
            .iter()
            .map(|ep| {
                (
                    ep.name.clone(),
                    EntryInfo {
                        stage: ep.stage,
                        workgroup_size: ep.workgroup_size,
                    },
                )
            })
            .collect();

        let globals = module
            .global_variables
            .iter()
            .filter_map(|(_, var)| {
                let name = var.name.clone()?;
                let binding = var.binding.as_ref()?;
                Some((name, (binding.group, binding.binding)))
            })
            .collect();

        Ok(Self {
            label: label.to_string(),
            source: source.to_string(),
            entry_points,
            globals,
        })
    }

    /// The shipped erosion program.
    pub fn erosion() -> Result<Self, SetupError> {
        Self::from_wgsl("erosion.wgsl", EROSION_WGSL)
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn entry_point(&self, name: &str) -> Option<&EntryInfo> {
        self.entry_points.get(name)
    }

    pub fn declares(&self, name: &str) -> bool {
        self.globals.contains_key(name)
    }

    pub fn resolve(&self, kernel: Kernel, tile_size: u32) -> Result<ResolvedKernel, SetupError> {
        let name = kernel.entry_point();
        let info = self
            .entry_points
            .get(name)
            .ok_or(SetupError::MissingEntryPoint { name })?;

        if info.stage != naga::ShaderStage::Compute {
            return Err(SetupError::NotCompute { name });
        }

        let expected = [tile_size, tile_size, 1];
        if info.workgroup_size != expected {
            return Err(SetupError::WorkgroupMismatch {
                name,
                expected,
                found: info.workgroup_size,
            });
        }

        for binding in kernel.bindings() {
            if self.globals.get(binding.name()) != Some(&(0, binding.index())) {
                return Err(SetupError::MissingBinding {
                    kernel: name,
                    binding: binding.name(),
                });
            }
        }

        Ok(ResolvedKernel {
            kernel,
            workgroup_size: info.workgroup_size,
        })
    }

    /// Resolve every kernel or fail on the first one that does not check out.
    pub fn resolve_all(
        &self,
        kernels: &[Kernel],
        tile_size: u32,
    ) -> Result<Vec<ResolvedKernel>, SetupError> {
        kernels
            .iter()
            .map(|&k| self.resolve(k, tile_size))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PARTIAL: &str = r#"
struct Cell { height: f32, nx: f32, ny: f32, nz: f32, water: f32 }
@group(0) @binding(0) var<uniform> _params: vec4<u32>;
@group(0) @binding(1) var<storage, read_write> _data: array<Cell>;

@compute @workgroup_size(32, 32, 1)
fn GenerateNoise(@builtin(global_invocation_id) id: vec3<u32>) {
    _data[id.x].height = 0.0;
}

@compute @workgroup_size(16, 16, 1)
fn GenerateNormals(@builtin(global_invocation_id) id: vec3<u32>) {
    _data[id.x].ny = 1.0;
}
"#;

    #[test]
    fn shipped_program_resolves_every_kernel() {
        let program = DeviceProgram::erosion().unwrap();
        let resolved = program.resolve_all(&Kernel::ALL, 32).unwrap();
        assert_eq!(resolved.len(), Kernel::ALL.len());
        assert!(resolved.iter().all(|r| r.workgroup_size == [32, 32, 1]));
    }

    #[test]
    fn missing_entry_point_is_fatal() {
        let program = DeviceProgram::from_wgsl("partial", PARTIAL).unwrap();
        assert!(program.resolve(Kernel::GenerateNoise, 32).is_ok());
        assert!(matches!(
            program.resolve(Kernel::MeshTerrain, 32),
            Err(SetupError::MissingEntryPoint { name: "MeshTerrain" })
        ));
    }

    #[test]
    fn tile_mismatch_is_fatal() {
        let program = DeviceProgram::from_wgsl("partial", PARTIAL).unwrap();
        match program.resolve(Kernel::GenerateNormals, 32) {
            Err(SetupError::WorkgroupMismatch {
                expected, found, ..
            }) => {
                assert_eq!(expected, [32, 32, 1]);
                assert_eq!(found, [16, 16, 1]);
            }
            other => panic!("expected workgroup mismatch, got {:?}", other),
        }
    }

    #[test]
    fn resolve_all_stops_at_first_failure() {
        let program = DeviceProgram::from_wgsl("partial", PARTIAL).unwrap();
        let err = program
            .resolve_all(&[Kernel::GenerateNoise, Kernel::Simulate], 32)
            .unwrap_err();
        assert!(matches!(err, SetupError::MissingEntryPoint { name: "Simulate" }));
    }

    #[test]
    fn undeclared_binding_is_fatal() {
        let src = r#"
@group(0) @binding(0) var<uniform> _params: vec4<u32>;
@compute @workgroup_size(32, 32, 1)
fn GenerateNoise(@builtin(global_invocation_id) id: vec3<u32>) {
    let r = _params.x;
}
"#;
        let program = DeviceProgram::from_wgsl("no-data", src).unwrap();
        assert!(matches!(
            program.resolve(Kernel::GenerateNoise, 32),
            Err(SetupError::MissingBinding {
                binding: "_data",
                ..
            })
        ));
    }

    #[test]
    fn draw_entry_points_are_not_compute() {
        let program = DeviceProgram::from_wgsl("draw.wgsl", DRAW_WGSL).unwrap();
        assert_eq!(
            program.entry_point("vs_main").map(|e| e.stage),
            Some(naga::ShaderStage::Vertex)
        );
        assert!(program.declares("u_draw"));
    }

    #[test]
    fn parse_error_is_reported() {
        let err = DeviceProgram::from_wgsl("broken", "fn (").err().unwrap();
        assert!(matches!(err, SetupError::ShaderParse { .. }));
    }
}
