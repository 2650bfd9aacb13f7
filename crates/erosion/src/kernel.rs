//! The fixed kernel table.
//!
//! Each compute stage is described by its entry-point name, dispatch domain,
//! the named resources it binds, and the logical resources it reads and
//! writes. The kernel bodies live in the device program and can be swapped
//! without touching the orchestrator as long as this interface holds.

use terrain::{DispatchDomain, Grid};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Kernel {
    GenerateNoise,
    Simulate,
    GenerateNormals,
    ToTexture,
    MeshTerrain,
    MeshWater,
}

/// A named resource slot in the device program (group 0).
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Binding {
    Params,
    Data,
    DataA,
    DataB,
    TerrainMesh,
    WaterMesh,
    Texture,
}

/// Logical resource used for dependency tracking in a frame plan.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Resource {
    /// The ping-pong pair. `Simulate` reads one slot and writes the other.
    State,
    /// The stable buffer every consumer binds.
    Published,
    TerrainMesh,
    WaterMesh,
    Texture,
}

impl Kernel {
    pub const ALL: [Kernel; 6] = [
        Kernel::GenerateNoise,
        Kernel::Simulate,
        Kernel::GenerateNormals,
        Kernel::ToTexture,
        Kernel::MeshTerrain,
        Kernel::MeshWater,
    ];

    pub fn entry_point(self) -> &'static str {
        match self {
            Kernel::GenerateNoise => "GenerateNoise",
            Kernel::Simulate => "Simulate",
            Kernel::GenerateNormals => "GenerateNormals",
            Kernel::ToTexture => "ToTexture",
            Kernel::MeshTerrain => "MeshTerrain",
            Kernel::MeshWater => "MeshWater",
        }
    }

    pub fn domain(self) -> DispatchDomain {
        match self {
            Kernel::MeshTerrain | Kernel::MeshWater => DispatchDomain::PerQuad,
            _ => DispatchDomain::PerCell,
        }
    }

    /// Bindings in binding-index order.
    pub fn bindings(self) -> &'static [Binding] {
        match self {
            Kernel::GenerateNoise | Kernel::GenerateNormals => &[Binding::Params, Binding::Data],
            Kernel::Simulate => &[Binding::Params, Binding::DataA, Binding::DataB],
            Kernel::ToTexture => &[Binding::Params, Binding::Data, Binding::Texture],
            Kernel::MeshTerrain => &[Binding::Params, Binding::Data, Binding::TerrainMesh],
            Kernel::MeshWater => &[Binding::Params, Binding::Data, Binding::WaterMesh],
        }
    }

    pub fn reads(self) -> &'static [Resource] {
        match self {
            Kernel::GenerateNoise => &[],
            Kernel::Simulate => &[Resource::State],
            _ => &[Resource::Published],
        }
    }

    pub fn writes(self) -> &'static [Resource] {
        match self {
            Kernel::GenerateNoise | Kernel::GenerateNormals => &[Resource::Published],
            Kernel::Simulate => &[Resource::State],
            Kernel::ToTexture => &[Resource::Texture],
            Kernel::MeshTerrain => &[Resource::TerrainMesh],
            Kernel::MeshWater => &[Resource::WaterMesh],
        }
    }

    /// Kernels a configuration cannot run without, in setup order.
    pub fn required(grid: &Grid) -> Vec<Kernel> {
        let mut kernels = vec![Kernel::GenerateNoise];
        if grid.is_iterative() {
            kernels.push(Kernel::Simulate);
        }
        kernels.push(Kernel::GenerateNormals);
        kernels.push(Kernel::MeshTerrain);
        if grid.has_water_surface() {
            kernels.push(Kernel::MeshWater);
        }
        if grid.has_preview_texture() {
            kernels.push(Kernel::ToTexture);
        }
        kernels
    }
}

impl Binding {
    /// Variable name in the device program.
    pub fn name(self) -> &'static str {
        match self {
            Binding::Params => "_params",
            Binding::Data => "_data",
            Binding::DataA => "_dataA",
            Binding::DataB => "_dataB",
            Binding::TerrainMesh => "_terrainMesh",
            Binding::WaterMesh => "_waterMesh",
            Binding::Texture => "_texture",
        }
    }

    /// `@binding(n)` in group 0.
    pub fn index(self) -> u32 {
        match self {
            Binding::Params => 0,
            Binding::Data => 1,
            Binding::DataA => 2,
            Binding::DataB => 3,
            Binding::TerrainMesh => 4,
            Binding::WaterMesh => 5,
            Binding::Texture => 6,
        }
    }

    pub fn layout_entry(self) -> wgpu::BindGroupLayoutEntry {
        let ty = match self {
            Binding::Params => wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            Binding::DataA => wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Storage { read_only: true },
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            Binding::Data | Binding::DataB | Binding::TerrainMesh | Binding::WaterMesh => {
                wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Storage { read_only: false },
                    has_dynamic_offset: false,
                    min_binding_size: None,
                }
            }
            Binding::Texture => wgpu::BindingType::StorageTexture {
                access: wgpu::StorageTextureAccess::WriteOnly,
                format: crate::texture::PREVIEW_FORMAT,
                view_dimension: wgpu::TextureViewDimension::D2,
            },
        };
        wgpu::BindGroupLayoutEntry {
            binding: self.index(),
            visibility: wgpu::ShaderStages::COMPUTE,
            ty,
            count: None,
        }
    }
}
