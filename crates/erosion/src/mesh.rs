//! Vertex buffers written by `MeshTerrain` / `MeshWater`.

use terrain::{Grid, Surface, Vertex};

use crate::error::SetupError;

/// Corners c0 c1 c2 / c2 c3 c0 wind clockwise seen from +Y.
pub const FRONT_FACE: wgpu::FrontFace = wgpu::FrontFace::Cw;

pub const VERTEX_ATTRIBUTES: [wgpu::VertexAttribute; 4] = wgpu::vertex_attr_array![
    0 => Float32x3,
    1 => Float32x3,
    2 => Float32x4,
    3 => Float32x2
];

pub fn vertex_layout() -> wgpu::VertexBufferLayout<'static> {
    wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &VERTEX_ATTRIBUTES,
    }
}

/// Non-indexed vertex streams, sized once from the grid.
pub struct MeshBuffers {
    terrain: wgpu::Buffer,
    water: Option<wgpu::Buffer>,
    vertex_count: u32,
}

impl MeshBuffers {
    pub fn check_size(grid: &Grid, limits: &wgpu::Limits) -> Result<u64, SetupError> {
        let size = grid.vertex_buffer_size();
        let limit = u64::from(limits.max_storage_buffer_binding_size).min(limits.max_buffer_size);
        if size > limit {
            return Err(SetupError::BufferTooLarge {
                label: "vertex buffer",
                size,
                limit,
            });
        }
        Ok(size)
    }

    pub fn allocate(device: &wgpu::Device, grid: &Grid) -> Result<Self, SetupError> {
        let size = Self::check_size(grid, &device.limits())?;
        let create = |label: &str| {
            device.create_buffer(&wgpu::BufferDescriptor {
                label: Some(label),
                size,
                usage: wgpu::BufferUsages::STORAGE
                    | wgpu::BufferUsages::VERTEX
                    | wgpu::BufferUsages::COPY_SRC,
                mapped_at_creation: false,
            })
        };
        Ok(Self {
            terrain: create("Terrain Mesh"),
            water: grid.has_water_surface().then(|| create("Water Mesh")),
            vertex_count: grid.vertex_count(),
        })
    }

    pub fn buffer(&self, surface: Surface) -> Option<&wgpu::Buffer> {
        match surface {
            Surface::Terrain => Some(&self.terrain),
            Surface::Water => self.water.as_ref(),
        }
    }

    pub fn terrain(&self) -> &wgpu::Buffer {
        &self.terrain
    }

    pub fn vertex_count(&self) -> u32 {
        self.vertex_count
    }

    pub(crate) fn release(self) {
        self.terrain.destroy();
        if let Some(water) = self.water {
            water.destroy();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::mem::offset_of;

    #[test]
    fn attributes_follow_vertex_layout() {
        let offsets: Vec<u64> = VERTEX_ATTRIBUTES.iter().map(|a| a.offset).collect();
        assert_eq!(
            offsets,
            vec![
                offset_of!(Vertex, position) as u64,
                offset_of!(Vertex, normal) as u64,
                offset_of!(Vertex, tangent) as u64,
                offset_of!(Vertex, uv) as u64,
            ]
        );
        assert_eq!(vertex_layout().array_stride, 48);
    }

    #[test]
    fn oversized_grid_is_rejected_before_allocation() {
        let grid = Grid::new(terrain::GridParams {
            resolution: 2048,
            ..Default::default()
        })
        .unwrap();
        let limits = wgpu::Limits::default();
        assert!(matches!(
            MeshBuffers::check_size(&grid, &limits),
            Err(SetupError::BufferTooLarge { .. })
        ));
    }
}
