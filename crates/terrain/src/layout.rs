//! Memory layouts shared with the device program.
//!
//! These are `#[repr(C)]` and contain only `f32` scalars so that the WGSL
//! structs of the same name have identical size, alignment and stride.

use bytemuck::{Pod, Zeroable};

/// Per-grid-point simulation state (20 bytes).
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct Cell {
    /// Normalized height in `[0, 1]`; scaled by `max_height` when meshed.
    pub height: f32,
    pub normal: [f32; 3],
    /// Water column on top of the terrain, same units as `height`.
    pub water: f32,
}

impl Cell {
    pub fn with_height(height: f32) -> Self {
        Self {
            height,
            normal: [0.0, 1.0, 0.0],
            water: 0.0,
        }
    }
}

/// Mesh vertex (48 bytes). Non-indexed: six per grid quad.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub tangent: [f32; 4],
    pub uv: [f32; 2],
}

/// Row-major cell index: `y * resolution + x`.
#[inline]
pub fn cell_index(x: u32, y: u32, resolution: u32) -> usize {
    debug_assert!(x < resolution && y < resolution);
    (y * resolution + x) as usize
}

/// Index of the first of the six vertices emitted for quad `(x, y)`.
#[inline]
pub fn quad_vertex_base(x: u32, y: u32, resolution: u32) -> usize {
    let quads_per_row = resolution - 1;
    debug_assert!(x < quads_per_row && y < quads_per_row);
    (y * quads_per_row + x) as usize * 6
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sizes_match_device_strides() {
        assert_eq!(std::mem::size_of::<Cell>(), 20);
        assert_eq!(std::mem::size_of::<Vertex>(), 48);
        assert_eq!(std::mem::align_of::<Vertex>(), 4);
    }

    #[test]
    fn quad_base_is_contiguous() {
        let r = 4;
        assert_eq!(quad_vertex_base(0, 0, r), 0);
        assert_eq!(quad_vertex_base(1, 0, r), 6);
        assert_eq!(quad_vertex_base(0, 1, r), 18);
        assert_eq!(quad_vertex_base(2, 2, r), (3 * 3 - 1) * 6);
    }
}
