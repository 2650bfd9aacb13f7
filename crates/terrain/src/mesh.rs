//! Reference mesh extraction.
//!
//! Turns a heightfield into a non-indexed triangle list: every quad `(x, y)`
//! emits six vertices from its corners
//!
//! ```text
//!   c3 (x, y+1) ---- c2 (x+1, y+1)
//!      |                 |
//!   c0 (x, y)   ---- c1 (x+1, y)
//! ```
//!
//! as triangles `c0 c1 c2` and `c2 c3 c0`. With +Y up and grid rows along
//! +Z these are clockwise seen from above, which is the front face the draw
//! pipelines use.
//!
//! The `MeshTerrain` / `MeshWater` kernels implement the same contract on the
//! device; this module is the host-side reference used by tests and
//! diagnostics.

use glam::Vec3;

use crate::layout::{cell_index, quad_vertex_base, Cell, Vertex};
use crate::normals::{surface_normal, tangent_for, Surface};
use crate::params::Grid;

/// Corner offsets in emission order.
pub const QUAD_CORNERS: [(u32, u32); 6] = [(0, 0), (1, 0), (1, 1), (1, 1), (0, 1), (0, 0)];

/// Build the vertex for grid corner `(x, y)` of `surface`.
pub fn corner_vertex(cells: &[Cell], grid: &Grid, surface: Surface, x: u32, y: u32) -> Vertex {
    let r = grid.resolution();
    let p = grid.params();
    let h = surface.sample(&cells[cell_index(x, y, r)]);
    let normal = surface_normal(cells, grid, surface, x, y);

    Vertex {
        position: [
            x as f32 * p.cell_size,
            h * p.max_height,
            y as f32 * p.cell_size,
        ],
        normal: normal.to_array(),
        tangent: tangent_for(normal).to_array(),
        uv: [x as f32 / r as f32, y as f32 / r as f32],
    }
}

/// Extract `surface` into `out`, which must hold exactly `grid.vertex_count()`
/// vertices. Every slot is overwritten.
pub fn extract_into(cells: &[Cell], grid: &Grid, surface: Surface, out: &mut [Vertex]) {
    let r = grid.resolution();
    assert_eq!(cells.len(), grid.cell_count() as usize, "heightfield size");
    assert_eq!(out.len(), grid.vertex_count() as usize, "vertex buffer size");

    for y in 0..r - 1 {
        for x in 0..r - 1 {
            let base = quad_vertex_base(x, y, r);
            for (i, (dx, dy)) in QUAD_CORNERS.iter().enumerate() {
                out[base + i] = corner_vertex(cells, grid, surface, x + dx, y + dy);
            }
        }
    }
}

/// Extract `surface` into a fresh vertex list.
pub fn extract(cells: &[Cell], grid: &Grid, surface: Surface) -> Vec<Vertex> {
    let mut out = vec![Vertex::default(); grid.vertex_count() as usize];
    extract_into(cells, grid, surface, &mut out);
    out
}

/// True when `a b c` winds clockwise seen from +Y.
pub fn is_clockwise_from_above(a: Vec3, b: Vec3, c: Vec3) -> bool {
    (b - a).cross(c - a).y < 0.0
}
