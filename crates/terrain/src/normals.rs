//! Central-difference normal estimation.
//!
//! Shared by the normal pass and both mesh surfaces. The WGSL program carries
//! the same arithmetic in `surface_normal`, so the two stay comparable.

use glam::{Vec3, Vec4};

use crate::layout::{cell_index, Cell};
use crate::params::Grid;

/// Which scalar field of a cell a surface follows.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Surface {
    /// Terrain height.
    Terrain,
    /// Terrain height plus water column.
    Water,
}

impl Surface {
    #[inline]
    pub fn sample(self, cell: &Cell) -> f32 {
        match self {
            Surface::Terrain => cell.height,
            Surface::Water => cell.height + cell.water,
        }
    }
}

/// Normal of `surface` at cell `(x, y)`.
///
/// Interior cells use a central difference over the 4-neighbourhood; border
/// cells fall back to a one-sided difference.
pub fn surface_normal(cells: &[Cell], grid: &Grid, surface: Surface, x: u32, y: u32) -> Vec3 {
    let r = grid.resolution();
    let p = grid.params();
    let at = |x: u32, y: u32| surface.sample(&cells[cell_index(x, y, r)]);

    let (x0, x1) = (x.saturating_sub(1), (x + 1).min(r - 1));
    let (y0, y1) = (y.saturating_sub(1), (y + 1).min(r - 1));

    let dhdx = (at(x1, y) - at(x0, y)) * p.max_height / ((x1 - x0) as f32 * p.cell_size);
    let dhdz = (at(x, y1) - at(x, y0)) * p.max_height / ((y1 - y0) as f32 * p.cell_size);

    Vec3::new(-dhdx, 1.0, -dhdz).normalize()
}

/// Tangent along +X, orthogonal to `normal`. `w` is the bitangent sign.
pub fn tangent_for(normal: Vec3) -> Vec4 {
    // normal.y is always positive here, so this never degenerates.
    let t = Vec3::new(normal.y, -normal.x, 0.0).normalize();
    t.extend(1.0)
}

/// Host-side equivalent of the `GenerateNormals` pass: rewrites every
/// cell's normal from the terrain surface.
pub fn generate_normals(cells: &mut [Cell], grid: &Grid) {
    let r = grid.resolution();
    assert_eq!(cells.len(), grid.cell_count() as usize);

    let normals: Vec<Vec3> = (0..r)
        .flat_map(|y| (0..r).map(move |x| (x, y)))
        .map(|(x, y)| surface_normal(cells, grid, Surface::Terrain, x, y))
        .collect();

    for (cell, n) in cells.iter_mut().zip(normals) {
        cell.normal = n.to_array();
    }
}
