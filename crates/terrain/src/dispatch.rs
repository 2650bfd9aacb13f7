//! Workgroup grid sizing.

/// What one work-item of a kernel covers.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum DispatchDomain {
    /// One item per cell: `resolution` items per axis.
    PerCell,
    /// One item per quad: `resolution - 1` items per axis.
    PerQuad,
}

impl DispatchDomain {
    /// Work-items per axis for a grid of the given resolution.
    pub fn extent(self, resolution: u32) -> u32 {
        match self {
            DispatchDomain::PerCell => resolution,
            DispatchDomain::PerQuad => resolution.saturating_sub(1),
        }
    }
}

/// Workgroup counts for a 2-D dispatch.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct DispatchGrid {
    pub x: u32,
    pub y: u32,
}

impl DispatchGrid {
    pub fn for_domain(domain: DispatchDomain, resolution: u32, tile_size: u32) -> Self {
        let groups = workgroups(domain.extent(resolution), tile_size);
        Self {
            x: groups,
            y: groups,
        }
    }

    /// Work-items launched along one axis.
    pub fn items_x(&self, tile_size: u32) -> u32 {
        self.x * tile_size
    }
}

/// `ceil(n / tile)`, never less than one group.
///
/// A per-quad extent of `resolution - 1` can be smaller than a single tile;
/// dispatching zero groups there would silently skip the kernel.
pub fn workgroups(n: u32, tile_size: u32) -> u32 {
    debug_assert!(tile_size > 0);
    n.div_ceil(tile_size).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_tile_grid() {
        // R = 32: one tile for cells, and 31 quads still get one group.
        assert_eq!(
            DispatchGrid::for_domain(DispatchDomain::PerCell, 32, 32),
            DispatchGrid { x: 1, y: 1 }
        );
        assert_eq!(
            DispatchGrid::for_domain(DispatchDomain::PerQuad, 32, 32),
            DispatchGrid { x: 1, y: 1 }
        );
    }

    #[test]
    fn two_tile_grid_covers_every_quad() {
        let cells = DispatchGrid::for_domain(DispatchDomain::PerCell, 64, 32);
        assert_eq!(cells, DispatchGrid { x: 2, y: 2 });

        let quads = DispatchGrid::for_domain(DispatchDomain::PerQuad, 64, 32);
        assert_eq!(quads, DispatchGrid { x: 2, y: 2 });
        assert!(quads.items_x(32) >= 63);
    }

    #[test]
    fn zero_extent_still_dispatches_one_group() {
        assert_eq!(workgroups(0, 32), 1);
        assert_eq!(workgroups(1, 32), 1);
        assert_eq!(workgroups(33, 32), 2);
    }
}
