//! Property-based tests for the grid model using proptest
//!
//! Invariants checked across random grid sizes:
//! - Vertex count is exactly (R-1)² * 6
//! - Cell indexing is row-major and a bijection onto 0..R²
//! - Per-quad dispatch covers every quad with at least one group
//! - Ping-pong "current" holds exactly k updates after k ticks

use proptest::prelude::*;
use terrain::{
    cell_index, mesh, workgroups, Cell, DispatchDomain, DispatchGrid, Grid, GridParams, PingPong,
    Surface,
};

fn grid(tiles: u32, tile_size: u32) -> Grid {
    Grid::new(GridParams {
        resolution: tiles * tile_size,
        tile_size,
        ..Default::default()
    })
    .unwrap()
}

proptest! {
    #[test]
    fn vertex_count_is_six_per_quad(tiles in 1u32..6, tile_size in prop::sample::select(vec![2u32, 4, 8])) {
        let g = grid(tiles, tile_size);
        let r = g.resolution();
        prop_assert_eq!(g.vertex_count(), (r - 1) * (r - 1) * 6);

        let cells = vec![Cell::with_height(0.5); g.cell_count() as usize];
        let verts = mesh::extract(&cells, &g, Surface::Terrain);
        prop_assert_eq!(verts.len() as u32, g.vertex_count());
    }

    #[test]
    fn cell_index_is_row_major(tiles in 1u32..8, tile_size in prop::sample::select(vec![4u32, 16, 32])) {
        let g = grid(tiles, tile_size);
        let r = g.resolution();
        let mut seen = vec![false; g.cell_count() as usize];
        for y in 0..r {
            for x in 0..r {
                let i = cell_index(x, y, r);
                prop_assert_eq!(i, (y * r + x) as usize);
                prop_assert!(!seen[i]);
                seen[i] = true;
            }
        }
        prop_assert!(seen.into_iter().all(|s| s));
    }

    #[test]
    fn dispatch_covers_domain(tiles in 1u32..64, tile_size in prop::sample::select(vec![8u32, 16, 32])) {
        let r = tiles * tile_size;
        for domain in [DispatchDomain::PerCell, DispatchDomain::PerQuad] {
            let grid = DispatchGrid::for_domain(domain, r, tile_size);
            prop_assert!(grid.x >= 1 && grid.y >= 1);
            prop_assert!(grid.items_x(tile_size) >= domain.extent(r));
            // no whole group is wasted
            prop_assert!(grid.items_x(tile_size) < domain.extent(r) + tile_size || grid.x == 1);
        }
        prop_assert_eq!(workgroups(r, tile_size), tiles);
    }

    #[test]
    fn ping_pong_current_holds_k_updates(k in 0usize..40) {
        // Each update adds one to every element of the source.
        let mut pp = PingPong::new(vec![0u64; 8], vec![0u64; 8]);
        for _ in 0..k {
            let (read, write) = pp.split();
            for (w, r) in write.iter_mut().zip(read.iter()) {
                *w = r + 1;
            }
            pp.commit();
        }
        prop_assert_eq!(pp.generation(), k as u64);
        prop_assert!(pp.current().iter().all(|&v| v == k as u64));
    }
}
