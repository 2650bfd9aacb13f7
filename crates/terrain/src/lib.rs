//! Heightfield grid model.
//!
//! Device-independent half of the terrain pipeline: validated grid
//! parameters, the cell and vertex layouts shared with the device program,
//! workgroup sizing, the two-slot ping-pong arena, and host-side reference
//! implementations of normal estimation and mesh extraction.
//!
//! # Example
//!
//! ```
//! use terrain::{mesh, Cell, Grid, GridParams, Surface};
//!
//! let grid = Grid::new(GridParams { resolution: 32, ..Default::default() }).unwrap();
//! let cells = vec![Cell::with_height(0.5); grid.cell_count() as usize];
//! let verts = mesh::extract(&cells, &grid, Surface::Terrain);
//! assert_eq!(verts.len(), 31 * 31 * 6);
//! ```

pub mod dispatch;
pub mod layout;
pub mod mesh;
pub mod normals;
pub mod params;
pub mod ping_pong;
pub mod stats;

pub use dispatch::{workgroups, DispatchDomain, DispatchGrid};
pub use layout::{cell_index, quad_vertex_base, Cell, Vertex};
pub use normals::{generate_normals, surface_normal, Surface};
pub use params::{ConfigError, Grid, GridParams, SimulationMode, DEFAULT_TILE_SIZE};
pub use ping_pong::{PingPong, Role};
pub use stats::HeightStats;
