//! Grid configuration.
//!
//! [`GridParams`] is the serializable surface handed in from outside. It is
//! turned into an immutable [`Grid`] by [`Grid::new`], which is the only place
//! configuration is validated. Every other component takes a `&Grid`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

use crate::layout::{Cell, Vertex};

/// Default workgroup tile edge (work-items per axis).
pub const DEFAULT_TILE_SIZE: u32 = 32;

/// How the heightfield evolves over time.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum SimulationMode {
    /// One buffer, rewritten in place by stateless passes. No `Simulate`.
    Static,
    /// Two buffers in ping-pong roles, advanced by `Simulate` every tick.
    #[default]
    Iterative,
}

/// User-facing grid configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridParams {
    /// Cells per side. Must be a positive multiple of `tile_size`.
    pub resolution: u32,
    /// Workgroup tile edge the device program was compiled with.
    pub tile_size: u32,
    pub noise_freq: f32,
    /// Vertical scale applied to normalized heights.
    pub max_height: f32,
    /// World-space spacing between neighbouring cells.
    pub cell_size: f32,
    pub mode: SimulationMode,
    /// Extract and draw a separate water surface.
    pub water_surface: bool,
    /// Keep the preview texture up to date.
    pub preview_texture: bool,
    /// Offset into the noise domain.
    pub seed: u32,

    // Uniforms consumed only by the simulate kernel.
    pub erosion_rate: f32,
    pub talus: f32,
    pub rain_rate: f32,
    pub evaporation: f32,
}

impl Default for GridParams {
    fn default() -> Self {
        Self {
            resolution: 512,
            tile_size: DEFAULT_TILE_SIZE,
            noise_freq: 0.1,
            max_height: 128.0,
            cell_size: 1.0,
            mode: SimulationMode::Iterative,
            water_surface: true,
            preview_texture: true,
            seed: 0,
            erosion_rate: 0.25,
            talus: 0.004,
            rain_rate: 0.0005,
            evaporation: 0.02,
        }
    }
}

impl GridParams {
    /// Load parameters from a JSON file. Missing fields take their defaults.
    pub fn load_json(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let json = std::fs::read_to_string(path)?;
        let params = serde_json::from_str(&json)?;
        Ok(params)
    }

    /// Save parameters to a JSON file.
    pub fn save_json(&self, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

/// Fatal configuration error. There is no degraded mode; setup stops.
#[derive(Clone, Debug, PartialEq)]
pub enum ConfigError {
    ZeroTileSize,
    ZeroResolution,
    /// Coverage would silently drop the last partial tile.
    NotTileMultiple { resolution: u32, tile_size: u32 },
    /// A grid needs at least one quad to produce a mesh.
    TooSmall { resolution: u32 },
    /// `resolution²` cells do not fit the index type.
    TooLarge { resolution: u32 },
    NonFinite { field: &'static str },
    NotPositive { field: &'static str, value: f32 },
    Negative { field: &'static str, value: f32 },
    OutOfUnitRange { field: &'static str, value: f32 },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::ZeroTileSize => write!(f, "tile size must be positive"),
            ConfigError::ZeroResolution => write!(f, "resolution must be positive"),
            ConfigError::NotTileMultiple {
                resolution,
                tile_size,
            } => write!(
                f,
                "resolution {} is not a multiple of tile size {}",
                resolution, tile_size
            ),
            ConfigError::TooSmall { resolution } => {
                write!(f, "resolution {} has no quads to mesh", resolution)
            }
            ConfigError::TooLarge { resolution } => {
                write!(f, "resolution {} overflows the cell index range", resolution)
            }
            ConfigError::NonFinite { field } => write!(f, "{} must be finite", field),
            ConfigError::NotPositive { field, value } => {
                write!(f, "{} must be positive, got {}", field, value)
            }
            ConfigError::Negative { field, value } => {
                write!(f, "{} must not be negative, got {}", field, value)
            }
            ConfigError::OutOfUnitRange { field, value } => {
                write!(f, "{} must lie in [0, 1], got {}", field, value)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Validated, immutable grid configuration.
#[derive(Clone, Debug, PartialEq)]
pub struct Grid {
    params: GridParams,
}

impl Grid {
    pub fn new(params: GridParams) -> Result<Self, ConfigError> {
        if params.tile_size == 0 {
            return Err(ConfigError::ZeroTileSize);
        }
        if params.resolution == 0 {
            return Err(ConfigError::ZeroResolution);
        }
        if params.resolution % params.tile_size != 0 {
            return Err(ConfigError::NotTileMultiple {
                resolution: params.resolution,
                tile_size: params.tile_size,
            });
        }
        if params.resolution < 2 {
            return Err(ConfigError::TooSmall {
                resolution: params.resolution,
            });
        }
        // Vertex indices are u32 on the device: (R-1)² * 6 must fit.
        let quads = (params.resolution as u64 - 1).pow(2);
        if quads * 6 > u32::MAX as u64 {
            return Err(ConfigError::TooLarge {
                resolution: params.resolution,
            });
        }

        positive("max_height", params.max_height)?;
        positive("cell_size", params.cell_size)?;
        finite("noise_freq", params.noise_freq)?;
        non_negative("erosion_rate", params.erosion_rate)?;
        non_negative("talus", params.talus)?;
        non_negative("rain_rate", params.rain_rate)?;
        finite("evaporation", params.evaporation)?;
        if !(0.0..=1.0).contains(&params.evaporation) {
            return Err(ConfigError::OutOfUnitRange {
                field: "evaporation",
                value: params.evaporation,
            });
        }

        Ok(Self { params })
    }

    pub fn params(&self) -> &GridParams {
        &self.params
    }

    pub fn resolution(&self) -> u32 {
        self.params.resolution
    }

    pub fn tile_size(&self) -> u32 {
        self.params.tile_size
    }

    pub fn mode(&self) -> SimulationMode {
        self.params.mode
    }

    pub fn is_iterative(&self) -> bool {
        self.params.mode == SimulationMode::Iterative
    }

    pub fn has_water_surface(&self) -> bool {
        self.params.water_surface
    }

    pub fn has_preview_texture(&self) -> bool {
        self.params.preview_texture
    }

    /// `R²`
    pub fn cell_count(&self) -> u32 {
        self.params.resolution * self.params.resolution
    }

    /// `(R-1)²`
    pub fn quad_count(&self) -> u32 {
        let q = self.params.resolution - 1;
        q * q
    }

    /// `(R-1)² * 6`, fixed for the lifetime of the grid.
    pub fn vertex_count(&self) -> u32 {
        self.quad_count() * 6
    }

    pub fn cell_buffer_size(&self) -> u64 {
        self.cell_count() as u64 * std::mem::size_of::<Cell>() as u64
    }

    pub fn vertex_buffer_size(&self) -> u64 {
        self.vertex_count() as u64 * std::mem::size_of::<Vertex>() as u64
    }
}

fn finite(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::NonFinite { field })
    }
}

fn positive(field: &'static str, value: f32) -> Result<(), ConfigError> {
    finite(field, value)?;
    if value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::NotPositive { field, value })
    }
}

fn non_negative(field: &'static str, value: f32) -> Result<(), ConfigError> {
    finite(field, value)?;
    if value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Negative { field, value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(resolution: u32) -> GridParams {
        GridParams {
            resolution,
            ..Default::default()
        }
    }

    #[test]
    fn json_save_then_load_keeps_params() {
        let path = std::env::temp_dir().join(format!("terrain-params-{}.json", std::process::id()));
        let saved = GridParams {
            resolution: 256,
            mode: SimulationMode::Static,
            water_surface: false,
            seed: 7,
            talus: 0.01,
            ..Default::default()
        };
        saved.save_json(&path).unwrap();
        let loaded = GridParams::load_json(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(loaded, saved);
    }

    #[test]
    fn defaults_are_valid() {
        let grid = Grid::new(GridParams::default()).unwrap();
        assert_eq!(grid.resolution(), 512);
        assert_eq!(grid.tile_size(), 32);
        assert!(grid.is_iterative());
    }

    #[test]
    fn resolution_must_be_tile_multiple() {
        assert_eq!(
            Grid::new(params(48)),
            Err(ConfigError::NotTileMultiple {
                resolution: 48,
                tile_size: 32
            })
        );
        assert!(Grid::new(params(64)).is_ok());
    }

    #[test]
    fn zero_sizes_are_rejected() {
        assert_eq!(Grid::new(params(0)), Err(ConfigError::ZeroResolution));
        let zero_tile = GridParams {
            tile_size: 0,
            ..Default::default()
        };
        assert_eq!(Grid::new(zero_tile), Err(ConfigError::ZeroTileSize));
    }

    #[test]
    fn single_cell_grid_has_no_quads() {
        let p = GridParams {
            resolution: 1,
            tile_size: 1,
            ..Default::default()
        };
        assert_eq!(Grid::new(p), Err(ConfigError::TooSmall { resolution: 1 }));
    }

    #[test]
    fn float_fields_are_checked() {
        let p = GridParams {
            max_height: 0.0,
            ..Default::default()
        };
        assert!(matches!(
            Grid::new(p),
            Err(ConfigError::NotPositive { field: "max_height", .. })
        ));

        let p = GridParams {
            noise_freq: f32::NAN,
            ..Default::default()
        };
        assert_eq!(
            Grid::new(p),
            Err(ConfigError::NonFinite { field: "noise_freq" })
        );

        let p = GridParams {
            evaporation: 1.5,
            ..Default::default()
        };
        assert!(matches!(
            Grid::new(p),
            Err(ConfigError::OutOfUnitRange { .. })
        ));
    }

    #[test]
    fn derived_sizes() {
        let grid = Grid::new(params(64)).unwrap();
        assert_eq!(grid.cell_count(), 64 * 64);
        assert_eq!(grid.quad_count(), 63 * 63);
        assert_eq!(grid.vertex_count(), 63 * 63 * 6);
        assert_eq!(grid.cell_buffer_size(), 64 * 64 * 20);
        assert_eq!(grid.vertex_buffer_size(), 63 * 63 * 6 * 48);
    }

    #[test]
    fn json_fills_missing_fields_with_defaults() {
        let p: GridParams = serde_json::from_str(r#"{ "resolution": 128, "mode": "Static" }"#)
            .unwrap();
        assert_eq!(p.resolution, 128);
        assert_eq!(p.mode, SimulationMode::Static);
        assert_eq!(p.tile_size, DEFAULT_TILE_SIZE);
        assert_eq!(p.max_height, 128.0);
    }
}
