//! Uniform structs uploaded to the device programs.
//!
//! `#[repr(C)]` mirrors of the WGSL structs; the tests below check size and
//! member offsets against the shader source.

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3, Vec4};
use terrain::Grid;

/// Grid uniforms (48 bytes). Matches `GridUniforms` in `erosion.wgsl`.
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct GridUniforms {
    pub height_res: u32,
    pub noise_freq: f32,
    pub max_height: f32,
    pub cell_size: f32,
    pub seed: u32,
    /// Number of completed simulation ticks.
    pub tick: u32,
    pub dt: f32,
    pub erosion_rate: f32,
    pub talus: f32,
    pub rain_rate: f32,
    pub evaporation: f32,
    pub _pad: u32,
}

impl GridUniforms {
    pub fn new(grid: &Grid) -> Self {
        let p = grid.params();
        Self {
            height_res: p.resolution,
            noise_freq: p.noise_freq,
            max_height: p.max_height,
            cell_size: p.cell_size,
            seed: p.seed,
            tick: 0,
            dt: 0.0,
            erosion_rate: p.erosion_rate,
            talus: p.talus,
            rain_rate: p.rain_rate,
            evaporation: p.evaporation,
            _pad: 0,
        }
    }

    pub fn with_step(self, tick: u32, dt: f32) -> Self {
        Self { tick, dt, ..self }
    }
}

/// Draw uniforms (144 bytes). Matches `DrawUniforms` in `draw.wgsl`.
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct DrawUniforms {
    pub view_proj: [[f32; 4]; 4],
    pub light_dir: [f32; 4],
    pub low_color: [f32; 4],
    pub high_color: [f32; 4],
    pub water_color: [f32; 4],
    pub max_height: f32,
    pub _pad0: f32,
    pub _pad1: f32,
    pub _pad2: f32,
}

impl DrawUniforms {
    pub fn new(view_proj: Mat4, max_height: f32) -> Self {
        Self {
            view_proj: view_proj.to_cols_array_2d(),
            light_dir: Vec3::new(-0.4, -1.0, -0.3).normalize().extend(0.0).to_array(),
            low_color: Vec4::new(0.32, 0.27, 0.2, 1.0).to_array(),
            high_color: Vec4::new(0.85, 0.85, 0.8, 1.0).to_array(),
            water_color: Vec4::new(0.1, 0.3, 0.8, 0.6).to_array(),
            max_height,
            _pad0: 0.0,
            _pad1: 0.0,
            _pad2: 0.0,
        }
    }

    /// Looks at the grid centre from a raised corner.
    pub fn overview(grid: &Grid, aspect: f32) -> Self {
        let p = grid.params();
        let extent = (p.resolution - 1) as f32 * p.cell_size;
        let centre = Vec3::new(extent * 0.5, p.max_height * 0.25, extent * 0.5);
        let eye = centre + Vec3::new(-extent * 0.6, extent * 0.5, -extent * 0.6);
        let view = Mat4::look_at_rh(eye, centre, Vec3::Y);
        let proj = Mat4::perspective_rh(45f32.to_radians(), aspect, 0.1, extent * 4.0);
        Self::new(proj * view, p.max_height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::mem::{offset_of, size_of};
    use terrain::{Cell, GridParams, Vertex};

    struct WgslLayout {
        size: u32,
        offsets: HashMap<String, u32>,
    }

    fn wgsl_struct_layout(source: &str, struct_name: &str) -> WgslLayout {
        let module = naga::front::wgsl::parse_str(source)
            .unwrap_or_else(|e| panic!("Failed to parse: {}", e.emit_to_string(source)));

        let mut layouter = naga::proc::Layouter::default();
        let gctx = naga::proc::GlobalCtx {
            types: &module.types,
            constants: &module.constants,
            overrides: &module.overrides,
            global_expressions: &module.global_expressions,
        };
        layouter
            .update(gctx)
            .unwrap_or_else(|e| panic!("Failed to compute layout: {e}"));

        let (handle, ty) = module
            .types
            .iter()
            .find(|(_, ty)| ty.name.as_deref() == Some(struct_name))
            .unwrap_or_else(|| panic!("Struct {struct_name} not found"));

        let members = match &ty.inner {
            naga::TypeInner::Struct { members, .. } => members,
            _ => panic!("Type {struct_name} is not a struct"),
        };

        let offsets = members
            .iter()
            .filter_map(|m| m.name.clone().map(|n| (n, m.offset)))
            .collect();

        WgslLayout {
            size: layouter[handle].size,
            offsets,
        }
    }

    #[test]
    fn grid_uniforms_layout_matches_wgsl() {
        let layout = wgsl_struct_layout(crate::program::EROSION_WGSL, "GridUniforms");
        assert_eq!(layout.size as usize, size_of::<GridUniforms>());
        assert_eq!(layout.offsets["height_res"], offset_of!(GridUniforms, height_res) as u32);
        assert_eq!(layout.offsets["tick"], offset_of!(GridUniforms, tick) as u32);
        assert_eq!(layout.offsets["evaporation"], offset_of!(GridUniforms, evaporation) as u32);
    }

    #[test]
    fn cell_and_vertex_layouts_match_wgsl() {
        let cell = wgsl_struct_layout(crate::program::EROSION_WGSL, "Cell");
        assert_eq!(cell.size as usize, size_of::<Cell>());
        assert_eq!(cell.offsets["water"], offset_of!(Cell, water) as u32);

        let vertex = wgsl_struct_layout(crate::program::EROSION_WGSL, "Vertex");
        assert_eq!(vertex.size as usize, size_of::<Vertex>());
        assert_eq!(vertex.offsets["nx"], offset_of!(Vertex, normal) as u32);
        assert_eq!(vertex.offsets["tx"], offset_of!(Vertex, tangent) as u32);
        assert_eq!(vertex.offsets["u"], offset_of!(Vertex, uv) as u32);
    }

    #[test]
    fn draw_uniforms_layout_matches_wgsl() {
        let layout = wgsl_struct_layout(crate::program::DRAW_WGSL, "DrawUniforms");
        assert_eq!(layout.size as usize, size_of::<DrawUniforms>());
        assert_eq!(layout.offsets["light_dir"], offset_of!(DrawUniforms, light_dir) as u32);
        assert_eq!(layout.offsets["max_height"], offset_of!(DrawUniforms, max_height) as u32);
    }

    #[test]
    fn uniforms_copy_grid_params() {
        let grid = Grid::new(GridParams {
            resolution: 64,
            noise_freq: 0.05,
            max_height: 40.0,
            ..Default::default()
        })
        .unwrap();
        let u = GridUniforms::new(&grid).with_step(3, 0.016);
        assert_eq!(u.height_res, 64);
        assert_eq!(u.noise_freq, 0.05);
        assert_eq!(u.max_height, 40.0);
        assert_eq!(u.tick, 3);
    }
}
