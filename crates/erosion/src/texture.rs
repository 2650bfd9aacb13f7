//! Preview texture written by `ToTexture`.

use terrain::Grid;

pub const PREVIEW_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;
pub const PREVIEW_BYTES_PER_PIXEL: u32 = 4;

/// Device-writable 2-D image, one texel per cell.
///
/// The compute side binds it as a write-only storage texture. Everything
/// outside this crate gets a sampled view only.
pub struct TextureSurface {
    texture: wgpu::Texture,
    storage_view: wgpu::TextureView,
    sampled_view: wgpu::TextureView,
    size: u32,
}

impl TextureSurface {
    pub fn new(device: &wgpu::Device, grid: &Grid) -> Self {
        let size = grid.resolution();
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Heightfield Preview Texture"),
            size: wgpu::Extent3d {
                width: size,
                height: size,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: PREVIEW_FORMAT,
            usage: wgpu::TextureUsages::STORAGE_BINDING
                | wgpu::TextureUsages::TEXTURE_BINDING
                | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });
        let storage_view = texture.create_view(&wgpu::TextureViewDescriptor {
            label: Some("Heightfield Preview Storage View"),
            ..Default::default()
        });
        let sampled_view = texture.create_view(&wgpu::TextureViewDescriptor {
            label: Some("Heightfield Preview View"),
            ..Default::default()
        });
        Self {
            texture,
            storage_view,
            sampled_view,
            size,
        }
    }

    /// Read-only view for a presentation layer to sample or blit.
    pub fn view(&self) -> &wgpu::TextureView {
        &self.sampled_view
    }

    pub(crate) fn storage_view(&self) -> &wgpu::TextureView {
        &self.storage_view
    }

    pub(crate) fn texture(&self) -> &wgpu::Texture {
        &self.texture
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    pub(crate) fn release(self) {
        self.texture.destroy();
    }
}

/// Bytes per row of a texture copy, padded to `COPY_BYTES_PER_ROW_ALIGNMENT`.
pub fn padded_bytes_per_row(width: u32) -> u32 {
    let unpadded = width * PREVIEW_BYTES_PER_PIXEL;
    let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
    unpadded.div_ceil(align) * align
}
