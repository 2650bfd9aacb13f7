//! Blocking readback of device buffers and the preview texture.
//!
//! Diagnostics only. Each call copies into a fresh staging buffer, submits,
//! and waits on the device, so it never sits on the per-frame path.

use std::sync::mpsc;

use bytemuck::Pod;

use crate::context::await_buffer_map;
use crate::error::GpuError;
use crate::texture::{padded_bytes_per_row, PREVIEW_BYTES_PER_PIXEL};

fn staging_buffer(device: &wgpu::Device, label: &str, size: u64) -> wgpu::Buffer {
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some(label),
        size,
        usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

/// Submit `encoder`, map `staging` and hand the mapped bytes to `read`.
fn map_and_read<R>(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    encoder: wgpu::CommandEncoder,
    staging: &wgpu::Buffer,
    read: impl FnOnce(&[u8]) -> R,
) -> Result<R, GpuError> {
    queue.submit(Some(encoder.finish()));

    let slice = staging.slice(..);
    let (tx, rx) = mpsc::channel();
    slice.map_async(wgpu::MapMode::Read, move |result| {
        let _ = tx.send(result);
    });
    device.poll(wgpu::Maintain::Wait);
    await_buffer_map(rx)?;

    let data = slice.get_mapped_range();
    let out = read(&data);
    drop(data);
    staging.unmap();
    staging.destroy();
    Ok(out)
}

/// Copy `src` into host memory as `T`s.
pub fn read_buffer<T: Pod>(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    src: &wgpu::Buffer,
    size: u64,
) -> Result<Vec<T>, GpuError> {
    let staging = staging_buffer(device, "Readback Staging", size);
    let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
        label: Some("Readback Copy Encoder"),
    });
    encoder.copy_buffer_to_buffer(src, 0, &staging, 0, size);

    map_and_read(device, queue, encoder, &staging, |bytes| {
        bytemuck::cast_slice::<u8, T>(bytes).to_vec()
    })
}

/// Tightly packed RGBA8 texels of a square `size × size` texture.
pub fn read_texture_rgba8(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    texture: &wgpu::Texture,
    size: u32,
) -> Result<Vec<u8>, GpuError> {
    let padded = padded_bytes_per_row(size);
    let unpadded = (size * PREVIEW_BYTES_PER_PIXEL) as usize;
    let staging = staging_buffer(device, "Texture Readback Staging", padded as u64 * size as u64);

    let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
        label: Some("Texture Readback Encoder"),
    });
    encoder.copy_texture_to_buffer(
        wgpu::ImageCopyTexture {
            texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        wgpu::ImageCopyBuffer {
            buffer: &staging,
            layout: wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(padded),
                rows_per_image: Some(size),
            },
        },
        wgpu::Extent3d {
            width: size,
            height: size,
            depth_or_array_layers: 1,
        },
    );

    map_and_read(device, queue, encoder, &staging, |bytes| {
        let mut out = Vec::with_capacity(unpadded * size as usize);
        for row in bytes.chunks(padded as usize) {
            out.extend_from_slice(&row[..unpadded]);
        }
        out
    })
}
