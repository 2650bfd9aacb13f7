//! Device acquisition and device-loss tracking.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::{GpuError, SetupError};

/// Set when a readback channel dies or the device reports out-of-memory.
static GPU_DEVICE_LOST: AtomicBool = AtomicBool::new(false);

pub fn is_device_lost() -> bool {
    GPU_DEVICE_LOST.load(Ordering::SeqCst)
}

/// Cleared whenever a new [`GpuContext`] is acquired.
pub fn reset_device_lost() {
    GPU_DEVICE_LOST.store(false, Ordering::SeqCst);
}

/// Block on a `map_async` callback channel.
pub fn await_buffer_map(
    rx: std::sync::mpsc::Receiver<Result<(), wgpu::BufferAsyncError>>,
) -> Result<(), GpuError> {
    if is_device_lost() {
        return Err(GpuError::DeviceLost);
    }
    match rx.recv() {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => {
            log::error!("Staging map failed: {:?}", e);
            Err(GpuError::BufferMapFailed(e))
        }
        Err(_) => {
            log::error!("Staging map channel closed, treating device as lost");
            GPU_DEVICE_LOST.store(true, Ordering::SeqCst);
            Err(GpuError::ChannelDisconnected)
        }
    }
}

/// Limits needed to run `tile × tile` compute workgroups.
pub fn required_limits(tile_size: u32, adapter: &wgpu::Limits) -> Result<wgpu::Limits, SetupError> {
    let invocations = tile_size * tile_size;
    if adapter.max_compute_invocations_per_workgroup < invocations
        || adapter.max_compute_workgroup_size_x < tile_size
        || adapter.max_compute_workgroup_size_y < tile_size
    {
        return Err(SetupError::InsufficientLimits {
            needed_invocations: invocations,
            available: adapter.max_compute_invocations_per_workgroup,
        });
    }

    let defaults = wgpu::Limits::default();
    Ok(wgpu::Limits {
        max_compute_invocations_per_workgroup: invocations
            .max(defaults.max_compute_invocations_per_workgroup),
        max_compute_workgroup_size_x: tile_size.max(defaults.max_compute_workgroup_size_x),
        max_compute_workgroup_size_y: tile_size.max(defaults.max_compute_workgroup_size_y),
        ..defaults
    }
    .using_resolution(adapter.clone()))
}

/// Device and queue the terrain pipeline runs on.
///
/// Hosts that already own a device wrap it with [`GpuContext::from_parts`];
/// tools and tests use [`GpuContext::headless`].
pub struct GpuContext {
    pub device: Arc<wgpu::Device>,
    pub queue: Arc<wgpu::Queue>,
}

impl GpuContext {
    pub fn from_parts(device: Arc<wgpu::Device>, queue: Arc<wgpu::Queue>) -> Self {
        Self { device, queue }
    }

    /// Acquire an adapter without a surface.
    pub async fn headless(tile_size: u32) -> Result<Self, SetupError> {
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .ok_or(SetupError::AdapterUnavailable)?;

        log::info!("Using GPU: {:?}", adapter.get_info());

        let required_limits = required_limits(tile_size, &adapter.limits())?;

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("Terrain Device"),
                    required_features: wgpu::Features::empty(),
                    required_limits,
                    memory_hints: wgpu::MemoryHints::Performance,
                },
                None,
            )
            .await?;

        device.on_uncaptured_error(Box::new(|error| {
            log::error!("GPU uncaptured error: {:?}", error);
            if matches!(error, wgpu::Error::OutOfMemory { .. }) {
                GPU_DEVICE_LOST.store(true, Ordering::SeqCst);
            }
        }));

        reset_device_lost();

        Ok(Self {
            device: Arc::new(device),
            queue: Arc::new(queue),
        })
    }

    pub fn headless_blocking(tile_size: u32) -> Result<Self, SetupError> {
        pollster::block_on(Self::headless(tile_size))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limits_cover_tile() {
        let adapter = wgpu::Limits {
            max_compute_invocations_per_workgroup: 1024,
            max_compute_workgroup_size_x: 1024,
            max_compute_workgroup_size_y: 1024,
            ..wgpu::Limits::default()
        };
        let limits = required_limits(32, &adapter).unwrap();
        assert_eq!(limits.max_compute_invocations_per_workgroup, 1024);
        assert_eq!(limits.max_compute_workgroup_size_x, 256);

        let small = required_limits(8, &adapter).unwrap();
        assert_eq!(small.max_compute_invocations_per_workgroup, 256);
    }

    #[test]
    fn small_adapter_is_rejected() {
        let adapter = wgpu::Limits::downlevel_defaults();
        assert!(matches!(
            required_limits(32, &adapter),
            Err(SetupError::InsufficientLimits {
                needed_invocations: 1024,
                ..
            })
        ));
    }
}
