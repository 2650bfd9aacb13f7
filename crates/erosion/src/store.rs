//! Heightfield storage.
//!
//! Static grids own one buffer that every kernel reads and updates in place.
//! Iterative grids add a ping-pong pair: `Simulate` reads the current slot and
//! writes the next, the roles swap, and the new current slot is copied into
//! the published buffer. Every other consumer binds only the published
//! buffer, so its handle never changes after setup.

use terrain::{Grid, PingPong};

use crate::error::SetupError;

const CELL_USAGE: wgpu::BufferUsages = wgpu::BufferUsages::STORAGE
    .union(wgpu::BufferUsages::COPY_SRC)
    .union(wgpu::BufferUsages::COPY_DST);

pub struct HeightfieldStore {
    published: wgpu::Buffer,
    state: Option<PingPong<wgpu::Buffer>>,
    byte_size: u64,
    cell_count: u32,
}

fn cell_buffer(device: &wgpu::Device, label: &str, size: u64) -> wgpu::Buffer {
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some(label),
        size,
        usage: CELL_USAGE,
        mapped_at_creation: false,
    })
}

impl HeightfieldStore {
    /// Checks the buffer size against the device before creating anything.
    pub fn check_size(grid: &Grid, limits: &wgpu::Limits) -> Result<u64, SetupError> {
        let size = grid.cell_buffer_size();
        let limit = u64::from(limits.max_storage_buffer_binding_size).min(limits.max_buffer_size);
        if size > limit {
            return Err(SetupError::BufferTooLarge {
                label: "heightfield",
                size,
                limit,
            });
        }
        Ok(size)
    }

    pub fn allocate(device: &wgpu::Device, grid: &Grid) -> Result<Self, SetupError> {
        let byte_size = Self::check_size(grid, &device.limits())?;

        let published = cell_buffer(device, "Heightfield Published", byte_size);
        let state = grid.is_iterative().then(|| {
            PingPong::new(
                cell_buffer(device, "Heightfield Slot 0", byte_size),
                cell_buffer(device, "Heightfield Slot 1", byte_size),
            )
        });

        log::info!(
            "Heightfield store: {} cells, {} bytes, {}",
            grid.cell_count(),
            byte_size,
            if state.is_some() { "ping-pong" } else { "single buffer" }
        );

        Ok(Self {
            published,
            state,
            byte_size,
            cell_count: grid.cell_count(),
        })
    }

    /// The stable buffer bound as `_data` by every non-simulate kernel.
    pub fn published(&self) -> &wgpu::Buffer {
        &self.published
    }

    pub fn is_double(&self) -> bool {
        self.state.is_some()
    }

    pub fn slots(&self) -> Option<&[wgpu::Buffer; 2]> {
        self.state.as_ref().map(|s| s.slots())
    }

    /// Index of the slot `Simulate` reads this tick.
    pub fn current_index(&self) -> usize {
        self.state.as_ref().map_or(0, |s| s.current_index())
    }

    /// Completed simulation steps held by the current slot.
    pub fn generation(&self) -> u64 {
        self.state.as_ref().map_or(0, |s| s.generation())
    }

    pub fn byte_size(&self) -> u64 {
        self.byte_size
    }

    pub fn cell_count(&self) -> u32 {
        self.cell_count
    }

    /// Seed the current slot from the published buffer after initial generation.
    pub fn encode_seed(&mut self, encoder: &mut wgpu::CommandEncoder) {
        if let Some(state) = &mut self.state {
            state.reset_generations();
            encoder.copy_buffer_to_buffer(&self.published, 0, state.current(), 0, self.byte_size);
        }
    }

    /// Mark the slot just written by `Simulate` as current. O(1), no copy.
    pub fn swap(&mut self) {
        if let Some(state) = &mut self.state {
            state.commit();
        }
    }

    /// Copy the current slot into the published buffer.
    pub fn encode_publish(&self, encoder: &mut wgpu::CommandEncoder) {
        if let Some(state) = &self.state {
            encoder.copy_buffer_to_buffer(state.current(), 0, &self.published, 0, self.byte_size);
        }
    }

    /// Free all device storage. Consumes the store so it runs at most once.
    pub fn release(self) {
        self.published.destroy();
        if let Some(state) = self.state {
            for buffer in state.into_slots() {
                buffer.destroy();
            }
        }
    }
}
