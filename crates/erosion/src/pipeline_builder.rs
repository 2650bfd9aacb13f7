//! Compute pipeline builder.
//!
//! Builds one pipeline per kernel from a shared shader module. Bindings come
//! from the kernel table and keep their `@binding` index from the device
//! program, so a kernel that binds only some resources still gets a layout
//! matching the WGSL declarations.
//!
//! ```ignore
//! let (pipeline, layout) = PipelineBuilder::new(device, &module, Kernel::MeshTerrain).build();
//! ```

use crate::kernel::Kernel;

pub struct PipelineBuilder<'a> {
    device: &'a wgpu::Device,
    module: &'a wgpu::ShaderModule,
    kernel: Kernel,
}

impl<'a> PipelineBuilder<'a> {
    /// Label, entry point and bindings all come from the kernel table.
    pub fn new(device: &'a wgpu::Device, module: &'a wgpu::ShaderModule, kernel: Kernel) -> Self {
        Self {
            device,
            module,
            kernel,
        }
    }

    /// Returns `(ComputePipeline, BindGroupLayout)`.
    pub fn build(self) -> (wgpu::ComputePipeline, wgpu::BindGroupLayout) {
        let name = self.kernel.entry_point();
        let entries: Vec<wgpu::BindGroupLayoutEntry> = self
            .kernel
            .bindings()
            .iter()
            .map(|b| b.layout_entry())
            .collect();

        let bind_group_layout = self
            .device
            .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some(&format!("{} Bind Group Layout", name)),
                entries: &entries,
            });

        let pipeline_layout = self
            .device
            .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some(&format!("{} Pipeline Layout", name)),
                bind_group_layouts: &[&bind_group_layout],
                push_constant_ranges: &[],
            });

        let pipeline = self
            .device
            .create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
                label: Some(&format!("{} Pipeline", name)),
                layout: Some(&pipeline_layout),
                module: self.module,
                entry_point: Some(name),
                compilation_options: Default::default(),
                cache: None,
            });

        (pipeline, bind_group_layout)
    }
}
