//! Error types.
//!
//! Setup is one-shot: every [`SetupError`] aborts initialization and there is
//! no degraded mode. [`GpuError`] covers the only runtime failures, which come
//! from blocking readback.

use std::fmt;

use terrain::ConfigError;

use crate::plan::PlanError;

/// Fatal initialization error.
#[derive(Debug)]
pub enum SetupError {
    Config(ConfigError),
    /// The recorded frame plan failed dependency validation.
    Plan(PlanError),
    /// The device program failed to parse.
    ShaderParse { label: String, message: String },
    /// A required entry point is absent from the device program.
    MissingEntryPoint { name: &'static str },
    /// The entry point exists but is not a compute stage.
    NotCompute { name: &'static str },
    /// The compiled workgroup size disagrees with the configured tile.
    WorkgroupMismatch {
        name: &'static str,
        expected: [u32; 3],
        found: [u32; 3],
    },
    /// A resource the kernel binds by name is not declared in the program.
    MissingBinding {
        kernel: &'static str,
        binding: &'static str,
    },
    /// A buffer would exceed the device's storage binding limit.
    BufferTooLarge {
        label: &'static str,
        size: u64,
        limit: u64,
    },
    AdapterUnavailable,
    DeviceRequest(wgpu::RequestDeviceError),
    /// The adapter cannot run a `tile × tile` workgroup.
    InsufficientLimits {
        needed_invocations: u32,
        available: u32,
    },
}

impl fmt::Display for SetupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SetupError::Config(e) => write!(f, "invalid grid configuration: {}", e),
            SetupError::Plan(e) => write!(f, "invalid frame plan: {}", e),
            SetupError::ShaderParse { label, message } => {
                write!(f, "failed to parse device program {}:\n{}", label, message)
            }
            SetupError::MissingEntryPoint { name } => {
                write!(f, "device program has no entry point `{}`", name)
            }
            SetupError::NotCompute { name } => {
                write!(f, "entry point `{}` is not a compute kernel", name)
            }
            SetupError::WorkgroupMismatch {
                name,
                expected,
                found,
            } => write!(
                f,
                "entry point `{}` has workgroup size {:?}, expected {:?}",
                name, found, expected
            ),
            SetupError::MissingBinding { kernel, binding } => write!(
                f,
                "kernel `{}` binds `{}` but the program does not declare it",
                kernel, binding
            ),
            SetupError::BufferTooLarge { label, size, limit } => write!(
                f,
                "{} needs {} bytes, device storage binding limit is {}",
                label, size, limit
            ),
            SetupError::AdapterUnavailable => write!(f, "no compatible GPU adapter"),
            SetupError::DeviceRequest(e) => write!(f, "device request failed: {}", e),
            SetupError::InsufficientLimits {
                needed_invocations,
                available,
            } => write!(
                f,
                "workgroup needs {} invocations, adapter allows {}",
                needed_invocations, available
            ),
        }
    }
}

impl std::error::Error for SetupError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SetupError::Config(e) => Some(e),
            SetupError::Plan(e) => Some(e),
            SetupError::DeviceRequest(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ConfigError> for SetupError {
    fn from(e: ConfigError) -> Self {
        SetupError::Config(e)
    }
}

impl From<PlanError> for SetupError {
    fn from(e: PlanError) -> Self {
        SetupError::Plan(e)
    }
}

impl From<wgpu::RequestDeviceError> for SetupError {
    fn from(e: wgpu::RequestDeviceError) -> Self {
        SetupError::DeviceRequest(e)
    }
}

/// Readback failure.
#[derive(Debug)]
pub enum GpuError {
    DeviceLost,
    BufferMapFailed(wgpu::BufferAsyncError),
    ChannelDisconnected,
}

impl fmt::Display for GpuError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GpuError::DeviceLost => write!(f, "device lost"),
            GpuError::BufferMapFailed(e) => write!(f, "staging buffer map failed: {:?}", e),
            GpuError::ChannelDisconnected => write!(f, "map callback channel disconnected"),
        }
    }
}

impl std::error::Error for GpuError {}
