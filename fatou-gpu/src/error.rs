//! GPU error types.

use fatou_core::RenderError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GpuError {
    #[error("No GPU adapter found")]
    NoAdapter,

    #[error("Failed to create device: {0}")]
    DeviceCreation(#[from] wgpu::RequestDeviceError),

    #[error("Buffer mapping failed: {0}")]
    BufferMap(#[from] wgpu::BufferAsyncError),

    #[error("{stage}: {message}")]
    Validation { stage: String, message: String },

    #[error("GPU unavailable: {0}")]
    Unavailable(String),
}

impl From<GpuError> for RenderError {
    fn from(err: GpuError) -> Self {
        match err {
            GpuError::Validation { stage, message } => RenderError::Resource { stage, message },
            GpuError::NoAdapter => RenderError::resource("adapter", err.to_string()),
            GpuError::DeviceCreation(_) => RenderError::resource("device", err.to_string()),
            GpuError::BufferMap(_) => RenderError::resource("readback", err.to_string()),
            GpuError::Unavailable(msg) => RenderError::resource("gpu", msg),
        }
    }
}

/// Run `f` inside validation and out-of-memory error scopes, turning a
/// captured error into [`GpuError::Validation`] labelled with `stage`.
pub(crate) fn scoped<T>(
    device: &wgpu::Device,
    stage: &str,
    f: impl FnOnce() -> T,
) -> Result<T, GpuError> {
    device.push_error_scope(wgpu::ErrorFilter::OutOfMemory);
    device.push_error_scope(wgpu::ErrorFilter::Validation);
    let value = f();
    let validation = pollster::block_on(device.pop_error_scope());
    let oom = pollster::block_on(device.pop_error_scope());
    match validation.or(oom) {
        Some(err) => Err(GpuError::Validation {
            stage: stage.to_string(),
            message: err.to_string(),
        }),
        None => Ok(value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_maps_to_resource_error() {
        let err: RenderError = GpuError::Validation {
            stage: "InterlacedTarget::new".into(),
            message: "texture too large".into(),
        }
        .into();
        assert_eq!(
            err,
            RenderError::resource("InterlacedTarget::new", "texture too large")
        );
    }

    #[test]
    fn no_adapter_maps_to_resource_error() {
        let err: RenderError = GpuError::NoAdapter.into();
        assert_eq!(err.to_string(), "adapter: No GPU adapter found");
    }
}
