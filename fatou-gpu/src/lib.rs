//! wgpu backend for the progressive scheduler: stencil-interlaced targets,
//! blits, compositing and a diagnostic sampler.

mod backend;
mod buffers;
mod device;
mod error;
mod pipeline;
mod readback;
mod target;
mod test_pattern;

pub use backend::{GpuBackend, GpuPass};
pub use buffers::{BlitUniforms, PatternUniforms};
pub use device::{GpuAvailability, GpuContext};
pub use error::GpuError;
pub use pipeline::{quad_pipeline, PassVariant, STENCIL_FORMAT, TARGET_FORMAT};
pub use target::GpuTarget;
pub use test_pattern::{Pattern, TestPatternSampler};
