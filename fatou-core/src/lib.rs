pub mod backend;
pub mod config;
pub mod error;
pub mod format;
pub mod geometry;
pub mod ids;
pub mod pixel_rect;
pub mod settings;
pub mod viewport;

pub use backend::{RenderBackend, SampleRequest, Sampler, TargetKind, WriteBinding, WriteMask};
pub use config::{get_config, FractalConfig, FractalKind, ParameterSpec, Preset, FRACTAL_CONFIGS};
pub use error::{RenderError, RenderResult};
pub use format::rationalize;
pub use geometry::{Rect, Size};
pub use ids::IdAllocator;
pub use pixel_rect::PixelRect;
pub use settings::{EffortPolicy, EffortSettings, RenderSettings};
pub use viewport::{Complex, View};
