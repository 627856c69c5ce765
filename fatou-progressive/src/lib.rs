//! Progressive multi-resolution rendering on top of a [`RenderBackend`].
//!
//! [`RenderBackend`]: fatou_core::RenderBackend

pub mod downchain;
pub mod effort;
pub mod engine;
pub mod pyramid;
pub mod render_loop;
pub mod scheduler;
pub mod stats;
#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use downchain::Downchain;
pub use effort::{AdaptiveEffort, EffortEstimator, FixedEffort};
pub use engine::Engine;
pub use pyramid::{InterlacedLevel, Pyramid};
pub use render_loop::{FrameHandler, LoopState, PushHandle, RenderLoop};
pub use scheduler::{Phase, ProgressiveScheduler};
pub use stats::FrameStats;
