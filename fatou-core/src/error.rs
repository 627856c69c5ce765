//! Render error taxonomy shared by the scheduler and its backends.

use crate::Size;
use thiserror::Error;

pub type RenderResult<T> = Result<T, RenderError>;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum RenderError {
    /// A target was requested with a zero dimension.
    #[error("invalid buffer size {0}")]
    InvalidSize(Size),

    /// The backend lacks something the scheduler cannot work without.
    #[error("missing GPU capability: {0}")]
    MissingCapability(String),

    /// GPU object creation or program failure at a named stage.
    #[error("{stage}: {message}")]
    Resource { stage: String, message: String },

    /// Compositing was requested before any level finished.
    #[error("nothing rendered so far")]
    ReadBeforeReady,

    /// The fractal sampler failed while drawing.
    #[error("sampler failed: {0}")]
    Sampler(String),

    #[error("unknown fractal: {0}")]
    UnknownFractal(String),

    #[error("unknown preset '{preset}' for {fractal}")]
    UnknownPreset { fractal: String, preset: String },
}

impl RenderError {
    /// Build a [`RenderError::Resource`] value.
    pub fn resource(stage: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Resource {
            stage: stage.into(),
            message: message.into(),
        }
    }

    /// Configuration errors abort setup rather than a single frame.
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::InvalidSize(_) | Self::MissingCapability(_))
    }
}
