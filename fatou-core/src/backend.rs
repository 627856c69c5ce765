//! Seams between the progressive scheduler, the GPU and the fractal sampler.
//!
//! The scheduler never touches ambient GPU state. Every draw receives the
//! target it writes, the [`WriteBinding`] that restricts which pixels may
//! change, and (for sampling) the [`Sampler`] that produces the colors.

use crate::{Complex, Rect, RenderResult, Size};

/// Kind of render target requested from a backend.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TargetKind {
    /// Color only. Used by the downsample chain.
    Plain,
    /// Color plus a stencil mask splitting the target into alternating
    /// columns (`vertical`) or rows. Even columns/rows form the front set.
    Interlaced { vertical: bool },
}

/// Which pixels of a target a write may touch.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WriteMask {
    /// No stencil test.
    All,
    /// Only pixels whose stencil value is 1.
    Front,
    /// Only pixels whose stencil value is 0.
    Back,
}

impl WriteMask {
    /// Stencil value compared against, or `None` when the test is off.
    pub fn stencil_reference(self) -> Option<u32> {
        match self {
            WriteMask::All => None,
            WriteMask::Front => Some(1),
            WriteMask::Back => Some(0),
        }
    }
}

/// An open write to one target, produced by `start_write` and closed by
/// `end_write`. Backends honour its mask for every draw issued with it.
#[derive(Debug, PartialEq, Eq)]
pub struct WriteBinding {
    mask: WriteMask,
}

impl WriteBinding {
    /// Write every pixel.
    pub fn unmasked() -> Self {
        Self {
            mask: WriteMask::All,
        }
    }

    /// Write only the front (`true`) or back (`false`) interlace set.
    pub fn interlaced(front: bool) -> Self {
        Self {
            mask: if front {
                WriteMask::Front
            } else {
                WriteMask::Back
            },
        }
    }

    pub fn mask(&self) -> WriteMask {
        self.mask
    }
}

/// Everything a sampler needs to fill one region of one target.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SampleRequest {
    /// Normalized sub-window of the target to draw.
    pub region: Rect,
    /// Fractal-space center of the whole view.
    pub position: Complex,
    /// Per-axis half extent of the whole view in fractal space.
    pub zoom: Complex,
    /// Pixel dimensions of the target being written.
    pub pixel_size: Size,
}

/// Pluggable fractal sampler.
///
/// `render` must draw exactly into `region` of the target behind `pass`,
/// reading `position`/`zoom` as the logical viewport, and must not rebind
/// targets or programs outside what the pass allows.
pub trait Sampler<B: RenderBackend + ?Sized> {
    fn render(
        &mut self,
        pass: &mut B::Pass<'_>,
        region: Rect,
        position: Complex,
        zoom: Complex,
        pixel_size: Size,
    ) -> RenderResult<()>;

    /// Receive resolved parameter values (uniforms) for the current preset.
    fn set_parameters(&mut self, _params: &[(&'static str, f64)]) {}
}

/// GPU operations the progressive scheduler is built on.
pub trait RenderBackend {
    /// Owned handle to a texture plus its attachments.
    type Target;
    /// What a sampler draws with while a write is open.
    type Pass<'a>
    where
        Self: 'a;

    /// Whether interlaced targets (stencil attachments) can be created.
    fn supports_stencil(&self) -> bool;

    /// Create a target. Empty sizes are configuration errors.
    fn create_target(&mut self, size: Size, kind: TargetKind) -> RenderResult<Self::Target>;

    /// Release a target and all of its GPU objects.
    fn destroy_target(&mut self, target: Self::Target);

    /// Switch sampling from `target` between linear and nearest filtering.
    fn set_linear(&mut self, target: &Self::Target, linear: bool);

    /// Let `sampler` draw `request.region` of `target` under `binding`.
    fn sample<S: Sampler<Self> + ?Sized>(
        &mut self,
        target: &Self::Target,
        binding: &WriteBinding,
        request: &SampleRequest,
        sampler: &mut S,
    ) -> RenderResult<()>;

    /// Draw `src` over the whole of `dst` as a textured quad, reading `src`
    /// through `tex_coords`, restricted by `binding`.
    fn blit(
        &mut self,
        src: &Self::Target,
        dst: &Self::Target,
        binding: &WriteBinding,
        tex_coords: Rect,
    ) -> RenderResult<()>;

    /// Draw `src` onto the output surface.
    fn composite(&mut self, src: &Self::Target) -> RenderResult<()>;

    /// Submit pending work so later reads observe it.
    fn flush(&mut self);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stencil_references() {
        assert_eq!(WriteMask::All.stencil_reference(), None);
        assert_eq!(WriteMask::Front.stencil_reference(), Some(1));
        assert_eq!(WriteMask::Back.stencil_reference(), Some(0));
    }

    #[test]
    fn bindings_carry_their_mask() {
        assert_eq!(WriteBinding::unmasked().mask(), WriteMask::All);
        assert_eq!(WriteBinding::interlaced(true).mask(), WriteMask::Front);
        assert_eq!(WriteBinding::interlaced(false).mask(), WriteMask::Back);
    }
}
