//! Headless backend that records every call instead of drawing.
//!
//! Used by the scheduler tests and by downstream crates that want to check
//! scheduling decisions without a GPU.

use std::collections::HashMap;

use fatou_core::{
    Complex, IdAllocator, PixelRect, Rect, RenderBackend, RenderError, RenderResult,
    SampleRequest, Sampler, Size, TargetKind, WriteBinding, WriteMask,
};

/// Handle to a recorded target.
#[derive(Debug, PartialEq, Eq)]
pub struct RecordingTarget {
    pub id: u64,
    pub size: Size,
}

/// One recorded backend call.
#[derive(Clone, Debug, PartialEq)]
pub enum Op {
    Create {
        id: u64,
        size: Size,
        kind: TargetKind,
    },
    Destroy {
        id: u64,
    },
    SetLinear {
        id: u64,
        linear: bool,
    },
    Sample {
        id: u64,
        mask: WriteMask,
        region: Rect,
        pixels: PixelRect,
    },
    Blit {
        src: u64,
        dst: u64,
        mask: WriteMask,
        tex_coords: Rect,
    },
    Composite {
        id: u64,
    },
    Flush,
}

/// What a sampler gets to draw with.
pub struct RecordingPass<'a> {
    /// Pixels the draw is scissored to.
    pub scissor: PixelRect,
    draws: &'a mut u32,
}

impl RecordingPass<'_> {
    pub fn draw(&mut self) {
        *self.draws += 1;
    }
}

#[derive(Default)]
pub struct RecordingBackend {
    ids: IdAllocator,
    ops: Vec<Op>,
    live: HashMap<u64, Size>,
    linear: HashMap<u64, bool>,
    draws: u32,
    no_stencil: bool,
    create_budget: Option<usize>,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Report interlaced targets as unsupported.
    pub fn without_stencil(mut self) -> Self {
        self.no_stencil = true;
        self
    }

    /// Let target creation fail once `n` targets were created.
    pub fn fail_create_after(mut self, n: usize) -> Self {
        self.create_budget = Some(n);
        self
    }

    pub fn ops(&self) -> &[Op] {
        &self.ops
    }

    /// Take the recorded calls, leaving the log empty.
    pub fn take_ops(&mut self) -> Vec<Op> {
        std::mem::take(&mut self.ops)
    }

    /// Number of created and not yet destroyed targets.
    pub fn live_targets(&self) -> usize {
        self.live.len()
    }

    pub fn is_linear(&self, id: u64) -> bool {
        self.linear.get(&id).copied().unwrap_or(false)
    }

    /// Draw calls issued by samplers so far.
    pub fn draws(&self) -> u32 {
        self.draws
    }

    fn check_live(&self, id: u64, stage: &str) -> RenderResult<()> {
        if self.live.contains_key(&id) {
            Ok(())
        } else {
            Err(RenderError::resource(stage, format!("target #{id} was destroyed")))
        }
    }
}

impl RenderBackend for RecordingBackend {
    type Target = RecordingTarget;
    type Pass<'a> = RecordingPass<'a>;

    fn supports_stencil(&self) -> bool {
        !self.no_stencil
    }

    fn create_target(&mut self, size: Size, kind: TargetKind) -> RenderResult<RecordingTarget> {
        if size.is_empty() {
            return Err(RenderError::InvalidSize(size));
        }
        if let Some(budget) = self.create_budget.as_mut() {
            if *budget == 0 {
                return Err(RenderError::resource("create_target", "out of memory"));
            }
            *budget -= 1;
        }
        let id = self.ids.next_id();
        self.live.insert(id, size);
        self.ops.push(Op::Create { id, size, kind });
        Ok(RecordingTarget { id, size })
    }

    fn destroy_target(&mut self, target: RecordingTarget) {
        self.live.remove(&target.id);
        self.linear.remove(&target.id);
        self.ops.push(Op::Destroy { id: target.id });
    }

    fn set_linear(&mut self, target: &RecordingTarget, linear: bool) {
        self.linear.insert(target.id, linear);
        self.ops.push(Op::SetLinear {
            id: target.id,
            linear,
        });
    }

    fn sample<S: Sampler<Self> + ?Sized>(
        &mut self,
        target: &RecordingTarget,
        binding: &WriteBinding,
        request: &SampleRequest,
        sampler: &mut S,
    ) -> RenderResult<()> {
        self.check_live(target.id, "sample")?;
        let pixels = request.region.to_pixels(target.size);
        self.ops.push(Op::Sample {
            id: target.id,
            mask: binding.mask(),
            region: request.region,
            pixels,
        });
        let mut pass = RecordingPass {
            scissor: pixels,
            draws: &mut self.draws,
        };
        sampler.render(
            &mut pass,
            request.region,
            request.position,
            request.zoom,
            request.pixel_size,
        )
    }

    fn blit(
        &mut self,
        src: &RecordingTarget,
        dst: &RecordingTarget,
        binding: &WriteBinding,
        tex_coords: Rect,
    ) -> RenderResult<()> {
        self.check_live(src.id, "blit")?;
        self.check_live(dst.id, "blit")?;
        self.ops.push(Op::Blit {
            src: src.id,
            dst: dst.id,
            mask: binding.mask(),
            tex_coords,
        });
        Ok(())
    }

    fn composite(&mut self, src: &RecordingTarget) -> RenderResult<()> {
        self.check_live(src.id, "composite")?;
        self.ops.push(Op::Composite { id: src.id });
        Ok(())
    }

    fn flush(&mut self) {
        self.ops.push(Op::Flush);
    }
}

/// A sampler call as seen by [`CountingSampler`].
#[derive(Clone, Debug, PartialEq)]
pub struct SampleCall {
    pub region: Rect,
    pub position: Complex,
    pub zoom: Complex,
    pub pixel_size: Size,
}

/// Sampler that draws once per call and remembers its arguments.
#[derive(Default)]
pub struct CountingSampler {
    pub calls: Vec<SampleCall>,
    pub parameters: Vec<(&'static str, f64)>,
    /// Fail every call with this message when set.
    pub fail_with: Option<String>,
}

impl CountingSampler {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Sampler<RecordingBackend> for CountingSampler {
    fn render(
        &mut self,
        pass: &mut RecordingPass<'_>,
        region: Rect,
        position: Complex,
        zoom: Complex,
        pixel_size: Size,
    ) -> RenderResult<()> {
        if let Some(msg) = &self.fail_with {
            return Err(RenderError::Sampler(msg.clone()));
        }
        pass.draw();
        self.calls.push(SampleCall {
            region,
            position,
            zoom,
            pixel_size,
        });
        Ok(())
    }

    fn set_parameters(&mut self, params: &[(&'static str, f64)]) {
        self.parameters = params.to_vec();
    }
}
