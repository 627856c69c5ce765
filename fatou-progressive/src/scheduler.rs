//! Progressive multi-resolution scheduler.
//!
//! A view is rendered into the coarsest pyramid level the frame budget can
//! afford, then refined level by level: every finished level is copied into
//! the back set of the next finer one, whose front set is then sampled in
//! horizontal bands across as many frames as needed. Each frame stays within
//! the sample budget, and the finished level only ever gets finer until the
//! view changes.

use fatou_core::{
    Rect, RenderBackend, RenderError, RenderResult, RenderSettings, SampleRequest, Sampler, Size,
    View, WriteBinding,
};

use crate::downchain::Downchain;
use crate::effort::{self, EffortEstimator};
use crate::pyramid::Pyramid;
use crate::render_loop::PushHandle;
use crate::stats::FrameStats;

/// Refinement steps after which a frame is considered suspicious.
const STEP_WARN_THRESHOLD: u32 = 10;

/// Where the scheduler is in its change cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    /// Nothing rendered since the last change.
    CoarsePending,
    /// Some level is finished, finer ones are not.
    Refining,
    /// The finest level is finished.
    Finished,
}

pub struct ProgressiveScheduler<B: RenderBackend> {
    settings: RenderSettings,
    output_size: Size,
    upchain: Pyramid<B::Target>,
    downchain: Downchain<B::Target>,
    /// Index of the largest finished level, `upchain.len()` when none is.
    current_level: usize,
    /// Rows of level `current_level - 1` refined so far.
    rows_done: u32,
    frames_since_reset: u32,
    first_frame: bool,
    effort: Box<dyn EffortEstimator>,
    push: Option<PushHandle>,
    /// Level switched to linear filtering by `start_read`.
    reading: Option<usize>,
    stats: FrameStats,
}

impl<B: RenderBackend> ProgressiveScheduler<B> {
    /// Build the pyramid and downsample chain for `output_size`.
    pub fn new(backend: &mut B, output_size: Size, settings: RenderSettings) -> RenderResult<Self> {
        let effort = effort::from_settings(&settings.effort);
        let mut scheduler = Self {
            settings,
            output_size,
            upchain: Pyramid::default(),
            downchain: Downchain::default(),
            current_level: 0,
            rows_done: 0,
            frames_since_reset: 0,
            first_frame: true,
            effort,
            push: None,
            reading: None,
            stats: FrameStats::default(),
        };
        scheduler.set_size(backend, output_size)?;
        Ok(scheduler)
    }

    /// Let the scheduler request frames from a render loop.
    pub fn set_push_handle(&mut self, push: PushHandle) {
        self.push = Some(push);
    }

    pub fn set_effort(&mut self, effort: Box<dyn EffortEstimator>) {
        self.effort = effort;
    }

    /// Recreate all targets for a new output size. Rendering restarts.
    pub fn set_size(&mut self, backend: &mut B, output_size: Size) -> RenderResult<()> {
        self.rebuild(backend, output_size, self.settings.supersamples)
    }

    /// Switch the supersample factor. Rebuilds everything.
    pub fn set_supersamples(&mut self, backend: &mut B, supersamples: u32) -> RenderResult<()> {
        self.rebuild(backend, self.output_size, supersamples)
    }

    /// Configuration is checked before any target is released, so a
    /// rejected size or factor leaves the current pyramid in place.
    fn rebuild(&mut self, backend: &mut B, output_size: Size, supersamples: u32) -> RenderResult<()> {
        if output_size.is_empty() {
            return Err(RenderError::InvalidSize(output_size));
        }
        let full = output_size.scaled(supersamples);
        if full.is_empty() {
            return Err(RenderError::InvalidSize(full));
        }
        if !backend.supports_stencil() {
            return Err(RenderError::MissingCapability(
                "stencil attachment for interlaced targets".into(),
            ));
        }

        self.destroy(backend);
        self.upchain = Pyramid::build(backend, full, self.settings.min_level_area)?;
        if let Err(e) = self.downchain.set_size(backend, full, output_size) {
            self.upchain.destroy(backend);
            return Err(e);
        }
        self.output_size = output_size;
        self.settings.supersamples = supersamples;
        log::info!(
            "progressive: output {} x{} supersampling, {} levels, {} downsample steps",
            output_size,
            supersamples,
            self.upchain.len(),
            self.downchain.len()
        );
        self.change();
        Ok(())
    }

    /// Discard everything rendered and start over from the coarsest level.
    pub fn change(&mut self) {
        self.current_level = self.upchain.len();
        self.rows_done = 0;
        self.frames_since_reset = 0;
        self.request_frame();
    }

    /// Spend one frame's budget. Returns whether the visible image changed.
    pub fn render<S: Sampler<B> + ?Sized>(
        &mut self,
        backend: &mut B,
        sampler: &mut S,
        view: &View,
        delta_seconds: f64,
        continuous: bool,
    ) -> RenderResult<bool> {
        let len = self.upchain.len();
        if len == 0 {
            return Err(RenderError::resource(
                "ProgressiveScheduler::render",
                "no render targets",
            ));
        }

        if !self.first_frame {
            self.effort.post_frame(delta_seconds * 1000.0, continuous);
        }
        self.first_frame = false;
        self.frames_since_reset = self.frames_since_reset.saturating_add(1);

        let budget = self.effort.sps();
        let mut left = budget;
        let mut consumed = 0.0;
        let mut changed = false;
        let position = view.position;
        let zoom = view.zoom_factor(self.output_size.aspect());

        if self.current_level == len {
            // coarsest level first, then finer while the next one fits
            let mut i = len - 1;
            while i > 0 && self.upchain.level(i - 1).area() as f64 <= left {
                i -= 1;
            }
            let level = self.upchain.level(i);
            let request = SampleRequest {
                region: Rect::FULL,
                position,
                zoom,
                pixel_size: level.size(),
            };
            backend.sample(level.target(), &WriteBinding::unmasked(), &request, sampler)?;
            backend.flush();

            let area = level.area() as f64;
            left -= area;
            consumed = area;
            self.current_level = i + 1;
            self.copy_back(backend)?;
            changed = true;
        }

        let mut steps = 0;
        while steps < self.settings.max_refine_steps {
            if self.current_level == 0 {
                break;
            }
            if left < consumed * self.settings.min_step_ratio {
                break;
            }
            steps += 1;

            let level = self.upchain.level(self.current_level - 1);
            let size = level.size();
            let remaining = size.h - self.rows_done;
            let affordable = if left > 0.0 {
                ((left / size.w as f64).floor() as u64).saturating_mul(2)
            } else {
                0
            };
            let mut rows = affordable.min(remaining as u64) as u32;
            if rows == 0 {
                if consumed == 0.0 {
                    rows = remaining.min(2);
                } else {
                    break;
                }
            }

            let top = self.rows_done;
            let bottom = top + rows;
            let request = SampleRequest {
                region: Rect::rows(top as f64 / size.h as f64, bottom as f64 / size.h as f64),
                position,
                zoom,
                pixel_size: size,
            };
            let binding = level.start_write(true);
            let result = backend.sample(level.target(), &binding, &request, sampler);
            level.end_write(binding);
            result?;

            let cost = rows as f64 * size.w as f64 / 2.0;
            left -= cost;
            consumed += cost;
            self.rows_done = bottom;
            backend.flush();

            if self.rows_done >= size.h {
                self.copy_back(backend)?;
                changed = true;
            }
            if self.live_changes() {
                changed = true;
                self.request_frame();
            }
        }
        if steps > STEP_WARN_THRESHOLD {
            log::warn!(
                "progressive: {steps} refinement steps in one frame (budget {budget:.0}, consumed {consumed:.0})"
            );
        }

        if self.current_level != 0 {
            self.request_frame();
        }
        self.effort.post_render(consumed, self.current_level);

        self.stats = FrameStats {
            consumed,
            budget,
            level: self.current_level,
            level_count: len,
            progress: self.progress(),
            spp: self.spp(),
            live: self.live_changes(),
        };
        Ok(changed)
    }

    /// Mark the level in flight as finished and seed the next finer one:
    /// its back set gets the finished level, and during live preview its
    /// front set gets a linear-filtered guess shifted by half a texel.
    fn copy_back(&mut self, backend: &mut B) -> RenderResult<()> {
        self.current_level -= 1;
        self.rows_done = 0;
        let current = self.current_level;
        log::debug!(
            "progressive: level {} finished ({}), spp {}",
            current,
            self.upchain.level(current).size(),
            self.spp()
        );
        if current == 0 {
            return Ok(());
        }

        let live = self.live_changes();
        let src = self.upchain.level(current);
        let dst = self.upchain.level(current - 1);

        let back = dst.start_write(false);
        let result = backend.blit(src.target(), dst.target(), &back, Rect::FULL);
        dst.end_write(back);
        result?;

        if live {
            let src_size = src.size();
            let dx = if current % 2 == 1 {
                1.0 / (4.0 * src_size.w as f64)
            } else {
                0.0
            };
            let dy = if current % 2 == 0 {
                1.0 / (4.0 * src_size.h as f64)
            } else {
                0.0
            };
            backend.set_linear(src.target(), true);
            let front = dst.start_write(true);
            let result = backend.blit(src.target(), dst.target(), &front, Rect::FULL.offset(dx, dy));
            dst.end_write(front);
            backend.set_linear(src.target(), false);
            result?;
        }
        backend.flush();
        Ok(())
    }

    /// Whether refinement of the level in flight is shown while it happens.
    pub fn live_changes(&self) -> bool {
        let spp = self.spp();
        spp > self.settings.live_min_spp && spp < self.settings.live_max_spp
    }

    /// Samples per output pixel of the largest finished level.
    pub fn spp(&self) -> f64 {
        let ss = self.settings.supersamples as f64;
        ss * ss / 2f64.powi(self.current_level as i32)
    }

    /// Remaining work in levels: `len` right after a change, 0 when finished.
    pub fn progress(&self) -> f64 {
        if self.rows_done == 0 || self.current_level == 0 {
            return self.current_level as f64;
        }
        let h = self.upchain.level(self.current_level - 1).size().h;
        self.current_level as f64 - self.rows_done as f64 / h as f64
    }

    pub fn phase(&self) -> Phase {
        if self.current_level >= self.upchain.len() {
            Phase::CoarsePending
        } else if self.current_level == 0 {
            Phase::Finished
        } else {
            Phase::Refining
        }
    }

    /// Bind the best available image for compositing.
    ///
    /// During live preview (after the first frame of a change) this is the
    /// level still being refined, otherwise the largest finished one. Above
    /// `live_max_spp` the image is first reduced through the downsample
    /// chain. Pair with [`end_read`](Self::end_read).
    pub fn start_read(&mut self, backend: &mut B) -> RenderResult<&B::Target> {
        if self.current_level >= self.upchain.len() {
            return Err(RenderError::ReadBeforeReady);
        }
        let index = if self.live_changes() && self.frames_since_reset > 1 && self.current_level > 0
        {
            self.current_level - 1
        } else {
            self.current_level
        };
        let downsample = self.spp() > self.settings.live_max_spp;
        self.reading = Some(index);

        let level = self.upchain.level(index);
        backend.set_linear(level.target(), true);
        if downsample {
            self.downchain.rebind(backend, level.target(), level.size())
        } else {
            Ok(level.target())
        }
    }

    /// Restore nearest filtering on the level bound by `start_read`.
    pub fn end_read(&mut self, backend: &mut B) {
        if let Some(index) = self.reading.take() {
            if index < self.upchain.len() {
                backend.set_linear(self.upchain.level(index).target(), false);
            }
        }
    }

    /// Release every target. The scheduler must be resized before the next
    /// render.
    pub fn destroy(&mut self, backend: &mut B) {
        self.reading = None;
        self.upchain.destroy(backend);
        self.downchain.destroy(backend);
        self.current_level = 0;
        self.rows_done = 0;
    }

    fn request_frame(&self) {
        if let Some(push) = &self.push {
            push.push();
        }
    }

    pub fn current_level(&self) -> usize {
        self.current_level
    }

    pub fn level_count(&self) -> usize {
        self.upchain.len()
    }

    pub fn frames_since_reset(&self) -> u32 {
        self.frames_since_reset
    }

    pub fn output_size(&self) -> Size {
        self.output_size
    }

    pub fn supersamples(&self) -> u32 {
        self.settings.supersamples
    }

    pub fn settings(&self) -> &RenderSettings {
        &self.settings
    }

    pub fn pyramid(&self) -> &Pyramid<B::Target> {
        &self.upchain
    }

    pub fn downchain(&self) -> &Downchain<B::Target> {
        &self.downchain
    }

    /// Statistics of the last rendered frame.
    pub fn stats(&self) -> FrameStats {
        self.stats
    }
}
