//! Consumer-facing facade tying a backend, a sampler and the scheduler to a
//! fractal view.

use fatou_core::{
    FractalConfig, FractalKind, RenderBackend, RenderResult, RenderSettings, Sampler, Size, View,
};

use crate::render_loop::{FrameHandler, PushHandle};
use crate::scheduler::ProgressiveScheduler;
use crate::stats::FrameStats;

pub struct Engine<B: RenderBackend, S: Sampler<B>> {
    backend: B,
    sampler: S,
    scheduler: ProgressiveScheduler<B>,
    view: View,
    fractal: FractalKind,
    preset: &'static str,
}

impl<B: RenderBackend, S: Sampler<B>> Engine<B, S> {
    /// Set up the scheduler for `output_size` and load the default preset of
    /// `fractal`.
    pub fn new(
        mut backend: B,
        sampler: S,
        fractal: FractalKind,
        output_size: Size,
        settings: RenderSettings,
    ) -> RenderResult<Self> {
        let scheduler = ProgressiveScheduler::new(&mut backend, output_size, settings)?;
        let config = fractal.config();
        let mut engine = Self {
            backend,
            sampler,
            scheduler,
            view: View::default(),
            fractal,
            preset: config.default_preset,
        };
        engine.apply_preset(config.default_preset)?;
        Ok(engine)
    }

    /// Let the scheduler wake the host's render loop.
    pub fn attach(&mut self, push: PushHandle) {
        self.scheduler.set_push_handle(push);
    }

    pub fn view(&self) -> &View {
        &self.view
    }

    /// New viewport from navigation. Restarts progressive rendering.
    pub fn on_view_changed(&mut self, view: View) {
        self.view = view;
        self.scheduler.change();
    }

    /// Render one frame and present it when it changed.
    pub fn tick(&mut self, delta_seconds: f64, continuous: bool) -> RenderResult<bool> {
        let changed = self.advance(delta_seconds, continuous)?;
        if changed {
            self.draw()?;
        }
        Ok(changed)
    }

    fn advance(&mut self, delta_seconds: f64, continuous: bool) -> RenderResult<bool> {
        self.scheduler.render(
            &mut self.backend,
            &mut self.sampler,
            &self.view,
            delta_seconds,
            continuous,
        )
    }

    /// Composite the best available buffer onto the backend output.
    pub fn draw(&mut self) -> RenderResult<()> {
        let result = self
            .scheduler
            .start_read(&mut self.backend)
            .and_then(|source| self.backend.composite(source));
        self.scheduler.end_read(&mut self.backend);
        if result.is_ok() {
            self.backend.flush();
        }
        result
    }

    /// Overall completion, 0.0 right after a change, 100.0 when finished.
    pub fn progress_percent(&self) -> f64 {
        let count = self.scheduler.level_count();
        if count == 0 {
            return 0.0;
        }
        (1.0 - self.scheduler.progress() / count as f64) * 100.0
    }

    /// Samples per output pixel of the finished image.
    pub fn effective_spp(&self) -> f64 {
        self.scheduler.spp()
    }

    pub fn set_output_size(&mut self, size: Size) -> RenderResult<()> {
        if size == self.scheduler.output_size() && self.scheduler.level_count() > 0 {
            return Ok(());
        }
        self.scheduler.set_size(&mut self.backend, size)
    }

    pub fn set_supersamples(&mut self, supersamples: u32) -> RenderResult<()> {
        self.scheduler.set_supersamples(&mut self.backend, supersamples)
    }

    /// Swap the fractal program. The pyramid is rebuilt at the fractal's
    /// preferred supersampling and its default preset is loaded.
    pub fn set_fractal(&mut self, fractal: FractalKind, sampler: S) -> RenderResult<()> {
        let config = fractal.config();
        log::info!("loading fractal {}", config.display_name);
        self.sampler = sampler;
        self.fractal = fractal;
        self.scheduler
            .set_supersamples(&mut self.backend, config.default_supersamples)?;
        self.apply_preset(config.default_preset)
    }

    /// Load a named preset of the current fractal: view, parameters and,
    /// when the preset asks for another supersample factor, a rebuilt
    /// pyramid.
    pub fn apply_preset(&mut self, name: &str) -> RenderResult<()> {
        let config = self.config();
        let preset = config.preset(name)?;
        log::debug!("preset {}/{}", config.id, preset.name);

        self.sampler.set_parameters(&config.resolve_parameters(preset));
        if let Some(supersamples) = preset.supersamples {
            if supersamples != self.scheduler.supersamples() {
                self.scheduler
                    .set_supersamples(&mut self.backend, supersamples)?;
            }
        }
        self.preset = preset.name;
        self.on_view_changed(preset.view());
        Ok(())
    }

    pub fn config(&self) -> &'static FractalConfig {
        self.fractal.config()
    }

    pub fn fractal(&self) -> FractalKind {
        self.fractal
    }

    pub fn preset(&self) -> &'static str {
        self.preset
    }

    pub fn stats(&self) -> FrameStats {
        self.scheduler.stats()
    }

    /// Status readout for overlays, e.g. `prog 3.50 | spp 1/4 -> 1/2 (live) | spf 500000`.
    pub fn status_line(&self) -> String {
        self.scheduler.stats().status_line()
    }

    pub fn scheduler(&self) -> &ProgressiveScheduler<B> {
        &self.scheduler
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn sampler(&self) -> &S {
        &self.sampler
    }

    /// Release all GPU targets. Call once the render loop has terminated.
    pub fn destroy(&mut self) {
        self.scheduler.destroy(&mut self.backend);
    }
}

impl<B: RenderBackend, S: Sampler<B>> FrameHandler for Engine<B, S> {
    fn render(&mut self, delta_ms: f64, continuous: bool) -> RenderResult<bool> {
        self.advance(delta_ms / 1000.0, continuous)
    }

    fn draw(&mut self) -> RenderResult<()> {
        Engine::draw(self)
    }

    fn on_sleep(&mut self) {
        log::trace!("render loop sleeping at {}", self.status_line());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render_loop::RenderLoop;
    use crate::testing::{CountingSampler, Op, RecordingBackend};
    use fatou_core::{EffortSettings, RenderError};

    fn engine(sps: f64) -> Engine<RecordingBackend, CountingSampler> {
        Engine::new(
            RecordingBackend::new(),
            CountingSampler::new(),
            FractalKind::Mandelbrot,
            Size::new(40, 30),
            RenderSettings::default().with_effort(EffortSettings::fixed(sps)),
        )
        .unwrap()
    }

    #[test]
    fn new_loads_default_preset() {
        let e = engine(500.0);
        assert_eq!(e.preset(), "filigran");
        let filigran = e.config().preset("filigran").unwrap();
        assert_eq!(*e.view(), filigran.view());
        assert!(e
            .sampler()
            .parameters
            .contains(&("iterations", 96.0)));
        assert_eq!(e.progress_percent(), 0.0);
    }

    #[test]
    fn tick_renders_and_composites() {
        let mut e = engine(1e9);
        assert!(e.tick(0.016, true).unwrap());
        assert_eq!(e.progress_percent(), 100.0);
        assert_eq!(e.effective_spp(), 16.0);
        assert!(e
            .backend()
            .ops()
            .iter()
            .any(|op| matches!(op, Op::Composite { .. })));

        // converged: nothing to draw
        e.backend_mut().take_ops();
        assert!(!e.tick(0.016, true).unwrap());
        assert!(e.backend().ops().is_empty());
    }

    #[test]
    fn sampler_sees_the_view() {
        let mut e = engine(1e9);
        e.on_view_changed(View::new(-0.5, 0.25, 2.0));
        e.tick(0.016, true).unwrap();
        let call = e.sampler().calls.last().unwrap();
        assert_eq!(call.position.re, -0.5);
        assert_eq!(call.position.im, 0.25);
        assert_eq!(call.zoom.re, 2.0);
        assert_eq!(call.zoom.im, 1.5);
    }

    #[test]
    fn draw_before_render_fails() {
        let mut e = engine(500.0);
        assert_eq!(e.draw(), Err(RenderError::ReadBeforeReady));
    }

    #[test]
    fn preset_with_supersample_override_rebuilds() {
        let mut e = engine(500.0);
        assert_eq!(e.scheduler().supersamples(), 4);
        e.apply_preset("Smooth").unwrap();
        assert_eq!(e.scheduler().supersamples(), 2);
        assert_eq!(e.scheduler().pyramid().level(0).size(), Size::new(80, 60));

        // presets without an override keep the current factor
        e.apply_preset("Corals").unwrap();
        assert_eq!(e.scheduler().supersamples(), 2);
    }

    #[test]
    fn unknown_preset_leaves_engine_untouched() {
        let mut e = engine(500.0);
        let err = e.apply_preset("Nope").unwrap_err();
        assert!(matches!(err, RenderError::UnknownPreset { .. }));
        assert_eq!(e.preset(), "filigran");
    }

    #[test]
    fn set_fractal_swaps_sampler_and_rebuilds() {
        let mut e = engine(500.0);
        e.apply_preset("Smooth").unwrap();
        let before = e.backend().live_targets();

        e.set_fractal(FractalKind::Test, CountingSampler::new())
            .unwrap();
        assert_eq!(e.fractal(), FractalKind::Test);
        assert_eq!(e.preset(), "Achat");
        assert_eq!(e.scheduler().supersamples(), 4);
        assert_ne!(e.backend().live_targets(), before);
        assert!(e.sampler().calls.is_empty());
    }

    #[test]
    fn resize_restarts_rendering() {
        let mut e = engine(1e9);
        e.tick(0.016, true).unwrap();
        e.set_output_size(Size::new(80, 60)).unwrap();
        assert_eq!(e.progress_percent(), 0.0);
        assert_eq!(
            e.scheduler().pyramid().level(0).size(),
            Size::new(320, 240)
        );
    }

    #[test]
    fn drives_through_the_render_loop() {
        let mut e = engine(500.0);
        let mut render_loop = RenderLoop::new();
        e.attach(render_loop.push_handle());

        let mut t = 0.0;
        while e.progress_percent() < 100.0 {
            assert!(render_loop.frame(t, &mut e).unwrap());
            t += 40.0;
            assert!(t < 40.0 * 500.0, "did not converge");
        }
        // one more tick renders nothing and lets the loop fall asleep
        render_loop.frame(t, &mut e).unwrap();
        render_loop.frame(t + 40.0, &mut e).unwrap();
        assert_eq!(render_loop.fps(), None);

        let mut done = render_loop.terminate();
        render_loop.frame(t + 80.0, &mut e).unwrap();
        assert_eq!(done.try_recv(), Ok(Some(())));
        e.destroy();
        assert_eq!(e.backend().live_targets(), 0);
    }
}
