//! Display-tick driven render loop.
//!
//! The host calls [`RenderLoop::frame`] once per display refresh. The loop
//! sleeps until somebody pushes it, then renders one frame per tick for as
//! long as pushes keep coming.

use std::cell::Cell;
use std::rc::Rc;

use fatou_core::RenderResult;
use futures_channel::oneshot;

/// Frames averaged by the FPS estimate.
const FPS_SMOOTHING: u32 = 30;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoopState {
    /// Nothing to do; the last image stays on screen.
    Sleeping,
    /// At least one more frame is requested.
    Active,
    /// Termination requested, completes on the next tick.
    Terminating,
    /// No more frames will be rendered.
    Terminated,
}

/// What the loop drives each frame.
pub trait FrameHandler {
    /// Advance rendering. Returns whether the visible image changed.
    fn render(&mut self, delta_ms: f64, continuous: bool) -> RenderResult<bool>;

    /// Present the current image.
    fn draw(&mut self) -> RenderResult<()>;

    /// Called on every tick the loop spends asleep.
    fn on_sleep(&mut self) {}
}

/// Cloneable handle that requests frames without owning the loop.
#[derive(Clone, Debug)]
pub struct PushHandle {
    state: Rc<Cell<LoopState>>,
}

impl PushHandle {
    /// Keep the loop active for at least one more frame.
    pub fn push(&self) {
        match self.state.get() {
            LoopState::Terminating | LoopState::Terminated => {
                log::error!("pushing a dead render loop");
            }
            _ => self.state.set(LoopState::Active),
        }
    }
}

pub struct RenderLoop {
    state: Rc<Cell<LoopState>>,
    last_tick: Option<f64>,
    continuous: bool,
    frames_awake: u32,
    /// Smoothed frame length in ms, negative while asleep.
    floating_delta: f64,
    /// Everyone waiting for termination.
    on_terminate: Vec<oneshot::Sender<()>>,
}

impl Default for RenderLoop {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderLoop {
    /// A new loop starts active so the first frame gets rendered.
    pub fn new() -> Self {
        Self {
            state: Rc::new(Cell::new(LoopState::Active)),
            last_tick: None,
            continuous: false,
            frames_awake: 0,
            floating_delta: -1.0,
            on_terminate: Vec::new(),
        }
    }

    pub fn push_handle(&self) -> PushHandle {
        PushHandle {
            state: Rc::clone(&self.state),
        }
    }

    pub fn push(&self) {
        self.push_handle().push();
    }

    pub fn state(&self) -> LoopState {
        self.state.get()
    }

    /// Smoothed frames per second, `None` while sleeping.
    pub fn fps(&self) -> Option<f64> {
        if self.floating_delta <= 0.0 {
            None
        } else {
            Some(1000.0 / self.floating_delta)
        }
    }

    /// Run one display tick at time `now_ms`. Returns whether the host should
    /// schedule another tick; the loop keeps ticking while asleep so that
    /// waking up does not start with a long frame.
    pub fn frame<H: FrameHandler>(&mut self, now_ms: f64, handler: &mut H) -> RenderResult<bool> {
        let delta = self.last_tick.map(|t| now_ms - t).unwrap_or(0.0);
        self.last_tick = Some(now_ms);

        match self.state.get() {
            LoopState::Terminated => return Ok(false),
            LoopState::Terminating => {
                self.state.set(LoopState::Terminated);
                for tx in self.on_terminate.drain(..) {
                    let _ = tx.send(());
                }
                log::debug!("render loop terminated");
                return Ok(false);
            }
            LoopState::Active => {
                self.state.set(LoopState::Sleeping);
                if handler.render(delta, self.continuous)? {
                    handler.draw()?;
                }
                self.continuous = true;

                // ratio is 0 on the first awake frame, replacing the -1 marker
                let ratio =
                    self.frames_awake.min(FPS_SMOOTHING) as f64 / (FPS_SMOOTHING + 1) as f64;
                self.floating_delta = ratio * self.floating_delta + (1.0 - ratio) * delta;
                self.frames_awake += 1;
            }
            LoopState::Sleeping => {
                self.frames_awake = 0;
                self.floating_delta = -1.0;
                self.continuous = false;
                handler.on_sleep();
            }
        }
        Ok(true)
    }

    /// Stop the loop. The returned receiver completes on the next tick, after
    /// which the handler's resources may be released.
    pub fn terminate(&mut self) -> oneshot::Receiver<()> {
        let (tx, rx) = oneshot::channel();
        match self.state.get() {
            LoopState::Terminated => {
                let _ = tx.send(());
            }
            _ => {
                self.state.set(LoopState::Terminating);
                self.on_terminate.push(tx);
            }
        }
        rx
    }

    pub fn is_terminated(&self) -> bool {
        self.state.get() == LoopState::Terminated
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Handler that keeps pushing for a fixed number of frames.
    struct Frames {
        push: Option<PushHandle>,
        remaining: u32,
        rendered: Vec<(f64, bool)>,
        draws: u32,
        sleeps: u32,
    }

    impl Frames {
        fn new(remaining: u32) -> Self {
            Self {
                push: None,
                remaining,
                rendered: Vec::new(),
                draws: 0,
                sleeps: 0,
            }
        }
    }

    impl FrameHandler for Frames {
        fn render(&mut self, delta_ms: f64, continuous: bool) -> RenderResult<bool> {
            self.rendered.push((delta_ms, continuous));
            if self.remaining > 0 {
                self.remaining -= 1;
                if let Some(p) = &self.push {
                    p.push();
                }
            }
            Ok(self.rendered.len() % 2 == 1)
        }

        fn draw(&mut self) -> RenderResult<()> {
            self.draws += 1;
            Ok(())
        }

        fn on_sleep(&mut self) {
            self.sleeps += 1;
        }
    }

    #[test]
    fn runs_while_pushed_then_sleeps() {
        let mut render_loop = RenderLoop::new();
        let mut handler = Frames::new(2);
        handler.push = Some(render_loop.push_handle());

        for i in 0..5 {
            assert!(render_loop.frame(i as f64 * 20.0, &mut handler).unwrap());
        }
        // initial frame + two pushes
        assert_eq!(handler.rendered.len(), 3);
        assert_eq!(handler.sleeps, 2);
        assert_eq!(handler.draws, 2);
        assert_eq!(render_loop.state(), LoopState::Sleeping);
        assert_eq!(render_loop.fps(), None);
    }

    #[test]
    fn continuity_and_deltas() {
        let mut render_loop = RenderLoop::new();
        let mut handler = Frames::new(1);
        handler.push = Some(render_loop.push_handle());

        render_loop.frame(100.0, &mut handler).unwrap();
        render_loop.frame(116.0, &mut handler).unwrap();
        render_loop.frame(132.0, &mut handler).unwrap(); // sleeps
        render_loop.push();
        render_loop.frame(500.0, &mut handler).unwrap();

        assert_eq!(
            handler.rendered,
            vec![(0.0, false), (16.0, true), (368.0, false)]
        );
    }

    #[test]
    fn fps_is_smoothed_while_awake() {
        let mut render_loop = RenderLoop::new();
        let mut handler = Frames::new(100);
        handler.push = Some(render_loop.push_handle());
        render_loop.frame(0.0, &mut handler).unwrap();
        for i in 1..=60 {
            render_loop.frame(i as f64 * 20.0, &mut handler).unwrap();
        }
        let fps = render_loop.fps().unwrap();
        assert!((fps - 50.0).abs() < 1.0, "fps {fps}");
    }

    #[test]
    fn terminate_completes_on_next_tick() {
        let mut render_loop = RenderLoop::new();
        let mut handler = Frames::new(0);
        let mut rx = render_loop.terminate();
        assert!(!render_loop.is_terminated());
        assert_eq!(rx.try_recv(), Ok(None));

        assert!(!render_loop.frame(0.0, &mut handler).unwrap());
        assert!(render_loop.is_terminated());
        assert!(handler.rendered.is_empty());
        assert_eq!(rx.try_recv(), Ok(Some(())));

        assert!(!render_loop.frame(16.0, &mut handler).unwrap());
    }

    #[test]
    fn pushing_a_dead_loop_is_ignored() {
        let mut render_loop = RenderLoop::new();
        let handle = render_loop.push_handle();
        let _rx = render_loop.terminate();
        handle.push();
        assert_eq!(render_loop.state(), LoopState::Terminating);

        let mut handler = Frames::new(0);
        render_loop.frame(0.0, &mut handler).unwrap();
        handle.push();
        assert!(render_loop.is_terminated());
    }

    #[test]
    fn every_terminate_caller_is_notified() {
        let mut render_loop = RenderLoop::new();
        let mut first = render_loop.terminate();
        let mut second = render_loop.terminate();
        assert_eq!(first.try_recv(), Ok(None));

        render_loop.frame(0.0, &mut Frames::new(0)).unwrap();
        assert_eq!(first.try_recv(), Ok(Some(())));
        assert_eq!(second.try_recv(), Ok(Some(())));
    }

    #[test]
    fn terminate_after_termination_resolves_immediately() {
        let mut render_loop = RenderLoop::new();
        let _ = render_loop.terminate();
        render_loop.frame(0.0, &mut Frames::new(0)).unwrap();
        let mut rx = render_loop.terminate();
        assert_eq!(rx.try_recv(), Ok(Some(())));
    }
}
