//! Per-frame sample budget.
//!
//! The scheduler asks for a budget (`sps`, samples per frame) before every
//! frame and reports what it actually spent afterwards. How the budget
//! reacts is up to the estimator.

use fatou_core::{EffortPolicy, EffortSettings};

pub trait EffortEstimator {
    /// Samples the next frame may spend.
    fn sps(&self) -> f64;

    /// Duration of the frame that just ended. `continuous` is false after
    /// the render loop slept, in which case `millis` includes idle time.
    fn post_frame(&mut self, millis: f64, continuous: bool);

    /// Samples consumed by the frame and the level it reached.
    fn post_render(&mut self, consumed: f64, level: usize);
}

/// Build the estimator selected by `settings.policy`.
pub fn from_settings(settings: &EffortSettings) -> Box<dyn EffortEstimator> {
    match settings.policy {
        EffortPolicy::Fixed => {
            Box::new(FixedEffort::new(settings.clamp_sps(settings.initial_sps)))
        }
        EffortPolicy::Adaptive => Box::new(AdaptiveEffort::new(settings.clone())),
    }
}

/// Constant budget.
#[derive(Clone, Debug)]
pub struct FixedEffort {
    sps: f64,
}

impl FixedEffort {
    pub fn new(sps: f64) -> Self {
        Self { sps }
    }
}

impl EffortEstimator for FixedEffort {
    fn sps(&self) -> f64 {
        self.sps
    }

    fn post_frame(&mut self, _millis: f64, _continuous: bool) {}

    fn post_render(&mut self, _consumed: f64, _level: usize) {}
}

/// Budget that tracks measured throughput.
///
/// Throughput (samples per millisecond) is smoothed exponentially and scaled
/// to the target frame interval. The budget grows at most 2x per frame and
/// drops sharply when a frame overshoots. A discontinuous frame resets the
/// throughput estimate but keeps the last budget.
#[derive(Clone, Debug)]
pub struct AdaptiveEffort {
    settings: EffortSettings,
    sps: f64,
    throughput: Option<f64>,
    pending: f64,
}

impl AdaptiveEffort {
    pub fn new(settings: EffortSettings) -> Self {
        let sps = settings.clamp_sps(settings.initial_sps);
        Self {
            settings,
            sps,
            throughput: None,
            pending: 0.0,
        }
    }

    /// Smoothed samples per millisecond, if any frame was measured.
    pub fn throughput(&self) -> Option<f64> {
        self.throughput
    }
}

impl EffortEstimator for AdaptiveEffort {
    fn sps(&self) -> f64 {
        self.sps
    }

    fn post_frame(&mut self, millis: f64, continuous: bool) {
        let used = std::mem::take(&mut self.pending);
        if !continuous {
            self.throughput = None;
            return;
        }
        if used <= 0.0 || millis <= 0.0 {
            return;
        }

        let observed = used / millis;
        let throughput = match self.throughput {
            Some(t) => t + self.settings.smoothing * (observed - t),
            None => observed,
        };
        self.throughput = Some(throughput);

        let interval = self.settings.target_frame_ms();
        let mut next = (throughput * interval).min(self.sps * 2.0);
        if millis > interval * 4.0 {
            next = self.sps / 10.0;
        } else if millis > interval * 2.0 {
            next = next.min(self.sps / 2.0);
        }
        self.sps = self.settings.clamp_sps(next);
        log::trace!("effort: {observed:.1} samples/ms, budget {:.0}", self.sps);
    }

    fn post_render(&mut self, consumed: f64, _level: usize) {
        self.pending += consumed;
    }
}
