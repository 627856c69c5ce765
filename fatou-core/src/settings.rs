//! Runtime settings for the progressive scheduler.

use serde::{Deserialize, Serialize};

/// How the per-frame sample budget reacts to observed frame times.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffortPolicy {
    /// Constant budget of `initial_sps` samples per frame.
    #[default]
    Fixed,
    /// Budget follows the measured sample throughput.
    Adaptive,
}

/// Settings for the effort estimator.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EffortSettings {
    pub policy: EffortPolicy,
    /// Samples per frame to start from.
    pub initial_sps: f64,
    /// Lower clamp of the budget.
    pub min_sps: f64,
    /// Upper clamp of the budget.
    pub max_sps: f64,
    /// Frame rate the adaptive policy aims for. Stays below 30 so a capped
    /// display rate cannot drive the controller into oscillation.
    pub target_fps: f64,
    /// Weight of a new throughput observation, in (0, 1].
    #[serde(default = "default_smoothing")]
    pub smoothing: f64,
}

fn default_smoothing() -> f64 {
    0.1
}

impl Default for EffortSettings {
    fn default() -> Self {
        Self {
            policy: EffortPolicy::Fixed,
            initial_sps: 500_000.0,
            min_sps: 128.0,
            max_sps: 10_000_000.0,
            target_fps: 25.0,
            smoothing: default_smoothing(),
        }
    }
}

impl EffortSettings {
    /// Constant budget, mostly for tests and benchmarks.
    pub fn fixed(sps: f64) -> Self {
        Self {
            policy: EffortPolicy::Fixed,
            initial_sps: sps,
            min_sps: sps.min(Self::default().min_sps),
            max_sps: sps.max(Self::default().max_sps),
            ..Default::default()
        }
    }

    /// Bound a budget to `[min_sps, max_sps]`. The floor wins when a
    /// hand-written config has the bounds crossed.
    pub fn clamp_sps(&self, sps: f64) -> f64 {
        sps.min(self.max_sps).max(self.min_sps)
    }

    /// Milliseconds available per frame at `target_fps`.
    pub fn target_frame_ms(&self) -> f64 {
        1000.0 / self.target_fps.max(1.0)
    }
}

/// Settings for the progressive scheduler.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RenderSettings {
    /// Samples per output pixel along each axis.
    pub supersamples: u32,
    /// Pyramid construction stops once a level's area is at most this.
    pub min_level_area: u64,
    /// Hard cap of refinement steps per frame.
    pub max_refine_steps: u32,
    /// Refinement stops when the budget left is below this fraction of
    /// what the frame already consumed.
    pub min_step_ratio: f64,
    /// Live preview is shown strictly above this spp...
    pub live_min_spp: f64,
    /// ...and strictly below this one. Above it the downsample chain runs.
    pub live_max_spp: f64,
    #[serde(default)]
    pub effort: EffortSettings,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            supersamples: 4,
            min_level_area: 2000,
            max_refine_steps: 20,
            min_step_ratio: 0.05,
            live_min_spp: 1.0 / 1024.0,
            live_max_spp: 4.0,
            effort: EffortSettings::default(),
        }
    }
}

impl RenderSettings {
    pub fn with_supersamples(mut self, supersamples: u32) -> Self {
        self.supersamples = supersamples;
        self
    }

    pub fn with_effort(mut self, effort: EffortSettings) -> Self {
        self.effort = effort;
        self
    }
}
