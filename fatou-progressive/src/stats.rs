use fatou_core::rationalize;

const SPP_EPSILON: f64 = 1e-9;

/// What one scheduler frame did, for status readouts.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FrameStats {
    /// Samples spent this frame.
    pub consumed: f64,
    /// Budget the frame started with.
    pub budget: f64,
    /// Index of the largest finished level (`level_count` when none is).
    pub level: usize,
    pub level_count: usize,
    /// Remaining work in levels, counting down to 0.
    pub progress: f64,
    /// Samples per output pixel of the finished level.
    pub spp: f64,
    /// Whether refinement is shown while it happens.
    pub live: bool,
}

impl FrameStats {
    /// Completion of the whole pyramid (0.0 to 100.0).
    pub fn percentage(&self) -> f64 {
        if self.level_count == 0 {
            0.0
        } else {
            (1.0 - self.progress / self.level_count as f64).clamp(0.0, 1.0) * 100.0
        }
    }

    pub fn is_complete(&self) -> bool {
        self.level_count > 0 && self.level == 0
    }

    /// Samples per pixel as shown to the user, e.g. `1/4 -> 1/2 (live)`.
    pub fn spp_label(&self) -> String {
        if self.progress == 0.0 {
            format!("{} (max)", rationalize(self.spp, SPP_EPSILON))
        } else {
            format!(
                "{} -> {} ({})",
                rationalize(self.spp, SPP_EPSILON),
                rationalize(self.spp * 2.0, SPP_EPSILON),
                if self.live { "live" } else { "offscreen" }
            )
        }
    }

    /// One-line summary: progress, spp and samples per frame.
    pub fn status_line(&self) -> String {
        format!(
            "prog {:.2} | spp {} | spf {:.0}",
            self.progress,
            self.spp_label(),
            self.consumed
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percentage_counts_finished_levels() {
        let stats = FrameStats {
            level_count: 8,
            progress: 8.0,
            ..Default::default()
        };
        assert_eq!(stats.percentage(), 0.0);

        let stats = FrameStats {
            level_count: 8,
            progress: 2.0,
            ..Default::default()
        };
        assert!((stats.percentage() - 75.0).abs() < 1e-9);
    }

    #[test]
    fn percentage_without_levels() {
        assert_eq!(FrameStats::default().percentage(), 0.0);
        assert!(!FrameStats::default().is_complete());
    }

    #[test]
    fn spp_labels() {
        let finished = FrameStats {
            spp: 16.0,
            progress: 0.0,
            level_count: 9,
            ..Default::default()
        };
        assert_eq!(finished.spp_label(), "16 (max)");
        assert!(finished.is_complete());

        let live = FrameStats {
            spp: 0.25,
            progress: 5.5,
            live: true,
            ..Default::default()
        };
        assert_eq!(live.spp_label(), "1/4 -> 1/2 (live)");

        let offscreen = FrameStats {
            spp: 4.0,
            progress: 2.0,
            live: false,
            ..Default::default()
        };
        assert_eq!(offscreen.spp_label(), "4 -> 8 (offscreen)");
    }

    #[test]
    fn status_line_format() {
        let stats = FrameStats {
            consumed: 500_000.0,
            spp: 0.5,
            progress: 4.25,
            live: true,
            level: 5,
            level_count: 9,
            budget: 500_000.0,
        };
        assert_eq!(
            stats.status_line(),
            "prog 4.25 | spp 1/2 -> 1 (live) | spf 500000"
        );
    }
}
