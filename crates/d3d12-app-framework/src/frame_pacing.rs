use crate::clock::Clock;
use crate::clock::TimeSource;
use std::time::Duration;

/// How long the loop sleeps per iteration while the app is paused.
pub const PAUSED_SLEEP: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameRate {
    pub fps: f32,
    /// Milliseconds per frame.
    pub mspf: f32,
}

/// Counts frames over one-second windows of clock time.
#[derive(Debug, Default)]
pub struct FrameStats {
    frame_count: u32,
    time_elapsed: f32,
}

impl FrameStats {
    /// Counts one frame. Returns the average over the window once a full
    /// second of `total_time` has gone by since the window opened.
    pub fn record_frame(&mut self, total_time: f32) -> Option<FrameRate> {
        self.frame_count += 1;
        if total_time - self.time_elapsed < 1.0 {
            return None;
        }
        let fps = self.frame_count as f32;
        let rate = FrameRate {
            fps,
            mspf: 1000.0 / fps,
        };
        self.frame_count = 0;
        self.time_elapsed += 1.0;
        Some(rate)
    }
}

/// `"<caption>    fps: <fps>   mspf: <mspf>"`
pub fn window_caption(caption: &str, rate: FrameRate) -> String {
    format!(
        "{caption}    fps: {:.6}   mspf: {:.6}",
        rate.fps, rate.mspf
    )
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FrameStep {
    /// Paused: nothing to simulate, sleep for [`PAUSED_SLEEP`].
    Idle,
    Frame {
        delta_time: f32,
        total_time: f32,
        rate: Option<FrameRate>,
    },
}

/// Decides what one idle iteration of the message loop does.
#[derive(Debug, Default)]
pub struct FramePacer {
    stats: FrameStats,
}

impl FramePacer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance<S: TimeSource>(&mut self, clock: &mut Clock<S>, paused: bool) -> FrameStep {
        clock.tick();
        if paused {
            return FrameStep::Idle;
        }
        let total_time = clock.total_time();
        FrameStep::Frame {
            delta_time: clock.delta_time(),
            total_time,
            rate: self.stats.record_frame(total_time),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualTimeSource;
    use approx::assert_relative_eq;

    #[test]
    fn reports_once_per_second() {
        let mut stats = FrameStats::default();
        let mut reports = Vec::new();
        // 60 frames a second for 3 seconds.
        for frame in 1..=180 {
            if let Some(rate) = stats.record_frame(frame as f32 / 60.0) {
                reports.push(rate);
            }
        }
        assert_eq!(reports.len(), 3);
        for rate in reports {
            assert_relative_eq!(rate.fps, 60.0);
            assert_relative_eq!(rate.mspf, 1000.0 / 60.0, epsilon = 1e-4);
        }
    }

    #[test]
    fn caption_matches_the_title_bar_format() {
        let rate = FrameRate {
            fps: 50.0,
            mspf: 20.0,
        };
        assert_eq!(
            window_caption("Box", rate),
            "Box    fps: 50.000000   mspf: 20.000000"
        );
    }

    #[test]
    fn paused_iterations_do_not_count_frames() {
        let source = ManualTimeSource::millis();
        let mut clock = Clock::with_source(source.clone());
        let mut pacer = FramePacer::new();
        clock.reset();

        source.advance(500);
        assert_eq!(pacer.advance(&mut clock, true), FrameStep::Idle);

        source.advance(600);
        match pacer.advance(&mut clock, false) {
            FrameStep::Frame {
                delta_time, rate, ..
            } => {
                assert_relative_eq!(delta_time, 0.6, epsilon = 1e-6);
                let rate = rate.expect("a full second has gone by");
                assert_relative_eq!(rate.fps, 1.0);
            }
            FrameStep::Idle => panic!("running loop must produce a frame"),
        }
    }
}
