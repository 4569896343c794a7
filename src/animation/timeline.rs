//! Single-shot interpolation between two animatable states.
//!
//! A [`Timeline`] is either *running*, advanced by the host's frame clock
//! along a spring curve until its duration elapses, or *scrubbed*, with its
//! progress set directly from outside and never moving on its own. It is
//! polled rather than calling back: [`Timeline::advance`] reports
//! [`TimelineStatus::Finished`] exactly once, carrying the outcome the
//! timeline was started (or later marked) with.

use std::time::Duration;

use super::{Animatable, SpringConfig, SpringState, TimingFunction};

/// Terminal outcome of a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The navigation took effect.
    Committed,
    /// The visual state was rolled back to where it started.
    Cancelled,
}

impl Outcome {
    pub fn is_committed(self) -> bool {
        self == Outcome::Committed
    }
}

/// Result of advancing a timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimelineStatus {
    Running,
    /// Reported on the frame the timeline reaches its end; later calls keep
    /// returning it.
    Finished(Outcome),
}

enum Drive {
    Spring {
        config: SpringConfig,
        state: SpringState,
    },
    Scrub {
        timing: TimingFunction,
    },
}

pub struct Timeline<T: Animatable> {
    from: T,
    to: T,
    current: T,
    duration: Duration,
    elapsed: Duration,
    /// Linear progress, 0.0 at `from` and 1.0 at `to`
    progress: f32,
    drive: Drive,
    outcome: Outcome,
    finished: bool,
}

impl<T: Animatable> Timeline<T> {
    /// Start a spring animation from `from` to `to` that finishes after
    /// `duration`.
    ///
    /// `initial_velocity` is expressed in full distances per second, so 1.0
    /// would cover the whole way in one second at constant speed.
    pub fn run_to_completion(
        from: T,
        to: T,
        duration: Duration,
        damping_ratio: f32,
        initial_velocity: f32,
    ) -> Self {
        let config = SpringConfig::from_damping_ratio(duration.as_secs_f32(), damping_ratio);
        Self {
            current: from.clone(),
            from,
            to,
            duration,
            elapsed: Duration::ZERO,
            progress: 0.0,
            drive: Drive::Spring {
                config,
                state: SpringState::with_velocity(initial_velocity),
            },
            outcome: Outcome::Committed,
            finished: false,
        }
    }

    /// Create a timeline that only moves through [`Timeline::scrub`].
    pub fn scrubbed(from: T, to: T, duration: Duration, timing: TimingFunction) -> Self {
        Self {
            current: from.clone(),
            from,
            to,
            duration,
            elapsed: Duration::ZERO,
            progress: 0.0,
            drive: Drive::Scrub { timing },
            outcome: Outcome::Committed,
            finished: false,
        }
    }

    /// Settle with `outcome` instead of the default `Committed`.
    pub fn with_outcome(mut self, outcome: Outcome) -> Self {
        self.outcome = outcome;
        self
    }

    /// Set progress directly. Values outside `[0, 1]` are not clamped, and
    /// progress may move backwards.
    pub fn scrub(&mut self, percent: f32) -> &T {
        match &self.drive {
            Drive::Scrub { timing } => {
                self.progress = percent;
                self.elapsed = self.duration.mul_f32(percent.clamp(0.0, 1.0));
                self.current = T::lerp(&self.from, &self.to, timing.evaluate(percent));
            }
            Drive::Spring { .. } => {
                log::warn!("scrub ignored on a running timeline");
            }
        }
        &self.current
    }

    /// Advance a running timeline by one frame of `dt`.
    ///
    /// Scrubbed timelines stay where they were last scrubbed and report
    /// `Running`.
    pub fn advance(&mut self, dt: Duration) -> TimelineStatus {
        if self.finished {
            return TimelineStatus::Finished(self.outcome);
        }

        let Drive::Spring { config, state } = &mut self.drive else {
            return TimelineStatus::Running;
        };

        self.elapsed += dt;
        if self.elapsed >= self.duration {
            self.elapsed = self.duration;
            self.progress = 1.0;
            self.current = self.to.clone();
            self.finished = true;
            return TimelineStatus::Finished(self.outcome);
        }

        let position = state.step(self.elapsed.as_secs_f32(), config);
        self.progress = self.elapsed.as_secs_f32() / self.duration.as_secs_f32();
        self.current = T::lerp(&self.from, &self.to, position);
        TimelineStatus::Running
    }

    /// Mark the timeline as cancelled; it still runs to its end.
    pub fn cancel(&mut self) {
        self.outcome = Outcome::Cancelled;
    }

    pub fn value(&self) -> &T {
        &self.current
    }

    pub fn from(&self) -> &T {
        &self.from
    }

    pub fn to(&self) -> &T {
        &self.to
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Linear progress: elapsed fraction when running, the last scrubbed
    /// percentage when scrubbed.
    pub fn progress(&self) -> f32 {
        self.progress
    }

    pub fn outcome(&self) -> Outcome {
        self.outcome
    }

    pub fn is_scrubbed(&self) -> bool {
        matches!(self.drive, Drive::Scrub { .. })
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }
}
