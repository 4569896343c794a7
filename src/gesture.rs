//! Gesture input and its interpretation.
//!
//! Gestures arrive already recognized. Each recognizer reports its value as
//! an *increment since it was last reset*: handlers consume the increment
//! and reset it to neutral (scale 1, rotation 0, translation 0), so the
//! proxy's transform compounds tick by tick.
//!
//! The pinch drives the transition. The proxy's width relative to where it
//! started is the *current scale*; shrinking it below
//! [`COMPLETION_THRESHOLD`] of its original width arms a commit, and
//! `1 - scale` is the progress fed to the timeline.

use crate::animation::Outcome;
use crate::geometry::Point;

/// Scale below which a released pinch commits the transition.
pub const COMPLETION_THRESHOLD: f32 = 0.7;

/// Bound on the normalized exit velocity handed to the settle spring.
pub const VELOCITY_LIMIT: f32 = 20.0;

/// Raw velocities smaller than this are used without normalization.
pub const LOW_VELOCITY_CUTOFF: f32 = 3.0;

/// Lifecycle phase of a recognized gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GesturePhase {
    #[default]
    Possible,
    Began,
    Changed,
    Ended,
    Cancelled,
    Failed,
}

/// Two-finger pinch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PinchGesture {
    pub phase: GesturePhase,
    /// Scale factor since the last reset; 1.0 is neutral.
    pub scale: f32,
    /// Scale factor per second. Negative while pinching in.
    pub velocity: f32,
}

impl PinchGesture {
    pub fn began() -> Self {
        Self {
            phase: GesturePhase::Began,
            scale: 1.0,
            velocity: 0.0,
        }
    }

    pub fn changed(scale: f32, velocity: f32) -> Self {
        Self {
            phase: GesturePhase::Changed,
            scale,
            velocity,
        }
    }

    pub fn ended(velocity: f32) -> Self {
        Self {
            phase: GesturePhase::Ended,
            scale: 1.0,
            velocity,
        }
    }

    pub fn cancelled(velocity: f32) -> Self {
        Self {
            phase: GesturePhase::Cancelled,
            scale: 1.0,
            velocity,
        }
    }

    pub fn reset(&mut self) {
        self.scale = 1.0;
    }
}

/// Two-finger rotation, tracked alongside the pinch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RotationGesture {
    pub phase: GesturePhase,
    /// Radians since the last reset.
    pub rotation: f32,
}

impl RotationGesture {
    pub fn changed(rotation: f32) -> Self {
        Self {
            phase: GesturePhase::Changed,
            rotation,
        }
    }

    pub fn reset(&mut self) {
        self.rotation = 0.0;
    }
}

/// Drag of the pinch's centroid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PanGesture {
    pub phase: GesturePhase,
    /// Offset since the last reset.
    pub translation: Point,
}

impl PanGesture {
    pub fn changed(dx: f32, dy: f32) -> Self {
        Self {
            phase: GesturePhase::Changed,
            translation: Point::new(dx, dy),
        }
    }

    pub fn reset(&mut self) {
        self.translation = Point::ZERO;
    }
}

/// Proxy width relative to the width it started at.
pub fn current_scale(proxy_width: f32, source_width: f32) -> f32 {
    proxy_width / source_width
}

/// Strictly below the threshold; exactly at it does not commit.
pub fn should_complete(scale: f32) -> bool {
    scale < COMPLETION_THRESHOLD
}

/// Progress the timeline shows for a proxy at `scale`, within `[0, 1]`.
/// Pinching out past the starting size holds progress at zero.
pub fn scrub_percent(scale: f32) -> f32 {
    (1.0 - scale).clamp(0.0, 1.0)
}

/// Whether a released pinch rolls back.
pub fn should_cancel(should_complete: bool, velocity: f32, phase: GesturePhase) -> bool {
    (!should_complete && velocity >= 0.0) || phase == GesturePhase::Cancelled
}

/// Turn a pinch's exit velocity (scale per second) into a spring velocity
/// relative to the distance still to travel.
///
/// The raw velocity is divided by the remaining scale delta and clamped to
/// `±VELOCITY_LIMIT`. Below `LOW_VELOCITY_CUTOFF` the raw value is returned
/// unchanged.
pub fn normalize_velocity(raw: f32, target_scale: f32, current_scale: f32) -> f32 {
    if raw.abs() < LOW_VELOCITY_CUTOFF {
        return raw;
    }
    let normalized = raw / (target_scale - current_scale);
    if normalized.is_nan() {
        return 0.0;
    }
    normalized.clamp(-VELOCITY_LIMIT, VELOCITY_LIMIT)
}

/// How a released pinch settles.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Settle {
    pub outcome: Outcome,
    /// Proxy scale at release.
    pub current_scale: f32,
    /// Proxy scale once the settle animation lands.
    pub target_scale: f32,
    /// Initial velocity for the settle spring.
    pub velocity: f32,
}

/// Running interpretation of one pinch.
#[derive(Debug, Clone)]
pub struct GestureInterpreter {
    source_width: f32,
    current_scale: f32,
    should_complete: bool,
}

impl GestureInterpreter {
    /// `source_width` is the proxy's width at the start of the transition.
    pub fn new(source_width: f32) -> Self {
        Self {
            source_width,
            current_scale: 1.0,
            should_complete: false,
        }
    }

    /// Record the proxy's new width and return the scrub percentage.
    pub fn pinch_changed(&mut self, proxy_width: f32) -> f32 {
        self.current_scale = current_scale(proxy_width, self.source_width);
        self.should_complete = should_complete(self.current_scale);
        scrub_percent(self.current_scale)
    }

    pub fn current_scale(&self) -> f32 {
        self.current_scale
    }

    pub fn should_complete(&self) -> bool {
        self.should_complete
    }

    /// Decide how the gesture settles.
    ///
    /// `proxy_width` is the proxy's width at release and `destination_width`
    /// the width it lands at on commit.
    pub fn finish(
        &self,
        phase: GesturePhase,
        velocity: f32,
        proxy_width: f32,
        destination_width: f32,
    ) -> Settle {
        let outcome = if should_cancel(self.should_complete, velocity, phase) {
            Outcome::Cancelled
        } else {
            Outcome::Committed
        };
        let target_width = match outcome {
            Outcome::Committed => destination_width,
            Outcome::Cancelled => self.source_width,
        };
        let target_scale = current_scale(target_width, self.source_width);
        let current = current_scale(proxy_width, self.source_width);
        Settle {
            outcome,
            current_scale: current,
            target_scale,
            velocity: normalize_velocity(velocity, target_scale, current),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_threshold_is_strict() {
        assert!(!should_complete(0.7));
        assert!(should_complete(0.699));
        assert!(!should_complete(0.95));
    }

    #[test]
    fn test_threshold_over_widths() {
        let source = 200.0;
        for step in 0..=200 {
            let width = step as f32 * 2.0;
            let scale = current_scale(width, source);
            assert_eq!(should_complete(scale), width < 140.0, "width {width}");
        }
    }

    #[test]
    fn test_low_velocity_passes_through() {
        for raw in [-2.99, -1.0, 0.0, 0.5, 2.99] {
            assert_eq!(normalize_velocity(raw, 0.3, 0.8), raw);
        }
    }

    #[test]
    fn test_velocity_is_divided_by_remaining_distance() {
        // Remaining distance of -0.5 turns -4 into 8
        assert_eq!(normalize_velocity(-4.0, 0.3, 0.8), 8.0);
        assert_eq!(normalize_velocity(3.0, 1.0, 0.5), 6.0);
    }

    #[test]
    fn test_velocity_is_clamped() {
        assert_eq!(normalize_velocity(-50.0, 0.3, 0.8), VELOCITY_LIMIT);
        assert_eq!(normalize_velocity(50.0, 0.3, 0.8), -VELOCITY_LIMIT);
        // Nothing left to travel
        assert_eq!(normalize_velocity(5.0, 0.5, 0.5), VELOCITY_LIMIT);
    }

    #[test]
    fn test_pinch_changed_reports_progress() {
        let mut interpreter = GestureInterpreter::new(300.0);
        let percent = interpreter.pinch_changed(150.0);
        assert_eq!(percent, 0.5);
        assert!(interpreter.should_complete());

        // Reversing direction disarms the commit again
        let percent = interpreter.pinch_changed(270.0);
        assert!((percent - 0.1).abs() < 1e-6);
        assert!(!interpreter.should_complete());
    }

    #[test]
    fn test_scrub_percent_stays_in_range() {
        assert_eq!(scrub_percent(1.5), 0.0);
        assert_eq!(scrub_percent(1.0), 0.0);
        assert_eq!(scrub_percent(0.25), 0.75);
        assert_eq!(scrub_percent(-0.5), 1.0);
    }

    #[test]
    fn test_pinch_out_holds_progress_at_zero() {
        let mut interpreter = GestureInterpreter::new(200.0);
        assert_eq!(interpreter.pinch_changed(300.0), 0.0);
        assert_eq!(interpreter.current_scale(), 1.5);
        assert!(!interpreter.should_complete());
    }

    #[test]
    fn test_finish_commits_when_small() {
        let mut interpreter = GestureInterpreter::new(300.0);
        interpreter.pinch_changed(150.0);
        let settle = interpreter.finish(GesturePhase::Ended, 0.0, 150.0, 90.0);
        assert_eq!(settle.outcome, Outcome::Committed);
        assert_eq!(settle.current_scale, 0.5);
        assert!((settle.target_scale - 0.3).abs() < 1e-6);
        assert_eq!(settle.velocity, 0.0);
    }

    #[test]
    fn test_finish_cancels_when_large_and_opening() {
        let mut interpreter = GestureInterpreter::new(300.0);
        interpreter.pinch_changed(270.0);
        let settle = interpreter.finish(GesturePhase::Ended, 10.0, 270.0, 90.0);
        assert_eq!(settle.outcome, Outcome::Cancelled);
        assert_eq!(settle.target_scale, 1.0);
        // 10 / (1.0 - 0.9) = 100, clamped
        assert_eq!(settle.velocity, VELOCITY_LIMIT);
    }

    #[test]
    fn test_finish_commits_large_pinch_closing_fast() {
        let mut interpreter = GestureInterpreter::new(300.0);
        interpreter.pinch_changed(270.0);
        let settle = interpreter.finish(GesturePhase::Ended, -1.0, 270.0, 90.0);
        assert_eq!(settle.outcome, Outcome::Committed);
    }

    #[test]
    fn test_cancelled_phase_always_cancels() {
        let mut interpreter = GestureInterpreter::new(300.0);
        interpreter.pinch_changed(30.0);
        let settle = interpreter.finish(GesturePhase::Cancelled, -8.0, 30.0, 90.0);
        assert_eq!(settle.outcome, Outcome::Cancelled);
    }
}
