//! Gesture-driven zoom transitions between two screens.
//!
//! A [`ZoomTransition`] animates navigation between a screen showing a small
//! view (a thumbnail) and a screen showing the same content large. Instead
//! of moving either real view, it animates a proxy from one anchor's
//! rectangle to the other's while the screens cross-fade. Pushes always
//! animate; a pinch on the presented screen drives the pop interactively and
//! commits or rolls back depending on how small the content got and how fast
//! the fingers were moving on release.
//!
//! The engine is a plain state machine. The hosting layer calls it when a
//! navigation is about to happen, once per frame through
//! [`ZoomTransition::tick`], and whenever a gesture updates.
//! [`navigation::NavigationStack`] is a complete host built that way.

pub mod animation;
pub mod error;
pub mod geometry;
pub mod gesture;
pub mod navigation;
pub mod proxy;
pub mod screen;
pub mod session;
pub mod transform;
pub mod transition;
pub mod view;

use std::time::Duration;

use animation::TimingFunction;

pub use error::{Result, TransitionError};
pub use transition::{PinchResponse, TransitionState, ZoomTransition};

pub mod prelude {
    pub use crate::animation::{Outcome, TimingFunction};
    pub use crate::geometry::{Point, Rect, Size};
    pub use crate::gesture::{GesturePhase, PanGesture, PinchGesture, RotationGesture};
    pub use crate::navigation::{AnchoredScreen, NavigationResult, NavigationStack, PlainScreen};
    pub use crate::screen::{
        NavigationOperation, Screen, ScreenRole, TransitionAnchorProvider, TransitionContext,
    };
    pub use crate::session::{Direction, Mode};
    pub use crate::transform::Transform;
    pub use crate::view::{Color, ContentMode, GestureMask, ViewContent, ViewId, ViewTree};
    pub use crate::{
        PinchResponse, TransitionConfig, TransitionError, TransitionState, ZoomTransition,
    };
}

/// Tunables of a [`ZoomTransition`].
#[derive(Clone, Debug)]
pub struct TransitionConfig {
    /// Attach pinch, rotation and pan recognizers to presented screens.
    /// When false every transition runs non-interactively.
    pub allows_interactive_gesture: bool,
    /// Duration of transitions that run on their own.
    pub animated_duration: Duration,
    /// Duration of the settle after an interactive gesture is released.
    pub interactive_duration: Duration,
    /// Spring damping ratio of non-interactive transitions.
    pub animated_damping: f32,
    /// Spring damping ratio of the settle after a gesture.
    pub settle_damping: f32,
    /// Curve mapping gesture progress onto the cross-fade.
    pub scrub_timing: TimingFunction,
}

impl Default for TransitionConfig {
    fn default() -> Self {
        Self {
            allows_interactive_gesture: true,
            animated_duration: Duration::from_millis(500),
            interactive_duration: Duration::from_millis(700),
            animated_damping: 0.8,
            settle_damping: 1.0,
            scrub_timing: TimingFunction::Linear,
        }
    }
}
