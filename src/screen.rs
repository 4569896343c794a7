//! Seams between the transition engine and the code hosting it.
//!
//! A [`Screen`] is one page of a navigation stack. Screens that want to take
//! part in a zoom transition also implement [`TransitionAnchorProvider`] and
//! hand it out through [`Screen::anchor_provider`]; the engine declines any
//! navigation where either side does not.

use std::fmt;

use crate::geometry::Rect;
use crate::view::{ViewId, ViewTree};

/// Navigation operation the hosting layer is about to perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationOperation {
    Push,
    Pop,
}

/// Which side of a transition a screen is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScreenRole {
    /// The screen being navigated away from.
    Source,
    /// The screen being navigated to.
    Destination,
}

impl fmt::Display for ScreenRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScreenRole::Source => write!(f, "source"),
            ScreenRole::Destination => write!(f, "destination"),
        }
    }
}

/// Capability of a screen to anchor a zoom transition.
pub trait TransitionAnchorProvider {
    /// The view the transition zooms from or into, typically an image view.
    fn view_for_transition(&self) -> Option<ViewId>;
}

/// A page managed by the hosting navigation layer.
pub trait Screen {
    /// Root view of the screen.
    fn view(&self) -> ViewId;

    /// The screen's transition anchor capability, if it has one.
    fn anchor_provider(&self) -> Option<&dyn TransitionAnchorProvider> {
        None
    }
}

/// Anchor view of `screen`, if it provides one.
pub fn anchor_view(screen: &dyn Screen) -> Option<ViewId> {
    screen
        .anchor_provider()
        .and_then(|provider| provider.view_for_transition())
}

/// The hosting layer's side of one in-flight transition.
///
/// The engine reads the participants and the container from it, mutates the
/// view hierarchy through it and reports the outcome exactly once through
/// [`TransitionContext::complete_transition`].
pub trait TransitionContext {
    fn views(&self) -> &ViewTree;

    fn views_mut(&mut self) -> &mut ViewTree;

    /// View both screens are placed in while the transition runs.
    fn container(&self) -> ViewId;

    fn screen(&self, role: ScreenRole) -> &dyn Screen;

    /// Frame the screen's root view occupies once the transition ends.
    fn final_frame(&self, role: ScreenRole) -> Rect;

    /// Whether the platform interrupted the transition.
    fn transition_was_cancelled(&self) -> bool {
        false
    }

    /// Report the outcome: `true` when the navigation took effect.
    fn complete_transition(&mut self, committed: bool);
}
