//! Error types for zoom transitions.

use thiserror::Error;

use crate::screen::ScreenRole;
use crate::view::ViewId;

/// Result type for transition operations.
pub type Result<T> = std::result::Result<T, TransitionError>;

/// Reasons a transition cannot be prepared or a hierarchy edit is refused.
///
/// None of these reach the end user: the hosting layer reacts to an error by
/// falling back to its default transition.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransitionError {
    /// The screen does not provide a transition anchor at all.
    #[error("{0} screen does not provide a transition anchor")]
    NotAnchorProvider(ScreenRole),

    /// The screen is an anchor provider but has no usable anchor view.
    #[error("{0} screen has no anchor view attached to the hierarchy")]
    MissingAnchor(ScreenRole),

    /// A view handle that is stale or was never issued.
    #[error("unknown view {0:?}")]
    UnknownView(ViewId),

    /// Geometry was requested between views in different hierarchies.
    #[error("views {0:?} and {1:?} share no common ancestor")]
    NoCommonAncestor(ViewId, ViewId),

    /// Reparenting would make a view its own ancestor.
    #[error("view {0:?} cannot become a descendant of itself")]
    HierarchyCycle(ViewId),

    /// The view is too large to rasterize into a proxy.
    #[error("view {0:?} is too large to snapshot")]
    SnapshotTooLarge(ViewId),

    /// A transition was requested while another one is in flight.
    #[error("a transition is already in progress")]
    SessionActive,
}
