//! State of one in-flight zoom transition.
//!
//! A [`TransitionSession`] is built by [`SessionBuilder`], which checks every
//! precondition (both anchors present and attached, shared container) before
//! touching the hierarchy, so a rejected request leaves no trace. The
//! session's anchor rectangles are measured once, in container coordinates,
//! and never change afterwards.

use crate::animation::{Animatable, Timeline};
use crate::error::{Result, TransitionError};
use crate::geometry::{Point, Rect, Size};
use crate::gesture::GestureInterpreter;
use crate::proxy::{ProxyPose, ProxyView};
use crate::screen::{anchor_view, NavigationOperation, ScreenRole, TransitionContext};
use crate::transform::Transform;
use crate::view::{ViewId, ViewTree};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Zooming from a thumbnail into the full-size view.
    Presenting,
    /// Zooming from the full-size view back into the thumbnail.
    Dismissing,
}

impl Direction {
    pub fn reversed(self) -> Self {
        match self {
            Direction::Presenting => Direction::Dismissing,
            Direction::Dismissing => Direction::Presenting,
        }
    }
}

impl From<NavigationOperation> for Direction {
    fn from(operation: NavigationOperation) -> Self {
        match operation {
            NavigationOperation::Push => Direction::Presenting,
            NavigationOperation::Pop => Direction::Dismissing,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Runs to completion on its own.
    Animated,
    /// Progress follows a pinch gesture.
    Interactive,
}

/// Views taking part in a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionViews {
    pub container: ViewId,
    pub source_root: ViewId,
    pub destination_root: ViewId,
    pub source_anchor: ViewId,
    pub destination_anchor: ViewId,
}

impl SessionViews {
    /// Resolve and validate the participants without mutating anything.
    pub fn resolve(ctx: &dyn TransitionContext) -> Result<Self> {
        let views = ctx.views();
        let container = ctx.container();
        if !views.contains(container) {
            return Err(TransitionError::UnknownView(container));
        }

        let resolve_screen = |role: ScreenRole| -> Result<(ViewId, ViewId)> {
            let screen = ctx.screen(role);
            if screen.anchor_provider().is_none() {
                return Err(TransitionError::NotAnchorProvider(role));
            }
            let root = screen.view();
            if !views.contains(root) {
                return Err(TransitionError::UnknownView(root));
            }
            let anchor = anchor_view(screen)
                .filter(|&anchor| anchor == root || views.is_descendant_of(anchor, root))
                .ok_or(TransitionError::MissingAnchor(role))?;
            Ok((root, anchor))
        };

        let (source_root, source_anchor) = resolve_screen(ScreenRole::Source)?;
        let (destination_root, destination_anchor) = resolve_screen(ScreenRole::Destination)?;
        Ok(Self {
            container,
            source_root,
            destination_root,
            source_anchor,
            destination_anchor,
        })
    }
}

/// Everything the timeline moves in one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Keyframe {
    /// Proxy geometry, or `None` while a gesture owns it.
    pub proxy: Option<ProxyPose>,
    pub source_alpha: f32,
    pub destination_alpha: f32,
}

impl Animatable for Keyframe {
    fn lerp(from: &Self, to: &Self, t: f32) -> Self {
        let proxy = match (&from.proxy, &to.proxy) {
            (Some(a), Some(b)) => Some(ProxyPose::lerp(a, b, t)),
            (a, _) => *a,
        };
        Self {
            proxy,
            source_alpha: f32::lerp(&from.source_alpha, &to.source_alpha, t),
            destination_alpha: f32::lerp(&from.destination_alpha, &to.destination_alpha, t),
        }
    }
}

pub struct TransitionSession {
    direction: Direction,
    mode: Mode,
    views: SessionViews,
    source_rect: Rect,
    destination_rect: Rect,
    proxy: ProxyView,
    interpreter: GestureInterpreter,
    pub(crate) timeline: Option<Timeline<Keyframe>>,
    percent: f32,
    cancelled: bool,
    closed: bool,
}

impl TransitionSession {
    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn views(&self) -> &SessionViews {
        &self.views
    }

    /// Source anchor bounds in container coordinates.
    pub fn source_rect(&self) -> Rect {
        self.source_rect
    }

    /// Destination anchor bounds in container coordinates.
    pub fn destination_rect(&self) -> Rect {
        self.destination_rect
    }

    pub fn proxy(&self) -> &ProxyView {
        &self.proxy
    }

    pub(crate) fn proxy_mut(&mut self) -> &mut ProxyView {
        &mut self.proxy
    }

    pub fn interpreter(&self) -> &GestureInterpreter {
        &self.interpreter
    }

    pub(crate) fn interpreter_mut(&mut self) -> &mut GestureInterpreter {
        &mut self.interpreter
    }

    /// Last scrubbed percentage.
    pub fn percent(&self) -> f32 {
        self.percent
    }

    pub(crate) fn set_percent(&mut self, percent: f32) {
        self.percent = percent;
    }

    pub fn should_complete(&self) -> bool {
        self.interpreter.should_complete()
    }

    /// Whether the transition has been asked to roll back.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    pub(crate) fn set_cancelled(&mut self, cancelled: bool) {
        self.cancelled = cancelled;
    }

    /// A closed session accepts no further mutation.
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub(crate) fn close(&mut self) {
        self.closed = true;
    }

    /// Whether the gesture still drives the transition (no settle animation yet).
    pub fn is_scrubbing(&self) -> bool {
        self.mode == Mode::Interactive
            && self.timeline.as_ref().is_some_and(|t| t.is_scrubbed())
    }

    /// Snapshot of what the timeline would be animating right now.
    pub fn current_keyframe(&self, views: &ViewTree) -> Keyframe {
        Keyframe {
            proxy: ProxyPose::capture(views, self.proxy.id()),
            source_alpha: views.alpha(self.views.source_root).unwrap_or(1.0),
            destination_alpha: views.alpha(self.views.destination_root).unwrap_or(1.0),
        }
    }

    pub fn apply(&self, keyframe: &Keyframe, views: &mut ViewTree) {
        if let Some(pose) = &keyframe.proxy {
            pose.apply(views, self.proxy.id());
        }
        views.set_alpha(self.views.source_root, keyframe.source_alpha);
        views.set_alpha(self.views.destination_root, keyframe.destination_alpha);
    }
}

/// Validating constructor for [`TransitionSession`].
pub struct SessionBuilder {
    direction: Direction,
    mode: Mode,
}

impl SessionBuilder {
    pub fn new(direction: Direction) -> Self {
        Self {
            direction,
            mode: Mode::Animated,
        }
    }

    pub fn mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }

    /// Place the destination screen, measure both anchors, create the proxy
    /// and set the starting visibility.
    ///
    /// Fails without side effects when a participant is missing.
    pub fn build(self, ctx: &mut dyn TransitionContext) -> Result<TransitionSession> {
        let participants = SessionViews::resolve(ctx)?;
        let destination_frame = ctx.final_frame(ScreenRole::Destination);
        let views = ctx.views_mut();
        let SessionViews {
            container,
            source_root,
            destination_root,
            source_anchor,
            destination_anchor,
        } = participants;

        // The source screen is normally already on display in the container
        let source_was_placed = views.superview(source_root) == Some(container);
        let previous_source = if source_was_placed {
            None
        } else {
            let previous = Placement::capture(views, source_root);
            views.add_subview(container, source_root)?;
            previous
        };

        let previous_destination = Placement::capture(views, destination_root);
        let placed = place_destination(views, &participants, self.direction, destination_frame)
            .and_then(|()| {
                let source_rect = measure(views, source_anchor, container)?;
                let destination_rect = measure(views, destination_anchor, container)?;
                Ok((source_rect, destination_rect))
            })
            .and_then(|(source_rect, destination_rect)| {
                ProxyView::create(views, source_anchor, container, source_rect)
                    .map(|proxy| (source_rect, destination_rect, proxy))
            });

        let (source_rect, destination_rect, proxy) = match placed {
            Ok(placed) => placed,
            Err(err) => {
                if let Some(previous) = previous_destination {
                    previous.restore(views, destination_root);
                }
                if let Some(previous) = previous_source {
                    previous.restore(views, source_root);
                }
                return Err(err);
            }
        };

        match self.direction {
            Direction::Presenting => {
                views.set_alpha(destination_root, 0.0);
            }
            Direction::Dismissing => {
                if let Some(mode) = views.content_mode(destination_anchor) {
                    views.set_content_mode(proxy.id(), mode);
                }
                views.set_alpha(destination_root, 1.0);
            }
        }
        views.set_hidden(destination_anchor, true);
        views.set_alpha(source_anchor, 0.0);

        log::debug!(
            "session {:?}/{:?}: {:?} -> {:?}",
            self.direction,
            self.mode,
            source_rect,
            destination_rect
        );

        Ok(TransitionSession {
            direction: self.direction,
            mode: self.mode,
            views: participants,
            source_rect,
            destination_rect,
            interpreter: GestureInterpreter::new(source_rect.width),
            proxy,
            timeline: None,
            percent: 0.0,
            cancelled: false,
            closed: false,
        })
    }
}

/// Where a view sat before the builder moved it.
struct Placement {
    center: Point,
    size: Size,
    transform: Transform,
    superview: Option<ViewId>,
    /// Sibling drawn directly above the view, if any.
    above: Option<ViewId>,
}

impl Placement {
    fn capture(views: &ViewTree, id: ViewId) -> Option<Self> {
        let superview = views.superview(id);
        let above = superview.and_then(|parent| {
            let siblings = views.subviews(parent);
            let index = siblings.iter().position(|&sibling| sibling == id)?;
            siblings.get(index + 1).copied()
        });
        Some(Self {
            center: views.center(id)?,
            size: views.bounds(id)?.size(),
            transform: views.transform(id)?,
            superview,
            above,
        })
    }

    fn restore(&self, views: &mut ViewTree, id: ViewId) {
        views.set_transform(id, self.transform);
        views.set_bounds_size(id, self.size);
        views.set_center(id, self.center);

        views.remove_from_superview(id);
        let Some(parent) = self.superview else {
            return;
        };
        let restored = match self.above {
            Some(above) => views.insert_subview_below(parent, id, above),
            None => views.add_subview(parent, id),
        };
        if let Err(err) = restored {
            log::warn!("could not return {:?} to {:?}: {}", id, parent, err);
        }
    }
}

fn place_destination(
    views: &mut ViewTree,
    participants: &SessionViews,
    direction: Direction,
    frame: Rect,
) -> Result<()> {
    // Lay out before measuring the anchor inside it
    views.set_transform(participants.destination_root, Transform::IDENTITY);
    views.set_frame(participants.destination_root, frame);
    match direction {
        Direction::Presenting => views.add_subview(participants.container, participants.destination_root),
        Direction::Dismissing => views.insert_subview_below(
            participants.container,
            participants.destination_root,
            participants.source_root,
        ),
    }
}

fn measure(views: &ViewTree, anchor: ViewId, container: ViewId) -> Result<Rect> {
    let bounds = views
        .bounds(anchor)
        .ok_or(TransitionError::UnknownView(anchor))?;
    views.convert_rect(bounds, anchor, container)
}
