//! The stand-in view animated in place of the real anchors.
//!
//! While a zoom transition runs, neither screen's anchor view moves. A proxy
//! showing the source anchor's content is placed in the transition container
//! and everything visible happens to it. Removing the proxy ends its life; a
//! second removal is a no-op.

use std::sync::Arc;

use crate::animation::Animatable;
use crate::error::{Result, TransitionError};
use crate::geometry::{Point, Rect, Size};
use crate::transform::Transform;
use crate::view::{ContentMode, ViewContent, ViewId, ViewTree};

/// How the proxy's pixels were obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProxyKind {
    /// The anchor shows an image; the proxy shares the same buffer.
    Image,
    /// The anchor was rasterized into a new buffer.
    Snapshot,
}

/// Geometry of the proxy that the timeline interpolates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProxyPose {
    pub center: Point,
    pub size: Size,
    pub transform: Transform,
}

impl ProxyPose {
    /// Pose whose frame is exactly `frame` while carrying `transform`.
    pub fn framed(frame: Rect, transform: Transform) -> Self {
        let sx = transform.scale_x().max(f32::EPSILON);
        let sy = transform.scale_y().max(f32::EPSILON);
        Self {
            center: frame.center(),
            size: Size::new(frame.width / sx, frame.height / sy),
            transform,
        }
    }

    pub fn capture(views: &ViewTree, id: ViewId) -> Option<Self> {
        Some(Self {
            center: views.center(id)?,
            size: views.bounds(id)?.size(),
            transform: views.transform(id)?,
        })
    }

    pub fn apply(&self, views: &mut ViewTree, id: ViewId) {
        views.set_transform(id, self.transform);
        views.set_bounds_size(id, self.size);
        views.set_center(id, self.center);
    }

    /// Frame a view in this pose occupies in its parent.
    pub fn frame(&self) -> Rect {
        let to_parent = Transform::translate(self.center.x, self.center.y)
            .then(&self.transform)
            .then(&Transform::translate(
                -self.size.width / 2.0,
                -self.size.height / 2.0,
            ));
        to_parent.transform_rect(&Rect::from_size(self.size))
    }
}

impl Animatable for ProxyPose {
    fn lerp(from: &Self, to: &Self, t: f32) -> Self {
        Self {
            center: Point::lerp(&from.center, &to.center, t),
            size: Size::lerp(&from.size, &to.size, t),
            transform: Transform::lerp(&from.transform, &to.transform, t),
        }
    }
}

#[derive(Debug)]
pub struct ProxyView {
    id: ViewId,
    kind: ProxyKind,
    removed: bool,
}

impl ProxyView {
    /// Create a proxy for `source_anchor` and add it on top of `container`,
    /// clipped and positioned at `frame` (container coordinates).
    pub fn create(
        views: &mut ViewTree,
        source_anchor: ViewId,
        container: ViewId,
        frame: Rect,
    ) -> Result<Self> {
        let content = views
            .content(source_anchor)
            .ok_or(TransitionError::UnknownView(source_anchor))?;

        let (image, kind, mode) = match content {
            ViewContent::Image(image) => (
                Arc::clone(image),
                ProxyKind::Image,
                views.content_mode(source_anchor).unwrap_or_default(),
            ),
            ViewContent::Empty => {
                let snapshot = views
                    .snapshot(source_anchor)
                    .ok_or(TransitionError::SnapshotTooLarge(source_anchor))?;
                (Arc::new(snapshot), ProxyKind::Snapshot, ContentMode::Fill)
            }
        };

        let id = views.create_image_view(frame, image);
        views.set_clips_to_bounds(id, true);
        views.set_content_mode(id, mode);
        if let Err(err) = views.add_subview(container, id) {
            views.destroy(id);
            return Err(err);
        }

        log::debug!("created {:?} proxy {:?} at {:?}", kind, id, frame);
        Ok(Self {
            id,
            kind,
            removed: false,
        })
    }

    pub fn id(&self) -> ViewId {
        self.id
    }

    pub fn kind(&self) -> ProxyKind {
        self.kind
    }

    pub fn is_removed(&self) -> bool {
        self.removed
    }

    /// Take the proxy out of the hierarchy and free it. Returns whether this
    /// call did the removal.
    pub fn remove(&mut self, views: &mut ViewTree) -> bool {
        if self.removed {
            log::debug!("proxy {:?} already removed", self.id);
            return false;
        }
        views.destroy(self.id);
        self.removed = true;
        true
    }
}
