//! Arena-backed view hierarchy.
//!
//! The [`ViewTree`] is the small slice of a layout system the zoom transition
//! needs: every view has a position (`center`), a size (`bounds`), a transform
//! applied around its center, opacity, a hidden flag and optional image
//! content. Views live in one arena and are addressed by generational
//! [`ViewId`]s, so a handle to a destroyed view never aliases a new one.
//!
//! Subviews are stored back-to-front: the last child draws on top.

use std::sync::Arc;

use bitflags::bitflags;
use image::{imageops, Rgba, RgbaImage};

use crate::error::{Result, TransitionError};
use crate::geometry::{convert_rect, Point, Rect, Size};
use crate::transform::Transform;

/// Largest canvas `ViewTree::snapshot` allocates, in pixels (4096 x 4096).
pub const MAX_SNAPSHOT_PIXELS: u64 = 4096 * 4096;

bitflags! {
    /// Gesture recognizers attached to a view.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
    pub struct GestureMask: u8 {
        const PINCH    = 0b001;
        const ROTATION = 0b010;
        const PAN      = 0b100;
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub const fn from_hex(hex: u32) -> Self {
        Self {
            r: ((hex >> 16) & 0xFF) as f32 / 255.0,
            g: ((hex >> 8) & 0xFF) as f32 / 255.0,
            b: (hex & 0xFF) as f32 / 255.0,
            a: 1.0,
        }
    }

    pub fn to_rgba8(self) -> Rgba<u8> {
        let channel = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        Rgba([
            channel(self.r),
            channel(self.g),
            channel(self.b),
            channel(self.a),
        ])
    }

    pub const WHITE: Color = Color::rgb(1.0, 1.0, 1.0);
    pub const BLACK: Color = Color::rgb(0.0, 0.0, 0.0);
    pub const TRANSPARENT: Color = Color::rgba(0.0, 0.0, 0.0, 0.0);
}

impl Default for Color {
    fn default() -> Self {
        Self::TRANSPARENT
    }
}

/// How image content is laid out within a view's bounds.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum ContentMode {
    /// Stretch to exactly fill bounds, ignoring aspect ratio.
    #[default]
    Fill,
    /// Scale to fit within bounds while preserving aspect ratio.
    Contain,
    /// Scale to cover bounds while preserving aspect ratio.
    /// May crop the image.
    Cover,
    /// Use the image's intrinsic size, centered in the bounds.
    Center,
}

impl ContentMode {
    /// Where an image of `content` size lands inside `bounds`.
    pub fn fitted_rect(self, content: Size, bounds: Rect) -> Rect {
        if content.width <= 0.0 || content.height <= 0.0 {
            return bounds;
        }
        let size = match self {
            ContentMode::Fill => return bounds,
            ContentMode::Center => content,
            ContentMode::Contain | ContentMode::Cover => {
                let sx = bounds.width / content.width;
                let sy = bounds.height / content.height;
                let s = if self == ContentMode::Contain {
                    sx.min(sy)
                } else {
                    sx.max(sy)
                };
                Size::new(content.width * s, content.height * s)
            }
        };
        Rect::centered(bounds.center(), size)
    }
}

/// What a view draws besides its background color.
#[derive(Debug, Clone, Default)]
pub enum ViewContent {
    #[default]
    Empty,
    /// Decoded image shared between views.
    Image(Arc<RgbaImage>),
}

/// Handle to a view in a [`ViewTree`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct ViewId {
    index: u32,
    generation: u32,
}

#[derive(Debug, Clone)]
struct Node {
    parent: Option<ViewId>,
    children: Vec<ViewId>,
    center: Point,
    size: Size,
    transform: Transform,
    alpha: f32,
    hidden: bool,
    clips_to_bounds: bool,
    background: Color,
    content: ViewContent,
    content_mode: ContentMode,
    gestures: GestureMask,
}

impl Node {
    fn new(frame: Rect) -> Self {
        Self {
            parent: None,
            children: Vec::new(),
            center: frame.center(),
            size: frame.size(),
            transform: Transform::IDENTITY,
            alpha: 1.0,
            hidden: false,
            clips_to_bounds: false,
            background: Color::TRANSPARENT,
            content: ViewContent::Empty,
            content_mode: ContentMode::default(),
            gestures: GestureMask::empty(),
        }
    }

    fn bounds(&self) -> Rect {
        Rect::from_size(self.size)
    }

    /// Local bounds space to the parent's space, pivoting on the center.
    fn local_to_parent(&self) -> Transform {
        Transform::translate(self.center.x, self.center.y)
            .then(&self.transform)
            .then(&Transform::translate(
                -self.size.width / 2.0,
                -self.size.height / 2.0,
            ))
    }

    fn frame(&self) -> Rect {
        self.local_to_parent().transform_rect(&self.bounds())
    }
}

struct Slot {
    generation: u32,
    node: Option<Node>,
}

/// Owner of all views taking part in a transition.
#[derive(Default)]
pub struct ViewTree {
    slots: Vec<Slot>,
    free_indices: Vec<u32>,
}

impl ViewTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a detached view occupying `frame` in its future parent's space.
    pub fn create_view(&mut self, frame: Rect) -> ViewId {
        self.insert_node(Node::new(frame))
    }

    /// Create a detached view showing `image`.
    pub fn create_image_view(&mut self, frame: Rect, image: Arc<RgbaImage>) -> ViewId {
        let mut node = Node::new(frame);
        node.content = ViewContent::Image(image);
        self.insert_node(node)
    }

    fn insert_node(&mut self, node: Node) -> ViewId {
        if let Some(index) = self.free_indices.pop() {
            let slot = &mut self.slots[index as usize];
            slot.generation = slot.generation.wrapping_add(1);
            slot.node = Some(node);
            ViewId {
                index,
                generation: slot.generation,
            }
        } else {
            let index = self.slots.len() as u32;
            self.slots.push(Slot {
                generation: 0,
                node: Some(node),
            });
            ViewId {
                index,
                generation: 0,
            }
        }
    }

    fn node(&self, id: ViewId) -> Option<&Node> {
        self.slots
            .get(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.node.as_ref())
    }

    fn node_mut(&mut self, id: ViewId) -> Option<&mut Node> {
        self.slots
            .get_mut(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.node.as_mut())
    }

    fn require(&self, id: ViewId) -> Result<&Node> {
        self.node(id).ok_or(TransitionError::UnknownView(id))
    }

    pub fn contains(&self, id: ViewId) -> bool {
        self.node(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.node.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Destroy a view and its whole subtree. Stale ids are ignored.
    pub fn destroy(&mut self, id: ViewId) {
        if !self.contains(id) {
            return;
        }
        self.remove_from_superview(id);

        let mut pending = vec![id];
        while let Some(current) = pending.pop() {
            let slot = &mut self.slots[current.index as usize];
            if let Some(node) = slot.node.take() {
                pending.extend(node.children);
                self.free_indices.push(current.index);
            }
        }
    }

    // Hierarchy

    pub fn superview(&self, id: ViewId) -> Option<ViewId> {
        self.node(id).and_then(|n| n.parent)
    }

    pub fn subviews(&self, id: ViewId) -> &[ViewId] {
        self.node(id).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    /// Topmost ancestor of `id` (the view itself when detached).
    pub fn root_of(&self, id: ViewId) -> Option<ViewId> {
        let mut current = id;
        let mut node = self.node(id)?;
        while let Some(parent) = node.parent {
            current = parent;
            node = self.node(parent)?;
        }
        Some(current)
    }

    pub fn is_descendant_of(&self, id: ViewId, ancestor: ViewId) -> bool {
        let mut current = self.superview(id);
        while let Some(parent) = current {
            if parent == ancestor {
                return true;
            }
            current = self.superview(parent);
        }
        false
    }

    /// Append `child` to `parent`, on top of its siblings. A child that
    /// already has a parent is moved.
    pub fn add_subview(&mut self, parent: ViewId, child: ViewId) -> Result<()> {
        self.prepare_reparent(parent, child)?;
        if let Some(node) = self.node_mut(parent) {
            node.children.push(child);
        }
        Ok(())
    }

    /// Insert `child` into `parent` directly below `sibling`. When `sibling`
    /// is not a subview of `parent` the child goes on top.
    pub fn insert_subview_below(
        &mut self,
        parent: ViewId,
        child: ViewId,
        sibling: ViewId,
    ) -> Result<()> {
        self.prepare_reparent(parent, child)?;
        if let Some(node) = self.node_mut(parent) {
            match node.children.iter().position(|&c| c == sibling) {
                Some(position) => node.children.insert(position, child),
                None => node.children.push(child),
            }
        }
        Ok(())
    }

    fn prepare_reparent(&mut self, parent: ViewId, child: ViewId) -> Result<()> {
        self.require(parent)?;
        self.require(child)?;
        if parent == child || self.is_descendant_of(parent, child) {
            return Err(TransitionError::HierarchyCycle(child));
        }
        self.remove_from_superview(child);
        if let Some(node) = self.node_mut(child) {
            node.parent = Some(parent);
        }
        Ok(())
    }

    /// Detach a view from its parent. No-op for detached or stale views.
    pub fn remove_from_superview(&mut self, id: ViewId) {
        let Some(parent) = self.superview(id) else {
            return;
        };
        if let Some(node) = self.node_mut(parent) {
            node.children.retain(|&c| c != id);
        }
        if let Some(node) = self.node_mut(id) {
            node.parent = None;
        }
    }

    // Geometry

    pub fn bounds(&self, id: ViewId) -> Option<Rect> {
        self.node(id).map(Node::bounds)
    }

    /// Axis-aligned frame in the parent's space. For rotated views this is
    /// the bounding box of the rotated bounds.
    pub fn frame(&self, id: ViewId) -> Option<Rect> {
        self.node(id).map(Node::frame)
    }

    /// Position the view so its frame becomes `frame`. The current transform
    /// is kept; its scale is divided out of the new bounds size.
    pub fn set_frame(&mut self, id: ViewId, frame: Rect) {
        if let Some(node) = self.node_mut(id) {
            node.center = frame.center();
            node.size = if node.transform.is_identity() {
                frame.size()
            } else {
                let sx = node.transform.scale_x().max(f32::EPSILON);
                let sy = node.transform.scale_y().max(f32::EPSILON);
                Size::new(frame.width / sx, frame.height / sy)
            };
        }
    }

    pub fn center(&self, id: ViewId) -> Option<Point> {
        self.node(id).map(|n| n.center)
    }

    pub fn set_center(&mut self, id: ViewId, center: Point) {
        if let Some(node) = self.node_mut(id) {
            node.center = center;
        }
    }

    pub fn set_bounds_size(&mut self, id: ViewId, size: Size) {
        if let Some(node) = self.node_mut(id) {
            node.size = size;
        }
    }

    pub fn transform(&self, id: ViewId) -> Option<Transform> {
        self.node(id).map(|n| n.transform)
    }

    pub fn set_transform(&mut self, id: ViewId, transform: Transform) {
        if let Some(node) = self.node_mut(id) {
            node.transform = transform;
        }
    }

    /// Transform from the view's bounds space into its topmost ancestor's
    /// space.
    pub fn local_to_root(&self, id: ViewId) -> Option<Transform> {
        let mut node = self.node(id)?;
        let mut transform = node.local_to_parent();
        while let Some(parent) = node.parent {
            node = self.node(parent)?;
            transform = node.local_to_parent().then(&transform);
        }
        Some(transform)
    }

    /// Express `rect`, given in `from`'s bounds space, in `to`'s bounds
    /// space. Both views must share a root.
    pub fn convert_rect(&self, rect: Rect, from: ViewId, to: ViewId) -> Result<Rect> {
        let from_root = self.root_of(from).ok_or(TransitionError::UnknownView(from))?;
        let to_root = self.root_of(to).ok_or(TransitionError::UnknownView(to))?;
        if from_root != to_root {
            return Err(TransitionError::NoCommonAncestor(from, to));
        }
        let from_to_root = self
            .local_to_root(from)
            .ok_or(TransitionError::UnknownView(from))?;
        let to_to_root = self
            .local_to_root(to)
            .ok_or(TransitionError::UnknownView(to))?;
        Ok(convert_rect(rect, &from_to_root, &to_to_root))
    }

    // Appearance

    pub fn alpha(&self, id: ViewId) -> Option<f32> {
        self.node(id).map(|n| n.alpha)
    }

    pub fn set_alpha(&mut self, id: ViewId, alpha: f32) {
        if let Some(node) = self.node_mut(id) {
            node.alpha = alpha.clamp(0.0, 1.0);
        }
    }

    pub fn is_hidden(&self, id: ViewId) -> Option<bool> {
        self.node(id).map(|n| n.hidden)
    }

    pub fn set_hidden(&mut self, id: ViewId, hidden: bool) {
        if let Some(node) = self.node_mut(id) {
            node.hidden = hidden;
        }
    }

    pub fn clips_to_bounds(&self, id: ViewId) -> Option<bool> {
        self.node(id).map(|n| n.clips_to_bounds)
    }

    pub fn set_clips_to_bounds(&mut self, id: ViewId, clips: bool) {
        if let Some(node) = self.node_mut(id) {
            node.clips_to_bounds = clips;
        }
    }

    pub fn background(&self, id: ViewId) -> Option<Color> {
        self.node(id).map(|n| n.background)
    }

    pub fn set_background(&mut self, id: ViewId, color: Color) {
        if let Some(node) = self.node_mut(id) {
            node.background = color;
        }
    }

    pub fn content(&self, id: ViewId) -> Option<&ViewContent> {
        self.node(id).map(|n| &n.content)
    }

    pub fn set_content(&mut self, id: ViewId, content: ViewContent) {
        if let Some(node) = self.node_mut(id) {
            node.content = content;
        }
    }

    pub fn content_mode(&self, id: ViewId) -> Option<ContentMode> {
        self.node(id).map(|n| n.content_mode)
    }

    pub fn set_content_mode(&mut self, id: ViewId, mode: ContentMode) {
        if let Some(node) = self.node_mut(id) {
            node.content_mode = mode;
        }
    }

    // Gestures

    pub fn gestures(&self, id: ViewId) -> GestureMask {
        self.node(id).map(|n| n.gestures).unwrap_or_default()
    }

    pub fn attach_gestures(&mut self, id: ViewId, gestures: GestureMask) {
        if let Some(node) = self.node_mut(id) {
            node.gestures |= gestures;
        }
    }

    // Rendering

    /// Rasterize the view's current appearance at its bounds size: background,
    /// image content and visible subviews. The view's own alpha and transform
    /// are not applied.
    ///
    /// Returns `None` when the bounds exceed [`MAX_SNAPSHOT_PIXELS`]; oversized
    /// subviews are skipped.
    pub fn snapshot(&self, id: ViewId) -> Option<RgbaImage> {
        let node = self.node(id)?;
        let width = node.size.width.round().max(1.0) as u32;
        let height = node.size.height.round().max(1.0) as u32;
        if width as u64 * height as u64 > MAX_SNAPSHOT_PIXELS {
            log::warn!("snapshot of {:?} skipped: {}x{} px", id, width, height);
            return None;
        }
        let mut canvas = RgbaImage::from_pixel(width, height, node.background.to_rgba8());

        if let ViewContent::Image(image) = &node.content {
            let content = Size::new(image.width() as f32, image.height() as f32);
            let target = node.content_mode.fitted_rect(content, node.bounds());
            draw_scaled(&mut canvas, image, target);
        }

        for &child in &node.children {
            let Some(child_node) = self.node(child) else {
                continue;
            };
            if child_node.hidden || child_node.alpha <= 0.0 {
                continue;
            }
            if let Some(mut layer) = self.snapshot(child) {
                if child_node.alpha < 1.0 {
                    fade(&mut layer, child_node.alpha);
                }
                draw_scaled(&mut canvas, &layer, child_node.frame());
            }
        }

        Some(canvas)
    }
}

fn draw_scaled(canvas: &mut RgbaImage, layer: &RgbaImage, target: Rect) {
    let width = target.width.round().max(1.0) as u32;
    let height = target.height.round().max(1.0) as u32;
    if width == layer.width() && height == layer.height() {
        imageops::overlay(canvas, layer, target.x.round() as i64, target.y.round() as i64);
    } else {
        let scaled = imageops::resize(layer, width, height, imageops::FilterType::Triangle);
        imageops::overlay(canvas, &scaled, target.x.round() as i64, target.y.round() as i64);
    }
}

fn fade(layer: &mut RgbaImage, alpha: f32) {
    for pixel in layer.pixels_mut() {
        pixel[3] = (pixel[3] as f32 * alpha).round() as u8;
    }
}
