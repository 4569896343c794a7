//! A minimal navigation stack hosting a [`ZoomTransition`].
//!
//! [`NavigationStack`] owns the view tree, a full-size container view and a
//! stack of screens. Pushes and pops ask the engine first and fall back to
//! an immediate swap when it declines or cannot start. Pinch gestures on the
//! top screen are routed to the engine, and a pinch that begins a dismissal
//! pops the top screen interactively.

use std::time::Duration;

use crate::animation::Outcome;
use crate::error::{Result, TransitionError};
use crate::geometry::{Rect, Size};
use crate::gesture::{GesturePhase, PanGesture, PinchGesture, RotationGesture};
use crate::screen::{
    NavigationOperation, Screen, ScreenRole, TransitionAnchorProvider, TransitionContext,
};
use crate::transition::{PinchResponse, ZoomTransition};
use crate::view::{GestureMask, ViewId, ViewTree};

/// A screen that anchors zoom transitions on one of its views.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnchoredScreen {
    pub root: ViewId,
    pub anchor: Option<ViewId>,
}

impl AnchoredScreen {
    pub fn new(root: ViewId, anchor: ViewId) -> Self {
        Self {
            root,
            anchor: Some(anchor),
        }
    }
}

impl Screen for AnchoredScreen {
    fn view(&self) -> ViewId {
        self.root
    }

    fn anchor_provider(&self) -> Option<&dyn TransitionAnchorProvider> {
        Some(self)
    }
}

impl TransitionAnchorProvider for AnchoredScreen {
    fn view_for_transition(&self) -> Option<ViewId> {
        self.anchor
    }
}

/// A screen without an anchor; navigating to or from it never zooms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlainScreen {
    pub root: ViewId,
}

impl PlainScreen {
    pub fn new(root: ViewId) -> Self {
        Self { root }
    }
}

impl Screen for PlainScreen {
    fn view(&self) -> ViewId {
        self.root
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationResult {
    /// The zoom transition started; the stack changes once it completes.
    Animated,
    /// The stack changed right away.
    Immediate,
    /// Nothing happened.
    Ignored,
}

/// One finished navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Completion {
    pub operation: NavigationOperation,
    pub committed: bool,
    pub animated: bool,
}

struct InFlight {
    operation: NavigationOperation,
    /// Screen being pushed; `None` for pops.
    incoming: Option<Box<dyn Screen>>,
}

/// The engine's view of the stack during one transition.
struct StackContext<'a> {
    views: &'a mut ViewTree,
    container: ViewId,
    bounds: Rect,
    source: &'a dyn Screen,
    destination: &'a dyn Screen,
    interrupted: bool,
    completed: &'a mut Option<bool>,
}

impl<'a> StackContext<'a> {
    fn new(
        views: &'a mut ViewTree,
        container: ViewId,
        screens: &'a [Box<dyn Screen>],
        flight: &'a InFlight,
        interrupted: bool,
        completed: &'a mut Option<bool>,
    ) -> Option<Self> {
        let bounds = views.bounds(container)?;
        let source = screens.last()?.as_ref();
        let destination = match flight.operation {
            NavigationOperation::Push => flight.incoming.as_deref()?,
            NavigationOperation::Pop => screens.get(screens.len().checked_sub(2)?)?.as_ref(),
        };
        Some(Self {
            views,
            container,
            bounds,
            source,
            destination,
            interrupted,
            completed,
        })
    }
}

impl TransitionContext for StackContext<'_> {
    fn views(&self) -> &ViewTree {
        self.views
    }

    fn views_mut(&mut self) -> &mut ViewTree {
        self.views
    }

    fn container(&self) -> ViewId {
        self.container
    }

    fn screen(&self, role: ScreenRole) -> &dyn Screen {
        match role {
            ScreenRole::Source => self.source,
            ScreenRole::Destination => self.destination,
        }
    }

    fn final_frame(&self, _role: ScreenRole) -> Rect {
        self.bounds
    }

    fn transition_was_cancelled(&self) -> bool {
        self.interrupted
    }

    fn complete_transition(&mut self, committed: bool) {
        if self.completed.is_some() {
            log::error!("transition completed more than once");
        }
        *self.completed = Some(committed);
    }
}

pub struct NavigationStack {
    views: ViewTree,
    container: ViewId,
    screens: Vec<Box<dyn Screen>>,
    engine: ZoomTransition,
    in_flight: Option<InFlight>,
    interrupted: bool,
    history: Vec<Completion>,
}

impl NavigationStack {
    /// Create an empty stack displaying into a container of `size`.
    pub fn new(engine: ZoomTransition, size: Size) -> Self {
        let mut views = ViewTree::new();
        let container = views.create_view(Rect::from_size(size));
        Self {
            views,
            container,
            screens: Vec::new(),
            engine,
            in_flight: None,
            interrupted: false,
            history: Vec::new(),
        }
    }

    pub fn views(&self) -> &ViewTree {
        &self.views
    }

    /// Views for building screens. Do not restructure the container while a
    /// transition runs.
    pub fn views_mut(&mut self) -> &mut ViewTree {
        &mut self.views
    }

    pub fn container(&self) -> ViewId {
        self.container
    }

    pub fn engine(&self) -> &ZoomTransition {
        &self.engine
    }

    pub fn depth(&self) -> usize {
        self.screens.len()
    }

    pub fn top(&self) -> Option<&dyn Screen> {
        self.screens.last().map(|screen| screen.as_ref())
    }

    pub fn is_transitioning(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Finished navigations, oldest first.
    pub fn history(&self) -> &[Completion] {
        &self.history
    }

    pub fn push(&mut self, screen: Box<dyn Screen>) -> Result<NavigationResult> {
        if self.in_flight.is_some() {
            log::warn!("push ignored while a transition runs");
            return Ok(NavigationResult::Ignored);
        }
        let Some(top) = self.screens.last() else {
            self.show(screen.view())?;
            self.screens.push(screen);
            self.record(NavigationOperation::Push, true, false);
            return Ok(NavigationResult::Immediate);
        };

        let accepted = self
            .engine
            .animation_controller(NavigationOperation::Push, top.as_ref(), screen.as_ref())
            .is_some();
        let flight = InFlight {
            operation: NavigationOperation::Push,
            incoming: Some(screen),
        };
        if accepted && self.start(&flight) {
            self.in_flight = Some(flight);
            return Ok(NavigationResult::Animated);
        }

        let Some(screen) = flight.incoming else {
            return Ok(NavigationResult::Ignored);
        };
        if let Some(top) = self.screens.last() {
            self.views.remove_from_superview(top.view());
        }
        self.show(screen.view())?;
        self.screens.push(screen);
        self.record(NavigationOperation::Push, true, false);
        Ok(NavigationResult::Immediate)
    }

    pub fn pop(&mut self) -> Result<NavigationResult> {
        if self.in_flight.is_some() {
            log::warn!("pop ignored while a transition runs");
            return Ok(NavigationResult::Ignored);
        }
        let depth = self.screens.len();
        if depth < 2 {
            return Ok(NavigationResult::Ignored);
        }

        let accepted = self
            .engine
            .animation_controller(
                NavigationOperation::Pop,
                self.screens[depth - 1].as_ref(),
                self.screens[depth - 2].as_ref(),
            )
            .is_some();
        let flight = InFlight {
            operation: NavigationOperation::Pop,
            incoming: None,
        };
        if accepted && self.start(&flight) {
            self.in_flight = Some(flight);
            return Ok(NavigationResult::Animated);
        }

        if let Some(top) = self.screens.pop() {
            self.views.destroy(top.view());
        }
        if let Some(below) = self.screens.last().map(|screen| screen.view()) {
            self.show(below)?;
        }
        self.record(NavigationOperation::Pop, true, false);
        Ok(NavigationResult::Immediate)
    }

    /// Advance the running transition by one frame.
    pub fn tick(&mut self, dt: Duration) -> Option<Outcome> {
        let flight = self.in_flight.as_ref()?;
        let mut completed = None;
        let mut ctx = StackContext::new(
            &mut self.views,
            self.container,
            &self.screens,
            flight,
            self.interrupted,
            &mut completed,
        )?;
        let outcome = self.engine.tick(dt, &mut ctx)?;
        let committed = completed.unwrap_or(outcome.is_committed());
        self.finish(committed);
        Some(outcome)
    }

    /// Interrupt the running transition; it rolls back.
    pub fn interrupt(&mut self) -> bool {
        if self.in_flight.is_none() {
            return false;
        }
        log::info!("interrupting transition");
        self.interrupted = true;
        if self
            .engine
            .session()
            .is_some_and(|session| session.is_scrubbing())
        {
            self.engine
                .handle_pinch(&mut PinchGesture::cancelled(0.0), &mut self.views);
        }
        true
    }

    pub fn pinch(&mut self, gesture: &mut PinchGesture) -> PinchResponse {
        if gesture.phase == GesturePhase::Began
            && !self.top_accepts(GestureMask::PINCH)
        {
            return PinchResponse::Ignored;
        }
        let response = self.engine.handle_pinch(gesture, &mut self.views);
        if response != PinchResponse::BeginDismiss {
            return response;
        }
        match self.pop() {
            Ok(NavigationResult::Animated) => response,
            result => {
                if let Err(err) = result {
                    log::warn!("interactive dismissal failed: {}", err);
                }
                // No session; this clears the engine's interactive flag
                self.engine
                    .handle_pinch(&mut PinchGesture::cancelled(0.0), &mut self.views);
                PinchResponse::Ignored
            }
        }
    }

    pub fn rotate(&mut self, gesture: &mut RotationGesture) -> bool {
        self.engine.handle_rotation(gesture, &mut self.views)
    }

    pub fn pan(&mut self, gesture: &mut PanGesture) -> bool {
        self.engine.handle_pan(gesture, &mut self.views)
    }

    fn top_accepts(&self, gesture: GestureMask) -> bool {
        self.screens
            .last()
            .is_some_and(|screen| self.views.gestures(screen.view()).contains(gesture))
    }

    fn start(&mut self, flight: &InFlight) -> bool {
        let mut completed = None;
        let Some(mut ctx) = StackContext::new(
            &mut self.views,
            self.container,
            &self.screens,
            flight,
            false,
            &mut completed,
        ) else {
            return false;
        };
        match self.engine.start_transition(&mut ctx) {
            Ok(()) => true,
            Err(err) => {
                log::info!("falling back to an immediate transition: {}", err);
                false
            }
        }
    }

    fn show(&mut self, root: ViewId) -> Result<()> {
        let bounds = self
            .views
            .bounds(self.container)
            .ok_or(TransitionError::UnknownView(self.container))?;
        self.views.set_frame(root, bounds);
        self.views.add_subview(self.container, root)
    }

    fn finish(&mut self, committed: bool) {
        self.interrupted = false;
        let Some(flight) = self.in_flight.take() else {
            return;
        };
        match (flight.operation, committed) {
            (NavigationOperation::Push, true) => {
                if let Some(previous) = self.screens.last() {
                    self.views.remove_from_superview(previous.view());
                }
                if let Some(screen) = flight.incoming {
                    self.screens.push(screen);
                }
            }
            (NavigationOperation::Push, false) => {
                if let Some(screen) = flight.incoming {
                    self.views.destroy(screen.view());
                }
            }
            (NavigationOperation::Pop, true) => {
                if let Some(screen) = self.screens.pop() {
                    self.views.destroy(screen.view());
                }
            }
            (NavigationOperation::Pop, false) => {}
        }
        self.record(flight.operation, committed, true);
    }

    fn record(&mut self, operation: NavigationOperation, committed: bool, animated: bool) {
        log::debug!(
            "{:?} {} ({})",
            operation,
            if committed { "committed" } else { "cancelled" },
            if animated { "animated" } else { "immediate" }
        );
        self.history.push(Completion {
            operation,
            committed,
            animated,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stack() -> NavigationStack {
        NavigationStack::new(ZoomTransition::new(), Size::new(320.0, 640.0))
    }

    fn screen(stack: &mut NavigationStack, anchor: Rect) -> AnchoredScreen {
        let views = stack.views_mut();
        let root = views.create_view(Rect::new(0.0, 0.0, 320.0, 640.0));
        let anchor_view = views.create_view(anchor);
        views.add_subview(root, anchor_view).unwrap();
        AnchoredScreen::new(root, anchor_view)
    }

    #[test]
    fn test_first_push_is_immediate() {
        let mut stack = stack();
        let grid = screen(&mut stack, Rect::new(10.0, 10.0, 100.0, 100.0));
        assert_eq!(
            stack.push(Box::new(grid)).unwrap(),
            NavigationResult::Immediate
        );
        assert_eq!(stack.depth(), 1);
        assert_eq!(stack.views().subviews(stack.container()), &[grid.root]);
    }

    #[test]
    fn test_plain_screen_falls_back() {
        let mut stack = stack();
        let grid = screen(&mut stack, Rect::new(10.0, 10.0, 100.0, 100.0));
        stack.push(Box::new(grid)).unwrap();
        let root = stack.views_mut().create_view(Rect::new(0.0, 0.0, 1.0, 1.0));

        assert_eq!(
            stack.push(Box::new(PlainScreen::new(root))).unwrap(),
            NavigationResult::Immediate
        );
        assert_eq!(stack.depth(), 2);
        assert_eq!(stack.views().subviews(stack.container()), &[root]);
        assert_eq!(
            stack.views().frame(root),
            Some(Rect::new(0.0, 0.0, 320.0, 640.0))
        );
        assert!(!stack.is_transitioning());
    }

    #[test]
    fn test_navigation_during_transition_is_ignored() {
        let mut stack = stack();
        let grid = screen(&mut stack, Rect::new(10.0, 10.0, 100.0, 100.0));
        let detail = screen(&mut stack, Rect::new(0.0, 100.0, 320.0, 320.0));
        let other = screen(&mut stack, Rect::new(0.0, 0.0, 50.0, 50.0));
        stack.push(Box::new(grid)).unwrap();
        assert_eq!(
            stack.push(Box::new(detail)).unwrap(),
            NavigationResult::Animated
        );
        assert_eq!(
            stack.push(Box::new(other)).unwrap(),
            NavigationResult::Ignored
        );
        assert_eq!(stack.pop().unwrap(), NavigationResult::Ignored);
    }

    #[test]
    fn test_pop_of_single_screen_is_ignored() {
        let mut stack = stack();
        let grid = screen(&mut stack, Rect::new(10.0, 10.0, 100.0, 100.0));
        stack.push(Box::new(grid)).unwrap();
        assert_eq!(stack.pop().unwrap(), NavigationResult::Ignored);
        assert_eq!(stack.depth(), 1);
    }
}
