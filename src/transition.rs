//! The zoom transition state machine.
//!
//! ```text
//! Idle -> Preparing -> AnimatingNonInteractive -> Committed | Cancelled -> Idle
//!                   -> AnimatingInteractive    -> Committed | Cancelled -> Idle
//! ```
//!
//! The hosting layer asks [`ZoomTransition::animation_controller`] whether
//! the engine handles a navigation, then starts it with
//! [`ZoomTransition::start_transition`] and feeds frames through
//! [`ZoomTransition::tick`]. A pinch on a presented screen flips the engine
//! into interactive mode and asks the host to pop; the pop then follows the
//! fingers until release.
//!
//! Every session reports its outcome through
//! [`TransitionContext::complete_transition`] exactly once. Teardown is
//! idempotent: it runs on the first terminal event and ignores the rest.

use std::time::Duration;

use crate::animation::{Outcome, Timeline, TimelineStatus};
use crate::error::{Result, TransitionError};
use crate::gesture::{GesturePhase, PanGesture, PinchGesture, RotationGesture};
use crate::proxy::ProxyPose;
use crate::screen::{anchor_view, NavigationOperation, Screen, TransitionContext};
use crate::session::{Direction, Keyframe, Mode, SessionBuilder, TransitionSession};
use crate::transform::Transform;
use crate::view::{GestureMask, ViewTree};
use crate::TransitionConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionState {
    /// No session.
    Idle,
    /// Validating participants and setting up the proxy.
    Preparing,
    /// Running to completion on its own.
    AnimatingNonInteractive,
    /// Following a pinch gesture, or settling after its release.
    AnimatingInteractive,
    /// Tearing down after the navigation took effect.
    Committed,
    /// Tearing down after rolling back.
    Cancelled,
}

/// What the engine did with a pinch update.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PinchResponse {
    /// Nothing to do with this gesture.
    Ignored,
    /// The engine is now interactive; the host should pop the top screen.
    BeginDismiss,
    /// The proxy followed the fingers.
    Updated { percent: f32, should_complete: bool },
    /// The gesture ended and the transition is settling toward `Outcome`.
    Settling(Outcome),
}

pub struct ZoomTransition {
    config: TransitionConfig,
    state: TransitionState,
    interactive: bool,
    /// Direction accepted by the last `animation_controller` call.
    pending: Option<Direction>,
    next_direction: Direction,
    session: Option<TransitionSession>,
    last_outcome: Option<Outcome>,
}

impl ZoomTransition {
    pub fn new() -> Self {
        Self::with_config(TransitionConfig::default())
    }

    pub fn with_config(config: TransitionConfig) -> Self {
        Self {
            config,
            state: TransitionState::Idle,
            interactive: false,
            pending: None,
            next_direction: Direction::Presenting,
            session: None,
            last_outcome: None,
        }
    }

    pub fn allows_interactive_gesture(mut self, allows: bool) -> Self {
        self.config.allows_interactive_gesture = allows;
        self
    }

    pub fn animated_duration(mut self, duration: Duration) -> Self {
        self.config.animated_duration = duration;
        self
    }

    pub fn interactive_duration(mut self, duration: Duration) -> Self {
        self.config.interactive_duration = duration;
        self
    }

    pub fn config(&self) -> &TransitionConfig {
        &self.config
    }

    pub fn state(&self) -> TransitionState {
        self.state
    }

    pub fn is_interactive(&self) -> bool {
        self.interactive
    }

    /// Direction a fresh request defaults to: the reverse of the last
    /// committed transition, or the same direction after a cancel.
    pub fn next_direction(&self) -> Direction {
        self.next_direction
    }

    pub fn session(&self) -> Option<&TransitionSession> {
        self.session.as_ref()
    }

    pub fn last_outcome(&self) -> Option<Outcome> {
        self.last_outcome
    }

    pub fn transition_duration(&self) -> Duration {
        if self.interactive {
            self.config.interactive_duration
        } else {
            self.config.animated_duration
        }
    }

    /// Accept or decline animating `operation` from `from` to `to`.
    ///
    /// Both screens must provide an anchor view. Returns `None` while another
    /// transition is in flight.
    pub fn animation_controller(
        &mut self,
        operation: NavigationOperation,
        from: &dyn Screen,
        to: &dyn Screen,
    ) -> Option<&mut Self> {
        if self.session.is_some() {
            log::warn!("declining {:?}: a transition is already running", operation);
            return None;
        }
        if anchor_view(from).is_none() || anchor_view(to).is_none() {
            log::debug!("declining {:?}: screens do not both provide anchors", operation);
            self.pending = None;
            self.interactive = false;
            return None;
        }
        self.pending = Some(Direction::from(operation));
        Some(self)
    }

    /// The engine itself while an interactive session is running.
    pub fn interaction_controller(&mut self) -> Option<&mut Self> {
        if self.state == TransitionState::AnimatingInteractive {
            Some(self)
        } else {
            None
        }
    }

    /// Prepare and start the accepted transition.
    ///
    /// On error nothing in the hierarchy has changed and the host should fall
    /// back to its default transition.
    pub fn start_transition(&mut self, ctx: &mut dyn TransitionContext) -> Result<()> {
        if self.session.is_some() {
            return Err(TransitionError::SessionActive);
        }

        let direction = self.pending.take().unwrap_or(self.next_direction);
        // Only a dismissal can follow a pinch
        let mode = if self.interactive && direction == Direction::Dismissing {
            Mode::Interactive
        } else {
            self.interactive = false;
            Mode::Animated
        };

        self.state = TransitionState::Preparing;
        let mut session = match SessionBuilder::new(direction).mode(mode).build(ctx) {
            Ok(session) => session,
            Err(err) => {
                log::warn!("cannot start {:?} transition: {}", direction, err);
                self.state = TransitionState::Idle;
                self.interactive = false;
                return Err(err);
            }
        };

        let duration = self.transition_duration();
        let start = session.current_keyframe(ctx.views());
        let timeline = match (direction, mode) {
            (Direction::Presenting, _) => {
                let end = Keyframe {
                    proxy: Some(ProxyPose::framed(
                        session.destination_rect(),
                        Transform::IDENTITY,
                    )),
                    destination_alpha: 1.0,
                    ..start
                };
                Timeline::run_to_completion(
                    start,
                    end,
                    duration,
                    self.config.animated_damping,
                    0.0,
                )
            }
            (Direction::Dismissing, Mode::Animated) => {
                let end = Keyframe {
                    proxy: Some(ProxyPose::framed(
                        session.destination_rect(),
                        Transform::IDENTITY,
                    )),
                    source_alpha: 0.0,
                    ..start
                };
                Timeline::run_to_completion(
                    start,
                    end,
                    duration,
                    self.config.animated_damping,
                    0.0,
                )
            }
            (Direction::Dismissing, Mode::Interactive) => {
                // The gesture owns the proxy until release
                let start = Keyframe {
                    proxy: None,
                    ..start
                };
                let end = Keyframe {
                    source_alpha: 0.0,
                    ..start
                };
                Timeline::scrubbed(start, end, duration, self.config.scrub_timing.clone())
            }
        };
        session.timeline = Some(timeline);

        log::info!(
            "starting {:?} zoom transition ({:?}, {:?})",
            direction,
            mode,
            duration
        );
        self.state = match mode {
            Mode::Animated => TransitionState::AnimatingNonInteractive,
            Mode::Interactive => TransitionState::AnimatingInteractive,
        };
        self.session = Some(session);
        Ok(())
    }

    /// Advance the running animation by one frame.
    ///
    /// Returns the outcome on the frame the session ends.
    pub fn tick(&mut self, dt: Duration, ctx: &mut dyn TransitionContext) -> Option<Outcome> {
        let session = self.session.as_mut().filter(|s| !s.is_closed())?;
        let timeline = session.timeline.as_mut()?;
        let status = timeline.advance(dt);
        let keyframe = *timeline.value();
        session.apply(&keyframe, ctx.views_mut());

        let TimelineStatus::Finished(outcome) = status else {
            return None;
        };
        let outcome = if ctx.transition_was_cancelled() || session.is_cancelled() {
            Outcome::Cancelled
        } else {
            outcome
        };
        self.teardown(ctx, outcome);
        Some(outcome)
    }

    /// Move the cross-fade to `percent` while a gesture drives it.
    pub fn update_interactive_transition(&mut self, percent: f32, views: &mut ViewTree) {
        let Some(session) = self.session.as_mut().filter(|s| s.is_scrubbing()) else {
            return;
        };
        session.set_percent(percent);
        let keyframe = match session.timeline.as_mut() {
            Some(timeline) => *timeline.scrub(percent),
            None => return,
        };
        session.apply(&keyframe, views);
    }

    /// Mark the interactive transition to roll back.
    pub fn cancel_interactive_transition(&mut self) {
        if let Some(session) = self.session.as_mut().filter(|s| !s.is_closed()) {
            session.set_cancelled(true);
        }
    }

    /// Mark the interactive transition to take effect.
    pub fn finish_interactive_transition(&mut self) {
        if let Some(session) = self.session.as_mut().filter(|s| !s.is_closed()) {
            session.set_cancelled(false);
        }
    }

    /// Feed one pinch update. Consumes the gesture's scale increment.
    pub fn handle_pinch(&mut self, gesture: &mut PinchGesture, views: &mut ViewTree) -> PinchResponse {
        match gesture.phase {
            GesturePhase::Began => {
                if !self.config.allows_interactive_gesture || self.session.is_some() {
                    return PinchResponse::Ignored;
                }
                log::debug!("pinch began, requesting interactive dismissal");
                self.interactive = true;
                PinchResponse::BeginDismiss
            }
            GesturePhase::Changed => {
                let Some(session) = self.session.as_mut().filter(|s| s.is_scrubbing()) else {
                    return PinchResponse::Ignored;
                };
                let proxy = session.proxy().id();
                let transform = views.transform(proxy).unwrap_or_default();
                views.set_transform(proxy, transform.scaled(gesture.scale));
                gesture.reset();

                let width = views.frame(proxy).map(|f| f.width).unwrap_or_default();
                let percent = session.interpreter_mut().pinch_changed(width);
                let should_complete = session.should_complete();
                self.update_interactive_transition(percent, views);
                PinchResponse::Updated {
                    percent,
                    should_complete,
                }
            }
            GesturePhase::Ended | GesturePhase::Cancelled => {
                let Some(session) = self.session.as_ref().filter(|s| s.is_scrubbing()) else {
                    if self.session.is_none() {
                        // The host never started the dismissal
                        self.interactive = false;
                    }
                    return PinchResponse::Ignored;
                };
                let proxy = session.proxy().id();
                let width = views.frame(proxy).map(|f| f.width).unwrap_or_default();
                let settle = session.interpreter().finish(
                    gesture.phase,
                    gesture.velocity,
                    width,
                    session.destination_rect().width,
                );
                log::debug!(
                    "pinch released at scale {:.3}: {:?}, velocity {:.2} -> {:.2}",
                    settle.current_scale,
                    settle.outcome,
                    gesture.velocity,
                    settle.velocity
                );

                match settle.outcome {
                    Outcome::Committed => self.finish_interactive_transition(),
                    Outcome::Cancelled => self.cancel_interactive_transition(),
                }
                self.settle(views, settle.outcome, settle.current_scale, settle.velocity);
                PinchResponse::Settling(settle.outcome)
            }
            GesturePhase::Possible | GesturePhase::Failed => PinchResponse::Ignored,
        }
    }

    /// Feed one rotation update. Returns whether the proxy turned.
    pub fn handle_rotation(&mut self, gesture: &mut RotationGesture, views: &mut ViewTree) -> bool {
        if !self.interactive || gesture.phase != GesturePhase::Changed {
            return false;
        }
        let Some(session) = self.session.as_ref().filter(|s| s.is_scrubbing()) else {
            return false;
        };
        let proxy = session.proxy().id();
        let transform = views.transform(proxy).unwrap_or_default();
        views.set_transform(proxy, transform.rotated(gesture.rotation));
        gesture.reset();
        true
    }

    /// Feed one pan update. Returns whether the proxy moved.
    pub fn handle_pan(&mut self, gesture: &mut PanGesture, views: &mut ViewTree) -> bool {
        if !self.interactive || gesture.phase != GesturePhase::Changed {
            return false;
        }
        let Some(session) = self.session.as_ref().filter(|s| s.is_scrubbing()) else {
            return false;
        };
        let proxy = session.proxy().id();
        let Some(center) = views.center(proxy) else {
            return false;
        };
        views.set_center(
            proxy,
            center.offset(gesture.translation.x, gesture.translation.y),
        );
        gesture.reset();
        true
    }

    /// Replace the scrubbed timeline with a critically damped spring that
    /// lands the proxy on the target rectangle, unrotated but at the scale it
    /// was released with.
    fn settle(&mut self, views: &mut ViewTree, outcome: Outcome, current_scale: f32, velocity: f32) {
        let duration = self.config.interactive_duration;
        let damping = self.config.settle_damping;
        let Some(session) = self.session.as_mut() else {
            return;
        };

        let target = match outcome {
            Outcome::Committed => session.destination_rect(),
            Outcome::Cancelled => session.source_rect(),
        };
        let start = session.current_keyframe(views);
        let end = Keyframe {
            proxy: Some(ProxyPose::framed(target, Transform::scale(current_scale))),
            source_alpha: match outcome {
                Outcome::Committed => 0.0,
                Outcome::Cancelled => 1.0,
            },
            destination_alpha: 1.0,
        };
        if let Some(mode) = views.content_mode(session.views().destination_anchor) {
            views.set_content_mode(session.proxy().id(), mode);
        }

        session.timeline = Some(
            Timeline::run_to_completion(start, end, duration, damping, velocity)
                .with_outcome(outcome),
        );
    }

    /// Restore the real views, drop the proxy and report the outcome. Runs
    /// once per session; later calls do nothing.
    fn teardown(&mut self, ctx: &mut dyn TransitionContext, outcome: Outcome) {
        let Some(session) = self.session.as_mut() else {
            log::debug!("teardown without a session ignored");
            return;
        };
        if session.is_closed() {
            log::debug!("session already torn down");
            return;
        }
        session.close();

        self.state = match outcome {
            Outcome::Committed => TransitionState::Committed,
            Outcome::Cancelled => TransitionState::Cancelled,
        };

        let direction = session.direction();
        let participants = *session.views();
        let views = ctx.views_mut();
        views.set_alpha(participants.source_root, 1.0);
        views.set_alpha(participants.destination_root, 1.0);
        views.set_alpha(participants.source_anchor, 1.0);
        views.set_hidden(participants.source_anchor, false);
        views.set_alpha(participants.destination_anchor, 1.0);
        views.set_hidden(participants.destination_anchor, false);
        session.proxy_mut().remove(views);

        let committed = outcome.is_committed();
        if !committed {
            views.remove_from_superview(participants.destination_root);
        } else if direction == Direction::Presenting && self.config.allows_interactive_gesture {
            views.attach_gestures(participants.destination_root, GestureMask::all());
        }
        ctx.complete_transition(committed);

        log::info!("{:?} zoom transition finished: {:?}", direction, outcome);
        self.next_direction = if committed {
            direction.reversed()
        } else {
            direction
        };
        self.last_outcome = Some(outcome);
        self.interactive = false;
        self.session = None;
        self.state = TransitionState::Idle;
    }
}

impl Default for ZoomTransition {
    fn default() -> Self {
        Self::new()
    }
}
