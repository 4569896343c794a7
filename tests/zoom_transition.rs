use std::sync::Arc;
use std::time::Duration;

use image::{Rgba, RgbaImage};
use zoom_transition::navigation::Completion;
use zoom_transition::prelude::*;
use zoom_transition::proxy::ProxyKind;

const FRAME: Duration = Duration::from_micros(16_667);

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

struct Scene {
    stack: NavigationStack,
    grid: AnchoredScreen,
    detail: AnchoredScreen,
}

/// A grid screen on display with one image thumbnail, and a detail screen
/// showing the same image large.
fn scene(engine: ZoomTransition) -> Scene {
    init_logger();
    let mut stack = NavigationStack::new(engine, Size::new(320.0, 640.0));
    let image = Arc::new(RgbaImage::from_pixel(16, 16, Rgba([200, 40, 40, 255])));
    let views = stack.views_mut();

    let grid_root = views.create_view(Rect::new(0.0, 0.0, 320.0, 640.0));
    views.set_background(grid_root, Color::WHITE);
    let thumbnail = views.create_image_view(Rect::new(20.0, 40.0, 100.0, 100.0), Arc::clone(&image));
    views.set_content_mode(thumbnail, ContentMode::Cover);
    views.add_subview(grid_root, thumbnail).unwrap();

    let detail_root = views.create_view(Rect::new(0.0, 0.0, 320.0, 640.0));
    views.set_background(detail_root, Color::BLACK);
    let full = views.create_image_view(Rect::new(0.0, 160.0, 320.0, 320.0), image);
    views.set_content_mode(full, ContentMode::Contain);
    views.add_subview(detail_root, full).unwrap();

    let grid = AnchoredScreen::new(grid_root, thumbnail);
    let detail = AnchoredScreen::new(detail_root, full);
    stack.push(Box::new(grid)).unwrap();
    Scene {
        stack,
        grid,
        detail,
    }
}

fn settle(stack: &mut NavigationStack) -> Outcome {
    for _ in 0..1000 {
        if let Some(outcome) = stack.tick(FRAME) {
            return outcome;
        }
    }
    panic!("transition never finished");
}

fn presented() -> Scene {
    let mut scene = scene(ZoomTransition::new());
    assert_eq!(
        scene.stack.push(Box::new(scene.detail)).unwrap(),
        NavigationResult::Animated
    );
    assert_eq!(settle(&mut scene.stack), Outcome::Committed);
    scene
}

fn pinch(stack: &mut NavigationStack, scale: f32, velocity: f32) -> PinchResponse {
    stack.pinch(&mut PinchGesture::changed(scale, velocity))
}

#[test]
fn test_push_zooms_thumbnail_into_detail() {
    let mut scene = scene(ZoomTransition::new());
    let views_before = scene.stack.views().len();

    assert_eq!(
        scene.stack.push(Box::new(scene.detail)).unwrap(),
        NavigationResult::Animated
    );
    let session = scene.stack.engine().session().unwrap();
    assert_eq!(session.proxy().kind(), ProxyKind::Image);
    let proxy = session.proxy().id();
    assert_eq!(
        scene.stack.views().content_mode(proxy),
        Some(ContentMode::Cover)
    );
    assert_eq!(scene.stack.views().len(), views_before + 1);

    assert_eq!(settle(&mut scene.stack), Outcome::Committed);
    assert_eq!(scene.stack.depth(), 2);
    assert_eq!(scene.stack.views().len(), views_before);
    assert!(!scene.stack.views().contains(proxy));
    assert_eq!(
        scene.stack.views().subviews(scene.stack.container()),
        &[scene.detail.root]
    );
    assert_eq!(
        scene.stack.views().gestures(scene.detail.root),
        GestureMask::all()
    );
    assert_eq!(
        scene.stack.engine().next_direction(),
        Direction::Dismissing
    );
}

#[test]
fn test_pinch_below_threshold_commits_dismissal() {
    let mut scene = presented();

    assert_eq!(
        scene.stack.pinch(&mut PinchGesture::began()),
        PinchResponse::BeginDismiss
    );
    assert!(scene.stack.is_transitioning());
    assert_eq!(
        scene.stack.engine().state(),
        TransitionState::AnimatingInteractive
    );
    assert_eq!(
        pinch(&mut scene.stack, 0.5, -1.0),
        PinchResponse::Updated {
            percent: 0.5,
            should_complete: true
        }
    );
    assert_eq!(
        scene.stack.pinch(&mut PinchGesture::ended(0.0)),
        PinchResponse::Settling(Outcome::Committed)
    );

    assert_eq!(settle(&mut scene.stack), Outcome::Committed);
    assert_eq!(scene.stack.depth(), 1);
    assert!(!scene.stack.views().contains(scene.detail.root));
    assert_eq!(
        scene.stack.views().subviews(scene.stack.container()),
        &[scene.grid.root]
    );
    assert_eq!(scene.stack.views().alpha(scene.grid.root), Some(1.0));
    let thumbnail = scene.grid.anchor.unwrap();
    assert_eq!(scene.stack.views().alpha(thumbnail), Some(1.0));
    assert_eq!(scene.stack.views().is_hidden(thumbnail), Some(false));
    assert_eq!(scene.stack.engine().next_direction(), Direction::Presenting);
}

#[test]
fn test_pinch_released_opening_cancels() {
    let mut scene = presented();
    scene.stack.pinch(&mut PinchGesture::began());
    match pinch(&mut scene.stack, 0.9, 0.5) {
        PinchResponse::Updated {
            percent,
            should_complete,
        } => {
            assert!((percent - 0.1).abs() < 1e-5);
            assert!(!should_complete);
        }
        other => panic!("unexpected response {other:?}"),
    }
    assert_eq!(
        scene.stack.pinch(&mut PinchGesture::ended(10.0)),
        PinchResponse::Settling(Outcome::Cancelled)
    );

    assert_eq!(settle(&mut scene.stack), Outcome::Cancelled);
    assert_eq!(scene.stack.depth(), 2);
    assert_eq!(
        scene.stack.views().subviews(scene.stack.container()),
        &[scene.detail.root]
    );
    assert_eq!(scene.stack.views().alpha(scene.detail.root), Some(1.0));
    assert_eq!(scene.stack.views().superview(scene.grid.root), None);
    assert_eq!(scene.stack.engine().next_direction(), Direction::Dismissing);
}

#[test]
fn test_cancelled_gesture_always_cancels() {
    let mut scene = presented();
    scene.stack.pinch(&mut PinchGesture::began());
    pinch(&mut scene.stack, 0.3, -2.0);
    assert_eq!(
        scene.stack.pinch(&mut PinchGesture::cancelled(-2.0)),
        PinchResponse::Settling(Outcome::Cancelled)
    );
    assert_eq!(settle(&mut scene.stack), Outcome::Cancelled);
    assert_eq!(scene.stack.depth(), 2);
}

#[test]
fn test_fast_closing_pinch_commits_above_threshold() {
    let mut scene = presented();
    scene.stack.pinch(&mut PinchGesture::began());
    pinch(&mut scene.stack, 0.9, -6.0);
    assert_eq!(
        scene.stack.pinch(&mut PinchGesture::ended(-6.0)),
        PinchResponse::Settling(Outcome::Committed)
    );
    assert_eq!(settle(&mut scene.stack), Outcome::Committed);
    assert_eq!(scene.stack.depth(), 1);
}

#[test]
fn test_dismiss_then_present_again() {
    let mut scene = presented();
    scene.stack.pinch(&mut PinchGesture::began());
    pinch(&mut scene.stack, 0.4, 0.0);
    scene.stack.pinch(&mut PinchGesture::ended(0.0));
    assert_eq!(settle(&mut scene.stack), Outcome::Committed);

    // The detail screen was destroyed by the pop; build a fresh one
    let views = scene.stack.views_mut();
    let root = views.create_view(Rect::new(0.0, 0.0, 320.0, 640.0));
    let full = views.create_view(Rect::new(0.0, 100.0, 320.0, 200.0));
    views.add_subview(root, full).unwrap();
    assert_eq!(
        scene
            .stack
            .push(Box::new(AnchoredScreen::new(root, full)))
            .unwrap(),
        NavigationResult::Animated
    );
    assert_eq!(
        scene.stack.engine().session().unwrap().direction(),
        Direction::Presenting
    );
    assert_eq!(settle(&mut scene.stack), Outcome::Committed);
    assert_eq!(scene.stack.depth(), 2);
}

#[test]
fn test_one_completion_per_transition() {
    let mut scene = presented();
    scene.stack.pinch(&mut PinchGesture::began());
    pinch(&mut scene.stack, 0.95, 0.0);
    scene.stack.pinch(&mut PinchGesture::ended(0.0));
    settle(&mut scene.stack);
    // Extra frames and a stray release do nothing
    assert_eq!(scene.stack.tick(FRAME), None);
    assert_eq!(
        scene.stack.pinch(&mut PinchGesture::ended(0.0)),
        PinchResponse::Ignored
    );

    let animated: Vec<Completion> = scene
        .stack
        .history()
        .iter()
        .copied()
        .filter(|completion| completion.animated)
        .collect();
    assert_eq!(
        animated,
        vec![
            Completion {
                operation: NavigationOperation::Push,
                committed: true,
                animated: true
            },
            Completion {
                operation: NavigationOperation::Pop,
                committed: false,
                animated: true
            },
        ]
    );
}

#[test]
fn test_interrupted_push_rolls_back() {
    let mut scene = scene(ZoomTransition::new());
    scene.stack.push(Box::new(scene.detail)).unwrap();
    for _ in 0..5 {
        assert_eq!(scene.stack.tick(FRAME), None);
    }
    assert!(scene.stack.interrupt());

    assert_eq!(settle(&mut scene.stack), Outcome::Cancelled);
    assert_eq!(scene.stack.depth(), 1);
    assert!(!scene.stack.views().contains(scene.detail.root));
    assert_eq!(
        scene.stack.views().subviews(scene.stack.container()),
        &[scene.grid.root]
    );
    assert_eq!(scene.stack.views().alpha(scene.grid.root), Some(1.0));
    assert!(!scene.stack.interrupt());
}

#[test]
fn test_interrupted_gesture_rolls_back() {
    let mut scene = presented();
    scene.stack.pinch(&mut PinchGesture::began());
    pinch(&mut scene.stack, 0.4, -1.0);
    assert!(scene.stack.interrupt());
    assert_eq!(settle(&mut scene.stack), Outcome::Cancelled);
    assert_eq!(scene.stack.depth(), 2);
}

#[test]
fn test_gestures_disabled() {
    let mut scene = scene(ZoomTransition::new().allows_interactive_gesture(false));
    scene.stack.push(Box::new(scene.detail)).unwrap();
    assert_eq!(settle(&mut scene.stack), Outcome::Committed);

    assert_eq!(
        scene.stack.views().gestures(scene.detail.root),
        GestureMask::empty()
    );
    assert_eq!(
        scene.stack.pinch(&mut PinchGesture::began()),
        PinchResponse::Ignored
    );
    assert!(!scene.stack.is_transitioning());

    // Pops still zoom, just not interactively
    assert_eq!(scene.stack.pop().unwrap(), NavigationResult::Animated);
    assert_eq!(
        scene.stack.engine().state(),
        TransitionState::AnimatingNonInteractive
    );
    assert_eq!(settle(&mut scene.stack), Outcome::Committed);
    assert_eq!(scene.stack.depth(), 1);
}

#[test]
fn test_missing_anchor_falls_back() {
    let mut scene = scene(ZoomTransition::new());
    let detail = AnchoredScreen {
        anchor: None,
        ..scene.detail
    };
    assert_eq!(
        scene.stack.push(Box::new(detail)).unwrap(),
        NavigationResult::Immediate
    );
    assert_eq!(scene.stack.depth(), 2);
    assert!(!scene.stack.is_transitioning());
    assert_eq!(scene.stack.engine().state(), TransitionState::Idle);
    assert_eq!(scene.stack.history().len(), 2);
}
