//! Headless walk through a zoom transition: push a detail screen, then pinch
//! it closed. Run with `RUST_LOG=debug` to see the engine's decisions.
//! Snapshots of a few frames are written to the system temp directory.

use std::sync::Arc;
use std::time::Duration;

use image::{Rgba, RgbaImage};
use zoom_transition::prelude::*;

const FRAME: Duration = Duration::from_micros(16_667);

fn checkerboard(size: u32) -> RgbaImage {
    RgbaImage::from_fn(size, size, |x, y| {
        if (x / 8 + y / 8) % 2 == 0 {
            Rgba([230, 90, 40, 255])
        } else {
            Rgba([40, 90, 230, 255])
        }
    })
}

fn save_frame(stack: &NavigationStack, name: &str) -> Result<(), Box<dyn std::error::Error>> {
    let Some(frame) = stack.views().snapshot(stack.container()) else {
        return Ok(());
    };
    let path = std::env::temp_dir().join(format!("zoom_demo_{name}.png"));
    frame.save(&path)?;
    log::info!("wrote {}", path.display());
    Ok(())
}

fn run(stack: &mut NavigationStack, name: &str) -> Result<Outcome, Box<dyn std::error::Error>> {
    let mut frame = 0;
    loop {
        if let Some(outcome) = stack.tick(FRAME) {
            return Ok(outcome);
        }
        frame += 1;
        if frame == 10 {
            save_frame(stack, name)?;
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let mut stack = NavigationStack::new(ZoomTransition::new(), Size::new(320.0, 640.0));
    let image = Arc::new(checkerboard(64));
    let views = stack.views_mut();

    let grid = views.create_view(Rect::new(0.0, 0.0, 320.0, 640.0));
    views.set_background(grid, Color::from_hex(0xF2F2F2));
    let thumbnail = views.create_image_view(Rect::new(24.0, 80.0, 96.0, 96.0), Arc::clone(&image));
    views.set_content_mode(thumbnail, ContentMode::Cover);
    views.add_subview(grid, thumbnail)?;

    let detail = views.create_view(Rect::new(0.0, 0.0, 320.0, 640.0));
    views.set_background(detail, Color::BLACK);
    let full = views.create_image_view(Rect::new(0.0, 160.0, 320.0, 320.0), image);
    views.set_content_mode(full, ContentMode::Contain);
    views.add_subview(detail, full)?;

    stack.push(Box::new(AnchoredScreen::new(grid, thumbnail)))?;
    stack.push(Box::new(AnchoredScreen::new(detail, full)))?;
    println!("push: {:?}", run(&mut stack, "push")?);

    let response = stack.pinch(&mut PinchGesture::began());
    println!("pinch began: {response:?}");
    for step in 1..=6 {
        let response = stack.pinch(&mut PinchGesture::changed(0.9, -1.5));
        let mut rotation = RotationGesture::changed(0.02);
        stack.rotate(&mut rotation);
        println!("pinch step {step}: {response:?}");
    }
    save_frame(&stack, "pinch")?;
    let response = stack.pinch(&mut PinchGesture::ended(-1.5));
    println!("pinch ended: {response:?}");
    println!("dismiss: {:?}", run(&mut stack, "settle")?);

    for completion in stack.history() {
        println!("{completion:?}");
    }
    Ok(())
}
