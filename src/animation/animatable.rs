use crate::geometry::{Point, Rect, Size};
use crate::transform::Transform;
use crate::view::Color;

/// Trait for types that can be animated by interpolating between values
pub trait Animatable: Clone + PartialEq + Send + Sync + 'static {
    /// Linear interpolation between two values
    /// t = 0.0 returns `from`, t = 1.0 returns `to`
    /// t can exceed [0, 1] range for overshoot effects
    fn lerp(from: &Self, to: &Self, t: f32) -> Self;
}

impl Animatable for f32 {
    fn lerp(from: &Self, to: &Self, t: f32) -> Self {
        from + (to - from) * t
    }
}

impl Animatable for Point {
    fn lerp(from: &Self, to: &Self, t: f32) -> Self {
        Point::new(f32::lerp(&from.x, &to.x, t), f32::lerp(&from.y, &to.y, t))
    }
}

impl Animatable for Size {
    fn lerp(from: &Self, to: &Self, t: f32) -> Self {
        Size::new(
            f32::lerp(&from.width, &to.width, t),
            f32::lerp(&from.height, &to.height, t),
        )
    }
}

impl Animatable for Rect {
    fn lerp(from: &Self, to: &Self, t: f32) -> Self {
        Rect::new(
            f32::lerp(&from.x, &to.x, t),
            f32::lerp(&from.y, &to.y, t),
            f32::lerp(&from.width, &to.width, t),
            f32::lerp(&from.height, &to.height, t),
        )
    }
}

impl Animatable for Transform {
    /// Interpolates scale and rotation separately so a rotating view does not
    /// shrink halfway through, the way a component-wise blend would.
    fn lerp(from: &Self, to: &Self, t: f32) -> Self {
        let scale_x = f32::lerp(&from.scale_x(), &to.scale_x(), t);
        let scale_y = f32::lerp(&from.scale_y(), &to.scale_y(), t);
        let mut turn = to.rotation() - from.rotation();
        // Take the short way round
        if turn > std::f32::consts::PI {
            turn -= std::f32::consts::TAU;
        } else if turn < -std::f32::consts::PI {
            turn += std::f32::consts::TAU;
        }
        let rotation = from.rotation() + turn * t;

        let mut result = Transform::rotate(rotation).then(&Transform::scale_xy(scale_x, scale_y));
        result.tx = f32::lerp(&from.tx, &to.tx, t);
        result.ty = f32::lerp(&from.ty, &to.ty, t);
        result
    }
}

impl Animatable for Color {
    fn lerp(from: &Self, to: &Self, t: f32) -> Self {
        Color {
            r: from.r + (to.r - from.r) * t,
            g: from.g + (to.g - from.g) * t,
            b: from.b + (to.b - from.b) * t,
            a: from.a + (to.a - from.a) * t,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-5
    }

    #[test]
    fn test_f32_lerp() {
        assert_eq!(f32::lerp(&0.0, &10.0, 0.0), 0.0);
        assert_eq!(f32::lerp(&0.0, &10.0, 0.5), 5.0);
        assert_eq!(f32::lerp(&0.0, &10.0, 1.0), 10.0);
        // Overshoot
        assert_eq!(f32::lerp(&0.0, &10.0, 1.5), 15.0);
    }

    #[test]
    fn test_rect_lerp() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(100.0, 50.0, 30.0, 20.0);
        assert_eq!(Rect::lerp(&a, &b, 0.5), Rect::new(50.0, 25.0, 20.0, 15.0));
    }

    #[test]
    fn test_transform_lerp_keeps_scale_while_unrotating() {
        let from = Transform::scale(0.6).rotated(0.8);
        let to = Transform::scale(0.6);
        let mid = Transform::lerp(&from, &to, 0.5);
        assert!(approx_eq(mid.scale_x(), 0.6));
        assert!(approx_eq(mid.rotation(), 0.4));
    }

    #[test]
    fn test_transform_lerp_endpoints() {
        let from = Transform::scale(2.0);
        let to = Transform::IDENTITY;
        let end = Transform::lerp(&from, &to, 1.0);
        assert!(approx_eq(end.a, 1.0));
        assert!(approx_eq(end.d, 1.0));
        assert!(approx_eq(end.b, 0.0));
    }

    #[test]
    fn test_color_lerp() {
        let mid = Color::lerp(&Color::BLACK, &Color::WHITE, 0.5);
        assert_eq!(mid.r, 0.5);
        assert_eq!(mid.g, 0.5);
        assert_eq!(mid.b, 0.5);
    }
}
