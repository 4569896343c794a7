use crate::geometry::{Point, Rect};

/// A 2D affine transform.
///
/// Maps a point `(x, y)` to `(a*x + b*y + tx, c*x + d*y + ty)`, i.e. the
/// upper rows of the row-major matrix
///
/// ```text
/// | a  b  tx |
/// | c  d  ty |
/// | 0  0  1  |
/// ```
///
/// View transforms are applied around the view's center, so a transform
/// without translation scales and rotates a view in place.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    pub a: f32,
    pub b: f32,
    pub c: f32,
    pub d: f32,
    pub tx: f32,
    pub ty: f32,
}

impl Transform {
    /// Identity transform (no transformation)
    pub const IDENTITY: Self = Self {
        a: 1.0,
        b: 0.0,
        c: 0.0,
        d: 1.0,
        tx: 0.0,
        ty: 0.0,
    };

    pub fn identity() -> Self {
        Self::IDENTITY
    }

    pub fn translate(x: f32, y: f32) -> Self {
        Self {
            tx: x,
            ty: y,
            ..Self::IDENTITY
        }
    }

    /// Rotation by `angle_radians`; positive angles turn clockwise on a
    /// y-down screen.
    pub fn rotate(angle_radians: f32) -> Self {
        let cos = angle_radians.cos();
        let sin = angle_radians.sin();
        Self {
            a: cos,
            b: -sin,
            c: sin,
            d: cos,
            tx: 0.0,
            ty: 0.0,
        }
    }

    pub fn rotate_degrees(angle_degrees: f32) -> Self {
        Self::rotate(angle_degrees.to_radians())
    }

    pub fn scale(s: f32) -> Self {
        Self::scale_xy(s, s)
    }

    pub fn scale_xy(sx: f32, sy: f32) -> Self {
        Self {
            a: sx,
            d: sy,
            ..Self::IDENTITY
        }
    }

    /// Compose this transform with another: self * other.
    /// Applies `other` first, then `self`.
    pub fn then(&self, other: &Transform) -> Transform {
        Transform {
            a: self.a * other.a + self.b * other.c,
            b: self.a * other.b + self.b * other.d,
            c: self.c * other.a + self.d * other.c,
            d: self.c * other.b + self.d * other.d,
            tx: self.a * other.tx + self.b * other.ty + self.tx,
            ty: self.c * other.tx + self.d * other.ty + self.ty,
        }
    }

    /// Scale this transform in its own space, compounding with whatever
    /// scale it already carries.
    pub fn scaled(&self, s: f32) -> Transform {
        self.then(&Transform::scale(s))
    }

    /// Rotate this transform in its own space.
    pub fn rotated(&self, angle_radians: f32) -> Transform {
        self.then(&Transform::rotate(angle_radians))
    }

    /// Inverse of this transform. A degenerate (non-invertible) transform
    /// yields the identity.
    pub fn inverse(&self) -> Transform {
        let det = self.a * self.d - self.b * self.c;

        if det.abs() < 1e-10 {
            return Self::IDENTITY;
        }

        let inv_det = 1.0 / det;

        Transform {
            a: self.d * inv_det,
            b: -self.b * inv_det,
            c: -self.c * inv_det,
            d: self.a * inv_det,
            tx: (-self.d * self.tx + self.b * self.ty) * inv_det,
            ty: (self.c * self.tx - self.a * self.ty) * inv_det,
        }
    }

    pub fn transform_point(&self, p: Point) -> Point {
        Point::new(
            self.a * p.x + self.b * p.y + self.tx,
            self.c * p.x + self.d * p.y + self.ty,
        )
    }

    /// Bounding box of `rect` after transformation.
    pub fn transform_rect(&self, rect: &Rect) -> Rect {
        let corners = rect.corners().map(|p| self.transform_point(p));
        Rect::bounding(&corners)
    }

    /// Length of the transformed x axis.
    pub fn scale_x(&self) -> f32 {
        (self.a * self.a + self.c * self.c).sqrt()
    }

    /// Length of the transformed y axis.
    pub fn scale_y(&self) -> f32 {
        (self.b * self.b + self.d * self.d).sqrt()
    }

    /// Rotation angle in radians.
    pub fn rotation(&self) -> f32 {
        self.c.atan2(self.a)
    }

    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-5
    }

    #[test]
    fn test_translate() {
        let t = Transform::translate(10.0, 20.0);
        let p = t.transform_point(Point::new(5.0, 5.0));
        assert!(approx_eq(p.x, 15.0));
        assert!(approx_eq(p.y, 25.0));
    }

    #[test]
    fn test_rotate() {
        let t = Transform::rotate_degrees(90.0);
        let p = t.transform_point(Point::new(1.0, 0.0));
        assert!(approx_eq(p.x, 0.0));
        assert!(approx_eq(p.y, 1.0));
        assert!(approx_eq(t.rotation(), std::f32::consts::FRAC_PI_2));
    }

    #[test]
    fn test_compose() {
        // scale.then(translate): first translate, then scale
        let composed = Transform::scale(2.0).then(&Transform::translate(10.0, 0.0));
        let p = composed.transform_point(Point::ZERO);
        assert!(approx_eq(p.x, 20.0));
        assert!(approx_eq(p.y, 0.0));
    }

    #[test]
    fn test_scaled_compounds() {
        let t = Transform::scale(0.5).scaled(0.5).scaled(2.0);
        assert!(approx_eq(t.scale_x(), 0.5));
        assert!(approx_eq(t.scale_y(), 0.5));
    }

    #[test]
    fn test_scale_survives_rotation() {
        let t = Transform::scale(0.8).rotated(0.6);
        assert!(approx_eq(t.scale_x(), 0.8));
        assert!(approx_eq(t.rotation(), 0.6));
    }

    #[test]
    fn test_inverse() {
        let t = Transform::translate(10.0, 20.0)
            .then(&Transform::rotate_degrees(30.0))
            .then(&Transform::scale_xy(2.0, 3.0));
        let p = t.inverse().then(&t).transform_point(Point::new(3.0, 4.0));
        assert!(approx_eq(p.x, 3.0));
        assert!(approx_eq(p.y, 4.0));
    }

    #[test]
    fn test_degenerate_inverse_is_identity() {
        assert!(Transform::scale(0.0).inverse().is_identity());
    }

    #[test]
    fn test_transform_rect_scale() {
        let r = Transform::scale(2.0).transform_rect(&Rect::new(1.0, 1.0, 2.0, 3.0));
        assert_eq!(r, Rect::new(2.0, 2.0, 4.0, 6.0));
    }
}
