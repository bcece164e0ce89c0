//! 2D geometry primitives shared by every moving entity.
//!
//! World space is measured in pixels with +x to the right and +y down,
//! matching the tile grid layout.

use serde::{Deserialize, Serialize};

/// 2D vector for positions, velocities and directions.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec2 {
    /// X component
    pub x: f32,
    /// Y component
    pub y: f32,
}

impl Vec2 {
    /// Zero vector.
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    /// Unit vector pointing up.
    pub const UP: Self = Self { x: 0.0, y: -1.0 };

    /// Unit vector pointing down.
    pub const DOWN: Self = Self { x: 0.0, y: 1.0 };

    /// Unit vector pointing left.
    pub const LEFT: Self = Self { x: -1.0, y: 0.0 };

    /// Unit vector pointing right.
    pub const RIGHT: Self = Self { x: 1.0, y: 0.0 };

    /// Creates a new Vec2.
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Returns the length (magnitude) of the vector.
    #[must_use]
    pub fn length(self) -> f32 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    /// Returns a normalized (unit length) version of the vector.
    /// Returns zero vector if the vector has zero length.
    #[must_use]
    pub fn normalized(self) -> Self {
        let len = self.length();
        if len > 0.0 {
            Self {
                x: self.x / len,
                y: self.y / len,
            }
        } else {
            Self::ZERO
        }
    }

    /// Returns true if both components are zero.
    #[must_use]
    pub fn is_zero(self) -> bool {
        self.x == 0.0 && self.y == 0.0
    }

    /// Dot product of two vectors.
    #[must_use]
    pub fn dot(self, other: Self) -> f32 {
        self.x * other.x + self.y * other.y
    }

    /// Scale the vector by a scalar.
    #[must_use]
    pub fn scale(self, scalar: f32) -> Self {
        Self {
            x: self.x * scalar,
            y: self.y * scalar,
        }
    }

    /// Distance between two points.
    #[must_use]
    pub fn distance(self, other: Self) -> f32 {
        (self - other).length()
    }

    /// Unit vector at `angle` radians from the +x axis.
    #[must_use]
    pub fn from_angle(angle: f32) -> Self {
        Self::new(angle.cos(), angle.sin())
    }

    /// Clamps each component into `[min, max]`.
    #[must_use]
    pub fn clamp(self, min: Self, max: Self) -> Self {
        Self {
            x: self.x.clamp(min.x, max.x),
            y: self.y.clamp(min.y, max.y),
        }
    }
}

impl std::ops::Add for Vec2 {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl std::ops::Sub for Vec2 {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl std::ops::Mul<f32> for Vec2 {
    type Output = Self;

    fn mul(self, rhs: f32) -> Self::Output {
        self.scale(rhs)
    }
}

impl std::ops::AddAssign for Vec2 {
    fn add_assign(&mut self, rhs: Self) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl std::ops::SubAssign for Vec2 {
    fn sub_assign(&mut self, rhs: Self) {
        self.x -= rhs.x;
        self.y -= rhs.y;
    }
}

/// Axis-aligned rectangle in pixel space. `x`/`y` is the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    /// Left edge
    pub x: f32,
    /// Top edge
    pub y: f32,
    /// Width
    pub w: f32,
    /// Height
    pub h: f32,
}

impl Rect {
    /// Creates a new rectangle.
    #[must_use]
    pub const fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }

    /// Creates a rectangle with its top-left corner at `position`.
    #[must_use]
    pub const fn from_position(position: Vec2, w: f32, h: f32) -> Self {
        Self::new(position.x, position.y, w, h)
    }

    /// Right edge (exclusive).
    #[must_use]
    pub fn right(&self) -> f32 {
        self.x + self.w
    }

    /// Bottom edge (exclusive).
    #[must_use]
    pub fn bottom(&self) -> f32 {
        self.y + self.h
    }

    /// Center point.
    #[must_use]
    pub fn center(&self) -> Vec2 {
        Vec2::new(self.x + self.w / 2.0, self.y + self.h / 2.0)
    }

    /// Checks whether two rectangles overlap. Touching edges do not count.
    #[must_use]
    pub fn overlaps(&self, other: &Self) -> bool {
        self.x < other.right()
            && self.right() > other.x
            && self.y < other.bottom()
            && self.bottom() > other.y
    }

    /// Checks whether a point lies inside the rectangle.
    #[must_use]
    pub fn contains(&self, point: Vec2) -> bool {
        point.x >= self.x && point.x < self.right() && point.y >= self.y && point.y < self.bottom()
    }
}

/// Cardinal facing derived from movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Facing {
    /// Facing up (-y)
    Up,
    /// Facing down (+y)
    #[default]
    Down,
    /// Facing left (-x)
    Left,
    /// Facing right (+x)
    Right,
}

impl Facing {
    /// Facing from the dominant axis of `v`. Ties favour the horizontal axis.
    /// Returns `None` for the zero vector.
    #[must_use]
    pub fn from_vec2(v: Vec2) -> Option<Self> {
        if v.is_zero() {
            return None;
        }
        if v.x.abs() >= v.y.abs() {
            Some(if v.x > 0.0 { Self::Right } else { Self::Left })
        } else {
            Some(if v.y > 0.0 { Self::Down } else { Self::Up })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_vec2_operations() {
        let a = Vec2::new(3.0, 4.0);
        let b = Vec2::new(1.0, 2.0);

        assert_eq!(a + b, Vec2::new(4.0, 6.0));
        assert_eq!(a - b, Vec2::new(2.0, 2.0));
        assert_eq!(a * 2.0, Vec2::new(6.0, 8.0));
        assert!((a.length() - 5.0).abs() < 0.001);
        assert!((a.dot(b) - 11.0).abs() < 0.001);
    }

    #[test]
    fn test_vec2_normalized() {
        let v = Vec2::new(3.0, 4.0);
        let n = v.normalized();
        assert!((n.length() - 1.0).abs() < 0.001);

        assert_eq!(Vec2::ZERO.normalized(), Vec2::ZERO);
    }

    #[test]
    fn test_vec2_clamp() {
        let v = Vec2::new(-5.0, 500.0).clamp(Vec2::ZERO, Vec2::new(100.0, 100.0));
        assert_eq!(v, Vec2::new(0.0, 100.0));
    }

    #[test]
    fn test_rect_overlap() {
        let a = Rect::new(0.0, 0.0, 32.0, 32.0);
        let b = Rect::new(16.0, 16.0, 32.0, 32.0);
        let c = Rect::new(32.0, 0.0, 32.0, 32.0);

        assert!(a.overlaps(&b));
        assert!(b.overlaps(&a));
        // Shared edge only
        assert!(!a.overlaps(&c));
    }

    #[test]
    fn test_rect_contains() {
        let r = Rect::new(10.0, 10.0, 10.0, 10.0);
        assert!(r.contains(Vec2::new(10.0, 10.0)));
        assert!(r.contains(Vec2::new(19.9, 19.9)));
        assert!(!r.contains(Vec2::new(20.0, 15.0)));
    }

    #[test]
    fn test_facing_dominant_axis() {
        assert_eq!(Facing::from_vec2(Vec2::new(1.0, 0.5)), Some(Facing::Right));
        assert_eq!(Facing::from_vec2(Vec2::new(-0.2, 0.9)), Some(Facing::Down));
        assert_eq!(Facing::from_vec2(Vec2::new(0.0, -1.0)), Some(Facing::Up));
        assert_eq!(Facing::from_vec2(Vec2::new(-1.0, -1.0)), Some(Facing::Left));
        assert_eq!(Facing::from_vec2(Vec2::ZERO), None);
    }

    proptest! {
        #[test]
        fn prop_normalized_is_unit_or_zero(x in -1.0e4f32..1.0e4, y in -1.0e4f32..1.0e4) {
            let n = Vec2::new(x, y).normalized();
            if n.is_zero() {
                prop_assert!(Vec2::new(x, y).is_zero());
            } else {
                prop_assert!((n.length() - 1.0).abs() < 1e-3);
            }
        }

        #[test]
        fn prop_clamp_stays_in_box(x in -1.0e4f32..1.0e4, y in -1.0e4f32..1.0e4) {
            let c = Vec2::new(x, y).clamp(Vec2::ZERO, Vec2::new(640.0, 480.0));
            prop_assert!((0.0..=640.0).contains(&c.x));
            prop_assert!((0.0..=480.0).contains(&c.y));
        }
    }
}
