// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE-APACHE file or at:
//     https://www.apache.org/licenses/LICENSE-2.0

//! Simple data types

use std::ops::{Add, AddAssign, Mul, Neg, Sub};

/// A Unicode code point as accepted by GLC commands
///
/// GLC accepts any 32-bit code; values beyond `char::MAX` simply never map.
pub type CodePoint = u32;

/// 2D vector (position/size/offset)
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Vec2(pub f32, pub f32);

impl Vec2 {
    /// Zero
    pub const ZERO: Vec2 = Vec2(0.0, 0.0);

    /// Take the component-wise minimum
    #[inline]
    pub fn min(self, other: Self) -> Self {
        Vec2(self.0.min(other.0), self.1.min(other.1))
    }

    /// Take the component-wise maximum
    #[inline]
    pub fn max(self, other: Self) -> Self {
        Vec2(self.0.max(other.0), self.1.max(other.1))
    }

    /// Squared length
    #[inline]
    pub fn length_sq(self) -> f32 {
        self.0 * self.0 + self.1 * self.1
    }

    /// 2D cross product (z component)
    #[inline]
    pub fn cross(self, other: Self) -> f32 {
        self.0 * other.1 - self.1 * other.0
    }

    /// Linear interpolation: `self + (other - self) * t`
    #[inline]
    pub fn lerp(self, other: Self, t: f32) -> Self {
        self + (other - self) * t
    }
}

impl Add for Vec2 {
    type Output = Self;
    #[inline]
    fn add(self, rhs: Self) -> Self {
        Vec2(self.0 + rhs.0, self.1 + rhs.1)
    }
}

impl AddAssign for Vec2 {
    #[inline]
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
        self.1 += rhs.1;
    }
}

impl Sub for Vec2 {
    type Output = Self;
    #[inline]
    fn sub(self, rhs: Self) -> Self {
        Vec2(self.0 - rhs.0, self.1 - rhs.1)
    }
}

impl Mul<f32> for Vec2 {
    type Output = Self;
    #[inline]
    fn mul(self, rhs: f32) -> Self {
        Vec2(self.0 * rhs, self.1 * rhs)
    }
}

impl Neg for Vec2 {
    type Output = Self;
    #[inline]
    fn neg(self) -> Self {
        Vec2(-self.0, -self.1)
    }
}

/// Axis-aligned rectangle
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Rect {
    pub min: Vec2,
    pub max: Vec2,
}

impl Rect {
    /// Width and height
    #[inline]
    pub fn size(&self) -> Vec2 {
        self.max - self.min
    }

    /// Corners in counter-clockwise order starting at `min`
    pub fn corners(&self) -> [Vec2; 4] {
        [
            self.min,
            Vec2(self.max.0, self.min.1),
            self.max,
            Vec2(self.min.0, self.max.1),
        ]
    }

    /// Smallest rect containing both
    pub fn union(&self, other: &Rect) -> Rect {
        Rect {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }
}

/// The 2×2 GLC transform ("bitmap matrix")
///
/// Stored in column-major order `[a, b, c, d]`, mapping `(x, y)` to
/// `(a·x + c·y, b·x + d·y)`.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Transform(pub [f32; 4]);

impl Default for Transform {
    fn default() -> Self {
        Transform::IDENTITY
    }
}

impl Transform {
    /// The identity transform
    pub const IDENTITY: Transform = Transform([1.0, 0.0, 0.0, 1.0]);

    /// A scaling transform
    pub fn scale(x: f32, y: f32) -> Self {
        Transform([x, 0.0, 0.0, y])
    }

    /// A counter-clockwise rotation by `degrees`
    pub fn rotation(degrees: f32) -> Self {
        let (sin, cos) = degrees.to_radians().sin_cos();
        Transform([cos, sin, -sin, cos])
    }

    /// Matrix product `self × rhs`
    ///
    /// The result applies `rhs` first, then `self`.
    pub fn then_apply(self, rhs: Transform) -> Transform {
        let a = self.0;
        let b = rhs.0;
        Transform([
            a[0] * b[0] + a[2] * b[1],
            a[1] * b[0] + a[3] * b[1],
            a[0] * b[2] + a[2] * b[3],
            a[1] * b[2] + a[3] * b[3],
        ])
    }

    /// Transform a vector
    #[inline]
    pub fn apply(&self, v: Vec2) -> Vec2 {
        let m = &self.0;
        Vec2(m[0] * v.0 + m[2] * v.1, m[1] * v.0 + m[3] * v.1)
    }

    /// True if the transform has no rotation or shear component
    #[inline]
    pub fn is_axis_aligned(&self) -> bool {
        self.0[1] == 0.0 && self.0[2] == 0.0
    }

    /// Scale factors along each axis (column lengths)
    pub fn scale_factors(&self) -> Vec2 {
        let m = &self.0;
        Vec2(
            (m[0] * m[0] + m[1] * m[1]).sqrt(),
            (m[2] * m[2] + m[3] * m[3]).sqrt(),
        )
    }
}
