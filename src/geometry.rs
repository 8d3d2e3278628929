//! 2D screen-space primitives
//!
//! Positions are plain `Copy` values: every consumer receives its own copy,
//! so no two entities can ever share (and corrupt) the same point.

use serde::{Deserialize, Serialize};
use std::ops::{Add, Mul, Sub};

/// A point on screen, in pixels
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    /// Horizontal coordinate (pixels)
    pub x: f32,
    /// Vertical coordinate (pixels)
    pub y: f32,
}

impl Position {
    /// Origin
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    /// Create a new position
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// True when both coordinates are finite (no NaN / infinity)
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    /// Euclidean distance to another position
    pub fn distance(&self, other: Position) -> f32 {
        (other - *self).length()
    }

    /// Linear interpolation towards `other` (`t` = 0 → self, 1 → other)
    pub fn lerp(&self, other: Position, t: f32) -> Position {
        Position::new(
            self.x + (other.x - self.x) * t,
            self.y + (other.y - self.y) * t,
        )
    }
}

impl From<(f32, f32)> for Position {
    fn from((x, y): (f32, f32)) -> Self {
        Self::new(x, y)
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.1}, {:.1})", self.x, self.y)
    }
}

/// Displacement or per-frame velocity (pixels per reference frame)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Velocity {
    /// Horizontal component
    pub dx: f32,
    /// Vertical component
    pub dy: f32,
}

impl Velocity {
    /// No motion
    pub const ZERO: Self = Self { dx: 0.0, dy: 0.0 };

    /// Create a new vector
    pub const fn new(dx: f32, dy: f32) -> Self {
        Self { dx, dy }
    }

    /// Magnitude
    pub fn length(&self) -> f32 {
        (self.dx * self.dx + self.dy * self.dy).sqrt()
    }

    /// Dot product
    pub fn dot(&self, other: Velocity) -> f32 {
        self.dx * other.dx + self.dy * other.dy
    }

    /// Rescale uniformly so the magnitude does not exceed `max`
    pub fn clamp_length(self, max: f32) -> Velocity {
        let len = self.length();
        if len > max && len > 0.0 {
            self * (max / len)
        } else {
            self
        }
    }

    /// True when both components are finite
    pub fn is_finite(&self) -> bool {
        self.dx.is_finite() && self.dy.is_finite()
    }
}

impl Sub for Position {
    type Output = Velocity;

    fn sub(self, rhs: Position) -> Velocity {
        Velocity::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Add<Velocity> for Position {
    type Output = Position;

    fn add(self, rhs: Velocity) -> Position {
        Position::new(self.x + rhs.dx, self.y + rhs.dy)
    }
}

impl Add for Velocity {
    type Output = Velocity;

    fn add(self, rhs: Velocity) -> Velocity {
        Velocity::new(self.dx + rhs.dx, self.dy + rhs.dy)
    }
}

impl Mul<f32> for Velocity {
    type Output = Velocity;

    fn mul(self, rhs: f32) -> Velocity {
        Velocity::new(self.dx * rhs, self.dy * rhs)
    }
}
