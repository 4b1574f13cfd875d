// Copyright 2023 Google Inc. All rights reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::cmp::Ordering;
use std::ops::{Add, Mul, Neg, Sub};

use crate::s1::angle::Angle;

/// Axis enumerates the coordinate axes of a Vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
    Z,
}

/// Vector represents a point in 3D space.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Vector {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vector {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Vector { x, y, z }
    }

    pub fn dot(&self, other: &Vector) -> f64 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    pub fn cross(&self, other: &Vector) -> Vector {
        Vector {
            x: self.y * other.z - self.z * other.y,
            y: self.z * other.x - self.x * other.z,
            z: self.x * other.y - self.y * other.x,
        }
    }

    pub fn norm(&self) -> f64 {
        self.dot(self).sqrt()
    }

    pub fn norm2(&self) -> f64 {
        self.dot(self)
    }

    /// Returns a unit vector in the same direction. The zero vector is
    /// returned unchanged.
    pub fn normalize(&self) -> Vector {
        if self.x == 0.0 && self.y == 0.0 && self.z == 0.0 {
            return *self;
        }
        *self * (1.0 / self.norm())
    }

    pub fn abs(&self) -> Vector {
        Vector {
            x: self.x.abs(),
            y: self.y.abs(),
            z: self.z.abs(),
        }
    }

    /// The angle between this vector and the other, in the range [0, pi].
    pub fn angle(&self, other: &Vector) -> Angle {
        Angle(self.cross(other).norm().atan2(self.dot(other)))
    }

    /// The axis with the largest absolute coordinate.
    pub fn largest_component(&self) -> Axis {
        let a = self.abs();
        if a.x > a.y {
            if a.x > a.z {
                Axis::X
            } else {
                Axis::Z
            }
        } else if a.y > a.z {
            Axis::Y
        } else {
            Axis::Z
        }
    }

    /// Returns a unit vector orthogonal to this one. Deterministic in the
    /// input, which the loop orientation test relies on.
    pub fn ortho(&self) -> Vector {
        let ov = match self.largest_component() {
            Axis::X => Vector::new(0.0, 0.0, 1.0),
            Axis::Y => Vector::new(1.0, 0.0, 0.0),
            Axis::Z => Vector::new(0.0, 1.0, 0.0),
        };
        self.cross(&ov).normalize()
    }

    /// Lexicographic comparison of the coordinates, used for canonical
    /// vertex ordering.
    pub fn cmp(&self, other: &Vector) -> Ordering {
        self.x
            .partial_cmp(&other.x)
            .unwrap_or(Ordering::Equal)
            .then(self.y.partial_cmp(&other.y).unwrap_or(Ordering::Equal))
            .then(self.z.partial_cmp(&other.z).unwrap_or(Ordering::Equal))
    }
}

impl Add for Vector {
    type Output = Vector;
    fn add(self, other: Vector) -> Vector {
        Vector {
            x: self.x + other.x,
            y: self.y + other.y,
            z: self.z + other.z,
        }
    }
}

impl Sub for Vector {
    type Output = Vector;
    fn sub(self, other: Vector) -> Vector {
        Vector {
            x: self.x - other.x,
            y: self.y - other.y,
            z: self.z - other.z,
        }
    }
}

impl Mul<f64> for Vector {
    type Output = Vector;
    fn mul(self, m: f64) -> Vector {
        Vector {
            x: self.x * m,
            y: self.y * m,
            z: self.z * m,
        }
    }
}

impl Neg for Vector {
    type Output = Vector;
    fn neg(self) -> Vector {
        Vector {
            x: -self.x,
            y: -self.y,
            z: -self.z,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::f64_eq;

    #[test]
    fn test_dot_cross() {
        let x = Vector::new(1.0, 0.0, 0.0);
        let y = Vector::new(0.0, 1.0, 0.0);
        let z = Vector::new(0.0, 0.0, 1.0);
        assert_eq!(x.dot(&y), 0.0);
        assert_eq!(x.cross(&y), z);
        assert_eq!(y.cross(&x), -z);
    }

    #[test]
    fn test_norm_normalize() {
        let v = Vector::new(3.0, 4.0, 0.0);
        assert_eq!(v.norm(), 5.0);
        assert!(f64_eq(v.normalize().norm(), 1.0));
        assert_eq!(Vector::default().normalize(), Vector::default());
    }

    #[test]
    fn test_ortho() {
        for v in [
            Vector::new(1.0, 0.0, 0.0),
            Vector::new(0.012, 1.0, 0.00457),
            Vector::new(-1.0, -2.0, 3.0),
        ] {
            let o = v.ortho();
            assert!(f64_eq(o.norm(), 1.0));
            assert!(v.dot(&o).abs() < 1e-15);
        }
    }

    #[test]
    fn test_angle() {
        let x = Vector::new(1.0, 0.0, 0.0);
        let y = Vector::new(0.0, 1.0, 0.0);
        assert!(f64_eq(x.angle(&y).rad(), std::f64::consts::FRAC_PI_2));
        assert!(f64_eq(x.angle(&-x).rad(), std::f64::consts::PI));
    }

    #[test]
    fn test_cmp() {
        let a = Vector::new(1.0, 2.0, 3.0);
        let b = Vector::new(1.0, 2.0, 4.0);
        assert_eq!(a.cmp(&b), Ordering::Less);
        assert_eq!(b.cmp(&a), Ordering::Greater);
        assert_eq!(a.cmp(&a), Ordering::Equal);
    }
}
