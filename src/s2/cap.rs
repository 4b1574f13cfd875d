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

use crate::s1::angle::Angle;
use crate::s2::point::Point;

/// Cap represents a disc-shaped region defined by a center and radius.
/// Technically this shape is called a "spherical cap" (rather than disc)
/// because it is not planar; the cap represents a portion of the sphere
/// that has been cut off by a plane.
///
/// The radius is stored as the cap height: the distance from the center
/// point to the cutoff plane. This representation is numerically stable
/// for caps very close to a single point and to a full sphere.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cap {
    pub center: Point,
    height: f64,
}

const EMPTY_HEIGHT: f64 = -1.0;
const FULL_HEIGHT: f64 = 2.0;

impl Cap {
    /// Constructs a cap containing a single point.
    pub fn from_point(p: &Point) -> Self {
        Cap {
            center: *p,
            height: 0.0,
        }
    }

    /// Constructs a cap with the given center and angular radius.
    pub fn from_center_angle(center: &Point, radius: Angle) -> Self {
        let height = if radius.rad() >= std::f64::consts::PI {
            FULL_HEIGHT
        } else {
            // The height of the cap can be computed as 1 - cos(r), but this
            // isn't very accurate for angles close to zero (where cos(r) is
            // almost 1). The formula below has good relative accuracy over
            // the entire range.
            let d = (0.5 * radius.rad()).sin();
            2.0 * d * d
        };
        Cap {
            center: *center,
            height,
        }
    }

    /// Returns a cap that contains no points.
    pub fn empty() -> Self {
        Cap {
            center: Point::from_coords(1.0, 0.0, 0.0),
            height: EMPTY_HEIGHT,
        }
    }

    /// Returns a cap that contains all points.
    pub fn full() -> Self {
        Cap {
            center: Point::from_coords(1.0, 0.0, 0.0),
            height: FULL_HEIGHT,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.height < 0.0
    }

    pub fn is_full(&self) -> bool {
        self.height >= FULL_HEIGHT
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    /// The angular radius of the cap; negative for the empty cap.
    pub fn radius(&self) -> Angle {
        if self.is_empty() {
            return Angle(-1.0);
        }
        // This accuracy-preserving inverse of the height formula in
        // from_center_angle.
        Angle(2.0 * (0.5 * self.height).sqrt().min(1.0).asin())
    }

    pub fn contains_point(&self, p: &Point) -> bool {
        (self.center.0 - p.0).norm2() <= 2.0 * self.height
    }

    /// Returns the cap expanded as necessary to contain p.
    pub fn add_point(&self, p: &Point) -> Cap {
        if self.is_empty() {
            return Cap::from_point(p);
        }
        // Compute the squared chord length, then convert it to a height.
        let d2 = (self.center.0 - p.0).norm2();
        Cap {
            center: self.center,
            height: self.height.max(0.5 * d2).min(FULL_HEIGHT),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::f64_eq;
    use crate::s1::angle::Deg;

    #[test]
    fn test_basics() {
        let empty = Cap::empty();
        let full = Cap::full();
        assert!(empty.is_empty() && !empty.is_full());
        assert!(full.is_full() && !full.is_empty());
        let p = Point::from_coords(0.0, 0.0, 1.0);
        assert!(!empty.contains_point(&p));
        assert!(full.contains_point(&p));
    }

    #[test]
    fn test_from_center_angle() {
        let center = Point::from_coords(1.0, 0.0, 0.0);
        let cap = Cap::from_center_angle(&center, Angle::from(Deg(30.0)));
        assert!((cap.radius().deg() - 30.0).abs() < 1e-12);
        assert!(cap.contains_point(&Point::from_coords(1.0, 0.3, 0.0)));
        assert!(!cap.contains_point(&Point::from_coords(0.0, 1.0, 0.0)));
    }

    #[test]
    fn test_add_point() {
        let p = Point::from_coords(1.0, 0.0, 0.0);
        let q = Point::from_coords(0.0, 1.0, 0.0);
        let cap = Cap::from_point(&p).add_point(&q);
        assert!(cap.contains_point(&p));
        assert!(cap.contains_point(&q));
        assert!(f64_eq(cap.radius().rad(), std::f64::consts::FRAC_PI_2));
    }
}
