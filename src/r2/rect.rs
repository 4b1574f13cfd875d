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

use crate::r1::interval::Interval;
use crate::r2::point::Point;

/// Rect represents a closed axis-aligned rectangle in (u,v) clip space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: Interval,
    pub y: Interval,
}

impl Rect {
    pub fn from_intervals(x: Interval, y: Interval) -> Self {
        Rect { x, y }
    }

    /// The smallest rectangle containing all the given points.
    pub fn from_points(pts: &[Point]) -> Self {
        let mut r = Rect::empty();
        for p in pts {
            r = r.add_point(p);
        }
        r
    }

    pub fn empty() -> Self {
        Rect {
            x: Interval::empty(),
            y: Interval::empty(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    pub fn add_point(&self, p: &Point) -> Rect {
        Rect {
            x: self.x.add_point(p.x),
            y: self.y.add_point(p.y),
        }
    }

    pub fn contains_point(&self, p: &Point) -> bool {
        self.x.contains(p.x) && self.y.contains(p.y)
    }

    pub fn contains(&self, other: &Rect) -> bool {
        self.x.contains_interval(&other.x) && self.y.contains_interval(&other.y)
    }

    pub fn intersects(&self, other: &Rect) -> bool {
        self.x.intersects(&other.x) && self.y.intersects(&other.y)
    }

    pub fn intersection(&self, other: &Rect) -> Rect {
        let x = self.x.intersection(&other.x);
        let y = self.y.intersection(&other.y);
        if x.is_empty() || y.is_empty() {
            return Rect::empty();
        }
        Rect { x, y }
    }

    pub fn union(&self, other: &Rect) -> Rect {
        Rect {
            x: self.x.union(&other.x),
            y: self.y.union(&other.y),
        }
    }

    /// Returns the rectangle expanded by margin on all sides.
    pub fn expanded_by_margin(&self, margin: f64) -> Rect {
        let x = self.x.expanded(margin);
        let y = self.y.expanded(margin);
        if x.is_empty() || y.is_empty() {
            return Rect::empty();
        }
        Rect { x, y }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_points_contains() {
        let r = Rect::from_points(&[Point::new(0.0, 0.0), Point::new(1.0, 2.0)]);
        assert!(r.contains_point(&Point::new(0.5, 1.0)));
        assert!(!r.contains_point(&Point::new(1.5, 1.0)));
        assert!(r.contains(&Rect::from_points(&[
            Point::new(0.25, 0.5),
            Point::new(0.75, 1.5)
        ])));
    }

    #[test]
    fn test_intersection() {
        let a = Rect::from_points(&[Point::new(0.0, 0.0), Point::new(1.0, 1.0)]);
        let b = Rect::from_points(&[Point::new(0.5, 0.5), Point::new(2.0, 2.0)]);
        assert!(a.intersects(&b));
        assert_eq!(
            a.intersection(&b),
            Rect::from_points(&[Point::new(0.5, 0.5), Point::new(1.0, 1.0)])
        );
        let c = Rect::from_points(&[Point::new(3.0, 3.0), Point::new(4.0, 4.0)]);
        assert!(!a.intersects(&c));
        assert!(a.intersection(&c).is_empty());
    }
}
