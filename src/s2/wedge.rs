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

//! Wedge relations. A wedge is the angular region at a vertex ab1 bounded
//! by the edges (a0, ab1) and (ab1, a2); loops that share a vertex are
//! compared by comparing their wedges there.

use crate::s2::point::{ordered_ccw, Point};

/// Reports whether the wedge A = (a0, ab1, a2) contains the wedge
/// B = (b0, ab1, b2), where "contains" refers to the region to the left
/// of each edge pair.
pub fn wedge_contains(a0: &Point, ab1: &Point, a2: &Point, b0: &Point, b2: &Point) -> bool {
    // For A to contain B (where each loop interior is defined to be its
    // left side), the CCW edge order around ab1 must be a2 b2 b0 a0. We
    // split this test into two parts that test three vertices each.
    ordered_ccw(a2, b2, b0, ab1) && ordered_ccw(b0, a0, a2, ab1)
}

/// Reports whether the wedges A = (a0, ab1, a2) and B = (b0, ab1, b2)
/// have any interior points in common.
pub fn wedge_intersects(a0: &Point, ab1: &Point, a2: &Point, b0: &Point, b2: &Point) -> bool {
    // For A not to intersect B (where each loop interior is defined to be
    // its left side), the CCW edge order around ab1 must be a0 b2 b0 a2.
    // Note that it's important to write these conditions as negatives
    // (!ordered_ccw(a,b,c,o) rather than ordered_ccw(c,b,a,o)) to get
    // correct results when two vertices are the same.
    !(ordered_ccw(a0, b2, b0, ab1) && ordered_ccw(b0, a2, a0, ab1))
}

/// Reports whether the wedge (a0, ab1, a2) contains the "semiwedge"
/// defined as any non-empty open set of rays immediately CCW from the
/// edge (ab1, b2). If reverse_b is true, then substitute clockwise for
/// CCW; this simulates what would happen if the direction of the other
/// loop was reversed.
pub fn wedge_contains_semiwedge(
    a0: &Point,
    ab1: &Point,
    a2: &Point,
    b2: &Point,
    reverse_b: bool,
) -> bool {
    if b2 == a0 || b2 == a2 {
        // We have a shared or reversed edge.
        return (b2 == a0) == reverse_b;
    }
    ordered_ccw(a0, a2, b2, ab1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(x: f64, y: f64, z: f64) -> Point {
        Point::from_coords(x, y, z)
    }

    #[test]
    fn test_wedge_contains_nested() {
        // A wide wedge around the north pole contains a narrow one.
        let ab1 = p(0.0, 0.0, 1.0);
        let a0 = p(1.0, -1.0, 0.2);
        let a2 = p(-1.0, 1.0, 0.2);
        let b0 = p(1.0, -0.2, 0.2);
        let b2 = p(-1.0, 0.2, 0.2);
        assert!(wedge_contains(&a0, &ab1, &a2, &b0, &b2));
        assert!(!wedge_contains(&b0, &ab1, &b2, &a0, &a2));
        assert!(wedge_intersects(&a0, &ab1, &a2, &b0, &b2));
    }

    #[test]
    fn test_wedge_disjoint() {
        let ab1 = p(0.0, 0.0, 1.0);
        let a0 = p(1.0, 0.0, 0.2);
        let a2 = p(0.0, 1.0, 0.2);
        let b0 = p(-1.0, 0.0, 0.2);
        let b2 = p(0.0, -1.0, 0.2);
        assert!(!wedge_contains(&a0, &ab1, &a2, &b0, &b2));
        assert!(!wedge_intersects(&a0, &ab1, &a2, &b0, &b2));
    }

    #[test]
    fn test_wedge_contains_semiwedge() {
        let ab1 = p(0.0, 0.0, 1.0);
        let a0 = p(1.0, -1.0, 0.2);
        let a2 = p(-1.0, 1.0, 0.2);
        // A ray strictly inside the wedge.
        let inside = p(1.0, 0.5, 0.2);
        assert!(wedge_contains_semiwedge(&a0, &ab1, &a2, &inside, false));
        // A ray strictly outside.
        let outside = p(-1.0, -1.5, 0.2);
        assert!(!wedge_contains_semiwedge(&a0, &ab1, &a2, &outside, false));
        // A shared edge (b2 == a2): contained unless B is reversed.
        assert!(wedge_contains_semiwedge(&a0, &ab1, &a2, &a2, false));
        assert!(!wedge_contains_semiwedge(&a0, &ab1, &a2, &a2, true));
        // A reversed edge (b2 == a0): contained only if B is reversed.
        assert!(!wedge_contains_semiwedge(&a0, &ab1, &a2, &a0, false));
        assert!(wedge_contains_semiwedge(&a0, &ab1, &a2, &a0, true));
    }
}
