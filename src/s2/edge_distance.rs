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

//! Distances between points and geodesic edges.

use crate::s1::angle::Angle;
use crate::s2::point::Point;
use crate::s2::predicates::sign;

/// Returns the point along the edge AB that is closest to X.
pub fn project(x: &Point, a: &Point, b: &Point) -> Point {
    let a_xb = a.point_cross(b);
    // Find the closest point to X along the great circle through AB.
    let p = Point(x.0 - a_xb.0 * (x.0.dot(&a_xb.0) / a_xb.0.norm2()));

    // If this point is on the edge AB, then it's the closest point.
    if sign(&a_xb, a, &p) && sign(&p, b, &a_xb) {
        return p.normalize();
    }

    // Otherwise, the closest point is either A or B.
    if (x.0 - a.0).norm2() <= (x.0 - b.0).norm2() {
        *a
    } else {
        *b
    }
}

/// Returns the distance of X from the edge AB.
pub fn distance_from_segment(x: &Point, a: &Point, b: &Point) -> Angle {
    x.distance(&project(x, a, b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::f64_eq;

    fn p(x: f64, y: f64, z: f64) -> Point {
        Point::from_coords(x, y, z)
    }

    #[test]
    fn test_interior_projection() {
        // X directly above the midpoint of an equatorial edge.
        let a = p(1.0, -1.0, 0.0);
        let b = p(1.0, 1.0, 0.0);
        let x = p(1.0, 0.0, 0.3);
        let closest = project(&x, &a, &b);
        assert!(closest.approx_equal(&p(1.0, 0.0, 0.0)));
        assert!(f64_eq(
            distance_from_segment(&x, &a, &b).rad(),
            x.distance(&closest).rad()
        ));
    }

    #[test]
    fn test_endpoint_projection() {
        let a = p(1.0, -1.0, 0.0);
        let b = p(1.0, 1.0, 0.0);
        // X beyond the A endpoint.
        let x = p(0.0, -1.0, 0.0);
        assert_eq!(project(&x, &a, &b), a);
        // X beyond the B endpoint.
        let y = p(0.0, 1.0, 0.0);
        assert_eq!(project(&y, &a, &b), b);
    }

    #[test]
    fn test_zero_distance_on_edge() {
        let a = p(1.0, -1.0, 0.0);
        let b = p(1.0, 1.0, 0.0);
        let x = p(1.0, 0.5, 0.0);
        assert!(distance_from_segment(&x, &a, &b).rad() < 1e-15);
    }
}
