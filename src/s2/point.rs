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

use std::f64::consts::PI;

use cgmath::Matrix3;

use crate::r3::vector::Vector;
use crate::s1::angle::Angle;
use crate::s2::predicates::{robust_sign, Direction};

/// Point represents a point on the unit sphere as a normalized 3D vector.
///
/// Fields should be treated as read-only. Use one of the constructors to
/// create new values; arithmetic that leaves the unit sphere is done on the
/// inner vector.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Point(pub Vector);

impl Point {
    /// Creates a new normalized point from coordinates.
    pub fn from_coords(x: f64, y: f64, z: f64) -> Self {
        Point(Vector::new(x, y, z).normalize())
    }

    /// Returns a unique "origin" on the sphere for operations that need a
    /// fixed reference point. In particular, this is the "point at
    /// infinity" used for point-in-polygon testing: a loop stores whether
    /// it contains this point and counts edge crossings from it.
    ///
    /// The origin is not a point that is commonly used in edge endpoints,
    /// so crossing tests starting here rarely hit degeneracies.
    pub fn origin() -> Point {
        Point(Vector::new(
            -0.0099994664350250197,
            0.0025924542609324121,
            0.99994664350250195,
        ))
    }

    /// Reports whether this point is of approximately unit length.
    pub fn is_unit(&self) -> bool {
        const EPSILON: f64 = 5e-14;
        (self.0.norm2() - 1.0).abs() <= EPSILON
    }

    /// The angle between this point and the other.
    pub fn distance(&self, other: &Point) -> Angle {
        self.0.angle(&other.0)
    }

    /// Reports whether the two points are within the given angular
    /// distance of each other.
    pub fn approx_equal_with(&self, other: &Point, eps: f64) -> bool {
        self.0.angle(&other.0).rad() <= eps
    }

    /// Reports whether the two points are similar enough to be equal.
    pub fn approx_equal(&self, other: &Point) -> bool {
        self.approx_equal_with(other, 1e-15)
    }

    /// Returns a unit vector orthogonal to this point.
    pub fn ortho(&self) -> Point {
        Point(self.0.ortho())
    }

    pub fn normalize(&self) -> Point {
        Point(self.0.normalize())
    }

    pub fn cross(&self, other: &Point) -> Point {
        Point(self.0.cross(&other.0))
    }

    /// Returns a Point that is orthogonal to both this point and the other,
    /// robustly even for nearly identical or nearly antipodal inputs.
    /// Unlike the plain cross product, the result is never zero for
    /// distinct points, and satisfies
    /// `a.point_cross(b) == (-a).point_cross(-b)` and
    /// `a.point_cross(b) == -(b.point_cross(a))` for non-degenerate input.
    pub fn point_cross(&self, other: &Point) -> Point {
        // The direction of a x b becomes unstable as (a + b) or (a - b)
        // approaches zero, so we use (a + b) x (b - a) = 2 * (a x b)
        // which is numerically stable in both limits.
        let v = (self.0 + other.0).cross(&(other.0 - self.0));
        if v == Vector::default() {
            // The only result that makes sense mathematically is some
            // vector orthogonal to both inputs.
            return Point(self.0.ortho());
        }
        Point(v)
    }
}

/// Reports whether the edges OA, OB, and OC are encountered in that order
/// while sweeping CCW about the point O.
///
/// You can think of this as testing whether A <= B <= C with respect to the
/// CCW ordering around O that starts at A, or equivalently, whether B is
/// contained in the range of angles (inclusive) that starts at A and
/// extends CCW to C. Properties:
///
///  1. If ordered_ccw(a,b,c,o) && ordered_ccw(b,a,c,o), then a == b
///  2. If ordered_ccw(a,b,c,o) && ordered_ccw(a,c,b,o), then b == c
///  3. If ordered_ccw(a,b,c,o) && ordered_ccw(c,b,a,o), then a == b == c
///  4. If a == b or b == c, then ordered_ccw(a,b,c,o) is true
///  5. Otherwise if a == c, then ordered_ccw(a,b,c,o) is false
pub fn ordered_ccw(a: &Point, b: &Point, c: &Point, o: &Point) -> bool {
    let mut sum = 0;
    if robust_sign(b, o, a) != Direction::Clockwise {
        sum += 1;
    }
    if robust_sign(c, o, b) != Direction::Clockwise {
        sum += 1;
    }
    if robust_sign(a, o, c) == Direction::CounterClockwise {
        sum += 1;
    }
    sum >= 2
}

/// Returns the exterior angle at vertex B in the triangle ABC. The return
/// value is positive if ABC is counterclockwise and negative otherwise. If
/// you imagine an ant walking from A to B to C, this is the angle that the
/// ant turns at vertex B (positive = left = CCW).
///
/// Ensures that turn_angle(a,b,c) == -turn_angle(c,b,a) for all distinct
/// a,b,c. The result is undefined if (a == b || b == c), but is either
/// -pi or pi if (a == c). All points should be normalized.
pub fn turn_angle(a: &Point, b: &Point, c: &Point) -> f64 {
    // We use point_cross to get good accuracy when two points are very
    // close together, and robust_sign to ensure the sign is correct for
    // turning angles very close to 0 or +/-pi.
    let angle = a.point_cross(b).0.angle(&b.point_cross(c).0).rad();
    if robust_sign(a, b, c) == Direction::CounterClockwise {
        angle
    } else {
        -angle
    }
}

/// Returns the area of triangle ABC. This method combines two different
/// algorithms to get accurate results for both large and very small
/// triangles. The maximum error is about 5e-15 (about 0.25 square meters
/// on the Earth's surface), the same as girard_area below, but unlike that
/// method it is also accurate for small triangles.
pub fn area(a: &Point, b: &Point, c: &Point) -> f64 {
    let sa = b.0.angle(&c.0).rad();
    let sb = c.0.angle(&a.0).rad();
    let sc = a.0.angle(&b.0).rad();
    let s = 0.5 * (sa + sb + sc);
    if s >= 3e-4 {
        // This triangle is decently large, so consider whether Girard's
        // formula might be more accurate.
        let dmin = s - sa.max(sb.max(sc));
        if dmin < 1e-2 * s * s * s * s * s {
            // This triangle is skinny enough to consider using Girard.
            let ga = girard_area(a, b, c);
            if dmin < s * 0.1 * ga {
                return ga;
            }
        }
    }
    // Use l'Huilier's formula.
    4.0 * ((0.5 * s).tan()
        * (0.5 * (s - sa)).tan()
        * (0.5 * (s - sb)).tan()
        * (0.5 * (s - sc)).tan())
    .max(0.0)
    .sqrt()
    .atan()
}

/// Returns the area of the triangle computed using Girard's formula. This
/// is slightly faster than area() above but is also less accurate for
/// small triangles.
pub fn girard_area(a: &Point, b: &Point, c: &Point) -> f64 {
    // This is equivalent to the usual Girard's formula but is slightly more
    // accurate, faster to compute, and handles a == b == c without a
    // special case. point_cross is necessary to get good accuracy when two
    // of the vertices are very close together.
    let ab = a.point_cross(b);
    let bc = b.point_cross(c);
    let ac = a.point_cross(c);
    let area = ab.0.angle(&ac.0).rad() - ab.0.angle(&bc.0).rad() + bc.0.angle(&ac.0).rad();
    area.max(0.0)
}

/// Returns a positive value for counterclockwise triangles and a negative
/// value otherwise (the signed area of the triangle).
pub fn signed_area(a: &Point, b: &Point, c: &Point) -> f64 {
    area(a, b, c) * f64::from(robust_sign(a, b, c))
}

/// Returns the true centroid of the spherical triangle ABC multiplied by
/// the signed area of spherical triangle ABC. The result is not normalized.
///
/// The reasons for multiplying by the signed area are (1) this is the
/// quantity that needs to be summed to compute the centroid of a union or
/// difference of triangles, and (2) it's actually easier to calculate this
/// way. All points must have unit length.
pub fn true_centroid(a: &Point, b: &Point, c: &Point) -> Point {
    // Use angle to compute the edge lengths; this is much more accurate
    // than the dot product when the angles are small.
    let mut ra = 1.0;
    let sa = b.distance(c).rad();
    if sa != 0.0 {
        ra = sa / sa.sin();
    }
    let mut rb = 1.0;
    let sb = c.distance(a).rad();
    if sb != 0.0 {
        rb = sb / sb.sin();
    }
    let mut rc = 1.0;
    let sc = a.distance(b).rad();
    if sc != 0.0 {
        rc = sc / sc.sin();
    }

    // Now compute a point M such that:
    //
    //  [Ax Ay Az] [Mx]                       [ra]
    //  [Bx By Bz] [My]  = 0.5 * det(A,B,C) * [rb]
    //  [Cx Cy Cz] [Mz]                       [rc]
    //
    // To improve the numerical stability we subtract the first row (A) from
    // the other two rows; this reduces the cancellation error when A, B,
    // and C are very close together. Then we solve it using Cramer's rule.
    let x = Vector::new(a.0.x, b.0.x - a.0.x, c.0.x - a.0.x);
    let y = Vector::new(a.0.y, b.0.y - a.0.y, c.0.y - a.0.y);
    let z = Vector::new(a.0.z, b.0.z - a.0.z, c.0.z - a.0.z);
    let r = Vector::new(ra, rb - ra, rc - ra);

    Point(
        Vector::new(
            y.cross(&z).dot(&r),
            z.cross(&x).dot(&r),
            x.cross(&y).dot(&r),
        ) * 0.5,
    )
}

fn to_v3(v: Vector) -> cgmath::Vector3<f64> {
    cgmath::Vector3::new(v.x, v.y, v.z)
}

fn from_v3(v: cgmath::Vector3<f64>) -> Vector {
    Vector::new(v.x, v.y, v.z)
}

/// Returns the orthonormal frame for the given point on the unit sphere:
/// a right-handed coordinate frame of unit-length column vectors whose
/// third column is the point itself.
pub fn get_frame(p: &Point) -> Matrix3<f64> {
    let z = p.0;
    let y = z.ortho();
    let x = y.cross(&z);
    Matrix3::from_cols(to_v3(x), to_v3(y), to_v3(z))
}

/// Returns the coordinates of the given point in standard axis-aligned
/// basis from its orthonormal basis m.
pub fn from_frame(m: &Matrix3<f64>, q: &Point) -> Point {
    Point(from_v3((*m) * to_v3(q.0)))
}

/// Generates a slice of points shaped as a regular polygon with the given
/// number of vertices, all located on a circle of the specified angular
/// radius around the center of the given frame. The radius is the actual
/// distance from the frame's z-axis to each vertex.
pub fn regular_points_for_frame(frame: &Matrix3<f64>, radius: Angle, num_vertices: usize) -> Vec<Point> {
    // We construct the loop in the given frame coordinates, with the center
    // at (0, 0, 1). For a loop of radius r, the loop vertices have the form
    // (x, y, z) where x^2 + y^2 = sin(r)^2 and z = cos(r). The distance on
    // the sphere (arc length) from each vertex to the center is acos(cos(r)) = r.
    let z = radius.rad().cos();
    let r = radius.rad().sin();
    let radian_step = 2.0 * PI / (num_vertices as f64);

    let mut vertices = Vec::with_capacity(num_vertices);
    for i in 0..num_vertices {
        let angle = (i as f64) * radian_step;
        let p = Point(Vector::new(r * angle.cos(), r * angle.sin(), z));
        vertices.push(from_frame(frame, &p).normalize());
    }
    vertices
}
