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

//! Robust predicates for determining the orientation of point triples on
//! the sphere. The fast paths use plain floating point with certified
//! error bounds; the slow path evaluates the determinant in compensated
//! double-double precision and falls back to symbolic perturbation for
//! exactly degenerate inputs, so that every distinct triple gets a
//! definite, consistent orientation.

use std::cmp::Ordering;
use std::ops::Neg;

use crate::consts::DBL_EPSILON;
use crate::r3::vector::Vector;
use crate::s2::point::Point;

/// MAX_DETERMINANT_ERROR is the maximum error in computing (AxB).C where
/// all vectors are unit length. Using standard inequalities, it can be
/// shown that
///
///  fl(AxB) = AxB + D where |D| <= maxDeterminantError,
///
/// and similarly,
///
///  fl(AxB.C) = AxB.C + d where |d| <= maxDeterminantError.
pub const MAX_DETERMINANT_ERROR: f64 = 1.8274 * DBL_EPSILON;

/// DET_ERROR_MULTIPLIER is the factor to scale the magnitudes by when
/// checking for the sign of a set of points with certainty. Using a
/// similar technique to the one used for MAX_DETERMINANT_ERROR, the error
/// is at most:
///
///   |d| <= (3 + 6/sqrt(3)) * |A-C| * |B-C| * e
pub const DET_ERROR_MULTIPLIER: f64 = 3.2321 * DBL_EPSILON;

/// Direction is an orientation of an ordered set of vertices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Clockwise,
    Indeterminate,
    CounterClockwise,
}

impl Neg for Direction {
    type Output = Direction;
    fn neg(self) -> Direction {
        match self {
            Direction::Clockwise => Direction::CounterClockwise,
            Direction::Indeterminate => Direction::Indeterminate,
            Direction::CounterClockwise => Direction::Clockwise,
        }
    }
}

impl From<Direction> for f64 {
    fn from(d: Direction) -> f64 {
        match d {
            Direction::Clockwise => -1.0,
            Direction::Indeterminate => 0.0,
            Direction::CounterClockwise => 1.0,
        }
    }
}

impl Direction {
    fn from_sign(s: i32) -> Direction {
        match s.cmp(&0) {
            Ordering::Greater => Direction::CounterClockwise,
            Ordering::Less => Direction::Clockwise,
            Ordering::Equal => Direction::Indeterminate,
        }
    }

    fn mul(self, other: Direction) -> Direction {
        match other {
            Direction::CounterClockwise => self,
            Direction::Clockwise => -self,
            Direction::Indeterminate => Direction::Indeterminate,
        }
    }
}

/// Reports whether the points A, B, C are strictly counterclockwise, and
/// false if the points are clockwise or collinear (i.e. if they are all
/// contained on some great circle).
///
/// Due to numerical errors, situations may arise that are mathematically
/// impossible, e.g. ABC may be considered strictly CCW while BCA is not.
/// However, the implementation guarantees `sign(a,b,c) == !sign(c,b,a)`
/// for all distinct a, b, c.
pub fn sign(a: &Point, b: &Point, c: &Point) -> bool {
    // We compute the signed volume of the parallelepiped ABC. The usual
    // formula for this is (A x B) . C, but we compute it here using
    // (C x A) . B in order to ensure that ABC and CBA are not both CCW.
    // This follows from the following identities (which are true
    // numerically, not just mathematically):
    //
    //     (1) x x y == -(y x x)
    //     (2) -x . y == -(x . y)
    c.0.cross(&a.0).dot(&b.0) > 0.0
}

/// Returns a Direction representing the ordering of the points. The
/// result is CounterClockwise if the points are counterclockwise,
/// Clockwise if they are clockwise, and never Indeterminate for distinct,
/// non-identical points: exactly degenerate cases are resolved using
/// symbolic perturbation.
///
/// RobustSign satisfies the following conditions:
///
///  (1) robust_sign(a,b,c) == Indeterminate if and only if a == b, b == c, or c == a
///  (2) robust_sign(b,c,a) == robust_sign(a,b,c) for all a,b,c
///  (3) robust_sign(c,b,a) == -robust_sign(a,b,c) for all a,b,c
pub fn robust_sign(a: &Point, b: &Point, c: &Point) -> Direction {
    let sign = triage_sign(a, b, c);
    if sign == Direction::Indeterminate {
        return expensive_sign(a, b, c);
    }
    sign
}

/// Returns the direction sign of the points, or Indeterminate if the
/// determinant is too close to zero to be certain of its sign.
pub fn triage_sign(a: &Point, b: &Point, c: &Point) -> Direction {
    let det = a.0.cross(&b.0).dot(&c.0);
    if det > MAX_DETERMINANT_ERROR {
        return Direction::CounterClockwise;
    }
    if det < -MAX_DETERMINANT_ERROR {
        return Direction::Clockwise;
    }
    Direction::Indeterminate
}

/// Reports the direction sign of the points after performing more
/// expensive tests, escalating from a numerically stable recomputation to
/// exact arithmetic with symbolic perturbation.
pub fn expensive_sign(a: &Point, b: &Point, c: &Point) -> Direction {
    // Return Indeterminate if and only if two points are the same. This
    // ensures robust_sign(a,b,c) == Indeterminate iff a == b, b == c, or
    // c == a (i.e. case (1) of the robust_sign contract).
    if a == b || b == c || c == a {
        return Direction::Indeterminate;
    }

    let det_sign = stable_sign(a, b, c);
    if det_sign != Direction::Indeterminate {
        return det_sign;
    }
    exact_sign(a, b, c, true)
}

/// Reports the direction sign of the points using a numerically stable
/// recomputation that cyclically permutes the vertices so that the cross
/// product is taken between the two shortest edges, or Indeterminate when
/// the sign still cannot be certified.
pub fn stable_sign(a: &Point, b: &Point, c: &Point) -> Direction {
    let ab = b.0 - a.0;
    let ab2 = ab.norm2();
    let bc = c.0 - b.0;
    let bc2 = bc.norm2();
    let ca = a.0 - c.0;
    let ca2 = ca.norm2();

    // Now compute the determinant ((A-C)x(B-C)).C, where the vertices have
    // been cyclically permuted if necessary so that AB is the longest
    // edge. (This minimizes the magnitude of the cross product.)  At the
    // same time we also compute the maximum error in the determinant.

    // The two shortest edges, pointing away from the longest edge.
    let (e1, e2, op) = if ab2 >= bc2 && ab2 >= ca2 {
        // AB is the longest edge.
        (ca, bc, &c.0)
    } else if bc2 >= ca2 {
        // BC is the longest edge.
        (ab, ca, &a.0)
    } else {
        // CA is the longest edge.
        (bc, ab, &b.0)
    };

    let det = -(e1.cross(&e2).dot(op));
    let max_err = DET_ERROR_MULTIPLIER * (e1.norm2() * e2.norm2()).sqrt();

    if det > max_err {
        return Direction::CounterClockwise;
    }
    if det < -max_err {
        return Direction::Clockwise;
    }
    Direction::Indeterminate
}

/// Reports the direction sign of the points computed in extended
/// precision. If perturb is true, exactly degenerate (collinear) triples
/// are resolved using symbolic perturbation, so the result is never
/// Indeterminate for distinct points.
pub fn exact_sign(a: &Point, b: &Point, c: &Point, perturb: bool) -> Direction {
    // Sort the three points in lexicographic order, keeping track of the
    // sign of the permutation. (Each exchange inverts the sign of the
    // determinant.)
    let mut perm_sign = Direction::CounterClockwise;
    let mut pa = a;
    let mut pb = b;
    let mut pc = c;
    if pa.0.cmp(&pb.0) == Ordering::Greater {
        std::mem::swap(&mut pa, &mut pb);
        perm_sign = -perm_sign;
    }
    if pb.0.cmp(&pc.0) == Ordering::Greater {
        std::mem::swap(&mut pb, &mut pc);
        perm_sign = -perm_sign;
    }
    if pa.0.cmp(&pb.0) == Ordering::Greater {
        std::mem::swap(&mut pa, &mut pb);
        perm_sign = -perm_sign;
    }

    // Construct extended-precision versions of the sorted points and
    // evaluate the determinant sign of (B x C) . A.
    let b_cross_c = cross_xf(&pb.0, &pc.0);
    let det = dot_xf(&b_cross_c, &pa.0);
    let det_sign = det.sign();
    if det_sign != 0 {
        return perm_sign.mul(Direction::from_sign(det_sign));
    }
    if !perturb {
        return Direction::Indeterminate;
    }
    perm_sign.mul(symbolically_perturbed_sign(&pa.0, &pb.0, &pc.0, &b_cross_c))
}

/// The sign of the determinant of three points A, B, C under a model where
/// every possible point is perturbed by a distinct infinitesimal amount so
/// that no three perturbed points are collinear and no four of them are
/// coplanar. The perturbations are so small that they do not change the
/// sign of any determinant that was non-zero before, and the perturbed
/// determinant of three distinct points is never zero.
///
/// Requires the points to be sorted lexicographically and the determinant
/// of (B x C) . A to be exactly zero. The perturbation magnitudes strictly
/// decrease with the lexicographic position of each point and, within each
/// point, from the third coordinate to the first; the cascade below then
/// follows from expanding the perturbed determinant and testing the
/// coefficients in decreasing order of magnitude.
fn symbolically_perturbed_sign(a: &Vector, b: &Vector, c: &Vector, b_cross_c: &VectorXF) -> Direction {
    // det(M_1) = b_cross_c contribution from perturbing a[2], a[1], a[0].
    let mut det_sign = b_cross_c.z.sign();
    if det_sign != 0 {
        return Direction::from_sign(det_sign);
    }
    det_sign = b_cross_c.y.sign();
    if det_sign != 0 {
        return Direction::from_sign(det_sign);
    }
    det_sign = b_cross_c.x.sign();
    if det_sign != 0 {
        return Direction::from_sign(det_sign);
    }

    // Contributions from perturbing components of b.
    det_sign = det2_xf(c.x, a.y, c.y, a.x).sign(); // b[2]
    if det_sign != 0 {
        return Direction::from_sign(det_sign);
    }
    det_sign = sign_of(c.x); // b[2] * a[1]
    if det_sign != 0 {
        return Direction::from_sign(det_sign);
    }
    det_sign = -sign_of(c.y); // b[2] * a[0]
    if det_sign != 0 {
        return Direction::from_sign(det_sign);
    }
    det_sign = det2_xf(c.z, a.x, c.x, a.z).sign(); // b[1]
    if det_sign != 0 {
        return Direction::from_sign(det_sign);
    }
    det_sign = sign_of(c.z); // b[1] * a[0]
    if det_sign != 0 {
        return Direction::from_sign(det_sign);
    }
    // The remaining cases for b (c[1]*a[2] - c[2]*a[1] and its cofactors)
    // are redundant: the tests above guarantee that C is the zero vector
    // by this point, which cannot happen for a unit-length input.

    // Contributions from perturbing components of c.
    det_sign = det2_xf(a.x, b.y, a.y, b.x).sign(); // c[2]
    if det_sign != 0 {
        return Direction::from_sign(det_sign);
    }
    det_sign = -sign_of(b.x); // c[2] * a[1]
    if det_sign != 0 {
        return Direction::from_sign(det_sign);
    }
    det_sign = sign_of(b.y); // c[2] * a[0]
    if det_sign != 0 {
        return Direction::from_sign(det_sign);
    }
    det_sign = sign_of(a.x); // c[2] * b[1]
    if det_sign != 0 {
        return Direction::from_sign(det_sign);
    }
    Direction::CounterClockwise // c[2] * b[1] * a[0]
}

fn sign_of(x: f64) -> i32 {
    if x > 0.0 {
        1
    } else if x < 0.0 {
        -1
    } else {
        0
    }
}

// Compensated double-double arithmetic. Each value is represented as an
// unevaluated sum hi + lo with |lo| <= ulp(hi)/2. Products of two f64
// values are exact; sums and differences carry a relative error of about
// 2^-105, far below anything the coordinate data can encode, and inputs
// whose determinant terms are exactly representable (the degenerate cases
// that reach the symbolic fallback) incur no rounding at all.
#[derive(Debug, Clone, Copy)]
struct XF {
    hi: f64,
    lo: f64,
}

impl XF {
    fn from_product(a: f64, b: f64) -> XF {
        let hi = a * b;
        let lo = a.mul_add(b, -hi);
        XF { hi, lo }
    }

    fn add(self, other: XF) -> XF {
        let (s, e) = two_sum(self.hi, other.hi);
        quick_two_sum(s, e + self.lo + other.lo)
    }

    fn sub(self, other: XF) -> XF {
        self.add(XF {
            hi: -other.hi,
            lo: -other.lo,
        })
    }

    fn mul_f64(self, v: f64) -> XF {
        let p = XF::from_product(self.hi, v);
        quick_two_sum(p.hi, p.lo + self.lo * v)
    }

    fn sign(self) -> i32 {
        let s = self.hi + self.lo;
        sign_of(s)
    }
}

fn two_sum(a: f64, b: f64) -> (f64, f64) {
    let s = a + b;
    let bb = s - a;
    (s, (a - (s - bb)) + (b - bb))
}

fn quick_two_sum(a: f64, b: f64) -> XF {
    let s = a + b;
    XF { hi: s, lo: b - (s - a) }
}

#[derive(Debug, Clone, Copy)]
struct VectorXF {
    x: XF,
    y: XF,
    z: XF,
}

/// The exact 2x2 determinant a*b - c*d.
fn det2_xf(a: f64, b: f64, c: f64, d: f64) -> XF {
    XF::from_product(a, b).sub(XF::from_product(c, d))
}

fn cross_xf(a: &Vector, b: &Vector) -> VectorXF {
    VectorXF {
        x: det2_xf(a.y, b.z, a.z, b.y),
        y: det2_xf(a.z, b.x, a.x, b.z),
        z: det2_xf(a.x, b.y, a.y, b.x),
    }
}

fn dot_xf(a: &VectorXF, b: &Vector) -> XF {
    a.x.mul_f64(b.x).add(a.y.mul_f64(b.y)).add(a.z.mul_f64(b.z))
}
