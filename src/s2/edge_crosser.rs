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

use crate::consts::DBL_EPSILON;
use crate::s2::edge_crossings::{vertex_crossing, Crossing};
use crate::s2::point::Point;
use crate::s2::predicates::{expensive_sign, robust_sign, triage_sign, Direction};

/// EdgeCrosser allows edges to be efficiently tested for intersection with
/// a given fixed edge AB. It is especially efficient when testing for
/// intersection with an edge chain connecting vertices v0, v1, v2, ...:
/// the answer for the previous chain vertex is reused as the starting
/// state for the next edge.
#[derive(Debug, Clone)]
pub struct EdgeCrosser {
    a: Point,
    b: Point,

    // To reduce the number of calls to expensive_sign, we compute an
    // outward-facing tangent at A and B if necessary. If the plane
    // perpendicular to one of these tangents separates AB from CD (i.e.,
    // one edge on each side) then there is no intersection.
    a_tangent: Point, // Outward-facing tangent at A.
    b_tangent: Point, // Outward-facing tangent at B.

    // The fields below are updated for each vertex in the chain.
    c: Point,       // Previous vertex in the vertex chain.
    acb: Direction, // The orientation of triangle ACB.
}

impl EdgeCrosser {
    /// Returns an EdgeCrosser with the fixed edge AB.
    pub fn new(a: &Point, b: &Point) -> EdgeCrosser {
        let norm = a.point_cross(b);
        EdgeCrosser {
            a: *a,
            b: *b,
            a_tangent: Point(a.0.cross(&norm.0)),
            b_tangent: Point(norm.0.cross(&b.0)),
            c: Point::default(),
            acb: Direction::Indeterminate,
        }
    }

    /// A convenience constructor that uses AB as the fixed edge and C as
    /// the first vertex of the vertex chain (equivalent to calling
    /// restart_at(c)).
    pub fn new_chain_edge_crosser(a: &Point, b: &Point, c: &Point) -> EdgeCrosser {
        let mut e = EdgeCrosser::new(a, b);
        e.restart_at(c);
        e
    }

    /// Reports whether the edge AB intersects the edge CD. If any two
    /// vertices from different edges are the same, returns Maybe. If
    /// either edge is degenerate (A == B or C == D), returns either
    /// DoNotCross or Maybe.
    pub fn crossing_sign(&mut self, c: &Point, d: &Point) -> Crossing {
        if *c != self.c {
            self.restart_at(c);
        }
        self.chain_crossing_sign(d)
    }

    /// Reports whether crossing_sign(c, d) > 0, or AB and CD share a
    /// vertex and vertex_crossing(a, b, c, d) is true. This is used for
    /// implementing point-in-polygon containment tests by counting.
    pub fn edge_or_vertex_crossing(&mut self, c: &Point, d: &Point) -> bool {
        if *c != self.c {
            self.restart_at(c);
        }
        self.edge_or_vertex_chain_crossing(d)
    }

    /// Sets the current chain vertex of the edge crosser to be c. Call
    /// this method when your chain jumps to a new place.
    pub fn restart_at(&mut self, c: &Point) {
        self.c = *c;
        self.acb = -triage_sign(&self.a, &self.b, &self.c);
    }

    /// Like crossing_sign, but uses the last vertex passed to one of the
    /// crossing methods (or restart_at) as the first vertex of the
    /// current edge.
    pub fn chain_crossing_sign(&mut self, d: &Point) -> Crossing {
        // For there to be an edge crossing, the triangles ACB, CBD, BDA,
        // DAC must all be oriented the same way (CW or CCW). We keep the
        // orientation of ACB as part of our state. When each new point D
        // arrives, we compute the orientation of BDA and check whether it
        // matches ACB. This checks whether the points C and D are on
        // opposite sides of the great circle through AB.

        // Recall that triage_sign is invariant with respect to rotating
        // its arguments, i.e. ABD has the same orientation as BDA.
        let bda = triage_sign(&self.a, &self.b, d);
        if self.acb == -bda && bda != Direction::Indeterminate {
            // The most common case: triangles have opposite orientations.
            // Save the current vertex D as the next vertex C, and also
            // save the orientation of the new triangle ACB (which is
            // opposite to the current triangle BDA).
            self.c = *d;
            self.acb = -bda;
            return Crossing::DoNotCross;
        }
        self.crossing_sign_internal(d, bda)
    }

    /// Like edge_or_vertex_crossing, but uses the last vertex passed to
    /// one of the crossing methods (or restart_at) as the first vertex of
    /// the current edge.
    pub fn edge_or_vertex_chain_crossing(&mut self, d: &Point) -> bool {
        // We need to copy the current vertex since it is clobbered by
        // chain_crossing_sign.
        let c = self.c;
        match self.chain_crossing_sign(d) {
            Crossing::DoNotCross => false,
            Crossing::Cross => true,
            Crossing::Maybe => vertex_crossing(&self.a, &self.b, &c, d),
        }
    }

    /// Handles the slow path of crossing_sign.
    fn crossing_sign_internal(&mut self, d: &Point, mut bda: Direction) -> Crossing {
        // At this point, a very common situation is that A,B,C,D are four
        // points on a line such that AB does not overlap CD. (For example,
        // this happens when a line or curve is sampled finely, or when
        // geometry is constructed by computing the union of cell ids.)
        // Most of the time, we can determine that AB and CD do not
        // intersect using the two outward-facing tangents at A and B
        // (parallel to AB) and testing whether AB and CD are on opposite
        // sides of the plane perpendicular to one of these tangents. This
        // is moderately expensive but still much cheaper than
        // expensive_sign.

        // The error in point_cross is insignificant. The maximum error in
        // the call to cross (i.e., the maximum norm of the error vector)
        // is (0.5 + 1/sqrt(3)) * dblEpsilon. The maximum error in each
        // call to dot below is dblEpsilon. (There is also a small relative
        // error term that is insignificant because we are comparing the
        // result against a constant that is very close to zero.)
        let max_error = (1.5 + 1.0 / 3.0f64.sqrt()) * DBL_EPSILON;
        let result;

        if (self.c.0.dot(&self.a_tangent.0) > max_error && d.0.dot(&self.a_tangent.0) > max_error)
            || (self.c.0.dot(&self.b_tangent.0) > max_error
                && d.0.dot(&self.b_tangent.0) > max_error)
        {
            result = Crossing::DoNotCross;
        } else if self.a == self.c || self.a == *d || self.b == self.c || self.b == *d {
            // Two vertices from different edges are the same. (These cases
            // could be handled below, but we would rather avoid calling
            // expensive_sign when possible.)
            result = Crossing::Maybe;
        } else if self.a == self.b || self.c == *d {
            // An input edge is degenerate. (Note that in most cases, if CD
            // is degenerate then this method is not even called because
            // acb and bda have different signs.)
            result = Crossing::DoNotCross;
        } else {
            // Otherwise it's time to break out the big guns.
            if self.acb == Direction::Indeterminate {
                self.acb = -expensive_sign(&self.a, &self.b, &self.c);
            }
            if bda == Direction::Indeterminate {
                bda = expensive_sign(&self.a, &self.b, d);
            }

            if bda != self.acb {
                result = Crossing::DoNotCross;
            } else {
                let cbd = -robust_sign(&self.c, d, &self.b);
                if cbd != self.acb {
                    result = Crossing::DoNotCross;
                } else {
                    let dac = robust_sign(&self.c, d, &self.a);
                    if dac != self.acb {
                        result = Crossing::DoNotCross;
                    } else {
                        result = Crossing::Cross;
                    }
                }
            }
        }

        self.c = *d;
        self.acb = -bda;
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::s2::edge_crossings::crossing_sign;

    fn p(x: f64, y: f64, z: f64) -> Point {
        Point::from_coords(x, y, z)
    }

    #[test]
    fn test_chain_crossings() {
        // A fixed edge across the equator, tested against a chain that
        // alternates sides.
        let a = p(1.0, -0.1, 0.0);
        let b = p(1.0, 0.1, 0.0);
        let chain = [
            p(1.0, -0.05, 0.2),
            p(1.0, 0.0, -0.2),
            p(1.0, 0.05, 0.2),
            p(1.0, 0.2, 0.3),
        ];
        let mut crosser = EdgeCrosser::new_chain_edge_crosser(&a, &b, &chain[0]);
        let mut crossings = 0;
        for d in &chain[1..] {
            if crosser.edge_or_vertex_chain_crossing(d) {
                crossings += 1;
            }
        }
        // The chain crosses AB twice (once down, once back up), then stays
        // on one side.
        assert_eq!(crossings, 2);
    }

    #[test]
    fn test_chain_matches_single_shot() {
        let a = p(0.3, 1.0, 0.2);
        let b = p(-0.2, 1.0, -0.4);
        let pts = [
            p(0.0, 1.0, 0.5),
            p(0.2, 1.0, -0.5),
            p(-0.5, 1.0, 0.1),
            p(0.4, 1.0, 0.3),
        ];
        let mut crosser = EdgeCrosser::new_chain_edge_crosser(&a, &b, &pts[0]);
        for i in 1..pts.len() {
            let chained = crosser.chain_crossing_sign(&pts[i]);
            assert_eq!(chained, crossing_sign(&a, &b, &pts[i - 1], &pts[i]));
        }
    }

    #[test]
    fn test_degenerate_edges() {
        let a = p(1.0, 0.0, 0.0);
        let b = p(0.0, 1.0, 0.0);
        let c = p(0.0, 0.0, 1.0);
        // Degenerate CD.
        let mut crosser = EdgeCrosser::new(&a, &b);
        assert_ne!(crosser.crossing_sign(&c, &c), Crossing::Cross);
        // Shared vertices give Maybe.
        let mut crosser = EdgeCrosser::new(&a, &b);
        assert_eq!(crosser.crossing_sign(&a, &c), Crossing::Maybe);
    }
}
