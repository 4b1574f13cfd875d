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

//! Edge clipping against cube faces and (u,v) rectangles. Edges are
//! clipped conservatively: the clipped result always covers the true
//! intersection of the edge with the clip region, possibly with a little
//! extra, so that indexing and intersection tests never miss an edge.

use crate::consts::DBL_EPSILON;
use crate::r2::point::Point as R2Point;
use crate::r2::rect::Rect as R2Rect;
use crate::s2::point::Point;
use crate::s2::stuv::{face, face_xyz_to_uvw, valid_face_xyz_to_uv};

/// The maximum error in a clipped u- or v-coordinate compared to the exact
/// result, assuming that the points A and B are in the rectangle
/// [-1,1]x[-1,1] or slightly outside it (by 1e-10 or less).
pub const EDGE_CLIP_ERROR_UV_COORD: f64 = 2.25 * DBL_EPSILON;

/// The maximum angle between a returned vertex and the nearest point on
/// the exact edge AB when clipping to a face, expressed as the maximum
/// error in an individual u- or v-coordinate.
pub const FACE_CLIP_ERROR_UV_COORD: f64 = 9.0 * (1.0 / std::f64::consts::SQRT_2) * DBL_EPSILON;

/// The maximum error in edge_intersects_rect: if the edge passes within
/// this distance of a rectangle edge, the result may be incorrect.
pub const INTERSECTS_RECT_ERROR_UV_DIST: f64 = 3.0 * std::f64::consts::SQRT_2 * DBL_EPSILON;

/// Clips the edge AB to the given face, returning the portion of the edge
/// in (u,v)-space, where the face square has been expanded by the given
/// padding on each side. Returns None if the edge does not intersect the
/// padded face square.
///
/// The gnomonic projection of the edge's great circle onto the face plane
/// is a straight line; the projection of the edge itself is the portion of
/// that line corresponding to the sub-arc lying in the face's open
/// hemisphere. When an endpoint lies outside that hemisphere, its
/// projection recedes to infinity along the line, so the visible portion
/// is bounded by the arc's crossings of the hemisphere boundary instead.
pub fn clip_to_padded_face(
    a: &Point,
    b: &Point,
    f: u8,
    padding: f64,
) -> Option<(R2Point, R2Point)> {
    // Fast path: both endpoints are on the given face.
    if face(&a.0) == f && face(&b.0) == f {
        let (au, av) = valid_face_xyz_to_uv(f, &a.0);
        let (bu, bv) = valid_face_xyz_to_uv(f, &b.0);
        let limit = 1.0 + padding;
        let a_uv = R2Point::new(au, av);
        let b_uv = R2Point::new(bu, bv);
        if au.abs() <= limit && av.abs() <= limit && bu.abs() <= limit && bv.abs() <= limit {
            return Some((a_uv, b_uv));
        }
        let clip = padded_square(padding);
        return clip_uv_segment(&a_uv, &b_uv, &clip);
    }

    // Convert everything into the (u,v,w) coordinates of the given face.
    // Note that the cross product must be computed in the original (x,y,z)
    // coordinate system, since point_cross resolves degeneracies with
    // symbolic perturbations that are coordinate-system dependent.
    let a_uvw = face_xyz_to_uvw(f, a).0;
    let b_uvw = face_xyz_to_uvw(f, b).0;
    let n_uvw = face_xyz_to_uvw(f, &a.point_cross(b)).0;

    let clip = padded_square(padding);

    if a_uvw.z > 0.0 && b_uvw.z > 0.0 {
        // Both endpoints are in the face's open hemisphere (which is
        // geodesically convex, so the whole edge is too): the projection
        // is the straight segment between the projected endpoints.
        let a_uv = R2Point::new(a_uvw.x / a_uvw.z, a_uvw.y / a_uvw.z);
        let b_uv = R2Point::new(b_uvw.x / b_uvw.z, b_uvw.y / b_uvw.z);
        return clip_uv_segment(&a_uv, &b_uv, &clip);
    }

    // At least one endpoint lies behind the face plane. Determine the
    // portion of the edge within the hemisphere w > 0 by intersecting the
    // edge's great circle with the boundary circle w = 0; the visible
    // portion (if any) projects onto the line
    // {(u,v) : nu*u + nv*v + nw = 0}, unbounded on each side whose
    // endpoint is at or behind the plane.
    let (p0, d, mut t0, mut t1) = clip_line_params(n_uvw.x, n_uvw.y, n_uvw.z, &clip)?;

    // The two points where the great circle crosses w = 0.
    let boundary = n_uvw.cross(&crate::r3::vector::Vector::new(0.0, 0.0, 1.0));
    if boundary == crate::r3::vector::Vector::default() {
        // The great circle coincides with the hemisphere boundary; no
        // visible portion.
        return None;
    }
    let on_arc = |p: &crate::r3::vector::Vector| -> bool {
        // p lies on the great circle; it is on the minor arc AB when it is
        // between A and B with respect to the circle normal.
        a_uvw.cross(p).dot(&n_uvw) >= 0.0 && p.cross(&b_uvw).dot(&n_uvw) >= 0.0
    };

    let a_visible = a_uvw.z > 0.0;
    let b_visible = b_uvw.z > 0.0;
    if !a_visible && !b_visible {
        // The edge is visible only if it wraps through the hemisphere,
        // entering and leaving through the boundary circle. In that case
        // its projection covers the whole line; otherwise there is none.
        if !(on_arc(&boundary) && on_arc(&-boundary)) {
            return None;
        }
    } else {
        // Exactly one endpoint is visible; its projection bounds the
        // visible portion on one side, and the other side recedes to
        // infinity toward the boundary crossing where the arc exits the
        // hemisphere.
        let v = if a_visible { a_uvw } else { b_uvw };
        let v_uv = R2Point::new(v.x / v.z, v.y / v.z);
        let tv = line_parameter(&p0, &d, &v_uv);
        let c = {
            let cb = boundary.normalize();
            if on_arc(&cb) {
                cb
            } else {
                -cb
            }
        };
        // As the arc approaches its exit crossing c, the projection moves
        // arbitrarily far along the line in the direction of (c.u, c.v);
        // only the sign relative to the line direction matters.
        if d.x * c.x + d.y * c.y > 0.0 {
            t0 = t0.max(tv);
        } else {
            t1 = t1.min(tv);
        }
        if t0 > t1 {
            return None;
        }
    }
    Some((p0 + d * t0, p0 + d * t1))
}

fn padded_square(padding: f64) -> R2Rect {
    let limit = 1.0 + padding;
    R2Rect::from_points(&[R2Point::new(-limit, -limit), R2Point::new(limit, limit)])
}

/// Clips the straight segment AB in (u,v)-space to the given rectangle,
/// expanded by a small error margin so that edges running exactly along a
/// boundary are retained. Returns None when the segment misses the
/// rectangle entirely.
pub fn clip_uv_segment(a: &R2Point, b: &R2Point, rect: &R2Rect) -> Option<(R2Point, R2Point)> {
    let clip = rect.expanded_by_margin(EDGE_CLIP_ERROR_UV_COORD);
    let d = *b - *a;
    let mut t0: f64 = 0.0;
    let mut t1: f64 = 1.0;

    // Liang-Barsky parametric clipping: each rectangle side contributes a
    // half-plane constraint on the parameter t of a + t*(b-a).
    let checks = [
        (-d.x, a.x - clip.x.lo),
        (d.x, clip.x.hi - a.x),
        (-d.y, a.y - clip.y.lo),
        (d.y, clip.y.hi - a.y),
    ];
    for &(p, q) in &checks {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
            continue;
        }
        let r = q / p;
        if p < 0.0 {
            t0 = t0.max(r);
        } else {
            t1 = t1.min(r);
        }
        if t0 > t1 {
            return None;
        }
    }
    Some((*a + d * t0, *a + d * t1))
}

/// Computes the parametric form p0 + t*d of the infinite line
/// {(u,v) : nu*u + nv*v + nw = 0} and its clip range [t0, t1] against the
/// given rectangle (expanded by the face clip error). Returns None when
/// the line misses the rectangle or is degenerate.
fn clip_line_params(
    nu: f64,
    nv: f64,
    nw: f64,
    rect: &R2Rect,
) -> Option<(R2Point, R2Point, f64, f64)> {
    let norm2 = nu * nu + nv * nv;
    if norm2 == 0.0 {
        return None;
    }
    // A point on the line, and the line direction.
    let p0 = R2Point::new(-nw * nu / norm2, -nw * nv / norm2);
    let d = R2Point::new(-nv, nu);

    let clip = rect.expanded_by_margin(FACE_CLIP_ERROR_UV_COORD);
    let mut t0 = f64::NEG_INFINITY;
    let mut t1 = f64::INFINITY;
    let checks = [
        (-d.x, p0.x - clip.x.lo),
        (d.x, clip.x.hi - p0.x),
        (-d.y, p0.y - clip.y.lo),
        (d.y, clip.y.hi - p0.y),
    ];
    for &(p, q) in &checks {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
            continue;
        }
        let r = q / p;
        if p < 0.0 {
            t0 = t0.max(r);
        } else {
            t1 = t1.min(r);
        }
        if t0 > t1 {
            return None;
        }
    }
    Some((p0, d, t0, t1))
}

/// The parameter t of the point p along the line p0 + t*d.
fn line_parameter(p0: &R2Point, d: &R2Point, p: &R2Point) -> f64 {
    ((p.x - p0.x) * d.x + (p.y - p0.y) * d.y) / (d.x * d.x + d.y * d.y)
}

/// Reports whether the straight (u,v) segment AB intersects the given
/// closed rectangle.
pub fn edge_intersects_rect(a: &R2Point, b: &R2Point, r: &R2Rect) -> bool {
    // First check whether the bound of AB intersects the rectangle.
    if !r.intersects(&R2Rect::from_points(&[*a, *b])) {
        return false;
    }

    // Otherwise AB intersects the rectangle if and only if all four of its
    // vertices are not on the same open side of the line through AB. We
    // test this by finding the two vertices with the minimum and maximum
    // projection onto the normal of AB.
    let n = R2Point::new(-(b.y - a.y), b.x - a.x);
    let i = usize::from(n.x >= 0.0);
    let j = usize::from(n.y >= 0.0);
    let vertex = |i: usize, j: usize| {
        R2Point::new(
            if i == 0 { r.x.lo } else { r.x.hi },
            if j == 0 { r.y.lo } else { r.y.hi },
        )
    };
    let max = n.x * (vertex(i, j).x - a.x) + n.y * (vertex(i, j).y - a.y);
    let min = n.x * (vertex(1 - i, 1 - j).x - a.x) + n.y * (vertex(1 - i, 1 - j).y - a.y);
    max >= 0.0 && min <= 0.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::r1::interval::Interval;

    fn rect(x_lo: f64, y_lo: f64, x_hi: f64, y_hi: f64) -> R2Rect {
        R2Rect::from_intervals(Interval::new(x_lo, x_hi), Interval::new(y_lo, y_hi))
    }

    #[test]
    fn test_clip_uv_segment() {
        let r = rect(-1.0, -1.0, 1.0, 1.0);
        // A segment passing straight through.
        let (a, b) =
            clip_uv_segment(&R2Point::new(-2.0, 0.0), &R2Point::new(2.0, 0.0), &r).unwrap();
        assert!((a.x + 1.0).abs() < 1e-12 && (b.x - 1.0).abs() < 1e-12);
        // A segment fully inside.
        let inside =
            clip_uv_segment(&R2Point::new(-0.5, -0.5), &R2Point::new(0.5, 0.5), &r).unwrap();
        assert_eq!(inside.0, R2Point::new(-0.5, -0.5));
        assert_eq!(inside.1, R2Point::new(0.5, 0.5));
        // A segment that misses.
        assert!(clip_uv_segment(&R2Point::new(-2.0, 2.0), &R2Point::new(2.0, 2.0), &r).is_none());
    }

    #[test]
    fn test_edge_intersects_rect() {
        let r = rect(0.0, 0.0, 1.0, 1.0);
        assert!(edge_intersects_rect(
            &R2Point::new(-1.0, 0.5),
            &R2Point::new(2.0, 0.5),
            &r
        ));
        // A diagonal line passing near but outside a corner.
        assert!(!edge_intersects_rect(
            &R2Point::new(1.5, 0.0),
            &R2Point::new(0.0, 1.5),
            &r
        ));
        // The same line moved inward cuts the corner.
        assert!(edge_intersects_rect(
            &R2Point::new(1.2, 0.0),
            &R2Point::new(0.0, 1.2),
            &r
        ));
    }

    #[test]
    fn test_clip_to_padded_face_same_face() {
        // A short edge near the center of face 0.
        let a = Point::from_coords(1.0, 0.1, 0.1);
        let b = Point::from_coords(1.0, -0.1, 0.2);
        let (a_uv, b_uv) = clip_to_padded_face(&a, &b, 0, 0.0).unwrap();
        assert!((a_uv.x - 0.1).abs() < 1e-12 && (a_uv.y - 0.1).abs() < 1e-12);
        assert!((b_uv.x + 0.1).abs() < 1e-12 && (b_uv.y - 0.2).abs() < 1e-12);
    }

    #[test]
    fn test_clip_to_padded_face_crossing_faces() {
        // An edge from face 0 to face 1 must produce a clip on both faces,
        // meeting near the shared boundary u=1 of face 0.
        let a = Point::from_coords(1.0, 0.2, 0.0);
        let b = Point::from_coords(0.2, 1.0, 0.0);
        let clip0 = clip_to_padded_face(&a, &b, 0, 0.0).unwrap();
        let clip1 = clip_to_padded_face(&a, &b, 1, 0.0).unwrap();
        let max_u0 = clip0.0.x.max(clip0.1.x);
        assert!((max_u0 - 1.0).abs() < 1e-9);
        let min_u1 = clip1.0.x.min(clip1.1.x);
        assert!((min_u1 + 1.0).abs() < 1e-9);
        // A face whose plane the edge's great circle never approaches is
        // missed entirely.
        assert!(clip_to_padded_face(&a, &b, 2, 0.0).is_none());
    }
}
