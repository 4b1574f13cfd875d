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

use crate::consts::DBL_EPSILON;
use crate::r1;
use crate::r3::vector::Vector;
use crate::s1;
use crate::s1::angle::Angle;
use crate::s2::latlng::LatLng;
use crate::s2::point::Point;
use crate::s2::rect::Rect;

/// RectBounder computes a conservative bounding latitude-longitude
/// rectangle that contains a sequence of connected edges on the sphere.
/// The bound does not simply cover the vertices: the bounding latitudes of
/// a great-circle edge may be attained in the edge interior, and the
/// bounder accounts for that (with a small error margin folded into
/// `get_bound`).
#[derive(Debug)]
pub struct RectBounder {
    // The previous vertex in the chain.
    a: Point,
    // The previous vertex latitude longitude.
    a_ll: LatLng,
    bound: Rect,
}

impl Default for RectBounder {
    fn default() -> Self {
        Self::new()
    }
}

impl RectBounder {
    pub fn new() -> Self {
        RectBounder {
            a: Point::default(),
            a_ll: LatLng::default(),
            bound: Rect::empty(),
        }
    }

    /// Adds the given point to the chain. The Point must be unit length.
    pub fn add_point(&mut self, b: &Point) {
        let b_ll = LatLng::from_point(b);

        if self.bound.is_empty() {
            self.a = *b;
            self.a_ll = b_ll;
            self.bound = self.bound.add_point(&b_ll);
            return;
        }

        // First compute the cross product N = A x B robustly. This is the
        // normal to the great circle through A and B. We don't use
        // point_cross since that method returns an arbitrary vector
        // orthogonal to A if the two vectors are proportional, and we want
        // the zero vector in that case.
        let n = (self.a.0 - b.0).cross(&(self.a.0 + b.0)); // N = 2 * (A x B)

        // The relative error in N gets large as its norm gets very small
        // (i.e., when the two points are nearly identical or antipodal).
        // We handle this by choosing a maximum allowable error, and if the
        // error is greater than this we fall back to a different technique.
        // Since it turns out that the other sources of error in converting
        // the normal to a maximum latitude add up to at most 1.16 *
        // dblEpsilon, and it is desirable to have the total error be a
        // multiple of dblEpsilon, we have chosen to limit the maximum error
        // in the normal to 3.84 * dblEpsilon. It is possible to show that
        // the error is less than this when
        //
        // n.Norm() >= 8 * sqrt(3) / (3.84 - 0.5 - sqrt(3)) * dblEpsilon
        //          = 1.91346e-15 (about 8.618 * dblEpsilon)
        let n_norm = n.norm();
        if n_norm < 1.91346e-15 {
            // A and B are either nearly identical or nearly antipodal (to
            // within 4.309 * dblEpsilon, or about 6 nanometers on the
            // earth's surface).
            if self.a.0.dot(&b.0) < 0.0 {
                // The two points are nearly antipodal. The easiest solution
                // is to assume that the edge between A and B could go in
                // any direction around the sphere.
                self.bound = Rect::full();
            } else {
                // The two points are nearly identical (to within 4.309 *
                // dblEpsilon). In this case we can just use the bounding
                // rectangle of the points, since after the expansion done
                // by get_bound this Rect is guaranteed to include the
                // (lat,lng) values of all points along AB.
                self.bound = self
                    .bound
                    .union(&Rect::from_latlng(&self.a_ll).add_point(&b_ll));
            }
            self.a = *b;
            self.a_ll = b_ll;
            return;
        }

        // Compute the longitude range spanned by AB.
        let mut lng_ab = s1::interval::Interval::empty()
            .add_point(self.a_ll.lng.rad())
            .add_point(b_ll.lng.rad());
        if lng_ab.len() >= PI - 2.0 * DBL_EPSILON {
            // The points lie on nearly opposite lines of longitude to
            // within the maximum error of the calculation. The easiest
            // solution is to assume that AB could go on either side of the
            // pole.
            lng_ab = s1::interval::Interval::full();
        }

        // Next we compute the latitude range spanned by the edge AB. We
        // start with the range spanning the two endpoints of the edge.
        let mut lat_ab = r1::interval::Interval::from_point(self.a_ll.lat.rad())
            .add_point(b_ll.lat.rad());

        // This is the desired range unless the edge AB crosses the plane
        // through N and the Z-axis (which is where the great circle through
        // A and B attains its minimum and maximum latitudes). To test
        // whether AB crosses this plane, we compute a vector M
        // perpendicular to this plane and then project A and B onto it.
        let m = n.cross(&Vector::new(0.0, 0.0, 1.0));
        let m_a = m.dot(&self.a.0);
        let m_b = m.dot(&b.0);

        // We want to test the signs of mA and mB, so we need to bound the
        // error in these calculations. It is possible to show that the
        // total error is bounded by
        //
        //  (1 + sqrt(3)) * dblEpsilon * nNorm + 8 * sqrt(3) * (dblEpsilon**2)
        //    = 6.06638e-16 * nNorm + 6.83174e-31
        let m_error = 6.06638e-16 * n_norm + 6.83174e-31;

        if m_a * m_b < 0.0 || m_a.abs() <= m_error || m_b.abs() <= m_error {
            // Minimum/maximum latitude *may* occur in the edge interior.
            //
            // The maximum latitude is 90 degrees minus the latitude of N.
            // We compute this directly using atan2 in order to get maximum
            // accuracy near the poles.
            //
            // Our goal is to compute a bound that contains the computed
            // latitudes of all points P that pass the point-in-polygon
            // containment test. There are three sources of error to
            // consider:
            //
            //  - the directional error in N (at most 3.84 * dblEpsilon)
            //  - converting N to a maximum latitude
            //  - computing the latitude of the test point P
            //
            // The latter two sources of error are at most 0.955 *
            // dblEpsilon individually, but it is possible to show by a more
            // complex analysis that together they can add up to at most
            // 1.16 * dblEpsilon, for a total error of 5 * dblEpsilon.
            //
            // We add 3 * dblEpsilon to the bound here, and get_bound pads
            // the bound by another 2 * dblEpsilon.
            let max_lat = ((n.x * n.x + n.y * n.y).sqrt().atan2(n.z.abs()) + 3.0 * DBL_EPSILON)
                .min(PI / 2.0);

            // In order to get tight bounds when the two points are close
            // together, we also bound the min/max latitude relative to the
            // latitudes of the endpoints A and B. First we compute the
            // distance between A and B, and then we compute the maximum
            // change in latitude between any two points along the great
            // circle that are separated by this distance. This gives us a
            // latitude change "budget". Some of this budget must be spent
            // getting from A to B; the remainder bounds the round-trip
            // distance (in latitude) from A or B to the min or max latitude
            // attained along the edge AB.
            let lat_budget = 2.0 * (0.5 * (self.a.0 - b.0).norm() * max_lat.sin()).asin();
            let max_delta = 0.5 * (lat_budget - lat_ab.len()) + DBL_EPSILON;

            // Test whether AB passes through the point of maximum latitude
            // or minimum latitude. If the dot product(s) are small enough
            // then the result may be ambiguous.
            if m_a <= m_error && m_b >= -m_error {
                lat_ab.hi = max_lat.min(lat_ab.hi + max_delta);
            }
            if m_b <= m_error && m_a >= -m_error {
                lat_ab.lo = (-max_lat).max(lat_ab.lo - max_delta);
            }
        }

        self.a = *b;
        self.a_ll = b_ll;
        self.bound = self.bound.union(&Rect {
            lat: lat_ab,
            lng: lng_ab,
        });
    }

    /// Returns the bounding rectangle of the edge chain that connects the
    /// vertices defined so far. This bound satisfies the guarantee that if
    /// the edge chain defines a loop, then the bound contains the
    /// latitude-longitude coordinates of all points contained by the loop.
    pub fn get_bound(&self) -> Rect {
        // To save time, we ignore numerical errors in the computed LatLngs
        // while accumulating the bounds and then account for them here.
        //
        // LatLng(Point) has a maximum error of 0.955 * dblEpsilon in
        // latitude. In the worst case, we might have rounded "inwards" when
        // computing the bound and "outwards" when computing the latitude of
        // a contained point P, therefore we expand the latitude bounds by 2
        // * dblEpsilon in each direction. This is sufficient in longitude
        // as well, except near the poles where the longitude error can be
        // larger; polar_closure covers the cases where the bound touches a
        // pole.
        self.bound
            .expanded(&LatLng {
                lat: Angle(2.0 * DBL_EPSILON),
                lng: Angle(0.0),
            })
            .polar_closure()
    }
}

/// Expands a bounding rectangle such that it is guaranteed to contain the
/// bounds of any subregion whose bounds are computed using
/// RectBounder. For example, consider a loop L that defines a square.
/// get_bound ensures that if a point P is contained by this square, then
/// LatLng::from_point(P) is contained by the bound. But now consider a
/// diamond shaped loop S contained by L. It is possible that the bound of
/// S is slightly larger than the bound of L, which would invalidate using
/// the bounds as a containment pre-filter. This method expands the bound
/// of L so that it is guaranteed to contain the bounds of any subregion S.
pub fn expand_for_subregions(bound: &Rect) -> Rect {
    // Empty bounds don't need expansion.
    if bound.is_empty() {
        return *bound;
    }

    // First we need to check whether the bound B contains any
    // nearly-antipodal points (to within 4.309 * dblEpsilon). If so then we
    // need to return a full bound, since the subregion might have an edge
    // between two such points, and add_point returns Full for edges between
    // nearly-antipodal points.
    let lng_gap = (PI - bound.lng.len() - 2.5 * DBL_EPSILON).max(0.0);
    let min_abs_lat = bound.lat.lo.max(-bound.lat.hi);

    // The unions below would be simpler if the lat/lng gaps were stored as
    // angles from the respective boundaries, so compute those directly.
    let lat_gap_south = PI / 2.0 + bound.lat.lo;
    let lat_gap_north = PI / 2.0 - bound.lat.hi;

    if min_abs_lat >= 0.0 {
        // The bound does not straddle the equator; the closest antipodal
        // pair is then governed by the latitude closest to the equator
        // together with the longitude gap.
        if 2.0 * min_abs_lat + lng_gap < 1.354e-15 {
            return Rect::full();
        }
    } else if lng_gap >= PI / 2.0 {
        if lat_gap_south + lat_gap_north < 1.687e-15 {
            return Rect::full();
        }
    } else if lat_gap_south.max(lat_gap_north) * lng_gap < 1.765e-15 {
        return Rect::full();
    }

    // Next we need to check whether the subregion might contain any edges
    // that span (pi - 2 * dblEpsilon) radians or more in longitude, since
    // add_point sets the longitude bound to Full in that case. This
    // corresponds to testing whether (lngGap <= 0) in lngExpansion below.
    //
    // Otherwise, the maximum latitude error in add_point is 4.8 *
    // dblEpsilon. In the worst case, the errors when computing the
    // latitude bound for a subregion could go in the opposite direction as
    // the errors when computing the bound for the original region, so we
    // need to double this value. (More analysis shows that it's okay to
    // round down to a multiple of dblEpsilon.)
    //
    // For longitude, we rely on the fact that atan2 is correctly rounded
    // and therefore no additional bounds expansion is necessary.
    let lat_expansion = 9.0 * DBL_EPSILON;
    let lng_expansion = if lng_gap <= 0.0 { PI } else { 0.0 };
    bound
        .expanded(&LatLng {
            lat: Angle(lat_expansion),
            lng: Angle(lng_expansion),
        })
        .polar_closure()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bound_for_points(pts: &[Point]) -> Rect {
        let mut bounder = RectBounder::new();
        for p in pts {
            bounder.add_point(p);
        }
        bounder.get_bound()
    }

    #[test]
    fn test_max_latitude_on_edge_interior() {
        // An edge whose midpoint reaches a higher latitude than either
        // endpoint: from (lat=45, lng=-90) to (lat=45, lng=90) ... that arc
        // passes over the pole, so use a shorter one instead.
        let a = LatLng::from_degrees(45.0, -10.0).to_point();
        let b = LatLng::from_degrees(45.0, 10.0).to_point();
        let bound = bound_for_points(&[a, b]);
        // The maximum latitude is attained at the midpoint of the edge.
        let mid = Point((a.0 + b.0).normalize());
        let mid_lat = crate::s2::latlng::latitude(&mid).rad();
        assert!(mid_lat > Angle::from(crate::s1::angle::Deg(45.0)).rad());
        assert!(bound.lat.hi >= mid_lat);
        // And the bound is not wildly larger than necessary.
        assert!(bound.lat.hi < mid_lat + 1e-10);
    }

    #[test]
    fn test_endpoints_contained() {
        let pts = [
            LatLng::from_degrees(10.0, 10.0).to_point(),
            LatLng::from_degrees(-20.0, 40.0).to_point(),
            LatLng::from_degrees(5.0, 80.0).to_point(),
        ];
        let bound = bound_for_points(&pts);
        for p in &pts {
            assert!(bound.contains_point(p));
        }
    }

    #[test]
    fn test_nearly_identical_points() {
        let a = Point::from_coords(1.0, 0.0, 0.0);
        let b = Point(Vector::new(1.0, 1e-16, 0.0));
        let bound = bound_for_points(&[a, b]);
        assert!(!bound.is_full());
        assert!(bound.contains_point(&a));
    }

    #[test]
    fn test_nearly_antipodal_points() {
        let a = Point::from_coords(1.0, 0.0, 0.0);
        let b = Point(Vector::new(-1.0, 1e-16, 0.0));
        let bound = bound_for_points(&[a, b]);
        assert!(bound.is_full());
    }

    #[test]
    fn test_expand_for_subregions() {
        // A small rect far from the poles expands by only a tiny margin.
        let small = bound_for_points(&[
            LatLng::from_degrees(0.0, 0.0).to_point(),
            LatLng::from_degrees(1.0, 1.0).to_point(),
        ]);
        let expanded = expand_for_subregions(&small);
        assert!(expanded.contains(&small));
        assert!(!expanded.is_full());
        // A bound covering almost the whole sphere must become full.
        let huge = Rect {
            lat: r1::interval::Interval::new(-PI / 2.0, PI / 2.0 - 1e-16),
            lng: s1::interval::Interval::full(),
        };
        assert!(expand_for_subregions(&huge).is_full());
    }
}
