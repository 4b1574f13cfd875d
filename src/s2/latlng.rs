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

use crate::r3::vector::Vector;
use crate::s1::angle::{Angle, Deg};
use crate::s2::point::Point;

/// LatLng represents a point on the unit sphere as a pair of angles.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LatLng {
    pub lat: Angle,
    pub lng: Angle,
}

impl LatLng {
    pub fn new(lat: Angle, lng: Angle) -> Self {
        LatLng { lat, lng }
    }

    pub fn from_degrees(lat: f64, lng: f64) -> Self {
        LatLng {
            lat: Angle::from(Deg(lat)),
            lng: Angle::from(Deg(lng)),
        }
    }

    pub fn from_radians(lat: f64, lng: f64) -> Self {
        LatLng {
            lat: Angle(lat),
            lng: Angle(lng),
        }
    }

    pub fn from_point(p: &Point) -> Self {
        LatLng {
            lat: latitude(p),
            lng: longitude(p),
        }
    }

    /// Converts the coordinates back to a unit point. The maximum error in
    /// the result is 1.5 * DBL_EPSILON.
    pub fn to_point(&self) -> Point {
        let phi = self.lat.rad();
        let theta = self.lng.rad();
        let cosphi = phi.cos();
        Point(Vector::new(
            theta.cos() * cosphi,
            theta.sin() * cosphi,
            phi.sin(),
        ))
    }
}

/// The latitude of the given point in the range [-pi/2, pi/2].
pub fn latitude(p: &Point) -> Angle {
    let v = p.0;
    Angle(v.z.atan2((v.x * v.x + v.y * v.y).sqrt()))
}

/// The longitude of the given point in the range [-pi, pi].
pub fn longitude(p: &Point) -> Angle {
    Angle(p.0.y.atan2(p.0.x))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::f64_eq;
    use std::f64::consts::PI;

    #[test]
    fn test_round_trip() {
        for &(lat, lng) in &[(0.0, 0.0), (45.0, 90.0), (-89.0, 179.0), (30.0, -120.0)] {
            let ll = LatLng::from_degrees(lat, lng);
            let back = LatLng::from_point(&ll.to_point());
            assert!((back.lat.deg() - lat).abs() < 1e-12, "lat {lat}");
            assert!((back.lng.deg() - lng).abs() < 1e-12, "lng {lng}");
        }
    }

    #[test]
    fn test_poles() {
        let north = Point::from_coords(0.0, 0.0, 1.0);
        assert!(f64_eq(latitude(&north).rad(), PI / 2.0));
        let south = Point::from_coords(0.0, 0.0, -1.0);
        assert!(f64_eq(latitude(&south).rad(), -PI / 2.0));
    }
}
