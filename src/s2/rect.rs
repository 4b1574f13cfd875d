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

use crate::encoding::{Decoder, Encoder};
use crate::error::DecodeError;
use crate::r1;
use crate::s1;
use crate::s2::cap::Cap;
use crate::s2::latlng::LatLng;
use crate::s2::point::Point;

/// The encoding version written in front of a serialized rectangle.
const RECT_ENCODING_VERSION: u8 = 1;

/// Rect represents a closed latitude-longitude rectangle. It is capable of
/// representing the empty and full rectangles as well as single points.
/// The latitude interval is a plain closed interval in [-pi/2, pi/2];
/// the longitude interval is circular and may be inverted (crossing the
/// 180 degree meridian).
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Rect {
    pub lat: r1::interval::Interval,
    pub lng: s1::interval::Interval,
}

fn valid_rect_lat_range() -> r1::interval::Interval {
    r1::interval::Interval::new(-PI / 2.0, PI / 2.0)
}

impl Rect {
    /// The canonical empty rectangle.
    pub fn empty() -> Self {
        Rect {
            lat: r1::interval::Interval::new(1.0, 0.0),
            lng: s1::interval::Interval::empty(),
        }
    }

    /// The canonical full rectangle.
    pub fn full() -> Self {
        Rect {
            lat: valid_rect_lat_range(),
            lng: s1::interval::Interval::full(),
        }
    }

    /// Constructs a rectangle containing a single point.
    pub fn from_latlng(ll: &LatLng) -> Self {
        Rect {
            lat: r1::interval::Interval::from_point(ll.lat.rad()),
            lng: s1::interval::Interval::from_point(ll.lng.rad()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.lat.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.lat == valid_rect_lat_range() && self.lng.is_full()
    }

    /// The center of the rectangle in latitude-longitude space.
    pub fn center(&self) -> LatLng {
        LatLng::from_radians(self.lat.center(), self.lng.center())
    }

    pub fn contains_latlng(&self, ll: &LatLng) -> bool {
        self.lat.contains(ll.lat.rad()) && self.lng.contains(ll.lng.rad())
    }

    pub fn contains_point(&self, p: &Point) -> bool {
        self.contains_latlng(&LatLng::from_point(p))
    }

    /// Reports whether this rectangle contains the other.
    pub fn contains(&self, other: &Rect) -> bool {
        self.lat.contains_interval(&other.lat) && self.lng.contains_interval(&other.lng)
    }

    /// Reports whether this rectangle and the other have any points in
    /// common.
    pub fn intersects(&self, other: &Rect) -> bool {
        self.lat.intersects(&other.lat) && self.lng.intersects(&other.lng)
    }

    /// The smallest rectangle containing the union of this rectangle and
    /// the other.
    pub fn union(&self, other: &Rect) -> Rect {
        Rect {
            lat: self.lat.union(&other.lat),
            lng: self.lng.union(&other.lng),
        }
    }

    /// Expands the rectangle to include the given point.
    pub fn add_point(&self, ll: &LatLng) -> Rect {
        Rect {
            lat: self.lat.add_point(ll.lat.rad()),
            lng: self.lng.add_point(ll.lng.rad()),
        }
    }

    /// Returns a rectangle expanded by the given (non-negative) margins,
    /// with the latitude clamped to the valid range.
    pub fn expanded(&self, margin: &LatLng) -> Rect {
        let lat = self.lat.expanded(margin.lat.rad());
        let lng = self.lng.expanded(margin.lng.rad());
        if lat.is_empty() || lng.is_empty() {
            return Rect::empty();
        }
        Rect {
            lat: lat.intersection(&valid_rect_lat_range()),
            lng,
        }
    }

    /// If the rectangle does not include either pole, returns it
    /// unmodified. Otherwise expands the longitude range to full so that
    /// the rectangle contains all possible representations of the
    /// contained pole(s).
    pub fn polar_closure(&self) -> Rect {
        if self.lat.lo == -PI / 2.0 || self.lat.hi == PI / 2.0 {
            return Rect {
                lat: self.lat,
                lng: s1::interval::Interval::full(),
            };
        }
        *self
    }

    /// Returns a cap that contains the rectangle.
    pub fn cap_bound(&self) -> Cap {
        // We consider two possible bounding caps, one whose axis passes
        // through the center of the lat-lng rectangle and one whose axis
        // is the north or south pole. We return the smaller of the two caps.
        if self.is_empty() {
            return Cap::empty();
        }

        let (pole_z, pole_angle) = if self.lat.hi + self.lat.lo < 0.0 {
            // South pole axis yields smaller cap.
            (-1.0, PI / 2.0 + self.lat.hi)
        } else {
            (1.0, PI / 2.0 - self.lat.lo)
        };
        let pole_cap = Cap::from_center_angle(
            &Point::from_coords(0.0, 0.0, pole_z),
            crate::s1::angle::Angle(pole_angle),
        );

        // For bounding rectangles that span 180 degrees or less in
        // longitude, the maximum cap size is achieved at one of the
        // rectangle vertices. For rectangles that are larger than 180
        // degrees, we punt and always return a bounding cap centered at
        // one of the two poles.
        if self.lng.len() < 2.0 * PI && !self.lng.is_inverted() {
            let mut mid_cap = Cap::from_point(&self.center().to_point());
            for &(lat, lng) in &[
                (self.lat.lo, self.lng.lo),
                (self.lat.lo, self.lng.hi),
                (self.lat.hi, self.lng.lo),
                (self.lat.hi, self.lng.hi),
            ] {
                mid_cap = mid_cap.add_point(&LatLng::from_radians(lat, lng).to_point());
            }
            if mid_cap.height() < pole_cap.height() {
                return mid_cap;
            }
        }
        pole_cap
    }

    /// Reports whether the two rectangles are equal within the given
    /// tolerance on each latitude and longitude endpoint.
    pub fn approx_eq(&self, other: &Rect, max_error: f64) -> bool {
        self.lat.approx_eq(&other.lat, max_error) && self.lng.approx_eq(&other.lng, max_error)
    }

    /// Appends the rectangle to the encoder: a version byte followed by
    /// the four endpoints as little-endian doubles.
    pub fn encode(&self, e: &mut Encoder) {
        e.put_u8(RECT_ENCODING_VERSION);
        e.put_f64(self.lat.lo);
        e.put_f64(self.lat.hi);
        e.put_f64(self.lng.lo);
        e.put_f64(self.lng.hi);
    }

    /// Decodes a rectangle encoded by encode.
    pub fn decode(d: &mut Decoder) -> Result<Rect, DecodeError> {
        let version = d.get_u8()?;
        if version != RECT_ENCODING_VERSION {
            return Err(DecodeError::BadVersion(version));
        }
        let lat_lo = d.get_f64()?;
        let lat_hi = d.get_f64()?;
        let lng_lo = d.get_f64()?;
        let lng_hi = d.get_f64()?;
        Ok(Rect {
            lat: r1::interval::Interval::new(lat_lo, lat_hi),
            lng: s1::interval::Interval { lo: lng_lo, hi: lng_hi },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rect_from_degrees(lat_lo: f64, lng_lo: f64, lat_hi: f64, lng_hi: f64) -> Rect {
        Rect::from_latlng(&LatLng::from_degrees(lat_lo, lng_lo))
            .add_point(&LatLng::from_degrees(lat_hi, lng_hi))
    }

    #[test]
    fn test_empty_full() {
        assert!(Rect::empty().is_empty());
        assert!(Rect::full().is_full());
        assert!(!Rect::empty().is_full());
        assert!(Rect::full().contains_point(&Point::from_coords(0.3, -0.7, 0.1)));
    }

    #[test]
    fn test_contains_intersects() {
        let a = rect_from_degrees(0.0, 0.0, 10.0, 10.0);
        let b = rect_from_degrees(2.0, 2.0, 8.0, 8.0);
        let c = rect_from_degrees(20.0, 20.0, 30.0, 30.0);
        assert!(a.contains(&b));
        assert!(!b.contains(&a));
        assert!(a.intersects(&b));
        assert!(!a.intersects(&c));
        assert!(a.union(&c).contains(&a) && a.union(&c).contains(&c));
    }

    #[test]
    fn test_date_line() {
        let r = Rect::from_latlng(&LatLng::from_degrees(-10.0, 170.0))
            .add_point(&LatLng::from_degrees(10.0, -170.0));
        assert!(r.lng.is_inverted());
        assert!(r.contains_latlng(&LatLng::from_degrees(0.0, 180.0)));
        assert!(!r.contains_latlng(&LatLng::from_degrees(0.0, 0.0)));
    }

    #[test]
    fn test_polar_closure() {
        let r = rect_from_degrees(80.0, -30.0, 90.0, 30.0);
        let closed = r.polar_closure();
        assert!(closed.lng.is_full());
        let s = rect_from_degrees(-10.0, -30.0, 10.0, 30.0);
        assert_eq!(s.polar_closure(), s);
    }

    #[test]
    fn test_cap_bound() {
        let r = rect_from_degrees(-10.0, -10.0, 10.0, 10.0);
        let cap = r.cap_bound();
        for &(lat, lng) in &[(-10.0, -10.0), (10.0, 10.0), (-10.0, 10.0), (10.0, -10.0)] {
            assert!(cap.contains_point(&LatLng::from_degrees(lat, lng).to_point()));
        }
    }

    #[test]
    fn test_encode_decode() {
        let r = rect_from_degrees(-20.0, -170.0, 35.0, 150.0);
        let mut e = Encoder::new();
        r.encode(&mut e);
        let bytes = e.into_bytes();
        let mut d = Decoder::new(&bytes);
        assert_eq!(Rect::decode(&mut d).unwrap(), r);
    }
}
