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

//! Compressed encoding of point sequences at a fixed snap level.
//!
//! Points that lie exactly at the center of a cell at the snap level are
//! stored as that cell id, delta-coded along the sequence; all other
//! points are carried exactly as three little-endian doubles in an escape
//! list. Sequences that have been snapped to cell centers beforehand
//! therefore cost a few bytes per point, while arbitrary sequences remain
//! lossless.

use crate::encoding::{Decoder, Encoder};
use crate::error::DecodeError;
use crate::r3::vector::Vector;
use crate::s2::cellid::{CellID, MAX_LEVEL};
use crate::s2::point::Point;
use crate::s2::stuv::xyz_to_face_siti;

/// Encodes the points at the given snap level. The level is embedded in
/// the stream, so the decoder does not need it out of band.
pub fn encode_points_compressed(points: &[Point], level: u64, e: &mut Encoder) {
    e.put_u8(level as u8);

    // The cell id of every point at the snap level, delta coded. For
    // points that are not cell centers this is their containing cell; the
    // exact position is restored from the escape list below.
    let mut exact: Vec<u32> = Vec::new();
    let mut last: u64 = 0;
    for (i, p) in points.iter().enumerate() {
        let (_, _, _, cell_level) = xyz_to_face_siti(p);
        if cell_level != level as i32 {
            exact.push(i as u32);
        }
        let id = CellID::from_point(p).parent(level);
        e.put_varint((id.0 as i64).wrapping_sub(last as i64));
        last = id.0;
    }

    e.put_uvarint(exact.len() as u64);
    for &i in &exact {
        e.put_uvarint(u64::from(i));
        let v = points[i as usize].0;
        e.put_f64(v.x);
        e.put_f64(v.y);
        e.put_f64(v.z);
    }
}

/// Decodes a sequence of num_points points written by
/// encode_points_compressed.
pub fn decode_points_compressed(
    d: &mut Decoder,
    num_points: usize,
) -> Result<Vec<Point>, DecodeError> {
    let level = u64::from(d.get_u8()?);
    if level > MAX_LEVEL {
        return Err(DecodeError::Malformed("invalid snap level"));
    }

    let mut points = Vec::with_capacity(num_points);
    let mut last: u64 = 0;
    for _ in 0..num_points {
        let delta = d.get_varint()?;
        let id = CellID((last as i64).wrapping_add(delta) as u64);
        if !id.is_valid() || id.level() != level {
            return Err(DecodeError::Malformed("invalid snapped cell id"));
        }
        last = id.0;
        points.push(id.center_point());
    }

    let num_exact = d.get_uvarint()?;
    if num_exact > num_points as u64 {
        return Err(DecodeError::Malformed("too many exact points"));
    }
    for _ in 0..num_exact {
        let i = d.get_uvarint()?;
        if i >= num_points as u64 {
            return Err(DecodeError::Malformed("exact point index out of range"));
        }
        let x = d.get_f64()?;
        let y = d.get_f64()?;
        let z = d.get_f64()?;
        points[i as usize] = Point(Vector::new(x, y, z));
    }
    Ok(points)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::s2::metric::MAX_DIAG_METRIC;

    #[test]
    fn test_snapped_points_round_trip_exactly() {
        // Points that are cell centers at the snap level are restored
        // bit for bit.
        let level = 16;
        let snapped: Vec<Point> = [
            Point::from_coords(1.0, 0.2, 0.3),
            Point::from_coords(-0.4, 1.0, -0.1),
            Point::from_coords(0.1, -0.5, 1.0),
        ]
        .iter()
        .map(|p| CellID::from_point(p).parent(level).center_point())
        .collect();

        let mut e = Encoder::new();
        encode_points_compressed(&snapped, level, &mut e);
        let bytes = e.into_bytes();
        let mut d = Decoder::new(&bytes);
        let decoded = decode_points_compressed(&mut d, snapped.len()).unwrap();
        assert_eq!(decoded, snapped);
        // Snapped points cost far less than 24 bytes each.
        assert!(bytes.len() < snapped.len() * 24);
    }

    #[test]
    fn test_arbitrary_points_round_trip_exactly() {
        let level = 20;
        let points: Vec<Point> = (0..10)
            .map(|i| Point::from_coords(1.0, 0.05 * i as f64, -0.3 + 0.01 * i as f64))
            .collect();
        let mut e = Encoder::new();
        encode_points_compressed(&points, level, &mut e);
        let bytes = e.into_bytes();
        let mut d = Decoder::new(&bytes);
        let decoded = decode_points_compressed(&mut d, points.len()).unwrap();
        // Arbitrary points ride the exact escape list, so the round trip
        // is lossless.
        assert_eq!(decoded, points);
    }

    #[test]
    fn test_snap_tolerance() {
        // Even without consulting the escape list, the snapped cell ids
        // are within the level-16 cell diagonal of the input.
        let level = 16;
        let p = Point::from_coords(0.3, -0.8, 0.51);
        let snapped = CellID::from_point(&p).parent(level).center_point();
        assert!(p.distance(&snapped).rad() <= MAX_DIAG_METRIC.value(level));
    }

    #[test]
    fn test_truncated_input() {
        let mut e = Encoder::new();
        encode_points_compressed(&[Point::from_coords(1.0, 0.0, 0.0)], 16, &mut e);
        let bytes = e.into_bytes();
        let mut d = Decoder::new(&bytes[..bytes.len() - 1]);
        assert!(decode_points_compressed(&mut d, 1).is_err());
    }
}
