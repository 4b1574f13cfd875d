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

//! Conversions between the (x,y,z) unit sphere, the six cube faces, and the
//! (u,v) / (s,t) / (si,ti) coordinate systems used by the cell decomposition.
//!
//! The mapping from cell space (s,t) to cube space (u,v) uses the quadratic
//! projection, which produces cells of nearly uniform size.

use crate::consts::find_lsb_set_non_zero_64;
use crate::r3::vector::Vector;
use crate::s2::cellid::MAX_LEVEL;
use crate::s2::point::Point;

/// The maximum value of an si or ti coordinate: 2 * 2^MAX_LEVEL. The
/// (si,ti) grid is twice as fine as the leaf-cell (i,j) grid so that cell
/// centers have exact representations.
pub const MAX_SITI: u32 = 1 << (MAX_LEVEL + 1);

/// Converts an s or t value in [0,1] to the corresponding u or v value in
/// [-1,1] using the quadratic projection.
pub fn st_to_uv(s: f64) -> f64 {
    if s >= 0.5 {
        (1.0 / 3.0) * (4.0 * s * s - 1.0)
    } else {
        (1.0 / 3.0) * (1.0 - 4.0 * (1.0 - s) * (1.0 - s))
    }
}

/// The inverse of st_to_uv. Note that it is not always true that
/// `uv_to_st(st_to_uv(x)) == x` due to numerical errors.
pub fn uv_to_st(u: f64) -> f64 {
    if u >= 0.0 {
        0.5 * (1.0 + 3.0 * u).sqrt()
    } else {
        1.0 - 0.5 * (1.0 - 3.0 * u).sqrt()
    }
}

/// Converts an si or ti coordinate to the corresponding s or t value.
pub fn siti_to_st(si: u32) -> f64 {
    (si as f64) / (MAX_SITI as f64)
}

/// Converts an s or t value in [0,1] to the nearest si or ti coordinate.
pub fn st_to_siti(s: f64) -> u32 {
    (s * (MAX_SITI as f64)).round() as u32
}

/// Returns the face containing the given direction vector (for points on
/// the boundary between faces, the result is arbitrary but deterministic).
pub fn face(r: &Vector) -> u8 {
    let abs = r.abs();
    let mut f: u8 = if abs.x > abs.y {
        if abs.x > abs.z {
            0
        } else {
            2
        }
    } else if abs.y > abs.z {
        1
    } else {
        2
    };
    let component = match f {
        0 => r.x,
        1 => r.y,
        _ => r.z,
    };
    if component < 0.0 {
        f += 3;
    }
    f
}

/// Turns face and UV coordinates into an (unnormalized) 3D point.
pub fn face_uv_to_xyz(face: u8, u: f64, v: f64) -> Vector {
    match face {
        0 => Vector::new(1.0, u, v),
        1 => Vector::new(-u, 1.0, v),
        2 => Vector::new(-u, -v, 1.0),
        3 => Vector::new(-1.0, -v, -u),
        4 => Vector::new(v, -1.0, -u),
        _ => Vector::new(v, u, -1.0),
    }
}

/// Given a valid face for the given point r (meaning that the dot product
/// of r with the face normal is positive), returns the corresponding
/// u and v values, which may lie outside the range [-1,1].
pub fn valid_face_xyz_to_uv(face: u8, r: &Vector) -> (f64, f64) {
    match face {
        0 => (r.y / r.x, r.z / r.x),
        1 => (-r.x / r.y, r.z / r.y),
        2 => (-r.x / r.z, -r.y / r.z),
        3 => (r.z / r.x, r.y / r.x),
        4 => (r.z / r.y, -r.x / r.y),
        _ => (-r.y / r.z, -r.x / r.z),
    }
}

/// Converts a direction vector (not necessarily unit length) to
/// (face, u, v) coordinates.
pub fn xyz_to_face_uv(r: &Vector) -> (u8, f64, f64) {
    let f = face(r);
    let (u, v) = valid_face_xyz_to_uv(f, r);
    (f, u, v)
}

/// Transforms the given point P to the (u,v,w) coordinate frame of the
/// given face, where the w-axis represents the face normal.
pub fn face_xyz_to_uvw(face: u8, p: &Point) -> Point {
    // The result coordinates are simply the dot products of P with the
    // (u,v,w) axes of the face, which works out to a permutation with
    // sign changes of the point coordinates.
    let v = p.0;
    Point(match face {
        0 => Vector::new(v.y, v.z, v.x),
        1 => Vector::new(-v.x, v.z, v.y),
        2 => Vector::new(-v.x, -v.y, v.z),
        3 => Vector::new(-v.z, -v.y, -v.x),
        4 => Vector::new(-v.z, v.x, -v.y),
        _ => Vector::new(v.y, v.x, -v.z),
    })
}

/// Converts a (face, si, ti) coordinate to an (unnormalized) point.
pub fn face_siti_to_xyz(face: u8, si: u32, ti: u32) -> Point {
    Point(face_uv_to_xyz(
        face,
        st_to_uv(siti_to_st(si)),
        st_to_uv(siti_to_st(ti)),
    ))
}

/// Converts a point to (face, si, ti) coordinates and the level the point
/// lies at if it is a cell center, or -1 otherwise.
pub fn xyz_to_face_siti(p: &Point) -> (u8, u32, u32, i32) {
    let (face, u, v) = xyz_to_face_uv(&p.0);
    let si = st_to_siti(uv_to_st(u));
    let ti = st_to_siti(uv_to_st(v));

    // If the levels corresponding to si,ti are not equal, then p is not a
    // cell center. The si,ti values of a cell center have a single bit set
    // at position (MAX_LEVEL - level) in the doubled-resolution grid.
    let level = MAX_LEVEL as i32
        - find_lsb_set_non_zero_64(u64::from(si) | (1 << (MAX_LEVEL + 1))) as i32;
    if level < 0
        || level
            != MAX_LEVEL as i32
                - find_lsb_set_non_zero_64(u64::from(ti) | (1 << (MAX_LEVEL + 1))) as i32
    {
        return (face, si, ti, -1);
    }

    // In infinite precision, this test could be changed to ST == SiTi.
    // However, due to rounding errors, uv_to_st(xyz_to_face_uv(
    // face_uv_to_xyz(st_to_uv(...)))) is not idempotent. On the other hand,
    // the center is computed exactly the same way p was originally computed
    // (if it is indeed the center of a cell); the comparison can be exact.
    if p.0 == face_siti_to_xyz(face, si, ti).0.normalize() {
        return (face, si, ti, level);
    }
    (face, si, ti, -1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::f64_eq;

    #[test]
    fn test_st_uv_round_trip() {
        for i in 0..=32 {
            let s = (i as f64) / 32.0;
            assert!(f64_eq(uv_to_st(st_to_uv(s)), s));
        }
        assert_eq!(st_to_uv(0.0), -1.0);
        assert_eq!(st_to_uv(0.5), 0.0);
        assert_eq!(st_to_uv(1.0), 1.0);
    }

    #[test]
    fn test_face_uv_round_trip() {
        for f in 0..6u8 {
            let p = face_uv_to_xyz(f, 0.1, -0.3);
            assert_eq!(face(&p), f);
            let (u, v) = valid_face_xyz_to_uv(f, &p);
            assert!(f64_eq(u, 0.1));
            assert!(f64_eq(v, -0.3));
        }
    }

    #[test]
    fn test_face_centers() {
        assert_eq!(face(&Vector::new(1.0, 0.0, 0.0)), 0);
        assert_eq!(face(&Vector::new(0.0, 1.0, 0.0)), 1);
        assert_eq!(face(&Vector::new(0.0, 0.0, 1.0)), 2);
        assert_eq!(face(&Vector::new(-1.0, 0.0, 0.0)), 3);
        assert_eq!(face(&Vector::new(0.0, -1.0, 0.0)), 4);
        assert_eq!(face(&Vector::new(0.0, 0.0, -1.0)), 5);
    }

    #[test]
    fn test_uvw_frame() {
        for f in 0..6u8 {
            // The face normal maps to the +w axis.
            let n = face_uv_to_xyz(f, 0.0, 0.0);
            let w = face_xyz_to_uvw(f, &Point(n));
            assert_eq!(w.0, Vector::new(0.0, 0.0, 1.0));
        }
    }

    #[test]
    fn test_xyz_to_face_siti_centers() {
        // A face center is the center of the level 0 cell on that face.
        let p = Point(face_uv_to_xyz(2, 0.0, 0.0).normalize());
        let (f, si, ti, level) = xyz_to_face_siti(&p);
        assert_eq!(f, 2);
        assert_eq!(level, 0);
        assert_eq!(si, MAX_SITI / 2);
        assert_eq!(ti, MAX_SITI / 2);
        // An arbitrary point is not a cell center.
        let q = Point::from_coords(1.0, 2e-3, 3e-5);
        let (_, _, _, level) = xyz_to_face_siti(&q);
        assert_eq!(level, -1);
    }
}
