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

use std::fmt;

use lazy_static::lazy_static;

use crate::r1;
use crate::r2;
use crate::s2::point::Point;
use crate::s2::stuv::{face_siti_to_xyz, siti_to_st, st_to_uv, uv_to_st, xyz_to_face_uv};

/// The number of bits used to encode the face number.
pub const FACE_BITS: u64 = 3;
/// The number of cube faces.
pub const NUM_FACES: u8 = 6;
/// The deepest level of the cell decomposition.
pub const MAX_LEVEL: u64 = 30;
/// The number of bits used to encode the position along the Hilbert curve.
pub const POS_BITS: u64 = 2 * MAX_LEVEL + 1;
/// The number of leaf cells along one edge of a face.
pub const MAX_SIZE: i32 = 1 << MAX_LEVEL;

const LOOKUP_BITS: u32 = 4;
const SWAP_MASK: u16 = 0x01;
const INVERT_MASK: u16 = 0x02;

/// For each subdivision position in a given orientation, the (i,j)
/// quadrant of the child in that position, packed as (i << 1) | j.
pub(crate) const POS_TO_IJ: [[u8; 4]; 4] = [
    [0, 1, 3, 2], // canonical order: (0,0), (0,1), (1,1), (1,0)
    [0, 2, 3, 1], // axes swapped: (0,0), (1,0), (1,1), (0,1)
    [3, 2, 0, 1], // swap & invert: (1,1), (1,0), (0,0), (0,1)
    [3, 1, 0, 2], // invert: (1,1), (0,1), (0,0), (1,0)
];

/// The inverse of POS_TO_IJ: for each orientation, maps (i << 1) | j to
/// the position of that quadrant in the traversal order.
pub(crate) const IJ_TO_POS: [[u8; 4]; 4] = [
    [0, 1, 3, 2],
    [0, 3, 1, 2],
    [2, 3, 1, 0],
    [2, 1, 3, 0],
];

/// The change in orientation of the Hilbert curve for each child position.
pub(crate) const POS_TO_ORIENTATION: [u16; 4] = [SWAP_MASK, 0, 0, INVERT_MASK | SWAP_MASK];

struct LookupTables {
    lookup_pos: Vec<u16>,
    lookup_ij: Vec<u16>,
}

fn init_lookup_cell(
    tables: &mut LookupTables,
    level: u32,
    i: u16,
    j: u16,
    orig_orientation: u16,
    pos: u16,
    orientation: u16,
) {
    if level == LOOKUP_BITS {
        let ij = (i << LOOKUP_BITS) + j;
        tables.lookup_pos[((ij << 2) + orig_orientation) as usize] = (pos << 2) + orientation;
        tables.lookup_ij[((pos << 2) + orig_orientation) as usize] = (ij << 2) + orientation;
        return;
    }
    let level = level + 1;
    let i = i << 1;
    let j = j << 1;
    let pos = pos << 2;
    let r = &POS_TO_IJ[orientation as usize];
    for (index, &ij) in r.iter().enumerate() {
        init_lookup_cell(
            tables,
            level,
            i + u16::from(ij >> 1),
            j + u16::from(ij & 1),
            orig_orientation,
            pos + index as u16,
            orientation ^ POS_TO_ORIENTATION[index],
        );
    }
}

lazy_static! {
    static ref LOOKUP: LookupTables = {
        let size = 1 << (2 * LOOKUP_BITS + 2);
        let mut tables = LookupTables {
            lookup_pos: vec![0; size],
            lookup_ij: vec![0; size],
        };
        init_lookup_cell(&mut tables, 0, 0, 0, 0, 0, 0);
        init_lookup_cell(&mut tables, 0, 0, 0, SWAP_MASK, 0, SWAP_MASK);
        init_lookup_cell(&mut tables, 0, 0, 0, INVERT_MASK, 0, INVERT_MASK);
        init_lookup_cell(
            &mut tables,
            0,
            0,
            0,
            SWAP_MASK | INVERT_MASK,
            0,
            SWAP_MASK | INVERT_MASK,
        );
        tables
    };
}

/// CellID uniquely identifies a cell in the cell decomposition. The most
/// significant 3 bits encode the face number (0-5); the remaining 61 bits
/// encode the position of the center of this cell along the Hilbert curve
/// on that face.
///
/// Sequentially increasing cell ids follow a continuous space-filling
/// curve over the entire sphere. The id of a cell at level k consists of a
/// 3-bit face number followed by k bit pairs that recursively select one
/// of the four children, followed by a marker bit and zeros.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CellID(pub u64);

impl CellID {
    /// Returns the cell covering the entire given face.
    pub fn from_face(face: u8) -> CellID {
        CellID((u64::from(face) << POS_BITS) + lsb_for_level(0))
    }

    /// Returns a cell given its face, the position along the Hilbert
    /// curve on that face, and the level.
    pub fn from_face_pos_level(face: u8, pos: u64, level: u64) -> CellID {
        CellID((u64::from(face) << POS_BITS) + (pos | 1)).parent(level)
    }

    /// Returns the leaf cell containing the given point.
    pub fn from_point(p: &Point) -> CellID {
        let (f, u, v) = xyz_to_face_uv(&p.0);
        let i = st_to_ij(uv_to_st(u));
        let j = st_to_ij(uv_to_st(v));
        CellID::from_face_ij(f, i, j)
    }

    /// Returns the leaf cell with the given (i,j) coordinates on the
    /// given face.
    pub fn from_face_ij(f: u8, i: i32, j: i32) -> CellID {
        // Note that this value gets shifted one bit to the left at the end
        // of the function.
        let mut n = u64::from(f) << (POS_BITS - 1);
        // Alternating faces have opposite Hilbert curve orientations; this
        // is necessary in order for all faces to have a right-handed
        // coordinate system.
        let mut bits = u16::from(f) & SWAP_MASK;

        // Each iteration maps 4 bits of "i" and "j" into 8 bits of the
        // Hilbert curve position. The lookup table transforms a 10-bit key
        // of the form "iiiijjjjoo" to a 10-bit value of the form
        // "ppppppppoo", where the letters [ijpo] denote bits of "i", "j",
        // Hilbert curve position, and Hilbert curve orientation
        // respectively.
        for k in (0..8i32).rev() {
            let mask: i32 = (1 << LOOKUP_BITS) - 1;
            bits += (((i >> (k * LOOKUP_BITS as i32)) & mask) as u16) << (LOOKUP_BITS + 2);
            bits += (((j >> (k * LOOKUP_BITS as i32)) & mask) as u16) << 2;
            bits = LOOKUP.lookup_pos[bits as usize];
            n |= u64::from(bits >> 2) << (k as u64 * 2 * u64::from(LOOKUP_BITS));
            bits &= SWAP_MASK | INVERT_MASK;
        }
        CellID(n * 2 + 1)
    }

    /// The cube face this cell id belongs to, in the range 0-5.
    pub fn face(&self) -> u8 {
        (self.0 >> POS_BITS) as u8
    }

    /// The position along the Hilbert curve, in the range 0..2^POS_BITS.
    pub fn pos(&self) -> u64 {
        self.0 & (u64::MAX >> FACE_BITS)
    }

    /// The subdivision level of this cell id, in the range [0, MAX_LEVEL].
    pub fn level(&self) -> u64 {
        MAX_LEVEL - (self.0.trailing_zeros() as u64 >> 1)
    }

    pub fn is_leaf(&self) -> bool {
        self.0 & 1 != 0
    }

    pub fn is_face(&self) -> bool {
        self.0 & (lsb_for_level(0) - 1) == 0
    }

    /// Reports whether this is a valid cell id.
    pub fn is_valid(&self) -> bool {
        self.face() < NUM_FACES && (self.lsb() & 0x1555555555555555) != 0
    }

    /// The least significant bit of the cell id, which determines its
    /// level (larger lsb means larger cell).
    pub fn lsb(&self) -> u64 {
        self.0 & self.0.wrapping_neg()
    }

    /// The cell at the given level that contains this cell.
    pub fn parent(&self, level: u64) -> CellID {
        let lsb = lsb_for_level(level);
        CellID((self.0 & lsb.wrapping_neg()) | lsb)
    }

    /// The four immediate children of this cell, in Hilbert curve order.
    /// Results are undefined for leaf cells.
    pub fn children(&self) -> [CellID; 4] {
        let mut lsb = self.lsb();
        let c0 = CellID(self.0 - lsb + (lsb >> 2));
        lsb >>= 1;
        [
            c0,
            CellID(c0.0 + lsb),
            CellID(c0.0 + 2 * lsb),
            CellID(c0.0 + 3 * lsb),
        ]
    }

    /// The minimum leaf cell id contained within this cell.
    pub fn range_min(&self) -> CellID {
        CellID(self.0 - (self.lsb() - 1))
    }

    /// The maximum leaf cell id contained within this cell.
    pub fn range_max(&self) -> CellID {
        CellID(self.0 + (self.lsb() - 1))
    }

    /// Reports whether this cell contains the other.
    pub fn contains(&self, other: &CellID) -> bool {
        self.range_min() <= *other && *other <= self.range_max()
    }

    /// Reports whether this cell intersects the other.
    pub fn intersects(&self, other: &CellID) -> bool {
        other.range_min() <= self.range_max() && other.range_max() >= self.range_min()
    }

    /// The next cell along the Hilbert curve at this level, possibly
    /// wrapping past the last face into an invalid id.
    pub fn next(&self) -> CellID {
        CellID(self.0.wrapping_add(self.lsb() << 1))
    }

    /// A value larger than any valid cell id, used as the iterator "end"
    /// marker.
    pub fn sentinel() -> CellID {
        CellID(u64::MAX)
    }

    /// The (face, si, ti) coordinates of the center of the cell.
    pub fn center_si_ti(&self) -> (u8, u32, u32) {
        let (face, i, j, _) = self.face_ij_orientation();
        let delta: i64 = if self.is_leaf() {
            1
        } else if ((i as i64) ^ ((self.0 as i64) >> 2)) & 1 == 1 {
            2
        } else {
            0
        };
        // The doubled-resolution coordinates can reach 2^31, so widen
        // before the shift.
        (
            face,
            (2 * i as i64 + delta) as u32,
            (2 * j as i64 + delta) as u32,
        )
    }

    /// The center of the cell on the unit sphere.
    pub fn center_point(&self) -> Point {
        let (face, si, ti) = self.center_si_ti();
        Point(face_siti_to_xyz(face, si, ti).0.normalize())
    }

    /// The (face, i, j) coordinates of the leaf cell at the cell's center,
    /// along with the Hilbert curve orientation of the cell.
    pub fn face_ij_orientation(&self) -> (u8, i32, i32, u16) {
        let f = self.face();
        let mut orientation = u16::from(f) & SWAP_MASK;
        let mut i: i32 = 0;
        let mut j: i32 = 0;
        let mut nbits = MAX_LEVEL - 7 * u64::from(LOOKUP_BITS); // first iteration

        // Each iteration maps 8 bits of the Hilbert curve position into
        // 4 bits of "i" and "j".
        for k in (0..8u64).rev() {
            orientation +=
                (((self.0 >> (k * 2 * u64::from(LOOKUP_BITS) + 1)) & ((1 << (2 * nbits)) - 1)) as u16)
                    << 2;
            orientation = LOOKUP.lookup_ij[orientation as usize];
            i += i32::from(orientation >> (LOOKUP_BITS + 2)) << (k * u64::from(LOOKUP_BITS));
            j += i32::from((orientation >> 2) & ((1 << LOOKUP_BITS) - 1))
                << (k * u64::from(LOOKUP_BITS));
            orientation &= SWAP_MASK | INVERT_MASK;
            nbits = u64::from(LOOKUP_BITS);
        }

        // The position of a non-leaf cell at level "n" consists of a prefix
        // of 2*n bits that identifies the cell, followed by a suffix of
        // 2*(MAX_LEVEL-n)+1 bits of the form 10*. If n < MAX_LEVEL, the
        // orientation of the cell is determined by its parity.
        if self.lsb() & 0x1111111111111110 != 0 {
            orientation ^= SWAP_MASK;
        }
        (f, i, j, orientation)
    }
}

impl fmt::Display for CellID {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/", self.face())?;
        for level in 1..=self.level() {
            // The child position is the 2-bit field at the appropriate
            // offset in the position bits.
            let pos = (self.0 >> (2 * (MAX_LEVEL - level) + 1)) & 3;
            write!(f, "{}", pos)?;
        }
        Ok(())
    }
}

/// The lowest-numbered bit that is on for cells at the given level.
pub fn lsb_for_level(level: u64) -> u64 {
    1 << (2 * (MAX_LEVEL - level))
}

/// Converts a value in ST coordinates to a value in IJ coordinates.
pub fn st_to_ij(s: f64) -> i32 {
    (((MAX_SIZE as f64) * s).floor() as i32).clamp(0, MAX_SIZE - 1)
}

/// The edge length in IJ coordinates of cells at the given level.
pub fn size_ij(level: u64) -> i32 {
    1 << (MAX_LEVEL - level)
}

/// Returns the bound in (u,v)-space for the cell at the given level
/// containing the leaf cell with coordinates (i,j).
pub fn ij_level_to_bound_uv(i: i32, j: i32, level: u64) -> r2::rect::Rect {
    let cell_size = size_ij(level);
    let i_lo = (i & -cell_size) as i64;
    let j_lo = (j & -cell_size) as i64;
    let cell_size = cell_size as i64;
    // The doubled-resolution coordinates can reach 2^31, so compute them
    // in a wider type.
    r2::rect::Rect {
        x: r1::interval::Interval::new(
            st_to_uv(siti_to_st((2 * i_lo) as u32)),
            st_to_uv(siti_to_st((2 * (i_lo + cell_size)) as u32)),
        ),
        y: r1::interval::Interval::new(
            st_to_uv(siti_to_st((2 * j_lo) as u32)),
            st_to_uv(siti_to_st((2 * (j_lo + cell_size)) as u32)),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_face_cells() {
        for f in 0..6u8 {
            let id = CellID::from_face(f);
            assert!(id.is_valid());
            assert_eq!(id.face(), f);
            assert_eq!(id.level(), 0);
            assert!(id.is_face());
            assert!(!id.is_leaf());
        }
    }

    #[test]
    fn test_parent_child_relationships() {
        let id = CellID::from_face_pos_level(3, 0x12345678, 26);
        assert!(id.is_valid());
        assert_eq!(id.face(), 3);
        assert_eq!(id.level(), 26);

        for child in id.children() {
            assert_eq!(child.level(), 27);
            assert_eq!(child.parent(26), id);
            assert!(id.contains(&child));
            assert!(!child.contains(&id));
        }
        assert_eq!(id.children()[0].range_min(), id.range_min());
        assert_eq!(id.children()[3].range_max(), id.range_max());
    }

    #[test]
    fn test_containment() {
        let a = CellID::from_face(0);
        let b = CellID::from_face(1);
        assert!(!a.contains(&b));
        assert!(!a.intersects(&b));
        let child = a.children()[2];
        assert!(a.contains(&child));
        assert!(a.intersects(&child));
    }

    #[test]
    fn test_from_point_round_trip() {
        for p in [
            Point::from_coords(1.0, 0.5, -0.2),
            Point::from_coords(-0.3, 1.0, 0.7),
            Point::from_coords(0.0001, 0.0002, -1.0),
        ] {
            let id = CellID::from_point(&p);
            assert!(id.is_valid());
            assert!(id.is_leaf());
            // The leaf cell center is within one leaf-cell diagonal.
            let center = id.center_point();
            assert!(p.distance(&center).rad() < 2e-9);
            // The center maps back to the same leaf cell.
            assert_eq!(CellID::from_point(&center), id);
        }
    }

    #[test]
    fn test_face_ij_orientation_round_trip() {
        for f in 0..6u8 {
            for &(i, j) in &[(0, 0), (12345, 67890), (MAX_SIZE - 1, 3)] {
                let id = CellID::from_face_ij(f, i, j);
                let (face, ri, rj, _) = id.face_ij_orientation();
                assert_eq!(face, f);
                assert_eq!(ri, i);
                assert_eq!(rj, j);
            }
        }
    }

    #[test]
    fn test_ranges_and_next() {
        let id = CellID::from_face(2);
        assert_eq!(id.range_min().level(), MAX_LEVEL);
        assert_eq!(id.range_max().level(), MAX_LEVEL);
        assert_eq!(id.next(), CellID::from_face(3));
        // Leaf ranges are singletons.
        let leaf = id.range_min();
        assert_eq!(leaf.range_min(), leaf);
        assert_eq!(leaf.range_max(), leaf);
    }

    #[test]
    fn test_center_si_ti_levels() {
        let leaf = CellID::from_point(&Point::from_coords(1.0, 1.0, 1.0));
        let (_, si, ti) = leaf.center_si_ti();
        // Leaf centers are at odd si,ti coordinates.
        assert_eq!(si & 1, 1);
        assert_eq!(ti & 1, 1);
        // Parents at lower levels have centers at even coordinates.
        let (_, si, ti) = leaf.parent(20).center_si_ti();
        assert_eq!(si & 1, 0);
        assert_eq!(ti & 1, 0);
    }
}
