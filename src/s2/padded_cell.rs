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

use crate::r1::interval::Interval;
use crate::r2::rect::Rect;
use crate::s2::cellid::{size_ij, CellID, IJ_TO_POS, POS_TO_IJ, POS_TO_ORIENTATION};
use crate::s2::stuv::{siti_to_st, st_to_uv};

/// PaddedCell represents a cell whose (u,v)-range has been expanded on all
/// sides by a given amount of "padding". Unlike Cell, its methods and
/// representation are optimized for clipping edges against cell boundaries
/// to determine which cells are intersected by a given set of edges.
#[derive(Debug, Clone)]
pub struct PaddedCell {
    id: CellID,
    padding: f64,
    bound: Rect,
    middle: Rect, // A rect in (u,v)-space that belongs to all four children.
    i_lo: i32,    // Minimum i-coordinate of this cell before padding.
    j_lo: i32,    // Minimum j-coordinate of this cell before padding.
    orientation: u16, // Hilbert curve orientation of this cell.
    level: u64,
}

impl PaddedCell {
    /// Constructs a padded cell with the given padding.
    pub fn from_cell_id(id: CellID, padding: f64) -> Self {
        // Fast path for constructing a top-level face (the most common case).
        if id.is_face() {
            let limit = 1.0 + padding;
            let bound = Rect::from_intervals(
                Interval::new(-limit, limit),
                Interval::new(-limit, limit),
            );
            let middle = Rect::from_intervals(
                Interval::new(-padding, padding),
                Interval::new(-padding, padding),
            );
            return PaddedCell {
                id,
                padding,
                bound,
                middle,
                i_lo: 0,
                j_lo: 0,
                orientation: u16::from(id.face()) & 1,
                level: 0,
            };
        }

        let (_, i, j, orientation) = id.face_ij_orientation();
        let level = id.level();
        let ij_size = size_ij(level);
        let i_lo = i & -ij_size;
        let j_lo = j & -ij_size;
        let bound =
            crate::s2::cellid::ij_level_to_bound_uv(i, j, level).expanded_by_margin(padding);

        let mut cell = PaddedCell {
            id,
            padding,
            bound,
            middle: Rect::empty(),
            i_lo,
            j_lo,
            orientation,
            level,
        };
        cell.middle = cell.compute_middle();
        cell
    }

    /// Constructs the child of parent with the given (i,j) index. The
    /// four child cells have indices of (0,0), (0,1), (1,0), (1,1), where
    /// the i and j indices correspond to increasing u- and v-values
    /// respectively.
    pub fn from_parent_ij(parent: &PaddedCell, i: u8, j: u8) -> Self {
        // Compute the position and orientation of the child incrementally
        // from the orientation of the parent.
        let ij = (i << 1) | j;
        let pos = IJ_TO_POS[parent.orientation as usize][ij as usize];
        let children = parent.id.children();

        let level = parent.level + 1;
        let ij_size = size_ij(level);
        let i_lo = parent.i_lo + i32::from(i) * ij_size;
        let j_lo = parent.j_lo + i32::from(j) * ij_size;

        // For each child, one corner of the bound is taken directly from
        // the parent while the diagonally opposite corner is taken from
        // middle().
        let mut bound = parent.bound;
        let middle = parent.middle;
        if i == 1 {
            bound.x.lo = middle.x.lo;
        } else {
            bound.x.hi = middle.x.hi;
        }
        if j == 1 {
            bound.y.lo = middle.y.lo;
        } else {
            bound.y.hi = middle.y.hi;
        }

        let mut cell = PaddedCell {
            id: children[pos as usize],
            padding: parent.padding,
            bound,
            middle: Rect::empty(),
            i_lo,
            j_lo,
            orientation: parent.orientation ^ POS_TO_ORIENTATION[pos as usize],
            level,
        };
        cell.middle = cell.compute_middle();
        cell
    }

    fn compute_middle(&self) -> Rect {
        let ij_size = size_ij(self.level);
        let u = st_to_uv(siti_to_st((2 * self.i_lo + ij_size) as u32));
        let v = st_to_uv(siti_to_st((2 * self.j_lo + ij_size) as u32));
        Rect::from_intervals(
            Interval::new(u - self.padding, u + self.padding),
            Interval::new(v - self.padding, v + self.padding),
        )
    }

    pub fn id(&self) -> CellID {
        self.id
    }

    pub fn padding(&self) -> f64 {
        self.padding
    }

    pub fn level(&self) -> u64 {
        self.level
    }

    /// The bounds for this cell in (u,v)-space including padding.
    pub fn bound(&self) -> Rect {
        self.bound
    }

    /// The rectangle in the middle of this cell that belongs to all four
    /// of its children, in (u,v)-space.
    pub fn middle(&self) -> Rect {
        self.middle
    }

    /// The (i,j) coordinates of the child at the given traversal position.
    pub fn child_ij(&self, pos: u8) -> (u8, u8) {
        let ij = POS_TO_IJ[self.orientation as usize][pos as usize];
        (ij >> 1, ij & 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::r2::point::Point as R2Point;
    use crate::s2::cell::Cell;

    #[test]
    fn test_face_cell() {
        let p = PaddedCell::from_cell_id(CellID::from_face(1), 0.1);
        assert_eq!(p.level(), 0);
        assert_eq!(p.bound().x.lo, -1.1);
        assert_eq!(p.bound().x.hi, 1.1);
        assert!(p.middle().contains_point(&R2Point::new(0.0, 0.0)));
    }

    #[test]
    fn test_children_cover_parent() {
        let id = CellID::from_point(&crate::s2::point::Point::from_coords(0.3, 0.2, 1.0)).parent(4);
        let parent = PaddedCell::from_cell_id(id, 0.0);
        let mut child_ids = Vec::new();
        for i in 0..2u8 {
            for j in 0..2u8 {
                let child = PaddedCell::from_parent_ij(&parent, i, j);
                assert_eq!(child.level(), parent.level() + 1);
                assert!(parent.bound().contains(&child.bound()));
                child_ids.push(child.id());
            }
        }
        child_ids.sort();
        let mut expected = id.children().to_vec();
        expected.sort();
        assert_eq!(child_ids, expected);
    }

    #[test]
    fn test_bound_matches_cell() {
        let id =
            CellID::from_point(&crate::s2::point::Point::from_coords(-0.4, 1.0, 0.1)).parent(7);
        let padded = PaddedCell::from_cell_id(id, 0.0);
        let cell = Cell::from_cell_id(id);
        assert_eq!(padded.bound(), cell.bound_uv());
    }
}
