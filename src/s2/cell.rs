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

use crate::r2;
use crate::s2::cellid::{ij_level_to_bound_uv, CellID};
use crate::s2::point::{self, Point};
use crate::s2::stuv::face_uv_to_xyz;

/// Cell is the geometric realization of a CellID: a cell bounded by four
/// geodesics, with methods for computing its vertices, center, and area.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cell {
    pub id: CellID,
    face: u8,
    level: u64,
    uv: r2::rect::Rect,
}

impl Cell {
    /// Constructs a Cell corresponding to the given CellID.
    pub fn from_cell_id(id: CellID) -> Self {
        let (face, i, j, _) = id.face_ij_orientation();
        let level = id.level();
        Cell {
            id,
            face,
            level,
            uv: ij_level_to_bound_uv(i, j, level),
        }
    }

    pub fn face(&self) -> u8 {
        self.face
    }

    pub fn level(&self) -> u64 {
        self.level
    }

    /// The bound of this cell in (u,v)-space.
    pub fn bound_uv(&self) -> r2::rect::Rect {
        self.uv
    }

    /// The center of the cell.
    pub fn center(&self) -> Point {
        self.id.center_point()
    }

    /// The k-th vertex of the cell (k = 0..3), in CCW order. Vertices are
    /// normalized to unit length.
    pub fn vertex(&self, k: usize) -> Point {
        let (u, v) = match k & 3 {
            0 => (self.uv.x.lo, self.uv.y.lo),
            1 => (self.uv.x.hi, self.uv.y.lo),
            2 => (self.uv.x.hi, self.uv.y.hi),
            _ => (self.uv.x.lo, self.uv.y.hi),
        };
        Point(face_uv_to_xyz(self.face, u, v).normalize())
    }

    /// The area of the cell computed from its vertices, accurate to within
    /// a few units in the last place even for very small cells.
    pub fn exact_area(&self) -> f64 {
        let v0 = self.vertex(0);
        let v1 = self.vertex(1);
        let v2 = self.vertex(2);
        let v3 = self.vertex(3);
        point::area(&v0, &v1, &v2) + point::area(&v0, &v2, &v3)
    }
}
