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

use crate::r2::rect::Rect as R2Rect;
use crate::s2::cellid::CellID;
use crate::s2::edge_clipping::{clip_to_padded_face, clip_uv_segment};
use crate::s2::padded_cell::PaddedCell;
use crate::s2::point::Point;
use crate::s2::shape_index::{CellRelation, ShapeIndex, ShapeIndexCell, CELL_PADDING};

/// CrossingEdgeQuery locates the index cells that a query edge might
/// cross, by clipping the edge down the cell hierarchy in (u,v)-space.
/// The relation framework uses it to narrow edge-crossing candidates when
/// a cell of one index overlaps many edges of the other.
pub struct CrossingEdgeQuery<'a> {
    index: &'a ShapeIndex,
}

impl<'a> CrossingEdgeQuery<'a> {
    pub fn new(index: &'a ShapeIndex) -> Self {
        CrossingEdgeQuery { index }
    }

    /// Returns copies of the index cells below the given root cell that
    /// might contain edges crossing the edge AB. The cells are returned
    /// in arbitrary order.
    pub fn get_cells(&mut self, a: &Point, b: &Point, root: CellID) -> Vec<ShapeIndexCell> {
        let mut cells = Vec::new();
        let root_cell = PaddedCell::from_cell_id(root, CELL_PADDING);
        if let Some((a_uv, b_uv)) =
            clip_to_padded_face(a, b, root_cell.id().face(), CELL_PADDING)
        {
            let edge_bound = R2Rect::from_points(&[a_uv, b_uv]);
            if root_cell.bound().intersects(&edge_bound) {
                let mut it = self.index.iterator();
                compute_cells_intersected(&mut it, &root_cell, &a_uv, &b_uv, &mut cells);
            }
        }
        cells
    }
}

fn compute_cells_intersected(
    it: &mut crate::s2::shape_index::ShapeIndexIterator,
    pcell: &PaddedCell,
    a: &crate::r2::point::Point,
    b: &crate::r2::point::Point,
    out: &mut Vec<ShapeIndexCell>,
) {
    match it.locate_cell_id(pcell.id()) {
        CellRelation::Disjoint => {}
        CellRelation::Indexed => {
            // The index cell containing this cell holds every candidate
            // edge; collect it once.
            if let Some(cell) = it.index_cell() {
                out.push(cell.clone());
            }
        }
        CellRelation::Subdivided => {
            // The cell is subdivided in the index: clip the edge into the
            // children that it actually enters.
            for pos in 0..4u8 {
                let (i, j) = pcell.child_ij(pos);
                let child = PaddedCell::from_parent_ij(pcell, i, j);
                if let Some((ca, cb)) = clip_uv_segment(a, b, &child.bound()) {
                    compute_cells_intersected(it, &child, &ca, &cb, out);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::s2::r#loop::Loop;
    use crate::s2::latlng::LatLng;

    fn ring(center_lat: f64, center_lng: f64, size_deg: f64, n: usize) -> Vec<Point> {
        let mut pts = Vec::new();
        for k in 0..n {
            let angle = 2.0 * std::f64::consts::PI * (k as f64) / (n as f64);
            pts.push(
                LatLng::from_degrees(
                    center_lat + size_deg * angle.sin(),
                    center_lng + size_deg * angle.cos(),
                )
                .to_point(),
            );
        }
        pts
    }

    #[test]
    fn test_get_cells_finds_candidates() {
        // Index a reasonably dense ring so it subdivides.
        let l = Loop::from_points(ring(0.0, 0.0, 5.0, 64));
        l.index().force_apply_updates();

        let mut query = CrossingEdgeQuery::new(l.index());
        // An edge cutting straight through the ring.
        let a = LatLng::from_degrees(0.0, -10.0).to_point();
        let b = LatLng::from_degrees(0.0, 10.0).to_point();
        let mut total_edges = 0;
        for f in 0..6u8 {
            for cell in query.get_cells(&a, &b, CellID::from_face(f)) {
                if let Some(clipped) = cell.find_by_shape_id(0) {
                    total_edges += clipped.num_edges();
                }
            }
        }
        // The candidates must include at least the two edges the query
        // edge actually crosses.
        assert!(total_edges >= 2);

        // An edge nowhere near the ring yields no candidates.
        let c = LatLng::from_degrees(60.0, 120.0).to_point();
        let d = LatLng::from_degrees(61.0, 121.0).to_point();
        let mut candidates = 0;
        for f in 0..6u8 {
            candidates += query.get_cells(&c, &d, CellID::from_face(f)).len();
        }
        assert_eq!(candidates, 0);
    }
}
