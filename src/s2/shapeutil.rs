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

use crate::error::Error;
use crate::s2::edge_crosser::EdgeCrosser;
use crate::s2::edge_crossings::{crossing_sign, Crossing};
use crate::s2::point::Point;
use crate::s2::shape::Shape;
use crate::s2::shape_index::ShapeIndex;

/// Reports whether the given shape contains the given point, by counting
/// edge crossings from the shape's reference point. Used during index
/// construction, before any acceleration structure exists.
pub fn contains_brute_force(shape: &dyn Shape, focus: &Point) -> bool {
    if shape.dimension() != 2 {
        return false;
    }
    let ref_point = shape.reference_point();
    if ref_point.point == *focus {
        return ref_point.contained;
    }

    let mut crosser = EdgeCrosser::new(&ref_point.point, focus);
    let mut inside = ref_point.contained;
    for e in 0..shape.num_edges() {
        let edge = shape.edge(e);
        inside = inside != crosser.edge_or_vertex_crossing(&edge.v0, &edge.v1);
    }
    inside
}

/// Searches the index for a pair of crossing edges of the first shape
/// (assumed to be a closed edge ring of n edges). Non-adjacent edges that
/// cross, or that share a vertex, make the ring invalid. The index cells
/// limit the candidate pairs to edges that come near each other.
pub fn find_self_intersection(index: &ShapeIndex) -> Result<(), Error> {
    if index.num_shape_ids() == 0 {
        return Ok(());
    }
    let shape = match index.shape(0) {
        Some(s) => s,
        None => return Ok(()),
    };
    let num_edges = shape.num_edges();

    let mut it = index.iterator();
    while !it.done() {
        let clipped = it.index_cell().and_then(|c| c.find_by_shape_id(0)).cloned();
        let clipped = match clipped {
            Some(c) => c,
            None => {
                it.next();
                continue;
            }
        };
        for i in 0..clipped.num_edges() {
            for j in (i + 1)..clipped.num_edges() {
                let ei = clipped.edge(i) as usize;
                let ej = clipped.edge(j) as usize;
                // Adjacent edges in the ring legitimately share one vertex.
                if (ei + 1) % num_edges == ej || (ej + 1) % num_edges == ei {
                    continue;
                }
                let a = shape.edge(ei);
                let b = shape.edge(ej);
                match crossing_sign(&a.v0, &a.v1, &b.v0, &b.v1) {
                    Crossing::Cross => return Err(Error::SelfIntersects(ei, ej)),
                    // A shared vertex between non-adjacent edges means the
                    // ring touches itself.
                    Crossing::Maybe => return Err(Error::SelfIntersects(ei, ej)),
                    Crossing::DoNotCross => {}
                }
            }
        }
        it.next();
    }
    Ok(())
}
