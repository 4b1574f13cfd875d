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

use std::cmp::Ordering as CmpOrdering;
use std::f64::consts::PI;
use std::fmt;
use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::Arc;

use tracing::error;

use crate::consts::DBL_EPSILON;
use crate::encoding::{Decoder, Encoder};
use crate::error::{DecodeError, Error};
use crate::r3::vector::Vector as R3Vector;
use crate::s1::angle::Angle;
use crate::s2::cap::Cap;
use crate::s2::cell::Cell;
use crate::s2::cellid::CellID;
use crate::s2::edge_clipping::{
    clip_to_padded_face, edge_intersects_rect, FACE_CLIP_ERROR_UV_COORD,
    INTERSECTS_RECT_ERROR_UV_DIST,
};
use crate::s2::edge_crosser::EdgeCrosser;
use crate::s2::edge_crossings::Crossing;
use crate::s2::edge_distance;
use crate::s2::crossing_edge_query::CrossingEdgeQuery;
use crate::s2::point::{
    get_frame, ordered_ccw, regular_points_for_frame, signed_area, true_centroid, turn_angle,
    Point,
};
use crate::s2::rect::Rect;
use crate::s2::rect_bounder::{expand_for_subregions, RectBounder};
use crate::s2::region::Region;
use crate::s2::shape::{Chain, ChainPosition, Edge, ReferencePoint, Shape};
use crate::s2::shape_index::{
    CellRelation, ClippedShape, ShapeIndex, ShapeIndexCell, ShapeIndexIterator,
};
use crate::s2::shapeutil::find_self_intersection;
use crate::s2::wedge::{wedge_contains, wedge_contains_semiwedge, wedge_intersects};

/// The default upper bound on the number of vertices accepted by decode.
pub const MAX_DECODE_NUM_VERTICES: usize = 50_000_000;

const LOSSLESS_ENCODING_VERSION: u8 = 1;

// Boolean properties for compressed loops.
const COMPRESSED_ORIGIN_INSIDE: u64 = 1 << 0;
const COMPRESSED_BOUND_ENCODED: u64 = 1 << 1;

/// Below this many vertices the compressed encoding omits the bound and
/// the decoder re-derives it, which is cheap enough for small loops.
const MIN_VERTICES_FOR_BOUND: usize = 64;

// The single vertex of the special "empty" loop (a loop with no interior).
const EMPTY_LOOP_POINT: Point = Point(R3Vector {
    x: 0.0,
    y: 0.0,
    z: 1.0,
});

// The single vertex of the special "full" loop (a loop covering the
// entire sphere).
const FULL_LOOP_POINT: Point = Point(R3Vector {
    x: 0.0,
    y: 0.0,
    z: -1.0,
});

/// DebugOverride controls whether the optional validity checking that
/// normally runs in debug builds applies to a particular loop. Tests that
/// construct deliberately invalid loops disable it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebugOverride {
    AllowDebug,
    DisableDebug,
}

/// Options controlling loop construction. These replace process-wide
/// flags: pass them to the `*_with_options` constructors.
#[derive(Debug, Clone, Copy)]
pub struct LoopOptions {
    /// Build the spatial index only when it is first queried. This can
    /// save significant memory and time when geometry is constructed but
    /// never queried.
    pub lazy_indexing: bool,
    /// Whether debug-build validity checking applies to this loop.
    pub debug_override: DebugOverride,
}

impl Default for LoopOptions {
    fn default() -> Self {
        LoopOptions {
            lazy_indexing: true,
            debug_override: DebugOverride::AllowDebug,
        }
    }
}

/// Options controlling loop decoding.
#[derive(Debug, Clone, Copy)]
pub struct DecodeOptions {
    /// The upper bound on the number of vertices; larger counts are
    /// rejected before any allocation.
    pub max_num_vertices: usize,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        DecodeOptions {
            max_num_vertices: MAX_DECODE_NUM_VERTICES,
        }
    }
}

/// The direction in which the vertices of a loop are traversed for sums
/// that must be invariant under rotation of the vertex list and negated
/// under reversal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VertexTraversalDirection {
    Forward,
    Backward,
}

impl VertexTraversalDirection {
    fn delta(self) -> isize {
        match self {
            VertexTraversalDirection::Forward => 1,
            VertexTraversalDirection::Backward => -1,
        }
    }
}

/// Loop represents a simple spherical polygon. It consists of a sequence
/// of vertices where the first vertex is implicitly connected to the
/// last. All loops are defined to have a CCW orientation, i.e. the
/// interior of the loop is on the left side of the edges. This implies
/// that a clockwise loop enclosing a small area is interpreted to be a
/// CCW loop enclosing a very large area.
///
/// Loops are not allowed to have any duplicate vertices (whether adjacent
/// or not). Non-adjacent edges are not allowed to intersect, and
/// furthermore edges of length 180 degrees are not allowed (i.e.,
/// adjacent vertices cannot be antipodal). Loops must have at least 3
/// vertices (except for the "empty" and "full" loops discussed below).
///
/// There are two special loops: the "empty" loop contains no points and
/// the "full" loop contains all points. These loops do not have any
/// edges, but to preserve the invariant that every loop can be
/// represented as a vertex chain, they are defined as having exactly one
/// vertex each (see `empty` and `full`).
pub struct Loop {
    /// The vertices of the loop, ordered counterclockwise around the loop
    /// interior. Shared with the index's shape adaptor; mutating
    /// operations rebind the adaptor.
    vertices: Arc<Vec<Point>>,

    /// A precomputed value of whether this loop contains the sphere's
    /// fixed origin point, so the brute-force containment test does not
    /// recompute it from the vertices every time.
    origin_inside: bool,

    /// The nesting depth of this loop if it is contained by a polygon or
    /// other shape; used to determine whether this loop represents a hole
    /// or a filled-in portion.
    depth: i32,

    /// A conservative bound on all points contained by this loop. If
    /// `l.contains_point(p)`, then `l.bound.contains_point(p)`.
    bound: Rect,

    /// Since bound is not exact, it is possible that a loop A contains
    /// another loop B whose bounds are slightly larger. subregion_bound
    /// has been expanded sufficiently to account for this error: if
    /// A.contains(B), then A.subregion_bound.contains(B.bound).
    subregion_bound: Rect,

    /// The spatial index of this loop's edges, built lazily.
    index: ShapeIndex,

    /// The number of unindexed contains_point calls since the last
    /// mutation; used to decide when building the index pays off.
    unindexed_contains_calls: AtomicI32,

    debug_override: DebugOverride,
    lazy_indexing: bool,
}

impl Loop {
    /// Creates a new loop from the given vertices, using default options.
    pub fn from_points(pts: Vec<Point>) -> Self {
        Self::from_points_with_options(pts, &LoopOptions::default())
    }

    /// Creates a new loop from the given vertices and options.
    pub fn from_points_with_options(pts: Vec<Point>, options: &LoopOptions) -> Self {
        let mut l = Loop {
            vertices: Arc::new(pts),
            origin_inside: false,
            depth: 0,
            bound: Rect::empty(),
            subregion_bound: Rect::empty(),
            index: ShapeIndex::new(),
            unindexed_contains_calls: AtomicI32::new(0),
            debug_override: options.debug_override,
            lazy_indexing: options.lazy_indexing,
        };
        l.init_origin_and_bound();
        l
    }

    /// Creates a loop corresponding to the given cell.
    ///
    /// Note that the loop and cell *do not* contain exactly the same set
    /// of points, because Loop and Cell have slightly different
    /// definitions of point containment. For example, a Cell vertex is
    /// contained by all four neighboring cells, but it is contained by
    /// exactly one of four loops constructed from those cells.
    pub fn from_cell(c: &Cell) -> Self {
        // The bounding rectangle is recomputed from scratch, since Cell
        // uses a different method and all the bounds must be consistent.
        Self::from_points(vec![c.vertex(0), c.vertex(1), c.vertex(2), c.vertex(3)])
    }

    /// Returns the special "empty" loop, which contains no points.
    pub fn empty() -> Self {
        Self::from_points(vec![EMPTY_LOOP_POINT])
    }

    /// Returns the special "full" loop, which contains all points.
    pub fn full() -> Self {
        Self::from_points(vec![FULL_LOOP_POINT])
    }

    /// Sets the origin containment and then initializes the bounds and
    /// the internal index.
    fn init_origin_and_bound(&mut self) {
        if self.vertices.len() < 3 {
            // Check for the special "empty" and "full" loops (which have
            // one vertex).
            if !self.is_empty_or_full() {
                self.origin_inside = false;
                return;
            }
            // This is the special empty or full loop, so the origin
            // depends on whether the vertex is in the southern hemisphere.
            self.origin_inside = self.vertices[0].0.z < 0.0;
        } else {
            // Point containment testing is done by counting edge crossings
            // starting at a fixed reference point (the origin). We need to
            // know whether the reference point is inside or outside the
            // loop before we can build the index. We do this by first
            // guessing that it is outside, and then seeing whether we get
            // the correct containment result for vertex 1. If the result
            // is incorrect, the origin must be inside the loop.
            //
            // A loop with consecutive vertices A,B,C contains vertex B if
            // and only if the fixed vector R = ortho(B) is contained by
            // the wedge ABC. The wedge is closed at A and open at C, which
            // is required for compatibility with vertex_crossing. (Note
            // that we can't use the origin itself as the fixed vector
            // because of the possibility that B == origin.)
            let v1_inside = self.vertex(0) != self.vertex(1)
                && self.vertex(2) != self.vertex(1)
                && ordered_ccw(
                    &self.vertex(1).ortho(),
                    &self.vertex(0),
                    &self.vertex(2),
                    &self.vertex(1),
                );

            // Initialize before calling contains_point.
            self.origin_inside = false;

            // Note that contains_point only does a bounds check once the
            // index is up to date, so it doesn't matter that bound is
            // undefined here.
            if v1_inside != self.contains_point(&self.vertex(1)) {
                self.origin_inside = true;
            }
        }

        // We *must* call init_bound before init_index, because init_bound
        // calls contains_point which does a bounds check whenever the
        // index is not fresh (i.e., the loop has been added to the index
        // but the index has not been updated yet).
        self.init_bound();
        self.init_index();
    }

    /// Sets up the conservative bounding rectangles for this loop.
    fn init_bound(&mut self) {
        // Check for the special "empty" and "full" loops.
        if self.is_empty_or_full() {
            if self.is_empty() {
                self.bound = Rect::empty();
            } else {
                self.bound = Rect::full();
            }
            self.subregion_bound = self.bound;
            return;
        }

        // The bounding rectangle of a loop is not necessarily the same as
        // the bounding rectangle of its vertices. First, the maximal
        // latitude may be attained along the interior of an edge. Second,
        // the loop may wrap entirely around the sphere (e.g. a loop that
        // defines two revolutions of a candy-cane stripe). Third, the loop
        // may include one or both poles. Note that a small clockwise loop
        // near the equator contains both poles.
        let mut bounder = RectBounder::new();
        for i in 0..=self.vertices.len() {
            // Add vertex 0 twice to close the ring.
            bounder.add_point(&self.vertex(i));
        }
        let mut b = bounder.get_bound();

        if self.contains_point(&Point(R3Vector::new(0.0, 0.0, 1.0))) {
            b = Rect {
                lat: crate::r1::interval::Interval::new(b.lat.lo, PI / 2.0),
                lng: crate::s1::interval::Interval::full(),
            };
        }
        // If a loop contains the south pole, then either it wraps entirely
        // around the sphere (full longitude range), or it also contains
        // the north pole in which case b.lng is full due to the test
        // above. Either way, we only need to do the south pole containment
        // test if b.lng is full.
        if b.lng.is_full() && self.contains_point(&Point(R3Vector::new(0.0, 0.0, -1.0))) {
            b.lat.lo = -PI / 2.0;
        }
        self.bound = b;
        self.subregion_bound = expand_for_subregions(&self.bound);
    }

    /// Adds the loop's shape adaptor to the index, optionally forcing the
    /// index build immediately.
    fn init_index(&mut self) {
        self.index.reset();
        self.index.add(Arc::new(LoopShape {
            vertices: Arc::clone(&self.vertices),
            origin_inside: self.origin_inside,
        }));
        if !self.lazy_indexing {
            self.index.force_apply_updates();
        }
        if self.debug_override == DebugOverride::AllowDebug {
            debug_assert!(self.is_valid());
        }
    }

    /// Clears the state that depends on the vertex sequence: the
    /// unindexed call counter and the index contents.
    fn reset_mutable_fields(&mut self) {
        self.unindexed_contains_calls.store(0, Ordering::Release);
        self.index.reset();
    }

    /// Reports whether this is the special empty loop that contains no
    /// points.
    pub fn is_empty(&self) -> bool {
        self.is_empty_or_full() && !self.contains_origin()
    }

    /// Reports whether this is the special full loop that contains all
    /// points.
    pub fn is_full(&self) -> bool {
        self.is_empty_or_full() && self.contains_origin()
    }

    /// Reports whether this loop is either the empty or full special
    /// loop.
    pub fn is_empty_or_full(&self) -> bool {
        self.vertices.len() == 1
    }

    /// The number of vertices in this loop.
    pub fn num_vertices(&self) -> usize {
        self.vertices.len()
    }

    /// The number of edges in this loop (zero for the sentinels).
    pub fn num_edges(&self) -> usize {
        if self.is_empty_or_full() {
            0
        } else {
            self.vertices.len()
        }
    }

    /// Returns the vertex at the given index. For convenience, the vertex
    /// indices wrap automatically for methods that do index math such as
    /// edge traversal: vertex(num_vertices() + n) is the same as
    /// vertex(n).
    pub fn vertex(&self, i: usize) -> Point {
        self.vertices[i % self.vertices.len()]
    }

    /// The vertices of the loop.
    pub fn vertices(&self) -> &[Point] {
        &self.vertices
    }

    /// Returns the vertex in reverse order if the loop represents a
    /// polygon hole, so that the interior of the polygon is always to the
    /// left of the vertex chain. Requires 0 <= i < 2 * num_vertices().
    pub fn oriented_vertex(&self, i: usize) -> Point {
        let n = self.vertices.len();
        let mut j = i;
        if j >= n {
            j -= n;
        }
        if self.is_hole() {
            j = n - 1 - j;
        }
        self.vertex(j)
    }

    /// Reports whether the loop contains the sphere's fixed origin point.
    pub fn contains_origin(&self) -> bool {
        self.origin_inside
    }

    /// The reference point for this loop's shape.
    pub fn reference_point(&self) -> ReferencePoint {
        ReferencePoint::origin(self.origin_inside)
    }

    /// The nesting depth of this loop within its containing polygon. The
    /// loop core treats the value as opaque apart from its parity.
    pub fn depth(&self) -> i32 {
        self.depth
    }

    pub fn set_depth(&mut self, depth: i32) {
        self.depth = depth;
    }

    /// Reports whether this loop represents a hole in its containing
    /// polygon.
    pub fn is_hole(&self) -> bool {
        self.depth & 1 != 0
    }

    /// Returns -1 if this loop represents a hole in its containing
    /// polygon, and +1 otherwise.
    pub fn sign(&self) -> i32 {
        if self.is_hole() {
            -1
        } else {
            1
        }
    }

    /// A tight bounding rectangle: if the loop contains a point P, then
    /// the bound contains P as well.
    pub fn rect_bound(&self) -> Rect {
        self.bound
    }

    /// The bound expanded such that if this loop contains another loop,
    /// the expansion contains the other loop's (tight) bound.
    pub fn subregion_bound(&self) -> Rect {
        self.subregion_bound
    }

    /// A bounding spherical cap. This is conservative rather than tight.
    pub fn cap_bound(&self) -> Cap {
        self.bound.cap_bound()
    }

    /// The loop's edge index.
    pub fn index(&self) -> &ShapeIndex {
        &self.index
    }

    // ---------------------------------------------------------------
    // Validation.

    /// Reports whether this is a valid loop. Any error found is hidden
    /// from the caller, but is logged when debug checking is enabled.
    pub fn is_valid(&self) -> bool {
        if let Err(err) = self.find_validation_error() {
            if self.debug_override == DebugOverride::AllowDebug {
                error!(error = %err, "invalid loop");
            }
            return false;
        }
        true
    }

    /// Returns the first validation error found, checking both the cheap
    /// structural properties and (via the index) self-intersections.
    pub fn find_validation_error(&self) -> Result<(), Error> {
        self.find_validation_error_no_index()?;
        find_self_intersection(&self.index)
    }

    /// Like find_validation_error, but skips any checks that would
    /// require building the index. Used by callers that validate many
    /// loops before indexing any of them.
    pub fn find_validation_error_no_index(&self) -> Result<(), Error> {
        // subregion_bound must be at least as large as bound. (This is an
        // internal consistency check rather than a test of client data.)
        debug_assert!(
            self.subregion_bound.contains(&self.bound),
            "subregion bound not initialized"
        );

        // All vertices must be unit length.
        for (i, v) in self.vertices.iter().enumerate() {
            if !v.is_unit() {
                return Err(Error::NotUnitLength(i));
            }
        }

        // Loops must have at least 3 vertices (except for empty and full).
        if self.vertices.len() < 3 {
            if self.is_empty_or_full() {
                return Ok(()); // Skip remaining tests.
            }
            return Err(Error::NotEnoughVertices);
        }

        // Loops are not allowed to have any duplicate vertices or edge
        // crossings. We split this check into two parts. First we check
        // that no edge is degenerate (identical endpoints). Then we check
        // that there are no intersections between non-adjacent edges
        // (including at vertices). The second check needs the index, so it
        // does not fall within the scope of this method.
        for i in 0..self.vertices.len() {
            if self.vertex(i) == self.vertex(i + 1) {
                return Err(Error::DuplicateVertices(i));
            }
        }
        Ok(())
    }

    // ---------------------------------------------------------------
    // Point containment.

    /// Reports whether the loop contains the given point.
    ///
    /// For small loops (and during initialization) this checks all edge
    /// crossings directly; otherwise it consults the edge index, building
    /// it once enough unindexed calls have accumulated to amortize the
    /// construction cost. The threshold implements a competitive
    /// strategy: building the index costs roughly 50 calls' worth of
    /// work, and we switch somewhat earlier (20) because other API calls
    /// may force the build anyway. The counter is incremented atomically
    /// so that when many calls are made in parallel, only one thread
    /// builds the index while the rest continue using brute force until
    /// the index is actually available.
    pub fn contains_point(&self, p: &Point) -> bool {
        // NOTE: A bounds check slows down this function by about 50%. It
        // is worthwhile only when it might allow us to delay building the
        // index.
        if !self.index.is_fresh() && !self.bound.contains_point(p) {
            return false;
        }

        const MAX_BRUTE_FORCE_VERTICES: usize = 32;
        const MAX_UNINDEXED_CONTAINS_CALLS: i32 = 20;
        if self.index.num_shape_ids() == 0 // init_index not called yet
            || self.vertices.len() <= MAX_BRUTE_FORCE_VERTICES
            || (!self.index.is_fresh()
                && self.unindexed_contains_calls.fetch_add(1, Ordering::AcqRel) + 1
                    != MAX_UNINDEXED_CONTAINS_CALLS)
        {
            return self.brute_force_contains_point(p);
        }

        // Otherwise, look up the containing index cell. Note that the
        // index is built automatically the first time an iterator is
        // created.
        let mut it = self.index.iterator();
        if !it.locate_point(p) {
            return false;
        }
        self.iterator_contains_point(&mut it, p)
    }

    /// Reports whether the loop contains the point by brute force,
    /// counting edge crossings from the fixed origin.
    pub fn brute_force_contains_point(&self, p: &Point) -> bool {
        // Empty and full loops don't need a special case, but invalid
        // loops with zero vertices do, so we might as well handle them all
        // at once.
        if self.vertices.len() < 3 {
            return self.origin_inside;
        }

        let origin = Point::origin();
        let mut inside = self.origin_inside;
        let mut crosser = EdgeCrosser::new_chain_edge_crosser(&origin, p, &self.vertex(0));
        for i in 1..=self.vertices.len() {
            // Add vertex 0 twice to close the ring.
            inside = inside != crosser.edge_or_vertex_chain_crossing(&self.vertex(i));
        }
        inside
    }

    /// Reports whether the loop contains the point, given an iterator
    /// positioned at the index cell containing the point. Containment is
    /// tested by drawing a line segment from the cell center to the point
    /// and counting edge crossings.
    fn iterator_contains_point(&self, it: &mut ShapeIndexIterator, p: &Point) -> bool {
        let a_clipped = match it.index_cell().and_then(|c| c.find_by_shape_id(0)) {
            Some(clipped) => clipped.clone(),
            None => return false,
        };
        let mut inside = a_clipped.contains_center;

        if a_clipped.num_edges() > 0 {
            let center = it.center();
            let mut crosser = EdgeCrosser::new(&center, p);
            let mut ai_prev: i64 = -2;
            for i in 0..a_clipped.num_edges() {
                let ai = a_clipped.edge(i);
                if i64::from(ai) != ai_prev + 1 {
                    crosser.restart_at(&self.vertex(ai as usize));
                }
                ai_prev = i64::from(ai);
                inside =
                    inside != crosser.edge_or_vertex_chain_crossing(&self.vertex(ai as usize + 1));
            }
        }
        inside
    }

    /// Reports whether the loop contains the given cell. The loop must
    /// completely cover the cell: a cell that merely shares boundary
    /// points is not contained.
    pub fn contains_cell(&self, target: &Cell) -> bool {
        let mut it = self.index.iterator();
        let relation = it.locate_cell_id(target.id);

        // If target is disjoint from all index cells, it is not contained.
        // Similarly, if target is subdivided into one or more index cells,
        // it is not contained, since index cells are subdivided only if
        // they (nearly) intersect a sufficient number of edges. (But note
        // that if target itself is an index cell then it may be contained,
        // since it could be a cell with no edges in the loop interior.)
        if relation != CellRelation::Indexed {
            return false;
        }

        // Otherwise check if any edges intersect target.
        if self.boundary_approx_intersects(&mut it, target) {
            return false;
        }

        // Otherwise check if the loop contains the center of target.
        self.iterator_contains_point(&mut it, &target.center())
    }

    /// Reports whether the loop might intersect the given cell; false
    /// positives are possible (within the documented clip error), false
    /// negatives are not.
    pub fn may_intersect_cell(&self, target: &Cell) -> bool {
        let mut it = self.index.iterator();
        let relation = it.locate_cell_id(target.id);

        // If target does not overlap any index cell, there is no
        // intersection.
        if relation == CellRelation::Disjoint {
            return false;
        }
        // If target is subdivided into one or more index cells, there is
        // an intersection to within the index error bound.
        if relation == CellRelation::Subdivided {
            return true;
        }
        // If target is an index cell, there is an intersection because
        // index cells are created only if they have at least one edge or
        // they are entirely contained by the loop.
        if it.cell_id() == target.id {
            return true;
        }
        // Otherwise check if any edges intersect target.
        if self.boundary_approx_intersects(&mut it, target) {
            return true;
        }
        // Otherwise check if the loop contains the center of target.
        self.iterator_contains_point(&mut it, &target.center())
    }

    /// Reports whether the loop's boundary intersects the target cell. It
    /// may also return true when the boundary does not intersect but some
    /// edge comes within the worst-case error tolerance.
    ///
    /// Requires that the iterator is positioned at a cell containing the
    /// target (locate_cell_id returned Indexed).
    fn boundary_approx_intersects(&self, it: &mut ShapeIndexIterator, target: &Cell) -> bool {
        debug_assert!(it.cell_id().contains(&target.id));
        let a_clipped = match it.index_cell().and_then(|c| c.find_by_shape_id(0)) {
            Some(clipped) => clipped.clone(),
            None => return false,
        };

        // If there are no edges, there is no intersection.
        if a_clipped.num_edges() == 0 {
            return false;
        }

        // We can save some work if target is the index cell itself.
        if it.cell_id() == target.id {
            return true;
        }

        // Otherwise check whether any of the edges intersect target.
        const MAX_ERROR: f64 = FACE_CLIP_ERROR_UV_COORD + INTERSECTS_RECT_ERROR_UV_DIST;
        let bound = target.bound_uv().expanded_by_margin(MAX_ERROR);
        for i in 0..a_clipped.num_edges() {
            let ai = a_clipped.edge(i) as usize;
            if let Some((v0, v1)) = clip_to_padded_face(
                &self.vertex(ai),
                &self.vertex(ai + 1),
                target.face(),
                MAX_ERROR,
            ) {
                if edge_intersects_rect(&v0, &v1, &bound) {
                    return true;
                }
            }
        }
        false
    }

    // ---------------------------------------------------------------
    // Area, centroid, and turning angle.

    /// Returns the area of the loop interior, i.e. the region on the left
    /// side of the loop. The return value is between 0 and 4*pi. This
    /// value is not affected by whether the loop is a "hole" or a
    /// "shell".
    pub fn area(&self) -> f64 {
        // It is surprisingly difficult to compute the area of a loop
        // robustly. The main issues are (1) whether degenerate loops are
        // considered to be CCW or not (i.e., whether their area is close
        // to 0 or 4*pi), and (2) computing the areas of small loops with
        // good relative accuracy.
        //
        // The strategy: compute the area as a signed sum over (possibly
        // overlapping) triangles, which has good relative accuracy, and
        // estimate the maximum error of that sum. If the result lands
        // within the error margin of 0 or 4*pi, double-check the loop
        // orientation using the Gauss-Bonnet based is_normalized and
        // return the end the orientation selects.
        if self.is_empty_or_full() {
            if self.contains_origin() {
                return 4.0 * PI;
            }
            return 0.0;
        }
        let mut area = self.surface_integral_f64(|a, b, c| signed_area(a, b, c));

        // The signed area should be between approximately -4*pi and 4*pi.
        let max_error = self.turning_angle_max_error();
        debug_assert!(area.abs() <= 4.0 * PI + max_error);
        if area < 0.0 {
            // We have computed the negative of the area of the loop
            // exterior.
            area += 4.0 * PI;
        }
        area = area.clamp(0.0, 4.0 * PI);

        // If the area is close enough to zero or 4*pi so that the loop
        // orientation is ambiguous, then we compute the loop orientation
        // explicitly.
        if area < max_error && !self.is_normalized() {
            return 4.0 * PI;
        } else if area > (4.0 * PI - max_error) && self.is_normalized() {
            return 0.0;
        }
        area
    }

    /// Returns the true centroid of the loop multiplied by the area of
    /// the loop. The result is not unit length and the centroid may not
    /// be contained by the loop.
    ///
    /// We prescale by the loop area for two reasons: (1) it is cheaper to
    /// compute this way, and (2) it makes it easier to compute the
    /// centroid of more complicated shapes (by splitting them into
    /// disjoint regions and adding their centroids).
    pub fn centroid(&self) -> Point {
        // surface_integral_point returns either the integral of position
        // over the loop interior, or the negative of the integral of
        // position over the loop exterior. But these two values are the
        // same (!), because the integral of position over the entire
        // sphere is (0, 0, 0).
        self.surface_integral_point(true_centroid)
    }

    /// Computes the oriented surface integral of some scalar quantity
    /// f(A,B,C) over the loop interior, as a signed sum over a triangle
    /// fan rooted near vertex 0. Triangles may overlap; overlapping
    /// contributions cancel, yielding the integral over the interior.
    fn surface_integral_f64<F>(&self, f: F) -> f64
    where
        F: Fn(&Point, &Point, &Point) -> f64,
    {
        // Maximum length of an edge for it to be considered numerically
        // stable. The exact value is fairly arbitrary since it depends on
        // the stability of the function f.
        const MAX_LENGTH: f64 = PI - 1e-5;

        let mut sum = 0.0;
        let mut origin = self.vertex(0);
        for i in 1..self.vertices.len() - 1 {
            // Let V_i be vertex(i), let O be the current origin, and let
            // length(A,B) be the length of edge (A,B). At the start of
            // each loop iteration, the "leading edge" of the triangle fan
            // is (O,V_i), and we want to extend the triangle fan so that
            // the leading edge is (O,V_i+1).
            if self.vertex(i + 1).0.angle(&origin.0).rad() > MAX_LENGTH {
                // We are about to create an unstable edge, so choose a new
                // origin O' for the triangle fan.
                let old_origin = origin;
                if origin == self.vertex(0) {
                    // The following point is well-separated from V_i and
                    // V_0 (and therefore V_i+1 as well).
                    origin = Point(self.vertex(0).0.cross(&self.vertex(i).0).normalize());
                } else if self.vertex(i).0.angle(&self.vertex(0).0).rad() < MAX_LENGTH {
                    // All edges of the triangle (O, V_0, V_i) are stable,
                    // so we can revert to using V_0 as the origin.
                    origin = self.vertex(0);
                } else {
                    // (O, V_i+1) and (V_0, V_i) are antipodal pairs, and O
                    // and V_0 are perpendicular. Therefore V_0 x O is
                    // approximately perpendicular to all of {O, V_0, V_i,
                    // V_i+1}, and we can choose this point O' as the new
                    // origin.
                    origin = Point(self.vertex(0).0.cross(&old_origin.0));
                    // Advance the edge (V_0,O) to (V_0,O').
                    sum += f(&self.vertex(0), &old_origin, &origin);
                }
                // Advance the edge (O,V_i) to (O',V_i).
                sum += f(&old_origin, &self.vertex(i), &origin);
            }
            // Advance the edge (O,V_i) to (O,V_i+1).
            sum += f(&origin, &self.vertex(i), &self.vertex(i + 1));
        }
        // If the origin is not V_0, we need to sum one more triangle.
        if origin != self.vertex(0) {
            // Advance the edge (O,V_n-1) to (O,V_0).
            sum += f(&origin, &self.vertex(self.vertices.len() - 1), &self.vertex(0));
        }
        sum
    }

    /// Like surface_integral_f64, for vector-valued integrands.
    fn surface_integral_point<F>(&self, f: F) -> Point
    where
        F: Fn(&Point, &Point, &Point) -> Point,
    {
        const MAX_LENGTH: f64 = PI - 1e-5;

        let mut sum = R3Vector::default();
        let mut origin = self.vertex(0);
        for i in 1..self.vertices.len() - 1 {
            if self.vertex(i + 1).0.angle(&origin.0).rad() > MAX_LENGTH {
                let old_origin = origin;
                if origin == self.vertex(0) {
                    origin = Point(self.vertex(0).0.cross(&self.vertex(i).0).normalize());
                } else if self.vertex(i).0.angle(&self.vertex(0).0).rad() < MAX_LENGTH {
                    origin = self.vertex(0);
                } else {
                    origin = Point(self.vertex(0).0.cross(&old_origin.0));
                    sum = sum + f(&self.vertex(0), &old_origin, &origin).0;
                }
                sum = sum + f(&old_origin, &self.vertex(i), &origin).0;
            }
            sum = sum + f(&origin, &self.vertex(i), &self.vertex(i + 1)).0;
        }
        if origin != self.vertex(0) {
            sum = sum + f(&origin, &self.vertex(self.vertices.len() - 1), &self.vertex(0)).0;
        }
        Point(sum)
    }

    /// Returns the sum of the turning angles at each vertex. The return
    /// value is positive if the loop is counter-clockwise, negative if
    /// the loop is clockwise, and zero if the loop is a great circle.
    /// (This quantity is also called the "geodesic curvature" of the
    /// loop.)
    ///
    /// Degenerate and nearly-degenerate loops are handled consistently
    /// with the robust orientation predicate: if a loop is considered CCW
    /// by symbolic perturbation, its turning angle is approximately 2*pi.
    pub fn turning_angle(&self) -> f64 {
        // For empty and full loops, we return the limit value as the loop
        // area approaches 0 or 4*pi respectively.
        if self.is_empty_or_full() {
            if self.contains_origin() {
                return -2.0 * PI;
            }
            return 2.0 * PI;
        }

        // Don't crash even if the loop is not well-defined.
        if self.vertices.len() < 3 {
            return 0.0;
        }

        // To ensure that we get the same result when the vertex order is
        // rotated, and that the result is negated when the vertex order is
        // reversed, we need to add up the individual turn angles in a
        // consistent order. (In general, adding up a set of numbers in a
        // different order can change the sum due to rounding errors.)
        //
        // Furthermore, if we just accumulate an ordinary sum then the
        // worst-case error is quadratic in the number of vertices. (This
        // can happen with spiral shapes, where the partial sum of the
        // turning angles can be linear in the number of vertices.) To
        // avoid this we use the Kahan summation algorithm.
        let n = self.vertices.len() as isize;
        let (first, dir) = self.canonical_first_vertex();
        let d = dir.delta();
        let v = |k: isize| self.vertex(k.rem_euclid(n) as usize);

        let mut i = first as isize;
        let mut sum = turn_angle(&v(i - d), &v(i), &v(i + d));
        let mut compensation = 0.0;
        let mut remaining = n - 1;
        while remaining > 0 {
            i += d;
            let mut angle = turn_angle(&v(i - d), &v(i), &v(i + d));
            let old_sum = sum;
            angle += compensation;
            sum += angle;
            compensation = (old_sum - sum) + angle;
            remaining -= 1;
        }

        // Bound the result to handle floating point wobble near the
        // extremes.
        const MAX_CURVATURE: f64 = 2.0 * PI - 4.0 * DBL_EPSILON;
        (d as f64 * (sum + compensation)).clamp(-MAX_CURVATURE, MAX_CURVATURE)
    }

    /// The maximum error in turning_angle. The value is not constant; it
    /// depends on the loop.
    pub fn turning_angle_max_error(&self) -> f64 {
        // The maximum error can be bounded as follows:
        //   2.24 * DBL_EPSILON    for point_cross(b, a)
        //   2.24 * DBL_EPSILON    for point_cross(c, b)
        //   3.25 * DBL_EPSILON    for the angle
        //   2.00 * DBL_EPSILON    for each addition in the Kahan summation
        //   ------------------
        //   9.73 * DBL_EPSILON
        const MAX_ERROR_PER_VERTEX: f64 = 9.73 * DBL_EPSILON;
        MAX_ERROR_PER_VERTEX * self.vertices.len() as f64
    }

    /// Returns a first index and a direction such that the vertex
    /// sequence (first, first+dir, ..., first+(n-1)*dir) does not change
    /// when the loop vertex order is rotated or inverted. This allows the
    /// loop vertices to be traversed in a canonical order. The return
    /// values are chosen such that (first, ..., first+n*dir) are in the
    /// range [0, 2*n-1] as expected by vertex().
    fn canonical_first_vertex(&self) -> (usize, VertexTraversalDirection) {
        let mut first = 0;
        let n = self.vertices.len();
        for i in 1..n {
            if self.vertex(i).0.cmp(&self.vertex(first).0) == CmpOrdering::Less {
                first = i;
            }
        }
        // 0 <= first <= n-1, so (first+n*dir) <= 2*n-1.
        if self.vertex(first + 1).0.cmp(&self.vertex(first + n - 1).0) == CmpOrdering::Less {
            return (first, VertexTraversalDirection::Forward);
        }
        // n <= first <= 2*n-1, so (first+n*dir) >= 0.
        (first + n, VertexTraversalDirection::Backward)
    }

    /// Reports whether the loop area is at most 2*pi. Degenerate loops
    /// are handled consistently with the robust orientation predicate:
    /// if a loop can be expressed as a union of degenerate or
    /// nearly-degenerate CCW triangles, it is considered normalized.
    pub fn is_normalized(&self) -> bool {
        // Optimization: if the longitude span is less than 180 degrees,
        // then the loop covers less than half the sphere and is therefore
        // normalized.
        if self.bound.lng.len() < PI {
            return true;
        }
        // We allow some error so that hemispheres are always considered
        // normalized. The turning angle evaluates exactly to -2*pi for
        // hemispheres, with no error.
        self.turning_angle() >= -self.turning_angle_max_error()
    }

    /// Inverts the loop if necessary so that the area enclosed by the
    /// loop is at most 2*pi.
    pub fn normalize(&mut self) {
        if !self.is_normalized() {
            self.invert();
        }
        debug_assert!(self.is_normalized());
    }

    /// Reverses the order of the loop vertices, effectively complementing
    /// the region represented by the loop. For example, the loop ABCD
    /// (with edges AB, BC, CD, DA) becomes the loop DCBA (with edges DC,
    /// CB, BA, AD).
    pub fn invert(&mut self) {
        self.reset_mutable_fields();
        if self.is_empty_or_full() {
            let v = if self.is_full() {
                EMPTY_LOOP_POINT
            } else {
                FULL_LOOP_POINT
            };
            Arc::make_mut(&mut self.vertices)[0] = v;
        } else {
            Arc::make_mut(&mut self.vertices).reverse();
        }

        // origin_inside must be set correctly before rebuilding the index.
        self.origin_inside = !self.origin_inside;
        if self.bound.lat.lo > -PI / 2.0 && self.bound.lat.hi < PI / 2.0 {
            // The complement of this loop contains both poles.
            self.bound = Rect::full();
            self.subregion_bound = self.bound;
        } else {
            self.init_bound();
        }
        self.init_index();
    }

    // ---------------------------------------------------------------
    // Distance and projection.

    /// The distance from the given point to the loop interior. The
    /// distance is zero for points inside the loop. For loops with no
    /// edges (the sentinels), returns pi.
    pub fn distance(&self, x: &Point) -> Angle {
        if self.contains_point(x) {
            return Angle(0.0);
        }
        self.distance_to_boundary(x)
    }

    /// The distance from the given point to the loop boundary. For loops
    /// with no edges (the sentinels), returns pi.
    pub fn distance_to_boundary(&self, x: &Point) -> Angle {
        let mut min_dist = Angle(PI);
        for i in 0..self.num_edges() {
            let d = edge_distance::distance_from_segment(x, &self.vertex(i), &self.vertex(i + 1));
            if d < min_dist {
                min_dist = d;
            }
        }
        min_dist
    }

    /// The closest point in the loop interior to the given point. Points
    /// inside the loop project to themselves.
    pub fn project(&self, x: &Point) -> Point {
        if self.contains_point(x) {
            return *x;
        }
        self.project_to_boundary(x)
    }

    /// The closest point on the loop boundary to the given point. For
    /// loops with no edges (the sentinels), returns the sentinel vertex.
    pub fn project_to_boundary(&self, x: &Point) -> Point {
        let mut best = self.vertex(0);
        let mut min_dist = Angle(f64::INFINITY);
        for i in 0..self.num_edges() {
            let p = edge_distance::project(x, &self.vertex(i), &self.vertex(i + 1));
            let d = x.distance(&p);
            if d < min_dist {
                min_dist = d;
                best = p;
            }
        }
        best
    }

    // ---------------------------------------------------------------
    // Equality and boundary matching.

    /// Reports whether two loops have the same vertices in the same
    /// linear order (i.e., cyclic rotations are not allowed).
    pub fn equal(&self, other: &Loop) -> bool {
        if self.vertices.len() != other.vertices.len() {
            return false;
        }
        for i in 0..self.vertices.len() {
            if self.vertex(i) != other.vertex(i) {
                return false;
            }
        }
        true
    }

    /// Reports whether the two loops have the same boundary. This is true
    /// if and only if the loops have the same vertices in the same cyclic
    /// order (i.e., the vertices may be cyclically rotated). The empty
    /// and full loops are considered to have different boundaries.
    pub fn boundary_equal(&self, o: &Loop) -> bool {
        if self.vertices.len() != o.vertices.len() {
            return false;
        }

        // Special case to handle empty or full loops. Since they have the
        // same number of vertices, if one loop is empty/full then so is
        // the other.
        if self.is_empty_or_full() {
            return self.is_empty() == o.is_empty();
        }

        for offset in 0..self.vertices.len() {
            if self.vertex(offset) == o.vertex(0) {
                // There is at most one starting offset since loop vertices
                // are unique.
                let mut matched = true;
                for i in 0..self.vertices.len() {
                    if self.vertex(i + offset) != o.vertex(i) {
                        matched = false;
                        break;
                    }
                }
                if matched {
                    return true;
                }
            }
        }
        false
    }

    /// Reports whether the two loops have the same boundary except for
    /// vertex perturbations: the vertices in the two loops must be in the
    /// same cyclic order, and corresponding vertex pairs must be
    /// separated by no more than max_error.
    pub fn boundary_approx_equals(&self, o: &Loop, max_error: f64) -> bool {
        if self.vertices.len() != o.vertices.len() {
            return false;
        }
        if self.is_empty_or_full() {
            return self.is_empty() == o.is_empty();
        }

        for offset in 0..self.vertices.len() {
            if self.vertex(offset).approx_equal_with(&o.vertex(0), max_error) {
                let mut success = true;
                for i in 0..self.vertices.len() {
                    if !self
                        .vertex(i + offset)
                        .approx_equal_with(&o.vertex(i), max_error)
                    {
                        success = false;
                        break;
                    }
                }
                if success {
                    return true;
                }
                // Otherwise continue looping. There may be more than one
                // candidate starting offset since vertices are only
                // matched approximately.
            }
        }
        false
    }

    /// Reports whether the two loop boundaries are within max_error of
    /// each other along their entire lengths. The two loops may have
    /// different numbers of vertices. More precisely, this method returns
    /// true if the two loops have parameterizations a(t) and b(t) such
    /// that `distance(a(t), b(t)) <= max_error` for all t.
    pub fn boundary_near(&self, b: &Loop, max_error: f64) -> bool {
        // Special case to handle empty or full loops.
        if self.is_empty_or_full() || b.is_empty_or_full() {
            return (self.is_empty() && b.is_empty()) || (self.is_full() && b.is_full());
        }

        for a_offset in 0..self.vertices.len() {
            if match_boundaries(self, b, a_offset, max_error) {
                return true;
            }
        }
        false
    }

    /// Finds a vertex of this loop that matches the given point, if any,
    /// returning its index in the range [1, num_vertices] (so that the
    /// caller can safely address the previous vertex).
    fn find_vertex(&self, p: &Point) -> Option<usize> {
        let n = self.vertices.len();
        if n < 10 {
            // Exhaustive search for loops below a small threshold.
            for i in 1..=n {
                if self.vertex(i) == *p {
                    return Some(i);
                }
            }
            return None;
        }
        let mut it = self.index.iterator();
        if !it.locate_point(p) {
            return None;
        }

        let a_clipped = it.index_cell()?.find_by_shape_id(0)?.clone();
        for i in (0..a_clipped.num_edges()).rev() {
            let ai = a_clipped.edge(i) as usize;
            if self.vertex(ai) == *p {
                return Some(if ai == 0 { n } else { ai });
            }
            if self.vertex(ai + 1) == *p {
                return Some(ai + 1);
            }
        }
        None
    }

    // ---------------------------------------------------------------
    // Pairwise loop relations.

    /// Reports whether the region contained by this loop is a superset of
    /// the region contained by the given other loop.
    pub fn contains(&self, b: &Loop) -> bool {
        // For this loop A to contain the given loop B, all of the
        // following must be true:
        //
        //  (1) There are no edge crossings between A and B except at
        //      vertices.
        //
        //  (2) At every vertex that is shared between A and B, the local
        //      edge ordering implies that A contains B.
        //
        //  (3) If there are no shared vertices, then A must contain a
        //      vertex of B and B must not contain a vertex of A. (An
        //      arbitrary vertex may be chosen in each case.)
        //
        // The second part of (3) is necessary to detect the case of two
        // loops whose union is the entire sphere, i.e. two loops that
        // contain each other's boundaries but not each other's interiors.
        if !self.subregion_bound.contains(&b.bound) {
            return false;
        }

        // Special cases to handle either loop being empty or full.
        if self.is_empty_or_full() || b.is_empty_or_full() {
            return self.is_full() || b.is_empty();
        }

        // Check whether there are any edge crossings, and also check the
        // loop relationship at any shared vertices.
        let mut relation = ContainsRelation::new();
        if has_crossing_relation(self, b, &mut relation) {
            return false;
        }

        // There are no crossings, and if there are any shared vertices
        // then A contains B locally at each shared vertex.
        if relation.found_shared_vertex {
            return true;
        }

        // Since there are no edge intersections or shared vertices, we
        // just need to test condition (3) above. We can skip this test if
        // we discovered that A contains at least one point of B while
        // checking for edge crossings.
        if !self.contains_point(&b.vertex(0)) {
            return false;
        }

        // We still need to check whether (A union B) is the entire
        // sphere. Normally this check is very cheap due to the bounding
        // box precondition.
        if (b.subregion_bound.contains(&self.bound) || b.bound.union(&self.bound).is_full())
            && b.contains_point(&self.vertex(0))
        {
            return false;
        }
        true
    }

    /// Reports whether the region contained by this loop intersects the
    /// region contained by the other loop.
    pub fn intersects(&self, b: &Loop) -> bool {
        // Given two loops, A and B, A.intersects(B) if and only if
        // !A.complement().contains(B).
        //
        // This code is similar to contains, but is optimized for the case
        // where both loops enclose less than half of the sphere.
        if !self.bound.intersects(&b.bound) {
            return false;
        }

        // Check whether there are any edge crossings, and also check the
        // loop relationship at any shared vertices.
        let mut relation = IntersectsRelation::new();
        if has_crossing_relation(self, b, &mut relation) {
            return true;
        }
        if relation.found_shared_vertex {
            return false;
        }

        // Since there are no edge intersections or shared vertices, the
        // loops intersect only if A contains B, B contains A, or the two
        // loops contain each other's boundaries. These checks are usually
        // cheap because of the bounding box preconditions. Note that
        // neither loop is empty (because of the bounding box check above),
        // so it is safe to access vertex(0).

        // Check whether A contains B, or A and B contain each other's
        // boundaries. (Note that A contains all the vertices of B in
        // either case.)
        if (self.subregion_bound.contains(&b.bound) || self.bound.union(&b.bound).is_full())
            && self.contains_point(&b.vertex(0))
        {
            return true;
        }
        // Check whether B contains A.
        if b.subregion_bound.contains(&self.bound) && b.contains_point(&self.vertex(0)) {
            return true;
        }
        false
    }

    /// Returns +1 if this loop contains the boundary of B, -1 if it
    /// excludes the boundary of B, and 0 if the boundaries of A and B
    /// cross. "Excludes" means that A does not intersect the boundary of
    /// B at all: if A is contained by B (including the case where the
    /// boundaries coincide), then A excludes the boundary of B.
    ///
    /// This method is used for testing containment and intersection of
    /// multi-loop polygons. Note that when A and B do not share any
    /// vertices, the boundary relation is the same whether B is a shell
    /// or a hole; B's hole status only matters when edges are shared.
    pub fn compare_boundary(&self, b: &Loop) -> i32 {
        debug_assert!(!self.is_empty() && !b.is_empty());
        debug_assert!(!b.is_full() || !b.is_hole());

        // The bounds must intersect for containment or crossing.
        if !self.bound.intersects(&b.bound) {
            return -1;
        }

        // Full loops are handled as though the loop surrounded the entire
        // sphere.
        if self.is_full() {
            return 1;
        }
        if b.is_full() {
            return -1;
        }

        // Check whether there are any edge crossings, and also check the
        // loop relationship at any shared vertices.
        let mut relation = CompareBoundaryRelation::new(b.is_hole());
        if has_crossing_relation(self, b, &mut relation) {
            return 0;
        }
        if relation.found_shared_vertex {
            return if relation.contains_edge { 1 } else { -1 };
        }

        // There are no edge intersections or shared vertices, so we can
        // check whether A contains an arbitrary vertex of B.
        if self.contains_point(&b.vertex(0)) {
            1
        } else {
            -1
        }
    }

    /// Reports whether this loop contains the other, assuming the
    /// invariants enforced between the loops of a valid polygon: the two
    /// loops must share no edges, and their boundaries must not cross
    /// (although they may share vertices). This method is cheaper than
    /// contains because it does not test for edge intersections.
    pub fn contains_nested(&self, b: &Loop) -> bool {
        if !self.subregion_bound.contains(&b.bound) {
            return false;
        }

        // Special cases to handle either loop being empty or full. Also
        // bail out when B has no vertices to avoid an out-of-bounds
        // vertex(1) access below. (This method is called during polygon
        // initialization before the client has an opportunity to call
        // is_valid.)
        if self.is_empty_or_full() || b.num_vertices() < 2 {
            return self.is_full() || b.is_empty();
        }

        // We are given that A and B do not share any edges, and that
        // either one loop contains the other or they do not intersect.
        match self.find_vertex(&b.vertex(1)) {
            None => {
                // Since b.vertex(1) is not shared, we can check whether A
                // contains it.
                self.contains_point(&b.vertex(1))
            }
            Some(m) => {
                // Check whether the edge order around b.vertex(1) is
                // compatible with A containing B.
                wedge_contains(
                    &self.vertex(m - 1),
                    &self.vertex(m),
                    &self.vertex(m + 1),
                    &b.vertex(0),
                    &b.vertex(2),
                )
            }
        }
    }

    /// Reports whether, given two loops whose boundaries do not cross
    /// (see compare_boundary), this loop contains the boundary of the
    /// other loop. If reverse_b is true, the boundary of the other loop
    /// is reversed first (which only affects the result when there are
    /// shared edges). This method is cheaper than compare_boundary
    /// because it does not test for edge intersections.
    ///
    /// Requires that neither loop is empty, and that if the other loop is
    /// full, then reverse_b == false. The no-crossing precondition cannot
    /// be verified here; callers must guarantee it.
    pub fn contains_non_crossing_boundary(&self, b: &Loop, reverse_b: bool) -> bool {
        debug_assert!(!self.is_empty() && !b.is_empty());
        debug_assert!(!b.is_full() || !reverse_b);

        // The bounds must intersect for containment.
        if !self.bound.intersects(&b.bound) {
            return false;
        }

        // Full loops are handled as though the loop surrounded the entire
        // sphere.
        if self.is_full() {
            return true;
        }
        if b.is_full() {
            return false;
        }

        match self.find_vertex(&b.vertex(0)) {
            None => {
                // Since vertex b0 is not shared, we can check whether A
                // contains it.
                self.contains_point(&b.vertex(0))
            }
            Some(m) => {
                // Otherwise check whether the edge (b0, b1) is contained
                // by A.
                wedge_contains_semiwedge(
                    &self.vertex(m - 1),
                    &self.vertex(m),
                    &self.vertex(m + 1),
                    &b.vertex(1),
                    reverse_b,
                )
            }
        }
    }

    // ---------------------------------------------------------------
    // Factory.

    /// Creates a loop shaped as a regular polygon with the given number
    /// of vertices, all located on a circle of the specified angular
    /// radius around the center. The radius is the actual distance from
    /// the center to each vertex.
    pub fn regular_loop(center: &Point, radius: Angle, num_vertices: usize) -> Self {
        Self::regular_loop_for_frame(&get_frame(center), radius, num_vertices)
    }

    /// Creates a loop centered around the z-axis of the given coordinate
    /// frame, with the first vertex in the direction of the positive
    /// x-axis.
    pub fn regular_loop_for_frame(
        frame: &cgmath::Matrix3<f64>,
        radius: Angle,
        num_vertices: usize,
    ) -> Self {
        Loop::from_points(regular_points_for_frame(frame, radius, num_vertices))
    }

    // ---------------------------------------------------------------
    // Serialization.

    /// Appends the loop in the lossless format: a version byte, the
    /// vertex count, the raw vertices, the origin containment bit, the
    /// nesting depth, and the encoded bound, all little-endian.
    pub fn encode(&self) -> Vec<u8> {
        let mut e = Encoder::new();
        e.put_u8(LOSSLESS_ENCODING_VERSION);
        e.put_u32(self.vertices.len() as u32);
        for v in self.vertices.iter() {
            e.put_f64(v.0.x);
            e.put_f64(v.0.y);
            e.put_f64(v.0.z);
        }
        e.put_u8(u8::from(self.origin_inside));
        e.put_u32(self.depth as u32);
        self.bound.encode(&mut e);
        e.into_bytes()
    }

    /// Decodes a loop encoded by encode, using default limits.
    pub fn decode(data: &[u8]) -> Result<Self, DecodeError> {
        Self::decode_with_options(data, &DecodeOptions::default())
    }

    /// Decodes a loop encoded by encode. All size checks complete before
    /// any vertex data is copied, so no partial state is ever produced.
    pub fn decode_with_options(data: &[u8], options: &DecodeOptions) -> Result<Self, DecodeError> {
        let mut d = Decoder::new(data);
        let version = d.get_u8()?;
        if version != LOSSLESS_ENCODING_VERSION {
            return Err(DecodeError::BadVersion(version));
        }
        let num_vertices = d.get_u32()? as usize;
        if num_vertices > options.max_num_vertices {
            return Err(DecodeError::TooManyVertices(
                num_vertices as u64,
                options.max_num_vertices as u64,
            ));
        }
        // 24 bytes per vertex plus the origin byte and the depth word.
        if d.avail() < num_vertices * 24 + 1 + 4 {
            return Err(DecodeError::Truncated);
        }

        let mut vertices = Vec::with_capacity(num_vertices);
        for _ in 0..num_vertices {
            let x = d.get_f64()?;
            let y = d.get_f64()?;
            let z = d.get_f64()?;
            vertices.push(Point(R3Vector::new(x, y, z)));
        }
        let origin_inside = d.get_u8()? != 0;
        let depth = d.get_u32()? as i32;
        let bound = Rect::decode(&mut d)?;
        let subregion_bound = expand_for_subregions(&bound);

        let mut l = Loop {
            vertices: Arc::new(vertices),
            origin_inside,
            depth,
            bound,
            subregion_bound,
            index: ShapeIndex::new(),
            unindexed_contains_calls: AtomicI32::new(0),
            debug_override: DebugOverride::AllowDebug,
            lazy_indexing: true,
        };
        // An uninitialized loop has zero vertices; such loops encode and
        // decode properly but are not added to an index.
        if l.num_vertices() > 0 {
            l.init_index();
        }
        Ok(l)
    }

    /// Appends the loop in the compressed format: the vertex count and
    /// the vertices compressed at the given snap level, followed by a
    /// property bitset, the depth, and (for loops large enough that
    /// re-deriving it would be expensive) the bound.
    pub fn encode_compressed(&self, snap_level: u64) -> Vec<u8> {
        let mut e = Encoder::new();
        e.put_uvarint(self.vertices.len() as u64);
        crate::s2::point_compression::encode_points_compressed(&self.vertices, snap_level, &mut e);

        let mut properties: u64 = 0;
        if self.origin_inside {
            properties |= COMPRESSED_ORIGIN_INSIDE;
        }
        // Write whether there is a bound so that the threshold can change
        // later without breaking the format: recomputing the bound on
        // decode multiplies the per-vertex decode time several-fold.
        let bound_encoded = self.vertices.len() >= MIN_VERTICES_FOR_BOUND;
        if bound_encoded {
            properties |= COMPRESSED_BOUND_ENCODED;
        }
        e.put_uvarint(properties);
        e.put_uvarint(self.depth as u64);
        if bound_encoded {
            self.bound.encode(&mut e);
        }
        e.into_bytes()
    }

    /// Decodes a loop encoded by encode_compressed, using default limits.
    pub fn decode_compressed(data: &[u8]) -> Result<Self, DecodeError> {
        Self::decode_compressed_with_options(data, &DecodeOptions::default())
    }

    /// Decodes a loop encoded by encode_compressed.
    pub fn decode_compressed_with_options(
        data: &[u8],
        options: &DecodeOptions,
    ) -> Result<Self, DecodeError> {
        let mut d = Decoder::new(data);
        let num_vertices = d.get_uvarint()? as usize;
        if num_vertices == 0 {
            return Err(DecodeError::Malformed("compressed loop has no vertices"));
        }
        if num_vertices > options.max_num_vertices {
            return Err(DecodeError::TooManyVertices(
                num_vertices as u64,
                options.max_num_vertices as u64,
            ));
        }
        let vertices =
            crate::s2::point_compression::decode_points_compressed(&mut d, num_vertices)?;
        let properties = d.get_uvarint()?;
        let depth = d.get_uvarint()? as i32;

        let mut l = Loop {
            vertices: Arc::new(vertices),
            origin_inside: properties & COMPRESSED_ORIGIN_INSIDE != 0,
            depth,
            bound: Rect::empty(),
            subregion_bound: Rect::empty(),
            index: ShapeIndex::new(),
            unindexed_contains_calls: AtomicI32::new(0),
            debug_override: DebugOverride::AllowDebug,
            lazy_indexing: true,
        };
        if properties & COMPRESSED_BOUND_ENCODED != 0 {
            l.bound = Rect::decode(&mut d)?;
            l.subregion_bound = expand_for_subregions(&l.bound);
        } else {
            // Deriving the bound is cheap enough below the encoding
            // threshold.
            l.init_bound();
        }
        l.init_index();
        Ok(l)
    }
}

impl Clone for Loop {
    fn clone(&self) -> Self {
        let mut l = Loop {
            vertices: Arc::new(self.vertices.as_ref().clone()),
            origin_inside: self.origin_inside,
            depth: self.depth,
            bound: self.bound,
            subregion_bound: self.subregion_bound,
            index: ShapeIndex::new(),
            unindexed_contains_calls: AtomicI32::new(0),
            debug_override: self.debug_override,
            lazy_indexing: self.lazy_indexing,
        };
        l.init_index();
        l
    }
}

impl fmt::Debug for Loop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Loop")
            .field("num_vertices", &self.vertices.len())
            .field("origin_inside", &self.origin_inside)
            .field("depth", &self.depth)
            .field("bound", &self.bound)
            .finish()
    }
}

impl Region for Loop {
    fn cap_bound(&self) -> Cap {
        self.bound.cap_bound()
    }

    fn rect_bound(&self) -> Rect {
        self.bound
    }

    fn contains_cell(&self, cell: &Cell) -> bool {
        Loop::contains_cell(self, cell)
    }

    fn may_intersect_cell(&self, cell: &Cell) -> bool {
        Loop::may_intersect_cell(self, cell)
    }

    fn contains_point(&self, p: &Point) -> bool {
        Loop::contains_point(self, p)
    }
}

/// The shape adaptor that the index stores: a non-owning view of the
/// loop's vertex ring. The loop owns the index; the adaptor holds a
/// shared handle to the vertices, so moving the loop never invalidates
/// it, and mutations rebind a fresh adaptor.
#[derive(Debug, Clone)]
struct LoopShape {
    vertices: Arc<Vec<Point>>,
    origin_inside: bool,
}

impl Shape for LoopShape {
    fn num_edges(&self) -> usize {
        if self.vertices.len() < 3 {
            0
        } else {
            self.vertices.len()
        }
    }

    fn edge(&self, i: usize) -> Edge {
        Edge {
            v0: self.vertices[i],
            v1: self.vertices[(i + 1) % self.vertices.len()],
        }
    }

    fn reference_point(&self) -> ReferencePoint {
        ReferencePoint::origin(self.origin_inside)
    }

    fn num_chains(&self) -> usize {
        usize::from(self.num_edges() > 0)
    }

    fn chain(&self, _chain_id: usize) -> Chain {
        Chain {
            start: 0,
            length: self.num_edges(),
        }
    }

    fn chain_edge(&self, _chain_id: usize, offset: usize) -> Edge {
        self.edge(offset)
    }

    fn chain_position(&self, edge_id: usize) -> ChainPosition {
        ChainPosition {
            chain_id: 0,
            offset: edge_id,
        }
    }

    fn dimension(&self) -> i64 {
        2
    }
}

// ---------------------------------------------------------------
// The generic loop relation framework.

/// A helper for boundary_near: reports whether the boundaries can be
/// matched starting at the given offset into A's vertices.
fn match_boundaries(a: &Loop, b: &Loop, a_offset: usize, max_error: f64) -> bool {
    // The state consists of a pair (i,j). A state transition consists of
    // incrementing either i or j. i can be incremented only if
    // a(i+1+a_offset) is near the edge from b(j) to b(j+1), and a similar
    // rule applies to j. The function returns true if and only if we can
    // proceed all the way around both loops in this way.
    //
    // Note that when i and j can both be incremented, sometimes only one
    // choice leads to a solution. We handle this using a stack and
    // backtracking, keeping track of which states have already been
    // explored to avoid duplicating work.
    let na = a.num_vertices();
    let nb = b.num_vertices();
    let mut pending = vec![(0usize, 0usize)];
    let mut done = std::collections::HashSet::new();
    while let Some((i, j)) = pending.pop() {
        if i == na && j == nb {
            return true;
        }
        done.insert((i, j));

        // If (i == na && a_offset == na-1) then (i+1+a_offset) overflows
        // the [0, 2*na-1] range allowed by vertex(), so reduce it.
        let mut io = i + a_offset;
        if io >= na {
            io -= na;
        }

        if i < na
            && !done.contains(&(i + 1, j))
            && edge_distance::distance_from_segment(
                &a.vertex(io + 1),
                &b.vertex(j),
                &b.vertex(j + 1),
            )
            .rad()
                <= max_error
        {
            pending.push((i + 1, j));
        }
        if j < nb
            && !done.contains(&(i, j + 1))
            && edge_distance::distance_from_segment(
                &b.vertex(j + 1),
                &a.vertex(io),
                &a.vertex(io + 1),
            )
            .rad()
                <= max_error
        {
            pending.push((i, j + 1));
        }
    }
    false
}

/// The possible early-exit targets of a loop relation: the relation is
/// equivalent to an edge crossing if a point is found whose containment
/// status in each loop matches the respective target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CrossingTarget {
    DontCare,
    DontCross,
    Cross,
}

/// LoopRelation defines the interface for checking a type of relationship
/// between two loops: Contains, Intersects, or CompareBoundary.
trait LoopRelation {
    /// Optionally, the crossing targets can specify an early-exit
    /// condition for the loop relation. If any point P is found such that
    ///
    ///   A.contains_point(P) == a_crossing_target() &&
    ///   B.contains_point(P) == b_crossing_target()
    ///
    /// then the loop relation is assumed to be the same as if a pair of
    /// crossing edges were found. For example, the Contains relation has
    ///
    ///   a_crossing_target() == DontCross
    ///   b_crossing_target() == Cross
    ///
    /// because if A does not contain some point that B contains, it is
    /// equivalent to finding an edge crossing (Contains returns false in
    /// both cases). Relations without such a condition return DontCare
    /// for both targets.
    fn a_crossing_target(&self) -> CrossingTarget;
    fn b_crossing_target(&self) -> CrossingTarget;

    /// Given a vertex ab1 that is shared between the two loops, reports
    /// whether the two associated wedges (a0, ab1, a2) and (b0, ab1, b2)
    /// are equivalent to an edge crossing. The relation is also allowed
    /// to maintain its own internal state, and can return true if it
    /// observes any sequence of wedges that are equivalent to an edge
    /// crossing.
    fn wedges_cross(&mut self, a0: &Point, ab1: &Point, a2: &Point, b0: &Point, b2: &Point)
        -> bool;
}

/// ContainsRelation implements LoopRelation for a contains operation: if
/// A.contains_point(P) == false && B.contains_point(P) == true, it is
/// equivalent to having an edge crossing (Contains returns false).
struct ContainsRelation {
    found_shared_vertex: bool,
}

impl ContainsRelation {
    fn new() -> Self {
        ContainsRelation {
            found_shared_vertex: false,
        }
    }
}

impl LoopRelation for ContainsRelation {
    fn a_crossing_target(&self) -> CrossingTarget {
        CrossingTarget::DontCross
    }

    fn b_crossing_target(&self) -> CrossingTarget {
        CrossingTarget::Cross
    }

    fn wedges_cross(
        &mut self,
        a0: &Point,
        ab1: &Point,
        a2: &Point,
        b0: &Point,
        b2: &Point,
    ) -> bool {
        self.found_shared_vertex = true;
        !wedge_contains(a0, ab1, a2, b0, b2)
    }
}

/// IntersectsRelation implements LoopRelation for an intersects
/// operation: if A.contains_point(P) && B.contains_point(P) for some P,
/// it is equivalent to having an edge crossing (Intersects returns true).
struct IntersectsRelation {
    found_shared_vertex: bool,
}

impl IntersectsRelation {
    fn new() -> Self {
        IntersectsRelation {
            found_shared_vertex: false,
        }
    }
}

impl LoopRelation for IntersectsRelation {
    fn a_crossing_target(&self) -> CrossingTarget {
        CrossingTarget::Cross
    }

    fn b_crossing_target(&self) -> CrossingTarget {
        CrossingTarget::Cross
    }

    fn wedges_cross(
        &mut self,
        a0: &Point,
        ab1: &Point,
        a2: &Point,
        b0: &Point,
        b2: &Point,
    ) -> bool {
        self.found_shared_vertex = true;
        wedge_intersects(a0, ab1, a2, b0, b2)
    }
}

/// CompareBoundaryRelation implements LoopRelation for comparing the
/// boundary of loop A against the boundary of loop B.
///
/// The compare boundary relation does not have a useful early-exit
/// condition, so both crossing targets are DontCare.
///
/// Aside: a possible early exit condition could be based on the
/// following. If A contains a point of both B and ~B, then A intersects
/// Boundary(B). If ~A contains a point of both B and ~B, then ~A
/// intersects Boundary(B). So if the intersections of {A, ~A} with
/// {B, ~B} are all non-empty, the return value is 0. Unfortunately it
/// isn't worth detecting this situation, because by the time we have
/// seen a point in all four intersection regions, we are also guaranteed
/// to have seen at least one pair of crossing edges.
struct CompareBoundaryRelation {
    /// True if loop B should be reversed.
    reverse_b: bool,
    /// True if any wedge was processed.
    found_shared_vertex: bool,
    /// True if any edge of B is contained by A.
    contains_edge: bool,
    /// True if any edge of B is excluded by A.
    excludes_edge: bool,
}

impl CompareBoundaryRelation {
    fn new(reverse_b: bool) -> Self {
        CompareBoundaryRelation {
            reverse_b,
            found_shared_vertex: false,
            contains_edge: false,
            excludes_edge: false,
        }
    }
}

impl LoopRelation for CompareBoundaryRelation {
    fn a_crossing_target(&self) -> CrossingTarget {
        CrossingTarget::DontCare
    }

    fn b_crossing_target(&self) -> CrossingTarget {
        CrossingTarget::DontCare
    }

    fn wedges_cross(
        &mut self,
        a0: &Point,
        ab1: &Point,
        a2: &Point,
        _b0: &Point,
        b2: &Point,
    ) -> bool {
        // Because we don't care about the interior of B, only its
        // boundary, it is sufficient to check whether A contains the
        // semiwedge (ab1, b2).
        self.found_shared_vertex = true;
        if wedge_contains_semiwedge(a0, ab1, a2, b2, self.reverse_b) {
            self.contains_edge = true;
        } else {
            self.excludes_edge = true;
        }
        self.contains_edge && self.excludes_edge
    }
}

fn contains_center_matches(contains_center: bool, target: CrossingTarget) -> bool {
    (!contains_center && target == CrossingTarget::DontCross)
        || (contains_center && target == CrossingTarget::Cross)
}

/// RangeIterator is a wrapper over the index iterator with extra methods
/// that are useful for merging the contents of two indexes: every cell
/// exposes the inclusive range of leaf cell ids it covers.
struct RangeIterator<'a> {
    it: ShapeIndexIterator<'a>,
    id: CellID,
    range_min: CellID,
    range_max: CellID,
}

impl<'a> RangeIterator<'a> {
    /// Constructs a new iterator positioned at the first cell of the
    /// index.
    fn new(index: &'a ShapeIndex) -> Self {
        let it = index.iterator();
        let mut r = RangeIterator {
            it,
            id: CellID::sentinel(),
            range_min: CellID::sentinel(),
            range_max: CellID::sentinel(),
        };
        r.refresh();
        r
    }

    fn id(&self) -> CellID {
        self.id
    }

    fn range_min(&self) -> CellID {
        self.range_min
    }

    fn range_max(&self) -> CellID {
        self.range_max
    }

    fn num_edges(&self) -> usize {
        self.clipped().map_or(0, |c| c.num_edges())
    }

    fn contains_center(&self) -> bool {
        self.clipped().map_or(false, |c| c.contains_center)
    }

    fn clipped(&self) -> Option<&ClippedShape> {
        self.it.index_cell().and_then(|c| c.find_by_shape_id(0))
    }

    fn clipped_clone(&self) -> Option<ClippedShape> {
        self.clipped().cloned()
    }

    fn cell_clone(&self) -> Option<ShapeIndexCell> {
        self.it.index_cell().cloned()
    }

    fn next(&mut self) {
        self.it.next();
        self.refresh();
    }

    fn done(&self) -> bool {
        self.id == CellID::sentinel()
    }

    fn refresh(&mut self) {
        if self.it.done() {
            self.id = CellID::sentinel();
        } else {
            self.id = self.it.cell_id();
        }
        self.range_min = self.id.range_min();
        self.range_max = self.id.range_max();
    }

    /// Positions the iterator at the first cell that overlaps or follows
    /// the target, i.e. such that range_max >= target.range_min.
    fn seek_to(&mut self, target: &RangeIterator) {
        self.it.seek(target.range_min());
        // If the current cell does not overlap the target, it is possible
        // that the previous cell is the one we are looking for. This can
        // only happen when the previous cell contains the target but has
        // a smaller cell id.
        if self.it.done() || self.it.cell_id().range_min() > target.range_max() {
            if self.it.prev() && self.it.cell_id().range_max() < target.id() {
                self.it.next();
            }
        }
        self.refresh();
    }

    /// Positions the iterator at the first cell that follows the target,
    /// i.e. the first cell such that range_min > target.range_max.
    fn seek_beyond(&mut self, target: &RangeIterator) {
        self.it.seek(target.range_max().next());
        if !self.it.done() && self.it.cell_id().range_min() <= target.range_max() {
            self.it.next();
        }
        self.refresh();
    }
}

/// LoopCrosser is a helper for determining whether two loops cross. It is
/// instantiated twice for each pair of loops to be tested, once for the
/// pair (A,B) and once for the pair (B,A), in order to be able to process
/// edges in either loop nesting order.
struct LoopCrosser<'a> {
    a: &'a Loop,
    b: &'a Loop,
    /// Whether the loops A and B have been swapped, which affects how
    /// arguments are passed to the loop relation, since for example
    /// A.contains(B) is not the same as B.contains(A).
    swapped: bool,
    a_crossing_target: CrossingTarget,
    b_crossing_target: CrossingTarget,

    // State maintained by start_edge and edge_crosses_cell.
    crosser: Option<EdgeCrosser>,
    aj: usize,
    bj_prev: i64,

    b_query: CrossingEdgeQuery<'a>,
}

impl<'a> LoopCrosser<'a> {
    fn new(
        a: &'a Loop,
        b: &'a Loop,
        relation: &dyn LoopRelation,
        swapped: bool,
    ) -> LoopCrosser<'a> {
        let mut a_crossing_target = relation.a_crossing_target();
        let mut b_crossing_target = relation.b_crossing_target();
        if swapped {
            std::mem::swap(&mut a_crossing_target, &mut b_crossing_target);
        }
        LoopCrosser {
            a,
            b,
            swapped,
            a_crossing_target,
            b_crossing_target,
            crosser: None,
            aj: 0,
            bj_prev: -2,
            b_query: CrossingEdgeQuery::new(&b.index),
        }
    }

    /// Prepares to check the given edge of loop A for crossings.
    fn start_edge(&mut self, aj: usize) {
        self.crosser = Some(EdgeCrosser::new(&self.a.vertex(aj), &self.a.vertex(aj + 1)));
        self.aj = aj;
        self.bj_prev = -2;
    }

    /// Checks the current edge of loop A for crossings with all edges of
    /// the given index cell of loop B.
    fn edge_crosses_cell(
        &mut self,
        b_clipped: &ClippedShape,
        relation: &mut dyn LoopRelation,
    ) -> bool {
        if self.crosser.is_none() {
            return false;
        }
        for j in 0..b_clipped.num_edges() {
            let bj = b_clipped.edge(j) as usize;
            if bj as i64 != self.bj_prev + 1 {
                let v = self.b.vertex(bj);
                if let Some(crosser) = self.crosser.as_mut() {
                    crosser.restart_at(&v);
                }
            }
            self.bj_prev = bj as i64;
            let d = self.b.vertex(bj + 1);
            let crossing = match self.crosser.as_mut() {
                Some(crosser) => crosser.chain_crossing_sign(&d),
                None => return false,
            };
            match crossing {
                Crossing::DoNotCross => continue,
                Crossing::Cross => return true,
                Crossing::Maybe => {
                    // The edges share a vertex. We only need to check each
                    // shared vertex once, so we only consider the case
                    // where a.vertex(aj+1) == b.vertex(bj+1).
                    if self.a.vertex(self.aj + 1) == self.b.vertex(bj + 1) {
                        let crossed = if self.swapped {
                            relation.wedges_cross(
                                &self.b.vertex(bj),
                                &self.b.vertex(bj + 1),
                                &self.b.vertex(bj + 2),
                                &self.a.vertex(self.aj),
                                &self.a.vertex(self.aj + 2),
                            )
                        } else {
                            relation.wedges_cross(
                                &self.a.vertex(self.aj),
                                &self.a.vertex(self.aj + 1),
                                &self.a.vertex(self.aj + 2),
                                &self.b.vertex(bj),
                                &self.b.vertex(bj + 2),
                            )
                        };
                        if crossed {
                            return true;
                        }
                    }
                }
            }
        }
        false
    }

    /// Reports whether there are any edge crossings or wedge crossings
    /// within the two given cells.
    fn cell_crosses_cell(
        &mut self,
        a_clipped: &ClippedShape,
        b_clipped: &ClippedShape,
        relation: &mut dyn LoopRelation,
    ) -> bool {
        // Test all edges of a_clipped against all edges of b_clipped.
        for i in 0..a_clipped.num_edges() {
            self.start_edge(a_clipped.edge(i) as usize);
            if self.edge_crosses_cell(b_clipped, relation) {
                return true;
            }
        }
        false
    }

    /// Given an index cell of A, reports whether there are any edge or
    /// wedge crossings with any index cell of B contained within b_id.
    fn cell_crosses_any_subcell(
        &mut self,
        a_clipped: &ClippedShape,
        b_id: CellID,
        relation: &mut dyn LoopRelation,
    ) -> bool {
        // Test all edges of a_clipped against all edges of B. The
        // relevant B edges are guaranteed to be children of b_id, which
        // lets us find the correct index cells more efficiently.
        for i in 0..a_clipped.num_edges() {
            let aj = a_clipped.edge(i) as usize;
            // Use the edge query starting at b_id to find the index cells
            // of B that might contain crossing edges.
            let b_cells = self
                .b_query
                .get_cells(&self.a.vertex(aj), &self.a.vertex(aj + 1), b_id);
            if b_cells.is_empty() {
                continue;
            }
            self.start_edge(aj);
            for cell in &b_cells {
                if let Some(b_clipped) = cell.find_by_shape_id(0) {
                    if self.edge_crosses_cell(b_clipped, relation) {
                        return true;
                    }
                }
            }
        }
        false
    }

    /// Given two iterators positioned such that ai.id().contains(bi.id()),
    /// reports whether there is an edge crossing or wedge crossing
    /// anywhere within ai's cell. This function advances bi (only) past
    /// ai's cell.
    fn has_crossing(
        &mut self,
        ai: &RangeIterator,
        bi: &mut RangeIterator,
        relation: &mut dyn LoopRelation,
    ) -> bool {
        debug_assert!(ai.id().contains(&bi.id()));
        // If ai's cell intersects many edges of B, then it is faster to
        // use the edge query to narrow down the candidates. But if it
        // intersects only a few edges, it is faster to check all the
        // crossings directly. We handle this by advancing bi and keeping
        // track of how many edges we would need to test.
        const EDGE_QUERY_MIN_EDGES: usize = 20; // Tuned using benchmarks.
        let mut total_edges = 0;
        let mut b_cells: Vec<ShapeIndexCell> = Vec::new();

        loop {
            if bi.num_edges() > 0 {
                total_edges += bi.num_edges();
                if total_edges >= EDGE_QUERY_MIN_EDGES {
                    // There are too many edges to test them directly, so
                    // use the edge query.
                    let a_clipped = match ai.clipped_clone() {
                        Some(c) => c,
                        None => return false,
                    };
                    if self.cell_crosses_any_subcell(&a_clipped, ai.id(), relation) {
                        return true;
                    }
                    bi.seek_beyond(ai);
                    return false;
                }
                if let Some(cell) = bi.cell_clone() {
                    b_cells.push(cell);
                }
            }
            bi.next();
            if bi.id() > ai.range_max() {
                break;
            }
        }

        // Test all the edge crossings directly.
        let a_clipped = match ai.clipped_clone() {
            Some(c) => c,
            None => return false,
        };
        for cell in &b_cells {
            if let Some(b_clipped) = cell.find_by_shape_id(0) {
                if self.cell_crosses_cell(&a_clipped, b_clipped, relation) {
                    return true;
                }
            }
        }
        false
    }

    /// Given two iterators positioned such that ai.id().contains(bi.id()),
    /// reports whether there is a crossing relationship anywhere within
    /// ai's cell: an edge crossing, a wedge crossing, or a point P that
    /// matches both crossing targets. This function advances both
    /// iterators past ai's cell.
    fn has_crossing_relation(
        &mut self,
        ai: &mut RangeIterator,
        bi: &mut RangeIterator,
        relation: &mut dyn LoopRelation,
    ) -> bool {
        debug_assert!(ai.id().contains(&bi.id()));
        if ai.num_edges() == 0 {
            if contains_center_matches(ai.contains_center(), self.a_crossing_target) {
                // All points within ai's cell satisfy the crossing target
                // for A, so it's worth iterating through the cells of B to
                // see whether any cell centers also satisfy the crossing
                // target for B.
                while bi.id() <= ai.range_max() {
                    if contains_center_matches(bi.contains_center(), self.b_crossing_target) {
                        return true;
                    }
                    bi.next();
                }
            } else {
                // The crossing target for A is not satisfied, so we skip
                // over these cells of B.
                bi.seek_beyond(ai);
            }
        } else {
            // The current cell of A has at least one edge, so check for
            // crossings.
            if self.has_crossing(ai, bi, relation) {
                return true;
            }
        }
        ai.next();
        false
    }
}

/// Checks all edges of loop A for intersection against all edges of loop
/// B and reports whether there are any that satisfy the given relation.
/// If there is any shared vertex, the wedges centered at this vertex are
/// sent to the relation to be tested.
///
/// If the two loop boundaries cross, this function is guaranteed to
/// return true. It also returns true in certain cases if the loop
/// relationship is equivalent to crossing. For example, if the relation
/// is Contains and a point P is found such that B contains P but A does
/// not contain P, this function returns true to indicate that the result
/// is the same as though a pair of crossing edges were found (since
/// Contains returns false in both cases).
fn has_crossing_relation(a: &Loop, b: &Loop, relation: &mut dyn LoopRelation) -> bool {
    // We look for CellID ranges where the indexes of A and B overlap, and
    // then test those edges for crossings.
    a.index.force_apply_updates();
    b.index.force_apply_updates();

    let mut ai = RangeIterator::new(&a.index);
    let mut bi = RangeIterator::new(&b.index);
    let mut ab = LoopCrosser::new(a, b, relation, false); // Tests edges of A against B.
    let mut ba = LoopCrosser::new(b, a, relation, true); // Tests edges of B against A.

    while !ai.done() || !bi.done() {
        if ai.range_max() < bi.range_min() {
            // The A and B cells don't overlap, and A precedes B.
            ai.seek_to(&bi);
        } else if bi.range_max() < ai.range_min() {
            // The A and B cells don't overlap, and B precedes A.
            bi.seek_to(&ai);
        } else {
            // One cell contains the other. Determine which cell is larger.
            let ab_relation = ai.id().lsb() as i64 - bi.id().lsb() as i64;
            match ab_relation.cmp(&0) {
                CmpOrdering::Greater => {
                    // A's index cell is larger.
                    if ab.has_crossing_relation(&mut ai, &mut bi, relation) {
                        return true;
                    }
                }
                CmpOrdering::Less => {
                    // B's index cell is larger.
                    if ba.has_crossing_relation(&mut bi, &mut ai, relation) {
                        return true;
                    }
                }
                CmpOrdering::Equal => {
                    // The A and B cells are the same. Since the two cells
                    // have the same center point P, check whether P
                    // satisfies the crossing targets.
                    if contains_center_matches(ai.contains_center(), ab.a_crossing_target)
                        && contains_center_matches(bi.contains_center(), ab.b_crossing_target)
                    {
                        return true;
                    }
                    // Otherwise test all the edge crossings directly.
                    if ai.num_edges() > 0 && bi.num_edges() > 0 {
                        let a_clipped = ai.clipped_clone();
                        let b_clipped = bi.clipped_clone();
                        if let (Some(ac), Some(bc)) = (a_clipped, b_clipped) {
                            if ab.cell_crosses_cell(&ac, &bc, relation) {
                                return true;
                            }
                        }
                    }
                    ai.next();
                    bi.next();
                }
            }
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::f64_eq;
    use crate::s1::angle::Deg;
    use crate::s2::latlng::LatLng;

    fn lat_lng_loop(points: &[(f64, f64)]) -> Loop {
        let vertices: Vec<Point> = points
            .iter()
            .map(|&(lat, lng)| LatLng::from_degrees(lat, lng).to_point())
            .collect();
        Loop::from_points(vertices)
    }

    /// An angular radius corresponding to a distance in kilometers on the
    /// Earth's surface.
    fn km(d: f64) -> Angle {
        const EARTH_RADIUS_KM: f64 = 6371.01;
        Angle(d / EARTH_RADIUS_KM)
    }

    // The northern hemisphere, defined using four points on the equator.
    fn north_hemi() -> Loop {
        lat_lng_loop(&[(0.0, 0.0), (0.0, 90.0), (0.0, 180.0), (0.0, -90.0)])
    }

    fn south_hemi() -> Loop {
        lat_lng_loop(&[(0.0, -90.0), (0.0, 180.0), (0.0, 90.0), (0.0, 0.0)])
    }

    // A spiral stripe that slightly over-wraps the equator.
    fn candy_cane() -> Loop {
        lat_lng_loop(&[
            (-20.0, 150.0),
            (-20.0, -70.0),
            (0.0, 70.0),
            (10.0, -150.0),
            (10.0, 70.0),
            (-10.0, -70.0),
        ])
    }

    // A small clockwise loop in the northern & eastern hemispheres.
    fn small_ne_cw() -> Loop {
        lat_lng_loop(&[(35.0, 20.0), (45.0, 20.0), (40.0, 25.0)])
    }

    // Loop around the north pole at 80 degrees.
    fn arctic_80() -> Loop {
        lat_lng_loop(&[(80.0, -150.0), (80.0, -30.0), (80.0, 90.0)])
    }

    // The square [0,10] x [0,10] in (lat,lng) degrees.
    fn loop_a() -> Loop {
        lat_lng_loop(&[(0.0, 0.0), (0.0, 10.0), (10.0, 10.0), (10.0, 0.0)])
    }

    // A square overlapping the east half of loop A.
    fn loop_b() -> Loop {
        lat_lng_loop(&[(-5.0, 5.0), (-5.0, 15.0), (5.0, 15.0), (5.0, 5.0)])
    }

    // A big square that contains loop A.
    fn loop_c() -> Loop {
        lat_lng_loop(&[(-5.0, -5.0), (-5.0, 15.0), (15.0, 15.0), (15.0, -5.0)])
    }

    // A small square contained by loop A.
    fn loop_d() -> Loop {
        lat_lng_loop(&[(2.0, 2.0), (2.0, 4.0), (4.0, 4.0), (4.0, 2.0)])
    }

    // A square sharing the lng=10 edge of loop A, with reversed direction.
    fn loop_e() -> Loop {
        lat_lng_loop(&[(0.0, 10.0), (0.0, 20.0), (10.0, 20.0), (10.0, 10.0)])
    }

    #[test]
    fn test_empty_and_full() {
        let empty = Loop::empty();
        let full = Loop::full();

        assert!(empty.is_empty_or_full());
        assert!(empty.is_empty() && !empty.is_full());
        assert!(full.is_empty_or_full());
        assert!(full.is_full() && !full.is_empty());
        assert_eq!(empty.num_edges(), 0);
        assert_eq!(full.num_edges(), 0);

        assert_eq!(empty.area(), 0.0);
        assert_eq!(full.area(), 4.0 * PI);
        assert_eq!(empty.turning_angle(), 2.0 * PI);
        assert_eq!(full.turning_angle(), -2.0 * PI);

        for p in [
            Point::from_coords(0.0, 0.0, 1.0),
            Point::from_coords(1.0, 0.0, 0.0),
            Point::from_coords(-0.3, 0.4, -0.5),
        ] {
            assert!(!empty.contains_point(&p));
            assert!(full.contains_point(&p));
        }

        assert!(empty.rect_bound().is_empty());
        assert!(full.rect_bound().is_full());
        assert!(empty.is_valid());
        assert!(full.is_valid());
    }

    #[test]
    fn test_basic_triangle() {
        // A one-degree right triangle near the (0,0) lat/lng point.
        let l = lat_lng_loop(&[(0.0, 0.0), (0.0, 1.0), (1.0, 0.0)]);
        assert!(l.is_valid());
        assert!(l.is_normalized());

        let area = l.area();
        assert!((area / 1.523e-4 - 1.0).abs() < 1e-3, "area was {area}");

        assert!(l.contains_point(&LatLng::from_degrees(0.333, 0.333).to_point()));
        assert!(!l.contains_point(&Point::from_coords(0.0, 0.0, 1.0)));

        // The centroid (normalized) lies inside the triangle.
        let centroid = Point(l.centroid().0.normalize());
        assert!(l.contains_point(&centroid));

        // A small CCW triangle turns by nearly a full circle.
        assert!((l.turning_angle() - 2.0 * PI).abs() < 1e-3);
    }

    #[test]
    fn test_hemisphere_basics() {
        let north = north_hemi();
        let south = south_hemi();
        let north_pole = Point::from_coords(0.0, 0.0, 1.0);
        let south_pole = Point::from_coords(0.0, 0.0, -1.0);

        assert!(north.contains_point(&north_pole));
        assert!(!north.contains_point(&south_pole));
        assert!(south.contains_point(&south_pole));
        assert!(!south.contains_point(&north_pole));

        assert!((north.area() - 2.0 * PI).abs() < 1e-12);
        // A hemisphere's turning angle is exactly zero modulo summation
        // error.
        assert!(north.turning_angle().abs() <= north.turning_angle_max_error());

        let bound = north.rect_bound();
        assert!(bound.lng.is_full());
        assert!(f64_eq(bound.lat.hi, PI / 2.0));
        assert!(bound.lat.lo <= 0.0 && bound.lat.lo > -1e-14);
    }

    #[test]
    fn test_loop_bounds() {
        // The candy cane wraps all the way around the equator.
        let cane = candy_cane();
        let bound = cane.rect_bound();
        assert!(bound.lng.is_full());
        assert!(bound.lat.lo < Angle::from(Deg(-20.0)).rad() + 1e-9);
        assert!(bound.lat.hi > Angle::from(Deg(10.0)).rad() - 1e-9);

        // A loop around the north pole contains it, so the bound must
        // extend to the pole with full longitude.
        let arctic = arctic_80();
        let bound = arctic.rect_bound();
        assert!(bound.lng.is_full());
        assert!(f64_eq(bound.lat.hi, PI / 2.0));
        assert!((bound.lat.lo - Angle::from(Deg(80.0)).rad()).abs() < 1e-9);

        // The bound contains every vertex and every edge midpoint.
        for l in [&cane, &arctic, &north_hemi(), &loop_a()] {
            let bound = l.rect_bound();
            for i in 0..l.num_vertices() {
                assert!(bound.contains_point(&l.vertex(i)));
                let mid = Point((l.vertex(i).0 + l.vertex(i + 1).0).normalize());
                assert!(bound.contains_point(&mid));
            }
        }
    }

    #[test]
    fn test_subregion_bound_contains_bound() {
        for l in [north_hemi(), candy_cane(), arctic_80(), loop_a(), loop_d()] {
            assert!(l.subregion_bound().contains(&l.rect_bound()));
        }
    }

    #[test]
    fn test_contains_point_matches_brute_force() {
        // The indexed containment test agrees with the brute force
        // crossing count everywhere.
        let l = Loop::regular_loop(
            &LatLng::from_degrees(35.0, -120.0).to_point(),
            km(500.0),
            48,
        );
        l.index().force_apply_updates();
        for lat in (-80..=80).step_by(17) {
            for lng in (-180..180).step_by(23) {
                let p = LatLng::from_degrees(lat as f64 + 0.37, lng as f64 + 0.61).to_point();
                assert_eq!(
                    l.contains_point(&p),
                    l.brute_force_contains_point(&p),
                    "mismatch at {lat},{lng}"
                );
            }
        }
    }

    #[test]
    fn test_area_consistency() {
        // A loop and its complement cover the sphere.
        for l in [
            lat_lng_loop(&[(0.0, 0.0), (0.0, 1.0), (1.0, 0.0)]),
            candy_cane(),
            north_hemi(),
            arctic_80(),
        ] {
            let mut inv = l.clone();
            inv.invert();
            let total = l.area() + inv.area();
            assert!(
                (total - 4.0 * PI).abs() < 1e-10,
                "areas sum to {total} instead of 4*pi"
            );
        }
    }

    #[test]
    fn test_clockwise_loop_area() {
        // A small clockwise loop covers nearly the whole sphere.
        let cw = small_ne_cw();
        assert!(!cw.is_normalized());
        assert!(cw.area() > 4.0 * PI - 0.05);
        let mut ccw = cw.clone();
        ccw.invert();
        assert!(ccw.is_normalized());
        assert!(ccw.area() < 0.05);
    }

    #[test]
    fn test_turning_angle_invariants() {
        // Rotating the vertex order leaves the turning angle bit-for-bit
        // unchanged, and reversing it negates the result exactly.
        let l = candy_cane();
        let t = l.turning_angle();
        for rotation in 1..l.num_vertices() {
            let mut verts = l.vertices().to_vec();
            verts.rotate_left(rotation);
            let rotated = Loop::from_points(verts);
            assert_eq!(rotated.turning_angle(), t);
        }
        let mut rev = l.vertices().to_vec();
        rev.reverse();
        let reversed = Loop::from_points(rev);
        assert_eq!(reversed.turning_angle(), -t);
    }

    #[test]
    fn test_invert_round_trip() {
        // Inverting twice restores the loop bitwise.
        for l in [candy_cane(), loop_a(), Loop::empty(), Loop::full()] {
            let mut twice = l.clone();
            twice.invert();
            twice.invert();
            assert!(twice.equal(&l));
            assert_eq!(twice.contains_origin(), l.contains_origin());
            assert!(twice.rect_bound().approx_eq(&l.rect_bound(), 1e-15));
        }
    }

    #[test]
    fn test_invert_containment() {
        // Point containment flips under inversion (off the edges).
        let l = loop_a();
        let mut inv = l.clone();
        inv.invert();
        for p in [
            LatLng::from_degrees(5.0, 5.0).to_point(),
            LatLng::from_degrees(-20.0, 40.0).to_point(),
            Point::from_coords(0.0, 0.0, 1.0),
        ] {
            assert_ne!(l.contains_point(&p), inv.contains_point(&p));
        }
    }

    #[test]
    fn test_normalize() {
        let mut l = small_ne_cw();
        assert!(!l.is_normalized());
        l.normalize();
        assert!(l.is_normalized());
        // Normalizing an already-normalized loop is a no-op.
        let before = l.vertices().to_vec();
        l.normalize();
        assert_eq!(l.vertices(), &before[..]);
    }

    #[test]
    fn test_loop_relations() {
        let a = loop_a();
        let b = loop_b();
        let c = loop_c();
        let d = loop_d();

        // Every loop contains and intersects itself.
        for l in [&a, &b, &c, &d] {
            assert!(l.contains(l));
            assert!(l.intersects(l));
        }

        assert!(c.contains(&a));
        assert!(c.contains(&d));
        assert!(a.contains(&d));
        assert!(!a.contains(&c));
        assert!(!d.contains(&a));

        assert!(a.intersects(&b));
        assert!(b.intersects(&a));
        assert!(!d.intersects(&b));
        assert!(!a.contains(&b) && !b.contains(&a));

        assert_eq!(c.compare_boundary(&a), 1);
        assert_eq!(a.compare_boundary(&c), -1);
        assert_eq!(a.compare_boundary(&b), 0);
        assert_eq!(b.compare_boundary(&a), 0);
        assert_eq!(d.compare_boundary(&b), -1);

        // Containment implies intersection.
        assert!(c.intersects(&a));
        assert!(a.intersects(&d));

        // The fast nested check agrees where its preconditions hold.
        assert!(c.contains_nested(&a));
        assert!(a.contains_nested(&d));
        assert!(!d.contains_nested(&a));
        assert!(a.contains_non_crossing_boundary(&d, false));
        assert!(!d.contains_non_crossing_boundary(&a, false));
    }

    #[test]
    fn test_loops_sharing_an_edge() {
        let a = loop_a();
        let e = loop_e();

        // The loops share the meridian edge in opposite directions: their
        // interiors are disjoint and neither contains the other.
        assert!(!a.contains(&e));
        assert!(!e.contains(&a));
        assert!(!a.intersects(&e));
        assert_eq!(a.compare_boundary(&e), -1);
        assert_eq!(e.compare_boundary(&a), -1);
    }

    #[test]
    fn test_empty_full_relations() {
        let empty = Loop::empty();
        let full = Loop::full();
        let a = loop_a();

        assert!(full.contains(&a));
        assert!(full.contains(&empty));
        assert!(full.contains(&full));
        assert!(a.contains(&empty));
        assert!(!empty.contains(&a));
        assert!(empty.contains(&empty));

        assert!(!empty.intersects(&a));
        assert!(full.intersects(&a));
        assert!(!empty.intersects(&empty));
        assert!(full.intersects(&full));
    }

    #[test]
    fn test_hemisphere_complement_relations() {
        // Two loops that cover the sphere between them but only share
        // their boundary: each contains its own interior only.
        let north = north_hemi();
        let south = south_hemi();
        assert!(!north.contains(&south));
        assert!(!south.contains(&north));
        // All their vertices are shared and the interiors are disjoint.
        assert!(!north.intersects(&south));
    }

    #[test]
    fn test_nested_regular_loops() {
        // Concentric regular polygons: an 8-gon of radius 1000 km
        // containing a 4-gon of radius 100 km.
        let center = LatLng::from_degrees(20.0, 60.0).to_point();
        let outer = Loop::regular_loop(&center, km(1000.0), 8);
        let inner = Loop::regular_loop(&center, km(100.0), 4);

        assert!(outer.contains(&inner));
        assert!(!inner.contains(&outer));
        assert!(outer.intersects(&inner));
        assert_eq!(outer.compare_boundary(&inner), 1);
        assert_eq!(inner.compare_boundary(&outer), -1);
        assert!(outer.contains_nested(&inner));

        // Containment implies the bounds nest (after expansion).
        assert!(outer.subregion_bound().contains(&inner.rect_bound()));
    }

    #[test]
    fn test_crossing_regular_loops() {
        // Two 4-gons whose centers are 500 km apart with radius 800 km
        // each: they overlap but neither contains the other.
        let center_a = LatLng::from_radians(0.0, 0.0).to_point();
        let center_b = LatLng::from_radians(0.0, km(500.0).rad()).to_point();
        let a = Loop::regular_loop(&center_a, km(800.0), 4);
        let b = Loop::regular_loop(&center_b, km(800.0), 4);

        assert!(!a.contains(&b));
        assert!(!b.contains(&a));
        assert!(a.intersects(&b));
        assert!(b.intersects(&a));
        assert_eq!(a.compare_boundary(&b), 0);
        assert_eq!(b.compare_boundary(&a), 0);
    }

    #[test]
    fn test_relations_with_dense_loop() {
        // A dense ring against coarse probes: the walk pairs one coarse
        // index cell of the probe against many fine cells of the ring,
        // which drives the edge-query narrowing path.
        let center = LatLng::from_degrees(0.0, 0.0).to_point();
        let dense = Loop::regular_loop(&center, km(500.0), 1000);

        // A small square straddling the ring's boundary.
        let on_ring = LatLng::from_radians(0.0, km(500.0).rad()).to_point();
        let probe = Loop::regular_loop(&on_ring, km(50.0), 4);
        assert!(dense.intersects(&probe));
        assert!(probe.intersects(&dense));
        assert!(!dense.contains(&probe));
        assert_eq!(dense.compare_boundary(&probe), 0);

        // A small square fully inside.
        let inner = Loop::regular_loop(&center, km(50.0), 4);
        assert!(dense.contains(&inner));
        assert!(dense.intersects(&inner));
        assert_eq!(dense.compare_boundary(&inner), 1);
        // And one fully outside.
        let outer = Loop::regular_loop(
            &LatLng::from_degrees(0.0, 30.0).to_point(),
            km(50.0),
            4,
        );
        assert!(!dense.intersects(&outer));
        assert_eq!(dense.compare_boundary(&outer), -1);
    }

    #[test]
    fn test_cell_loop() {
        let id = CellID::from_point(&LatLng::from_degrees(0.5, 0.5).to_point()).parent(8);
        let cell = Cell::from_cell_id(id);
        let l = Loop::from_cell(&cell);

        assert!(l.is_valid());
        assert!(l.contains_point(&cell.center()));
        assert!(l.may_intersect_cell(&cell));

        let rel_diff = (l.area() - cell.exact_area()).abs() / cell.exact_area();
        assert!(rel_diff < 1e-10, "relative area difference {rel_diff}");

        // The loop contains strictly smaller cells near the center.
        let inner = Cell::from_cell_id(CellID::from_point(&cell.center()).parent(12));
        assert!(l.contains_cell(&inner));
        // And is disjoint from far-away cells.
        let far = Cell::from_cell_id(
            CellID::from_point(&LatLng::from_degrees(-45.0, 120.0).to_point()).parent(8),
        );
        assert!(!l.may_intersect_cell(&far));
        assert!(!l.contains_cell(&far));
    }

    #[test]
    fn test_validation_errors() {
        let opts = LoopOptions {
            lazy_indexing: true,
            debug_override: DebugOverride::DisableDebug,
        };

        // A non-unit vertex.
        let bad_vertex = Loop::from_points_with_options(
            vec![
                LatLng::from_degrees(0.0, 0.0).to_point(),
                Point(R3Vector::new(0.5, 0.5, 0.5)),
                LatLng::from_degrees(1.0, 0.0).to_point(),
            ],
            &opts,
        );
        assert_eq!(
            bad_vertex.find_validation_error(),
            Err(Error::NotUnitLength(1))
        );
        assert!(!bad_vertex.is_valid());

        // Too few vertices without being a sentinel.
        let two = Loop::from_points_with_options(
            vec![
                LatLng::from_degrees(0.0, 0.0).to_point(),
                LatLng::from_degrees(1.0, 0.0).to_point(),
            ],
            &opts,
        );
        assert_eq!(two.find_validation_error(), Err(Error::NotEnoughVertices));

        // A degenerate edge.
        let dup = Loop::from_points_with_options(
            vec![
                LatLng::from_degrees(0.0, 0.0).to_point(),
                LatLng::from_degrees(0.0, 0.0).to_point(),
                LatLng::from_degrees(1.0, 0.0).to_point(),
            ],
            &opts,
        );
        assert_eq!(dup.find_validation_error(), Err(Error::DuplicateVertices(0)));

        // A bowtie: two non-adjacent edges cross.
        let bowtie = Loop::from_points_with_options(
            vec![
                LatLng::from_degrees(0.0, 0.0).to_point(),
                LatLng::from_degrees(10.0, 10.0).to_point(),
                LatLng::from_degrees(0.0, 10.0).to_point(),
                LatLng::from_degrees(10.0, 0.0).to_point(),
            ],
            &opts,
        );
        assert!(matches!(
            bowtie.find_validation_error(),
            Err(Error::SelfIntersects(_, _))
        ));
        assert!(!bowtie.is_valid());
    }

    #[test]
    fn test_lossless_codec_round_trip() {
        let mut l = Loop::regular_loop(
            &LatLng::from_degrees(-15.0, 75.0).to_point(),
            km(250.0),
            1000,
        );
        l.set_depth(3);
        let data = l.encode();
        let decoded = Loop::decode(&data).expect("decode");

        assert!(decoded.equal(&l));
        assert_eq!(decoded.contains_origin(), l.contains_origin());
        assert_eq!(decoded.depth(), l.depth());
        assert_eq!(decoded.rect_bound(), l.rect_bound());
        // The round trip also holds for the sentinels.
        for s in [Loop::empty(), Loop::full()] {
            let round = Loop::decode(&s.encode()).expect("decode");
            assert!(round.equal(&s));
            assert_eq!(round.is_full(), s.is_full());
        }
    }

    #[test]
    fn test_decode_rejects_bad_input() {
        let l = loop_a();
        let data = l.encode();

        // Truncated input.
        assert!(matches!(
            Loop::decode(&data[..data.len() / 2]),
            Err(DecodeError::Truncated)
        ));
        // Unknown version.
        let mut bad = data.clone();
        bad[0] = 9;
        assert!(matches!(
            Loop::decode(&bad),
            Err(DecodeError::BadVersion(9))
        ));
        // Vertex count above the limit.
        let opts = DecodeOptions {
            max_num_vertices: 3,
        };
        assert!(matches!(
            Loop::decode_with_options(&data, &opts),
            Err(DecodeError::TooManyVertices(4, 3))
        ));
    }

    #[test]
    fn test_compressed_codec_round_trip() {
        // A large loop: the bound is carried in the encoding (n >= 64).
        let l = Loop::regular_loop(
            &LatLng::from_degrees(10.0, 20.0).to_point(),
            km(400.0),
            1000,
        );
        let data = l.encode_compressed(16);
        let decoded = Loop::decode_compressed(&data).expect("decode");
        // Vertices that are not snap-cell centers ride the exact escape
        // list, so the round trip is lossless here.
        assert!(decoded.equal(&l));
        assert_eq!(decoded.contains_origin(), l.contains_origin());
        assert_eq!(decoded.rect_bound(), l.rect_bound());

        // The properties bitset records that the bound was encoded.
        let mut d = Decoder::new(&data);
        let n = d.get_uvarint().unwrap() as usize;
        assert_eq!(n, 1000);
        crate::s2::point_compression::decode_points_compressed(&mut d, n).unwrap();
        let properties = d.get_uvarint().unwrap();
        assert_ne!(properties & COMPRESSED_BOUND_ENCODED, 0);

        // A small loop omits the bound, which is re-derived on decode.
        let small = loop_a();
        let data = small.encode_compressed(16);
        let mut d = Decoder::new(&data);
        let n = d.get_uvarint().unwrap() as usize;
        crate::s2::point_compression::decode_points_compressed(&mut d, n).unwrap();
        let properties = d.get_uvarint().unwrap();
        assert_eq!(properties & COMPRESSED_BOUND_ENCODED, 0);
        let decoded = Loop::decode_compressed(&data).expect("decode");
        assert!(decoded.equal(&small));
        assert!(decoded.rect_bound().approx_eq(&small.rect_bound(), 1e-14));
    }

    #[test]
    fn test_compressed_codec_snapped_loop() {
        // Snap the vertices to level-16 cell centers first; the encoding
        // then stores compact cell ids and restores the points exactly.
        let level = 16;
        let raw = Loop::regular_loop(&LatLng::from_degrees(0.0, 0.0).to_point(), km(100.0), 100);
        let snapped: Vec<Point> = raw
            .vertices()
            .iter()
            .map(|p| CellID::from_point(p).parent(level).center_point())
            .collect();
        let l = Loop::from_points(snapped);
        let data = l.encode_compressed(level);
        let decoded = Loop::decode_compressed(&data).expect("decode");
        assert!(decoded.equal(&l));
        // Snapped vertices cost a few bytes each, well below the 24-byte
        // lossless representation.
        assert!(data.len() < l.encode().len() / 2);
    }

    #[test]
    fn test_equal_and_boundary_equal() {
        let l = candy_cane();
        assert!(l.equal(&l.clone()));

        let mut rotated_verts = l.vertices().to_vec();
        rotated_verts.rotate_left(2);
        let rotated = Loop::from_points(rotated_verts);
        assert!(!l.equal(&rotated));
        assert!(l.boundary_equal(&rotated));

        // Tiny perturbations satisfy the approximate matchers.
        let perturbed = Loop::from_points(
            l.vertices()
                .iter()
                .map(|p| Point((p.0 + R3Vector::new(1e-13, -1e-13, 1e-13)).normalize()))
                .collect(),
        );
        assert!(!l.boundary_equal(&perturbed));
        assert!(l.boundary_approx_equals(&perturbed, 1e-12));
        assert!(l.boundary_near(&perturbed, 1e-12));

        // The empty and full loops have distinct boundaries.
        assert!(!Loop::empty().boundary_equal(&Loop::full()));
        assert!(Loop::empty().boundary_equal(&Loop::empty()));
    }

    #[test]
    fn test_boundary_near_with_different_vertex_counts() {
        let l = loop_a();
        // Insert the midpoint of the first edge; the boundary curve is
        // unchanged.
        let mut verts = l.vertices().to_vec();
        let mid = Point((verts[0].0 + verts[1].0).normalize());
        verts.insert(1, mid);
        let split = Loop::from_points(verts);
        assert!(!l.boundary_equal(&split));
        assert!(l.boundary_near(&split, 1e-12));
        assert!(split.boundary_near(&l, 1e-12));
    }

    #[test]
    fn test_hole_and_sign() {
        let mut l = loop_a();
        assert!(!l.is_hole());
        assert_eq!(l.sign(), 1);
        l.set_depth(3);
        assert!(l.is_hole());
        assert_eq!(l.sign(), -1);

        // oriented_vertex reverses the traversal for holes.
        let n = l.num_vertices();
        for i in 0..n {
            assert_eq!(l.oriented_vertex(i), l.vertex(n - 1 - i));
        }
    }

    #[test]
    fn test_distance_and_project() {
        let l = loop_a();
        let inside = LatLng::from_degrees(5.0, 5.0).to_point();
        let outside = LatLng::from_degrees(5.0, 20.0).to_point();

        assert_eq!(l.distance(&inside).rad(), 0.0);
        assert_eq!(l.project(&inside), inside);

        let d = l.distance(&outside);
        assert!(d.rad() > 0.0);
        let projected = l.project(&outside);
        // The projection lies on the boundary: its distance to the
        // boundary is negligible, and it accounts for the full distance.
        assert!(l.distance_to_boundary(&projected).rad() < 1e-12);
        assert!(f64_eq(outside.distance(&projected).rad(), d.rad()));
    }

    #[test]
    fn test_regular_loop_geometry() {
        let center = LatLng::from_degrees(40.0, -70.0).to_point();
        let radius = km(200.0);
        let l = Loop::regular_loop(&center, radius, 32);
        assert_eq!(l.num_vertices(), 32);
        for i in 0..l.num_vertices() {
            assert!((l.vertex(i).distance(&center).rad() - radius.rad()).abs() < 1e-13);
        }
        assert!(l.contains_point(&center));
        assert!(l.is_normalized());
        // The area approaches the spherical cap area as the vertex count
        // grows: within a percent at 32 vertices.
        let cap_area = 2.0 * PI * (1.0 - radius.rad().cos());
        assert!((l.area() - cap_area).abs() < 0.01 * cap_area);
    }

    #[test]
    fn test_unindexed_call_counter_triggers_index() {
        let opts = LoopOptions {
            lazy_indexing: true,
            debug_override: DebugOverride::DisableDebug,
        };
        let l = Loop::from_points_with_options(
            crate::s2::point::regular_points_for_frame(
                &get_frame(&LatLng::from_degrees(10.0, 10.0).to_point()),
                km(300.0),
                64,
            ),
            &opts,
        );
        assert!(!l.index().is_fresh());

        let p = LatLng::from_degrees(10.0, 10.0).to_point();
        // The first 19 calls stay on the brute-force path.
        for _ in 0..19 {
            assert!(l.contains_point(&p));
            assert!(!l.index().is_fresh());
        }
        // The 20th call is the one that materializes the index.
        assert!(l.contains_point(&p));
        assert!(l.index().is_fresh());
    }

    #[test]
    fn test_concurrent_contains_point() {
        // Concurrent queries on a freshly-built lazy loop all return
        // correct answers, and the index build is coalesced.
        let opts = LoopOptions {
            lazy_indexing: true,
            debug_override: DebugOverride::DisableDebug,
        };
        let center = LatLng::from_degrees(-5.0, 30.0).to_point();
        let l = Loop::from_points_with_options(
            crate::s2::point::regular_points_for_frame(&get_frame(&center), km(400.0), 64),
            &opts,
        );
        assert!(!l.index().is_fresh());

        let far = LatLng::from_degrees(60.0, -120.0).to_point();
        std::thread::scope(|s| {
            for _ in 0..64 {
                s.spawn(|| {
                    assert!(l.contains_point(&center));
                    assert!(!l.contains_point(&far));
                });
            }
        });
        assert!(l.index().is_fresh());
        // And the answers are still right on the indexed path.
        assert!(l.contains_point(&center));
        assert!(!l.contains_point(&far));
    }

    #[test]
    fn test_clone_is_independent() {
        let l = loop_a();
        let copy = l.clone();
        assert!(copy.equal(&l));
        assert_eq!(copy.contains_origin(), l.contains_origin());
        assert_eq!(copy.rect_bound(), l.rect_bound());
        // Mutating the copy leaves the original untouched.
        let mut inverted = copy.clone();
        inverted.invert();
        assert!(!inverted.equal(&l));
        assert!(l.contains_point(&LatLng::from_degrees(5.0, 5.0).to_point()));
    }
}
