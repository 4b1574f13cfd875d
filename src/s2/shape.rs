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

use crate::s2::point::Point;

/// Edge represents a geodesic edge consisting of two vertices. Zero-length
/// edges are allowed, and can be used to represent points.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Edge {
    pub v0: Point,
    pub v1: Point,
}

/// Chain represents a range of edge ids corresponding to a chain of
/// connected edges: edge i is joined to edge i+1 by sharing a vertex.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chain {
    pub start: usize,
    pub length: usize,
}

/// ChainPosition represents the position of an edge within a given edge
/// chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChainPosition {
    pub chain_id: usize,
    pub offset: usize,
}

/// ReferencePoint consists of a point and a boolean indicating whether the
/// point is contained by a particular shape.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReferencePoint {
    pub point: Point,
    pub contained: bool,
}

impl ReferencePoint {
    /// Returns a ReferencePoint with the sphere's fixed origin and the
    /// given containment status.
    pub fn origin(contained: bool) -> Self {
        ReferencePoint {
            point: Point::origin(),
            contained,
        }
    }
}

/// Shape represents polygonal geometry in a flexible way: as a collection
/// of edges that optionally defines an interior. Shapes are indexable by a
/// ShapeIndex, which makes containment and crossing queries fast.
///
/// Shapes must be safe to share between threads: all methods are
/// read-only.
pub trait Shape: Send + Sync {
    /// The number of edges in this shape.
    fn num_edges(&self) -> usize;

    /// The edge with the given id.
    fn edge(&self, i: usize) -> Edge;

    /// An arbitrary reference point for the shape, along with whether the
    /// shape contains it. (Only meaningful for 2-dimensional shapes.)
    fn reference_point(&self) -> ReferencePoint;

    /// The number of contiguous edge chains in the shape.
    fn num_chains(&self) -> usize;

    /// The range of edge ids corresponding to the given chain.
    fn chain(&self, chain_id: usize) -> Chain;

    /// The edge at the given offset within the given chain.
    fn chain_edge(&self, chain_id: usize, offset: usize) -> Edge;

    /// The chain and offset of the given edge id.
    fn chain_position(&self, edge_id: usize) -> ChainPosition;

    /// The dimension of the geometry: 0 for points, 1 for polylines, 2 for
    /// polygons (shapes with an interior).
    fn dimension(&self) -> i64;
}
