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

//! Simple closed polylines ("loops") on the unit sphere.
//!
//! A [`Loop`] represents a simple spherical polygon: a sequence of vertices
//! where the first vertex is implicitly connected to the last, oriented so
//! that the loop interior is on the left side of the edges. Loops support
//! point containment backed by a lazily-built spatial index, area and
//! centroid computation via signed surface integrals, latitude-longitude
//! bounding rectangles that account for edge latitude extrema, pairwise
//! relations (contains / intersects / boundary comparison) computed by
//! walking two spatial indexes in lockstep, and both lossless and
//! compressed serialization formats.
//!
//! The two special loops are the "empty" loop (contains no points) and the
//! "full" loop (contains all points); both are represented by a single
//! vertex so that every loop is a vertex chain.

pub mod consts;
pub mod encoding;
pub mod error;
pub mod r1;
pub mod r2;
pub mod r3;
pub mod s1;
pub mod s2;

pub use crate::error::{DecodeError, Error};
pub use crate::s2::r#loop::{
    DebugOverride, DecodeOptions, Loop, LoopOptions, MAX_DECODE_NUM_VERTICES,
};
pub use crate::s2::latlng::LatLng;
pub use crate::s2::point::Point;
pub use crate::s2::rect::Rect;
