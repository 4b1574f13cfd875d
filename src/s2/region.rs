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

use crate::s2::cap::Cap;
use crate::s2::cell::Cell;
use crate::s2::point::Point;
use crate::s2::rect::Rect;

/// Region represents a two-dimensional region on the unit sphere.
///
/// The purpose of this interface is to allow complex regions to be
/// approximated as simpler regions. The interface is restricted to methods
/// that are useful for computing approximations.
pub trait Region {
    /// A bounding spherical cap. This is not guaranteed to be exact.
    fn cap_bound(&self) -> Cap;

    /// A bounding latitude-longitude rectangle that contains the region.
    /// The bounds are not guaranteed to be tight.
    fn rect_bound(&self) -> Rect;

    /// Reports whether the region completely contains the given cell.
    fn contains_cell(&self, cell: &Cell) -> bool;

    /// Reports whether the region intersects the given cell. May return
    /// true even when there is no intersection, as long as false is never
    /// returned for an intersecting cell.
    fn may_intersect_cell(&self, cell: &Cell) -> bool;

    /// Reports whether the region contains the given point.
    fn contains_point(&self, p: &Point) -> bool;
}
