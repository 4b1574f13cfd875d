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

use std::f64::consts::PI;

/// Returns the remainder of x with respect to the nearest integer multiple
/// of y. The result is in [-y/2, y/2].
fn remainder(x: f64, y: f64) -> f64 {
    x - y * (x / y).round()
}

/// Interval represents a closed interval on the unit circle, with endpoints
/// in [-pi, pi]. An interval with lo > hi is "inverted" and wraps through
/// the point pi. The point -pi is treated as equivalent to pi.
///
/// The empty interval is [pi, -pi] and the full interval is [-pi, pi].
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Interval {
    pub lo: f64,
    pub hi: f64,
}

impl Interval {
    /// Constructs a new interval from endpoints, mapping -pi to pi.
    pub fn from_endpoints(lo: f64, hi: f64) -> Self {
        let mut i = Interval { lo, hi };
        if lo == -PI && hi != PI {
            i.lo = PI;
        }
        if hi == -PI && lo != PI {
            i.hi = PI;
        }
        i
    }

    pub fn from_point(p: f64) -> Self {
        let p = if p == -PI { PI } else { p };
        Interval { lo: p, hi: p }
    }

    pub fn empty() -> Self {
        Interval { lo: PI, hi: -PI }
    }

    pub fn full() -> Self {
        Interval { lo: -PI, hi: PI }
    }

    pub fn is_empty(&self) -> bool {
        self.lo == PI && self.hi == -PI
    }

    pub fn is_full(&self) -> bool {
        self.lo == -PI && self.hi == PI
    }

    pub fn is_inverted(&self) -> bool {
        self.lo > self.hi
    }

    /// The length of the interval; empty intervals have length -1.
    pub fn len(&self) -> f64 {
        let mut l = self.hi - self.lo;
        if l >= 0.0 {
            return l;
        }
        l += 2.0 * PI;
        if l > 0.0 {
            l
        } else {
            -1.0
        }
    }

    /// The midpoint of the interval, normalized into (-pi, pi].
    pub fn center(&self) -> f64 {
        let c = 0.5 * (self.lo + self.hi);
        if !self.is_inverted() {
            return c;
        }
        if c <= 0.0 {
            c + PI
        } else {
            c - PI
        }
    }

    fn fast_contains(&self, p: f64) -> bool {
        if self.is_inverted() {
            (p >= self.lo || p <= self.hi) && !self.is_empty()
        } else {
            p >= self.lo && p <= self.hi
        }
    }

    pub fn contains(&self, p: f64) -> bool {
        let p = if p == -PI { PI } else { p };
        self.fast_contains(p)
    }

    pub fn interior_contains(&self, p: f64) -> bool {
        let p = if p == -PI { PI } else { p };
        if self.is_inverted() {
            p > self.lo || p < self.hi
        } else {
            (p > self.lo && p < self.hi) || self.is_full()
        }
    }

    pub fn contains_interval(&self, other: &Interval) -> bool {
        if self.is_inverted() {
            if other.is_inverted() {
                return other.lo >= self.lo && other.hi <= self.hi;
            }
            return (other.lo >= self.lo || other.hi <= self.hi) && !self.is_empty();
        }
        if other.is_inverted() {
            return self.is_full() || other.is_empty();
        }
        other.lo >= self.lo && other.hi <= self.hi
    }

    pub fn intersects(&self, other: &Interval) -> bool {
        if self.is_empty() || other.is_empty() {
            return false;
        }
        if self.is_inverted() {
            return other.is_inverted() || other.lo <= self.hi || other.hi >= self.lo;
        }
        if other.is_inverted() {
            return other.lo <= self.hi || other.hi >= self.lo;
        }
        other.lo <= self.hi && other.hi >= self.lo
    }

    /// The smallest interval containing both intervals.
    pub fn union(&self, other: &Interval) -> Interval {
        if other.is_empty() {
            return *self;
        }
        if self.fast_contains(other.lo) {
            if self.fast_contains(other.hi) {
                // Either other is a subset of self, or the union is full.
                if self.contains_interval(other) {
                    return *self;
                }
                return Interval::full();
            }
            return Interval {
                lo: self.lo,
                hi: other.hi,
            };
        }
        if self.fast_contains(other.hi) {
            return Interval {
                lo: other.lo,
                hi: self.hi,
            };
        }
        // Neither endpoint of other is in self. Either self is a subset of
        // other, or the intervals are disjoint.
        if self.is_empty() || other.fast_contains(self.lo) {
            return *other;
        }
        // The intervals are disjoint: pick the union with the smaller gap.
        if positive_distance(other.hi, self.lo) < positive_distance(self.hi, other.lo) {
            Interval {
                lo: other.lo,
                hi: self.hi,
            }
        } else {
            Interval {
                lo: self.lo,
                hi: other.hi,
            }
        }
    }

    /// Expands the interval to contain the point p (which must be in
    /// [-pi, pi]).
    pub fn add_point(&self, p: f64) -> Interval {
        if p.abs() > PI {
            return *self;
        }
        let p = if p == -PI { PI } else { p };
        if self.fast_contains(p) {
            return *self;
        }
        if self.is_empty() {
            return Interval { lo: p, hi: p };
        }
        if positive_distance(p, self.lo) < positive_distance(self.hi, p) {
            Interval {
                lo: p,
                hi: self.hi,
            }
        } else {
            Interval {
                lo: self.lo,
                hi: p,
            }
        }
    }

    /// Returns the interval expanded by the given non-negative margin on
    /// each side.
    pub fn expanded(&self, margin: f64) -> Interval {
        if self.is_empty() {
            return *self;
        }
        // Check whether the interval will be full after expansion, allowing
        // for a rounding error when computing each endpoint.
        if self.len() + 2.0 * margin + 2.0 * crate::consts::DBL_EPSILON >= 2.0 * PI {
            return Interval::full();
        }
        let mut result = Interval {
            lo: remainder(self.lo - margin, 2.0 * PI),
            hi: remainder(self.hi + margin, 2.0 * PI),
        };
        if result.lo <= -PI {
            result.lo = PI;
        }
        result
    }

    pub fn approx_eq(&self, other: &Interval, max_error: f64) -> bool {
        if self.is_empty() {
            return other.len() <= 2.0 * max_error;
        }
        if other.is_empty() {
            return self.len() <= 2.0 * max_error;
        }
        remainder(other.lo - self.lo, 2.0 * PI).abs() <= max_error
            && remainder(other.hi - self.hi, 2.0 * PI).abs() <= max_error
            && (self.len() - other.len()).abs() <= 2.0 * max_error
    }
}

impl Default for Interval {
    fn default() -> Self {
        Interval::empty()
    }
}

/// The distance from a to b in the range [0, 2*pi), going around the
/// circle in the positive direction.
fn positive_distance(a: f64, b: f64) -> f64 {
    let d = b - a;
    if d >= 0.0 {
        return d;
    }
    (b + PI) - (a - PI)
}
