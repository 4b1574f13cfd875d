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

/// Interval represents a closed interval on the real line. An interval is
/// empty when lo > hi; the canonical empty interval is [1, 0].
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Interval {
    pub lo: f64,
    pub hi: f64,
}

impl Interval {
    pub fn new(lo: f64, hi: f64) -> Self {
        Interval { lo, hi }
    }

    /// Returns an empty interval.
    pub fn empty() -> Self {
        Interval { lo: 1.0, hi: 0.0 }
    }

    /// Returns an interval representing the single point p.
    pub fn from_point(p: f64) -> Self {
        Interval { lo: p, hi: p }
    }

    pub fn is_empty(&self) -> bool {
        self.lo > self.hi
    }

    /// The midpoint of the interval; undefined for empty intervals.
    pub fn center(&self) -> f64 {
        0.5 * (self.lo + self.hi)
    }

    /// The length of the interval; negative for empty intervals.
    pub fn len(&self) -> f64 {
        self.hi - self.lo
    }

    pub fn contains(&self, p: f64) -> bool {
        self.lo <= p && p <= self.hi
    }

    pub fn contains_interval(&self, other: &Interval) -> bool {
        if other.is_empty() {
            return true;
        }
        self.lo <= other.lo && other.hi <= self.hi
    }

    pub fn interior_contains(&self, p: f64) -> bool {
        self.lo < p && p < self.hi
    }

    pub fn intersects(&self, other: &Interval) -> bool {
        if self.lo <= other.lo {
            other.lo <= self.hi && other.lo <= other.hi
        } else {
            self.lo <= other.hi && self.lo <= self.hi
        }
    }

    /// Returns the interval expanded to contain p.
    pub fn add_point(&self, p: f64) -> Interval {
        if self.is_empty() {
            Interval::from_point(p)
        } else {
            Interval {
                lo: self.lo.min(p),
                hi: self.hi.max(p),
            }
        }
    }

    /// Returns the interval expanded by margin on each side. Empty
    /// intervals stay empty.
    pub fn expanded(&self, margin: f64) -> Interval {
        if self.is_empty() {
            return *self;
        }
        Interval {
            lo: self.lo - margin,
            hi: self.hi + margin,
        }
    }

    /// The smallest interval containing both input intervals.
    pub fn union(&self, other: &Interval) -> Interval {
        if self.is_empty() {
            return *other;
        }
        if other.is_empty() {
            return *self;
        }
        Interval {
            lo: self.lo.min(other.lo),
            hi: self.hi.max(other.hi),
        }
    }

    pub fn intersection(&self, other: &Interval) -> Interval {
        Interval {
            lo: self.lo.max(other.lo),
            hi: self.hi.min(other.hi),
        }
    }

    /// Reports whether the intervals are equal within the given tolerance.
    /// Empty intervals match any interval of length at most 2*max_error.
    pub fn approx_eq(&self, other: &Interval, max_error: f64) -> bool {
        if self.is_empty() {
            return other.len() <= 2.0 * max_error;
        }
        if other.is_empty() {
            return self.len() <= 2.0 * max_error;
        }
        (other.lo - self.lo).abs() <= max_error && (other.hi - self.hi).abs() <= max_error
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basics() {
        let unit = Interval::new(0.0, 1.0);
        let empty = Interval::empty();
        assert!(!unit.is_empty());
        assert!(empty.is_empty());
        assert_eq!(unit.center(), 0.5);
        assert_eq!(unit.len(), 1.0);
        assert!(unit.contains(0.0) && unit.contains(1.0));
        assert!(!unit.interior_contains(0.0));
        assert!(unit.interior_contains(0.5));
    }

    #[test]
    fn test_union_intersection() {
        let a = Interval::new(0.0, 0.5);
        let b = Interval::new(0.25, 1.0);
        assert_eq!(a.union(&b), Interval::new(0.0, 1.0));
        assert_eq!(a.intersection(&b), Interval::new(0.25, 0.5));
        assert!(a.intersects(&b));
        let c = Interval::new(2.0, 3.0);
        assert!(!a.intersects(&c));
        assert_eq!(a.union(&Interval::empty()), a);
    }

    #[test]
    fn test_add_point_and_expanded() {
        let i = Interval::empty().add_point(3.0).add_point(1.0);
        assert_eq!(i, Interval::new(1.0, 3.0));
        assert_eq!(i.expanded(0.5), Interval::new(0.5, 3.5));
        assert!(Interval::empty().expanded(1.0).is_empty());
    }
}
