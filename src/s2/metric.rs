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

use crate::consts::{ilogb, ldexp};
use crate::s2::cellid::MAX_LEVEL;

/// Metric is a measure for cells that is defined by the value of the
/// measure at the given dimension for cells at level 0. It is used to
/// convert between measure values and cell levels.
#[derive(Debug, Clone, Copy)]
pub struct Metric {
    /// Dim is either 1 or 2, for a 1D or 2D metric respectively.
    pub dim: u8,
    /// Deriv is the scaling factor for the metric.
    pub deriv: f64,
}

/// The average angular length of a cell edge (quadratic projection).
pub const AVG_EDGE_METRIC: Metric = Metric {
    dim: 1,
    deriv: 1.459213746386106,
};

/// The maximum angular diagonal of a cell (quadratic projection).
pub const MAX_DIAG_METRIC: Metric = Metric {
    dim: 1,
    deriv: 2.438654594434021,
};

impl Metric {
    /// The value of the metric at the given level.
    pub fn value(&self, level: u64) -> f64 {
        ldexp(self.deriv, -(self.dim as i32) * level as i32)
    }

    /// The minimum level such that the metric is at most the given value,
    /// or MAX_LEVEL if there is no such level.
    pub fn min_level(&self, val: f64) -> u64 {
        if val <= 0.0 {
            return MAX_LEVEL;
        }
        let level = -(ilogb(val / self.deriv) >> (self.dim - 1));
        level.clamp(0, MAX_LEVEL as i32) as u64
    }

    /// The maximum level such that the metric is at least the given value,
    /// or zero if there is no such level.
    pub fn max_level(&self, val: f64) -> u64 {
        if val <= 0.0 {
            return MAX_LEVEL;
        }
        let level = ilogb(self.deriv / val) >> (self.dim - 1);
        level.clamp(0, MAX_LEVEL as i32) as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_halves_each_level() {
        for level in 0..MAX_LEVEL {
            let v = AVG_EDGE_METRIC.value(level);
            assert_eq!(AVG_EDGE_METRIC.value(level + 1), v / 2.0);
        }
    }

    #[test]
    fn test_min_max_level() {
        for level in 1..=MAX_LEVEL {
            let v = MAX_DIAG_METRIC.value(level);
            assert_eq!(MAX_DIAG_METRIC.min_level(v), level);
            assert_eq!(MAX_DIAG_METRIC.max_level(v), level);
            // Slightly smaller targets push min_level down a level.
            assert_eq!(MAX_DIAG_METRIC.min_level(v * 0.99), (level + 1).min(MAX_LEVEL));
        }
        assert_eq!(AVG_EDGE_METRIC.min_level(0.0), MAX_LEVEL);
    }
}
