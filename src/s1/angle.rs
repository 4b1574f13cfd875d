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
use std::ops::{Add, Mul, Neg, Sub};

/// Angle represents a 1D angle in radians.
#[derive(Debug, Clone, Copy, Default, PartialEq, PartialOrd)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Angle(pub f64);

/// Deg wraps an angle expressed in degrees for explicit conversions.
#[derive(Debug, Clone, Copy, Default, PartialEq, PartialOrd)]
pub struct Deg(pub f64);

impl Angle {
    /// The angle in radians.
    pub fn rad(&self) -> f64 {
        self.0
    }

    /// The angle in degrees.
    pub fn deg(&self) -> f64 {
        self.0 * (180.0 / PI)
    }

    pub fn abs(&self) -> Angle {
        Angle(self.0.abs())
    }
}

impl From<Deg> for Angle {
    fn from(d: Deg) -> Self {
        Angle(d.0 * (PI / 180.0))
    }
}

impl From<Angle> for Deg {
    fn from(a: Angle) -> Self {
        Deg(a.deg())
    }
}

impl Add for Angle {
    type Output = Angle;
    fn add(self, other: Angle) -> Angle {
        Angle(self.0 + other.0)
    }
}

impl Sub for Angle {
    type Output = Angle;
    fn sub(self, other: Angle) -> Angle {
        Angle(self.0 - other.0)
    }
}

impl Mul<f64> for Angle {
    type Output = Angle;
    fn mul(self, m: f64) -> Angle {
        Angle(self.0 * m)
    }
}

impl Neg for Angle {
    type Output = Angle;
    fn neg(self) -> Angle {
        Angle(-self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::f64_eq;

    #[test]
    fn test_conversions() {
        assert!(f64_eq(Angle::from(Deg(180.0)).rad(), PI));
        assert!(f64_eq(Angle(PI / 2.0).deg(), 90.0));
        assert!(f64_eq((Angle(0.25) + Angle(0.5)).rad(), 0.75));
        assert!(f64_eq((-Angle(0.25)).rad(), -0.25));
    }
}
