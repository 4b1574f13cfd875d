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

//! Numeric constants and small floating-point helpers shared by the
//! geometric modules.

/// The smallest positive f64 such that `1.0 + DBL_EPSILON != 1.0`.
pub const DBL_EPSILON: f64 = 2.220446049250313e-16;

/// Default tolerance for approximate floating-point comparisons.
pub const EPSILON: f64 = 1e-15;

/// Reports whether the two values are within EPSILON of each other.
pub fn f64_eq(x: f64, y: f64) -> bool {
    f64_near(x, y, EPSILON)
}

/// Reports whether the two values are within the given epsilon.
pub fn f64_near(x: f64, y: f64, eps: f64) -> bool {
    (x - y).abs() <= eps
}

/// Returns x * 2^exp.
pub fn ldexp(x: f64, exp: i32) -> f64 {
    x * (exp as f64).exp2()
}

/// Returns the binary exponent of x: the unique e such that
/// `2^e <= |x| < 2^(e+1)`. The result is unspecified for zeros, infinities
/// and NaNs, which the callers never pass.
pub fn ilogb(x: f64) -> i32 {
    let bits = x.abs().to_bits();
    let exp = ((bits >> 52) & 0x7ff) as i32;
    if exp == 0 {
        // Subnormal: normalize by scaling up.
        return ilogb(x * (1u64 << 52) as f64) - 52;
    }
    exp - 1023
}

/// Returns the index of the least significant set bit, for non-zero input.
pub fn find_lsb_set_non_zero_64(x: u64) -> u32 {
    x.trailing_zeros()
}
