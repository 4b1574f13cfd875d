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

use thiserror::Error;

/// Validation errors reported by `Loop::find_validation_error`. Each
/// variant carries the index of the offending vertex or edge.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error("vertex {0} is not unit length")]
    NotUnitLength(usize),
    #[error("non-empty, non-full loops must have at least 3 vertices")]
    NotEnoughVertices,
    #[error("edge {0} is degenerate (duplicate vertex)")]
    DuplicateVertices(usize),
    #[error("loop has a self-intersection (edge {0} crosses edge {1})")]
    SelfIntersects(usize, usize),
}

/// Errors reported while decoding a serialized loop. Decoding never commits
/// partial state: on error the target loop is untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("unexpected end of encoded data")]
    Truncated,
    #[error("unknown encoding version {0}")]
    BadVersion(u8),
    #[error("vertex count {0} exceeds the decoding limit {1}")]
    TooManyVertices(u64, u64),
    #[error("malformed encoded data: {0}")]
    Malformed(&'static str),
}

pub type Result<T> = std::result::Result<T, Error>;
