// Copyright 2022 Spanfile
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use thiserror::Error;

/// Errors returned when a palette cannot be computed from the given input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum QuantizeError {
    /// The sample set has no samples to cluster.
    #[error("cannot compute a palette from an empty sample set")]
    EmptyInput,

    /// The requested palette size is zero or larger than the number of samples.
    #[error("palette size must be in 1..={len}, got {k}")]
    InvalidK { k: usize, len: usize },

    /// A raw pixel buffer does not match its stated dimensions.
    #[error("expected a buffer of {expected} bytes, got {actual}")]
    BufferSize { expected: usize, actual: usize },
}

/// Error returned when parsing a `#RRGGBB` hex color fails.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseHexError {
    #[error("hex color must have 6 digits, got {0}")]
    Length(usize),

    #[error("invalid hex digits in {0:?}")]
    Digits(String),
}
