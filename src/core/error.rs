// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 itsakeyfut
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

//! Error types for the CDC core

use thiserror::Error;

/// Result type for CDC core operations
pub type Result<T> = std::result::Result<T, CdcError>;

/// Main error type for the CDC core
///
/// Chip-level register and DMA operations are total functions and never
/// fail; errors surface only at the edges (disc image loading, save state
/// serialization, file I/O).
#[derive(Error, Debug)]
pub enum CdcError {
    #[error("Disc error: {0}")]
    Disc(#[from] DiscError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Save state serialization failed: {0}")]
    SaveStateEncode(String),

    #[error("Save state deserialization failed: {0}")]
    SaveStateDecode(String),

    #[error("Incompatible save state version: {got} (expected {expected})")]
    SaveStateVersion { expected: u32, got: u32 },
}

/// Disc-image-specific error types
#[derive(Error, Debug)]
pub enum DiscError {
    #[error("Unsupported disc image format: {0}")]
    UnsupportedFormat(String),

    #[error("Cue sheet error: {0}")]
    CueParse(String),

    #[error("Read of {length} bytes at offset {offset} is out of bounds")]
    OutOfBounds { offset: u64, length: usize },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
