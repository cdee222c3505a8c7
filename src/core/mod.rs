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

//! Core emulation components
//!
//! This module contains the CDC emulation core and its collaborators:
//! - CDC (LC8951 register file, sector decoder, transfer engine)
//! - Disc image container (BIN/CUE and ISO layouts)
//! - Save state serialization

pub mod cdc;
pub mod disc;
pub mod error;
pub mod save_state;

// Re-export commonly used types
pub use cdc::{Cdc, ScdCpu};
pub use disc::{DiscImage, Track, TrackType};
pub use error::{CdcError, DiscError, Result};
