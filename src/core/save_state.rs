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

//! Save state serialization for the CDC
//!
//! Save states are serialized using bincode for efficient binary encoding.
//! The state includes:
//! - Metadata (timestamp, loaded image path, stopwatch ticks)
//! - The full controller snapshot (buffer RAM, register latch, decoder,
//!   transfer engine, interrupt sources, FIFOs, host mirrors)
//!
//! # Version Compatibility
//!
//! Save states include a version number to ensure compatibility.
//! Loading a save state with a different version will fail with an error.
//!
//! # Example
//!
//! ```no_run
//! use lc8951::core::save_state::SaveState;
//! use lc8951::core::Cdc;
//!
//! let mut cdc = Cdc::new();
//! // ... drive the controller ...
//!
//! let state = SaveState::from_cdc(&cdc, None);
//! state.save_to_file("cdc.state").unwrap();
//!
//! // Later: load and apply
//! let loaded = SaveState::load_from_file("cdc.state").unwrap();
//! loaded.apply(&mut cdc);
//! ```

use bincode::{config, Decode, Encode};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use crate::core::cdc::{Cdc, CdcSnapshot};
use crate::core::error::{CdcError, Result};

/// Save state version for compatibility checking
///
/// This version number should be incremented whenever the save state format
/// changes in a way that breaks backward compatibility.
pub const SAVE_STATE_VERSION: u32 = 1;

/// Complete controller save state
#[derive(Serialize, Deserialize, Encode, Decode)]
pub struct SaveState {
    /// Version number for compatibility checking
    pub version: u32,

    /// Save state metadata
    pub metadata: SaveStateMetadata,

    /// Controller snapshot
    pub cdc: CdcSnapshot,
}

/// Save state metadata
#[derive(Serialize, Deserialize, Encode, Decode)]
#[bincode(encode_bounds = "", decode_bounds = "")]
pub struct SaveStateMetadata {
    /// Timestamp when the save state was created
    #[bincode(with_serde)]
    pub timestamp: DateTime<Utc>,

    /// Path of the disc image that was loaded, if any
    ///
    /// The image itself is not serialized; callers reload it and
    /// re-insert before applying the snapshot.
    pub image_path: Option<String>,
}

impl SaveState {
    /// Create a new save state from the current controller state
    pub fn from_cdc(cdc: &Cdc, image_path: Option<&str>) -> Self {
        Self {
            version: SAVE_STATE_VERSION,
            metadata: SaveStateMetadata {
                timestamp: Utc::now(),
                image_path: image_path.map(String::from),
            },
            cdc: cdc.snapshot(),
        }
    }

    /// Apply this save state to a controller
    ///
    /// The disc image is not restored; load it separately before or after
    /// applying.
    pub fn apply(&self, cdc: &mut Cdc) {
        cdc.restore(&self.cdc);
    }

    /// Save state to file
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be created, serialization fails,
    /// or the write fails.
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let config = config::standard();
        let encoded = bincode::encode_to_vec(self, config)
            .map_err(|e| CdcError::SaveStateEncode(e.to_string()))?;
        let mut file = File::create(path)?;
        file.write_all(&encoded)?;
        Ok(())
    }

    /// Load state from file
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read, deserialization fails,
    /// or the version is incompatible.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut file = File::open(path)?;
        let mut buffer = Vec::new();
        file.read_to_end(&mut buffer)?;

        let config = config::standard();
        let (state, _): (SaveState, usize) = bincode::decode_from_slice(&buffer, config)
            .map_err(|e| CdcError::SaveStateDecode(e.to_string()))?;

        if state.version != SAVE_STATE_VERSION {
            return Err(CdcError::SaveStateVersion {
                expected: SAVE_STATE_VERSION,
                got: state.version,
            });
        }

        Ok(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::Builder;

    #[test]
    fn test_save_state_version() {
        assert_eq!(SAVE_STATE_VERSION, 1);
    }

    #[test]
    fn test_save_state_serialization() {
        let mut cdc = Cdc::new();
        cdc.set_register_address(3);
        cdc.step(0x123);

        let state = SaveState::from_cdc(&cdc, Some("game.cue"));

        let config = config::standard();
        let encoded = bincode::encode_to_vec(&state, config).unwrap();
        assert!(!encoded.is_empty());

        let (decoded, _): (SaveState, usize) =
            bincode::decode_from_slice(&encoded, config).unwrap();

        assert_eq!(decoded.version, SAVE_STATE_VERSION);
        assert_eq!(decoded.metadata.image_path.as_deref(), Some("game.cue"));
        assert_eq!(decoded.cdc.address, 3);
        assert_eq!(decoded.cdc.stopwatch, 0x123);
    }

    #[test]
    fn test_save_load_file() {
        let mut cdc = Cdc::new();
        cdc.set_register_address(7);

        let file = Builder::new().suffix(".state").tempfile().unwrap();
        let path = file.path();

        SaveState::from_cdc(&cdc, None).save_to_file(path).unwrap();
        let loaded = SaveState::load_from_file(path).unwrap();

        assert_eq!(loaded.version, SAVE_STATE_VERSION);
        assert_eq!(loaded.cdc.address, 7);

        let mut restored = Cdc::new();
        loaded.apply(&mut restored);
        assert_eq!(restored.register_address(), 7);
    }

    #[test]
    fn test_version_check() {
        let cdc = Cdc::new();
        let state = SaveState {
            version: 999,
            ..SaveState::from_cdc(&cdc, None)
        };

        let file = Builder::new().suffix(".state").tempfile().unwrap();
        let path = file.path();
        state.save_to_file(path).unwrap();

        let result = SaveState::load_from_file(path);
        assert!(matches!(
            result,
            Err(CdcError::SaveStateVersion {
                expected: SAVE_STATE_VERSION,
                got: 999
            })
        ));
    }
}
