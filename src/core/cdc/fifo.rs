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

//! Host command/status byte FIFOs
//!
//! The LC8951 carries two 8-entry byte queues between the host and the
//! drive-side microcontroller: COMIN (host -> chip commands) and SBOUT
//! (chip -> host status bytes). On the Sega CD this path is unused, and the
//! emulated chip preserves that: COMIN reads float high and SBOUT bytes are
//! accepted into the ring but never consumed. The ring bookkeeping is kept
//! so the state survives save/restore unchanged.

use bincode::{Decode, Encode};
use serde::{Deserialize, Serialize};

const FIFO_LEN: usize = 8;

/// 8-entry byte ring used by the COMIN and SBOUT register slots
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Encode, Decode)]
pub struct HostFifo {
    bytes: [u8; FIFO_LEN],
    read: u8,
    write: u8,
    empty: bool,
}

impl HostFifo {
    pub fn new() -> Self {
        Self {
            bytes: [0; FIFO_LEN],
            read: 0,
            write: 0,
            empty: true,
        }
    }

    /// Append a byte, overwriting the oldest entry when full
    pub fn push(&mut self, value: u8) {
        if !self.empty && self.read == self.write {
            // Full: hardware keeps writing, the oldest byte is lost
            self.read = (self.read + 1) % FIFO_LEN as u8;
        }
        self.bytes[usize::from(self.write)] = value;
        self.write = (self.write + 1) % FIFO_LEN as u8;
        self.empty = false;
    }

    /// Pop the oldest byte, or `None` when empty
    pub fn pop(&mut self) -> Option<u8> {
        if self.empty {
            return None;
        }
        let value = self.bytes[usize::from(self.read)];
        self.read = (self.read + 1) % FIFO_LEN as u8;
        self.empty = self.read == self.write;
        Some(value)
    }

    pub fn is_empty(&self) -> bool {
        self.empty
    }

    pub fn len(&self) -> usize {
        if self.empty {
            0
        } else if self.read < self.write {
            usize::from(self.write - self.read)
        } else {
            FIFO_LEN - usize::from(self.read) + usize::from(self.write)
        }
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }
}

impl Default for HostFifo {
    fn default() -> Self {
        Self::new()
    }
}
