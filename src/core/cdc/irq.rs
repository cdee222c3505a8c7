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

//! CDC interrupt aggregation
//!
//! The chip has three interrupt sources: the sector decoder (DECI), the
//! transfer engine (DTEI) and the command FIFO (CMDI). Each source carries
//! an enable and a pending bit; the single host-visible interrupt line is
//! asserted iff any source has both set.
//!
//! The command source is wired but permanently disabled: this chip revision
//! exposes no host-accessible enable bit for it.

use bincode::{Decode, Encode};
use serde::{Deserialize, Serialize};

/// One interrupt source (enable + pending pair)
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, Encode, Decode)]
pub struct IrqSource {
    pub enable: bool,
    pub pending: bool,
}

impl IrqSource {
    /// True when this source is driving the aggregate line
    pub fn asserted(self) -> bool {
        self.enable && self.pending
    }
}

/// All CDC interrupt sources
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, Encode, Decode)]
pub struct InterruptState {
    /// DECI: a sector finished decoding
    pub decoder: IrqSource,

    /// DTEI: a data transfer reached its end
    pub transfer: IrqSource,

    /// CMDI: command byte available (never enabled, see module docs)
    pub command: IrqSource,
}

impl InterruptState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Aggregate interrupt line level
    ///
    /// The command source participates in the OR for completeness, but its
    /// enable bit is never set by any register write.
    pub fn pending(&self) -> bool {
        self.decoder.asserted() || self.transfer.asserted() || self.command.asserted()
    }

    /// Clear all pending bits, leaving enables untouched
    pub fn acknowledge_all(&mut self) {
        self.decoder.pending = false;
        self.transfer.pending = false;
        self.command.pending = false;
    }

    /// Reinitialize to power-on defaults
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
