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

//! CDC transfer engine (DMA + host read port)
//!
//! The transfer engine streams 16-bit words out of the 16 KB buffer RAM to
//! one of several destinations, selected by a 3-bit device-destination code:
//!
//! | Code | Destination                  | Path                    |
//! |------|------------------------------|-------------------------|
//! | 2    | Main-CPU host data register  | `host_read()`           |
//! | 3    | Sub-CPU host data register   | `host_read()`           |
//! | 4    | PCM wave RAM                 | `dma()` (byte-split)    |
//! | 5    | Program RAM                  | `dma()`                 |
//! | 7    | Word RAM                     | `dma()`                 |
//!
//! Codes 0, 1 and 6 are prohibited by the hardware; writing them is accepted
//! but transfers to them are no-ops (logged once per code).
//!
//! Transfer lifecycle: `Idle -> Active/Busy -> Completed -> Idle`, with
//! `Idle` reachable at any time via `stop()` (transfer output disabled) or a
//! register RESET.

use bincode::{Decode, Encode};
use serde::{Deserialize, Serialize};

use super::irq::InterruptState;
use super::ports::DmaPorts;
use super::{BUFFER_RAM_LEN, BUFFER_RAM_MASK};

/// Mask for the 19-bit external DMA address counter
pub(super) const DMA_ADDRESS_MASK: u32 = (1 << 19) - 1;

/// Mask for the 12-bit data byte counter (DBC)
pub(super) const BYTE_COUNTER_MASK: u16 = 0x0FFF;

/// Decoded device-destination code
///
/// Only valid codes decode; prohibited codes (0, 1, 6) stay raw in the
/// `destination` register field and simply never match a transfer path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceDestination {
    /// Main-CPU host data register (code 2)
    MainRead,
    /// Sub-CPU host data register (code 3)
    SubRead,
    /// PCM wave RAM write window (code 4)
    Pcm,
    /// Program RAM (code 5)
    PrgRam,
    /// Word RAM (code 7)
    WordRam,
}

impl DeviceDestination {
    /// Decode a 3-bit destination code, `None` for the prohibited codes
    pub fn from_bits(bits: u8) -> Option<Self> {
        match bits & 0x07 {
            0b010 => Some(Self::MainRead),
            0b011 => Some(Self::SubRead),
            0b100 => Some(Self::Pcm),
            0b101 => Some(Self::PrgRam),
            0b111 => Some(Self::WordRam),
            _ => None,
        }
    }

    /// True for destinations serviced by `dma()` rather than `host_read()`
    pub fn is_dma(self) -> bool {
        matches!(self, Self::Pcm | Self::PrgRam | Self::WordRam)
    }

    /// True for the two host-read destinations
    pub fn is_host_read(self) -> bool {
        matches!(self, Self::MainRead | Self::SubRead)
    }
}

/// Transfer engine state: DMA counters, flags, and destination routing
///
/// Field names follow the LC8951 datasheet registers they back:
/// `source` is DAC (data address counter), `target` is WA (write address),
/// `pointer` is PT (block pointer), `length` is DBC (data byte counter).
#[derive(Debug, Clone, Serialize, Deserialize, Encode, Decode)]
pub struct TransferEngine {
    /// 3-bit device-destination code (raw, including prohibited values)
    pub(super) destination: u8,

    /// 19-bit external DMA address counter
    pub(super) address: u32,

    /// DAC: buffer RAM read position for host reads and DMA
    pub(super) source: u16,

    /// WA: next decoder write address in buffer RAM
    pub(super) target: u16,

    /// PT: block pointer, base address of the current decoded block
    pub(super) pointer: u16,

    /// DBC: 12-bit byte counter, decremented by 2 per word moved
    pub(super) length: u16,

    /// DOUTEN: data output enabled (IFCTRL bit 1)
    pub(super) enable: bool,

    /// Transfer in progress
    pub(super) active: bool,

    /// Engine busy flag, mirrored into IFSTAT
    pub(super) busy: bool,

    /// DTWAI: data transfer wait (IFCTRL bit 3)
    pub(super) wait: bool,

    /// Word available on the host read port
    pub(super) ready: bool,

    /// EDT: end of data transfer
    pub(super) completed: bool,

    /// Bitmask of destination codes already reported as unsupported
    warned_destinations: u8,
}

impl TransferEngine {
    pub(super) fn new() -> Self {
        Self {
            destination: 0,
            address: 0,
            source: 0,
            target: 0,
            pointer: 0,
            length: 0,
            enable: false,
            active: false,
            busy: false,
            wait: false,
            ready: false,
            completed: false,
            warned_destinations: 0,
        }
    }

    /// Reinitialize to power-on defaults, aborting any active transfer
    pub(super) fn reset(&mut self) {
        *self = Self::new();
    }

    /// Decoded destination, `None` while a prohibited code is latched
    pub(super) fn device_destination(&self) -> Option<DeviceDestination> {
        DeviceDestination::from_bits(self.destination)
    }

    /// Begin a transfer (DTTRG write)
    ///
    /// No-op unless data output is enabled. The ready flag is raised only
    /// for the two host-read destinations; DMA destinations are serviced by
    /// subsequent `dma()` calls instead.
    pub(super) fn start(&mut self, irq: &mut InterruptState) {
        if !self.enable {
            log::trace!("CDC: DTTRG ignored, DOUTEN clear");
            return;
        }

        self.active = true;
        self.busy = true;
        self.ready = self
            .device_destination()
            .is_some_and(DeviceDestination::is_host_read);
        self.completed = false;
        irq.transfer.pending = false;

        log::debug!(
            "CDC: transfer started, destination={:03b}, DAC={:04X}, DBC={:03X}",
            self.destination,
            self.source,
            self.length
        );
    }

    /// Abort the current transfer without raising a completion interrupt
    ///
    /// Called when transfer output is disabled mid-flight (IFCTRL DOUTEN
    /// cleared) and by the register RESET path.
    pub(super) fn stop(&mut self) {
        if self.active {
            log::debug!("CDC: transfer aborted");
        }
        self.active = false;
        self.busy = false;
        self.ready = false;
    }

    /// Finish a transfer and raise the transfer-end interrupt source
    fn complete(&mut self, irq: &mut InterruptState) {
        self.active = false;
        self.busy = false;
        self.ready = false;
        self.completed = true;
        irq.transfer.pending = true;

        log::debug!("CDC: transfer complete, DAC={:04X}", self.source);
    }

    /// Read one big-endian word from the host data port
    ///
    /// Returns the floating-bus value `0xFFFF` without touching any state
    /// while no word is ready.
    pub(super) fn host_read(
        &mut self,
        ram: &[u8; BUFFER_RAM_LEN],
        irq: &mut InterruptState,
    ) -> u16 {
        if !self.ready {
            return 0xFFFF;
        }

        let msb = ram[usize::from(self.source & BUFFER_RAM_MASK)];
        let lsb = ram[usize::from((self.source + 1) & BUFFER_RAM_MASK)];
        let word = u16::from_be_bytes([msb, lsb]);

        self.source = (self.source + 2) & BUFFER_RAM_MASK;
        self.length = self.length.saturating_sub(2);
        if self.length == 0 {
            self.complete(irq);
        }

        log::trace!(
            "CDC: host data read {:04X}, DAC={:04X}, DBC={:03X}",
            word,
            self.source,
            self.length
        );

        word
    }

    /// Move one word to the current DMA destination
    ///
    /// No-op unless a transfer is active on a DMA destination. One call
    /// corresponds to one granted DMA slot on the owning bus.
    pub(super) fn dma(
        &mut self,
        ram: &[u8; BUFFER_RAM_LEN],
        ports: &mut dyn DmaPorts,
        irq: &mut InterruptState,
    ) {
        if !self.active {
            return;
        }

        let destination = match self.device_destination() {
            Some(dest) if dest.is_dma() => dest,
            Some(_) => return, // host-read transfer, not serviced here
            None => {
                self.warn_unsupported_destination();
                return;
            }
        };

        let msb = ram[usize::from(self.source & BUFFER_RAM_MASK)];
        let lsb = ram[usize::from((self.source + 1) & BUFFER_RAM_MASK)];
        let word = u16::from_be_bytes([msb, lsb]);

        match destination {
            DeviceDestination::WordRam => ports.write_word_ram(self.address, word),
            DeviceDestination::PrgRam => ports.write_prg_ram(self.address, word),
            DeviceDestination::Pcm => {
                // PCM takes two byte writes and advances the address at
                // double rate: +2 here plus the common +2 below.
                ports.write_pcm(self.address, msb);
                ports.write_pcm((self.address + 1) & DMA_ADDRESS_MASK, lsb);
                self.address = (self.address + 2) & DMA_ADDRESS_MASK;
            }
            _ => unreachable!("host-read destinations filtered above"),
        }

        self.source = (self.source + 2) & BUFFER_RAM_MASK;
        self.address = (self.address + 2) & DMA_ADDRESS_MASK;
        self.length = self.length.saturating_sub(2);
        if self.length == 0 {
            self.complete(irq);
        }
    }

    fn warn_unsupported_destination(&mut self) {
        let bit = 1u8 << (self.destination & 0x07);
        if self.warned_destinations & bit == 0 {
            self.warned_destinations |= bit;
            log::warn!(
                "CDC: DMA to unsupported destination {:03b} ignored",
                self.destination
            );
        }
    }
}
