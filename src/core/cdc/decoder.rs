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

//! Sector decoder pipeline
//!
//! Once per physical sector boundary the disc-drive stepper hands the CDC
//! the logical block number that just passed under the head. The decoder
//! converts it into a BCD timecode header, latches it into the HEAD
//! registers, and (when decoder writes are requested) commits header and
//! payload into the buffer RAM at addresses derived from the live transfer
//! state.
//!
//! # MSF Addressing
//!
//! Disc positions use MSF (Minute:Second:Frame) timecodes at 75 frames per
//! second, offset by the 2-second (150-frame) pregap: LBA 0 is 00:02:00.
//! The header stores each component in BCD.

use crate::core::disc::{DiscImage, DiscLayout};

use super::{Cdc, BUFFER_RAM_MASK};

/// Raw bytes in one CD sector (sync + header + data + error correction)
pub const BYTES_PER_SECTOR: u16 = 2352;

/// User payload bytes in a Mode-1 data sector
pub const PAYLOAD_LEN: usize = 2048;

/// 12-byte sync pattern opening every raw data sector
const SYNC_PATTERN: [u8; 12] = [
    0x00, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0x00,
];

/// Sync pattern plus the 4-byte block header preceding Mode-1 payload
const RAW_HEADER_LEN: u64 = 16;

impl Cdc {
    /// Decode the sector at `lba` into the header registers and buffer RAM
    ///
    /// Called once per physical sector boundary by the external disc-drive
    /// stepper. A negative `lba` is a priming tick: the timecode cadence
    /// advances but no payload exists yet, so only the header is committed.
    ///
    /// Does nothing while the decoder is disabled (CTRL0 DECEN clear).
    pub fn decode_sector(&mut self, lba: i32) {
        if !self.decoder.enable {
            return;
        }

        let (minute, second, frame) = msf_from_lba(lba);
        let audio = self.disc.as_ref().is_some_and(|disc| disc.is_audio(lba));

        self.header.minute = dec_to_bcd(minute);
        self.header.second = dec_to_bcd(second);
        self.header.frame = dec_to_bcd(frame);
        self.header.mode = u8::from(!audio);

        self.decoder.valid = true;
        self.irq.decoder.pending = true;
        self.poll_interrupt();

        log::trace!(
            "CDC: decoded sector {:02}:{:02}:{:02} mode={} (lba {})",
            minute,
            second,
            frame,
            self.header.mode,
            lba
        );

        if !self.control.write_request {
            // Header computed and latched, but not committed to RAM
            return;
        }

        self.transfer.pointer = self.transfer.pointer.wrapping_add(BYTES_PER_SECTOR) & BUFFER_RAM_MASK;
        self.transfer.target = self.transfer.target.wrapping_add(BYTES_PER_SECTOR) & BUFFER_RAM_MASK;

        let mut offset = self.transfer.pointer;
        for byte in [
            self.header.minute,
            self.header.second,
            self.header.frame,
            self.header.mode,
        ] {
            self.ram[usize::from(offset & BUFFER_RAM_MASK)] = byte;
            offset = (offset + 1) & BUFFER_RAM_MASK;
        }

        if lba < 0 {
            // Priming tick: no data behind this timecode yet
            return;
        }

        if self.header.mode == 1 {
            self.copy_payload(lba, offset);
        }
        // Audio sectors stream through the external audio path, never
        // through the buffer RAM.
    }

    /// Copy the 2048-byte user payload of a Mode-1 sector into buffer RAM
    ///
    /// BIN/CUE images carry raw sectors, so the payload sits behind the
    /// 16-byte sync + block header, which is validated best-effort: a
    /// mismatch is logged but the read proceeds, favoring software that
    /// probes marginal sectors over strict fidelity.
    fn copy_payload(&mut self, lba: i32, offset: u16) {
        let expected = self.header_bytes();
        let Some(disc) = self.disc.as_mut() else {
            log::warn!("CDC: decode of data sector {lba} with no disc loaded");
            return;
        };

        let mut payload = [0u8; PAYLOAD_LEN];
        let payload_start = match disc.layout() {
            DiscLayout::Iso => lba as u64 * PAYLOAD_LEN as u64,
            DiscLayout::BinCue { sector_size } => {
                let start = lba as u64 * u64::from(sector_size) + RAW_HEADER_LEN;
                validate_raw_header(disc, lba, start, &expected);
                start
            }
        };

        if let Err(err) = disc.read_bytes(payload_start, &mut payload) {
            log::warn!("CDC: payload read failed for sector {lba}: {err}");
            return;
        }

        let mut offset = offset;
        for byte in payload {
            self.ram[usize::from(offset)] = byte;
            offset = (offset + 1) & BUFFER_RAM_MASK;
        }
    }

    fn header_bytes(&self) -> [u8; 4] {
        [
            self.header.minute,
            self.header.second,
            self.header.frame,
            self.header.mode,
        ]
    }
}

/// Check the sync pattern and block header physically present in the image
///
/// `payload_start` points at the first user-data byte; the 12-byte sync
/// pattern and 4-byte block header sit immediately before it.
fn validate_raw_header(disc: &mut DiscImage, lba: i32, payload_start: u64, expected: &[u8; 4]) {
    let mut sync = [0u8; 12];
    let mut header = [0u8; 4];

    let sync_ok = disc
        .read_bytes(payload_start - RAW_HEADER_LEN, &mut sync)
        .is_ok()
        && sync == SYNC_PATTERN;
    if !sync_ok {
        log::warn!("CDC: sync pattern mismatch at sector {lba}");
    }

    let header_ok = disc.read_bytes(payload_start - 4, &mut header).is_ok() && header == *expected;
    if !header_ok {
        log::warn!(
            "CDC: block header mismatch at sector {lba}: image {header:02X?}, computed {expected:02X?}"
        );
    }
}

/// Convert an LBA to a decimal (minute, second, frame) timecode
///
/// Adds the standard 150-frame pregap: LBA 0 maps to 00:02:00.
pub fn msf_from_lba(lba: i32) -> (u8, u8, u8) {
    let total = (lba + 150).max(0);
    let minute = (total / 75 / 60) as u8;
    let second = ((total / 75) % 60) as u8;
    let frame = (total % 75) as u8;
    (minute, second, frame)
}

/// Convert decimal to BCD (Binary-Coded Decimal)
///
/// Each nibble of the result encodes one decimal digit: `dec_to_bcd(23)`
/// is `0x23`. Input must be 0-99.
#[inline]
pub fn dec_to_bcd(dec: u8) -> u8 {
    ((dec / 10) << 4) | (dec % 10)
}

/// Convert BCD (Binary-Coded Decimal) to decimal
#[inline]
pub fn bcd_to_dec(bcd: u8) -> u8 {
    (bcd >> 4) * 10 + (bcd & 0x0F)
}
