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

//! CDC register window protocol
//!
//! All sub-register access goes through a single 4-bit address latch. One
//! latch value names different registers on the read and write sides:
//!
//! | Addr | Read  | Write |
//! |------|-------|-------|
//! | 0    | COMIN | SBOUT |
//! | 1    | IFSTAT| IFCTRL|
//! | 2    | DBCL  | DBCL  |
//! | 3    | DBCH  | DBCH  |
//! | 4    | HEAD0 | DACL  |
//! | 5    | HEAD1 | DACH  |
//! | 6    | HEAD2 | DTTRG |
//! | 7    | HEAD3 | DTACK |
//! | 8    | PTL   | WAL   |
//! | 9    | PTH   | WAH   |
//! | 10   | WAL   | CTRL0 |
//! | 11   | WAH   | CTRL1 |
//! | 12   | STAT0 | PTL   |
//! | 13   | STAT1 | PTH   |
//! | 14   | STAT2 | CTRL2 |
//! | 15   | STAT3 | RESET |
//!
//! The latch advances after every access, except that COMIN reads and
//! SBOUT writes leave it untouched, and a STAT3 read or RESET write forces
//! the next address to 0.

use bitflags::bitflags;

use super::{Cdc, BUFFER_RAM_MASK};
use crate::core::cdc::transfer::BYTE_COUNTER_MASK;

bitflags! {
    /// IFCTRL write image (host interface control)
    #[derive(Debug, Clone, Copy)]
    pub struct IfCtrl: u8 {
        /// Command interrupt enable (not wired in this chip revision)
        const CMDIEN = 1 << 7;
        /// Transfer-end interrupt enable
        const DTEIEN = 1 << 6;
        /// Decoder interrupt enable
        const DECIEN = 1 << 5;
        /// Command break
        const CMDBK = 1 << 4;
        /// Data transfer wait
        const DTWAI = 1 << 3;
        /// Status transfer wait
        const STWAI = 1 << 2;
        /// Data output enable
        const DOUTEN = 1 << 1;
        /// Status output enable
        const SOUTEN = 1 << 0;
    }

    /// CTRL0 write image (decoder control)
    #[derive(Debug, Clone, Copy)]
    pub struct Ctrl0: u8 {
        /// Decoder enable
        const DECEN = 1 << 7;
        /// EDC correction request
        const EDCRQ = 1 << 6;
        /// One-symbol correction request
        const E01RQ = 1 << 5;
        /// Automatic mode/form selection
        const AUTORQ = 1 << 4;
        /// Error-RAM correction request
        const ERAMRQ = 1 << 3;
        /// Buffer write request
        const WRRQ = 1 << 2;
        /// Q-parity correction request
        const QRQ = 1 << 1;
        /// P-parity correction request
        const PRQ = 1 << 0;
    }

    /// CTRL1 write image (decoder control)
    #[derive(Debug, Clone, Copy)]
    pub struct Ctrl1: u8 {
        /// Sync insertion interrupt enable
        const SYIEN = 1 << 7;
        /// Sync detection enable
        const SYDEN = 1 << 6;
        /// Descramble enable
        const DSCREN = 1 << 5;
        /// Correction write enable
        const COWREN = 1 << 4;
        /// Mode request
        const MODRQ = 1 << 3;
        /// Form request
        const FORMRQ = 1 << 2;
        /// Monitor block request
        const MBCKRQ = 1 << 1;
        /// Sub-header read enable
        const SHDREN = 1 << 0;
    }
}

/// Read-side register named by the current address latch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadRegister {
    Comin,
    Ifstat,
    Dbcl,
    Dbch,
    Head0,
    Head1,
    Head2,
    Head3,
    Ptl,
    Pth,
    Wal,
    Wah,
    Stat0,
    Stat1,
    Stat2,
    Stat3,
}

impl ReadRegister {
    pub fn from_address(address: u8) -> Self {
        match address & 0x0F {
            0 => Self::Comin,
            1 => Self::Ifstat,
            2 => Self::Dbcl,
            3 => Self::Dbch,
            4 => Self::Head0,
            5 => Self::Head1,
            6 => Self::Head2,
            7 => Self::Head3,
            8 => Self::Ptl,
            9 => Self::Pth,
            10 => Self::Wal,
            11 => Self::Wah,
            12 => Self::Stat0,
            13 => Self::Stat1,
            14 => Self::Stat2,
            _ => Self::Stat3,
        }
    }
}

/// Write-side register named by the current address latch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteRegister {
    Sbout,
    Ifctrl,
    Dbcl,
    Dbch,
    Dacl,
    Dach,
    Dttrg,
    Dtack,
    Wal,
    Wah,
    Ctrl0,
    Ctrl1,
    Ptl,
    Pth,
    Ctrl2,
    Reset,
}

impl WriteRegister {
    pub fn from_address(address: u8) -> Self {
        match address & 0x0F {
            0 => Self::Sbout,
            1 => Self::Ifctrl,
            2 => Self::Dbcl,
            3 => Self::Dbch,
            4 => Self::Dacl,
            5 => Self::Dach,
            6 => Self::Dttrg,
            7 => Self::Dtack,
            8 => Self::Wal,
            9 => Self::Wah,
            10 => Self::Ctrl0,
            11 => Self::Ctrl1,
            12 => Self::Ptl,
            13 => Self::Pth,
            14 => Self::Ctrl2,
            _ => Self::Reset,
        }
    }
}

impl Cdc {
    /// Read the sub-register named by the current address latch
    pub fn read_register(&mut self) -> u8 {
        let slot = ReadRegister::from_address(self.address);
        let value = match slot {
            ReadRegister::Comin => {
                // Command path is a stub on this board: the FIFO is never
                // filled, so reads float high and do not consume.
                log::trace!("CDC: COMIN read");
                0xFF
            }
            ReadRegister::Ifstat => self.read_ifstat(),
            ReadRegister::Dbcl => self.transfer.length as u8,
            ReadRegister::Dbch => (self.transfer.length >> 8) as u8,
            ReadRegister::Head0 => self.read_head(0),
            ReadRegister::Head1 => self.read_head(1),
            ReadRegister::Head2 => self.read_head(2),
            ReadRegister::Head3 => self.read_head(3),
            ReadRegister::Ptl => self.transfer.pointer as u8,
            ReadRegister::Pth => (self.transfer.pointer >> 8) as u8,
            ReadRegister::Wal => self.transfer.target as u8,
            ReadRegister::Wah => (self.transfer.target >> 8) as u8,
            // CRCOK set, error flags clear: decoded data is always intact
            ReadRegister::Stat0 => 0x80,
            ReadRegister::Stat1 => 0x00,
            ReadRegister::Stat2 => {
                (u8::from(self.decoder.mode) << 3) | (u8::from(self.decoder.form) << 2)
            }
            ReadRegister::Stat3 => self.read_stat3(),
        };

        self.address = match slot {
            ReadRegister::Comin => self.address,
            ReadRegister::Stat3 => 0,
            _ => (self.address + 1) & 0x0F,
        };
        self.publish_mode();

        value
    }

    /// Write the sub-register named by the current address latch
    pub fn write_register(&mut self, value: u8) {
        let slot = WriteRegister::from_address(self.address);
        log::trace!("CDC: {slot:?} write {value:02X}");

        match slot {
            WriteRegister::Sbout => {
                // Accepted but never drained by anything (stubbed path)
                self.status.push(value);
            }
            WriteRegister::Ifctrl => self.write_ifctrl(value),
            WriteRegister::Dbcl => {
                self.transfer.length = (self.transfer.length & 0xFF00) | u16::from(value);
            }
            WriteRegister::Dbch => {
                // DBC is a 12-bit counter; the top nibble is not stored
                self.transfer.length =
                    (self.transfer.length & 0x00FF) | (u16::from(value & 0x0F) << 8);
            }
            WriteRegister::Dacl => {
                self.transfer.source =
                    ((self.transfer.source & 0xFF00) | u16::from(value)) & BUFFER_RAM_MASK;
            }
            WriteRegister::Dach => {
                self.transfer.source =
                    ((self.transfer.source & 0x00FF) | (u16::from(value) << 8)) & BUFFER_RAM_MASK;
            }
            WriteRegister::Dttrg => self.transfer.start(&mut self.irq),
            WriteRegister::Dtack => {
                self.irq.transfer.pending = false;
                self.transfer.length &= BYTE_COUNTER_MASK >> 4;
            }
            WriteRegister::Wal => {
                self.transfer.target =
                    ((self.transfer.target & 0xFF00) | u16::from(value)) & BUFFER_RAM_MASK;
            }
            WriteRegister::Wah => {
                self.transfer.target =
                    ((self.transfer.target & 0x00FF) | (u16::from(value) << 8)) & BUFFER_RAM_MASK;
            }
            WriteRegister::Ctrl0 => self.write_ctrl0(value),
            WriteRegister::Ctrl1 => self.write_ctrl1(value),
            WriteRegister::Ptl => {
                self.transfer.pointer =
                    ((self.transfer.pointer & 0xFF00) | u16::from(value)) & BUFFER_RAM_MASK;
            }
            WriteRegister::Pth => {
                self.transfer.pointer =
                    ((self.transfer.pointer & 0x00FF) | (u16::from(value) << 8)) & BUFFER_RAM_MASK;
            }
            WriteRegister::Ctrl2 => {
                // No modeled behavior behind CTRL2
            }
            WriteRegister::Reset => self.register_reset(),
        }

        self.address = match slot {
            WriteRegister::Sbout => self.address,
            WriteRegister::Reset => 0,
            _ => (self.address + 1) & 0x0F,
        };
        self.publish_mode();
        self.poll_interrupt();
    }

    /// IFSTAT: host interface status, all flags active low
    ///
    /// Bits 0/1 report the transfer-active state (STEN/DTEN), bits 2/3 the
    /// engine busy state (STBSY/DTBSY); with the status FIFO stubbed there
    /// is no separate status-side activity to report. Bit 4 (CMDI) stays
    /// high because the command source never pends.
    fn read_ifstat(&self) -> u8 {
        let mut value = 0x10;
        if !self.transfer.active {
            value |= 0x03;
        }
        if !self.transfer.busy {
            value |= 0x0C;
        }
        if !self.irq.decoder.pending {
            value |= 0x20;
        }
        if !self.irq.transfer.pending {
            value |= 0x40;
        }
        value
    }

    fn read_head(&mut self, index: usize) -> u8 {
        if self.control.head {
            // Sub-header read mode is not implemented; answer with a
            // floating value rather than guessing a subheader layout.
            if !self.head_mode_warned {
                self.head_mode_warned = true;
                log::warn!("CDC: HEAD read in sub-header mode (SHDREN) is unsupported");
            }
            return 0xFF;
        }

        [
            self.header.minute,
            self.header.second,
            self.header.frame,
            self.header.mode,
        ][index]
    }

    /// STAT3: VALST in bit 7 (active low), then clear the valid latch and
    /// the pending decoder interrupt
    fn read_stat3(&mut self) -> u8 {
        let value = u8::from(!self.decoder.valid) << 7;
        self.decoder.valid = false;
        self.irq.decoder.pending = false;
        self.poll_interrupt();
        value
    }

    fn write_ifctrl(&mut self, value: u8) {
        let flags = IfCtrl::from_bits_retain(value);

        // CMDIEN is accepted but not wired: no host-accessible enable
        // exists for the command source in this chip revision.
        self.irq.transfer.enable = flags.contains(IfCtrl::DTEIEN);
        self.irq.decoder.enable = flags.contains(IfCtrl::DECIEN);
        self.control.command_break = flags.contains(IfCtrl::CMDBK);
        self.control.status_wait = flags.contains(IfCtrl::STWAI);
        self.control.status_output = flags.contains(IfCtrl::SOUTEN);
        self.transfer.wait = flags.contains(IfCtrl::DTWAI);

        self.transfer.enable = flags.contains(IfCtrl::DOUTEN);
        if !self.transfer.enable {
            // Disabling data output aborts any in-flight transfer
            self.transfer.stop();
        }
    }

    fn write_ctrl0(&mut self, value: u8) {
        let flags = Ctrl0::from_bits_retain(value);

        self.decoder.enable = flags.contains(Ctrl0::DECEN);
        self.control.auto_correction = flags.contains(Ctrl0::AUTORQ);
        self.control.error_correction = flags.contains(Ctrl0::ERAMRQ);
        self.control.write_request = flags.contains(Ctrl0::WRRQ);

        self.refresh_decoder_mode();
    }

    fn write_ctrl1(&mut self, value: u8) {
        let flags = Ctrl1::from_bits_retain(value);

        self.control.sync_interrupt = flags.contains(Ctrl1::SYIEN);
        self.control.sync_detection = flags.contains(Ctrl1::SYDEN);
        self.control.descramble = flags.contains(Ctrl1::DSCREN);
        self.control.mode = flags.contains(Ctrl1::MODRQ);
        self.control.form = flags.contains(Ctrl1::FORMRQ);
        self.control.head = flags.contains(Ctrl1::SHDREN);

        self.refresh_decoder_mode();
    }

    /// Recompute the decoder's latched mode/form from the control bits
    ///
    /// AUTORQ gates whether the requested form is honored.
    fn refresh_decoder_mode(&mut self) {
        self.decoder.mode = self.control.mode;
        self.decoder.form = self.control.form && self.control.auto_correction;
    }

    /// RESET write slot: reinitialize every sub-state to power-on defaults
    ///
    /// Buffer RAM and the stopwatch are untouched; only a full system reset
    /// clears those.
    fn register_reset(&mut self) {
        log::debug!("CDC: register RESET");

        self.control = Default::default();
        self.decoder = Default::default();
        self.header = Default::default();
        self.transfer.reset();
        self.irq.reset();
        self.command.reset();
        self.status.reset();
        self.head_mode_warned = false;
    }
}
