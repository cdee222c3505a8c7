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

//! LC8951 CD controller (CDC) emulation
//!
//! The CDC sits between the disc drive's raw sector stream and the two host
//! CPUs of the Sega CD. It owns a 16 KB buffer RAM, decodes incoming sectors
//! into it, and streams the decoded data back out through a register-mapped
//! FIFO/DMA interface:
//!
//! - a 4-bit auto-incrementing address latch selecting one of 16 read and
//!   16 write sub-registers ([`registers`]),
//! - a sector decoder turning logical block numbers into BCD timecode
//!   headers and buffer writes ([`decoder`]),
//! - a transfer engine streaming words to word RAM, program RAM, PCM wave
//!   RAM or the host read ports ([`transfer`]),
//! - an interrupt aggregator combining the decoder and transfer-end
//!   sources into one host line ([`irq`]).
//!
//! The chip is cooperatively stepped: the owning emulator calls
//! [`Cdc::decode_sector`] once per sector boundary, [`Cdc::step`] at its
//! timer cadence, and [`Cdc::dma`] whenever the bus grants a DMA slot.
//! Register access from either CPU may interleave with those calls but
//! never runs concurrently with them; the whole chip is a single mutable
//! value with no hidden statics.
//!
//! # Example
//!
//! ```
//! use lc8951::core::cdc::Cdc;
//!
//! let mut cdc = Cdc::new();
//!
//! // IFCTRL: enable both interrupt sources and data output
//! cdc.set_register_address(1);
//! cdc.write_register(0x62);
//!
//! // CTRL0: DECEN | WRRQ, then decode a sector
//! cdc.set_register_address(10);
//! cdc.write_register(0x84);
//! cdc.decode_sector(0);
//!
//! assert!(cdc.poll_interrupt());
//! ```

use bincode::{Decode, Encode};
use serde::{Deserialize, Serialize};

pub mod decoder;
pub mod fifo;
pub mod irq;
pub mod ports;
pub mod registers;
pub mod transfer;

pub use decoder::{bcd_to_dec, dec_to_bcd, msf_from_lba, BYTES_PER_SECTOR, PAYLOAD_LEN};
pub use fifo::HostFifo;
pub use irq::{InterruptState, IrqSource};
pub use ports::DmaPorts;
pub use registers::{Ctrl0, Ctrl1, IfCtrl, ReadRegister, WriteRegister};
pub use transfer::{DeviceDestination, TransferEngine};

use crate::core::disc::DiscImage;
use crate::core::error::Result;
use transfer::DMA_ADDRESS_MASK;

/// Bytes of CDC-private buffer RAM
pub const BUFFER_RAM_LEN: usize = 16 * 1024;

/// Mask for the 14-bit buffer RAM address window
pub const BUFFER_RAM_MASK: u16 = (BUFFER_RAM_LEN - 1) as u16;

/// Mask for the 12-bit free-running stopwatch counter
const STOPWATCH_MASK: u32 = 0x0FFF;

/// Which of the two host CPUs is accessing the chip
///
/// Both CPUs observe the same chip through their own register windows; the
/// canonical state lives here and is published to both images.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScdCpu {
    Main,
    Sub,
}

/// Bitfields latched from CTRL0/CTRL1/IFCTRL writes
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, Encode, Decode)]
pub struct ControlState {
    /// SHDREN: HEAD registers read sub-header data (unsupported mode)
    pub head: bool,
    /// MODRQ: requested decode mode
    pub mode: bool,
    /// FORMRQ: requested sector form
    pub form: bool,
    /// AUTORQ: automatic mode/form selection
    pub auto_correction: bool,
    /// ERAMRQ: error-RAM correction
    pub error_correction: bool,
    /// WRRQ: decoded sectors are written into buffer RAM
    pub write_request: bool,
    /// CMDBK: command break
    pub command_break: bool,
    /// SYIEN: sync insertion interrupt
    pub sync_interrupt: bool,
    /// SYDEN: sync detection
    pub sync_detection: bool,
    /// DSCREN: descramble
    pub descramble: bool,
    /// STWAI: status transfer wait
    pub status_wait: bool,
    /// SOUTEN: status output enable
    pub status_output: bool,
}

/// Decoder enable/mode/form plus the "valid status" latch
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, Encode, Decode)]
pub struct DecoderState {
    /// DECEN: decoding enabled
    pub enable: bool,
    /// Latched mode, recomputed on every CTRL0/CTRL1 write
    pub mode: bool,
    /// Latched form, recomputed on every CTRL0/CTRL1 write
    pub form: bool,
    /// VALST latch: set by a successful decode, cleared by a STAT3 read
    pub valid: bool,
}

/// Current sector's addressed timecode and type
///
/// Minute/second/frame are BCD; `mode` is 0 for audio sectors and 1 for
/// Mode-1 data sectors.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, Encode, Decode)]
pub struct HeaderState {
    pub minute: u8,
    pub second: u8,
    pub frame: u8,
    pub mode: u8,
}

/// Published register images for both host CPUs
///
/// One canonical value, one publish step: the mirrors are never
/// independently authoritative. The main CPU's mode image is byte-wide
/// (only the high byte of the 16-bit mode register is visible there).
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, Encode, Decode)]
struct HostMirrors {
    main_mode: u8,
    sub_mode: u16,
    main_stopwatch: u16,
    sub_stopwatch: u16,
}

/// The CDC chip: register file, decoder, transfer engine and buffer RAM
pub struct Cdc {
    /// 16 KB buffer RAM, the only memory the chip itself owns
    ram: Box<[u8; BUFFER_RAM_LEN]>,

    /// 4-bit register address latch
    address: u8,

    control: ControlState,
    decoder: DecoderState,
    header: HeaderState,
    transfer: TransferEngine,
    irq: InterruptState,

    /// COMIN command FIFO (stub: never filled)
    command: HostFifo,

    /// SBOUT status FIFO (stub: filled, never drained)
    status: HostFifo,

    /// 12-bit free-running counter, bumped once per `step` tick
    stopwatch: u16,

    mirrors: HostMirrors,

    /// Current level of the host interrupt line
    irq_line: bool,

    /// Sub-header HEAD reads are reported once, not per access
    head_mode_warned: bool,

    /// Loaded disc image (if any)
    disc: Option<DiscImage>,
}

impl Cdc {
    /// Create a new CDC in its power-on state with no disc loaded
    pub fn new() -> Self {
        Self {
            ram: vec![0; BUFFER_RAM_LEN]
                .into_boxed_slice()
                .try_into()
                .expect("buffer RAM allocation has a fixed length"),
            address: 0,
            control: ControlState::default(),
            decoder: DecoderState::default(),
            header: HeaderState::default(),
            transfer: TransferEngine::new(),
            irq: InterruptState::new(),
            command: HostFifo::new(),
            status: HostFifo::new(),
            stopwatch: 0,
            mirrors: HostMirrors::default(),
            irq_line: false,
            head_mode_warned: false,
            disc: None,
        }
    }

    /// System-level reset: reinitialize everything, including buffer RAM,
    /// the FIFOs and the stopwatch
    ///
    /// The register RESET write slot is narrower; it leaves RAM and the
    /// stopwatch alone.
    pub fn reset(&mut self) {
        log::debug!("CDC: full reset");

        self.ram.fill(0);
        self.address = 0;
        self.control = ControlState::default();
        self.decoder = DecoderState::default();
        self.header = HeaderState::default();
        self.transfer.reset();
        self.irq.reset();
        self.command.reset();
        self.status.reset();
        self.stopwatch = 0;
        self.irq_line = false;
        self.head_mode_warned = false;
        self.publish_mode();
        self.publish_stopwatch();
    }

    /// Load a disc image (`.cue` or `.iso`) for the decoder to read from
    pub fn load_disc(&mut self, path: &str) -> Result<()> {
        let disc = DiscImage::load(path)?;
        self.disc = Some(disc);
        log::info!("Disc loaded successfully");
        Ok(())
    }

    /// Insert an already-constructed disc image
    pub fn insert_disc(&mut self, disc: DiscImage) {
        self.disc = Some(disc);
    }

    /// Check if a disc image is loaded
    pub fn has_disc(&self) -> bool {
        self.disc.is_some()
    }

    /// Advance chip-internal timers by `ticks` stopwatch ticks
    ///
    /// The stopwatch runs at roughly 32.55 kHz on hardware; the caller
    /// decides how emulated cycles map onto ticks.
    pub fn step(&mut self, ticks: u32) {
        self.stopwatch = ((u32::from(self.stopwatch) + ticks) & STOPWATCH_MASK) as u16;
        self.publish_stopwatch();
    }

    /// Re-evaluate the aggregate interrupt line and return its level
    pub fn poll_interrupt(&mut self) -> bool {
        let level = self.irq.pending();
        if level != self.irq_line {
            if level {
                log::trace!("CDC: INT asserted");
            } else {
                log::trace!("CDC: INT deasserted");
            }
            self.irq_line = level;
        }
        level
    }

    /// Current level of the host interrupt line (no re-evaluation)
    pub fn interrupt_asserted(&self) -> bool {
        self.irq_line
    }

    /// Set the register address latch (odd-byte write to the mode register)
    pub fn set_register_address(&mut self, value: u8) {
        self.address = value & 0x0F;
        self.publish_mode();
    }

    /// Current value of the register address latch
    pub fn register_address(&self) -> u8 {
        self.address
    }

    /// Set the 3-bit device-destination code (high byte of a mode write)
    ///
    /// Changing the destination aborts any in-flight transfer.
    pub fn set_destination(&mut self, bits: u8) {
        let bits = bits & 0x07;
        if bits != self.transfer.destination {
            self.transfer.stop();
        }
        self.transfer.destination = bits;
        log::trace!("CDC: device destination set to {bits:03b}");
        self.publish_mode();
    }

    /// Word write to the mode register: destination in the high byte,
    /// register address latch in the low byte
    pub fn write_host_mode(&mut self, value: u16) {
        self.set_destination((value >> 8) as u8);
        self.set_register_address(value as u8);
    }

    /// Read a CPU's published image of the mode register
    ///
    /// The canonical value is `address | destination << 8 | ready << 14 |
    /// completed << 15`; the main CPU only sees its high byte.
    pub fn read_host_mode(&self, cpu: ScdCpu) -> u16 {
        match cpu {
            ScdCpu::Main => u16::from(self.mirrors.main_mode) << 8,
            ScdCpu::Sub => self.mirrors.sub_mode,
        }
    }

    /// Write the DMA address register: a 16-bit host value maps onto the
    /// 19-bit transfer address, left-shifted by 3
    pub fn write_dma_address(&mut self, value: u16) {
        self.transfer.address = (u32::from(value) << 3) & DMA_ADDRESS_MASK;
        log::trace!("CDC: DMA address set to {:05X}", self.transfer.address);
    }

    /// Read back the DMA address register (right-shifted by 3)
    pub fn read_dma_address(&self) -> u16 {
        (self.transfer.address >> 3) as u16
    }

    /// Read a CPU's published image of the stopwatch counter
    pub fn read_stopwatch(&self, cpu: ScdCpu) -> u16 {
        match cpu {
            ScdCpu::Main => self.mirrors.main_stopwatch,
            ScdCpu::Sub => self.mirrors.sub_stopwatch,
        }
    }

    /// Any write resets the stopwatch to 0
    pub fn write_stopwatch(&mut self, _value: u16) {
        self.stopwatch = 0;
        self.publish_stopwatch();
    }

    /// Read one word from the host data port
    ///
    /// Returns the floating-bus value `0xFFFF` while no transfer word is
    /// ready.
    pub fn read_host_data(&mut self) -> u16 {
        let word = self.transfer.host_read(&self.ram, &mut self.irq);
        self.publish_mode();
        self.poll_interrupt();
        word
    }

    /// Service one granted DMA slot
    ///
    /// Moves one word from buffer RAM to the current destination memory.
    /// No-op unless a transfer to a DMA destination is active.
    pub fn dma(&mut self, ports: &mut dyn DmaPorts) {
        self.transfer.dma(&self.ram, ports, &mut self.irq);
        self.publish_mode();
        self.poll_interrupt();
    }

    /// The current sector header: BCD minute/second/frame plus mode
    pub fn header(&self) -> [u8; 4] {
        [
            self.header.minute,
            self.header.second,
            self.header.frame,
            self.header.mode,
        ]
    }

    /// Borrow the buffer RAM (diagnostics and tests)
    pub fn buffer_ram(&self) -> &[u8; BUFFER_RAM_LEN] {
        &self.ram
    }

    /// Publish the mode register to both CPU images
    fn publish_mode(&mut self) {
        let mode = u16::from(self.address)
            | (u16::from(self.transfer.destination) << 8)
            | (u16::from(self.transfer.ready) << 14)
            | (u16::from(self.transfer.completed) << 15);

        self.mirrors.sub_mode = mode;
        self.mirrors.main_mode = (mode >> 8) as u8;
    }

    /// Publish the stopwatch counter to both CPU images
    fn publish_stopwatch(&mut self) {
        self.mirrors.main_stopwatch = self.stopwatch;
        self.mirrors.sub_stopwatch = self.stopwatch;
    }

    /// Capture the flat field image of the chip for a save state
    pub fn snapshot(&self) -> CdcSnapshot {
        CdcSnapshot {
            ram: self.ram.to_vec(),
            address: self.address,
            control: self.control,
            decoder: self.decoder,
            header: self.header,
            transfer: self.transfer.clone(),
            irq: self.irq,
            command: self.command,
            status: self.status,
            stopwatch: self.stopwatch,
            irq_line: self.irq_line,
        }
    }

    /// Restore the chip from a snapshot
    ///
    /// The loaded disc is external media and is not part of the snapshot;
    /// callers re-load it separately. Mirrors are republished from the
    /// canonical state.
    pub fn restore(&mut self, snapshot: &CdcSnapshot) {
        let len = snapshot.ram.len().min(BUFFER_RAM_LEN);
        self.ram[..len].copy_from_slice(&snapshot.ram[..len]);
        self.address = snapshot.address & 0x0F;
        self.control = snapshot.control;
        self.decoder = snapshot.decoder;
        self.header = snapshot.header;
        self.transfer = snapshot.transfer.clone();
        self.irq = snapshot.irq;
        self.command = snapshot.command;
        self.status = snapshot.status;
        self.stopwatch = snapshot.stopwatch & STOPWATCH_MASK as u16;
        self.irq_line = snapshot.irq_line;
        self.publish_mode();
        self.publish_stopwatch();
    }
}

impl Default for Cdc {
    fn default() -> Self {
        Self::new()
    }
}

/// Flat, serializable image of all CDC state
#[derive(Debug, Clone, Serialize, Deserialize, Encode, Decode)]
pub struct CdcSnapshot {
    pub ram: Vec<u8>,
    pub address: u8,
    pub control: ControlState,
    pub decoder: DecoderState,
    pub header: HeaderState,
    pub transfer: TransferEngine,
    pub irq: InterruptState,
    pub command: HostFifo,
    pub status: HostFifo,
    pub stopwatch: u16,
    pub irq_line: bool,
}
