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

//! Register window protocol tests: address latch, sub-register mapping,
//! and the host-visible mode register

use super::super::*;
use super::{read_reg, write_reg};

#[test]
fn test_address_latch_masked_to_4_bits() {
    let mut cdc = Cdc::new();
    cdc.set_register_address(0x73);
    assert_eq!(cdc.register_address(), 0x03);
}

#[test]
fn test_address_advances_after_read() {
    let mut cdc = Cdc::new();
    cdc.set_register_address(2);
    cdc.read_register();
    assert_eq!(cdc.register_address(), 3);
}

#[test]
fn test_address_advances_after_write() {
    let mut cdc = Cdc::new();
    cdc.set_register_address(2);
    cdc.write_register(0);
    assert_eq!(cdc.register_address(), 3);
}

#[test]
fn test_address_wraps_from_14_write() {
    // Address 14 is CTRL2 on the write side, a plain incrementing slot
    let mut cdc = Cdc::new();
    cdc.set_register_address(14);
    cdc.write_register(0);
    assert_eq!(cdc.register_address(), 15);
    cdc.read_register(); // STAT3
    assert_eq!(cdc.register_address(), 0);
}

#[test]
fn test_address_wrap_over_access_sequence() {
    // N plain accesses leave the latch at (initial + N) mod 16
    let mut cdc = Cdc::new();
    cdc.set_register_address(1);
    for _ in 0..12 {
        cdc.read_register();
    }
    assert_eq!(cdc.register_address(), 13);

    cdc.set_register_address(10);
    for _ in 0..4 {
        cdc.write_register(0); // CTRL0, CTRL1, PTL, PTH
    }
    assert_eq!(cdc.register_address(), 14);
}

#[test]
fn test_comin_read_does_not_advance() {
    let mut cdc = Cdc::new();
    cdc.set_register_address(0);
    assert_eq!(cdc.read_register(), 0xFF);
    assert_eq!(cdc.register_address(), 0);
}

#[test]
fn test_sbout_write_does_not_advance() {
    let mut cdc = Cdc::new();
    cdc.set_register_address(0);
    cdc.write_register(0x42);
    assert_eq!(cdc.register_address(), 0);
    assert_eq!(cdc.status.len(), 1);
}

#[test]
fn test_stat3_read_forces_address_to_zero() {
    let mut cdc = Cdc::new();
    cdc.set_register_address(15);
    cdc.read_register();
    assert_eq!(cdc.register_address(), 0);
}

#[test]
fn test_reset_write_forces_address_to_zero() {
    let mut cdc = Cdc::new();
    cdc.set_register_address(15);
    cdc.write_register(0);
    assert_eq!(cdc.register_address(), 0);
}

#[test]
fn test_dbc_write_read_round_trip() {
    let mut cdc = Cdc::new();
    write_reg(&mut cdc, 2, 0x34); // DBCL
    write_reg(&mut cdc, 3, 0x12); // DBCH

    // Top nibble of DBCH is not stored; DBC is 12 bits wide
    assert_eq!(cdc.transfer.length, 0x234);
    assert_eq!(read_reg(&mut cdc, 2), 0x34);
    assert_eq!(read_reg(&mut cdc, 3), 0x02);
}

#[test]
fn test_dbch_top_nibble_masked() {
    let mut cdc = Cdc::new();
    write_reg(&mut cdc, 3, 0xFF);
    assert_eq!(cdc.transfer.length, 0x0F00);
}

#[test]
fn test_dac_write_masked_to_buffer_window() {
    let mut cdc = Cdc::new();
    write_reg(&mut cdc, 4, 0xFF); // DACL
    write_reg(&mut cdc, 5, 0xFF); // DACH
    assert_eq!(cdc.transfer.source, 0x3FFF);
}

#[test]
fn test_write_address_readback() {
    // WA is written at 8/9 and read back at 10/11
    let mut cdc = Cdc::new();
    write_reg(&mut cdc, 8, 0x50); // WAL
    write_reg(&mut cdc, 9, 0x12); // WAH

    assert_eq!(read_reg(&mut cdc, 10), 0x50);
    assert_eq!(read_reg(&mut cdc, 11), 0x12);
}

#[test]
fn test_block_pointer_readback() {
    // PT is written at 12/13 and read back at 8/9
    let mut cdc = Cdc::new();
    write_reg(&mut cdc, 12, 0x44); // PTL
    write_reg(&mut cdc, 13, 0x23); // PTH

    assert_eq!(read_reg(&mut cdc, 8), 0x44);
    assert_eq!(read_reg(&mut cdc, 9), 0x23);
}

#[test]
fn test_ifstat_idle() {
    // All flags are active low: an idle chip reads back all-ones in the
    // modeled bits (STEN/DTEN, STBSY/DTBSY, CMDI, DECI, DTEI)
    let mut cdc = Cdc::new();
    assert_eq!(read_reg(&mut cdc, 1), 0x7F);
}

#[test]
fn test_ifstat_reflects_pending_decoder_interrupt() {
    let mut cdc = Cdc::new();
    write_reg(&mut cdc, 10, 0x80); // CTRL0: DECEN
    cdc.decode_sector(0);

    // Bit 5 (DECI) drops while the decoder source pends
    assert_eq!(read_reg(&mut cdc, 1) & 0x20, 0);
}

#[test]
fn test_stat0_reports_crc_ok() {
    let mut cdc = Cdc::new();
    assert_eq!(read_reg(&mut cdc, 12), 0x80);
    assert_eq!(read_reg(&mut cdc, 13), 0x00);
}

#[test]
fn test_stat2_reports_latched_mode_and_form() {
    let mut cdc = Cdc::new();

    write_reg(&mut cdc, 11, 0x08); // CTRL1: MODRQ
    assert_eq!(read_reg(&mut cdc, 14), 0x08);

    // FORMRQ alone is not honored without AUTORQ
    write_reg(&mut cdc, 11, 0x0C); // CTRL1: MODRQ | FORMRQ
    assert_eq!(read_reg(&mut cdc, 14), 0x08);

    write_reg(&mut cdc, 10, 0x10); // CTRL0: AUTORQ
    assert_eq!(read_reg(&mut cdc, 14), 0x0C);
}

#[test]
fn test_stat3_valid_latch() {
    let mut cdc = Cdc::new();
    write_reg(&mut cdc, 10, 0x80); // CTRL0: DECEN

    // No decoded sector yet: !VALST reads high
    assert_eq!(read_reg(&mut cdc, 15) & 0x80, 0x80);

    cdc.decode_sector(0);
    assert_eq!(read_reg(&mut cdc, 15) & 0x80, 0);

    // Reading STAT3 cleared the latch
    assert_eq!(read_reg(&mut cdc, 15) & 0x80, 0x80);
}

#[test]
fn test_head_reads_return_bcd_header() {
    let mut cdc = Cdc::new();
    write_reg(&mut cdc, 10, 0x80); // CTRL0: DECEN
    cdc.decode_sector(150);

    cdc.set_register_address(4);
    assert_eq!(cdc.read_register(), 0x00); // HEAD0: minute
    assert_eq!(cdc.read_register(), 0x04); // HEAD1: second
    assert_eq!(cdc.read_register(), 0x00); // HEAD2: frame
    assert_eq!(cdc.read_register(), 0x01); // HEAD3: mode
}

#[test]
fn test_head_reads_in_subheader_mode_float() {
    let mut cdc = Cdc::new();
    write_reg(&mut cdc, 10, 0x80); // CTRL0: DECEN
    write_reg(&mut cdc, 11, 0x01); // CTRL1: SHDREN
    cdc.decode_sector(0);

    assert_eq!(read_reg(&mut cdc, 4), 0xFF);
    assert_eq!(read_reg(&mut cdc, 7), 0xFF);
}

#[test]
fn test_host_mode_register_packing() {
    let mut cdc = Cdc::new();
    cdc.write_host_mode(0x0703);

    assert_eq!(cdc.register_address(), 3);
    assert_eq!(cdc.read_host_mode(ScdCpu::Sub), 0x0703);
    // Main CPU sees only the destination byte
    assert_eq!(cdc.read_host_mode(ScdCpu::Main), 0x0700);
}

#[test]
fn test_host_mode_destination_masked_to_3_bits() {
    let mut cdc = Cdc::new();
    cdc.write_host_mode(0xFF05);
    assert_eq!(cdc.read_host_mode(ScdCpu::Sub), 0x0705);
}

#[test]
fn test_host_mode_tracks_address_latch() {
    let mut cdc = Cdc::new();
    cdc.set_register_address(2);
    cdc.read_register();

    assert_eq!(cdc.read_host_mode(ScdCpu::Sub) & 0x0F, 3);
}

#[test]
fn test_read_register_enum_mapping() {
    assert_eq!(ReadRegister::from_address(0), ReadRegister::Comin);
    assert_eq!(ReadRegister::from_address(12), ReadRegister::Stat0);
    assert_eq!(ReadRegister::from_address(15), ReadRegister::Stat3);
    assert_eq!(ReadRegister::from_address(16), ReadRegister::Comin);
}

#[test]
fn test_write_register_enum_mapping() {
    assert_eq!(WriteRegister::from_address(0), WriteRegister::Sbout);
    assert_eq!(WriteRegister::from_address(6), WriteRegister::Dttrg);
    assert_eq!(WriteRegister::from_address(15), WriteRegister::Reset);
    assert_eq!(WriteRegister::from_address(21), WriteRegister::Dach);
}
