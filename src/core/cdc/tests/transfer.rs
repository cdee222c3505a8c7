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

//! Transfer engine tests: host data reads, DMA dispatch, address counters

use super::super::*;
use super::{arm_transfer, write_reg, RecordingPorts};

/// Seed the start of buffer RAM with an incrementing byte pattern
fn seed_ram(cdc: &mut Cdc, len: usize) {
    for (i, byte) in cdc.ram[..len].iter_mut().enumerate() {
        *byte = i as u8;
    }
}

#[test]
fn test_trigger_ignored_without_output_enable() {
    let mut cdc = Cdc::new();
    cdc.set_destination(3);
    write_reg(&mut cdc, 6, 0); // DTTRG with DOUTEN clear

    assert!(!cdc.transfer.active);
    assert!(!cdc.transfer.ready);
}

#[test]
fn test_host_read_floats_until_ready() {
    let mut cdc = Cdc::new();
    seed_ram(&mut cdc, 16);

    assert_eq!(cdc.read_host_data(), 0xFFFF);
    // A not-ready read must not touch the counters
    assert_eq!(cdc.transfer.source, 0);
    assert_eq!(cdc.transfer.length, 0);
}

#[test]
fn test_host_read_returns_big_endian_words() {
    let mut cdc = Cdc::new();
    seed_ram(&mut cdc, 16);
    arm_transfer(&mut cdc, 3, 0, 4);

    assert!(cdc.transfer.ready);
    assert_eq!(cdc.read_host_data(), 0x0001);
    assert_eq!(cdc.read_host_data(), 0x0203);
}

#[test]
fn test_host_read_completes_at_zero_length() {
    let mut cdc = Cdc::new();
    seed_ram(&mut cdc, 16);
    arm_transfer(&mut cdc, 3, 0, 4);

    cdc.read_host_data();
    cdc.read_host_data();

    assert!(cdc.transfer.completed);
    assert!(!cdc.transfer.active);
    assert!(!cdc.transfer.ready);
    assert!(cdc.irq.transfer.pending);

    // Completed and not-ready both visible in the mode register
    let mode = cdc.read_host_mode(ScdCpu::Sub);
    assert_eq!(mode & 0x8000, 0x8000);
    assert_eq!(mode & 0x4000, 0);

    // Further reads float
    assert_eq!(cdc.read_host_data(), 0xFFFF);
}

#[test]
fn test_host_read_ready_flag_in_mode_register() {
    let mut cdc = Cdc::new();
    arm_transfer(&mut cdc, 2, 0, 8);

    assert_eq!(cdc.read_host_mode(ScdCpu::Sub) & 0x4000, 0x4000);
    assert_eq!(cdc.read_host_mode(ScdCpu::Main) & 0x4000, 0x4000);
}

#[test]
fn test_host_read_source_wraps_buffer_window() {
    let mut cdc = Cdc::new();
    cdc.ram[0x3FFF] = 0xAB;
    cdc.ram[0x0000] = 0xCD;
    arm_transfer(&mut cdc, 3, 0x3FFF, 2);

    assert_eq!(cdc.read_host_data(), 0xABCD);
    assert_eq!(cdc.transfer.source, 1);
}

#[test]
fn test_dma_word_ram() {
    let mut cdc = Cdc::new();
    seed_ram(&mut cdc, 16);
    arm_transfer(&mut cdc, 7, 0, 8);
    cdc.write_dma_address(0x20); // 19-bit address 0x100

    let mut ports = RecordingPorts::default();
    for _ in 0..4 {
        cdc.dma(&mut ports);
    }

    assert_eq!(
        ports.word_ram,
        vec![
            (0x100, 0x0001),
            (0x102, 0x0203),
            (0x104, 0x0405),
            (0x106, 0x0607)
        ]
    );
    assert!(cdc.transfer.completed);
    assert!(cdc.irq.transfer.pending);
}

#[test]
fn test_dma_moves_exactly_length_bytes() {
    let mut cdc = Cdc::new();
    arm_transfer(&mut cdc, 7, 0, 6);

    let mut ports = RecordingPorts::default();
    for _ in 0..10 {
        cdc.dma(&mut ports);
    }

    // 6 bytes = 3 words; the extra grants after completion are no-ops
    assert_eq!(ports.word_ram.len(), 3);
}

#[test]
fn test_dma_prg_ram() {
    let mut cdc = Cdc::new();
    seed_ram(&mut cdc, 4);
    arm_transfer(&mut cdc, 5, 0, 2);

    let mut ports = RecordingPorts::default();
    cdc.dma(&mut ports);

    assert_eq!(ports.prg_ram, vec![(0, 0x0001)]);
    assert!(ports.word_ram.is_empty());
}

#[test]
fn test_dma_pcm_splits_bytes_at_double_address_rate() {
    let mut cdc = Cdc::new();
    seed_ram(&mut cdc, 8);
    arm_transfer(&mut cdc, 4, 0, 4);

    let mut ports = RecordingPorts::default();
    cdc.dma(&mut ports);
    cdc.dma(&mut ports);

    // One word becomes two byte writes; the address then skips ahead so
    // consecutive words land 4 apart
    assert_eq!(ports.pcm, vec![(0, 0x00), (1, 0x01), (4, 0x02), (5, 0x03)]);
    assert_eq!(cdc.transfer.address, 8);
}

#[test]
fn test_dma_ignores_host_read_destinations() {
    let mut cdc = Cdc::new();
    arm_transfer(&mut cdc, 3, 0, 4);

    let mut ports = RecordingPorts::default();
    cdc.dma(&mut ports);

    assert_eq!(ports.total_writes(), 0);
    assert_eq!(cdc.transfer.length, 4);
    assert!(cdc.transfer.active);
}

#[test]
fn test_dma_prohibited_destination_is_dropped() {
    let mut cdc = Cdc::new();
    arm_transfer(&mut cdc, 6, 0, 4);

    let mut ports = RecordingPorts::default();
    cdc.dma(&mut ports);
    cdc.dma(&mut ports);

    assert_eq!(ports.total_writes(), 0);
    assert_eq!(cdc.transfer.length, 4);
}

#[test]
fn test_destination_change_aborts_transfer() {
    let mut cdc = Cdc::new();
    arm_transfer(&mut cdc, 7, 0, 8);
    assert!(cdc.transfer.active);

    cdc.set_destination(5);
    assert!(!cdc.transfer.active);

    // Re-latching the same destination is not a change
    cdc.set_destination(5);
    write_reg(&mut cdc, 6, 0); // DTTRG
    assert!(cdc.transfer.active);
    cdc.set_destination(5);
    assert!(cdc.transfer.active);
}

#[test]
fn test_output_disable_aborts_transfer() {
    let mut cdc = Cdc::new();
    arm_transfer(&mut cdc, 3, 0, 8);
    assert!(cdc.transfer.ready);

    write_reg(&mut cdc, 1, 0x00); // IFCTRL: DOUTEN cleared

    assert!(!cdc.transfer.active);
    assert!(!cdc.transfer.ready);
    assert!(!cdc.transfer.completed);
    assert!(!cdc.irq.transfer.pending);
}

#[test]
fn test_dma_address_register_round_trip() {
    let mut cdc = Cdc::new();

    cdc.write_dma_address(0x1234);
    assert_eq!(cdc.transfer.address, (0x1234 << 3) & 0x7FFFF);
    assert_eq!(cdc.read_dma_address(), 0x1234);

    // Top bits fall off the 19-bit counter
    cdc.write_dma_address(0xFFFF);
    assert_eq!(cdc.transfer.address, 0x7FFF8);
}

#[test]
fn test_dma_address_counter_wraps() {
    let mut cdc = Cdc::new();
    seed_ram(&mut cdc, 4);
    arm_transfer(&mut cdc, 7, 0, 4);
    cdc.write_dma_address(0xFFFF); // address 0x7FFF8

    let mut ports = RecordingPorts::default();
    cdc.dma(&mut ports);
    cdc.dma(&mut ports);

    assert_eq!(ports.word_ram, vec![(0x7FFF8, 0x0001), (0x7FFFA, 0x0203)]);
    assert!(cdc.transfer.completed);
}

#[test]
fn test_dtack_clears_transfer_interrupt() {
    let mut cdc = Cdc::new();
    arm_transfer(&mut cdc, 3, 0, 2);
    write_reg(&mut cdc, 1, 0x42); // IFCTRL: DTEIEN | DOUTEN
    cdc.read_host_data();

    assert!(cdc.irq.transfer.pending);
    assert!(cdc.poll_interrupt());

    write_reg(&mut cdc, 7, 0); // DTACK

    assert!(!cdc.irq.transfer.pending);
    assert!(!cdc.poll_interrupt());
}

#[test]
fn test_device_destination_decoding() {
    assert_eq!(DeviceDestination::from_bits(2), Some(DeviceDestination::MainRead));
    assert_eq!(DeviceDestination::from_bits(3), Some(DeviceDestination::SubRead));
    assert_eq!(DeviceDestination::from_bits(4), Some(DeviceDestination::Pcm));
    assert_eq!(DeviceDestination::from_bits(5), Some(DeviceDestination::PrgRam));
    assert_eq!(DeviceDestination::from_bits(7), Some(DeviceDestination::WordRam));
    assert_eq!(DeviceDestination::from_bits(0), None);
    assert_eq!(DeviceDestination::from_bits(1), None);
    assert_eq!(DeviceDestination::from_bits(6), None);

    assert!(DeviceDestination::WordRam.is_dma());
    assert!(DeviceDestination::SubRead.is_host_read());
    assert!(!DeviceDestination::Pcm.is_host_read());
}
