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

//! External memory write ports consumed by the transfer engine
//!
//! The CDC itself owns nothing but its 16 KB buffer RAM; every DMA
//! destination is a write port into memory owned by some other device. The
//! owning bus implements this trait and hands it to [`Cdc::dma`] whenever a
//! DMA slot is granted.
//!
//! Addresses are the raw 19-bit transfer address counter. Destination
//! memories are smaller than 19 bits; mapping the counter onto the actual
//! memory (including the word-RAM bank mode) is the implementor's concern,
//! since bank selection lives in the gate array, not in the CDC.
//!
//! [`Cdc::dma`]: super::Cdc::dma

/// Write ports for the three DMA destination memories
pub trait DmaPorts {
    /// Write a word into word RAM at a bank-relative address
    fn write_word_ram(&mut self, address: u32, value: u16);

    /// Write a word into the sub-CPU's program RAM
    fn write_prg_ram(&mut self, address: u32, value: u16);

    /// Write one byte through the PCM chip's wave-data window
    fn write_pcm(&mut self, address: u32, value: u8);
}
