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

//! Sanyo LC8951 CD controller (CDC) emulation core
//!
//! This library emulates the CDC chip of the Sega CD / Mega CD add-on: the
//! LC8951-compatible controller that sits between the disc drive's raw sector
//! stream and the two host CPUs, decoding sectors into a 16 KB internal buffer
//! RAM and exposing that RAM through a register-addressed FIFO/DMA interface.
//!
//! # Example
//!
//! ```
//! use lc8951::core::cdc::Cdc;
//!
//! let mut cdc = Cdc::new();
//!
//! // Program the decoder the way the BIOS would: CTRL0 with DECEN | WRRQ.
//! cdc.set_register_address(10);
//! cdc.write_register(0x84);
//!
//! // Feed one sector boundary; the header for LBA 0 is 00:02:00, Mode 1.
//! cdc.decode_sector(0);
//! assert_eq!(cdc.header(), [0x00, 0x02, 0x00, 0x01]);
//! ```

pub mod core;
