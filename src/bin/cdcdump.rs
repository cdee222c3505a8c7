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

use clap::Parser;
use log::{error, info};

use lc8951::core::error::Result;
use lc8951::core::Cdc;

/// LC8951 CDC sector dumper
#[derive(Parser)]
#[command(name = "cdcdump")]
#[command(about = "Decode disc sectors through the CDC and dump them", long_about = None)]
struct Args {
    /// Path to disc image (.cue or .iso)
    image: String,

    /// First sector to decode
    #[arg(short = 's', long, default_value = "0")]
    start: i32,

    /// Number of sectors to decode
    #[arg(short = 'n', long, default_value = "1")]
    sectors: i32,

    /// Bytes of payload to print per sector
    #[arg(short = 'b', long, default_value = "64")]
    bytes: u16,
}

fn main() -> Result<()> {
    // Initialize logger with default level INFO
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    info!("cdcdump v{}", env!("CARGO_PKG_VERSION"));

    let args = Args::parse();

    let mut cdc = Cdc::new();

    info!("Loading disc image from: {}", args.image);
    if let Err(e) = cdc.load_disc(&args.image) {
        error!("Failed to load disc image: {}", e);
        return Err(e);
    }
    info!("Disc image loaded successfully");

    // Program the chip the way BIOS code does: decoder interrupts on,
    // data output on, decoder enabled with buffer writes
    cdc.set_register_address(1);
    cdc.write_register(0x62); // IFCTRL: DTEIEN | DECIEN | DOUTEN
    cdc.set_register_address(10);
    cdc.write_register(0x84); // CTRL0: DECEN | WRRQ

    for lba in args.start..args.start + args.sectors {
        cdc.decode_sector(lba);

        let header = cdc.header();
        println!(
            "sector {:6}  {:02X}:{:02X}:{:02X} mode {}",
            lba, header[0], header[1], header[2], header[3]
        );

        if header[3] != 1 {
            // Audio sectors never pass through the buffer
            continue;
        }

        // Acknowledge the decode, then stream the payload back out
        // through the sub-CPU host read port
        cdc.set_register_address(15);
        cdc.read_register(); // STAT3

        let count = args.bytes & !1;

        // DAC = PT + 4: skip the committed header bytes
        cdc.set_register_address(8);
        let ptl = cdc.read_register(); // PTL
        let pth = cdc.read_register(); // PTH
        let source = (u16::from_le_bytes([ptl, pth]) + 4) & 0x3FFF;

        cdc.set_register_address(4);
        cdc.write_register(source as u8); // DACL
        cdc.write_register((source >> 8) as u8); // DACH
        cdc.set_register_address(2);
        cdc.write_register(count as u8); // DBCL
        cdc.write_register((count >> 8) as u8); // DBCH

        // Destination 3 (sub-CPU read) in the high byte, DTTRG in the low
        cdc.write_host_mode(0x0306);
        cdc.write_register(0); // DTTRG

        let mut line = String::new();
        for i in 0..count / 2 {
            let word = cdc.read_host_data();
            line.push_str(&format!("{:04X} ", word));
            if i % 8 == 7 {
                println!("  {}", line.trim_end());
                line.clear();
            }
        }
        if !line.is_empty() {
            println!("  {}", line.trim_end());
        }

        // Acknowledge transfer end
        cdc.set_register_address(7);
        cdc.write_register(0); // DTACK
    }

    info!("Done");
    Ok(())
}
