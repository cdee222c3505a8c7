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

//! Disc image loading and management
//!
//! Two container layouts are supported:
//!
//! - **BIN/CUE**: raw 2352-byte sectors in a `.bin` file, with the track
//!   table parsed from the `.cue` sheet (FILE / TRACK / INDEX 01
//!   directives). Mode-1 payload sits behind each sector's 16-byte
//!   sync-plus-header prefix.
//! - **ISO**: cooked 2048-byte data sectors, one data track, no per-sector
//!   overhead.
//!
//! The decoder pipeline consumes plain byte-offset reads; which offsets
//! hold payload for a given logical block is decided by [`DiscLayout`].


use crate::core::error::DiscError;

/// Raw bytes per sector in a BIN/CUE image
const RAW_SECTOR_SIZE: u32 = 2352;

/// Bytes per sector in a cooked ISO image
const ISO_SECTOR_SIZE: u32 = 2048;

/// How payload bytes are laid out in the image file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscLayout {
    /// Cooked 2048-byte sectors; payload for LBA n starts at `n * 2048`
    Iso,
    /// Raw sectors; payload for LBA n starts at `n * sector_size + 16`
    BinCue { sector_size: u32 },
}

/// CD track type from the cue sheet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackType {
    /// Data track, 2352 bytes per sector (Mode 1)
    Mode1_2352,
    /// CD-DA audio, 2352 bytes per sector
    Audio,
}

/// One track on the disc
#[derive(Debug, Clone)]
pub struct Track {
    /// Track number (1-99)
    pub number: u8,

    /// Track type (Mode1/2352, Audio)
    pub track_type: TrackType,

    /// First logical block of the track
    pub start_lba: i32,

    /// Length in sectors
    pub length_sectors: u32,

    /// Byte offset in the image file
    pub file_offset: u64,
}

/// Disc image with track table and raw data
#[derive(Debug)]
pub struct DiscImage {
    layout: DiscLayout,
    tracks: Vec<Track>,
    data: Vec<u8>,
}

impl DiscImage {
    /// Load a disc image from a `.cue` or `.iso` path
    pub fn load(path: &str) -> Result<Self, DiscError> {
        let lower = path.to_ascii_lowercase();
        if lower.ends_with(".cue") {
            Self::load_cue(path)
        } else if lower.ends_with(".iso") {
            Self::load_iso(path)
        } else {
            Err(DiscError::UnsupportedFormat(path.to_string()))
        }
    }

    /// Load a cooked ISO image: one Mode-1 data track covering the file
    pub fn load_iso(path: &str) -> Result<Self, DiscError> {
        let data = std::fs::read(path)?;
        let length_sectors = (data.len() as u64 / u64::from(ISO_SECTOR_SIZE)) as u32;

        log::info!("Loaded ISO image: {} sectors", length_sectors);

        Ok(Self {
            layout: DiscLayout::Iso,
            tracks: vec![Track {
                number: 1,
                track_type: TrackType::Mode1_2352,
                start_lba: 0,
                length_sectors,
                file_offset: 0,
            }],
            data,
        })
    }

    /// Load a BIN/CUE image: parse the cue sheet, read the bin file
    pub fn load_cue(cue_path: &str) -> Result<Self, DiscError> {
        let cue_data = std::fs::read_to_string(cue_path)?;
        let bin_path = Self::bin_path_from_cue(cue_path, &cue_data)?;

        let mut tracks = Self::parse_cue(&cue_data)?;
        let data = std::fs::read(&bin_path)
            .map_err(|e| DiscError::CueParse(format!("failed to read bin file '{bin_path}': {e}")))?;

        Self::calculate_track_lengths(&mut tracks, data.len());

        log::info!(
            "Loaded disc image: {} tracks, {} MB",
            tracks.len(),
            data.len() / 1024 / 1024
        );

        Ok(Self {
            layout: DiscLayout::BinCue {
                sector_size: RAW_SECTOR_SIZE,
            },
            tracks,
            data,
        })
    }

    /// Extract the bin file path from the cue sheet's FILE directive
    fn bin_path_from_cue(cue_path: &str, cue_data: &str) -> Result<String, DiscError> {
        for line in cue_data.lines() {
            let line = line.trim();
            if let Some(rest) = line.strip_prefix("FILE") {
                if let Some(start) = rest.find('"') {
                    if let Some(end) = rest[start + 1..].find('"') {
                        let bin_filename = &rest[start + 1..start + 1 + end];

                        let cue_path_obj = std::path::Path::new(cue_path);
                        let bin_path = match cue_path_obj.parent() {
                            Some(parent) => parent.join(bin_filename),
                            None => std::path::PathBuf::from(bin_filename),
                        };

                        return Ok(bin_path.to_string_lossy().to_string());
                    }
                }
            }
        }

        Err(DiscError::CueParse(
            "no FILE directive found in cue sheet".to_string(),
        ))
    }

    /// Parse TRACK / INDEX 01 directives into a track table
    pub(super) fn parse_cue(cue_data: &str) -> Result<Vec<Track>, DiscError> {
        let mut tracks = Vec::new();
        let mut current_track: Option<Track> = None;

        for line in cue_data.lines() {
            let line = line.trim();

            if line.starts_with("TRACK") {
                if let Some(track) = current_track.take() {
                    tracks.push(track);
                }

                let parts: Vec<&str> = line.split_whitespace().collect();
                let number = parts.get(1).and_then(|s| s.parse().ok()).unwrap_or(1);
                let track_type_str = parts.get(2).copied().unwrap_or("MODE1/2352");

                current_track = Some(Track {
                    number,
                    track_type: Self::parse_track_type(track_type_str)?,
                    start_lba: 0,
                    length_sectors: 0,
                    file_offset: 0,
                });
            } else if line.starts_with("INDEX 01") {
                if let Some(ref mut track) = current_track {
                    let parts: Vec<&str> = line.split_whitespace().collect();
                    if let Some(time_str) = parts.get(2) {
                        track.start_lba = Self::parse_msf(time_str)?;
                        track.file_offset =
                            track.start_lba.max(0) as u64 * u64::from(RAW_SECTOR_SIZE);
                    }
                }
            }
        }

        if let Some(track) = current_track {
            tracks.push(track);
        }

        if tracks.is_empty() {
            return Err(DiscError::CueParse("cue sheet defines no tracks".to_string()));
        }

        Ok(tracks)
    }

    /// Parse an `MM:SS:FF` cue timestamp into a logical block number
    ///
    /// Cue timestamps are file-relative, so 00:00:00 is LBA 0 (no pregap
    /// offset applies inside the image file).
    pub(super) fn parse_msf(msf: &str) -> Result<i32, DiscError> {
        let parts: Vec<&str> = msf.split(':').collect();
        if parts.len() != 3 {
            return Err(DiscError::CueParse(format!("invalid MSF timestamp '{msf}'")));
        }

        let minute: i32 = parts[0]
            .parse()
            .map_err(|_| DiscError::CueParse(format!("invalid minute in '{msf}'")))?;
        let second: i32 = parts[1]
            .parse()
            .map_err(|_| DiscError::CueParse(format!("invalid second in '{msf}'")))?;
        let frame: i32 = parts[2]
            .parse()
            .map_err(|_| DiscError::CueParse(format!("invalid frame in '{msf}'")))?;

        Ok((minute * 60 + second) * 75 + frame)
    }

    fn parse_track_type(s: &str) -> Result<TrackType, DiscError> {
        match s {
            "MODE1/2352" => Ok(TrackType::Mode1_2352),
            "AUDIO" => Ok(TrackType::Audio),
            other => Err(DiscError::UnsupportedFormat(format!(
                "track type '{other}'"
            ))),
        }
    }

    /// Fill in track lengths from the gaps between start offsets
    pub(super) fn calculate_track_lengths(tracks: &mut [Track], file_size: usize) {
        for i in 0..tracks.len() {
            let this_offset = tracks[i].file_offset;
            let end = if i + 1 < tracks.len() {
                tracks[i + 1].file_offset
            } else {
                file_size as u64
            };
            tracks[i].length_sectors =
                (end.saturating_sub(this_offset) / u64::from(RAW_SECTOR_SIZE)) as u32;
        }
    }

    /// The payload layout of this image
    pub fn layout(&self) -> DiscLayout {
        self.layout
    }

    /// True when the track containing `lba` is a CD-DA audio track
    pub fn is_audio(&self, lba: i32) -> bool {
        self.track_at(lba)
            .is_some_and(|track| track.track_type == TrackType::Audio)
    }

    /// The track containing `lba`, if any
    pub fn track_at(&self, lba: i32) -> Option<&Track> {
        self.tracks
            .iter()
            .rev()
            .find(|track| lba >= track.start_lba)
    }

    /// Read raw bytes at an absolute image offset
    pub fn read_bytes(&mut self, offset: u64, buf: &mut [u8]) -> Result<(), DiscError> {
        let start = usize::try_from(offset).map_err(|_| DiscError::OutOfBounds {
            offset,
            length: buf.len(),
        })?;
        let end = start.checked_add(buf.len()).filter(|&end| end <= self.data.len());

        match end {
            Some(end) => {
                buf.copy_from_slice(&self.data[start..end]);
                Ok(())
            }
            None => Err(DiscError::OutOfBounds {
                offset,
                length: buf.len(),
            }),
        }
    }

    /// Get the number of tracks on the disc
    pub fn track_count(&self) -> usize {
        self.tracks.len()
    }

    /// Get track information by track number
    pub fn get_track(&self, track_num: u8) -> Option<&Track> {
        self.tracks.iter().find(|t| t.number == track_num)
    }
}
