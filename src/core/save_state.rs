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

//! Save state component flags and file format
//!
//! A save-state operation can be restricted to a subset of the emulator's
//! subsystems. The subset is a bitwise OR of [`SaveStateFlags`] bits:
//!
//! ```text
//! bit 0  SCREENSHOT     frame buffer snapshot
//! bit 1  CHEATS         live cheat list
//! bit 2  SAVEDATA       cartridge (battery) RAM
//! bit 3  RTC            real-time clock
//! bit 4  METADATA       timestamp, title, frame count
//! bit 5  INPUT_REPLAY   recorded input history
//! bit 6  REWIND         rewind buffer
//! ```
//!
//! # Default Masks
//!
//! When the caller does not pass flags, saving includes everything while
//! loading includes everything except `CHEATS`. Restoring a state must not
//! replace the cheats the user has active right now unless asked to.
//!
//! # Save State Format
//!
//! Save-state files are bincode encoded [`SaveState`] values. Components
//! excluded by the flags at save time are stored as `None`. The version
//! number is checked on load.
//!
//! # Example
//!
//! ```
//! use savebridge::core::save_state::{resolve_load_flags, resolve_save_flags, SaveStateFlags};
//!
//! assert_eq!(resolve_save_flags(None), SaveStateFlags::all());
//! assert!(!resolve_load_flags(None).contains(SaveStateFlags::CHEATS));
//! assert_eq!(resolve_save_flags(Some(SaveStateFlags::empty())), SaveStateFlags::empty());
//! ```

use super::codec::decode_bounded;
use super::error::SaveStateError;
use bincode::{config, Decode, Encode};
use bitflags::bitflags;
use chrono::{DateTime, Utc};

/// Save state version for compatibility checking
///
/// Bump whenever the layout of [`SaveState`] changes.
pub const SAVE_STATE_VERSION: u32 = 1;

bitflags! {
    /// Emulator subsystems included in a save-state read or write
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct SaveStateFlags: u32 {
        const SCREENSHOT = 1 << 0;
        const CHEATS = 1 << 1;
        const SAVEDATA = 1 << 2;
        const RTC = 1 << 3;
        const METADATA = 1 << 4;
        const INPUT_REPLAY = 1 << 5;
        const REWIND = 1 << 6;
    }
}

impl SaveStateFlags {
    /// Mask used for a save when no flags were supplied
    pub const SAVE_DEFAULT: Self = Self::all();

    /// Mask used for a load when no flags were supplied
    pub const LOAD_DEFAULT: Self = Self::all().difference(Self::CHEATS);

    /// Build a mask from raw bits, keeping bits without a name
    ///
    /// Unknown bits are not an error here; the core ignores them.
    pub const fn from_raw(bits: u32) -> Self {
        Self::from_bits_retain(bits)
    }
}

/// Resolve the component mask for a save
///
/// An explicit mask is used verbatim, even when empty.
pub fn resolve_save_flags(explicit: Option<SaveStateFlags>) -> SaveStateFlags {
    explicit.unwrap_or(SaveStateFlags::SAVE_DEFAULT)
}

/// Resolve the component mask for a load
///
/// An explicit mask is used verbatim, even when empty.
pub fn resolve_load_flags(explicit: Option<SaveStateFlags>) -> SaveStateFlags {
    explicit.unwrap_or(SaveStateFlags::LOAD_DEFAULT)
}

/// Complete save-state file
#[derive(Debug, Clone, PartialEq, Encode, Decode)]
pub struct SaveState {
    /// Version number for compatibility checking
    pub version: u32,

    /// Flags the state was written with
    pub flags: u32,

    /// Machine state, always present
    pub machine: MachineState,

    /// Save state metadata (METADATA)
    pub metadata: Option<SaveStateMetadata>,

    /// Cartridge RAM (SAVEDATA)
    pub savedata: Option<Vec<u8>>,

    /// Frame buffer snapshot (SCREENSHOT)
    pub screenshot: Option<Vec<u8>>,

    /// Cheat list (CHEATS)
    pub cheats: Option<Vec<String>>,

    /// Real-time clock (RTC)
    pub rtc: Option<RtcState>,

    /// Input history (INPUT_REPLAY)
    pub input_replay: Option<Vec<u16>>,

    /// Rewind buffer (REWIND)
    pub rewind: Option<Vec<Vec<u8>>>,
}

/// Core execution state that every save-state carries
#[derive(Debug, Clone, Default, PartialEq, Eq, Encode, Decode)]
pub struct MachineState {
    /// Frames executed since the game was loaded
    pub frame_count: u64,

    /// Currently held keys
    pub keys: u16,
}

/// Save state metadata
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub struct SaveStateMetadata {
    /// Creation time, milliseconds since the Unix epoch
    pub timestamp_ms: i64,

    /// Title of the game the state belongs to
    pub game_title: String,

    /// Frame count at save time
    pub frame_count: u64,
}

impl SaveStateMetadata {
    pub fn new(game_title: &str, frame_count: u64) -> Self {
        Self {
            timestamp_ms: Utc::now().timestamp_millis(),
            game_title: game_title.to_string(),
            frame_count,
        }
    }

    /// Creation time as a UTC timestamp
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.timestamp_ms)
    }
}

/// Real-time clock state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Encode, Decode)]
pub struct RtcState {
    /// Offset from host time in seconds
    pub offset_secs: i64,

    /// Last latched clock value
    pub latched: u64,
}

impl SaveState {
    /// Create an empty save state carrying only machine state
    pub fn new(flags: SaveStateFlags, machine: MachineState) -> Self {
        Self {
            version: SAVE_STATE_VERSION,
            flags: flags.bits(),
            machine,
            metadata: None,
            savedata: None,
            screenshot: None,
            cheats: None,
            rtc: None,
            input_replay: None,
            rewind: None,
        }
    }

    /// Flags the state was written with
    pub fn flags(&self) -> SaveStateFlags {
        SaveStateFlags::from_raw(self.flags)
    }

    /// Serialize to bytes
    pub fn to_bytes(&self) -> Result<Vec<u8>, SaveStateError> {
        Ok(bincode::encode_to_vec(self, config::standard())?)
    }

    /// Deserialize from bytes and verify version compatibility
    ///
    /// # Errors
    ///
    /// Returns error if decoding fails, a length inside the file claims
    /// more data than the file holds, or the version does not match
    /// [`SAVE_STATE_VERSION`].
    pub fn from_bytes(data: &[u8]) -> Result<Self, SaveStateError> {
        let (state, _): (SaveState, usize) = decode_bounded(data)?;

        if state.version != SAVE_STATE_VERSION {
            return Err(SaveStateError::IncompatibleVersion {
                expected: SAVE_STATE_VERSION,
                got: state.version,
            });
        }

        Ok(state)
    }
}
