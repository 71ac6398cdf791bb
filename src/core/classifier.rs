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

//! Upload classification by file extension
//!
//! Every file handed over by the host is routed to one of the fixed
//! directories based solely on its name suffix:
//!
//! ```text
//! gba gbc gb zip 7z   -> games/
//! sav                 -> saves/
//! ss*                 -> states/   (ss0, ss1, ...)
//! cheats              -> cheats/
//! ```
//!
//! Suffixes are compared case-insensitively. Anything else is refused.
//!
//! # Example
//!
//! ```
//! use savebridge::core::classifier::{classify, UploadClass};
//!
//! assert_eq!(classify("Pokemon.GBA").unwrap(), UploadClass::Game);
//! assert_eq!(classify("game.ss3").unwrap(), UploadClass::SaveState);
//! assert!(classify("notes.txt").is_err());
//! ```

use super::error::ClassifyError;
use super::layout::Directory;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Cartridge and archive extensions accepted as games
pub const ROM_EXTENSIONS: &[&str] = &["gba", "gbc", "gb", "zip", "7z"];

/// Battery save extension
pub const SAVE_EXTENSION: &str = "sav";

/// Prefix shared by all numbered save-state extensions
pub const SAVE_STATE_PREFIX: &str = "ss";

/// Cheat file extension
pub const CHEATS_EXTENSION: &str = "cheats";

/// What an uploaded file is, as far as its extension tells
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UploadClass {
    Game,
    Save,
    SaveState,
    Cheats,
}

impl UploadClass {
    /// Directory this class of file lives in
    pub fn directory(self) -> Directory {
        match self {
            UploadClass::Game => Directory::Games,
            UploadClass::Save => Directory::Saves,
            UploadClass::SaveState => Directory::States,
            UploadClass::Cheats => Directory::Cheats,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            UploadClass::Game => "game",
            UploadClass::Save => "save",
            UploadClass::SaveState => "save state",
            UploadClass::Cheats => "cheats",
        }
    }
}

impl fmt::Display for UploadClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Upload channel chosen by the host
///
/// Each channel accepts only a subset of the classes, so a ROM picker
/// cannot drop a save file into the games directory and vice versa.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IngestKind {
    Rom,
    SaveOrState,
    Cheats,
}

impl IngestKind {
    /// Check whether this channel accepts the given class
    pub fn accepts(self, class: UploadClass) -> bool {
        matches!(
            (self, class),
            (IngestKind::Rom, UploadClass::Game)
                | (IngestKind::SaveOrState, UploadClass::Save)
                | (IngestKind::SaveOrState, UploadClass::SaveState)
                | (IngestKind::Cheats, UploadClass::Cheats)
        )
    }

    /// Channel that accepts the given class
    pub fn for_class(class: UploadClass) -> Self {
        match class {
            UploadClass::Game => IngestKind::Rom,
            UploadClass::Save | UploadClass::SaveState => IngestKind::SaveOrState,
            UploadClass::Cheats => IngestKind::Cheats,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            IngestKind::Rom => "rom",
            IngestKind::SaveOrState => "save-or-state",
            IngestKind::Cheats => "cheats",
        }
    }
}

impl fmt::Display for IngestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Extract the lower-cased suffix after the last `.`
///
/// Returns `None` when the name contains no `.` at all. A trailing dot
/// yields an empty suffix.
pub fn extension(filename: &str) -> Option<String> {
    filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
}

/// Check an upload name is a plain file name
fn validate_filename(filename: &str) -> Result<(), ClassifyError> {
    if filename.is_empty()
        || filename == "."
        || filename == ".."
        || filename.contains('/')
        || filename.contains('\\')
        || filename.contains('\0')
    {
        return Err(ClassifyError::InvalidFilename(filename.to_string()));
    }
    Ok(())
}

/// Classify a file by its extension
///
/// # Errors
///
/// - `InvalidFilename` if the name is empty or contains a path separator
/// - `MissingExtension` if the name has no `.`
/// - `UnrecognizedExtension` for any suffix outside the table above
pub fn classify(filename: &str) -> Result<UploadClass, ClassifyError> {
    validate_filename(filename)?;

    let ext = extension(filename)
        .ok_or_else(|| ClassifyError::MissingExtension(filename.to_string()))?;

    if ROM_EXTENSIONS.contains(&ext.as_str()) {
        Ok(UploadClass::Game)
    } else if ext == SAVE_EXTENSION {
        Ok(UploadClass::Save)
    } else if ext.starts_with(SAVE_STATE_PREFIX) {
        Ok(UploadClass::SaveState)
    } else if ext == CHEATS_EXTENSION {
        Ok(UploadClass::Cheats)
    } else {
        Err(ClassifyError::UnrecognizedExtension {
            filename: filename.to_string(),
            extension: ext,
        })
    }
}

/// Classify a file and check it against the upload channel
pub fn classify_for(filename: &str, kind: IngestKind) -> Result<UploadClass, ClassifyError> {
    let class = classify(filename)?;
    if !kind.accepts(class) {
        return Err(ClassifyError::KindMismatch {
            filename: filename.to_string(),
            class: class.name(),
            kind: kind.name(),
        });
    }
    Ok(class)
}
