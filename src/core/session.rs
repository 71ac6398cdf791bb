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

//! Loaded game session
//!
//! Records which game is loaded and where its battery save lives. The save
//! path is a pure function of the game path:
//!
//! ```text
//! /data/games/zelda.gba      -> /data/saves/zelda.sav
//! /data/games/my.game.v2.gb  -> /data/saves/my.game.v2.sav
//! ```

use super::classifier::SAVE_EXTENSION;
use super::layout::{Directory, Layout};
use super::memfs;

/// Strip the last `.`-delimited extension from a file name
///
/// A name without a `.` is returned unchanged.
pub fn strip_extension(name: &str) -> &str {
    match name.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem,
        _ => name,
    }
}

/// Resolve a game name to its absolute path
///
/// Bare names are looked up in the games directory; absolute paths are
/// taken as given.
pub fn resolve_game_path(layout: &Layout, game: &str) -> String {
    if game.starts_with('/') {
        game.to_string()
    } else {
        layout.file(Directory::Games, game)
    }
}

/// Derive the save path for a game
///
/// The extension is replaced by `.sav` and the result is moved from the
/// games directory to the saves directory. A game outside the games
/// directory still gets its save in the saves directory.
pub fn derive_save_path(layout: &Layout, game_path: &str) -> String {
    let stem = strip_extension(memfs::file_name(game_path));
    layout.file(Directory::Saves, &format!("{}.{}", stem, SAVE_EXTENSION))
}

/// The association between a loaded game and its save file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameSession {
    game_path: String,
    save_path: String,
}

impl GameSession {
    pub fn new(layout: &Layout, game_path: &str) -> Self {
        Self {
            game_path: game_path.to_string(),
            save_path: derive_save_path(layout, game_path),
        }
    }

    pub fn game_path(&self) -> &str {
        &self.game_path
    }

    pub fn save_path(&self) -> &str {
        &self.save_path
    }

    /// Game file name without directory or extension
    pub fn base_name(&self) -> &str {
        strip_extension(memfs::file_name(&self.game_path))
    }
}
