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

//! Fixed directory taxonomy
//!
//! ```text
//! <root>/games/        uploaded ROM/archive images
//! <root>/saves/        battery saves, <game>.sav
//! <root>/states/       save-states, <game>.ss<slot>
//! <root>/cheats/       cheat definitions, <game>.cheats
//! <root>/screenshots/  captured frames
//! ```

use super::error::{BridgeError, FsError, Result};
use super::memfs::{self, MemFs};
use std::fmt;

/// Default mount root
pub const DEFAULT_ROOT: &str = "/data";

/// One of the five fixed directories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Directory {
    Games,
    Saves,
    States,
    Cheats,
    Screenshots,
}

impl Directory {
    pub const ALL: [Directory; 5] = [
        Directory::Games,
        Directory::Saves,
        Directory::States,
        Directory::Cheats,
        Directory::Screenshots,
    ];

    /// Directory name below the root (case-sensitive)
    pub fn name(self) -> &'static str {
        match self {
            Directory::Games => "games",
            Directory::Saves => "saves",
            Directory::States => "states",
            Directory::Cheats => "cheats",
            Directory::Screenshots => "screenshots",
        }
    }
}

impl fmt::Display for Directory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Absolute paths of the directory taxonomy
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    root: String,
}

impl Layout {
    /// Create a layout rooted at `root`
    ///
    /// # Errors
    ///
    /// Returns `InvalidPath` if `root` is not an absolute path or is `/`.
    pub fn new(root: &str) -> std::result::Result<Self, FsError> {
        let root = memfs::normalize(root)?;
        if root == "/" {
            return Err(FsError::InvalidPath(root));
        }
        Ok(Self { root })
    }

    pub fn root(&self) -> &str {
        &self.root
    }

    /// Absolute path of a directory
    pub fn dir(&self, dir: Directory) -> String {
        memfs::join(&self.root, dir.name())
    }

    /// Absolute path of a file inside a directory
    pub fn file(&self, dir: Directory, name: &str) -> String {
        memfs::join(&self.dir(dir), name)
    }

    pub fn games(&self) -> String {
        self.dir(Directory::Games)
    }

    pub fn saves(&self) -> String {
        self.dir(Directory::Saves)
    }

    pub fn states(&self) -> String {
        self.dir(Directory::States)
    }

    pub fn cheats(&self) -> String {
        self.dir(Directory::Cheats)
    }

    pub fn screenshots(&self) -> String {
        self.dir(Directory::Screenshots)
    }
}

impl Default for Layout {
    fn default() -> Self {
        Self {
            root: DEFAULT_ROOT.to_string(),
        }
    }
}

/// Create the five fixed directories
///
/// Safe to call any number of times. A directory that already exists is
/// fine; any other failure (a file in the way, a missing mount root) is
/// returned as a bootstrap error.
pub fn ensure_layout(fs: &mut MemFs, layout: &Layout) -> Result<()> {
    for dir in Directory::ALL {
        let path = layout.dir(dir);
        match fs.mkdir(&path) {
            Ok(()) => log::debug!("Created {}", path),
            Err(FsError::AlreadyExists(_)) => log::trace!("{} already present", path),
            Err(source) => return Err(BridgeError::Bootstrap { path, source }),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mounted() -> (MemFs, Layout) {
        let mut fs = MemFs::new();
        let layout = Layout::default();
        fs.mount(layout.root()).unwrap();
        (fs, layout)
    }

    #[test]
    fn test_paths() {
        let layout = Layout::default();
        assert_eq!(layout.games(), "/data/games");
        assert_eq!(layout.saves(), "/data/saves");
        assert_eq!(layout.states(), "/data/states");
        assert_eq!(layout.cheats(), "/data/cheats");
        assert_eq!(layout.screenshots(), "/data/screenshots");
        assert_eq!(
            layout.file(Directory::Saves, "zelda.sav"),
            "/data/saves/zelda.sav"
        );
    }

    #[test]
    fn test_custom_root() {
        let layout = Layout::new("/persist/").unwrap();
        assert_eq!(layout.root(), "/persist");
        assert_eq!(layout.games(), "/persist/games");
        assert!(Layout::new("/").is_err());
        assert!(Layout::new("relative").is_err());
    }

    #[test]
    fn test_ensure_layout_creates_all() {
        let (mut fs, layout) = mounted();
        ensure_layout(&mut fs, &layout).unwrap();
        for dir in Directory::ALL {
            assert!(fs.is_dir(&layout.dir(dir)), "{} missing", dir);
        }
    }

    #[test]
    fn test_ensure_layout_twice() {
        let (mut fs, layout) = mounted();
        ensure_layout(&mut fs, &layout).unwrap();
        let count = fs.len();
        ensure_layout(&mut fs, &layout).unwrap();
        assert_eq!(fs.len(), count);
        assert_eq!(fs.read_dir("/data").unwrap().len(), 5);
    }

    #[test]
    fn test_ensure_layout_keeps_existing_content() {
        let (mut fs, layout) = mounted();
        fs.mkdir("/data/saves").unwrap();
        fs.write_file("/data/saves/zelda.sav", b"progress").unwrap();
        ensure_layout(&mut fs, &layout).unwrap();
        assert_eq!(fs.read_file("/data/saves/zelda.sav").unwrap(), b"progress");
    }

    #[test]
    fn test_ensure_layout_file_in_the_way() {
        let (mut fs, layout) = mounted();
        fs.write_file("/data/states", b"not a dir").unwrap();
        let err = ensure_layout(&mut fs, &layout).unwrap_err();
        match err {
            BridgeError::Bootstrap { path, source } => {
                assert_eq!(path, "/data/states");
                assert_eq!(source, FsError::FileExists("/data/states".to_string()));
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_ensure_layout_without_mount() {
        let mut fs = MemFs::new();
        let err = ensure_layout(&mut fs, &Layout::default()).unwrap_err();
        assert!(matches!(
            err,
            BridgeError::Bootstrap {
                source: FsError::NotFound(_),
                ..
            }
        ));
    }
}
