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

//! Persistence bridge
//!
//! Ties the in-memory filesystem, the durable store and the emulator core
//! together. The bridge moves through these states:
//!
//! ```text
//! Unmounted -> Mounting -> Importing -> Ready <-> Exporting
//! ```
//!
//! Mounting imports the persisted tree and then creates the directory
//! layout, so directories restored from the store are never recreated.
//! Every operation other than [`Bridge::mount`] is refused with
//! [`BridgeError::NotReady`] until the bridge reaches `Ready`.
//!
//! # Example
//!
//! ```
//! use savebridge::core::{Bridge, HeadlessCore, IngestKind, Layout, MemoryStore};
//! use std::sync::Arc;
//!
//! # tokio_test_block(async {
//! let store = Arc::new(MemoryStore::new());
//! let mut bridge = Bridge::new(Layout::default(), store, HeadlessCore::new());
//! bridge.mount().await.unwrap();
//!
//! assert!(bridge.ingest("zelda.gba", &[0u8; 64], IngestKind::Rom).await.unwrap());
//! assert!(bridge.open_game("zelda.gba").unwrap());
//! assert_eq!(bridge.session().unwrap().save_path(), "/data/saves/zelda.sav");
//! # });
//! # fn tokio_test_block<F: std::future::Future>(f: F) -> F::Output {
//! #     tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(f)
//! # }
//! ```

use super::classifier::{IngestKind, CHEATS_EXTENSION};
use super::config::{BridgeConfig, ImportFailurePolicy};
use super::durable::DurableStore;
use super::emulator::{EmulatorCore, MainLoopTiming};
use super::error::{BridgeError, FsError, Result};
use super::layout::{ensure_layout, Directory, Layout};
use super::memfs::MemFs;
use super::router::ContentRouter;
use super::save_state::{resolve_load_flags, resolve_save_flags, SaveStateFlags};
use super::session::{resolve_game_path, GameSession};
use super::sync::{SyncEngine, SyncReport};
use std::fmt;
use std::sync::Arc;

/// Lifecycle state of the bridge
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BridgeState {
    Unmounted,
    Mounting,
    Importing,
    Ready,
    Exporting,
}

impl fmt::Display for BridgeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BridgeState::Unmounted => "unmounted",
            BridgeState::Mounting => "mounting",
            BridgeState::Importing => "importing",
            BridgeState::Ready => "ready",
            BridgeState::Exporting => "exporting",
        };
        f.write_str(name)
    }
}

/// Persistence bridge between an emulator core and a durable store
pub struct Bridge<C: EmulatorCore> {
    state: BridgeState,
    fs: MemFs,
    layout: Layout,
    router: ContentRouter,
    sync: SyncEngine,
    core: C,
    session: Option<GameSession>,
    import_failure: ImportFailurePolicy,
    auto_export: bool,
}

impl<C: EmulatorCore> Bridge<C> {
    /// Create an unmounted bridge with the default policies
    pub fn new(layout: Layout, store: Arc<dyn DurableStore>, core: C) -> Self {
        Self {
            state: BridgeState::Unmounted,
            fs: MemFs::new(),
            router: ContentRouter::new(layout.clone()),
            layout,
            sync: SyncEngine::new(store),
            core,
            session: None,
            import_failure: ImportFailurePolicy::default(),
            auto_export: true,
        }
    }

    /// Create an unmounted bridge from configuration
    ///
    /// # Errors
    ///
    /// Returns `Config` if the configured root is not a usable mount point.
    pub fn from_config(config: &BridgeConfig, store: Arc<dyn DurableStore>, core: C) -> Result<Self> {
        let layout = Layout::new(&config.root)
            .map_err(|e| BridgeError::Config(format!("invalid root: {}", e)))?;
        Ok(Self::new(layout, store, core)
            .with_import_failure(config.import_failure)
            .with_auto_export(config.auto_export))
    }

    pub fn with_import_failure(mut self, policy: ImportFailurePolicy) -> Self {
        self.import_failure = policy;
        self
    }

    /// Export automatically after ingest, save-state and screenshot writes
    pub fn with_auto_export(mut self, enabled: bool) -> Self {
        self.auto_export = enabled;
        self
    }

    pub fn state(&self) -> BridgeState {
        self.state
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn fs(&self) -> &MemFs {
        &self.fs
    }

    pub fn core(&self) -> &C {
        &self.core
    }

    /// Currently loaded game, if any
    pub fn session(&self) -> Option<&GameSession> {
        self.session.as_ref()
    }

    /// Nodes written since the last successful export
    pub fn pending_exports(&self) -> usize {
        self.sync.pending(&self.fs)
    }

    /// Core and filesystem together, for core-driven writes
    ///
    /// Call [`Bridge::export`] afterwards to persist what the core wrote.
    pub fn core_and_fs_mut(&mut self) -> Result<(&mut C, &mut MemFs)> {
        self.ensure_ready()?;
        Ok((&mut self.core, &mut self.fs))
    }

    fn ensure_ready(&self) -> Result<()> {
        match self.state {
            // Exporting outside of export() means an export future was dropped
            BridgeState::Ready | BridgeState::Exporting => Ok(()),
            state => Err(BridgeError::NotReady { state }),
        }
    }

    /// Mount the filesystem, import the persisted tree and create the layout
    ///
    /// Calling this on a bridge that is already ready only re-checks the
    /// layout.
    ///
    /// # Errors
    ///
    /// - `Import` if the store cannot be read and the policy is `Abort`
    /// - `Bootstrap` if a layout directory cannot be created
    ///
    /// The bridge is back in `Unmounted` after any error.
    pub async fn mount(&mut self) -> Result<SyncReport> {
        if self.ensure_ready().is_ok() {
            ensure_layout(&mut self.fs, &self.layout)?;
            return Ok(SyncReport::default());
        }

        self.state = BridgeState::Mounting;
        if let Err(e) = self.fs.mount(self.layout.root()) {
            self.state = BridgeState::Unmounted;
            return Err(BridgeError::Bootstrap {
                path: self.layout.root().to_string(),
                source: e,
            });
        }

        self.state = BridgeState::Importing;
        let report = match self.sync.import_from_durable(&mut self.fs).await {
            Ok(report) => report,
            Err(e) => match self.import_failure {
                ImportFailurePolicy::Abort => {
                    log::error!("Import failed: {}", e);
                    self.state = BridgeState::Unmounted;
                    return Err(BridgeError::Import(e));
                }
                ImportFailurePolicy::StartEmpty => {
                    log::warn!("Import failed, starting without persisted data: {}", e);
                    SyncReport::default()
                }
            },
        };

        if let Err(e) = ensure_layout(&mut self.fs, &self.layout) {
            log::error!("Bootstrap failed: {}", e);
            self.state = BridgeState::Unmounted;
            return Err(e);
        }

        self.state = BridgeState::Ready;
        log::info!(
            "Bridge ready at {} ({} entries restored from {})",
            self.layout.root(),
            report.entries,
            self.sync.store().name()
        );
        Ok(report)
    }

    /// Push every change since the last successful export to the store
    ///
    /// # Errors
    ///
    /// Returns `Export` with the store's error. Memory is never rolled
    /// back and the changes stay pending for the next call.
    pub async fn export(&mut self) -> Result<SyncReport> {
        self.ensure_ready()?;
        self.state = BridgeState::Exporting;
        let result = self.sync.export_to_durable(&self.fs).await;
        self.state = BridgeState::Ready;

        result.map_err(|e| {
            log::warn!("Export failed, persisted data may be stale: {}", e);
            BridgeError::Export(e)
        })
    }

    async fn export_if_enabled(&mut self) -> Result<()> {
        if self.auto_export {
            self.export().await?;
        }
        Ok(())
    }

    /// Store an upload in the directory its extension calls for
    ///
    /// Returns `Ok(false)` when the file is refused; nothing is written or
    /// exported then. An export failure after the write is returned as
    /// `Export`; the file stays in memory.
    pub async fn ingest(&mut self, filename: &str, bytes: &[u8], kind: IngestKind) -> Result<bool> {
        self.ensure_ready()?;
        if self.router.place(&mut self.fs, filename, bytes, kind)?.is_none() {
            return Ok(false);
        }
        self.export_if_enabled().await?;
        Ok(true)
    }

    /// Load a game and record its session
    ///
    /// Bare names are looked up in the games directory. When the core
    /// rejects the game the previous session is left as it was.
    pub fn open_game(&mut self, game: &str) -> Result<bool> {
        self.ensure_ready()?;
        let path = resolve_game_path(&self.layout, game);

        if !self.core.load_game(&mut self.fs, &self.layout, &path) {
            log::warn!("Core rejected {}", path);
            return Ok(false);
        }

        let session = GameSession::new(&self.layout, &path);
        log::info!("Opened {} (save file {})", path, session.save_path());
        self.session = Some(session);
        Ok(true)
    }

    /// Write a save-state to `slot`; `None` flags save every component
    pub async fn save_state_slot(&mut self, slot: u32, flags: Option<SaveStateFlags>) -> Result<bool> {
        self.ensure_ready()?;
        if self.session.is_none() {
            return Ok(false);
        }

        let flags = resolve_save_flags(flags);
        if !self.core.save_state(&mut self.fs, slot, flags) {
            return Ok(false);
        }
        self.export_if_enabled().await?;
        Ok(true)
    }

    /// Restore the save-state in `slot`; `None` flags restore everything
    /// except cheats
    pub fn load_state_slot(&mut self, slot: u32, flags: Option<SaveStateFlags>) -> Result<bool> {
        self.ensure_ready()?;
        if self.session.is_none() {
            return Ok(false);
        }
        Ok(self.core.load_state(&mut self.fs, slot, resolve_load_flags(flags)))
    }

    /// Contents of the loaded game's save file
    pub fn save_data(&self) -> Result<Option<Vec<u8>>> {
        self.ensure_ready()?;
        Ok(self
            .session
            .as_ref()
            .and_then(|s| self.fs.read_file(s.save_path()).ok())
            .map(<[u8]>::to_vec))
    }

    /// Sorted file names in one of the layout directories
    pub fn list(&self, dir: Directory) -> Result<Vec<String>> {
        self.ensure_ready()?;
        Ok(self.fs.read_dir(&self.layout.dir(dir))?)
    }

    pub fn list_games(&self) -> Result<Vec<String>> {
        self.list(Directory::Games)
    }

    pub fn list_saves(&self) -> Result<Vec<String>> {
        self.list(Directory::Saves)
    }

    pub fn list_states(&self) -> Result<Vec<String>> {
        self.list(Directory::States)
    }

    pub fn list_cheats(&self) -> Result<Vec<String>> {
        self.list(Directory::Cheats)
    }

    pub fn list_screenshots(&self) -> Result<Vec<String>> {
        self.list(Directory::Screenshots)
    }

    fn next_screenshot_name(&self, base: &str, extension: &str) -> String {
        (0u32..)
            .map(|n| format!("{}-{}.{}", base, n, extension))
            .find(|name| !self.fs.exists(&self.layout.file(Directory::Screenshots, name)))
            .unwrap_or_else(|| format!("{}.{}", base, extension))
    }

    /// Save the current frame to the screenshots directory
    ///
    /// An empty `name` picks the next free `<game>-<n>.<ext>`. Returns the
    /// path written, or `None` without a loaded game or a frame.
    pub async fn screenshot(&mut self, name: &str) -> Result<Option<String>> {
        self.ensure_ready()?;
        let Some(session) = &self.session else {
            return Ok(None);
        };
        if name.contains('/') {
            return Err(FsError::InvalidPath(name.to_string()).into());
        }

        let filename = if name.is_empty() {
            self.next_screenshot_name(session.base_name(), self.core.screenshot_extension())
        } else {
            name.to_string()
        };

        let Some(image) = self.core.take_screenshot() else {
            return Ok(None);
        };

        let path = self.layout.file(Directory::Screenshots, &filename);
        self.fs.write_file(&path, &image)?;
        log::info!("Screenshot saved to {}", path);

        self.export_if_enabled().await?;
        Ok(Some(path))
    }

    /// Load `<cheats>/<game>.cheats` into the core
    pub fn auto_load_cheats(&mut self) -> Result<bool> {
        self.ensure_ready()?;
        let Some(session) = &self.session else {
            return Ok(false);
        };
        let path = self.layout.file(
            Directory::Cheats,
            &format!("{}.{}", session.base_name(), CHEATS_EXTENSION),
        );
        Ok(self.core.load_cheats(&self.fs, &path))
    }

    /// Unload the game and forget its session
    pub fn quit_game(&mut self) -> Result<()> {
        self.ensure_ready()?;
        self.core.quit();
        if let Some(session) = self.session.take() {
            log::info!("Closed {}", session.game_path());
        }
        Ok(())
    }

    pub fn pause(&mut self) -> Result<()> {
        self.ensure_ready()?;
        self.core.pause();
        Ok(())
    }

    pub fn resume(&mut self) -> Result<()> {
        self.ensure_ready()?;
        self.core.resume();
        Ok(())
    }

    /// Reset the loaded game
    pub fn reload(&mut self) -> Result<()> {
        self.ensure_ready()?;
        self.core.reset();
        Ok(())
    }

    pub fn volume(&self) -> Result<f32> {
        self.ensure_ready()?;
        Ok(self.core.volume())
    }

    pub fn set_volume(&mut self, volume: f32) -> Result<()> {
        self.ensure_ready()?;
        self.core.set_volume(volume);
        Ok(())
    }

    pub fn main_loop_timing(&self) -> Result<MainLoopTiming> {
        self.ensure_ready()?;
        Ok(self.core.main_loop_timing())
    }

    pub fn set_main_loop_timing(&mut self, timing: MainLoopTiming) -> Result<()> {
        self.ensure_ready()?;
        log::debug!("Main loop timing: {} {}", timing.mode, timing.value);
        self.core.set_main_loop_timing(timing);
        Ok(())
    }

    pub fn fast_forward(&self) -> Result<u32> {
        self.ensure_ready()?;
        Ok(self.core.fast_forward())
    }

    pub fn set_fast_forward(&mut self, multiplier: i32) -> Result<()> {
        self.ensure_ready()?;
        self.core.set_fast_forward(multiplier);
        Ok(())
    }
}

#[cfg(test)]
mod tests;
