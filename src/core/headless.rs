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

//! Headless reference core
//!
//! A minimal [`EmulatorCore`] with no CPU or video hardware behind it. It
//! keeps exactly the state a save-state can carry (cartridge RAM, cheats,
//! RTC, input history, rewind buffer, a frame buffer) and reads and writes
//! the same files a real core would:
//!
//! ```text
//! games/<game>.<ext>     loaded by load_game
//! saves/<game>.sav       autoloaded into cartridge RAM
//! cheats/<game>.cheats   autoloaded into the live cheat list
//! states/<game>.ss<n>    save-state slot n
//! ```
//!
//! Used by the command line tool and the test-suite.

use super::classifier::{classify, UploadClass, CHEATS_EXTENSION, SAVE_STATE_PREFIX};
use super::emulator::{EmulatorCore, MainLoopTiming};
use super::layout::{Directory, Layout};
use super::memfs::{self, MemFs};
use super::save_state::{
    MachineState, RtcState, SaveState, SaveStateFlags, SaveStateMetadata,
};
use super::session::{derive_save_path, strip_extension};
use std::collections::VecDeque;

/// Frame buffer width in pixels
pub const SCREEN_WIDTH: usize = 240;

/// Frame buffer height in pixels
pub const SCREEN_HEIGHT: usize = 160;

/// Rewind snapshots kept
const REWIND_CAPACITY: usize = 600;

/// Maximum output volume (200%)
const MAX_VOLUME: f32 = 2.0;

/// Parse a cheat file into its list of codes
///
/// Blank lines and `#` comments are dropped.
pub fn parse_cheats(data: &[u8]) -> Vec<String> {
    String::from_utf8_lossy(data)
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}

/// State of the game currently loaded
#[derive(Debug, Clone)]
struct LoadedGame {
    title: String,
    dirs: Layout,
    save_path: String,
    savedata: Vec<u8>,
    cheats: Vec<String>,
    rtc: RtcState,
    input_log: Vec<u16>,
    rewind: VecDeque<Vec<u8>>,
    machine: MachineState,
    framebuffer: Vec<u8>,
}

impl LoadedGame {
    fn state_path(&self, slot: u32) -> String {
        self.dirs.file(
            Directory::States,
            &format!("{}.{}{}", self.title, SAVE_STATE_PREFIX, slot),
        )
    }

    fn capture(&self, flags: SaveStateFlags) -> SaveState {
        let mut state = SaveState::new(flags, self.machine.clone());

        if flags.contains(SaveStateFlags::METADATA) {
            state.metadata = Some(SaveStateMetadata::new(&self.title, self.machine.frame_count));
        }
        if flags.contains(SaveStateFlags::SAVEDATA) {
            state.savedata = Some(self.savedata.clone());
        }
        if flags.contains(SaveStateFlags::SCREENSHOT) {
            state.screenshot = Some(self.framebuffer.clone());
        }
        if flags.contains(SaveStateFlags::CHEATS) {
            state.cheats = Some(self.cheats.clone());
        }
        if flags.contains(SaveStateFlags::RTC) {
            state.rtc = Some(self.rtc);
        }
        if flags.contains(SaveStateFlags::INPUT_REPLAY) {
            state.input_replay = Some(self.input_log.clone());
        }
        if flags.contains(SaveStateFlags::REWIND) {
            state.rewind = Some(self.rewind.iter().cloned().collect());
        }

        state
    }

    /// Apply the components selected by `flags` that the state carries
    fn apply(&mut self, state: SaveState, flags: SaveStateFlags) {
        self.machine = state.machine;

        if flags.contains(SaveStateFlags::SAVEDATA) {
            if let Some(savedata) = state.savedata {
                self.savedata = savedata;
            }
        }
        if flags.contains(SaveStateFlags::SCREENSHOT) {
            if let Some(screenshot) = state.screenshot {
                self.framebuffer = screenshot;
            }
        }
        if flags.contains(SaveStateFlags::CHEATS) {
            if let Some(cheats) = state.cheats {
                self.cheats = cheats;
            }
        }
        if flags.contains(SaveStateFlags::RTC) {
            if let Some(rtc) = state.rtc {
                self.rtc = rtc;
            }
        }
        if flags.contains(SaveStateFlags::INPUT_REPLAY) {
            if let Some(input_log) = state.input_replay {
                self.input_log = input_log;
            }
        }
        if flags.contains(SaveStateFlags::REWIND) {
            if let Some(rewind) = state.rewind {
                self.rewind = rewind.into();
            }
        }
    }
}

/// Headless emulator core
#[derive(Debug, Clone)]
pub struct HeadlessCore {
    game: Option<LoadedGame>,
    paused: bool,
    audio_paused: bool,
    volume: f32,
    timing: MainLoopTiming,
    fast_forward: u32,
}

impl HeadlessCore {
    pub fn new() -> Self {
        Self {
            game: None,
            paused: false,
            audio_paused: true,
            volume: 1.0,
            timing: MainLoopTiming::default(),
            fast_forward: 1,
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.game.is_some()
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn is_audio_paused(&self) -> bool {
        self.audio_paused
    }

    /// Title of the loaded game (its file name without extension)
    pub fn title(&self) -> Option<&str> {
        self.game.as_ref().map(|g| g.title.as_str())
    }

    pub fn frame_count(&self) -> u64 {
        self.game.as_ref().map_or(0, |g| g.machine.frame_count)
    }

    /// Live cheat list
    pub fn cheats(&self) -> Option<&[String]> {
        self.game.as_ref().map(|g| g.cheats.as_slice())
    }

    pub fn set_cheats(&mut self, cheats: Vec<String>) {
        if let Some(game) = &mut self.game {
            game.cheats = cheats;
        }
    }

    /// Cartridge RAM contents
    pub fn savedata(&self) -> Option<&[u8]> {
        self.game.as_ref().map(|g| g.savedata.as_slice())
    }

    /// Emulate `frames` frames (scaled by the fast-forward multiplier)
    pub fn run_frames(&mut self, frames: u64) {
        if self.paused {
            return;
        }
        let total = self.scaled_frames(frames);
        let Some(game) = &mut self.game else {
            return;
        };

        for _ in 0..total {
            let frame = game.machine.frame_count;
            game.machine.frame_count += 1;
            game.input_log.push(game.machine.keys);
            game.rtc.latched = game.machine.frame_count / 60;

            if frame % 60 == 0 {
                if game.rewind.len() == REWIND_CAPACITY {
                    game.rewind.pop_front();
                }
                game.rewind.push_back(frame.to_le_bytes().to_vec());
            }
        }

        // Only the last frame is visible
        if total > 0 {
            let pixel = ((game.machine.frame_count - 1) % 256) as u8;
            game.framebuffer.iter_mut().for_each(|p| *p = pixel);
        }
    }

    /// Frames actually emulated for a request of `frames`
    fn scaled_frames(&self, frames: u64) -> u64 {
        frames.saturating_mul(u64::from(self.fast_forward))
    }

    /// Write cartridge RAM as the game would during play
    ///
    /// Stores the data in the core and writes the battery save file.
    pub fn write_savedata(&mut self, fs: &mut MemFs, data: &[u8]) -> bool {
        let Some(game) = &mut self.game else {
            return false;
        };
        game.savedata = data.to_vec();

        match fs.write_file(&game.save_path, data) {
            Ok(()) => true,
            Err(e) => {
                log::warn!("Failed to write {}: {}", game.save_path, e);
                false
            }
        }
    }

    fn encode_screenshot(framebuffer: &[u8]) -> Vec<u8> {
        // Binary PPM, grayscale expanded to RGB
        let mut out = format!("P6\n{} {}\n255\n", SCREEN_WIDTH, SCREEN_HEIGHT).into_bytes();
        out.reserve(framebuffer.len() * 3);
        for &p in framebuffer {
            out.extend_from_slice(&[p, p, p]);
        }
        out
    }
}

impl Default for HeadlessCore {
    fn default() -> Self {
        Self::new()
    }
}

impl EmulatorCore for HeadlessCore {
    fn load_game(&mut self, fs: &mut MemFs, dirs: &Layout, path: &str) -> bool {
        let name = memfs::file_name(path);
        if classify(name) != Ok(UploadClass::Game) {
            log::warn!("Not a game image: {}", path);
            return false;
        }

        let rom = match fs.read_file(path) {
            Ok(rom) if !rom.is_empty() => rom,
            Ok(_) => {
                log::warn!("Empty game image: {}", path);
                return false;
            }
            Err(e) => {
                log::warn!("Cannot load {}: {}", path, e);
                return false;
            }
        };
        log::info!("Loaded {} ({} bytes)", path, rom.len());

        let title = strip_extension(name).to_string();

        let save_path = derive_save_path(dirs, path);
        let savedata = fs.read_file(&save_path).map(<[u8]>::to_vec).unwrap_or_default();
        if !savedata.is_empty() {
            log::info!("Autoloaded save {}", save_path);
        }

        let cheats_path = dirs.file(
            Directory::Cheats,
            &format!("{}.{}", title, CHEATS_EXTENSION),
        );
        let cheats = fs.read_file(&cheats_path).map(parse_cheats).unwrap_or_default();

        self.game = Some(LoadedGame {
            title,
            dirs: dirs.clone(),
            save_path,
            savedata,
            cheats,
            rtc: RtcState::default(),
            input_log: Vec::new(),
            rewind: VecDeque::with_capacity(REWIND_CAPACITY),
            machine: MachineState::default(),
            framebuffer: vec![0; SCREEN_WIDTH * SCREEN_HEIGHT],
        });
        self.paused = false;
        self.audio_paused = false;
        true
    }

    fn save_state(&mut self, fs: &mut MemFs, slot: u32, flags: SaveStateFlags) -> bool {
        let Some(game) = &self.game else {
            return false;
        };

        let path = game.state_path(slot);
        let data = match game.capture(flags).to_bytes() {
            Ok(data) => data,
            Err(e) => {
                log::error!("Failed to encode save state: {}", e);
                return false;
            }
        };

        match fs.write_file(&path, &data) {
            Ok(()) => {
                log::info!("Saved state to {} (flags {:#04x})", path, flags.bits());
                true
            }
            Err(e) => {
                log::warn!("Failed to write {}: {}", path, e);
                false
            }
        }
    }

    fn load_state(&mut self, fs: &mut MemFs, slot: u32, flags: SaveStateFlags) -> bool {
        let Some(game) = &mut self.game else {
            return false;
        };

        let path = game.state_path(slot);
        let state = match fs.read_file(&path).map(SaveState::from_bytes) {
            Ok(Ok(state)) => state,
            Ok(Err(e)) => {
                log::warn!("Invalid save state {}: {}", path, e);
                return false;
            }
            Err(e) => {
                log::warn!("Cannot read {}: {}", path, e);
                return false;
            }
        };

        game.apply(state, flags);
        log::info!("Loaded state from {} (flags {:#04x})", path, flags.bits());
        true
    }

    fn load_cheats(&mut self, fs: &MemFs, path: &str) -> bool {
        let Some(game) = &mut self.game else {
            return false;
        };
        match fs.read_file(path) {
            Ok(data) => {
                game.cheats = parse_cheats(data);
                log::info!("Loaded {} cheats from {}", game.cheats.len(), path);
                true
            }
            Err(e) => {
                log::debug!("No cheats loaded from {}: {}", path, e);
                false
            }
        }
    }

    fn take_screenshot(&mut self) -> Option<Vec<u8>> {
        self.game
            .as_ref()
            .map(|g| Self::encode_screenshot(&g.framebuffer))
    }

    fn screenshot_extension(&self) -> &'static str {
        "ppm"
    }

    fn pause(&mut self) {
        self.paused = true;
    }

    fn resume(&mut self) {
        self.paused = false;
    }

    fn reset(&mut self) {
        if let Some(game) = &mut self.game {
            game.machine = MachineState::default();
        }
    }

    fn quit(&mut self) {
        if let Some(game) = self.game.take() {
            log::info!("Unloaded {}", game.title);
        }
        self.audio_paused = true;
    }

    fn volume(&self) -> f32 {
        self.volume
    }

    fn set_volume(&mut self, volume: f32) {
        if !(0.0..=MAX_VOLUME).contains(&volume) {
            return;
        }
        if volume == 0.0 {
            self.audio_paused = true;
        } else {
            self.volume = volume;
            self.audio_paused = false;
        }
    }

    fn main_loop_timing(&self) -> MainLoopTiming {
        self.timing
    }

    fn set_main_loop_timing(&mut self, timing: MainLoopTiming) {
        self.timing = timing;
    }

    fn fast_forward(&self) -> u32 {
        self.fast_forward
    }

    fn set_fast_forward(&mut self, multiplier: i32) {
        if let Ok(multiplier) = u32::try_from(multiplier) {
            if multiplier > 0 {
                self.fast_forward = multiplier;
            }
        }
    }
}
