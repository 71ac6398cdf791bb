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

//! Emulator core boundary
//!
//! The bridge drives the core only through [`EmulatorCore`]. The core gets
//! the in-memory filesystem passed in explicitly whenever it needs to read
//! or write files; it never holds on to it.

use super::layout::Layout;
use super::memfs::MemFs;
use super::save_state::SaveStateFlags;
use std::fmt;

/// How the host schedules the main loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimingMode {
    /// Timer based, value is the interval in milliseconds
    SetTimeout,
    /// Display refresh based, value is the number of refreshes per frame
    RequestAnimationFrame,
    /// As fast as possible
    SetImmediate,
}

impl fmt::Display for TimingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TimingMode::SetTimeout => "timeout",
            TimingMode::RequestAnimationFrame => "raf",
            TimingMode::SetImmediate => "immediate",
        };
        f.write_str(name)
    }
}

/// Main loop timing (mode and its parameter)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MainLoopTiming {
    pub mode: TimingMode,
    pub value: i32,
}

impl Default for MainLoopTiming {
    fn default() -> Self {
        Self {
            mode: TimingMode::RequestAnimationFrame,
            value: 1,
        }
    }
}

/// Capabilities the bridge consumes from the emulator core
pub trait EmulatorCore {
    /// Load a game image from the filesystem
    ///
    /// `dirs` tells the core where saves, states, cheats and screenshots
    /// live. Returns `false` if the file is missing or not a game the core
    /// can run; the core must leave its previous game untouched then.
    fn load_game(&mut self, fs: &mut MemFs, dirs: &Layout, path: &str) -> bool;

    /// Write a save-state for the loaded game to `slot`
    fn save_state(&mut self, fs: &mut MemFs, slot: u32, flags: SaveStateFlags) -> bool;

    /// Restore the save-state in `slot`, limited to `flags`
    fn load_state(&mut self, fs: &mut MemFs, slot: u32, flags: SaveStateFlags) -> bool;

    /// Load a cheat file into the live cheat list
    fn load_cheats(&mut self, fs: &MemFs, path: &str) -> bool;

    /// Capture the current frame as an encoded image
    fn take_screenshot(&mut self) -> Option<Vec<u8>>;

    /// File extension matching the encoding of [`take_screenshot`](Self::take_screenshot)
    fn screenshot_extension(&self) -> &'static str {
        "png"
    }

    fn pause(&mut self);
    fn resume(&mut self);

    /// Reset the loaded game
    fn reset(&mut self);

    /// Unload the current game
    fn quit(&mut self);

    /// Output volume, 1.0 is 100%
    fn volume(&self) -> f32;
    fn set_volume(&mut self, volume: f32);

    fn main_loop_timing(&self) -> MainLoopTiming;
    fn set_main_loop_timing(&mut self, timing: MainLoopTiming);

    fn fast_forward(&self) -> u32;
    fn set_fast_forward(&mut self, multiplier: i32);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_timing() {
        let timing = MainLoopTiming::default();
        assert_eq!(timing.mode, TimingMode::RequestAnimationFrame);
        assert_eq!(timing.value, 1);
        assert_eq!(timing.mode.to_string(), "raf");
    }
}
