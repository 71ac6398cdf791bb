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

//! Persistence bridge for emulator filesystems
//!
//! Gives an emulator core a synchronous in-memory directory tree (games,
//! saves, save-states, cheats, screenshots) and keeps it in step with an
//! asynchronous durable store across restarts.
//!
//! # Example
//!
//! ```
//! use savebridge::core::{classify, resolve_load_flags, SaveStateFlags, UploadClass};
//!
//! assert_eq!(classify("zelda.gba").unwrap(), UploadClass::Game);
//! assert_eq!(classify("zelda.ss2").unwrap(), UploadClass::SaveState);
//! assert!(!resolve_load_flags(None).contains(SaveStateFlags::CHEATS));
//! ```

pub mod core;
