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

//! Persistence bridge components
//!
//! Leaf modules first:
//! - `classifier`: upload extension classification
//! - `codec`: size-bounded bincode decoding
//! - `save_state`: save-state component flags and file format
//! - `memfs`: synchronous in-memory filesystem
//! - `layout`: fixed directory taxonomy and its bootstrap
//! - `durable`: async durable stores
//! - `sync`: import/export between memory and the durable store
//! - `router`, `session`: upload placement and loaded-game tracking
//! - `emulator`, `headless`: the core boundary and a reference core
//! - `bridge`: the state machine tying it all together

pub mod bridge;
pub mod classifier;
pub mod codec;
pub mod config;
pub mod durable;
pub mod emulator;
pub mod error;
pub mod headless;
pub mod layout;
pub mod memfs;
pub mod router;
pub mod save_state;
pub mod session;
pub mod sync;

// Re-export commonly used types
pub use bridge::{Bridge, BridgeState};
pub use classifier::{classify, IngestKind, UploadClass};
pub use config::{BridgeConfig, ImportFailurePolicy};
pub use durable::{DirStore, DurableStore, MemoryStore, StoreIndex, StoredEntry, StoredKind};
pub use emulator::{EmulatorCore, MainLoopTiming, TimingMode};
pub use error::{BridgeError, ClassifyError, FsError, Result, SaveStateError, StoreError};
pub use headless::HeadlessCore;
pub use layout::{Directory, Layout};
pub use memfs::MemFs;
pub use save_state::{resolve_load_flags, resolve_save_flags, SaveState, SaveStateFlags};
pub use session::GameSession;
pub use sync::{SyncEngine, SyncReport};
