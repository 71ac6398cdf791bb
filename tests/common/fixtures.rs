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


//! Test fixtures for common test scenarios

use savebridge::core::{Bridge, DirStore, DurableStore, HeadlessCore, Layout, MemoryStore};
use std::path::Path;
use std::sync::Arc;

/// Create an unmounted bridge over any store
#[allow(dead_code)]
pub fn create_bridge(store: Arc<dyn DurableStore>) -> Bridge<HeadlessCore> {
    Bridge::new(Layout::default(), store, HeadlessCore::new())
}

/// Create a mounted bridge over a fresh in-process store
#[allow(dead_code)]
pub async fn create_ready_bridge() -> (Bridge<HeadlessCore>, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    let mut bridge = create_bridge(store.clone());
    bridge.mount().await.expect("mount failed");
    (bridge, store)
}

/// Mount a bridge over a host directory, as a fresh process would
#[allow(dead_code)]
pub async fn mount_dir_bridge(dir: &Path) -> Bridge<HeadlessCore> {
    let mut bridge = create_bridge(Arc::new(DirStore::new(dir)));
    bridge.mount().await.expect("mount failed");
    bridge
}
