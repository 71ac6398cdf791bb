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


//! Bridge tests
//!
//! - `lifecycle`: mount, bootstrap, import policy, readiness
//! - `ingest`: upload routing and export
//! - `session`: game sessions, save-states and pass-through controls


use super::*;
use crate::core::durable::MemoryStore;
use crate::core::headless::HeadlessCore;

fn bridge_with(store: Arc<MemoryStore>) -> Bridge<HeadlessCore> {
    Bridge::new(Layout::default(), store, HeadlessCore::new())
}

async fn ready_bridge() -> (Bridge<HeadlessCore>, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    let mut bridge = bridge_with(store.clone());
    bridge.mount().await.unwrap();
    (bridge, store)
}
