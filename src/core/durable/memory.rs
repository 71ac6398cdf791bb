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

//! In-process durable store

use super::{DurableStore, StoreIndex, StoredEntry};
use crate::core::error::StoreError;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// Durable store kept in process memory
///
/// Clones of the index can be inspected with [`MemoryStore::snapshot`].
/// The store can be switched offline to exercise failure paths.
#[derive(Debug, Default)]
pub struct MemoryStore {
    index: Mutex<StoreIndex>,
    offline: AtomicBool,
    batches: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with entries
    pub fn with_index(index: StoreIndex) -> Self {
        Self {
            index: Mutex::new(index),
            ..Self::default()
        }
    }

    /// Make every subsequent operation fail with `Unavailable`
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Copy of the current contents
    pub fn snapshot(&self) -> StoreIndex {
        self.index.lock().clone()
    }

    /// Number of batches written so far
    pub fn batch_count(&self) -> usize {
        self.batches.load(Ordering::SeqCst)
    }

    fn check_online(&self) -> Result<(), StoreError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("memory store is offline".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl DurableStore for MemoryStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn load_index(&self) -> Result<StoreIndex, StoreError> {
        self.check_online()?;
        Ok(self.index.lock().clone())
    }

    async fn put_batch(&self, batch: Vec<(String, StoredEntry)>) -> Result<(), StoreError> {
        self.check_online()?;
        let mut index = self.index.lock();
        index.extend(batch);
        self.batches.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
