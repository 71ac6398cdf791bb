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

//! Durable storage backends
//!
//! The durable store is an asynchronous key/value store that survives
//! process restarts. Keys are absolute paths from the in-memory filesystem;
//! values are [`StoredEntry`] records. The bridge is the only writer, and
//! it only ever inserts or overwrites: entries are never deleted.
//!
//! Two backends are provided:
//! - [`MemoryStore`]: in-process, for embedding and tests
//! - [`DirStore`]: a single index file in a host directory

mod dir;
mod memory;

pub use dir::DirStore;
pub use memory::MemoryStore;

use super::error::StoreError;
use async_trait::async_trait;
use bincode::{Decode, Encode};
use std::collections::BTreeMap;

/// Every stored entry, keyed by absolute path
pub type StoreIndex = BTreeMap<String, StoredEntry>;

/// Kind of a stored entry
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub enum StoredKind {
    Directory,
    File(Vec<u8>),
}

/// One persisted filesystem node
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub struct StoredEntry {
    pub kind: StoredKind,

    /// Modification time, milliseconds since the Unix epoch
    pub modified_ms: i64,
}

impl StoredEntry {
    pub fn directory(modified_ms: i64) -> Self {
        Self {
            kind: StoredKind::Directory,
            modified_ms,
        }
    }

    pub fn file(data: Vec<u8>, modified_ms: i64) -> Self {
        Self {
            kind: StoredKind::File(data),
            modified_ms,
        }
    }

    /// Payload size in bytes (zero for directories)
    pub fn size(&self) -> usize {
        match &self.kind {
            StoredKind::Directory => 0,
            StoredKind::File(data) => data.len(),
        }
    }
}

/// Asynchronous durable key/value store
#[async_trait]
pub trait DurableStore: Send + Sync {
    /// Short name for log messages
    fn name(&self) -> &str;

    /// Read every stored entry
    ///
    /// An empty store returns an empty index, not an error.
    async fn load_index(&self) -> Result<StoreIndex, StoreError>;

    /// Insert or overwrite a batch of entries
    ///
    /// The batch is applied atomically: either every entry is stored or
    /// none is.
    async fn put_batch(&self, batch: Vec<(String, StoredEntry)>) -> Result<(), StoreError>;
}
