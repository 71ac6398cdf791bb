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

//! Synchronization between the in-memory filesystem and the durable store
//!
//! Two verbs:
//! - import: pull every stored entry below the mount point into memory
//! - export: push every in-memory node changed since the last successful
//!   export to the store, as one batch
//!
//! Export builds its batch synchronously before the first await, so each
//! call persists the tree exactly as it was when the call was made. The
//! export watermark only moves forward when the store accepted the batch;
//! a failed export leaves everything dirty for the next attempt.

use super::durable::{DurableStore, StoredEntry, StoredKind};
use super::error::{FsError, StoreError};
use super::memfs::{MemFs, Node, NodeKind};
use std::sync::Arc;

/// Outcome of an import or export
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Entries transferred
    pub entries: usize,

    /// File bytes transferred
    pub bytes: usize,
}

impl SyncReport {
    fn record(&mut self, entry: &StoredEntry) {
        self.entries += 1;
        self.bytes += entry.size();
    }
}

/// Import/export driver
pub struct SyncEngine {
    store: Arc<dyn DurableStore>,
    exported_generation: u64,
}

fn to_stored(node: &Node) -> StoredEntry {
    match node.kind() {
        NodeKind::Directory => StoredEntry::directory(node.modified_ms()),
        NodeKind::File(data) => StoredEntry::file(data.clone(), node.modified_ms()),
    }
}

fn mount_point(fs: &MemFs) -> Result<String, StoreError> {
    fs.mount_point()
        .map(str::to_string)
        .ok_or_else(|| StoreError::Unavailable("filesystem is not mounted".to_string()))
}

impl SyncEngine {
    pub fn new(store: Arc<dyn DurableStore>) -> Self {
        Self {
            store,
            exported_generation: 0,
        }
    }

    pub fn store(&self) -> &Arc<dyn DurableStore> {
        &self.store
    }

    /// Number of nodes changed since the last successful export
    pub fn pending(&self, fs: &MemFs) -> usize {
        fs.mount_point().map_or(0, |root| {
            fs.descendants(root)
                .filter(|(_, node)| node.generation() > self.exported_generation)
                .count()
        })
    }

    /// Pull the persisted tree into the in-memory filesystem
    ///
    /// Stored entries outside the mount point are skipped. A local file
    /// newer than its stored copy is kept.
    ///
    /// # Errors
    ///
    /// Returns the store's error if the index cannot be read, and
    /// `Corrupt` if an entry cannot be placed (missing parent directory,
    /// file/directory clash).
    pub async fn import_from_durable(&mut self, fs: &mut MemFs) -> Result<SyncReport, StoreError> {
        let root = mount_point(fs)?;
        let was_clean = self.pending(fs) == 0;

        let index = self.store.load_index().await?;
        log::info!(
            "Importing {} entries from {} into {}",
            index.len(),
            self.store.name(),
            root
        );

        let prefix = format!("{}/", root);
        let mut report = SyncReport::default();

        for (path, entry) in index {
            if !path.starts_with(&prefix) {
                log::warn!("Skipping stored entry outside {}: {}", root, path);
                continue;
            }

            if let (Some(local), StoredKind::File(_)) = (fs.node(&path), &entry.kind) {
                if !local.is_dir() && local.modified_ms() > entry.modified_ms {
                    log::debug!("Keeping newer local copy of {}", path);
                    continue;
                }
            }

            report.record(&entry);
            let kind = match entry.kind {
                StoredKind::Directory => NodeKind::Directory,
                StoredKind::File(data) => NodeKind::File(data),
            };
            fs.restore(&path, kind, entry.modified_ms)
                .map_err(|e| match e {
                    FsError::NotFound(parent) => {
                        StoreError::Corrupt(format!("orphaned entry {} (missing {})", path, parent))
                    }
                    other => StoreError::Corrupt(format!("cannot restore {}: {}", path, other)),
                })?;
        }

        // Restored nodes are already durable
        if was_clean {
            self.exported_generation = fs.generation();
        }

        log::info!(
            "Import complete: {} entries, {} bytes",
            report.entries,
            report.bytes
        );
        Ok(report)
    }

    /// Push changed nodes to the durable store
    ///
    /// Does nothing (and does not touch the store) when nothing changed.
    pub async fn export_to_durable(&mut self, fs: &MemFs) -> Result<SyncReport, StoreError> {
        let root = mount_point(fs)?;
        let generation = fs.generation();

        let mut report = SyncReport::default();
        let batch: Vec<(String, StoredEntry)> = fs
            .descendants(&root)
            .filter(|(_, node)| node.generation() > self.exported_generation)
            .map(|(path, node)| {
                let entry = to_stored(node);
                report.record(&entry);
                (path.to_string(), entry)
            })
            .collect();

        if batch.is_empty() {
            log::trace!("Export skipped, nothing changed");
            return Ok(report);
        }

        log::debug!(
            "Exporting {} entries ({} bytes) to {}",
            report.entries,
            report.bytes,
            self.store.name()
        );

        self.store.put_batch(batch).await?;
        self.exported_generation = generation;
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::durable::{MemoryStore, StoreIndex};

    fn setup() -> (MemFs, Arc<MemoryStore>, SyncEngine) {
        let mut fs = MemFs::new();
        fs.mount("/data").unwrap();
        let store = Arc::new(MemoryStore::new());
        let engine = SyncEngine::new(store.clone());
        (fs, store, engine)
    }

    #[tokio::test]
    async fn test_export_then_import_roundtrip() {
        let (mut fs, store, mut engine) = setup();
        fs.mkdir("/data/saves").unwrap();
        fs.write_file("/data/saves/zelda.sav", b"hearts").unwrap();

        let report = engine.export_to_durable(&fs).await.unwrap();
        assert_eq!(report.entries, 2);
        assert_eq!(report.bytes, 6);

        // Fresh process
        let mut fresh = MemFs::new();
        fresh.mount("/data").unwrap();
        let mut engine = SyncEngine::new(store.clone());
        engine.import_from_durable(&mut fresh).await.unwrap();
        assert_eq!(fresh.read_file("/data/saves/zelda.sav").unwrap(), b"hearts");
        assert_eq!(engine.pending(&fresh), 0);
    }

    #[tokio::test]
    async fn test_export_is_incremental() {
        let (mut fs, store, mut engine) = setup();
        fs.mkdir("/data/games").unwrap();
        fs.write_file("/data/games/a.gba", b"a").unwrap();
        engine.export_to_durable(&fs).await.unwrap();

        fs.write_file("/data/games/b.gba", b"bb").unwrap();
        let report = engine.export_to_durable(&fs).await.unwrap();
        assert_eq!(report.entries, 1);
        assert_eq!(store.batch_count(), 2);

        // Nothing changed: no batch at all
        let report = engine.export_to_durable(&fs).await.unwrap();
        assert_eq!(report, SyncReport::default());
        assert_eq!(store.batch_count(), 2);
    }

    #[tokio::test]
    async fn test_failed_export_is_retried() {
        let (mut fs, store, mut engine) = setup();
        fs.write_file("/data/x.sav", b"1").unwrap();

        store.set_offline(true);
        let err = engine.export_to_durable(&fs).await.unwrap_err();
        assert!(matches!(err, StoreError::Unavailable(_)));
        assert_eq!(fs.read_file("/data/x.sav").unwrap(), b"1");
        assert_eq!(engine.pending(&fs), 1);

        store.set_offline(false);
        let report = engine.export_to_durable(&fs).await.unwrap();
        assert_eq!(report.entries, 1);
        assert_eq!(engine.pending(&fs), 0);
        assert!(store.snapshot().contains_key("/data/x.sav"));
    }

    #[tokio::test]
    async fn test_overwrite_is_exported() {
        let (mut fs, store, mut engine) = setup();
        fs.write_file("/data/x.sav", b"old").unwrap();
        engine.export_to_durable(&fs).await.unwrap();
        fs.write_file("/data/x.sav", b"new").unwrap();
        engine.export_to_durable(&fs).await.unwrap();

        assert_eq!(
            store.snapshot()["/data/x.sav"].kind,
            StoredKind::File(b"new".to_vec())
        );
    }

    #[tokio::test]
    async fn test_import_unavailable() {
        let (mut fs, store, mut engine) = setup();
        store.set_offline(true);
        let err = engine.import_from_durable(&mut fs).await.unwrap_err();
        assert!(matches!(err, StoreError::Unavailable(_)));
    }

    #[tokio::test]
    async fn test_import_orphan_is_corrupt() {
        let mut index = StoreIndex::new();
        index.insert(
            "/data/games/a.gba".to_string(),
            StoredEntry::file(vec![1], 1),
        );
        let store = Arc::new(MemoryStore::with_index(index));
        let mut fs = MemFs::new();
        fs.mount("/data").unwrap();
        let mut engine = SyncEngine::new(store);

        let err = engine.import_from_durable(&mut fs).await.unwrap_err();
        assert!(matches!(err, StoreError::Corrupt(_)));
    }

    #[tokio::test]
    async fn test_import_skips_foreign_entries() {
        let mut index = StoreIndex::new();
        index.insert("/elsewhere".to_string(), StoredEntry::directory(1));
        index.insert("/data/cheats".to_string(), StoredEntry::directory(1));
        let store = Arc::new(MemoryStore::with_index(index));
        let mut fs = MemFs::new();
        fs.mount("/data").unwrap();
        let mut engine = SyncEngine::new(store);

        let report = engine.import_from_durable(&mut fs).await.unwrap();
        assert_eq!(report.entries, 1);
        assert!(fs.is_dir("/data/cheats"));
        assert!(!fs.exists("/elsewhere"));
    }

    #[tokio::test]
    async fn test_import_keeps_newer_local_file() {
        let mut index = StoreIndex::new();
        index.insert("/data/a.sav".to_string(), StoredEntry::file(b"stale".to_vec(), 0));
        let store = Arc::new(MemoryStore::with_index(index));
        let mut fs = MemFs::new();
        fs.mount("/data").unwrap();
        fs.write_file("/data/a.sav", b"fresh").unwrap();
        let mut engine = SyncEngine::new(store);

        engine.import_from_durable(&mut fs).await.unwrap();
        assert_eq!(fs.read_file("/data/a.sav").unwrap(), b"fresh");
        // The local write was never exported and is still pending
        assert_eq!(engine.pending(&fs), 1);
    }

    #[tokio::test]
    async fn test_unmounted_filesystem() {
        let store = Arc::new(MemoryStore::new());
        let mut engine = SyncEngine::new(store);
        let fs = MemFs::new();
        assert!(engine.export_to_durable(&fs).await.is_err());
    }
}
