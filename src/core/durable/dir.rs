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

//! Host-directory durable store
//!
//! The whole index lives in one file, `index.bin`, inside the store
//! directory:
//!
//! ```text
//! 0x00-0x03: "SBIX" magic
//! 0x04-0x07: Index version (little-endian u32)
//! 0x08+:     bincode encoded StoreIndex
//! ```
//!
//! A batch is applied by rewriting the file to `index.bin.tmp` and renaming
//! it over the old index, so a crash mid-write leaves the previous index
//! intact.

use super::{DurableStore, StoreIndex, StoredEntry};
use crate::core::codec::decode_bounded;
use crate::core::error::StoreError;
use async_trait::async_trait;
use bincode::config;
use bincode::error::DecodeError;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

/// Index file magic
const INDEX_MAGIC: &[u8; 4] = b"SBIX";

/// Index format version
pub const INDEX_VERSION: u32 = 1;

const INDEX_FILE: &str = "index.bin";
const INDEX_TMP_FILE: &str = "index.bin.tmp";

/// Durable store backed by a host directory
#[derive(Debug)]
pub struct DirStore {
    dir: PathBuf,
    name: String,
    write_lock: Mutex<()>,
}

impl DirStore {
    /// Open a store in `dir`
    ///
    /// The directory is created on the first write if it does not exist.
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        let dir = dir.as_ref().to_path_buf();
        Self {
            name: format!("dir:{}", dir.display()),
            dir,
            write_lock: Mutex::new(()),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn index_path(&self) -> PathBuf {
        self.dir.join(INDEX_FILE)
    }

    /// Encode an index with its header
    pub fn encode_index(index: &StoreIndex) -> Result<Vec<u8>, StoreError> {
        let mut out = Vec::with_capacity(8);
        out.extend_from_slice(INDEX_MAGIC);
        out.extend_from_slice(&INDEX_VERSION.to_le_bytes());
        out.extend(bincode::encode_to_vec(index, config::standard())?);
        Ok(out)
    }

    /// Decode an index, checking magic and version
    pub fn decode_index(data: &[u8]) -> Result<StoreIndex, StoreError> {
        if data.len() < 8 {
            return Err(StoreError::Corrupt(format!(
                "index too small ({} bytes)",
                data.len()
            )));
        }
        if &data[0..4] != INDEX_MAGIC {
            return Err(StoreError::Corrupt("bad magic number".to_string()));
        }

        let version = u32::from_le_bytes([data[4], data[5], data[6], data[7]]);
        if version != INDEX_VERSION {
            return Err(StoreError::IncompatibleVersion {
                expected: INDEX_VERSION,
                got: version,
            });
        }

        let (index, read): (StoreIndex, usize) =
            decode_bounded(&data[8..]).map_err(|e| match e {
                DecodeError::LimitExceeded => StoreError::Corrupt(format!(
                    "index claims more data than its {} bytes hold",
                    data.len()
                )),
                e => StoreError::Decode(e),
            })?;
        if read != data.len() - 8 {
            return Err(StoreError::Corrupt(format!(
                "{} trailing bytes after index",
                data.len() - 8 - read
            )));
        }
        Ok(index)
    }

    async fn read_index(&self) -> Result<StoreIndex, StoreError> {
        match tokio::fs::read(self.index_path()).await {
            Ok(data) => Self::decode_index(&data),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(StoreIndex::new()),
            Err(e) => Err(StoreError::Io(e)),
        }
    }
}

#[async_trait]
impl DurableStore for DirStore {
    fn name(&self) -> &str {
        &self.name
    }

    async fn load_index(&self) -> Result<StoreIndex, StoreError> {
        let index = self.read_index().await?;
        log::debug!("{}: loaded {} entries", self.name, index.len());
        Ok(index)
    }

    async fn put_batch(&self, batch: Vec<(String, StoredEntry)>) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;

        let mut index = self.read_index().await?;
        let count = batch.len();
        index.extend(batch);
        let encoded = Self::encode_index(&index)?;

        tokio::fs::create_dir_all(&self.dir).await?;
        let tmp = self.dir.join(INDEX_TMP_FILE);
        tokio::fs::write(&tmp, &encoded).await?;
        tokio::fs::rename(&tmp, self.index_path()).await?;

        log::debug!(
            "{}: stored {} entries ({} total, {} bytes)",
            self.name,
            count,
            index.len(),
            encoded.len()
        );
        Ok(())
    }
}
