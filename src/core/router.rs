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

//! Content routing for host uploads
//!
//! Places raw byte buffers handed over by the host into the directory
//! their extension calls for. Contents are opaque here; validating a ROM
//! or save is the core's job.

use super::classifier::{classify_for, IngestKind, UploadClass};
use super::error::{ClassifyError, FsError};
use super::layout::Layout;
use super::memfs::MemFs;

/// Where an upload was placed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Routed {
    pub path: String,
    pub class: UploadClass,
}

/// Upload router
#[derive(Debug, Clone)]
pub struct ContentRouter {
    layout: Layout,
}

impl ContentRouter {
    pub fn new(layout: Layout) -> Self {
        Self { layout }
    }

    /// Compute the destination of an upload without writing it
    pub fn route(&self, filename: &str, kind: IngestKind) -> Result<Routed, ClassifyError> {
        let class = classify_for(filename, kind)?;
        Ok(Routed {
            path: self.layout.file(class.directory(), filename),
            class,
        })
    }

    /// Classify and write an upload
    ///
    /// Returns `Ok(None)` when the file is refused; nothing is written in
    /// that case. An existing file of the same name is overwritten.
    pub fn place(
        &self,
        fs: &mut MemFs,
        filename: &str,
        bytes: &[u8],
        kind: IngestKind,
    ) -> Result<Option<Routed>, FsError> {
        let routed = match self.route(filename, kind) {
            Ok(routed) => routed,
            Err(e) => {
                log::warn!("Refusing upload: {}", e);
                return Ok(None);
            }
        };

        fs.write_file(&routed.path, bytes)?;
        log::info!(
            "Stored {} {} ({} bytes) as {}",
            routed.class,
            filename,
            bytes.len(),
            routed.path
        );
        Ok(Some(routed))
    }
}
