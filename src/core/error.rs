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

/// Bridge error types
use thiserror::Error;

use super::bridge::BridgeState;

/// Result type for bridge operations
pub type Result<T> = std::result::Result<T, BridgeError>;

/// Main error type for the persistence bridge
#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("Bridge is not ready (current state: {state})")]
    NotReady { state: BridgeState },

    #[error("Filesystem error: {0}")]
    Fs(#[from] FsError),

    #[error("Failed to create directory {path}: {source}")]
    Bootstrap {
        path: String,
        #[source]
        source: FsError,
    },

    #[error("Import from durable store failed: {0}")]
    Import(#[source] StoreError),

    #[error("Export to durable store failed: {0}")]
    Export(#[source] StoreError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// In-memory filesystem error types
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FsError {
    #[error("No such file or directory: {0}")]
    NotFound(String),

    #[error("Directory already exists: {0}")]
    AlreadyExists(String),

    #[error("A file already occupies {0}")]
    FileExists(String),

    #[error("Not a directory: {0}")]
    NotADirectory(String),

    #[error("Is a directory: {0}")]
    IsADirectory(String),

    #[error("Invalid path: {0:?}")]
    InvalidPath(String),
}

/// Durable store error types
///
/// The original cause is always carried through to the caller.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Durable store unavailable: {0}")]
    Unavailable(String),

    #[error("Corrupt store index: {0}")]
    Corrupt(String),

    #[error("Incompatible store index version: expected {expected}, got {got}")]
    IncompatibleVersion { expected: u32, got: u32 },

    #[error("Encode error: {0}")]
    Encode(#[from] bincode::error::EncodeError),

    #[error("Decode error: {0}")]
    Decode(#[from] bincode::error::DecodeError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Upload classification error types
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClassifyError {
    #[error("Invalid upload filename: {0:?}")]
    InvalidFilename(String),

    #[error("Unrecognized file extension: {0}")]
    MissingExtension(String),

    #[error("Unrecognized file extension .{extension} on {filename}")]
    UnrecognizedExtension { filename: String, extension: String },

    #[error("{filename} is a {class} file, not accepted as {kind}")]
    KindMismatch {
        filename: String,
        class: &'static str,
        kind: &'static str,
    },
}

/// Save state file error types
#[derive(Error, Debug)]
pub enum SaveStateError {
    #[error("Save state encode error: {0}")]
    Encode(#[from] bincode::error::EncodeError),

    #[error("Save state decode error: {0}")]
    Decode(#[from] bincode::error::DecodeError),

    #[error("Incompatible save state version: expected {expected}, got {got}")]
    IncompatibleVersion { expected: u32, got: u32 },
}
