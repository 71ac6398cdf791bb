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


//! Custom assertions for bridge testing

use savebridge::core::{Bridge, Directory, EmulatorCore, MemFs, StoreIndex, StoredKind};

/// Assert the in-memory file at `path` has the expected contents
#[allow(dead_code)]
pub fn assert_file(fs: &MemFs, path: &str, expected: &[u8]) {
    let actual = fs
        .read_file(path)
        .unwrap_or_else(|e| panic!("{} not readable: {}", path, e));
    assert_eq!(
        actual,
        expected,
        "{} mismatch: expected {} bytes, got {} bytes",
        path,
        expected.len(),
        actual.len()
    );
}

/// Assert all five layout directories exist
#[allow(dead_code)]
pub fn assert_layout<C: EmulatorCore>(bridge: &Bridge<C>) {
    for dir in Directory::ALL {
        let path = bridge.layout().dir(dir);
        assert!(bridge.fs().is_dir(&path), "{} is not a directory", path);
    }
}

/// Assert a store index holds a file entry at `path`
#[allow(dead_code)]
pub fn assert_stored(index: &StoreIndex, path: &str) {
    let entry = index
        .get(path)
        .unwrap_or_else(|| panic!("{} not in store ({} entries)", path, index.len()));
    assert!(
        matches!(entry.kind, StoredKind::File(_)),
        "{} is stored as a directory",
        path
    );
}
