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

//! In-memory filesystem
//!
//! A synchronous, process-local namespace that the emulator core reads and
//! writes directly. Paths are absolute and `/`-separated. Nodes are kept in
//! a sorted map keyed by their normalized path, so a parent always sorts
//! before its children.
//!
//! Every mutation bumps a generation counter and stamps the touched node
//! with it. The sync engine uses the stamps to find what changed since the
//! last export.

use super::error::FsError;
use chrono::Utc;
use std::collections::BTreeMap;

/// Node payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Directory,
    File(Vec<u8>),
}

/// Filesystem node
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    kind: NodeKind,
    generation: u64,
    modified_ms: i64,
}

impl Node {
    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    pub fn is_dir(&self) -> bool {
        matches!(self.kind, NodeKind::Directory)
    }

    /// Generation of the last change to this node
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Last modification time, milliseconds since the Unix epoch
    pub fn modified_ms(&self) -> i64 {
        self.modified_ms
    }
}

/// In-memory filesystem
#[derive(Debug, Clone)]
pub struct MemFs {
    nodes: BTreeMap<String, Node>,
    generation: u64,
    mount_point: Option<String>,
}

/// Normalize an absolute path
///
/// Empty components and `.` are dropped; `..` and relative paths are
/// refused.
pub fn normalize(path: &str) -> Result<String, FsError> {
    if !path.starts_with('/') {
        return Err(FsError::InvalidPath(path.to_string()));
    }

    let mut out = String::with_capacity(path.len());
    for component in path.split('/') {
        match component {
            "" | "." => continue,
            ".." => return Err(FsError::InvalidPath(path.to_string())),
            c => {
                out.push('/');
                out.push_str(c);
            }
        }
    }

    if out.is_empty() {
        out.push('/');
    }
    Ok(out)
}

/// Parent of a normalized path (the root is its own parent)
pub fn parent(path: &str) -> &str {
    match path.rsplit_once('/') {
        Some(("", _)) | None => "/",
        Some((parent, _)) => parent,
    }
}

/// Final component of a path
pub fn file_name(path: &str) -> &str {
    path.rsplit_once('/').map_or(path, |(_, name)| name)
}

/// Join a directory and a child name
pub fn join(dir: &str, name: &str) -> String {
    if dir.ends_with('/') {
        format!("{}{}", dir, name)
    } else {
        format!("{}/{}", dir, name)
    }
}

impl MemFs {
    /// Create a filesystem containing only the root directory
    pub fn new() -> Self {
        let mut nodes = BTreeMap::new();
        nodes.insert(
            "/".to_string(),
            Node {
                kind: NodeKind::Directory,
                generation: 0,
                modified_ms: Utc::now().timestamp_millis(),
            },
        );
        Self {
            nodes,
            generation: 0,
            mount_point: None,
        }
    }

    /// Current generation counter
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Directory backed by the durable store, if mounted
    pub fn mount_point(&self) -> Option<&str> {
        self.mount_point.as_deref()
    }

    /// Create the mount directory (and its ancestors) and mark it as
    /// durable-backed
    pub fn mount(&mut self, path: &str) -> Result<(), FsError> {
        let path = normalize(path)?;
        let mut current = String::new();
        for component in path.split('/').filter(|c| !c.is_empty()) {
            current.push('/');
            current.push_str(component);
            match self.mkdir(&current) {
                Ok(()) | Err(FsError::AlreadyExists(_)) => {}
                Err(e) => return Err(e),
            }
        }
        log::debug!("Mounted durable store at {}", path);
        self.mount_point = Some(path);
        Ok(())
    }

    fn next_generation(&mut self) -> u64 {
        self.generation += 1;
        self.generation
    }

    fn check_parent(&self, path: &str) -> Result<(), FsError> {
        let parent = parent(path);
        match self.nodes.get(parent) {
            None => Err(FsError::NotFound(parent.to_string())),
            Some(node) if !node.is_dir() => Err(FsError::NotADirectory(parent.to_string())),
            Some(_) => Ok(()),
        }
    }

    /// Create a single directory
    ///
    /// # Errors
    ///
    /// - `AlreadyExists` if a directory is already there
    /// - `FileExists` if a regular file occupies the path
    /// - `NotFound` / `NotADirectory` if the parent is missing or a file
    pub fn mkdir(&mut self, path: &str) -> Result<(), FsError> {
        let path = normalize(path)?;
        if let Some(node) = self.nodes.get(&path) {
            return Err(if node.is_dir() {
                FsError::AlreadyExists(path)
            } else {
                FsError::FileExists(path)
            });
        }
        self.check_parent(&path)?;

        let generation = self.next_generation();
        self.nodes.insert(
            path,
            Node {
                kind: NodeKind::Directory,
                generation,
                modified_ms: Utc::now().timestamp_millis(),
            },
        );
        Ok(())
    }

    /// Write a file, replacing any existing file of the same name
    pub fn write_file(&mut self, path: &str, data: &[u8]) -> Result<(), FsError> {
        let path = normalize(path)?;
        self.write_node(path, data.to_vec(), Utc::now().timestamp_millis())
    }

    fn write_node(&mut self, path: String, data: Vec<u8>, modified_ms: i64) -> Result<(), FsError> {
        if self.nodes.get(&path).is_some_and(Node::is_dir) {
            return Err(FsError::IsADirectory(path));
        }
        self.check_parent(&path)?;

        let generation = self.next_generation();
        log::trace!("write {} ({} bytes, gen {})", path, data.len(), generation);
        self.nodes.insert(
            path,
            Node {
                kind: NodeKind::File(data),
                generation,
                modified_ms,
            },
        );
        Ok(())
    }

    /// Insert a node restored from the durable store
    ///
    /// Directories that already exist are left alone; files are
    /// overwritten and keep their stored modification time.
    pub fn restore(&mut self, path: &str, kind: NodeKind, modified_ms: i64) -> Result<(), FsError> {
        let path = normalize(path)?;
        match kind {
            NodeKind::Directory => match self.mkdir(&path) {
                Ok(()) | Err(FsError::AlreadyExists(_)) => Ok(()),
                Err(e) => Err(e),
            },
            NodeKind::File(data) => self.write_node(path, data, modified_ms),
        }
    }

    /// Read a file
    pub fn read_file(&self, path: &str) -> Result<&[u8], FsError> {
        let path = normalize(path)?;
        match self.nodes.get(&path) {
            None => Err(FsError::NotFound(path)),
            Some(Node {
                kind: NodeKind::File(data),
                ..
            }) => Ok(data),
            Some(_) => Err(FsError::IsADirectory(path)),
        }
    }

    pub fn exists(&self, path: &str) -> bool {
        normalize(path).is_ok_and(|p| self.nodes.contains_key(&p))
    }

    pub fn is_dir(&self, path: &str) -> bool {
        self.node(path).is_some_and(Node::is_dir)
    }

    pub fn is_file(&self, path: &str) -> bool {
        self.node(path).is_some_and(|n| !n.is_dir())
    }

    pub fn node(&self, path: &str) -> Option<&Node> {
        normalize(path).ok().and_then(|p| self.nodes.get(&p))
    }

    /// List the names of a directory's direct children, sorted
    pub fn read_dir(&self, path: &str) -> Result<Vec<String>, FsError> {
        let path = normalize(path)?;
        match self.nodes.get(&path) {
            None => return Err(FsError::NotFound(path)),
            Some(node) if !node.is_dir() => return Err(FsError::NotADirectory(path)),
            Some(_) => {}
        }

        let prefix = join(&path, "");
        Ok(self
            .nodes
            .range(prefix.clone()..)
            .take_while(|(p, _)| p.starts_with(&prefix))
            .map(|(p, _)| &p[prefix.len()..])
            .filter(|rest| !rest.is_empty() && !rest.contains('/'))
            .map(str::to_string)
            .collect())
    }

    /// Iterate over every node strictly below `root`, parents first
    pub fn descendants<'a>(&'a self, root: &str) -> impl Iterator<Item = (&'a str, &'a Node)> + 'a {
        let prefix = join(root, "");
        self.nodes
            .range(prefix.clone()..)
            .take_while(move |(p, _)| p.starts_with(&prefix))
            .map(|(p, n)| (p.as_str(), n))
    }

    /// Total number of nodes, root included
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }
}

impl Default for MemFs {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("/").unwrap(), "/");
        assert_eq!(normalize("/data//games/").unwrap(), "/data/games");
        assert_eq!(normalize("/data/./saves").unwrap(), "/data/saves");
        assert!(normalize("data").is_err());
        assert!(normalize("/data/../etc").is_err());
    }

    #[test]
    fn test_parent_and_name() {
        assert_eq!(parent("/data/games"), "/data");
        assert_eq!(parent("/data"), "/");
        assert_eq!(parent("/"), "/");
        assert_eq!(file_name("/data/games/zelda.gba"), "zelda.gba");
        assert_eq!(join("/data", "games"), "/data/games");
        assert_eq!(join("/", "data"), "/data");
    }

    #[test]
    fn test_mkdir_errors() {
        let mut fs = MemFs::new();
        fs.mkdir("/data").unwrap();
        assert_eq!(
            fs.mkdir("/data"),
            Err(FsError::AlreadyExists("/data".to_string()))
        );
        assert_eq!(
            fs.mkdir("/missing/child"),
            Err(FsError::NotFound("/missing".to_string()))
        );

        fs.write_file("/data/file", b"x").unwrap();
        assert_eq!(
            fs.mkdir("/data/file"),
            Err(FsError::FileExists("/data/file".to_string()))
        );
        assert_eq!(
            fs.mkdir("/data/file/sub"),
            Err(FsError::NotADirectory("/data/file".to_string()))
        );
    }

    #[test]
    fn test_write_and_overwrite() {
        let mut fs = MemFs::new();
        fs.mkdir("/data").unwrap();
        fs.write_file("/data/a.sav", b"one").unwrap();
        fs.write_file("/data/a.sav", b"two").unwrap();
        assert_eq!(fs.read_file("/data/a.sav").unwrap(), b"two");
        assert!(fs.is_file("/data/a.sav"));
        assert!(!fs.is_dir("/data/a.sav"));
    }

    #[test]
    fn test_write_requires_parent() {
        let mut fs = MemFs::new();
        assert!(matches!(
            fs.write_file("/nowhere/a.gba", b"x"),
            Err(FsError::NotFound(_))
        ));
        fs.mkdir("/dir").unwrap();
        assert!(matches!(
            fs.write_file("/dir", b"x"),
            Err(FsError::IsADirectory(_))
        ));
    }

    #[test]
    fn test_read_dir_lists_direct_children() {
        let mut fs = MemFs::new();
        fs.mount("/data").unwrap();
        fs.mkdir("/data/games").unwrap();
        fs.mkdir("/data/gamesx").unwrap();
        fs.write_file("/data/games/b.gba", b"b").unwrap();
        fs.write_file("/data/games/a.gba", b"a").unwrap();
        fs.mkdir("/data/games/sub").unwrap();
        fs.write_file("/data/games/sub/c.gba", b"c").unwrap();

        assert_eq!(
            fs.read_dir("/data/games").unwrap(),
            vec!["a.gba", "b.gba", "sub"]
        );
        assert_eq!(fs.read_dir("/data").unwrap(), vec!["games", "gamesx"]);
    }

    #[test]
    fn test_generation_tracks_changes() {
        let mut fs = MemFs::new();
        fs.mount("/data").unwrap();
        let before = fs.generation();
        fs.write_file("/data/x.sav", b"1").unwrap();
        let node = fs.node("/data/x.sav").unwrap();
        assert!(node.generation() > before);
        assert_eq!(node.generation(), fs.generation());

        // Failed operations leave the counter alone
        let gen = fs.generation();
        let _ = fs.mkdir("/data");
        assert_eq!(fs.generation(), gen);
    }

    #[test]
    fn test_mount_is_idempotent() {
        let mut fs = MemFs::new();
        fs.mount("/data/nested").unwrap();
        fs.mount("/data/nested").unwrap();
        assert!(fs.is_dir("/data"));
        assert_eq!(fs.mount_point(), Some("/data/nested"));
    }

    #[test]
    fn test_descendants_exclude_root_and_siblings() {
        let mut fs = MemFs::new();
        fs.mount("/data").unwrap();
        fs.mkdir("/data2").unwrap();
        fs.mkdir("/data/games").unwrap();

        let paths: Vec<&str> = fs.descendants("/data").map(|(p, _)| p).collect();
        assert_eq!(paths, vec!["/data/games"]);
    }

    #[test]
    fn test_restore_keeps_mtime() {
        let mut fs = MemFs::new();
        fs.mount("/data").unwrap();
        fs.restore("/data/games", NodeKind::Directory, 1).unwrap();
        fs.restore("/data/games", NodeKind::Directory, 1).unwrap();
        fs.restore("/data/games/a.gba", NodeKind::File(vec![1, 2]), 42)
            .unwrap();
        assert_eq!(fs.node("/data/games/a.gba").unwrap().modified_ms(), 42);
        assert_eq!(fs.read_file("/data/games/a.gba").unwrap(), &[1, 2]);
    }
}
