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

//! Bridge configuration
//!
//! Read from a TOML file, then overridden by environment variables:
//!
//! ```toml
//! root = "/data"
//! store_dir = "./savebridge-store"
//! import_failure = "abort"    # or "start-empty"
//! auto_export = true
//! ```
//!
//! | Variable                     | Field            |
//! |------------------------------|------------------|
//! | `SAVEBRIDGE_ROOT`            | `root`           |
//! | `SAVEBRIDGE_STORE_DIR`       | `store_dir`      |
//! | `SAVEBRIDGE_IMPORT_FAILURE`  | `import_failure` |

use super::error::{BridgeError, Result};
use super::layout::DEFAULT_ROOT;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

pub const ENV_ROOT: &str = "SAVEBRIDGE_ROOT";
pub const ENV_STORE_DIR: &str = "SAVEBRIDGE_STORE_DIR";
pub const ENV_IMPORT_FAILURE: &str = "SAVEBRIDGE_IMPORT_FAILURE";

/// What mount does when the durable store cannot be read
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum ImportFailurePolicy {
    /// Fail the mount; the bridge stays unusable
    #[default]
    Abort,
    /// Log the error and continue with an empty tree
    StartEmpty,
}

impl FromStr for ImportFailurePolicy {
    type Err = BridgeError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "abort" => Ok(ImportFailurePolicy::Abort),
            "start-empty" => Ok(ImportFailurePolicy::StartEmpty),
            other => Err(BridgeError::Config(format!(
                "unknown import failure policy {:?} (expected \"abort\" or \"start-empty\")",
                other
            ))),
        }
    }
}

impl fmt::Display for ImportFailurePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImportFailurePolicy::Abort => f.write_str("abort"),
            ImportFailurePolicy::StartEmpty => f.write_str("start-empty"),
        }
    }
}

/// Bridge configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BridgeConfig {
    /// Mount point of the in-memory tree
    pub root: String,

    /// Host directory backing the durable store
    pub store_dir: PathBuf,

    pub import_failure: ImportFailurePolicy,

    /// Export after every successful ingest, save-state and screenshot
    pub auto_export: bool,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            root: DEFAULT_ROOT.to_string(),
            store_dir: PathBuf::from("./savebridge-store"),
            import_failure: ImportFailurePolicy::default(),
            auto_export: true,
        }
    }
}

impl BridgeConfig {
    /// Parse a TOML document; missing fields take their defaults
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| BridgeError::Config(e.to_string()))
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| BridgeError::Config(e.to_string()))
    }

    /// Load configuration from a TOML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        log::debug!("Loading configuration from {}", path.display());
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Apply the `SAVEBRIDGE_*` environment variables
    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary variable lookup
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(root) = lookup(ENV_ROOT) {
            self.root = root;
        }
        if let Some(dir) = lookup(ENV_STORE_DIR) {
            self.store_dir = PathBuf::from(dir);
        }
        if let Some(policy) = lookup(ENV_IMPORT_FAILURE) {
            self.import_failure = policy.parse()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = BridgeConfig::default();
        assert_eq!(config.root, "/data");
        assert_eq!(config.store_dir, PathBuf::from("./savebridge-store"));
        assert_eq!(config.import_failure, ImportFailurePolicy::Abort);
        assert!(config.auto_export);
    }

    #[test]
    fn test_config_serialization() {
        let config = BridgeConfig {
            import_failure: ImportFailurePolicy::StartEmpty,
            ..BridgeConfig::default()
        };
        let toml_str = config.to_toml().unwrap();
        assert!(toml_str.contains("import_failure = \"start-empty\""));
        assert_eq!(BridgeConfig::from_toml(&toml_str).unwrap(), config);
    }

    #[test]
    fn test_partial_file() {
        let config = BridgeConfig::from_toml("root = \"/persist\"\n").unwrap();
        assert_eq!(config.root, "/persist");
        assert!(config.auto_export);
    }

    #[test]
    fn test_invalid_policy() {
        assert!(BridgeConfig::from_toml("import_failure = \"retry\"").is_err());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "store_dir = \"/var/lib/savebridge\"").unwrap();
        writeln!(file, "auto_export = false").unwrap();

        let config = BridgeConfig::load_from_file(file.path()).unwrap();
        assert_eq!(config.store_dir, PathBuf::from("/var/lib/savebridge"));
        assert!(!config.auto_export);
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            BridgeConfig::load_from_file("/nonexistent/savebridge.toml"),
            Err(BridgeError::Io(_))
        ));
    }

    #[test]
    fn test_overrides() {
        let vars: HashMap<&str, &str> = [
            (ENV_ROOT, "/mnt"),
            (ENV_IMPORT_FAILURE, "Start-Empty"),
        ]
        .into_iter()
        .collect();

        let mut config = BridgeConfig::default();
        config
            .apply_overrides(|k| vars.get(k).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.root, "/mnt");
        assert_eq!(config.import_failure, ImportFailurePolicy::StartEmpty);
        assert_eq!(config.store_dir, PathBuf::from("./savebridge-store"));
    }

    #[test]
    fn test_bad_override() {
        let mut config = BridgeConfig::default();
        let result = config.apply_overrides(|k| (k == ENV_IMPORT_FAILURE).then(|| "maybe".to_string()));
        assert!(matches!(result, Err(BridgeError::Config(_))));
    }
}
