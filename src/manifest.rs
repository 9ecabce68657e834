//! Persisted source-size manifest for the optimizer.
//!
//! A flat JSON object mapping each source image's path (relative to the
//! images root) to its byte size when derivatives were last considered:
//!
//! ```json
//! {
//!   "gallery/photo.jpg": 500000
//! }
//! ```
//!
//! The manifest is read once at the start of a run and rewritten in full at
//! the end. Entries for deleted sources are left in place.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::filesystem::write_json_atomic;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SizeManifest {
    entries: BTreeMap<String, u64>,
}

/// Result of loading a manifest. Loading never fails; problems become a
/// warning and an empty manifest.
#[derive(Debug)]
pub struct ManifestLoad {
    pub manifest: SizeManifest,
    pub warning: Option<String>,
}

impl SizeManifest {
    pub fn load(path: &Path) -> ManifestLoad {
        if !path.exists() {
            return ManifestLoad {
                manifest: Self::default(),
                warning: None,
            };
        }
        match Self::read(path) {
            Ok(manifest) => ManifestLoad {
                manifest,
                warning: None,
            },
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %format!("{err:#}"), "manifest unreadable");
                ManifestLoad {
                    manifest: Self::default(),
                    warning: Some(format!("{err:#}")),
                }
            }
        }
    }

    fn read(path: &Path) -> Result<Self> {
        let bytes =
            fs::read(path).with_context(|| format!("reading manifest '{}'", path.display()))?;
        serde_json::from_slice(&bytes)
            .with_context(|| format!("parsing manifest '{}'", path.display()))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        write_json_atomic(path, self)
            .with_context(|| format!("writing manifest '{}'", path.display()))
    }

    pub fn get(&self, key: &str) -> Option<u64> {
        self.entries.get(key).copied()
    }

    /// Record the last-seen size for `key`.
    pub fn record(&mut self, key: &str, size_bytes: u64) {
        self.entries.insert(key.to_string(), size_bytes);
    }

    /// True when `key` is absent or recorded with a different size.
    pub fn size_changed(&self, key: &str, current_size: u64) -> bool {
        self.get(key) != Some(current_size)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
