// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Hierarchical name/value record stores.
//!
//! Keys are backslash-separated paths (`Software\Classes\CLSID\{...}`). Each
//! key has an optional default value, named string values and subkeys.
//!
//! # Example JSON (`FileStore`)
//!
//! ```json
//! {
//!   "subkeys": {
//!     "Software": { "subkeys": { "Classes": { "subkeys": { "CLSID": { "subkeys": {
//!       "{0F2C5C4D-3B12-4E8A-9A3F-5D7E1C2B4A60}": {
//!         "default": "Doubango Telecom WebRTC4All audio/video Source",
//!         "subkeys": {
//!           "InProcServer32": {
//!             "default": "/usr/lib/libw4all_c.so",
//!             "values": { "ThreadingModel": "Both" }
//!           }
//!         }
//!       }
//!     } } } } } }
//!   }
//! }
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::RegistrationError;

/// Storage backend for registration records.
pub trait RecordStore {
    /// Create `key` (and parents) if needed and set the default value
    /// (`name == None`) or a named value.
    fn set_value(
        &mut self,
        key: &str,
        name: Option<&str>,
        data: &str,
    ) -> Result<(), RegistrationError>;

    /// Read a default or named value.
    fn get_value(&self, key: &str, name: Option<&str>) -> Option<String>;

    /// Names of the direct subkeys of `key`.
    fn subkeys(&self, key: &str) -> Vec<String>;

    /// Delete `key` and everything below it. Returns whether it existed.
    fn delete_tree(&mut self, key: &str) -> Result<bool, RegistrationError>;

    /// Persist pending changes.
    fn flush(&mut self) -> Result<(), RegistrationError> {
        Ok(())
    }
}

/// One key of the record tree.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordKey {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub values: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub subkeys: BTreeMap<String, RecordKey>,
}

impl RecordKey {
    fn find(&self, path: &[&str]) -> Option<&RecordKey> {
        path.iter()
            .try_fold(self, |node, segment| node.subkeys.get(*segment))
    }

    fn create(&mut self, path: &[&str]) -> &mut RecordKey {
        path.iter().fold(self, |node, segment| {
            node.subkeys.entry((*segment).to_string()).or_default()
        })
    }

    fn remove(&mut self, path: &[&str]) -> bool {
        let Some((last, parents)) = path.split_last() else {
            return false;
        };
        let mut node = self;
        for segment in parents {
            match node.subkeys.get_mut(*segment) {
                Some(child) => node = child,
                None => return false,
            }
        }
        node.subkeys.remove(*last).is_some()
    }
}

fn split_key(key: &str) -> Result<Vec<&str>, RegistrationError> {
    let segments: Vec<&str> = key.split('\\').collect();
    if segments.iter().any(|s| s.is_empty()) {
        return Err(RegistrationError::InvalidKey(key.to_string()));
    }
    Ok(segments)
}

/// Volatile store, used by tests and dry runs.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    root: RecordKey,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Root of the record tree.
    pub fn root(&self) -> &RecordKey {
        &self.root
    }

    /// Whether `key` exists.
    pub fn contains_key(&self, key: &str) -> bool {
        split_key(key)
            .ok()
            .and_then(|path| self.root.find(&path))
            .is_some()
    }
}

impl RecordStore for MemoryStore {
    fn set_value(
        &mut self,
        key: &str,
        name: Option<&str>,
        data: &str,
    ) -> Result<(), RegistrationError> {
        let path = split_key(key)?;
        let node = self.root.create(&path);
        match name {
            None => node.default = Some(data.to_string()),
            Some(name) => {
                node.values.insert(name.to_string(), data.to_string());
            }
        }
        Ok(())
    }

    fn get_value(&self, key: &str, name: Option<&str>) -> Option<String> {
        let path = split_key(key).ok()?;
        let node = self.root.find(&path)?;
        match name {
            None => node.default.clone(),
            Some(name) => node.values.get(name).cloned(),
        }
    }

    fn subkeys(&self, key: &str) -> Vec<String> {
        split_key(key)
            .ok()
            .and_then(|path| self.root.find(&path))
            .map(|node| node.subkeys.keys().cloned().collect())
            .unwrap_or_default()
    }

    fn delete_tree(&mut self, key: &str) -> Result<bool, RegistrationError> {
        let path = split_key(key)?;
        Ok(self.root.remove(&path))
    }
}

/// JSON file-backed store. Changes are staged in memory and written by
/// [`RecordStore::flush`].
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    records: MemoryStore,
    dirty: bool,
}

impl FileStore {
    /// Open `path`, starting empty if the file does not exist yet.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, RegistrationError> {
        let path = path.into();
        let root = match fs::read_to_string(&path) {
            Ok(text) if text.trim().is_empty() => RecordKey::default(),
            Ok(text) => serde_json::from_str(&text)
                .map_err(|e| RegistrationError::Corrupt(format!("{}: {}", path.display(), e)))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => RecordKey::default(),
            Err(e) => return Err(RegistrationError::Io(e)),
        };
        log::debug!("[registry] opened record store {}", path.display());
        Ok(Self {
            path,
            records: MemoryStore { root },
            dirty: false,
        })
    }

    /// Backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// In-memory view, including unflushed changes.
    pub fn records(&self) -> &MemoryStore {
        &self.records
    }
}

impl RecordStore for FileStore {
    fn set_value(
        &mut self,
        key: &str,
        name: Option<&str>,
        data: &str,
    ) -> Result<(), RegistrationError> {
        self.records.set_value(key, name, data)?;
        self.dirty = true;
        Ok(())
    }

    fn get_value(&self, key: &str, name: Option<&str>) -> Option<String> {
        self.records.get_value(key, name)
    }

    fn subkeys(&self, key: &str) -> Vec<String> {
        self.records.subkeys(key)
    }

    fn delete_tree(&mut self, key: &str) -> Result<bool, RegistrationError> {
        let existed = self.records.delete_tree(key)?;
        self.dirty |= existed;
        Ok(existed)
    }

    fn flush(&mut self) -> Result<(), RegistrationError> {
        if !self.dirty {
            return Ok(());
        }
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(&self.records.root)
            .map_err(|e| RegistrationError::Corrupt(e.to_string()))?;

        // Write-then-rename so a crash never leaves a truncated store.
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path)?;
        self.dirty = false;
        log::debug!("[registry] flushed record store {}", self.path.display());
        Ok(())
    }
}
