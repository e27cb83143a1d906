// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Registration configuration from environment variables.
//!
//! | Variable | Meaning | Default |
//! |---|---|---|
//! | `W4ALL_REGISTRY_PATH` | record store file | `$XDG_CONFIG_HOME/w4all/registry.json`, then `$HOME/.config/w4all/registry.json`, then `./w4all-registry.json` |
//! | `W4ALL_THREADING_MODEL` | threading model written for every class | per-class value from the class table |
//!
//! Activation reads no configuration.

use std::env;
use std::path::PathBuf;

use crate::error::RegistrationError;
use crate::registration::FileStore;
use crate::registry::ThreadingModel;

pub const ENV_REGISTRY_PATH: &str = "W4ALL_REGISTRY_PATH";
pub const ENV_THREADING_MODEL: &str = "W4ALL_THREADING_MODEL";

/// Store file name under the configuration directory.
pub const REGISTRY_FILE_NAME: &str = "registry.json";
/// Store file used when no configuration directory is known.
pub const FALLBACK_REGISTRY_FILE: &str = "w4all-registry.json";

/// Where and how the registration side-channel writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationConfig {
    /// Record store file.
    pub registry_path: PathBuf,
    /// Threading model forced on every class, if set.
    pub threading_model: Option<ThreadingModel>,
}

impl Default for RegistrationConfig {
    fn default() -> Self {
        Self {
            registry_path: default_registry_path(
                env::var("XDG_CONFIG_HOME").ok().as_deref(),
                env::var("HOME").ok().as_deref(),
            ),
            threading_model: None,
        }
    }
}

impl RegistrationConfig {
    /// Load configuration from environment variables.
    ///
    /// Unparseable values are ignored with a warning and the default is kept.
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(path) = env::var_os(ENV_REGISTRY_PATH).filter(|p| !p.is_empty()) {
            config.registry_path = PathBuf::from(path);
        }

        if let Ok(value) = env::var(ENV_THREADING_MODEL) {
            match value.parse::<ThreadingModel>() {
                Ok(model) => config.threading_model = Some(model),
                Err(e) => log::warn!("[config] ignoring {}: {}", ENV_THREADING_MODEL, e),
            }
        }

        config
    }

    /// Override the record store file.
    #[must_use]
    pub fn with_registry_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.registry_path = path.into();
        self
    }

    /// Override the threading model.
    #[must_use]
    pub fn with_threading_model(mut self, model: ThreadingModel) -> Self {
        self.threading_model = Some(model);
        self
    }

    /// Open the configured record store.
    pub fn open_store(&self) -> Result<FileStore, RegistrationError> {
        FileStore::open(&self.registry_path)
    }
}

/// Default store location given `XDG_CONFIG_HOME` and `HOME`.
pub fn default_registry_path(xdg_config_home: Option<&str>, home: Option<&str>) -> PathBuf {
    if let Some(dir) = xdg_config_home.filter(|d| !d.is_empty()) {
        return PathBuf::from(dir).join("w4all").join(REGISTRY_FILE_NAME);
    }
    if let Some(home) = home.filter(|h| !h.is_empty()) {
        return PathBuf::from(home)
            .join(".config")
            .join("w4all")
            .join(REGISTRY_FILE_NAME);
    }
    PathBuf::from(FALLBACK_REGISTRY_FILE)
}
