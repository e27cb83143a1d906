// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Class table: which type identifiers this module can build, and how.
//!
//! The table is an ordered, immutable sequence of [`ClassObjectInit`] entries.
//! Lookup is a linear scan (one entry per object kind, one lookup per
//! activation), first match wins. Duplicate identifiers are rejected when the
//! table is built.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::com::ComRef;
use crate::error::{Error, Result};
use crate::guid::{ClassId, InterfaceId};
use crate::liveness::ModuleLiveness;
use crate::media;

/// Constructor for one object kind.
///
/// Builds a new object, binds it to `iid` and returns the reference, or
/// reports why it could not. The liveness counter is passed so the object can
/// hold its own reference on the module for as long as it lives.
pub type CreateInstanceFn = fn(iid: InterfaceId, liveness: &Arc<ModuleLiveness>) -> Result<ComRef>;

/// Threading model advertised in the registration record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ThreadingModel {
    Apartment,
    Free,
    Both,
    Neutral,
}

impl ThreadingModel {
    /// Value written under `ThreadingModel`.
    pub const fn as_str(&self) -> &'static str {
        match self {
            ThreadingModel::Apartment => "Apartment",
            ThreadingModel::Free => "Free",
            ThreadingModel::Both => "Both",
            ThreadingModel::Neutral => "Neutral",
        }
    }
}

impl fmt::Display for ThreadingModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ThreadingModel {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "apartment" => Ok(ThreadingModel::Apartment),
            "free" => Ok(ThreadingModel::Free),
            "both" => Ok(ThreadingModel::Both),
            "neutral" => Ok(ThreadingModel::Neutral),
            _ => Err(format!("unknown threading model '{}'", s)),
        }
    }
}

/// One class table entry.
#[derive(Debug, Clone, Copy)]
pub struct ClassObjectInit {
    /// Type identifier the entry answers to.
    pub clsid: ClassId,
    /// Constructor invoked by the factory handle.
    pub create: CreateInstanceFn,
    /// Human-readable description (registration only).
    pub description: &'static str,
    /// Threading model tag (registration only).
    pub threading_model: ThreadingModel,
}

/// Classes supported by this module.
pub static BUILTIN_CLASSES: [ClassObjectInit; 2] = [
    ClassObjectInit {
        clsid: media::CLSID_W4ALL_SOURCE,
        create: media::create_source,
        description: "Doubango Telecom WebRTC4All audio/video Source",
        threading_model: ThreadingModel::Both,
    },
    ClassObjectInit {
        clsid: media::CLSID_W4ALL_SINK,
        create: media::create_sink,
        description: "Doubango Telecom WebRTC4All audio/video Sink",
        threading_model: ThreadingModel::Both,
    },
];

/// Immutable, validated class table.
#[derive(Debug, Clone)]
pub struct ClassTable {
    entries: Vec<ClassObjectInit>,
}

impl ClassTable {
    /// Build a table, rejecting duplicate type identifiers.
    pub fn new(entries: impl IntoIterator<Item = ClassObjectInit>) -> Result<Self> {
        let entries: Vec<ClassObjectInit> = entries.into_iter().collect();
        if let Some(clsid) = first_duplicate(&entries) {
            return Err(Error::DuplicateClass(clsid));
        }
        Ok(Self { entries })
    }

    /// Table holding the module's own Source and Sink classes.
    pub fn builtin() -> Self {
        debug_assert!(first_duplicate(&BUILTIN_CLASSES).is_none());
        Self {
            entries: BUILTIN_CLASSES.to_vec(),
        }
    }

    /// Entry for `clsid`, first match wins.
    pub fn lookup(&self, clsid: ClassId) -> Option<&ClassObjectInit> {
        self.entries.iter().find(|entry| entry.clsid == clsid)
    }

    /// Whether `clsid` has an entry.
    pub fn contains(&self, clsid: ClassId) -> bool {
        self.lookup(clsid).is_some()
    }

    /// Entries in table order.
    pub fn iter(&self) -> impl Iterator<Item = &ClassObjectInit> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn first_duplicate(entries: &[ClassObjectInit]) -> Option<ClassId> {
    let mut seen = HashSet::with_capacity(entries.len());
    entries
        .iter()
        .map(|entry| entry.clsid)
        .find(|clsid| !seen.insert(*clsid))
}
