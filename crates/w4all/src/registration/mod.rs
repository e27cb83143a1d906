// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Registration side-channel (install / uninstall).
//!
//! Writes the records a host uses to discover this module, one per class:
//!
//! ```text
//! Software\Classes\CLSID\{clsid}            (default) = description
//! +-- InProcServer32                        (default) = module file path
//!                                           ThreadingModel = Both
//! ```
//!
//! Nothing here is reachable from activation; a registration failure never
//! changes what [`crate::Module::get_class_object`] returns.

mod store;

pub use store::{FileStore, MemoryStore, RecordKey, RecordStore};

use std::path::Path;

use crate::error::{Error, RegistrationError, Result};
use crate::guid::ClassId;
use crate::registry::{ClassTable, ThreadingModel};

/// Parent key of every class record.
pub const CLSID_KEY_ROOT: &str = "Software\\Classes\\CLSID";
/// Subkey holding the module path.
pub const INPROC_SERVER_KEY: &str = "InProcServer32";
/// Named value holding the threading model.
pub const THREADING_MODEL_VALUE: &str = "ThreadingModel";

/// `Software\Classes\CLSID\{clsid}`
pub fn object_key_name(clsid: ClassId) -> String {
    format!("{}\\{}", CLSID_KEY_ROOT, clsid)
}

/// Record as read back from a store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisteredClass {
    pub clsid: ClassId,
    pub description: Option<String>,
    pub module_path: Option<String>,
    pub threading_model: Option<String>,
}

/// Write the record for one class.
///
/// Sub-steps run in order and stop at the first failure; whatever was already
/// written stays written.
pub fn register_object(
    store: &mut dyn RecordStore,
    module_path: &Path,
    clsid: ClassId,
    description: &str,
    threading_model: ThreadingModel,
) -> std::result::Result<(), RegistrationError> {
    let key = object_key_name(clsid);
    store.set_value(&key, None, description)?;

    let inproc = format!("{}\\{}", key, INPROC_SERVER_KEY);
    store.set_value(&inproc, None, &module_path.to_string_lossy())?;
    store.set_value(
        &inproc,
        Some(THREADING_MODEL_VALUE),
        threading_model.as_str(),
    )?;

    log::info!(
        "[registry] registered {} ({}) -> {}",
        clsid,
        description,
        module_path.display()
    );
    Ok(())
}

/// Delete the record subtree for one class. Returns whether it existed.
pub fn unregister_object(
    store: &mut dyn RecordStore,
    clsid: ClassId,
) -> std::result::Result<bool, RegistrationError> {
    let existed = store.delete_tree(&object_key_name(clsid))?;
    if existed {
        log::info!("[registry] unregistered {}", clsid);
    }
    Ok(existed)
}

/// Register every class of `classes`, in table order.
///
/// Stops at the first failing class and reports it. Records written before
/// the failure are still flushed, not rolled back.
pub fn register_server(
    store: &mut dyn RecordStore,
    classes: &ClassTable,
    module_path: &Path,
    threading_override: Option<ThreadingModel>,
) -> Result<()> {
    let written = classes.iter().try_for_each(|init| {
        register_object(
            store,
            module_path,
            init.clsid,
            init.description,
            threading_override.unwrap_or(init.threading_model),
        )
    });
    let flushed = store.flush();
    written.and(flushed).map_err(Error::Registration)
}

/// Unregister every class of `classes`, in reverse table order.
///
/// Every class is attempted; the first failure is reported. Classes that were
/// never registered are not an error.
pub fn unregister_server(store: &mut dyn RecordStore, classes: &ClassTable) -> Result<()> {
    let mut first_error = None;
    let entries: Vec<_> = classes.iter().collect();
    for init in entries.into_iter().rev() {
        if let Err(e) = unregister_object(store, init.clsid) {
            first_error.get_or_insert(e);
        }
    }
    if let Err(e) = store.flush() {
        first_error.get_or_insert(e);
    }
    match first_error {
        Some(e) => Err(Error::Registration(e)),
        None => Ok(()),
    }
}

/// Read back the records of `classes` that are present in `store`.
pub fn registered_classes(store: &dyn RecordStore, classes: &ClassTable) -> Vec<RegisteredClass> {
    let present = store.subkeys(CLSID_KEY_ROOT);
    classes
        .iter()
        .filter(|init| present.contains(&init.clsid.to_string()))
        .map(|init| {
            let key = object_key_name(init.clsid);
            let inproc = format!("{}\\{}", key, INPROC_SERVER_KEY);
            RegisteredClass {
                clsid: init.clsid,
                description: store.get_value(&key, None),
                module_path: store.get_value(&inproc, None),
                threading_model: store.get_value(&inproc, Some(THREADING_MODEL_VALUE)),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::{CLSID_W4ALL_SINK, CLSID_W4ALL_SOURCE};

    const MODULE: &str = "/usr/lib/w4all/libw4all_c.so";

    #[test]
    fn test_object_key_name() {
        let clsid = ClassId::from_u128(0x1);
        assert_eq!(
            object_key_name(clsid),
            "Software\\Classes\\CLSID\\{00000000-0000-0000-0000-000000000001}"
        );
    }

    #[test]
    fn test_register_server_writes_every_class() {
        let mut store = MemoryStore::new();
        register_server(&mut store, &ClassTable::builtin(), Path::new(MODULE), None).unwrap();

        let records = registered_classes(&store, &ClassTable::builtin());
        assert_eq!(records.len(), 2);
        let source = &records[0];
        assert_eq!(source.clsid, CLSID_W4ALL_SOURCE);
        assert_eq!(
            source.description.as_deref(),
            Some("Doubango Telecom WebRTC4All audio/video Source")
        );
        assert_eq!(source.module_path.as_deref(), Some(MODULE));
        assert_eq!(source.threading_model.as_deref(), Some("Both"));
    }

    #[test]
    fn test_threading_override() {
        let mut store = MemoryStore::new();
        register_server(
            &mut store,
            &ClassTable::builtin(),
            Path::new(MODULE),
            Some(ThreadingModel::Apartment),
        )
        .unwrap();
        for record in registered_classes(&store, &ClassTable::builtin()) {
            assert_eq!(record.threading_model.as_deref(), Some("Apartment"));
        }
    }

    #[test]
    fn test_unregister_server_is_idempotent() {
        let mut store = MemoryStore::new();
        let classes = ClassTable::builtin();
        register_server(&mut store, &classes, Path::new(MODULE), None).unwrap();
        store.set_value("Software\\Classes\\CLSID\\{OTHER}", None, "keep").unwrap();

        unregister_server(&mut store, &classes).unwrap();
        assert!(registered_classes(&store, &classes).is_empty());
        assert!(!store.contains_key(&object_key_name(CLSID_W4ALL_SINK)));
        assert!(store.contains_key("Software\\Classes\\CLSID\\{OTHER}"));

        unregister_server(&mut store, &classes).unwrap();
    }
}
