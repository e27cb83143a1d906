// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! The module service: one class table plus one liveness counter.
//!
//! The C ABI uses the process-wide instance from [`Module::global`]; tests and
//! embedders build their own so counters stay isolated.

use std::path::Path;
use std::sync::{Arc, OnceLock};

use crate::com::{ComRef, IID_CLASS_FACTORY};
use crate::error::{Error, Result};
use crate::factory::ClassFactory;
use crate::guid::{ClassId, InterfaceId};
use crate::liveness::ModuleLiveness;
use crate::registration::{self, RecordStore};
use crate::registry::{ClassTable, ThreadingModel};

/// Activation entry points for one class table.
#[derive(Debug)]
pub struct Module {
    classes: ClassTable,
    liveness: Arc<ModuleLiveness>,
}

impl Module {
    /// Module over `classes` with a fresh liveness counter.
    pub fn new(classes: ClassTable) -> Self {
        Self::with_liveness(classes, Arc::new(ModuleLiveness::new()))
    }

    /// Module over `classes` sharing an existing counter.
    pub fn with_liveness(classes: ClassTable, liveness: Arc<ModuleLiveness>) -> Self {
        Self { classes, liveness }
    }

    /// Module over the built-in Source and Sink classes.
    pub fn builtin() -> Self {
        Self::new(ClassTable::builtin())
    }

    /// Process-wide module, initialized on first use.
    pub fn global() -> &'static Module {
        static MODULE: OnceLock<Module> = OnceLock::new();
        MODULE.get_or_init(|| {
            log::debug!("[module] initializing global module");
            Module::builtin()
        })
    }

    pub fn classes(&self) -> &ClassTable {
        &self.classes
    }

    pub fn liveness(&self) -> &Arc<ModuleLiveness> {
        &self.liveness
    }

    /// Activation entry point (`DllGetClassObject`).
    ///
    /// Returns a factory handle for `clsid` bound to `iid`. See
    /// [`ClassFactory::get_class_object`] for the failure contract.
    pub fn get_class_object(&self, clsid: ClassId, iid: InterfaceId) -> Result<ComRef> {
        ClassFactory::get_class_object(&self.classes, &self.liveness, clsid, iid)
    }

    /// Get a factory, build one instance bound to `iid`, drop the factory.
    pub fn create_instance(&self, clsid: ClassId, iid: InterfaceId) -> Result<ComRef> {
        let handle = self.get_class_object(clsid, IID_CLASS_FACTORY)?;
        let factory = handle
            .as_class_factory()
            .ok_or(Error::InterfaceNotSupported(IID_CLASS_FACTORY))?;
        factory.create_instance(None, iid)
    }

    /// Unload-safety entry point (`DllCanUnloadNow`). Advisory: re-check
    /// after any unload attempt.
    pub fn can_unload_now(&self) -> bool {
        self.liveness.can_unload()
    }

    /// Install: write a record for every class (`DllRegisterServer`).
    pub fn register_server(
        &self,
        store: &mut dyn RecordStore,
        module_path: &Path,
        threading_override: Option<ThreadingModel>,
    ) -> Result<()> {
        registration::register_server(store, &self.classes, module_path, threading_override)
    }

    /// Uninstall: delete every class record (`DllUnregisterServer`).
    pub fn unregister_server(&self, store: &mut dyn RecordStore) -> Result<()> {
        registration::unregister_server(store, &self.classes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::com::IID_MF_TRANSFORM;
    use crate::media::{SourceTransform, CLSID_W4ALL_SOURCE};

    #[test]
    fn test_create_instance_releases_factory() {
        let module = Module::builtin();
        let source = module
            .create_instance(CLSID_W4ALL_SOURCE, IID_MF_TRANSFORM)
            .unwrap();
        assert!(source.downcast_ref::<SourceTransform>().is_some());
        assert_eq!(module.liveness().count(), 1);
        drop(source);
        assert!(module.can_unload_now());
    }

    #[test]
    fn test_shared_liveness() {
        let liveness = Arc::new(ModuleLiveness::new());
        let a = Module::with_liveness(ClassTable::builtin(), Arc::clone(&liveness));
        let b = Module::with_liveness(ClassTable::builtin(), Arc::clone(&liveness));
        let handle = a.get_class_object(CLSID_W4ALL_SOURCE, IID_CLASS_FACTORY).unwrap();
        assert!(!b.can_unload_now());
        drop(handle);
        assert!(b.can_unload_now());
    }

    #[test]
    fn test_global_is_singleton() {
        assert!(std::ptr::eq(Module::global(), Module::global()));
        assert_eq!(Module::global().classes().len(), 2);
    }
}
