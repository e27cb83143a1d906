// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Class factory handles.
//!
//! A [`ClassFactory`] wraps exactly one constructor from the class table and
//! exists to answer an activation request, after which the host drops it.
//!
//! # Lifetime
//!
//! ```text
//! get_class_object(clsid, iid)
//!   lookup ---- miss ----------------------------> UnsupportedType
//!   Arc::new(ClassFactory { guard })             liveness +1, refs = 1
//!   query(iid) -- unsupported --> drop handle    liveness -1, InterfaceNotSupported
//!   ComRef { factory, iid }                      caller owns the one reference
//!
//! retain -> refs + 1     release -> refs - 1     refs == 0 -> destroyed, liveness -1
//! ```
//!
//! The liveness decrement is tied to the handle's [`LivenessGuard`], so it runs
//! exactly once, when the last reference goes away, on every path.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::com::{ComRef, Unknown, IID_CLASS_FACTORY};
use crate::error::{Error, Result};
use crate::guid::{ClassId, InterfaceId};
use crate::liveness::{LivenessGuard, ModuleLiveness};
use crate::registry::{ClassTable, CreateInstanceFn};

const FACTORY_INTERFACES: &[InterfaceId] = &[IID_CLASS_FACTORY];

/// Transient, reference-counted factory for one class.
pub struct ClassFactory {
    clsid: ClassId,
    create: CreateInstanceFn,
    liveness: LivenessGuard,
}

impl ClassFactory {
    /// Resolve `clsid` in `classes` and return a factory handle bound to `iid`.
    ///
    /// # Errors
    ///
    /// - [`Error::UnsupportedType`] if no entry matches; liveness is untouched.
    /// - [`Error::InterfaceNotSupported`] if the handle does not answer to
    ///   `iid`; the handle is destroyed before returning, so liveness ends
    ///   where it started.
    ///
    /// Handle allocation aborts the process on exhaustion, so
    /// [`Error::OutOfMemory`] never comes from this step; it only reaches the
    /// caller from a class constructor through [`ClassFactory::create_instance`].
    pub fn get_class_object(
        classes: &ClassTable,
        liveness: &Arc<ModuleLiveness>,
        clsid: ClassId,
        iid: InterfaceId,
    ) -> Result<ComRef> {
        let Some(init) = classes.lookup(clsid) else {
            log::debug!("[factory] no class for {}", clsid);
            return Err(Error::UnsupportedType(clsid));
        };

        let factory = Arc::new(ClassFactory {
            clsid,
            create: init.create,
            liveness: liveness.acquire(),
        });
        log::trace!("[factory] created handle for {}", clsid);

        ComRef::from_object(factory, iid)
    }

    /// Class this handle builds.
    pub fn clsid(&self) -> ClassId {
        self.clsid
    }

    /// Build a new instance bound to `iid`.
    ///
    /// `outer` requests aggregation, which this factory does not support.
    /// Otherwise the constructor's result is returned verbatim.
    ///
    /// # Errors
    /// - [`Error::NoAggregation`] if `outer` is set.
    /// - Whatever the constructor returns: [`Error::InterfaceNotSupported`]
    ///   for an unknown `iid`, [`Error::OutOfMemory`] when it cannot allocate.
    pub fn create_instance(&self, outer: Option<&ComRef>, iid: InterfaceId) -> Result<ComRef> {
        if outer.is_some() {
            return Err(Error::NoAggregation);
        }
        let result = (self.create)(iid, self.liveness.liveness());
        log::debug!(
            "[factory] create_instance {} / {} -> {}",
            self.clsid,
            iid,
            if result.is_ok() { "ok" } else { "failed" }
        );
        result
    }

    /// Pin (`true`) or unpin (`false`) the module independently of any object.
    ///
    /// Returns `false` for an unpin with no outstanding pin; liveness is left
    /// untouched in that case.
    pub fn lock_server(&self, lock: bool) -> bool {
        let liveness = self.liveness.liveness();
        if lock {
            liveness.pin();
            true
        } else {
            let unpinned = liveness.unpin();
            if !unpinned {
                log::debug!("[factory] unmatched unlock for {}", self.clsid);
            }
            unpinned
        }
    }
}

impl Unknown for ClassFactory {
    fn interfaces(&self) -> &[InterfaceId] {
        FACTORY_INTERFACES
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Drop for ClassFactory {
    fn drop(&mut self) {
        log::trace!("[factory] destroyed handle for {}", self.clsid);
    }
}

impl fmt::Debug for ClassFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassFactory")
            .field("clsid", &self.clsid)
            .finish()
    }
}
