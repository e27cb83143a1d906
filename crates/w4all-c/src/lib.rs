// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! # W4all C ABI
//!
//! Exports the activation entry points of the process-wide [`Module`] to C
//! hosts: class objects, instance creation, foreign reference counting,
//! unload checks and (un)registration.
//!
//! Every object crosses the boundary as an opaque `W4allUnknown *` carrying
//! one foreign reference; pair each successful `*_out` call with
//! `w4all_unknown_release`.
//!
//! # Safety
//!
//! Functions taking pointers are `unsafe` and require the caller to uphold
//! the invariants documented in each function's safety comment.

mod handles;
mod logging;
mod module_path;

pub use logging::*;

use std::os::raw::c_char;
use std::ptr;

use w4all::{ClassId, Error, Guid, InterfaceId, Module, RegistrationConfig, RegistrationError};

/// Opaque handle to any W4all object
#[repr(C)]
pub struct W4allUnknown {
    _private: [u8; 0],
}

/// 128-bit class or interface identifier, laid out like a Windows `GUID`.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct W4allGuid {
    pub data1: u32,
    pub data2: u16,
    pub data3: u16,
    pub data4: [u8; 8],
}

impl From<Guid> for W4allGuid {
    fn from(g: Guid) -> Self {
        Self {
            data1: g.data1,
            data2: g.data2,
            data3: g.data3,
            data4: g.data4,
        }
    }
}

impl From<W4allGuid> for Guid {
    fn from(g: W4allGuid) -> Self {
        Guid {
            data1: g.data1,
            data2: g.data2,
            data3: g.data3,
            data4: g.data4,
        }
    }
}

/// Error codes (C-compatible enum)
///
/// # Error Code Categories
///
/// - **0-9**: Success and generic errors
/// - **10-19**: Activation errors
/// - **20-29**: Registration errors
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum W4allError {
    /// Operation completed successfully
    W4allOk = 0,
    /// Null pointer, unknown handle, or handle of the wrong kind
    W4allInvalidArgument = 1,
    /// Generic operation failure
    W4allOperationFailed = 3,
    /// Memory allocation failed
    W4allOutOfMemory = 4,

    // === Activation errors (10-19) ===
    /// No class registered under the requested identifier
    W4allUnsupportedType = 10,
    /// Object does not expose the requested interface
    W4allInterfaceNotSupported = 11,
    /// An outer object was supplied; aggregation is not supported
    W4allNoAggregation = 12,
    /// Class table lists the same identifier twice
    W4allDuplicateClass = 13,

    // === Registration errors (20-29) ===
    /// Record store rejected or could not parse the records
    W4allRegistrationFailed = 20,
    /// Reading or writing the record store failed
    W4allIoError = 21,
    /// File path of the loaded module could not be determined
    W4allModulePathUnavailable = 22,
}

impl From<&Error> for W4allError {
    fn from(err: &Error) -> Self {
        match err {
            Error::UnsupportedType(_) => W4allError::W4allUnsupportedType,
            Error::InterfaceNotSupported(_) => W4allError::W4allInterfaceNotSupported,
            Error::OutOfMemory => W4allError::W4allOutOfMemory,
            Error::NoAggregation => W4allError::W4allNoAggregation,
            Error::DuplicateClass(_) => W4allError::W4allDuplicateClass,
            Error::Registration(RegistrationError::Io(_)) => W4allError::W4allIoError,
            Error::Registration(RegistrationError::ModulePathUnavailable) => {
                W4allError::W4allModulePathUnavailable
            }
            Error::Registration(_) => W4allError::W4allRegistrationFailed,
        }
    }
}

/// `E_INVALIDARG`
const HRESULT_INVALID_ARG: i32 = 0x8007_0057_u32 as i32;

/// COM `HRESULT` equivalent of a status code.
#[no_mangle]
pub extern "C" fn w4all_error_hresult(code: W4allError) -> i32 {
    use w4all::error::{
        HRESULT_CLASS_NOT_AVAILABLE, HRESULT_FAIL, HRESULT_NO_AGGREGATION, HRESULT_NO_INTERFACE,
        HRESULT_OUT_OF_MEMORY, HRESULT_UNEXPECTED,
    };
    match code {
        W4allError::W4allOk => 0,
        W4allError::W4allInvalidArgument => HRESULT_INVALID_ARG,
        W4allError::W4allOutOfMemory => HRESULT_OUT_OF_MEMORY,
        W4allError::W4allUnsupportedType => HRESULT_CLASS_NOT_AVAILABLE,
        W4allError::W4allInterfaceNotSupported => HRESULT_NO_INTERFACE,
        W4allError::W4allNoAggregation => HRESULT_NO_AGGREGATION,
        W4allError::W4allDuplicateClass => HRESULT_UNEXPECTED,
        W4allError::W4allOperationFailed
        | W4allError::W4allRegistrationFailed
        | W4allError::W4allIoError
        | W4allError::W4allModulePathUnavailable => HRESULT_FAIL,
    }
}

/// Null `out` if present. Returns false when `out` itself is null.
unsafe fn clear_out(out: *mut *mut W4allUnknown) -> bool {
    if out.is_null() {
        return false;
    }
    *out = ptr::null_mut();
    true
}

unsafe fn read_guid(guid: *const W4allGuid) -> Option<Guid> {
    if guid.is_null() {
        None
    } else {
        Some(Guid::from(*guid))
    }
}

unsafe fn finish(result: w4all::Result<w4all::ComRef>, out: *mut *mut W4allUnknown) -> W4allError {
    match result {
        Ok(object) => {
            *out = handles::issue(object);
            W4allError::W4allOk
        }
        Err(err) => W4allError::from(&err),
    }
}

/// Get the class object (factory) for `clsid`, bound to `iid`
/// (`DllGetClassObject`).
///
/// # Safety
/// - `clsid` and `iid` must be valid pointers to `W4allGuid`
/// - `out` must be a valid pointer; it is set to NULL before anything else
///
/// # Returns
/// `W4ALL_OK` with `*out` set, `W4ALL_UNSUPPORTED_TYPE`, or
/// `W4ALL_INTERFACE_NOT_SUPPORTED`
#[no_mangle]
pub unsafe extern "C" fn w4all_get_class_object(
    clsid: *const W4allGuid,
    iid: *const W4allGuid,
    out: *mut *mut W4allUnknown,
) -> W4allError {
    if !clear_out(out) {
        return W4allError::W4allInvalidArgument;
    }
    let (Some(clsid), Some(iid)) = (read_guid(clsid), read_guid(iid)) else {
        return W4allError::W4allInvalidArgument;
    };

    finish(
        Module::global().get_class_object(ClassId(clsid), InterfaceId(iid)),
        out,
    )
}

/// Whether the library may be unloaded right now (`DllCanUnloadNow`).
///
/// The answer is advisory; any later activation invalidates it.
#[no_mangle]
pub extern "C" fn w4all_can_unload_now() -> bool {
    Module::global().can_unload_now()
}

/// Add a foreign reference to `obj`.
///
/// # Returns
/// New foreign reference count, or 0 if `obj` is not a live handle
#[no_mangle]
pub extern "C" fn w4all_unknown_add_ref(obj: *mut W4allUnknown) -> u32 {
    if obj.is_null() {
        return 0;
    }
    handles::add_ref(obj)
}

/// Release a foreign reference to `obj`; the handle is invalid once this
/// returns 0.
///
/// Releasing a handle more times than it was retained aborts the process.
///
/// # Returns
/// Remaining foreign reference count (0 for NULL)
#[no_mangle]
pub extern "C" fn w4all_unknown_release(obj: *mut W4allUnknown) -> u32 {
    if obj.is_null() {
        return 0;
    }
    handles::release(obj)
}

/// Get a new handle to the object behind `obj`, bound to `iid`.
///
/// # Safety
/// - `iid` must be a valid pointer to `W4allGuid`
/// - `out` must be a valid pointer; it is set to NULL before anything else
#[no_mangle]
pub unsafe extern "C" fn w4all_unknown_query_interface(
    obj: *mut W4allUnknown,
    iid: *const W4allGuid,
    out: *mut *mut W4allUnknown,
) -> W4allError {
    if !clear_out(out) {
        return W4allError::W4allInvalidArgument;
    }
    let (Some(object), Some(iid)) = (handles::resolve(obj), read_guid(iid)) else {
        return W4allError::W4allInvalidArgument;
    };

    finish(object.query_interface(InterfaceId(iid)), out)
}

/// Create an instance of the factory's class bound to `iid`.
///
/// # Safety
/// - `factory` must be a handle bound to `IClassFactory`
/// - `outer` must be NULL or a live handle; non-NULL yields
///   `W4ALL_NO_AGGREGATION`
/// - `iid` must be a valid pointer to `W4allGuid`
/// - `out` must be a valid pointer; it is set to NULL before anything else
#[no_mangle]
pub unsafe extern "C" fn w4all_class_factory_create_instance(
    factory: *mut W4allUnknown,
    outer: *mut W4allUnknown,
    iid: *const W4allGuid,
    out: *mut *mut W4allUnknown,
) -> W4allError {
    if !clear_out(out) {
        return W4allError::W4allInvalidArgument;
    }
    let (Some(handle), Some(iid)) = (handles::resolve(factory), read_guid(iid)) else {
        return W4allError::W4allInvalidArgument;
    };
    let Some(class_factory) = handle.as_class_factory() else {
        return W4allError::W4allInvalidArgument;
    };
    let outer = if outer.is_null() {
        None
    } else {
        match handles::resolve(outer) {
            Some(outer) => Some(outer),
            None => return W4allError::W4allInvalidArgument,
        }
    };

    finish(
        class_factory.create_instance(outer.as_ref(), InterfaceId(iid)),
        out,
    )
}

/// Pin (`lock == true`) or unpin the module (`IClassFactory::LockServer`).
///
/// An unpin with no outstanding pin returns `W4ALL_INVALID_ARGUMENT` and
/// changes nothing.
#[no_mangle]
pub extern "C" fn w4all_class_factory_lock_server(
    factory: *mut W4allUnknown,
    lock: bool,
) -> W4allError {
    let Some(handle) = handles::resolve(factory) else {
        return W4allError::W4allInvalidArgument;
    };
    let Some(class_factory) = handle.as_class_factory() else {
        return W4allError::W4allInvalidArgument;
    };
    if class_factory.lock_server(lock) {
        W4allError::W4allOk
    } else {
        W4allError::W4allInvalidArgument
    }
}

fn with_configured_store(
    op: impl FnOnce(&RegistrationConfig, &mut w4all::registration::FileStore) -> w4all::Result<()>,
) -> W4allError {
    let config = RegistrationConfig::from_env();
    let result = config
        .open_store()
        .map_err(Error::from)
        .and_then(|mut store| op(&config, &mut store));
    match result {
        Ok(()) => W4allError::W4allOk,
        Err(err) => {
            log::warn!("[registry] {}", err);
            W4allError::from(&err)
        }
    }
}

/// Write the records of every class (`DllRegisterServer`).
///
/// The record store and threading model come from `W4ALL_REGISTRY_PATH` and
/// `W4ALL_THREADING_MODEL`.
#[no_mangle]
pub extern "C" fn w4all_register_server() -> W4allError {
    with_configured_store(|config, store| {
        let module_path = module_path::current_module_path()?;
        Module::global().register_server(store, &module_path, config.threading_model)
    })
}

/// Delete the records of every class (`DllUnregisterServer`).
#[no_mangle]
pub extern "C" fn w4all_unregister_server() -> W4allError {
    with_configured_store(|_, store| Module::global().unregister_server(store))
}

/// Library version as a static null-terminated string.
#[no_mangle]
pub extern "C" fn w4all_version() -> *const c_char {
    static VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), "\0");
    VERSION.as_ptr().cast::<c_char>()
}

/// Number of handles currently held by C callers, across all objects.
#[no_mangle]
pub extern "C" fn w4all_live_handles() -> usize {
    handles::live_handles()
}
