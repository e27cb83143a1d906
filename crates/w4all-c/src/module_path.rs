// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! File path of the loaded module, written into `InProcServer32`.

use std::path::PathBuf;

use w4all::RegistrationError;

/// Path of the shared object containing this code, or of the executable when
/// the crate is linked statically.
pub(crate) fn current_module_path() -> Result<PathBuf, RegistrationError> {
    if let Some(path) = shared_object_path() {
        log::debug!("[module] resolved module path {}", path.display());
        return Ok(path);
    }
    std::env::current_exe().map_err(|e| {
        log::debug!("[module] current_exe failed: {}", e);
        RegistrationError::ModulePathUnavailable
    })
}

#[cfg(unix)]
fn shared_object_path() -> Option<PathBuf> {
    use std::ffi::{CStr, OsStr};
    use std::os::unix::ffi::OsStrExt;

    let anchor = shared_object_path as *const libc::c_void;
    // SAFETY: Dl_info is plain data; dladdr only writes into it.
    let mut info: libc::Dl_info = unsafe { std::mem::zeroed() };
    // SAFETY: `anchor` is an address inside this image.
    let found = unsafe { libc::dladdr(anchor, &mut info) };
    if found == 0 || info.dli_fname.is_null() {
        return None;
    }
    // SAFETY: dladdr returned a null-terminated name owned by the loader.
    let name = unsafe { CStr::from_ptr(info.dli_fname) };
    let path = PathBuf::from(OsStr::from_bytes(name.to_bytes()));
    Some(path.canonicalize().unwrap_or(path))
}

#[cfg(not(unix))]
fn shared_object_path() -> Option<PathBuf> {
    None
}
