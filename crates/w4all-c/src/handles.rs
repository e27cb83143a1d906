// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Foreign handle table.
//!
//! A `W4allUnknown *` handed to C is an opaque id, never a Rust address. Ids
//! come from a monotonic counter and are never reused, so a stale or
//! over-released pointer can never alias a handle issued later. The table
//! owns the `ComRef` behind each id together with its outstanding foreign
//! reference count; the reference is dropped, outside the lock, when the
//! count reaches zero.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, OnceLock};

use w4all::ComRef;

use super::W4allUnknown;

struct HandleEntry {
    object: ComRef,
    refs: u32,
}

/// Next id to hand out. Starts at 1 so no handle is NULL.
static NEXT_HANDLE: AtomicUsize = AtomicUsize::new(1);

fn handle_table() -> &'static Mutex<HashMap<usize, HandleEntry>> {
    static TABLE: OnceLock<Mutex<HashMap<usize, HandleEntry>>> = OnceLock::new();
    TABLE.get_or_init(|| Mutex::new(HashMap::new()))
}

fn handle_id(raw: *const W4allUnknown) -> usize {
    raw as usize
}

/// Hand `object` to C with one foreign reference.
pub(crate) fn issue(object: ComRef) -> *mut W4allUnknown {
    let id = NEXT_HANDLE.fetch_add(1, Ordering::Relaxed);
    let mut table = handle_table()
        .lock()
        .unwrap_or_else(|err| err.into_inner());
    table.insert(id, HandleEntry { object, refs: 1 });
    id as *mut W4allUnknown
}

/// New Rust-side reference to the object behind `raw`, or `None` if `raw` is
/// not a live handle.
pub(crate) fn resolve(raw: *const W4allUnknown) -> Option<ComRef> {
    if raw.is_null() {
        return None;
    }
    let table = handle_table()
        .lock()
        .unwrap_or_else(|err| err.into_inner());
    table.get(&handle_id(raw)).map(|entry| entry.object.retain())
}

/// Add one foreign reference. Returns the new count, 0 for an unknown handle.
pub(crate) fn add_ref(raw: *const W4allUnknown) -> u32 {
    let mut table = handle_table()
        .lock()
        .unwrap_or_else(|err| err.into_inner());
    match table.get_mut(&handle_id(raw)) {
        Some(entry) => {
            entry.refs = entry.refs.saturating_add(1);
            entry.refs
        }
        None => 0,
    }
}

/// Drop one foreign reference, freeing the handle at zero.
///
/// # Panics
/// If `raw` is not a live handle (over-release or foreign pointer).
pub(crate) fn release(raw: *const W4allUnknown) -> u32 {
    let id = handle_id(raw);
    let (remaining, freed) = {
        let mut table = handle_table()
            .lock()
            .unwrap_or_else(|err| err.into_inner());
        let Some(entry) = table.get_mut(&id) else {
            drop(table);
            panic!("w4all handle {raw:p} released more times than it was retained");
        };
        entry.refs -= 1;
        let remaining = entry.refs;
        let freed = if remaining == 0 {
            table.remove(&id)
        } else {
            None
        };
        (remaining, freed)
    };

    // Object teardown runs without the table lock.
    drop(freed);
    remaining
}

/// Number of live foreign handles.
pub(crate) fn live_handles() -> usize {
    handle_table()
        .lock()
        .unwrap_or_else(|err| err.into_inner())
        .len()
}
