// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Module liveness accounting.
//!
//! A single atomic counter records how many things still need this module
//! loaded: live factory handles, live objects it created, and outstanding
//! `lock_server(true)` pins from the host.
//!
//! # Architecture
//!
//! ```text
//! ModuleLiveness (one per Module, Arc-shared)
//! +-- count: AtomicUsize    every outstanding reference, pins included
//! +-- pins:  AtomicUsize    lock_server(true) calls not yet undone
//!
//! LivenessGuard (one per factory handle / created object)
//! +-- Arc<ModuleLiveness>   increment on acquire, decrement on drop
//! ```
//!
//! # Thread Safety
//!
//! Increments and decrements are lock-free atomics. [`ModuleLiveness::can_unload`]
//! is a point-in-time read: the answer can be stale as soon as it returns, so a
//! host must treat `true` as advisory and re-check after unloading.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Module-wide count of outstanding references.
#[derive(Debug, Default)]
pub struct ModuleLiveness {
    count: AtomicUsize,
    pins: AtomicUsize,
}

impl ModuleLiveness {
    /// Create a counter starting at zero.
    pub fn new() -> Self {
        Self {
            count: AtomicUsize::new(0),
            pins: AtomicUsize::new(0),
        }
    }

    /// Take one reference. Returns the new count.
    pub fn add_ref(&self) -> usize {
        let count = self.count.fetch_add(1, Ordering::AcqRel) + 1;
        log::trace!("module liveness +1 -> {}", count);
        count
    }

    /// Drop one reference. Returns the new count.
    ///
    /// # Panics
    ///
    /// Releasing more references than were taken is a contract violation and
    /// panics instead of wrapping the counter.
    pub fn release(&self) -> usize {
        match self
            .count
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1))
        {
            Ok(prev) => {
                log::trace!("module liveness -1 -> {}", prev - 1);
                prev - 1
            }
            Err(_) => panic!("module liveness released more times than it was acquired"),
        }
    }

    /// Current number of outstanding references.
    pub fn count(&self) -> usize {
        self.count.load(Ordering::Acquire)
    }

    /// `true` when no reference is outstanding at the instant of the read.
    pub fn can_unload(&self) -> bool {
        self.count() == 0
    }

    /// Pin the module on behalf of the host. Returns the new count.
    pub fn pin(&self) -> usize {
        self.pins.fetch_add(1, Ordering::AcqRel);
        self.add_ref()
    }

    /// Undo one [`pin`](Self::pin).
    ///
    /// Returns `false`, leaving both counters untouched, when no pin is
    /// outstanding; an unmatched unpin never consumes a reference held by a
    /// live handle.
    pub fn unpin(&self) -> bool {
        let unpinned = self
            .pins
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1))
            .is_ok();
        if unpinned {
            self.release();
        }
        unpinned
    }

    /// Outstanding pins.
    pub fn pins(&self) -> usize {
        self.pins.load(Ordering::Acquire)
    }

    /// Take one reference held by the returned guard until it is dropped.
    pub fn acquire(self: &Arc<Self>) -> LivenessGuard {
        self.add_ref();
        LivenessGuard {
            liveness: Arc::clone(self),
        }
    }
}

impl Drop for ModuleLiveness {
    fn drop(&mut self) {
        if !std::thread::panicking() {
            debug_assert_eq!(
                *self.count.get_mut(),
                0,
                "module torn down with outstanding references"
            );
        }
    }
}

/// Scoped liveness reference: one increment at creation, exactly one
/// decrement when dropped.
#[must_use = "dropping the guard releases the liveness reference immediately"]
#[derive(Debug)]
pub struct LivenessGuard {
    liveness: Arc<ModuleLiveness>,
}

impl LivenessGuard {
    /// Counter this guard is holding a reference on.
    pub fn liveness(&self) -> &Arc<ModuleLiveness> {
        &self.liveness
    }
}

impl Drop for LivenessGuard {
    fn drop(&mut self) {
        self.liveness.release();
    }
}
