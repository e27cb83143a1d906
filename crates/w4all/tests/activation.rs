// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

#![allow(clippy::uninlined_format_args)] // Test/bench code readability over pedantic
#![allow(clippy::unreadable_literal)] // Large test constants
#![allow(clippy::missing_panics_doc)] // Tests/examples panic on failure
#![allow(clippy::items_after_statements)] // Test helpers

//! Activation and liveness contract tests
//!
//! Uses a private two-class table {A, B} so counters are isolated from the
//! process-wide module.

use std::any::Any;
use std::sync::Arc;

use w4all::{
    ClassId, ClassObjectInit, ClassTable, ComRef, Error, InterfaceId, Module, ModuleLiveness,
    ThreadingModel, Unknown, IID_CLASS_FACTORY, IID_UNKNOWN,
};

const CLSID_A: ClassId = ClassId::from_u128(0xa000_0000_0000_0000_0000_0000_0000_000a);
const CLSID_B: ClassId = ClassId::from_u128(0xb000_0000_0000_0000_0000_0000_0000_000b);
const CLSID_C: ClassId = ClassId::from_u128(0xc000_0000_0000_0000_0000_0000_0000_000c);

const CAP_X: InterfaceId = InterfaceId::from_u128(0x1111);
const CAP_Y: InterfaceId = InterfaceId::from_u128(0x2222);

struct ObjectA {
    _liveness: w4all::LivenessGuard,
}

impl Unknown for ObjectA {
    fn interfaces(&self) -> &[InterfaceId] {
        &[CAP_X]
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

struct ObjectB {
    _liveness: w4all::LivenessGuard,
}

impl Unknown for ObjectB {
    fn interfaces(&self) -> &[InterfaceId] {
        &[CAP_X, CAP_Y]
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

fn create_a(iid: InterfaceId, liveness: &Arc<ModuleLiveness>) -> w4all::Result<ComRef> {
    ComRef::from_object(
        Arc::new(ObjectA {
            _liveness: liveness.acquire(),
        }),
        iid,
    )
}

fn create_b(iid: InterfaceId, liveness: &Arc<ModuleLiveness>) -> w4all::Result<ComRef> {
    ComRef::from_object(
        Arc::new(ObjectB {
            _liveness: liveness.acquire(),
        }),
        iid,
    )
}

fn module_ab() -> Module {
    let classes = ClassTable::new([
        ClassObjectInit {
            clsid: CLSID_A,
            create: create_a,
            description: "A",
            threading_model: ThreadingModel::Both,
        },
        ClassObjectInit {
            clsid: CLSID_B,
            create: create_b,
            description: "B",
            threading_model: ThreadingModel::Both,
        },
    ])
    .expect("valid table");
    Module::new(classes)
}

fn instantiate(module: &Module, clsid: ClassId, iid: InterfaceId) -> w4all::Result<ComRef> {
    let handle = module.get_class_object(clsid, IID_CLASS_FACTORY)?;
    let factory = handle.as_class_factory().expect("IClassFactory view");
    factory.create_instance(None, iid)
}

// ============================================================================
// Scenario: registry {A, B}
// ============================================================================

#[test]
fn test_supported_capability_returns_live_handle() {
    let module = module_ab();
    let obj = instantiate(&module, CLSID_A, CAP_X).expect("A supports X");
    assert_eq!(obj.iid(), CAP_X);
    assert!(obj.downcast_ref::<ObjectA>().is_some());
    assert!(!module.can_unload_now());
}

#[test]
fn test_unsupported_capability_leaves_liveness_unchanged() {
    let module = module_ab();
    let before = module.liveness().count();
    let err = instantiate(&module, CLSID_A, CAP_Y).unwrap_err();
    assert!(matches!(err, Error::InterfaceNotSupported(iid) if iid == CAP_Y));
    assert_eq!(module.liveness().count(), before);
}

#[test]
fn test_unregistered_type() {
    let module = module_ab();
    for iid in [IID_UNKNOWN, IID_CLASS_FACTORY, CAP_X] {
        let err = module.get_class_object(CLSID_C, iid).unwrap_err();
        assert!(matches!(err, Error::UnsupportedType(id) if id == CLSID_C));
        assert_eq!(module.liveness().count(), 0);
    }
}

#[test]
fn test_create_succeeds_iff_capability_supported() {
    let module = module_ab();
    let cases = [
        (CLSID_A, CAP_X, true),
        (CLSID_A, CAP_Y, false),
        (CLSID_B, CAP_X, true),
        (CLSID_B, CAP_Y, true),
        (CLSID_B, IID_UNKNOWN, true),
    ];
    for (clsid, iid, supported) in cases {
        let result = instantiate(&module, clsid, iid);
        assert_eq!(result.is_ok(), supported, "{} / {}", clsid, iid);
        if let Err(e) = result {
            assert!(matches!(e, Error::InterfaceNotSupported(_)));
        }
    }
    assert!(module.can_unload_now());
}

#[test]
fn test_factory_handle_rejects_object_interfaces() {
    let module = module_ab();
    let err = module.get_class_object(CLSID_A, CAP_X).unwrap_err();
    assert!(matches!(err, Error::InterfaceNotSupported(iid) if iid == CAP_X));
    assert!(module.can_unload_now());
}

// ============================================================================
// Liveness accounting
// ============================================================================

#[test]
fn test_can_unload_is_idempotent() {
    let module = module_ab();
    assert_eq!(module.can_unload_now(), module.can_unload_now());
    let handle = module.get_class_object(CLSID_B, IID_UNKNOWN).unwrap();
    assert_eq!(module.can_unload_now(), module.can_unload_now());
    drop(handle);
}

#[test]
fn test_n_creates_then_n_releases() {
    let module = module_ab();
    const N: usize = 16;

    let handles: Vec<ComRef> = (0..N)
        .map(|_| module.get_class_object(CLSID_A, IID_CLASS_FACTORY).unwrap())
        .collect();
    assert_eq!(module.liveness().count(), N);

    let mut handles = handles.into_iter();
    for remaining in (0..N).rev() {
        assert!(!module.can_unload_now());
        handles.next().unwrap().release();
        assert_eq!(module.liveness().count(), remaining);
    }
    assert!(module.can_unload_now());
}

#[test]
fn test_lock_server_pins_until_unlocked() {
    let module = module_ab();
    let handles: Vec<ComRef> = (0..4)
        .map(|_| module.get_class_object(CLSID_B, IID_CLASS_FACTORY).unwrap())
        .collect();
    handles[0].as_class_factory().unwrap().lock_server(true);

    for handle in handles {
        handle.release();
    }
    assert!(!module.can_unload_now());

    let unlocker = module.get_class_object(CLSID_B, IID_CLASS_FACTORY).unwrap();
    let factory = unlocker.as_class_factory().unwrap();
    assert!(factory.lock_server(false));
    assert!(!factory.lock_server(false));
    assert!(!module.can_unload_now()); // unlocker itself still alive
    unlocker.release();
    assert!(module.can_unload_now());
}

#[test]
fn test_retained_factory_survives_first_release() {
    let module = module_ab();
    let handle = module.get_class_object(CLSID_A, IID_CLASS_FACTORY).unwrap();
    let retained = handle.retain();
    assert_eq!(handle.release(), 1);

    let obj = retained
        .as_class_factory()
        .unwrap()
        .create_instance(None, CAP_X)
        .unwrap();
    assert_eq!(retained.release(), 0);
    assert_eq!(module.liveness().count(), 1); // obj
    drop(obj);
    assert!(module.can_unload_now());
}

#[test]
fn test_aggregation_not_supported() {
    let module = module_ab();
    let outer = instantiate(&module, CLSID_B, CAP_X).unwrap();
    let handle = module.get_class_object(CLSID_A, IID_CLASS_FACTORY).unwrap();
    let err = handle
        .as_class_factory()
        .unwrap()
        .create_instance(Some(&outer), IID_UNKNOWN)
        .unwrap_err();
    assert!(matches!(err, Error::NoAggregation));
    assert_eq!(module.liveness().count(), 2);
}

fn create_exhausted(_iid: InterfaceId, _liveness: &Arc<ModuleLiveness>) -> w4all::Result<ComRef> {
    Err(Error::OutOfMemory)
}

#[test]
fn test_constructor_out_of_memory_propagates() {
    let classes = ClassTable::new([ClassObjectInit {
        clsid: CLSID_C,
        create: create_exhausted,
        description: "C",
        threading_model: ThreadingModel::Both,
    }])
    .expect("valid table");
    let module = Module::new(classes);

    let handle = module.get_class_object(CLSID_C, IID_CLASS_FACTORY).unwrap();
    let err = handle
        .as_class_factory()
        .unwrap()
        .create_instance(None, IID_UNKNOWN)
        .unwrap_err();
    assert!(matches!(err, Error::OutOfMemory));
    assert_eq!(err.hresult() as u32, 0x8007_000E);
    assert_eq!(module.liveness().count(), 1); // factory only
    drop(handle);
    assert!(module.can_unload_now());
}

#[test]
fn test_duplicate_class_rejected_at_startup() {
    let entry = ClassObjectInit {
        clsid: CLSID_A,
        create: create_a,
        description: "A",
        threading_model: ThreadingModel::Both,
    };
    let err = ClassTable::new([entry, entry]).unwrap_err();
    assert!(matches!(err, Error::DuplicateClass(id) if id == CLSID_A));
}

// ============================================================================
// Built-in classes
// ============================================================================

#[test]
fn test_builtin_source_and_sink() {
    use w4all::media::{SinkTransform, SourceTransform};
    use w4all::{CLSID_W4ALL_SINK, CLSID_W4ALL_SOURCE, IID_MF_TRANSFORM};

    let module = Module::builtin();
    let source = module
        .create_instance(CLSID_W4ALL_SOURCE, IID_MF_TRANSFORM)
        .unwrap();
    let sink = module
        .create_instance(CLSID_W4ALL_SINK, IID_MF_TRANSFORM)
        .unwrap();
    assert!(source.downcast_ref::<SourceTransform>().is_some());
    assert!(sink.downcast_ref::<SinkTransform>().is_some());
    assert!(!source.same_object(&sink));
    assert_eq!(module.liveness().count(), 2);
}
