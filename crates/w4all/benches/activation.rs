// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

#![allow(clippy::uninlined_format_args)] // Test/bench code readability over pedantic
#![allow(clippy::missing_panics_doc)] // Tests/examples panic on failure
#![allow(clippy::semicolon_if_nothing_returned)] // Benchmark code formatting

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use std::path::Path;
use w4all::registration::MemoryStore;
use w4all::{
    ClassId, Module, ModuleLiveness, CLSID_W4ALL_SINK, CLSID_W4ALL_SOURCE, IID_CLASS_FACTORY,
    IID_MF_TRANSFORM, IID_UNKNOWN,
};

// ============================================================================
// Liveness Benchmarks
// ============================================================================

/// Benchmark: ModuleLiveness add_ref + release pair
fn bench_liveness_pair(c: &mut Criterion) {
    let liveness = ModuleLiveness::new();
    c.bench_function("liveness_add_release", |b| {
        b.iter(|| {
            black_box(liveness.add_ref());
            black_box(liveness.release());
        })
    });
}

// ============================================================================
// Activation Benchmarks
// ============================================================================

/// Benchmark: get_class_object + drop (hit, last table entry)
fn bench_get_class_object(c: &mut Criterion) {
    let module = Module::builtin();
    c.bench_function("get_class_object_hit", |b| {
        b.iter(|| {
            let handle = module
                .get_class_object(black_box(CLSID_W4ALL_SINK), IID_CLASS_FACTORY)
                .unwrap();
            drop(handle);
        })
    });
}

/// Benchmark: get_class_object for an unregistered class
fn bench_get_class_object_miss(c: &mut Criterion) {
    let module = Module::builtin();
    let missing = ClassId::from_u128(0xdead_beef);
    c.bench_function("get_class_object_miss", |b| {
        b.iter(|| black_box(module.get_class_object(black_box(missing), IID_UNKNOWN).is_err()))
    });
}

/// Benchmark: factory -> instance -> release
fn bench_create_instance(c: &mut Criterion) {
    let module = Module::builtin();
    let handle = module
        .get_class_object(CLSID_W4ALL_SOURCE, IID_CLASS_FACTORY)
        .unwrap();
    let factory = handle.as_class_factory().unwrap();
    c.bench_function("create_instance_source", |b| {
        b.iter(|| {
            let obj = factory.create_instance(None, IID_MF_TRANSFORM).unwrap();
            black_box(obj.release());
        })
    });
}

/// Benchmark: query_interface on a live object
fn bench_query_interface(c: &mut Criterion) {
    let module = Module::builtin();
    let obj = module
        .create_instance(CLSID_W4ALL_SOURCE, IID_MF_TRANSFORM)
        .unwrap();
    c.bench_function("query_interface_unknown", |b| {
        b.iter(|| black_box(obj.query_interface(IID_UNKNOWN).unwrap()))
    });
}

// ============================================================================
// Registration Benchmarks
// ============================================================================

/// Benchmark: install both built-in classes into a memory store
fn bench_register_server(c: &mut Criterion) {
    let module = Module::builtin();
    c.bench_function("register_server_memory", |b| {
        b.iter(|| {
            let mut store = MemoryStore::new();
            module
                .register_server(&mut store, Path::new("/usr/lib/libw4all_c.so"), None)
                .unwrap();
            black_box(store);
        })
    });
}

criterion_group!(
    benches,
    bench_liveness_pair,
    bench_get_class_object,
    bench_get_class_object_miss,
    bench_create_instance,
    bench_query_interface,
    bench_register_server
);
criterion_main!(benches);
