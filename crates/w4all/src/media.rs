// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Source and Sink transform objects exposed by the module.
//!
//! Only their activation surface lives here: each object declares the
//! interfaces it answers to and holds a liveness reference for as long as it
//! is alive. Media processing is implemented elsewhere.

use std::any::Any;
use std::sync::Arc;

use crate::com::{
    ComRef, Unknown, IID_MF_ATTRIBUTES, IID_MF_MEDIA_EVENT_GENERATOR, IID_MF_TRANSFORM,
};
use crate::error::Result;
use crate::guid::{ClassId, InterfaceId};
use crate::liveness::{LivenessGuard, ModuleLiveness};

/// `CLSID_WebRTC4AllSourceMFT`
pub const CLSID_W4ALL_SOURCE: ClassId =
    ClassId::from_u128(0x0f2c5c4d_3b12_4e8a_9a3f_5d7e1c2b4a60);

/// `CLSID_WebRTC4AllSinkMFT`
pub const CLSID_W4ALL_SINK: ClassId = ClassId::from_u128(0x0f2c5c4d_3b12_4e8a_9a3f_5d7e1c2b4a61);

const SOURCE_INTERFACES: &[InterfaceId] = &[
    IID_MF_TRANSFORM,
    IID_MF_ATTRIBUTES,
    IID_MF_MEDIA_EVENT_GENERATOR,
];

const SINK_INTERFACES: &[InterfaceId] = &[IID_MF_TRANSFORM, IID_MF_ATTRIBUTES];

/// Capture-side transform (network -> host pipeline).
#[derive(Debug)]
pub struct SourceTransform {
    _liveness: LivenessGuard,
}

impl Unknown for SourceTransform {
    fn interfaces(&self) -> &[InterfaceId] {
        SOURCE_INTERFACES
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Render-side transform (host pipeline -> network).
#[derive(Debug)]
pub struct SinkTransform {
    _liveness: LivenessGuard,
}

impl Unknown for SinkTransform {
    fn interfaces(&self) -> &[InterfaceId] {
        SINK_INTERFACES
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Constructor registered for [`CLSID_W4ALL_SOURCE`].
pub fn create_source(iid: InterfaceId, liveness: &Arc<ModuleLiveness>) -> Result<ComRef> {
    let source = Arc::new(SourceTransform {
        _liveness: liveness.acquire(),
    });
    ComRef::from_object(source, iid)
}

/// Constructor registered for [`CLSID_W4ALL_SINK`].
pub fn create_sink(iid: InterfaceId, liveness: &Arc<ModuleLiveness>) -> Result<ComRef> {
    let sink = Arc::new(SinkTransform {
        _liveness: liveness.acquire(),
    });
    ComRef::from_object(sink, iid)
}
