// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Object model shared by every handle that crosses the module boundary.
//!
//! Objects implement [`Unknown`] to declare which interfaces they answer to.
//! Callers hold them through [`ComRef`], a shared-ownership reference bound to
//! one interface: cloning a `ComRef` is `AddRef`, dropping it is `Release`, and
//! [`ComRef::query_interface`] hands out another view of the same object.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::factory::ClassFactory;
use crate::guid::InterfaceId;

/// `IUnknown`: every object answers to it.
pub const IID_UNKNOWN: InterfaceId = InterfaceId::from_u128(0x00000000_0000_0000_c000_000000000046);

/// `IClassFactory`: the view exposed by factory handles.
pub const IID_CLASS_FACTORY: InterfaceId =
    InterfaceId::from_u128(0x00000001_0000_0000_c000_000000000046);

/// `IMFTransform`
pub const IID_MF_TRANSFORM: InterfaceId =
    InterfaceId::from_u128(0xbf94c121_5b05_4e6f_8000_ba598961414d);

/// `IMFAttributes`
pub const IID_MF_ATTRIBUTES: InterfaceId =
    InterfaceId::from_u128(0x2cd2d921_c447_44a7_a13c_4adabfc247e3);

/// `IMFMediaEventGenerator`
pub const IID_MF_MEDIA_EVENT_GENERATOR: InterfaceId =
    InterfaceId::from_u128(0x2cd0bd52_bcd5_4b89_b62c_eadc0c031e7d);

/// Base contract of every object handed to the host.
pub trait Unknown: Any + Send + Sync {
    /// Interfaces implemented in addition to [`IID_UNKNOWN`].
    fn interfaces(&self) -> &[InterfaceId];

    /// Concrete-type access for in-process callers.
    fn as_any(&self) -> &dyn Any;

    /// Whether `iid` is a view this object can hand out.
    fn supports(&self, iid: InterfaceId) -> bool {
        iid == IID_UNKNOWN || self.interfaces().contains(&iid)
    }
}

/// Reference-counted handle to an object, bound to one interface.
#[derive(Clone)]
pub struct ComRef {
    object: Arc<dyn Unknown>,
    iid: InterfaceId,
}

impl ComRef {
    /// Bind `object` to `iid`.
    ///
    /// On failure the only reference is `object` itself, so an unsupported
    /// query on a freshly built object destroys it.
    pub fn from_object(object: Arc<dyn Unknown>, iid: InterfaceId) -> Result<Self> {
        if object.supports(iid) {
            Ok(Self { object, iid })
        } else {
            Err(Error::InterfaceNotSupported(iid))
        }
    }

    /// Interface this reference is bound to.
    pub fn iid(&self) -> InterfaceId {
        self.iid
    }

    /// Another reference to the same object, bound to `iid`.
    pub fn query_interface(&self, iid: InterfaceId) -> Result<ComRef> {
        Self::from_object(Arc::clone(&self.object), iid)
    }

    /// Take one more reference (`AddRef`).
    pub fn retain(&self) -> ComRef {
        self.clone()
    }

    /// Give up this reference (`Release`). Returns the number of references
    /// still alive after the call; the object is destroyed when it reaches 0.
    ///
    /// The count is a snapshot. With other threads holding references it may
    /// be stale by the time the caller reads it.
    pub fn release(self) -> usize {
        let remaining = Arc::strong_count(&self.object) - 1;
        drop(self);
        remaining
    }

    /// Number of live references to the underlying object.
    pub fn ref_count(&self) -> usize {
        Arc::strong_count(&self.object)
    }

    /// Whether both references point at the same object.
    pub fn same_object(&self, other: &ComRef) -> bool {
        std::ptr::addr_eq(Arc::as_ptr(&self.object), Arc::as_ptr(&other.object))
    }

    /// Concrete object, when it is a `T`.
    pub fn downcast_ref<T: Unknown>(&self) -> Option<&T> {
        self.object.as_any().downcast_ref::<T>()
    }

    /// The `IClassFactory` view, if this reference is bound to it.
    pub fn as_class_factory(&self) -> Option<&ClassFactory> {
        if self.iid == IID_CLASS_FACTORY {
            self.downcast_ref::<ClassFactory>()
        } else {
            None
        }
    }
}

impl fmt::Debug for ComRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComRef")
            .field("iid", &self.iid)
            .field("refs", &self.ref_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Plain;

    impl Unknown for Plain {
        fn interfaces(&self) -> &[InterfaceId] {
            &[IID_MF_ATTRIBUTES]
        }

        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    #[test]
    fn test_unknown_is_always_supported() {
        let obj = ComRef::from_object(Arc::new(Plain), IID_UNKNOWN).unwrap();
        assert_eq!(obj.iid(), IID_UNKNOWN);
    }

    #[test]
    fn test_query_interface_shares_object() {
        let obj = ComRef::from_object(Arc::new(Plain), IID_UNKNOWN).unwrap();
        let attrs = obj.query_interface(IID_MF_ATTRIBUTES).unwrap();
        assert!(obj.same_object(&attrs));
        assert_eq!(obj.ref_count(), 2);
        assert!(attrs.downcast_ref::<Plain>().is_some());
    }

    #[test]
    fn test_query_unsupported_interface() {
        let obj = ComRef::from_object(Arc::new(Plain), IID_UNKNOWN).unwrap();
        let err = obj.query_interface(IID_MF_TRANSFORM).unwrap_err();
        assert!(matches!(err, Error::InterfaceNotSupported(iid) if iid == IID_MF_TRANSFORM));
        assert_eq!(obj.ref_count(), 1);
    }

    #[test]
    fn test_retain_release_counts() {
        let obj = ComRef::from_object(Arc::new(Plain), IID_UNKNOWN).unwrap();
        let extra = obj.retain();
        assert_eq!(obj.ref_count(), 2);
        assert_eq!(extra.release(), 1);
        assert_eq!(obj.release(), 0);
    }

    #[test]
    fn test_class_factory_view_requires_binding() {
        let obj = ComRef::from_object(Arc::new(Plain), IID_UNKNOWN).unwrap();
        assert!(obj.as_class_factory().is_none());
    }
}
