// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! # W4all - component activation for the WebRTC4All media plugin
//!
//! Lets a host process build the plugin's native objects from a class
//! identifier alone, with COM-style reference counting and a module-wide
//! liveness counter that tells the host when the library may be unloaded.
//!
//! ## Quick Start
//!
//! ```rust
//! use w4all::{Module, CLSID_W4ALL_SOURCE, IID_CLASS_FACTORY, IID_MF_TRANSFORM};
//!
//! let module = Module::builtin();
//!
//! // DllGetClassObject
//! let factory = module.get_class_object(CLSID_W4ALL_SOURCE, IID_CLASS_FACTORY)?;
//!
//! // IClassFactory::CreateInstance
//! let transform = factory
//!     .as_class_factory()
//!     .expect("bound to IClassFactory")
//!     .create_instance(None, IID_MF_TRANSFORM)?;
//!
//! drop(factory);
//! assert!(!module.can_unload_now()); // transform still alive
//! drop(transform);
//! assert!(module.can_unload_now());
//! # Ok::<(), w4all::Error>(())
//! ```
//!
//! ## Architecture
//!
//! ```text
//! +-------------------------------------------------------------+
//! |  Module            get_class_object / can_unload_now        |
//! +-------------------------------------------------------------+
//! |  ClassFactory      create_instance / lock_server            |
//! |  ComRef            retain / release / query_interface       |
//! +-------------------------------------------------------------+
//! |  ClassTable        clsid -> constructor (static, validated) |
//! |  ModuleLiveness    atomic outstanding-reference counter     |
//! +-------------------------------------------------------------+
//! |  registration      install/uninstall records (side-channel) |
//! +-------------------------------------------------------------+
//! ```
//!
//! ## Modules Overview
//!
//! - [`registry`] - class table and constructors
//! - [`factory`] - factory handles
//! - [`liveness`] - unload accounting
//! - [`registration`] - discoverability records
//! - [`config`] - environment configuration for registration

pub mod com;
pub mod config;
pub mod error;
pub mod factory;
mod guid;
pub mod liveness;
pub mod media;
mod module;
pub mod registration;
pub mod registry;

pub use com::{
    ComRef, Unknown, IID_CLASS_FACTORY, IID_MF_ATTRIBUTES, IID_MF_MEDIA_EVENT_GENERATOR,
    IID_MF_TRANSFORM, IID_UNKNOWN,
};
pub use config::RegistrationConfig;
pub use error::{Error, RegistrationError, Result};
pub use factory::ClassFactory;
pub use guid::{ClassId, Guid, InterfaceId, ParseGuidError};
pub use liveness::{LivenessGuard, ModuleLiveness};
pub use media::{CLSID_W4ALL_SINK, CLSID_W4ALL_SOURCE};
pub use module::Module;
pub use registry::{ClassObjectInit, ClassTable, CreateInstanceFn, ThreadingModel};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
