// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Error types for W4all activation and registration.

use crate::guid::{ClassId, InterfaceId};

/// Errors returned by activation and registration operations.
///
/// Every failure is returned to the immediate caller; the module never
/// retries or swallows one.
///
/// # Example
///
/// ```rust
/// use w4all::{ClassId, Error, Module, IID_UNKNOWN};
///
/// let module = Module::builtin();
/// let unknown = ClassId::from_u128(0x1234);
///
/// match module.get_class_object(unknown, IID_UNKNOWN) {
///     Err(Error::UnsupportedType(clsid)) => assert_eq!(clsid, unknown),
///     other => panic!("unexpected: {:?}", other),
/// }
/// ```
#[derive(Debug)]
pub enum Error {
    // ========================================================================
    // Activation Errors
    // ========================================================================
    /// No class table entry matches the requested type identifier.
    UnsupportedType(ClassId),
    /// The type exists but does not implement the requested interface.
    InterfaceNotSupported(InterfaceId),
    /// A class constructor could not allocate its object. Handle allocation
    /// inside the crate aborts instead of returning this.
    OutOfMemory,
    /// An outer object was supplied; aggregation is not implemented.
    NoAggregation,

    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// The same type identifier appears twice in a class table.
    DuplicateClass(ClassId),

    // ========================================================================
    // Installation Errors
    // ========================================================================
    /// Registration side-channel failure (install/uninstall only).
    Registration(RegistrationError),
}

/// `CLASS_E_CLASSNOTAVAILABLE`
pub const HRESULT_CLASS_NOT_AVAILABLE: i32 = 0x8004_0111_u32 as i32;
/// `E_NOINTERFACE`
pub const HRESULT_NO_INTERFACE: i32 = 0x8000_4002_u32 as i32;
/// `E_OUTOFMEMORY`
pub const HRESULT_OUT_OF_MEMORY: i32 = 0x8007_000E_u32 as i32;
/// `CLASS_E_NOAGGREGATION`
pub const HRESULT_NO_AGGREGATION: i32 = 0x8004_0110_u32 as i32;
/// `E_FAIL`
pub const HRESULT_FAIL: i32 = 0x8000_4005_u32 as i32;
/// `E_UNEXPECTED`
pub const HRESULT_UNEXPECTED: i32 = 0x8000_FFFF_u32 as i32;

impl Error {
    /// COM `HRESULT` equivalent, for hosts that speak COM status codes.
    pub fn hresult(&self) -> i32 {
        match self {
            Error::UnsupportedType(_) => HRESULT_CLASS_NOT_AVAILABLE,
            Error::InterfaceNotSupported(_) => HRESULT_NO_INTERFACE,
            Error::OutOfMemory => HRESULT_OUT_OF_MEMORY,
            Error::NoAggregation => HRESULT_NO_AGGREGATION,
            Error::DuplicateClass(_) => HRESULT_UNEXPECTED,
            Error::Registration(e) => e.hresult(),
        }
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::UnsupportedType(clsid) => write!(f, "Class not available: {}", clsid),
            Error::InterfaceNotSupported(iid) => write!(f, "Interface not supported: {}", iid),
            Error::OutOfMemory => write!(f, "Out of memory"),
            Error::NoAggregation => write!(f, "Class does not support aggregation"),
            Error::DuplicateClass(clsid) => {
                write!(f, "Class registered more than once: {}", clsid)
            }
            Error::Registration(e) => write!(f, "Registration failed: {}", e),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Registration(e) => Some(e),
            _ => None,
        }
    }
}

impl From<RegistrationError> for Error {
    fn from(e: RegistrationError) -> Self {
        Error::Registration(e)
    }
}

/// Convenient alias for results using the crate `Error` type.
pub type Result<T> = core::result::Result<T, Error>;

/// Failures of the registration record store.
#[derive(Debug)]
pub enum RegistrationError {
    /// Reading or writing the backing store failed.
    Io(std::io::Error),
    /// The backing store exists but could not be parsed.
    Corrupt(String),
    /// Key path is empty or contains an empty segment.
    InvalidKey(String),
    /// The file path of the loaded module could not be determined.
    ModulePathUnavailable,
}

impl RegistrationError {
    /// `HRESULT_FROM_WIN32`-style code for this failure.
    pub fn hresult(&self) -> i32 {
        match self {
            RegistrationError::Io(e) => match e.raw_os_error() {
                #[allow(clippy::cast_sign_loss, clippy::cast_possible_wrap)]
                Some(code) if code > 0 => (0x8007_0000_u32 | (code as u32 & 0xFFFF)) as i32,
                _ => HRESULT_FAIL,
            },
            _ => HRESULT_FAIL,
        }
    }
}

impl std::fmt::Display for RegistrationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RegistrationError::Io(e) => write!(f, "I/O error: {}", e),
            RegistrationError::Corrupt(msg) => write!(f, "Record store is corrupt: {}", msg),
            RegistrationError::InvalidKey(key) => write!(f, "Invalid record key: '{}'", key),
            RegistrationError::ModulePathUnavailable => {
                write!(f, "Module file path could not be determined")
            }
        }
    }
}

impl std::error::Error for RegistrationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RegistrationError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for RegistrationError {
    fn from(e: std::io::Error) -> Self {
        RegistrationError::Io(e)
    }
}
