// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Logging initialization for the W4all C ABI

use std::ffi::CStr;
use std::os::raw::c_char;

use super::W4allError;

/// Log level for W4all logging
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum W4allLogLevel {
    W4allLogOff = 0,
    W4allLogError = 1,
    W4allLogWarn = 2,
    W4allLogInfo = 3,
    W4allLogDebug = 4,
    W4allLogTrace = 5,
}

impl From<W4allLogLevel> for log::LevelFilter {
    fn from(level: W4allLogLevel) -> Self {
        match level {
            W4allLogLevel::W4allLogOff => log::LevelFilter::Off,
            W4allLogLevel::W4allLogError => log::LevelFilter::Error,
            W4allLogLevel::W4allLogWarn => log::LevelFilter::Warn,
            W4allLogLevel::W4allLogInfo => log::LevelFilter::Info,
            W4allLogLevel::W4allLogDebug => log::LevelFilter::Debug,
            W4allLogLevel::W4allLogTrace => log::LevelFilter::Trace,
        }
    }
}

fn init_result(result: Result<(), log::SetLoggerError>) -> W4allError {
    match result {
        Ok(()) => W4allError::W4allOk,
        Err(_) => W4allError::W4allOperationFailed, // Already initialized
    }
}

/// Initialize logging to stderr at `level`.
///
/// # Returns
/// `W4ALL_OK`, or `W4ALL_OPERATION_FAILED` if a logger is already installed
///
/// # Example (C)
/// ```c
/// w4all_logging_init(W4ALL_LOG_DEBUG);
/// ```
#[no_mangle]
pub extern "C" fn w4all_logging_init(level: W4allLogLevel) -> W4allError {
    init_result(
        env_logger::Builder::new()
            .filter_level(level.into())
            .format_timestamp_millis()
            .try_init(),
    )
}

/// Initialize logging from `RUST_LOG`, falling back to `default_level`.
#[no_mangle]
pub extern "C" fn w4all_logging_init_env(default_level: W4allLogLevel) -> W4allError {
    let filter: log::LevelFilter = default_level.into();
    init_result(
        env_logger::Builder::from_env(
            env_logger::Env::default().default_filter_or(filter.to_string()),
        )
        .format_timestamp_millis()
        .try_init(),
    )
}

/// Initialize logging with an `env_logger` filter string
/// (e.g. `"w4all=trace,info"`).
///
/// # Safety
/// - `filter` must be a valid null-terminated C string or NULL.
#[no_mangle]
pub unsafe extern "C" fn w4all_logging_init_with_filter(filter: *const c_char) -> W4allError {
    if filter.is_null() {
        return W4allError::W4allInvalidArgument;
    }

    let Ok(filter_str) = CStr::from_ptr(filter).to_str() else {
        return W4allError::W4allInvalidArgument;
    };

    init_result(
        env_logger::Builder::new()
            .parse_filters(filter_str)
            .format_timestamp_millis()
            .try_init(),
    )
}
