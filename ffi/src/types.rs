//! `#[repr(C)]` types for the FFI boundary.
//!
//! # Design
//! The host only needs to know whether an operation succeeded and, if not,
//! which kind of failure occurred, so every operation returns the same
//! `FfiGatewayResult` envelope: an error code, an optional message, and the
//! HTTP status when the failure came from the transport.

use std::ffi::CString;
use std::os::raw::c_char;

use schlund_core::GatewayError;

/// Opaque handle to a `GatewayClient`. C callers receive a pointer to this
/// and pass it back into every FFI function.
pub struct FfiGatewayClient {
    pub(crate) inner: schlund_core::GatewayClient,
}

/// Error codes returned in `FfiGatewayResult`.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiErrorCode {
    Ok = 0,
    Serialization = 1,
    Transport = 2,
    Protocol = 3,
    ZoneNotFound = 4,
    Conflict = 5,
    RecordUpdate = 6,
    NullArg = 7,
    InvalidUtf8 = 8,
    Panic = 9,
}

/// Result envelope for record operations.
///
/// On success `error_code` is `Ok` and `error_message` is null. On failure
/// `error_message` is a human-readable C string and `http_status` is the
/// gateway's status code for transport failures (0 otherwise).
#[repr(C)]
pub struct FfiGatewayResult {
    pub error_code: FfiErrorCode,
    pub error_message: *mut c_char,
    pub http_status: u16,
}

impl FfiGatewayResult {
    pub(crate) fn ok() -> *mut Self {
        Self::boxed(FfiErrorCode::Ok, None, 0)
    }

    /// Build an error result from a `GatewayError`.
    pub(crate) fn from_error(err: GatewayError) -> *mut Self {
        let (code, status) = match &err {
            GatewayError::Serialization { .. } => (FfiErrorCode::Serialization, 0),
            GatewayError::Transport { status, .. } => (FfiErrorCode::Transport, status.unwrap_or(0)),
            GatewayError::Protocol { .. } => (FfiErrorCode::Protocol, 0),
            GatewayError::ZoneNotFound { .. } => (FfiErrorCode::ZoneNotFound, 0),
            GatewayError::Conflict { .. } => (FfiErrorCode::Conflict, 0),
            GatewayError::RecordUpdate { .. } => (FfiErrorCode::RecordUpdate, 0),
        };
        Self::boxed(code, Some(err.to_string()), status)
    }

    pub(crate) fn null_arg(name: &str) -> *mut Self {
        Self::boxed(FfiErrorCode::NullArg, Some(format!("null argument: {name}")), 0)
    }

    pub(crate) fn invalid_utf8(name: &str) -> *mut Self {
        Self::boxed(
            FfiErrorCode::InvalidUtf8,
            Some(format!("argument is not valid UTF-8: {name}")),
            0,
        )
    }

    pub(crate) fn panic(msg: &str) -> *mut Self {
        Self::boxed(FfiErrorCode::Panic, Some(msg.to_string()), 0)
    }

    fn boxed(error_code: FfiErrorCode, message: Option<String>, http_status: u16) -> *mut Self {
        let error_message = match message {
            Some(msg) => c_string(msg).into_raw(),
            None => std::ptr::null_mut(),
        };
        Box::into_raw(Box::new(FfiGatewayResult {
            error_code,
            error_message,
            http_status,
        }))
    }
}

/// Convert to a C string, dropping interior NULs that gateway text may carry.
fn c_string(s: String) -> CString {
    CString::new(s.replace('\0', "")).unwrap_or_default()
}
