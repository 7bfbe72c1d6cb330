//! C-ABI wrapper around `schlund-core`.
//!
//! # Overview
//! Exposes the challenge host boundary through `extern "C"` functions: create
//! a client from credentials and a TTL, publish a TXT record, remove it. A
//! host written in any language with a C FFI can drive DNS-01 challenges
//! without linking against Rust directly.
//!
//! # Design
//! - Every `extern "C"` function wraps its body in `catch_unwind` so panics
//!   never cross the FFI boundary.
//! - Record operations perform the HTTP exchange themselves and block until
//!   the gateway has answered.
//! - The C caller owns all returned pointers and must call the matching
//!   `schlund_*_free` function to release them.
//!
//! # C header
//! `build.rs` writes `schlund_ffi.h` into the build's `OUT_DIR`; the source
//! tree is never modified. To produce a header for distribution, run
//! `cbindgen --crate schlund-ffi --lang c --output include/schlund_ffi.h`
//! from the `ffi/` directory.

pub mod types;

use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::time::Duration;

use schlund_core::{Credentials, GatewayClient, UreqTransport};

use types::*;

/// Read a C string argument, distinguishing null from invalid UTF-8.
///
/// # Safety
/// `ptr` must be null or point to a NUL-terminated string.
unsafe fn read_arg<'a>(ptr: *const c_char, name: &str) -> Result<&'a str, *mut FfiGatewayResult> {
    if ptr.is_null() {
        return Err(FfiGatewayResult::null_arg(name));
    }
    unsafe { CStr::from_ptr(ptr) }
        .to_str()
        .map_err(|_| FfiGatewayResult::invalid_utf8(name))
}

// ---------------------------------------------------------------------------
// Client lifecycle
// ---------------------------------------------------------------------------

/// Create a client for the public gateway.
///
/// Returns null if any string argument is null or not valid UTF-8, or if an
/// internal panic occurs. The caller must free the returned pointer with
/// `schlund_client_free`.
#[unsafe(no_mangle)]
pub extern "C" fn schlund_client_new(
    user: *const c_char,
    password: *const c_char,
    context: *const c_char,
    ttl: u32,
) -> *mut FfiGatewayClient {
    catch_unwind(|| {
        let args = unsafe {
            (
                read_arg(user, "user"),
                read_arg(password, "password"),
                read_arg(context, "context"),
            )
        };
        let (user, password, context) = match args {
            (Ok(user), Ok(password), Ok(context)) => (user, password, context),
            (user, password, context) => {
                for err in [user.err(), password.err(), context.err()].into_iter().flatten() {
                    schlund_free_result(err);
                }
                return std::ptr::null_mut();
            }
        };
        let client = GatewayClient::new(Credentials::new(user, password, context), ttl);
        Box::into_raw(Box::new(FfiGatewayClient { inner: client }))
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Send requests to `endpoint` instead of the public gateway.
///
/// Returns false if either argument is null or `endpoint` is not UTF-8.
#[unsafe(no_mangle)]
pub extern "C" fn schlund_client_set_endpoint(
    client: *mut FfiGatewayClient,
    endpoint: *const c_char,
) -> bool {
    catch_unwind(AssertUnwindSafe(|| {
        if client.is_null() || endpoint.is_null() {
            return false;
        }
        let Ok(endpoint) = (unsafe { CStr::from_ptr(endpoint) }).to_str() else {
            return false;
        };
        let client = unsafe { &mut *client };
        client.inner = client.inner.clone().with_endpoint(endpoint);
        true
    }))
    .unwrap_or(false)
}

/// Abort each gateway round trip after `timeout_ms` milliseconds.
///
/// Returns false if `client` is null.
#[unsafe(no_mangle)]
pub extern "C" fn schlund_client_set_timeout(client: *mut FfiGatewayClient, timeout_ms: u64) -> bool {
    catch_unwind(AssertUnwindSafe(|| {
        if client.is_null() {
            return false;
        }
        let client = unsafe { &mut *client };
        let transport = UreqTransport::with_timeout(Duration::from_millis(timeout_ms));
        client.inner = client.inner.clone().with_transport(transport);
        true
    }))
    .unwrap_or(false)
}

/// Free a client created by `schlund_client_new`. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn schlund_client_free(client: *mut FfiGatewayClient) {
    if !client.is_null() {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            drop(unsafe { Box::from_raw(client) });
        }));
    }
}

// ---------------------------------------------------------------------------
// Record operations
// ---------------------------------------------------------------------------

type Operation = fn(&GatewayClient, &str, &str, &str) -> Result<(), schlund_core::GatewayError>;

fn run_operation(
    client: *const FfiGatewayClient,
    domain: *const c_char,
    record_name: *const c_char,
    value: *const c_char,
    operation: Operation,
) -> Result<*mut FfiGatewayResult, *mut FfiGatewayResult> {
    if client.is_null() {
        return Err(FfiGatewayResult::null_arg("client"));
    }
    let client = unsafe { &*client };
    let domain = unsafe { read_arg(domain, "domain") }?;
    let record_name = unsafe { read_arg(record_name, "record_name") }?;
    let value = unsafe { read_arg(value, "value") }?;
    Ok(match operation(&client.inner, domain, record_name, value) {
        Ok(()) => FfiGatewayResult::ok(),
        Err(e) => FfiGatewayResult::from_error(e),
    })
}

/// Publish the TXT record `record_name` with `value` in the zone of `domain`.
///
/// Succeeds without a change when the record already holds `value`; fails
/// with `Conflict` when it holds a different value. The caller must free the
/// result with `schlund_free_result`.
#[unsafe(no_mangle)]
pub extern "C" fn schlund_add_txt_record(
    client: *const FfiGatewayClient,
    domain: *const c_char,
    record_name: *const c_char,
    value: *const c_char,
) -> *mut FfiGatewayResult {
    catch_unwind(AssertUnwindSafe(|| {
        run_operation(client, domain, record_name, value, GatewayClient::add_txt_record)
            .unwrap_or_else(|err| err)
    }))
    .unwrap_or_else(|_| FfiGatewayResult::panic("panic in schlund_add_txt_record"))
}

/// Remove the TXT record `record_name` with `value` from the zone of
/// `domain`. The caller must free the result with `schlund_free_result`.
#[unsafe(no_mangle)]
pub extern "C" fn schlund_del_txt_record(
    client: *const FfiGatewayClient,
    domain: *const c_char,
    record_name: *const c_char,
    value: *const c_char,
) -> *mut FfiGatewayResult {
    catch_unwind(AssertUnwindSafe(|| {
        run_operation(client, domain, record_name, value, GatewayClient::del_txt_record)
            .unwrap_or_else(|err| err)
    }))
    .unwrap_or_else(|_| FfiGatewayResult::panic("panic in schlund_del_txt_record"))
}

// ---------------------------------------------------------------------------
// Free functions
// ---------------------------------------------------------------------------

/// Free a result returned by a record operation. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn schlund_free_result(result: *mut FfiGatewayResult) {
    if result.is_null() {
        return;
    }
    let _ = catch_unwind(|| {
        let result = unsafe { Box::from_raw(result) };
        if !result.error_message.is_null() {
            drop(unsafe { CString::from_raw(result.error_message) });
        }
    });
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
