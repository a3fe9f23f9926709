//! Purpose: C ABI bridge for non-Rust callers (libaiscdec).
//! Exports: `aiscdec_new`, `aiscdec_new_with_config`, `aiscdec_destroy`, `aiscdec_decode`,
//!          `aiscdec_buf_free`, `aiscdec_error_free`.
//! Role: Mirrors the classic `aiscdec_*` C surface on top of `PythonDecoder`.
//! Invariants: JSON bytes out; opaque handles; explicit free functions.
//! Invariants: Return 0 on success, -1 on failure; error kinds map 1:1 with `ErrorKind` codes.
//! Notes: `aiscdec_destroy` nulls the caller's handle, so a later `aiscdec_decode` on it
//!        reports `Usage` ("decoder is null"), not `UseAfterDestroy`.
#![allow(non_camel_case_types)]

use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::ptr;

use serde_json::Value;

use crate::core::config::DecoderConfig;
use crate::core::error::{Error, ErrorKind, to_exit_code};
use crate::core::python::{PythonDecoder, create_decoder};

#[repr(C)]
pub struct aiscdec_t {
    decoder: PythonDecoder,
}

#[repr(C)]
pub struct aiscdec_buf {
    data: *mut u8,
    len: usize,
}

#[repr(C)]
pub struct aiscdec_error {
    kind: i32,
    message: *mut c_char,
    key: *mut c_char,
    type_name: *mut c_char,
}

/// Creates a decoder from defaults plus `AISCDEC_*` environment overrides.
#[unsafe(no_mangle)]
pub extern "C" fn aiscdec_new(
    out_decoder: *mut *mut aiscdec_t,
    out_err: *mut *mut aiscdec_error,
) -> i32 {
    let config = match DecoderConfig::default().with_env() {
        Ok(config) => config,
        Err(err) => return fail(out_err, err),
    };
    new_with(config, out_decoder, out_err)
}

/// Creates a decoder from a JSON config document (same shape as the CLI's `--config`).
#[unsafe(no_mangle)]
pub extern "C" fn aiscdec_new_with_config(
    config_json: *const c_char,
    out_decoder: *mut *mut aiscdec_t,
    out_err: *mut *mut aiscdec_error,
) -> i32 {
    let config = match c_str(config_json, "config_json").and_then(DecoderConfig::from_json_str) {
        Ok(config) => config,
        Err(err) => return fail(out_err, err),
    };
    new_with(config, out_decoder, out_err)
}

#[unsafe(no_mangle)]
pub extern "C" fn aiscdec_destroy(self_p: *mut *mut aiscdec_t) {
    if self_p.is_null() {
        return;
    }
    unsafe {
        let handle = *self_p;
        if handle.is_null() {
            return;
        }
        drop(Box::from_raw(handle));
        *self_p = ptr::null_mut();
    }
}

#[unsafe(no_mangle)]
pub extern "C" fn aiscdec_decode(
    decoder: *mut aiscdec_t,
    body: *const c_char,
    padding: usize,
    out_json: *mut aiscdec_buf,
    out_err: *mut *mut aiscdec_error,
) -> i32 {
    if decoder.is_null() {
        return fail(
            out_err,
            Error::new(ErrorKind::Usage).with_message("decoder is null"),
        );
    }
    let decoder = unsafe { &*decoder };
    let body = match c_str(body, "body") {
        Ok(body) => body,
        Err(err) => return fail(out_err, err),
    };
    let padding = match u8::try_from(padding) {
        Ok(padding) => padding,
        Err(err) => {
            return fail(
                out_err,
                Error::new(ErrorKind::Usage)
                    .with_message("padding out of range")
                    .with_source(err),
            );
        }
    };
    let value = match decoder.decoder.decode(body, padding) {
        Ok(value) => value,
        Err(err) => return fail(out_err, err),
    };
    if let Err(err) = write_json_buf(out_json, &value) {
        return fail(out_err, err);
    }
    0
}

#[unsafe(no_mangle)]
pub extern "C" fn aiscdec_buf_free(buf: *mut aiscdec_buf) {
    if buf.is_null() {
        return;
    }
    unsafe {
        let buf = &mut *buf;
        if !buf.data.is_null() && buf.len != 0 {
            drop(Vec::from_raw_parts(buf.data, buf.len, buf.len));
        }
        buf.data = ptr::null_mut();
        buf.len = 0;
    }
}

#[unsafe(no_mangle)]
pub extern "C" fn aiscdec_error_free(err: *mut aiscdec_error) {
    if err.is_null() {
        return;
    }
    unsafe {
        let err = Box::from_raw(err);
        for field in [err.message, err.key, err.type_name] {
            if !field.is_null() {
                drop(CString::from_raw(field));
            }
        }
    }
}

fn new_with(
    config: DecoderConfig,
    out_decoder: *mut *mut aiscdec_t,
    out_err: *mut *mut aiscdec_error,
) -> i32 {
    if out_decoder.is_null() {
        return fail(
            out_err,
            Error::new(ErrorKind::Usage).with_message("out_decoder is null"),
        );
    }
    let decoder = match create_decoder(&config) {
        Ok(decoder) => decoder,
        Err(err) => return fail(out_err, err),
    };
    let handle = Box::new(aiscdec_t { decoder });
    unsafe {
        *out_decoder = Box::into_raw(handle);
    }
    0
}

fn c_str<'a>(input: *const c_char, name: &str) -> Result<&'a str, Error> {
    if input.is_null() {
        return Err(Error::new(ErrorKind::Usage).with_message(format!("{name} is null")));
    }
    unsafe { CStr::from_ptr(input) }.to_str().map_err(|err| {
        Error::new(ErrorKind::Usage)
            .with_message(format!("{name} is not valid UTF-8"))
            .with_source(err)
    })
}

fn write_json_buf(out_json: *mut aiscdec_buf, value: &Value) -> Result<(), Error> {
    if out_json.is_null() {
        return Err(Error::new(ErrorKind::Usage).with_message("out_json is null"));
    }
    let json_bytes = serde_json::to_vec(value).map_err(|err| {
        Error::new(ErrorKind::Internal)
            .with_message("failed to serialize decode result")
            .with_source(err)
    })?;
    unsafe {
        let buf = &mut *out_json;
        let mut data = json_bytes.into_boxed_slice();
        buf.len = data.len();
        buf.data = data.as_mut_ptr();
        std::mem::forget(data);
    }
    Ok(())
}

fn fail(out_err: *mut *mut aiscdec_error, err: Error) -> i32 {
    if out_err.is_null() {
        return -1;
    }
    let error = Box::new(aiscdec_error {
        kind: to_exit_code(err.kind()),
        message: to_c_string(err.message().unwrap_or("")),
        key: err.key().map(to_c_string).unwrap_or(ptr::null_mut()),
        type_name: err.type_name().map(to_c_string).unwrap_or(ptr::null_mut()),
    });
    unsafe {
        *out_err = Box::into_raw(error);
    }
    -1
}

fn to_c_string(input: &str) -> *mut c_char {
    CString::new(input)
        .map(|s| s.into_raw())
        .unwrap_or(ptr::null_mut())
}
