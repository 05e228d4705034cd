// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Veil

//! Translation and release of foreign results
//!
//! Every foreign call site routes its error path through [`translate`]: the
//! formatting is uniform and the error payload is released exactly once.
//! The consume functions and the [`ForeignSlice`] guard do the same for the
//! other core-allocated return values.

use core::ffi::{c_char, CStr};
use std::{
	ffi::CString,
	ops::Deref,
	panic::{catch_unwind, AssertUnwindSafe},
};

use tracing::{error, warn};
use veil_abi::{ErrorFFI, ResultFFI, SliceFFI, BACKTRACE_DISABLED};

use crate::{
	error::{HostError, Result},
	handle::{Handle, ObjectKind},
	library,
};

/// Translate a foreign tagged result into a host result
///
/// On the error arm the payload is formatted as `[{kind}] : {message}`, the
/// backtrace is appended on its own following line unless the core reports
/// it disabled, and the payload is released before returning.
pub fn translate<T>(result: ResultFFI<T>) -> Result<T> {
	match result.into_result() {
		Ok(value) => Ok(value),
		Err(err) => Err(consume_error(err)),
	}
}

/// Format and release a foreign error payload
pub(crate) fn consume_error(err: *mut ErrorFFI) -> HostError {
	if err.is_null() {
		return HostError::Foreign("core returned an error with no payload".to_string());
	}
	let (variant, message, backtrace) = unsafe {
		let payload = &*err;
		(copy_cstr(payload.variant), copy_cstr(payload.message), copy_cstr(payload.backtrace))
	};
	release_error(err);

	let mut text = format!("[{}] : {}", variant, message);
	if !backtrace.is_empty() && backtrace != BACKTRACE_DISABLED {
		text.push('\n');
		text.push_str(&backtrace);
	}
	HostError::Foreign(text)
}

fn release_error(err: *mut ErrorFFI) {
	let Ok(core) = library::core() else {
		warn!("core library not bound, leaking foreign error payload");
		return;
	};
	let error_free = core.vtable().error_free;
	if catch_unwind(AssertUnwindSafe(|| error_free(err))).is_err() {
		error!("foreign error_free panicked");
	}
}

fn copy_cstr(ptr: *const c_char) -> String {
	if ptr.is_null() {
		return String::new();
	}
	unsafe { CStr::from_ptr(ptr) }.to_string_lossy().into_owned()
}

/// Copy a core-allocated string and release it
pub fn consume_string(ptr: *mut c_char) -> Result<String> {
	if ptr.is_null() {
		return Err(HostError::Foreign("core returned a null string".to_string()));
	}
	let value = copy_cstr(ptr);
	let core = library::core()?;
	translate(guarded("str_free", || (core.vtable().str_free)(ptr))?)?;
	Ok(value)
}

/// Copy a core-allocated boolean and release it
pub fn consume_bool(ptr: *mut u8) -> Result<bool> {
	if ptr.is_null() {
		return Err(HostError::Foreign("core returned a null bool".to_string()));
	}
	let value = unsafe { *ptr } != 0;
	let core = library::core()?;
	translate(guarded("bool_free", || (core.vtable().bool_free)(ptr))?)?;
	Ok(value)
}

/// A core-allocated slice released on scope exit, success or error
pub struct ForeignSlice {
	raw: *mut SliceFFI,
}

impl ForeignSlice {
	fn from_raw(raw: *mut SliceFFI) -> Result<Self> {
		if raw.is_null() {
			return Err(HostError::Foreign("core returned a null slice".to_string()));
		}
		Ok(Self {
			raw,
		})
	}
}

impl Deref for ForeignSlice {
	type Target = SliceFFI;

	fn deref(&self) -> &SliceFFI {
		unsafe { &*self.raw }
	}
}

impl Drop for ForeignSlice {
	fn drop(&mut self) {
		let Ok(core) = library::core() else {
			warn!("core library not bound, leaking foreign slice");
			return;
		};
		let slice_free = core.vtable().slice_free;
		let raw = self.raw;
		match catch_unwind(AssertUnwindSafe(|| slice_free(raw))) {
			Ok(ResultFFI::Ok(_)) => {}
			Ok(ResultFFI::Err(err)) => {
				let failure = consume_error(err);
				error!(%failure, "foreign slice_free failed");
			}
			Err(_) => {
				error!("foreign slice_free panicked");
			}
		}
	}
}

/// Load a staged slice into a core-owned erased object
pub fn load_object(raw: &SliceFFI, type_name: &str) -> Result<Handle> {
	let c_type_name = CString::new(type_name)
		.map_err(|_| HostError::Parse(format!("descriptor `{}` contains a NUL byte", type_name)))?;
	let core = library::core()?;
	let ptr = translate(guarded("slice_as_object", || {
		(core.vtable().slice_as_object)(raw, c_type_name.as_ptr())
	})?)?;
	Ok(Handle::wrap(ptr, ObjectKind::Object))
}

/// Unload an erased object into a scoped foreign slice
pub fn unload_object(handle: &Handle) -> Result<ForeignSlice> {
	let obj = handle.raw()?;
	let core = library::core()?;
	let raw = translate(guarded("object_as_slice", || (core.vtable().object_as_slice)(obj))?)?;
	ForeignSlice::from_raw(raw)
}

/// Convert a slice of erased objects into a slice of raw object pointers
pub fn object_ptrs(raw: &SliceFFI) -> Result<ForeignSlice> {
	let core = library::core()?;
	let converted = translate(guarded("object_ptrs", || (core.vtable().object_ptrs)(raw))?)?;
	ForeignSlice::from_raw(converted)
}

/// Descriptor text of an erased object
pub fn object_type_of(handle: &Handle) -> Result<String> {
	let obj = handle.raw()?;
	let core = library::core()?;
	consume_string(translate(guarded("object_type", || (core.vtable().object_type)(obj))?)?)
}

/// Debug rendering of an erased object
pub fn object_debug(handle: &Handle) -> Result<String> {
	let obj = handle.raw()?;
	let core = library::core()?;
	consume_string(translate(guarded("object_to_string", || (core.vtable().object_to_string)(obj))?)?)
}

/// Contain a panic escaping a foreign call
fn guarded<T>(entry_point: &str, call: impl FnOnce() -> T) -> Result<T> {
	catch_unwind(AssertUnwindSafe(call))
		.map_err(|_| HostError::Foreign(format!("core panicked during {}", entry_point)))
}
