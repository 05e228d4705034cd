// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Veil

//! Stub core backing the integration suites
//!
//! Every free function records the pointer it was handed and leaks the
//! allocation, so exactly-once release is observable per pointer even with
//! tests running in parallel.

#![allow(dead_code)]

use std::{
	ffi::{CStr, CString},
	sync::Mutex,
};

use core::ffi::{c_char, c_void};
use veil_abi::{CoreVTableFFI, ErrorFFI, ResultFFI, SliceFFI, CURRENT_API};

static FREED: Mutex<Vec<(&'static str, usize)>> = Mutex::new(Vec::new());

fn record(kind: &'static str, ptr: usize) {
	FREED.lock().unwrap().push((kind, ptr));
}

/// How often a free function of `kind` has seen `ptr`
pub fn freed_count(kind: &str, ptr: *const c_void) -> usize {
	FREED.lock().unwrap().iter().filter(|(k, p)| *k == kind && *p == ptr as usize).count()
}

/// A unique fake core object pointer
pub fn new_instance() -> *mut c_void {
	Box::into_raw(Box::new(0xAB5E_u64)) as *mut c_void
}

/// A core-style error payload for translation tests
pub fn make_error(variant: &str, message: &str, backtrace: &str) -> *mut ErrorFFI {
	Box::into_raw(Box::new(ErrorFFI {
		variant: CString::new(variant).unwrap().into_raw(),
		message: CString::new(message).unwrap().into_raw(),
		backtrace: CString::new(backtrace).unwrap().into_raw(),
	}))
}

struct StubObject {
	slice: SliceFFI,
	type_name: String,
}

extern "C" fn stub_slice_as_object(raw: *const SliceFFI, type_name: *const c_char) -> ResultFFI<*mut c_void> {
	let slice = unsafe { *raw };
	let type_name = unsafe { CStr::from_ptr(type_name) }.to_string_lossy().into_owned();
	ResultFFI::Ok(Box::into_raw(Box::new(StubObject {
		slice,
		type_name,
	})) as *mut c_void)
}

extern "C" fn stub_object_type(obj: *const c_void) -> ResultFFI<*mut c_char> {
	let obj = unsafe { &*(obj as *const StubObject) };
	ResultFFI::Ok(CString::new(obj.type_name.clone()).unwrap().into_raw())
}

extern "C" fn stub_object_as_slice(obj: *const c_void) -> ResultFFI<*mut SliceFFI> {
	let obj = unsafe { &*(obj as *const StubObject) };
	ResultFFI::Ok(Box::into_raw(Box::new(obj.slice)))
}

extern "C" fn stub_object_ptrs(raw: *const SliceFFI) -> ResultFFI<*mut SliceFFI> {
	// stub slices of objects already carry raw pointers
	ResultFFI::Ok(Box::into_raw(Box::new(unsafe { *raw })))
}

extern "C" fn stub_object_to_string(obj: *const c_void) -> ResultFFI<*mut c_char> {
	let obj = unsafe { &*(obj as *const StubObject) };
	ResultFFI::Ok(CString::new(format!("StubObject<{}>", obj.type_name)).unwrap().into_raw())
}

extern "C" fn stub_object_free(ptr: *mut c_void) -> ResultFFI<*mut c_void> {
	record("object", ptr as usize);
	ResultFFI::Ok(std::ptr::null_mut())
}

extern "C" fn stub_slice_free(ptr: *mut SliceFFI) -> ResultFFI<*mut c_void> {
	record("slice", ptr as usize);
	ResultFFI::Ok(std::ptr::null_mut())
}

extern "C" fn stub_str_free(ptr: *mut c_char) -> ResultFFI<*mut c_void> {
	record("str", ptr as usize);
	ResultFFI::Ok(std::ptr::null_mut())
}

extern "C" fn stub_bool_free(ptr: *mut u8) -> ResultFFI<*mut c_void> {
	record("bool", ptr as usize);
	ResultFFI::Ok(std::ptr::null_mut())
}

extern "C" fn stub_error_free(err: *mut ErrorFFI) -> bool {
	record("error", err as usize);
	!err.is_null()
}

extern "C" fn stub_transformation_free(ptr: *mut c_void) -> ResultFFI<*mut c_void> {
	record("transformation", ptr as usize);
	ResultFFI::Ok(std::ptr::null_mut())
}

extern "C" fn stub_measurement_free(ptr: *mut c_void) -> ResultFFI<*mut c_void> {
	record("measurement", ptr as usize);
	ResultFFI::Ok(std::ptr::null_mut())
}

extern "C" fn stub_domain_free(ptr: *mut c_void) -> ResultFFI<*mut c_void> {
	record("domain", ptr as usize);
	ResultFFI::Ok(std::ptr::null_mut())
}

extern "C" fn stub_metric_free(ptr: *mut c_void) -> ResultFFI<*mut c_void> {
	record("metric", ptr as usize);
	ResultFFI::Ok(std::ptr::null_mut())
}

extern "C" fn stub_measure_free(ptr: *mut c_void) -> ResultFFI<*mut c_void> {
	record("measure", ptr as usize);
	ResultFFI::Ok(std::ptr::null_mut())
}

extern "C" fn stub_function_free(ptr: *mut c_void) -> ResultFFI<*mut c_void> {
	record("function", ptr as usize);
	ResultFFI::Ok(std::ptr::null_mut())
}

extern "C" fn stub_erf_inv(x: f64) -> f64 {
	if x == 0.0 {
		0.0
	} else {
		x.signum() * (-(1.0 - x.abs()).ln()).sqrt()
	}
}

extern "C" fn stub_fill_bytes(ptr: *mut u8, len: usize) -> bool {
	unsafe {
		std::ptr::write_bytes(ptr, 0xA5, len);
	}
	true
}

pub fn vtable() -> CoreVTableFFI {
	CoreVTableFFI {
		api: CURRENT_API,
		slice_as_object: stub_slice_as_object,
		object_type: stub_object_type,
		object_as_slice: stub_object_as_slice,
		object_ptrs: stub_object_ptrs,
		object_to_string: stub_object_to_string,
		object_free: stub_object_free,
		slice_free: stub_slice_free,
		str_free: stub_str_free,
		bool_free: stub_bool_free,
		error_free: stub_error_free,
		transformation_free: stub_transformation_free,
		measurement_free: stub_measurement_free,
		domain_free: stub_domain_free,
		metric_free: stub_metric_free,
		measure_free: stub_measure_free,
		function_free: stub_function_free,
		erf_inv: stub_erf_inv,
		fill_bytes: stub_fill_bytes,
	}
}

/// Bind the stub core, tolerating repeat binds within a test binary
pub fn bind() {
	let _ = veil_host::library::install(vtable());
}
