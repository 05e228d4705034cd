// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Veil

//! Error translation, return-value consumption and the numeric helpers

mod common;

use std::ffi::CString;

use core::ffi::c_void;
use veil_abi::ResultFFI;
use veil_host::{bridge, library, translate, Arena, HostError, ObjectKind, Staged, Value};

#[test]
fn test_translate_ok_passes_through() {
	common::bind();
	assert_eq!(translate(ResultFFI::Ok(7u32)).unwrap(), 7);
}

#[test]
fn test_error_format_without_backtrace() {
	common::bind();
	let payload = common::make_error("DomainError", "bounds invalid", "backtrace disabled");
	let err = translate::<*mut c_void>(ResultFFI::Err(payload)).unwrap_err();
	let HostError::Foreign(text) = &err else {
		panic!("expected Foreign, got {err:?}");
	};
	assert_eq!(text, "[DomainError] : bounds invalid");
	assert!(!text.contains('\n'));
	assert_eq!(common::freed_count("error", payload as *const c_void), 1);
}

#[test]
fn test_error_format_with_backtrace() {
	common::bind();
	let payload = common::make_error("FailedFunction", "scale must be positive", "0: veil_core::measurements::check");
	let err = translate::<*mut c_void>(ResultFFI::Err(payload)).unwrap_err();
	assert_eq!(
		err.to_string(),
		"[FailedFunction] : scale must be positive\n0: veil_core::measurements::check"
	);
	assert_eq!(common::freed_count("error", payload as *const c_void), 1);
}

#[test]
fn test_consume_string_releases_once() {
	common::bind();
	let raw = CString::new("from the core").unwrap().into_raw();
	assert_eq!(bridge::consume_string(raw).unwrap(), "from the core");
	assert_eq!(common::freed_count("str", raw as *const c_void), 1);
}

#[test]
fn test_consume_bool_releases_once() {
	common::bind();
	let raw = Box::into_raw(Box::new(1u8));
	assert!(bridge::consume_bool(raw).unwrap());
	assert_eq!(common::freed_count("bool", raw as *const c_void), 1);
}

#[test]
fn test_load_and_unload_object_round_trip() {
	common::bind();
	let mut arena = Arena::new();
	let original = || Value::List(vec![Value::Float(0.5), Value::Float(1.5)]);
	let Staged::Slice(raw) = veil_host::to_foreign(&mut arena, &original(), "Vec<f64>").unwrap() else {
		panic!("expected a slice");
	};

	let handle = bridge::load_object(&raw, "Vec<f64>").unwrap();
	assert_eq!(handle.kind(), ObjectKind::Object);
	assert_eq!(bridge::object_type_of(&handle).unwrap(), "Vec<f64>");
	assert_eq!(bridge::object_debug(&handle).unwrap(), "StubObject<Vec<f64>>");

	let unloaded = bridge::unload_object(&handle).unwrap();
	let back = veil_host::from_foreign(&arena, Staged::Slice(*unloaded), "Vec<f64>").unwrap();
	assert_eq!(back, original());

	let header_ptr = &*unloaded as *const veil_abi::SliceFFI;
	drop(unloaded);
	assert_eq!(common::freed_count("slice", header_ptr as *const c_void), 1);

	let object = handle.unwrap(ObjectKind::Object).unwrap();
	drop(handle);
	assert_eq!(common::freed_count("object", object), 1);
}

#[test]
fn test_erf_inv_forwarded() {
	common::bind();
	assert_eq!(library::erf_inv(0.0).unwrap(), 0.0);
	assert!(library::erf_inv(0.5).unwrap() > 0.0);
	assert!(library::erf_inv(-0.5).unwrap() < 0.0);
}

#[test]
fn test_fill_bytes_forwarded() {
	common::bind();
	let mut buf = [0u8; 8];
	library::fill_bytes(&mut buf).unwrap();
	assert_eq!(buf, [0xA5; 8]);
}
