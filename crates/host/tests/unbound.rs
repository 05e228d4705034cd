// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Veil

//! Behavior before any core library is bound
//!
//! This binary never installs a vtable: pure marshaling still works, paths
//! that reach the core report `NotLoaded`, and finalizers leak instead of
//! crashing.

use core::ffi::c_void;
use veil_host::{from_foreign, library, to_foreign, Arena, Handle, HostError, ObjectKind, Staged, Value};

#[test]
fn test_marshaling_needs_no_core() {
	assert!(!library::is_loaded());
	let mut arena = Arena::new();
	let staged = to_foreign(&mut arena, &Value::List(vec![Value::Int(5)]), "Vec<i32>").unwrap();
	let back = from_foreign(&arena, staged, "Vec<i32>").unwrap();
	assert_eq!(back, Value::List(vec![Value::Int(5)]));
}

#[test]
fn test_object_ptr_conversion_requires_core() {
	let arena = Arena::new();
	let fake = 0x1000usize as *mut c_void;
	let pointers = arena.stage(&[fake]);
	let staged = Staged::Slice(veil_abi::SliceFFI::new(pointers as *const c_void, 1));
	let err = from_foreign(&arena, staged, "Vec<Object>").unwrap_err();
	assert!(matches!(err, HostError::NotLoaded), "got {err:?}");
}

#[test]
fn test_numeric_helpers_require_core() {
	assert!(matches!(library::erf_inv(0.5), Err(HostError::NotLoaded)));
	let mut buf = [0u8; 4];
	assert!(matches!(library::fill_bytes(&mut buf), Err(HostError::NotLoaded)));
}

#[test]
fn test_finalizer_leaks_rather_than_crashing() {
	let instance = Box::into_raw(Box::new(0u64)) as *mut c_void;
	let handle = Handle::wrap(instance, ObjectKind::Transformation);
	handle.finalize();
	assert!(handle.is_freed());
	drop(handle);
}
