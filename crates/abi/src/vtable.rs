// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Veil

//! Function table of the generic core entry points

use core::ffi::{c_char, c_void};

use crate::{data::SliceFFI, error::{ErrorFFI, ResultFFI}};

/// ABI revision implemented by this header crate
///
/// A core library advertising a different revision in its vtable is rejected
/// at bind time.
pub const CURRENT_API: u32 = 1;

/// Symbol the core shared library exports to hand over its vtable
///
/// Signature: `extern "C" fn() -> *const CoreVTableFFI`.
pub const VTABLE_SYMBOL: &[u8] = b"veil_core_vtable\0";

/// Virtual function table of the generic, type-agnostic core entry points
///
/// Per-kind constructors, invoke entry points and metadata accessors are
/// resolved separately by the generated wrappers; this table carries only
/// what every call path shares: loading and unloading erased objects, the
/// free functions, and a handful of pure numeric helpers. All function
/// pointers must be valid (non-null).
#[repr(C)]
#[derive(Clone, Copy)]
pub struct CoreVTableFFI {
	/// ABI revision; must equal [`CURRENT_API`]
	pub api: u32,

	/// Load a staged slice into a core-owned erased object
	///
	/// `type_name` is the NUL-terminated descriptor text the slice was
	/// staged against. On success the returned object is owned by the
	/// caller and must be released with `object_free`.
	pub slice_as_object: extern "C" fn(raw: *const SliceFFI, type_name: *const c_char) -> ResultFFI<*mut c_void>,

	/// Descriptor text of an erased object; release with `str_free`
	pub object_type: extern "C" fn(obj: *const c_void) -> ResultFFI<*mut c_char>,

	/// Unload an erased object into a core-allocated slice
	///
	/// The slice borrows the object's memory; release the header with
	/// `slice_free` before the object itself is freed.
	pub object_as_slice: extern "C" fn(obj: *const c_void) -> ResultFFI<*mut SliceFFI>,

	/// Convert a slice of erased objects into a slice of raw object pointers
	pub object_ptrs: extern "C" fn(raw: *const SliceFFI) -> ResultFFI<*mut SliceFFI>,

	/// Debug rendering of an erased object; release with `str_free`
	pub object_to_string: extern "C" fn(obj: *const c_void) -> ResultFFI<*mut c_char>,

	/// Release an erased object
	pub object_free: extern "C" fn(obj: *mut c_void) -> ResultFFI<*mut c_void>,

	/// Release a core-allocated slice header
	pub slice_free: extern "C" fn(slice: *mut SliceFFI) -> ResultFFI<*mut c_void>,

	/// Release a core-allocated string
	pub str_free: extern "C" fn(s: *mut c_char) -> ResultFFI<*mut c_void>,

	/// Release a core-allocated boolean
	pub bool_free: extern "C" fn(b: *mut u8) -> ResultFFI<*mut c_void>,

	/// Release an error payload; returns false if the pointer was null
	pub error_free: extern "C" fn(err: *mut ErrorFFI) -> bool,

	/// Release a transformation
	pub transformation_free: extern "C" fn(ptr: *mut c_void) -> ResultFFI<*mut c_void>,

	/// Release a measurement
	pub measurement_free: extern "C" fn(ptr: *mut c_void) -> ResultFFI<*mut c_void>,

	/// Release a domain
	pub domain_free: extern "C" fn(ptr: *mut c_void) -> ResultFFI<*mut c_void>,

	/// Release a metric
	pub metric_free: extern "C" fn(ptr: *mut c_void) -> ResultFFI<*mut c_void>,

	/// Release a measure
	pub measure_free: extern "C" fn(ptr: *mut c_void) -> ResultFFI<*mut c_void>,

	/// Release a function
	pub function_free: extern "C" fn(ptr: *mut c_void) -> ResultFFI<*mut c_void>,

	/// Inverse error function, consumed directly by accuracy helpers
	pub erf_inv: extern "C" fn(x: f64) -> f64,

	/// Fill a host buffer with cryptographically secure random bytes
	pub fill_bytes: extern "C" fn(ptr: *mut u8, len: usize) -> bool,
}
