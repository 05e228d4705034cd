// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Veil

//! Tagged, finalizer-guarded ownership of foreign objects
//!
//! Once a pointer has crossed the boundary it never exists outside a
//! [`Handle`]. The drop glue is the finalizer; its timing relative to other
//! handles is not assumed anywhere in this crate.

use core::ffi::c_void;
use std::{
	cell::Cell,
	fmt,
	panic::{catch_unwind, AssertUnwindSafe},
	ptr,
};

use tracing::{error, warn};
use veil_abi::{CoreVTableFFI, ResultFFI};

use crate::{
	bridge,
	error::{HostError, Result},
	library,
	value::Value,
};

/// Kind tag identifying which foreign object a handle owns
///
/// Each kind selects the matching free function. Queryables are erased
/// object containers in the core and release through `object_free`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectKind {
	Transformation,
	Measurement,
	Domain,
	Metric,
	Measure,
	Function,
	Queryable,
	Object,
}

impl ObjectKind {
	/// Descriptor-text name of the kind
	pub fn name(&self) -> &'static str {
		match self {
			ObjectKind::Transformation => "Transformation",
			ObjectKind::Measurement => "Measurement",
			ObjectKind::Domain => "Domain",
			ObjectKind::Metric => "Metric",
			ObjectKind::Measure => "Measure",
			ObjectKind::Function => "Function",
			ObjectKind::Queryable => "Queryable",
			ObjectKind::Object => "Object",
		}
	}

	pub(crate) fn from_name(name: &str) -> Option<Self> {
		Some(match name {
			"Transformation" => ObjectKind::Transformation,
			"Measurement" => ObjectKind::Measurement,
			"Domain" => ObjectKind::Domain,
			"Metric" => ObjectKind::Metric,
			"Measure" => ObjectKind::Measure,
			"Function" => ObjectKind::Function,
			"Queryable" => ObjectKind::Queryable,
			"Object" => ObjectKind::Object,
			_ => return None,
		})
	}

	fn free_fn(&self, vtable: &CoreVTableFFI) -> extern "C" fn(*mut c_void) -> ResultFFI<*mut c_void> {
		match self {
			ObjectKind::Transformation => vtable.transformation_free,
			ObjectKind::Measurement => vtable.measurement_free,
			ObjectKind::Domain => vtable.domain_free,
			ObjectKind::Metric => vtable.metric_free,
			ObjectKind::Measure => vtable.measure_free,
			ObjectKind::Function => vtable.function_free,
			ObjectKind::Queryable | ObjectKind::Object => vtable.object_free,
		}
	}
}

impl fmt::Display for ObjectKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let word = match self {
			ObjectKind::Transformation => "transformation",
			ObjectKind::Measurement => "measurement",
			ObjectKind::Domain => "domain",
			ObjectKind::Metric => "metric",
			ObjectKind::Measure => "measure",
			ObjectKind::Function => "function",
			ObjectKind::Queryable => "queryable",
			ObjectKind::Object => "object",
		};
		f.write_str(word)
	}
}

/// Host-owned wrapper around a foreign object pointer
///
/// Bound (live pointer) or Freed (pointer cleared, tag retained); Freed is
/// terminal. Exclusively owned by the host reference holding it: handles
/// are never shared by construction and perform no locking.
pub struct Handle {
	ptr: Cell<*mut c_void>,
	kind: ObjectKind,
	/// Host-only introspection payload; never crosses the boundary
	info: Option<Box<Value>>,
}

impl Handle {
	/// Wrap a pointer the core has handed over, taking ownership
	pub fn wrap(ptr: *mut c_void, kind: ObjectKind) -> Self {
		Self {
			ptr: Cell::new(ptr),
			kind,
			info: None,
		}
	}

	/// Attach parameter metadata for host-side introspection
	pub fn with_info(mut self, info: Value) -> Self {
		self.info = Some(Box::new(info));
		self
	}

	pub fn kind(&self) -> ObjectKind {
		self.kind
	}

	pub fn info(&self) -> Option<&Value> {
		self.info.as_deref()
	}

	pub fn is_freed(&self) -> bool {
		self.ptr.get().is_null()
	}

	/// The live pointer, regardless of kind
	pub fn raw(&self) -> Result<*mut c_void> {
		let ptr = self.ptr.get();
		if ptr.is_null() {
			return Err(HostError::UseAfterFree(self.kind));
		}
		Ok(ptr)
	}

	/// The live pointer, checked against an expected kind tag
	pub fn unwrap(&self, expected: ObjectKind) -> Result<*mut c_void> {
		if self.kind != expected {
			return Err(HostError::TypeMismatch {
				expected,
				got: self.kind,
			});
		}
		self.raw()
	}

	/// Release the foreign object; idempotent
	///
	/// Failures are suppressed: a finalizer runs outside any caller's stack
	/// and has no path to report upward. Clearing the pointer before the
	/// foreign call keeps re-entry a no-op.
	pub fn finalize(&self) {
		let ptr = self.ptr.replace(ptr::null_mut());
		if ptr.is_null() {
			return;
		}
		let core = match library::core() {
			Ok(core) => core,
			Err(_) => {
				warn!(kind = %self.kind, "core library not bound, leaking foreign object");
				return;
			}
		};
		let free = self.kind.free_fn(core.vtable());
		match catch_unwind(AssertUnwindSafe(|| free(ptr))) {
			Ok(ResultFFI::Ok(_)) => {}
			Ok(ResultFFI::Err(err)) => {
				let failure = bridge::consume_error(err);
				error!(kind = %self.kind, %failure, "foreign free failed");
			}
			Err(_) => {
				error!(kind = %self.kind, "foreign free panicked");
			}
		}
	}
}

impl Drop for Handle {
	fn drop(&mut self) {
		self.finalize();
	}
}

impl fmt::Debug for Handle {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Handle")
			.field("kind", &self.kind)
			.field("ptr", &self.ptr.get())
			.field("freed", &self.is_freed())
			.finish()
	}
}

impl PartialEq for Handle {
	fn eq(&self, other: &Self) -> bool {
		self.kind == other.kind && self.ptr.get() == other.ptr.get()
	}
}
