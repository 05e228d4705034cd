// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Veil

//! Host value marshaling surface
//!
//! The per-operation wrappers stage every argument through [`to_foreign`]
//! and rebuild every result through [`from_foreign`]; the descriptor text
//! decides the layout, the arena owns the staged memory for the call.

mod atoms;
mod value;

use core::ffi::c_void;
use std::ptr;

use tracing::instrument;
use veil_abi::SliceFFI;

use crate::{
	arena::Arena,
	bridge, descriptor,
	descriptor::TypeDescriptor,
	error::{HostError, Result},
	handle::{Handle, ObjectKind},
	value::Value,
};

/// What a marshaled host value crosses the boundary as
#[derive(Debug)]
pub enum Staged {
	/// A call-scoped view over arena- or core-owned memory
	Slice(SliceFFI),
	/// A borrowed or transferred raw object pointer
	Object(*mut c_void),
}

/// Convert a host value into its foreign form
#[instrument(level = "debug", skip_all, fields(ty = type_name))]
pub fn to_foreign(arena: &mut Arena, value: &Value, type_name: &str) -> Result<Staged> {
	let ty = descriptor::parse(type_name)?;
	match &ty {
		TypeDescriptor::Object(kind) => match value {
			Value::Object(handle) => Ok(Staged::Object(handle.unwrap(*kind)?)),
			_ => Err(HostError::IncompatibleValue {
				expected: ty.to_string(),
				got: value.kind_str(),
			}),
		},
		TypeDescriptor::Option(inner) => {
			if let TypeDescriptor::Object(kind) = &**inner {
				return match value {
					Value::Null => Ok(Staged::Object(ptr::null_mut())),
					Value::Object(handle) => Ok(Staged::Object(handle.unwrap(*kind)?)),
					_ => Err(HostError::IncompatibleValue {
						expected: ty.to_string(),
						got: value.kind_str(),
					}),
				};
			}
			Ok(Staged::Slice(arena.marshal(value, &ty)?))
		}
		_ => Ok(Staged::Slice(arena.marshal(value, &ty)?)),
	}
}

/// Convert a foreign slice or object back into a host value
///
/// An object descriptor takes ownership of the pointer into a fresh handle.
/// A slice of erased objects is first converted into raw pointers through
/// the core.
#[instrument(level = "debug", skip_all, fields(ty = type_name))]
pub fn from_foreign(arena: &Arena, staged: Staged, type_name: &str) -> Result<Value> {
	let ty = descriptor::parse(type_name)?;
	match staged {
		Staged::Object(ptr) => object_from_ptr(ptr, &ty),
		Staged::Slice(raw) => {
			if let TypeDescriptor::Vec(inner) = &ty {
				if matches!(**inner, TypeDescriptor::Object(ObjectKind::Object)) {
					let pointers = bridge::object_ptrs(&raw)?;
					return arena.unmarshal(&pointers, &ty);
				}
			}
			arena.unmarshal(&raw, &ty)
		}
	}
}

fn object_from_ptr(ptr: *mut c_void, ty: &TypeDescriptor) -> Result<Value> {
	match ty {
		TypeDescriptor::Object(kind) => {
			if ptr.is_null() {
				return Err(HostError::Foreign("core returned a null object".to_string()));
			}
			Ok(Value::Object(Handle::wrap(ptr, *kind)))
		}
		TypeDescriptor::Option(inner) => {
			if ptr.is_null() {
				return Ok(Value::Null);
			}
			object_from_ptr(ptr, inner)
		}
		_ => Err(HostError::IncompatibleValue {
			expected: ty.to_string(),
			got: "object",
		}),
	}
}
