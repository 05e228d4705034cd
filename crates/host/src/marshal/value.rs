// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Veil

//! Recursive, descriptor-dispatched value conversion
//!
//! Marshaling stages buffers in the arena and hands out `{ptr, len}` views;
//! unmarshaling reads foreign memory back into owned host values. The two
//! directions use the same layout rules, documented per descriptor on
//! [`Arena::marshal`].

use core::ffi::{c_char, c_void};
use std::ptr;

use veil_abi::SliceFFI;

use crate::{
	arena::Arena,
	descriptor::{AtomKind, TypeDescriptor},
	error::{HostError, Result},
	handle::Handle,
	marshal::atoms,
	value::{BitVec, Value},
};

impl Arena {
	/// Stage a host value as a foreign slice
	///
	/// Layout by descriptor:
	/// - numeric/bool atom: contiguous element array, scalars have length 1
	/// - `String`: NUL-terminated bytes, length counts the NUL
	/// - `Vec<atom>`: one container layer stripped; `Vec<String>` is an
	///   array of `c_char` pointers
	/// - `Vec<composite>`: array of pointers to nested slice headers
	/// - `Vec<object>`: array of raw object pointers unwrapped from handles
	/// - tuple: array of per-position element pointers, length is the arity
	/// - `Option<T>`: absent is the null slice, present is the layout of `T`
	/// - `HashMap<K, V>`: two pointers to nested slice headers, keys staged
	///   as `Vec<K>` and values as `Vec<V>`
	/// - `BitVector`: packed bytes, length counts bits
	pub fn marshal(&mut self, value: &Value, ty: &TypeDescriptor) -> Result<SliceFFI> {
		match ty {
			TypeDescriptor::Atom(AtomKind::String) => {
				let text = atoms::expect_str(value, "String")?;
				Ok(SliceFFI::new(self.copy_str(text) as *const c_void, text.len() + 1))
			}
			TypeDescriptor::Atom(atom) => atoms::stage_atoms(self, &[value], *atom),
			TypeDescriptor::Vec(inner) => {
				let Value::List(items) = value else {
					return Err(HostError::IncompatibleValue {
						expected: ty.to_string(),
						got: value.kind_str(),
					});
				};
				let items: Vec<&Value> = items.iter().collect();
				self.marshal_seq(&items, inner)
			}
			TypeDescriptor::Tuple(parts) => {
				// R-style hosts hand tuples over as plain sequences
				let items = match value {
					Value::Tuple(items) | Value::List(items) => items,
					_ => {
						return Err(HostError::IncompatibleValue {
							expected: ty.to_string(),
							got: value.kind_str(),
						});
					}
				};
				if items.len() != parts.len() {
					return Err(HostError::Arity {
						expected: parts.len(),
						got: items.len(),
					});
				}
				let mut pointers: Vec<*const c_void> = Vec::with_capacity(items.len());
				for (item, part) in items.iter().zip(parts) {
					pointers.push(self.stage_element(item, part)?);
				}
				Ok(SliceFFI::new(self.stage(&pointers) as *const c_void, pointers.len()))
			}
			TypeDescriptor::Option(inner) => {
				if matches!(value, Value::Null) {
					return Ok(SliceFFI::empty());
				}
				self.marshal(value, inner)
			}
			TypeDescriptor::Map(key_ty, value_ty) => {
				let Value::Map(entries) = value else {
					return Err(HostError::IncompatibleValue {
						expected: ty.to_string(),
						got: value.kind_str(),
					});
				};
				let keys: Vec<&Value> = entries.iter().map(|(k, _)| k).collect();
				let values: Vec<&Value> = entries.iter().map(|(_, v)| v).collect();
				let staged_keys = self.marshal_seq(&keys, key_ty)?;
				let staged_values = self.marshal_seq(&values, value_ty)?;
				let pointers = [self.stage_one(staged_keys), self.stage_one(staged_values)];
				Ok(SliceFFI::new(self.stage(&pointers) as *const c_void, 2))
			}
			TypeDescriptor::Bits => {
				let Value::Bits(bits) = value else {
					return Err(HostError::IncompatibleValue {
						expected: ty.to_string(),
						got: value.kind_str(),
					});
				};
				Ok(SliceFFI::new(self.copy_bytes(bits.as_bytes()) as *const c_void, bits.len()))
			}
			TypeDescriptor::Object(kind) => {
				let Value::Object(handle) = value else {
					return Err(HostError::IncompatibleValue {
						expected: ty.to_string(),
						got: value.kind_str(),
					});
				};
				Ok(SliceFFI::new(handle.unwrap(*kind)? as *const c_void, 1))
			}
			TypeDescriptor::Other {
				..
			} => Err(HostError::UnsupportedType(ty.to_string())),
		}
	}

	/// Stage a homogeneous sequence against its element descriptor
	fn marshal_seq(&mut self, items: &[&Value], inner: &TypeDescriptor) -> Result<SliceFFI> {
		match inner {
			TypeDescriptor::Atom(atom) => atoms::stage_atoms(self, items, *atom),
			TypeDescriptor::Object(kind) => {
				let mut pointers: Vec<*const c_void> = Vec::with_capacity(items.len());
				for item in items {
					let Value::Object(handle) = item else {
						return Err(HostError::IncompatibleValue {
							expected: inner.to_string(),
							got: item.kind_str(),
						});
					};
					pointers.push(handle.unwrap(*kind)? as *const c_void);
				}
				Ok(SliceFFI::new(self.stage(&pointers) as *const c_void, pointers.len()))
			}
			TypeDescriptor::Other {
				..
			} => Err(HostError::UnsupportedType(inner.to_string())),
			_ => {
				let mut headers: Vec<*const SliceFFI> = Vec::with_capacity(items.len());
				for item in items {
					let nested = self.marshal(item, inner)?;
					headers.push(self.stage_one(nested));
				}
				Ok(SliceFFI::new(self.stage(&headers) as *const c_void, headers.len()))
			}
		}
	}

	/// Stage one tuple position and return its address
	fn stage_element(&mut self, value: &Value, ty: &TypeDescriptor) -> Result<*const c_void> {
		match ty {
			TypeDescriptor::Option(inner) => {
				if matches!(value, Value::Null) {
					return Ok(ptr::null());
				}
				self.stage_element(value, inner)
			}
			TypeDescriptor::Atom(AtomKind::String) => {
				Ok(self.copy_str(atoms::expect_str(value, "String")?) as *const c_void)
			}
			TypeDescriptor::Atom(atom) => Ok(atoms::stage_atoms(self, &[value], *atom)?.ptr),
			TypeDescriptor::Object(kind) => {
				let Value::Object(handle) = value else {
					return Err(HostError::IncompatibleValue {
						expected: ty.to_string(),
						got: value.kind_str(),
					});
				};
				Ok(handle.unwrap(*kind)? as *const c_void)
			}
			TypeDescriptor::Other {
				..
			} => Err(HostError::UnsupportedType(ty.to_string())),
			_ => {
				let nested = self.marshal(value, ty)?;
				Ok(self.stage_one(nested) as *const c_void)
			}
		}
	}

	/// Read a foreign slice back into an owned host value
	pub fn unmarshal(&self, raw: &SliceFFI, ty: &TypeDescriptor) -> Result<Value> {
		match ty {
			TypeDescriptor::Atom(AtomKind::String) => {
				Ok(Value::Str(atoms::read_string(raw.ptr as *const c_char)?))
			}
			TypeDescriptor::Atom(atom) => atoms::read_atoms(raw, *atom)?
				.into_iter()
				.next()
				.ok_or_else(|| HostError::Foreign(format!("core returned an empty slice for {}", ty))),
			TypeDescriptor::Vec(inner) => Ok(Value::List(self.unmarshal_seq(raw, inner)?)),
			TypeDescriptor::Tuple(parts) => {
				if raw.len != parts.len() {
					return Err(HostError::Arity {
						expected: parts.len(),
						got: raw.len,
					});
				}
				let pointers = read_pointer_array(raw)?;
				let mut items = Vec::with_capacity(parts.len());
				for (&ptr, part) in pointers.iter().zip(parts) {
					items.push(self.read_element(ptr, part)?);
				}
				Ok(Value::Tuple(items))
			}
			TypeDescriptor::Option(inner) => {
				if raw.is_null() {
					return Ok(Value::Null);
				}
				self.unmarshal(raw, inner)
			}
			TypeDescriptor::Map(key_ty, value_ty) => {
				if raw.len != 2 {
					return Err(HostError::Foreign(format!(
						"malformed map slice of length {}",
						raw.len
					)));
				}
				let headers = read_header_array(raw)?;
				let keys = self.unmarshal_seq(unsafe { &*headers[0] }, key_ty)?;
				let values = self.unmarshal_seq(unsafe { &*headers[1] }, value_ty)?;
				if keys.len() != values.len() {
					return Err(HostError::Foreign(
						"map keys and values differ in length".to_string(),
					));
				}
				Ok(Value::Map(keys.into_iter().zip(values).collect()))
			}
			TypeDescriptor::Bits => {
				let n_bytes = raw.len.div_ceil(8);
				if n_bytes > 0 && raw.is_null() {
					return Err(HostError::Foreign("core returned a null slice pointer".to_string()));
				}
				let bytes = unsafe { std::slice::from_raw_parts(raw.ptr as *const u8, n_bytes) };
				Ok(Value::Bits(BitVec::from_raw(bytes.to_vec(), raw.len)))
			}
			TypeDescriptor::Object(kind) => {
				if raw.is_null() {
					return Err(HostError::Foreign("core returned a null object".to_string()));
				}
				Ok(Value::Object(Handle::wrap(raw.ptr as *mut c_void, *kind)))
			}
			TypeDescriptor::Other {
				..
			} => Err(HostError::UnsupportedType(ty.to_string())),
		}
	}

	/// Read a homogeneous foreign sequence against its element descriptor
	fn unmarshal_seq(&self, raw: &SliceFFI, inner: &TypeDescriptor) -> Result<Vec<Value>> {
		match inner {
			TypeDescriptor::Atom(atom) => atoms::read_atoms(raw, *atom),
			TypeDescriptor::Object(kind) => {
				let pointers = read_pointer_array(raw)?;
				let mut out = Vec::with_capacity(pointers.len());
				for &ptr in &pointers {
					if ptr.is_null() {
						return Err(HostError::Foreign("core returned a null object".to_string()));
					}
					out.push(Value::Object(Handle::wrap(ptr as *mut c_void, *kind)));
				}
				Ok(out)
			}
			TypeDescriptor::Other {
				..
			} => Err(HostError::UnsupportedType(inner.to_string())),
			_ => {
				let headers = read_header_array(raw)?;
				let mut out = Vec::with_capacity(headers.len());
				for &header in &headers {
					out.push(self.unmarshal(unsafe { &*header }, inner)?);
				}
				Ok(out)
			}
		}
	}

	/// Read one tuple position
	fn read_element(&self, ptr: *const c_void, ty: &TypeDescriptor) -> Result<Value> {
		match ty {
			TypeDescriptor::Option(inner) => {
				if ptr.is_null() {
					return Ok(Value::Null);
				}
				self.read_element(ptr, inner)
			}
			TypeDescriptor::Atom(AtomKind::String) => Ok(Value::Str(atoms::read_string(ptr as *const c_char)?)),
			TypeDescriptor::Atom(atom) => atoms::read_atoms(&SliceFFI::new(ptr, 1), *atom)?
				.into_iter()
				.next()
				.ok_or_else(|| HostError::Foreign(format!("core returned an empty slice for {}", ty))),
			TypeDescriptor::Object(kind) => {
				if ptr.is_null() {
					return Err(HostError::Foreign("core returned a null object".to_string()));
				}
				Ok(Value::Object(Handle::wrap(ptr as *mut c_void, *kind)))
			}
			TypeDescriptor::Other {
				..
			} => Err(HostError::UnsupportedType(ty.to_string())),
			_ => {
				if ptr.is_null() {
					return Err(HostError::Foreign("core returned a null slice header".to_string()));
				}
				self.unmarshal(unsafe { &*(ptr as *const SliceFFI) }, ty)
			}
		}
	}
}

fn read_pointer_array(raw: &SliceFFI) -> Result<Vec<*const c_void>> {
	if raw.len == 0 {
		return Ok(Vec::new());
	}
	if raw.is_null() {
		return Err(HostError::Foreign("core returned a null slice pointer".to_string()));
	}
	Ok(unsafe { std::slice::from_raw_parts(raw.ptr as *const *const c_void, raw.len) }.to_vec())
}

fn read_header_array(raw: &SliceFFI) -> Result<Vec<*const SliceFFI>> {
	if raw.len == 0 {
		return Ok(Vec::new());
	}
	if raw.is_null() {
		return Err(HostError::Foreign("core returned a null slice pointer".to_string()));
	}
	let headers = unsafe { std::slice::from_raw_parts(raw.ptr as *const *const SliceFFI, raw.len) }.to_vec();
	if headers.iter().any(|h| h.is_null()) {
		return Err(HostError::Foreign("core returned a null slice header".to_string()));
	}
	Ok(headers)
}
