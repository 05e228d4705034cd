// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Veil

//! Element-wise staging and reading of atomic types
//!
//! Integer conversions are checked in both directions; no silent
//! truncation. The only lossy conversion is `f64 -> f32`, a plain width
//! cast.

use core::ffi::{c_char, c_void, CStr};

use veil_abi::SliceFFI;

use crate::{
	arena::Arena,
	descriptor::AtomKind,
	error::{HostError, Result},
	value::Value,
};

pub(crate) fn expect_int(value: &Value, expected: &'static str) -> Result<i64> {
	match value {
		Value::Int(v) => Ok(*v),
		_ => Err(HostError::IncompatibleValue {
			expected: expected.to_string(),
			got: value.kind_str(),
		}),
	}
}

pub(crate) fn expect_float(value: &Value, expected: &'static str) -> Result<f64> {
	match value {
		Value::Float(v) => Ok(*v),
		Value::Int(v) => Ok(*v as f64),
		_ => Err(HostError::IncompatibleValue {
			expected: expected.to_string(),
			got: value.kind_str(),
		}),
	}
}

fn expect_bool(value: &Value) -> Result<bool> {
	match value {
		Value::Bool(v) => Ok(*v),
		_ => Err(HostError::IncompatibleValue {
			expected: "bool".to_string(),
			got: value.kind_str(),
		}),
	}
}

pub(crate) fn expect_str<'a>(value: &'a Value, expected: &'static str) -> Result<&'a str> {
	match value {
		Value::Str(v) if v.contains('\0') => Err(HostError::IncompatibleValue {
			expected: expected.to_string(),
			got: "string with interior NUL",
		}),
		Value::Str(v) => Ok(v),
		_ => Err(HostError::IncompatibleValue {
			expected: expected.to_string(),
			got: value.kind_str(),
		}),
	}
}

fn narrow<T: TryFrom<i64>>(value: i64, target: &'static str) -> Result<T> {
	T::try_from(value).map_err(|_| HostError::Range {
		value: value.to_string(),
		target,
	})
}

/// Stage host elements as a contiguous foreign array of `atom`
///
/// For [`AtomKind::String`] the layout is an array of NUL-terminated
/// `c_char` pointers, one per element.
pub(crate) fn stage_atoms(arena: &Arena, values: &[&Value], atom: AtomKind) -> Result<SliceFFI> {
	macro_rules! stage_ints {
		($t:ty, $name:literal) => {{
			let mut out: Vec<$t> = Vec::with_capacity(values.len());
			for value in values {
				out.push(narrow::<$t>(expect_int(value, $name)?, $name)?);
			}
			SliceFFI::new(arena.stage(&out) as *const c_void, out.len())
		}};
	}

	Ok(match atom {
		AtomKind::Bool => {
			let mut out: Vec<u8> = Vec::with_capacity(values.len());
			for value in values {
				out.push(expect_bool(value)? as u8);
			}
			SliceFFI::new(arena.stage(&out) as *const c_void, out.len())
		}
		AtomKind::I8 => stage_ints!(i8, "i8"),
		AtomKind::I16 => stage_ints!(i16, "i16"),
		AtomKind::I32 => stage_ints!(i32, "i32"),
		AtomKind::I64 => {
			let mut out: Vec<i64> = Vec::with_capacity(values.len());
			for value in values {
				out.push(expect_int(value, "i64")?);
			}
			SliceFFI::new(arena.stage(&out) as *const c_void, out.len())
		}
		AtomKind::U8 => stage_ints!(u8, "u8"),
		AtomKind::U16 => stage_ints!(u16, "u16"),
		AtomKind::U32 => stage_ints!(u32, "u32"),
		AtomKind::U64 => stage_ints!(u64, "u64"),
		AtomKind::Usize => stage_ints!(usize, "usize"),
		AtomKind::F32 => {
			let mut out: Vec<f32> = Vec::with_capacity(values.len());
			for value in values {
				out.push(expect_float(value, "f32")? as f32);
			}
			SliceFFI::new(arena.stage(&out) as *const c_void, out.len())
		}
		AtomKind::F64 => {
			let mut out: Vec<f64> = Vec::with_capacity(values.len());
			for value in values {
				out.push(expect_float(value, "f64")?);
			}
			SliceFFI::new(arena.stage(&out) as *const c_void, out.len())
		}
		AtomKind::String => {
			let mut out: Vec<*const c_char> = Vec::with_capacity(values.len());
			for value in values {
				out.push(arena.copy_str(expect_str(value, "String")?));
			}
			SliceFFI::new(arena.stage(&out) as *const c_void, out.len())
		}
	})
}

/// Read a foreign array of `atom` back into host values
pub(crate) fn read_atoms(raw: &SliceFFI, atom: AtomKind) -> Result<Vec<Value>> {
	if raw.len == 0 {
		return Ok(Vec::new());
	}
	if raw.is_null() {
		return Err(HostError::Foreign("core returned a null slice pointer".to_string()));
	}

	macro_rules! read_fitting {
		($t:ty) => {{
			let elements = unsafe { std::slice::from_raw_parts(raw.ptr as *const $t, raw.len) };
			elements.iter().map(|&v| Value::Int(v as i64)).collect()
		}};
	}
	macro_rules! read_wide {
		($t:ty, $name:literal) => {{
			let elements = unsafe { std::slice::from_raw_parts(raw.ptr as *const $t, raw.len) };
			let mut out = Vec::with_capacity(raw.len);
			for &v in elements {
				let fitted = i64::try_from(v).map_err(|_| HostError::Overflow {
					value: v.to_string(),
					target: $name,
				})?;
				out.push(Value::Int(fitted));
			}
			out
		}};
	}

	Ok(match atom {
		AtomKind::Bool => {
			let elements = unsafe { std::slice::from_raw_parts(raw.ptr as *const u8, raw.len) };
			elements.iter().map(|&v| Value::Bool(v != 0)).collect()
		}
		AtomKind::I8 => read_fitting!(i8),
		AtomKind::I16 => read_fitting!(i16),
		AtomKind::I32 => read_fitting!(i32),
		AtomKind::I64 => read_fitting!(i64),
		AtomKind::U8 => read_fitting!(u8),
		AtomKind::U16 => read_fitting!(u16),
		AtomKind::U32 => read_fitting!(u32),
		AtomKind::U64 => read_wide!(u64, "u64"),
		AtomKind::Usize => read_wide!(usize, "usize"),
		AtomKind::F32 => {
			let elements = unsafe { std::slice::from_raw_parts(raw.ptr as *const f32, raw.len) };
			elements.iter().map(|&v| Value::Float(v as f64)).collect()
		}
		AtomKind::F64 => {
			let elements = unsafe { std::slice::from_raw_parts(raw.ptr as *const f64, raw.len) };
			elements.iter().map(|&v| Value::Float(v)).collect()
		}
		AtomKind::String => {
			let pointers = unsafe { std::slice::from_raw_parts(raw.ptr as *const *const c_char, raw.len) };
			let mut out = Vec::with_capacity(raw.len);
			for &ptr in pointers {
				out.push(Value::Str(read_string(ptr)?));
			}
			out
		}
	})
}

pub(crate) fn read_string(ptr: *const c_char) -> Result<String> {
	if ptr.is_null() {
		return Err(HostError::Foreign("core returned a null string pointer".to_string()));
	}
	Ok(unsafe { CStr::from_ptr(ptr) }.to_string_lossy().into_owned())
}
