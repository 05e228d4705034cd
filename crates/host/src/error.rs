// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Veil

//! Host-side failure taxonomy

use crate::handle::ObjectKind;

pub type Result<T> = std::result::Result<T, HostError>;

/// Everything that can abort a host call into the core
///
/// Every variant aborts the current call with no partial result. The single
/// exception lives in [`crate::handle`]: failures raised while finalizing a
/// handle have no caller to report to and are suppressed.
#[derive(Debug, thiserror::Error)]
pub enum HostError {
	/// Malformed type descriptor text
	#[error("malformed type descriptor: {0}")]
	Parse(String),

	/// Descriptor origin outside the closed marshaling set
	#[error("unsupported type: {0}")]
	UnsupportedType(String),

	/// Fixed-arity value does not match its descriptor
	#[error("expected a tuple of {expected} elements, but got {got}")]
	Arity { expected: usize, got: usize },

	/// Host value does not fit the foreign width
	#[error("{value} does not fit in {target}")]
	Range { value: String, target: &'static str },

	/// Foreign value does not fit the host representation
	#[error("{target} value {value} overflows the host integer")]
	Overflow { value: String, target: &'static str },

	/// Host value shape disagrees with its descriptor
	#[error("cannot marshal {got} as {expected}")]
	IncompatibleValue { expected: String, got: &'static str },

	/// Handle unwrapped against the wrong kind tag
	#[error("expected a {expected}, but got a {got}")]
	TypeMismatch { expected: ObjectKind, got: ObjectKind },

	/// Handle already finalized
	#[error("{0} handle used after free")]
	UseAfterFree(ObjectKind),

	/// Failure propagated from the core, already formatted
	#[error("{0}")]
	Foreign(String),

	/// Binding the core shared library failed
	#[error("core library binding failed: {0}")]
	Library(String),

	/// No core library bound to this process
	#[error("veil core library is not loaded")]
	NotLoaded,
}
