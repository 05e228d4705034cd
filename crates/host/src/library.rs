// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Veil

//! One-time binding of the core shared library
//!
//! The vtable is bound once per process and consulted by every handle and
//! bridge operation afterwards; there is no teardown beyond process exit.

use std::path::Path;

use libloading::Library;
use once_cell::sync::OnceCell;
use tracing::debug;
use veil_abi::{CoreVTableFFI, CURRENT_API, VTABLE_SYMBOL};

use crate::error::{HostError, Result};

static CORE: OnceCell<Core> = OnceCell::new();

/// The process-wide binding to the core
pub struct Core {
	vtable: CoreVTableFFI,
	/// Keeps a dynamically loaded core mapped for the process lifetime
	_library: Option<Library>,
}

impl Core {
	pub(crate) fn vtable(&self) -> &CoreVTableFFI {
		&self.vtable
	}
}

/// Bind an embedded vtable (statically linked cores, test doubles)
pub fn install(vtable: CoreVTableFFI) -> Result<()> {
	bind(Core {
		vtable,
		_library: None,
	})
}

/// Load the core from a shared library and bind its vtable
pub fn load(path: &Path) -> Result<()> {
	let library = unsafe { Library::new(path) }
		.map_err(|e| HostError::Library(format!("cannot load {}: {}", path.display(), e)))?;
	let vtable = unsafe {
		let entry = library
			.get::<unsafe extern "C" fn() -> *const CoreVTableFFI>(VTABLE_SYMBOL)
			.map_err(|e| HostError::Library(format!("cannot resolve core vtable symbol: {}", e)))?;
		let ptr = entry();
		if ptr.is_null() {
			return Err(HostError::Library("core returned a null vtable".to_string()));
		}
		*ptr
	};
	debug!(path = %path.display(), "core library loaded");
	bind(Core {
		vtable,
		_library: Some(library),
	})
}

fn bind(core: Core) -> Result<()> {
	if core.vtable.api != CURRENT_API {
		return Err(HostError::Library(format!(
			"core implements ABI revision {}, host expects {}",
			core.vtable.api, CURRENT_API
		)));
	}
	CORE.set(core).map_err(|_| HostError::Library("a core library is already bound".to_string()))
}

/// Whether a core has been bound to this process
pub fn is_loaded() -> bool {
	CORE.get().is_some()
}

pub(crate) fn core() -> Result<&'static Core> {
	CORE.get().ok_or(HostError::NotLoaded)
}

/// Inverse error function, forwarded straight to the core
///
/// One of the pure numeric helpers consumed without marshaling.
pub fn erf_inv(x: f64) -> Result<f64> {
	Ok((core()?.vtable.erf_inv)(x))
}

/// Fill `buf` with cryptographically secure random bytes from the core
pub fn fill_bytes(buf: &mut [u8]) -> Result<()> {
	if (core()?.vtable.fill_bytes)(buf.as_mut_ptr(), buf.len()) {
		Ok(())
	} else {
		Err(HostError::Foreign("core could not produce random bytes".to_string()))
	}
}
