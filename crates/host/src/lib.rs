// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Veil

//! Host binding runtime for the Veil core
//!
//! The core library implements privacy-preserving computational objects
//! behind a C ABI; this crate is everything the generated per-operation
//! wrappers share:
//!
//! - **descriptor**: runtime type grammar, parsed into a closed sum type
//! - **marshal**: dynamically-typed host values to and from generic slices
//! - **handle**: tagged, finalizer-guarded ownership of foreign objects
//! - **bridge**: translation and release of foreign results
//! - **library**: one-time binding of the core vtable

pub mod arena;
pub mod bridge;
pub mod descriptor;
pub mod error;
pub mod handle;
pub mod library;
pub mod marshal;
pub mod value;

pub use arena::Arena;
pub use bridge::{consume_bool, consume_string, translate, ForeignSlice};
pub use descriptor::{AtomKind, TypeDescriptor};
pub use error::{HostError, Result};
pub use handle::{Handle, ObjectKind};
pub use marshal::{from_foreign, to_foreign, Staged};
pub use value::{BitVec, Value};
