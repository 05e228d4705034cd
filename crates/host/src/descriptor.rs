// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Veil

//! Runtime type descriptors
//!
//! Descriptor text arrives from two directions: callers annotate the values
//! they pass in, and the core's metadata accessors describe the values it
//! hands back. Both use the same angle-bracket grammar (`Vec<f64>`,
//! `HashMap<String, i32>`, `(i32, f64)` or `Tuple<i32, f64>`). Parsing
//! happens once per call; the marshaler then matches the resulting tree
//! exhaustively, so an origin it does not carry is a hard error rather than
//! a silent fallthrough.

use std::fmt;

use crate::{
	error::{HostError, Result},
	handle::ObjectKind,
};

/// Atomic element types of the core ABI
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AtomKind {
	Bool,
	I8,
	I16,
	I32,
	I64,
	U8,
	U16,
	U32,
	U64,
	Usize,
	F32,
	F64,
	String,
}

impl AtomKind {
	pub fn name(&self) -> &'static str {
		match self {
			AtomKind::Bool => "bool",
			AtomKind::I8 => "i8",
			AtomKind::I16 => "i16",
			AtomKind::I32 => "i32",
			AtomKind::I64 => "i64",
			AtomKind::U8 => "u8",
			AtomKind::U16 => "u16",
			AtomKind::U32 => "u32",
			AtomKind::U64 => "u64",
			AtomKind::Usize => "usize",
			AtomKind::F32 => "f32",
			AtomKind::F64 => "f64",
			AtomKind::String => "String",
		}
	}

	fn from_name(name: &str) -> Option<Self> {
		Some(match name {
			"bool" => AtomKind::Bool,
			"i8" => AtomKind::I8,
			"i16" => AtomKind::I16,
			"i32" => AtomKind::I32,
			"i64" => AtomKind::I64,
			"u8" => AtomKind::U8,
			"u16" => AtomKind::U16,
			"u32" => AtomKind::U32,
			"u64" => AtomKind::U64,
			"usize" => AtomKind::Usize,
			"f32" => AtomKind::F32,
			"f64" => AtomKind::F64,
			"String" => AtomKind::String,
			_ => return None,
		})
	}
}

/// A parsed runtime type: an origin plus ordered argument descriptors
///
/// The closed set the marshaler dispatches on. Unrecognized origins parse
/// into [`TypeDescriptor::Other`] so metadata can still round-trip as text,
/// but marshaling them fails with `UnsupportedType`.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeDescriptor {
	Atom(AtomKind),
	Vec(Box<TypeDescriptor>),
	Tuple(Vec<TypeDescriptor>),
	Option(Box<TypeDescriptor>),
	/// `HashMap<K, V>`
	Map(Box<TypeDescriptor>, Box<TypeDescriptor>),
	/// `BitVector`
	Bits,
	/// An opaque core object kind
	Object(ObjectKind),
	Other {
		origin: String,
		args: Vec<TypeDescriptor>,
	},
}

impl TypeDescriptor {
	/// Origin name, e.g. `Vec` for `Vec<i32>`
	pub fn origin(&self) -> &str {
		match self {
			TypeDescriptor::Atom(atom) => atom.name(),
			TypeDescriptor::Vec(_) => "Vec",
			TypeDescriptor::Tuple(_) => "Tuple",
			TypeDescriptor::Option(_) => "Option",
			TypeDescriptor::Map(_, _) => "HashMap",
			TypeDescriptor::Bits => "BitVector",
			TypeDescriptor::Object(kind) => kind.name(),
			TypeDescriptor::Other {
				origin,
				..
			} => origin,
		}
	}

	/// Ordered argument descriptors, e.g. `[i32]` for `Vec<i32>`
	pub fn args(&self) -> Vec<&TypeDescriptor> {
		match self {
			TypeDescriptor::Vec(inner) | TypeDescriptor::Option(inner) => vec![inner],
			TypeDescriptor::Tuple(args) => args.iter().collect(),
			TypeDescriptor::Map(key, value) => vec![key, value],
			TypeDescriptor::Other {
				args,
				..
			} => args.iter().collect(),
			_ => Vec::new(),
		}
	}
}

impl fmt::Display for TypeDescriptor {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			TypeDescriptor::Atom(atom) => f.write_str(atom.name()),
			TypeDescriptor::Vec(inner) => write!(f, "Vec<{}>", inner),
			TypeDescriptor::Tuple(args) => {
				f.write_str("(")?;
				for (i, arg) in args.iter().enumerate() {
					if i > 0 {
						f.write_str(", ")?;
					}
					write!(f, "{}", arg)?;
				}
				f.write_str(")")
			}
			TypeDescriptor::Option(inner) => write!(f, "Option<{}>", inner),
			TypeDescriptor::Map(key, value) => write!(f, "HashMap<{}, {}>", key, value),
			TypeDescriptor::Bits => f.write_str("BitVector"),
			TypeDescriptor::Object(kind) => f.write_str(kind.name()),
			TypeDescriptor::Other {
				origin,
				args,
			} => {
				f.write_str(origin)?;
				if !args.is_empty() {
					f.write_str("<")?;
					for (i, arg) in args.iter().enumerate() {
						if i > 0 {
							f.write_str(", ")?;
						}
						write!(f, "{}", arg)?;
					}
					f.write_str(">")?;
				}
				Ok(())
			}
		}
	}
}

/// Parse descriptor text into a descriptor tree
///
/// Fails with [`HostError::Parse`] on malformed grammar; unknown origins are
/// not a parse failure.
pub fn parse(text: &str) -> Result<TypeDescriptor> {
	let text = text.trim();
	if text.is_empty() {
		return Err(HostError::Parse("empty descriptor".to_string()));
	}

	// parenthesized tuple form: "(i32, f64)"
	if let Some(stripped) = text.strip_prefix('(') {
		let inner = stripped
			.strip_suffix(')')
			.ok_or_else(|| HostError::Parse(format!("unbalanced parentheses in `{}`", text)))?;
		return Ok(TypeDescriptor::Tuple(parse_args(inner, text)?));
	}

	match text.find('<') {
		None => {
			if text.contains('>') || text.contains(',') || text.contains('(') {
				return Err(HostError::Parse(format!("stray punctuation in `{}`", text)));
			}
			from_origin(text, Vec::new(), text)
		}
		Some(start) => {
			let origin = &text[..start];
			let inner = text[start + 1..]
				.strip_suffix('>')
				.ok_or_else(|| HostError::Parse(format!("unbalanced angle brackets in `{}`", text)))?;
			from_origin(origin, parse_args(inner, text)?, text)
		}
	}
}

/// Split `inner` on commas at bracket depth zero and parse each argument
fn parse_args(inner: &str, whole: &str) -> Result<Vec<TypeDescriptor>> {
	let mut args = Vec::new();
	let mut depth = 0i32;
	let mut start = 0usize;
	for (i, c) in inner.char_indices() {
		match c {
			'<' | '(' => depth += 1,
			'>' | ')' => {
				depth -= 1;
				if depth < 0 {
					return Err(HostError::Parse(format!("unbalanced brackets in `{}`", whole)));
				}
			}
			',' if depth == 0 => {
				args.push(parse_arg(&inner[start..i], whole)?);
				start = i + 1;
			}
			_ => {}
		}
	}
	if depth != 0 {
		return Err(HostError::Parse(format!("unbalanced brackets in `{}`", whole)));
	}
	args.push(parse_arg(&inner[start..], whole)?);
	Ok(args)
}

fn parse_arg(text: &str, whole: &str) -> Result<TypeDescriptor> {
	if text.trim().is_empty() {
		return Err(HostError::Parse(format!("empty argument in `{}`", whole)));
	}
	parse(text)
}

fn check_arity(origin: &str, args: &[TypeDescriptor], expected: usize, whole: &str) -> Result<()> {
	if args.len() == expected {
		Ok(())
	} else {
		Err(HostError::Parse(format!(
			"{} takes {} argument(s), but `{}` has {}",
			origin,
			expected,
			whole,
			args.len()
		)))
	}
}

fn from_origin(origin: &str, mut args: Vec<TypeDescriptor>, whole: &str) -> Result<TypeDescriptor> {
	if origin.is_empty() || !origin.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
		return Err(HostError::Parse(format!("invalid origin in `{}`", whole)));
	}

	Ok(match origin {
		"Vec" => {
			check_arity(origin, &args, 1, whole)?;
			TypeDescriptor::Vec(Box::new(args.remove(0)))
		}
		"Option" => {
			check_arity(origin, &args, 1, whole)?;
			TypeDescriptor::Option(Box::new(args.remove(0)))
		}
		"HashMap" => {
			check_arity(origin, &args, 2, whole)?;
			let value = args.remove(1);
			TypeDescriptor::Map(Box::new(args.remove(0)), Box::new(value))
		}
		"Tuple" => {
			if args.is_empty() {
				return Err(HostError::Parse(format!("Tuple takes at least one argument in `{}`", whole)));
			}
			TypeDescriptor::Tuple(args)
		}
		"BitVector" => {
			check_arity(origin, &args, 0, whole)?;
			TypeDescriptor::Bits
		}
		_ => {
			if let Some(atom) = AtomKind::from_name(origin) {
				check_arity(origin, &args, 0, whole)?;
				TypeDescriptor::Atom(atom)
			} else if let Some(kind) = ObjectKind::from_name(origin) {
				check_arity(origin, &args, 0, whole)?;
				TypeDescriptor::Object(kind)
			} else {
				TypeDescriptor::Other {
					origin: origin.to_string(),
					args,
				}
			}
		}
	})
}

#[cfg(test)]
mod tests {
	use super::*;

	mod parse {
		use super::*;

		#[test]
		fn test_atoms_happy() {
			for name in ["bool", "i8", "i16", "i32", "i64", "u8", "u16", "u32", "u64", "usize", "f32", "f64"] {
				let parsed = parse(name).unwrap();
				assert_eq!(parsed.origin(), name);
				assert!(parsed.args().is_empty());
			}
			assert_eq!(parse("String").unwrap(), TypeDescriptor::Atom(AtomKind::String));
		}

		#[test]
		fn test_nested() {
			let parsed = parse("Vec<Tuple<Option<f64>, HashMap<String,i32>>>").unwrap();
			let TypeDescriptor::Vec(inner) = parsed else {
				panic!("expected Vec");
			};
			let TypeDescriptor::Tuple(parts) = *inner else {
				panic!("expected Tuple");
			};
			assert_eq!(parts.len(), 2);
			assert_eq!(parts[0], TypeDescriptor::Option(Box::new(TypeDescriptor::Atom(AtomKind::F64))));
			assert_eq!(
				parts[1],
				TypeDescriptor::Map(
					Box::new(TypeDescriptor::Atom(AtomKind::String)),
					Box::new(TypeDescriptor::Atom(AtomKind::I32)),
				)
			);
		}

		#[test]
		fn test_tuple_forms_agree() {
			assert_eq!(parse("(i32, f64)").unwrap(), parse("Tuple<i32, f64>").unwrap());
		}

		#[test]
		fn test_object_kinds() {
			assert_eq!(parse("Transformation").unwrap(), TypeDescriptor::Object(ObjectKind::Transformation));
			assert_eq!(parse("Queryable").unwrap(), TypeDescriptor::Object(ObjectKind::Queryable));
		}

		#[test]
		fn test_unknown_origin_parses() {
			let parsed = parse("Frobnicate<i32>").unwrap();
			assert_eq!(parsed.origin(), "Frobnicate");
			assert_eq!(parsed.args().len(), 1);
		}

		#[test]
		fn test_whitespace_tolerated() {
			assert_eq!(parse(" HashMap< String , f64 > ").unwrap(), parse("HashMap<String,f64>").unwrap());
		}

		#[test]
		fn test_malformed_unhappy() {
			for text in ["", "Vec<i32", "Vec<i32>>", "(i32, f64", "Vec<>", "Vec<i32,>", "<i32>", "Vec<i32> junk", "a b"] {
				assert!(matches!(parse(text), Err(HostError::Parse(_))), "`{}` should not parse", text);
			}
		}

		#[test]
		fn test_wrong_arity_unhappy() {
			for text in ["Vec<i32, i32>", "Option<i32, i32>", "HashMap<String>", "BitVector<u8>", "i32<f64>"] {
				assert!(matches!(parse(text), Err(HostError::Parse(_))), "`{}` should not parse", text);
			}
		}
	}

	mod display {
		use super::*;

		#[test]
		fn test_round_trip() {
			for text in [
				"i32",
				"String",
				"Vec<f64>",
				"Vec<Vec<String>>",
				"Option<HashMap<String, f64>>",
				"(i32, f64, bool)",
				"BitVector",
				"Measurement",
				"Vec<(u32, Option<String>)>",
			] {
				let parsed = parse(text).unwrap();
				assert_eq!(parse(&parsed.to_string()).unwrap(), parsed, "`{}` should round-trip", text);
			}
		}

		#[test]
		fn test_tuple_renders_parenthesized() {
			assert_eq!(parse("Tuple<i32, f64>").unwrap().to_string(), "(i32, f64)");
		}
	}
}
