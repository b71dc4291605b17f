//! Reserved identifiers and dependency-name rules

use crate::error::{DiError, DiResult};

/// Reserved name that resolves to the injector itself.
pub const SELF_NAME: &str = "$injector";

/// Last parameter name that marks a factory as callback-style.
pub const CALLBACK_NAME: &str = "callback";

/// Trailing marker of an optional dependency name.
pub const OPTIONAL_SUFFIX: char = '_';

/// Names that may never be used as dependencies.
///
/// Intrinsic member names of dynamic host objects, followed by Rust keywords.
pub const RESERVED_NAMES: &[&str] = &[
	"constructor",
	"hasOwnProperty",
	"isPrototypeOf",
	"propertyIsEnumerable",
	"toLocaleString",
	"toString",
	"valueOf",
	"__proto__",
	"__defineGetter__",
	"__defineSetter__",
	"__lookupGetter__",
	"__lookupSetter__",
	"as",
	"async",
	"await",
	"break",
	"const",
	"continue",
	"crate",
	"dyn",
	"else",
	"enum",
	"extern",
	"false",
	"fn",
	"for",
	"if",
	"impl",
	"in",
	"let",
	"loop",
	"match",
	"mod",
	"move",
	"mut",
	"pub",
	"ref",
	"return",
	"self",
	"Self",
	"static",
	"struct",
	"super",
	"trait",
	"true",
	"type",
	"unsafe",
	"use",
	"where",
	"while",
];

pub fn is_reserved(name: &str) -> bool {
	RESERVED_NAMES.contains(&name)
}

/// Returns true when the last parameter is [`CALLBACK_NAME`].
pub fn is_callback_style(parameters: &[String]) -> bool {
	parameters.last().is_some_and(|last| last == CALLBACK_NAME)
}

/// A validated dependency request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct NameRequest<'a> {
	/// Name the strategies look up (optional suffix stripped).
	pub base: &'a str,
	/// Whether a missing resource resolves to `Absent`.
	pub optional: bool,
}

impl<'a> NameRequest<'a> {
	pub(crate) fn parse(requested: &'a str) -> DiResult<Self> {
		let (base, optional) = match requested.strip_suffix(OPTIONAL_SUFFIX) {
			Some(base) if !base.is_empty() => (base, true),
			_ => (requested, false),
		};
		validate(requested)?;
		validate(base)?;
		Ok(Self { base, optional })
	}
}

fn validate(name: &str) -> DiResult<()> {
	let well_formed = name
		.chars()
		.next()
		.is_some_and(|first| !first.is_ascii_digit())
		&& name
			.chars()
			.all(|c| c.is_alphanumeric() || c == '_' || c == '$');
	if !well_formed || is_reserved(name) {
		return Err(DiError::IllegalName(name.to_string()));
	}
	Ok(())
}

/// Converts a camelCase dependency name to the kebab-case form used by
/// package names (`findPort` -> `find-port`).
///
/// Returns `None` when the name has no uppercase letters.
pub(crate) fn to_kebab_case(name: &str) -> Option<String> {
	if !name.chars().any(|c| c.is_uppercase()) {
		return None;
	}
	let mut kebab = String::with_capacity(name.len() + 4);
	for (index, c) in name.chars().enumerate() {
		if c.is_uppercase() {
			if index > 0 {
				kebab.push('-');
			}
			kebab.extend(c.to_lowercase());
		} else {
			kebab.push(c);
		}
	}
	Some(kebab)
}
