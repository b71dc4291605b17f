//! Resolved dependency bindings

use crate::value::Resolved;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

/// Strategy category that produced a [`Dependency`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Origin {
	/// Placed with `Injector::add` or `Injector::register`.
	ExplicitlyAdded,
	/// A platform built-in facility.
	BuiltIn,
	/// An installed external package.
	External,
	/// A module discovered along the local search paths.
	Local,
}

impl fmt::Display for Origin {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let label = match self {
			Self::ExplicitlyAdded => "explicit",
			Self::BuiltIn => "builtin",
			Self::External => "external",
			Self::Local => "local",
		};
		f.write_str(label)
	}
}

/// Opaque handle identifying the resource behind a dependency.
///
/// The key of the module cache. Two resolutions of the same underlying
/// resource always produce equal keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LocationKey(Arc<str>);

impl LocationKey {
	/// Creates a key from an arbitrary identifier.
	///
	/// # Examples
	///
	/// ```
	/// use conjure_di::LocationKey;
	///
	/// let key = LocationKey::new("file:/srv/app/lib/dummy.json");
	/// assert_eq!(key.as_str(), "file:/srv/app/lib/dummy.json");
	/// ```
	pub fn new(key: impl Into<Arc<str>>) -> Self {
		Self(key.into())
	}

	pub fn builtin(name: &str) -> Self {
		Self::new(format!("builtin:{name}"))
	}

	pub fn external(package: &str) -> Self {
		Self::new(format!("external:{package}"))
	}

	pub fn local(dir: &Path, name: &str) -> Self {
		Self::new(format!("local:{}/{name}", dir.display()))
	}

	pub fn explicit(name: &str) -> Self {
		Self::new(format!("explicit:{name}"))
	}

	pub fn file(canonical: &Path) -> Self {
		Self::new(format!("file:{}", canonical.display()))
	}

	/// The part after `scheme:`, when the key has that scheme.
	///
	/// ```
	/// use conjure_di::LocationKey;
	///
	/// let key = LocationKey::builtin("http");
	/// assert_eq!(key.strip_scheme("builtin"), Some("http"));
	/// assert_eq!(key.strip_scheme("external"), None);
	/// ```
	pub fn strip_scheme(&self, scheme: &str) -> Option<&str> {
		self.0.strip_prefix(scheme)?.strip_prefix(':')
	}

	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl fmt::Display for LocationKey {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

/// One resolved binding held by an injector.
///
/// # Examples
///
/// ```
/// use conjure_di::{Dependency, Origin, Resolved};
///
/// let dependency = Dependency::new("port", Resolved::value(8080u16));
/// assert_eq!(dependency.name(), "port");
/// assert_eq!(dependency.origin(), Origin::ExplicitlyAdded);
/// assert_eq!(dependency.value().downcast_ref::<u16>(), Some(&8080));
/// ```
#[derive(Debug, Clone)]
pub struct Dependency {
	name: String,
	value: Resolved,
	origin: Origin,
	location_key: LocationKey,
	deferred: bool,
}

impl Dependency {
	/// Creates an explicitly added dependency.
	///
	/// Its location key is derived from the name unless replaced with
	/// [`Dependency::with_location_key`].
	pub fn new(name: impl Into<String>, value: Resolved) -> Self {
		let name = name.into();
		let location_key = LocationKey::explicit(&name);
		Self {
			name,
			value,
			origin: Origin::ExplicitlyAdded,
			location_key,
			deferred: false,
		}
	}

	/// Binds `name` to the resource behind `location_key` without
	/// materializing it.
	///
	/// Once added, the first resolution of `name` takes the module cache
	/// entry for the key, or asks the locator for the resource behind it and
	/// materializes that. Until then the dependency has no value.
	///
	/// ```
	/// use conjure_di::{Dependency, LocationKey};
	///
	/// let foo = Dependency::at("foo", LocationKey::builtin("http"));
	/// assert!(foo.is_deferred());
	/// assert_eq!(foo.location_key().as_str(), "builtin:http");
	/// ```
	pub fn at(name: impl Into<String>, location_key: LocationKey) -> Self {
		Self {
			name: name.into(),
			value: Resolved::Absent,
			origin: Origin::ExplicitlyAdded,
			location_key,
			deferred: true,
		}
	}

	/// Points the dependency at another resource key, so that removing it
	/// also evicts that resource's cached value.
	pub fn with_location_key(mut self, location_key: LocationKey) -> Self {
		self.location_key = location_key;
		self
	}

	pub(crate) fn discovered(
		name: impl Into<String>,
		value: Resolved,
		origin: Origin,
		location_key: LocationKey,
	) -> Self {
		Self {
			name: name.into(),
			value,
			origin,
			location_key,
			deferred: false,
		}
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	pub fn value(&self) -> &Resolved {
		&self.value
	}

	pub fn origin(&self) -> Origin {
		self.origin
	}

	pub fn location_key(&self) -> &LocationKey {
		&self.location_key
	}

	pub fn into_value(self) -> Resolved {
		self.value
	}

	/// True for a [`Dependency::at`] binding that has not been resolved.
	pub fn is_deferred(&self) -> bool {
		self.deferred
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use std::path::PathBuf;

	#[rstest]
	#[case(LocationKey::builtin("env"), "builtin:env")]
	#[case(LocationKey::external("find-port"), "external:find-port")]
	#[case(LocationKey::explicit("foo"), "explicit:foo")]
	fn location_keys_are_namespaced_by_origin(#[case] key: LocationKey, #[case] expected: &str) {
		assert_eq!(key.as_str(), expected);
	}

	#[rstest]
	fn local_keys_include_the_search_path() {
		let key = LocationKey::local(&PathBuf::from("/srv/lib"), "dummy");
		assert_eq!(key, LocationKey::new("local:/srv/lib/dummy"));
	}

	#[rstest]
	fn with_location_key_keeps_name_and_origin() {
		// Arrange
		let dependency = Dependency::new("foo", Resolved::Absent);

		// Act
		let dependency = dependency.with_location_key(LocationKey::builtin("env"));

		// Assert
		assert_eq!(dependency.name(), "foo");
		assert_eq!(dependency.origin(), Origin::ExplicitlyAdded);
		assert_eq!(dependency.location_key().as_str(), "builtin:env");
	}
}
