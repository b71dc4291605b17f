//! In-memory catalog of built-ins, packages and search-path modules

use super::{Located, Locator};
use crate::dependency::{LocationKey, Origin};
use crate::error::DiResult;
use crate::names::to_kebab_case;
use crate::value::Resolved;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Default)]
struct CatalogEntries {
	builtins: HashMap<String, Resolved>,
	packages: HashMap<String, Resolved>,
	modules: HashMap<PathBuf, HashMap<String, Resolved>>,
}

/// Shared in-memory [`Locator`].
///
/// Clones share the same entries, so resources added after an injector was
/// built are visible to it.
#[derive(Clone, Default)]
pub struct Catalog {
	entries: Arc<RwLock<CatalogEntries>>,
}

impl Catalog {
	/// Creates an empty catalog.
	pub fn new() -> Self {
		Self::default()
	}

	/// Creates a catalog holding the default built-in facilities.
	pub fn with_default_builtins() -> Self {
		let catalog = Self::new();
		super::builtins::install(&catalog);
		catalog
	}

	/// Adds a built-in facility.
	pub fn add_builtin(&self, name: impl Into<String>, resource: Resolved) {
		self.entries.write().builtins.insert(name.into(), resource);
	}

	/// Adds an external package under its package name.
	///
	/// Dependency names find a package either verbatim or through their
	/// kebab-case form: `findPort` finds `find-port`.
	pub fn add_package(&self, package: impl Into<String>, resource: Resolved) {
		self.entries.write().packages.insert(package.into(), resource);
	}

	/// Adds a module discoverable under the search path `dir`.
	///
	/// # Examples
	///
	/// ```
	/// use conjure_di::{Catalog, Locator, Origin, Resolved};
	/// use std::path::PathBuf;
	///
	/// let catalog = Catalog::new();
	/// catalog.add_module("test/lib", "dummy", Resolved::value(2i32));
	///
	/// let located = catalog.locate("dummy", &[PathBuf::from("test/lib")]).unwrap().unwrap();
	/// assert_eq!(located.origin, Origin::Local);
	///
	/// // Not on the search paths: not found.
	/// assert!(catalog.locate("dummy", &[]).unwrap().is_none());
	/// ```
	pub fn add_module(&self, dir: impl Into<PathBuf>, name: impl Into<String>, resource: Resolved) {
		self.entries
			.write()
			.modules
			.entry(dir.into())
			.or_default()
			.insert(name.into(), resource);
	}

	pub fn remove_builtin(&self, name: &str) -> Option<Resolved> {
		self.entries.write().builtins.remove(name)
	}

	pub fn remove_package(&self, package: &str) -> Option<Resolved> {
		self.entries.write().packages.remove(package)
	}

	pub fn remove_module(&self, dir: &Path, name: &str) -> Option<Resolved> {
		self.entries
			.write()
			.modules
			.get_mut(dir)
			.and_then(|modules| modules.remove(name))
	}

	pub fn has_builtin(&self, name: &str) -> bool {
		self.entries.read().builtins.contains_key(name)
	}

	pub fn builtin_names(&self) -> Vec<String> {
		let mut names: Vec<String> = self.entries.read().builtins.keys().cloned().collect();
		names.sort();
		names
	}
}

impl Locator for Catalog {
	fn locate(&self, name: &str, search_paths: &[PathBuf]) -> DiResult<Option<Located>> {
		let entries = self.entries.read();

		if let Some(resource) = entries.builtins.get(name) {
			return Ok(Some(Located::new(
				Origin::BuiltIn,
				LocationKey::builtin(name),
				resource.clone(),
			)));
		}

		let kebab = to_kebab_case(name);
		let package = std::iter::once(name)
			.chain(kebab.as_deref())
			.find_map(|package| entries.packages.get_key_value(package));
		if let Some((package, resource)) = package {
			return Ok(Some(Located::new(
				Origin::External,
				LocationKey::external(package),
				resource.clone(),
			)));
		}

		for dir in search_paths {
			if let Some(resource) = entries.modules.get(dir).and_then(|m| m.get(name)) {
				return Ok(Some(Located::new(
					Origin::Local,
					LocationKey::local(dir, name),
					resource.clone(),
				)));
			}
		}

		Ok(None)
	}

	fn locate_key(&self, key: &LocationKey, _search_paths: &[PathBuf]) -> DiResult<Option<Located>> {
		let entries = self.entries.read();
		let found = if let Some(name) = key.strip_scheme("builtin") {
			entries.builtins.get(name).map(|r| (Origin::BuiltIn, r))
		} else if let Some(package) = key.strip_scheme("external") {
			entries.packages.get(package).map(|r| (Origin::External, r))
		} else if let Some((dir, name)) = key.strip_scheme("local").and_then(|rest| rest.rsplit_once('/')) {
			entries
				.modules
				.get(Path::new(dir))
				.and_then(|modules| modules.get(name))
				.map(|r| (Origin::Local, r))
		} else {
			None
		};
		Ok(found.map(|(origin, resource)| Located::new(origin, key.clone(), resource.clone())))
	}
}

impl std::fmt::Debug for Catalog {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		let entries = self.entries.read();
		f.debug_struct("Catalog")
			.field("builtins", &entries.builtins.len())
			.field("packages", &entries.packages.len())
			.field("module_dirs", &entries.modules.len())
			.finish()
	}
}
