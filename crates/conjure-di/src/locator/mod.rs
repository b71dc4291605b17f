//! Resource location
//!
//! A [`Locator`] turns a dependency name into a located raw resource: a
//! built-in facility, an external package, or a module found along the
//! injector's search paths. What the resource means (a value, or a factory
//! to invoke) is decided afterwards by the invoker.

pub mod builtins;
mod catalog;
#[cfg(feature = "fs")]
mod file;

pub use catalog::Catalog;
#[cfg(feature = "fs")]
pub use file::FileLocator;

use crate::dependency::{LocationKey, Origin};
use crate::error::DiResult;
use crate::value::Resolved;
use std::path::PathBuf;
use std::sync::Arc;

/// A resource found by a [`Locator`].
#[derive(Debug, Clone)]
pub struct Located {
	/// `BuiltIn`, `External` or `Local`.
	pub origin: Origin,
	/// Key of the backing resource.
	pub location_key: LocationKey,
	/// The raw resource, before materialization.
	pub resource: Resolved,
}

impl Located {
	pub fn new(origin: Origin, location_key: LocationKey, resource: Resolved) -> Self {
		Self {
			origin,
			location_key,
			resource,
		}
	}
}

/// Looks up dependency names.
pub trait Locator: Send + Sync {
	/// Locates `name`, trying built-ins, then external packages, then
	/// `search_paths` in order.
	///
	/// Returns `Ok(None)` when nothing matches; errors are reserved for
	/// resources that exist but cannot be loaded.
	fn locate(&self, name: &str, search_paths: &[PathBuf]) -> DiResult<Option<Located>>;

	/// Finds the resource behind `key`, for names bound with
	/// [`Dependency::at`](crate::Dependency::at).
	///
	/// Locators that cannot interpret a key return `Ok(None)`.
	fn locate_key(&self, key: &LocationKey, search_paths: &[PathBuf]) -> DiResult<Option<Located>> {
		let _ = (key, search_paths);
		Ok(None)
	}
}

impl<L: Locator + ?Sized> Locator for Arc<L> {
	fn locate(&self, name: &str, search_paths: &[PathBuf]) -> DiResult<Option<Located>> {
		(**self).locate(name, search_paths)
	}

	fn locate_key(&self, key: &LocationKey, search_paths: &[PathBuf]) -> DiResult<Option<Located>> {
		(**self).locate_key(key, search_paths)
	}
}

/// Tries several locators in order; the first hit wins.
#[derive(Clone, Default)]
pub struct LocatorChain {
	locators: Vec<Arc<dyn Locator>>,
}

impl LocatorChain {
	pub fn new() -> Self {
		Self::default()
	}

	/// Appends a locator.
	///
	/// # Examples
	///
	/// ```
	/// use conjure_di::{Catalog, Locator, LocatorChain, Origin, Resolved};
	///
	/// let first = Catalog::new();
	/// first.add_package("eyes", Resolved::value("first"));
	/// let second = Catalog::new();
	/// second.add_package("eyes", Resolved::value("second"));
	///
	/// let chain = LocatorChain::new().with(first).with(second);
	/// let located = chain.locate("eyes", &[]).unwrap().unwrap();
	/// assert_eq!(located.origin, Origin::External);
	/// assert_eq!(located.resource.downcast_ref::<&str>(), Some(&"first"));
	/// ```
	pub fn with(mut self, locator: impl Locator + 'static) -> Self {
		self.locators.push(Arc::new(locator));
		self
	}

	pub fn push(&mut self, locator: Arc<dyn Locator>) {
		self.locators.push(locator);
	}

	pub fn len(&self) -> usize {
		self.locators.len()
	}

	pub fn is_empty(&self) -> bool {
		self.locators.is_empty()
	}
}

impl Locator for LocatorChain {
	fn locate(&self, name: &str, search_paths: &[PathBuf]) -> DiResult<Option<Located>> {
		for locator in &self.locators {
			if let Some(located) = locator.locate(name, search_paths)? {
				return Ok(Some(located));
			}
		}
		Ok(None)
	}

	fn locate_key(&self, key: &LocationKey, search_paths: &[PathBuf]) -> DiResult<Option<Located>> {
		for locator in &self.locators {
			if let Some(located) = locator.locate_key(key, search_paths)? {
				return Ok(Some(located));
			}
		}
		Ok(None)
	}
}

impl std::fmt::Debug for LocatorChain {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("LocatorChain")
			.field("locators", &self.locators.len())
			.finish()
	}
}
