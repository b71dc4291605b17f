//! Dynamic dependency values and call arguments

use crate::factory::{Callback, Factory};
use crate::injector::Injector;
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// Shared, type-erased payload.
pub type AnyValue = Arc<dyn Any + Send + Sync>;

/// The value a name resolves to.
///
/// Cloning is cheap: every variant is reference-counted, and clones compare
/// identical under [`Resolved::ptr_eq`].
#[derive(Clone)]
pub enum Resolved {
	/// A plain value.
	Value(AnyValue),
	/// A callable that has not been invoked.
	Factory(Factory),
	/// The injector itself (the reserved `$injector` name).
	Injector(Injector),
	/// An optional name with no backing resource, or a factory that produced
	/// nothing.
	Absent,
}

impl Resolved {
	/// Wraps a plain value.
	///
	/// # Examples
	///
	/// ```
	/// use conjure_di::Resolved;
	///
	/// let value = Resolved::value(2i32);
	/// assert_eq!(value.downcast_ref::<i32>(), Some(&2));
	/// assert_eq!(value.downcast_ref::<String>(), None);
	/// ```
	pub fn value<T: Any + Send + Sync>(value: T) -> Self {
		Self::Value(Arc::new(value))
	}

	/// Wraps an already shared value without re-allocating.
	pub fn from_arc<T: Any + Send + Sync>(value: Arc<T>) -> Self {
		Self::Value(value)
	}

	pub fn is_callable(&self) -> bool {
		matches!(self, Self::Factory(_))
	}

	pub fn is_absent(&self) -> bool {
		matches!(self, Self::Absent)
	}

	/// Borrows a plain value as `T`.
	pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
		match self {
			Self::Value(value) => (**value).downcast_ref::<T>(),
			_ => None,
		}
	}

	/// Returns a shared handle to a plain value of type `T`.
	pub fn downcast<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
		match self {
			Self::Value(value) => Arc::clone(value).downcast::<T>().ok(),
			_ => None,
		}
	}

	pub fn as_factory(&self) -> Option<&Factory> {
		match self {
			Self::Factory(factory) => Some(factory),
			_ => None,
		}
	}

	pub fn as_injector(&self) -> Option<&Injector> {
		match self {
			Self::Injector(injector) => Some(injector),
			_ => None,
		}
	}

	/// Identity comparison: true when both sides refer to the same shared
	/// allocation (or are both absent).
	pub fn ptr_eq(&self, other: &Self) -> bool {
		match (self, other) {
			(Self::Value(a), Self::Value(b)) => Arc::ptr_eq(a, b),
			(Self::Factory(a), Self::Factory(b)) => a.ptr_eq(b),
			(Self::Injector(a), Self::Injector(b)) => a.ptr_eq(b),
			(Self::Absent, Self::Absent) => true,
			_ => false,
		}
	}
}

impl fmt::Debug for Resolved {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Value(_) => f.write_str("Value(..)"),
			Self::Factory(factory) => f.debug_tuple("Factory").field(factory).finish(),
			Self::Injector(_) => f.write_str("Injector(..)"),
			Self::Absent => f.write_str("Absent"),
		}
	}
}

impl From<Factory> for Resolved {
	fn from(factory: Factory) -> Self {
		Self::Factory(factory)
	}
}

impl From<Injector> for Resolved {
	fn from(injector: Injector) -> Self {
		Self::Injector(injector)
	}
}

/// Resolved arguments handed to a factory or an injection target, in
/// declaration order.
#[derive(Debug, Clone, Default)]
pub struct Arguments {
	entries: Vec<(String, Resolved)>,
	callback: Option<Callback>,
}

impl Arguments {
	pub fn new() -> Self {
		Self::default()
	}

	pub(crate) fn with_capacity(capacity: usize) -> Self {
		Self {
			entries: Vec::with_capacity(capacity),
			callback: None,
		}
	}

	pub fn push(&mut self, name: impl Into<String>, value: Resolved) {
		self.entries.push((name.into(), value));
	}

	pub(crate) fn set_callback(&mut self, callback: Callback) {
		self.callback = Some(callback);
	}

	/// Looks up an argument by parameter name.
	pub fn get(&self, name: &str) -> Option<&Resolved> {
		self.entries
			.iter()
			.find(|(entry, _)| entry == name)
			.map(|(_, value)| value)
	}

	/// Looks up an argument by parameter name and borrows it as `T`.
	///
	/// # Examples
	///
	/// ```
	/// use conjure_di::{Arguments, Resolved};
	///
	/// let mut args = Arguments::new();
	/// args.push("dummy", Resolved::value(2i32));
	///
	/// assert_eq!(args.value::<i32>("dummy"), Some(&2));
	/// assert_eq!(args.value::<i32>("other"), None);
	/// ```
	pub fn value<T: Any>(&self, name: &str) -> Option<&T> {
		self.get(name).and_then(Resolved::downcast_ref::<T>)
	}

	/// Argument at a positional index.
	pub fn at(&self, index: usize) -> Option<&Resolved> {
		self.entries.get(index).map(|(_, value)| value)
	}

	/// The injector, when the callable declared `$injector`.
	pub fn injector(&self) -> Option<&Injector> {
		self.entries.iter().find_map(|(_, value)| value.as_injector())
	}

	/// The continuation of a callback-style factory.
	pub fn callback(&self) -> Option<Callback> {
		self.callback.clone()
	}

	pub fn names(&self) -> impl Iterator<Item = &str> {
		self.entries.iter().map(|(name, _)| name.as_str())
	}

	pub fn iter(&self) -> impl Iterator<Item = (&str, &Resolved)> {
		self.entries.iter().map(|(name, value)| (name.as_str(), value))
	}

	/// Number of resolved arguments, excluding the callback.
	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	fn clones_are_identical() {
		// Arrange
		let value = Resolved::value(String::from("shared"));

		// Act
		let clone = value.clone();

		// Assert
		assert!(value.ptr_eq(&clone));
		assert!(!value.ptr_eq(&Resolved::value(String::from("shared"))));
	}

	#[rstest]
	fn downcast_returns_the_shared_allocation() {
		let shared = Arc::new(42u64);
		let value = Resolved::from_arc(Arc::clone(&shared));

		let handle = value.downcast::<u64>().unwrap();

		assert!(Arc::ptr_eq(&shared, &handle));
		assert!(value.downcast::<u32>().is_none());
	}

	#[rstest]
	fn absent_is_not_callable() {
		assert!(Resolved::Absent.is_absent());
		assert!(!Resolved::Absent.is_callable());
		assert_eq!(Resolved::Absent.downcast_ref::<i32>(), None);
	}

	#[rstest]
	fn arguments_keep_declaration_order() {
		// Arrange
		let mut args = Arguments::new();
		args.push("b", Resolved::value(2i32));
		args.push("a", Resolved::value(1i32));

		// Act
		let names: Vec<&str> = args.names().collect();

		// Assert
		assert_eq!(names, vec!["b", "a"]);
		assert_eq!(args.at(1).and_then(|v| v.downcast_ref::<i32>()), Some(&1));
		assert_eq!(args.len(), 2);
		assert!(args.callback().is_none());
	}
}
