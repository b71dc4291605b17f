//! Factories, continuations and injection targets
//!
//! A [`Factory`] is a callable resource whose invocation result (rather than
//! the callable itself) is the intended dependency value. It declares the
//! names of its own dependencies; when the last declared name is
//! [`CALLBACK_NAME`](crate::names::CALLBACK_NAME) the factory is
//! callback-style and reports its value through a one-shot [`Callback`].

use crate::error::{BoxError, DiError, DiResult};
use crate::value::{Arguments, Resolved};
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;
use tokio::sync::oneshot;

type FactoryFn = dyn Fn(Arguments) -> DiResult<Resolved> + Send + Sync;

/// Opt-in / opt-out marker attached to a factory by its author.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InjectMarker {
	/// Follow the injector's auto-inject flags.
	#[default]
	Auto,
	/// Never invoke; the callable itself is the dependency value.
	DoNotInject,
	/// Invoke even when the auto-inject flag for the origin is off.
	AlwaysInject,
}

/// A callable dependency resource.
///
/// # Examples
///
/// ```
/// use conjure_di::{Factory, InjectMarker, Resolved};
///
/// // Direct-style: the return value is the dependency value.
/// let dummy2 = Factory::new(["dummy"], |args| {
///     let dummy = args.value::<i32>("dummy").copied().unwrap_or_default();
///     Ok(Resolved::value(dummy - 1))
/// });
/// assert_eq!(dummy2.parameters(), ["dummy"]);
///
/// // Callback-style: the value is reported through the continuation.
/// let sync_callback = Factory::new(["callback"], |args| {
///     if let Some(callback) = args.callback() {
///         callback.ok(Resolved::value(3i32));
///     }
///     Ok(Resolved::Absent)
/// });
/// assert!(sync_callback.is_callback_style());
///
/// let raw = Factory::new(Vec::<String>::new(), |_| Ok(Resolved::value(123i32))).do_not_inject();
/// assert_eq!(raw.marker(), InjectMarker::DoNotInject);
/// ```
#[derive(Clone)]
pub struct Factory {
	parameters: Arc<[String]>,
	marker: InjectMarker,
	body: Arc<FactoryFn>,
}

impl Factory {
	/// Creates a factory declaring `parameters`, in order.
	pub fn new<I, S, F>(parameters: I, body: F) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
		F: Fn(Arguments) -> DiResult<Resolved> + Send + Sync + 'static,
	{
		Self {
			parameters: parameters.into_iter().map(Into::into).collect(),
			marker: InjectMarker::Auto,
			body: Arc::new(body),
		}
	}

	/// Marks the factory so that it is never invoked by the injector.
	pub fn do_not_inject(mut self) -> Self {
		self.marker = InjectMarker::DoNotInject;
		self
	}

	/// Marks the factory so that it is invoked even when auto-injection for
	/// its origin is disabled.
	pub fn always_inject(mut self) -> Self {
		self.marker = InjectMarker::AlwaysInject;
		self
	}

	pub fn marker(&self) -> InjectMarker {
		self.marker
	}

	/// Parameter names as declared.
	pub fn parameters(&self) -> &[String] {
		&self.parameters
	}

	/// True when the last declared parameter is the reserved callback name.
	pub fn is_callback_style(&self) -> bool {
		crate::names::is_callback_style(&self.parameters)
	}

	/// Calls the factory body directly with already resolved arguments.
	pub fn call(&self, args: Arguments) -> DiResult<Resolved> {
		(self.body)(args)
	}

	pub fn ptr_eq(&self, other: &Self) -> bool {
		Arc::ptr_eq(&self.body, &other.body)
	}
}

impl fmt::Debug for Factory {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Factory")
			.field("parameters", &self.parameters)
			.field("marker", &self.marker)
			.finish_non_exhaustive()
	}
}

/// One-shot continuation handed to a callback-style factory.
///
/// Clones share the same slot: the first completion wins and every later
/// completion is ignored.
#[derive(Clone)]
pub struct Callback {
	name: Arc<str>,
	slot: Arc<Mutex<Option<oneshot::Sender<DiResult<Resolved>>>>>,
}

impl Callback {
	pub(crate) fn channel(name: &str) -> (Self, oneshot::Receiver<DiResult<Resolved>>) {
		let (tx, rx) = oneshot::channel();
		let callback = Self {
			name: Arc::from(name),
			slot: Arc::new(Mutex::new(Some(tx))),
		};
		(callback, rx)
	}

	/// Completes the continuation with `(error, result)` semantics.
	///
	/// Returns `false` when the continuation had already been completed, in
	/// which case `result` is discarded.
	pub fn complete(&self, result: DiResult<Resolved>) -> bool {
		let Some(tx) = self.slot.lock().take() else {
			tracing::warn!(dependency = %self.name, "callback completed more than once; ignoring");
			return false;
		};
		if tx.send(result).is_err() {
			tracing::warn!(dependency = %self.name, "callback completed after resolution was abandoned");
		}
		true
	}

	/// Completes the continuation with a value.
	pub fn ok(&self, value: Resolved) -> bool {
		self.complete(Ok(value))
	}

	/// Completes the continuation with a factory error.
	pub fn err(&self, error: impl Into<BoxError>) -> bool {
		self.complete(Err(DiError::custom(error)))
	}

	/// True once the continuation has been completed.
	pub fn is_completed(&self) -> bool {
		self.slot.lock().is_none()
	}

	/// Name of the dependency this continuation resolves.
	pub fn dependency(&self) -> &str {
		&self.name
	}
}

impl fmt::Debug for Callback {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Callback")
			.field("dependency", &self.name)
			.field("completed", &self.is_completed())
			.finish()
	}
}

/// A callable passed to [`Injector::inject`](crate::Injector::inject).
///
/// # Examples
///
/// ```
/// use conjure_di::{Arguments, Target};
///
/// let target = Target::new(["http", "dummy"], |args: Arguments| args.len());
/// assert_eq!(target.parameters(), ["http", "dummy"]);
/// ```
pub struct Target<F> {
	parameters: Vec<String>,
	body: F,
}

impl<F> Target<F> {
	pub fn new<I, S>(parameters: I, body: F) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		Self {
			parameters: parameters.into_iter().map(Into::into).collect(),
			body,
		}
	}

	pub fn parameters(&self) -> &[String] {
		&self.parameters
	}

	pub(crate) fn into_body(self) -> F {
		self.body
	}
}

impl<F> fmt::Debug for Target<F> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Target")
			.field("parameters", &self.parameters)
			.finish_non_exhaustive()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	#[tokio::test]
	async fn callback_accepts_only_the_first_completion() {
		// Arrange
		let (callback, rx) = Callback::channel("dummyCallbackSync");

		// Act
		let first = callback.ok(Resolved::value(3i32));
		let second = callback.clone().ok(Resolved::value(4i32));

		// Assert
		assert!(first);
		assert!(!second);
		assert!(callback.is_completed());
		let value = rx.await.unwrap().unwrap();
		assert_eq!(value.downcast_ref::<i32>(), Some(&3));
	}

	#[rstest]
	#[tokio::test]
	async fn callback_error_is_a_custom_error() {
		let (callback, rx) = Callback::channel("dummyFailing");

		callback.err("disk on fire");

		let err = rx.await.unwrap().unwrap_err();
		assert!(matches!(err, DiError::Custom(_)));
	}

	#[rstest]
	#[tokio::test]
	async fn dropping_every_handle_closes_the_channel() {
		let (callback, rx) = Callback::channel("dummyNeverCalled");

		drop(callback);

		assert!(rx.await.is_err());
	}

	#[rstest]
	fn callback_style_is_decided_by_the_last_parameter() {
		let body = |_: Arguments| -> DiResult<Resolved> { Ok(Resolved::Absent) };
		assert!(Factory::new(["a", "callback"], body).is_callback_style());
		assert!(!Factory::new(["callback", "a"], body).is_callback_style());
		assert!(!Factory::new(Vec::<String>::new(), body).is_callback_style());
	}

	#[rstest]
	fn markers_replace_each_other() {
		let factory = Factory::new(["a"], |_| Ok(Resolved::Absent))
			.do_not_inject()
			.always_inject();
		assert_eq!(factory.marker(), InjectMarker::AlwaysInject);
	}
}
