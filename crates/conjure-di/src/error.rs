//! Resolution error types.
//!
//! Every failure of the engine is a [`DiError`]. Failures are local to one
//! `inject` call: nothing is committed to the dependency cache or the module
//! cache for a name whose resolution did not fully succeed.

use std::path::PathBuf;
use thiserror::Error;

/// Boxed error raised by factory code.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Result type for resolution operations.
pub type DiResult<T> = Result<T, DiError>;

/// Dependency resolution errors.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum DiError {
	/// The requested name collides with a reserved identifier or is not a
	/// valid dependency name.
	#[error("illegal dependency name: '{0}'")]
	IllegalName(String),

	/// No strategy resolved the name and it was not marked optional.
	#[error("missing dependency: '{0}'")]
	NotFound(String),

	/// A name was requested again while it was still being resolved.
	#[error("circular dependency detected: '{name}'\n  Path: {path}")]
	Circular {
		/// Name that was requested twice.
		name: String,
		/// Cycle path (format: a -> b -> c -> a).
		path: String,
	},

	/// The open resolution stack grew past the configured limit.
	#[error("maximum resolution depth exceeded: {0} (likely a runaway dependency chain)")]
	MaxDepthExceeded(usize),

	/// A factory failed, either by returning an error or by completing its
	/// callback with one.
	#[error("factory for '{name}' failed: {source}")]
	Factory {
		/// Name of the dependency whose factory failed.
		name: String,
		/// Error raised by the factory.
		#[source]
		source: BoxError,
	},

	/// Every handle to a callback-style factory's continuation was dropped
	/// before it was completed.
	#[error("callback for '{0}' was dropped without being completed")]
	CallbackDropped(String),

	/// The parameter parser was given something that is not callable.
	#[error("invalid argument: {0}")]
	InvalidArgument(String),

	/// Error raised by factory code, attributed to the factory's name by the
	/// invoker.
	#[error("{0}")]
	Custom(BoxError),

	/// A data module could not be loaded.
	#[error("failed to load '{path}': {message}")]
	Load {
		/// Path of the module.
		path: PathBuf,
		/// Parser or reader message.
		message: String,
	},

	/// Injector settings could not be parsed.
	#[error("invalid settings: {0}")]
	Settings(String),

	/// IO error.
	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),
}

/// Coarse classification of a [`DiError`], for matching on cause.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
	IllegalName,
	NotFound,
	Circular,
	MaxDepthExceeded,
	Factory,
	CallbackDropped,
	InvalidArgument,
	Load,
	Settings,
}

impl DiError {
	/// Wrap an arbitrary error raised inside a factory.
	///
	/// # Examples
	///
	/// ```
	/// use conjure_di::{DiError, ErrorKind};
	///
	/// let err = DiError::custom("connection refused");
	/// assert_eq!(err.to_string(), "connection refused");
	/// assert_eq!(err.kind(), ErrorKind::Factory);
	/// ```
	pub fn custom(error: impl Into<BoxError>) -> Self {
		Self::Custom(error.into())
	}

	/// Returns the kind of this error.
	pub fn kind(&self) -> ErrorKind {
		match self {
			Self::IllegalName(_) => ErrorKind::IllegalName,
			Self::NotFound(_) => ErrorKind::NotFound,
			Self::Circular { .. } => ErrorKind::Circular,
			Self::MaxDepthExceeded(_) => ErrorKind::MaxDepthExceeded,
			Self::Factory { .. } | Self::Custom(_) => ErrorKind::Factory,
			Self::CallbackDropped(_) => ErrorKind::CallbackDropped,
			Self::InvalidArgument(_) => ErrorKind::InvalidArgument,
			Self::Load { .. } | Self::Io(_) => ErrorKind::Load,
			Self::Settings(_) => ErrorKind::Settings,
		}
	}

	pub fn is_circular(&self) -> bool {
		self.kind() == ErrorKind::Circular
	}

	pub fn is_not_found(&self) -> bool {
		self.kind() == ErrorKind::NotFound
	}

	/// Attribute factory-raised errors to the dependency `name`.
	///
	/// Engine errors (missing, circular, ...) pass through untouched so that
	/// callers can still match on their cause.
	pub(crate) fn attribute_to(self, name: &str) -> Self {
		match self {
			Self::Custom(source) => Self::Factory {
				name: name.to_string(),
				source,
			},
			other => other,
		}
	}
}
