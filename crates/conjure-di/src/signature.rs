//! Parameter-name extraction
//!
//! The engine never inspects a callable itself; it asks a
//! [`ParameterParser`] for the ordered dependency names. The default parser,
//! [`DeclaredParameters`], returns the names each callable declared when it
//! was built. Injectors accept any other parser through
//! [`InjectorBuilder::parameter_parser`](crate::InjectorBuilder::parameter_parser).

use crate::error::{DiError, DiResult};
use crate::factory::{Factory, Target};
use crate::value::Resolved;

/// Something that may declare dependency names.
pub trait Signature {
	/// Declared parameter names, or `None` when the value is not callable.
	fn declared_parameters(&self) -> Option<&[String]>;

	/// Human-readable description used in error messages.
	fn describe(&self) -> String {
		"callable".to_string()
	}
}

impl Signature for Factory {
	fn declared_parameters(&self) -> Option<&[String]> {
		Some(self.parameters())
	}

	fn describe(&self) -> String {
		format!("factory({})", self.parameters().join(", "))
	}
}

impl<F> Signature for Target<F> {
	fn declared_parameters(&self) -> Option<&[String]> {
		Some(self.parameters())
	}

	fn describe(&self) -> String {
		format!("target({})", self.parameters().join(", "))
	}
}

impl Signature for Resolved {
	fn declared_parameters(&self) -> Option<&[String]> {
		self.as_factory().map(Factory::parameters)
	}

	fn describe(&self) -> String {
		match self {
			Resolved::Factory(factory) => factory.describe(),
			other => format!("{other:?}"),
		}
	}
}

/// Extracts the ordered dependency names of a callable.
pub trait ParameterParser: Send + Sync {
	/// Fails with [`DiError::InvalidArgument`] when `callable` is not
	/// callable; returns an empty list for a zero-parameter callable.
	fn parse(&self, callable: &dyn Signature) -> DiResult<Vec<String>>;
}

/// Parser returning the names a callable declared at construction.
///
/// # Examples
///
/// ```
/// use conjure_di::{DeclaredParameters, Factory, ParameterParser, Resolved};
///
/// let factory = Factory::new(["a", "b", "c"], |_| Ok(Resolved::Absent));
/// let names = DeclaredParameters.parse(&factory).unwrap();
/// assert_eq!(names, ["a", "b", "c"]);
///
/// assert!(DeclaredParameters.parse(&Resolved::value(1i32)).is_err());
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct DeclaredParameters;

impl ParameterParser for DeclaredParameters {
	fn parse(&self, callable: &dyn Signature) -> DiResult<Vec<String>> {
		callable
			.declared_parameters()
			.map(<[String]>::to_vec)
			.ok_or_else(|| {
				DiError::InvalidArgument(format!("{} is not callable", callable.describe()))
			})
	}
}
