//! # Conjure
//!
//! Name-based dependency injection.
//!
//! A callable declares the names of its dependencies and the [`Injector`]
//! supplies them: built-in facilities, external packages, modules along the
//! injector's search paths, or values registered explicitly. Located
//! factories are invoked (directly or through a one-shot callback) and their
//! results cached.
//!
//! ## Quick Start
//!
//! ```
//! use conjure::prelude::*;
//!
//! # #[tokio::main]
//! # async fn main() -> DiResult<()> {
//! let injector = Injector::new();
//! injector.add(Dependency::new("greeting", Resolved::value("hello")));
//!
//! let greeting = injector
//!     .inject(Target::new(["greeting", "missing_"], |args: Arguments| {
//!         assert!(args.get("missing_").is_some_and(Resolved::is_absent));
//!         args.value::<&str>("greeting").copied()
//!     }))
//!     .await?;
//! assert_eq!(greeting, Some("hello"));
//! # Ok(())
//! # }
//! ```
//!
//! ## Feature Flags
//!
//! - `fs` (default): JSON/TOML data modules on disk through
//!   [`FileLocator`]

pub use conjure_di::*;

/// Commonly used types.
pub mod prelude {
	pub use conjure_di::{
		Arguments, Callback, Catalog, Dependency, DiError, DiResult, Factory, Injector,
		InjectorSettings, Origin, Resolved, Target,
	};
}
