//! # Conjure DI
//!
//! Name-based dependency resolution.
//!
//! Callables declare the names of their dependencies; the [`Injector`]
//! resolves each name and calls the callable with the results. A name is
//! resolved by the first matching strategy:
//!
//! 1. `$injector`, the injector itself
//! 2. the injector's cache of already resolved dependencies
//! 3. explicit registrations ([`Injector::add`], [`Injector::register`])
//! 4. built-in facilities
//! 5. external packages (`findPort` also finds the package `find-port`)
//! 6. modules along the injector's search paths
//!
//! A name with a trailing `_` is optional and resolves to
//! [`Resolved::Absent`] when nothing backs it.
//!
//! ## Factories
//!
//! A located [`Factory`] is invoked and its result becomes the dependency
//! value. Its own dependencies are resolved first, recursively. A factory whose
//! last parameter is `callback` reports its value through a one-shot
//! [`Callback`], possibly from another task:
//!
//! ```
//! use conjure_di::{Catalog, Factory, Injector, Resolved};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let catalog = Catalog::new();
//! catalog.add_package("dummyCallbackAsync", Factory::new(["callback"], |args| {
//!     let callback = args.callback().expect("callback-style factory");
//!     tokio::spawn(async move {
//!         callback.ok(Resolved::value(4i32));
//!     });
//!     Ok(Resolved::Absent)
//! }).into());
//!
//! let injector = Injector::builder().catalog(catalog).build();
//! let value = injector.resolve("dummyCallbackAsync").await.unwrap();
//! assert_eq!(value.downcast_ref::<i32>(), Some(&4));
//! # }
//! ```
//!
//! Factory results are cached per resource location in a [`ModuleCache`],
//! so each factory runs once until its dependency is removed, even when
//! several calls need it at the same time. Re-entering a name that is still
//! being resolved on the same call chain fails with [`DiError::Circular`].
//!
//! ## Feature flags
//!
//! - `fs` (default): [`FileLocator`], JSON/TOML data modules on disk

pub mod cache;
pub mod dependency;
pub mod error;
pub mod events;
pub mod factory;
pub mod graph;
pub mod injector;
mod invoker;
pub mod locator;
pub mod names;
mod resolver;
pub mod settings;
pub mod signature;
pub mod value;

pub use cache::ModuleCache;
pub use dependency::{Dependency, LocationKey, Origin};
pub use error::{BoxError, DiError, DiResult, ErrorKind};
pub use events::{DependencyReceiverFn, DependencySignal};
pub use factory::{Callback, Factory, InjectMarker, Target};
pub use graph::{
	ChainId, DEFAULT_MAX_RESOLUTION_DEPTH, ResolutionFrame, ResolutionGraph, ResolutionToken,
};
pub use injector::{Injector, InjectorBuilder};
#[cfg(feature = "fs")]
pub use locator::FileLocator;
pub use locator::{Catalog, Located, Locator, LocatorChain};
pub use names::{CALLBACK_NAME, OPTIONAL_SUFFIX, SELF_NAME};
pub use settings::InjectorSettings;
pub use signature::{DeclaredParameters, ParameterParser, Signature};
pub use value::{AnyValue, Arguments, Resolved};
