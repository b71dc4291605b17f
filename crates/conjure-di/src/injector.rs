//! The injector: dependency cache, configuration and entry points

use crate::cache::ModuleCache;
use crate::dependency::{Dependency, LocationKey, Origin};
use crate::error::DiResult;
use crate::events::DependencySignal;
use crate::factory::Target;
use crate::graph::{ChainId, ResolutionFrame, ResolutionGraph};
use crate::locator::{Catalog, Locator, LocatorChain};
use crate::resolver;
use crate::settings::InjectorSettings;
use crate::signature::{DeclaredParameters, ParameterParser};
use crate::value::{Arguments, Resolved};
use parking_lot::{Mutex, RwLock};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Something to materialize on the first resolution of a name.
#[derive(Debug, Clone)]
pub(crate) enum Registration {
	/// From [`Injector::register`].
	Resource(Resolved),
	/// From [`Injector::add`] with [`Dependency::at`].
	Located(LocationKey),
}

struct InjectorInner {
	dependencies: RwLock<HashMap<String, Dependency>>,
	registrations: RwLock<HashMap<String, Registration>>,
	search_paths: RwLock<Vec<PathBuf>>,
	auto_inject_external_factories: AtomicBool,
	auto_inject_local_factories: AtomicBool,
	module_cache: ModuleCache,
	locator: Arc<dyn Locator>,
	catalog: Option<Catalog>,
	parser: Arc<dyn ParameterParser>,
	max_resolution_depth: usize,
	chains: Mutex<BTreeMap<ChainId, ResolutionGraph>>,
	events: DependencySignal,
}

/// Name-based dependency injector.
///
/// Clones share all state: a clone is the same injector, which is also what
/// factories receive when they declare `$injector`.
///
/// Each top-level [`inject`](Self::inject) or [`resolve`](Self::resolve)
/// is its own call chain, so independent calls may overlap freely; a name
/// already being resolved by another chain is waited for, not resolved
/// twice. The `$injector` handle a factory receives continues the chain it
/// was resolved in: re-entering a name still open on that chain is
/// circular, whichever task the call comes from. [`detached`](Self::detached)
/// turns such a handle back into one that starts fresh chains.
///
/// # Examples
///
/// ```
/// use conjure_di::{Arguments, Catalog, Factory, Injector, Resolved, Target};
///
/// # #[tokio::main]
/// # async fn main() {
/// let catalog = Catalog::new();
/// catalog.add_module("lib", "dummy", Resolved::value(2i32));
/// catalog.add_module("lib", "dummy2", Factory::new(["dummy"], |args| {
///     let dummy = args.value::<i32>("dummy").copied().unwrap_or_default();
///     Ok(Resolved::value(dummy - 1))
/// }).into());
///
/// let injector = Injector::builder().catalog(catalog).build();
/// injector.add_search_path("lib");
///
/// let sum = injector
///     .inject(Target::new(["dummy", "dummy2"], |args: Arguments| {
///         args.value::<i32>("dummy").copied().unwrap_or_default()
///             + args.value::<i32>("dummy2").copied().unwrap_or_default()
///     }))
///     .await
///     .unwrap();
/// assert_eq!(sum, 3);
/// # }
/// ```
#[derive(Clone)]
pub struct Injector {
	inner: Arc<InjectorInner>,
	chain: Option<ResolutionGraph>,
}

impl Injector {
	/// Creates an injector with default settings: default built-ins, data
	/// modules on disk, and both auto-inject flags on.
	pub fn new() -> Self {
		Self::builder().build()
	}

	pub fn with_settings(settings: InjectorSettings) -> Self {
		Self::builder().settings(settings).build()
	}

	pub fn builder() -> InjectorBuilder {
		InjectorBuilder::default()
	}

	/// Resolves the target's declared names left to right and calls it with
	/// the resolved arguments.
	///
	/// Fails on the first name that cannot be resolved; later names are not
	/// attempted and the target is not called. Callback-style dependencies
	/// are awaited before the next name is resolved.
	pub async fn inject<F, T>(&self, target: Target<F>) -> DiResult<T>
	where
		F: FnOnce(Arguments) -> T,
	{
		let names = self.inner.parser.parse(&target)?;
		let call = self.begin_call();
		let args = resolver::resolve_arguments(self, &call.chain, &names).await?;
		Ok((target.into_body())(args))
	}

	/// Resolves a single name.
	pub async fn resolve(&self, name: &str) -> DiResult<Resolved> {
		let call = self.begin_call();
		resolver::resolve(self.clone(), call.chain.clone(), name.to_string()).await
	}

	/// Places a dependency, replacing any dependency of the same name.
	///
	/// A ready dependency goes straight into the dependency cache. One made
	/// with [`Dependency::at`] is only bound to its location key; the
	/// resource behind the key is materialized on first resolution and the
	/// "new dependency" event fires then.
	pub fn add(&self, dependency: Dependency) {
		if dependency.is_deferred() {
			let name = dependency.name().to_string();
			let key = dependency.location_key().clone();
			tracing::debug!(dependency = %name, %key, "dependency bound to a location");
			self.remove(&name);
			self.inner
				.registrations
				.write()
				.insert(name, Registration::Located(key));
			return;
		}
		tracing::debug!(dependency = dependency.name(), "dependency added");
		self.commit(dependency);
	}

	/// Registers a resource to be materialized on first resolution.
	///
	/// Factories registered here are invoked regardless of the auto-inject
	/// flags (unless marked do-not-inject). Any dependency already resolved
	/// under `name` is removed so that the registration takes effect.
	pub fn register(&self, name: impl Into<String>, resource: impl Into<Resolved>) {
		let name = name.into();
		self.remove(&name);
		self.inner
			.registrations
			.write()
			.insert(name, Registration::Resource(resource.into()));
	}

	/// Evicts the dependency and the module cache entry behind it.
	///
	/// The next resolution of `name` rediscovers it from scratch, invoking a
	/// factory again.
	pub fn remove(&self, name: &str) -> Option<Dependency> {
		let removed = self.inner.dependencies.write().remove(name)?;
		self.inner.module_cache.remove(removed.location_key());
		tracing::debug!(dependency = name, key = %removed.location_key(), "dependency removed");
		Some(removed)
	}

	/// Cached dependency lookup; never triggers resolution.
	pub fn get_dependency(&self, name: &str) -> Option<Dependency> {
		self.inner.dependencies.read().get(name).cloned()
	}

	/// Names of all cached dependencies, sorted.
	pub fn dependency_names(&self) -> Vec<String> {
		let mut names: Vec<String> = self.inner.dependencies.read().keys().cloned().collect();
		names.sort();
		names
	}

	/// Appends a local search path; earlier paths win.
	pub fn add_search_path(&self, path: impl Into<PathBuf>) {
		self.inner.search_paths.write().push(path.into());
	}

	pub fn search_paths(&self) -> Vec<PathBuf> {
		self.inner.search_paths.read().clone()
	}

	pub fn auto_inject_external_factories(&self) -> bool {
		self.inner
			.auto_inject_external_factories
			.load(Ordering::SeqCst)
	}

	pub fn set_auto_inject_external_factories(&self, enabled: bool) {
		self.inner
			.auto_inject_external_factories
			.store(enabled, Ordering::SeqCst);
	}

	pub fn auto_inject_local_factories(&self) -> bool {
		self.inner.auto_inject_local_factories.load(Ordering::SeqCst)
	}

	pub fn set_auto_inject_local_factories(&self, enabled: bool) {
		self.inner
			.auto_inject_local_factories
			.store(enabled, Ordering::SeqCst);
	}

	/// Connects a handler to the "new dependency" event.
	///
	/// A handler connected with the `dispatch_uid` of an existing one
	/// replaces it.
	pub fn on_new_dependency<F>(&self, dispatch_uid: Option<&str>, handler: F)
	where
		F: Fn(&Dependency) + Send + Sync + 'static,
	{
		self.inner
			.events
			.connect(dispatch_uid.map(str::to_string), handler);
	}

	/// Disconnects the handler with `dispatch_uid`, or every handler when
	/// `None`.
	pub fn disconnect(&self, dispatch_uid: Option<&str>) -> bool {
		self.inner.events.disconnect(dispatch_uid)
	}

	pub fn module_cache(&self) -> &ModuleCache {
		&self.inner.module_cache
	}

	/// The catalog of the default locator chain, when the injector uses one.
	pub fn catalog(&self) -> Option<&Catalog> {
		self.inner.catalog.as_ref()
	}

	/// Resolutions currently in flight on every running top-level call,
	/// each call's frames outermost first.
	pub fn open_resolutions(&self) -> Vec<ResolutionFrame> {
		self.inner
			.chains
			.lock()
			.values()
			.flat_map(|chain| chain.open_frames())
			.collect()
	}

	pub fn max_resolution_depth(&self) -> usize {
		self.inner.max_resolution_depth
	}

	/// The same injector, with calls starting their own chains again.
	pub fn detached(&self) -> Injector {
		Injector {
			inner: Arc::clone(&self.inner),
			chain: None,
		}
	}

	/// True when both handles refer to the same injector.
	pub fn ptr_eq(&self, other: &Self) -> bool {
		Arc::ptr_eq(&self.inner, &other.inner)
	}

	/// This injector continuing `chain`, as handed out for `$injector`.
	pub(crate) fn continuing(&self, chain: ResolutionGraph) -> Injector {
		Injector {
			inner: Arc::clone(&self.inner),
			chain: Some(chain),
		}
	}

	fn begin_call(&self) -> Call {
		if let Some(chain) = &self.chain {
			return Call {
				chain: chain.clone(),
				registered: None,
			};
		}
		let chain = ResolutionGraph::new(self.inner.max_resolution_depth);
		self.inner.chains.lock().insert(chain.id(), chain.clone());
		Call {
			chain,
			registered: Some(Arc::clone(&self.inner)),
		}
	}

	pub(crate) fn commit(&self, dependency: Dependency) {
		let previous = self
			.inner
			.dependencies
			.write()
			.insert(dependency.name().to_string(), dependency.clone());
		if previous.is_none() {
			self.inner.events.send(&dependency);
		}
	}

	pub(crate) fn registration(&self, name: &str) -> Option<Registration> {
		self.inner.registrations.read().get(name).cloned()
	}

	/// Identity of the injector behind this handle.
	pub(crate) fn id(&self) -> usize {
		Arc::as_ptr(&self.inner) as usize
	}

	pub(crate) fn auto_injects(&self, origin: Origin) -> bool {
		match origin {
			Origin::External => self.auto_inject_external_factories(),
			Origin::Local => self.auto_inject_local_factories(),
			Origin::ExplicitlyAdded | Origin::BuiltIn => true,
		}
	}

	pub(crate) fn locator(&self) -> &dyn Locator {
		self.inner.locator.as_ref()
	}

	pub(crate) fn parameter_parser(&self) -> &dyn ParameterParser {
		self.inner.parser.as_ref()
	}
}

/// One top-level call; a chain it started is listed until the call ends.
struct Call {
	chain: ResolutionGraph,
	registered: Option<Arc<InjectorInner>>,
}

impl Drop for Call {
	fn drop(&mut self) {
		if let Some(inner) = &self.registered {
			inner.chains.lock().remove(&self.chain.id());
		}
	}
}

impl Default for Injector {
	fn default() -> Self {
		Self::new()
	}
}

impl fmt::Debug for Injector {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Injector")
			.field("dependencies", &self.dependency_names())
			.field("search_paths", &self.search_paths())
			.field(
				"auto_inject_external_factories",
				&self.auto_inject_external_factories(),
			)
			.field(
				"auto_inject_local_factories",
				&self.auto_inject_local_factories(),
			)
			.field("module_cache", &self.inner.module_cache)
			.finish_non_exhaustive()
	}
}

/// Builder for [`Injector`].
///
/// Without [`locator`](Self::locator), the injector looks names up through
/// a chain of a [`Catalog`] and, with the `fs` feature, a
/// [`FileLocator`](crate::FileLocator).
#[derive(Default)]
pub struct InjectorBuilder {
	settings: InjectorSettings,
	locator: Option<Arc<dyn Locator>>,
	catalog: Option<Catalog>,
	parser: Option<Arc<dyn ParameterParser>>,
	module_cache: Option<ModuleCache>,
}

impl InjectorBuilder {
	pub fn settings(mut self, settings: InjectorSettings) -> Self {
		self.settings = settings;
		self
	}

	/// Replaces the whole default locator chain.
	pub fn locator(mut self, locator: impl Locator + 'static) -> Self {
		self.locator = Some(Arc::new(locator));
		self
	}

	/// Uses `catalog` in the default locator chain.
	///
	/// The catalog is used as given; default built-ins are only installed
	/// into a catalog the builder creates itself.
	pub fn catalog(mut self, catalog: Catalog) -> Self {
		self.catalog = Some(catalog);
		self
	}

	pub fn parameter_parser(mut self, parser: impl ParameterParser + 'static) -> Self {
		self.parser = Some(Arc::new(parser));
		self
	}

	/// Shares `cache` with every other injector built with it.
	pub fn module_cache(mut self, cache: ModuleCache) -> Self {
		self.module_cache = Some(cache);
		self
	}

	pub fn build(self) -> Injector {
		let Self {
			settings,
			locator,
			catalog,
			parser,
			module_cache,
		} = self;

		let (locator, catalog) = match locator {
			Some(locator) => (locator, catalog),
			None => {
				let catalog = catalog.unwrap_or_else(|| {
					if settings.default_builtins {
						Catalog::with_default_builtins()
					} else {
						Catalog::new()
					}
				});
				let chain = default_chain(catalog.clone());
				(Arc::new(chain) as Arc<dyn Locator>, Some(catalog))
			}
		};

		tracing::debug!(
			search_paths = settings.search_paths.len(),
			max_resolution_depth = settings.max_resolution_depth,
			"injector built"
		);

		Injector {
			inner: Arc::new(InjectorInner {
				dependencies: RwLock::new(HashMap::new()),
				registrations: RwLock::new(HashMap::new()),
				search_paths: RwLock::new(settings.search_paths),
				auto_inject_external_factories: AtomicBool::new(
					settings.auto_inject_external_factories,
				),
				auto_inject_local_factories: AtomicBool::new(settings.auto_inject_local_factories),
				module_cache: module_cache.unwrap_or_default(),
				locator,
				catalog,
				parser: parser.unwrap_or_else(|| Arc::new(DeclaredParameters)),
				max_resolution_depth: settings.max_resolution_depth,
				chains: Mutex::new(BTreeMap::new()),
				events: DependencySignal::new(),
			}),
			chain: None,
		}
	}
}

fn default_chain(catalog: Catalog) -> LocatorChain {
	let chain = LocatorChain::new().with(catalog);
	#[cfg(feature = "fs")]
	let chain = chain.with(crate::locator::FileLocator::new());
	chain
}
