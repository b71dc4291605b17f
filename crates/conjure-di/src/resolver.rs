//! Name resolution
//!
//! Strategies, first match wins:
//!
//! 1. the reserved self-name `$injector`
//! 2. the illegal-name check
//! 3. the injector's dependency cache
//! 4. explicit registrations, including names bound to a location key
//! 5. the locator: built-ins, external packages, then the search paths
//! 6. the optional-name fallback (`Absent`)
//!
//! Anything else is [`DiError::NotFound`].

use crate::cache::{Claim, FlightKey};
use crate::dependency::{Dependency, LocationKey, Origin};
use crate::error::{DiError, DiResult};
use crate::graph::ResolutionGraph;
use crate::injector::{Injector, Registration};
use crate::invoker;
use crate::locator::Located;
use crate::names::{NameRequest, SELF_NAME};
use crate::value::{Arguments, Resolved};
use futures::future::{BoxFuture, FutureExt};
use std::path::PathBuf;

/// Resolves `requested` on `injector` as part of `chain`.
///
/// Boxed because factory invocation recurses back into resolution.
pub(crate) fn resolve(
	injector: Injector,
	chain: ResolutionGraph,
	requested: String,
) -> BoxFuture<'static, DiResult<Resolved>> {
	async move {
		if requested == SELF_NAME {
			return Ok(Resolved::Injector(injector.continuing(chain)));
		}

		let request = NameRequest::parse(&requested)?;
		let name = request.base;

		if let Some(dependency) = injector.get_dependency(name) {
			tracing::trace!(dependency = name, origin = %dependency.origin(), "dependency cache hit");
			return Ok(dependency.into_value());
		}

		let token = chain.enter(name)?;
		let discovered = discover(&injector, &chain, name).await;
		token.leave();

		match discovered? {
			Some(value) => Ok(value),
			None if request.optional => {
				tracing::trace!(dependency = name, "optional dependency absent");
				Ok(Resolved::Absent)
			}
			None => Err(DiError::NotFound(name.to_string())),
		}
	}
	.boxed()
}

/// Resolves `names` left to right, stopping at the first failure.
pub(crate) async fn resolve_arguments(
	injector: &Injector,
	chain: &ResolutionGraph,
	names: &[String],
) -> DiResult<Arguments> {
	let mut args = Arguments::with_capacity(names.len());
	for name in names {
		let value = resolve(injector.clone(), chain.clone(), name.clone()).await?;
		args.push(name.clone(), value);
	}
	Ok(args)
}

/// Finds and materializes `name`, committing the dependency on success.
async fn discover(
	injector: &Injector,
	chain: &ResolutionGraph,
	name: &str,
) -> DiResult<Option<Resolved>> {
	let search_paths = injector.search_paths();

	let located = match injector.registration(name) {
		Some(Registration::Resource(resource)) => {
			return materialize_registration(injector, chain, name, resource).await.map(Some);
		}
		Some(Registration::Located(key)) => {
			return materialize_bound(injector, chain, name, key, &search_paths).await;
		}
		None => injector.locator().locate(name, &search_paths)?,
	};

	let Some(Located {
		origin,
		location_key,
		resource,
	}) = located
	else {
		return Ok(None);
	};
	tracing::debug!(dependency = name, %origin, key = %location_key, "dependency located");

	let value =
		invoker::materialize_located(injector, chain, name, origin, &location_key, resource).await?;
	injector.commit(Dependency::discovered(name, value.clone(), origin, location_key));
	Ok(Some(value))
}

/// Materializes the resource behind the location `name` was bound to.
async fn materialize_bound(
	injector: &Injector,
	chain: &ResolutionGraph,
	name: &str,
	key: LocationKey,
	search_paths: &[PathBuf],
) -> DiResult<Option<Resolved>> {
	let value = match injector.module_cache().get(&key) {
		Some(cached) => cached,
		None => {
			let Some(located) = injector.locator().locate_key(&key, search_paths)? else {
				tracing::debug!(dependency = name, %key, "nothing behind the bound location");
				return Ok(None);
			};
			// Flags follow where the resource lives; the binding itself is explicit.
			invoker::materialize_located(injector, chain, name, located.origin, &key, located.resource)
				.await?
		}
	};
	injector.commit(Dependency::discovered(
		name,
		value.clone(),
		Origin::ExplicitlyAdded,
		key,
	));
	Ok(Some(value))
}

/// Materializes an explicit registration, once per injector even when
/// several chains ask for it together.
async fn materialize_registration(
	injector: &Injector,
	chain: &ResolutionGraph,
	name: &str,
	resource: Resolved,
) -> DiResult<Resolved> {
	let flight = FlightKey::Registration {
		injector: injector.id(),
		name: name.to_string(),
	};
	let _flight = loop {
		match injector.module_cache().claim(flight.clone(), chain, name)? {
			Claim::Owner(guard) => break guard,
			Claim::Wait(wait) => wait.finished().await,
		}
		if let Some(dependency) = injector.get_dependency(name) {
			return Ok(dependency.into_value());
		}
	};
	if let Some(dependency) = injector.get_dependency(name) {
		return Ok(dependency.into_value());
	}

	let value = invoker::materialize(injector, chain, name, Origin::ExplicitlyAdded, resource)
		.await?
		.into_value();
	tracing::debug!(dependency = name, "explicit registration materialized");
	injector.commit(Dependency::discovered(
		name,
		value.clone(),
		Origin::ExplicitlyAdded,
		LocationKey::explicit(name),
	));
	Ok(value)
}
