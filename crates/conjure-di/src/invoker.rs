//! Materialization of located resources
//!
//! Decides whether a raw resource is used as-is or invoked, invokes
//! factories (direct-style or callback-style) and maintains the module cache.

use crate::cache::{Claim, FlightKey};
use crate::dependency::{LocationKey, Origin};
use crate::error::{DiError, DiResult};
use crate::factory::{Callback, Factory, InjectMarker};
use crate::graph::ResolutionGraph;
use crate::injector::Injector;
use crate::names::is_callback_style;
use crate::resolver;
use crate::value::Resolved;

/// Outcome of [`materialize`].
#[derive(Debug)]
pub(crate) enum Materialized {
	/// The resource was not callable.
	Verbatim(Resolved),
	/// A factory that was deliberately left uninvoked.
	Raw(Factory),
	/// The factory's result.
	Invoked(Resolved),
}

impl Materialized {
	/// Value to write into the module cache; raw factories are never cached
	/// there.
	fn cacheable(&self) -> Option<&Resolved> {
		match self {
			Self::Verbatim(value) | Self::Invoked(value) => Some(value),
			Self::Raw(_) => None,
		}
	}

	pub(crate) fn into_value(self) -> Resolved {
		match self {
			Self::Verbatim(value) | Self::Invoked(value) => value,
			Self::Raw(factory) => Resolved::Factory(factory),
		}
	}
}

/// Turns a raw resource into the dependency value for `name`.
pub(crate) async fn materialize(
	injector: &Injector,
	chain: &ResolutionGraph,
	name: &str,
	origin: Origin,
	raw: Resolved,
) -> DiResult<Materialized> {
	let factory = match raw {
		Resolved::Factory(factory) => factory,
		other => return Ok(Materialized::Verbatim(other)),
	};

	let should_invoke = match factory.marker() {
		InjectMarker::DoNotInject => false,
		InjectMarker::AlwaysInject => true,
		InjectMarker::Auto => injector.auto_injects(origin),
	};
	if !should_invoke {
		tracing::debug!(dependency = name, %origin, marker = ?factory.marker(), "factory left uninvoked");
		return Ok(Materialized::Raw(factory));
	}

	invoke(injector, chain, name, &factory)
		.await
		.map(Materialized::Invoked)
}

/// Materializes a located resource, reusing the module cache entry for
/// `location_key` when there is one.
///
/// While one chain materializes a key, others needing it wait and then take
/// its cached result. A waiter whose holder left nothing in the cache (a raw
/// factory, or a failure) materializes the key itself.
pub(crate) async fn materialize_located(
	injector: &Injector,
	chain: &ResolutionGraph,
	name: &str,
	origin: Origin,
	location_key: &LocationKey,
	raw: Resolved,
) -> DiResult<Resolved> {
	let cache = injector.module_cache();
	let _flight = loop {
		if let Some(cached) = cache.get(location_key) {
			tracing::trace!(dependency = name, key = %location_key, "module cache hit");
			return Ok(cached);
		}
		match cache.claim(FlightKey::Location(location_key.clone()), chain, name)? {
			Claim::Owner(guard) => break guard,
			Claim::Wait(wait) => wait.finished().await,
		}
	};
	// The previous holder may have filled the entry just before releasing.
	if let Some(cached) = cache.get(location_key) {
		return Ok(cached);
	}

	let materialized = materialize(injector, chain, name, origin, raw).await?;
	if let Some(value) = materialized.cacheable() {
		cache.insert(location_key.clone(), value.clone());
	}
	Ok(materialized.into_value())
}

async fn invoke(
	injector: &Injector,
	chain: &ResolutionGraph,
	name: &str,
	factory: &Factory,
) -> DiResult<Resolved> {
	let parameters = injector.parameter_parser().parse(factory)?;
	let callback_style = is_callback_style(&parameters);
	let dependencies = if callback_style {
		&parameters[..parameters.len() - 1]
	} else {
		&parameters[..]
	};

	let mut args = resolver::resolve_arguments(injector, chain, dependencies).await?;
	tracing::debug!(dependency = name, ?parameters, callback_style, "invoking factory");

	if !callback_style {
		return factory.call(args).map_err(|e| e.attribute_to(name));
	}

	let (callback, completion) = Callback::channel(name);
	args.set_callback(callback);
	factory.call(args).map_err(|e| e.attribute_to(name))?;

	match completion.await {
		Ok(result) => result.map_err(|e| e.attribute_to(name)),
		Err(_) => Err(DiError::CallbackDropped(name.to_string())),
	}
}
