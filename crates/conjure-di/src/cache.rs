//! Factory-result cache keyed by resource location
//!
//! Besides the results, the cache tracks which resources are being
//! materialized right now. A chain that needs a resource another chain is
//! already producing waits for that chain instead of invoking the factory a
//! second time. Chains waiting on each other in a ring fail with
//! [`DiError::Circular`].

use crate::dependency::LocationKey;
use crate::error::{DiError, DiResult};
use crate::graph::{ChainId, ResolutionGraph};
use crate::value::Resolved;
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::watch;

/// Materialized values keyed by [`LocationKey`].
///
/// Cloning shares the cache. Injectors built with the same `ModuleCache`
/// share every factory result: a factory behind a given key runs once across
/// all of them, and removing a dependency from one injector evicts the entry
/// for all of them.
#[derive(Clone, Default)]
pub struct ModuleCache {
	entries: Arc<RwLock<HashMap<LocationKey, Resolved>>>,
	flights: Arc<Mutex<Flights>>,
}

impl ModuleCache {
	/// Creates an empty cache.
	///
	/// # Examples
	///
	/// ```
	/// use conjure_di::{LocationKey, ModuleCache, Resolved};
	///
	/// let cache = ModuleCache::new();
	/// let key = LocationKey::external("eyes");
	/// cache.insert(key.clone(), Resolved::value("eyes"));
	///
	/// assert!(cache.contains(&key));
	/// assert_eq!(cache.get(&key).unwrap().downcast_ref::<&str>(), Some(&"eyes"));
	/// ```
	pub fn new() -> Self {
		Self::default()
	}

	pub fn get(&self, key: &LocationKey) -> Option<Resolved> {
		self.entries.read().get(key).cloned()
	}

	pub fn insert(&self, key: LocationKey, value: Resolved) -> Option<Resolved> {
		self.entries.write().insert(key, value)
	}

	pub fn remove(&self, key: &LocationKey) -> Option<Resolved> {
		self.entries.write().remove(key)
	}

	pub fn contains(&self, key: &LocationKey) -> bool {
		self.entries.read().contains_key(key)
	}

	pub fn len(&self) -> usize {
		self.entries.read().len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.read().is_empty()
	}

	pub fn clear(&self) {
		self.entries.write().clear();
	}

	/// True when both handles point at the same cache.
	pub fn ptr_eq(&self, other: &Self) -> bool {
		Arc::ptr_eq(&self.entries, &other.entries)
	}

	/// Claims the right to materialize `key` for the chain of `graph`, which
	/// is resolving `name`.
	///
	/// Returns [`Claim::Wait`] when another chain holds the key. Fails with
	/// [`DiError::Circular`] when that chain is, directly or through others,
	/// waiting on this one.
	pub(crate) fn claim(
		&self,
		key: FlightKey,
		graph: &ResolutionGraph,
		name: &str,
	) -> DiResult<Claim> {
		let mut flights = self.flights.lock();
		let me = graph.id();

		let Some(flight) = flights.owners.get(&key) else {
			let (done, receiver) = watch::channel(());
			flights.owners.insert(
				key.clone(),
				Flight {
					chain: me,
					name: name.to_string(),
					done: receiver,
				},
			);
			return Ok(Claim::Owner(FlightGuard {
				flights: Arc::clone(&self.flights),
				key,
				_done: done,
			}));
		};

		let holder = Waiting {
			on: flight.chain,
			name: flight.name.clone(),
		};
		let done = flight.done.clone();

		// Walk the wait-for edges starting at the holder. Every step ends on a
		// name its chain holds, so reaching this chain names one of ours.
		let mut owner = holder.on;
		let mut held = holder.name.as_str();
		for _ in 0..=flights.waiting.len() {
			if owner == me {
				return Err(DiError::Circular {
					name: name.to_string(),
					path: graph.cycle_path(held),
				});
			}
			match flights.waiting.get(&owner) {
				Some(next) => {
					owner = next.on;
					held = next.name.as_str();
				}
				None => break,
			}
		}

		tracing::trace!(
			dependency = name,
			chain = %me,
			holder = %holder.on,
			"waiting for an in-flight resolution"
		);
		flights.waiting.insert(me, holder);
		Ok(Claim::Wait(FlightWait {
			flights: Arc::clone(&self.flights),
			chain: me,
			done,
		}))
	}

	#[cfg(test)]
	fn in_flight(&self) -> usize {
		self.flights.lock().owners.len()
	}
}

/// What a [`ModuleCache`] flight is materializing.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) enum FlightKey {
	/// A located resource, shared by every injector on the cache.
	Location(LocationKey),
	/// An explicit registration, private to one injector.
	Registration { injector: usize, name: String },
}

struct Flight {
	chain: ChainId,
	name: String,
	done: watch::Receiver<()>,
}

/// A chain blocked on a flight held by chain `on` for `name`.
struct Waiting {
	on: ChainId,
	name: String,
}

#[derive(Default)]
struct Flights {
	owners: HashMap<FlightKey, Flight>,
	waiting: HashMap<ChainId, Waiting>,
}

pub(crate) enum Claim {
	Owner(FlightGuard),
	Wait(FlightWait),
}

/// Held while a chain materializes a resource; dropping it releases the
/// waiters.
pub(crate) struct FlightGuard {
	flights: Arc<Mutex<Flights>>,
	key: FlightKey,
	_done: watch::Sender<()>,
}

impl Drop for FlightGuard {
	fn drop(&mut self) {
		self.flights.lock().owners.remove(&self.key);
	}
}

pub(crate) struct FlightWait {
	flights: Arc<Mutex<Flights>>,
	chain: ChainId,
	done: watch::Receiver<()>,
}

impl FlightWait {
	/// Resolves once the holder has released the flight, however it ended.
	pub(crate) async fn finished(mut self) {
		// Nothing is ever sent: the only event is the sender going away.
		while self.done.changed().await.is_ok() {}
	}
}

impl Drop for FlightWait {
	fn drop(&mut self) {
		self.flights.lock().waiting.remove(&self.chain);
	}
}

impl std::fmt::Debug for ModuleCache {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("ModuleCache")
			.field("entries", &self.len())
			.finish()
	}
}
