//! "new dependency" event
//!
//! Fired once whenever an injector creates a Dependency for a name it has not
//! seen before, whether by resolution or by `add`. Consumers use it to track
//! which resources to invalidate later; resolution never depends on it.

use crate::dependency::Dependency;
use parking_lot::RwLock;
use std::sync::Arc;

/// Receiver function type for the "new dependency" event.
pub type DependencyReceiverFn = Arc<dyn Fn(&Dependency) + Send + Sync>;

struct DependencyReceiver {
	receiver: DependencyReceiverFn,
	dispatch_uid: Option<String>,
}

impl DependencyReceiver {
	fn answers_to(&self, uid: &str) -> bool {
		self.dispatch_uid.as_deref() == Some(uid)
	}
}

/// Signal carrying newly created dependencies to connected receivers.
#[derive(Clone, Default)]
pub struct DependencySignal {
	receivers: Arc<RwLock<Vec<DependencyReceiver>>>,
}

impl DependencySignal {
	pub fn new() -> Self {
		Self::default()
	}

	/// Adds a receiver.
	///
	/// Uids are unique: a receiver connected under a uid already in use takes
	/// the place of the old one, keeping its position in the dispatch order.
	///
	/// # Examples
	///
	/// ```
	/// use conjure_di::{Dependency, DependencySignal, Resolved};
	/// use std::sync::Arc;
	/// use std::sync::atomic::{AtomicUsize, Ordering};
	///
	/// let signal = DependencySignal::new();
	/// let seen = Arc::new(AtomicUsize::new(0));
	/// let counter = Arc::clone(&seen);
	/// signal.connect(Some("counter".into()), move |_| {
	///     counter.fetch_add(1, Ordering::SeqCst);
	/// });
	///
	/// signal.send(&Dependency::new("foo", Resolved::Absent));
	/// assert_eq!(seen.load(Ordering::SeqCst), 1);
	/// ```
	pub fn connect<F>(&self, dispatch_uid: Option<String>, receiver: F)
	where
		F: Fn(&Dependency) + Send + Sync + 'static,
	{
		let entry = DependencyReceiver {
			receiver: Arc::new(receiver),
			dispatch_uid,
		};
		let mut receivers = self.receivers.write();
		let replaced = entry
			.dispatch_uid
			.as_deref()
			.and_then(|uid| receivers.iter().position(|r| r.answers_to(uid)));
		match replaced {
			Some(index) => receivers[index] = entry,
			None => receivers.push(entry),
		}
	}

	/// Drops the receiver connected as `dispatch_uid`, or all of them for
	/// `None`. Returns whether anything was dropped.
	pub fn disconnect(&self, dispatch_uid: Option<&str>) -> bool {
		let mut receivers = self.receivers.write();
		let Some(uid) = dispatch_uid else {
			let had_any = !receivers.is_empty();
			receivers.clear();
			return had_any;
		};
		match receivers.iter().position(|r| r.answers_to(uid)) {
			Some(index) => {
				receivers.remove(index);
				true
			}
			None => false,
		}
	}

	/// Calls every receiver with `dependency`, in connection order.
	///
	/// Receivers are called outside the receiver lock, so they may connect or
	/// disconnect receivers themselves.
	pub fn send(&self, dependency: &Dependency) {
		let receivers: Vec<DependencyReceiverFn> = self
			.receivers
			.read()
			.iter()
			.map(|r| Arc::clone(&r.receiver))
			.collect();

		for receiver in receivers {
			receiver(dependency);
		}
	}

	pub fn has_listeners(&self) -> bool {
		!self.receivers.read().is_empty()
	}

	pub fn receivers_count(&self) -> usize {
		self.receivers.read().len()
	}
}

impl std::fmt::Debug for DependencySignal {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("DependencySignal")
			.field("receivers", &self.receivers_count())
			.finish()
	}
}
