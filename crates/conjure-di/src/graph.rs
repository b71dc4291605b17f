//! In-flight resolution tracking and circular dependency detection
//!
//! Every call chain owns one [`ResolutionGraph`]: a top-level
//! `Injector::inject` or `Injector::resolve` starts a fresh one, and the
//! `$injector` handle given to a factory continues the chain it was resolved
//! in. Resolving a name opens a [`ResolutionFrame`]; the returned
//! [`ResolutionToken`] closes it again when dropped. The graph travels with
//! the chain rather than in a task-local, so a frame stays open across a
//! callback-style suspension even when the factory re-enters the injector
//! from another task.
//!
//! ## Features
//!
//! - **O(1) Circular Detection**: lookup in a `HashSet` of open names
//! - **Depth Limiting**: a configurable maximum catches runaway chains
//! - **Deterministic**: every `enter` checks for cycles
//! - **RAII**: automatic cleanup via `ResolutionToken`

use crate::error::{DiError, DiResult};
use parking_lot::Mutex;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Default maximum number of simultaneously open frames.
pub const DEFAULT_MAX_RESOLUTION_DEPTH: usize = 100;

static NEXT_CHAIN_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of one resolution call chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChainId(u64);

impl ChainId {
	fn next() -> Self {
		Self(NEXT_CHAIN_ID.fetch_add(1, Ordering::Relaxed))
	}
}

impl fmt::Display for ChainId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "chain-{}", self.0)
	}
}

/// One open resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolutionFrame {
	/// Name being resolved.
	pub name: String,
	/// When the resolution began.
	pub started_at: Instant,
	/// Position in the open stack (1 = outermost).
	pub depth: usize,
}

impl ResolutionFrame {
	pub fn elapsed(&self) -> Duration {
		self.started_at.elapsed()
	}
}

#[derive(Debug, Default)]
struct GraphState {
	open: HashSet<String>,
	stack: Vec<ResolutionFrame>,
}

impl GraphState {
	fn cycle_path(&self, name: &str) -> String {
		match self.stack.iter().position(|frame| frame.name == name) {
			Some(start) => {
				let cycle: Vec<&str> = self.stack[start..]
					.iter()
					.map(|frame| frame.name.as_str())
					.collect();
				format!("{} -> {}", cycle.join(" -> "), name)
			}
			None => format!("unknown cycle involving {}", name),
		}
	}
}

/// Stack of the resolutions open on one call chain.
///
/// Clones share the stack and the [`ChainId`].
#[derive(Debug, Clone)]
pub struct ResolutionGraph {
	id: ChainId,
	state: Arc<Mutex<GraphState>>,
	max_depth: usize,
}

impl ResolutionGraph {
	/// Starts a new chain.
	pub fn new(max_depth: usize) -> Self {
		Self {
			id: ChainId::next(),
			state: Arc::new(Mutex::new(GraphState::default())),
			max_depth,
		}
	}

	pub fn id(&self) -> ChainId {
		self.id
	}

	/// Opens a frame for `name`.
	///
	/// Fails with [`DiError::Circular`] when `name` is already open, and with
	/// [`DiError::MaxDepthExceeded`] when the stack is full.
	///
	/// # Examples
	///
	/// ```
	/// use conjure_di::ResolutionGraph;
	///
	/// let graph = ResolutionGraph::default();
	/// let outer = graph.enter("x").unwrap();
	/// let err = graph.enter("x").unwrap_err();
	/// assert!(err.is_circular());
	///
	/// drop(outer);
	/// assert!(graph.enter("x").is_ok());
	/// ```
	pub fn enter(&self, name: &str) -> DiResult<ResolutionToken> {
		let mut state = self.state.lock();
		if state.open.contains(name) {
			let path = state.cycle_path(name);
			return Err(DiError::Circular {
				name: name.to_string(),
				path,
			});
		}
		let depth = state.stack.len() + 1;
		if depth > self.max_depth {
			return Err(DiError::MaxDepthExceeded(depth));
		}
		state.open.insert(name.to_string());
		state.stack.push(ResolutionFrame {
			name: name.to_string(),
			started_at: Instant::now(),
			depth,
		});
		tracing::trace!(dependency = name, depth, "resolution frame opened");
		Ok(ResolutionToken {
			state: Arc::clone(&self.state),
			name: name.to_string(),
		})
	}

	pub fn is_open(&self, name: &str) -> bool {
		self.state.lock().open.contains(name)
	}

	/// Number of open frames.
	pub fn depth(&self) -> usize {
		self.state.lock().stack.len()
	}

	pub fn max_depth(&self) -> usize {
		self.max_depth
	}

	/// Snapshot of the open frames, outermost first.
	pub fn open_frames(&self) -> Vec<ResolutionFrame> {
		self.state.lock().stack.clone()
	}

	/// `name -> ... -> name` through the open frames, starting at `name`.
	pub(crate) fn cycle_path(&self, name: &str) -> String {
		self.state.lock().cycle_path(name)
	}
}

impl Default for ResolutionGraph {
	fn default() -> Self {
		Self::new(DEFAULT_MAX_RESOLUTION_DEPTH)
	}
}

/// RAII guard of one open frame: the frame is closed on drop.
#[derive(Debug)]
#[must_use = "dropping the token closes the resolution frame"]
pub struct ResolutionToken {
	state: Arc<Mutex<GraphState>>,
	name: String,
}

impl ResolutionToken {
	pub fn name(&self) -> &str {
		&self.name
	}

	/// Closes the frame explicitly.
	pub fn leave(self) {}
}

impl Drop for ResolutionToken {
	fn drop(&mut self) {
		let mut state = self.state.lock();
		state.open.remove(&self.name);
		if let Some(pos) = state
			.stack
			.iter()
			.rposition(|frame| frame.name == self.name)
		{
			state.stack.remove(pos);
		}
		tracing::trace!(dependency = %self.name, "resolution frame closed");
	}
}
