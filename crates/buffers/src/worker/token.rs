use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Identity of one file worker, unique for the lifetime of its coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WorkerId(pub u64);

impl std::fmt::Display for WorkerId {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "worker#{}", self.0)
	}
}

/// Monotonic clock handing out [`WorkerId`]s, starting at 1.
#[derive(Debug, Default, Clone)]
pub struct WorkerIdClock {
	next: Arc<AtomicU64>,
}

impl WorkerIdClock {
	pub fn new() -> Self {
		Self::default()
	}

	/// Returns the next worker ID.
	pub fn next(&self) -> WorkerId {
		WorkerId(self.next.fetch_add(1, Ordering::AcqRel).wrapping_add(1))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn ids_are_monotonic_across_clones() {
		let clock = WorkerIdClock::new();
		let other = clock.clone();
		assert_eq!(clock.next(), WorkerId(1));
		assert_eq!(other.next(), WorkerId(2));
		assert_eq!(clock.next(), WorkerId(3));
	}
}
