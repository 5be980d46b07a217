//! Always-on counters describing credential exchanges, independent of the `metrics` feature.

// std
use std::sync::atomic::{AtomicU64, Ordering};
// self
use crate::_prelude::*;

/// Exchange counters shared by every clone of a client.
#[derive(Debug, Default)]
pub struct RefreshMetrics {
	started: AtomicU64,
	installed: AtomicU64,
	failed: AtomicU64,
}
impl RefreshMetrics {
	/// Credential exchanges started, including ones still in flight.
	pub fn attempts(&self) -> u64 {
		self.started.load(Ordering::Relaxed)
	}

	/// Exchanges that installed a new token.
	pub fn successes(&self) -> u64 {
		self.installed.load(Ordering::Relaxed)
	}

	/// Exchanges that left the cache untouched.
	pub fn failures(&self) -> u64 {
		self.failed.load(Ordering::Relaxed)
	}

	/// Reads all three counters. Each is loaded independently, so an exchange finishing
	/// concurrently may be reflected in some fields only.
	pub fn snapshot(&self) -> RefreshSnapshot {
		RefreshSnapshot {
			attempts: self.attempts(),
			successes: self.successes(),
			failures: self.failures(),
		}
	}

	pub(crate) fn record_start(&self) {
		self.started.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_finish<T>(&self, result: &Result<T>) {
		let counter = if result.is_ok() { &self.installed } else { &self.failed };

		counter.fetch_add(1, Ordering::Relaxed);
	}
}

/// Point-in-time copy of [`RefreshMetrics`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RefreshSnapshot {
	/// Exchanges started.
	pub attempts: u64,
	/// Exchanges that installed a token.
	pub successes: u64,
	/// Exchanges that failed.
	pub failures: u64,
}
impl RefreshSnapshot {
	/// Exchanges started but not yet finished.
	pub fn in_flight(&self) -> u64 {
		self.attempts.saturating_sub(self.successes + self.failures)
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn outcomes_are_split_by_result() {
		let metrics = RefreshMetrics::default();

		metrics.record_start();
		metrics.record_finish(&Ok(()));
		metrics.record_start();
		metrics.record_finish::<()>(&Err(Error::EmptyAccessToken));
		metrics.record_start();

		let snapshot = metrics.snapshot();

		assert_eq!(snapshot, RefreshSnapshot { attempts: 3, successes: 1, failures: 1 });
		assert_eq!(snapshot.in_flight(), 1);
	}
}
