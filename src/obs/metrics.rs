// self
use crate::obs::{OperationKind, Outcome};

/// Records an endpoint outcome via the global metrics recorder (when enabled).
pub fn record_outcome(kind: OperationKind, outcome: Outcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			"easemob_push_request_total",
			"operation" => kind.as_str(),
			"outcome" => outcome.as_str()
		)
		.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = (kind, outcome);
	}
}

/// Records a fixed-window reset and how many permits it returned to the pool.
pub fn record_window_reset(released: usize) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!("easemob_push_window_reset_total").increment(1);
	}

	super::tracing::trace_window_reset(released);
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn record_outcome_noop_without_metrics() {
		record_outcome(OperationKind::PushSync, Outcome::Failure);
		record_window_reset(3);
	}
}
