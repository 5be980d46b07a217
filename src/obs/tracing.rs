// self
use crate::{_prelude::*, obs::OperationKind};

/// Type alias that resolves to an instrumented future when tracing is enabled.
#[cfg(feature = "tracing")]
pub type InstrumentedOperation<F> = tracing::instrument::Instrumented<F>;
/// Passthrough future type when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedOperation<F> = F;

/// A span builder used by endpoint calls.
#[derive(Clone, Debug)]
pub struct OperationSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl OperationSpan {
	/// Creates a new span tagged with the provided operation kind + stage.
	pub fn new(kind: OperationKind, stage: &'static str) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span =
				tracing::info_span!("easemob_push.request", operation = kind.as_str(), stage);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (kind, stage);

			Self {}
		}
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedOperation<Fut>
	where
		Fut: Future,
	{
		#[cfg(feature = "tracing")]
		{
			use tracing::Instrument;

			fut.instrument(self.span.clone())
		}
		#[cfg(not(feature = "tracing"))]
		{
			fut
		}
	}
}

/// Lifecycle transitions of the limiter's reset loop.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LimiterEvent {
	/// A reset loop was spawned.
	Started {
		/// Permits per window.
		rate: u32,
		/// Window length.
		interval: StdDuration,
	},
	/// A reset loop was retired cleanly.
	Stopped,
	/// A reset loop had already died from a panic when it was retired.
	Panicked,
}

/// Emits a limiter lifecycle event (when tracing is enabled).
pub fn trace_limiter_event(event: LimiterEvent) {
	#[cfg(feature = "tracing")]
	{
		match event {
			LimiterEvent::Started { rate, interval } => tracing::debug!(
				rate,
				interval_ms = interval.as_millis() as u64,
				"reset loop started"
			),
			LimiterEvent::Stopped => tracing::debug!("reset loop stopped"),
			LimiterEvent::Panicked =>
				tracing::error!("reset loop panicked; rate limiting was degraded until retirement"),
		}
	}

	#[cfg(not(feature = "tracing"))]
	{
		let _ = event;
	}
}

pub(super) fn trace_window_reset(released: usize) {
	#[cfg(feature = "tracing")]
	{
		tracing::trace!(released, "fixed window reset");
	}

	#[cfg(not(feature = "tracing"))]
	{
		let _ = released;
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn limiter_events_noop_without_tracing() {
		trace_limiter_event(LimiterEvent::Started { rate: 1, interval: StdDuration::from_secs(1) });
		trace_limiter_event(LimiterEvent::Panicked);
	}

	#[tokio::test]
	async fn instrument_wraps_future() {
		let span = OperationSpan::new(OperationKind::TokenRefresh, "instrument_wraps_future");
		let value = span.instrument(async { 42 }).await;

		assert_eq!(value, 42);
	}
}
