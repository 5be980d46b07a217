//! Optional observability helpers for endpoint calls and the rate limiter.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to emit structured spans named `easemob_push.request` with the `operation`
//!   and `stage` (call site) fields, plus limiter lifecycle events.
//! - Enable `metrics` to increment the `easemob_push_request_total` counter for every
//!   attempt/success/failure, labeled by `operation` + `outcome`, and the
//!   `easemob_push_window_reset_total` counter on every limiter reset.

mod metrics;
mod tracing;

pub use self::metrics::*;
pub use self::tracing::*;

// self
use crate::_prelude::*;

/// Endpoint operations observed by the client.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OperationKind {
	/// Credential exchange against the token endpoint.
	TokenRefresh,
	/// Synchronous single-target push.
	PushSync,
	/// Asynchronous batch push.
	PushSingle,
}
impl OperationKind {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			OperationKind::TokenRefresh => "token_refresh",
			OperationKind::PushSync => "push_sync",
			OperationKind::PushSingle => "push_single",
		}
	}
}
impl Display for OperationKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Outcome {
	/// Entry to an endpoint helper.
	Attempt,
	/// Successful completion.
	Success,
	/// Failure propagated back to the caller.
	Failure,
}
impl Outcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			Outcome::Attempt => "attempt",
			Outcome::Success => "success",
			Outcome::Failure => "failure",
		}
	}
}
impl Display for Outcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Runs `fut` inside an operation span and records attempt + outcome around it.
pub(crate) async fn observe<T, Fut>(kind: OperationKind, stage: &'static str, fut: Fut) -> Result<T>
where
	Fut: Future<Output = Result<T>>,
{
	let span = OperationSpan::new(kind, stage);

	record_outcome(kind, Outcome::Attempt);

	let result = span.instrument(fut).await;

	match &result {
		Ok(_) => record_outcome(kind, Outcome::Success),
		Err(_) => record_outcome(kind, Outcome::Failure),
	}

	result
}
