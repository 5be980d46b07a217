//! Client-level error types shared by the limiter, token cache, and push endpoints.

// self
use crate::{_prelude::*, obs::OperationKind};

/// Client-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical client error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// The caller's cancellation token fired before the operation completed.
	#[error("Operation was cancelled before it completed.")]
	Cancelled,
	/// The client has been shut down; no further admissions are granted.
	#[error("Client has been shut down.")]
	Closed,

	/// Transport failure (DNS, TCP, TLS, timeout).
	#[error("Transport failure during {operation}.")]
	Transport {
		/// Endpoint call that failed.
		operation: OperationKind,
		/// Underlying transport failure.
		#[source]
		source: TransportError,
	},
	/// Endpoint answered with a non-success HTTP status.
	#[error("The {operation} endpoint returned HTTP {status}: {body}.")]
	UnexpectedStatus {
		/// Endpoint call that failed.
		operation: OperationKind,
		/// HTTP status code.
		status: u16,
		/// Response body text, lossily decoded.
		body: String,
	},
	/// Endpoint responded with JSON that could not be parsed.
	#[error("The {operation} endpoint returned malformed JSON.")]
	ResponseParse {
		/// Endpoint call that failed.
		operation: OperationKind,
		/// HTTP status code of the response.
		status: u16,
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
	/// Credential exchange succeeded syntactically but issued no token.
	#[error("Token endpoint returned an empty access token.")]
	EmptyAccessToken,
	/// Vendor reported a non-successful push status.
	#[error("The {operation} endpoint reported push status {status}.")]
	PushRejected {
		/// Endpoint call that failed.
		operation: OperationKind,
		/// Vendor status label (e.g. `FAIL`, `ERROR`).
		status: String,
	},
}
impl Error {
	/// Returns the endpoint operation attached to this error, if any.
	pub fn operation(&self) -> Option<OperationKind> {
		match self {
			Self::Transport { operation, .. }
			| Self::UnexpectedStatus { operation, .. }
			| Self::ResponseParse { operation, .. }
			| Self::PushRejected { operation, .. } => Some(*operation),
			Self::EmptyAccessToken => Some(OperationKind::TokenRefresh),
			Self::Config(_) | Self::Cancelled | Self::Closed => None,
		}
	}
}

/// Configuration and validation failures raised by the client.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// A required identifier was empty or whitespace.
	#[error("Required parameter `{name}` is empty.")]
	MissingParameter {
		/// Parameter label.
		name: &'static str,
	},
	/// Base address is neither a bare host nor an http(s) URL.
	#[error("Base address `{address}` is invalid.")]
	InvalidBaseAddress {
		/// Address as supplied by the caller.
		address: String,
		/// Underlying parsing failure, when the address failed to parse.
		#[source]
		source: Option<url::ParseError>,
	},
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// No tokio runtime was available to host the reset loop.
	#[error("A tokio runtime is required to start the rate limiter.")]
	MissingRuntime,
	/// Request body could not be serialized.
	#[error("Request body could not be encoded as JSON.")]
	RequestEncode(#[from] serde_json::Error),
	/// Batch push exceeded the vendor limit.
	#[error("Batch push accepts at most {max} targets, got {count}.")]
	TooManyTargets {
		/// Number of supplied targets.
		count: usize,
		/// Vendor maximum.
		max: usize,
	},
	/// Push strategy code is outside the vendor's range.
	#[error("Push strategy {0} is not supported.")]
	InvalidStrategy(u8),
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Transport-level failures (network, IO, timeout).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the endpoint.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// The configured client timeout elapsed.
	#[error("Request timed out while calling the endpoint.")]
	Timeout {
		/// Transport-specific timeout error.
		#[source]
		source: BoxError,
	},
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}

	/// Wraps a transport-specific timeout error.
	pub fn timeout(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Timeout { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		if e.is_timeout() { Self::timeout(e) } else { Self::network(e) }
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn unexpected_status_mentions_status_and_body() {
		let err = Error::UnexpectedStatus {
			operation: OperationKind::TokenRefresh,
			status: 401,
			body: "{\"error\":\"invalid_client\"}".into(),
		};
		let rendered = err.to_string();

		assert!(rendered.contains("401"));
		assert!(rendered.contains("invalid_client"));
		assert!(rendered.contains("token_refresh"));
		assert_eq!(err.operation(), Some(OperationKind::TokenRefresh));
	}

	#[test]
	fn lifecycle_errors_carry_no_operation() {
		assert_eq!(Error::Cancelled.operation(), None);
		assert_eq!(Error::Closed.operation(), None);
	}
}
