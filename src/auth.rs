//! Credential material: redacted secrets, client credentials, and the cached app token.

pub mod secret;
pub mod token;

pub use secret::*;
pub use token::*;

// self
use crate::_prelude::*;

/// Long-lived app credentials traded for bearer tokens.
#[derive(Clone)]
pub struct ClientCredentials {
	/// App `client_id`.
	pub client_id: String,
	/// App `client_secret`; never logged.
	pub client_secret: Secret,
}
impl ClientCredentials {
	/// Pairs a client identifier with its secret.
	pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
		Self { client_id: client_id.into(), client_secret: Secret::new(client_secret) }
	}
}
impl Debug for ClientCredentials {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ClientCredentials")
			.field("client_id", &self.client_id)
			.field("client_secret", &self.client_secret)
			.finish()
	}
}
