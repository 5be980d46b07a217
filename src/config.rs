//! Client configuration: vendor addressing, app credentials, limiter and transport settings.

// self
use crate::{_prelude::*, auth::ClientCredentials, error::ConfigError, limiter::LimiterConfig};

/// Everything needed to construct a [`PushClient`](crate::PushClient).
///
/// Only the five identifiers are required; the rest defaults to the vendor's documented budget of
/// one call per second, no client-side timeout, and permanent app tokens.
#[derive(Clone, Debug)]
pub struct ClientConfig {
	/// Bare host (`a1.easemob.com`, implies HTTPS) or a full `http(s)://` URL.
	pub base_address: String,
	/// Organization name assigned by the vendor.
	pub org_name: String,
	/// App name within the organization.
	pub app_name: String,
	/// App credentials exchanged for bearer tokens.
	pub credentials: ClientCredentials,
	/// Fixed-window limiter parameters.
	pub limiter: LimiterConfig,
	/// Per-request transport timeout.
	pub timeout: Option<StdDuration>,
	/// TTL requested from the token endpoint; zero asks for a token that never expires.
	pub token_ttl: StdDuration,
}
impl ClientConfig {
	/// Creates a configuration with default limiter, timeout, and token TTL.
	pub fn new(
		base_address: impl Into<String>,
		org_name: impl Into<String>,
		app_name: impl Into<String>,
		client_id: impl Into<String>,
		client_secret: impl Into<String>,
	) -> Self {
		Self {
			base_address: base_address.into(),
			org_name: org_name.into(),
			app_name: app_name.into(),
			credentials: ClientCredentials::new(client_id, client_secret),
			limiter: LimiterConfig::default(),
			timeout: None,
			token_ttl: StdDuration::ZERO,
		}
	}

	/// Overrides the limiter parameters.
	pub fn with_limiter(mut self, limiter: LimiterConfig) -> Self {
		self.limiter = limiter;

		self
	}

	/// Sets the transport timeout.
	pub fn with_timeout(mut self, timeout: StdDuration) -> Self {
		self.timeout = Some(timeout);

		self
	}

	/// Sets the TTL requested for new app tokens (whole seconds are sent).
	pub fn with_token_ttl(mut self, ttl: StdDuration) -> Self {
		self.token_ttl = ttl;

		self
	}

	/// Checks the required identifiers and resolves the base address into a URL.
	pub fn validate(&self) -> Result<Url, ConfigError> {
		for (name, value) in [
			("base_address", self.base_address.as_str()),
			("org_name", self.org_name.as_str()),
			("app_name", self.app_name.as_str()),
			("client_id", self.credentials.client_id.as_str()),
		] {
			if value.trim().is_empty() {
				return Err(ConfigError::MissingParameter { name });
			}
		}
		if self.credentials.client_secret.is_blank() {
			return Err(ConfigError::MissingParameter { name: "client_secret" });
		}

		parse_base_address(&self.base_address)
	}
}

fn parse_base_address(address: &str) -> Result<Url, ConfigError> {
	let address = address.trim();
	let invalid = |source| ConfigError::InvalidBaseAddress { address: address.to_owned(), source };
	let url = if address.contains("://") {
		Url::parse(address).map_err(|e| invalid(Some(e)))?
	} else {
		Url::parse(&format!("https://{address}")).map_err(|e| invalid(Some(e)))?
	};

	if !matches!(url.scheme(), "http" | "https") || url.cannot_be_a_base() || !url.has_host() {
		return Err(invalid(None));
	}

	Ok(url)
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn config(base: &str) -> ClientConfig {
		ClientConfig::new(base, "1112220101", "demo", "YXA6-client", "YXA6-secret")
	}

	#[test]
	fn bare_host_implies_https() {
		let url = config("a1.easemob.com").validate().expect("Bare hosts should validate.");

		assert_eq!(url.as_str(), "https://a1.easemob.com/");
	}

	#[test]
	fn full_urls_are_kept() {
		let url = config("http://127.0.0.1:8080/base").validate().expect("URLs should validate.");

		assert_eq!(url.scheme(), "http");
		assert_eq!(url.port(), Some(8080));
		assert_eq!(url.path(), "/base");
	}

	#[test]
	fn rejects_empty_identifiers() {
		let cases = [
			(ClientConfig::new("", "o", "a", "i", "s"), "base_address"),
			(ClientConfig::new("h", " ", "a", "i", "s"), "org_name"),
			(ClientConfig::new("h", "o", "", "i", "s"), "app_name"),
			(ClientConfig::new("h", "o", "a", "", "s"), "client_id"),
			(ClientConfig::new("h", "o", "a", "i", "\t"), "client_secret"),
		];

		for (config, expected) in cases {
			let err = config.validate().expect_err("Empty identifiers should be rejected.");

			assert!(
				matches!(err, ConfigError::MissingParameter { name } if name == expected),
				"Unexpected error for {expected}: {err:?}"
			);
		}
	}

	#[test]
	fn rejects_unsupported_schemes() {
		let err = config("ftp://a1.easemob.com").validate().expect_err("FTP should be rejected.");

		assert!(matches!(err, ConfigError::InvalidBaseAddress { source: None, .. }));
	}

	#[test]
	fn builders_override_defaults() {
		let config = config("a1.easemob.com")
			.with_limiter(LimiterConfig::new(20, StdDuration::from_secs(1)))
			.with_timeout(StdDuration::from_secs(5))
			.with_token_ttl(StdDuration::from_secs(3_600));

		assert_eq!(config.limiter, LimiterConfig::new(20, StdDuration::from_secs(1)));
		assert_eq!(config.timeout, Some(StdDuration::from_secs(5)));
		assert_eq!(config.token_ttl.as_secs(), 3_600);
		assert!(!format!("{config:?}").contains("YXA6-secret"));
	}
}
