#![allow(dead_code)]

// std
use std::{
	io::Error as IoError,
	sync::{
		Arc,
		atomic::{AtomicUsize, Ordering},
	},
	time::Duration as StdDuration,
};
// crates.io
use httpmock::{Mock, prelude::*};
// self
use easemob_push::{
	ClientConfig, LimiterConfig, PushClient, ReqwestPushClient,
	error::ConfigError,
	http::{HttpRequest, HttpResponse, PushHttpClient, ReqwestHttpClient, TransportFuture},
	reqwest::Client as ReqwestClient,
};

pub const ORG_NAME: &str = "1112220101";
pub const APP_NAME: &str = "demo";
pub const CLIENT_ID: &str = "YXA6-client";
pub const CLIENT_SECRET: &str = "YXA6-secret";

/// Path of the credential exchange for the test app.
pub fn app_path(suffix: &str) -> String {
	format!("/{ORG_NAME}/{APP_NAME}/{suffix}")
}

/// Configuration pointing at `base_address` with a window wide enough to never throttle a test.
pub fn test_config(base_address: impl Into<String>) -> ClientConfig {
	ClientConfig::new(base_address, ORG_NAME, APP_NAME, CLIENT_ID, CLIENT_SECRET)
		.with_limiter(LimiterConfig::new(100, StdDuration::from_secs(1)))
}

/// Reqwest transport that accepts the self-signed certificates served by `httpmock`.
///
/// Built from a factory so timeout reconfiguration keeps the relaxed verification.
pub fn test_reqwest_http_client() -> ReqwestHttpClient {
	ReqwestHttpClient::from_factory(|| {
		ReqwestClient::builder()
			.danger_accept_invalid_certs(true)
			.danger_accept_invalid_hostnames(true)
	})
	.expect("Insecure reqwest client for tests should build.")
}

pub fn build_reqwest_client(server: &MockServer) -> ReqwestPushClient {
	build_reqwest_client_with(server, |config| config)
}

pub fn build_reqwest_client_with(
	server: &MockServer,
	customize: impl FnOnce(ClientConfig) -> ClientConfig,
) -> ReqwestPushClient {
	ReqwestPushClient::with_http_client(
		customize(test_config(server.base_url())),
		test_reqwest_http_client(),
	)
	.expect("Reqwest push client should build for the mock server.")
}

/// Registers a token endpoint answering every exchange with `access_token`.
pub async fn mock_token<'a>(server: &'a MockServer, access_token: &str, expires_in: u64) -> Mock<'a> {
	let body = serde_json::json!({
		"application": "8be024f0-e978-11e8-b697-5d598d5f8402",
		"access_token": access_token,
		"expires_in": expires_in,
	});

	server
		.mock_async(|when, then| {
			when.method(POST).path(app_path("token"));
			then.status(200).header("content-type", "application/json").json_body(body.clone());
		})
		.await
}

/// Offline transport answering every POST with a permanent token and counting calls.
#[derive(Clone, Debug, Default)]
pub struct StaticHttpClient {
	timeout: Option<StdDuration>,
	calls: Arc<AtomicUsize>,
}
impl StaticHttpClient {
	pub fn calls(&self) -> usize {
		self.calls.load(Ordering::SeqCst)
	}
}
impl PushHttpClient for StaticHttpClient {
	type TransportError = IoError;

	fn post(&self, _request: HttpRequest) -> TransportFuture<'_, Self::TransportError> {
		self.calls.fetch_add(1, Ordering::SeqCst);

		Box::pin(async move {
			Ok(HttpResponse {
				status: 200,
				body: br#"{"access_token":"YWMt-static","expires_in":0}"#.to_vec(),
			})
		})
	}

	fn timeout(&self) -> Option<StdDuration> {
		self.timeout
	}

	fn with_timeout(&self, timeout: StdDuration) -> Result<Self, ConfigError> {
		Ok(Self { timeout: Some(timeout), calls: self.calls.clone() })
	}
}

pub fn build_static_client(limiter: LimiterConfig) -> (PushClient<StaticHttpClient>, StaticHttpClient) {
	let http_client = StaticHttpClient::default();
	let client = PushClient::with_http_client(
		test_config("a1.easemob.com").with_limiter(limiter),
		http_client.clone(),
	)
	.expect("Offline push client should build.");

	(client, http_client)
}
