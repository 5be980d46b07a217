//! Demonstrates a synchronous push through the default reqwest transport against a local mock of
//! the vendor API: the first call exchanges the app credentials, the second reuses the token.

// std
use std::time::Duration;
// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
// self
use easemob_push::{
	CancellationToken, ClientConfig, LimiterConfig, ReqwestPushClient,
	http::ReqwestHttpClient,
	push::{PushMessage, PushStrategy},
	reqwest::Client,
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let server = MockServer::start_async().await;
	let token_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/1112220101/demo/token");
			then.status(200).header("content-type", "application/json").body(
				"{\"application\":\"8be024f0-e978-11e8-b697-5d598d5f8402\",\"access_token\":\"YWMt-demo\",\"expires_in\":0}",
			);
		})
		.await;
	let push_mock = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/1112220101/demo/push/sync/user-1")
				.header("authorization", "Bearer YWMt-demo");
			then.status(200).header("content-type", "application/json").body(
				"{\"timestamp\":1700000000000,\"data\":[{\"pushStatus\":\"SUCCESS\",\"data\":{\"result\":\"ok\",\"msg_id\":[\"m-1\"]}}],\"duration\":4}",
			);
		})
		.await;
	let config =
		ClientConfig::new(server.base_url(), "1112220101", "demo", "YXA6-client", "YXA6-secret")
			.with_limiter(LimiterConfig::new(10, Duration::from_secs(1)))
			.with_timeout(Duration::from_secs(5));
	// The mock server presents a self-signed certificate.
	let http_client = ReqwestHttpClient::from_factory(|| {
		Client::builder().danger_accept_invalid_certs(true).danger_accept_invalid_hostnames(true)
	})?;
	let client = ReqwestPushClient::with_http_client(config, http_client)?;
	let cancel = CancellationToken::new();
	let message = PushMessage::new("Order shipped", "Your parcel is on the way.");

	for _ in 0..2 {
		let response = client.push_sync(PushStrategy::new(2)?, "user-1", &message, &cancel).await?;

		println!("Push status: {}.", response.data[0].push_status);
	}

	println!("Token exchanges: {}.", client.refresh_metrics().attempts());

	client.shutdown().await?;
	token_mock.assert_async().await;
	push_mock.assert_calls_async(2).await;

	Ok(())
}
