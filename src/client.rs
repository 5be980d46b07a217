//! Shared push client: one guarded state object, the fixed-window limiter, and the factory that
//! turns an admission plus a valid token into a ready-to-use [`RequestHandle`].
//!
//! # Access modes
//!
//! All mutable client state lives in a single `ClientState` behind one async reader/writer
//! lock. Each public operation documents the mode it takes:
//!
//! - shared: [`PushClient::endpoint`], [`PushClient::limiter_config`],
//!   [`PushClient::client_timeout`], [`PushClient::current_token`], the validity check inside
//!   [`PushClient::ensure_valid`], and cloning the transport template in the `acquire_*` calls;
//! - exclusive: [`PushClient::set_limiter`], [`PushClient::set_client_timeout`],
//!   [`PushClient::set_token_ttl`], [`PushClient::shutdown`], and committing a refreshed token.
//!
//! Neither mode is ever held while waiting for a permit or for the network.

mod metrics;
mod token;

pub use self::metrics::{RefreshMetrics, RefreshSnapshot};
pub use self::token::TokenGrant;

// crates.io
use async_lock::RwLockReadGuard;
// self
use crate::{
	_prelude::*,
	auth::{CachedToken, ClientCredentials},
	config::ClientConfig,
	http::{PushHttpClient, RequestHandle},
	limiter::{FixedWindowLimiter, LimiterConfig},
};
#[cfg(feature = "reqwest")] use crate::http::ReqwestHttpClient;

#[cfg(feature = "reqwest")]
/// Client specialized for the crate's default reqwest transport.
pub type ReqwestPushClient = PushClient<ReqwestHttpClient>;

/// State shared by every clone of a [`PushClient`].
struct ClientState<C>
where
	C: PushHttpClient,
{
	http_client: C,
	base_url: Url,
	org_name: String,
	app_name: String,
	credentials: ClientCredentials,
	token_ttl: StdDuration,
	token: Option<CachedToken>,
	limiter: FixedWindowLimiter,
}
impl<C> ClientState<C>
where
	C: PushHttpClient,
{
	fn endpoint(&self, segments: &[&str]) -> Url {
		let mut url = self.base_url.clone();

		// Validated at construction: the base always has a host and a hierarchical path.
		if let Ok(mut path) = url.path_segments_mut() {
			path.pop_if_empty()
				.extend([self.org_name.as_str(), self.app_name.as_str()])
				.extend(segments.iter().filter(|segment| !segment.is_empty()));
		}

		url
	}
}

/// Concurrency-safe client for the vendor push API.
///
/// Clones share one state object, one limiter, and one token cache. Construct it inside a tokio
/// runtime (the limiter's reset loop is spawned immediately) and call [`PushClient::shutdown`]
/// once when done; dropping the last clone also stops the reset loop.
pub struct PushClient<C>
where
	C: PushHttpClient,
{
	state: Arc<AsyncRwLock<ClientState<C>>>,
	refresh_metrics: Arc<RefreshMetrics>,
}
impl<C> PushClient<C>
where
	C: PushHttpClient,
{
	/// Validates `config`, applies its timeout to `http_client`, and starts the reset loop.
	pub fn with_http_client(config: ClientConfig, http_client: C) -> Result<Self> {
		let base_url = config.validate()?;
		let http_client = match config.timeout {
			Some(timeout) => http_client.with_timeout(timeout)?,
			None => http_client,
		};
		let limiter = FixedWindowLimiter::start(config.limiter)?;
		let state = ClientState {
			http_client,
			base_url,
			org_name: config.org_name.trim().to_owned(),
			app_name: config.app_name.trim().to_owned(),
			credentials: config.credentials,
			token_ttl: config.token_ttl,
			token: None,
			limiter,
		};

		Ok(Self {
			state: Arc::new(AsyncRwLock::new(state)),
			refresh_metrics: Default::default(),
		})
	}

	/// Counters describing credential exchanges performed by this client.
	pub fn refresh_metrics(&self) -> &RefreshMetrics {
		&self.refresh_metrics
	}

	/// Stops the reset loop and closes the permit pool (exclusive access).
	///
	/// Waiters parked on the pool fail with [`Error::Closed`], as does every later `acquire_*`
	/// call and any second shutdown.
	pub async fn shutdown(&self) -> Result<()> {
		let mut state = self.state.write().await;

		state.limiter.shutdown().await
	}

	/// Replaces the limiter with `rate` permits per `interval` (exclusive access).
	///
	/// The retiring reset loop is fully stopped before the new pool is installed. Callers waiting
	/// on the old pool transparently move to the new one.
	pub async fn set_limiter(&self, rate: u32, interval: StdDuration) -> Result<()> {
		let mut state = self.state.write().await;

		state.limiter.reconfigure(LimiterConfig::new(rate, interval)).await
	}

	/// Rebuilds the transport template with `timeout` (exclusive access).
	///
	/// Handles cloned earlier keep their previous timeout.
	pub async fn set_client_timeout(&self, timeout: StdDuration) -> Result<()> {
		let mut state = self.state.write().await;

		state.http_client = state.http_client.with_timeout(timeout)?;

		Ok(())
	}

	/// Changes the TTL requested by future credential exchanges (exclusive access).
	pub async fn set_token_ttl(&self, ttl: StdDuration) {
		self.state.write().await.token_ttl = ttl;
	}

	/// Active limiter configuration (shared access).
	pub async fn limiter_config(&self) -> LimiterConfig {
		self.state.read().await.limiter.config()
	}

	/// Timeout configured on the transport template (shared access).
	pub async fn client_timeout(&self) -> Option<StdDuration> {
		self.state.read().await.http_client.timeout()
	}

	/// Joins `{base}/{org}/{app}/{segments...}` (shared access).
	///
	/// Each segment is percent-encoded as a single path segment; empty segments are skipped.
	pub async fn endpoint(&self, segments: &[&str]) -> Url {
		self.state.read().await.endpoint(segments)
	}

	/// Waits for admission, then returns a plain transport handle without credentials.
	///
	/// Used by the credential exchange itself, which must not require a token.
	pub async fn acquire_unauthorized(
		&self,
		cancel: &CancellationToken,
	) -> Result<RequestHandle<C>> {
		self.admit(cancel).await?;

		// The permit is spent; cancellation no longer applies.
		let state = self.state.read().await;

		Ok(RequestHandle::new(state.http_client.clone()))
	}

	/// Waits for admission, makes sure the cached token is valid (refreshing it if needed), then
	/// returns a transport handle carrying `Authorization: Bearer <token>`.
	///
	/// A refresh performed here goes through [`PushClient::acquire_unauthorized`] and therefore
	/// consumes a second permit from the same window.
	pub async fn acquire_authorized(&self, cancel: &CancellationToken) -> Result<RequestHandle<C>> {
		self.admit(cancel).await?;
		self.ensure_valid(cancel).await?;

		let state = self.state.read().await;
		let token = state.token.as_ref().ok_or(Error::EmptyAccessToken)?;

		Ok(RequestHandle::new(state.http_client.clone()).with_bearer(token.access_token.expose()))
	}

	/// Blocks until the active pool admits the caller or `cancel` fires.
	async fn admit(&self, cancel: &CancellationToken) -> Result<()> {
		loop {
			let pool = {
				let state = self.read_state(cancel).await?;

				if state.limiter.is_shut_down() {
					return Err(Error::Closed);
				}

				state.limiter.pool()
			};

			match pool.acquire(cancel).await {
				// Pool retired by `set_limiter`; the next read waits for the swap to finish.
				Err(Error::Closed) => continue,
				result => return result,
			}
		}
	}

	async fn read_state(
		&self,
		cancel: &CancellationToken,
	) -> Result<RwLockReadGuard<'_, ClientState<C>>> {
		tokio::select! {
			biased;
			_ = cancel.cancelled() => Err(Error::Cancelled),
			state = self.state.read() => Ok(state),
		}
	}
}
#[cfg(feature = "reqwest")]
impl PushClient<ReqwestHttpClient> {
	/// Creates a client for `{base_address}/{org_name}/{app_name}` with default settings and the
	/// crate's reqwest transport.
	pub fn new(
		base_address: impl Into<String>,
		org_name: impl Into<String>,
		app_name: impl Into<String>,
		client_id: impl Into<String>,
		client_secret: impl Into<String>,
	) -> Result<Self> {
		Self::from_config(ClientConfig::new(
			base_address,
			org_name,
			app_name,
			client_id,
			client_secret,
		))
	}

	/// Creates a client from a full configuration using the crate's reqwest transport.
	pub fn from_config(config: ClientConfig) -> Result<Self> {
		let http_client = ReqwestHttpClient::new()?;

		Self::with_http_client(config, http_client)
	}
}
impl<C> Clone for PushClient<C>
where
	C: PushHttpClient,
{
	fn clone(&self) -> Self {
		Self { state: self.state.clone(), refresh_metrics: self.refresh_metrics.clone() }
	}
}
impl<C> Debug for PushClient<C>
where
	C: PushHttpClient,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		let mut debug = f.debug_struct("PushClient");

		match self.state.try_read() {
			Some(state) => debug
				.field("base_url", &state.base_url.as_str())
				.field("org_name", &state.org_name)
				.field("app_name", &state.app_name)
				.field("client_id", &state.credentials.client_id)
				.field("limiter", &state.limiter.config())
				.field("token_cached", &state.token.is_some()),
			None => debug.field("state", &"<locked>"),
		};

		debug.field("refresh_metrics", &self.refresh_metrics).finish()
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::{
		error::{ConfigError, TransportError},
		http::{HttpRequest, HttpResponse, TransportFuture},
	};

	#[derive(Debug)]
	struct Offline;
	impl Display for Offline {
		fn fmt(&self, f: &mut Formatter) -> FmtResult {
			f.write_str("Offline.")
		}
	}
	impl StdError for Offline {}

	#[derive(Clone, Debug, Default)]
	struct OfflineHttpClient {
		timeout: Option<StdDuration>,
	}
	impl PushHttpClient for OfflineHttpClient {
		type TransportError = Offline;

		fn post(&self, _request: HttpRequest) -> TransportFuture<'_, Self::TransportError> {
			Box::pin(async { Err::<HttpResponse, _>(Offline) })
		}

		fn timeout(&self) -> Option<StdDuration> {
			self.timeout
		}

		fn with_timeout(&self, timeout: StdDuration) -> Result<Self, ConfigError> {
			Ok(Self { timeout: Some(timeout) })
		}
	}

	fn client(base: &str) -> PushClient<OfflineHttpClient> {
		let config = ClientConfig::new(base, "1112220101", "demo", "YXA6-client", "YXA6-secret")
			.with_limiter(LimiterConfig::new(10, StdDuration::from_secs(1)));

		PushClient::with_http_client(config, OfflineHttpClient::default())
			.expect("Client should build with valid configuration.")
	}

	#[tokio::test]
	async fn endpoint_joins_org_app_and_segments() {
		let client = client("a1.easemob.com");

		assert_eq!(
			client.endpoint(&["token"]).await.as_str(),
			"https://a1.easemob.com/1112220101/demo/token"
		);
		assert_eq!(
			client.endpoint(&["push", "sync", "user 1"]).await.as_str(),
			"https://a1.easemob.com/1112220101/demo/push/sync/user%201"
		);

		let nested = self::client("http://127.0.0.1:9000/gateway/");

		assert_eq!(
			nested.endpoint(&["push", "", "single"]).await.as_str(),
			"http://127.0.0.1:9000/gateway/1112220101/demo/push/single"
		);
	}

	#[tokio::test]
	async fn unauthorized_handles_carry_no_token() {
		let client = client("a1.easemob.com");
		let cancel = CancellationToken::new();
		let handle = client
			.acquire_unauthorized(&cancel)
			.await
			.expect("Admission should succeed below the rate.");

		assert!(!handle.is_authorized());
	}

	#[tokio::test(start_paused = true)]
	async fn admitted_caller_ignores_cancel_while_state_is_locked() {
		let config = ClientConfig::new("a1.easemob.com", "1112220101", "demo", "id", "secret")
			.with_limiter(LimiterConfig::new(1, StdDuration::from_secs(60)));
		let client = PushClient::with_http_client(config, OfflineHttpClient::default())
			.expect("Client should build with valid configuration.");

		client
			.acquire_unauthorized(&CancellationToken::new())
			.await
			.expect("First caller should fill the window.");

		let cancel = CancellationToken::new();
		let waiter = {
			let client = client.clone();
			let cancel = cancel.clone();

			tokio::spawn(async move { client.acquire_unauthorized(&cancel).await })
		};

		tokio::time::sleep(StdDuration::from_millis(10)).await;

		let guard = client.state.write().await;
		let pool = guard.limiter.pool();

		// Frees the slot so the parked waiter is admitted and then blocks on the state lock.
		pool.reset();

		for _ in 0..4 {
			tokio::task::yield_now().await;
		}

		cancel.cancel();

		for _ in 0..4 {
			tokio::task::yield_now().await;
		}

		drop(guard);

		let handle = waiter
			.await
			.expect("Waiter task should not panic.")
			.expect("An admitted caller should receive its handle.");

		assert!(!handle.is_authorized());
		assert_eq!(pool.occupancy(), 1);
	}

	#[tokio::test]
	async fn refresh_transport_failure_keeps_cache_empty() {
		let client = client("a1.easemob.com");
		let cancel = CancellationToken::new();
		let err = client
			.acquire_authorized(&cancel)
			.await
			.expect_err("Refresh against an offline transport should fail.");

		assert!(matches!(
			err,
			Error::Transport { source: TransportError::Network { .. }, .. }
		));
		assert_eq!(client.current_token().await, "");
		assert_eq!(client.refresh_metrics().attempts(), 1);
		assert_eq!(client.refresh_metrics().failures(), 1);
	}

	#[tokio::test]
	async fn timeout_reconfiguration_reaches_new_handles_only() {
		let client = client("a1.easemob.com");
		let cancel = CancellationToken::new();
		let before = client.acquire_unauthorized(&cancel).await.expect("Admission should succeed.");

		client
			.set_client_timeout(StdDuration::from_secs(5))
			.await
			.expect("Timeout reconfiguration should succeed.");

		let after = client.acquire_unauthorized(&cancel).await.expect("Admission should succeed.");

		assert_eq!(before.timeout(), None);
		assert_eq!(after.timeout(), Some(StdDuration::from_secs(5)));
		assert_eq!(client.client_timeout().await, Some(StdDuration::from_secs(5)));
	}

	#[tokio::test]
	async fn debug_output_hides_secret() {
		let client = client("a1.easemob.com");
		let rendered = format!("{client:?}");

		assert!(rendered.contains("YXA6-client"));
		assert!(!rendered.contains("YXA6-secret"));
	}

	#[test]
	fn construction_outside_runtime_fails() {
		let config = ClientConfig::new("a1.easemob.com", "org", "app", "id", "secret");
		let err = PushClient::with_http_client(config, OfflineHttpClient::default())
			.expect_err("The reset loop needs a runtime.");

		assert!(matches!(err, Error::Config(ConfigError::MissingRuntime)));
	}
}
