//! Token cache: validity checks and the credential exchange that refreshes it.
//!
//! The validity check runs under shared access. A refresh releases the lock, performs the
//! exchange over the network, and re-acquires exclusive access only to install the result.
//! Concurrent callers that all observe an expired token therefore each run their own exchange;
//! the last successful one wins. A failed exchange leaves the cache untouched.

// self
use crate::{
	_prelude::*,
	auth::{self, CachedToken, Secret, TokenStatus},
	client::PushClient,
	http::PushHttpClient,
	obs::{self, OperationKind},
};

/// Body of the client-credentials exchange.
#[derive(Serialize)]
struct TokenRequest {
	grant_type: &'static str,
	client_id: String,
	client_secret: String,
	ttl: u64,
}

/// Successful response of the credential exchange.
#[derive(Clone, Debug, Deserialize)]
pub struct TokenGrant {
	/// UUID of the app the token was issued for.
	#[serde(default)]
	pub application: String,
	/// Issued bearer token.
	pub access_token: Secret,
	/// Lifetime in seconds; zero means the token never expires.
	#[serde(default)]
	pub expires_in: u64,
}

impl<C> PushClient<C>
where
	C: PushHttpClient,
{
	/// Returns immediately when the cached token is non-empty and unexpired; otherwise performs
	/// one credential exchange.
	pub async fn ensure_valid(&self, cancel: &CancellationToken) -> Result<()> {
		{
			let state = self.read_state(cancel).await?;

			if auth::status_of(state.token.as_ref(), OffsetDateTime::now_utc())
				== TokenStatus::Active
			{
				return Ok(());
			}
		}

		self.refresh_token(cancel).await
	}

	/// Unconditionally exchanges the app credentials for a new bearer token.
	///
	/// The exchange itself waits for a permit like any other request.
	pub async fn refresh_token(&self, cancel: &CancellationToken) -> Result<()> {
		obs::observe(OperationKind::TokenRefresh, "refresh_token", async move {
			self.refresh_metrics.record_start();

			let result = self.exchange_credentials(cancel).await;

			self.refresh_metrics.record_finish(&result);

			result
		})
		.await
	}

	/// Cached token string, empty when no exchange has succeeded yet (shared access).
	pub async fn current_token(&self) -> String {
		self.state
			.read()
			.await
			.token
			.as_ref()
			.map(|token| token.access_token.expose().to_owned())
			.unwrap_or_default()
	}

	/// Lifecycle status of the cached token right now (shared access).
	pub async fn token_status(&self) -> TokenStatus {
		auth::status_of(self.state.read().await.token.as_ref(), OffsetDateTime::now_utc())
	}

	/// Snapshot of the cached token, if any (shared access).
	pub async fn cached_token(&self) -> Option<CachedToken> {
		self.state.read().await.token.clone()
	}

	async fn exchange_credentials(&self, cancel: &CancellationToken) -> Result<()> {
		const OPERATION: OperationKind = OperationKind::TokenRefresh;

		let handle = self.acquire_unauthorized(cancel).await?;
		let (url, body) = {
			let state = self.read_state(cancel).await?;
			let body = TokenRequest {
				grant_type: "client_credentials",
				client_id: state.credentials.client_id.clone(),
				client_secret: state.credentials.client_secret.expose().to_owned(),
				ttl: state.token_ttl.as_secs(),
			};

			(state.endpoint(&["token"]), body)
		};
		let response = handle.post_json(OPERATION, url, &body, cancel).await?;
		let grant = response.json::<TokenGrant>(OPERATION)?;

		if grant.access_token.is_blank() {
			return Err(Error::EmptyAccessToken);
		}

		let token = CachedToken::new(
			grant.access_token.expose(),
			OffsetDateTime::now_utc(),
			grant.expires_in,
		)
		.with_application(grant.application);

		self.state.write().await.token = Some(token);

		Ok(())
	}
}
