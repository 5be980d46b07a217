//! Transport primitives for vendor API calls.
//!
//! The module exposes [`PushHttpClient`], the client's only dependency on an HTTP stack, and
//! [`RequestHandle`], the per-request clone of the shared transport template that the client
//! hands out after admission. Handles own their headers, so attaching a bearer token never races
//! with concurrent requests or with a timeout reconfiguration that swaps the template.

// self
use crate::{
	_prelude::*,
	error::{ConfigError, TransportError},
	obs::OperationKind,
};

/// Boxed future returned by [`PushHttpClient::post`].
pub type TransportFuture<'a, E> = Pin<Box<dyn Future<Output = Result<HttpResponse, E>> + 'a + Send>>;

/// Abstraction over HTTP transports able to POST JSON to the vendor API.
///
/// Implementations are cheap to clone (the client clones its template once per request) and must
/// be `Send + Sync + 'static` so handles can hop executors. The timeout is part of the transport
/// configuration: [`PushHttpClient::with_timeout`] returns a rebuilt template and leaves `self`
/// untouched so in-flight handles keep their original settings.
pub trait PushHttpClient
where
	Self: 'static + Clone + Send + Sync,
{
	/// Concrete error emitted by the underlying transport.
	type TransportError: 'static + Send + Sync + StdError;

	/// Sends a POST request and resolves with the raw status + body.
	fn post(&self, request: HttpRequest) -> TransportFuture<'_, Self::TransportError>;

	/// Timeout applied to every request, if any.
	fn timeout(&self) -> Option<StdDuration>;

	/// Returns a copy of this transport rebuilt with the provided timeout.
	fn with_timeout(&self, timeout: StdDuration) -> Result<Self, ConfigError>;

	/// Classifies a transport failure; defaults to [`TransportError::Network`].
	fn map_transport_error(&self, error: Self::TransportError) -> TransportError {
		TransportError::network(error)
	}
}

/// Outbound request handed to a [`PushHttpClient`].
#[derive(Clone, Debug)]
pub struct HttpRequest {
	/// Absolute endpoint URL.
	pub url: Url,
	/// Header name/value pairs; names are compared case-sensitively as given.
	pub headers: BTreeMap<String, String>,
	/// Encoded request body.
	pub body: Vec<u8>,
}

/// Raw response returned by a [`PushHttpClient`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HttpResponse {
	/// HTTP status code.
	pub status: u16,
	/// Response body bytes.
	pub body: Vec<u8>,
}
impl HttpResponse {
	/// Returns `true` for 2xx statuses.
	pub fn is_success(&self) -> bool {
		(200..300).contains(&self.status)
	}

	/// Body decoded as UTF-8, replacing invalid sequences.
	pub fn text(&self) -> String {
		String::from_utf8_lossy(&self.body).into_owned()
	}

	/// Deserializes the body, failing with [`Error::UnexpectedStatus`] on non-2xx statuses and
	/// [`Error::ResponseParse`] on malformed JSON or trailing input after the document.
	pub fn json<T>(&self, operation: OperationKind) -> Result<T>
	where
		T: for<'de> Deserialize<'de>,
	{
		if !self.is_success() {
			return Err(Error::UnexpectedStatus { operation, status: self.status, body: self.text() });
		}

		let mut track = serde_path_to_error::Track::new();
		let deserializer = &mut serde_json::Deserializer::from_slice(&self.body);
		let parsed =
			T::deserialize(serde_path_to_error::Deserializer::new(&mut *deserializer, &mut track))
				.and_then(|value| deserializer.end().map(|()| value));

		parsed.map_err(|e| Error::ResponseParse {
			operation,
			status: self.status,
			source: serde_path_to_error::Error::new(track.path(), e),
		})
	}
}

/// Ready-to-use transport handle returned by the client after admission.
///
/// The handle is a clone of the client's transport template plus its own headers; dropping it
/// releases nothing, since admission is accounted by the fixed window rather than per request.
#[derive(Clone)]
pub struct RequestHandle<C>
where
	C: PushHttpClient,
{
	http_client: C,
	headers: BTreeMap<String, String>,
}
impl<C> RequestHandle<C>
where
	C: PushHttpClient,
{
	/// Header carrying the bearer token on authorized handles.
	pub const AUTHORIZATION: &'static str = "Authorization";

	pub(crate) fn new(http_client: C) -> Self {
		let mut headers = BTreeMap::new();

		headers.insert("Accept".into(), "application/json".into());
		headers.insert("Content-Type".into(), "application/json".into());

		Self { http_client, headers }
	}

	pub(crate) fn with_bearer(mut self, token: &str) -> Self {
		self.headers.insert(Self::AUTHORIZATION.into(), format!("Bearer {token}"));

		self
	}

	/// Sets or replaces a header on this handle only.
	pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.headers.insert(name.into(), value.into());

		self
	}

	/// Headers that will be sent with every request issued through this handle.
	pub fn headers(&self) -> &BTreeMap<String, String> {
		&self.headers
	}

	/// Returns `true` when a bearer token is attached.
	pub fn is_authorized(&self) -> bool {
		self.headers.contains_key(Self::AUTHORIZATION)
	}

	/// Timeout configured on the cloned transport template.
	pub fn timeout(&self) -> Option<StdDuration> {
		self.http_client.timeout()
	}

	/// Underlying transport clone.
	pub fn http_client(&self) -> &C {
		&self.http_client
	}

	/// Serializes `body` as JSON and POSTs it to `url`, racing the call against `cancel`.
	pub async fn post_json<B>(
		&self,
		operation: OperationKind,
		url: Url,
		body: &B,
		cancel: &CancellationToken,
	) -> Result<HttpResponse>
	where
		B: ?Sized + Serialize,
	{
		let body = serde_json::to_vec(body).map_err(ConfigError::from)?;
		let request = HttpRequest { url, headers: self.headers.clone(), body };

		tokio::select! {
			biased;
			_ = cancel.cancelled() => Err(Error::Cancelled),
			response = self.http_client.post(request) => response.map_err(|e| Error::Transport {
				operation,
				source: self.http_client.map_transport_error(e),
			}),
		}
	}
}
impl<C> Debug for RequestHandle<C>
where
	C: PushHttpClient,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		let header_names = self.headers.keys().collect::<Vec<_>>();

		f.debug_struct("RequestHandle")
			.field("headers", &header_names)
			.field("timeout", &self.timeout())
			.finish()
	}
}

/// Factory producing the reqwest builder that [`ReqwestHttpClient`] rebuilds from.
#[cfg(feature = "reqwest")]
pub type ReqwestBuilderFactory = Arc<dyn Fn() -> reqwest::ClientBuilder + Send + Sync>;

/// Reqwest-backed [`PushHttpClient`].
///
/// The client keeps the factory it was built from so [`PushHttpClient::with_timeout`] can rebuild
/// an equivalent client with a new timeout instead of discarding caller customizations.
#[cfg(feature = "reqwest")]
#[derive(Clone)]
pub struct ReqwestHttpClient {
	client: ReqwestClient,
	factory: ReqwestBuilderFactory,
	timeout: Option<StdDuration>,
}
#[cfg(feature = "reqwest")]
impl ReqwestHttpClient {
	/// Builds a client from `factory` without a timeout.
	pub fn from_factory<F>(factory: F) -> Result<Self, ConfigError>
	where
		F: 'static + Fn() -> reqwest::ClientBuilder + Send + Sync,
	{
		let factory: ReqwestBuilderFactory = Arc::new(factory);
		let client = factory().build()?;

		Ok(Self { client, factory, timeout: None })
	}

	/// Builds a default reqwest client without a timeout.
	pub fn new() -> Result<Self, ConfigError> {
		Self::from_factory(ReqwestClient::builder)
	}
}
#[cfg(feature = "reqwest")]
impl AsRef<ReqwestClient> for ReqwestHttpClient {
	fn as_ref(&self) -> &ReqwestClient {
		&self.client
	}
}
#[cfg(feature = "reqwest")]
impl Debug for ReqwestHttpClient {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ReqwestHttpClient").field("timeout", &self.timeout).finish()
	}
}
#[cfg(feature = "reqwest")]
impl PushHttpClient for ReqwestHttpClient {
	type TransportError = ReqwestError;

	fn post(&self, request: HttpRequest) -> TransportFuture<'_, Self::TransportError> {
		let client = self.client.clone();

		Box::pin(async move {
			let mut builder = client.post(request.url);

			for (name, value) in &request.headers {
				builder = builder.header(name.as_str(), value.as_str());
			}

			let response = builder.body(request.body).send().await?;
			let status = response.status().as_u16();
			let body = response.bytes().await?.to_vec();

			Ok(HttpResponse { status, body })
		})
	}

	fn timeout(&self) -> Option<StdDuration> {
		self.timeout
	}

	fn with_timeout(&self, timeout: StdDuration) -> Result<Self, ConfigError> {
		let client = (self.factory)().timeout(timeout).build()?;

		Ok(Self { client, factory: self.factory.clone(), timeout: Some(timeout) })
	}

	fn map_transport_error(&self, error: Self::TransportError) -> TransportError {
		TransportError::from(error)
	}
}
