//! Push endpoints consuming the client's authorized request factory.
//!
//! Both calls obtain an authorized [`RequestHandle`](crate::http::RequestHandle), post a JSON
//! body, and map vendor statuses into [`Error`] values. Wire names follow the vendor's camelCase.

// crates.io
use serde::Deserializer;
// self
use crate::{
	_prelude::*,
	client::PushClient,
	error::ConfigError,
	http::PushHttpClient,
	obs::{self, OperationKind},
};

/// Largest target list accepted by [`PushClient::push_single`].
pub const MAX_BATCH_TARGETS: usize = 100;

/// Vendor push strategy code (0 through 4) selecting how the vendor routes between its own
/// channel and third-party device channels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct PushStrategy(u8);
impl PushStrategy {
	/// Highest strategy code the vendor accepts.
	pub const MAX: u8 = 4;

	/// Validates a strategy code.
	pub fn new(code: u8) -> Result<Self, ConfigError> {
		if code > Self::MAX {
			return Err(ConfigError::InvalidStrategy(code));
		}

		Ok(Self(code))
	}

	/// Raw strategy code sent on the wire.
	pub const fn code(self) -> u8 {
		self.0
	}
}
impl TryFrom<u8> for PushStrategy {
	type Error = ConfigError;

	fn try_from(code: u8) -> Result<Self, Self::Error> {
		Self::new(code)
	}
}

/// Notification shown on the device.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PushMessage {
	/// Notification title (vendor limit: 32 single-byte characters).
	pub title: String,
	/// Notification body (vendor limit: 100 single-byte characters).
	pub content: String,
	/// Custom key/value extension payload.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub ext: Option<serde_json::Value>,
	/// Click and badge behaviour.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub config: Option<PushConfig>,
}
impl PushMessage {
	/// Creates a message with a title and body.
	pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
		Self { title: title.into(), content: content.into(), ext: None, config: None }
	}

	/// Attaches a custom extension payload.
	pub fn with_ext(mut self, ext: serde_json::Value) -> Self {
		self.ext = Some(ext);

		self
	}

	/// Attaches click/badge configuration.
	pub fn with_config(mut self, config: PushConfig) -> Self {
		self.config = Some(config);

		self
	}
}

/// Notification interaction settings.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PushConfig {
	/// Action triggered when the notification is tapped.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub click_action: Option<ClickAction>,
	/// App icon badge update (Android only).
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub badge: Option<Badge>,
}

/// Tap action; the vendor's iOS channel only honours `url`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClickAction {
	/// URL to open.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub url: Option<String>,
	/// In-app page to open.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub action: Option<String>,
	/// Package or activity path; the app's launcher page when omitted.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub activity: Option<String>,
}

/// Badge update applied when the notification arrives.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Badge {
	/// Amount added to the current badge.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub add_num: Option<i64>,
	/// Absolute badge value.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub set_num: Option<i64>,
	/// Entry activity (required by some vendors' launchers).
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub activity: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PushRequest<'a> {
	#[serde(skip_serializing_if = "Option::is_none")]
	targets: Option<&'a [String]>,
	strategy: PushStrategy,
	push_message: &'a PushMessage,
}

/// Envelope shared by push responses.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct PushResponse<T> {
	/// Server timestamp in Unix milliseconds.
	#[serde(default, deserialize_with = "null_as_default")]
	pub timestamp: i64,
	/// Per-target results.
	#[serde(default, deserialize_with = "null_as_default")]
	pub data: Vec<T>,
	/// Server-side processing time in milliseconds.
	#[serde(default, deserialize_with = "null_as_default")]
	pub duration: i64,
}

/// Per-target result of [`PushClient::push_sync`].
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct PushSyncData {
	/// `SUCCESS`, `FAIL`, or `ERROR`.
	#[serde(rename = "pushStatus")]
	pub push_status: String,
	/// Delivery details reported by the vendor.
	#[serde(default)]
	pub data: Option<PushSyncResult>,
}
impl PushSyncData {
	/// Returns `true` when the vendor reported `SUCCESS`.
	pub fn is_success(&self) -> bool {
		self.push_status == "SUCCESS"
	}
}

/// Delivery details of a synchronous push.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct PushSyncResult {
	/// Vendor result label.
	#[serde(default, deserialize_with = "null_as_default")]
	pub result: String,
	/// Message identifiers assigned by the delivery channel.
	#[serde(default, deserialize_with = "null_as_default")]
	pub msg_id: Vec<String>,
}

/// Per-target result of [`PushClient::push_single`].
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct PushSingleData {
	/// `ASYNC_SUCCESS` when the push was queued.
	#[serde(rename = "pushStatus")]
	pub push_status: String,
	/// Asynchronous outcome.
	#[serde(default, deserialize_with = "null_as_default")]
	pub data: String,
	/// Human-readable description.
	#[serde(default, deserialize_with = "null_as_default")]
	pub desc: String,
}
impl PushSingleData {
	/// Returns `true` when the vendor queued the push.
	pub fn is_success(&self) -> bool {
		self.push_status == "ASYNC_SUCCESS"
	}
}

// The vendor sends `null` for empty lists and strings.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
	D: Deserializer<'de>,
	T: Default + Deserialize<'de>,
{
	Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl<C> PushClient<C>
where
	C: PushHttpClient,
{
	/// Pushes `message` to one target and waits for the delivery result.
	///
	/// Any entry not reporting `SUCCESS` fails the call with [`Error::PushRejected`].
	pub async fn push_sync(
		&self,
		strategy: PushStrategy,
		target: &str,
		message: &PushMessage,
		cancel: &CancellationToken,
	) -> Result<PushResponse<PushSyncData>> {
		const OPERATION: OperationKind = OperationKind::PushSync;

		obs::observe(OPERATION, "push_sync", async move {
			if target.trim().is_empty() {
				return Err(ConfigError::MissingParameter { name: "target" }.into());
			}

			let handle = self.acquire_authorized(cancel).await?;
			let url = self.endpoint(&["push", "sync", target]).await;
			let body = PushRequest { targets: None, strategy, push_message: message };
			let response = handle
				.post_json(OPERATION, url, &body, cancel)
				.await?
				.json::<PushResponse<PushSyncData>>(OPERATION)?;

			if let Some(rejected) = response.data.iter().find(|entry| !entry.is_success()) {
				return Err(Error::PushRejected {
					operation: OPERATION,
					status: rejected.push_status.clone(),
				});
			}

			Ok(response)
		})
		.await
	}

	/// Queues `message` for up to [`MAX_BATCH_TARGETS`] targets.
	///
	/// The target list is checked before any permit is consumed.
	pub async fn push_single(
		&self,
		strategy: PushStrategy,
		targets: &[String],
		message: &PushMessage,
		cancel: &CancellationToken,
	) -> Result<PushResponse<PushSingleData>> {
		const OPERATION: OperationKind = OperationKind::PushSingle;

		obs::observe(OPERATION, "push_single", async move {
			if targets.is_empty() {
				return Err(ConfigError::MissingParameter { name: "targets" }.into());
			}
			if targets.len() > MAX_BATCH_TARGETS {
				return Err(ConfigError::TooManyTargets {
					count: targets.len(),
					max: MAX_BATCH_TARGETS,
				}
				.into());
			}

			let handle = self.acquire_authorized(cancel).await?;
			let url = self.endpoint(&["push", "single"]).await;
			let body = PushRequest { targets: Some(targets), strategy, push_message: message };

			handle.post_json(OPERATION, url, &body, cancel).await?.json(OPERATION)
		})
		.await
	}
}
