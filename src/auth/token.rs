//! Cached bearer token and its lifecycle helpers.

// self
use crate::{_prelude::*, auth::Secret};

/// Current lifecycle status for the cached token.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TokenStatus {
	/// No token has been issued yet (or the issued string was empty).
	Empty,
	/// Token is usable.
	Active,
	/// Token reached its expiry instant; treated like [`TokenStatus::Empty`] by the cache.
	Expired,
}

/// When a cached token stops being usable.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TokenExpiry {
	/// The token endpoint issued a permanent token (`expires_in == 0`).
	Never,
	/// The token expires at this instant.
	At(OffsetDateTime),
}
impl TokenExpiry {
	/// Derives the expiry from the `expires_in` seconds reported by the token endpoint.
	pub fn from_expires_in(issued_at: OffsetDateTime, expires_in: u64) -> Self {
		if expires_in == 0 {
			return Self::Never;
		}

		let seconds = i64::try_from(expires_in).unwrap_or(i64::MAX);

		issued_at.checked_add(Duration::seconds(seconds)).map_or(Self::Never, Self::At)
	}
}

/// Bearer token installed by the last successful credential exchange.
#[derive(Clone, Debug)]
pub struct CachedToken {
	/// Access token secret; callers must avoid logging it.
	pub access_token: Secret,
	/// Instant the exchange completed.
	pub issued_at: OffsetDateTime,
	/// Expiry derived from `issued_at + expires_in`.
	pub expiry: TokenExpiry,
	/// App UUID reported alongside the token, if any.
	pub application: Option<String>,
}
impl CachedToken {
	/// Builds a token from an exchange response observed at `issued_at`.
	pub fn new(access_token: impl Into<String>, issued_at: OffsetDateTime, expires_in: u64) -> Self {
		Self {
			access_token: Secret::new(access_token),
			issued_at,
			expiry: TokenExpiry::from_expires_in(issued_at, expires_in),
			application: None,
		}
	}

	/// Records the app UUID reported by the token endpoint; blank values are dropped.
	pub fn with_application(mut self, application: impl Into<String>) -> Self {
		let application = application.into();

		self.application = (!application.trim().is_empty()).then_some(application);

		self
	}

	/// Computes the lifecycle status at a given instant.
	///
	/// A token is active only while its expiry lies strictly after `instant`.
	pub fn status_at(&self, instant: OffsetDateTime) -> TokenStatus {
		if self.access_token.is_blank() {
			return TokenStatus::Empty;
		}

		match self.expiry {
			TokenExpiry::Never => TokenStatus::Active,
			TokenExpiry::At(at) if at > instant => TokenStatus::Active,
			TokenExpiry::At(_) => TokenStatus::Expired,
		}
	}

	/// Returns `true` if the token can be attached to requests at `instant`.
	pub fn is_valid_at(&self, instant: OffsetDateTime) -> bool {
		matches!(self.status_at(instant), TokenStatus::Active)
	}
}

/// Status of an optional cache slot; a missing token is [`TokenStatus::Empty`].
pub fn status_of(token: Option<&CachedToken>, instant: OffsetDateTime) -> TokenStatus {
	token.map_or(TokenStatus::Empty, |token| token.status_at(instant))
}

#[cfg(test)]
mod tests {
	// crates.io
	use time::macros::datetime;
	// self
	use super::*;

	#[test]
	fn status_tracks_expiry() {
		let issued = datetime!(2025-01-01 00:00 UTC);
		let token = CachedToken::new("YWMt-token", issued, 7_200);

		assert_eq!(token.expiry, TokenExpiry::At(datetime!(2025-01-01 02:00 UTC)));
		assert_eq!(token.status_at(issued), TokenStatus::Active);
		assert_eq!(token.status_at(datetime!(2025-01-01 01:59:59 UTC)), TokenStatus::Active);
		assert_eq!(token.status_at(datetime!(2025-01-01 02:00 UTC)), TokenStatus::Expired);
		assert_eq!(token.status_at(datetime!(2025-01-02 00:00 UTC)), TokenStatus::Expired);
	}

	#[test]
	fn zero_expires_in_never_expires() {
		let issued = datetime!(2025-01-01 00:00 UTC);
		let token = CachedToken::new("YWMt-forever", issued, 0);

		assert_eq!(token.expiry, TokenExpiry::Never);
		assert!(token.is_valid_at(datetime!(2099-12-31 23:59 UTC)));
	}

	#[test]
	fn blank_token_is_empty_regardless_of_expiry() {
		let issued = datetime!(2025-01-01 00:00 UTC);
		let token = CachedToken::new("   ", issued, 0);

		assert_eq!(token.status_at(issued), TokenStatus::Empty);
		assert_eq!(status_of(None, issued), TokenStatus::Empty);
		assert_eq!(status_of(Some(&token), issued), TokenStatus::Empty);
	}

	#[test]
	fn huge_expires_in_saturates_to_never() {
		let issued = datetime!(2025-01-01 00:00 UTC);

		assert_eq!(TokenExpiry::from_expires_in(issued, u64::MAX), TokenExpiry::Never);
	}
}
