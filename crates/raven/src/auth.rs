// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The `X-Sentry-Auth` header.

use raven_core::RemoteConfig;

/// Header carrying the credentials.
pub const AUTH_HEADER: &str = "X-Sentry-Auth";
/// Protocol version understood by the store endpoint.
pub const PROTOCOL_VERSION: &str = "4";
/// SDK name for identification.
pub const SDK_NAME: &str = "raven-rust";
/// SDK version for identification.
pub const SDK_VERSION: &str = env!("CARGO_PKG_VERSION");

/// `raven-rust/{version}`.
pub fn client_id() -> String {
	format!("{SDK_NAME}/{SDK_VERSION}")
}

/// Builds the header value for a request sent at `timestamp` (unix seconds).
///
/// This is the only place the secret key is exposed.
pub fn auth_header(config: &RemoteConfig, timestamp: i64) -> String {
	format!(
		"Sentry sentry_version={PROTOCOL_VERSION}, sentry_client={}, sentry_timestamp={timestamp}, sentry_key={}, sentry_secret={}",
		client_id(),
		config.public_key(),
		config.secret_key().expose(),
	)
}
