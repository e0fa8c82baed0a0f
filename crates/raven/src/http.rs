// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! HTTP client construction with the SDK's User-Agent.

use std::time::Duration;

use reqwest::{Client, ClientBuilder};

use crate::auth::client_id;

/// Async client builder carrying the `raven-rust/{version}` User-Agent.
pub fn builder() -> ClientBuilder {
	Client::builder().user_agent(user_agent())
}

/// Blocking client builder, for delivery outside a Tokio runtime.
pub fn blocking_builder() -> reqwest::blocking::ClientBuilder {
	reqwest::blocking::Client::builder().user_agent(user_agent())
}

/// Builds the async client, applying `timeout` when given. Without one the
/// platform default applies.
pub fn new_client(timeout: Option<Duration>) -> reqwest::Result<Client> {
	match timeout {
		Some(timeout) => builder().timeout(timeout).build(),
		None => builder().build(),
	}
}

pub fn new_blocking_client(timeout: Option<Duration>) -> reqwest::Result<reqwest::blocking::Client> {
	match timeout {
		Some(timeout) => blocking_builder().timeout(timeout).build(),
		None => blocking_builder().build(),
	}
}

/// Format: `raven-rust/{version}`, identical to the auth header's client id.
pub fn user_agent() -> String {
	client_id()
}
