// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Event delivery.
//!
//! [`RavenTransport`] routes a payload by configuration:
//!
//! - local mode: the JSON text goes to a [`LocalSink`] (stdout by default)
//! - remote mode without credentials: nothing is sent
//! - remote mode: one authenticated `POST` to the store endpoint
//!
//! Network sends are fire-and-forget. Inside a Tokio runtime the request is
//! spawned onto it; otherwise a detached thread performs it with the
//! blocking client. The outcome is only logged. There is exactly one attempt
//! per call.

use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use raven_core::{Configuration, Event, RemoteConfig};
use reqwest::header::{ACCEPT, CONTENT_LENGTH, CONTENT_TYPE};
use reqwest::StatusCode;
use tracing::{debug, error, warn};

use crate::auth::{auth_header, AUTH_HEADER};
use crate::error::{RavenSdkError, Result};
use crate::http;

const JSON: &str = "application/json";

/// What happened to a payload handed to a transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
	/// Written to the local sink; no network involved.
	PrintedLocally,
	/// Handed to a background request; the outcome is only logged.
	Dispatched,
	/// The request completed with this status.
	Delivered(StatusCode),
}

/// Destination for payloads in local mode.
pub trait LocalSink: Send + Sync {
	fn write_payload(&self, payload: &str);
}

/// Writes each payload as one line on standard output.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdoutSink;

impl LocalSink for StdoutSink {
	fn write_payload(&self, payload: &str) {
		let mut stdout = std::io::stdout().lock();
		let _ = writeln!(stdout, "{payload}");
	}
}

/// Delivers serialized events.
pub trait Transport: Send + Sync {
	/// Delivers an already-serialized payload, e.g. one replayed from the
	/// offline store.
	fn send_raw(&self, payload: String) -> Result<Delivery>;

	/// Serializes and delivers an event.
	fn send_event(&self, event: &Event) -> Result<Delivery> {
		let payload = event.to_json()?;
		self.send_raw(payload)
	}
}

/// The default transport, driven by a parsed [`Configuration`].
#[derive(Clone)]
pub struct RavenTransport {
	configuration: Configuration,
	client: reqwest::Client,
	request_timeout: Option<Duration>,
	sink: Arc<dyn LocalSink>,
}

impl std::fmt::Debug for RavenTransport {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("RavenTransport")
			.field("configuration", &self.configuration)
			.field("request_timeout", &self.request_timeout)
			.finish_non_exhaustive()
	}
}

impl RavenTransport {
	/// Creates a transport. `request_timeout` of `None` keeps the HTTP
	/// client's default.
	pub fn new(configuration: Configuration, request_timeout: Option<Duration>) -> Result<Self> {
		let client = http::new_client(request_timeout)?;
		Ok(Self {
			configuration,
			client,
			request_timeout,
			sink: Arc::new(StdoutSink),
		})
	}

	/// Replaces the local-mode sink.
	pub fn with_sink(mut self, sink: Arc<dyn LocalSink>) -> Self {
		self.sink = sink;
		self
	}

	pub fn configuration(&self) -> &Configuration {
		&self.configuration
	}

	/// Performs the delivery and waits for the response.
	///
	/// [`Transport::send_raw`] runs this in the background; it is public so
	/// callers that can afford to wait (and tests) can observe the status.
	pub async fn deliver(&self, payload: String) -> Result<Delivery> {
		let Some(remote) = self.remote_or_print(&payload)? else {
			return Ok(Delivery::PrintedLocally);
		};

		let header = auth_header(remote, Utc::now().timestamp());
		let status = post(&self.client, remote.endpoint(), &header, payload).await?;
		Ok(Delivery::Delivered(status))
	}

	/// Handles local mode and the missing-credentials check. Returns the
	/// remote config only when a request should be made.
	fn remote_or_print(&self, payload: &str) -> Result<Option<&RemoteConfig>> {
		match &self.configuration {
			Configuration::Local => {
				self.sink.write_payload(payload);
				Ok(None)
			}
			Configuration::Remote(remote) if !remote.has_credentials() => {
				warn!(
					endpoint = %remote.endpoint(),
					"Missing credentials, event not sent"
				);
				Err(RavenSdkError::MissingCredentials)
			}
			Configuration::Remote(remote) => Ok(Some(remote)),
		}
	}
}

impl Transport for RavenTransport {
	fn send_raw(&self, payload: String) -> Result<Delivery> {
		let Some(remote) = self.remote_or_print(&payload)? else {
			return Ok(Delivery::PrintedLocally);
		};

		let endpoint = remote.endpoint().to_string();
		let header = auth_header(remote, Utc::now().timestamp());

		debug!(endpoint = %endpoint, bytes = payload.len(), "Dispatching event");

		match tokio::runtime::Handle::try_current() {
			Ok(handle) => {
				let client = self.client.clone();
				handle.spawn(async move {
					let outcome = post(&client, &endpoint, &header, payload).await;
					log_outcome(&endpoint, outcome);
				});
			}
			Err(_) => {
				let timeout = self.request_timeout;
				std::thread::Builder::new()
					.name("raven-delivery".to_string())
					.spawn(move || {
						let outcome = post_blocking(timeout, &endpoint, &header, payload);
						log_outcome(&endpoint, outcome);
					})
					.map_err(RavenSdkError::Spawn)?;
			}
		}

		Ok(Delivery::Dispatched)
	}
}

async fn post(
	client: &reqwest::Client,
	endpoint: &str,
	header: &str,
	payload: String,
) -> Result<StatusCode> {
	let response = client
		.post(endpoint)
		.header(ACCEPT, JSON)
		.header(CONTENT_TYPE, JSON)
		.header(CONTENT_LENGTH, payload.len().to_string())
		.header(AUTH_HEADER, header)
		.body(payload)
		.send()
		.await?;

	let status = response.status();
	if !status.is_success() {
		let message = response.text().await.unwrap_or_default();
		return Err(RavenSdkError::ServerError {
			status: status.as_u16(),
			message,
		});
	}
	Ok(status)
}

fn post_blocking(
	timeout: Option<Duration>,
	endpoint: &str,
	header: &str,
	payload: String,
) -> Result<StatusCode> {
	let client = http::new_blocking_client(timeout)?;
	let response = client
		.post(endpoint)
		.header(ACCEPT, JSON)
		.header(CONTENT_TYPE, JSON)
		.header(CONTENT_LENGTH, payload.len().to_string())
		.header(AUTH_HEADER, header)
		.body(payload)
		.send()?;

	let status = response.status();
	if !status.is_success() {
		let message = response.text().unwrap_or_default();
		return Err(RavenSdkError::ServerError {
			status: status.as_u16(),
			message,
		});
	}
	Ok(status)
}

fn log_outcome(endpoint: &str, outcome: Result<StatusCode>) {
	match outcome {
		Ok(status) => debug!(endpoint = %endpoint, status = status.as_u16(), "Event delivered"),
		Err(e) => error!(endpoint = %endpoint, error = %e, "Failed to deliver event"),
	}
}
