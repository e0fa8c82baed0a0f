// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Error types for the Raven SDK.
//!
//! None of these reach application code through the capture entry points;
//! they are returned by the lower-level pieces (builder, store, transport)
//! and logged by the client.

use raven_core::{ConfigError, EventError};
use thiserror::Error;

/// Result type alias for SDK operations.
pub type Result<T> = std::result::Result<T, RavenSdkError>;

/// Errors that can occur in the SDK.
#[derive(Debug, Error)]
pub enum RavenSdkError {
	/// The DSN could not be parsed.
	#[error("configuration error: {0}")]
	Config(#[from] ConfigError),

	/// The event could not be encoded as a JSON payload.
	#[error("failed to encode event: {0}")]
	Serialization(#[from] serde_json::Error),

	/// A network configuration without public or secret key.
	#[error("missing credentials: DSN has neither a public nor a secret key")]
	MissingCredentials,

	/// The HTTP request could not be performed.
	#[error("HTTP request failed: {0}")]
	RequestFailed(#[from] reqwest::Error),

	/// The ingestion endpoint answered with a non-success status.
	#[error("server error (status {status}): {message}")]
	ServerError {
		/// HTTP status code.
		status: u16,
		/// Response body, if any.
		message: String,
	},

	/// The background delivery thread could not be started.
	#[error("failed to start delivery thread: {0}")]
	Spawn(#[source] std::io::Error),

	/// The offline store could not be read or written.
	#[error("offline store I/O error: {0}")]
	Store(#[from] std::io::Error),

	/// The offline store file exists but is not a JSON list of payloads.
	#[error("offline store is corrupt: {0}")]
	CorruptQueue(String),

	/// The calling thread already holds the offline store's lock, e.g. when
	/// a panic raised inside the store reaches the panic hook.
	#[error("offline store is busy on this thread")]
	QueueBusy,

	/// Environment settings could not be loaded.
	#[error("invalid settings: {0}")]
	Settings(String),
}

impl From<EventError> for RavenSdkError {
	fn from(err: EventError) -> Self {
		match err {
			EventError::Serialization(e) => Self::Serialization(e),
			EventError::InvalidLevel(level) => Self::Settings(format!("invalid level {level:?}")),
		}
	}
}
