// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Error types for the core event model.

use thiserror::Error;

/// Errors raised while turning a DSN into a [`Configuration`](crate::Configuration).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
	/// The DSN is not a URL, or the URL has no host.
	#[error("invalid DSN {dsn:?}: {reason}")]
	InvalidDsn { dsn: String, reason: String },

	/// The DSN path does not end in a project identifier.
	#[error("DSN {0:?} has no project id")]
	MissingProjectId(String),
}

impl ConfigError {
	/// Both variants describe a DSN that cannot be used for delivery.
	pub fn is_invalid_dsn(&self) -> bool {
		matches!(self, Self::InvalidDsn { .. } | Self::MissingProjectId(_))
	}
}

/// Errors raised by the event model itself.
#[derive(Debug, Error)]
pub enum EventError {
	#[error("invalid level: {0}")]
	InvalidLevel(String),

	#[error("serialization error: {0}")]
	Serialization(#[from] serde_json::Error),
}

/// Result type for DSN parsing.
pub type Result<T> = std::result::Result<T, ConfigError>;
