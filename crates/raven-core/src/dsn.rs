// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! DSN parsing.
//!
//! A DSN has the shape `scheme://[public[:secret]@]host[:port]/[path/.../]project_id`
//! and resolves to the store endpoint
//! `{scheme}://{host}:{port}/{path}api/{project_id}/store/`.
//!
//! The empty DSN is valid and selects local mode: events are printed instead
//! of sent.

use std::str::FromStr;

use url::Url;

use crate::error::{ConfigError, Result};
use crate::secret::SecretString;

/// Transport configuration resolved from a DSN. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Configuration {
	/// No endpoint and no credentials; events go to the local sink.
	Local,
	/// A fully resolved ingestion endpoint.
	Remote(RemoteConfig),
}

/// Endpoint and credentials for network delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteConfig {
	endpoint: String,
	public_key: String,
	secret_key: SecretString,
	project_id: String,
}

impl RemoteConfig {
	/// The store endpoint, always with an explicit port.
	pub fn endpoint(&self) -> &str {
		&self.endpoint
	}

	pub fn public_key(&self) -> &str {
		&self.public_key
	}

	pub fn secret_key(&self) -> &SecretString {
		&self.secret_key
	}

	pub fn project_id(&self) -> &str {
		&self.project_id
	}

	/// False when both keys are empty; such a config must not be used to
	/// build an authenticated request.
	pub fn has_credentials(&self) -> bool {
		!(self.public_key.is_empty() && self.secret_key.is_empty())
	}
}

impl Configuration {
	/// Parses a DSN.
	///
	/// Whitespace-only input counts as empty and yields [`Configuration::Local`].
	pub fn parse(dsn: &str) -> Result<Self> {
		let dsn = dsn.trim();
		if dsn.is_empty() {
			return Ok(Self::Local);
		}

		let url = Url::parse(dsn).map_err(|e| invalid(dsn, e.to_string()))?;
		let host = url
			.host_str()
			.filter(|h| !h.is_empty())
			.ok_or_else(|| invalid(&redacted(&url), "missing host"))?;

		let mut segments: Vec<&str> = url
			.path_segments()
			.map(|segments| segments.filter(|s| !s.is_empty()).collect())
			.unwrap_or_default();

		let project_id = segments
			.pop()
			.ok_or_else(|| ConfigError::MissingProjectId(redacted(&url)))?
			.to_string();

		let mut prefix = segments.join("/");
		if !prefix.is_empty() {
			prefix.push('/');
		}

		let scheme = url.scheme();
		let port = url
			.port()
			.unwrap_or(if scheme == "https" { 443 } else { 80 });

		let endpoint = format!("{scheme}://{host}:{port}/{prefix}api/{project_id}/store/");

		Ok(Self::Remote(RemoteConfig {
			endpoint,
			public_key: url.username().to_string(),
			secret_key: SecretString::new(url.password().unwrap_or_default().to_string()),
			project_id,
		}))
	}

	pub fn is_local(&self) -> bool {
		matches!(self, Self::Local)
	}

	pub fn remote(&self) -> Option<&RemoteConfig> {
		match self {
			Self::Local => None,
			Self::Remote(remote) => Some(remote),
		}
	}

	/// Project id written into every event; empty in local mode.
	pub fn project_id(&self) -> &str {
		self.remote().map(RemoteConfig::project_id).unwrap_or_default()
	}
}

impl FromStr for Configuration {
	type Err = ConfigError;

	fn from_str(s: &str) -> Result<Self> {
		Self::parse(s)
	}
}

/// The URL with its password masked, for error messages.
fn redacted(url: &Url) -> String {
	let mut url = url.clone();
	if url.password().is_some() {
		let _ = url.set_password(Some("***"));
	}
	url.to_string()
}

fn invalid(dsn: &str, reason: impl Into<String>) -> ConfigError {
	ConfigError::InvalidDsn {
		dsn: dsn.to_string(),
		reason: reason.into(),
	}
}
