// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Environment-driven client settings.
//!
//! | Variable | Meaning |
//! |----------|---------|
//! | `RAVEN_DSN` | Connection string; empty or unset means local mode |
//! | `RAVEN_DSN_FILE` | Path to a file holding the DSN; wins over `RAVEN_DSN` |
//! | `RAVEN_LOGGER` | Logger name stamped on events |
//! | `RAVEN_RELEASE` | Value of the `Build version` tag |
//! | `RAVEN_QUEUE_DIR` | Directory of the offline queue file |

use std::path::PathBuf;

use raven_core::SecretString;

use crate::error::{RavenSdkError, Result};

pub const DSN_VAR: &str = "RAVEN_DSN";
pub const LOGGER_VAR: &str = "RAVEN_LOGGER";
pub const RELEASE_VAR: &str = "RAVEN_RELEASE";
pub const QUEUE_DIR_VAR: &str = "RAVEN_QUEUE_DIR";

/// Settings a client can be built from.
#[derive(Debug, Clone, Default)]
pub struct RavenSettings {
	/// The DSN carries the secret key, so it is kept redacted.
	pub dsn: SecretString,
	pub logger: Option<String>,
	pub release: Option<String>,
	/// `None` when no data directory could be determined; the client then
	/// queues in memory.
	pub queue_dir: Option<PathBuf>,
}

impl RavenSettings {
	/// Reads settings from the process environment.
	pub fn from_env() -> Result<Self> {
		Self::from_lookup(|name| std::env::var(name).ok())
	}

	/// Reads settings through `lookup`, which returns the value of a variable
	/// or `None` when it is unset.
	pub fn from_lookup<F>(lookup: F) -> Result<Self>
	where
		F: Fn(&str) -> Option<String>,
	{
		let dsn = load_dsn(&lookup)?.unwrap_or_default();
		let non_empty = |name: &str| lookup(name).filter(|value| !value.is_empty());

		let queue_dir = non_empty(QUEUE_DIR_VAR)
			.map(PathBuf::from)
			.or_else(default_queue_dir);

		Ok(Self {
			dsn: SecretString::new(dsn),
			logger: non_empty(LOGGER_VAR),
			release: non_empty(RELEASE_VAR),
			queue_dir,
		})
	}
}

/// `<data dir>/raven`, if the platform has a data directory.
pub fn default_queue_dir() -> Option<PathBuf> {
	dirs::data_dir().map(|dir| dir.join("raven"))
}

fn load_dsn<F>(lookup: &F) -> Result<Option<String>>
where
	F: Fn(&str) -> Option<String>,
{
	let file_var = format!("{DSN_VAR}_FILE");

	if let Some(path) = lookup(&file_var) {
		if path.is_empty() {
			return Err(RavenSdkError::Settings(format!("{file_var} is empty")));
		}
		let content = std::fs::read_to_string(&path).map_err(|e| {
			RavenSdkError::Settings(format!("failed to read {file_var} at {path}: {e}"))
		})?;
		return Ok(Some(content.strip_suffix('\n').unwrap_or(&content).to_string()));
	}

	Ok(lookup(DSN_VAR))
}
