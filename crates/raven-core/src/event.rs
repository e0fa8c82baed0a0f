// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The event record and its wire shape.
//!
//! Field order and names below are the JSON payload accepted by the store
//! endpoint. The timestamp is rendered without a zone suffix or fractional
//! seconds; the ingestion API rejects anything else.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::EventError;
use crate::level::Level;

/// Platform tag written into every event.
pub const PLATFORM: &str = "rust";

/// `strftime` pattern for event timestamps.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Renders an instant as `yyyy-MM-ddTHH:mm:ss` in UTC.
pub fn format_timestamp(instant: DateTime<Utc>) -> String {
	instant.format(TIMESTAMP_FORMAT).to_string()
}

/// Unique identifier for an event, rendered as 32 lowercase hex characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EventId(pub Uuid);

impl EventId {
	/// A fresh random (v4) identifier.
	pub fn new() -> Self {
		Self(Uuid::new_v4())
	}
}

impl Default for EventId {
	fn default() -> Self {
		Self::new()
	}
}

impl fmt::Display for EventId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.0.simple())
	}
}

impl FromStr for EventId {
	type Err = uuid::Error;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Ok(Self(Uuid::parse_str(s)?))
	}
}

impl Serialize for EventId {
	fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		serializer.collect_str(self)
	}
}

impl<'de> Deserialize<'de> for EventId {
	fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
		let raw = String::deserialize(deserializer)?;
		raw.parse().map_err(serde::de::Error::custom)
	}
}

/// A single stack frame. Only `function` is always known.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Frame {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub filename: Option<String>,
	pub function: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub lineno: Option<u32>,
}

impl Frame {
	/// A frame that only carries a symbol name.
	pub fn symbol(function: impl Into<String>) -> Self {
		Self {
			filename: None,
			function: function.into(),
			lineno: None,
		}
	}
}

/// Ordered frames, outermost call site first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stacktrace {
	pub frames: Vec<Frame>,
}

/// Exception descriptor attached to exception events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exception {
	#[serde(rename = "type")]
	pub kind: String,
	pub value: String,
}

/// One normalized report, ready for serialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
	pub event_id: EventId,
	/// Project id from the DSN; empty in local mode.
	pub project: String,
	#[serde(with = "timestamp_format")]
	pub timestamp: DateTime<Utc>,
	pub level: Level,
	pub platform: String,
	pub extra: serde_json::Map<String, serde_json::Value>,
	pub tags: BTreeMap<String, String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub logger: Option<String>,
	pub message: String,
	pub culprit: String,
	pub stacktrace: Stacktrace,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub exception: Option<Exception>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub user: Option<serde_json::Map<String, serde_json::Value>>,
}

impl Event {
	/// Serializes to the compact JSON payload sent on the wire.
	pub fn to_json(&self) -> Result<String, EventError> {
		Ok(serde_json::to_string(self)?)
	}

	pub fn from_json(payload: &str) -> Result<Self, EventError> {
		Ok(serde_json::from_str(payload)?)
	}
}

mod timestamp_format {
	use super::*;

	pub fn serialize<S: Serializer>(instant: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
		serializer.serialize_str(&format_timestamp(*instant))
	}

	pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
		let raw = String::deserialize(deserializer)?;
		NaiveDateTime::parse_from_str(&raw, TIMESTAMP_FORMAT)
			.map(|naive| naive.and_utc())
			.map_err(serde::de::Error::custom)
	}
}
