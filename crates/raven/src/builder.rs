// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Turns capture calls into [`Event`]s.
//!
//! Every capture shape goes through [`EventBuilder::build`]. Tags and extra
//! start from the client defaults and per-call overrides win on collision.
//! Nothing here performs I/O.

use std::collections::BTreeMap;
use std::path::Path;

use chrono::{DateTime, Utc};
use raven_core::{Event, EventId, Exception, Frame, Level, Stacktrace, PLATFORM};
use serde_json::{Map, Value};

use crate::backtrace::capture_call_stack;

/// Extra key holding the `source()` chain of a captured error.
pub const ERROR_CAUSES_KEY: &str = "error.causes";

/// Where a capture call was made from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallSite {
	pub function: String,
	pub file: String,
	pub line: u32,
}

impl CallSite {
	pub fn new(function: impl Into<String>, file: impl Into<String>, line: u32) -> Self {
		Self {
			function: function.into(),
			file: file.into(),
			line,
		}
	}

	/// Last path component of `file`.
	pub fn filename(&self) -> String {
		Path::new(&self.file)
			.file_name()
			.map(|name| name.to_string_lossy().into_owned())
			.unwrap_or_else(|| self.file.clone())
	}

	/// The synthesized frame, or `None` when no line is known.
	fn frame(&self) -> Option<Frame> {
		if self.line == 0 {
			return None;
		}
		Some(Frame {
			filename: Some(self.filename()),
			function: self.function.clone(),
			lineno: Some(self.line),
		})
	}

	fn culprit(&self) -> Option<String> {
		self
			.frame()
			.map(|_| format!("{} in {}", self.function, self.filename()))
	}
}

/// A captured exception: a name, an optional reason and the call stack at
/// the point of failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExceptionInfo {
	pub name: String,
	pub reason: Option<String>,
	pub call_stack_symbols: Vec<String>,
}

impl ExceptionInfo {
	pub fn new(name: impl Into<String>, reason: Option<String>) -> Self {
		Self {
			name: name.into(),
			reason,
			call_stack_symbols: Vec::new(),
		}
	}

	pub fn with_call_stack(mut self, symbols: Vec<String>) -> Self {
		self.call_stack_symbols = symbols;
		self
	}

	/// Describes an error by its type name and `Display` text, with the
	/// current call stack.
	pub fn from_error<E>(error: &E) -> Self
	where
		E: std::error::Error + ?Sized,
	{
		Self::new(std::any::type_name::<E>(), Some(error.to_string()))
			.with_call_stack(capture_call_stack())
	}

	fn descriptor(&self) -> Exception {
		Exception {
			kind: self.name.clone(),
			value: self.reason.clone().unwrap_or_default(),
		}
	}

	fn message(&self) -> String {
		format!("{}: {}", self.name, self.reason.as_deref().unwrap_or_default())
	}
}

/// The three capture shapes.
#[derive(Debug, Clone)]
pub enum CaptureInput {
	Message {
		text: String,
		level: Level,
		call_site: Option<CallSite>,
	},
	Error {
		text: String,
		causes: Vec<String>,
		level: Level,
		call_site: Option<CallSite>,
	},
	Exception {
		info: ExceptionInfo,
		call_site: Option<CallSite>,
	},
}

impl CaptureInput {
	/// A plain message at `info`.
	pub fn message(text: impl Into<String>) -> Self {
		Self::Message {
			text: text.into(),
			level: Level::Info,
			call_site: None,
		}
	}

	/// An error reported through its `Display` text, at `error`.
	pub fn error<E>(error: &E) -> Self
	where
		E: std::error::Error + ?Sized,
	{
		let mut causes = Vec::new();
		let mut source = error.source();
		while let Some(cause) = source {
			causes.push(cause.to_string());
			source = cause.source();
		}
		Self::Error {
			text: error.to_string(),
			causes,
			level: Level::Error,
			call_site: None,
		}
	}

	/// An exception, always reported at `fatal`.
	pub fn exception(info: ExceptionInfo) -> Self {
		Self::Exception {
			info,
			call_site: None,
		}
	}

	/// Overrides the level of message and error inputs.
	pub fn with_level(mut self, new_level: Level) -> Self {
		match &mut self {
			Self::Message { level, .. } | Self::Error { level, .. } => *level = new_level,
			Self::Exception { .. } => {}
		}
		self
	}

	pub fn with_call_site(mut self, site: Option<CallSite>) -> Self {
		match &mut self {
			Self::Message { call_site, .. }
			| Self::Error { call_site, .. }
			| Self::Exception { call_site, .. } => *call_site = site,
		}
		self
	}
}

/// Per-call tag and extra overrides.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
	pub extra: Map<String, Value>,
	pub tags: BTreeMap<String, String>,
}

/// Client defaults an event is built against.
#[derive(Debug, Clone, Copy)]
pub struct EventBuilder<'a> {
	pub project: &'a str,
	pub logger: Option<&'a str>,
	pub tags: &'a BTreeMap<String, String>,
	pub extra: &'a Map<String, Value>,
	pub user: Option<&'a Map<String, Value>>,
}

impl EventBuilder<'_> {
	/// Builds an event stamped with the current time and a fresh id.
	pub fn build(&self, input: CaptureInput, overrides: Overrides) -> Event {
		self.build_at(input, overrides, Utc::now())
	}

	pub fn build_at(&self, input: CaptureInput, overrides: Overrides, now: DateTime<Utc>) -> Event {
		let mut extra = self.extra.clone();

		let (message, level, culprit, frames, exception) = match input {
			CaptureInput::Message {
				text,
				level,
				call_site,
			} => {
				let (culprit, frames) = call_site_parts(call_site.as_ref());
				(text, level, culprit, frames, None)
			}
			CaptureInput::Error {
				text,
				causes,
				level,
				call_site,
			} => {
				if !causes.is_empty() {
					extra.insert(
						ERROR_CAUSES_KEY.to_string(),
						Value::Array(causes.into_iter().map(Value::String).collect()),
					);
				}
				let (culprit, frames) = call_site_parts(call_site.as_ref());
				(text, level, culprit, frames, None)
			}
			CaptureInput::Exception { info, call_site } => {
				let mut frames: Vec<Frame> = call_site.as_ref().and_then(CallSite::frame).into_iter().collect();
				frames.extend(info.call_stack_symbols.iter().map(Frame::symbol));
				(
					info.message(),
					Level::Fatal,
					String::new(),
					frames,
					Some(info.descriptor()),
				)
			}
		};

		extra.extend(overrides.extra);
		let mut tags = self.tags.clone();
		tags.extend(overrides.tags);

		Event {
			event_id: EventId::new(),
			project: self.project.to_string(),
			timestamp: now,
			level,
			platform: PLATFORM.to_string(),
			extra,
			tags,
			logger: self.logger.map(str::to_string),
			message,
			culprit,
			stacktrace: Stacktrace { frames },
			exception,
			user: self.user.cloned(),
		}
	}
}

fn call_site_parts(call_site: Option<&CallSite>) -> (String, Vec<Frame>) {
	match call_site.and_then(|site| Some((site.culprit()?, site.frame()?))) {
		Some((culprit, frame)) => (culprit, vec![frame]),
		None => (String::new(), Vec::new()),
	}
}
