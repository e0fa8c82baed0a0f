// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

#![allow(dead_code)]

use std::sync::Mutex;

use raven::{Delivery, Event, LocalSink, Result, Transport};

/// Records every payload instead of sending it.
#[derive(Default)]
pub struct RecordingTransport {
	sent: Mutex<Vec<String>>,
}

impl RecordingTransport {
	pub fn payloads(&self) -> Vec<String> {
		self.sent.lock().unwrap().clone()
	}

	pub fn events(&self) -> Vec<Event> {
		self
			.payloads()
			.iter()
			.map(|payload| Event::from_json(payload).unwrap())
			.collect()
	}
}

impl Transport for RecordingTransport {
	fn send_raw(&self, payload: String) -> Result<Delivery> {
		self.sent.lock().unwrap().push(payload);
		Ok(Delivery::PrintedLocally)
	}
}

/// Collects local-mode output.
#[derive(Default)]
pub struct CapturingSink {
	lines: Mutex<Vec<String>>,
}

impl CapturingSink {
	pub fn lines(&self) -> Vec<String> {
		self.lines.lock().unwrap().clone()
	}
}

impl LocalSink for CapturingSink {
	fn write_payload(&self, payload: &str) {
		self.lines.lock().unwrap().push(payload.to_string());
	}
}
