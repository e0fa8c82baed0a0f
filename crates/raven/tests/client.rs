// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

mod support;

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use raven::{
	capture_error, capture_message, CaptureOptions, Configuration, Event, ExceptionInfo, FileQueue,
	Level, OfflineStore, QueueBackend, RavenClient,
};
use support::{CapturingSink, RecordingTransport};
use tempfile::TempDir;
use wiremock::{matchers, Mock, MockServer, ResponseTemplate};

fn local_client(sink: Arc<CapturingSink>) -> RavenClient {
	RavenClient::builder()
		.dsn("")
		.local_sink(sink)
		.tags(BTreeMap::from([("env".to_string(), "prod".to_string())]))
		.build()
		.unwrap()
}

#[test]
fn hello_message_is_printed_locally() {
	let sink = Arc::new(CapturingSink::default());
	let client = local_client(sink.clone());

	let id = client.capture_message("hello").unwrap();

	let lines = sink.lines();
	assert_eq!(lines.len(), 1);
	let event = Event::from_json(&lines[0]).unwrap();
	assert_eq!(event.event_id, id);
	assert_eq!(event.message, "hello");
	assert_eq!(event.level, Level::Info);
	assert_eq!(event.project, "");
	for (key, value) in client.tags() {
		assert_eq!(event.tags[&key], value);
	}

	let raw: serde_json::Value = serde_json::from_str(&lines[0]).unwrap();
	let id = raw["event_id"].as_str().unwrap();
	assert_eq!(id.len(), 32);
	assert!(id.chars().all(|c| matches!(c, '0'..='9' | 'a'..='f')));
	assert_eq!(raw["timestamp"].as_str().unwrap().len(), 19);
	assert_eq!(raw["platform"], "rust");
}

#[test]
fn per_call_tag_overrides_default() {
	let sink = Arc::new(CapturingSink::default());
	let client = local_client(sink.clone());

	client.capture_message_with("hello", CaptureOptions::new().tag("env", "staging"));

	let event = Event::from_json(&sink.lines()[0]).unwrap();
	assert_eq!(event.tags["env"], "staging");
}

#[test]
fn generated_event_ids_are_distinct() {
	let transport = Arc::new(RecordingTransport::default());
	let client = RavenClient::builder().transport(transport.clone()).build().unwrap();

	let ids: HashSet<_> = (0..10_000)
		.map(|i| client.capture_message(format!("event {i}")).unwrap())
		.collect();

	assert_eq!(ids.len(), 10_000);
}

#[test]
fn deferred_exception_flushes_once_through_local_print() {
	let sink = Arc::new(CapturingSink::default());
	let client = local_client(sink.clone());

	client
		.capture_exception(ExceptionInfo::new("Fault", Some("bad state".to_string())), false)
		.unwrap();
	assert!(sink.lines().is_empty());
	assert_eq!(client.pending_reports().unwrap(), 1);

	let summary = client.flush_pending().unwrap();

	assert_eq!(summary.attempted, 1);
	assert_eq!(summary.failed, 0);
	assert_eq!(sink.lines().len(), 1);
	assert_eq!(client.pending_reports().unwrap(), 0);

	let event = Event::from_json(&sink.lines()[0]).unwrap();
	assert_eq!(event.message, "Fault: bad state");
	assert_eq!(event.level, Level::Fatal);
}

#[test]
fn failed_replay_is_discarded() {
	let tmp = TempDir::new().unwrap();
	let client = RavenClient::builder()
		.configuration(Configuration::parse("https://host/1").unwrap())
		.offline_store(OfflineStore::file(tmp.path()))
		.build()
		.unwrap();

	client.capture_uncaught_exception(ExceptionInfo::new("Fault", None));
	assert_eq!(client.pending_reports().unwrap(), 1);

	let summary = client.flush_pending().unwrap();

	assert_eq!(summary.failed, 1);
	assert!(FileQueue::new(tmp.path()).load().unwrap().is_empty());
}

#[test]
fn macros_record_call_site() {
	let transport = Arc::new(RecordingTransport::default());
	let client = RavenClient::builder().transport(transport.clone()).build().unwrap();
	let err = std::io::Error::new(std::io::ErrorKind::NotFound, "config missing");

	capture_message!(client, "cache miss");
	capture_message!(client, "slow query", Level::Warning);
	capture_error!(client, &err);

	let events = transport.events();
	assert_eq!(events.len(), 3);
	for event in &events {
		assert_eq!(event.culprit, "client in client.rs");
		assert_eq!(event.stacktrace.frames.len(), 1);
		assert_eq!(event.stacktrace.frames[0].filename.as_deref(), Some("client.rs"));
	}
	assert_eq!(events[1].level, Level::Warning);
	assert_eq!(events[2].message, "config missing");
	assert_eq!(events[2].level, Level::Error);
}

#[tokio::test]
async fn remote_message_is_posted_to_store_endpoint() {
	let server = MockServer::start().await;
	Mock::given(matchers::method("POST"))
		.and(matchers::path("/sentry/api/7/store/"))
		.and(matchers::header_exists("X-Sentry-Auth"))
		.respond_with(ResponseTemplate::new(200))
		.mount(&server)
		.await;

	let address = server.address();
	let dsn = format!("http://pub:sec@{}:{}/sentry/7", address.ip(), address.port());
	let client = RavenClient::builder()
		.dsn(dsn)
		.logger("checkout")
		.build()
		.unwrap();

	client.capture_message("order failed").unwrap();

	let mut requests = Vec::new();
	for _ in 0..50 {
		requests = server.received_requests().await.unwrap();
		if !requests.is_empty() {
			break;
		}
		tokio::time::sleep(Duration::from_millis(20)).await;
	}

	assert_eq!(requests.len(), 1);
	let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
	assert_eq!(body["message"], "order failed");
	assert_eq!(body["project"], "7");
	assert_eq!(body["logger"], "checkout");
}
