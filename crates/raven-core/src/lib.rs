// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Core types for the Raven event reporting client.
//!
//! This crate holds the pieces of the capture pipeline that perform no I/O:
//!
//! - [`Configuration`]: the immutable result of parsing a DSN
//! - [`Event`]: the normalized report and its JSON wire shape
//! - [`Level`]: event severity
//! - [`Secret`]: redacting wrapper used for the DSN secret key
//!
//! The SDK crate (`raven`) builds on these to capture, queue and deliver
//! events.

pub mod dsn;
pub mod error;
pub mod event;
pub mod level;
pub mod secret;

pub use dsn::{Configuration, RemoteConfig};
pub use error::{ConfigError, EventError, Result};
pub use event::{
	format_timestamp, Event, EventId, Exception, Frame, Stacktrace, PLATFORM, TIMESTAMP_FORMAT,
};
pub use level::Level;
pub use secret::{Secret, SecretString, REDACTED};
