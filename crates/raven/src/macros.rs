// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Capture macros that record where they were invoked.

/// Expands to a [`CallSite`](crate::CallSite) for the invocation point.
#[macro_export]
macro_rules! call_site {
	() => {
		$crate::CallSite::new(::std::module_path!(), ::std::file!(), ::std::line!())
	};
}

/// Captures a message with the invocation point as its call site.
///
/// ```no_run
/// # let client = raven::RavenClient::from_dsn("").unwrap();
/// raven::capture_message!(client, "cache miss");
/// raven::capture_message!(client, "disk almost full", raven::Level::Warning);
/// ```
#[macro_export]
macro_rules! capture_message {
	($client:expr, $text:expr $(,)?) => {
		$client.capture_message_with(
			$text,
			$crate::CaptureOptions::new().call_site($crate::call_site!()),
		)
	};
	($client:expr, $text:expr, $level:expr $(,)?) => {
		$client.capture_message_with(
			$text,
			$crate::CaptureOptions::new()
				.level($level)
				.call_site($crate::call_site!()),
		)
	};
}

/// Captures an error with the invocation point as its call site.
#[macro_export]
macro_rules! capture_error {
	($client:expr, $error:expr $(,)?) => {
		$client.capture_error_with(
			$error,
			$crate::CaptureOptions::new().call_site($crate::call_site!()),
		)
	};
}
