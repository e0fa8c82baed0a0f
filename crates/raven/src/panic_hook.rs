// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Panic hook integration for automatic crash reporting.
//!
//! A panicking process may not live long enough for a network request, so
//! the hook only appends the report to the offline store. It is sent by the
//! flush that runs when crash reporting is next activated.

use std::panic::PanicHookInfo;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::backtrace::capture_panic_stack;
use crate::builder::{CallSite, CaptureInput, ExceptionInfo, Overrides};
use crate::client::RavenClientInner;

/// Exception type recorded for panics.
pub const PANIC_EXCEPTION_TYPE: &str = "panic";

/// Set once the first client has installed its hook.
static HOOK_INSTALLED: AtomicBool = AtomicBool::new(false);

/// Wraps the current panic hook with one that defers a report to `client`.
///
/// Only the first call in the process installs anything, so a panic is
/// captured exactly once. Returns whether this call installed the hook.
pub(crate) fn install_panic_hook(client: Arc<RavenClientInner>) -> bool {
	if HOOK_INSTALLED.swap(true, Ordering::SeqCst) {
		return false;
	}

	let previous_hook = std::panic::take_hook();

	std::panic::set_hook(Box::new(move |info| {
		report_panic(&client, info);
		previous_hook(info);
	}));
	true
}

fn report_panic(client: &RavenClientInner, info: &PanicHookInfo<'_>) {
	let exception = ExceptionInfo::new(PANIC_EXCEPTION_TYPE, Some(extract_panic_message(info)))
		.with_call_stack(capture_panic_stack());

	let input = CaptureInput::exception(exception).with_call_site(panic_call_site(info));
	client.capture(input, Overrides::default(), false);
}

/// The panic location, attributed to the panicking thread.
fn panic_call_site(info: &PanicHookInfo<'_>) -> Option<CallSite> {
	let location = info.location()?;
	let thread = std::thread::current();
	let function = format!("thread '{}'", thread.name().unwrap_or("<unnamed>"));
	Some(CallSite::new(function, location.file(), location.line()))
}

fn extract_panic_message(info: &PanicHookInfo<'_>) -> String {
	if let Some(s) = info.payload().downcast_ref::<&str>() {
		s.to_string()
	} else if let Some(s) = info.payload().downcast_ref::<String>() {
		s.clone()
	} else {
		"Box<dyn Any>".to_string()
	}
}
