// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Call-stack symbol capture for exception events.

use rustc_demangle::demangle;
use std::backtrace::Backtrace;

/// Frames belonging to the capture machinery itself.
const CAPTURE_PREFIXES: &[&str] = &[
	"std::backtrace::",
	"std::backtrace_rs::",
	"<std::backtrace::",
	"raven::backtrace::",
];

/// Frames between a panic site and the installed hook.
const PANIC_PREFIXES: &[&str] = &[
	"raven::panic_hook::",
	"<alloc::boxed::Box<F,A> as core::ops::function::Fn<Args>>::call",
	"std::panicking::",
	"std::sys::backtrace::",
	"std::sys_common::backtrace::",
	"rust_begin_unwind",
	"core::panicking::",
	"core::panic::",
];

/// Captures the current call stack as demangled symbol names, innermost first.
pub fn capture_call_stack() -> Vec<String> {
	let backtrace = Backtrace::force_capture();
	parse_symbols(&format!("{backtrace}"))
}

/// Like [`capture_call_stack`], but also drops the panic machinery so the
/// first symbol is the code that panicked.
pub(crate) fn capture_panic_stack() -> Vec<String> {
	strip_panic_frames(capture_call_stack())
}

fn strip_panic_frames(symbols: Vec<String>) -> Vec<String> {
	symbols
		.into_iter()
		.skip_while(|symbol| {
			PANIC_PREFIXES
				.iter()
				.any(|prefix| symbol.starts_with(prefix))
		})
		.collect()
}

/// Extracts symbol names from the text rendering of a [`Backtrace`].
///
/// The rendering alternates `N: symbol` lines with indented `at file:line`
/// lines; only the former are kept.
pub fn parse_symbols(rendered: &str) -> Vec<String> {
	rendered
		.lines()
		.filter_map(parse_symbol_line)
		.skip_while(|symbol| is_capture_frame(symbol))
		.collect()
}

fn parse_symbol_line(line: &str) -> Option<String> {
	let line = line.trim();
	if line.is_empty() || line.starts_with("at ") {
		return None;
	}

	let symbol = match line.split_once(':') {
		Some((index, rest)) if index.trim().parse::<u32>().is_ok() => rest.trim(),
		_ => line,
	};

	if symbol.is_empty() {
		return None;
	}

	Some(demangle(symbol).to_string())
}

fn is_capture_frame(symbol: &str) -> bool {
	CAPTURE_PREFIXES
		.iter()
		.any(|prefix| symbol.starts_with(prefix))
}
