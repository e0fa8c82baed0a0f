// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Default tags seeded into every client.

use std::collections::BTreeMap;

pub const BUILD_VERSION_TAG: &str = "Build version";
pub const OS_TAG: &str = "OS";
pub const ARCH_TAG: &str = "Architecture";

/// Tags describing the running host.
pub fn host_tags() -> BTreeMap<String, String> {
	BTreeMap::from([
		(OS_TAG.to_string(), std::env::consts::OS.to_string()),
		(ARCH_TAG.to_string(), std::env::consts::ARCH.to_string()),
	])
}

/// Adds each default to `tags` unless the key is already present.
pub(crate) fn seed_defaults(
	tags: &mut BTreeMap<String, String>,
	defaults: impl IntoIterator<Item = (String, String)>,
) {
	for (key, value) in defaults {
		tags.entry(key).or_insert(value);
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn host_tags_describe_platform() {
		let tags = host_tags();
		assert_eq!(tags[OS_TAG], std::env::consts::OS);
		assert_eq!(tags[ARCH_TAG], std::env::consts::ARCH);
	}

	#[test]
	fn seeding_never_overwrites() {
		let mut tags = BTreeMap::from([(OS_TAG.to_string(), "custom".to_string())]);
		seed_defaults(&mut tags, host_tags());

		assert_eq!(tags[OS_TAG], "custom");
		assert_eq!(tags[ARCH_TAG], std::env::consts::ARCH);
	}
}
