// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Access-control engine configuration section.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// How class-level (bare kind) checks treat grants that carry a condition.
///
/// A bare kind has no attributes to test, so a conditioned grant can only be
/// assumed to hold. `Permissive` assumes it for every action; `CreateOnly`
/// assumes it only for `create`, the one action that legitimately runs before
/// an instance exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ClassLevelChecks {
	#[default]
	Permissive,
	CreateOnly,
}

impl fmt::Display for ClassLevelChecks {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			ClassLevelChecks::Permissive => write!(f, "permissive"),
			ClassLevelChecks::CreateOnly => write!(f, "create_only"),
		}
	}
}

impl FromStr for ClassLevelChecks {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
			"permissive" => Ok(ClassLevelChecks::Permissive),
			"create_only" => Ok(ClassLevelChecks::CreateOnly),
			other => Err(format!(
				"unknown class-level check policy '{other}' (expected 'permissive' or 'create_only')"
			)),
		}
	}
}

/// Access-control configuration (runtime, fully resolved).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AbacConfig {
	pub class_level_checks: ClassLevelChecks,
	/// Emit a `debug` event for every evaluated check.
	pub trace_decisions: bool,
}

/// Access-control configuration layer (partial, for merging).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AbacConfigLayer {
	#[serde(default)]
	pub class_level_checks: Option<ClassLevelChecks>,
	#[serde(default)]
	pub trace_decisions: Option<bool>,
}

impl AbacConfigLayer {
	pub fn merge(&mut self, other: AbacConfigLayer) {
		if other.class_level_checks.is_some() {
			self.class_level_checks = other.class_level_checks;
		}
		if other.trace_decisions.is_some() {
			self.trace_decisions = other.trace_decisions;
		}
	}

	pub fn finalize(self) -> AbacConfig {
		AbacConfig {
			class_level_checks: self.class_level_checks.unwrap_or_default(),
			trace_decisions: self.trace_decisions.unwrap_or(false),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_defaults() {
		let config = AbacConfigLayer::default().finalize();
		assert_eq!(config.class_level_checks, ClassLevelChecks::Permissive);
		assert!(!config.trace_decisions);
	}

	#[test]
	fn test_merge_overrides_only_set_fields() {
		let mut base = AbacConfigLayer {
			class_level_checks: Some(ClassLevelChecks::CreateOnly),
			trace_decisions: Some(true),
		};
		base.merge(AbacConfigLayer {
			class_level_checks: None,
			trace_decisions: Some(false),
		});
		let config = base.finalize();
		assert_eq!(config.class_level_checks, ClassLevelChecks::CreateOnly);
		assert!(!config.trace_decisions);
	}

	#[test]
	fn test_parse_policy() {
		assert_eq!(
			"create-only".parse::<ClassLevelChecks>(),
			Ok(ClassLevelChecks::CreateOnly)
		);
		assert_eq!(
			"PERMISSIVE".parse::<ClassLevelChecks>(),
			Ok(ClassLevelChecks::Permissive)
		);
		assert!("strict".parse::<ClassLevelChecks>().is_err());
	}
}
