// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use serde::{Deserialize, Serialize};

use crate::sections::{AbacConfigLayer, LoggingConfigLayer};

/// One partially specified configuration, as produced by a single source.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CalibraConfigLayer {
	#[serde(default)]
	pub abac: Option<AbacConfigLayer>,
	#[serde(default)]
	pub logging: Option<LoggingConfigLayer>,
}

impl CalibraConfigLayer {
	/// Merge `other` on top of `self`; fields set in `other` win.
	pub fn merge(&mut self, other: CalibraConfigLayer) {
		merge_section(&mut self.abac, other.abac, AbacConfigLayer::merge);
		merge_section(&mut self.logging, other.logging, LoggingConfigLayer::merge);
	}
}

fn merge_section<T>(slot: &mut Option<T>, incoming: Option<T>, merge: fn(&mut T, T)) {
	match (slot.as_mut(), incoming) {
		(Some(current), Some(incoming)) => merge(current, incoming),
		(None, Some(incoming)) => *slot = Some(incoming),
		(_, None) => {}
	}
}
