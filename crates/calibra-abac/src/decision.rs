// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Auditable records of access decisions.

use serde::{Deserialize, Serialize};

use crate::principal::Principal;
use crate::subject::SubjectRef;
use crate::types::{Action, SubjectKind, TenantId};

/// Audit event type for a decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessEventType {
	/// Access to a resource was granted.
	AccessGranted,
	/// Access to a resource was denied.
	AccessDenied,
}

/// The subject of a decision, reduced to what an audit log needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubjectSummary {
	pub kind: SubjectKind,
	/// `None` for class-level checks.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub tenant_id: Option<TenantId>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub id: Option<String>,
}

impl From<SubjectRef<'_>> for SubjectSummary {
	fn from(subject: SubjectRef<'_>) -> Self {
		match subject {
			SubjectRef::Kind(kind) => Self {
				kind,
				tenant_id: None,
				id: None,
			},
			SubjectRef::Instance(instance) => Self {
				kind: instance.kind(),
				tenant_id: Some(instance.tenant_id()),
				id: instance.id().map(str::to_string),
			},
		}
	}
}

/// The outcome of one check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decision {
	pub principal: Principal,
	pub action: Action,
	pub subject: SubjectSummary,
	pub allowed: bool,
	/// Index into the ability's grants of the first grant that matched.
	pub matched_grant: Option<usize>,
}

impl Decision {
	pub fn event_type(&self) -> AccessEventType {
		if self.allowed {
			AccessEventType::AccessGranted
		} else {
			AccessEventType::AccessDenied
		}
	}

	/// True when the check crossed organizations, e.g. an owner acting on
	/// another tenant's data.
	pub fn is_cross_tenant(&self) -> bool {
		self.subject
			.tenant_id
			.is_some_and(|tenant| tenant != self.principal.tenant_id)
	}
}
