// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Subjects that permission checks are evaluated against.
//!
//! A check targets either a bare [`SubjectKind`] (a class-level check, used
//! before an instance exists) or a concrete [`SubjectInstance`]. Instances only
//! carry the attributes conditions can test, and always carry their tenant.

use serde::{Deserialize, Serialize};

use crate::types::{SubjectKind, TenantId, UserId};

/// The minimal attribute view of a resource instance.
///
/// There is no constructor without a tenant: an instance that has not been
/// scoped to an organization cannot be represented.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectInstance {
	kind: SubjectKind,
	tenant_id: TenantId,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	owner_id: Option<UserId>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	id: Option<String>,
}

impl SubjectInstance {
	pub fn new(kind: SubjectKind, tenant_id: TenantId) -> Self {
		Self {
			kind,
			tenant_id,
			owner_id: None,
			id: None,
		}
	}

	/// Builder: set the owning user.
	pub fn with_owner(mut self, owner_id: UserId) -> Self {
		self.owner_id = Some(owner_id);
		self
	}

	/// Builder: set the instance identifier.
	pub fn with_id(mut self, id: impl Into<String>) -> Self {
		self.id = Some(id.into());
		self
	}

	pub fn kind(&self) -> SubjectKind {
		self.kind
	}

	pub fn tenant_id(&self) -> TenantId {
		self.tenant_id
	}

	pub fn owner_id(&self) -> Option<UserId> {
		self.owner_id
	}

	pub fn id(&self) -> Option<&str> {
		self.id.as_deref()
	}
}

/// What a check is evaluated against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubjectRef<'a> {
	/// Class-level check: no instance attributes exist yet.
	Kind(SubjectKind),
	Instance(&'a SubjectInstance),
}

impl<'a> SubjectRef<'a> {
	pub fn kind(&self) -> SubjectKind {
		match self {
			SubjectRef::Kind(kind) => *kind,
			SubjectRef::Instance(instance) => instance.kind(),
		}
	}

	pub fn instance(&self) -> Option<&'a SubjectInstance> {
		match self {
			SubjectRef::Kind(_) => None,
			SubjectRef::Instance(instance) => Some(*instance),
		}
	}

	pub fn is_class_level(&self) -> bool {
		matches!(self, SubjectRef::Kind(_))
	}
}

impl From<SubjectKind> for SubjectRef<'_> {
	fn from(kind: SubjectKind) -> Self {
		SubjectRef::Kind(kind)
	}
}

impl<'a> From<&'a SubjectInstance> for SubjectRef<'a> {
	fn from(instance: &'a SubjectInstance) -> Self {
		SubjectRef::Instance(instance)
	}
}
