// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Grants: the allow-rules an ability is built from.
//!
//! A [`Grant`] pairs a set of actions with a subject scope, and optionally a
//! [`Condition`] over instance attributes. The rule language is allow-only:
//! there is no deny grant, so a set of grants has no precedence and the
//! order they were declared in never matters.

use serde::{Deserialize, Serialize};

use calibra_config::ClassLevelChecks;

use crate::subject::{SubjectInstance, SubjectRef};
use crate::types::{Action, SubjectKind, TenantId, UserId};

/// Actions covered by a grant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActionSet(Vec<Action>);

impl ActionSet {
	pub fn new(actions: impl IntoIterator<Item = Action>) -> Self {
		Self(actions.into_iter().collect())
	}

	/// True if the set names `action` or carries `manage`.
	pub fn permits(&self, action: &Action) -> bool {
		self.0.iter().any(|a| a.is_manage() || a == action)
	}

	pub fn iter(&self) -> impl Iterator<Item = &Action> {
		self.0.iter()
	}
}

impl From<Action> for ActionSet {
	fn from(action: Action) -> Self {
		Self(vec![action])
	}
}

impl<const N: usize> From<[Action; N]> for ActionSet {
	fn from(actions: [Action; N]) -> Self {
		Self::new(actions)
	}
}

impl From<Vec<Action>> for ActionSet {
	fn from(actions: Vec<Action>) -> Self {
		Self(actions)
	}
}

/// Subjects covered by a grant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubjectScope {
	/// Every subject kind.
	All,
	Kinds(Vec<SubjectKind>),
}

impl SubjectScope {
	pub fn covers(&self, kind: SubjectKind) -> bool {
		match self {
			SubjectScope::All => true,
			SubjectScope::Kinds(kinds) => kinds.contains(&kind),
		}
	}
}

impl From<SubjectKind> for SubjectScope {
	fn from(kind: SubjectKind) -> Self {
		SubjectScope::Kinds(vec![kind])
	}
}

impl<const N: usize> From<[SubjectKind; N]> for SubjectScope {
	fn from(kinds: [SubjectKind; N]) -> Self {
		SubjectScope::Kinds(kinds.to_vec())
	}
}

impl From<&[SubjectKind]> for SubjectScope {
	fn from(kinds: &[SubjectKind]) -> Self {
		SubjectScope::Kinds(kinds.to_vec())
	}
}

/// A structural predicate over instance attributes.
///
/// The set is closed: equality on a named attribute, and conjunction.
/// Evaluation is total.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Condition {
	TenantEquals(TenantId),
	/// False for instances with no owner attribute.
	OwnerEquals(UserId),
	AllOf(Vec<Condition>),
}

impl Condition {
	pub fn evaluate(&self, instance: &SubjectInstance) -> bool {
		match self {
			Condition::TenantEquals(tenant_id) => instance.tenant_id() == *tenant_id,
			Condition::OwnerEquals(user_id) => instance.owner_id() == Some(*user_id),
			Condition::AllOf(conditions) => conditions.iter().all(|c| c.evaluate(instance)),
		}
	}
}

/// One allow-rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Grant {
	/// Applies to bare kinds and every instance of the covered kinds.
	Unconditional {
		actions: ActionSet,
		subject: SubjectScope,
	},
	/// Applies to instances whose attributes satisfy `condition`.
	Conditional {
		actions: ActionSet,
		subject: SubjectScope,
		condition: Condition,
	},
}

impl Grant {
	pub fn actions(&self) -> &ActionSet {
		match self {
			Grant::Unconditional { actions, .. } | Grant::Conditional { actions, .. } => actions,
		}
	}

	pub fn subject(&self) -> &SubjectScope {
		match self {
			Grant::Unconditional { subject, .. } | Grant::Conditional { subject, .. } => subject,
		}
	}

	pub fn condition(&self) -> Option<&Condition> {
		match self {
			Grant::Unconditional { .. } => None,
			Grant::Conditional { condition, .. } => Some(condition),
		}
	}

	/// Returns true if this grant allows `action` on `subject`.
	///
	/// A class-level subject has no attributes, so a condition cannot be
	/// tested against it. Under [`ClassLevelChecks::Permissive`] it is taken
	/// to hold; under [`ClassLevelChecks::CreateOnly`] it is taken to hold
	/// only for `create`.
	pub fn matches(&self, action: &Action, subject: SubjectRef<'_>, policy: ClassLevelChecks) -> bool {
		if !self.actions().permits(action) || !self.subject().covers(subject.kind()) {
			return false;
		}

		let Some(condition) = self.condition() else {
			return true;
		};

		match subject {
			SubjectRef::Instance(instance) => condition.evaluate(instance),
			SubjectRef::Kind(_) => match policy {
				ClassLevelChecks::Permissive => true,
				ClassLevelChecks::CreateOnly => action.is_create(),
			},
		}
	}
}
