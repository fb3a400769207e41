// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Core type definitions for access-control evaluation.
//!
//! - **ID newtypes**: Type-safe wrappers around UUIDs ([`UserId`], [`TenantId`])
//!   preventing a user id from being compared against an organization id
//! - **Role table**: the closed set of membership roles ([`Role`])
//! - **Subject kinds**: resource types that can be checked ([`SubjectKind`])
//! - **Actions**: the operation vocabulary, including the `manage` meta-action
//!   and collaborator-defined names ([`Action`])
//!
//! All ID types implement transparent serde serialization (as UUID strings) and
//! provide conversion to/from [`uuid::Uuid`].

use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;
use uuid::Uuid;

use crate::error::AbacError;

// =============================================================================
// ID Newtypes
// =============================================================================

macro_rules! define_id_type {
	($name:ident, $doc:expr) => {
		#[doc = $doc]
		#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
		#[serde(transparent)]
		pub struct $name(Uuid);

		impl $name {
			/// Create a new ID from a UUID.
			pub fn new(id: Uuid) -> Self {
				Self(id)
			}

			/// Generate a new random ID.
			pub fn generate() -> Self {
				Self(Uuid::new_v4())
			}
		}

		impl fmt::Display for $name {
			fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
				write!(f, "{}", self.0)
			}
		}

		impl From<Uuid> for $name {
			fn from(id: Uuid) -> Self {
				Self(id)
			}
		}

		impl From<$name> for Uuid {
			fn from(id: $name) -> Self {
				id.0
			}
		}

		impl FromStr for $name {
			type Err = uuid::Error;

			fn from_str(s: &str) -> Result<Self, Self::Err> {
				Uuid::parse_str(s).map(Self)
			}
		}
	};
}

define_id_type!(UserId, "Unique identifier for a user.");
define_id_type!(
	TenantId,
	"Unique identifier for a tenant (an organization in the domain)."
);

// =============================================================================
// Role Table
// =============================================================================

/// Roles a user can hold within an organization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
	/// Unrestricted access to everything, across organizations.
	Owner,
	/// Full control over the resources of their own organization.
	Admin,
	/// Can update instrument data in their organization.
	Operator,
	/// Read-only access to instrument data in their organization.
	Viewer,
	/// Can create and update instrument data in their organization.
	Editor,
}

impl Role {
	/// Returns all available roles.
	pub fn all() -> &'static [Role] {
		&[
			Role::Owner,
			Role::Admin,
			Role::Operator,
			Role::Viewer,
			Role::Editor,
		]
	}

	pub fn as_str(&self) -> &'static str {
		match self {
			Role::Owner => "OWNER",
			Role::Admin => "ADMIN",
			Role::Operator => "OPERATOR",
			Role::Viewer => "VIEWER",
			Role::Editor => "EDITOR",
		}
	}
}

impl fmt::Display for Role {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Accepts only the stored spelling (`OWNER`, `ADMIN`, ...). Anything else,
/// including a different case or surrounding whitespace, is `UnknownRole`.
impl FromStr for Role {
	type Err = AbacError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Role::all()
			.iter()
			.copied()
			.find(|role| role.as_str() == s)
			.ok_or_else(|| AbacError::UnknownRole(s.to_string()))
	}
}

// =============================================================================
// Subject Kinds
// =============================================================================

/// Resource types that permission checks can target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SubjectKind {
	Instrument,
	InstrumentData,
	Organization,
	User,
	Invite,
}

impl SubjectKind {
	pub fn all() -> &'static [SubjectKind] {
		&[
			SubjectKind::Instrument,
			SubjectKind::InstrumentData,
			SubjectKind::Organization,
			SubjectKind::User,
			SubjectKind::Invite,
		]
	}

	pub fn as_str(&self) -> &'static str {
		match self {
			SubjectKind::Instrument => "Instrument",
			SubjectKind::InstrumentData => "InstrumentData",
			SubjectKind::Organization => "Organization",
			SubjectKind::User => "User",
			SubjectKind::Invite => "Invite",
		}
	}
}

impl fmt::Display for SubjectKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for SubjectKind {
	type Err = AbacError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		SubjectKind::all()
			.iter()
			.copied()
			.find(|kind| kind.as_str() == s)
			.ok_or_else(|| AbacError::UnknownSubjectKind(s.to_string()))
	}
}

// =============================================================================
// Actions
// =============================================================================

/// An operation checked against a subject.
///
/// `Manage` is a meta-action: a grant carrying it satisfies every action,
/// including custom ones. Equality and hashing go through [`Action::as_str`],
/// so `Action::Custom("read".into())` and `Action::Read` are the same action.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Action {
	Manage,
	Get,
	Read,
	Create,
	Update,
	Delete,
	/// A collaborator-defined action such as `transfer_ownership`.
	Custom(String),
}

impl Action {
	pub fn as_str(&self) -> &str {
		match self {
			Action::Manage => "manage",
			Action::Get => "get",
			Action::Read => "read",
			Action::Create => "create",
			Action::Update => "update",
			Action::Delete => "delete",
			Action::Custom(name) => name,
		}
	}

	pub fn is_manage(&self) -> bool {
		self.as_str() == "manage"
	}

	pub fn is_create(&self) -> bool {
		self.as_str() == "create"
	}
}

impl PartialEq for Action {
	fn eq(&self, other: &Self) -> bool {
		self.as_str() == other.as_str()
	}
}

impl Eq for Action {}

impl Hash for Action {
	fn hash<H: Hasher>(&self, state: &mut H) {
		self.as_str().hash(state);
	}
}

impl fmt::Display for Action {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl From<&str> for Action {
	fn from(name: &str) -> Self {
		match name {
			"manage" => Action::Manage,
			"get" => Action::Get,
			"read" => Action::Read,
			"create" => Action::Create,
			"update" => Action::Update,
			"delete" => Action::Delete,
			other => Action::Custom(other.to_string()),
		}
	}
}

impl From<String> for Action {
	fn from(name: String) -> Self {
		Action::from(name.as_str())
	}
}

impl From<Action> for String {
	fn from(action: Action) -> Self {
		match action {
			Action::Custom(name) => name,
			known => known.as_str().to_string(),
		}
	}
}
