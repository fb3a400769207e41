// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Error types for access-control evaluation.

use thiserror::Error;

use crate::schema::ShapeError;
use crate::types::{Action, SubjectKind, UserId};

pub type Result<T> = std::result::Result<T, AbacError>;

/// Errors surfaced by the access-control engine.
#[derive(Debug, Error)]
pub enum AbacError {
	/// A role string outside the role table. Configuration bug.
	#[error("unknown role: {0}")]
	UnknownRole(String),

	#[error("unknown subject kind: {0}")]
	UnknownSubjectKind(String),

	/// A subject instance failed validation before any check ran.
	#[error(transparent)]
	Shape(#[from] ShapeError),

	/// The identity has no active membership in the requested tenant.
	#[error("user {user_id} is not a member of the requested organization")]
	Unauthorized { user_id: UserId },

	/// A permission check evaluated to false.
	#[error("not allowed to {action} {subject}")]
	Forbidden { action: Action, subject: SubjectKind },

	#[error("membership lookup failed: {0}")]
	MembershipLookup(#[from] MembershipStoreError),
}

impl AbacError {
	/// Returns true for errors that indicate a defect or an outage rather than
	/// a denial. Hosts map these to a 500-class response.
	pub fn is_fatal(&self) -> bool {
		matches!(
			self,
			AbacError::UnknownRole(_) | AbacError::MembershipLookup(_)
		)
	}

	/// Returns true for expected, user-facing authorization failures.
	pub fn is_denial(&self) -> bool {
		matches!(
			self,
			AbacError::Unauthorized { .. } | AbacError::Forbidden { .. }
		)
	}
}

/// Failures reported by a [`crate::MembershipStore`] backend.
#[derive(Debug, Error)]
pub enum MembershipStoreError {
	#[error("membership backend unavailable: {0}")]
	Unavailable(String),
}
