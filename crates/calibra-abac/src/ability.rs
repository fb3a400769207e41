// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Ability construction and evaluation.
//!
//! An [`AbilityBuilder`] collects grants declared by the rule set; [`Ability`]
//! answers `can`/`cannot` against them. Evaluation is a pure function of the
//! ability, the action and the subject: no I/O, no shared state.
//!
//! An ability is closed over one [`Principal`]. Its conditions embed that
//! principal's tenant, so an ability must never be shared across principals
//! or reused across requests.

use calibra_config::{AbacConfig, ClassLevelChecks};
use tracing::{debug, instrument, warn};

use crate::decision::{Decision, SubjectSummary};
use crate::error::{AbacError, Result};
use crate::grant::{ActionSet, Condition, Grant, SubjectScope};
use crate::principal::Principal;
use crate::subject::SubjectRef;
use crate::types::Action;

/// Evaluation options, usually taken from [`AbacConfig`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AbilityOptions {
	pub class_level_checks: ClassLevelChecks,
	pub trace_decisions: bool,
}

impl From<&AbacConfig> for AbilityOptions {
	fn from(config: &AbacConfig) -> Self {
		Self {
			class_level_checks: config.class_level_checks,
			trace_decisions: config.trace_decisions,
		}
	}
}

/// Collects grants for one principal.
#[derive(Debug)]
pub struct AbilityBuilder {
	principal: Principal,
	grants: Vec<Grant>,
}

impl AbilityBuilder {
	pub fn new(principal: Principal) -> Self {
		Self {
			principal,
			grants: Vec::new(),
		}
	}

	pub fn principal(&self) -> &Principal {
		&self.principal
	}

	/// Allow `actions` on `subject` unconditionally.
	pub fn can(
		&mut self,
		actions: impl Into<ActionSet>,
		subject: impl Into<SubjectScope>,
	) -> &mut Self {
		self.grants.push(Grant::Unconditional {
			actions: actions.into(),
			subject: subject.into(),
		});
		self
	}

	/// Allow `actions` on instances of `subject` that satisfy `condition`.
	pub fn can_when(
		&mut self,
		actions: impl Into<ActionSet>,
		subject: impl Into<SubjectScope>,
		condition: Condition,
	) -> &mut Self {
		self.grants.push(Grant::Conditional {
			actions: actions.into(),
			subject: subject.into(),
			condition,
		});
		self
	}

	/// Append an already-formed grant.
	pub fn grant(&mut self, grant: Grant) -> &mut Self {
		self.grants.push(grant);
		self
	}

	pub fn build(self, options: AbilityOptions) -> Ability {
		Ability {
			principal: self.principal,
			grants: self.grants,
			options,
		}
	}
}

/// The queryable set of grants for one principal.
#[derive(Debug, Clone)]
pub struct Ability {
	principal: Principal,
	grants: Vec<Grant>,
	options: AbilityOptions,
}

impl Ability {
	/// Build an ability directly from a list of grants.
	pub fn from_grants(principal: Principal, grants: Vec<Grant>, options: AbilityOptions) -> Self {
		Self {
			principal,
			grants,
			options,
		}
	}

	pub fn principal(&self) -> &Principal {
		&self.principal
	}

	pub fn grants(&self) -> &[Grant] {
		&self.grants
	}

	pub fn options(&self) -> AbilityOptions {
		self.options
	}

	/// Returns true if some grant allows `action` on `subject`.
	pub fn can<'a>(&self, action: &Action, subject: impl Into<SubjectRef<'a>>) -> bool {
		let subject = subject.into();
		let matched = self.matching_grant(action, subject);

		if self.options.trace_decisions {
			debug!(
				user_id = %self.principal.id,
				role = %self.principal.role,
				action = %action,
				subject = %subject.kind(),
				class_level = subject.is_class_level(),
				matched_grant = ?matched,
				allowed = matched.is_some(),
				"access check"
			);
		}

		matched.is_some()
	}

	/// Exactly `!can(action, subject)`.
	pub fn cannot<'a>(&self, action: &Action, subject: impl Into<SubjectRef<'a>>) -> bool {
		!self.can(action, subject)
	}

	/// Like [`Ability::can`], but a denial is an [`AbacError::Forbidden`].
	pub fn authorize<'a>(&self, action: &Action, subject: impl Into<SubjectRef<'a>>) -> Result<()> {
		let subject = subject.into();
		if self.can(action, subject) {
			return Ok(());
		}

		warn!(
			user_id = %self.principal.id,
			tenant_id = %self.principal.tenant_id,
			role = %self.principal.role,
			action = %action,
			subject = %subject.kind(),
			"access denied"
		);
		Err(AbacError::Forbidden {
			action: action.clone(),
			subject: subject.kind(),
		})
	}

	/// Evaluate a check and return an auditable record of the outcome.
	#[instrument(
		level = "debug",
		skip_all,
		fields(
			user_id = %self.principal.id,
			action = %action,
		)
	)]
	pub fn decide<'a>(&self, action: &Action, subject: impl Into<SubjectRef<'a>>) -> Decision {
		let subject = subject.into();
		let matched_grant = self.matching_grant(action, subject);

		Decision {
			principal: self.principal.clone(),
			action: action.clone(),
			subject: SubjectSummary::from(subject),
			allowed: matched_grant.is_some(),
			matched_grant,
		}
	}

	/// Index of the first grant that matches; grants are tried in declaration
	/// order but the outcome does not depend on it.
	fn matching_grant(&self, action: &Action, subject: SubjectRef<'_>) -> Option<usize> {
		self
			.grants
			.iter()
			.position(|grant| grant.matches(action, subject, self.options.class_level_checks))
	}
}
