// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Permission rule set.
//!
//! Each role maps to a function that declares its grants into an
//! [`AbilityBuilder`]. Dispatch is an exhaustive `match` on [`Role`], so a
//! role added to the table without a rule function does not compile.
//!
//! | role     | grants                                                        |
//! |----------|---------------------------------------------------------------|
//! | OWNER    | manage all                                                    |
//! | ADMIN    | manage every tenant-owned kind, own organization only         |
//! | OPERATOR | update InstrumentData, own organization only                  |
//! | VIEWER   | read InstrumentData, own organization only                    |
//! | EDITOR   | create + update InstrumentData, own organization only         |

use tracing::{debug, instrument};

use crate::ability::{Ability, AbilityBuilder, AbilityOptions};
use crate::grant::{Condition, SubjectScope};
use crate::principal::Principal;
use crate::types::{Action, Role, SubjectKind};

/// Kinds a tenant admin has full control over.
const TENANT_ADMIN_KINDS: &[SubjectKind] = &[
	SubjectKind::Instrument,
	SubjectKind::InstrumentData,
	SubjectKind::Organization,
	SubjectKind::User,
	SubjectKind::Invite,
];

/// Declare the grants of `principal`'s role.
pub fn define_grants(principal: &Principal, grants: &mut AbilityBuilder) {
	match principal.role {
		Role::Owner => owner(principal, grants),
		Role::Admin => admin(principal, grants),
		Role::Operator => operator(principal, grants),
		Role::Viewer => viewer(principal, grants),
		Role::Editor => editor(principal, grants),
	}
}

/// Build the ability for `principal` with default options.
pub fn build_ability(principal: &Principal) -> Ability {
	build_ability_with(principal, AbilityOptions::default())
}

/// Build the ability for `principal`.
#[instrument(
	level = "debug",
	skip_all,
	fields(
		user_id = %principal.id,
		tenant_id = %principal.tenant_id,
		role = %principal.role,
	)
)]
pub fn build_ability_with(principal: &Principal, options: AbilityOptions) -> Ability {
	let mut builder = AbilityBuilder::new(principal.clone());
	define_grants(principal, &mut builder);
	let ability = builder.build(options);
	debug!(grants = ability.grants().len(), "ability built");
	ability
}

fn same_tenant(principal: &Principal) -> Condition {
	Condition::TenantEquals(principal.tenant_id)
}

fn owner(_principal: &Principal, grants: &mut AbilityBuilder) {
	grants.can(Action::Manage, SubjectScope::All);
}

fn admin(principal: &Principal, grants: &mut AbilityBuilder) {
	grants.can_when(Action::Manage, TENANT_ADMIN_KINDS, same_tenant(principal));
}

fn operator(principal: &Principal, grants: &mut AbilityBuilder) {
	grants.can_when(
		Action::Update,
		SubjectKind::InstrumentData,
		same_tenant(principal),
	);
}

fn viewer(principal: &Principal, grants: &mut AbilityBuilder) {
	grants.can_when(
		Action::Read,
		SubjectKind::InstrumentData,
		same_tenant(principal),
	);
}

fn editor(principal: &Principal, grants: &mut AbilityBuilder) {
	grants.can_when(
		[Action::Create, Action::Update],
		SubjectKind::InstrumentData,
		same_tenant(principal),
	);
}
