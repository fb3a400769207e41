// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Attribute-Based Access Control for instruments and their data.
//!
//! A request is authorized in four steps:
//!
//! 1. [`resolve_principal`] turns a user id and an organization into a
//!    [`Principal`] via a [`MembershipStore`]
//! 2. [`build_ability`] runs the rule set for the principal's [`Role`]
//! 3. loaded records are coerced into [`SubjectInstance`]s by the
//!    [`SubjectSchemaRegistry`]
//! 4. [`Ability::can`] / [`Ability::cannot`] answer the check
//!
//! # Example
//!
//! ```
//! use calibra_abac::{
//!     build_ability, Action, Principal, Role, SubjectKind, SubjectSchemaRegistry, TenantId,
//!     UserId,
//! };
//! use serde_json::json;
//!
//! let tenant = TenantId::generate();
//! let principal = Principal::new(UserId::generate(), tenant, Role::Operator);
//! let ability = build_ability(&principal);
//!
//! let record = json!({ "id": 7, "tenantId": tenant.to_string() });
//! let data = SubjectSchemaRegistry::standard()
//!     .validate(SubjectKind::InstrumentData, &record)
//!     .unwrap();
//!
//! assert!(ability.can(&Action::Update, &data));
//! assert!(ability.cannot(&Action::Delete, &data));
//! ```

pub mod ability;
pub mod decision;
pub mod error;
pub mod grant;
pub mod principal;
pub mod rules;
pub mod schema;
pub mod subject;
pub mod types;

pub use ability::{Ability, AbilityBuilder, AbilityOptions};
pub use calibra_config::ClassLevelChecks;
pub use decision::{AccessEventType, Decision, SubjectSummary};
pub use error::{AbacError, MembershipStoreError, Result};
pub use grant::{ActionSet, Condition, Grant, SubjectScope};
pub use principal::{
	resolve_principal, InMemoryMembershipStore, Membership, MembershipStore, Principal, TenantRef,
};
pub use rules::{build_ability, build_ability_with, define_grants};
pub use schema::{ShapeError, SubjectSchema, SubjectSchemaRegistry};
pub use subject::{SubjectInstance, SubjectRef};
pub use types::{Action, Role, SubjectKind, TenantId, UserId};
