// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Principal resolution.
//!
//! A [`Principal`] is the actor a check is evaluated for: one user, acting in
//! one organization, under one role. It is built per request by
//! [`resolve_principal`] from a [`MembershipStore`], the only collaborator in
//! this crate that performs I/O.
//!
//! # Resolution Flow
//!
//! ```text
//! (user id, tenant ref) → MembershipStore::find_membership
//!                              │
//!                              ├── None            → Unauthorized
//!                              ├── Err(_)          → MembershipLookup (fatal)
//!                              └── Some(membership) → Role::from_str → Principal
//!                                                          │
//!                                                          └── unknown role → UnknownRole (fatal)
//! ```

use std::collections::HashMap;
use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{instrument, warn};

use crate::error::{AbacError, MembershipStoreError, Result};
use crate::types::{Role, TenantId, UserId};

/// The authenticated actor a permission check is evaluated for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Principal {
	pub id: UserId,
	pub tenant_id: TenantId,
	pub role: Role,
}

impl Principal {
	pub fn new(id: UserId, tenant_id: TenantId, role: Role) -> Self {
		Self { id, tenant_id, role }
	}
}

/// How a request addresses the organization it acts in.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TenantRef {
	Id(TenantId),
	Slug(String),
}

impl fmt::Display for TenantRef {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			TenantRef::Id(id) => write!(f, "{id}"),
			TenantRef::Slug(slug) => f.write_str(slug),
		}
	}
}

impl From<TenantId> for TenantRef {
	fn from(id: TenantId) -> Self {
		TenantRef::Id(id)
	}
}

/// A user's membership row, as the persistence layer stores it.
///
/// The role is kept as the raw stored string; it is checked against the role
/// table when the principal is resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Membership {
	pub tenant_id: TenantId,
	pub role: String,
}

/// Looks up a user's active membership in an organization.
#[async_trait]
pub trait MembershipStore: Send + Sync {
	async fn find_membership(
		&self,
		user_id: &UserId,
		tenant: &TenantRef,
	) -> std::result::Result<Option<Membership>, MembershipStoreError>;
}

/// Resolve the principal for `user_id` acting in `tenant`.
///
/// No membership is an authorization failure, not an empty set of
/// permissions. A stored role outside the role table is fatal.
#[instrument(level = "debug", skip_all, fields(user_id = %user_id, tenant = %tenant))]
pub async fn resolve_principal(
	store: &dyn MembershipStore,
	user_id: UserId,
	tenant: &TenantRef,
) -> Result<Principal> {
	let Some(membership) = store.find_membership(&user_id, tenant).await? else {
		warn!("no active membership for requested organization");
		return Err(AbacError::Unauthorized { user_id });
	};

	if let TenantRef::Id(requested) = tenant {
		if membership.tenant_id != *requested {
			warn!(
				returned = %membership.tenant_id,
				"membership store returned a different organization"
			);
			return Err(AbacError::Unauthorized { user_id });
		}
	}

	let role: Role = membership.role.parse()?;

	Ok(Principal::new(user_id, membership.tenant_id, role))
}

/// In-memory [`MembershipStore`] for tests and embedding hosts.
#[derive(Debug, Default)]
pub struct InMemoryMembershipStore {
	inner: RwLock<MembershipTables>,
}

#[derive(Debug, Default)]
struct MembershipTables {
	slugs: HashMap<String, TenantId>,
	roles: HashMap<(UserId, TenantId), String>,
}

impl InMemoryMembershipStore {
	pub fn new() -> Self {
		Self::default()
	}

	/// Register a slug for an organization.
	pub async fn add_tenant(&self, slug: impl Into<String>, tenant_id: TenantId) {
		self.inner.write().await.slugs.insert(slug.into(), tenant_id);
	}

	/// Add or replace a membership. The role is stored verbatim.
	pub async fn add_member(&self, user_id: UserId, tenant_id: TenantId, role: impl Into<String>) {
		self
			.inner
			.write()
			.await
			.roles
			.insert((user_id, tenant_id), role.into());
	}

	/// Returns true if a membership was removed.
	pub async fn remove_member(&self, user_id: UserId, tenant_id: TenantId) -> bool {
		self
			.inner
			.write()
			.await
			.roles
			.remove(&(user_id, tenant_id))
			.is_some()
	}
}

#[async_trait]
impl MembershipStore for InMemoryMembershipStore {
	async fn find_membership(
		&self,
		user_id: &UserId,
		tenant: &TenantRef,
	) -> std::result::Result<Option<Membership>, MembershipStoreError> {
		let tables = self.inner.read().await;
		let tenant_id = match tenant {
			TenantRef::Id(id) => *id,
			TenantRef::Slug(slug) => match tables.slugs.get(slug) {
				Some(id) => *id,
				None => return Ok(None),
			},
		};

		Ok(tables
			.roles
			.get(&(*user_id, tenant_id))
			.map(|role| Membership {
				tenant_id,
				role: role.clone(),
			}))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	struct FailingStore;

	#[async_trait]
	impl MembershipStore for FailingStore {
		async fn find_membership(
			&self,
			_user_id: &UserId,
			_tenant: &TenantRef,
		) -> std::result::Result<Option<Membership>, MembershipStoreError> {
			Err(MembershipStoreError::Unavailable("connection refused".to_string()))
		}
	}

	struct MisroutedStore {
		tenant_id: TenantId,
	}

	#[async_trait]
	impl MembershipStore for MisroutedStore {
		async fn find_membership(
			&self,
			_user_id: &UserId,
			_tenant: &TenantRef,
		) -> std::result::Result<Option<Membership>, MembershipStoreError> {
			Ok(Some(Membership {
				tenant_id: self.tenant_id,
				role: "ADMIN".to_string(),
			}))
		}
	}

	#[tokio::test]
	async fn member_resolves_to_principal() {
		let store = InMemoryMembershipStore::new();
		let user = UserId::generate();
		let tenant = TenantId::generate();
		store.add_member(user, tenant, "OPERATOR").await;

		let principal = resolve_principal(&store, user, &TenantRef::Id(tenant))
			.await
			.unwrap();
		assert_eq!(principal, Principal::new(user, tenant, Role::Operator));
	}

	#[tokio::test]
	async fn slug_resolves_to_tenant_id() {
		let store = InMemoryMembershipStore::new();
		let user = UserId::generate();
		let tenant = TenantId::generate();
		store.add_tenant("acme-labs", tenant).await;
		store.add_member(user, tenant, "VIEWER").await;

		let principal = resolve_principal(&store, user, &TenantRef::Slug("acme-labs".to_string()))
			.await
			.unwrap();
		assert_eq!(principal.tenant_id, tenant);
		assert_eq!(principal.role, Role::Viewer);
	}

	#[tokio::test]
	async fn non_member_is_unauthorized() {
		let store = InMemoryMembershipStore::new();
		let user = UserId::generate();
		let member_of = TenantId::generate();
		store.add_member(user, member_of, "ADMIN").await;

		let err = resolve_principal(&store, user, &TenantRef::Id(TenantId::generate()))
			.await
			.unwrap_err();
		assert!(matches!(err, AbacError::Unauthorized { user_id } if user_id == user));
		assert!(err.is_denial());
	}

	#[tokio::test]
	async fn unknown_slug_is_unauthorized() {
		let store = InMemoryMembershipStore::new();
		let err = resolve_principal(
			&store,
			UserId::generate(),
			&TenantRef::Slug("nowhere".to_string()),
		)
		.await
		.unwrap_err();
		assert!(matches!(err, AbacError::Unauthorized { .. }));
	}

	#[tokio::test]
	async fn removed_member_is_unauthorized() {
		let store = InMemoryMembershipStore::new();
		let user = UserId::generate();
		let tenant = TenantId::generate();
		store.add_member(user, tenant, "EDITOR").await;
		assert!(store.remove_member(user, tenant).await);

		let err = resolve_principal(&store, user, &tenant.into())
			.await
			.unwrap_err();
		assert!(matches!(err, AbacError::Unauthorized { .. }));
	}

	#[tokio::test]
	async fn stored_role_outside_table_is_fatal() {
		let store = InMemoryMembershipStore::new();
		let user = UserId::generate();
		let tenant = TenantId::generate();
		store.add_member(user, tenant, "AUDITOR").await;

		let err = resolve_principal(&store, user, &tenant.into())
			.await
			.unwrap_err();
		assert!(matches!(err, AbacError::UnknownRole(ref r) if r == "AUDITOR"));
		assert!(err.is_fatal());
	}

	#[tokio::test]
	async fn stored_role_must_match_exactly() {
		let store = InMemoryMembershipStore::new();
		let user = UserId::generate();
		let tenant = TenantId::generate();
		store.add_member(user, tenant, "admin").await;

		let err = resolve_principal(&store, user, &tenant.into())
			.await
			.unwrap_err();
		assert!(matches!(err, AbacError::UnknownRole(ref r) if r == "admin"));
	}

	#[tokio::test]
	async fn store_failure_propagates() {
		let err = resolve_principal(&FailingStore, UserId::generate(), &TenantId::generate().into())
			.await
			.unwrap_err();
		assert!(matches!(err, AbacError::MembershipLookup(_)));
	}

	#[tokio::test]
	async fn membership_for_other_tenant_is_rejected() {
		let store = MisroutedStore {
			tenant_id: TenantId::generate(),
		};
		let err = resolve_principal(&store, UserId::generate(), &TenantId::generate().into())
			.await
			.unwrap_err();
		assert!(matches!(err, AbacError::Unauthorized { .. }));
	}
}
