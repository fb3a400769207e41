// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Subcommand handlers. Each returns what `main` prints.

use std::path::{Path, PathBuf};

use anyhow::Context;
use calibra_abac::{
	build_ability_with, resolve_principal, AbilityOptions, Action, Decision, Grant,
	InMemoryMembershipStore, Principal, Role, SubjectInstance, SubjectKind, SubjectSchemaRegistry,
	TenantId, UserId,
};
use clap::Args;
use serde_json::Value;
use tracing::{debug, instrument};

#[derive(Debug, Clone, Args)]
pub struct GrantsArgs {
	/// Role name (OWNER, ADMIN, OPERATOR, VIEWER, EDITOR)
	#[arg(long)]
	pub role: String,

	/// Organization id the principal acts in
	#[arg(long)]
	pub tenant: TenantId,
}

#[derive(Debug, Clone, Args)]
pub struct CheckArgs {
	/// Role name (OWNER, ADMIN, OPERATOR, VIEWER, EDITOR)
	#[arg(long)]
	pub role: String,

	/// Organization id the principal acts in
	#[arg(long)]
	pub tenant: TenantId,

	/// User id of the principal (random if omitted)
	#[arg(long)]
	pub user: Option<UserId>,

	/// Action to check, e.g. read, update or a custom verb
	#[arg(long)]
	pub action: String,

	/// Subject kind
	#[arg(long)]
	pub kind: SubjectKind,

	/// JSON record to check against; a class-level check when omitted
	#[arg(long)]
	pub subject: Option<PathBuf>,
}

#[derive(Debug, Clone, Args)]
pub struct ValidateArgs {
	/// Subject kind the record should match
	#[arg(long)]
	pub kind: SubjectKind,

	/// JSON record to validate
	pub file: PathBuf,
}

pub fn roles() -> Vec<&'static str> {
	Role::all().iter().map(Role::as_str).collect()
}

pub async fn grants(args: &GrantsArgs, options: AbilityOptions) -> anyhow::Result<Vec<Grant>> {
	let principal = principal_for(&args.role, args.tenant, None).await?;
	let ability = build_ability_with(&principal, options);
	Ok(ability.grants().to_vec())
}

#[instrument(skip_all, fields(role = %args.role, action = %args.action, kind = %args.kind))]
pub async fn check(args: &CheckArgs, options: AbilityOptions) -> anyhow::Result<Decision> {
	let principal = principal_for(&args.role, args.tenant, args.user).await?;
	let ability = build_ability_with(&principal, options);
	let action = Action::from(args.action.as_str());

	let decision = match &args.subject {
		Some(path) => {
			let instance = load_subject(args.kind, path)?;
			ability.decide(&action, &instance)
		}
		None => ability.decide(&action, args.kind),
	};

	debug!(allowed = decision.allowed, "check evaluated");
	Ok(decision)
}

pub fn validate(args: &ValidateArgs) -> anyhow::Result<SubjectInstance> {
	load_subject(args.kind, &args.file)
}

/// Resolve through a one-row membership store so the role string is checked
/// the same way a stored role is.
async fn principal_for(
	role: &str,
	tenant: TenantId,
	user: Option<UserId>,
) -> anyhow::Result<Principal> {
	let user = user.unwrap_or_else(UserId::generate);
	let store = InMemoryMembershipStore::new();
	store.add_member(user, tenant, role).await;

	let principal = resolve_principal(&store, user, &tenant.into()).await?;
	Ok(principal)
}

fn load_subject(kind: SubjectKind, path: &Path) -> anyhow::Result<SubjectInstance> {
	let raw = std::fs::read_to_string(path)
		.with_context(|| format!("failed to read {}", path.display()))?;
	let record: Value = serde_json::from_str(&raw)
		.with_context(|| format!("{} is not valid JSON", path.display()))?;

	let instance = SubjectSchemaRegistry::standard()
		.validate(kind, &record)
		.with_context(|| format!("{} is not a valid {kind}", path.display()))?;
	Ok(instance)
}

#[cfg(test)]
mod tests {
	use super::*;
	use calibra_abac::{AbacError, ShapeError};
	use std::io::Write;
	use tempfile::NamedTempFile;

	fn record(json: &Value) -> NamedTempFile {
		let mut file = NamedTempFile::new().unwrap();
		write!(file, "{json}").unwrap();
		file
	}

	fn check_args(role: &str, tenant: TenantId, action: &str, kind: SubjectKind) -> CheckArgs {
		CheckArgs {
			role: role.to_string(),
			tenant,
			user: None,
			action: action.to_string(),
			kind,
			subject: None,
		}
	}

	#[test]
	fn roles_lists_the_table() {
		assert_eq!(roles(), ["OWNER", "ADMIN", "OPERATOR", "VIEWER", "EDITOR"]);
	}

	#[tokio::test]
	async fn grants_for_viewer() {
		let args = GrantsArgs {
			role: "VIEWER".to_string(),
			tenant: TenantId::generate(),
		};
		let grants = grants(&args, AbilityOptions::default()).await.unwrap();
		assert_eq!(grants.len(), 1);
		assert!(grants[0].actions().permits(&Action::Read));
	}

	#[tokio::test]
	async fn unknown_role_is_an_error() {
		let args = check_args("AUDITOR", TenantId::generate(), "read", SubjectKind::Instrument);
		let err = check(&args, AbilityOptions::default()).await.unwrap_err();
		assert!(matches!(
			err.downcast_ref::<AbacError>(),
			Some(AbacError::UnknownRole(_))
		));
	}

	#[tokio::test]
	async fn class_level_check() {
		let args = check_args("ADMIN", TenantId::generate(), "create", SubjectKind::Organization);
		let decision = check(&args, AbilityOptions::default()).await.unwrap();
		assert!(decision.allowed);
		assert!(decision.subject.tenant_id.is_none());
	}

	#[tokio::test]
	async fn instance_check_uses_record_tenant() {
		let tenant = TenantId::generate();
		let own = record(&serde_json::json!({ "id": 3, "organizationId": tenant.to_string() }));
		let foreign = record(&serde_json::json!({
			"id": 4,
			"organizationId": TenantId::generate().to_string(),
		}));

		let mut args = check_args("OPERATOR", tenant, "update", SubjectKind::InstrumentData);
		args.subject = Some(own.path().to_path_buf());
		assert!(check(&args, AbilityOptions::default()).await.unwrap().allowed);

		args.subject = Some(foreign.path().to_path_buf());
		let decision = check(&args, AbilityOptions::default()).await.unwrap();
		assert!(!decision.allowed);
		assert!(decision.is_cross_tenant());
	}

	#[test]
	fn validate_reports_missing_tenant() {
		let file = record(&serde_json::json!({ "name": "thermocouple" }));
		let args = ValidateArgs {
			kind: SubjectKind::Instrument,
			file: file.path().to_path_buf(),
		};
		let err = validate(&args).unwrap_err();
		assert!(matches!(
			err.downcast_ref::<ShapeError>(),
			Some(ShapeError::MissingAttribute { .. })
		));
	}

	#[test]
	fn validate_rejects_malformed_json() {
		let mut file = NamedTempFile::new().unwrap();
		write!(file, "{{ not json").unwrap();
		let args = ValidateArgs {
			kind: SubjectKind::User,
			file: file.path().to_path_buf(),
		};
		assert!(validate(&args).is_err());
	}
}
