// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Subject schema registry.
//!
//! Storage-layer records are loosely shaped JSON; permission checks need a
//! [`SubjectInstance`]. The registry knows, per [`SubjectKind`], which record
//! attributes hold the tenant, the owner and the id, and coerces a record into
//! an instance or fails with a [`ShapeError`].
//!
//! The tenant is read from `tenantId`, or from the storage column
//! `organizationId`; if both are present they must agree. The common bug this
//! guards against is passing a freshly built record that never round-tripped
//! through the store and so carries neither. That is rejected here, before any
//! check runs; it is never read as "no tenant".

use std::collections::HashMap;

use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, instrument};

use crate::subject::SubjectInstance;
use crate::types::{SubjectKind, TenantId, UserId};

/// Default attribute carrying a record's type discriminator. Only this
/// attribute is read as a tag; a domain field such as `kind` is data.
const DEFAULT_TAG_ATTRIBUTE: &str = "__typename";

/// Tenant attributes of tenant-owned kinds, canonical name first.
const TENANT_ATTRIBUTES: &[&str] = &["tenantId", "organizationId"];

/// An organization is its own tenant.
const ORGANIZATION_TENANT_ATTRIBUTES: &[&str] = &["tenantId", "id"];

/// A candidate record does not have the shape its kind requires.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShapeError {
	#[error("{kind} candidate must be a JSON object")]
	NotAnObject { kind: SubjectKind },

	#[error("candidate is tagged {found}, expected {expected}")]
	KindMismatch { expected: SubjectKind, found: String },

	#[error("{kind} candidate is missing required attribute '{attribute}'")]
	MissingAttribute {
		kind: SubjectKind,
		attribute: &'static str,
	},

	#[error("{kind} attribute '{attribute}' is invalid: {reason}")]
	InvalidAttribute {
		kind: SubjectKind,
		attribute: &'static str,
		reason: String,
	},

	#[error("no schema registered for {0}")]
	UnregisteredKind(SubjectKind),

	#[error("record could not be serialized: {0}")]
	Unserializable(String),
}

/// Which record attributes identify an instance of one subject kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubjectSchema {
	pub kind: SubjectKind,
	/// Attributes that may hold the tenant (organization) id as a UUID
	/// string. At least one is required; the first is the canonical name.
	pub tenant_attributes: &'static [&'static str],
	/// Optional; holds the owning user id as a UUID string.
	pub owner_attribute: Option<&'static str>,
	pub id_attribute: &'static str,
	/// Optional discriminator; when present it must name this kind.
	pub tag_attribute: &'static str,
}

impl SubjectSchema {
	pub const fn new(kind: SubjectKind, tenant_attributes: &'static [&'static str]) -> Self {
		Self {
			kind,
			tenant_attributes,
			owner_attribute: None,
			id_attribute: "id",
			tag_attribute: DEFAULT_TAG_ATTRIBUTE,
		}
	}

	/// Builder: declare the owner attribute.
	pub const fn with_owner(mut self, attribute: &'static str) -> Self {
		self.owner_attribute = Some(attribute);
		self
	}

	/// Builder: override the id attribute.
	pub const fn with_id(mut self, attribute: &'static str) -> Self {
		self.id_attribute = attribute;
		self
	}

	/// Builder: override the discriminator attribute.
	pub const fn with_tag(mut self, attribute: &'static str) -> Self {
		self.tag_attribute = attribute;
		self
	}

	/// Coerce `candidate` into an instance of this schema's kind.
	pub fn validate(&self, candidate: &Value) -> Result<SubjectInstance, ShapeError> {
		let kind = self.kind;
		let record = candidate
			.as_object()
			.ok_or(ShapeError::NotAnObject { kind })?;

		check_kind_tag(kind, self.tag_attribute, record)?;

		let tenant_id = self.tenant_id(record)?;
		let mut instance = SubjectInstance::new(kind, tenant_id);

		if let Some(attribute) = self.owner_attribute {
			match record.get(attribute) {
				None | Some(Value::Null) => {}
				Some(value) => {
					instance = instance.with_owner(parse_uuid_attr::<UserId>(kind, attribute, value)?)
				}
			}
		}

		match record.get(self.id_attribute) {
			None | Some(Value::Null) => {}
			Some(Value::String(id)) => instance = instance.with_id(id.as_str()),
			Some(Value::Number(id)) => instance = instance.with_id(id.to_string()),
			Some(other) => {
				return Err(ShapeError::InvalidAttribute {
					kind,
					attribute: self.id_attribute,
					reason: format!("expected a string or number, found {}", json_type(other)),
				})
			}
		}

		Ok(instance)
	}

	fn tenant_id(&self, record: &Map<String, Value>) -> Result<TenantId, ShapeError> {
		let kind = self.kind;
		let mut resolved: Option<TenantId> = None;

		for &attribute in self.tenant_attributes {
			let value = match record.get(attribute) {
				None | Some(Value::Null) => continue,
				Some(value) => value,
			};
			let tenant_id = parse_uuid_attr::<TenantId>(kind, attribute, value)?;
			match resolved {
				Some(earlier) if earlier != tenant_id => {
					return Err(ShapeError::InvalidAttribute {
						kind,
						attribute,
						reason: format!("disagrees with tenant {earlier}"),
					})
				}
				_ => resolved = Some(tenant_id),
			}
		}

		resolved.ok_or(ShapeError::MissingAttribute {
			kind,
			attribute: self.tenant_attributes.first().copied().unwrap_or("tenantId"),
		})
	}
}

/// Per-kind schemas used to validate records before checks.
#[derive(Debug, Clone, Default)]
pub struct SubjectSchemaRegistry {
	schemas: HashMap<SubjectKind, SubjectSchema>,
}

impl SubjectSchemaRegistry {
	/// An empty registry; every kind is unregistered.
	pub fn new() -> Self {
		Self::default()
	}

	/// The schemas for the built-in subject kinds.
	pub fn standard() -> Self {
		let mut registry = Self::new();
		registry
			.register(SubjectSchema::new(SubjectKind::Instrument, TENANT_ATTRIBUTES))
			.register(SubjectSchema::new(SubjectKind::InstrumentData, TENANT_ATTRIBUTES))
			.register(
				SubjectSchema::new(SubjectKind::Organization, ORGANIZATION_TENANT_ATTRIBUTES)
					.with_owner("ownerId"),
			)
			.register(SubjectSchema::new(SubjectKind::User, TENANT_ATTRIBUTES).with_owner("id"))
			.register(SubjectSchema::new(SubjectKind::Invite, TENANT_ATTRIBUTES).with_owner("authorId"));
		registry
	}

	/// Register a schema, replacing any earlier one for the same kind.
	pub fn register(&mut self, schema: SubjectSchema) -> &mut Self {
		self.schemas.insert(schema.kind, schema);
		self
	}

	pub fn schema(&self, kind: SubjectKind) -> Option<&SubjectSchema> {
		self.schemas.get(&kind)
	}

	/// Validate a loosely typed record as an instance of `kind`.
	#[instrument(level = "trace", skip(self, candidate), fields(kind = %kind))]
	pub fn validate(&self, kind: SubjectKind, candidate: &Value) -> Result<SubjectInstance, ShapeError> {
		let schema = self
			.schema(kind)
			.ok_or(ShapeError::UnregisteredKind(kind))?;
		schema.validate(candidate).inspect_err(|err| {
			debug!(error = %err, "subject candidate rejected");
		})
	}

	/// Serialize a typed record and validate it as an instance of `kind`.
	pub fn validate_record<T: Serialize>(
		&self,
		kind: SubjectKind,
		record: &T,
	) -> Result<SubjectInstance, ShapeError> {
		let value =
			serde_json::to_value(record).map_err(|e| ShapeError::Unserializable(e.to_string()))?;
		self.validate(kind, &value)
	}
}

fn check_kind_tag(
	kind: SubjectKind,
	attribute: &str,
	record: &Map<String, Value>,
) -> Result<(), ShapeError> {
	let Some(tag) = record.get(attribute) else {
		return Ok(());
	};
	let found = match tag {
		Value::String(s) => s.clone(),
		other => other.to_string(),
	};
	if found != kind.as_str() {
		return Err(ShapeError::KindMismatch {
			expected: kind,
			found,
		});
	}
	Ok(())
}

fn parse_uuid_attr<T>(
	kind: SubjectKind,
	attribute: &'static str,
	value: &Value,
) -> Result<T, ShapeError>
where
	T: std::str::FromStr<Err = uuid::Error>,
{
	let Value::String(raw) = value else {
		return Err(ShapeError::InvalidAttribute {
			kind,
			attribute,
			reason: format!("expected a UUID string, found {}", json_type(value)),
		});
	};
	raw.parse().map_err(|e: uuid::Error| ShapeError::InvalidAttribute {
		kind,
		attribute,
		reason: e.to_string(),
	})
}

fn json_type(value: &Value) -> &'static str {
	match value {
		Value::Null => "null",
		Value::Bool(_) => "boolean",
		Value::Number(_) => "number",
		Value::String(_) => "string",
		Value::Array(_) => "array",
		Value::Object(_) => "object",
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;

	#[test]
	fn standard_registry_covers_every_kind() {
		let registry = SubjectSchemaRegistry::standard();
		for kind in SubjectKind::all() {
			assert!(registry.schema(*kind).is_some(), "{kind} has no schema");
		}
	}

	#[test]
	fn valid_record_becomes_instance() {
		let tenant = TenantId::generate();
		let registry = SubjectSchemaRegistry::standard();
		let instance = registry
			.validate(
				SubjectKind::InstrumentData,
				&json!({ "id": 17, "organizationId": tenant.to_string(), "value": 3.2 }),
			)
			.unwrap();

		assert_eq!(instance.kind(), SubjectKind::InstrumentData);
		assert_eq!(instance.tenant_id(), tenant);
		assert_eq!(instance.id(), Some("17"));
		assert_eq!(instance.owner_id(), None);
	}

	#[test]
	fn missing_tenant_is_a_shape_error() {
		let registry = SubjectSchemaRegistry::standard();
		let err = registry
			.validate(SubjectKind::Instrument, &json!({ "id": "abc", "name": "thermocouple" }))
			.unwrap_err();
		assert_eq!(
			err,
			ShapeError::MissingAttribute {
				kind: SubjectKind::Instrument,
				attribute: "tenantId",
			}
		);
	}

	#[test]
	fn canonical_tenant_attribute_is_accepted() {
		let tenant = TenantId::generate();
		let instance = SubjectSchemaRegistry::standard()
			.validate(
				SubjectKind::InstrumentData,
				&json!({ "kind": "InstrumentData", "tenantId": tenant.to_string() }),
			)
			.unwrap();
		assert_eq!(instance.tenant_id(), tenant);
	}

	#[test]
	fn tenant_aliases_must_agree() {
		let tenant = TenantId::generate();
		let registry = SubjectSchemaRegistry::standard();

		let same = json!({ "tenantId": tenant.to_string(), "organizationId": tenant.to_string() });
		assert_eq!(
			registry.validate(SubjectKind::Invite, &same).unwrap().tenant_id(),
			tenant
		);

		let split = json!({
			"tenantId": tenant.to_string(),
			"organizationId": TenantId::generate().to_string(),
		});
		let err = registry.validate(SubjectKind::Invite, &split).unwrap_err();
		assert!(matches!(
			err,
			ShapeError::InvalidAttribute {
				attribute: "organizationId",
				..
			}
		));
	}

	#[test]
	fn null_tenant_is_a_shape_error() {
		let registry = SubjectSchemaRegistry::standard();
		let err = registry
			.validate(SubjectKind::Instrument, &json!({ "organizationId": null }))
			.unwrap_err();
		assert!(matches!(err, ShapeError::MissingAttribute { .. }));
	}

	#[test]
	fn malformed_tenant_is_rejected() {
		let registry = SubjectSchemaRegistry::standard();
		let err = registry
			.validate(SubjectKind::Instrument, &json!({ "organizationId": "T1" }))
			.unwrap_err();
		assert!(matches!(
			err,
			ShapeError::InvalidAttribute {
				attribute: "organizationId",
				..
			}
		));

		let err = registry
			.validate(SubjectKind::Instrument, &json!({ "organizationId": 7 }))
			.unwrap_err();
		assert!(err.to_string().contains("found number"));
	}

	#[test]
	fn kind_tag_must_match() {
		let registry = SubjectSchemaRegistry::standard();
		let err = registry
			.validate(
				SubjectKind::Instrument,
				&json!({ "__typename": "Invite", "organizationId": TenantId::generate().to_string() }),
			)
			.unwrap_err();
		assert_eq!(
			err,
			ShapeError::KindMismatch {
				expected: SubjectKind::Instrument,
				found: "Invite".to_string(),
			}
		);
	}

	#[test]
	fn matching_kind_tag_is_accepted() {
		let registry = SubjectSchemaRegistry::standard();
		let instance = registry
			.validate(
				SubjectKind::Invite,
				&json!({ "__typename": "Invite", "organizationId": TenantId::generate().to_string() }),
			)
			.unwrap();
		assert_eq!(instance.kind(), SubjectKind::Invite);
	}

	#[test]
	fn domain_kind_field_is_not_a_tag() {
		let tenant = TenantId::generate();
		let instance = SubjectSchemaRegistry::standard()
			.validate(
				SubjectKind::Instrument,
				&json!({ "kind": "sensor", "organizationId": tenant.to_string() }),
			)
			.unwrap();
		assert_eq!(instance.kind(), SubjectKind::Instrument);
		assert_eq!(instance.tenant_id(), tenant);
	}

	#[test]
	fn schema_can_name_its_own_tag() {
		let mut registry = SubjectSchemaRegistry::new();
		registry.register(SubjectSchema::new(SubjectKind::Instrument, TENANT_ATTRIBUTES).with_tag("type"));

		let err = registry
			.validate(
				SubjectKind::Instrument,
				&json!({ "type": "User", "tenantId": TenantId::generate().to_string() }),
			)
			.unwrap_err();
		assert!(matches!(err, ShapeError::KindMismatch { .. }));
	}

	#[test]
	fn serialized_instance_validates_back() {
		let instance = SubjectInstance::new(SubjectKind::Invite, TenantId::generate())
			.with_owner(UserId::generate())
			.with_id("inv-9");
		let value = serde_json::to_value(&instance).unwrap();
		let back = SubjectSchemaRegistry::standard()
			.validate(SubjectKind::Invite, &value)
			.unwrap();
		assert_eq!(back.tenant_id(), instance.tenant_id());
		assert_eq!(back.id(), Some("inv-9"));
	}

	#[test]
	fn organization_is_its_own_tenant() {
		let org = TenantId::generate();
		let owner = UserId::generate();
		let registry = SubjectSchemaRegistry::standard();
		let instance = registry
			.validate(
				SubjectKind::Organization,
				&json!({ "id": org.to_string(), "ownerId": owner.to_string() }),
			)
			.unwrap();
		assert_eq!(instance.tenant_id(), org);
		assert_eq!(instance.owner_id(), Some(owner));
	}

	#[test]
	fn user_record_owns_itself() {
		let user = UserId::generate();
		let registry = SubjectSchemaRegistry::standard();
		let instance = registry
			.validate(
				SubjectKind::User,
				&json!({ "id": user.to_string(), "organizationId": TenantId::generate().to_string() }),
			)
			.unwrap();
		assert_eq!(instance.owner_id(), Some(user));
	}

	#[test]
	fn non_object_candidate_is_rejected() {
		let registry = SubjectSchemaRegistry::standard();
		let err = registry
			.validate(SubjectKind::User, &json!(["organizationId"]))
			.unwrap_err();
		assert_eq!(err, ShapeError::NotAnObject { kind: SubjectKind::User });
	}

	#[test]
	fn unregistered_kind_is_rejected() {
		let registry = SubjectSchemaRegistry::new();
		let err = registry
			.validate(SubjectKind::User, &json!({}))
			.unwrap_err();
		assert_eq!(err, ShapeError::UnregisteredKind(SubjectKind::User));
	}

	#[test]
	fn typed_records_validate_through_serde() {
		#[derive(Serialize)]
		#[serde(rename_all = "camelCase")]
		struct InstrumentRow {
			id: String,
			organization_id: TenantId,
			serial: String,
		}

		let row = InstrumentRow {
			id: "inst-1".to_string(),
			organization_id: TenantId::generate(),
			serial: "SN-001".to_string(),
		};
		let instance = SubjectSchemaRegistry::standard()
			.validate_record(SubjectKind::Instrument, &row)
			.unwrap();
		assert_eq!(instance.tenant_id(), row.organization_id);
		assert_eq!(instance.id(), Some("inst-1"));
	}

	#[test]
	fn later_registration_replaces_earlier() {
		let mut registry = SubjectSchemaRegistry::standard();
		registry.register(SubjectSchema::new(SubjectKind::Instrument, &["labId"]));
		let tenant = TenantId::generate();
		let instance = registry
			.validate(SubjectKind::Instrument, &json!({ "labId": tenant.to_string() }))
			.unwrap();
		assert_eq!(instance.tenant_id(), tenant);
	}
}
