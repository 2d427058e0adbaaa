//! Field projection for list responses.
//!
//! Each entity kind has a fixed table of output fields. A field is read from the first source
//! key that is present and non-null; when none is, the field's default applies. Required
//! fields have no default and their absence is a [`ClientError::Malformed`].
//!
//! Every table lists its own output name among the sources, so formatting an already formatted
//! record yields the same record.

use crate::client::json_kind;
use crate::error::{ClientError, Result};
use serde_json::{Map, Value};
use std::fmt;

/// Entity kinds with a projection table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Customer,
    Project,
    Offering,
    Resource,
    Invoice,
}

impl EntityKind {
    fn fields(self) -> &'static [FieldSpec] {
        match self {
            Self::Customer => CUSTOMER_FIELDS,
            Self::Project => PROJECT_FIELDS,
            Self::Offering => OFFERING_FIELDS,
            Self::Resource => RESOURCE_FIELDS,
            Self::Invoice => INVOICE_FIELDS,
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Customer => "customer",
            Self::Project => "project",
            Self::Offering => "offering",
            Self::Resource => "resource",
            Self::Invoice => "invoice",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy)]
enum FieldDefault {
    Required,
    EmptyString,
    NotAvailable,
    False,
    Null,
    Text(&'static str),
}

impl FieldDefault {
    fn value(self) -> Option<Value> {
        match self {
            Self::Required => None,
            Self::EmptyString => Some(Value::String(String::new())),
            Self::NotAvailable => Some(Value::String(NOT_AVAILABLE.to_string())),
            Self::False => Some(Value::Bool(false)),
            Self::Null => Some(Value::Null),
            Self::Text(s) => Some(Value::String(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct FieldSpec {
    output: &'static str,
    sources: &'static [&'static str],
    default: FieldDefault,
}

/// Placeholder for absent descriptive fields.
pub const NOT_AVAILABLE: &str = "N/A";

const fn field(
    output: &'static str,
    sources: &'static [&'static str],
    default: FieldDefault,
) -> FieldSpec {
    FieldSpec {
        output,
        sources,
        default,
    }
}

use FieldDefault::{EmptyString, False, NotAvailable, Null, Required, Text};

const CUSTOMER_FIELDS: &[FieldSpec] = &[
    field("uuid", &["uuid"], Required),
    field("name", &["name"], Required),
    field("abbreviation", &["abbreviation"], EmptyString),
    field("native_name", &["native_name"], EmptyString),
    field("email", &["email"], EmptyString),
    field("phone_number", &["phone_number"], EmptyString),
    field("address", &["address"], EmptyString),
    field(
        "organization_group",
        &["organization_group_name", "organization_group"],
        NotAvailable,
    ),
    field(
        "organization_group_type",
        &["organization_group_type_name", "organization_group_type"],
        NotAvailable,
    ),
    field("registration_code", &["registration_code"], EmptyString),
    field("agreement_number", &["agreement_number"], EmptyString),
    field("backend_id", &["backend_id"], EmptyString),
    field("archived", &["archived"], False),
];

const PROJECT_FIELDS: &[FieldSpec] = &[
    field("uuid", &["uuid"], Required),
    field("name", &["name"], Required),
    field("description", &["description"], EmptyString),
    field("created", &["created"], EmptyString),
    field("customer_name", &["customer_name"], EmptyString),
    field("customer_native_name", &["customer_native_name"], EmptyString),
    field("customer_abbreviation", &["customer_abbreviation"], EmptyString),
];

const OFFERING_FIELDS: &[FieldSpec] = &[
    field("uuid", &["uuid"], Required),
    field("name", &["name"], Required),
    field("category_title", &["category_title"], NotAvailable),
    field("customer_name", &["customer_name"], NotAvailable),
    field("state", &["state"], NotAvailable),
    field("type", &["type"], NotAvailable),
];

const RESOURCE_FIELDS: &[FieldSpec] = &[
    field("uuid", &["uuid"], Required),
    field("name", &["name"], Required),
    field("offering_name", &["offering_name"], NotAvailable),
    field("project_name", &["project_name"], NotAvailable),
    field("state", &["state"], NotAvailable),
    field("plan_name", &["plan_name"], NotAvailable),
];

const INVOICE_FIELDS: &[FieldSpec] = &[
    field("uuid", &["uuid"], Required),
    field("number", &["number"], EmptyString),
    field("customer_name", &["customer_name"], NotAvailable),
    field("state", &["state"], NotAvailable),
    field("year", &["year"], Null),
    field("month", &["month"], Null),
    field("total", &["total"], Text("0")),
    field("created", &["created"], EmptyString),
];

/// Project one raw record onto the fields of `kind`.
///
/// # Errors
///
/// Returns [`ClientError::Malformed`] if `raw` is not an object or a required field is missing
/// or null.
pub fn format_record(raw: &Value, kind: EntityKind) -> Result<Value> {
    let Value::Object(obj) = raw else {
        return Err(ClientError::Malformed(format!(
            "expected a {kind} object, got {}",
            json_kind(raw)
        )));
    };

    let mut out = Map::new();
    for spec in kind.fields() {
        let found = spec
            .sources
            .iter()
            .filter_map(|key| obj.get(*key))
            .find(|v| !v.is_null());

        let value = match (found, spec.default.value()) {
            (Some(v), _) => v.clone(),
            (None, Some(default)) => default,
            (None, None) => {
                return Err(ClientError::Malformed(format!(
                    "{kind} record is missing required field '{}'",
                    spec.output
                )));
            }
        };
        out.insert(spec.output.to_string(), value);
    }
    Ok(Value::Object(out))
}

/// Project every element of a list response. Order is preserved.
///
/// # Errors
///
/// Returns [`ClientError::Malformed`] if `raw` is not an array or any element fails
/// [`format_record`].
pub fn format_list(raw: &Value, kind: EntityKind) -> Result<Vec<Value>> {
    let Value::Array(items) = raw else {
        return Err(ClientError::Malformed(format!(
            "expected a list of {kind} records, got {}",
            json_kind(raw)
        )));
    };
    format_records(items, kind)
}

/// Same as [`format_list`] over already split elements.
///
/// # Errors
///
/// Returns [`ClientError::Malformed`] if any element fails [`format_record`].
pub fn format_records(items: &[Value], kind: EntityKind) -> Result<Vec<Value>> {
    items.iter().map(|item| format_record(item, kind)).collect()
}

#[cfg(test)]
mod tests {
    use super::{EntityKind, format_list, format_record};
    use crate::error::ClientError;
    use serde_json::json;

    #[test]
    fn customer_defaults_fill_missing_fields() {
        let raw = json!({"uuid": "u1", "name": "Acme", "email": "ops@acme.io", "extra": 1});
        let out = format_record(&raw, EntityKind::Customer).expect("format");

        assert_eq!(out["uuid"], "u1");
        assert_eq!(out["email"], "ops@acme.io");
        assert_eq!(out["abbreviation"], "");
        assert_eq!(out["organization_group"], "N/A");
        assert_eq!(out["organization_group_type"], "N/A");
        assert_eq!(out["archived"], false);
        assert!(out.get("extra").is_none());
        assert_eq!(out.as_object().map(|o| o.len()), Some(13));
    }

    #[test]
    fn customer_organization_group_is_read_from_name_field() {
        let raw = json!({
            "uuid": "u1",
            "name": "Acme",
            "organization_group": "https://example.org/api/organization-groups/og1/",
            "organization_group_name": "Universities",
            "organization_group_type_name": "Education"
        });
        let out = format_record(&raw, EntityKind::Customer).expect("format");
        assert_eq!(out["organization_group"], "Universities");
        assert_eq!(out["organization_group_type"], "Education");
    }

    #[test]
    fn null_values_fall_back_to_defaults() {
        let raw = json!({"uuid": "r1", "name": "vm-1", "state": null, "plan_name": null});
        let out = format_record(&raw, EntityKind::Resource).expect("format");
        assert_eq!(out["state"], "N/A");
        assert_eq!(out["plan_name"], "N/A");
    }

    #[test]
    fn missing_required_field_is_malformed() {
        let raw = json!({"uuid": "p1"});
        let err = format_record(&raw, EntityKind::Project).unwrap_err();
        assert!(matches!(err, ClientError::Malformed(ref m) if m.contains("'name'")), "{err}");

        let raw = json!({"uuid": null, "name": "x"});
        let err = format_record(&raw, EntityKind::Offering).unwrap_err();
        assert!(matches!(err, ClientError::Malformed(_)));
    }

    #[test]
    fn formatting_is_idempotent() {
        let raw = json!({
            "uuid": "c1",
            "name": "Acme",
            "organization_group_name": "Universities",
            "archived": true
        });
        let once = format_record(&raw, EntityKind::Customer).expect("format");
        let twice = format_record(&once, EntityKind::Customer).expect("format");
        assert_eq!(once, twice);
    }

    #[test]
    fn invoice_defaults() {
        let raw = json!({"uuid": "i1"});
        let out = format_record(&raw, EntityKind::Invoice).expect("format");
        assert_eq!(out["number"], "");
        assert_eq!(out["year"], serde_json::Value::Null);
        assert_eq!(out["total"], "0");
    }

    #[test]
    fn list_preserves_order_and_rejects_non_arrays() {
        let raw = json!([
            {"uuid": "a", "name": "first"},
            {"uuid": "b", "name": "second"}
        ]);
        let out = format_list(&raw, EntityKind::Project).expect("format");
        let names: Vec<&str> = out.iter().filter_map(|v| v["name"].as_str()).collect();
        assert_eq!(names, ["first", "second"]);

        let err = format_list(&json!({"results": []}), EntityKind::Project).unwrap_err();
        assert!(matches!(err, ClientError::Malformed(_)));

        let err = format_list(&json!(["not-an-object"]), EntityKind::Project).unwrap_err();
        assert!(matches!(err, ClientError::Malformed(_)));
    }

    #[test]
    fn empty_list_formats_to_empty() {
        let out = format_list(&json!([]), EntityKind::Offering).expect("format");
        assert!(out.is_empty());
    }
}
