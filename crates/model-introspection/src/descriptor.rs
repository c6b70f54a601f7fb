//! Typed view of the model introspection document
//!
//! Field types arrive either as a bare scalar name or as an object tagging the
//! referenced model, enum or custom type. They are decided once here, so the
//! formatting code never has to inspect raw JSON.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tracing::debug;

/// A data model and its fields
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelDescriptor {
    #[serde(default)]
    pub plural_name: Option<String>,

    #[serde(default)]
    pub fields: IndexMap<String, FieldDescriptor>,

    #[serde(default)]
    pub attributes: Vec<Attribute>,

    #[serde(default)]
    pub primary_key_info: Option<PrimaryKeyInfo>,
}

impl ModelDescriptor {
    /// Authorization rules, flattened from every `auth` attribute on the model
    pub fn auth_rules(&self) -> Vec<AuthRule> {
        self.attributes
            .iter()
            .filter(|attribute| attribute.kind == "auth")
            .filter_map(|attribute| attribute.properties.get("rules"))
            .filter_map(|rules| rules.as_array())
            .flatten()
            .filter_map(|rule| {
                serde_json::from_value::<AuthRule>(rule.clone())
                    .inspect_err(|e| debug!("Skipping unreadable auth rule {rule}: {e}"))
                    .ok()
            })
            .collect()
    }

    /// The field holding the primary key
    pub fn primary_key_field(&self) -> &str {
        self.primary_key_info
            .as_ref()
            .map(|info| info.primary_key_field_name.as_str())
            .unwrap_or("id")
    }

    /// The plural form used by list queries, e.g. `listStories`
    pub fn plural_name(&self, name: &str) -> String {
        self.plural_name
            .clone()
            .unwrap_or_else(|| format!("{name}s"))
    }

    /// Whether the model has a field with the given name
    pub fn has_field(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }
}

/// A single field of a model
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDescriptor {
    #[serde(rename = "type")]
    pub field_type: FieldType,

    #[serde(default)]
    pub is_required: bool,

    #[serde(default)]
    pub is_array: bool,

    #[serde(default)]
    pub is_array_nullable: Option<bool>,

    #[serde(default)]
    pub is_read_only: bool,

    #[serde(default)]
    pub association: Option<Association>,
}

impl FieldDescriptor {
    /// The referenced model, if this field points at one
    pub fn related_model(&self) -> Option<&str> {
        match &self.field_type {
            FieldType::Model(name) => Some(name),
            _ => None,
        }
    }
}

/// The type of a field
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldType {
    Scalar(String),
    Model(String),
    Enum(String),
    NonModel(String),
}

impl FieldType {
    /// The bare type name, without the kind tag
    pub fn name(&self) -> &str {
        match self {
            FieldType::Scalar(name)
            | FieldType::Model(name)
            | FieldType::Enum(name)
            | FieldType::NonModel(name) => name,
        }
    }
}

impl<'de> Deserialize<'de> for FieldType {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Scalar(String),
            Model { model: String },
            Enum { r#enum: String },
            NonModel {
                #[serde(rename = "nonModel")]
                non_model: String,
            },
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Scalar(name) => FieldType::Scalar(name),
            Raw::Model { model } => FieldType::Model(model),
            Raw::Enum { r#enum } => FieldType::Enum(r#enum),
            Raw::NonModel { non_model } => FieldType::NonModel(non_model),
        })
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldType::Scalar(name) => write!(f, "{name}"),
            FieldType::Model(name) => write!(f, "{name} (model)"),
            FieldType::Enum(name) => write!(f, "{name} (enum)"),
            FieldType::NonModel(name) => write!(f, "{name} (custom type)"),
        }
    }
}

/// Relationship metadata attached to a field
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Association {
    pub connection_type: ConnectionType,

    #[serde(default, deserialize_with = "one_or_many")]
    pub associated_with: Vec<String>,

    #[serde(default, deserialize_with = "one_or_many")]
    pub target_names: Vec<String>,
}

/// The kind of relationship an association implements
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConnectionType {
    HasOne,
    HasMany,
    BelongsTo,
    ManyToMany,
    #[serde(other)]
    Unknown,
}

impl fmt::Display for ConnectionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ConnectionType::HasOne => "HAS_ONE",
            ConnectionType::HasMany => "HAS_MANY",
            ConnectionType::BelongsTo => "BELONGS_TO",
            ConnectionType::ManyToMany => "MANY_TO_MANY",
            ConnectionType::Unknown => "UNKNOWN",
        })
    }
}

/// A model-level attribute such as `model`, `key` or `auth`
#[derive(Debug, Clone, Deserialize)]
pub struct Attribute {
    #[serde(rename = "type")]
    pub kind: String,

    #[serde(default)]
    pub properties: Value,
}

/// A single authorization rule
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AuthRule {
    pub provider: Option<String>,
    pub allow: String,
    pub operations: Vec<String>,
    pub owner_field: Option<String>,
    pub groups: Vec<String>,
}

impl fmt::Display for AuthRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "provider: {}, allow: {}",
            self.provider.as_deref().unwrap_or("default"),
            self.allow
        )?;
        if let Some(owner_field) = &self.owner_field {
            write!(f, ", owner field: {owner_field}")?;
        }
        if !self.groups.is_empty() {
            write!(f, ", groups: {}", self.groups.join(", "))?;
        }
        if self.operations.is_empty() {
            write!(f, ", operations: all")
        } else {
            write!(f, ", operations: {}", self.operations.join(", "))
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrimaryKeyInfo {
    pub primary_key_field_name: String,
    #[serde(default)]
    pub sort_key_field_names: Vec<String>,
}

/// An enum and its allowed values
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EnumDescriptor {
    /// Taken from the key in the document's `enums` map
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub values: Vec<String>,
}

impl fmt::Display for EnumDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name, self.values.join(", "))
    }
}

/// Older documents write single-valued association keys as plain strings
fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    Ok(match Option::<OneOrMany>::deserialize(deserializer)? {
        Some(OneOrMany::One(value)) => vec![value],
        Some(OneOrMany::Many(values)) => values,
        None => Vec::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    #[case(json!("String"), FieldType::Scalar("String".to_string()))]
    #[case(json!({ "model": "Character" }), FieldType::Model("Character".to_string()))]
    #[case(json!({ "enum": "Status" }), FieldType::Enum("Status".to_string()))]
    #[case(json!({ "nonModel": "Address" }), FieldType::NonModel("Address".to_string()))]
    fn it_decides_field_types_at_load_time(#[case] raw: Value, #[case] expected: FieldType) {
        let field_type: FieldType = serde_json::from_value(raw).unwrap();
        assert_eq!(field_type, expected);
    }

    #[test]
    fn it_rejects_unknown_field_type_shapes() {
        assert!(serde_json::from_value::<FieldType>(json!({ "union": "Thing" })).is_err());
    }

    #[test]
    fn it_accepts_single_string_association_keys() {
        let association: Association = serde_json::from_value(json!({
            "connectionType": "BELONGS_TO",
            "targetNames": "characterId",
        }))
        .unwrap();

        assert_eq!(association.connection_type, ConnectionType::BelongsTo);
        assert_eq!(association.target_names, vec!["characterId"]);
        assert!(association.associated_with.is_empty());
    }

    #[test]
    fn it_tolerates_unknown_connection_types() {
        let association: Association = serde_json::from_value(json!({
            "connectionType": "HAS_SOME",
        }))
        .unwrap();

        assert_eq!(association.connection_type, ConnectionType::Unknown);
    }

    #[test]
    fn it_only_reads_rules_from_auth_attributes() {
        let model: ModelDescriptor = serde_json::from_value(json!({
            "fields": {},
            "attributes": [
                { "type": "model", "properties": { "rules": [{ "allow": "ignored" }] } },
                {
                    "type": "auth",
                    "properties": {
                        "rules": [
                            {
                                "provider": "userPools",
                                "ownerField": "owner",
                                "allow": "owner",
                                "identityClaim": "cognito:username",
                                "operations": ["create", "update", "delete", "read"]
                            },
                            { "allow": "public", "provider": "apiKey", "operations": ["read"] }
                        ]
                    }
                }
            ]
        }))
        .unwrap();

        let rules = model.auth_rules();
        assert_eq!(rules.len(), 2);
        assert_eq!(
            rules.first().map(ToString::to_string).as_deref(),
            Some("provider: userPools, allow: owner, owner field: owner, operations: create, update, delete, read")
        );
        assert_eq!(
            rules.get(1).map(ToString::to_string).as_deref(),
            Some("provider: apiKey, allow: public, operations: read")
        );
    }

    #[test]
    fn it_defaults_primary_key_and_plural_name() {
        let model = ModelDescriptor::default();
        assert_eq!(model.primary_key_field(), "id");
        assert_eq!(model.plural_name("Story"), "Storys");
    }
}
