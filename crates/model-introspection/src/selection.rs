//! Selection sets for composed operations
//!
//! Mutation results are shaped from the writable fields of a model. Related
//! models are only followed a bounded number of levels, so self-referential
//! and cyclic model graphs still produce a finite selection set.

use crate::ModelIntrospection;
use crate::descriptor::{FieldType, ModelDescriptor};
use crate::error::IntrospectionError;

/// Beyond this depth a related model is projected to its `id` only
pub const MAX_SELECTION_DEPTH: usize = 1;

impl ModelIntrospection {
    /// Build the selection set used to shape the result of a mutation on a model.
    ///
    /// Read-only fields are never selected. Collection-valued references select
    /// only the related ids, singular references select `id` (and `name`, when the
    /// related model has one) at depth 0 and recurse one level otherwise.
    pub fn selection_set(
        &self,
        model_name: &str,
        depth: usize,
    ) -> Result<String, IntrospectionError> {
        let model = self.model(model_name)?;
        Ok(self.writable_selection(model, depth))
    }

    /// Build the selection set used to read records of a model: every scalar and
    /// enum field, including read-only ones.
    pub fn read_selection_set(&self, model_name: &str) -> Result<String, IntrospectionError> {
        let model = self.model(model_name)?;
        let selection = model
            .fields
            .iter()
            .filter(|(_, field)| {
                matches!(field.field_type, FieldType::Scalar(_) | FieldType::Enum(_))
            })
            .map(|(name, _)| name.as_str())
            .collect::<Vec<_>>()
            .join(" ");

        Ok(or_id(selection))
    }

    fn writable_selection(&self, model: &ModelDescriptor, depth: usize) -> String {
        if depth > MAX_SELECTION_DEPTH {
            return "id".to_string();
        }

        let selection = model
            .fields
            .iter()
            .filter(|(_, field)| !field.is_read_only)
            .filter_map(|(name, field)| match &field.field_type {
                FieldType::Scalar(_) | FieldType::Enum(_) => Some(name.clone()),
                FieldType::NonModel(_) => None,
                FieldType::Model(_) if field.is_array => {
                    Some(format!("{name} {{ items {{ id }} }}"))
                }
                FieldType::Model(related) if depth == 0 => {
                    Some(format!("{name} {{ {} }}", self.shallow_projection(related)))
                }
                FieldType::Model(related) => {
                    let nested = self
                        .models
                        .get(related)
                        .map(|related| self.writable_selection(related, depth + 1))
                        .unwrap_or_else(|| "id".to_string());
                    Some(format!("{name} {{ {nested} }}"))
                }
            })
            .collect::<Vec<_>>()
            .join(" ");

        or_id(selection)
    }

    fn shallow_projection(&self, related: &str) -> &'static str {
        if self
            .models
            .get(related)
            .is_some_and(|model| model.has_field("name"))
        {
            "id name"
        } else {
            "id"
        }
    }
}

fn or_id(selection: String) -> String {
    if selection.is_empty() {
        "id".to_string()
    } else {
        selection
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use insta::assert_snapshot;
    use serde_json::json;

    fn introspection() -> ModelIntrospection {
        serde_json::from_value(json!({
            "version": 1,
            "models": {
                "Story": {
                    "fields": {
                        "id": { "type": "ID", "isRequired": true },
                        "title": { "type": "String", "isRequired": true },
                        "status": { "type": { "enum": "Status" } },
                        "meta": { "type": { "nonModel": "Meta" } },
                        "characterId": { "type": "ID" },
                        "character": {
                            "type": { "model": "Character" },
                            "association": { "connectionType": "BELONGS_TO", "targetNames": ["characterId"] }
                        },
                        "chapters": {
                            "type": { "model": "Chapter" },
                            "isArray": true,
                            "association": { "connectionType": "HAS_MANY", "associatedWith": ["storyId"] }
                        },
                        "createdAt": { "type": "AWSDateTime", "isReadOnly": true }
                    }
                },
                "Character": {
                    "fields": {
                        "id": { "type": "ID", "isRequired": true },
                        "name": { "type": "String", "isRequired": true }
                    }
                },
                "Chapter": {
                    "fields": {
                        "id": { "type": "ID", "isRequired": true },
                        "storyId": { "type": "ID" }
                    }
                },
                "Employee": {
                    "fields": {
                        "id": { "type": "ID", "isRequired": true },
                        "managerId": { "type": "ID" },
                        "manager": {
                            "type": { "model": "Employee" },
                            "association": { "connectionType": "BELONGS_TO", "targetNames": ["managerId"] }
                        },
                        "reports": {
                            "type": { "model": "Employee" },
                            "isArray": true,
                            "association": { "connectionType": "HAS_MANY", "associatedWith": ["managerId"] }
                        }
                    }
                },
                "Audit": {
                    "fields": {
                        "createdAt": { "type": "AWSDateTime", "isReadOnly": true }
                    }
                }
            },
            "enums": {
                "Status": { "name": "Status", "values": ["DRAFT", "PUBLISHED"] }
            }
        }))
        .unwrap()
    }

    /// The deepest level of `{ }` nesting in a selection set
    fn nesting(selection: &str) -> usize {
        selection
            .chars()
            .fold((0usize, 0usize), |(current, max), c| match c {
                '{' => (current + 1, max.max(current + 1)),
                '}' => (current.saturating_sub(1), max),
                _ => (current, max),
            })
            .1
    }

    #[test]
    fn it_selects_writable_fields_at_depth_zero() {
        let selection = introspection().selection_set("Story", 0).unwrap();

        assert_snapshot!(
            selection,
            @"id title status characterId character { id name } chapters { items { id } }"
        );
    }

    #[test]
    fn it_excludes_read_only_fields() {
        let selection = introspection().selection_set("Story", 0).unwrap();
        assert!(!selection.contains("createdAt"));
    }

    #[test]
    fn it_omits_name_when_the_related_model_has_none() {
        let selection = introspection().selection_set("Employee", 0).unwrap();

        assert_eq!(
            selection,
            "id managerId manager { id } reports { items { id } }"
        );
    }

    #[test]
    fn it_recurses_one_level_at_depth_one() {
        let selection = introspection().selection_set("Employee", 1).unwrap();

        assert_eq!(
            selection,
            "id managerId manager { id } reports { items { id } }"
        );
    }

    #[test]
    fn it_uses_an_id_placeholder_past_the_depth_limit() {
        assert_eq!(introspection().selection_set("Story", 2).unwrap(), "id");
    }

    #[test]
    fn self_referential_models_terminate_within_two_levels() {
        let introspection = introspection();
        for depth in 0..4 {
            let selection = introspection.selection_set("Employee", depth).unwrap();
            assert!(nesting(&selection) <= 2, "{selection}");
        }
    }

    #[test]
    fn it_falls_back_to_id_when_nothing_is_writable() {
        assert_eq!(introspection().selection_set("Audit", 0).unwrap(), "id");
    }

    #[test]
    fn it_fails_for_unknown_models() {
        assert!(matches!(
            introspection().selection_set("Nope", 0),
            Err(IntrospectionError::ModelNotFound(name)) if name == "Nope"
        ));
    }

    #[test]
    fn it_reads_every_scalar_and_enum_field() {
        let selection = introspection().read_selection_set("Story").unwrap();

        assert_eq!(selection, "id title status characterId createdAt");
    }
}
