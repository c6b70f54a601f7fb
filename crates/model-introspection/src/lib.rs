//! Library for reading and describing data model introspection documents.
//!
//! A model introspection document describes the models a GraphQL data backend
//! exposes: their fields, how they relate to one another, and who is allowed to
//! operate on them. This crate turns that document into readable summaries for
//! an AI agent:
//!
//! * [`ModelIntrospection::list_models`] lists every model with its fields
//! * [`ModelIntrospection::list_enums`] lists every enum with its values
//! * [`ModelIntrospection::describe_model`] details a single model, including
//!   associations and authorization rules
//! * [`ModelIntrospection::describe_relationships`] lists the fields linking a
//!   model to other models
//!
//! It also builds the selection sets used when composing operations against a
//! model (see [`ModelIntrospection::selection_set`]).
//!
//! Everything here is read-only over the loaded document.

use indexmap::IndexMap;
use serde::Deserialize;

pub mod descriptor;
pub mod error;
mod selection;
pub mod summary;

pub use descriptor::{
    Association, AuthRule, ConnectionType, EnumDescriptor, FieldDescriptor, FieldType,
    ModelDescriptor,
};
pub use error::IntrospectionError;
pub use selection::MAX_SELECTION_DEPTH;
pub use summary::{FieldDetail, FieldSummary, ModelDetails, ModelSummary, Relationship};

/// The models, enums and custom types of a data backend
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelIntrospection {
    #[serde(default)]
    pub version: Option<u32>,

    #[serde(default)]
    models: IndexMap<String, ModelDescriptor>,

    #[serde(default)]
    enums: IndexMap<String, EnumDescriptor>,
}

impl ModelIntrospection {
    /// Parse a model introspection document from JSON
    pub fn from_json(json: &str) -> Result<Self, IntrospectionError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Look up a model by name
    pub fn model(&self, name: &str) -> Result<&ModelDescriptor, IntrospectionError> {
        self.models
            .get(name)
            .ok_or_else(|| IntrospectionError::ModelNotFound(name.to_string()))
    }

    /// The names of all models, in document order
    pub fn model_names(&self) -> impl Iterator<Item = &str> {
        self.models.keys().map(String::as_str)
    }

    /// Summaries of every model and its fields
    pub fn list_models(&self) -> Vec<ModelSummary> {
        self.models
            .iter()
            .map(|(name, model)| ModelSummary {
                name: name.clone(),
                fields: model
                    .fields
                    .iter()
                    .map(|(field_name, field)| FieldSummary::new(field_name, field))
                    .collect(),
            })
            .collect()
    }

    /// Every enum and its values
    pub fn list_enums(&self) -> Vec<EnumDescriptor> {
        self.enums
            .iter()
            .map(|(name, descriptor)| EnumDescriptor {
                name: name.clone(),
                values: descriptor.values.clone(),
            })
            .collect()
    }

    /// Full detail on one model: fields, associations and authorization rules
    pub fn describe_model(&self, name: &str) -> Result<ModelDetails, IntrospectionError> {
        let model = self.model(name)?;
        Ok(ModelDetails {
            name: name.to_string(),
            plural_name: model.plural_name.clone(),
            primary_key: model.primary_key_field().to_string(),
            sort_keys: model
                .primary_key_info
                .as_ref()
                .map(|info| info.sort_key_field_names.clone())
                .unwrap_or_default(),
            fields: model
                .fields
                .iter()
                .map(|(field_name, field)| FieldDetail::new(field_name, field))
                .collect(),
            auth_rules: model.auth_rules(),
        })
    }

    /// The fields of a model which link it to other models.
    ///
    /// An empty list means the model exists but has no relationships.
    pub fn describe_relationships(
        &self,
        name: &str,
    ) -> Result<Vec<Relationship>, IntrospectionError> {
        let model = self.model(name)?;
        Ok(model
            .fields
            .iter()
            .filter(|(_, field)| field.association.is_some() || field.related_model().is_some())
            .map(|(field_name, field)| Relationship {
                field: field_name.clone(),
                related_model: field.field_type.name().to_string(),
                kind: field
                    .association
                    .as_ref()
                    .map(|association| association.connection_type),
                associated_with: field
                    .association
                    .as_ref()
                    .map(|association| association.associated_with.clone())
                    .unwrap_or_default(),
                target_names: field
                    .association
                    .as_ref()
                    .map(|association| association.target_names.clone())
                    .unwrap_or_default(),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use insta::assert_snapshot;
    use rstest::rstest;
    use serde_json::json;

    fn story_and_character() -> ModelIntrospection {
        serde_json::from_value(json!({
            "version": 1,
            "models": {
                "Story": {
                    "fields": {
                        "id": { "type": "ID", "isRequired": true },
                        "title": { "type": "String", "isRequired": true },
                        "character": { "type": { "model": "Character" }, "isArray": false }
                    }
                },
                "Character": {
                    "fields": {
                        "id": { "type": "ID", "isRequired": true },
                        "name": { "type": "String", "isRequired": true }
                    }
                }
            }
        }))
        .unwrap()
    }

    fn blog() -> ModelIntrospection {
        ModelIntrospection::from_json(
            r#"{
                "version": 1,
                "models": {
                    "Post": {
                        "pluralName": "Posts",
                        "fields": {
                            "id": { "name": "id", "type": "ID", "isRequired": true, "isArray": false, "attributes": [] },
                            "tags": { "name": "tags", "type": "String", "isRequired": false, "isArray": true, "attributes": [] },
                            "status": { "name": "status", "type": { "enum": "PostStatus" }, "isRequired": true, "isArray": false, "attributes": [] },
                            "blogId": { "name": "blogId", "type": "ID", "isRequired": false, "isArray": false, "attributes": [] },
                            "blog": {
                                "name": "blog",
                                "type": { "model": "Blog" },
                                "isRequired": false,
                                "isArray": false,
                                "attributes": [],
                                "association": { "connectionType": "BELONGS_TO", "targetNames": ["blogId"] }
                            },
                            "comments": {
                                "name": "comments",
                                "type": { "model": "Comment" },
                                "isRequired": false,
                                "isArray": true,
                                "attributes": [],
                                "isArrayNullable": true,
                                "association": { "connectionType": "HAS_MANY", "associatedWith": ["postId"] }
                            },
                            "createdAt": { "name": "createdAt", "type": "AWSDateTime", "isRequired": false, "isArray": false, "attributes": [], "isReadOnly": true }
                        },
                        "syncable": true,
                        "attributes": [
                            { "type": "model", "properties": {} },
                            {
                                "type": "auth",
                                "properties": {
                                    "rules": [
                                        { "provider": "userPools", "ownerField": "owner", "allow": "owner", "identityClaim": "cognito:username", "operations": ["create", "update", "delete", "read"] },
                                        { "groupClaim": "cognito:groups", "provider": "userPools", "allow": "groups", "groups": ["Admin"], "operations": ["read"] }
                                    ]
                                }
                            }
                        ],
                        "primaryKeyInfo": { "isCustomPrimaryKey": false, "primaryKeyFieldName": "id", "sortKeyFieldNames": [] }
                    },
                    "Blog": {
                        "fields": {
                            "id": { "type": "ID", "isRequired": true }
                        }
                    }
                },
                "enums": {
                    "PostStatus": { "name": "PostStatus", "values": ["DRAFT", "PUBLISHED"] }
                },
                "nonModels": {}
            }"#,
        )
        .unwrap()
    }

    #[rstest]
    #[case("Story")]
    #[case("Character")]
    fn describe_model_succeeds_for_known_models(#[case] name: &str) {
        assert_eq!(story_and_character().describe_model(name).unwrap().name, name);
    }

    #[rstest]
    #[case("Chapter")]
    #[case("story")]
    #[case("")]
    fn describe_model_fails_for_unknown_models(#[case] name: &str) {
        assert!(matches!(
            story_and_character().describe_model(name),
            Err(IntrospectionError::ModelNotFound(missing)) if missing == name
        ));
    }

    #[test]
    fn it_lists_nothing_for_an_empty_document() {
        let introspection = ModelIntrospection::from_json("{}").unwrap();
        assert!(introspection.list_models().is_empty());
        assert!(introspection.list_enums().is_empty());
    }

    #[test]
    fn it_lists_models_in_document_order() {
        let models = story_and_character().list_models();
        let rendered = models
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("\n");

        assert_snapshot!(rendered, @r"
        Story
          - id: ID [required]
          - title: String [required]
          - character: Character (model)
        Character
          - id: ID [required]
          - name: String [required]
        ");
    }

    #[test]
    fn it_keeps_document_order_when_built_from_a_json_value() {
        let introspection: ModelIntrospection = serde_json::from_value(json!({
            "models": {
                "Zebra": {
                    "fields": {
                        "stripes": { "type": "Int" },
                        "age": { "type": "Int" }
                    }
                },
                "Aardvark": {
                    "fields": { "id": { "type": "ID" } }
                }
            }
        }))
        .unwrap();

        assert_eq!(
            introspection.model_names().collect::<Vec<_>>(),
            vec!["Zebra", "Aardvark"]
        );
        assert_eq!(
            introspection
                .model("Zebra")
                .unwrap()
                .fields
                .keys()
                .collect::<Vec<_>>(),
            vec!["stripes", "age"]
        );
    }

    #[test]
    fn it_names_enums_after_their_key() {
        let introspection = ModelIntrospection::from_json(
            r#"{ "enums": { "Mood": { "values": ["HAPPY", "SAD"] } } }"#,
        )
        .unwrap();

        assert_eq!(
            introspection.list_enums(),
            vec![EnumDescriptor {
                name: "Mood".to_string(),
                values: vec!["HAPPY".to_string(), "SAD".to_string()],
            }]
        );
    }

    #[test]
    fn it_annotates_arrays_and_enums() {
        let models = blog().list_models();
        let post = models.first().unwrap();

        assert_eq!(
            post.fields
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>(),
            vec![
                "id: ID [required]",
                "tags: String [array]",
                "status: PostStatus (enum) [required]",
                "blogId: ID",
                "blog: Blog (model)",
                "comments: Comment (model) [array]",
                "createdAt: AWSDateTime",
            ]
        );
    }

    #[test]
    fn it_lists_enums() {
        let enums = blog().list_enums();
        assert_eq!(
            enums,
            vec![EnumDescriptor {
                name: "PostStatus".to_string(),
                values: vec!["DRAFT".to_string(), "PUBLISHED".to_string()],
            }]
        );
        assert_eq!(
            enums.first().map(ToString::to_string).as_deref(),
            Some("PostStatus: DRAFT, PUBLISHED")
        );
    }

    #[test]
    fn it_describes_a_model() {
        let details = blog().describe_model("Post").unwrap();

        assert_snapshot!(details.to_string(), @r"
        Model: Post (plural: Posts)
        Primary key: id

        Fields:
          - id: ID [required]
          - tags: String [array]
          - status: PostStatus (enum) [required]
          - blogId: ID
          - blog: Blog (model)
              association: BELONGS_TO, target fields: blogId
          - comments: Comment (model) [array]
              association: HAS_MANY, associated with: postId
          - createdAt: AWSDateTime [read-only]

        Authorization rules:
          - provider: userPools, allow: owner, owner field: owner, operations: create, update, delete, read
          - provider: userPools, allow: groups, groups: Admin, operations: read
        ");
    }

    #[test]
    fn it_describes_a_model_without_auth_rules() {
        let details = blog().describe_model("Blog").unwrap();

        assert!(details.auth_rules.is_empty());
        assert!(details.to_string().ends_with("Authorization rules: none"));
    }

    #[test]
    fn it_finds_relationships_without_association_metadata() {
        let relationships = story_and_character()
            .describe_relationships("Story")
            .unwrap();

        assert_eq!(
            relationships,
            vec![Relationship {
                field: "character".to_string(),
                related_model: "Character".to_string(),
                kind: None,
                associated_with: vec![],
                target_names: vec![],
            }]
        );
        assert_eq!(
            relationships.first().map(ToString::to_string).as_deref(),
            Some("character -> Character (unspecified)")
        );
    }

    #[test]
    fn it_reports_no_relationships_as_an_empty_list() {
        assert!(
            story_and_character()
                .describe_relationships("Character")
                .unwrap()
                .is_empty()
        );
    }

    #[test]
    fn it_fails_relationships_for_unknown_models() {
        assert!(matches!(
            story_and_character().describe_relationships("Chapter"),
            Err(IntrospectionError::ModelNotFound(_))
        ));
    }

    #[test]
    fn it_describes_relationships_with_association_metadata() {
        let relationships = blog()
            .describe_relationships("Post")
            .unwrap()
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>();

        assert_eq!(
            relationships,
            vec![
                "blog -> Blog (BELONGS_TO), target fields: blogId",
                "comments -> Comment (HAS_MANY), associated with: postId",
            ]
        );
    }
}
