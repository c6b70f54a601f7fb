//! Tools describing the data models of the backend

use std::sync::Arc;

use model_introspection::ModelIntrospection;
use rmcp::model::{CallToolResult, Tool};
use rmcp::schemars::JsonSchema;
use rmcp::{schemars, serde_json};
use serde::Deserialize;

use super::{error_result, text_result};
use crate::errors::{McpError, ToolError};
use crate::schema_from_type;

pub const LIST_MODELS_TOOL_NAME: &str = "list-models";
pub const LIST_ENUMS_TOOL_NAME: &str = "list-enums";
pub const MODEL_DETAILS_TOOL_NAME: &str = "get-model-details";
pub const RELATIONSHIPS_TOOL_NAME: &str = "get-relationships";

const NO_MODELS: &str = "No models found in the model introspection document.";
const NO_ENUMS: &str = "No enums found in the model introspection document.";

/// Input for tools which take no arguments.
#[derive(JsonSchema, Deserialize)]
pub struct NoInput {}

/// Input for tools which operate on a single model.
#[derive(JsonSchema, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelInput {
    /// The name of the model, exactly as returned by `list-models`
    pub(crate) model_name: String,
}

/// A tool to list every model and its fields.
#[derive(Clone)]
pub struct ListModels {
    introspection: Arc<ModelIntrospection>,
    pub tool: Tool,
}

impl ListModels {
    pub fn new(introspection: Arc<ModelIntrospection>) -> Self {
        Self {
            introspection,
            tool: Tool::new(
                LIST_MODELS_TOOL_NAME,
                "List the data models of the backend with their fields and field types. Use this first to learn what data exists before writing queries.",
                schema_from_type!(NoInput),
            ),
        }
    }

    pub async fn execute(&self, _input: NoInput) -> Result<CallToolResult, McpError> {
        let models = self.introspection.list_models();
        if models.is_empty() {
            return Ok(text_result(NO_MODELS));
        }

        Ok(text_result(
            models
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("\n\n"),
        ))
    }
}

/// A tool to list every enum and its values.
#[derive(Clone)]
pub struct ListEnums {
    introspection: Arc<ModelIntrospection>,
    pub tool: Tool,
}

impl ListEnums {
    pub fn new(introspection: Arc<ModelIntrospection>) -> Self {
        Self {
            introspection,
            tool: Tool::new(
                LIST_ENUMS_TOOL_NAME,
                "List the enums of the backend with their allowed values.",
                schema_from_type!(NoInput),
            ),
        }
    }

    pub async fn execute(&self, _input: NoInput) -> Result<CallToolResult, McpError> {
        let enums = self.introspection.list_enums();
        if enums.is_empty() {
            return Ok(text_result(NO_ENUMS));
        }

        Ok(text_result(
            enums
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("\n"),
        ))
    }
}

/// A tool to describe one model in full.
#[derive(Clone)]
pub struct ModelDetails {
    introspection: Arc<ModelIntrospection>,
    pub tool: Tool,
}

impl ModelDetails {
    pub fn new(introspection: Arc<ModelIntrospection>) -> Self {
        Self {
            introspection,
            tool: Tool::new(
                MODEL_DETAILS_TOOL_NAME,
                "Get the details of a model: its primary key, every field with its type, associations to other models, and the authorization rules which decide who may read or change it.",
                schema_from_type!(ModelInput),
            ),
        }
    }

    pub async fn execute(&self, input: ModelInput) -> Result<CallToolResult, McpError> {
        match self.introspection.describe_model(&input.model_name) {
            Ok(details) => Ok(text_result(details.to_string())),
            Err(error) => Ok(error_result(ToolError::from(error))),
        }
    }
}

/// A tool to list the fields linking a model to other models.
#[derive(Clone)]
pub struct Relationships {
    introspection: Arc<ModelIntrospection>,
    pub tool: Tool,
}

impl Relationships {
    pub fn new(introspection: Arc<ModelIntrospection>) -> Self {
        Self {
            introspection,
            tool: Tool::new(
                RELATIONSHIPS_TOOL_NAME,
                "List the relationships of a model: which fields point at other models, and how they are connected (has one, has many, belongs to).",
                schema_from_type!(ModelInput),
            ),
        }
    }

    pub async fn execute(&self, input: ModelInput) -> Result<CallToolResult, McpError> {
        let relationships = match self
            .introspection
            .describe_relationships(&input.model_name)
        {
            Ok(relationships) => relationships,
            Err(error) => return Ok(error_result(ToolError::from(error))),
        };

        if relationships.is_empty() {
            return Ok(text_result(format!(
                "Model '{}' has no relationships.",
                input.model_name
            )));
        }

        let mut text = format!("Relationships of {}:", input.model_name);
        for relationship in relationships {
            text.push_str(&format!("\n  - {relationship}"));
        }
        Ok(text_result(text))
    }
}
