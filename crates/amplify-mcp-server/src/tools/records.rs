//! Tools which read and write records of a model without the agent having to
//! write GraphQL itself.
//!
//! Operations follow the naming of the generated data API: `get<Model>`,
//! `list<PluralName>`, and `create`/`update`/`delete<Model>` taking a single
//! `input` argument.

use std::sync::Arc;

use model_introspection::ModelIntrospection;
use rmcp::model::{CallToolResult, Tool};
use rmcp::schemars::JsonSchema;
use rmcp::serde_json::{Map, Value, json};
use rmcp::{schemars, serde_json};
use serde::Deserialize;

use super::{error_result, json_result};
use crate::errors::{McpError, ToolError};
use crate::graphql::{Executor, Request};
use crate::schema_from_type;

pub const GET_RECORD_TOOL_NAME: &str = "get-record";
pub const LIST_RECORDS_TOOL_NAME: &str = "list-records";
pub const CREATE_RECORD_TOOL_NAME: &str = "create-record";
pub const UPDATE_RECORD_TOOL_NAME: &str = "update-record";
pub const DELETE_RECORD_TOOL_NAME: &str = "delete-record";

/// Input for the get-record and delete-record tools.
#[derive(JsonSchema, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordInput {
    /// The name of the model, exactly as returned by `list-models`
    model_name: String,
    /// The primary key of the record
    id: String,
}

/// Input for the list-records tool.
#[derive(JsonSchema, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListInput {
    /// The name of the model, exactly as returned by `list-models`
    model_name: String,
    /// The maximum number of records to return
    #[serde(default)]
    limit: Option<u32>,
    /// The `nextToken` of a previous page, to continue listing from there
    #[serde(default)]
    next_token: Option<String>,
}

/// Input for the create-record and update-record tools.
#[derive(JsonSchema, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WriteInput {
    /// The name of the model, exactly as returned by `list-models`
    model_name: String,
    /// The field values of the record. Updates must include the primary key.
    input: Map<String, Value>,
}

#[derive(Clone)]
struct Records {
    introspection: Arc<ModelIntrospection>,
    executor: Arc<Executor>,
}

impl Records {
    async fn run(&self, request: Result<Request, ToolError>) -> Result<CallToolResult, McpError> {
        let request = match request {
            Ok(request) => request,
            Err(error) => return Ok(error_result(error)),
        };

        match self.executor.execute(&request, None).await {
            Ok(body) => Ok(json_result(&body)),
            Err(error) => Ok(error_result(error)),
        }
    }
}

#[derive(Clone)]
pub struct GetRecord {
    records: Records,
    pub tool: Tool,
}

impl GetRecord {
    pub fn new(introspection: Arc<ModelIntrospection>, executor: Arc<Executor>) -> Self {
        Self {
            records: Records {
                introspection,
                executor,
            },
            tool: Tool::new(
                GET_RECORD_TOOL_NAME,
                "Fetch a single record of a model by its primary key.",
                schema_from_type!(RecordInput),
            ),
        }
    }

    pub async fn execute(&self, input: RecordInput) -> Result<CallToolResult, McpError> {
        self.records
            .run(get_request(&self.records.introspection, &input))
            .await
    }
}

#[derive(Clone)]
pub struct ListRecords {
    records: Records,
    pub tool: Tool,
}

impl ListRecords {
    pub fn new(introspection: Arc<ModelIntrospection>, executor: Arc<Executor>) -> Self {
        Self {
            records: Records {
                introspection,
                executor,
            },
            tool: Tool::new(
                LIST_RECORDS_TOOL_NAME,
                "List records of a model, one page at a time. Pass the returned `nextToken` to fetch the next page.",
                schema_from_type!(ListInput),
            ),
        }
    }

    pub async fn execute(&self, input: ListInput) -> Result<CallToolResult, McpError> {
        self.records
            .run(list_request(&self.records.introspection, &input))
            .await
    }
}

/// Which write a [`WriteRecord`] tool performs
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Write {
    Create,
    Update,
}

#[derive(Clone)]
pub struct WriteRecord {
    records: Records,
    write: Write,
    pub tool: Tool,
}

impl WriteRecord {
    pub fn new(
        write: Write,
        introspection: Arc<ModelIntrospection>,
        executor: Arc<Executor>,
    ) -> Self {
        let tool = match write {
            Write::Create => Tool::new(
                CREATE_RECORD_TOOL_NAME,
                "Create a record of a model. Use `get-model-details` to see which fields are required.",
                schema_from_type!(WriteInput),
            ),
            Write::Update => Tool::new(
                UPDATE_RECORD_TOOL_NAME,
                "Update fields of an existing record of a model. The input must include the primary key; fields left out are not changed.",
                schema_from_type!(WriteInput),
            ),
        };

        Self {
            records: Records {
                introspection,
                executor,
            },
            write,
            tool,
        }
    }

    pub async fn execute(&self, input: WriteInput) -> Result<CallToolResult, McpError> {
        self.records
            .run(write_request(
                &self.records.introspection,
                self.write,
                input,
            ))
            .await
    }
}

#[derive(Clone)]
pub struct DeleteRecord {
    records: Records,
    pub tool: Tool,
}

impl DeleteRecord {
    pub fn new(introspection: Arc<ModelIntrospection>, executor: Arc<Executor>) -> Self {
        Self {
            records: Records {
                introspection,
                executor,
            },
            tool: Tool::new(
                DELETE_RECORD_TOOL_NAME,
                "Delete a record of a model by its primary key.",
                schema_from_type!(RecordInput),
            ),
        }
    }

    pub async fn execute(&self, input: RecordInput) -> Result<CallToolResult, McpError> {
        self.records
            .run(delete_request(&self.records.introspection, &input))
            .await
    }
}

/// The primary key field of a model and its GraphQL type
fn primary_key(
    introspection: &ModelIntrospection,
    model_name: &str,
) -> Result<(String, String), ToolError> {
    let model = introspection.model(model_name)?;
    let key = model.primary_key_field();
    let key_type = model
        .fields
        .get(key)
        .map(|field| field.field_type.name())
        .unwrap_or("ID");
    Ok((key.to_string(), format!("{key_type}!")))
}

fn get_request(
    introspection: &ModelIntrospection,
    input: &RecordInput,
) -> Result<Request, ToolError> {
    let (key, key_type) = primary_key(introspection, &input.model_name)?;
    let selection = introspection.read_selection_set(&input.model_name)?;
    let model = &input.model_name;

    Ok(Request::new(
        format!(
            "query Get{model}(${key}: {key_type}) {{ get{model}({key}: ${key}) {{ {selection} }} }}"
        ),
        Some(json!({ key: input.id })),
    ))
}

fn list_request(
    introspection: &ModelIntrospection,
    input: &ListInput,
) -> Result<Request, ToolError> {
    let plural = introspection
        .model(&input.model_name)?
        .plural_name(&input.model_name);
    let selection = introspection.read_selection_set(&input.model_name)?;

    let mut variables = Map::new();
    if let Some(limit) = input.limit {
        variables.insert("limit".to_string(), json!(limit));
    }
    if let Some(next_token) = &input.next_token {
        variables.insert("nextToken".to_string(), json!(next_token));
    }

    Ok(Request::new(
        format!(
            "query List{plural}($limit: Int, $nextToken: String) {{ list{plural}(limit: $limit, nextToken: $nextToken) {{ items {{ {selection} }} nextToken }} }}"
        ),
        Some(Value::Object(variables)),
    ))
}

fn write_request(
    introspection: &ModelIntrospection,
    write: Write,
    input: WriteInput,
) -> Result<Request, ToolError> {
    let (key, _) = primary_key(introspection, &input.model_name)?;
    if write == Write::Update && !input.input.contains_key(&key) {
        return Err(ToolError::InvalidInput(format!(
            "The input of an update must include the primary key field `{key}`"
        )));
    }

    let operation = match write {
        Write::Create => "create",
        Write::Update => "update",
    };
    mutation(introspection, operation, &input.model_name, input.input)
}

fn delete_request(
    introspection: &ModelIntrospection,
    input: &RecordInput,
) -> Result<Request, ToolError> {
    let (key, _) = primary_key(introspection, &input.model_name)?;
    let mut fields = Map::new();
    fields.insert(key, json!(input.id));
    mutation(introspection, "delete", &input.model_name, fields)
}

fn mutation(
    introspection: &ModelIntrospection,
    operation: &str,
    model: &str,
    input: Map<String, Value>,
) -> Result<Request, ToolError> {
    let selection = introspection.selection_set(model, 0)?;
    let type_prefix = capitalize(operation);

    Ok(Request::new(
        format!(
            "mutation {type_prefix}{model}($input: {type_prefix}{model}Input!) {{ {operation}{model}(input: $input) {{ {selection} }} }}"
        ),
        Some(json!({ "input": input })),
    ))
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    chars
        .next()
        .map(|first| first.to_uppercase().chain(chars).collect())
        .unwrap_or_default()
}
