use std::sync::Arc;

use model_introspection::ModelIntrospection;
use rmcp::model::{
    CallToolRequestParam, CallToolResult, ErrorCode, Implementation, JsonObject, ListToolsResult,
    PaginatedRequestParam, ServerCapabilities, ServerInfo, Tool,
};
use rmcp::service::RequestContext;
use rmcp::{RoleServer, ServerHandler};
use serde_json::Value;
use tracing::debug;

use crate::auth::AuthController;
use crate::errors::McpError;
use crate::graphql::Executor;
use crate::mutation_mode::MutationMode;
use crate::tools::current_user::{CURRENT_USER_TOOL_NAME, CurrentUser};
use crate::tools::login::{LOGIN_TOOL_NAME, Login};
use crate::tools::models::{
    LIST_ENUMS_TOOL_NAME, LIST_MODELS_TOOL_NAME, ListEnums, ListModels,
    MODEL_DETAILS_TOOL_NAME, ModelDetails, RELATIONSHIPS_TOOL_NAME, Relationships,
};
use crate::tools::records::{
    CREATE_RECORD_TOOL_NAME, DELETE_RECORD_TOOL_NAME, DeleteRecord, GET_RECORD_TOOL_NAME,
    GetRecord, LIST_RECORDS_TOOL_NAME, ListRecords, UPDATE_RECORD_TOOL_NAME, Write, WriteRecord,
};
use crate::tools::run_query::{RUN_QUERY_TOOL_NAME, RunQuery};

/// Routes MCP tool calls to the tools of one backend
#[derive(Clone)]
pub struct AmplifyMcpServerHandler {
    login_tool: Login,
    current_user_tool: CurrentUser,
    list_models_tool: ListModels,
    list_enums_tool: ListEnums,
    model_details_tool: ModelDetails,
    relationships_tool: Relationships,
    run_query_tool: RunQuery,
    get_record_tool: GetRecord,
    list_records_tool: ListRecords,
    create_record_tool: Option<WriteRecord>,
    update_record_tool: Option<WriteRecord>,
    delete_record_tool: Option<DeleteRecord>,
}

impl AmplifyMcpServerHandler {
    pub fn new(
        introspection: Arc<ModelIntrospection>,
        auth: Arc<AuthController>,
        executor: Arc<Executor>,
        mutation_mode: MutationMode,
    ) -> Self {
        let allow_mutations = mutation_mode == MutationMode::All;

        Self {
            login_tool: Login::new(auth.clone()),
            current_user_tool: CurrentUser::new(auth),
            list_models_tool: ListModels::new(introspection.clone()),
            list_enums_tool: ListEnums::new(introspection.clone()),
            model_details_tool: ModelDetails::new(introspection.clone()),
            relationships_tool: Relationships::new(introspection.clone()),
            run_query_tool: RunQuery::new(executor.clone()),
            get_record_tool: GetRecord::new(introspection.clone(), executor.clone()),
            list_records_tool: ListRecords::new(introspection.clone(), executor.clone()),
            create_record_tool: allow_mutations
                .then(|| WriteRecord::new(Write::Create, introspection.clone(), executor.clone())),
            update_record_tool: allow_mutations
                .then(|| WriteRecord::new(Write::Update, introspection.clone(), executor.clone())),
            delete_record_tool: allow_mutations
                .then(|| DeleteRecord::new(introspection.clone(), executor.clone())),
        }
    }

    /// Every tool exposed to clients
    pub fn tools(&self) -> Vec<Tool> {
        [
            &self.login_tool.tool,
            &self.current_user_tool.tool,
            &self.list_models_tool.tool,
            &self.list_enums_tool.tool,
            &self.model_details_tool.tool,
            &self.relationships_tool.tool,
            &self.run_query_tool.tool,
            &self.get_record_tool.tool,
            &self.list_records_tool.tool,
        ]
        .into_iter()
        .chain(self.create_record_tool.as_ref().map(|t| &t.tool))
        .chain(self.update_record_tool.as_ref().map(|t| &t.tool))
        .chain(self.delete_record_tool.as_ref().map(|t| &t.tool))
        .cloned()
        .collect()
    }

    /// Run the named tool with the given arguments
    pub async fn dispatch(
        &self,
        name: &str,
        arguments: Option<JsonObject>,
    ) -> Result<CallToolResult, McpError> {
        debug!(tool = name, "Calling tool");

        match name {
            LOGIN_TOOL_NAME => {
                self.login_tool
                    .execute(convert_arguments(arguments)?)
                    .await
            }
            CURRENT_USER_TOOL_NAME => {
                self.current_user_tool
                    .execute(convert_arguments(arguments)?)
                    .await
            }
            LIST_MODELS_TOOL_NAME => {
                self.list_models_tool
                    .execute(convert_arguments(arguments)?)
                    .await
            }
            LIST_ENUMS_TOOL_NAME => {
                self.list_enums_tool
                    .execute(convert_arguments(arguments)?)
                    .await
            }
            MODEL_DETAILS_TOOL_NAME => {
                self.model_details_tool
                    .execute(convert_arguments(arguments)?)
                    .await
            }
            RELATIONSHIPS_TOOL_NAME => {
                self.relationships_tool
                    .execute(convert_arguments(arguments)?)
                    .await
            }
            RUN_QUERY_TOOL_NAME => {
                self.run_query_tool
                    .execute(convert_arguments(arguments)?)
                    .await
            }
            GET_RECORD_TOOL_NAME => {
                self.get_record_tool
                    .execute(convert_arguments(arguments)?)
                    .await
            }
            LIST_RECORDS_TOOL_NAME => {
                self.list_records_tool
                    .execute(convert_arguments(arguments)?)
                    .await
            }
            CREATE_RECORD_TOOL_NAME => {
                self.create_record_tool
                    .as_ref()
                    .ok_or_else(|| tool_not_found(name))?
                    .execute(convert_arguments(arguments)?)
                    .await
            }
            UPDATE_RECORD_TOOL_NAME => {
                self.update_record_tool
                    .as_ref()
                    .ok_or_else(|| tool_not_found(name))?
                    .execute(convert_arguments(arguments)?)
                    .await
            }
            DELETE_RECORD_TOOL_NAME => {
                self.delete_record_tool
                    .as_ref()
                    .ok_or_else(|| tool_not_found(name))?
                    .execute(convert_arguments(arguments)?)
                    .await
            }
            _ => Err(tool_not_found(name)),
        }
    }
}

impl ServerHandler for AmplifyMcpServerHandler {
    async fn call_tool(
        &self,
        request: CallToolRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        self.dispatch(&request.name, request.arguments).await
    }

    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, McpError> {
        Ok(ListToolsResult {
            next_cursor: None,
            tools: self.tools(),
        })
    }

    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: Implementation {
                name: "Amplify MCP Server".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            instructions: Some(
                "Explore the backend's data models with `list-models`, `get-model-details` and `get-relationships`, then read data with `run-query` or the record tools. Use `login` first when queries need a signed in user.".to_string(),
            ),
            ..Default::default()
        }
    }
}

fn tool_not_found(name: &str) -> McpError {
    McpError::new(
        ErrorCode::METHOD_NOT_FOUND,
        format!("Tool {name} not found"),
        None,
    )
}

/// Tools without required inputs may be called with no arguments at all
fn convert_arguments<T: serde::de::DeserializeOwned>(
    arguments: Option<JsonObject>,
) -> Result<T, McpError> {
    serde_json::from_value(Value::Object(arguments.unwrap_or_default()))
        .map_err(|_| McpError::new(ErrorCode::INVALID_PARAMS, "Invalid input".to_string(), None))
}
