use amplify_mcp_server::mutation_mode::MutationMode;
use schemars::JsonSchema;
use serde::Deserialize;

/// Overridable flags
#[derive(Debug, Deserialize, Default, JsonSchema)]
#[serde(default)]
pub struct Overrides {
    /// Expose the record write tools (create, update, delete)
    pub mutation_mode: MutationMode,
}
