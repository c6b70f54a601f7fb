//! Runtime utilites
//!
//! This module is only used by the binaries and provides helper code
//! related to runtime configuration.

mod config;
pub mod logging;
mod overrides;

use std::path::Path;

pub use config::Config;
use figment::{
    Figment,
    providers::{Env, Format, Yaml},
};

/// Separator to use when drilling down into nested options in the env figment
const ENV_NESTED_SEPARATOR: &str = "__";

/// Prefix shared by every server specific environment variable
const ENV_PREFIX: &str = "AMPLIFY_MCP_";

/// Read configuration from environment variables only (when no config file is provided)
#[allow(clippy::result_large_err)]
pub fn read_config_from_env() -> Result<Config, figment::Error> {
    Figment::new()
        .join(amplify_common_env())
        .join(Env::prefixed(ENV_PREFIX).split(ENV_NESTED_SEPARATOR))
        .extract()
}

/// Read in a config from a YAML file, filling in any missing values from the environment
#[allow(clippy::result_large_err)]
pub fn read_config(yaml_path: impl AsRef<Path>) -> Result<Config, figment::Error> {
    Figment::new()
        .join(amplify_common_env())
        .join(Env::prefixed(ENV_PREFIX).split(ENV_NESTED_SEPARATOR))
        .join(Yaml::file(yaml_path))
        .extract()
}

/// Figment provider that maps the shorthand credential variables into the
/// nested structure needed by the config
fn amplify_common_env() -> Env {
    Env::prefixed("AMPLIFY_")
        .only(&["username", "password"])
        .map(|key| match key.to_string().to_lowercase().as_str() {
            "username" => "credentials:username".into(),
            "password" => "credentials:password".into(),

            // Filtered out by `only` above
            other => other.to_string().into(),
        })
        .split(":")
}
