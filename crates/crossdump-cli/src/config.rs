use std::path::Path;

use serde::Deserialize;

use crossdump_core::Dialect;
use crossdump_engine::DumpOptions;

use crate::CliError;

/// Contents of a `--config` file.
///
/// ```toml
/// target = "postgresql"
///
/// [dump]
/// chunk_size = 500
/// conflict_mode = "ignore"
///
/// [[dump.type_overrides]]
/// table = "m_agents"
/// column = "in_use"
/// portable_type = "boolean"
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CliConfig {
    pub target: Option<Dialect>,
    pub dump: DumpOptions,
}

pub fn load_config(path: &Path) -> Result<CliConfig, CliError> {
    let content = std::fs::read_to_string(path)?;
    parse_config(&content)
}

fn parse_config(content: &str) -> Result<CliConfig, CliError> {
    Ok(toml::from_str(content)?)
}
