//! MCP `memory_stats` tool parameter definition.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Parameters for the `memory_stats` MCP tool.
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct MemoryStatsParams {
    /// How many entries of each frequency table to include.
    #[schemars(description = "Number of top malicious domains and password weaknesses to list. Defaults to 5.")]
    pub top: Option<usize>,
}
