//! MCP `decide` tool parameter definition.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Parameters for the `decide` MCP tool.
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct DecideParams {
    #[schemars(description = "Input kind: 'url', 'password', or 'text'")]
    pub r#type: String,

    #[schemars(
        description = "Raw analyzer outputs, each an object with 'risk_score' (0-100), optional 'confidence' (0.0-1.0), and analyzer-specific fields such as 'label', 'strength', or 'malicious_votes'"
    )]
    pub analyzers: Vec<serde_json::Value>,

    #[schemars(
        description = "The analyzed URL, used to key URL decisions by domain. Ignored for passwords and text."
    )]
    pub input: Option<String>,
}
