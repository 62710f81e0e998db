//! MCP `similar_events` tool parameter definition.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct SimilarEventsParams {
    #[schemars(description = "Input kind to search: 'url', 'password', or 'text'")]
    pub r#type: String,

    /// URL, password strength label, or text classifier label/phrase.
    #[schemars(
        description = "What to look for: a URL or domain, a password weakness ('very_weak', 'weak', 'compromised'), or a text label or phrase"
    )]
    pub query: String,

    #[schemars(description = "Maximum number of matches (1-30). Defaults to 5.")]
    pub k: Option<usize>,
}
