use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct RecentEventsParams {
    #[schemars(description = "Maximum number of events to return, most recent first. Defaults to 10.")]
    pub limit: Option<usize>,
}
