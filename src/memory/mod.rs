//! Short-term and long-term memory of past decisions.

pub mod ring;
pub mod search;
pub mod stats;
pub mod store;
pub mod types;
