//! Threat decisions with memory.
//!
//! Vigil turns raw analyzer outputs (URL reputation, password strength, text
//! classification) into one of three actions and remembers every decision:
//!
//! | Combined score | Action |
//! |----------------|--------|
//! | `> 70`         | **alert** |
//! | `30..=70`      | **log** |
//! | `< 30`         | **ignore** |
//!
//! # Architecture
//!
//! - **Decisions**: results are normalized, combined by confidence-weighted
//!   mean, classified, and explained by a template or an optional language
//!   model under a hard timeout
//! - **Memory**: a bounded short-term ring of recent decisions plus running
//!   long-term statistics, with nearest-neighbour lookup over recent events
//! - **Persistence**: a single JSON snapshot, replaced atomically by a
//!   debounced background flusher
//! - **Transport**: MCP over stdio (primary) or a small HTTP JSON API
//!
//! # Modules
//!
//! - [`analysis`]: Input kinds and normalization of raw analyzer output
//! - [`decision`]: Aggregation, classification, reasoning, and the agent
//! - [`memory`]: Short-term ring, long-term stats, and similarity search
//! - [`persist`]: Snapshot file format, atomic writes, and the flusher
//! - [`embedding`]: Similarity keys for memory search
//! - [`responders`]: Webhook and event-log sinks for decisions
//! - [`config`]: Configuration loading from TOML files and environment variables

pub mod analysis;
pub mod config;
pub mod decision;
pub mod embedding;
pub mod error;
pub mod memory;
pub mod persist;
pub mod responders;
