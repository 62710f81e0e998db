//! Scoring, classification, and explanation of analyzer results.

pub mod agent;
pub mod aggregate;
pub mod classify;
pub mod reasoning;
pub mod record;
