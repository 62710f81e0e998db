//! Similarity-key capability.
//!
//! Provides the [`EmbeddingProvider`] trait and a local feature-hashing
//! implementation. The provider is created via [`create_provider`] from
//! configuration; `"none"` turns similarity keys off, in which case memory
//! lookups fall back to exact signal matches.

pub mod hashed;

use anyhow::Result;

/// Trait for turning a decision fingerprint into a vector.
///
/// Implementations must be deterministic: the same text always yields the
/// same vector, so similarity results are reproducible for a fixed memory.
pub trait EmbeddingProvider: Send + Sync {
    /// Embed a single text string into a vector.
    fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Return the number of dimensions this provider produces.
    fn dimensions(&self) -> usize;
}

/// Create an embedding provider from config.
///
/// Returns `Ok(None)` when similarity keys are disabled.
pub fn create_provider(
    config: &crate::config::SimilarityConfig,
) -> Result<Option<Box<dyn EmbeddingProvider>>> {
    match config.provider.as_str() {
        "hashed" => {
            let provider = hashed::HashedEmbeddingProvider::new(config.dimensions)?;
            Ok(Some(Box::new(provider)))
        }
        "none" => Ok(None),
        other => anyhow::bail!("unknown similarity provider: {other}. Supported: hashed, none"),
    }
}
