//! Embedding generation with cache-then-fallback semantics.
//!
//! A remote provider is preferred when one is configured; any failure falls
//! back to a deterministic local hashing scheme so an embedding call always
//! resolves with a vector.
//!
//! - `generator`: content-keyed cache plus provider fallback
//! - `local`: deterministic feature-hashing embedder
//! - `remote`: HTTP client for an OpenAI-compatible embeddings endpoint

mod generator;
mod local;
mod remote;

pub use generator::EmbeddingGenerator;
pub use local::LocalEmbeddingSource;
pub use remote::{RemoteConfig, RemoteEmbeddingSource};

/// Fixed dimension shared by every vector in an index.
pub const EMBEDDING_DIM: usize = 384;

/// Input truncation bound (characters) applied before provider calls.
pub const MAX_EMBED_INPUT: usize = 8000;

/// Capability interface for embedding providers.
///
/// Exactly two implementations exist: [`RemoteEmbeddingSource`] and
/// [`LocalEmbeddingSource`]. The generator picks whichever it was
/// constructed with and falls back to the local scheme on failure.
pub trait EmbeddingSource: Send + Sync {
    /// Whether this source can currently serve embedding requests.
    fn supports_embedding(&self) -> bool;

    /// Dimension of the vectors this source produces.
    fn dimensions(&self) -> usize;

    /// Embed a single text. Errors must be descriptive (bad credentials,
    /// unknown model, malformed response); the generator recovers from all
    /// of them.
    fn embed(&self, text: &str) -> anyhow::Result<Vec<f32>>;

    fn name(&self) -> &'static str;
}
