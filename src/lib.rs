//! Semantic vector index and recommendation engine for personal knowledge bases.
//!
//! Turns free-form text into fixed-dimension embeddings, stores one vector per
//! item, and serves similarity search, k-means clustering, and multi-factor
//! recommendations over the stored collection. Embeddings come from a remote
//! provider when one is configured and fall back to a deterministic local
//! hashing scheme otherwise, so every operation always resolves with a vector.
//!
//! # Architecture
//!
//! - `embedding`: cache-then-fallback embedding generation
//! - `index`: in-memory vector index with cosine similarity search and clustering
//! - `recommend`: candidate selection, weighted scoring, filtering, explanation
//! - `items`: domain types shared with the host application
//! - `config`: engine configuration
//!
//! Parsing raw documents into items, persisting them, and any UI surface are
//! the host's job; this crate only exchanges in-memory records.

pub mod config;
pub mod embedding;
pub mod index;
pub mod items;
pub mod recommend;
#[cfg(test)]
mod tests;

pub use config::{AnalysisDepth, EngineConfig};
pub use embedding::{
    EmbeddingGenerator, EmbeddingSource, LocalEmbeddingSource, RemoteConfig,
    RemoteEmbeddingSource, EMBEDDING_DIM,
};
pub use index::{
    Cluster, ClusterMember, IndexError, IndexStats, ReconcileResult, RecordMeta,
    SimilarityResult, VectorIndex,
};
pub use items::{AnalysisResult, Item, ItemKind};
pub use recommend::{
    ComplexityPreference, EngineStats, Interaction, PreferenceUpdate, Reason, ReasonKind,
    RecommendationEngine, RecommendationRequest, RecommendationResult, RecommendedItem,
    RelevanceFactor, Strategy, TimePreference, UsageRecord, UserPreferences, WorkingContext,
};
