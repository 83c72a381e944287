//! Recommendation engine over the vector index.
//!
//! # Architecture
//!
//! - `engine`: pipeline orchestration (strategy, candidates, filters,
//!   ranking, explanation, history)
//! - `scoring`: the five weighted relevance factors
//! - `complexity`: content/code complexity heuristic for filtering
//! - `types`: request, result, preference, and usage types

mod complexity;
mod engine;
mod scoring;
mod types;

pub use complexity::complexity;
pub use engine::{select_strategy, RecommendationEngine};
pub use scoring::{
    ScoreComponents, PREFERENCE_WEIGHT, QUALITY_WEIGHT, SEMANTIC_WEIGHT, TEMPORAL_WEIGHT,
    USAGE_WEIGHT,
};
pub use types::{
    ComplexityPreference, EngineStats, Interaction, PreferenceUpdate, Reason, ReasonKind,
    RecommendationRequest, RecommendationResult, RecommendedItem, RelevanceFactor, ResultMeta,
    Strategy, TimePreference, UsageRecord, UserPreferences, WorkingContext,
};
