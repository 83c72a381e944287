//! Request, result, preference, and usage types for the recommendation engine.

use crate::items::{Item, ItemKind};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// How candidates are gathered for a request. Selection is priority-ordered
/// on the request shape; the first matching condition wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    SemanticSearch,
    Contextual,
    ContentBased,
    Hybrid,
}

impl Strategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::SemanticSearch => "semantic_search",
            Strategy::Contextual => "contextual",
            Strategy::ContentBased => "content_based",
            Strategy::Hybrid => "hybrid",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimePreference {
    Recent,
    All,
    Historical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComplexityPreference {
    Simple,
    Medium,
    Complex,
}

/// Stated user preferences. Created with neutral defaults at engine
/// construction and mutated only through an explicit update.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserPreferences {
    #[serde(default)]
    pub preferred_kinds: HashSet<ItemKind>,
    pub time_preference: TimePreference,
    pub complexity: ComplexityPreference,
    #[serde(default)]
    pub topic_interests: HashSet<String>,
    #[serde(default)]
    pub languages: HashSet<String>,
}

impl Default for UserPreferences {
    fn default() -> Self {
        Self {
            preferred_kinds: HashSet::new(),
            time_preference: TimePreference::All,
            complexity: ComplexityPreference::Medium,
            topic_interests: HashSet::new(),
            languages: HashSet::new(),
        }
    }
}

/// Partial preference update; only provided fields change.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PreferenceUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preferred_kinds: Option<HashSet<ItemKind>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_preference: Option<TimePreference>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub complexity: Option<ComplexityPreference>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub topic_interests: Option<HashSet<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub languages: Option<HashSet<String>>,
}

/// Recent activity carried with a request. Not algorithmically required;
/// its presence selects the content-based strategy.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorkingContext {
    #[serde(default)]
    pub recent_items: Vec<String>,
    #[serde(default)]
    pub active_topics: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecommendationRequest {
    /// Free-text query; presence selects semantic search
    #[serde(default)]
    pub query: Option<String>,

    /// Items the user is currently looking at; contextual seed
    #[serde(default)]
    pub current_items: Vec<Item>,

    /// Per-call preference override
    #[serde(default)]
    pub preferences: Option<UserPreferences>,

    #[serde(default)]
    pub context: Option<WorkingContext>,

    /// Result cap; engine default applies when absent
    #[serde(default)]
    pub limit: Option<usize>,
}

/// One kind of interaction a user can have with an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Interaction {
    View,
    Use,
    Like,
    Dislike,
}

/// Per-item interaction counters. Created lazily on first interaction,
/// never deleted automatically.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsageRecord {
    pub views: u32,
    pub uses: u32,
    pub likes: u32,
    pub dislikes: u32,
    pub first_accessed: DateTime<Utc>,
    pub last_accessed: DateTime<Utc>,
}

impl UsageRecord {
    pub fn new(at: DateTime<Utc>) -> Self {
        Self {
            views: 0,
            uses: 0,
            likes: 0,
            dislikes: 0,
            first_accessed: at,
            last_accessed: at,
        }
    }

    pub fn total_interactions(&self) -> u32 {
        self.views + self.uses + self.likes + self.dislikes
    }
}

/// Which scoring component produced a reason.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReasonKind {
    SemanticSimilarity,
    TemporalRelevance,
    PreferenceMatch,
    UsagePattern,
    ContentQuality,
}

impl ReasonKind {
    pub fn label(&self) -> &'static str {
        match self {
            ReasonKind::SemanticSimilarity => "semantic similarity",
            ReasonKind::TemporalRelevance => "temporal relevance",
            ReasonKind::PreferenceMatch => "preference match",
            ReasonKind::UsagePattern => "usage pattern",
            ReasonKind::ContentQuality => "content quality",
        }
    }
}

/// Human-readable justification for a recommendation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reason {
    pub kind: ReasonKind,
    /// Weighted contribution of the component to the total score
    pub weight: f32,
    pub evidence: String,
}

/// Raw factor value kept alongside reasons for transparency/debugging.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelevanceFactor {
    pub name: String,
    /// Normalized component value before weighting, roughly [0.0, 1.0]
    pub value: f32,
    pub weight: f32,
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendedItem {
    pub item: Item,
    /// Sum of the weighted components; typically but not necessarily in [0, 1]
    pub score: f32,
    /// Sorted by weight, strongest first
    pub reasons: Vec<Reason>,
    pub factors: Vec<RelevanceFactor>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultMeta {
    pub processing_ms: u64,
    /// Candidate pool size before filtering
    pub total_candidates: usize,
    pub filters_applied: Vec<String>,
    pub engine_version: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendationResult {
    /// Ranked and truncated to the request cap
    pub items: Vec<RecommendedItem>,
    pub explanation: String,
    /// Aggregate confidence in [0.0, 1.0]
    pub confidence: f32,
    pub strategy: Strategy,
    pub meta: ResultMeta,
}

/// Aggregate statistics over the engine's recent result history.
#[derive(Debug, Clone, Default, Serialize)]
pub struct EngineStats {
    pub total_recommendations: usize,
    pub avg_confidence: f32,
    pub avg_processing_ms: f64,
    /// Strategy name -> number of runs
    pub strategy_counts: std::collections::HashMap<String, usize>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_preferences_are_neutral() {
        let prefs = UserPreferences::default();
        assert!(prefs.preferred_kinds.is_empty());
        assert_eq!(prefs.time_preference, TimePreference::All);
        assert_eq!(prefs.complexity, ComplexityPreference::Medium);
        assert!(prefs.topic_interests.is_empty());
        assert!(prefs.languages.is_empty());
    }

    #[test]
    fn test_strategy_serialization_is_snake_case() {
        let json = serde_json::to_string(&Strategy::SemanticSearch).unwrap();
        assert_eq!(json, r#""semantic_search""#);
        assert_eq!(Strategy::SemanticSearch.as_str(), "semantic_search");
    }

    #[test]
    fn test_usage_record_totals() {
        let mut record = UsageRecord::new(Utc::now());
        record.views = 2;
        record.likes = 1;
        assert_eq!(record.total_interactions(), 3);
    }
}
