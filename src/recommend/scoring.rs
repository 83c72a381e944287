//! Multi-factor relevance scoring.
//!
//! Five independently-computed components, each normalized into roughly
//! [0.0, 1.0] before its weight is applied. The total is the plain sum of
//! the weighted components, so it is not itself guaranteed to stay in
//! [0, 1] even though it usually does.

use crate::items::{AnalysisResult, Item};
use crate::recommend::types::{TimePreference, UsageRecord, UserPreferences};
use chrono::{DateTime, Utc};

pub const SEMANTIC_WEIGHT: f32 = 0.4;
pub const TEMPORAL_WEIGHT: f32 = 0.2;
pub const PREFERENCE_WEIGHT: f32 = 0.2;
pub const USAGE_WEIGHT: f32 = 0.1;
pub const QUALITY_WEIGHT: f32 = 0.1;

/// Days over which temporal relevance decays (or grows).
const TEMPORAL_HORIZON_DAYS: f32 = 30.0;

/// Interactions needed for a full usage-frequency score.
const USAGE_SATURATION: f32 = 10.0;

/// Topic-interest hits counted toward the preference score.
const MAX_TOPIC_HITS: usize = 4;

/// Raw per-factor values before weighting.
///
/// A fixed struct rather than an open map: adding or removing a factor
/// must touch every scoring site.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScoreComponents {
    pub semantic: f32,
    pub temporal: f32,
    pub preference: f32,
    pub usage: f32,
    pub quality: f32,
}

impl ScoreComponents {
    /// Total score: plain sum of the weighted components.
    pub fn total(&self) -> f32 {
        self.semantic * SEMANTIC_WEIGHT
            + self.temporal * TEMPORAL_WEIGHT
            + self.preference * PREFERENCE_WEIGHT
            + self.usage * USAGE_WEIGHT
            + self.quality * QUALITY_WEIGHT
    }
}

/// Age-based relevance under the user's time preference.
pub fn temporal_score(created_at: DateTime<Utc>, now: DateTime<Utc>, pref: TimePreference) -> f32 {
    let age_days = (now - created_at).num_seconds().max(0) as f32 / 86_400.0;
    match pref {
        TimePreference::Recent => (1.0 - age_days / TEMPORAL_HORIZON_DAYS).clamp(0.0, 1.0),
        TimePreference::Historical => (age_days / TEMPORAL_HORIZON_DAYS).clamp(0.0, 1.0),
        TimePreference::All => 0.5,
    }
}

/// Detail of a preference match, kept for reason evidence.
#[derive(Debug, Clone, Default)]
pub struct PreferenceMatch {
    pub score: f32,
    pub kind_matched: bool,
    pub matched_topics: Vec<String>,
    pub language_matched: bool,
}

/// Stated-preference match: +0.3 for a preferred type, +0.1 per topic
/// interest found in title+content (up to four), +0.3 when a code item's
/// declared language is preferred. Capped at 1.0.
pub fn preference_score(item: &Item, prefs: &UserPreferences) -> PreferenceMatch {
    let mut result = PreferenceMatch::default();

    if prefs.preferred_kinds.contains(&item.kind) {
        result.score += 0.3;
        result.kind_matched = true;
    }

    if !prefs.topic_interests.is_empty() {
        let haystack = format!("{} {}", item.title, item.content).to_lowercase();
        for topic in &prefs.topic_interests {
            if haystack.contains(&topic.to_lowercase()) {
                result.matched_topics.push(topic.clone());
                if result.matched_topics.len() == MAX_TOPIC_HITS {
                    break;
                }
            }
        }
        result.score += 0.1 * result.matched_topics.len() as f32;
    }

    if item.kind == crate::items::ItemKind::Code {
        if let Some(language) = item.language() {
            if prefs.languages.iter().any(|l| l.eq_ignore_ascii_case(language)) {
                result.score += 0.3;
                result.language_matched = true;
            }
        }
    }

    result.score = result.score.min(1.0);
    result
}

/// Historical usage signal: frequency blended with like/dislike sentiment.
/// Items with no history score 0.
pub fn usage_score(record: Option<&UsageRecord>) -> f32 {
    let Some(record) = record else {
        return 0.0;
    };
    let frequency = (record.total_interactions() as f32 / USAGE_SATURATION).min(1.0);
    let sentiment = record.likes as f32 / (record.likes + record.dislikes).max(1) as f32;
    0.7 * frequency + 0.3 * sentiment
}

/// Content-quality heuristic. Starts neutral and rewards a readable
/// length, a preview, populated metadata, and analyzer-scored importance.
pub fn quality_score(item: &Item, analysis: Option<&AnalysisResult>) -> f32 {
    let mut score = 0.5;

    let length = item.content.len();
    if (100..=2000).contains(&length) {
        score += 0.2;
    }
    if item.preview.as_deref().is_some_and(|p| !p.is_empty()) {
        score += 0.1;
    }
    if !item.metadata.is_empty() {
        score += 0.2;
    }
    if let Some(analysis) = analysis {
        score += 0.1 * analysis.importance.clamp(0.0, 1.0);
    }

    score.min(1.0)
}
