//! Recommendation engine: candidate selection, scoring, filtering,
//! ranking, and explanation over the vector index.
//!
//! `recommend` never fails. The fallible pipeline runs internally and any
//! unexpected error degrades to an empty, well-formed result carrying the
//! failure message and zero confidence.

use crate::config::EngineConfig;
use crate::embedding::EmbeddingGenerator;
use crate::index::{
    IndexError, ReconcileResult, RecordMeta, SimilarityResult, VectorIndex,
};
use crate::items::{AnalysisResult, Item};
use crate::recommend::complexity::complexity;
use crate::recommend::scoring::{
    self, preference_score, quality_score, temporal_score, usage_score, PreferenceMatch,
    ScoreComponents,
};
use crate::recommend::types::{
    ComplexityPreference, EngineStats, Interaction, PreferenceUpdate, Reason, ReasonKind,
    RecommendationRequest, RecommendationResult, RecommendedItem, RelevanceFactor, ResultMeta,
    Strategy, UsageRecord, UserPreferences,
};
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use std::time::Instant;

const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Similarity floor and pool cap for query-driven retrieval.
const SEMANTIC_THRESHOLD: f32 = 0.5;
const SEMANTIC_CANDIDATES: usize = 50;

/// Similarity floor and per-seed cap for context-driven retrieval.
const CONTEXT_THRESHOLD: f32 = 0.4;
const CONTEXT_NEIGHBORS: usize = 20;

/// Pool cap for the breadth-first strategies (no strong seed, so an
/// arbitrary prefix of the index rather than a similarity-ranked set).
const BROWSE_CANDIDATES: usize = 100;

/// Similarity floor for `related`.
const RELATED_THRESHOLD: f32 = 0.3;

/// A non-preferred type survives the kind filter above this score.
const KIND_FILTER_OVERRIDE: f32 = 0.7;

/// Weighted contributions above this emit a reason.
const MIN_REASON_CONTRIBUTION: f32 = 0.1;

/// Result-history bounds: past `HISTORY_CAP`, trim to `HISTORY_RETAIN`.
const HISTORY_CAP: usize = 1000;
const HISTORY_RETAIN: usize = 500;

struct HistoryEntry {
    strategy: Strategy,
    confidence: f32,
    processing_ms: u64,
}

/// Candidate gathered from the index, with the similarity score its
/// retrieval produced (absent for breadth-first strategies).
struct Candidate {
    id: String,
    similarity: Option<f32>,
}

pub struct RecommendationEngine {
    index: VectorIndex,
    items: HashMap<String, Item>,
    analysis: HashMap<String, AnalysisResult>,
    preferences: UserPreferences,
    usage: HashMap<String, UsageRecord>,
    history: Vec<HistoryEntry>,
    config: EngineConfig,
}

impl RecommendationEngine {
    pub fn new(generator: EmbeddingGenerator, config: EngineConfig) -> Self {
        Self {
            index: VectorIndex::new(generator),
            items: HashMap::new(),
            analysis: HashMap::new(),
            preferences: UserPreferences::default(),
            usage: HashMap::new(),
            history: Vec::new(),
            config,
        }
    }

    /// Engine backed purely by the deterministic local embedding scheme.
    pub fn with_local_embeddings(config: EngineConfig) -> Self {
        Self::new(EmbeddingGenerator::local(), config)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn index(&self) -> &VectorIndex {
        &self.index
    }

    pub fn preferences(&self) -> &UserPreferences {
        &self.preferences
    }

    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    pub fn get_item(&self, id: &str) -> Option<&Item> {
        self.items.get(id)
    }

    pub fn usage(&self, id: &str) -> Option<&UsageRecord> {
        self.usage.get(id)
    }

    /// Embed and index a single item, keeping a copy for scoring.
    pub fn index_item(&mut self, item: Item) {
        let meta = RecordMeta::from(&item);
        self.index.store(item.id.clone(), &item.embedding_text(), meta);
        self.items.insert(item.id.clone(), item);
    }

    /// Index many items; embedding calls are batched by the index.
    pub fn index_items(&mut self, items: Vec<Item>) {
        let entries = items
            .iter()
            .map(|item| crate::index::BatchEntry {
                id: item.id.clone(),
                text: item.embedding_text(),
                meta: RecordMeta::from(item),
            })
            .collect();
        self.index.store_batch(entries);
        for item in items {
            self.items.insert(item.id.clone(), item);
        }
    }

    /// Sync items and vectors against the host's collection.
    pub fn reconcile(&mut self, items: Vec<Item>) -> ReconcileResult {
        let result = self.index.reconcile(&items);
        self.items = items.into_iter().map(|item| (item.id.clone(), item)).collect();
        result
    }

    pub fn remove_item(&mut self, id: &str) -> bool {
        let had_vector = self.index.delete(id).is_some();
        self.items.remove(id).is_some() || had_vector
    }

    /// Attach analyzer output for an item; feeds quality scoring and
    /// reason evidence.
    pub fn set_analysis(&mut self, id: impl Into<String>, analysis: AnalysisResult) {
        self.analysis.insert(id.into(), analysis);
    }

    /// Produce ranked, explained recommendations. Never fails; a broken
    /// pipeline yields an empty result with the failure in the explanation.
    pub fn recommend(&mut self, request: &RecommendationRequest) -> RecommendationResult {
        let started = Instant::now();
        let strategy = select_strategy(request);

        let mut result = match self.run_pipeline(request, strategy) {
            Ok(result) => result,
            Err(err) => {
                log::error!("recommendation pipeline failed: {:#}", err);
                RecommendationResult {
                    items: Vec::new(),
                    explanation: format!("Recommendation failed: {}", err),
                    confidence: 0.0,
                    strategy,
                    meta: ResultMeta {
                        processing_ms: 0,
                        total_candidates: 0,
                        filters_applied: Vec::new(),
                        engine_version: ENGINE_VERSION.to_string(),
                    },
                }
            }
        };

        result.meta.processing_ms = started.elapsed().as_millis() as u64;
        self.push_history(&result);
        result
    }

    pub fn recommend_by_query(
        &mut self,
        query: impl Into<String>,
        limit: Option<usize>,
    ) -> RecommendationResult {
        self.recommend(&RecommendationRequest {
            query: Some(query.into()),
            limit,
            ..RecommendationRequest::default()
        })
    }

    pub fn recommend_by_context(
        &mut self,
        current_items: Vec<Item>,
        limit: Option<usize>,
    ) -> RecommendationResult {
        self.recommend(&RecommendationRequest {
            current_items,
            limit,
            ..RecommendationRequest::default()
        })
    }

    /// Pure nearest-neighbor lookup, bypassing multi-factor scoring. Use
    /// when only similarity matters.
    pub fn related(&self, id: &str, limit: usize) -> Result<Vec<SimilarityResult>, IndexError> {
        self.index.find_similar_by_id(id, RELATED_THRESHOLD, limit)
    }

    /// Record a user interaction. Ignored when learning is disabled.
    pub fn record_interaction(&mut self, id: &str, interaction: Interaction) {
        if !self.config.learning_enabled {
            log::debug!("learning disabled, dropping {:?} for '{}'", interaction, id);
            return;
        }
        let now = Utc::now();
        let record = self
            .usage
            .entry(id.to_string())
            .or_insert_with(|| UsageRecord::new(now));
        match interaction {
            Interaction::View => record.views += 1,
            Interaction::Use => record.uses += 1,
            Interaction::Like => record.likes += 1,
            Interaction::Dislike => record.dislikes += 1,
        }
        record.last_accessed = now;
    }

    /// Apply a partial preference update; omitted fields keep their value.
    pub fn update_preferences(&mut self, update: PreferenceUpdate) {
        if let Some(kinds) = update.preferred_kinds {
            self.preferences.preferred_kinds = kinds;
        }
        if let Some(time) = update.time_preference {
            self.preferences.time_preference = time;
        }
        if let Some(complexity) = update.complexity {
            self.preferences.complexity = complexity;
        }
        if let Some(topics) = update.topic_interests {
            self.preferences.topic_interests = topics;
        }
        if let Some(languages) = update.languages {
            self.preferences.languages = languages;
        }
    }

    /// Aggregate statistics over the retained result history.
    pub fn stats(&self) -> EngineStats {
        let total = self.history.len();
        if total == 0 {
            return EngineStats::default();
        }

        let mut stats = EngineStats {
            total_recommendations: total,
            ..EngineStats::default()
        };
        let mut confidence_sum = 0.0f32;
        let mut time_sum = 0u64;
        for entry in &self.history {
            confidence_sum += entry.confidence;
            time_sum += entry.processing_ms;
            *stats
                .strategy_counts
                .entry(entry.strategy.as_str().to_string())
                .or_insert(0) += 1;
        }
        stats.avg_confidence = confidence_sum / total as f32;
        stats.avg_processing_ms = time_sum as f64 / total as f64;
        stats
    }

    fn run_pipeline(
        &self,
        request: &RecommendationRequest,
        strategy: Strategy,
    ) -> anyhow::Result<RecommendationResult> {
        let prefs = request.preferences.as_ref().unwrap_or(&self.preferences);
        let limit = request.limit.unwrap_or(self.config.max_results);
        let now = Utc::now();

        let candidates = self.collect_candidates(request, strategy)?;
        let total_candidates = candidates.len();

        let mut scored: Vec<RecommendedItem> = candidates
            .into_iter()
            .filter_map(|candidate| {
                let item = self.items.get(&candidate.id)?;
                Some(self.score_item(item, candidate.similarity, prefs, now))
            })
            .collect();

        let filters_applied = self.apply_filters(&mut scored, prefs);

        // Stable sort keeps prior relative order for tied scores.
        scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(limit);

        let confidence = result_confidence(&scored);
        let explanation = compose_explanation(strategy, &scored);

        Ok(RecommendationResult {
            items: scored,
            explanation,
            confidence,
            strategy,
            meta: ResultMeta {
                processing_ms: 0,
                total_candidates,
                filters_applied,
                engine_version: ENGINE_VERSION.to_string(),
            },
        })
    }

    /// Strategy-dependent candidate pool, de-duplicated by id with the
    /// first occurrence winning.
    fn collect_candidates(
        &self,
        request: &RecommendationRequest,
        strategy: Strategy,
    ) -> anyhow::Result<Vec<Candidate>> {
        let mut seen: HashSet<String> = HashSet::new();
        let mut candidates = Vec::new();

        match strategy {
            Strategy::SemanticSearch => {
                if let Some(query) = request.query.as_deref() {
                    for hit in self.index.find_similar(query, SEMANTIC_THRESHOLD, SEMANTIC_CANDIDATES)
                    {
                        if seen.insert(hit.id.clone()) {
                            candidates.push(Candidate {
                                id: hit.id,
                                similarity: Some(hit.score),
                            });
                        }
                    }
                }
            }
            Strategy::Contextual => {
                for current in &request.current_items {
                    let neighbors = match self.index.find_similar_by_id(
                        &current.id,
                        CONTEXT_THRESHOLD,
                        CONTEXT_NEIGHBORS,
                    ) {
                        Ok(neighbors) => neighbors,
                        Err(IndexError::ItemNotFound(_)) => {
                            log::debug!("context item '{}' has no vector, skipping", current.id);
                            continue;
                        }
                        Err(err) => return Err(err.into()),
                    };
                    for hit in neighbors {
                        if seen.insert(hit.id.clone()) {
                            candidates.push(Candidate {
                                id: hit.id,
                                similarity: Some(hit.score),
                            });
                        }
                    }
                }
            }
            Strategy::ContentBased | Strategy::Hybrid => {
                for id in self.index.ids().take(BROWSE_CANDIDATES) {
                    if seen.insert(id.to_string()) {
                        candidates.push(Candidate {
                            id: id.to_string(),
                            similarity: None,
                        });
                    }
                }
            }
        }

        Ok(candidates)
    }

    fn score_item(
        &self,
        item: &Item,
        similarity: Option<f32>,
        prefs: &UserPreferences,
        now: DateTime<Utc>,
    ) -> RecommendedItem {
        let analysis = self.analysis.get(&item.id);
        let usage_record = self.usage.get(&item.id);
        let pref_match = preference_score(item, prefs);

        let components = ScoreComponents {
            semantic: similarity.unwrap_or(0.0).max(0.0),
            temporal: temporal_score(item.created_at, now, prefs.time_preference),
            preference: pref_match.score,
            usage: usage_score(usage_record),
            quality: quality_score(item, analysis),
        };

        let reasons = build_reasons(item, &components, &pref_match, usage_record, analysis, now);
        let factors = build_factors(&components);

        RecommendedItem {
            item: item.clone(),
            score: components.total(),
            reasons,
            factors,
        }
    }

    /// Drop low scores, off-preference kinds (unless high-confidence), and
    /// off-preference complexity. Returns the names of the filters applied.
    fn apply_filters(&self, scored: &mut Vec<RecommendedItem>, prefs: &UserPreferences) -> Vec<String> {
        let mut applied = Vec::new();

        let threshold = self.config.score_threshold;
        scored.retain(|entry| entry.score > threshold);
        applied.push("score_threshold".to_string());

        if !prefs.preferred_kinds.is_empty() {
            scored.retain(|entry| {
                prefs.preferred_kinds.contains(&entry.item.kind)
                    || entry.score > KIND_FILTER_OVERRIDE
            });
            applied.push("preferred_kinds".to_string());
        }

        // Complexity filtering is strict: no score bypass.
        match prefs.complexity {
            ComplexityPreference::Simple => {
                scored.retain(|entry| complexity(&entry.item) < 0.5);
                applied.push("complexity".to_string());
            }
            ComplexityPreference::Complex => {
                scored.retain(|entry| complexity(&entry.item) > 0.6);
                applied.push("complexity".to_string());
            }
            ComplexityPreference::Medium => {}
        }

        applied
    }

    fn push_history(&mut self, result: &RecommendationResult) {
        self.history.push(HistoryEntry {
            strategy: result.strategy,
            confidence: result.confidence,
            processing_ms: result.meta.processing_ms,
        });
        if self.history.len() > HISTORY_CAP {
            let excess = self.history.len() - HISTORY_RETAIN;
            self.history.drain(..excess);
        }
    }
}

/// Priority-ordered strategy selection; the first matching condition wins.
/// Blank queries count as absent.
pub fn select_strategy(request: &RecommendationRequest) -> Strategy {
    if request.query.as_deref().is_some_and(|q| !q.trim().is_empty()) {
        Strategy::SemanticSearch
    } else if !request.current_items.is_empty() {
        Strategy::Contextual
    } else if request.context.is_some() {
        Strategy::ContentBased
    } else {
        Strategy::Hybrid
    }
}

/// One reason per component whose weighted contribution clears the floor,
/// sorted strongest first.
fn build_reasons(
    item: &Item,
    components: &ScoreComponents,
    pref_match: &PreferenceMatch,
    usage_record: Option<&UsageRecord>,
    analysis: Option<&AnalysisResult>,
    now: DateTime<Utc>,
) -> Vec<Reason> {
    let mut reasons = Vec::new();

    let semantic = components.semantic * scoring::SEMANTIC_WEIGHT;
    if semantic > MIN_REASON_CONTRIBUTION {
        reasons.push(Reason {
            kind: ReasonKind::SemanticSimilarity,
            weight: semantic,
            evidence: format!("Content matches the request (similarity {:.2})", components.semantic),
        });
    }

    let temporal = components.temporal * scoring::TEMPORAL_WEIGHT;
    if temporal > MIN_REASON_CONTRIBUTION {
        let age_days = (now - item.created_at).num_days().max(0);
        reasons.push(Reason {
            kind: ReasonKind::TemporalRelevance,
            weight: temporal,
            evidence: format!("Created {} day(s) ago", age_days),
        });
    }

    let preference = components.preference * scoring::PREFERENCE_WEIGHT;
    if preference > MIN_REASON_CONTRIBUTION {
        let mut parts = Vec::new();
        if pref_match.kind_matched {
            parts.push("preferred content type".to_string());
        }
        if !pref_match.matched_topics.is_empty() {
            parts.push(format!("topics: {}", pref_match.matched_topics.join(", ")));
        }
        if pref_match.language_matched {
            parts.push("preferred language".to_string());
        }
        reasons.push(Reason {
            kind: ReasonKind::PreferenceMatch,
            weight: preference,
            evidence: format!("Matches {}", parts.join("; ")),
        });
    }

    let usage = components.usage * scoring::USAGE_WEIGHT;
    if usage > MIN_REASON_CONTRIBUTION {
        let (total, likes) = usage_record
            .map(|r| (r.total_interactions(), r.likes))
            .unwrap_or((0, 0));
        reasons.push(Reason {
            kind: ReasonKind::UsagePattern,
            weight: usage,
            evidence: format!("Used {} time(s), {} like(s)", total, likes),
        });
    }

    let quality = components.quality * scoring::QUALITY_WEIGHT;
    if quality > MIN_REASON_CONTRIBUTION {
        let evidence = match analysis.filter(|a| !a.keywords.is_empty()) {
            Some(analysis) => format!(
                "Substantial content covering {}",
                analysis.keywords.iter().take(3).cloned().collect::<Vec<_>>().join(", ")
            ),
            None => "Substantial, well-described content".to_string(),
        };
        reasons.push(Reason {
            kind: ReasonKind::ContentQuality,
            weight: quality,
            evidence,
        });
    }

    reasons.sort_by(|a, b| b.weight.partial_cmp(&a.weight).unwrap_or(std::cmp::Ordering::Equal));
    reasons
}

fn build_factors(components: &ScoreComponents) -> Vec<RelevanceFactor> {
    vec![
        RelevanceFactor {
            name: "semantic".to_string(),
            value: components.semantic,
            weight: scoring::SEMANTIC_WEIGHT,
            description: "Similarity between the request and the item".to_string(),
        },
        RelevanceFactor {
            name: "temporal".to_string(),
            value: components.temporal,
            weight: scoring::TEMPORAL_WEIGHT,
            description: "Age relative to the user's time preference".to_string(),
        },
        RelevanceFactor {
            name: "preference".to_string(),
            value: components.preference,
            weight: scoring::PREFERENCE_WEIGHT,
            description: "Match against stated type/topic/language preferences".to_string(),
        },
        RelevanceFactor {
            name: "usage".to_string(),
            value: components.usage,
            weight: scoring::USAGE_WEIGHT,
            description: "Interaction frequency blended with like sentiment".to_string(),
        },
        RelevanceFactor {
            name: "quality".to_string(),
            value: components.quality,
            weight: scoring::QUALITY_WEIGHT,
            description: "Content length, preview, and metadata completeness".to_string(),
        },
    ]
}

/// Confidence favors consistently high scores over a wide spread at the
/// same mean: 0.7 * mean + 0.3 * (1 - variance), clamped to [0, 1].
fn result_confidence(items: &[RecommendedItem]) -> f32 {
    if items.is_empty() {
        return 0.0;
    }
    let n = items.len() as f32;
    let mean = items.iter().map(|i| i.score).sum::<f32>() / n;
    let variance = items.iter().map(|i| (i.score - mean).powi(2)).sum::<f32>() / n;
    (0.7 * mean + 0.3 * (1.0 - variance)).clamp(0.0, 1.0)
}

fn compose_explanation(strategy: Strategy, items: &[RecommendedItem]) -> String {
    if items.is_empty() {
        return format!(
            "No recommendations matched using the {} strategy.",
            strategy.as_str()
        );
    }
    let mean = items.iter().map(|i| i.score).sum::<f32>() / items.len() as f32;
    let top = &items[0];
    let leading: Vec<&str> = top.reasons.iter().take(2).map(|r| r.kind.label()).collect();
    let because = if leading.is_empty() {
        "overall relevance".to_string()
    } else {
        leading.join(" and ")
    };
    format!(
        "Found {} recommendation(s) using the {} strategy (average score {:.2}); '{}' leads on {}.",
        items.len(),
        strategy.as_str(),
        mean,
        top.item.title,
        because
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::items::ItemKind;
    use crate::recommend::types::TimePreference;

    fn engine() -> RecommendationEngine {
        RecommendationEngine::with_local_embeddings(EngineConfig::default())
    }

    fn plain(id: &str, title: &str, content: &str) -> Item {
        Item::new(id, ItemKind::PlainText, title, content)
    }

    #[test]
    fn test_strategy_priority_order() {
        let query_wins = RecommendationRequest {
            query: Some("q".to_string()),
            current_items: vec![plain("a", "t", "c")],
            context: Some(Default::default()),
            ..Default::default()
        };
        assert_eq!(select_strategy(&query_wins), Strategy::SemanticSearch);

        let context_items = RecommendationRequest {
            current_items: vec![plain("a", "t", "c")],
            context: Some(Default::default()),
            ..Default::default()
        };
        assert_eq!(select_strategy(&context_items), Strategy::Contextual);

        let working_context = RecommendationRequest {
            context: Some(Default::default()),
            ..Default::default()
        };
        assert_eq!(select_strategy(&working_context), Strategy::ContentBased);

        assert_eq!(
            select_strategy(&RecommendationRequest::default()),
            Strategy::Hybrid
        );
    }

    #[test]
    fn test_blank_query_is_treated_as_absent() {
        let request = RecommendationRequest {
            query: Some("   ".to_string()),
            ..Default::default()
        };
        assert_eq!(select_strategy(&request), Strategy::Hybrid);
    }

    #[test]
    fn test_query_ranks_matching_item_first_with_semantic_reason() {
        let mut engine = engine();
        engine.index_item(plain("react", "React component", ""));
        engine.index_item(plain("pasta", "Pasta recipes", ""));
        engine.index_item(plain("garden", "Gardening tips", ""));

        let result = engine.recommend_by_query("react component", None);

        assert_eq!(result.strategy, Strategy::SemanticSearch);
        assert!(!result.items.is_empty());
        assert_eq!(result.items[0].item.id, "react");
        assert!(result.items[0]
            .reasons
            .iter()
            .any(|r| r.kind == ReasonKind::SemanticSimilarity));
    }

    #[test]
    fn test_empty_index_returns_well_formed_empty_result() {
        let mut engine = engine();
        let result = engine.recommend_by_query("anything at all", None);

        assert!(result.items.is_empty());
        assert_eq!(result.confidence, 0.0);
        assert!(!result.explanation.is_empty());
        assert_eq!(result.meta.total_candidates, 0);
        assert_eq!(result.meta.engine_version, env!("CARGO_PKG_VERSION"));
    }

    #[test]
    fn test_hybrid_strategy_browses_the_index() {
        let mut engine = engine();
        engine.index_item(plain("a", "First note", &"x".repeat(200)));
        engine.index_item(plain("b", "Second note", &"y".repeat(200)));

        let result = engine.recommend(&RecommendationRequest::default());
        assert_eq!(result.strategy, Strategy::Hybrid);
        // No query: temporal (0.5 * 0.2) + quality clears the 0.1 floor.
        assert_eq!(result.items.len(), 2);
        assert!(result.confidence > 0.0);
    }

    #[test]
    fn test_contextual_recommends_neighbors_of_current_items() {
        let mut engine = engine();
        let seed = plain("seed", "Rust async runtime", "notes about executors");
        let twin = plain("twin", "Rust async runtime", "notes about executors");
        let other = plain("other", "Completely unrelated cooking", "paella ingredients");
        engine.index_item(seed.clone());
        engine.index_item(twin);
        engine.index_item(other);

        let result = engine.recommend_by_context(vec![seed], None);
        assert_eq!(result.strategy, Strategy::Contextual);
        assert!(result.items.iter().any(|r| r.item.id == "twin"));
        // The seed itself is never recommended back.
        assert!(!result.items.iter().any(|r| r.item.id == "seed"));
    }

    #[test]
    fn test_kind_filter_keeps_high_scores() {
        let mut engine = engine();

        // All three share the same embedding text, so each is an exact
        // match for the query.
        let kept_code = Item::new("code", ItemKind::Code, "rust memory management", "");
        let kept_high = plain("high", "rust memory management", "")
            .with_preview("a preview")
            .with_metadata("source", serde_json::json!("import"));
        let dropped = plain("low", "rust memory management", "");
        engine.index_item(kept_code);
        engine.index_item(kept_high);
        engine.index_item(dropped);
        for _ in 0..10 {
            engine.record_interaction("high", Interaction::Like);
        }

        let mut prefs = UserPreferences::default();
        prefs.preferred_kinds.insert(ItemKind::Code);
        prefs.time_preference = TimePreference::Recent;

        let result = engine.recommend(&RecommendationRequest {
            query: Some("rust memory management".to_string()),
            preferences: Some(prefs),
            ..Default::default()
        });

        let ids: Vec<&str> = result.items.iter().map(|r| r.item.id.as_str()).collect();
        assert!(ids.contains(&"code"), "preferred kind dropped: {:?}", ids);
        assert!(ids.contains(&"high"), "high-score override failed: {:?}", ids);
        assert!(!ids.contains(&"low"), "non-preferred low score kept: {:?}", ids);
        assert!(result
            .meta
            .filters_applied
            .contains(&"preferred_kinds".to_string()));
    }

    #[test]
    fn test_complexity_filter_is_strict() {
        let mut engine = engine();

        let simple = plain("simple", "Short note", "just a sentence");
        let dense_body = r#"
            fn a() { if x { for i in xs { while y { match z { _ => {} } } } } }
            fn b() { if q { loop { if r { } } } else { for j in js { } } }
            fn c() { match m { _ => { if n { } } } }
        "#
        .repeat(4);
        let complex = Item::new("complex", ItemKind::Code, "Dense module", dense_body);
        engine.index_item(simple);
        engine.index_item(complex);
        // Give the complex item usage weight; the filter must drop it anyway.
        for _ in 0..10 {
            engine.record_interaction("complex", Interaction::Like);
        }

        engine.update_preferences(PreferenceUpdate {
            complexity: Some(ComplexityPreference::Simple),
            ..Default::default()
        });

        let result = engine.recommend(&RecommendationRequest::default());
        let ids: Vec<&str> = result.items.iter().map(|r| r.item.id.as_str()).collect();
        assert!(ids.contains(&"simple"));
        assert!(!ids.contains(&"complex"), "complexity filter has no bypass");
        assert!(result.meta.filters_applied.contains(&"complexity".to_string()));
    }

    #[test]
    fn test_result_limit_defaults_and_caps() {
        let mut engine = engine();
        for i in 0..15 {
            engine.index_item(plain(
                &format!("n{}", i),
                &format!("Note {}", i),
                &"content ".repeat(30),
            ));
        }

        let default_cap = engine.recommend(&RecommendationRequest::default());
        assert_eq!(default_cap.items.len(), 10);

        let explicit = engine.recommend(&RecommendationRequest {
            limit: Some(3),
            ..Default::default()
        });
        assert_eq!(explicit.items.len(), 3);
    }

    #[test]
    fn test_interactions_update_counters_independently() {
        let mut engine = engine();
        engine.record_interaction("x", Interaction::Like);
        engine.record_interaction("x", Interaction::Dislike);
        engine.record_interaction("x", Interaction::View);

        let record = engine.usage("x").unwrap();
        assert_eq!(record.likes, 1);
        assert_eq!(record.dislikes, 1);
        assert_eq!(record.views, 1);
        assert_eq!(record.uses, 0);
    }

    #[test]
    fn test_learning_disabled_ignores_interactions() {
        let config = EngineConfig {
            learning_enabled: false,
            ..EngineConfig::default()
        };
        let mut engine = RecommendationEngine::with_local_embeddings(config);
        engine.record_interaction("x", Interaction::Like);
        assert!(engine.usage("x").is_none());
    }

    #[test]
    fn test_update_preferences_is_partial() {
        let mut engine = engine();
        engine.update_preferences(PreferenceUpdate {
            topic_interests: Some(["rust".to_string()].into_iter().collect()),
            ..Default::default()
        });
        engine.update_preferences(PreferenceUpdate {
            time_preference: Some(TimePreference::Recent),
            ..Default::default()
        });

        let prefs = engine.preferences();
        assert!(prefs.topic_interests.contains("rust"));
        assert_eq!(prefs.time_preference, TimePreference::Recent);
        assert_eq!(prefs.complexity, ComplexityPreference::Medium);
    }

    #[test]
    fn test_related_surfaces_missing_id() {
        let engine = engine();
        assert!(matches!(
            engine.related("ghost", 5),
            Err(IndexError::ItemNotFound(_))
        ));
    }

    #[test]
    fn test_history_is_trimmed_and_feeds_stats() {
        let mut engine = engine();
        for _ in 0..1005 {
            engine.recommend(&RecommendationRequest::default());
        }

        let stats = engine.stats();
        // Push 1001 trips the cap (trim to 500), then four more land.
        assert_eq!(stats.total_recommendations, 504);
        assert_eq!(stats.strategy_counts.get("hybrid"), Some(&504));
    }

    #[test]
    fn test_confidence_prefers_consistency() {
        let consistent = vec![
            recommended(0.6),
            recommended(0.6),
            recommended(0.6),
        ];
        let spread = vec![
            recommended(0.95),
            recommended(0.6),
            recommended(0.25),
        ];
        assert!(result_confidence(&consistent) > result_confidence(&spread));
    }

    fn recommended(score: f32) -> RecommendedItem {
        RecommendedItem {
            item: plain("x", "t", "c"),
            score,
            reasons: Vec::new(),
            factors: Vec::new(),
        }
    }
}
