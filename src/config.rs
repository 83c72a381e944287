//! Engine configuration.
//!
//! All fields have serde defaults so a host can deserialize a partial (or
//! empty) config object and still get a working engine.

use serde::{Deserialize, Serialize};

/// Default minimum total score for a recommendation to survive filtering.
pub const DEFAULT_SCORE_THRESHOLD: f32 = 0.1;

/// Default cap on returned recommendations.
pub const DEFAULT_MAX_RESULTS: usize = 10;

/// How aggressively upstream analysis filters items before they reach
/// the engine. The engine itself treats this as a passthrough hint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisDepth {
    Shallow,
    Medium,
    Deep,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Process items as they arrive rather than on demand
    #[serde(default = "default_true")]
    pub real_time_processing: bool,

    /// Accepted for compatibility; reorganization happens upstream
    #[serde(default)]
    pub auto_reorganize: bool,

    /// Analysis depth hint for upstream collaborators
    #[serde(default = "default_analysis_depth")]
    pub analysis_depth: AnalysisDepth,

    /// Minimum total score for a recommendation [0.0, 1.0]
    #[serde(default = "default_score_threshold")]
    pub score_threshold: f32,

    /// Maximum recommendations returned per request
    #[serde(default = "default_max_results")]
    pub max_results: usize,

    /// When false, interaction recording is ignored
    #[serde(default = "default_true")]
    pub learning_enabled: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            real_time_processing: true,
            auto_reorganize: false,
            analysis_depth: AnalysisDepth::Medium,
            score_threshold: DEFAULT_SCORE_THRESHOLD,
            max_results: DEFAULT_MAX_RESULTS,
            learning_enabled: true,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_analysis_depth() -> AnalysisDepth {
    AnalysisDepth::Medium
}

fn default_score_threshold() -> f32 {
    DEFAULT_SCORE_THRESHOLD
}

fn default_max_results() -> usize {
    DEFAULT_MAX_RESULTS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_object_yields_defaults() {
        let config: EngineConfig = serde_json::from_str("{}").unwrap();
        assert!(config.real_time_processing);
        assert!(!config.auto_reorganize);
        assert_eq!(config.analysis_depth, AnalysisDepth::Medium);
        assert!((config.score_threshold - DEFAULT_SCORE_THRESHOLD).abs() < f32::EPSILON);
        assert_eq!(config.max_results, DEFAULT_MAX_RESULTS);
        assert!(config.learning_enabled);
    }

    #[test]
    fn test_partial_config_overrides() {
        let config: EngineConfig =
            serde_json::from_str(r#"{"analysis_depth": "deep", "max_results": 5}"#).unwrap();
        assert_eq!(config.analysis_depth, AnalysisDepth::Deep);
        assert_eq!(config.max_results, 5);
        assert!(config.learning_enabled);
    }

    #[test]
    fn test_default_matches_empty_deserialization() {
        let deserialized: EngineConfig = serde_json::from_str("{}").unwrap();
        let constructed = EngineConfig::default();
        assert_eq!(deserialized.max_results, constructed.max_results);
        assert_eq!(deserialized.learning_enabled, constructed.learning_enabled);
    }
}
