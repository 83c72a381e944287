//! Domain types exchanged with the host application.
//!
//! Items are produced by an external content parser and stored elsewhere;
//! the engine only keeps the copies it needs for scoring and explanation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, hash::Hash};

/// Closed set of item types recognized by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    Code,
    StructuredData,
    QuestionAnswer,
    PlainText,
}

impl Default for ItemKind {
    fn default() -> Self {
        ItemKind::PlainText
    }
}

/// A single knowledge-base item.
///
/// The metadata bag is open: the external content analyzer may put an
/// importance score, sentiment label, keyword list, source language, etc.
/// in it. The engine reads `language` for code items and otherwise treats
/// the bag as opaque.
#[derive(Debug, Clone, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: String,

    #[serde(default)]
    pub kind: ItemKind,
    pub title: String,
    pub content: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub preview: Option<String>,

    pub created_at: DateTime<Utc>,

    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
}

impl Hash for Item {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state)
    }
}

impl PartialEq for Item {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Item {
    pub fn new(
        id: impl Into<String>,
        kind: ItemKind,
        title: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            kind,
            title: title.into(),
            content: content.into(),
            preview: None,
            created_at: Utc::now(),
            metadata: HashMap::new(),
        }
    }

    pub fn with_preview(mut self, preview: impl Into<String>) -> Self {
        self.preview = Some(preview.into());
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    /// Text fed to the embedding generator: title and content concatenated,
    /// falling back to whichever is non-empty.
    pub fn embedding_text(&self) -> String {
        let title = self.title.trim();
        let content = self.content.trim();
        if title.is_empty() {
            content.to_string()
        } else if content.is_empty() {
            title.to_string()
        } else {
            format!("{} - {}", title, content)
        }
    }

    /// Declared source language, if the analyzer recorded one.
    pub fn language(&self) -> Option<&str> {
        self.metadata.get("language").and_then(|v| v.as_str())
    }
}

/// Per-item analysis produced by the external content analyzer.
/// Consumed as plain data; the engine never calls out for it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// Importance score in [0.0, 1.0]
    #[serde(default)]
    pub importance: f32,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub sentiment: Option<String>,

    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub topics: Vec<String>,
    #[serde(default)]
    pub entities: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equality_is_by_id() {
        let a = Item::new("x", ItemKind::PlainText, "One", "content");
        let b = Item::new("x", ItemKind::Code, "Two", "other content");
        assert_eq!(a, b);
    }

    #[test]
    fn test_embedding_text_combines_title_and_content() {
        let item = Item::new("1", ItemKind::PlainText, "Title", "Body text");
        assert_eq!(item.embedding_text(), "Title - Body text");
    }

    #[test]
    fn test_embedding_text_falls_back_to_nonempty_field() {
        let title_only = Item::new("1", ItemKind::PlainText, "Only title", "");
        assert_eq!(title_only.embedding_text(), "Only title");

        let content_only = Item::new("2", ItemKind::PlainText, "  ", "Only content");
        assert_eq!(content_only.embedding_text(), "Only content");
    }

    #[test]
    fn test_language_read_from_metadata() {
        let item = Item::new("1", ItemKind::Code, "Snippet", "fn main() {}")
            .with_metadata("language", serde_json::json!("rust"));
        assert_eq!(item.language(), Some("rust"));

        let plain = Item::new("2", ItemKind::PlainText, "Note", "text");
        assert_eq!(plain.language(), None);
    }

    #[test]
    fn test_kind_serialization_is_snake_case() {
        let json = serde_json::to_string(&ItemKind::QuestionAnswer).unwrap();
        assert_eq!(json, r#""question_answer""#);
    }
}
