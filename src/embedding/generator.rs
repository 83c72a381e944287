//! Content-keyed embedding cache with provider fallback.

use super::{local::LocalEmbeddingSource, EmbeddingSource, MAX_EMBED_INPUT};
use std::collections::HashMap;
use std::sync::Mutex;

/// Generates one embedding per text, preferring the configured source and
/// falling back to the deterministic local scheme on any failure, so a call
/// always resolves with a vector.
///
/// The cache is keyed by a crc32 of the *original* text, so identical calls
/// hit regardless of truncation. A key collision only returns an unrelated
/// cached vector, which is a relevance risk, not a correctness one. There is
/// no eviction: long-running hosts with unbounded distinct inputs should
/// expect the cache to grow.
///
/// Remote and local vectors do not share a coordinate system; an index mixing
/// the two stays valid but similarity scores across the boundary degrade.
pub struct EmbeddingGenerator {
    source: Box<dyn EmbeddingSource>,
    fallback: LocalEmbeddingSource,
    /// Mutex so `embed` can take `&self` from batch worker threads.
    cache: Mutex<HashMap<u32, Vec<f32>>>,
    dimensions: usize,
}

impl EmbeddingGenerator {
    /// Build a generator around the given provider. The local fallback is
    /// created at the same dimension so mixed failure modes never produce
    /// vectors of different lengths.
    pub fn new(source: Box<dyn EmbeddingSource>) -> Self {
        let dimensions = source.dimensions();
        Self {
            source,
            fallback: LocalEmbeddingSource::with_dimensions(dimensions),
            cache: Mutex::new(HashMap::new()),
            dimensions,
        }
    }

    /// Generator that only ever uses the deterministic local scheme.
    pub fn local() -> Self {
        Self::new(Box::new(LocalEmbeddingSource::new()))
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    pub fn cache_size(&self) -> usize {
        match self.cache.lock() {
            Ok(guard) => guard.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        }
    }

    /// Embed a text. Never fails: provider errors are logged and recovered
    /// via the local fallback.
    pub fn embed(&self, text: &str) -> Vec<f32> {
        let key = crc32fast::hash(text.as_bytes());

        {
            let cache = match self.cache.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            if let Some(hit) = cache.get(&key) {
                return hit.clone();
            }
        }

        let input = truncate_input(text);
        let vector = if self.source.supports_embedding() {
            match self.source.embed(&input) {
                Ok(vector) => vector,
                Err(err) => {
                    log::warn!(
                        "embedding via '{}' failed, using local fallback: {:#}",
                        self.source.name(),
                        err
                    );
                    self.fallback.encode(&input)
                }
            }
        } else {
            self.fallback.encode(&input)
        };

        let mut cache = match self.cache.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        cache.insert(key, vector.clone());
        vector
    }
}

/// Bound provider payload size. Character-based, not byte-based, so the cut
/// never splits a UTF-8 sequence.
fn truncate_input(text: &str) -> String {
    if text.len() <= MAX_EMBED_INPUT {
        return text.to_string();
    }
    text.chars().take(MAX_EMBED_INPUT).collect()
}
