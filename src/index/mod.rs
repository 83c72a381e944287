//! In-memory vector index with cosine similarity search.
//!
//! Stores one embedding plus a metadata snapshot per item id and serves
//! linear-scan similarity search over the whole collection. Appropriate for
//! collections up to low tens of thousands of vectors; there is no sub-linear
//! lookup structure. Clustering lives in the `cluster` submodule.

mod cluster;

pub use cluster::{Cluster, ClusterMember};

use crate::embedding::EmbeddingGenerator;
use crate::items::{Item, ItemKind};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Maximum concurrent embedding calls during a batch store.
pub const EMBED_BATCH_WIDTH: usize = 5;

/// Length of the content snapshot kept on each record.
const CONTENT_PREVIEW_LEN: usize = 200;

/// Fixed per-record overhead assumed by the memory estimate.
const RECORD_OVERHEAD: usize = 96;

/// Metadata snapshot captured when a vector is stored. The index does not
/// own item lifecycle; this is what survives if the item itself is gone.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordMeta {
    pub kind: ItemKind,
    pub title: String,
    pub content_preview: String,
    pub created_at: DateTime<Utc>,
}

impl From<&Item> for RecordMeta {
    fn from(item: &Item) -> Self {
        Self {
            kind: item.kind,
            title: item.title.clone(),
            content_preview: item.content.chars().take(CONTENT_PREVIEW_LEN).collect(),
            created_at: item.created_at,
        }
    }
}

/// One stored vector. Exactly one record exists per item id; re-storing
/// replaces the whole record.
#[derive(Debug, Clone)]
pub struct VectorRecord {
    pub id: String,
    pub embedding: Vec<f32>,
    pub meta: RecordMeta,
    /// crc32 of the source text, used by `reconcile` for change detection
    pub content_hash: u32,
    pub stored_at: DateTime<Utc>,
}

/// Search hit. The raw vector is exposed so downstream consumers can reuse
/// it without re-embedding.
#[derive(Debug, Clone)]
pub struct SimilarityResult {
    pub id: String,
    pub meta: RecordMeta,
    /// Cosine similarity in [-1.0, 1.0]
    pub score: f32,
    pub embedding: Vec<f32>,
}

/// Input to `store_batch`.
#[derive(Debug, Clone)]
pub struct BatchEntry {
    pub id: String,
    pub text: String,
    pub meta: RecordMeta,
}

/// Outcome of `reconcile`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileResult {
    pub added: usize,
    pub updated: usize,
    pub removed: usize,
    pub unchanged: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct IndexStats {
    pub records: usize,
    pub embedding_cache_size: usize,
    pub approx_bytes: usize,
    pub oldest: Option<DateTime<Utc>>,
    pub newest: Option<DateTime<Utc>>,
}

#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    #[error("Dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    #[error("No vector stored for item '{0}'")]
    ItemNotFound(String),
}

/// In-memory vector index. Owns the embedding generator and every stored
/// record; collaborators get references, never ownership.
pub struct VectorIndex {
    generator: EmbeddingGenerator,
    records: HashMap<String, VectorRecord>,
    dimensions: usize,
}

impl VectorIndex {
    pub fn new(generator: EmbeddingGenerator) -> Self {
        let dimensions = generator.dimensions();
        Self {
            generator,
            records: HashMap::new(),
            dimensions,
        }
    }

    /// Index using only the deterministic local embedding scheme.
    pub fn with_local_embeddings() -> Self {
        Self::new(EmbeddingGenerator::local())
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn generator(&self) -> &EmbeddingGenerator {
        &self.generator
    }

    /// Embed `text` and store (or overwrite) the record for `id`.
    pub fn store(&mut self, id: impl Into<String>, text: &str, meta: RecordMeta) {
        let embedding = self.generator.embed(text);
        self.insert_record(id.into(), embedding, crc32fast::hash(text.as_bytes()), meta);
    }

    /// Store many entries, bounding concurrent embedding calls to
    /// `EMBED_BATCH_WIDTH`: each chunk's embeddings all land before the next
    /// chunk starts.
    pub fn store_batch(&mut self, entries: Vec<BatchEntry>) {
        use rayon::prelude::*;

        for chunk in entries.chunks(EMBED_BATCH_WIDTH) {
            let generator = &self.generator;
            let embedded: Vec<Vec<f32>> =
                chunk.par_iter().map(|entry| generator.embed(&entry.text)).collect();

            for (entry, embedding) in chunk.iter().zip(embedded) {
                self.insert_record(
                    entry.id.clone(),
                    embedding,
                    crc32fast::hash(entry.text.as_bytes()),
                    entry.meta.clone(),
                );
            }
        }
    }

    /// Store a precomputed vector. Fails if its dimension does not match the
    /// index; the index never truncates or pads.
    pub fn insert_vector(
        &mut self,
        id: impl Into<String>,
        embedding: Vec<f32>,
        meta: RecordMeta,
    ) -> Result<(), IndexError> {
        if embedding.len() != self.dimensions {
            return Err(IndexError::DimensionMismatch {
                expected: self.dimensions,
                got: embedding.len(),
            });
        }
        // No source text, so reconcile will treat this record as changed.
        self.insert_record(id.into(), embedding, 0, meta);
        Ok(())
    }

    fn insert_record(
        &mut self,
        id: String,
        embedding: Vec<f32>,
        content_hash: u32,
        meta: RecordMeta,
    ) {
        let record = VectorRecord {
            id: id.clone(),
            embedding,
            meta,
            content_hash,
            stored_at: Utc::now(),
        };
        self.records.insert(id, record);
    }

    pub fn delete(&mut self, id: &str) -> Option<VectorRecord> {
        self.records.remove(id)
    }

    pub fn get(&self, id: &str) -> Option<&VectorRecord> {
        self.records.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.records.contains_key(id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.records.keys().map(|id| id.as_str())
    }

    pub(crate) fn records(&self) -> impl Iterator<Item = &VectorRecord> {
        self.records.values()
    }

    /// Embed the query text and scan all stored vectors.
    ///
    /// Results with cosine similarity >= `threshold`, sorted descending,
    /// at most `limit`.
    pub fn find_similar(&self, query: &str, threshold: f32, limit: usize) -> Vec<SimilarityResult> {
        let query_embedding = self.generator.embed(query);
        self.scan(&query_embedding, threshold, limit, None)
    }

    /// Same scan against a caller-supplied vector.
    pub fn find_similar_vector(
        &self,
        query: &[f32],
        threshold: f32,
        limit: usize,
    ) -> Result<Vec<SimilarityResult>, IndexError> {
        if query.len() != self.dimensions {
            return Err(IndexError::DimensionMismatch {
                expected: self.dimensions,
                got: query.len(),
            });
        }
        Ok(self.scan(query, threshold, limit, None))
    }

    /// Compare an existing record against all *other* records. The queried
    /// id never appears in its own results.
    pub fn find_similar_by_id(
        &self,
        id: &str,
        threshold: f32,
        limit: usize,
    ) -> Result<Vec<SimilarityResult>, IndexError> {
        let record = self
            .records
            .get(id)
            .ok_or_else(|| IndexError::ItemNotFound(id.to_string()))?;
        Ok(self.scan(&record.embedding, threshold, limit, Some(id)))
    }

    fn scan(
        &self,
        query: &[f32],
        threshold: f32,
        limit: usize,
        exclude: Option<&str>,
    ) -> Vec<SimilarityResult> {
        let mut results: Vec<SimilarityResult> = self
            .records
            .values()
            .filter(|record| exclude.map_or(true, |excluded| record.id != excluded))
            .filter_map(|record| {
                let score = cosine(query, &record.embedding);
                if score >= threshold {
                    Some(SimilarityResult {
                        id: record.id.clone(),
                        meta: record.meta.clone(),
                        score,
                        embedding: record.embedding.clone(),
                    })
                } else {
                    None
                }
            })
            .collect();

        results.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        results.truncate(limit);
        results
    }

    /// Bring the index in sync with an item collection: embed new and
    /// changed items, drop records whose item no longer exists. Change
    /// detection uses the stored content hash, so unchanged items cost
    /// nothing.
    pub fn reconcile(&mut self, items: &[Item]) -> ReconcileResult {
        let mut result = ReconcileResult::default();

        let keep: HashSet<&str> = items.iter().map(|item| item.id.as_str()).collect();
        let stale: Vec<String> = self
            .records
            .keys()
            .filter(|id| !keep.contains(id.as_str()))
            .cloned()
            .collect();
        for id in stale {
            self.records.remove(&id);
            result.removed += 1;
        }

        let mut fresh = Vec::new();
        for item in items {
            let text = item.embedding_text();
            let hash = crc32fast::hash(text.as_bytes());
            match self.records.get(&item.id) {
                Some(record) if record.content_hash == hash => result.unchanged += 1,
                Some(_) => {
                    result.updated += 1;
                    fresh.push(BatchEntry {
                        id: item.id.clone(),
                        text,
                        meta: RecordMeta::from(item),
                    });
                }
                None => {
                    result.added += 1;
                    fresh.push(BatchEntry {
                        id: item.id.clone(),
                        text,
                        meta: RecordMeta::from(item),
                    });
                }
            }
        }

        if !fresh.is_empty() {
            log::debug!("reconcile embedding {} new/changed items", fresh.len());
            self.store_batch(fresh);
        }
        result
    }

    pub fn stats(&self) -> IndexStats {
        let approx_bytes = self
            .records
            .values()
            .map(|record| {
                record.embedding.len() * 4
                    + record.id.len()
                    + record.meta.title.len()
                    + record.meta.content_preview.len()
                    + RECORD_OVERHEAD
            })
            .sum();

        IndexStats {
            records: self.records.len(),
            embedding_cache_size: self.generator.cache_size(),
            approx_bytes,
            oldest: self.records.values().map(|r| r.stored_at).min(),
            newest: self.records.values().map(|r| r.stored_at).max(),
        }
    }
}

/// Cosine similarity with an explicit dimension check. Zero-magnitude
/// vectors compare as 0.0, never NaN.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<f32, IndexError> {
    if a.len() != b.len() {
        return Err(IndexError::DimensionMismatch {
            expected: a.len(),
            got: b.len(),
        });
    }
    Ok(cosine(a, b))
}

/// Internal cosine over same-dimension slices.
fn cosine(a: &[f32], b: &[f32]) -> f32 {
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a < f32::EPSILON || norm_b < f32::EPSILON {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    dot / (norm_a * norm_b)
}
