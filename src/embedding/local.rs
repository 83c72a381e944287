//! Deterministic local embedding via feature hashing.
//!
//! Tokens are lower-cased and whitespace-split; each token spreads a
//! hash-derived signal across every dimension, modulated by the token's
//! relative position. The result is L2-normalized. No model files, no
//! network: the same text always produces the same vector, which keeps
//! cosine comparisons meaningful as long as both sides were embedded by
//! this scheme.

use super::{EmbeddingSource, EMBEDDING_DIM};
use std::f32::consts::PI;

pub struct LocalEmbeddingSource {
    dimensions: usize,
}

impl Default for LocalEmbeddingSource {
    fn default() -> Self {
        Self::new()
    }
}

impl LocalEmbeddingSource {
    pub fn new() -> Self {
        Self::with_dimensions(EMBEDDING_DIM)
    }

    pub fn with_dimensions(dimensions: usize) -> Self {
        Self { dimensions }
    }

    /// Encode text into a normalized vector. Infallible by construction.
    pub fn encode(&self, text: &str) -> Vec<f32> {
        let lowered = text.to_lowercase();
        let tokens: Vec<&str> = lowered.split_whitespace().collect();

        let mut vector = vec![0.0f32; self.dimensions];
        if tokens.is_empty() {
            return vector;
        }

        let scale = 1.0 / (tokens.len() as f32).sqrt();
        for (position, token) in tokens.iter().enumerate() {
            let hash = crc32fast::hash(token.as_bytes());
            let fraction = position as f32 / tokens.len() as f32;

            for (dim, slot) in vector.iter_mut().enumerate() {
                // Per-dimension lane of the token hash: low bits become the
                // weight, high bits the phase offset in [0, pi).
                let lane = hash.rotate_left((dim % 32) as u32).wrapping_mul(dim as u32 | 1);
                let weight = (lane & 0x7ff) as f32 / 1024.0 - 1.0;
                let offset = (lane >> 11) as f32 * (PI / 2_097_152.0);
                *slot += weight * (fraction * PI + offset).sin() * scale;
            }
        }

        l2_normalize(&mut vector);
        vector
    }
}

impl EmbeddingSource for LocalEmbeddingSource {
    fn supports_embedding(&self) -> bool {
        true
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn embed(&self, text: &str) -> anyhow::Result<Vec<f32>> {
        Ok(self.encode(text))
    }

    fn name(&self) -> &'static str {
        "local-hash"
    }
}

/// Normalize in place. A zero vector stays zero.
fn l2_normalize(vector: &mut [f32]) {
    let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > f32::EPSILON {
        for value in vector.iter_mut() {
            *value /= norm;
        }
    }
}
