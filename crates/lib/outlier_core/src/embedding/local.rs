// @awa-component: EMB-LocalProvider
//
//! Local deterministic embedding provider using FNV-1a hash.
//!
//! Produces repeatable embeddings with no external dependencies. The vectors
//! carry no meaning, so scores computed from them are only useful for dry
//! runs and tests.

use async_trait::async_trait;

use super::{EmbeddingError, EmbeddingProvider};

/// Generate a deterministic embedding for a single text using FNV-1a hashing.
///
/// The algorithm seeds an FNV-1a hash from the input text, then uses an
/// xorshift PRNG to fill the vector with values in `[-1, 1]`.
pub fn embed(text: &str, dimensions: usize) -> Vec<f32> {
    // FNV-1a hash of the input text
    let mut seed: u32 = 2_166_136_261;
    for byte in text.bytes() {
        seed ^= byte as u32;
        seed = seed.wrapping_mul(16_777_619);
    }

    // Xorshift PRNG to fill the vector; xorshift never leaves zero.
    let mut vector = Vec::with_capacity(dimensions);
    let mut x = if seed == 0 { 1 } else { seed };
    for _ in 0..dimensions {
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        let normalized = (x as f64) / (u32::MAX as f64);
        vector.push((normalized * 2.0 - 1.0) as f32);
    }

    vector
}

#[derive(Debug, Clone)]
pub struct LocalEmbedder {
    dimensions: usize,
}

impl LocalEmbedder {
    pub fn new(dimensions: usize) -> Self {
        Self { dimensions }
    }
}

#[async_trait]
impl EmbeddingProvider for LocalEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        Ok(embed(text, self.dimensions))
    }

    fn name(&self) -> &str {
        "local"
    }
}
