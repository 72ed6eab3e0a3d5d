//! Local feature-hashing embedder

use async_trait::async_trait;

use crate::domain::embedding::EmbeddingProvider;
use crate::domain::ingestion::tokenize;
use crate::domain::DomainError;

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

fn fnv1a(token: &str) -> u64 {
    token.bytes().fold(FNV_OFFSET, |hash, b| {
        (hash ^ u64::from(b)).wrapping_mul(FNV_PRIME)
    })
}

/// Hashes each token into one of `dimensions` buckets with a signed weight
/// and L2-normalizes the result. Deterministic across runs and platforms.
#[derive(Debug, Clone)]
pub struct HashingEmbedder {
    dimensions: usize,
}

impl HashingEmbedder {
    pub fn new(dimensions: usize) -> Result<Self, DomainError> {
        if dimensions == 0 {
            return Err(DomainError::configuration(
                "embedding dimensions must be greater than 0",
            ));
        }
        Ok(Self { dimensions })
    }

    fn embed_text(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimensions];

        for token in tokenize(text) {
            let hash = fnv1a(&token);
            let bucket = (hash % self.dimensions as u64) as usize;
            let sign = if hash >> 63 == 0 { 1.0 } else { -1.0 };
            vector[bucket] += sign;
        }

        let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            vector.iter_mut().for_each(|x| *x /= norm);
        }
        vector
    }
}

#[async_trait]
impl EmbeddingProvider for HashingEmbedder {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, DomainError> {
        Ok(texts.iter().map(|t| self.embed_text(t)).collect())
    }

    fn provider_name(&self) -> &'static str {
        "hashing"
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::cosine_similarity;

    #[tokio::test]
    async fn test_vectors_are_normalized() {
        let embedder = HashingEmbedder::new(64).unwrap();
        let vector = embedder.embed_one("refund policy for orders").await.unwrap();

        let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert_eq!(vector.len(), 64);
        assert!((norm - 1.0).abs() < 1e-5);
    }

    #[tokio::test]
    async fn test_deterministic_and_case_insensitive() {
        let embedder = HashingEmbedder::new(128).unwrap();

        let a = embedder.embed_one("Refund Policy").await.unwrap();
        let b = embedder.embed_one("refund policy!").await.unwrap();

        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn test_shared_terms_score_higher() {
        let embedder = HashingEmbedder::new(256).unwrap();
        let query = embedder.embed_one("refund policy").await.unwrap();
        let related = embedder.embed_one("our refund policy explained").await.unwrap();
        let unrelated = embedder.embed_one("quarterly hiring plan").await.unwrap();

        assert!(cosine_similarity(&query, &related) > cosine_similarity(&query, &unrelated));
    }

    #[tokio::test]
    async fn test_empty_text_is_zero_vector() {
        let embedder = HashingEmbedder::new(16).unwrap();
        let vector = embedder.embed_one("").await.unwrap();
        assert!(vector.iter().all(|x| *x == 0.0));
    }

    #[test]
    fn test_zero_dimensions_rejected() {
        assert!(HashingEmbedder::new(0).is_err());
    }
}
