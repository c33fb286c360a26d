//! In-process vector store with named collections.
//!
//! Replaces an external vector database: collections live in a `RwLock`ed
//! map, shared via `Arc` across the worker and handlers. Reuse across jobs
//! is sequential per job; the lock only guards concurrent jobs.

use std::collections::HashMap;

use tokio::sync::RwLock;
use tracing::info;

use crate::rag::embeddings::{EmbeddingClient, EmbeddingError};

/// One stored chunk: payload text, source document name, embedding vector.
/// The embedding may be empty when ingestion ran without an embeddings key
/// (heuristic deployments); `collection_text` still works in that case.
#[derive(Debug, Clone)]
pub struct StoredChunk {
    pub text: String,
    pub source: String,
    pub embedding: Vec<f32>,
}

pub struct ContextStore {
    embedder: EmbeddingClient,
    collections: RwLock<HashMap<String, Vec<StoredChunk>>>,
}

impl ContextStore {
    pub fn new(embedder: EmbeddingClient) -> Self {
        Self {
            embedder,
            collections: RwLock::new(HashMap::new()),
        }
    }

    pub fn embedder(&self) -> &EmbeddingClient {
        &self.embedder
    }

    /// Creates (or recreates, dropping existing chunks) a collection.
    pub async fn create_collection(&self, name: &str) {
        self.collections
            .write()
            .await
            .insert(name.to_string(), Vec::new());
    }

    pub async fn collection_exists(&self, name: &str) -> bool {
        self.collections.read().await.contains_key(name)
    }

    /// Appends chunks to a collection, creating it if missing.
    pub async fn upsert(&self, name: &str, chunks: Vec<StoredChunk>) {
        self.collections
            .write()
            .await
            .entry(name.to_string())
            .or_default()
            .extend(chunks);
    }

    /// All chunk texts of a collection joined with blank lines, in insertion
    /// order. Empty string for a missing collection. No embedding call —
    /// this is the heuristic backend's reference text.
    pub async fn collection_text(&self, name: &str) -> String {
        self.collections
            .read()
            .await
            .get(name)
            .map(|chunks| {
                chunks
                    .iter()
                    .map(|c| c.text.as_str())
                    .collect::<Vec<_>>()
                    .join("\n\n")
            })
            .unwrap_or_default()
    }

    /// Embeds `query` and returns the `top_k` most similar chunk texts of
    /// `collection`, joined with blank lines in descending-similarity order.
    ///
    /// A missing collection returns an empty string rather than an error, so
    /// the pipeline degrades to empty context instead of failing. Embedding
    /// failures propagate.
    pub async fn retrieve(
        &self,
        query: &str,
        collection: &str,
        top_k: usize,
    ) -> Result<String, EmbeddingError> {
        let chunks = match self.collections.read().await.get(collection) {
            Some(chunks) => chunks.clone(),
            None => {
                info!("Collection {collection} not found, returning empty context");
                return Ok(String::new());
            }
        };

        let query_vector = self.embedder.embed(query).await?;
        let combined = rank_and_join(&query_vector, &chunks, top_k);

        info!(
            "Retrieved {} chunks from {collection}, total {} chars",
            top_k.min(chunks.len()),
            combined.chars().count()
        );
        Ok(combined)
    }
}

/// Ranks chunks by cosine similarity to the query vector and joins the
/// `top_k` payload texts with blank lines, most similar first.
fn rank_and_join(query_vector: &[f32], chunks: &[StoredChunk], top_k: usize) -> String {
    let mut ranked: Vec<(f32, &StoredChunk)> = chunks
        .iter()
        .map(|c| (cosine_similarity(query_vector, &c.embedding), c))
        .collect();
    ranked.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));

    ranked
        .iter()
        .take(top_k)
        .map(|(_, c)| c.text.as_str())
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Cosine similarity of two vectors; 0.0 for mismatched or empty inputs.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.is_empty() || a.len() != b.len() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> ContextStore {
        // Unconfigured embedder: retrieve() on a present collection would
        // fail, which is exactly what the tests below avoid exercising.
        ContextStore::new(EmbeddingClient::new(
            "http://localhost:9".to_string(),
            String::new(),
        ))
    }

    fn chunk(text: &str, embedding: Vec<f32>) -> StoredChunk {
        StoredChunk {
            text: text.to_string(),
            source: "test.txt".to_string(),
            embedding,
        }
    }

    #[test]
    fn test_cosine_identical_vectors() {
        let v = vec![0.5, 0.5, 0.1];
        assert!((cosine_similarity(&v, &v) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_orthogonal_vectors() {
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]), 0.0);
    }

    #[test]
    fn test_cosine_mismatched_lengths() {
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 0.0]), 0.0);
        assert_eq!(cosine_similarity(&[], &[]), 0.0);
    }

    #[tokio::test]
    async fn test_missing_collection_returns_empty_without_error() {
        let store = store();
        let context = store.retrieve("anything", "does_not_exist", 3).await.unwrap();
        assert_eq!(context, "");
    }

    #[tokio::test]
    async fn test_collection_text_joins_in_order() {
        let store = store();
        store
            .upsert(
                "docs",
                vec![chunk("first", vec![]), chunk("second", vec![])],
            )
            .await;
        assert_eq!(store.collection_text("docs").await, "first\n\nsecond");
    }

    #[tokio::test]
    async fn test_collection_text_missing_is_empty() {
        assert_eq!(store().collection_text("nope").await, "");
    }

    #[test]
    fn test_rank_and_join_orders_by_similarity() {
        let chunks = vec![
            chunk("far", vec![0.0, 1.0]),
            chunk("near", vec![1.0, 0.0]),
            chunk("middle", vec![0.7, 0.7]),
        ];
        let joined = rank_and_join(&[1.0, 0.0], &chunks, 2);
        assert_eq!(joined, "near\n\nmiddle");
    }

    #[test]
    fn test_rank_and_join_top_k_larger_than_collection() {
        let chunks = vec![chunk("only", vec![1.0])];
        assert_eq!(rank_and_join(&[1.0], &chunks, 5), "only");
    }

    #[tokio::test]
    async fn test_create_collection_replaces_existing() {
        let store = store();
        store.upsert("docs", vec![chunk("old", vec![])]).await;
        store.create_collection("docs").await;
        assert!(store.collection_exists("docs").await);
        assert_eq!(store.collection_text("docs").await, "");
    }
}
