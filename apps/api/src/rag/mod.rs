// Retrieval-augmented context for the evaluation pipeline.
// All vector state lives in process memory; the embeddings backend is the
// only network dependency, and the heuristic backend never touches it.

pub mod chunking;
pub mod embeddings;
pub mod ingest;
pub mod store;
