//! System-document ingestion: job descriptions, the case-study brief, and
//! scoring rubrics are chunked, embedded, and loaded into the context store.
//!
//! Runs lazily from the pipeline's context stage when the store is empty.
//! When no embeddings key is configured, chunks are stored without vectors;
//! `collection_text` (the heuristic backend's input) is unaffected.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{error, info, warn};

use crate::files::extract_text;
use crate::rag::chunking::chunk_by_paragraphs;
use crate::rag::store::{ContextStore, StoredChunk};

pub const JOB_DESCRIPTIONS: &str = "job_descriptions";
pub const CASE_STUDY: &str = "case_study";
pub const SCORING_RUBRICS: &str = "scoring_rubrics";

const MAX_CHUNK_CHARS: usize = 800;

/// Ingests everything under `docs_dir` into the three collections.
/// Returns the total number of chunks stored.
pub async fn run(store: &ContextStore, docs_dir: &Path) -> Result<usize> {
    info!("Starting document ingestion from {}", docs_dir.display());
    let mut total = 0usize;

    store.create_collection(JOB_DESCRIPTIONS).await;
    for path in files_in(&docs_dir.join(JOB_DESCRIPTIONS))? {
        total += ingest_document(store, &path, JOB_DESCRIPTIONS).await?;
    }

    store.create_collection(CASE_STUDY).await;
    for path in files_matching(docs_dir, |stem, _| stem == "case_study_brief")? {
        total += ingest_document(store, &path, CASE_STUDY).await?;
    }

    store.create_collection(SCORING_RUBRICS).await;
    for path in files_matching(docs_dir, |stem, _| stem.ends_with("_rubric"))? {
        total += ingest_document(store, &path, SCORING_RUBRICS).await?;
    }

    info!("Ingestion complete: {total} chunks stored");
    Ok(total)
}

/// Ingests a single document into one collection; returns its chunk count.
/// Individual chunk-embedding failures are logged and skipped.
async fn ingest_document(store: &ContextStore, path: &Path, collection: &str) -> Result<usize> {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string());
    info!("Ingesting {name} into {collection}");

    let data = std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let text = extract_text(&name, &data);
    if text.trim().is_empty() {
        warn!("Empty document: {name}");
        return Ok(0);
    }

    let chunks = chunk_by_paragraphs(&text, MAX_CHUNK_CHARS);
    info!("Created {} chunks from {name}", chunks.len());

    let embed = store.embedder().available();
    let mut stored = Vec::with_capacity(chunks.len());
    for (i, chunk) in chunks.into_iter().enumerate() {
        let embedding = if embed {
            match store.embedder().embed(&chunk).await {
                Ok(v) => v,
                Err(e) => {
                    error!("Error embedding chunk {i} of {name}: {e}");
                    continue;
                }
            }
        } else {
            Vec::new()
        };
        stored.push(StoredChunk {
            text: chunk,
            source: name.clone(),
            embedding,
        });
    }

    let count = stored.len();
    if count > 0 {
        store.upsert(collection, stored).await;
        info!("Ingested {count} chunks from {name}");
    }
    Ok(count)
}

/// All ingestable files (txt, md, pdf) directly inside `dir`; empty if the
/// directory does not exist.
fn files_in(dir: &Path) -> Result<Vec<PathBuf>> {
    files_matching(dir, |_, _| true)
}

/// Ingestable files in `dir` whose (stem, extension) pass the filter.
fn files_matching(dir: &Path, pred: impl Fn(&str, &str) -> bool) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    let mut out = Vec::new();
    for entry in
        std::fs::read_dir(dir).with_context(|| format!("Failed to list {}", dir.display()))?
    {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();
        let ext = path
            .extension()
            .map(|s| s.to_string_lossy().to_ascii_lowercase())
            .unwrap_or_default();
        if matches!(ext.as_str(), "txt" | "md" | "pdf") && pred(&stem, &ext) {
            out.push(path);
        }
    }
    out.sort();
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rag::embeddings::EmbeddingClient;

    fn offline_store() -> ContextStore {
        ContextStore::new(EmbeddingClient::new(
            "http://localhost:9".to_string(),
            String::new(),
        ))
    }

    #[tokio::test]
    async fn test_missing_docs_dir_ingests_nothing() {
        let store = offline_store();
        let total = run(&store, Path::new("/nonexistent/system_docs"))
            .await
            .unwrap();
        assert_eq!(total, 0);
        // Collections exist (empty) so the pipeline does not re-ingest per job.
        assert!(store.collection_exists(JOB_DESCRIPTIONS).await);
        assert!(store.collection_exists(CASE_STUDY).await);
        assert!(store.collection_exists(SCORING_RUBRICS).await);
    }

    #[tokio::test]
    async fn test_ingests_text_docs_without_embeddings_key() {
        let dir = std::env::temp_dir().join(format!("sift-ingest-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(dir.join("job_descriptions")).unwrap();
        std::fs::write(
            dir.join("job_descriptions/backend.txt"),
            "Backend engineer role.\n\nRust and Postgres required.",
        )
        .unwrap();
        std::fs::write(dir.join("case_study_brief.txt"), "Build an evaluator.").unwrap();
        std::fs::write(dir.join("cv_rubric.txt"), "Score 1-5 per criterion.").unwrap();
        std::fs::write(dir.join("README.md"), "not a rubric").unwrap();

        let store = offline_store();
        let total = run(&store, &dir).await.unwrap();
        assert!(total >= 3);
        assert!(store
            .collection_text(JOB_DESCRIPTIONS)
            .await
            .contains("Rust and Postgres"));
        assert!(store.collection_text(CASE_STUDY).await.contains("evaluator"));
        assert!(store
            .collection_text(SCORING_RUBRICS)
            .await
            .contains("criterion"));
        // README.md matches no collection rule.
        assert!(!store.collection_text(SCORING_RUBRICS).await.contains("not a rubric"));

        std::fs::remove_dir_all(&dir).ok();
    }
}
