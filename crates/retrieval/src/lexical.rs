//! BM25 lexical retrieval over persisted page chunks.
//!
//! The searchable state is an immutable snapshot behind an `RwLock`.
//! Ingestion builds the next snapshot (collection plus ranking index) outside
//! the lock and swaps it in, so searches never see a half-built index.
//! Writers are serialized by the mutex that owns the store connection.

use crate::bm25::Bm25Index;
use crate::chunker::chunk_pages;
use crate::store;
use crate::tokenizer::tokenize;
use crate::types::{ChunkingOptions, DocumentChunk, DocumentInfo, IndexedChunk, PageText};
use chrono::Utc;
use claims_core::AppResult;
use parking_lot::{Mutex, RwLock};
use rusqlite::Connection;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

struct Snapshot {
    chunks: Vec<IndexedChunk>,
    documents: BTreeMap<String, DocumentInfo>,
    bm25: Bm25Index,
}

impl Snapshot {
    fn build(chunks: Vec<IndexedChunk>, documents: BTreeMap<String, DocumentInfo>) -> Self {
        let corpus: Vec<Vec<String>> = chunks.iter().map(|c| tokenize(&c.text)).collect();
        Self {
            bm25: Bm25Index::new(&corpus),
            chunks,
            documents,
        }
    }
}

/// Lexical document index.
pub struct LexicalIndex {
    path: PathBuf,
    options: ChunkingOptions,
    writer: Mutex<Connection>,
    snapshot: RwLock<Arc<Snapshot>>,
}

impl LexicalIndex {
    /// Open the index file, loading any previously ingested chunks.
    pub fn open(db_path: &Path, options: ChunkingOptions) -> AppResult<Self> {
        let conn = store::init_store(db_path)?;
        let documents = store::load_documents(&conn)?
            .into_iter()
            .map(|doc| (doc.name.clone(), doc))
            .collect::<BTreeMap<_, _>>();
        let chunks = store::load_chunks(&conn)?;

        if !chunks.is_empty() {
            tracing::info!(
                "Loaded lexical index with {} chunks from {} documents",
                chunks.len(),
                documents.len()
            );
        }

        Ok(Self {
            path: db_path.to_path_buf(),
            options,
            writer: Mutex::new(conn),
            snapshot: RwLock::new(Arc::new(Snapshot::build(chunks, documents))),
        })
    }

    /// Open `<data_dir>/lexical_index.sqlite`.
    pub fn open_in_dir(data_dir: &Path, options: ChunkingOptions) -> AppResult<Self> {
        Self::open(&data_dir.join(store::INDEX_FILE), options)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Chunk, persist and index a document, replacing a prior one of the same name.
    ///
    /// Returns the number of chunks produced for this document.
    pub fn ingest_pages(&self, doc_name: &str, pages: &[PageText]) -> AppResult<usize> {
        let new_chunks = chunk_pages(doc_name, pages, self.options);
        let count = new_chunks.len();

        let mut conn = self.writer.lock();
        let current = self.current();
        let replaced = current.documents.contains_key(doc_name);

        let info = DocumentInfo {
            name: doc_name.to_string(),
            ingested_at: Utc::now(),
            chunk_count: count,
        };
        store::replace_document(&mut conn, &info, &new_chunks)?;

        let mut chunks: Vec<IndexedChunk> = current
            .chunks
            .iter()
            .filter(|c| c.doc_name != doc_name)
            .cloned()
            .collect();
        chunks.extend(new_chunks);
        let mut documents = current.documents.clone();
        documents.insert(info.name.clone(), info);

        let next = Arc::new(Snapshot::build(chunks, documents));
        *self.snapshot.write() = next;

        if replaced {
            tracing::info!("Re-ingested {} with {} chunks", doc_name, count);
        } else {
            tracing::info!("Ingested {} chunks from {}", count, doc_name);
        }
        Ok(count)
    }

    /// Top `top_k` chunks for the query, best first.
    pub fn search(&self, query: &str, top_k: usize) -> Vec<DocumentChunk> {
        let snapshot = self.current();
        if snapshot.chunks.is_empty() {
            return Vec::new();
        }

        let tokens = tokenize(query);
        snapshot
            .bm25
            .top_k(&tokens, top_k)
            .into_iter()
            .map(|(idx, score)| snapshot.chunks[idx].scored(score))
            .collect()
    }

    pub fn list_documents(&self) -> BTreeSet<String> {
        self.current().documents.keys().cloned().collect()
    }

    pub fn document_count(&self) -> usize {
        self.current().documents.len()
    }

    pub fn chunk_count(&self) -> usize {
        self.current().chunks.len()
    }

    pub fn is_ready(&self) -> bool {
        !self.current().chunks.is_empty()
    }

    fn current(&self) -> Arc<Snapshot> {
        self.snapshot.read().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn open(dir: &TempDir) -> LexicalIndex {
        LexicalIndex::open_in_dir(dir.path(), ChunkingOptions::default()).unwrap()
    }

    #[test]
    fn test_empty_index() {
        let temp_dir = TempDir::new().unwrap();
        let index = open(&temp_dir);
        assert!(!index.is_ready());
        assert!(index.search("deductible", 5).is_empty());
        assert!(index.list_documents().is_empty());
        assert!(index.path().ends_with("lexical_index.sqlite"));
    }

    #[test]
    fn test_ingest_and_search() {
        let temp_dir = TempDir::new().unwrap();
        let index = open(&temp_dir);

        let count = index
            .ingest_pages(
                "benefits",
                &[
                    PageText::new(1, "The deductible is $500 for individuals."),
                    PageText::new(2, "Mental health visits are covered at 80 percent."),
                ],
            )
            .unwrap();
        assert_eq!(count, 2);
        assert_eq!(index.chunk_count(), 2);

        let results = index.search("deductible individuals", 5);
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].page, 1);
        assert_eq!(results[0].doc_name, "benefits");
        assert!(results[0].score > results[1].score);
    }

    #[test]
    fn test_top_k_limits_results() {
        let temp_dir = TempDir::new().unwrap();
        let index = open(&temp_dir);
        let pages: Vec<_> = (1..=8)
            .map(|p| PageText::new(p, format!("page {} copay rules", p)))
            .collect();
        index.ingest_pages("plan", &pages).unwrap();

        assert_eq!(index.search("copay", 5).len(), 5);
        assert_eq!(index.search("copay", 20).len(), 8);
    }

    #[test]
    fn test_document_with_no_text_is_listed_but_not_ready() {
        let temp_dir = TempDir::new().unwrap();
        let index = open(&temp_dir);
        assert_eq!(index.ingest_pages("scanned", &[]).unwrap(), 0);
        assert_eq!(index.document_count(), 1);
        assert!(!index.is_ready());
    }
}
