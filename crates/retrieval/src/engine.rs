//! Retrieval engine abstraction.
//!
//! Defines a trait for engine-agnostic document ingestion and search, and the
//! factory that picks an engine once from configuration.

use crate::lexical::LexicalIndex;
use crate::parser::{default_doc_name, parse_pages};
use crate::types::{ChunkingOptions, DocumentChunk, PageText};
use claims_core::config::normalize_name;
use claims_core::{AppError, AppResult, RetrievalSettings};
use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;

/// Trait for retrieval backends.
///
/// Implementations must support:
/// - Ingesting a document given as page texts (replace-by-name)
/// - Searching for the top-k chunks, best first
/// - Listing document names
#[async_trait::async_trait]
pub trait RetrievalEngine: Send + Sync {
    /// Ingest a document, replacing any document of the same name.
    ///
    /// Returns the number of chunks indexed for it.
    async fn ingest_pages(&self, doc_name: &str, pages: Vec<PageText>) -> AppResult<usize>;

    /// Search for the `top_k` most relevant chunks.
    async fn search(&self, query: &str, top_k: usize) -> AppResult<Vec<DocumentChunk>>;

    fn list_documents(&self) -> BTreeSet<String>;

    fn chunk_count(&self) -> usize;

    /// True once at least one chunk is searchable.
    fn is_ready(&self) -> bool;

    fn engine_name(&self) -> &str;

    fn document_count(&self) -> usize {
        self.list_documents().len()
    }

    /// Parse a file into pages and ingest it.
    ///
    /// `doc_name` defaults to the file stem.
    async fn ingest_path(&self, path: &Path, doc_name: Option<&str>) -> AppResult<usize> {
        let name = match doc_name {
            Some(name) => name.to_string(),
            None => default_doc_name(path)?,
        };
        tracing::info!("Ingesting {:?} as {}", path, name);
        let pages = parse_pages(path)?;
        self.ingest_pages(&name, pages).await
    }
}

#[async_trait::async_trait]
impl RetrievalEngine for LexicalIndex {
    async fn ingest_pages(&self, doc_name: &str, pages: Vec<PageText>) -> AppResult<usize> {
        LexicalIndex::ingest_pages(self, doc_name, &pages)
    }

    async fn search(&self, query: &str, top_k: usize) -> AppResult<Vec<DocumentChunk>> {
        Ok(LexicalIndex::search(self, query, top_k))
    }

    fn list_documents(&self) -> BTreeSet<String> {
        LexicalIndex::list_documents(self)
    }

    fn chunk_count(&self) -> usize {
        LexicalIndex::chunk_count(self)
    }

    fn is_ready(&self) -> bool {
        LexicalIndex::is_ready(self)
    }

    fn engine_name(&self) -> &str {
        EngineKind::Lexical.as_str()
    }

    fn document_count(&self) -> usize {
        LexicalIndex::document_count(self)
    }
}

/// Engine selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineKind {
    Lexical,
    Dense,
}

impl EngineKind {
    pub fn parse(s: &str) -> Option<Self> {
        match normalize_name(s).as_str() {
            "lexical" | "bm25" => Some(Self::Lexical),
            "dense" | "vector" => Some(Self::Dense),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Lexical => "lexical",
            Self::Dense => "dense",
        }
    }
}

/// Create the configured retrieval engine.
///
/// # Errors
/// Returns error if:
/// - Engine name is unknown
/// - Engine is `dense`, which has no built-in implementation; hosts supply one
///   directly as an `Arc<dyn RetrievalEngine>`
/// - The lexical index file cannot be opened
pub fn create_engine(
    settings: &RetrievalSettings,
    data_dir: &Path,
) -> AppResult<Arc<dyn RetrievalEngine>> {
    let kind = EngineKind::parse(&settings.engine).ok_or_else(|| {
        AppError::Retrieval(format!("Unknown retrieval engine: {}", settings.engine))
    })?;

    match kind {
        EngineKind::Lexical => {
            let options = ChunkingOptions {
                chunk_size: settings.chunk_size,
                overlap: settings.chunk_overlap,
            };
            let index = LexicalIndex::open_in_dir(data_dir, options)?;
            tracing::debug!("Created lexical engine at {:?}", index.path());
            Ok(Arc::new(index))
        }
        EngineKind::Dense => Err(AppError::Retrieval(
            "The dense engine has no built-in implementation and must be supplied by the host"
                .to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_engine_kind_parsing() {
        assert_eq!(EngineKind::parse("lexical"), Some(EngineKind::Lexical));
        assert_eq!(EngineKind::parse("BM25"), Some(EngineKind::Lexical));
        assert_eq!(EngineKind::parse("dense"), Some(EngineKind::Dense));
        assert_eq!(EngineKind::parse("chroma"), None);
    }

    #[tokio::test]
    async fn test_create_lexical_engine() {
        let temp_dir = TempDir::new().unwrap();
        let engine = create_engine(&RetrievalSettings::default(), temp_dir.path()).unwrap();
        assert_eq!(engine.engine_name(), "lexical");
        assert!(!engine.is_ready());
        assert!(engine.search("anything", 5).await.unwrap().is_empty());
    }

    #[test]
    fn test_dense_and_unknown_engines_fail() {
        let temp_dir = TempDir::new().unwrap();
        let mut settings = RetrievalSettings::default();

        settings.engine = "dense".to_string();
        match create_engine(&settings, temp_dir.path()) {
            Err(err) => assert!(err.to_string().contains("supplied by the host")),
            Ok(_) => panic!("Expected error for dense engine"),
        }

        settings.engine = "chroma".to_string();
        assert!(create_engine(&settings, temp_dir.path()).is_err());
    }

    #[tokio::test]
    async fn test_ingest_path_defaults_name_to_stem() {
        let temp_dir = TempDir::new().unwrap();
        let engine = create_engine(&RetrievalSettings::default(), temp_dir.path()).unwrap();
        let doc = temp_dir.path().join("summary_of_benefits.txt");
        std::fs::write(&doc, "Page one\x0cPage two").unwrap();

        assert_eq!(engine.ingest_path(&doc, None).await.unwrap(), 2);
        assert_eq!(engine.ingest_path(&doc, Some("plan")).await.unwrap(), 2);
        let names: Vec<_> = engine.list_documents().into_iter().collect();
        assert_eq!(names, vec!["plan", "summary_of_benefits"]);
        assert_eq!(engine.document_count(), 2);
        assert_eq!(engine.chunk_count(), 4);
    }
}
