//! Retrieval type definitions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A retrieved passage with its relevance score.
///
/// Every engine returns this shape; only the score scale differs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentChunk {
    pub text: String,

    /// 1-based page number in the source document
    pub page: u32,

    pub doc_name: String,

    /// Higher is more relevant
    pub score: f64,
}

/// Text of one document page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageText {
    pub page: u32,
    pub text: String,
}

impl PageText {
    pub fn new(page: u32, text: impl Into<String>) -> Self {
        Self {
            page,
            text: text.into(),
        }
    }
}

/// A chunk produced by ingestion, before scoring.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexedChunk {
    pub doc_name: String,
    pub page: u32,

    /// Order of the chunk within its document
    pub position: u32,

    pub text: String,
}

impl IndexedChunk {
    pub(crate) fn scored(&self, score: f64) -> DocumentChunk {
        DocumentChunk {
            text: self.text.clone(),
            page: self.page,
            doc_name: self.doc_name.clone(),
            score,
        }
    }
}

/// An ingested document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentInfo {
    pub name: String,
    pub ingested_at: DateTime<Utc>,
    pub chunk_count: usize,
}

/// Chunking parameters, in characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkingOptions {
    pub chunk_size: usize,
    pub overlap: usize,
}

impl Default for ChunkingOptions {
    fn default() -> Self {
        Self {
            chunk_size: 500,
            overlap: 100,
        }
    }
}
