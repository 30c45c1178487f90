//! Document retrieval for the claims agent.
//!
//! Provides the lexical (BM25) engine over page-tagged chunks persisted in
//! SQLite, and the [`RetrievalEngine`] seam other engines plug into.

pub mod bm25;
pub mod chunker;
pub mod engine;
pub mod lexical;
pub mod parser;
pub mod store;
pub mod tokenizer;
pub mod types;

#[cfg(test)]
mod tests;

// Re-export commonly used types
pub use engine::{create_engine, EngineKind, RetrievalEngine};
pub use lexical::LexicalIndex;
pub use parser::{collect_documents, parse_pages, text_pages};
pub use types::{ChunkingOptions, DocumentChunk, DocumentInfo, PageText};
