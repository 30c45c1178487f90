//! SQLite persistence for the lexical chunk collection.

use crate::types::{DocumentInfo, IndexedChunk};
use chrono::{DateTime, Utc};
use claims_core::{AppError, AppResult};
use rusqlite::{params, Connection};
use std::path::Path;

/// File name of the persisted index inside the data directory.
pub const INDEX_FILE: &str = "lexical_index.sqlite";

/// Open (or create) the chunk store.
pub fn init_store(db_path: &Path) -> AppResult<Connection> {
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| AppError::Retrieval(format!("Failed to create index directory: {}", e)))?;
    }

    let conn = Connection::open(db_path)
        .map_err(|e| AppError::Retrieval(format!("Failed to open chunk store: {}", e)))?;

    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS documents (
            name TEXT PRIMARY KEY,
            ingested_at TEXT NOT NULL,
            chunk_count INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS chunks (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            doc_name TEXT NOT NULL,
            position INTEGER NOT NULL,
            page INTEGER NOT NULL,
            text TEXT NOT NULL,
            FOREIGN KEY (doc_name) REFERENCES documents(name)
        );

        CREATE INDEX IF NOT EXISTS idx_chunks_doc ON chunks(doc_name);
        "#,
    )
    .map_err(|e| AppError::Retrieval(format!("Failed to create tables: {}", e)))?;

    tracing::debug!("Initialized chunk store at {:?}", db_path);
    Ok(conn)
}

/// Replace a document and all its chunks in one transaction.
pub fn replace_document(
    conn: &mut Connection,
    info: &DocumentInfo,
    chunks: &[IndexedChunk],
) -> AppResult<()> {
    let tx = conn
        .transaction()
        .map_err(|e| AppError::Retrieval(format!("Failed to begin transaction: {}", e)))?;

    tx.execute("DELETE FROM chunks WHERE doc_name = ?1", params![info.name])
        .map_err(|e| AppError::Retrieval(format!("Failed to delete chunks: {}", e)))?;

    tx.execute(
        "INSERT OR REPLACE INTO documents (name, ingested_at, chunk_count) VALUES (?1, ?2, ?3)",
        params![
            info.name,
            info.ingested_at.to_rfc3339(),
            info.chunk_count as i64
        ],
    )
    .map_err(|e| AppError::Retrieval(format!("Failed to insert document: {}", e)))?;

    {
        let mut insert = tx
            .prepare(
                "INSERT INTO chunks (doc_name, position, page, text) VALUES (?1, ?2, ?3, ?4)",
            )
            .map_err(|e| AppError::Retrieval(format!("Failed to prepare insert: {}", e)))?;
        for chunk in chunks {
            insert
                .execute(params![
                    chunk.doc_name,
                    chunk.position as i64,
                    chunk.page as i64,
                    chunk.text
                ])
                .map_err(|e| AppError::Retrieval(format!("Failed to insert chunk: {}", e)))?;
        }
    }

    tx.commit()
        .map_err(|e| AppError::Retrieval(format!("Failed to commit document: {}", e)))?;

    Ok(())
}

/// All documents, ordered by name.
pub fn load_documents(conn: &Connection) -> AppResult<Vec<DocumentInfo>> {
    let mut stmt = conn
        .prepare("SELECT name, ingested_at, chunk_count FROM documents ORDER BY name")
        .map_err(|e| AppError::Retrieval(format!("Failed to prepare query: {}", e)))?;

    let rows = stmt
        .query_map([], |row| {
            let ingested_at: String = row.get(1)?;
            let ingested_at = DateTime::parse_from_rfc3339(&ingested_at)
                .map(|dt| dt.with_timezone(&Utc))
                .map_err(|e| {
                    rusqlite::Error::FromSqlConversionFailure(
                        1,
                        rusqlite::types::Type::Text,
                        Box::new(e),
                    )
                })?;
            Ok(DocumentInfo {
                name: row.get(0)?,
                ingested_at,
                chunk_count: row.get::<_, i64>(2)? as usize,
            })
        })
        .map_err(|e| AppError::Retrieval(format!("Failed to query documents: {}", e)))?;

    rows.collect::<rusqlite::Result<Vec<_>>>()
        .map_err(|e| AppError::Retrieval(format!("Failed to read documents: {}", e)))
}

/// All chunks in collection order.
pub fn load_chunks(conn: &Connection) -> AppResult<Vec<IndexedChunk>> {
    let mut stmt = conn
        .prepare("SELECT doc_name, position, page, text FROM chunks ORDER BY id")
        .map_err(|e| AppError::Retrieval(format!("Failed to prepare query: {}", e)))?;

    let rows = stmt
        .query_map([], |row| {
            Ok(IndexedChunk {
                doc_name: row.get(0)?,
                position: row.get::<_, i64>(1)? as u32,
                page: row.get::<_, i64>(2)? as u32,
                text: row.get(3)?,
            })
        })
        .map_err(|e| AppError::Retrieval(format!("Failed to query chunks: {}", e)))?;

    rows.collect::<rusqlite::Result<Vec<_>>>()
        .map_err(|e| AppError::Retrieval(format!("Failed to read chunks: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn chunk(doc: &str, position: u32, text: &str) -> IndexedChunk {
        IndexedChunk {
            doc_name: doc.to_string(),
            page: 1,
            position,
            text: text.to_string(),
        }
    }

    fn info(name: &str, chunk_count: usize) -> DocumentInfo {
        DocumentInfo {
            name: name.to_string(),
            ingested_at: Utc::now(),
            chunk_count,
        }
    }

    #[test]
    fn test_init_store() {
        let temp_dir = TempDir::new().unwrap();
        let conn = init_store(&temp_dir.path().join("nested/index.sqlite")).unwrap();

        let table_count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name IN ('documents', 'chunks')",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(table_count, 2);
    }

    #[test]
    fn test_replace_document_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join(INDEX_FILE);
        let mut conn = init_store(&path).unwrap();

        replace_document(&mut conn, &info("a", 2), &[chunk("a", 0, "one"), chunk("a", 1, "two")])
            .unwrap();
        replace_document(&mut conn, &info("b", 1), &[chunk("b", 0, "three")]).unwrap();
        replace_document(&mut conn, &info("a", 1), &[chunk("a", 0, "four")]).unwrap();
        drop(conn);

        let conn = init_store(&path).unwrap();
        let texts: Vec<_> = load_chunks(&conn)
            .unwrap()
            .into_iter()
            .map(|c| c.text)
            .collect();
        assert_eq!(texts, vec!["three", "four"]);

        let docs = load_documents(&conn).unwrap();
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].name, "a");
        assert_eq!(docs[0].chunk_count, 1);
    }
}
