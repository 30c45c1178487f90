//! Page text chunking with configurable size and overlap.

use crate::types::{ChunkingOptions, IndexedChunk, PageText};

/// Split each page into overlapping character windows.
///
/// Window `i` starts `chunk_size - overlap` characters after window `i - 1`.
/// Windows are trimmed, and windows that are blank after trimming are
/// dropped. Positions count the kept chunks across the whole document.
pub fn chunk_pages(doc_name: &str, pages: &[PageText], options: ChunkingOptions) -> Vec<IndexedChunk> {
    let mut chunks = Vec::new();
    if options.chunk_size == 0 {
        return chunks;
    }

    let step = if options.chunk_size > options.overlap {
        options.chunk_size - options.overlap
    } else {
        options.chunk_size
    };

    let mut position = 0u32;
    for page in pages {
        let chars: Vec<char> = page.text.chars().collect();
        let mut start = 0;
        while start < chars.len() {
            let end = (start + options.chunk_size).min(chars.len());
            let window: String = chars[start..end].iter().collect();
            let trimmed = window.trim();
            if !trimmed.is_empty() {
                chunks.push(IndexedChunk {
                    doc_name: doc_name.to_string(),
                    page: page.page,
                    position,
                    text: trimmed.to_string(),
                });
                position += 1;
            }
            start += step;
        }
    }

    tracing::debug!(
        "Chunked {} pages of {} into {} chunks (size: {}, overlap: {})",
        pages.len(),
        doc_name,
        chunks.len(),
        options.chunk_size,
        options.overlap
    );

    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opts(chunk_size: usize, overlap: usize) -> ChunkingOptions {
        ChunkingOptions {
            chunk_size,
            overlap,
        }
    }

    #[test]
    fn test_default_windows_step_by_400() {
        let text = "a".repeat(1000);
        let chunks = chunk_pages("doc", &[PageText::new(1, text)], ChunkingOptions::default());

        // starts at 0, 400, 800
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].text.len(), 500);
        assert_eq!(chunks[1].text.len(), 500);
        assert_eq!(chunks[2].text.len(), 200);
        assert_eq!(
            chunks.iter().map(|c| c.position).collect::<Vec<_>>(),
            vec![0, 1, 2]
        );
    }

    #[test]
    fn test_no_overlap() {
        let chunks = chunk_pages("doc", &[PageText::new(1, "a".repeat(300))], opts(100, 0));
        assert_eq!(chunks.len(), 3);
    }

    #[test]
    fn test_windows_overlap() {
        let text: String = "abcdefghijklmnopqrstuvwxyz".repeat(2);
        let chunks = chunk_pages("doc", &[PageText::new(1, text)], opts(20, 5));
        let first_tail: String = chunks[0].text.chars().skip(15).collect();
        let second_head: String = chunks[1].text.chars().take(5).collect();
        assert_eq!(first_tail, second_head);
    }

    #[test]
    fn test_blank_windows_dropped_and_pages_tagged() {
        let pages = vec![
            PageText::new(1, format!("{}{}", "x".repeat(10), " ".repeat(30))),
            PageText::new(3, "third page"),
        ];
        let chunks = chunk_pages("policy", &pages, opts(10, 0));
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].page, 1);
        assert_eq!(chunks[1].page, 3);
        assert_eq!(chunks[1].text, "third page");
        assert_eq!(chunks[1].position, 1);
        assert!(chunks.iter().all(|c| c.doc_name == "policy"));
    }

    #[test]
    fn test_multibyte_text_is_split_on_characters() {
        let text = "é".repeat(12);
        let chunks = chunk_pages("doc", &[PageText::new(1, text)], opts(5, 1));
        assert_eq!(chunks[0].text.chars().count(), 5);
    }

    #[test]
    fn test_empty_input() {
        assert!(chunk_pages("doc", &[], ChunkingOptions::default()).is_empty());
        assert!(chunk_pages("doc", &[PageText::new(1, "")], ChunkingOptions::default()).is_empty());
    }
}
