//! Document parsing into page texts.

use crate::types::PageText;
use claims_core::{AppError, AppResult};
use std::fs;
use std::path::{Path, PathBuf};

/// Page separator for plain-text documents.
pub const FORM_FEED: char = '\x0c';

/// Document type classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Pdf,
    Text,
    Unsupported,
}

impl DocumentKind {
    /// Detect document type from file extension.
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .as_deref()
        {
            Some("pdf") => Self::Pdf,
            Some("txt") | Some("text") | Some("md") | Some("markdown") => Self::Text,
            _ => Self::Unsupported,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Text => "text",
            Self::Unsupported => "unsupported",
        }
    }
}

/// Read a document into trimmed, non-empty pages.
///
/// Page numbers stay positional: a blank second page means the result goes
/// from page 1 to page 3.
pub fn parse_pages(path: &Path) -> AppResult<Vec<PageText>> {
    let pages = match DocumentKind::from_path(path) {
        DocumentKind::Pdf => pdf_pages(path)?,
        DocumentKind::Text => {
            let raw = fs::read_to_string(path).map_err(|e| {
                AppError::Retrieval(format!("Failed to read {:?}: {}", path, e))
            })?;
            text_pages(&raw)
        }
        DocumentKind::Unsupported => {
            return Err(AppError::Retrieval(format!(
                "Unsupported document type: {:?}",
                path
            )))
        }
    };

    tracing::debug!("Parsed {} non-empty pages from {:?}", pages.len(), path);
    Ok(pages)
}

/// Split plain text into pages on form feeds.
pub fn text_pages(raw: &str) -> Vec<PageText> {
    raw.split(FORM_FEED)
        .enumerate()
        .filter_map(|(i, page)| non_empty_page(i as u32 + 1, page))
        .collect()
}

fn pdf_pages(path: &Path) -> AppResult<Vec<PageText>> {
    let doc = lopdf::Document::load(path)
        .map_err(|e| AppError::Retrieval(format!("Failed to open PDF {:?}: {}", path, e)))?;

    let mut pages = Vec::new();
    for page_number in doc.get_pages().keys().copied() {
        match doc.extract_text(&[page_number]) {
            Ok(text) => pages.extend(non_empty_page(page_number, &text)),
            Err(e) => tracing::warn!(
                "Skipping page {} of {:?}: text extraction failed: {}",
                page_number,
                path,
                e
            ),
        }
    }
    Ok(pages)
}

fn non_empty_page(page: u32, text: &str) -> Option<PageText> {
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| PageText::new(page, trimmed))
}

/// Default document name: the file stem.
pub fn default_doc_name(path: &Path) -> AppResult<String> {
    path.file_stem()
        .and_then(|s| s.to_str())
        .map(str::to_string)
        .ok_or_else(|| AppError::Retrieval(format!("Cannot derive a document name from {:?}", path)))
}

/// Expand a path into the supported documents it holds, sorted.
pub fn collect_documents(path: &Path) -> AppResult<Vec<PathBuf>> {
    if !path.exists() {
        return Err(AppError::Retrieval(format!("Path not found: {:?}", path)));
    }
    if path.is_file() {
        return Ok(vec![path.to_path_buf()]);
    }

    let mut files: Vec<PathBuf> = walkdir::WalkDir::new(path)
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !e.file_name().to_string_lossy().starts_with('.'))
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| DocumentKind::from_path(p) != DocumentKind::Unsupported)
        .collect();
    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_kind_detection() {
        assert_eq!(DocumentKind::from_path(Path::new("plan.PDF")), DocumentKind::Pdf);
        assert_eq!(DocumentKind::from_path(Path::new("notes.md")), DocumentKind::Text);
        assert_eq!(
            DocumentKind::from_path(Path::new("claims.csv")),
            DocumentKind::Unsupported
        );
    }

    #[test]
    fn test_text_pages_keep_positional_numbers() {
        let pages = text_pages("  Page one text \x0c\n  \x0cPage three");
        assert_eq!(
            pages,
            vec![PageText::new(1, "Page one text"), PageText::new(3, "Page three")]
        );
    }

    #[test]
    fn test_parse_text_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("benefits.txt");
        fs::write(&path, "The deductible is $500 for individuals.").unwrap();

        let pages = parse_pages(&path).unwrap();
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].page, 1);
        assert_eq!(default_doc_name(&path).unwrap(), "benefits");
    }

    #[test]
    fn test_unsupported_and_invalid_pdf() {
        let temp_dir = TempDir::new().unwrap();
        let csv = temp_dir.path().join("claims.csv");
        fs::write(&csv, "a,b").unwrap();
        assert!(parse_pages(&csv).is_err());

        let pdf = temp_dir.path().join("broken.pdf");
        fs::write(&pdf, "not a pdf").unwrap();
        assert!(parse_pages(&pdf).is_err());
    }

    #[test]
    fn test_collect_documents_filters_and_sorts() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("b.md"), "b").unwrap();
        fs::write(temp_dir.path().join("a.txt"), "a").unwrap();
        fs::write(temp_dir.path().join("data.csv"), "x").unwrap();
        fs::create_dir_all(temp_dir.path().join(".hidden")).unwrap();
        fs::write(temp_dir.path().join(".hidden/c.txt"), "c").unwrap();

        let files = collect_documents(temp_dir.path()).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["a.txt", "b.md"]);
    }
}
