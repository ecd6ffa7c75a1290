//! Page extraction from plain-text exports.
//!
//! PDF byte extraction happens upstream (e.g. `pdftotext`), which separates
//! pages with a form feed. Each form-feed-delimited segment becomes one
//! [`PageText`], numbered from 1. Blank pages are kept so numbering matches
//! the source; the chunker skips them.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{Error, Result};
use crate::types::PageText;

pub const PAGE_SEPARATOR: char = '\u{0C}';

/// Split already-extracted text into pages.
pub fn split_pages(content: &str) -> Vec<PageText> {
    let mut pages: Vec<PageText> = content
        .split(PAGE_SEPARATOR)
        .zip(1u32..)
        .map(|(text, page_number)| PageText::new(text, page_number))
        .collect();
    // pdftotext terminates the last page with a form feed too
    if pages.len() > 1 && pages.last().is_some_and(|p| p.text.trim().is_empty()) {
        pages.pop();
    }
    pages
}

pub fn read_pages(path: &Path) -> Result<Vec<PageText>> {
    if !path.is_file() {
        return Err(Error::DocumentNotFound(path.to_path_buf()));
    }
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(_) => {
            let bytes = fs::read(path).map_err(|source| Error::Read { path: path.to_path_buf(), source })?;
            String::from_utf8_lossy(&bytes).into_owned()
        }
    };
    let pages = split_pages(&content);
    debug!(path = %path.display(), pages = pages.len(), "read pages");
    Ok(pages)
}

/// Logical document name: the file stem.
pub fn document_name(path: &Path) -> String {
    path.file_stem().map_or_else(|| path.to_string_lossy().into_owned(), |s| s.to_string_lossy().into_owned())
}

/// Sorted `.txt` files under `root` (or `root` itself when it is a file).
pub fn list_documents(root: &Path) -> Vec<PathBuf> {
    if root.is_file() {
        return vec![root.to_path_buf()];
    }
    let mut files: Vec<PathBuf> = walkdir::WalkDir::new(root)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| e.path().extension().and_then(|s| s.to_str()) == Some("txt"))
        .map(|e| e.path().to_path_buf())
        .collect();
    files.sort();
    files
}
