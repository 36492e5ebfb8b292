use std::path::Path;

use serde::Deserialize;

use crate::error::{NotaError, Result};
use crate::models::{RawDocument, RawTable};

/// A source of pre-extracted document content. The PDF text/table
/// extraction primitive is an external collaborator; this crate consumes
/// its dumps.
pub trait DocumentSource {
    fn load(&self, path: &Path) -> Result<RawDocument>;
}

/// Plain-text dump: one file per document, pages separated by form feeds.
/// Carries no tables; extraction relies on the text cascade.
pub struct TextDump;

impl DocumentSource for TextDump {
    fn load(&self, path: &Path) -> Result<RawDocument> {
        let content = std::fs::read_to_string(path).map_err(|e| unreadable(path, e))?;
        Ok(RawDocument {
            file_name: file_name(path),
            pages: content.split('\u{c}').map(|p| p.to_string()).collect(),
            tables: Vec::new(),
        })
    }
}

/// JSON dump produced by the extraction primitive:
/// `{"pages": ["...", ...], "tables": [[[cell|null, ...], ...], ...]}`.
pub struct JsonDump;

#[derive(Deserialize)]
struct JsonDocument {
    #[serde(default)]
    pages: Vec<String>,
    #[serde(default)]
    tables: Vec<RawTable>,
}

impl DocumentSource for JsonDump {
    fn load(&self, path: &Path) -> Result<RawDocument> {
        let content = std::fs::read_to_string(path).map_err(|e| unreadable(path, e))?;
        let parsed: JsonDocument =
            serde_json::from_str(&content).map_err(|e| unreadable(path, e))?;
        Ok(RawDocument {
            file_name: file_name(path),
            pages: parsed.pages,
            tables: parsed.tables,
        })
    }
}

/// Dispatch on file extension.
pub fn load_document(path: &Path) -> Result<RawDocument> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();
    match ext.as_str() {
        "txt" | "text" => TextDump.load(path),
        "json" => JsonDump.load(path),
        _ => Err(NotaError::UnsupportedFormat(path.display().to_string())),
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default()
        .to_string()
}

fn unreadable(path: &Path, err: impl std::fmt::Display) -> NotaError {
    NotaError::DocumentUnreadable {
        path: path.display().to_string(),
        reason: err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_dump_splits_pages_on_form_feed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nota.txt");
        std::fs::write(&path, "pagina um\u{c}pagina dois").unwrap();
        let doc = load_document(&path).unwrap();
        assert_eq!(doc.file_name, "nota.txt");
        assert_eq!(doc.pages.len(), 2);
        assert!(doc.tables.is_empty());
    }

    #[test]
    fn test_json_dump_carries_tables() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nota.json");
        std::fs::write(
            &path,
            r#"{"pages": ["texto"], "tables": [[["C/V", null, "Preço"], ["C", "PETR4", "28,50"]]]}"#,
        )
        .unwrap();
        let doc = load_document(&path).unwrap();
        assert_eq!(doc.pages, vec!["texto".to_string()]);
        assert_eq!(doc.tables.len(), 1);
        assert_eq!(doc.tables[0][0][1], None);
    }

    #[test]
    fn test_malformed_json_is_document_unreadable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nota.json");
        std::fs::write(&path, "{not json").unwrap();
        let err = load_document(&path).unwrap_err();
        assert!(matches!(err, NotaError::DocumentUnreadable { .. }));
    }

    #[test]
    fn test_missing_file_is_document_unreadable() {
        let err = load_document(Path::new("/nonexistent/nota.txt")).unwrap_err();
        assert!(matches!(err, NotaError::DocumentUnreadable { .. }));
    }

    #[test]
    fn test_unknown_extension_rejected() {
        let err = load_document(Path::new("nota.pdf")).unwrap_err();
        assert!(matches!(err, NotaError::UnsupportedFormat(_)));
    }
}
