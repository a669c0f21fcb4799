use crate::error::{InvoiceSplitterError, Result};
use crate::services::source::SourceDocument;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{info, warn};
use walkdir::WalkDir;

pub struct PdfFetcher;

impl PdfFetcher {
    pub async fn fetch_document(path: &Path) -> Result<SourceDocument> {
        info!("Reading file: {}", path.display());

        if !path.exists() {
            return Err(InvoiceSplitterError::FileNotFound {
                path: path.display().to_string(),
            });
        }

        let bytes = fs::read(path).await?;
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("document.pdf")
            .to_string();

        SourceDocument::from_bytes(name, &bytes)
    }

    /// Resolves inputs to PDF files. Directories expand to the `.pdf` files
    /// directly inside them, sorted by name.
    pub fn validate_sources(sources: &[PathBuf]) -> Result<Vec<PathBuf>> {
        let mut validated = Vec::new();

        for source in sources {
            if source.is_dir() {
                let found = Self::pdfs_in_directory(source)?;
                if found.is_empty() {
                    warn!("No PDF files found in {}", source.display());
                }
                validated.extend(found);
            } else if source.is_file() {
                if !Self::is_pdf(source) {
                    return Err(InvoiceSplitterError::NotPdf {
                        path: source.display().to_string(),
                    });
                }
                validated.push(source.clone());
            } else {
                return Err(InvoiceSplitterError::FileNotFound {
                    path: source.display().to_string(),
                });
            }
        }

        Ok(validated)
    }

    fn pdfs_in_directory(dir: &Path) -> Result<Vec<PathBuf>> {
        let mut found = Vec::new();

        for entry in WalkDir::new(dir).min_depth(1).max_depth(1).sort_by_file_name() {
            let entry = entry.map_err(|e| InvoiceSplitterError::Io(e.into()))?;
            if entry.file_type().is_file() && Self::is_pdf(entry.path()) {
                found.push(entry.into_path());
            }
        }

        Ok(found)
    }

    fn is_pdf(path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.eq_ignore_ascii_case("pdf"))
            .unwrap_or(false)
    }

    /// Stem used to name outputs derived from `path`.
    pub fn source_stem(path: &Path) -> String {
        path.file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("document")
            .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::pdf_with_pages;

    #[test]
    fn test_directory_expands_to_sorted_pdfs() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b.pdf"), b"").unwrap();
        std::fs::write(dir.path().join("a.PDF"), b"").unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"").unwrap();

        let sources = PdfFetcher::validate_sources(&[dir.path().to_path_buf()]).unwrap();
        let names: Vec<_> = sources
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap().to_string())
            .collect();

        assert_eq!(names, vec!["a.PDF", "b.pdf"]);
    }

    #[test]
    fn test_rejects_missing_and_non_pdf_inputs() {
        let dir = tempfile::tempdir().unwrap();
        let text_file = dir.path().join("invoice.txt");
        std::fs::write(&text_file, b"INVOICE").unwrap();

        let err = PdfFetcher::validate_sources(&[text_file]).unwrap_err();
        assert!(matches!(err, InvoiceSplitterError::NotPdf { .. }));

        let err = PdfFetcher::validate_sources(&[dir.path().join("missing.pdf")]).unwrap_err();
        assert!(matches!(err, InvoiceSplitterError::FileNotFound { .. }));
    }

    #[tokio::test]
    async fn test_fetch_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("batch.pdf");
        std::fs::write(&path, pdf_with_pages(&["INVOICE 1", "INVOICE 2"])).unwrap();

        let source = PdfFetcher::fetch_document(&path).await.unwrap();
        assert_eq!(source.name(), "batch.pdf");
        assert_eq!(source.page_count(), 2);
        assert_eq!(PdfFetcher::source_stem(&path), "batch");
    }
}
