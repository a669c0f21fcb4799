use crate::error::{InvoiceSplitterError, Result};
use crate::types::{InvoiceGroup, Page};
use lopdf::{Document, ObjectId};
use tracing::{debug, warn};

/// An opened source PDF. Pages are addressed by 0-based index; the
/// underlying page objects stay owned by the wrapped `lopdf::Document`.
#[derive(Debug)]
pub struct SourceDocument {
    name: String,
    document: Document,
    pages: Vec<(u32, ObjectId)>,
}

impl SourceDocument {
    pub fn from_bytes(name: impl Into<String>, bytes: &[u8]) -> Result<Self> {
        let name = name.into();
        let document = Document::load_mem(bytes).map_err(|e| InvoiceSplitterError::PdfLoad {
            source_name: name.clone(),
            reason: e.to_string(),
        })?;

        Self::from_document(name, document)
    }

    pub fn from_document(name: impl Into<String>, document: Document) -> Result<Self> {
        let pages: Vec<(u32, ObjectId)> = document.get_pages().into_iter().collect();
        if pages.is_empty() {
            return Err(InvoiceSplitterError::NoPages);
        }

        let name = name.into();
        debug!("Opened '{}' with {} pages", name, pages.len());

        Ok(Self {
            name,
            document,
            pages,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Extracts the text of every page. A page whose text cannot be decoded
    /// is reported with empty text.
    pub fn pages(&self) -> Vec<Page> {
        self.pages
            .iter()
            .enumerate()
            .map(|(index, (number, _))| {
                let text = match self.document.extract_text(&[*number]) {
                    Ok(text) => text,
                    Err(e) => {
                        warn!(
                            "Could not extract text from page {} of '{}': {}",
                            index + 1,
                            self.name,
                            e
                        );
                        String::new()
                    }
                };
                Page { index, text }
            })
            .collect()
    }

    /// Copies the pages of `group` into a standalone PDF. The source
    /// document is left untouched.
    pub fn extract_range(&self, group: &InvoiceGroup) -> Result<Vec<u8>> {
        if group.is_empty() || group.end > self.pages.len() {
            return Err(InvoiceSplitterError::InvalidBoundary {
                reason: format!(
                    "group [{}, {}) does not fit a {}-page document",
                    group.start,
                    group.end,
                    self.pages.len()
                ),
            });
        }

        for index in group.pages() {
            let (_, page_id) = self.pages[index];
            self.document
                .get_dictionary(page_id)
                .map_err(|e| InvoiceSplitterError::PageExtraction {
                    page: index,
                    reason: e.to_string(),
                })?;
        }

        let dropped: Vec<u32> = self
            .pages
            .iter()
            .enumerate()
            .filter(|(index, _)| !group.pages().contains(index))
            .map(|(_, (number, _))| *number)
            .collect();

        let mut document = self.document.clone();
        document.delete_pages(&dropped);

        let remaining = document.get_pages().len();
        if remaining != group.len() {
            return Err(InvoiceSplitterError::PageExtraction {
                page: group.start,
                reason: format!(
                    "expected {} pages after extraction, found {}",
                    group.len(),
                    remaining
                ),
            });
        }

        document.prune_objects();
        document.renumber_objects();

        let mut bytes = Vec::new();
        document
            .save_to(&mut bytes)
            .map_err(|e| InvoiceSplitterError::PageExtraction {
                page: group.start,
                reason: format!("failed to write extracted pages: {}", e),
            })?;

        Ok(bytes)
    }

    /// Points page `index` at an object id the document does not contain.
    #[cfg(test)]
    pub(crate) fn detach_page(&mut self, index: usize) {
        self.pages[index].1 = (9999, 0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::pdf_with_pages;

    #[test]
    fn test_reads_page_text_in_order() {
        let bytes = pdf_with_pages(&["INVOICE 1", "page two", "INVOICE 2"]);
        let source = SourceDocument::from_bytes("batch.pdf", &bytes).unwrap();

        let pages = source.pages();
        assert_eq!(source.page_count(), 3);
        assert_eq!(pages.len(), 3);
        assert!(pages[0].text.contains("INVOICE 1"));
        assert!(pages[1].text.contains("page two"));
        assert_eq!(pages[2].index, 2);
    }

    #[test]
    fn test_extract_range_keeps_only_group_pages() {
        let bytes = pdf_with_pages(&["INVOICE 1", "INVOICE 2", "more", "INVOICE 3"]);
        let source = SourceDocument::from_bytes("batch.pdf", &bytes).unwrap();

        let extracted = source
            .extract_range(&InvoiceGroup { start: 1, end: 3 })
            .unwrap();
        let part = SourceDocument::from_bytes("part.pdf", &extracted).unwrap();

        assert_eq!(part.page_count(), 2);
        let pages = part.pages();
        assert!(pages[0].text.contains("INVOICE 2"));
        assert!(pages[1].text.contains("more"));

        assert_eq!(source.page_count(), 4);
    }

    #[test]
    fn test_extract_range_is_deterministic() {
        let bytes = pdf_with_pages(&["INVOICE 1", "INVOICE 2"]);
        let source = SourceDocument::from_bytes("batch.pdf", &bytes).unwrap();
        let group = InvoiceGroup { start: 0, end: 1 };

        let first = source.extract_range(&group).unwrap();
        let second = source.extract_range(&group).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_garbage_input_fails_to_load() {
        let err = SourceDocument::from_bytes("notes.pdf", b"not a pdf at all").unwrap_err();
        assert!(matches!(err, InvoiceSplitterError::PdfLoad { .. }));
    }

    #[test]
    fn test_document_without_pages() {
        let bytes = pdf_with_pages(&[]);
        let err = SourceDocument::from_bytes("empty.pdf", &bytes).unwrap_err();
        assert!(matches!(err, InvoiceSplitterError::NoPages));
    }

    #[test]
    fn test_missing_page_object_is_extraction_error() {
        let bytes = pdf_with_pages(&["INVOICE 1", "INVOICE 2"]);
        let mut source = SourceDocument::from_bytes("batch.pdf", &bytes).unwrap();
        source.detach_page(1);

        let err = source
            .extract_range(&InvoiceGroup { start: 1, end: 2 })
            .unwrap_err();
        assert!(matches!(err, InvoiceSplitterError::PageExtraction { page: 1, .. }));
    }

    #[test]
    fn test_out_of_bounds_group() {
        let bytes = pdf_with_pages(&["INVOICE 1"]);
        let source = SourceDocument::from_bytes("batch.pdf", &bytes).unwrap();

        let err = source
            .extract_range(&InvoiceGroup { start: 0, end: 2 })
            .unwrap_err();
        assert!(matches!(err, InvoiceSplitterError::InvalidBoundary { .. }));
    }
}
