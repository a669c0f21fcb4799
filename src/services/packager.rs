use crate::error::Result;
use crate::types::OutputDocument;
use std::io::{Cursor, Write};
use tracing::debug;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, DateTime, ZipWriter};

pub struct ZipPackager;

impl ZipPackager {
    /// Packs every document into one archive, in order. Entries carry a
    /// fixed timestamp so the same documents always give the same bytes.
    pub fn package(documents: &[OutputDocument]) -> Result<Vec<u8>> {
        let options = SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .last_modified_time(DateTime::default());

        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        for document in documents {
            writer.start_file(document.file_name.as_str(), options)?;
            writer.write_all(&document.bytes)?;
        }

        let archive = writer.finish()?.into_inner();
        debug!(
            "Packaged {} documents into {} byte archive",
            documents.len(),
            archive.len()
        );

        Ok(archive)
    }

    pub fn archive_name(stem: &str) -> String {
        format!("{}_invoices.zip", stem)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::InvoiceGroup;
    use std::io::Read;
    use zip::ZipArchive;

    fn document(number: usize, body: &[u8]) -> OutputDocument {
        OutputDocument {
            number,
            file_name: format!("invoice_{:03}.pdf", number),
            group: InvoiceGroup {
                start: number - 1,
                end: number,
            },
            bytes: body.to_vec(),
        }
    }

    #[test]
    fn test_archive_contains_documents_in_order() {
        let documents = vec![document(1, b"%PDF-first"), document(2, b"%PDF-second")];

        let archive = ZipPackager::package(&documents).unwrap();
        let mut zip = ZipArchive::new(Cursor::new(archive)).unwrap();

        assert_eq!(zip.len(), 2);
        assert_eq!(zip.by_index(0).unwrap().name(), "invoice_001.pdf");

        let mut body = Vec::new();
        zip.by_index(1).unwrap().read_to_end(&mut body).unwrap();
        assert_eq!(body, b"%PDF-second");
    }

    #[test]
    fn test_archive_is_reproducible() {
        let documents = vec![document(1, b"%PDF-only")];

        let first = ZipPackager::package(&documents).unwrap();
        let second = ZipPackager::package(&documents).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_archive_name() {
        assert_eq!(ZipPackager::archive_name("march"), "march_invoices.zip");
    }
}
