//! # Invoice Splitter Library
//!
//! Splits a PDF holding several concatenated invoices into one PDF per
//! invoice. A page starts a new invoice when its text matches the configured
//! marker rule (literal markers or a regular expression); the first page
//! always starts one.
//!
//! ## Example Usage
//!
//! ```no_run
//! use invoice_splitter::{DocumentSplitter, MarkerRule, PdfFetcher, SplitConfig};
//! use std::path::Path;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let source = PdfFetcher::fetch_document(Path::new("invoices.pdf")).await?;
//!     let rule = MarkerRule::literal(["INVOICE"], true)?;
//!
//!     let result = DocumentSplitter::split_document(&source, &rule, &SplitConfig::new("./output")).await?;
//!
//!     println!("Created {} invoice files", result.output_files.len());
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod services;
pub mod types;
pub mod web;

#[cfg(test)]
pub(crate) mod test_support;

pub use error::{InvoiceSplitterError, Result};
pub use services::{
    BoundaryDetector, DocumentSplitter, MarkerRule, Matcher, PdfFetcher, RangeBuilder,
    SourceDocument, ZipPackager,
};
pub use types::{
    InvoiceGroup, OutputDocument, Page, PageReport, RuleOptions, SplitConfig, SplitReport,
    SplitResult, DEFAULT_MARKERS,
};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
