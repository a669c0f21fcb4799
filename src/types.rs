use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

/// Markers used when neither literal markers nor a pattern is configured.
pub const DEFAULT_MARKERS: &[&str] = &[
    "Faktura",
    "Invoice",
    "Faktura br.",
    "Invoice No.",
    "Račun",
    "Bill",
];

/// One page of the source document. `index` is 0-based.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page {
    pub index: usize,
    pub text: String,
}

/// Half-open page range `[start, end)` belonging to one invoice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct InvoiceGroup {
    pub start: usize,
    pub end: usize,
}

impl InvoiceGroup {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    pub fn pages(&self) -> std::ops::Range<usize> {
        self.start..self.end
    }
}

impl fmt::Display for InvoiceGroup {
    /// 1-based, inclusive page numbers for display.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.len() == 1 {
            write!(f, "page {}", self.start + 1)
        } else {
            write!(f, "pages {}-{}", self.start + 1, self.end)
        }
    }
}

/// Rule options as supplied by the CLI or the upload form, before compilation.
#[derive(Debug, Clone)]
pub struct RuleOptions {
    pub markers: Vec<String>,
    pub regex: Option<String>,
    pub case_sensitive: bool,
    pub scan_limit: Option<usize>,
}

impl RuleOptions {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Default for RuleOptions {
    fn default() -> Self {
        Self {
            markers: Vec::new(),
            regex: None,
            case_sensitive: true,
            scan_limit: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SplitConfig {
    pub output_dir: PathBuf,
    pub file_prefix: Option<String>,
    pub zip_path: Option<PathBuf>,
    pub write_files: bool,
    pub include_manifest: bool,
    pub force: bool,
}

impl SplitConfig {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            file_prefix: None,
            zip_path: None,
            write_files: true,
            include_manifest: false,
            force: false,
        }
    }
}

/// A materialized invoice, held in memory until written or packaged.
#[derive(Debug, Clone)]
pub struct OutputDocument {
    pub number: usize,
    pub file_name: String,
    pub group: InvoiceGroup,
    pub bytes: Vec<u8>,
}

/// Detection outcome for one page.
#[derive(Debug, Clone, Serialize)]
pub struct PageReport {
    pub index: usize,
    pub matched: bool,
    pub boundary: bool,
    pub text_chars: usize,
}

/// Summary of an analysis or split, serialized into the manifest.
#[derive(Debug, Clone, Serialize)]
pub struct SplitReport {
    pub source: String,
    pub total_pages: usize,
    pub boundaries: Vec<usize>,
    pub groups: Vec<InvoiceGroup>,
    pub pages: Vec<PageReport>,
}

#[derive(Debug, Clone)]
pub struct SplitResult {
    pub report: SplitReport,
    pub output_files: Vec<PathBuf>,
    pub zip_file: Option<PathBuf>,
    pub manifest_file: Option<PathBuf>,
}
