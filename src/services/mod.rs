pub mod detector;
pub mod fetcher;
pub mod packager;
pub mod ranges;
pub mod rule;
pub mod source;
pub mod splitter;

pub use detector::BoundaryDetector;
pub use fetcher::PdfFetcher;
pub use packager::ZipPackager;
pub use ranges::RangeBuilder;
pub use rule::{MarkerRule, Matcher};
pub use source::SourceDocument;
pub use splitter::DocumentSplitter;
