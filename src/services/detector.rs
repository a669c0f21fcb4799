use crate::error::{InvoiceSplitterError, Result};
use crate::services::rule::MarkerRule;
use crate::types::{Page, PageReport};
use tracing::debug;

pub struct BoundaryDetector;

impl BoundaryDetector {
    /// Returns the indices of the pages that start an invoice. Page 0 is
    /// always included; every later page the rule matches starts a new group.
    pub fn detect_boundaries(pages: &[Page], rule: &MarkerRule) -> Result<Vec<usize>> {
        let reports = Self::page_reports(pages, rule)?;
        Ok(Self::boundaries(&reports))
    }

    /// Evaluates the rule against every page, in order.
    pub fn page_reports(pages: &[Page], rule: &MarkerRule) -> Result<Vec<PageReport>> {
        if pages.is_empty() {
            return Err(InvoiceSplitterError::NoPages);
        }

        let reports = pages
            .iter()
            .enumerate()
            .map(|(position, page)| {
                let matched = rule.is_match(&page.text);
                if matched {
                    debug!("Page {} matches {}", page.index + 1, rule);
                }
                PageReport {
                    index: page.index,
                    matched,
                    boundary: position == 0 || matched,
                    text_chars: page.text.chars().count(),
                }
            })
            .collect();

        Ok(reports)
    }

    pub fn boundaries(reports: &[PageReport]) -> Vec<usize> {
        let boundaries: Vec<usize> = reports
            .iter()
            .filter(|report| report.boundary)
            .map(|report| report.index)
            .collect();

        debug!(
            "Detected {} invoice boundaries across {} pages",
            boundaries.len(),
            reports.len()
        );

        boundaries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pages(texts: &[&str]) -> Vec<Page> {
        texts
            .iter()
            .enumerate()
            .map(|(index, text)| Page {
                index,
                text: text.to_string(),
            })
            .collect()
    }

    fn invoice_rule() -> MarkerRule {
        MarkerRule::literal(["INVOICE"], true).unwrap()
    }

    #[test]
    fn test_markers_on_pages_zero_two_five() {
        let pages = pages(&[
            "INVOICE 1",
            "continued",
            "INVOICE 2",
            "continued",
            "totals",
            "INVOICE 3",
        ]);

        let boundaries = BoundaryDetector::detect_boundaries(&pages, &invoice_rule()).unwrap();
        assert_eq!(boundaries, vec![0, 2, 5]);
    }

    #[test]
    fn test_first_page_is_always_a_boundary() {
        let pages = pages(&["cover letter", "INVOICE 1", "line items"]);

        let boundaries = BoundaryDetector::detect_boundaries(&pages, &invoice_rule()).unwrap();
        assert_eq!(boundaries, vec![0, 1]);
    }

    #[test]
    fn test_no_match_yields_single_boundary() {
        let pages = pages(&["just text"]);

        let boundaries = BoundaryDetector::detect_boundaries(&pages, &invoice_rule()).unwrap();
        assert_eq!(boundaries, vec![0]);
    }

    #[test]
    fn test_consecutive_matches_are_not_merged() {
        let pages = pages(&["INVOICE", "INVOICE", "INVOICE", "INVOICE"]);

        let boundaries = BoundaryDetector::detect_boundaries(&pages, &invoice_rule()).unwrap();
        assert_eq!(boundaries, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_empty_pages_fail() {
        let err = BoundaryDetector::detect_boundaries(&[], &invoice_rule()).unwrap_err();
        assert!(matches!(err, InvoiceSplitterError::NoPages));
    }

    #[test]
    fn test_blank_page_text_never_matches() {
        let pages = pages(&["INVOICE", "", "INVOICE"]);

        let reports = BoundaryDetector::page_reports(&pages, &invoice_rule()).unwrap();
        assert!(!reports[1].matched);
        assert!(!reports[1].boundary);
        assert!(reports[2].boundary);
        assert_eq!(reports[0].text_chars, 7);
    }
}
