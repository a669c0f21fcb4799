use crate::error::{InvoiceSplitterError, Result};
use crate::types::InvoiceGroup;

pub struct RangeBuilder;

impl RangeBuilder {
    /// Pairs each start index with the next one (or `total_pages` for the
    /// last) to form half-open groups.
    pub fn build_ranges(boundaries: &[usize], total_pages: usize) -> Result<Vec<InvoiceGroup>> {
        Self::validate_boundaries(boundaries, total_pages)?;

        let ends = boundaries.iter().skip(1).copied().chain(std::iter::once(total_pages));

        Ok(boundaries
            .iter()
            .zip(ends)
            .map(|(&start, end)| InvoiceGroup { start, end })
            .collect())
    }

    fn validate_boundaries(boundaries: &[usize], total_pages: usize) -> Result<()> {
        if total_pages == 0 {
            return Err(InvoiceSplitterError::NoPages);
        }

        match boundaries.first() {
            None => {
                return Err(InvoiceSplitterError::InvalidBoundary {
                    reason: "no boundaries given".to_string(),
                })
            }
            Some(&first) if first != 0 => {
                return Err(InvoiceSplitterError::InvalidBoundary {
                    reason: format!("first boundary must be page 0, got {}", first),
                })
            }
            Some(_) => {}
        }

        for pair in boundaries.windows(2) {
            if pair[1] <= pair[0] {
                return Err(InvoiceSplitterError::InvalidBoundary {
                    reason: format!(
                        "boundaries must be strictly increasing ({} follows {})",
                        pair[1], pair[0]
                    ),
                });
            }
        }

        if let Some(&last) = boundaries.last() {
            if last >= total_pages {
                return Err(InvoiceSplitterError::InvalidBoundary {
                    reason: format!(
                        "boundary {} is outside the document ({} pages)",
                        last, total_pages
                    ),
                });
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn group(start: usize, end: usize) -> InvoiceGroup {
        InvoiceGroup { start, end }
    }

    #[test]
    fn test_six_page_scenario() {
        let groups = RangeBuilder::build_ranges(&[0, 2, 5], 6).unwrap();
        assert_eq!(groups, vec![group(0, 2), group(2, 5), group(5, 6)]);
    }

    #[test]
    fn test_single_page_document() {
        let groups = RangeBuilder::build_ranges(&[0], 1).unwrap();
        assert_eq!(groups, vec![group(0, 1)]);
    }

    #[test]
    fn test_every_page_a_boundary() {
        let groups = RangeBuilder::build_ranges(&[0, 1, 2, 3], 4).unwrap();
        assert_eq!(groups.len(), 4);
        assert!(groups.iter().all(|g| g.len() == 1));
    }

    #[test]
    fn test_rejects_unordered_boundaries() {
        let err = RangeBuilder::build_ranges(&[0, 3, 3], 5).unwrap_err();
        assert!(matches!(err, InvoiceSplitterError::InvalidBoundary { .. }));

        let err = RangeBuilder::build_ranges(&[0, 4, 2], 5).unwrap_err();
        assert!(matches!(err, InvoiceSplitterError::InvalidBoundary { .. }));
    }

    #[test]
    fn test_rejects_out_of_range_boundaries() {
        let err = RangeBuilder::build_ranges(&[0, 5], 5).unwrap_err();
        assert!(matches!(err, InvoiceSplitterError::InvalidBoundary { .. }));

        let err = RangeBuilder::build_ranges(&[1, 2], 5).unwrap_err();
        assert!(matches!(err, InvoiceSplitterError::InvalidBoundary { .. }));

        let err = RangeBuilder::build_ranges(&[], 5).unwrap_err();
        assert!(matches!(err, InvoiceSplitterError::InvalidBoundary { .. }));
    }

    #[test]
    fn test_zero_pages() {
        let err = RangeBuilder::build_ranges(&[0], 0).unwrap_err();
        assert!(matches!(err, InvoiceSplitterError::NoPages));
    }

    proptest! {
        #[test]
        fn prop_groups_cover_every_page_once(
            total_pages in 1usize..200,
            flags in proptest::collection::vec(any::<bool>(), 200),
        ) {
            let boundaries: Vec<usize> = (0..total_pages)
                .filter(|&i| i == 0 || flags[i])
                .collect();

            let groups = RangeBuilder::build_ranges(&boundaries, total_pages).unwrap();

            prop_assert_eq!(groups.len(), boundaries.len());
            prop_assert_eq!(groups[0].start, 0);
            prop_assert_eq!(groups[groups.len() - 1].end, total_pages);
            for pair in groups.windows(2) {
                prop_assert_eq!(pair[0].end, pair[1].start);
            }
            prop_assert!(groups.iter().all(|g| !g.is_empty()));
            prop_assert_eq!(groups.iter().map(InvoiceGroup::len).sum::<usize>(), total_pages);
        }
    }
}
