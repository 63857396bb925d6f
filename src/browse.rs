//! Paged access to the raw rows of a [`FilteredDataset`].

use serde::Serialize;

use crate::filter::FilteredDataset;
use crate::trips::TripRecord;

/// Rows returned per page.
pub const PAGE_SIZE: usize = 5;

/// One page of raw rows.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<'a> {
    /// Index of the first row of this page within the dataset.
    pub start: usize,
    pub records: &'a [TripRecord],
    pub has_more: bool,
}

impl Page<'_> {
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }
}

/// Position of a browsing session over one dataset.
///
/// The cursor only advances; once it reaches the end of the dataset every
/// further call returns an empty page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrowseCursor {
    position: usize,
    page_size: usize,
}

impl Default for BrowseCursor {
    fn default() -> Self {
        Self::new()
    }
}

impl BrowseCursor {
    pub fn new() -> Self {
        Self {
            position: 0,
            page_size: PAGE_SIZE,
        }
    }

    /// Next unseen row index.
    pub fn position(&self) -> usize {
        self.position
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn is_exhausted(&self, dataset: &FilteredDataset) -> bool {
        self.position >= dataset.len()
    }

    pub fn reset(&mut self) {
        self.position = 0;
    }

    /// Returns the next page and advances past it.
    pub fn next_page<'a>(&mut self, dataset: &'a FilteredDataset) -> Page<'a> {
        let len = dataset.len();
        let start = self.position.min(len);
        let end = start.saturating_add(self.page_size).min(len);

        self.position = end;

        Page {
            start,
            records: &dataset.records()[start..end],
            has_more: end < len,
        }
    }
}
