//! Channel catalog and paginated, category-filtered views over it
//!
//! The catalog is built once from parser output and never changes. Filtered
//! views and pages are derived from it on demand; the only mutable view state
//! is the active filter and the cursor, both owned by [`Browser`].

use std::collections::{BTreeSet, HashMap};

use crate::models::{CategoryFilter, ChannelRecord, ALL_CATEGORIES};

/// Records materialized per "load more" request
pub const PAGE_SIZE: usize = 50;

/// Categories listed right after the sentinel, in this order, when present
pub const PREFERRED_CATEGORIES: [&str; 4] = ["General", "News", "Entertainment", "Sports"];

/// Always listed last when present
pub const UNDEFINED_CATEGORY: &str = "Undefined";

#[derive(Debug, Clone, Default)]
pub struct Catalog {
    records: Vec<ChannelRecord>,
}

impl Catalog {
    /// Stores the records as given: no re-sorting, no deduplication
    pub fn build(records: Vec<ChannelRecord>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[ChannelRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records matching the filter, source order preserved.
    /// Category comparison is exact and case-sensitive.
    pub fn set_category(&self, filter: &CategoryFilter) -> FilteredView<'_> {
        FilteredView {
            records: self.records.iter().filter(|r| filter.matches(r)).collect(),
        }
    }

    /// Menu labels: sentinel, preferred prefix, the rest sorted, then "Undefined"
    pub fn derive_category_menu(&self) -> Vec<String> {
        let distinct: BTreeSet<&str> = self.records.iter().map(|r| r.category.as_str()).collect();

        let mut menu = Vec::with_capacity(distinct.len() + 1);
        menu.push(ALL_CATEGORIES.to_string());

        menu.extend(
            PREFERRED_CATEGORIES
                .iter()
                .filter(|c| distinct.contains(*c))
                .map(|c| c.to_string()),
        );

        // BTreeSet iteration is already lexicographic
        menu.extend(
            distinct
                .iter()
                .filter(|c| {
                    !PREFERRED_CATEGORIES.contains(*c)
                        && **c != UNDEFINED_CATEGORY
                        && **c != ALL_CATEGORIES
                })
                .map(|c| c.to_string()),
        );

        if distinct.contains(UNDEFINED_CATEGORY) {
            menu.push(UNDEFINED_CATEGORY.to_string());
        }

        menu
    }

    /// Record count per menu entry, in menu order
    pub fn category_counts(&self) -> Vec<(String, usize)> {
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for record in &self.records {
            *counts.entry(record.category.as_str()).or_default() += 1;
        }

        self.derive_category_menu()
            .into_iter()
            .map(|label| {
                let count = if label == ALL_CATEGORIES {
                    self.records.len()
                } else {
                    counts.get(label.as_str()).copied().unwrap_or(0)
                };
                (label, count)
            })
            .collect()
    }

    /// First record whose slug equals `slug` (deep-link lookup)
    pub fn find_by_slug(&self, slug: &str) -> Option<&ChannelRecord> {
        self.records.iter().find(|r| r.slug() == slug)
    }
}

/// How many records of the current filtered view have been materialized
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ViewCursor {
    pub displayed_count: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PageResult<'a> {
    pub records: Vec<&'a ChannelRecord>,
    pub cursor: ViewCursor,
    pub has_more: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FilteredView<'a> {
    records: Vec<&'a ChannelRecord>,
}

impl<'a> FilteredView<'a> {
    pub fn records(&self) -> &[&'a ChannelRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Up to [`PAGE_SIZE`] records starting at the cursor, and the advanced cursor
    pub fn next_page(&self, cursor: ViewCursor) -> PageResult<'a> {
        let start = cursor.displayed_count.min(self.records.len());
        let end = (start + PAGE_SIZE).min(self.records.len());
        let records = self.records[start..end].to_vec();
        let cursor = ViewCursor { displayed_count: end };

        PageResult {
            records,
            cursor,
            has_more: cursor.displayed_count < self.records.len(),
        }
    }

    /// Records already materialized up to the cursor
    pub fn visible(&self, cursor: ViewCursor) -> &[&'a ChannelRecord] {
        &self.records[..cursor.displayed_count.min(self.records.len())]
    }
}

/// What the channel list draws in one frame
#[derive(Debug, Clone, PartialEq)]
pub struct VisiblePage<'a> {
    pub records: Vec<&'a ChannelRecord>,
    pub filtered_len: usize,
    pub has_more: bool,
}

impl VisiblePage<'_> {
    /// "No channels match the current filters"
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// View state for one presentation: the catalog plus the active filter and cursor.
///
/// Every user action goes through one of the mutating methods. The category
/// counts are fixed with the catalog and computed once; the filtered list is
/// derived from the catalog and the current filter on demand.
#[derive(Debug, Clone)]
pub struct Browser {
    catalog: Catalog,
    filter: CategoryFilter,
    cursor: ViewCursor,
    category_counts: Vec<(String, usize)>,
}

impl Browser {
    /// Starts unfiltered with the first page loaded
    pub fn new(catalog: Catalog) -> Self {
        let category_counts = catalog.category_counts();
        let mut browser = Self {
            catalog,
            filter: CategoryFilter::All,
            cursor: ViewCursor::default(),
            category_counts,
        };
        browser.load_more();
        browser
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn filter(&self) -> &CategoryFilter {
        &self.filter
    }

    pub fn cursor(&self) -> ViewCursor {
        self.cursor
    }

    /// Menu entries with their record counts, in menu order
    pub fn category_counts(&self) -> &[(String, usize)] {
        &self.category_counts
    }

    /// Replace the filter, reset the cursor and load the first page
    pub fn select_category(&mut self, label: &str) -> usize {
        self.filter = CategoryFilter::from_label(label);
        self.cursor = ViewCursor::default();
        tracing::debug!(category = label, "category selected");
        self.load_more()
    }

    /// Materialize the next page; returns how many records were added
    pub fn load_more(&mut self) -> usize {
        let view = self.catalog.set_category(&self.filter);
        let page = view.next_page(self.cursor);
        self.cursor = page.cursor;
        page.records.len()
    }

    /// Visible records, filtered total and "load more" state from a single
    /// pass over the catalog
    pub fn visible_page(&self) -> VisiblePage<'_> {
        let view = self.catalog.set_category(&self.filter);
        VisiblePage {
            records: view.visible(self.cursor).to_vec(),
            filtered_len: view.len(),
            has_more: self.cursor.displayed_count < view.len(),
        }
    }

    pub fn has_more(&self) -> bool {
        self.cursor.displayed_count < self.catalog.set_category(&self.filter).len()
    }

    pub fn visible(&self) -> Vec<&ChannelRecord> {
        let view = self.catalog.set_category(&self.filter);
        view.visible(self.cursor).to_vec()
    }

    pub fn filtered_len(&self) -> usize {
        self.catalog.set_category(&self.filter).len()
    }

    /// "No channels match the current filters"
    pub fn is_empty_view(&self) -> bool {
        self.cursor.displayed_count == 0
    }

    pub fn header_title(&self) -> &str {
        match &self.filter {
            CategoryFilter::All => "All Channels",
            CategoryFilter::Named(name) => name,
        }
    }
}

#[cfg(test)]
#[path = "catalog_tests.rs"]
mod tests;
