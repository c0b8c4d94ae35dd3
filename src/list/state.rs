//! List Query State
//!
//! Single source of truth for which page of which filtered/sorted data is
//! requested, plus the cached page itself. All mutations are synchronous;
//! fetches are described by a [`FetchTicket`] carrying a monotonically
//! increasing sequence number. Only the response to the most recently
//! issued ticket is applied, so out-of-order completions can never show a
//! stale page.

use std::collections::BTreeMap;
use tracing::debug;

use super::query::ListQuery;
use crate::error::ConsoleError;
use crate::model::{City, CityPage, Column, SortDirection};

/// Number of page buttons shown at once.
pub const PAGE_WINDOW: u32 = 5;

/// A fetch that has been issued against the current descriptor.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchTicket {
    pub seq: u64,
    pub query: ListQuery,
    pub silent: bool,
}

/// What happened when a response came back.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    /// The page replaced the cache.
    Applied,
    /// The latest request failed; the previous page stays visible.
    Failed(ConsoleError),
    /// A newer request was issued meanwhile; the response was discarded.
    Stale,
}

/// Immutable copy of what the table shows.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ListSnapshot {
    pub cities: Vec<City>,
    pub page: u32,
    pub page_size: u32,
    pub total_items: u64,
    pub total_pages: u32,
    pub filters: BTreeMap<Column, String>,
    pub sort_by: Column,
    pub sort_direction: SortDirection,
    pub loading: bool,
    pub error: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ListState {
    page: u32,
    page_size: u32,
    filters: BTreeMap<Column, String>,
    sort_by: Column,
    sort_direction: SortDirection,
    data: CityPage,
    loading: bool,
    error: Option<String>,
    last_issued: u64,
}

impl ListState {
    /// Defaults on mount: page 0, no filters, sort by id ascending.
    pub fn new(page_size: u32) -> Self {
        Self {
            page: 0,
            page_size,
            filters: BTreeMap::new(),
            sort_by: Column::Id,
            sort_direction: SortDirection::Asc,
            data: CityPage::default(),
            loading: false,
            error: None,
            last_issued: 0,
        }
    }

    // -------------------------------------------------------------------------
    // Descriptor mutations
    // -------------------------------------------------------------------------

    /// Update one filter and restart pagination. An empty value removes it.
    pub fn set_filter(&mut self, column: Column, value: impl Into<String>) {
        let value = value.into();
        if value.is_empty() {
            self.filters.remove(&column);
        } else {
            self.filters.insert(column, value);
        }
        self.page = 0;
    }

    pub fn clear_filter(&mut self, column: Column) {
        self.set_filter(column, String::new());
    }

    pub fn clear_all_filters(&mut self) {
        self.filters.clear();
        self.page = 0;
    }

    /// Same column flips direction; a new column starts ascending.
    pub fn set_sort(&mut self, column: Column) {
        if self.sort_by == column {
            self.sort_direction = self.sort_direction.flipped();
        } else {
            self.sort_by = column;
            self.sort_direction = SortDirection::Asc;
        }
        self.page = 0;
    }

    /// Returns false (and changes nothing) when `page` is outside
    /// `[0, total_pages)`.
    pub fn set_page(&mut self, page: u32) -> bool {
        if page >= self.data.total_pages {
            return false;
        }
        self.page = page;
        true
    }

    // -------------------------------------------------------------------------
    // Fetch lifecycle
    // -------------------------------------------------------------------------

    pub fn query(&self) -> ListQuery {
        ListQuery {
            page: self.page,
            size: self.page_size,
            sort_by: self.sort_by,
            sort_direction: self.sort_direction,
            filters: self.filters.clone(),
        }
    }

    /// Issue a fetch for the current descriptor. Silent fetches leave the
    /// loading flag alone.
    pub fn begin_fetch(&mut self, silent: bool) -> FetchTicket {
        self.last_issued += 1;
        if !silent {
            self.loading = true;
        }
        FetchTicket {
            seq: self.last_issued,
            query: self.query(),
            silent,
        }
    }

    /// Reconcile a response. Anything but the latest ticket is dropped.
    pub fn complete_fetch(
        &mut self,
        seq: u64,
        result: Result<CityPage, ConsoleError>,
    ) -> FetchOutcome {
        if seq != self.last_issued {
            debug!(seq, latest = self.last_issued, "Dropping stale list response");
            return FetchOutcome::Stale;
        }

        self.loading = false;
        match result {
            Ok(page) => {
                // the server clamps out-of-range pages
                self.page = page.current_page;
                self.data = page;
                self.error = None;
                FetchOutcome::Applied
            }
            Err(err) => {
                self.error = Some(err.to_string());
                FetchOutcome::Failed(err)
            }
        }
    }

    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    pub fn total_pages(&self) -> u32 {
        self.data.total_pages
    }

    pub fn filters(&self) -> &BTreeMap<Column, String> {
        &self.filters
    }

    pub fn filter(&self, column: Column) -> &str {
        self.filters.get(&column).map(String::as_str).unwrap_or("")
    }

    pub fn active_filter_count(&self) -> usize {
        self.filters.values().filter(|v| !v.is_empty()).count()
    }

    pub fn sort(&self) -> (Column, SortDirection) {
        (self.sort_by, self.sort_direction)
    }

    pub fn cities(&self) -> &[City] {
        &self.data.cities
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn last_issued(&self) -> u64 {
        self.last_issued
    }

    pub fn has_previous(&self) -> bool {
        self.page > 0
    }

    pub fn has_next(&self) -> bool {
        self.page + 1 < self.data.total_pages
    }

    /// Page indices for the pager, at most [`PAGE_WINDOW`], kept around the
    /// current page.
    pub fn visible_pages(&self) -> Vec<u32> {
        visible_pages(self.page, self.data.total_pages)
    }

    pub fn snapshot(&self) -> ListSnapshot {
        ListSnapshot {
            cities: self.data.cities.clone(),
            page: self.page,
            page_size: self.page_size,
            total_items: self.data.total_items,
            total_pages: self.data.total_pages,
            filters: self.filters.clone(),
            sort_by: self.sort_by,
            sort_direction: self.sort_direction,
            loading: self.loading,
            error: self.error.clone(),
        }
    }
}

pub fn visible_pages(current: u32, total_pages: u32) -> Vec<u32> {
    if total_pages <= PAGE_WINDOW {
        return (0..total_pages).collect();
    }
    let start = current
        .saturating_sub(2)
        .min(total_pages - PAGE_WINDOW);
    (start..start + PAGE_WINDOW).collect()
}
