//! Total-count policy for suggestion pages.
//!
//! Counting matches is a second scan over the same filter. Small
//! as-you-type pages skip it; larger "show everything" pages pay for it.

use netinv_address_models::SuggestionFilter;

use crate::{StoreError, SuggestionStore};

/// Decides when a total count is computed and runs the count query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginationCounter {
    threshold: u32,
}

impl PaginationCounter {
    /// Creates a counter that counts only when `limit > threshold`.
    #[must_use]
    pub const fn new(threshold: u32) -> Self {
        Self { threshold }
    }

    /// Returns `true` if a page of `limit` rows gets a total count.
    #[must_use]
    pub const fn needs_total(&self, limit: u32) -> bool {
        limit > self.threshold
    }

    /// Counts matches for `filter` when `limit` calls for it.
    ///
    /// Returns `Ok(None)` without touching the store when the count is
    /// skipped.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the count query fails.
    pub async fn total(
        &self,
        store: &dyn SuggestionStore,
        filter: &SuggestionFilter,
        limit: u32,
    ) -> Result<Option<u64>, StoreError> {
        if !self.needs_total(limit) {
            return Ok(None);
        }

        store.count(filter).await.map(Some)
    }
}

impl Default for PaginationCounter {
    fn default() -> Self {
        Self::new(10)
    }
}
