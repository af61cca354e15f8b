//! In-process backend for the suggestion engine.
//!
//! [`MemoryStore`] keeps candidates and type records in memory and
//! implements both [`SuggestionStore`] and [`DictionarySource`]. Filtering
//! and ordering go through [`crate::ranking`], which makes it the
//! reference executor of the ranking contract. Failure switches let
//! callers exercise upstream error paths.

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use netinv_address_models::{
    AdministrativeTypeToken, SuggestionCandidate, SuggestionFilter, SuggestionQuery, TypeCategory,
};

use crate::ranking::{matches_filter, sort_candidates};
use crate::{DictionarySource, StoreError, SuggestionStore};

/// Candidates and type records held in memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    candidates: Mutex<Vec<SuggestionCandidate>>,
    types: Mutex<Vec<AdministrativeTypeToken>>,
    fail_queries: AtomicBool,
    fail_type_fetches: AtomicBool,
    failing_categories: Mutex<BTreeSet<TypeCategory>>,
    type_fetches: AtomicUsize,
    page_queries: AtomicUsize,
    count_queries: AtomicUsize,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds candidate houses.
    #[must_use]
    pub fn with_candidates(self, candidates: impl IntoIterator<Item = SuggestionCandidate>) -> Self {
        lock(&self.candidates).extend(candidates);
        self
    }

    /// Adds type records.
    #[must_use]
    pub fn with_types(self, types: impl IntoIterator<Item = AdministrativeTypeToken>) -> Self {
        lock(&self.types).extend(types);
        self
    }

    /// Replaces every type record.
    pub fn set_types(&self, types: impl IntoIterator<Item = AdministrativeTypeToken>) {
        *lock(&self.types) = types.into_iter().collect();
    }

    /// Makes page, count, and house lookups fail while `fail` is set.
    pub fn fail_queries(&self, fail: bool) {
        self.fail_queries.store(fail, Ordering::SeqCst);
    }

    /// Makes type fetches fail while `fail` is set.
    pub fn fail_type_fetches(&self, fail: bool) {
        self.fail_type_fetches.store(fail, Ordering::SeqCst);
    }

    /// Makes type fetches of `category` alone fail while `fail` is set.
    pub fn fail_type_fetches_for(&self, category: TypeCategory, fail: bool) {
        let mut failing = lock(&self.failing_categories);
        if fail {
            failing.insert(category);
        } else {
            failing.remove(&category);
        }
    }

    /// Number of successful type fetches served so far.
    #[must_use]
    pub fn type_fetches(&self) -> usize {
        self.type_fetches.load(Ordering::SeqCst)
    }

    /// Number of page queries served so far.
    #[must_use]
    pub fn page_queries(&self) -> usize {
        self.page_queries.load(Ordering::SeqCst)
    }

    /// Number of count queries served so far.
    #[must_use]
    pub fn count_queries(&self) -> usize {
        self.count_queries.load(Ordering::SeqCst)
    }

    fn check_queries(&self) -> Result<(), StoreError> {
        if self.fail_queries.load(Ordering::SeqCst) {
            return Err(StoreError::Query {
                message: "memory store is set to fail".to_string(),
            });
        }
        Ok(())
    }

    fn matching(&self, filter: &SuggestionFilter) -> Vec<SuggestionCandidate> {
        lock(&self.candidates)
            .iter()
            .filter(|c| matches_filter(filter, &c.street.name, &c.house.name))
            .cloned()
            .collect()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[async_trait]
impl SuggestionStore for MemoryStore {
    async fn fetch_page(
        &self,
        query: &SuggestionQuery,
    ) -> Result<Vec<SuggestionCandidate>, StoreError> {
        self.check_queries()?;
        self.page_queries.fetch_add(1, Ordering::SeqCst);

        let mut matches = self.matching(&query.filter);
        sort_candidates(&query.filter.house_fragment, &mut matches);

        Ok(matches
            .into_iter()
            .skip(query.offset as usize)
            .take(query.limit as usize)
            .collect())
    }

    async fn count(&self, filter: &SuggestionFilter) -> Result<u64, StoreError> {
        self.check_queries()?;
        self.count_queries.fetch_add(1, Ordering::SeqCst);

        Ok(self.matching(filter).len() as u64)
    }

    async fn get_house(&self, house_id: i32) -> Result<Option<SuggestionCandidate>, StoreError> {
        self.check_queries()?;

        Ok(lock(&self.candidates)
            .iter()
            .find(|c| c.house.id == house_id)
            .cloned())
    }
}

#[async_trait]
impl DictionarySource for MemoryStore {
    async fn fetch_types(
        &self,
        category: TypeCategory,
    ) -> Result<Vec<AdministrativeTypeToken>, StoreError> {
        if self.fail_type_fetches.load(Ordering::SeqCst)
            || lock(&self.failing_categories).contains(&category)
        {
            return Err(StoreError::Query {
                message: format!("memory store is set to fail fetching {category}"),
            });
        }

        let mut rows: Vec<AdministrativeTypeToken> = lock(&self.types)
            .iter()
            .filter(|t| t.category == category)
            .cloned()
            .collect();
        rows.sort_by_key(|t| t.id);
        self.type_fetches.fetch_add(1, Ordering::SeqCst);
        Ok(rows)
    }
}
