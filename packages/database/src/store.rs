//! [`SuggestionStore`] and [`DictionarySource`] over a `switchy_database`
//! connection.

use std::sync::Arc;

use async_trait::async_trait;
use netinv_address::{DictionarySource, StoreError, SuggestionStore};
use netinv_address_models::{
    AdministrativeTypeToken, SuggestionCandidate, SuggestionFilter, SuggestionQuery, TypeCategory,
};
use switchy_database::Database;

use crate::queries;

/// Postgres-backed address store.
#[derive(Clone)]
pub struct PgAddressStore {
    db: Arc<dyn Database>,
}

impl PgAddressStore {
    /// Wraps an open database connection.
    #[must_use]
    pub fn new(db: Arc<dyn Database>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl SuggestionStore for PgAddressStore {
    async fn fetch_page(
        &self,
        query: &SuggestionQuery,
    ) -> Result<Vec<SuggestionCandidate>, StoreError> {
        Ok(queries::get_suggestions(self.db.as_ref(), query).await?)
    }

    async fn count(&self, filter: &SuggestionFilter) -> Result<u64, StoreError> {
        Ok(queries::count_suggestions(self.db.as_ref(), filter).await?)
    }

    async fn get_house(&self, house_id: i32) -> Result<Option<SuggestionCandidate>, StoreError> {
        Ok(queries::get_house(self.db.as_ref(), house_id).await?)
    }
}

#[async_trait]
impl DictionarySource for PgAddressStore {
    async fn fetch_types(
        &self,
        category: TypeCategory,
    ) -> Result<Vec<AdministrativeTypeToken>, StoreError> {
        Ok(queries::get_types(self.db.as_ref(), category).await?)
    }
}
