#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Address suggestion engine for the network inventory backend.
//!
//! Turns free text such as `"ул Ленина 14а"` into a ranked, paginated list
//! of houses.
//!
//! # Architecture
//!
//! - [`dictionary`]: administrative type words ("улица", "ул", "дом", ...)
//!   loaded from a [`DictionarySource`] into an immutable snapshot that is
//!   swapped atomically on reload.
//! - [`tokenizer`]: splits raw text into a street fragment and a house
//!   fragment using the dictionary.
//! - [`ranking`]: the ordering contract every [`SuggestionStore`] must
//!   reproduce.
//! - [`counter`]: decides whether a total count is worth a second query.
//! - [`service`]: ties the above together behind
//!   [`SuggestionService::get_suggestions`].
//! - [`memory`]: an in-process backend implementing both collaborator
//!   traits.

pub mod counter;
pub mod dictionary;
pub mod memory;
pub mod ranking;
pub mod service;
pub mod tokenizer;

use async_trait::async_trait;

pub use dictionary::{DictionaryHandle, TypeDictionary};
pub use netinv_address_models::{
    AdministrativeTypeToken, InvalidSearchRequest, ParsedAddressQuery, SearchPage, SearchRequest,
    SuggestionCandidate, SuggestionConfig, SuggestionFilter, SuggestionQuery, TypeCategory,
};
pub use service::SuggestionService;

/// Errors reported by storage and dictionary collaborators.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The backing store failed to execute a query.
    #[error("Query failed: {message}")]
    Query {
        /// Description of what went wrong.
        message: String,
    },

    /// A returned row could not be converted into a model type.
    #[error("Row conversion failed: {message}")]
    Conversion {
        /// Description of what went wrong.
        message: String,
    },
}

/// Errors surfaced by the suggestion engine.
#[derive(Debug, thiserror::Error)]
pub enum AddressError {
    /// The type dictionary could not be loaded. Fatal at startup.
    #[error("Type dictionary failed to load: {message}")]
    Configuration {
        /// Description of what went wrong.
        message: String,
    },

    /// No dictionary snapshot has been installed yet.
    #[error("Suggestion service is not ready: type dictionary not loaded")]
    NotReady,

    /// The request had a malformed offset or limit.
    #[error("Validation error: {0}")]
    Validation(#[from] InvalidSearchRequest),

    /// Storage failed while serving the request.
    #[error("Upstream error: {0}")]
    Upstream(#[from] StoreError),
}

/// Supplies administrative type records.
#[async_trait]
pub trait DictionarySource: Send + Sync {
    /// Fetches every type record of `category`, ordered by id.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the records cannot be fetched.
    async fn fetch_types(
        &self,
        category: TypeCategory,
    ) -> Result<Vec<AdministrativeTypeToken>, StoreError>;
}

/// Executes candidate lookups for the suggestion service.
///
/// Implementations must filter and order exactly as described in
/// [`ranking`]: street name contains the street fragment, house name
/// contains the house fragment (case-insensitively), ordered by
/// [`ranking::MatchTier`], then name length in characters, then name.
#[async_trait]
pub trait SuggestionStore: Send + Sync {
    /// Returns one ranked page of candidates.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the query fails.
    async fn fetch_page(
        &self,
        query: &SuggestionQuery,
    ) -> Result<Vec<SuggestionCandidate>, StoreError>;

    /// Counts every candidate matching `filter`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the query fails.
    async fn count(&self, filter: &SuggestionFilter) -> Result<u64, StoreError>;

    /// Looks up a single house by id.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the query fails.
    async fn get_house(&self, house_id: i32) -> Result<Option<SuggestionCandidate>, StoreError>;
}
