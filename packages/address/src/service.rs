//! Suggestion service: parse, fetch a ranked page, and optionally count.

use std::sync::Arc;
use std::time::Instant;

use netinv_address_models::{
    SearchPage, SearchRequest, SuggestionCandidate, SuggestionConfig, SuggestionQuery,
};

use crate::counter::PaginationCounter;
use crate::dictionary::DictionaryHandle;
use crate::{AddressError, SuggestionStore, tokenizer};

/// Answers free-text address searches.
///
/// Cheap to share behind an `Arc`; every call is independent and holds
/// its own dictionary snapshot for the duration of the parse.
pub struct SuggestionService {
    dictionary: Arc<DictionaryHandle>,
    store: Arc<dyn SuggestionStore>,
    counter: PaginationCounter,
    config: SuggestionConfig,
}

impl SuggestionService {
    /// Creates a service over `store`, tokenizing with `dictionary`.
    #[must_use]
    pub fn new(
        dictionary: Arc<DictionaryHandle>,
        store: Arc<dyn SuggestionStore>,
        config: SuggestionConfig,
    ) -> Self {
        Self {
            dictionary,
            store,
            counter: PaginationCounter::new(config.count_threshold),
            config,
        }
    }

    /// The configuration this service was built with.
    #[must_use]
    pub const fn config(&self) -> &SuggestionConfig {
        &self.config
    }

    /// The dictionary handle used for tokenizing.
    #[must_use]
    pub const fn dictionary(&self) -> &Arc<DictionaryHandle> {
        &self.dictionary
    }

    /// Validates raw paging values and runs [`Self::get_suggestions`].
    ///
    /// # Errors
    ///
    /// Returns [`AddressError::Validation`] for a malformed window, and
    /// otherwise whatever [`Self::get_suggestions`] returns.
    pub async fn search(
        &self,
        text: &str,
        offset: i64,
        limit: i64,
    ) -> Result<SearchPage, AddressError> {
        let request = SearchRequest::new(text, offset, limit, &self.config)?;
        self.get_suggestions(&request).await
    }

    /// Returns one ranked page of candidates for `request`.
    ///
    /// The page query and, for pages larger than the count threshold, the
    /// count query run concurrently over the same filter. If either fails
    /// the whole request fails.
    ///
    /// # Errors
    ///
    /// Returns [`AddressError::NotReady`] if no dictionary is loaded, and
    /// [`AddressError::Upstream`] if storage fails.
    pub async fn get_suggestions(
        &self,
        request: &SearchRequest,
    ) -> Result<SearchPage, AddressError> {
        let dictionary = self.dictionary.snapshot().ok_or(AddressError::NotReady)?;
        let parsed = tokenizer::parse(&request.text, &dictionary);
        drop(dictionary);

        let query = SuggestionQuery {
            filter: parsed.filter(),
            offset: request.offset,
            limit: request.limit,
        };

        let start = Instant::now();
        let (candidates, total) = futures::try_join!(
            self.store.fetch_page(&query),
            self.counter
                .total(self.store.as_ref(), &query.filter, request.limit),
        )
        .inspect_err(|e| log::error!("Suggestion query failed for {:?}: {e}", request.text))?;

        log::debug!(
            "Fetched {} suggestions (total={total:?}) in {:.1?}",
            candidates.len(),
            start.elapsed()
        );

        Ok(SearchPage {
            candidates,
            total,
            offset: request.offset,
            limit: request.limit,
        })
    }

    /// Looks up a single house by id.
    ///
    /// # Errors
    ///
    /// Returns [`AddressError::Upstream`] if storage fails.
    pub async fn get_house(
        &self,
        house_id: i32,
    ) -> Result<Option<SuggestionCandidate>, AddressError> {
        Ok(self.store.get_house(house_id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dictionary::TypeDictionary;
    use crate::memory::MemoryStore;
    use netinv_address_models::{
        AdministrativeTypeToken, HouseRef, ResourceCounts, StreetRef, TypeCategory,
    };

    fn candidate(id: i32, street: &str, house: &str) -> SuggestionCandidate {
        SuggestionCandidate {
            street: StreetRef {
                name: street.to_string(),
                type_id: 1,
                type_short_name: "ул".to_string(),
            },
            house: HouseRef {
                id,
                name: house.to_string(),
                type_id: 1,
                type_short_name: "д".to_string(),
            },
            resources: ResourceCounts {
                documents: 0,
                nodes: u64::try_from(id % 3).unwrap(),
                hardware: 0,
            },
        }
    }

    fn dictionary() -> TypeDictionary {
        TypeDictionary::from_tokens([
            AdministrativeTypeToken {
                category: TypeCategory::StreetType,
                id: 1,
                name: "улица".to_string(),
                short_name: "ул".to_string(),
            },
            AdministrativeTypeToken {
                category: TypeCategory::HouseType,
                id: 1,
                name: "дом".to_string(),
                short_name: "д".to_string(),
            },
        ])
    }

    fn store() -> MemoryStore {
        let mut candidates = vec![
            candidate(1, "Ленина", "3"),
            candidate(2, "Ленина", "3а"),
            candidate(3, "Ленина", "30"),
            candidate(4, "Ленина", "13"),
            candidate(5, "Мира", "3"),
            candidate(6, "Ленинградская", "3б"),
        ];
        for i in 0..20 {
            candidates.push(candidate(100 + i, "Ленина", &format!("{}", 40 + i)));
        }
        MemoryStore::new().with_candidates(candidates)
    }

    fn service(store: Arc<MemoryStore>) -> SuggestionService {
        SuggestionService::new(
            Arc::new(DictionaryHandle::with_dictionary(dictionary())),
            store,
            SuggestionConfig::default(),
        )
    }

    fn house_names(page: &SearchPage) -> Vec<(&str, &str)> {
        page.candidates
            .iter()
            .map(|c| (c.street.name.as_str(), c.house.name.as_str()))
            .collect()
    }

    #[tokio::test]
    async fn ranks_exact_house_first() {
        let store = Arc::new(store());
        let page = service(store).search("ул Ленин д 3", 0, 5).await.unwrap();

        assert_eq!(
            house_names(&page),
            [
                ("Ленина", "3"),
                ("Ленина", "3а"),
                ("Ленинградская", "3б"),
                ("Ленина", "30"),
                ("Ленина", "13"),
            ]
        );
    }

    #[tokio::test]
    async fn small_pages_skip_the_count() {
        let store = Arc::new(store());
        let page = service(store.clone()).search("Ленина", 0, 10).await.unwrap();

        assert_eq!(page.total, None);
        assert_eq!(page.candidates.len(), 10);
        assert_eq!(store.count_queries(), 0);
    }

    #[tokio::test]
    async fn large_pages_count_with_the_same_filter() {
        let store = Arc::new(store());
        let page = service(store.clone()).search("Ленин", 0, 15).await.unwrap();

        // 24 houses on "Ленина" plus one on "Ленинградская".
        assert_eq!(page.total, Some(25));
        assert_eq!(page.candidates.len(), 15);
        assert_eq!(store.count_queries(), 1);
    }

    #[tokio::test]
    async fn overlapping_windows_agree_across_count_threshold() {
        let store = Arc::new(store());
        let svc = service(store);

        let small = svc.search("Ленина", 0, 5).await.unwrap();
        let large = svc.search("Ленина", 0, 15).await.unwrap();

        assert_eq!(small.candidates[..], large.candidates[..5]);
    }

    #[tokio::test]
    async fn offset_skips_ranked_candidates() {
        let store = Arc::new(store());
        let svc = service(store);

        let all = svc.search("Ленина 3", 0, 10).await.unwrap();
        let tail = svc.search("Ленина 3", 2, 10).await.unwrap();

        assert_eq!(tail.candidates[..], all.candidates[2..]);
        assert_eq!(tail.offset, 2);
    }

    #[tokio::test]
    async fn unknown_street_returns_empty_page() {
        let store = Arc::new(store());
        let page = service(store).search("Пушкина 1", 0, 20).await.unwrap();

        assert!(page.candidates.is_empty());
        assert_eq!(page.total, Some(0));
    }

    #[tokio::test]
    async fn storage_failure_is_surfaced() {
        let store = Arc::new(store());
        store.fail_queries(true);

        let err = service(store).search("Ленина", 0, 20).await.unwrap_err();
        assert!(matches!(err, AddressError::Upstream(_)));
    }

    #[tokio::test]
    async fn missing_dictionary_is_not_ready() {
        let svc = SuggestionService::new(
            Arc::new(DictionaryHandle::empty()),
            Arc::new(store()),
            SuggestionConfig::default(),
        );

        let err = svc.search("Ленина", 0, 5).await.unwrap_err();
        assert!(matches!(err, AddressError::NotReady));
    }

    #[tokio::test]
    async fn invalid_window_is_rejected_before_storage() {
        let store = Arc::new(store());
        let svc = service(store.clone());

        let err = svc.search("Ленина", -1, 5).await.unwrap_err();
        assert!(matches!(err, AddressError::Validation(_)));
        let err = svc.search("Ленина", 0, 0).await.unwrap_err();
        assert!(matches!(err, AddressError::Validation(_)));
        assert_eq!(store.page_queries(), 0);
    }

    #[tokio::test]
    async fn looks_up_house_by_id() {
        let store = Arc::new(store());
        let svc = service(store);

        let house = svc.get_house(2).await.unwrap().unwrap();
        assert_eq!(house.house.name, "3а");
        assert!(svc.get_house(9999).await.unwrap().is_none());
    }
}
