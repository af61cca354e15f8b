//! Administrative type dictionary.
//!
//! Street and house type words ("улица"/"ул", "дом"/"д", ...) are loaded
//! from a [`DictionarySource`] once at startup and kept as an immutable
//! [`TypeDictionary`] snapshot. [`DictionaryHandle`] owns the current
//! snapshot and replaces it wholesale on reload, so a tokenizer holding a
//! snapshot never sees a half-built dictionary.

use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use netinv_address_models::{AdministrativeTypeToken, TypeCategory};

use crate::{AddressError, DictionarySource, StoreError};

/// Case-folded lookup sets of administrative type words, one per category.
#[derive(Debug, Clone, Default)]
pub struct TypeDictionary {
    words: BTreeMap<TypeCategory, HashSet<String>>,
    tokens: BTreeMap<TypeCategory, Vec<AdministrativeTypeToken>>,
}

impl TypeDictionary {
    /// Builds a dictionary from type records.
    ///
    /// Both the full name and the abbreviation of every record become
    /// lookup keys of the record's category.
    #[must_use]
    pub fn from_tokens(tokens: impl IntoIterator<Item = AdministrativeTypeToken>) -> Self {
        let mut dictionary = Self::default();

        for token in tokens {
            let words = dictionary.words.entry(token.category).or_default();
            for form in [&token.name, &token.short_name] {
                let folded = form.trim().to_lowercase();
                if !folded.is_empty() {
                    words.insert(folded);
                }
            }
            dictionary
                .tokens
                .entry(token.category)
                .or_default()
                .push(token);
        }

        dictionary
    }

    /// Fetches every category from `source` and builds a dictionary.
    ///
    /// All categories must load; a partial dictionary is never returned.
    ///
    /// # Errors
    ///
    /// Returns [`AddressError::Configuration`] if any category fails.
    pub async fn load(source: &dyn DictionarySource) -> Result<Self, AddressError> {
        let mut tokens = Vec::new();

        for &category in TypeCategory::all() {
            let rows = source
                .fetch_types(category)
                .await
                .map_err(|e| configuration_error(category, &e))?;
            log::debug!("Loaded {} {category} records", rows.len());
            tokens.extend(rows);
        }

        Ok(Self::from_tokens(tokens))
    }

    /// Returns `true` if `word` is a type word of `category`.
    ///
    /// The comparison is case-insensitive.
    #[must_use]
    pub fn lookup(&self, category: TypeCategory, word: &str) -> bool {
        self.words
            .get(&category)
            .is_some_and(|set| set.contains(&word.to_lowercase()))
    }

    /// Like [`Self::lookup`], with the category given by name
    /// (`"STREET_TYPE"`, `"HOUSE_TYPE"`). Unknown names return `false`.
    #[must_use]
    pub fn lookup_str(&self, category: &str, word: &str) -> bool {
        category
            .parse::<TypeCategory>()
            .is_ok_and(|category| self.lookup(category, word))
    }

    /// Returns `true` if an already case-folded word is a type word of any
    /// category.
    #[must_use]
    pub fn is_type_word(&self, folded: &str) -> bool {
        self.words.values().any(|set| set.contains(folded))
    }

    /// Returns the records of `category` in the order they were loaded.
    #[must_use]
    pub fn tokens(&self, category: TypeCategory) -> &[AdministrativeTypeToken] {
        self.tokens.get(&category).map_or(&[][..], Vec::as_slice)
    }

    /// Number of distinct lookup words across all categories.
    #[must_use]
    pub fn word_count(&self) -> usize {
        self.words.values().map(HashSet::len).sum()
    }
}

fn configuration_error(category: TypeCategory, error: &StoreError) -> AddressError {
    AddressError::Configuration {
        message: format!("failed to fetch {category}: {error}"),
    }
}

/// Owner of the live [`TypeDictionary`] snapshot.
///
/// Readers clone the `Arc` and keep using that snapshot for as long as
/// they need it. Reloads build a complete dictionary off to the side and
/// then swap the pointer.
#[derive(Debug, Default)]
pub struct DictionaryHandle {
    current: RwLock<Option<Arc<TypeDictionary>>>,
}

impl DictionaryHandle {
    /// Creates a handle with no dictionary installed.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Creates a handle that already holds `dictionary`.
    #[must_use]
    pub fn with_dictionary(dictionary: TypeDictionary) -> Self {
        Self {
            current: RwLock::new(Some(Arc::new(dictionary))),
        }
    }

    /// Loads the initial dictionary from `source`.
    ///
    /// # Errors
    ///
    /// Returns [`AddressError::Configuration`] if loading fails. Callers
    /// should treat this as fatal: tokenizing without the dictionary folds
    /// type words into street names.
    pub async fn load(source: &dyn DictionarySource) -> Result<Self, AddressError> {
        let dictionary = TypeDictionary::load(source).await?;
        log::info!(
            "Type dictionary loaded ({} lookup words)",
            dictionary.word_count()
        );
        Ok(Self::with_dictionary(dictionary))
    }

    /// Returns the current snapshot, or `None` before the first load.
    #[must_use]
    pub fn snapshot(&self) -> Option<Arc<TypeDictionary>> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Returns `true` once a dictionary has been installed.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.snapshot().is_some()
    }

    /// Replaces the live snapshot with `dictionary`.
    pub fn install(&self, dictionary: TypeDictionary) {
        let next = Arc::new(dictionary);
        *self
            .current
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(next);
    }

    /// Rebuilds the dictionary from `source` and swaps it in.
    ///
    /// On failure the previous snapshot stays in place.
    ///
    /// # Errors
    ///
    /// Returns [`AddressError::Configuration`] if loading fails.
    pub async fn reload(&self, source: &dyn DictionarySource) -> Result<(), AddressError> {
        let dictionary = TypeDictionary::load(source).await?;
        let words = dictionary.word_count();
        self.install(dictionary);
        log::info!("Type dictionary reloaded ({words} lookup words)");
        Ok(())
    }
}

/// Spawns a task that reloads `handle` from `source` every `interval`.
///
/// Failed reloads are logged and the previous snapshot keeps serving.
/// The task runs until the returned handle is aborted or the runtime
/// shuts down.
pub fn spawn_refresh(
    handle: Arc<DictionaryHandle>,
    source: Arc<dyn DictionarySource>,
    interval: Duration,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        // The first tick completes immediately; the dictionary was just
        // loaded at startup.
        ticker.tick().await;

        loop {
            ticker.tick().await;
            if let Err(e) = handle.reload(source.as_ref()).await {
                log::error!("Type dictionary refresh failed, keeping previous snapshot: {e}");
            }
        }
    })
}
