//! Free-text address tokenizer.
//!
//! Splits user input such as `"ул. Ленина, 14а"` into a street fragment
//! (`"Ленина"`) and a house fragment (`"14а"`). Type words known to the
//! [`TypeDictionary`] are dropped from both fragments.

use regex::Regex;
use std::sync::LazyLock;

use netinv_address_models::ParsedAddressQuery;

use crate::dictionary::TypeDictionary;

/// Digits optionally followed by exactly one lowercase Cyrillic letter.
/// Applied to case-folded words only.
static HOUSE_NUMBER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]+[а-яё]?$").expect("valid regex"));

/// Returns `true` if `word` looks like a house number (`"14"`, `"14а"`).
///
/// Matching is case-insensitive.
#[must_use]
pub fn is_house_number(word: &str) -> bool {
    HOUSE_NUMBER_RE.is_match(&word.to_lowercase())
}

/// Splits `raw` into street and house fragments.
///
/// Commas are removed and the rest is split on whitespace. Walking the
/// words in order:
///
/// 1. The first word that looks like a house number, seen after at least
///    one street word, becomes the house fragment.
/// 2. Type words ("ул", "дом", ...) are skipped.
/// 3. Any other word before the house number joins the street fragment.
///    Words after the house number are dropped.
///
/// Never fails; text with nothing usable yields empty fragments.
#[must_use]
pub fn parse(raw: &str, dictionary: &TypeDictionary) -> ParsedAddressQuery {
    let cleaned = raw.replace(',', "");

    let mut street_words: Vec<&str> = Vec::new();
    let mut house_fragment: Option<String> = None;

    for word in cleaned.split_whitespace() {
        let folded = word.to_lowercase();

        if house_fragment.is_none() && !street_words.is_empty() && HOUSE_NUMBER_RE.is_match(&folded)
        {
            house_fragment = Some(folded);
            continue;
        }

        if dictionary.is_type_word(&folded) {
            continue;
        }

        if house_fragment.is_none() {
            street_words.push(word);
        }
    }

    let parsed = ParsedAddressQuery {
        street_fragment: street_words.join(" "),
        house_fragment: house_fragment.unwrap_or_default(),
    };

    log::debug!(
        "Parsed {raw:?} into street={:?} house={:?}",
        parsed.street_fragment,
        parsed.house_fragment
    );

    parsed
}
