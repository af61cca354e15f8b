#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Data types for the address suggestion engine.
//!
//! These types describe the administrative type dictionary, the parsed
//! form of a free-text address search, the candidate houses returned for
//! it, and the configuration knobs of the suggestion service. They carry
//! no behavior beyond construction and validation so that storage
//! backends and front ends can share them without pulling in the engine.

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Category of an administrative type word.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum TypeCategory {
    /// Street classifiers ("улица", "ул", "проспект", ...).
    StreetType,
    /// House classifiers ("дом", "д", "корпус", ...).
    HouseType,
}

impl TypeCategory {
    /// Returns every category, in load order.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::StreetType, Self::HouseType]
    }
}

/// A single row of the administrative type dictionary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdministrativeTypeToken {
    /// Category this token belongs to.
    pub category: TypeCategory,
    /// Database identifier of the type record.
    pub id: i32,
    /// Full name, e.g. `"улица"`.
    pub name: String,
    /// Abbreviation, e.g. `"ул"`.
    pub short_name: String,
}

/// The two fragments extracted from a free-text address search.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedAddressQuery {
    /// Street-name words in input order, joined by single spaces.
    pub street_fragment: String,
    /// First house-number token found after a street word, case-folded.
    pub house_fragment: String,
}

impl ParsedAddressQuery {
    /// Returns the filter predicate described by these fragments.
    #[must_use]
    pub fn filter(&self) -> SuggestionFilter {
        SuggestionFilter {
            street_fragment: self.street_fragment.clone(),
            house_fragment: self.house_fragment.clone(),
        }
    }
}

/// Filter shared by the ranked page query and the count query.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestionFilter {
    /// Case-insensitive substring the street name must contain.
    pub street_fragment: String,
    /// Case-insensitive substring the house name must contain; empty
    /// matches every house.
    pub house_fragment: String,
}

/// Parameters for fetching one ranked page of candidates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestionQuery {
    /// Filter predicate.
    pub filter: SuggestionFilter,
    /// Number of ranked candidates to skip.
    pub offset: u32,
    /// Maximum number of candidates to return.
    pub limit: u32,
}

/// Street part of a candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreetRef {
    /// Street name without its type word.
    pub name: String,
    /// Street type identifier.
    pub type_id: i32,
    /// Street type abbreviation.
    pub type_short_name: String,
}

/// House part of a candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HouseRef {
    /// House identifier.
    pub id: i32,
    /// House number as stored, e.g. `"14а"`.
    pub name: String,
    /// House type identifier.
    pub type_id: i32,
    /// House type abbreviation.
    pub type_short_name: String,
}

/// Counts of resources attached to a house.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceCounts {
    /// Uploaded documents.
    pub documents: u64,
    /// Infrastructure nodes located in the house.
    pub nodes: u64,
    /// Hardware units installed on those nodes.
    pub hardware: u64,
}

/// A house returned as a possible match for a search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestionCandidate {
    /// Street the house belongs to.
    pub street: StreetRef,
    /// The house itself.
    pub house: HouseRef,
    /// Attached resource counters.
    pub resources: ResourceCounts,
}

/// A validated search request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
    /// Raw text as typed by the user.
    pub text: String,
    /// Number of ranked candidates to skip.
    pub offset: u32,
    /// Page size.
    pub limit: u32,
}

impl SearchRequest {
    /// Validates raw offset/limit values against `config`.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidSearchRequest`] if `offset` is negative or above
    /// `u32::MAX`, if `limit` is below 1, or if `limit` exceeds
    /// [`SuggestionConfig::max_limit`].
    pub fn new(
        text: impl Into<String>,
        offset: i64,
        limit: i64,
        config: &SuggestionConfig,
    ) -> Result<Self, InvalidSearchRequest> {
        let offset = u32::try_from(offset).map_err(|_| InvalidSearchRequest {
            message: format!("offset must be between 0 and {}, got {offset}", u32::MAX),
        })?;

        if limit < 1 {
            return Err(InvalidSearchRequest {
                message: format!("limit must be at least 1, got {limit}"),
            });
        }

        let limit = u32::try_from(limit)
            .ok()
            .filter(|l| *l <= config.max_limit)
            .ok_or_else(|| InvalidSearchRequest {
                message: format!("limit must not exceed {}, got {limit}", config.max_limit),
            })?;

        Ok(Self {
            text: text.into(),
            offset,
            limit,
        })
    }
}

/// Error returned when a [`SearchRequest`] has an invalid offset or limit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidSearchRequest {
    /// What was wrong with the request.
    pub message: String,
}

impl std::fmt::Display for InvalidSearchRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid search request: {}", self.message)
    }
}

impl std::error::Error for InvalidSearchRequest {}

/// One ranked page of search results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchPage {
    /// Ranked candidates for the requested window.
    pub candidates: Vec<SuggestionCandidate>,
    /// Total number of matches, or `None` when the count was skipped
    /// because the page size is at or below the count threshold.
    pub total: Option<u64>,
    /// Requested offset.
    pub offset: u32,
    /// Requested limit.
    pub limit: u32,
}

/// Tunables of the suggestion service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SuggestionConfig {
    /// Count queries run only for pages larger than this.
    pub count_threshold: u32,
    /// Page size used when the caller does not give one.
    pub default_limit: u32,
    /// Largest accepted page size.
    pub max_limit: u32,
    /// Interval between dictionary reloads; `None` loads once at startup.
    pub dictionary_refresh_secs: Option<u64>,
}

impl Default for SuggestionConfig {
    fn default() -> Self {
        Self {
            count_threshold: 10,
            default_limit: 10,
            max_limit: 100,
            dictionary_refresh_secs: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_round_trips_through_strum() {
        assert_eq!(TypeCategory::StreetType.as_ref(), "STREET_TYPE");
        assert_eq!(
            "HOUSE_TYPE".parse::<TypeCategory>().unwrap(),
            TypeCategory::HouseType
        );
        assert!("CITY_TYPE".parse::<TypeCategory>().is_err());
    }

    #[test]
    fn rejects_offset_past_u32_range_naming_the_bound() {
        let offset = i64::from(u32::MAX) + 1;
        let err =
            SearchRequest::new("ленина", offset, 10, &SuggestionConfig::default()).unwrap_err();
        assert!(err.message.contains(&u32::MAX.to_string()));
        assert!(!err.message.contains("non-negative"));

        let req = SearchRequest::new("ленина", i64::from(u32::MAX), 10, &SuggestionConfig::default())
            .unwrap();
        assert_eq!(req.offset, u32::MAX);
    }

    #[test]
    fn rejects_negative_offset() {
        let err = SearchRequest::new("ленина", -1, 10, &SuggestionConfig::default()).unwrap_err();
        assert!(err.message.contains("offset"));
    }

    #[test]
    fn rejects_zero_limit() {
        let err = SearchRequest::new("ленина", 0, 0, &SuggestionConfig::default()).unwrap_err();
        assert!(err.message.contains("at least 1"));
    }

    #[test]
    fn rejects_limit_above_max() {
        let config = SuggestionConfig {
            max_limit: 50,
            ..SuggestionConfig::default()
        };
        let err = SearchRequest::new("ленина", 0, 51, &config).unwrap_err();
        assert!(err.message.contains("50"));
    }

    #[test]
    fn accepts_valid_window() {
        let req = SearchRequest::new("ленина 14", 20, 15, &SuggestionConfig::default()).unwrap();
        assert_eq!(req.offset, 20);
        assert_eq!(req.limit, 15);
        assert_eq!(req.text, "ленина 14");
    }

    #[test]
    fn skipped_total_serializes_as_null() {
        let page = SearchPage {
            candidates: Vec::new(),
            total: None,
            offset: 0,
            limit: 5,
        };
        let json = serde_json::to_value(&page).unwrap();
        assert!(json["total"].is_null());
    }

    #[test]
    fn config_fills_missing_fields_with_defaults() {
        let config: SuggestionConfig = toml::from_str("max_limit = 200").unwrap();
        assert_eq!(config.max_limit, 200);
        assert_eq!(config.count_threshold, 10);
        assert_eq!(config.dictionary_refresh_secs, None);
    }
}
