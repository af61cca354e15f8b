//! Ordering contract for address suggestions.
//!
//! Every [`SuggestionStore`](crate::SuggestionStore) must return candidates
//! in the order defined here, whether it sorts in process (see
//! [`crate::memory`]) or in SQL. The order is a pure function of the house
//! fragment and the candidate's house name:
//!
//! 1. [`MatchTier`] ascending
//! 2. house name length in characters ascending
//! 3. house name, compared byte-wise (Rust `str` ordering)

use std::cmp::Ordering;

use netinv_address_models::{SuggestionCandidate, SuggestionFilter};

/// Coarse ranking bucket of a house name against the house fragment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MatchTier {
    /// Name equals the fragment exactly (`"3"` for `"3"`).
    Exact = 0,
    /// Name is the fragment followed by a non-digit (`"3а"` for `"3"`,
    /// but not `"30"`).
    UnitSuffix = 1,
    /// Name starts with the fragment, ignoring case. Every name lands here
    /// when the fragment is empty.
    Prefix = 2,
    /// Fragment appears somewhere else in the name.
    Partial = 3,
}

impl MatchTier {
    /// Numeric value of the tier (0-3).
    #[must_use]
    pub const fn value(self) -> u8 {
        self as u8
    }

    /// Classifies `name` against `house_fragment`.
    #[must_use]
    pub fn classify(house_fragment: &str, name: &str) -> Self {
        if house_fragment.is_empty() {
            return Self::Prefix;
        }

        if name == house_fragment {
            return Self::Exact;
        }

        if let Some(rest) = name.strip_prefix(house_fragment)
            && rest.chars().next().is_some_and(|c| !c.is_ascii_digit())
        {
            return Self::UnitSuffix;
        }

        if name
            .to_lowercase()
            .starts_with(&house_fragment.to_lowercase())
        {
            return Self::Prefix;
        }

        Self::Partial
    }
}

/// Full sort key of a house name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct RankKey<'a> {
    /// Coarse bucket.
    pub tier: MatchTier,
    /// Name length in characters.
    pub length: usize,
    /// The name itself.
    pub name: &'a str,
}

impl<'a> RankKey<'a> {
    /// Builds the sort key of `name` for `house_fragment`.
    #[must_use]
    pub fn new(house_fragment: &str, name: &'a str) -> Self {
        Self {
            tier: MatchTier::classify(house_fragment, name),
            length: name.chars().count(),
            name,
        }
    }
}

/// Compares two house names under `house_fragment`.
#[must_use]
pub fn compare_names(house_fragment: &str, a: &str, b: &str) -> Ordering {
    RankKey::new(house_fragment, a).cmp(&RankKey::new(house_fragment, b))
}

/// Returns `true` if a house passes `filter`.
///
/// The street name must contain the street fragment and the house name
/// must contain the house fragment, both ignoring case. An empty house
/// fragment matches every house.
#[must_use]
pub fn matches_filter(filter: &SuggestionFilter, street_name: &str, house_name: &str) -> bool {
    contains_folded(street_name, &filter.street_fragment)
        && (filter.house_fragment.is_empty()
            || contains_folded(house_name, &filter.house_fragment))
}

fn contains_folded(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// Sorts candidates in place by the ranking contract.
///
/// The sort is stable, but the key covers the whole house name, so
/// candidates only tie when their house names are identical.
pub fn sort_candidates(house_fragment: &str, candidates: &mut [SuggestionCandidate]) {
    candidates.sort_by(|a, b| compare_names(house_fragment, &a.house.name, &b.house.name));
}

#[cfg(test)]
mod tests {
    use super::*;
    use netinv_address_models::{HouseRef, ResourceCounts, StreetRef};

    fn candidate(id: i32, house: &str) -> SuggestionCandidate {
        SuggestionCandidate {
            street: StreetRef {
                name: "Ленина".to_string(),
                type_id: 1,
                type_short_name: "ул".to_string(),
            },
            house: HouseRef {
                id,
                name: house.to_string(),
                type_id: 1,
                type_short_name: "д".to_string(),
            },
            resources: ResourceCounts::default(),
        }
    }

    fn names(candidates: &[SuggestionCandidate]) -> Vec<&str> {
        candidates.iter().map(|c| c.house.name.as_str()).collect()
    }

    #[test]
    fn classifies_tiers() {
        assert_eq!(MatchTier::classify("3", "3"), MatchTier::Exact);
        assert_eq!(MatchTier::classify("3", "3а"), MatchTier::UnitSuffix);
        assert_eq!(MatchTier::classify("3", "3/1"), MatchTier::UnitSuffix);
        assert_eq!(MatchTier::classify("3", "30"), MatchTier::Prefix);
        assert_eq!(MatchTier::classify("3", "13"), MatchTier::Partial);
        assert_eq!(MatchTier::classify("", "13"), MatchTier::Prefix);
    }

    #[test]
    fn uppercase_letter_suffix_is_unit_suffix() {
        assert_eq!(MatchTier::classify("14", "14А"), MatchTier::UnitSuffix);
        assert_eq!(MatchTier::classify("14а", "14А"), MatchTier::Prefix);
    }

    #[test]
    fn exact_beats_unit_suffix() {
        assert_eq!(compare_names("3", "3", "3а"), Ordering::Less);
        assert_eq!(compare_names("3", "3а", "3"), Ordering::Greater);
    }

    #[test]
    fn orders_by_tier_then_length_then_name() {
        let mut candidates = vec![
            candidate(1, "130"),
            candidate(2, "13"),
            candidate(3, "3б"),
            candidate(4, "30"),
            candidate(5, "3"),
            candidate(6, "3а"),
            candidate(7, "3 корп 2"),
        ];
        sort_candidates("3", &mut candidates);
        assert_eq!(
            names(&candidates),
            ["3", "3а", "3б", "3 корп 2", "30", "13", "130"]
        );
    }

    #[test]
    fn empty_fragment_orders_by_length_then_name() {
        let mut candidates = vec![
            candidate(1, "10"),
            candidate(2, "2"),
            candidate(3, "1а"),
            candidate(4, "1"),
            candidate(5, "100"),
        ];
        sort_candidates("", &mut candidates);
        assert_eq!(names(&candidates), ["1", "2", "10", "1а", "100"]);
    }

    #[test]
    fn reranking_is_idempotent() {
        let mut candidates = vec![
            candidate(1, "14б"),
            candidate(2, "114"),
            candidate(3, "14"),
            candidate(4, "140"),
            candidate(5, "14а"),
        ];
        sort_candidates("14", &mut candidates);
        let first = candidates.clone();
        sort_candidates("14", &mut candidates);
        assert_eq!(candidates, first);
    }

    #[test]
    fn filter_is_case_insensitive_substring() {
        let filter = SuggestionFilter {
            street_fragment: "ленин".to_string(),
            house_fragment: "4а".to_string(),
        };
        assert!(matches_filter(&filter, "Ленина", "14А"));
        assert!(!matches_filter(&filter, "Мира", "14а"));
        assert!(!matches_filter(&filter, "Ленина", "14"));
    }

    #[test]
    fn empty_house_fragment_matches_every_house() {
        let filter = SuggestionFilter {
            street_fragment: "мир".to_string(),
            house_fragment: String::new(),
        };
        assert!(matches_filter(&filter, "Мира", "1"));
        assert!(matches_filter(&filter, "Мира", "строение 5"));
    }
}
