//! SQL for address suggestions and the type dictionary.
//!
//! The ranked page query and the count query share [`suggestion_from`] and
//! the parameters built by [`filter_params`], so a page and its total are
//! always computed over the same predicate.

use std::time::Instant;

use moosicbox_json_utils::database::ToValue as _;
use netinv_address_models::{
    AdministrativeTypeToken, HouseRef, ResourceCounts, StreetRef, SuggestionCandidate,
    SuggestionFilter, SuggestionQuery, TypeCategory,
};
use switchy_database::{Database, DatabaseValue, Row};

use crate::DbError;

/// Columns of a suggestion candidate, including per-house resource counts.
const CANDIDATE_COLUMNS: &str = r#"
    s.name AS street_name,
    s.type_id AS street_type_id,
    st.short_name AS street_type_short_name,
    h.id AS house_id,
    h.name AS house_name,
    h.type_id AS house_type_id,
    ht.short_name AS house_type_short_name,
    (SELECT COUNT(*) FROM "House_files" AS f WHERE f.house_id = h.id) AS document_count,
    (SELECT COUNT(*) FROM "Node" AS n WHERE n.house_id = h.id) AS node_count,
    (SELECT COUNT(*) FROM "Hardware" AS hd
        JOIN "Node" AS n ON hd.node_id = n.id
        WHERE n.house_id = h.id) AS hardware_count"#;

/// Joins of the street → house hierarchy with both type tables.
const CANDIDATE_JOINS: &str = r#"
    FROM "Street" AS s
    JOIN "House" AS h ON s.id = h.street_id
    JOIN "Street_type" AS st ON s.type_id = st.id
    JOIN "House_type" AS ht ON h.type_id = ht.id"#;

/// Filter predicate over `CANDIDATE_JOINS`.
///
/// `$1` street contains-pattern, `$2` raw house fragment, `$3` house
/// contains-pattern.
const SUGGESTION_WHERE: &str = r"
    WHERE s.name ILIKE $1
      AND ($2 = '' OR h.name ILIKE $3)";

/// Shared `FROM ... WHERE ...` of the page and count queries.
#[must_use]
pub fn suggestion_from() -> String {
    format!("{CANDIDATE_JOINS}{SUGGESTION_WHERE}")
}

/// Ranking of the page query.
///
/// `$4` is the house prefix-pattern. Tiers: empty fragment 2, exact 0,
/// fragment followed by a non-digit 1, case-insensitive prefix 2, other 3.
/// Names compare under the `C` collation so the order matches byte-wise
/// string comparison.
const SUGGESTION_ORDER: &str = r#"
    ORDER BY
        CASE
            WHEN $2 = '' THEN 2
            WHEN h.name = $2 THEN 0
            WHEN left(h.name, char_length($2)) = $2
                 AND substr(h.name, char_length($2) + 1, 1) ~ '^[^0-9]$' THEN 1
            WHEN h.name ILIKE $4 THEN 2
            ELSE 3
        END,
        char_length(h.name),
        h.name COLLATE "C""#;

/// Escapes `LIKE` metacharacters (`\`, `%`, `_`) so `text` matches
/// literally.
#[must_use]
pub fn escape_like(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// `ILIKE` pattern matching `text` anywhere.
#[must_use]
pub fn contains_pattern(text: &str) -> String {
    format!("%{}%", escape_like(text))
}

/// `ILIKE` pattern matching values that start with `text`.
#[must_use]
pub fn prefix_pattern(text: &str) -> String {
    format!("{}%", escape_like(text))
}

/// Parameters `$1..$3` of [`suggestion_from`].
#[must_use]
pub fn filter_params(filter: &SuggestionFilter) -> Vec<DatabaseValue> {
    vec![
        DatabaseValue::String(contains_pattern(&filter.street_fragment)),
        DatabaseValue::String(filter.house_fragment.clone()),
        DatabaseValue::String(contains_pattern(&filter.house_fragment)),
    ]
}

/// Full SQL of the ranked page query.
#[must_use]
pub fn suggestions_sql() -> String {
    format!(
        "SELECT {CANDIDATE_COLUMNS} {} {SUGGESTION_ORDER} OFFSET $5 LIMIT $6",
        suggestion_from()
    )
}

/// Full SQL of the count query.
#[must_use]
pub fn count_sql() -> String {
    format!("SELECT COUNT(*) AS cnt {}", suggestion_from())
}

/// Parameters `$1..$6` of [`suggestions_sql`].
#[must_use]
pub fn suggestion_params(query: &SuggestionQuery) -> Vec<DatabaseValue> {
    let mut params = filter_params(&query.filter);
    params.push(DatabaseValue::String(prefix_pattern(
        &query.filter.house_fragment,
    )));
    params.push(DatabaseValue::Int64(i64::from(query.offset)));
    params.push(DatabaseValue::Int64(i64::from(query.limit)));
    params
}

/// Fetches one ranked page of suggestion candidates.
///
/// # Errors
///
/// Returns [`DbError`] if the query fails or a row cannot be converted.
pub async fn get_suggestions(
    db: &dyn Database,
    query: &SuggestionQuery,
) -> Result<Vec<SuggestionCandidate>, DbError> {
    let start = Instant::now();
    let rows = db
        .query_raw_params(&suggestions_sql(), &suggestion_params(query))
        .await
        .inspect_err(|e| log::error!("Suggestion page query failed: {e}"))?;

    log::debug!(
        "Suggestion page query returned {} rows in {:.1?} (offset={}, limit={})",
        rows.len(),
        start.elapsed(),
        query.offset,
        query.limit
    );

    rows.iter().map(candidate_from_row).collect()
}

/// Counts every candidate matching `filter`.
///
/// # Errors
///
/// Returns [`DbError`] if the query fails.
pub async fn count_suggestions(
    db: &dyn Database,
    filter: &SuggestionFilter,
) -> Result<u64, DbError> {
    let start = Instant::now();
    let rows = db
        .query_raw_params(&count_sql(), &filter_params(filter))
        .await
        .inspect_err(|e| log::error!("Suggestion count query failed: {e}"))?;

    let row = rows.first().ok_or_else(|| DbError::Conversion {
        message: "Count query returned no rows".to_string(),
    })?;

    let count = count_column(row, "cnt")?;
    log::debug!("Counted {count} suggestions in {:.1?}", start.elapsed());

    Ok(count)
}

/// Looks up one house with its street and resource counts.
///
/// # Errors
///
/// Returns [`DbError`] if the query fails or the row cannot be converted.
pub async fn get_house(
    db: &dyn Database,
    house_id: i32,
) -> Result<Option<SuggestionCandidate>, DbError> {
    let sql = format!("SELECT {CANDIDATE_COLUMNS} {CANDIDATE_JOINS} WHERE h.id = $1");
    let rows = db
        .query_raw_params(&sql, &[DatabaseValue::Int32(house_id)])
        .await?;

    rows.first().map(candidate_from_row).transpose()
}

/// Name of the table holding records of `category`.
#[must_use]
pub const fn type_table(category: TypeCategory) -> &'static str {
    match category {
        TypeCategory::StreetType => "\"Street_type\"",
        TypeCategory::HouseType => "\"House_type\"",
    }
}

/// Fetches every type record of `category`, ordered by id.
///
/// # Errors
///
/// Returns [`DbError`] if the query fails or a row cannot be converted.
pub async fn get_types(
    db: &dyn Database,
    category: TypeCategory,
) -> Result<Vec<AdministrativeTypeToken>, DbError> {
    let sql = format!(
        "SELECT id, name, short_name FROM {} ORDER BY id",
        type_table(category)
    );
    let rows = db.query_raw_params(&sql, &[]).await?;

    let mut tokens = Vec::with_capacity(rows.len());
    for row in &rows {
        tokens.push(AdministrativeTypeToken {
            category,
            id: row.to_value("id").map_err(|e| conversion("id", &e))?,
            name: row.to_value("name").map_err(|e| conversion("name", &e))?,
            short_name: row
                .to_value("short_name")
                .map_err(|e| conversion("short_name", &e))?,
        });
    }

    Ok(tokens)
}

fn candidate_from_row(row: &Row) -> Result<SuggestionCandidate, DbError> {
    Ok(SuggestionCandidate {
        street: StreetRef {
            name: row
                .to_value("street_name")
                .map_err(|e| conversion("street_name", &e))?,
            type_id: row
                .to_value("street_type_id")
                .map_err(|e| conversion("street_type_id", &e))?,
            type_short_name: row
                .to_value("street_type_short_name")
                .map_err(|e| conversion("street_type_short_name", &e))?,
        },
        house: HouseRef {
            id: row
                .to_value("house_id")
                .map_err(|e| conversion("house_id", &e))?,
            name: row
                .to_value("house_name")
                .map_err(|e| conversion("house_name", &e))?,
            type_id: row
                .to_value("house_type_id")
                .map_err(|e| conversion("house_type_id", &e))?,
            type_short_name: row
                .to_value("house_type_short_name")
                .map_err(|e| conversion("house_type_short_name", &e))?,
        },
        resources: ResourceCounts {
            documents: count_column(row, "document_count")?,
            nodes: count_column(row, "node_count")?,
            hardware: count_column(row, "hardware_count")?,
        },
    })
}

fn count_column(row: &Row, column: &str) -> Result<u64, DbError> {
    let count: i64 = row.to_value(column).map_err(|e| conversion(column, &e))?;
    non_negative_count(column, count)
}

/// Converts a `COUNT(*)` value, rejecting negatives as corrupt rows.
///
/// # Errors
///
/// Returns [`DbError::Conversion`] if `count` is negative.
pub fn non_negative_count(column: &str, count: i64) -> Result<u64, DbError> {
    u64::try_from(count).map_err(|_| DbError::Conversion {
        message: format!("Negative {column}: {count}"),
    })
}

fn conversion(column: &str, error: &impl std::fmt::Display) -> DbError {
    DbError::Conversion {
        message: format!("Failed to parse {column}: {error}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn string_param(value: &DatabaseValue) -> &str {
        match value {
            DatabaseValue::String(s) => s,
            other => panic!("expected string parameter, got {other:?}"),
        }
    }

    #[test]
    fn escapes_like_metacharacters() {
        assert_eq!(escape_like("50%_off\\"), "50\\%\\_off\\\\");
        assert_eq!(escape_like("Ленина"), "Ленина");
    }

    #[test]
    fn builds_patterns() {
        assert_eq!(contains_pattern("ленин"), "%ленин%");
        assert_eq!(contains_pattern(""), "%%");
        assert_eq!(prefix_pattern("14а"), "14а%");
    }

    #[test]
    fn page_and_count_share_filter_parameters() {
        let query = SuggestionQuery {
            filter: SuggestionFilter {
                street_fragment: "Ленина".to_string(),
                house_fragment: "14а".to_string(),
            },
            offset: 20,
            limit: 15,
        };

        let page = suggestion_params(&query);
        let count = filter_params(&query.filter);

        assert_eq!(page.len(), 6);
        assert_eq!(count.len(), 3);
        for (a, b) in page.iter().zip(&count) {
            assert_eq!(string_param(a), string_param(b));
        }
        assert_eq!(string_param(&page[0]), "%Ленина%");
        assert_eq!(string_param(&page[1]), "14а");
        assert_eq!(string_param(&page[2]), "%14а%");
        assert_eq!(string_param(&page[3]), "14а%");
        assert!(matches!(page[4], DatabaseValue::Int64(20)));
        assert!(matches!(page[5], DatabaseValue::Int64(15)));
    }

    #[test]
    fn page_and_count_share_predicate() {
        let from = suggestion_from();
        assert!(suggestions_sql().contains(&from));
        assert!(count_sql().contains(&from));
        assert!(suggestions_sql().ends_with("OFFSET $5 LIMIT $6"));
    }

    #[test]
    fn negative_counts_are_conversion_errors() {
        assert_eq!(non_negative_count("node_count", 3).unwrap(), 3);
        assert_eq!(non_negative_count("cnt", 0).unwrap(), 0);

        for column in ["cnt", "document_count", "node_count", "hardware_count"] {
            let err = non_negative_count(column, -1).unwrap_err();
            assert!(matches!(err, DbError::Conversion { .. }));
            assert!(err.to_string().contains(column));
        }
    }

    #[test]
    fn maps_categories_to_tables() {
        assert_eq!(type_table(TypeCategory::StreetType), "\"Street_type\"");
        assert_eq!(type_table(TypeCategory::HouseType), "\"House_type\"");
    }
}
