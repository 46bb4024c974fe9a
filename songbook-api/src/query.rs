//! List query construction
//!
//! Turns filter / sort / pagination options into a parameterized SELECT.
//! Only whitelisted column names and fixed keywords ever reach the SQL
//! text; every caller-supplied value is a bound `?` argument.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use songbook_common::db::SONG_COLUMNS;
use songbook_common::release_date::parse_release_date;
use songbook_common::{Error, Result};
use tracing::debug;

use crate::pagination::Pagination;

/// Sort field when the request names none
pub const DEFAULT_SORT_FIELD: &str = "id";

/// Sort order when the request names none
pub const DEFAULT_SORT_ORDER: &str = "desc";

/// API-facing song fields and their physical columns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SongField {
    Id,
    Song,
    Group,
    Release,
    Text,
    Link,
}

impl SongField {
    /// Fields accepted as filter keys
    pub const FILTERABLE: [SongField; 5] = [
        SongField::Song,
        SongField::Group,
        SongField::Release,
        SongField::Text,
        SongField::Link,
    ];

    /// Query-string key for this field
    pub fn key(self) -> &'static str {
        match self {
            SongField::Id => "id",
            SongField::Song => "song",
            SongField::Group => "group",
            SongField::Release => "release",
            SongField::Text => "text",
            SongField::Link => "link",
        }
    }

    /// Column name in the `songs` table
    pub fn column(self) -> &'static str {
        match self {
            SongField::Id => "id",
            SongField::Song => "song_name",
            SongField::Group => "artist_name",
            SongField::Release => "release_date",
            SongField::Text => "song_text",
            SongField::Link => "link",
        }
    }

    fn from_key(key: &str) -> Option<Self> {
        match key {
            "id" => Some(SongField::Id),
            "song" => Some(SongField::Song),
            "group" => Some(SongField::Group),
            "release" => Some(SongField::Release),
            "text" => Some(SongField::Text),
            "link" => Some(SongField::Link),
            _ => None,
        }
    }

    /// Resolve a filter key; `id` is not filterable
    pub fn filterable(key: &str) -> Result<Self> {
        Self::from_key(key)
            .filter(|f| Self::FILTERABLE.contains(f))
            .ok_or_else(|| Error::InvalidFilterField(key.to_string()))
    }

    /// Resolve a sort key; the filterable fields plus `id`
    pub fn sortable(key: &str) -> Result<Self> {
        Self::from_key(key).ok_or_else(|| Error::InvalidSortField(key.to_string()))
    }
}

/// Comparison selected by a predicate's `op:` prefix
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Eq,
    Nq,
    Gt,
    Gte,
    Lt,
    Lte,
    Like,
    ILike,
}

impl Operator {
    fn parse(field: &str, prefix: &str) -> Result<Self> {
        match prefix {
            "eq" => Ok(Operator::Eq),
            "nq" => Ok(Operator::Nq),
            "gt" => Ok(Operator::Gt),
            "gte" => Ok(Operator::Gte),
            "lt" => Ok(Operator::Lt),
            "lte" => Ok(Operator::Lte),
            "like" => Ok(Operator::Like),
            "ilike" => Ok(Operator::ILike),
            other => Err(Error::UnknownFilterOperator {
                field: field.to_string(),
                operator: other.to_string(),
            }),
        }
    }

    fn is_pattern(self) -> bool {
        matches!(self, Operator::Like | Operator::ILike)
    }

    /// SQL fragment comparing `column` against one bound argument
    fn clause(self, column: &str) -> String {
        match self {
            Operator::Eq => format!("{} = ?", column),
            Operator::Nq => format!("{} <> ?", column),
            Operator::Gt => format!("{} > ?", column),
            Operator::Gte => format!("{} >= ?", column),
            Operator::Lt => format!("{} < ?", column),
            Operator::Lte => format!("{} <= ?", column),
            Operator::Like => format!("{} LIKE ?", column),
            Operator::ILike => format!("LOWER({}) LIKE LOWER(?)", column),
        }
    }
}

/// Parsed `value` or `op:value` predicate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Predicate {
    pub op: Operator,
    pub value: String,
}

impl Predicate {
    /// Parse a predicate string for `field`
    ///
    /// No colon means equality; one colon selects an operator; more than
    /// one colon is rejected.
    pub fn parse(field: &str, raw: &str) -> Result<Self> {
        let parts: Vec<&str> = raw.split(':').collect();
        match parts.as_slice() {
            [value] => Ok(Self {
                op: Operator::Eq,
                value: value.to_string(),
            }),
            [prefix, value] => Ok(Self {
                op: Operator::parse(field, prefix)?,
                value: value.to_string(),
            }),
            _ => Err(Error::InvalidPredicateFormat {
                field: field.to_string(),
                predicate: raw.to_string(),
            }),
        }
    }
}

/// Requested ordering, as supplied by the caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortOptions {
    pub field: String,
    pub order: String,
}

impl Default for SortOptions {
    fn default() -> Self {
        Self {
            field: DEFAULT_SORT_FIELD.to_string(),
            order: DEFAULT_SORT_ORDER.to_string(),
        }
    }
}

/// Everything a list request can ask for
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListOptions {
    /// Filter key to predicate string, ordered by key
    pub filters: BTreeMap<String, String>,
    pub sort: SortOptions,
    pub pagination: Pagination,
}

/// Positional argument for a built query
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SqlArg {
    Text(String),
    Date(NaiveDate),
    Int(i64),
}

/// SQL text plus its positional arguments, in placeholder order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuery {
    pub sql: String,
    pub args: Vec<SqlArg>,
}

/// Build the list SELECT for `options`
pub fn build_list_query(options: &ListOptions) -> Result<ListQuery> {
    let mut sql = format!("SELECT {} FROM songs", SONG_COLUMNS);
    let mut args = Vec::new();
    let mut clauses = Vec::new();

    for (key, raw) in &options.filters {
        let field = SongField::filterable(key)?;
        let predicate = Predicate::parse(key, raw)?;

        clauses.push(predicate.op.clause(field.column()));
        args.push(filter_arg(field, &predicate)?);
    }

    if !clauses.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&clauses.join(" AND "));
    }

    let sort_field = SongField::sortable(&options.sort.field)?;
    let direction = match options.sort.order.to_ascii_lowercase().as_str() {
        "asc" => "ASC",
        "desc" => "DESC",
        other => {
            return Err(Error::InvalidInput(format!(
                "sort_order must be asc or desc, got '{}'",
                other
            )))
        }
    };
    sql.push_str(&format!(" ORDER BY {} {}", sort_field.column(), direction));
    if sort_field != SongField::Id {
        // Stable pages when the sort column has duplicates
        sql.push_str(", id ASC");
    }

    sql.push_str(" LIMIT ?");
    args.push(SqlArg::Int(options.pagination.limit));

    match (options.pagination.offset, options.pagination.page_token) {
        (Some(offset), _) => {
            sql.push_str(" OFFSET ?");
            args.push(SqlArg::Int(offset));
        }
        (None, Some(token)) => {
            debug!(page_token = token, "Page token accepted but not translated to an offset");
        }
        (None, None) => {}
    }

    Ok(ListQuery { sql, args })
}

/// Bound value for one filter; release comparisons bind a date
fn filter_arg(field: SongField, predicate: &Predicate) -> Result<SqlArg> {
    if field == SongField::Release && !predicate.op.is_pattern() {
        return Ok(SqlArg::Date(parse_release_date(&predicate.value)?));
    }
    Ok(SqlArg::Text(predicate.value.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(filters: &[(&str, &str)]) -> ListOptions {
        ListOptions {
            filters: filters
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            ..Default::default()
        }
    }

    const SELECT: &str =
        "SELECT id, song_name, artist_name, release_date, song_text, link FROM songs";

    #[test]
    fn test_no_filters_uses_defaults() {
        let q = build_list_query(&ListOptions::default()).unwrap();
        assert_eq!(q.sql, format!("{} ORDER BY id DESC LIMIT ?", SELECT));
        assert_eq!(q.args, vec![SqlArg::Int(10)]);
    }

    #[test]
    fn test_bare_value_is_equality() {
        let q = build_list_query(&options(&[("group", "Muse")])).unwrap();
        assert_eq!(
            q.sql,
            format!("{} WHERE artist_name = ? ORDER BY id DESC LIMIT ?", SELECT)
        );
        assert_eq!(q.args[0], SqlArg::Text("Muse".to_string()));
    }

    #[test]
    fn test_operators_map_to_sql() {
        let cases = [
            ("eq:x", "song_name = ?"),
            ("nq:x", "song_name <> ?"),
            ("gt:x", "song_name > ?"),
            ("gte:x", "song_name >= ?"),
            ("lt:x", "song_name < ?"),
            ("lte:x", "song_name <= ?"),
            ("like:x%", "song_name LIKE ?"),
            ("ilike:x%", "LOWER(song_name) LIKE LOWER(?)"),
        ];
        for (predicate, clause) in cases {
            let q = build_list_query(&options(&[("song", predicate)])).unwrap();
            assert!(
                q.sql.contains(&format!("WHERE {} ORDER BY", clause)),
                "{} -> {}",
                predicate,
                q.sql
            );
        }
    }

    #[test]
    fn test_clauses_are_anded_in_key_order() {
        let q = build_list_query(&options(&[("song", "like:S%"), ("group", "Muse")])).unwrap();
        assert_eq!(
            q.sql,
            format!(
                "{} WHERE artist_name = ? AND song_name LIKE ? ORDER BY id DESC LIMIT ?",
                SELECT
            )
        );
        assert_eq!(
            q.args,
            vec![
                SqlArg::Text("Muse".to_string()),
                SqlArg::Text("S%".to_string()),
                SqlArg::Int(10),
            ]
        );
    }

    #[test]
    fn test_unknown_filter_field() {
        let err = build_list_query(&options(&[("rating", "5")])).unwrap_err();
        assert!(matches!(err, Error::InvalidFilterField(ref f) if f == "rating"));
    }

    #[test]
    fn test_id_is_not_filterable() {
        let err = build_list_query(&options(&[("id", "abc")])).unwrap_err();
        assert!(matches!(err, Error::InvalidFilterField(_)));
    }

    #[test]
    fn test_too_many_colons() {
        let err = build_list_query(&options(&[("link", "eq:https://example.org")])).unwrap_err();
        assert!(matches!(err, Error::InvalidPredicateFormat { .. }));
    }

    #[test]
    fn test_unknown_operator_is_rejected() {
        let err = build_list_query(&options(&[("song", "between:a")])).unwrap_err();
        assert!(matches!(
            err,
            Error::UnknownFilterOperator { ref operator, .. } if operator == "between"
        ));
        assert!(err.is_validation());
    }

    #[test]
    fn test_release_comparison_binds_date() {
        let q = build_list_query(&options(&[("release", "gte:01.01.2000")])).unwrap();
        assert!(q.sql.contains("release_date >= ?"));
        assert_eq!(
            q.args[0],
            SqlArg::Date(NaiveDate::from_ymd_opt(2000, 1, 1).unwrap())
        );
    }

    #[test]
    fn test_release_pattern_binds_text() {
        let q = build_list_query(&options(&[("release", "like:2006-%")])).unwrap();
        assert_eq!(q.args[0], SqlArg::Text("2006-%".to_string()));
    }

    #[test]
    fn test_malformed_release_value() {
        let err = build_list_query(&options(&[("release", "2006")])).unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[test]
    fn test_sort_field_and_order() {
        let opts = ListOptions {
            sort: SortOptions {
                field: "release".to_string(),
                order: "ASC".to_string(),
            },
            ..Default::default()
        };
        let q = build_list_query(&opts).unwrap();
        assert!(q.sql.ends_with("ORDER BY release_date ASC, id ASC LIMIT ?"));
    }

    #[test]
    fn test_invalid_sort_field() {
        let opts = ListOptions {
            sort: SortOptions {
                field: "rating".to_string(),
                order: "asc".to_string(),
            },
            ..Default::default()
        };
        assert!(matches!(
            build_list_query(&opts),
            Err(Error::InvalidSortField(_))
        ));
    }

    #[test]
    fn test_invalid_sort_order() {
        let opts = ListOptions {
            sort: SortOptions {
                field: "song".to_string(),
                order: "sideways".to_string(),
            },
            ..Default::default()
        };
        assert!(build_list_query(&opts).unwrap_err().is_validation());
    }

    #[test]
    fn test_offset_applied() {
        let opts = ListOptions {
            pagination: Pagination {
                limit: 5,
                offset: Some(15),
                page_token: Some(2),
            },
            ..Default::default()
        };
        let q = build_list_query(&opts).unwrap();
        assert!(q.sql.ends_with("LIMIT ? OFFSET ?"));
        assert_eq!(q.args, vec![SqlArg::Int(5), SqlArg::Int(15)]);
    }

    #[test]
    fn test_page_token_alone_adds_no_offset() {
        let opts = ListOptions {
            pagination: Pagination {
                limit: 10,
                offset: None,
                page_token: Some(4),
            },
            ..Default::default()
        };
        let q = build_list_query(&opts).unwrap();
        assert!(q.sql.ends_with("LIMIT ?"));
        assert_eq!(q.args, vec![SqlArg::Int(10)]);
    }

    #[test]
    fn test_values_never_reach_sql_text() {
        let q = build_list_query(&options(&[("song", "x'; DROP TABLE songs; --")])).unwrap();
        assert!(!q.sql.contains("DROP"));
        assert_eq!(q.args[0], SqlArg::Text("x'; DROP TABLE songs; --".to_string()));
    }
}
