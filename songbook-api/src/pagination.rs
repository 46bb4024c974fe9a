//! Pagination options for song listing
//!
//! LIMIT is always applied; OFFSET only when the caller supplies one. The
//! page token is accepted and validated as an integer but is not translated
//! into an offset.

use songbook_common::{Error, Result};

/// Page size when the request names none
pub const DEFAULT_LIMIT: i64 = 10;

/// Largest page a single request may ask for
pub const MAX_LIMIT: i64 = 100;

/// Validated pagination parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    /// Rows per page, within [1, MAX_LIMIT]
    pub limit: i64,
    /// Rows to skip
    pub offset: Option<i64>,
    /// Opaque cursor, only consulted when no offset is given
    pub page_token: Option<i64>,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            offset: None,
            page_token: None,
        }
    }
}

impl Pagination {
    /// Build pagination from raw query-string values
    ///
    /// Empty strings count as absent. The limit is clamped into
    /// `[1, MAX_LIMIT]`; a negative offset is rejected.
    ///
    /// # Examples
    /// ```
    /// use songbook_api::pagination::Pagination;
    ///
    /// let p = Pagination::parse(None, Some("20"), None).unwrap();
    /// assert_eq!(p.limit, 10);
    /// assert_eq!(p.offset, Some(20));
    ///
    /// // Oversized pages get clamped
    /// let p = Pagination::parse(Some("5000"), None, None).unwrap();
    /// assert_eq!(p.limit, 100);
    /// ```
    pub fn parse(
        limit: Option<&str>,
        offset: Option<&str>,
        page_token: Option<&str>,
    ) -> Result<Self> {
        let limit = parse_int("limit", limit)?
            .unwrap_or(DEFAULT_LIMIT)
            .clamp(1, MAX_LIMIT);

        let offset = parse_int("offset", offset)?;
        if let Some(o) = offset {
            if o < 0 {
                return Err(Error::InvalidInput(format!(
                    "offset must not be negative, got {}",
                    o
                )));
            }
        }

        let page_token = parse_int("page_token", page_token)?;

        Ok(Self {
            limit,
            offset,
            page_token,
        })
    }
}

fn parse_int(name: &str, raw: Option<&str>) -> Result<Option<i64>> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => s
            .parse::<i64>()
            .map(Some)
            .map_err(|_| Error::InvalidInput(format!("{} must be an integer, got '{}'", name, s))),
    }
}
