//! Couplet extraction from lyric text
//!
//! Couplets are separated by a blank line, i.e. a literal `"\n\n"` in the
//! stored text. `"\r\n"` line endings are read as `"\n"`. Longer runs of
//! blank lines count as one separator and never yield empty couplets.
//! Indexing is 0-based and an absent index means the first couplet.

use std::borrow::Cow;

use songbook_common::{Error, Result};

/// Separator between couplets
pub const COUPLET_DELIMITER: &str = "\n\n";

/// Couplet index used when the request names none
pub const DEFAULT_COUPLET: usize = 0;

fn normalize(text: &str) -> Cow<'_, str> {
    if text.contains('\r') {
        Cow::Owned(text.replace("\r\n", "\n"))
    } else {
        Cow::Borrowed(text)
    }
}

/// Split lyric text into its couplets, in order. Empty text has none.
pub fn split_couplets(text: &str) -> Vec<String> {
    normalize(text)
        .split(COUPLET_DELIMITER)
        .map(|c| c.trim_matches('\n'))
        .filter(|c| !c.is_empty())
        .map(str::to_string)
        .collect()
}

/// Resolve couplet `index` (0-based) of `text`
///
/// # Examples
///
/// ```
/// use songbook_api::couplet::couplet;
///
/// assert_eq!(couplet("A\n\nB\n\nC", 1).unwrap(), "B");
/// assert!(couplet("A\n\nB\n\nC", 3).is_err());
/// ```
pub fn couplet(text: &str, index: usize) -> Result<String> {
    let mut couplets = split_couplets(text);
    let count = couplets.len();
    if index >= count {
        return Err(Error::IndexOutOfRange { index, count });
    }
    Ok(couplets.swap_remove(index))
}

/// Parse the optional `couplet_id` query value
pub fn parse_couplet_index(raw: Option<&str>) -> Result<usize> {
    match raw.map(str::trim) {
        None | Some("") => Ok(DEFAULT_COUPLET),
        Some(s) => s.parse::<usize>().map_err(|_| {
            Error::InvalidInput(format!(
                "couplet_id must be a non-negative integer, got '{}'",
                s
            ))
        }),
    }
}
