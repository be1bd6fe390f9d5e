//! Query-string handling for the article listing.
//!
//! Numeric parameters are parsed leniently: anything that does not parse is
//! treated exactly as if it had been left out. No request is ever rejected
//! because of a bad number.

use std::str::FromStr;
use seithi_core::{ArticleQuery, ScoreFilter, DEFAULT_LIMIT, MAX_LIMIT};

/// Parse `raw` as `T`, falling back to `default` when the value is absent or
/// unparsable. Surrounding whitespace makes a value unparsable.
pub fn parse_or_default<T: FromStr>(raw: Option<&str>, default: T) -> T {
    raw.and_then(|value| value.parse().ok())
        .unwrap_or(default)
}

fn is_integer(value: &str) -> bool {
    let digits = value.strip_prefix(['+', '-']).unwrap_or(value);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

/// Integer parameters saturate at the `i64` bounds instead of falling back
/// when a well-formed integer is too large to represent.
fn parse_count(raw: Option<&str>, default: i64) -> i64 {
    let saturated = raw
        .filter(|value| is_integer(value))
        .map(|value| if value.starts_with('-') { i64::MIN } else { i64::MAX });
    parse_or_default(raw, saturated.unwrap_or(default))
}

/// Score thresholds additionally fall back when the value parses to NaN or
/// infinity, which no score can be compared against meaningfully.
fn parse_threshold(raw: Option<&str>) -> f64 {
    let value = parse_or_default(raw, 0.0_f64);
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

/// Raw listing parameters as they appear in the query string.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ListParams<'a> {
    pub limit: Option<&'a str>,
    pub offset: Option<&'a str>,
    pub min_facts: Option<&'a str>,
    pub min_calm: Option<&'a str>,
    pub min_deep: Option<&'a str>,
}

impl<'a> ListParams<'a> {
    /// Collect parameters from decoded query pairs. When a key repeats, the
    /// first occurrence wins.
    pub fn from_pairs(pairs: &'a [(String, String)]) -> Self {
        let first = |key: &str| {
            pairs
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.as_str())
        };
        Self {
            limit: first("limit"),
            offset: first("offset"),
            min_facts: first("min_facts"),
            min_calm: first("min_calm"),
            min_deep: first("min_deep"),
        }
    }

    /// A limit of zero or below takes the default page size, one above
    /// `MAX_LIMIT` is capped. A negative offset starts from the first row.
    pub fn into_query(self) -> ArticleQuery {
        let filter = ScoreFilter {
            min_facts: parse_threshold(self.min_facts),
            min_calm: parse_threshold(self.min_calm),
            min_deep: parse_threshold(self.min_deep),
        };
        let limit = parse_count(self.limit, i64::from(DEFAULT_LIMIT))
            .clamp(0, i64::from(MAX_LIMIT));
        ArticleQuery::new(
            u32::try_from(limit).unwrap_or(MAX_LIMIT),
            parse_count(self.offset, 0),
            filter,
        )
    }
}
