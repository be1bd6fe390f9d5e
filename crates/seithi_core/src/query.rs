//! Filtering, ordering and pagination contract for article listings.
//!
//! SQL backends express the same contract in their statements; the
//! in-memory backend and the tests use the Rust versions below.

use std::cmp::Ordering;

use crate::Article;

pub const DEFAULT_LIMIT: u32 = 20;
pub const MAX_LIMIT: u32 = 100;

/// Minimum score thresholds. A threshold of 0.0 does not filter.
///
/// No range validation is applied: negative or >1 thresholds are passed
/// through to the store as-is.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScoreFilter {
    pub min_facts: f64,
    pub min_calm: f64,
    pub min_deep: f64,
}

impl ScoreFilter {
    pub fn matches(&self, article: &Article) -> bool {
        article.epistemic_facts_score >= self.min_facts
            && article.emotive_calm_score >= self.min_calm
            && article.density_deep_score >= self.min_deep
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArticleQuery {
    pub limit: u32,
    pub offset: i64,
    pub filter: ScoreFilter,
}

impl ArticleQuery {
    /// Builds a query with `limit` normalised: zero means the default page
    /// size and anything above `MAX_LIMIT` is capped. Negative offsets start
    /// from the first row.
    pub fn new(limit: u32, offset: i64, filter: ScoreFilter) -> Self {
        let limit = match limit {
            0 => DEFAULT_LIMIT,
            l => l.min(MAX_LIMIT),
        };
        Self {
            limit,
            offset: offset.max(0),
            filter,
        }
    }
}

impl Default for ArticleQuery {
    fn default() -> Self {
        Self::new(DEFAULT_LIMIT, 0, ScoreFilter::default())
    }
}

/// Listing order: deep score descending, then calm score descending, then
/// newest publication first with undated articles last.
pub fn rank_articles(a: &Article, b: &Article) -> Ordering {
    b.density_deep_score
        .total_cmp(&a.density_deep_score)
        .then_with(|| b.emotive_calm_score.total_cmp(&a.emotive_calm_score))
        .then_with(|| match (&a.published_at, &b.published_at) {
            (Some(a), Some(b)) => b.cmp(a),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn article(id: &str, facts: f64, calm: f64, deep: f64, day: Option<u32>) -> Article {
        Article {
            id: id.to_string(),
            title: format!("Article {}", id),
            url: format!("https://example.com/{}", id),
            domain: "example.com".to_string(),
            published_at: day.map(|d| Utc.with_ymd_and_hms(2024, 3, d, 12, 0, 0).unwrap()),
            epistemic_opinion_score: 0.0,
            epistemic_mixed_score: 0.0,
            epistemic_facts_score: facts,
            emotive_triggering_score: 0.0,
            emotive_mixed_score: 0.0,
            emotive_calm_score: calm,
            density_fluff_score: 0.0,
            density_standard_score: 0.0,
            density_deep_score: deep,
        }
    }

    #[test]
    fn test_limit_defaults_and_caps() {
        assert_eq!(ArticleQuery::new(0, 0, ScoreFilter::default()).limit, DEFAULT_LIMIT);
        assert_eq!(ArticleQuery::new(500, 0, ScoreFilter::default()).limit, MAX_LIMIT);
        assert_eq!(ArticleQuery::new(100, 0, ScoreFilter::default()).limit, 100);
        assert_eq!(ArticleQuery::new(7, 3, ScoreFilter::default()).limit, 7);
        assert_eq!(ArticleQuery::default().offset, 0);
    }

    #[test]
    fn test_offset_is_never_negative() {
        assert_eq!(ArticleQuery::new(10, -7, ScoreFilter::default()).offset, 0);
        assert_eq!(
            ArticleQuery::new(10, 5_000_000_000, ScoreFilter::default()).offset,
            5_000_000_000
        );
    }

    #[test]
    fn test_filter_is_inclusive() {
        let filter = ScoreFilter { min_facts: 0.5, min_calm: 0.5, min_deep: 0.5 };
        assert!(filter.matches(&article("a", 0.5, 0.5, 0.5, None)));
        assert!(!filter.matches(&article("b", 0.49, 0.9, 0.9, None)));
        assert!(!filter.matches(&article("c", 0.9, 0.49, 0.9, None)));
        assert!(!filter.matches(&article("d", 0.9, 0.9, 0.49, None)));
    }

    #[test]
    fn test_default_filter_matches_everything() {
        assert!(ScoreFilter::default().matches(&article("a", 0.0, 0.0, 0.0, None)));
    }

    #[test]
    fn test_rank_orders_by_deep_then_calm_then_newest() {
        let mut articles = vec![
            article("low-deep", 0.0, 0.9, 0.1, Some(20)),
            article("undated", 0.0, 0.5, 0.8, None),
            article("older", 0.0, 0.5, 0.8, Some(1)),
            article("newer", 0.0, 0.5, 0.8, Some(2)),
            article("calmer", 0.0, 0.6, 0.8, Some(1)),
            article("deepest", 0.0, 0.1, 0.9, None),
        ];
        articles.sort_by(rank_articles);
        let ids: Vec<_> = articles.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, ["deepest", "calmer", "newer", "older", "undated", "low-deep"]);
    }
}
