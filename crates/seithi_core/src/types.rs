use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// A news article together with the nine scores assigned by the scoring
/// pipeline. Scores are read-only from this crate's point of view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    pub id: String,
    pub title: String,
    pub url: String,
    pub domain: String,
    pub published_at: Option<DateTime<Utc>>,

    pub epistemic_opinion_score: f64,
    pub epistemic_mixed_score: f64,
    pub epistemic_facts_score: f64,

    pub emotive_triggering_score: f64,
    pub emotive_mixed_score: f64,
    pub emotive_calm_score: f64,

    pub density_fluff_score: f64,
    pub density_standard_score: f64,
    pub density_deep_score: f64,
}

/// One page of a filtered listing plus the number of rows matching the
/// filter. The two come from separate queries, so under concurrent writes
/// `total` may not agree exactly with the page.
#[derive(Debug, Clone, Default)]
pub struct ArticlePage {
    pub articles: Vec<Article>,
    pub total: i64,
}

/// A user's correction signal for one axis of one article.
///
/// The timestamp is not part of the entry: the store assigns it on insert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackEntry {
    #[serde(default)]
    pub article_id: String,
    #[serde(default)]
    pub axis: String,
    pub user_score: i64,
}

impl FeedbackEntry {
    pub const MIN_SCORE: i64 = 0;
    pub const MAX_SCORE: i64 = 2;

    pub fn validate(&self) -> Result<()> {
        if self.article_id.trim().is_empty() || self.axis.trim().is_empty() {
            return Err(Error::Validation("Missing required fields".to_string()));
        }
        if !(Self::MIN_SCORE..=Self::MAX_SCORE).contains(&self.user_score) {
            return Err(Error::Validation("user_score must be 0, 1, or 2".to_string()));
        }
        Ok(())
    }
}

/// Aggregate view over the whole article set.
///
/// Averages are `None` when there are no articles, since the mean of zero
/// rows is undefined. They serialize as `null`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StatsSummary {
    pub total_articles: i64,
    pub avg_facts_score: Option<f64>,
    pub avg_calm_score: Option<f64>,
    pub avg_deep_score: Option<f64>,
}
