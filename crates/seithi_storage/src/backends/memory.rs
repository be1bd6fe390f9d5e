use async_trait::async_trait;
use chrono::{DateTime, Utc};
use seithi_core::{
    rank_articles, Article, ArticlePage, ArticleQuery, ArticleStorage, Error, FeedbackEntry,
    Result, StatsSummary,
};
use tokio::sync::RwLock;
use crate::StorageBackend;

/// A feedback entry as the store recorded it.
#[derive(Debug, Clone)]
pub struct StoredFeedback {
    pub entry: FeedbackEntry,
    pub timestamp: DateTime<Utc>,
}

/// Fixture store holding a fixed article set in process memory.
///
/// Articles are supplied up front and never modified; feedback is appended
/// to an in-memory log.
#[derive(Default)]
pub struct InMemoryStorage {
    articles: RwLock<Vec<Article>>,
    feedback: RwLock<Vec<StoredFeedback>>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_articles(articles: Vec<Article>) -> Self {
        Self {
            articles: RwLock::new(articles),
            feedback: RwLock::new(Vec::new()),
        }
    }

    pub async fn feedback_log(&self) -> Vec<StoredFeedback> {
        self.feedback.read().await.clone()
    }
}

#[async_trait]
impl StorageBackend for InMemoryStorage {
    type Config = ();

    fn get_error_message() -> &'static str {
        "Memory storage should be available"
    }

    async fn connect(_config: &()) -> Result<Self> {
        Ok(Self::new())
    }
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values.fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    (count > 0).then(|| sum / count as f64)
}

#[async_trait]
impl ArticleStorage for InMemoryStorage {
    async fn list_articles(&self, query: &ArticleQuery) -> Result<ArticlePage> {
        let articles = self.articles.read().await;
        let mut matching: Vec<&Article> = articles
            .iter()
            .filter(|a| query.filter.matches(a))
            .collect();
        let total = matching.len() as i64;

        matching.sort_by(|a, b| rank_articles(a, b));
        let page = matching
            .into_iter()
            .skip(usize::try_from(query.offset).unwrap_or(usize::MAX))
            .take(query.limit as usize)
            .cloned()
            .collect();

        Ok(ArticlePage { articles: page, total })
    }

    async fn get_article(&self, id: &str) -> Result<Article> {
        self.articles
            .read()
            .await
            .iter()
            .find(|a| a.id == id)
            .cloned()
            .ok_or_else(|| Error::NotFound("Article".to_string()))
    }

    async fn save_feedback(&self, feedback: &FeedbackEntry) -> Result<()> {
        self.feedback.write().await.push(StoredFeedback {
            entry: feedback.clone(),
            timestamp: Utc::now(),
        });
        Ok(())
    }

    async fn get_stats(&self) -> Result<StatsSummary> {
        let articles = self.articles.read().await;
        Ok(StatsSummary {
            total_articles: articles.len() as i64,
            avg_facts_score: mean(articles.iter().map(|a| a.epistemic_facts_score)),
            avg_calm_score: mean(articles.iter().map(|a| a.emotive_calm_score)),
            avg_deep_score: mean(articles.iter().map(|a| a.density_deep_score)),
        })
    }
}
