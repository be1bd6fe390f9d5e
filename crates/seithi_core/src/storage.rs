use async_trait::async_trait;
use crate::query::ArticleQuery;
use crate::types::{Article, ArticlePage, FeedbackEntry, StatsSummary};
use crate::Result;

#[async_trait]
pub trait ArticleStorage: Send + Sync {
    /// List one page of articles matching the query's filter, in ranking
    /// order, together with the total number of matching articles.
    async fn list_articles(&self, query: &ArticleQuery) -> Result<ArticlePage>;

    /// Fetch a single article. Returns `Error::NotFound` when no article has
    /// this id.
    async fn get_article(&self, id: &str) -> Result<Article>;

    /// Append a feedback entry. The store assigns the timestamp.
    async fn save_feedback(&self, feedback: &FeedbackEntry) -> Result<()>;

    async fn get_stats(&self) -> Result<StatsSummary>;

    /// Release pooled connections. Called once at shutdown.
    async fn close(&self) {}
}
