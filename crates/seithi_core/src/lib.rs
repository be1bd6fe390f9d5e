pub mod error;
pub mod query;
pub mod storage;
pub mod types;

pub use error::{Error, Result};
pub use query::{rank_articles, ArticleQuery, ScoreFilter, DEFAULT_LIMIT, MAX_LIMIT};
pub use storage::ArticleStorage;
pub use types::{Article, ArticlePage, FeedbackEntry, StatsSummary};
