use async_trait::async_trait;
use seithi_core::{
    Article, ArticlePage, ArticleQuery, ArticleStorage, Error, FeedbackEntry, Result, StatsSummary,
};
use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions, PgRow};
use sqlx::Row;
use tracing::debug;
use crate::{PostgresConfig, StorageBackend};

// The schema belongs to the scoring pipeline. Columns are cast so that
// `real` scores or `timestamp` columns decode the same way. Ids are text and
// compared uncast so lookups stay on the primary key index.
macro_rules! article_columns {
    () => {
        r#"
        id::text AS id, title, url, domain,
        published_at::timestamptz AS published_at,
        epistemic_opinion_score::float8 AS epistemic_opinion_score,
        epistemic_mixed_score::float8 AS epistemic_mixed_score,
        epistemic_facts_score::float8 AS epistemic_facts_score,
        emotive_triggering_score::float8 AS emotive_triggering_score,
        emotive_mixed_score::float8 AS emotive_mixed_score,
        emotive_calm_score::float8 AS emotive_calm_score,
        density_fluff_score::float8 AS density_fluff_score,
        density_standard_score::float8 AS density_standard_score,
        density_deep_score::float8 AS density_deep_score
        "#
    };
}

macro_rules! score_filter {
    () => {
        r#"
        WHERE epistemic_facts_score >= $1
          AND emotive_calm_score >= $2
          AND density_deep_score >= $3
        "#
    };
}

const LIST_ARTICLES: &str = concat!(
    "SELECT ",
    article_columns!(),
    " FROM seithi.articles ",
    score_filter!(),
    " ORDER BY density_deep_score DESC, emotive_calm_score DESC, published_at DESC NULLS LAST",
    " LIMIT $4 OFFSET $5"
);

const COUNT_ARTICLES: &str = concat!("SELECT COUNT(*) FROM seithi.articles ", score_filter!());

const GET_ARTICLE: &str = concat!(
    "SELECT ",
    article_columns!(),
    " FROM seithi.articles WHERE id = $1"
);

const INSERT_FEEDBACK: &str = r#"
    INSERT INTO seithi.feedback_log (article_id, axis, user_score, timestamp)
    VALUES ($1, $2, $3, NOW())
"#;

const GET_STATS: &str = r#"
    SELECT
        COUNT(*) AS total_articles,
        AVG(epistemic_facts_score::float8) AS avg_facts_score,
        AVG(emotive_calm_score::float8) AS avg_calm_score,
        AVG(density_deep_score::float8) AS avg_deep_score
    FROM seithi.articles
"#;

pub struct PostgresStorage {
    pool: PgPool,
}

impl PostgresStorage {
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl StorageBackend for PostgresStorage {
    type Config = PostgresConfig;

    fn get_error_message() -> &'static str {
        "Postgres should be reachable with the configured POSTGRES_* settings"
    }

    async fn connect(config: &PostgresConfig) -> Result<Self> {
        let options = PgConnectOptions::new()
            .host(&config.host)
            .port(config.port)
            .username(&config.user)
            .password(&config.password)
            .database(&config.database);

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .connect_with(options)
            .await
            .map_err(|e| Error::Database(format!("Failed to connect to database: {}", e)))?;

        Ok(Self::from_pool(pool))
    }
}

fn article_from_row(row: &PgRow) -> std::result::Result<Article, sqlx::Error> {
    Ok(Article {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        url: row.try_get("url")?,
        domain: row.try_get("domain")?,
        published_at: row.try_get("published_at")?,
        epistemic_opinion_score: row.try_get("epistemic_opinion_score")?,
        epistemic_mixed_score: row.try_get("epistemic_mixed_score")?,
        epistemic_facts_score: row.try_get("epistemic_facts_score")?,
        emotive_triggering_score: row.try_get("emotive_triggering_score")?,
        emotive_mixed_score: row.try_get("emotive_mixed_score")?,
        emotive_calm_score: row.try_get("emotive_calm_score")?,
        density_fluff_score: row.try_get("density_fluff_score")?,
        density_standard_score: row.try_get("density_standard_score")?,
        density_deep_score: row.try_get("density_deep_score")?,
    })
}

#[async_trait]
impl ArticleStorage for PostgresStorage {
    async fn list_articles(&self, query: &ArticleQuery) -> Result<ArticlePage> {
        let filter = &query.filter;

        let rows = sqlx::query(LIST_ARTICLES)
            .bind(filter.min_facts)
            .bind(filter.min_calm)
            .bind(filter.min_deep)
            .bind(i64::from(query.limit))
            .bind(query.offset)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| Error::Database(format!("Failed to list articles: {}", e)))?;

        let articles = rows
            .iter()
            .map(article_from_row)
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| Error::Database(format!("Failed to decode article: {}", e)))?;

        // Separate statement: the count may drift from the page under
        // concurrent inserts.
        let total: i64 = sqlx::query_scalar(COUNT_ARTICLES)
            .bind(filter.min_facts)
            .bind(filter.min_calm)
            .bind(filter.min_deep)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| Error::Database(format!("Failed to count articles: {}", e)))?;

        Ok(ArticlePage { articles, total })
    }

    async fn get_article(&self, id: &str) -> Result<Article> {
        let row = sqlx::query(GET_ARTICLE)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| Error::Database(format!("Failed to fetch article: {}", e)))?;

        match row {
            Some(row) => article_from_row(&row)
                .map_err(|e| Error::Database(format!("Failed to decode article: {}", e))),
            None => {
                debug!("No article with id {}", id);
                Err(Error::NotFound("Article".to_string()))
            }
        }
    }

    async fn save_feedback(&self, feedback: &FeedbackEntry) -> Result<()> {
        sqlx::query(INSERT_FEEDBACK)
            .bind(&feedback.article_id)
            .bind(&feedback.axis)
            .bind(feedback.user_score)
            .execute(&self.pool)
            .await
            .map_err(|e| Error::Database(format!("Failed to save feedback: {}", e)))?;

        Ok(())
    }

    async fn get_stats(&self) -> Result<StatsSummary> {
        let row = sqlx::query(GET_STATS)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| Error::Database(format!("Failed to fetch stats: {}", e)))?;

        let decode = |e: sqlx::Error| Error::Database(format!("Failed to decode stats: {}", e));
        Ok(StatsSummary {
            total_articles: row.try_get("total_articles").map_err(decode)?,
            avg_facts_score: row.try_get("avg_facts_score").map_err(decode)?,
            avg_calm_score: row.try_get("avg_calm_score").map_err(decode)?,
            avg_deep_score: row.try_get("avg_deep_score").map_err(decode)?,
        })
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}
