use async_trait::async_trait;
use seithi_core::{
    Article, ArticlePage, ArticleQuery, ArticleStorage, Error, FeedbackEntry, Result, StatsSummary,
};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;
use std::path::{Path, PathBuf};
use crate::{SqliteConfig, StorageBackend};

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS articles (
        id TEXT PRIMARY KEY,
        title TEXT NOT NULL,
        url TEXT NOT NULL UNIQUE,
        domain TEXT NOT NULL,
        published_at TEXT,
        epistemic_opinion_score REAL NOT NULL DEFAULT 0,
        epistemic_mixed_score REAL NOT NULL DEFAULT 0,
        epistemic_facts_score REAL NOT NULL DEFAULT 0,
        emotive_triggering_score REAL NOT NULL DEFAULT 0,
        emotive_mixed_score REAL NOT NULL DEFAULT 0,
        emotive_calm_score REAL NOT NULL DEFAULT 0,
        density_fluff_score REAL NOT NULL DEFAULT 0,
        density_standard_score REAL NOT NULL DEFAULT 0,
        density_deep_score REAL NOT NULL DEFAULT 0
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS feedback_log (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        article_id TEXT NOT NULL,
        axis TEXT NOT NULL,
        user_score INTEGER NOT NULL,
        timestamp TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
    )
    "#,
];

const ARTICLE_COLUMNS: &str = r#"
    id, title, url, domain, published_at,
    epistemic_opinion_score, epistemic_mixed_score, epistemic_facts_score,
    emotive_triggering_score, emotive_mixed_score, emotive_calm_score,
    density_fluff_score, density_standard_score, density_deep_score
"#;

const SCORE_FILTER: &str = r#"
    WHERE epistemic_facts_score >= ?1
      AND emotive_calm_score >= ?2
      AND density_deep_score >= ?3
"#;

pub struct SQLiteStorage {
    pool: SqlitePool,
    db_path: PathBuf,
}

#[async_trait]
impl StorageBackend for SQLiteStorage {
    type Config = SqliteConfig;

    fn get_error_message() -> &'static str {
        "SQLite database path should be writable"
    }

    async fn connect(config: &SqliteConfig) -> Result<Self> {
        Self::new_with_path(&config.path, config.max_connections).await
    }
}

impl SQLiteStorage {
    pub async fn new_with_path(db_path: &Path, max_connections: u32) -> Result<Self> {
        if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let options = SqliteConnectOptions::new()
            .filename(db_path)
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await
            .map_err(|e| Error::Database(format!("Failed to connect to database: {}", e)))?;

        for (i, statement) in SCHEMA.iter().enumerate() {
            sqlx::query(statement)
                .execute(&pool)
                .await
                .map_err(|e| Error::Database(format!("Failed to create table {}: {}", i, e)))?;
        }

        Ok(Self {
            pool,
            db_path: db_path.to_path_buf(),
        })
    }

    pub fn get_db_path(&self) -> &Path {
        &self.db_path
    }
}

fn article_from_row(row: &SqliteRow) -> std::result::Result<Article, sqlx::Error> {
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
impl ArticleStorage for SQLiteStorage {
    async fn list_articles(&self, query: &ArticleQuery) -> Result<ArticlePage> {
        let filter = &query.filter;

        let sql = format!(
            "SELECT {} FROM articles {} \
             ORDER BY density_deep_score DESC, emotive_calm_score DESC, published_at DESC NULLS LAST \
             LIMIT ?4 OFFSET ?5",
            ARTICLE_COLUMNS, SCORE_FILTER
        );
        let rows = sqlx::query(&sql)
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

        let sql = format!("SELECT COUNT(*) FROM articles {}", SCORE_FILTER);
        let total: i64 = sqlx::query_scalar(&sql)
            .bind(filter.min_facts)
            .bind(filter.min_calm)
            .bind(filter.min_deep)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| Error::Database(format!("Failed to count articles: {}", e)))?;

        Ok(ArticlePage { articles, total })
    }

    async fn get_article(&self, id: &str) -> Result<Article> {
        let sql = format!("SELECT {} FROM articles WHERE id = ?1", ARTICLE_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| Error::Database(format!("Failed to fetch article: {}", e)))?
            .ok_or_else(|| Error::NotFound("Article".to_string()))?;

        article_from_row(&row)
            .map_err(|e| Error::Database(format!("Failed to decode article: {}", e)))
    }

    async fn save_feedback(&self, feedback: &FeedbackEntry) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO feedback_log (article_id, axis, user_score, timestamp)
            VALUES (?1, ?2, ?3, CURRENT_TIMESTAMP)
            "#,
        )
        .bind(&feedback.article_id)
        .bind(&feedback.axis)
        .bind(feedback.user_score)
        .execute(&self.pool)
        .await
        .map_err(|e| Error::Database(format!("Failed to save feedback: {}", e)))?;

        Ok(())
    }

    async fn get_stats(&self) -> Result<StatsSummary> {
        let row = sqlx::query(
            r#"
            SELECT
                COUNT(*) AS total_articles,
                AVG(epistemic_facts_score) AS avg_facts_score,
                AVG(emotive_calm_score) AS avg_calm_score,
                AVG(density_deep_score) AS avg_deep_score
            FROM articles
            "#,
        )
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

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};
    use seithi_core::{rank_articles, ScoreFilter};
    use tempfile::{tempdir, TempDir};

    fn article(id: &str, facts: f64, calm: f64, deep: f64, published_at: Option<DateTime<Utc>>) -> Article {
        Article {
            id: id.to_string(),
            title: format!("Article {}", id),
            url: format!("https://example.com/{}", id),
            domain: "example.com".to_string(),
            published_at,
            epistemic_opinion_score: 1.0 - facts,
            epistemic_mixed_score: 0.0,
            epistemic_facts_score: facts,
            emotive_triggering_score: 1.0 - calm,
            emotive_mixed_score: 0.0,
            emotive_calm_score: calm,
            density_fluff_score: 1.0 - deep,
            density_standard_score: 0.0,
            density_deep_score: deep,
        }
    }

    async fn insert(storage: &SQLiteStorage, a: &Article) {
        sqlx::query(&format!(
            "INSERT INTO articles ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
            ARTICLE_COLUMNS
        ))
        .bind(&a.id)
        .bind(&a.title)
        .bind(&a.url)
        .bind(&a.domain)
        .bind(a.published_at)
        .bind(a.epistemic_opinion_score)
        .bind(a.epistemic_mixed_score)
        .bind(a.epistemic_facts_score)
        .bind(a.emotive_triggering_score)
        .bind(a.emotive_mixed_score)
        .bind(a.emotive_calm_score)
        .bind(a.density_fluff_score)
        .bind(a.density_standard_score)
        .bind(a.density_deep_score)
        .execute(&storage.pool)
        .await
        .unwrap();
    }

    async fn seeded() -> (TempDir, SQLiteStorage, Vec<Article>) {
        let temp_dir = tempdir().unwrap();
        let db_path = temp_dir.path().join("test.db");
        let storage = SQLiteStorage::new_with_path(&db_path, 1).await.unwrap();

        let day = |d| Some(Utc.with_ymd_and_hms(2024, 5, d, 8, 30, 0).unwrap());
        let articles = vec![
            article("a", 0.9, 0.8, 0.7, day(1)),
            article("b", 0.1, 0.9, 0.9, day(2)),
            article("c", 0.6, 0.8, 0.7, day(3)),
            article("d", 0.7, 0.8, 0.7, None),
            article("e", 0.8, 0.2, 0.3, day(4)),
            article("f", 0.5, 0.5, 0.5, day(5)),
        ];
        for a in &articles {
            insert(&storage, a).await;
        }
        (temp_dir, storage, articles)
    }

    #[tokio::test]
    async fn test_sqlite_list_matches_filter_and_order() {
        let (_dir, storage, articles) = seeded().await;
        let filter = ScoreFilter { min_facts: 0.5, min_calm: 0.5, min_deep: 0.0 };

        let page = storage
            .list_articles(&ArticleQuery::new(10, 0, filter))
            .await
            .unwrap();

        let mut expected: Vec<_> = articles.into_iter().filter(|a| filter.matches(a)).collect();
        expected.sort_by(rank_articles);
        assert_eq!(page.total, expected.len() as i64);
        assert_eq!(page.articles, expected);

        let ids: Vec<_> = page.articles.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, ["c", "a", "d", "f"]);
    }

    #[tokio::test]
    async fn test_sqlite_total_ignores_pagination() {
        let (_dir, storage, _) = seeded().await;

        let first = storage
            .list_articles(&ArticleQuery::new(2, 0, ScoreFilter::default()))
            .await
            .unwrap();
        let rest = storage
            .list_articles(&ArticleQuery::new(2, 4, ScoreFilter::default()))
            .await
            .unwrap();
        let past_end = storage
            .list_articles(&ArticleQuery::new(2, 50, ScoreFilter::default()))
            .await
            .unwrap();

        assert_eq!(first.articles.len(), 2);
        assert_eq!(rest.articles.len(), 2);
        assert!(past_end.articles.is_empty());
        assert!([first.total, rest.total, past_end.total].iter().all(|t| *t == 6));
    }

    #[tokio::test]
    async fn test_sqlite_get_article() {
        let (_dir, storage, articles) = seeded().await;

        let found = storage.get_article("d").await.unwrap();
        assert_eq!(&found, articles.iter().find(|a| a.id == "d").unwrap());
        assert!(found.published_at.is_none());

        assert!(matches!(
            storage.get_article("nope").await,
            Err(Error::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_sqlite_feedback_appends_rows() {
        let temp_dir = tempdir().unwrap();
        let storage = SQLiteStorage::new_with_path(&temp_dir.path().join("fb.db"), 1)
            .await
            .unwrap();
        let entry = FeedbackEntry {
            article_id: "a1".to_string(),
            axis: "epistemic".to_string(),
            user_score: 1,
        };

        storage.save_feedback(&entry).await.unwrap();
        storage.save_feedback(&entry).await.unwrap();

        let (count, stamped): (i64, i64) = sqlx::query_as(
            "SELECT COUNT(*), COUNT(timestamp) FROM feedback_log WHERE article_id = 'a1'",
        )
        .fetch_one(&storage.pool)
        .await
        .unwrap();
        assert_eq!(count, 2);
        assert_eq!(stamped, 2);
    }

    #[tokio::test]
    async fn test_sqlite_stats() {
        let temp_dir = tempdir().unwrap();
        let storage = SQLiteStorage::new_with_path(&temp_dir.path().join("stats.db"), 1)
            .await
            .unwrap();

        let empty = storage.get_stats().await.unwrap();
        assert_eq!(empty.total_articles, 0);
        assert!(empty.avg_facts_score.is_none());
        assert!(empty.avg_calm_score.is_none());
        assert!(empty.avg_deep_score.is_none());

        insert(&storage, &article("x", 0.2, 0.4, 0.6, None)).await;
        insert(&storage, &article("y", 0.4, 0.6, 0.8, None)).await;

        let stats = storage.get_stats().await.unwrap();
        assert_eq!(stats.total_articles, 2);
        assert!((stats.avg_facts_score.unwrap() - 0.3).abs() < 1e-9);
        assert!((stats.avg_calm_score.unwrap() - 0.5).abs() < 1e-9);
        assert!((stats.avg_deep_score.unwrap() - 0.7).abs() < 1e-9);
    }
}
