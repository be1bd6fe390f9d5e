use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use std::sync::Arc;
use seithi_core::{Article, Error, FeedbackEntry, StatsSummary};
use tracing::debug;
use crate::error::ApiError;
use crate::params::ListParams;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct ArticlesResponse {
    pub articles: Vec<Article>,
    pub total: i64,
    pub limit: u32,
    pub offset: i64,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: &'static str,
}

pub async fn list_articles(
    State(state): State<Arc<AppState>>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<Json<ArticlesResponse>, ApiError> {
    let query = ListParams::from_pairs(&pairs).into_query();
    debug!(?query, "Listing articles");

    let page = state.storage.list_articles(&query).await?;
    Ok(Json(ArticlesResponse {
        articles: page.articles,
        total: page.total,
        limit: query.limit,
        offset: query.offset,
    }))
}

pub async fn get_article(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Article>, ApiError> {
    let article = state.storage.get_article(&id).await?;
    Ok(Json(article))
}

pub async fn post_feedback(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<FeedbackEntry>, JsonRejection>,
) -> Result<(StatusCode, Json<StatusResponse>), ApiError> {
    let Json(feedback) = payload.map_err(|rejection| {
        debug!("Rejected feedback body: {}", rejection.body_text());
        Error::Validation("Invalid request body".to_string())
    })?;
    feedback.validate()?;

    state.storage.save_feedback(&feedback).await?;
    Ok((StatusCode::CREATED, Json(StatusResponse { status: "success" })))
}

pub async fn get_stats(
    State(state): State<Arc<AppState>>,
) -> Result<Json<StatsSummary>, ApiError> {
    let stats = state.storage.get_stats().await?;
    Ok(Json(stats))
}
