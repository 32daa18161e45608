//! HTTP surface: a thin Axum adapter over the tool operations.
//!
//! Mirrors the tool contract one-to-one; all orchestration lives behind
//! `tools`. CORS is permissive so local clients and dashboards can call
//! the API directly.

use std::sync::Arc;

use axum::{
    extract::{Extension, Query},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use tower_http::cors::CorsLayer;

use crate::engine::AppState;
use crate::error::ToolError;
use crate::tools::{self, ArticlesQuery, TopNewsQuery};

impl IntoResponse for ToolError {
    fn into_response(self) -> Response {
        let status = match &self {
            ToolError::BadInput(_) => StatusCode::BAD_REQUEST,
            ToolError::NoMatch(_) => StatusCode::NOT_FOUND,
            ToolError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            ToolError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let mut body = json!({
            "error": {
                "code": self.code(),
                "message": self.to_string(),
            }
        });
        if let ToolError::RateLimited {
            retry_after_secs, ..
        } = &self
        {
            body["retryAfter"] = json!(retry_after_secs);
        }
        (status, Json(body)).into_response()
    }
}

/// Build the application router around shared state.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/articles", get(articles))
        .route("/api/top-news", get(top_news))
        .route("/api/health", get(health))
        .route("/api/metrics", get(metrics))
        .layer(CorsLayer::very_permissive())
        .layer(Extension(state))
}

async fn articles(
    Extension(state): Extension<Arc<AppState>>,
    Query(query): Query<ArticlesQuery>,
) -> Result<impl IntoResponse, ToolError> {
    let response = tools::get_articles(&state, query).await?;
    Ok(Json(response))
}

/// Query-string shape for `/api/top-news`; `domains` arrives as a
/// comma-separated list.
#[derive(Debug, Default, Deserialize)]
struct TopNewsParams {
    count: Option<i64>,
    topic: Option<String>,
    location: Option<String>,
    #[serde(rename = "lastNDays")]
    last_n_days: Option<i64>,
    domains: Option<String>,
    min_quality_score: Option<f64>,
    enable_quality_filter: Option<bool>,
}

impl From<TopNewsParams> for TopNewsQuery {
    fn from(p: TopNewsParams) -> Self {
        TopNewsQuery {
            count: p.count,
            topic: p.topic,
            location: p.location,
            last_n_days: p.last_n_days,
            domains: p.domains.map(|d| {
                d.split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect()
            }),
            min_quality_score: p.min_quality_score,
            enable_quality_filter: p.enable_quality_filter,
        }
    }
}

async fn top_news(
    Extension(state): Extension<Arc<AppState>>,
    Query(params): Query<TopNewsParams>,
) -> Result<impl IntoResponse, ToolError> {
    let response = tools::get_top_news(&state, params.into()).await?;
    Ok(Json(response))
}

async fn health(Extension(state): Extension<Arc<AppState>>) -> impl IntoResponse {
    Json(tools::health_check(&state))
}

async fn metrics(Extension(state): Extension<Arc<AppState>>) -> impl IntoResponse {
    Json(tools::get_metrics(&state))
}
