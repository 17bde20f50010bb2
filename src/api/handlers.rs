use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::error;

use crate::api::state::AppState;
use crate::domain::{LeaderboardStat, Wager};
use crate::services::{GradingReport, IngestionReport};

type HandlerResult<T> = std::result::Result<Json<T>, (StatusCode, String)>;

fn internal<E: std::fmt::Display>(context: &str) -> impl FnOnce(E) -> (StatusCode, String) + '_ {
    move |e| {
        error!("{context}: {e}");
        (StatusCode::INTERNAL_SERVER_ERROR, format!("{context}: {e}"))
    }
}

/// GET /api/ingest/run -- trigger one ingestion pass
pub async fn run_ingestion(State(state): State<AppState>) -> HandlerResult<IngestionReport> {
    let _guard = state.ingest_lock.lock().await;
    let report = state
        .scheduler
        .run_pass(Utc::now())
        .await
        .map_err(internal("ingestion pass failed"))?;
    Ok(Json(report))
}

/// GET /api/grade/run -- trigger one grading pass, then fold the newly
/// graded experts into the leaderboard
pub async fn run_grading(State(state): State<AppState>) -> HandlerResult<GradingReport> {
    let _guard = state.grade_lock.lock().await;
    let report = state
        .grader
        .grade_pending()
        .await
        .map_err(internal("grading pass failed"))?;

    let mut rx = state.dirty_rx.lock().await;
    state
        .aggregator
        .drain_queue(&mut rx)
        .await
        .map_err(internal("leaderboard recompute failed"))?;

    Ok(Json(report))
}

#[derive(Debug, Deserialize)]
pub struct LimitQuery {
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_limit() -> i64 {
    50
}

/// GET /api/leaderboard?limit= -- stats sorted by net units descending
pub async fn get_leaderboard(
    State(state): State<AppState>,
    Query(q): Query<LimitQuery>,
) -> HandlerResult<Vec<LeaderboardStat>> {
    let stats = state
        .wager_store()
        .top_stats(q.limit.clamp(1, 500))
        .await
        .map_err(internal("leaderboard query failed"))?;
    Ok(Json(stats))
}

/// GET /api/review?limit= -- low-confidence pending wagers awaiting
/// manual review
pub async fn get_needs_review(
    State(state): State<AppState>,
    Query(q): Query<LimitQuery>,
) -> HandlerResult<Vec<Wager>> {
    let wagers = state
        .wager_store()
        .needs_review(q.limit.clamp(1, 500))
        .await
        .map_err(internal("review query failed"))?;
    Ok(Json(wagers))
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub db: String,
    pub uptime_secs: u64,
}

/// GET /health -- lightweight liveness/readiness probe
pub async fn health(
    State(state): State<AppState>,
) -> std::result::Result<Json<HealthResponse>, (StatusCode, Json<HealthResponse>)> {
    let db = match sqlx::query_scalar::<_, i32>("SELECT 1")
        .fetch_one(state.store.pool())
        .await
    {
        Ok(_) => "connected".to_string(),
        Err(_) => "disconnected".to_string(),
    };

    let ok = db == "connected";
    let resp = HealthResponse {
        status: if ok { "ok".into() } else { "degraded".into() },
        db,
        uptime_secs: state.uptime_seconds(),
    };

    if ok {
        Ok(Json(resp))
    } else {
        Err((StatusCode::SERVICE_UNAVAILABLE, Json(resp)))
    }
}
