//! Incremental ingest of raw element text.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::routing::post;
use axum::{Json, Router};
use orbitwatch_core::Category;
use orbitwatch_runtime::RefreshReport;
use serde::Deserialize;

use crate::error::ApiError;
use crate::state::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/ingest", post(post_ingest))
}

#[derive(Debug, Deserialize)]
struct IngestQuery {
    #[serde(rename = "type")]
    category: Option<Category>,
}

/// POST /api/ingest[?type=satellite|debris] — body is element-set text,
/// appended to the catalog. Without `type`, names are classified by keyword.
async fn post_ingest(
    State(state): State<Arc<AppState>>,
    Query(query): Query<IngestQuery>,
    body: String,
) -> Result<Json<serde_json::Value>, ApiError> {
    let report: RefreshReport = state.orchestrator.ingest_text(body, query.category).await?;
    Ok(Json(serde_json::json!({
        "status": "ok",
        "report": report,
    })))
}
