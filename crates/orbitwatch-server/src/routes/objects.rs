//! Catalog listing and per-object detail.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::routing::get;
use axum::{Json, Router};
use orbitwatch_core::{Category, Error};
use orbitwatch_runtime::{CatalogEntry, ObjectDetail};
use serde::Deserialize;

use crate::error::ApiError;
use crate::state::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/objects", get(list_objects))
        .route("/object/{name}", get(get_object))
}

#[derive(Debug, Deserialize)]
struct ObjectsQuery {
    #[serde(rename = "type")]
    category: Option<String>,
}

/// GET /api/objects[?type=satellite|debris]
///
/// An unrecognised type matches nothing.
async fn list_objects(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ObjectsQuery>,
) -> Json<Vec<CatalogEntry>> {
    let entries = match query.category.as_deref() {
        None | Some("") => state.query.list_catalog(None),
        Some(raw) => match raw.parse::<Category>() {
            Ok(category) => state.query.list_catalog(Some(category)),
            Err(_) => Vec::new(),
        },
    };
    Json(entries)
}

/// GET /api/object/:name — state computed at request time.
async fn get_object(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<Json<ObjectDetail>, ApiError> {
    let detail = tokio::task::spawn_blocking(move || state.query.object_detail(&name))
        .await
        .map_err(|e| Error::Internal(format!("Detail task failed: {}", e)))??;
    Ok(Json(detail))
}
