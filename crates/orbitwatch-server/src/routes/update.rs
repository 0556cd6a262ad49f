//! Full catalog refresh trigger.

use std::sync::Arc;

use axum::extract::rejection::FormRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Form, Json, Router};
use serde::{Deserialize, Deserializer};
use tracing::info;

use crate::error::ApiError;
use crate::state::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/update", post(post_update))
}

#[derive(Debug, Default, Deserialize)]
struct UpdateForm {
    #[serde(default, deserialize_with = "blank_as_none")]
    debris: Option<usize>,
    #[serde(default, deserialize_with = "blank_as_none")]
    satellite: Option<usize>,
}

/// An empty form field means "use the default".
fn blank_as_none<'de, D>(deserializer: D) -> Result<Option<usize>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => value.parse().map(Some).map_err(serde::de::Error::custom),
    }
}

/// POST /update — form fields `debris` and `satellite` cap each group.
///
/// A request without a form body refreshes with the default caps.
async fn post_update(
    State(state): State<Arc<AppState>>,
    form: Result<Form<UpdateForm>, FormRejection>,
) -> Response {
    let form = match form {
        Ok(Form(form)) => form,
        Err(FormRejection::InvalidFormContentType(_)) => UpdateForm::default(),
        Err(e) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!({ "status": "error", "message": e.body_text() })),
            )
                .into_response();
        }
    };

    let limits = state.limits_with(&[("debris", form.debris), ("satellite", form.satellite)]);
    info!("Update requested: {:?}", limits);

    match state.orchestrator.refresh(&limits).await {
        Ok(report) => Json(serde_json::json!({
            "status": "ok",
            "accepted": report.accepted(),
            "stored": report.stored,
            "snapshot_version": report.snapshot.version,
            "groups": report.groups,
        }))
        .into_response(),
        Err(e) => ApiError(e).into_response(),
    }
}
