//! Push-path ingestion: a small HTTP listener for Qualtrics event
//! subscriptions.
//!
//! Qualtrics posts a thin notification naming the response id; the
//! handler fetches the full response over the export API's single
//! response endpoint and feeds it through the same `upsert` as the poll
//! loop. The two ingestion paths converge on one write primitive, so a
//! response arriving on both is still stored exactly once.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use tokio::sync::Mutex;
use tracing::{error, info, warn};

use crate::error::{Error, Result};
use crate::model::is_response_id;
use crate::qualtrics::QualtricsClient;
use crate::storage::ResponseStore;

/// Shared handler state: the API client plus the single store handle.
pub struct WebhookState {
    client: QualtricsClient,
    store: Mutex<ResponseStore>,
}

impl WebhookState {
    #[must_use]
    pub fn new(client: QualtricsClient, store: ResponseStore) -> Self {
        Self { client, store: Mutex::new(store) }
    }
}

/// Notification body Qualtrics posts for a `surveyengine.completedResponse`
/// subscription.
#[derive(Debug, Deserialize)]
struct WebhookPayload {
    #[serde(rename = "Result")]
    result: WebhookResult,
}

#[derive(Debug, Deserialize)]
struct WebhookResult {
    #[serde(rename = "ResponseID")]
    response_id: String,
}

/// Build the webhook router.
pub fn router(state: Arc<WebhookState>) -> Router {
    Router::new()
        .route("/webhook", post(handle_webhook))
        .route("/health", get(handle_health))
        .with_state(state)
}

/// Bind and serve the webhook listener until Ctrl-C.
///
/// # Errors
///
/// Returns an I/O error if the port cannot be bound or the server fails.
pub async fn serve(state: Arc<WebhookState>, port: u16) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port)).await?;
    info!(port, "Webhook listener started");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Webhook listener stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to install Ctrl-C handler");
    }
}

async fn handle_health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn handle_webhook(
    State(state): State<Arc<WebhookState>>,
    Json(payload): Json<WebhookPayload>,
) -> Response {
    let id = payload.result.response_id;
    info!(id = %id, "Webhook notification received");

    match ingest(&state, &id).await {
        Ok(()) => (StatusCode::OK, Json(serde_json::json!({ "stored": id }))).into_response(),
        Err(e) => {
            warn!(id = %id, error = %e, "Webhook ingestion failed");
            let status = match &e {
                Error::InvalidArgument(_) => StatusCode::BAD_REQUEST,
                Error::Transport(_) => StatusCode::BAD_GATEWAY,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            };
            (status, Json(e.to_structured_json())).into_response()
        }
    }
}

/// Fetch the named response and store it.
///
/// # Errors
///
/// Returns `InvalidArgument` for an id that is not a response id,
/// `Transport` if the fetch fails, or a store error if the write fails.
async fn ingest(state: &WebhookState, id: &str) -> Result<()> {
    if !is_response_id(id) {
        return Err(Error::InvalidArgument(format!("'{id}' is not a response id")));
    }

    let payload = state.client.fetch_response(id).await?;
    state.store.lock().await.upsert(id, &payload)?;
    Ok(())
}
