// rest/routes/whatsapp.rs — Meta webhook handshake, inbound delivery, and
// the status probe.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::whatsapp::webhook::Envelope;
use crate::whatsapp::ChatStatus;
use crate::AppContext;

/// Meta webhook verification handshake.
///
/// Query keys are dotted (`hub.mode`, `hub.verify_token`, `hub.challenge`).
/// No parameters at all is Meta's reachability probe and answers plain `OK`;
/// a subscribe request with the right token echoes the challenge; anything
/// else is 403.
pub async fn verify(
    State(ctx): State<Arc<AppContext>>,
    Query(params): Query<HashMap<String, String>>,
) -> impl IntoResponse {
    let mode = params.get("hub.mode");
    let verify_token = params.get("hub.verify_token");
    let challenge = params.get("hub.challenge");

    if mode.is_none() && verify_token.is_none() && challenge.is_none() {
        return (StatusCode::OK, "OK".to_string());
    }

    if mode.map(String::as_str) == Some("subscribe")
        && verify_token.map(String::as_str) == Some(ctx.config.whatsapp.verify_token.as_str())
    {
        let challenge = challenge.cloned().unwrap_or_default();
        debug!("webhook verification succeeded");
        return (StatusCode::OK, challenge);
    }

    warn!(?mode, "webhook verification failed");
    (StatusCode::FORBIDDEN, "Invalid verify token".to_string())
}

/// Inbound message delivery. Malformed bodies are reported, never panicked
/// on; recognizable messages are processed even when siblings are garbage.
pub async fn webhook(
    State(ctx): State<Arc<AppContext>>,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    let envelope: Envelope = match serde_json::from_value(body) {
        Ok(envelope) => envelope,
        Err(e) => {
            warn!(err = %e, "undecodable webhook envelope");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "status": "error", "message": e.to_string() })),
            );
        }
    };

    for event in envelope.into_events() {
        ctx.chat.handle_event(event).await;
    }
    (StatusCode::OK, Json(json!({ "status": "ok" })))
}

pub async fn status(State(ctx): State<Arc<AppContext>>) -> Json<ChatStatus> {
    Json(ctx.chat.status().await)
}
