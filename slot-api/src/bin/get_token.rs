//! Token Lambda - Exchanges a slot id for a video access token.
//!
//! Endpoint:
//! - GET /token?slot={slot_id}&user={host|subject}
//!
//! The token's identity is the slot's host when `user=host`, otherwise its
//! subject. The room is the slot id.

use lambda_http::{run, service_fn, Body, Error, Request, Response};
use serde::Serialize;
use shared::http::{json_response, query_param};
use shared::{parse_slot_id, try_service, AppState, SlotInfo};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Token response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TokenResponse {
    slot_info: SlotInfo,
    token: String,
}

async fn handler(state: Arc<AppState>, event: Request) -> Result<Response<Body>, Error> {
    let slot_id = try_service!(query_param(&event, "slot").and_then(|raw| parse_slot_id(&raw)));
    let is_host = query_param(&event, "user").is_ok_and(|user| user == "host");

    let slot_info = try_service!(state.slots.slot_info(&slot_id).await);
    let identity = if is_host {
        &slot_info.host_name
    } else {
        &slot_info.subject_name
    };

    let token = try_service!(state.tokens.issue_token(identity, &slot_id.to_string()).await);

    info!(%slot_id, is_host, "Issued token for slot");

    json_response(
        200,
        &TokenResponse {
            slot_info,
            token: token.token,
        },
    )
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .init();

    let state = Arc::new(AppState::from_env().await?);

    run(service_fn(move |event| {
        let state = Arc::clone(&state);
        async move { handler(state, event).await }
    }))
    .await
}
