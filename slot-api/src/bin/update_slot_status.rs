//! Slot Status Lambda - Room event callback that moves slots through their lifecycle.
//!
//! Endpoint:
//! - POST /slots/status - form body `ParticipantIdentity`, `RoomName`, `ParticipantStatus`
//!
//! Responses:
//! - 200 state applied
//! - 204 participant is not the slot's subject, ignored
//! - 409 transition not allowed, or the slot changed concurrently

use lambda_http::{run, service_fn, Body, Error, Request, Response};
use serde::Deserialize;
use shared::http::{empty_response, json_response, parse_payload, ErrorBody};
use shared::{parse_slot_id, try_service, AppState, SlotState, StateUpdate};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Room event callback. Other callback fields are ignored.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ParticipantEvent {
    participant_identity: String,
    room_name: String,
    participant_status: String,
}

async fn handler(state: Arc<AppState>, event: Request) -> Result<Response<Body>, Error> {
    let callback: ParticipantEvent = try_service!(parse_payload(&event));
    let slot_id = try_service!(parse_slot_id(&callback.room_name));
    let new_state = try_service!(callback.participant_status.parse::<SlotState>());

    let outcome = try_service!(
        state
            .slots
            .update_slot_state(&slot_id, &callback.participant_identity, new_state)
            .await
    );

    match outcome {
        StateUpdate::Applied { .. } => empty_response(200),
        StateUpdate::IdentityMismatch => empty_response(204),
        StateUpdate::InvalidTransition { from, to } => json_response(
            409,
            &ErrorBody {
                error: format!("Slot cannot move from {} to {}", from, to),
            },
        ),
        StateUpdate::Conflict => {
            info!(%slot_id, "Dropping status callback that lost a concurrent update");
            json_response(
                409,
                &ErrorBody {
                    error: "Slot was updated concurrently".to_string(),
                },
            )
        }
    }
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
