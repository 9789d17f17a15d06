//! Create Slot Lambda - Books a new appointment slot.
//!
//! Endpoint:
//! - POST /slots - body `{subjectName, hostName}`

use lambda_http::{run, service_fn, Body, Error, Request, Response};
use serde::{Deserialize, Serialize};
use shared::http::{json_response, parse_json_body};
use shared::{try_service, AppState};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use validator::Validate;

/// Create slot request
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
struct CreateSlotRequest {
    #[validate(length(min = 1, max = 256))]
    subject_name: String,
    #[validate(length(min = 1, max = 256))]
    host_name: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateSlotResponse {
    message: &'static str,
    slot_id: String,
}

async fn handler(state: Arc<AppState>, event: Request) -> Result<Response<Body>, Error> {
    let request: CreateSlotRequest = try_service!(parse_json_body(event.body()));

    let slot_id = try_service!(
        state
            .slots
            .create_slot(&request.subject_name, &request.host_name)
            .await
    );

    json_response(
        201,
        &CreateSlotResponse {
            message: "Appointment created",
            slot_id: slot_id.to_string(),
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

#[cfg(test)]
mod tests {
    use super::*;
    use shared::test_support::in_memory_state;
    use shared::{parse_slot_id, SlotState};

    fn post(body: &str) -> Request {
        lambda_http::http::Request::builder()
            .method("POST")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_creates_pending_slot() {
        let (state, _) = in_memory_state(10);
        let state = Arc::new(state);

        let response = handler(
            state.clone(),
            post(r#"{"subjectName":"alice","hostName":"bob"}"#),
        )
        .await
        .unwrap();

        assert_eq!(response.status(), 201);
        assert_eq!(response.headers()["Access-Control-Allow-Origin"], "*");
        let body: serde_json::Value = serde_json::from_slice(response.body().as_ref()).unwrap();
        assert_eq!(body["message"], "Appointment created");

        let slot_id = parse_slot_id(body["slotId"].as_str().unwrap()).unwrap();
        let slot = state.slots.slot(&slot_id).await.unwrap();
        assert_eq!(slot.info.subject_name, "alice");
        assert_eq!(slot.info.host_name, "bob");
        assert_eq!(slot.state, SlotState::Pending);
    }

    #[tokio::test]
    async fn test_rejects_invalid_bodies() {
        let (state, store) = in_memory_state(10);
        let state = Arc::new(state);

        for body in [
            "not json",
            r#"{"subjectName":"alice"}"#,
            r#"{"subjectName":"","hostName":"bob"}"#,
        ] {
            let response = handler(state.clone(), post(body)).await.unwrap();
            assert_eq!(response.status(), 400, "body {}", body);
        }
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_store_failure_is_500() {
        let (state, store) = in_memory_state(10);
        store.fail_writes(true);

        let response = handler(
            Arc::new(state),
            post(r#"{"subjectName":"alice","hostName":"bob"}"#),
        )
        .await
        .unwrap();

        assert_eq!(response.status(), 500);
    }
}
