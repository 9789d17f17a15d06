//! List Slots Lambda - Returns every slot of the service.
//!
//! Endpoint:
//! - GET /slots

use lambda_http::{run, service_fn, Body, Error, Request, Response};
use serde::Serialize;
use shared::http::json_response;
use shared::{try_service, AppState, SlotSummary};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Serialize)]
struct SlotsResponse {
    slots: Vec<SlotSummary>,
}

async fn handler(state: Arc<AppState>, _event: Request) -> Result<Response<Body>, Error> {
    let slots = try_service!(state.slots.list_slots().await);

    info!(count = slots.len(), "Listed slots");

    json_response(200, &SlotsResponse { slots })
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

    #[tokio::test]
    async fn test_lists_slots_across_pages() {
        let (state, store) = in_memory_state(1);
        state.slots.create_slot("alice", "bob").await.unwrap();
        state.slots.create_slot("carol", "dave").await.unwrap();

        let response = handler(Arc::new(state), Request::default()).await.unwrap();

        assert_eq!(response.status(), 200);
        assert_eq!(store.query_calls(), 2);

        let body: serde_json::Value = serde_json::from_slice(response.body().as_ref()).unwrap();
        let slots = body["slots"].as_array().unwrap();
        assert_eq!(slots.len(), 2);

        let mut subjects: Vec<&str> = slots
            .iter()
            .map(|s| s["subjectName"].as_str().unwrap())
            .collect();
        subjects.sort();
        assert_eq!(subjects, vec!["alice", "carol"]);
        assert!(slots.iter().all(|s| s["state"] == "pending"));
    }

    #[tokio::test]
    async fn test_empty_listing() {
        let (state, _) = in_memory_state(1);

        let response = handler(Arc::new(state), Request::default()).await.unwrap();

        let body: serde_json::Value = serde_json::from_slice(response.body().as_ref()).unwrap();
        assert_eq!(body, serde_json::json!({"slots": []}));
    }
}
