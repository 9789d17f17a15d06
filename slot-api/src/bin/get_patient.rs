//! Patient Lambda - Looks up a patient record.
//!
//! Endpoint:
//! - GET /patient?identity={name}

use lambda_http::{run, service_fn, Body, Error, Request, Response};
use serde::Serialize;
use shared::http::{json_response, query_param};
use shared::{try_service, AppState, PatientRecord};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Serialize)]
struct PatientResponse {
    patient: PatientRecord,
}

async fn handler(state: Arc<AppState>, event: Request) -> Result<Response<Body>, Error> {
    let name = try_service!(query_param(&event, "identity"));
    let patient = try_service!(state.patients.patient(&name).await);

    json_response(200, &PatientResponse { patient })
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
    use lambda_http::RequestExt;
    use shared::store::{Item, ItemKey, SlotStore};
    use shared::test_support::{in_memory_state, TEST_SERVICE_ID};
    use std::collections::HashMap;

    fn lookup(identity: &str) -> Request {
        Request::default().with_query_string_parameters(HashMap::from([(
            "identity".to_string(),
            identity.to_string(),
        )]))
    }

    #[tokio::test]
    async fn test_returns_patient() {
        let (state, store) = in_memory_state(10);
        store
            .put_item(
                &ItemKey::new(TEST_SERVICE_ID, "patient:alice"),
                Item::from([
                    ("PatientName".to_string(), "Alice Smith".to_string()),
                    ("Dob".to_string(), "1980-02-01".to_string()),
                    ("NhsNumber".to_string(), "943 476 5919".to_string()),
                    ("Notes".to_string(), "Prefers afternoons".to_string()),
                ]),
            )
            .await
            .unwrap();

        let response = handler(Arc::new(state), lookup("alice")).await.unwrap();

        assert_eq!(response.status(), 200);
        let body: serde_json::Value = serde_json::from_slice(response.body().as_ref()).unwrap();
        assert_eq!(
            body["patient"],
            serde_json::json!({
                "name": "Alice Smith",
                "dob": "1980-02-01",
                "nhsNumber": "943 476 5919",
                "notes": "Prefers afternoons",
            })
        );
    }

    #[tokio::test]
    async fn test_unknown_patient_is_404() {
        let (state, _) = in_memory_state(10);

        let response = handler(Arc::new(state), lookup("nobody")).await.unwrap();

        assert_eq!(response.status(), 404);
    }
}
