//! HTTP helpers for Lambda functions.

use lambda_http::{Body, Request, RequestExt, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::error;
use validator::Validate;

use crate::Error;

/// Error body.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

fn with_cors(builder: lambda_http::http::response::Builder) -> lambda_http::http::response::Builder {
    builder
        .header("Access-Control-Allow-Origin", "*")
        .header("Access-Control-Allow-Headers", "*")
        .header("Access-Control-Allow-Credentials", "true")
}

/// Create a JSON response with the given status code and data.
pub fn json_response<T: Serialize>(status: u16, data: &T) -> Result<Response<Body>, lambda_http::Error> {
    let response = with_cors(Response::builder())
        .status(status)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_string(data)?))
        .map_err(Box::new)?;
    Ok(response)
}

/// Create a response with no body.
pub fn empty_response(status: u16) -> Result<Response<Body>, lambda_http::Error> {
    let response = with_cors(Response::builder())
        .status(status)
        .body(Body::Empty)
        .map_err(Box::new)?;
    Ok(response)
}

/// Turn a service error into a response. Server-side failures are logged and
/// reported without detail.
pub fn error_response(err: &Error) -> Result<Response<Body>, lambda_http::Error> {
    let status = err.status_code();
    if status >= 500 {
        error!(error = %err, "Request failed");
    }
    json_response(
        status,
        &ErrorBody {
            error: err.public_message(),
        },
    )
}

/// Parse and validate a JSON request body.
pub fn parse_json_body<T: DeserializeOwned + Validate>(body: &Body) -> Result<T, Error> {
    let parsed: T = serde_json::from_slice(body.as_ref())
        .map_err(|e| Error::Validation(format!("Invalid request body: {}", e)))?;
    parsed.validate()?;
    Ok(parsed)
}

/// Parse a JSON or form-encoded body according to its content type.
pub fn parse_payload<T: DeserializeOwned>(event: &Request) -> Result<T, Error> {
    use lambda_http::RequestPayloadExt;

    event
        .payload::<T>()
        .map_err(|e| Error::Validation(format!("Invalid request body: {}", e)))?
        .ok_or_else(|| Error::Validation("Missing or unsupported request body".to_string()))
}

/// Required query string parameter.
pub fn query_param(event: &Request, name: &str) -> Result<String, Error> {
    event
        .query_string_parameters_ref()
        .and_then(|params| params.first(name))
        .filter(|value| !value.is_empty())
        .map(str::to_string)
        .ok_or_else(|| Error::Validation(format!("Missing query parameter '{}'", name)))
}

/// Unwrap a service result, returning early with the mapped error response.
///
/// Usage:
/// ```ignore
/// let slot_id = try_service!(parse_slot_id(&raw));
/// ```
#[macro_export]
macro_rules! try_service {
    ($result:expr) => {
        match $result {
            Ok(value) => value,
            Err(err) => return $crate::http::error_response(&err),
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use std::collections::HashMap;

    #[derive(Debug, Deserialize, Validate)]
    struct Named {
        #[validate(length(min = 1))]
        name: String,
    }

    #[test]
    fn test_responses_carry_cors_headers() {
        let response = json_response(200, &serde_json::json!({"ok": true})).unwrap();
        assert_eq!(response.headers()["Access-Control-Allow-Origin"], "*");
        assert_eq!(response.headers()["Access-Control-Allow-Credentials"], "true");

        let empty = empty_response(204).unwrap();
        assert_eq!(empty.status(), 204);
        assert_eq!(empty.headers()["Access-Control-Allow-Headers"], "*");
    }

    #[test]
    fn test_parse_json_body_validates() {
        let ok: Named = parse_json_body(&Body::from(r#"{"name":"alice"}"#)).unwrap();
        assert_eq!(ok.name, "alice");

        let empty = parse_json_body::<Named>(&Body::from(r#"{"name":""}"#));
        assert!(matches!(empty, Err(Error::Validation(_))));

        let garbage = parse_json_body::<Named>(&Body::from("not json"));
        assert!(matches!(garbage, Err(Error::Validation(_))));
    }

    #[test]
    fn test_query_param() {
        let event = Request::default().with_query_string_parameters(HashMap::from([
            ("slot".to_string(), "abc".to_string()),
            ("user".to_string(), String::new()),
        ]));

        assert_eq!(query_param(&event, "slot").unwrap(), "abc");
        assert!(query_param(&event, "user").is_err());
        assert!(query_param(&event, "room").is_err());
    }

    #[test]
    fn test_error_response_hides_internal_errors() {
        let response = error_response(&Error::Persistence("table gone".into())).unwrap();
        assert_eq!(response.status(), 500);
        match response.body() {
            Body::Text(text) => assert!(!text.contains("table gone")),
            other => panic!("unexpected body {:?}", other),
        }
    }
}
