//! `Json<T>` plus `validator` checks.
//!
//! Malformed JSON is answered with 400, failed field validation with 422
//! listing each offending field.

use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, Request};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::de::DeserializeOwned;
use validator::{Validate, ValidationErrors};

use super::ApiResponse;

/// Deserializes the body and runs `Validate::validate` on it.
///
/// ```ignore
/// #[derive(Deserialize, Validate)]
/// struct AdditionalData {
///     #[validate(length(min = 1))]
///     description: String,
/// }
///
/// async fn enter(ValidatedJson(body): ValidatedJson<AdditionalData>) { /* ... */ }
/// ```
pub struct ValidatedJson<T>(pub T);

pub enum ValidatedJsonRejection {
    /// Body missing, not JSON, or not the expected shape
    Malformed(JsonRejection),
    /// Well-formed body with field rule violations
    Invalid(ValidationErrors),
}

/// `field: message` per violation, sorted so responses are stable.
fn describe(errors: &ValidationErrors) -> String {
    let mut lines: Vec<String> = errors
        .field_errors()
        .into_iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |e| match &e.message {
                Some(message) => format!("{}: {}", field, message),
                None => format!("{}: {}", field, e.code),
            })
        })
        .collect();
    lines.sort();

    if lines.is_empty() {
        "Validierung fehlgeschlagen".to_string()
    } else {
        lines.join("; ")
    }
}

impl IntoResponse for ValidatedJsonRejection {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::Malformed(rejection) => (
                StatusCode::BAD_REQUEST,
                format!("Ungültiges JSON: {}", rejection.body_text()),
            ),
            Self::Invalid(errors) => (StatusCode::UNPROCESSABLE_ENTITY, describe(&errors)),
        };
        (status, Json(ApiResponse::<()>::error(message))).into_response()
    }
}

impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ValidatedJsonRejection;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(ValidatedJsonRejection::Malformed)?;
        value.validate().map_err(ValidatedJsonRejection::Invalid)?;
        Ok(Self(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::routing::post;
    use axum::Router;
    use serde::Deserialize;
    use serde_json::{json, Value};
    use tower::Service;

    #[derive(Debug, Deserialize, Validate)]
    struct MeasureBody {
        #[validate(length(min = 1, max = 40))]
        description: String,
        #[validate(range(min = 0.0))]
        estimated_savings_kwh: f64,
    }

    async fn accept(ValidatedJson(body): ValidatedJson<MeasureBody>) -> String {
        body.description
    }

    async fn post_raw(body: impl Into<Body>) -> (StatusCode, Vec<u8>) {
        let req = axum::http::Request::builder()
            .method("POST")
            .uri("/measure")
            .header("content-type", "application/json")
            .body(body.into())
            .unwrap();
        let resp = Router::new()
            .route("/measure", post(accept))
            .into_service()
            .call(req)
            .await
            .unwrap();
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        (status, bytes.to_vec())
    }

    #[tokio::test]
    async fn valid_body_reaches_handler() {
        let body = json!({"description": "Dach dämmen", "estimated_savings_kwh": 800.0});
        let (status, bytes) = post_raw(body.to_string()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(String::from_utf8(bytes).unwrap(), "Dach dämmen");
    }

    #[tokio::test]
    async fn unparsable_body_is_bad_request() {
        let (status, bytes) = post_raw("{description:").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn every_bad_field_is_named() {
        let body = json!({"description": "", "estimated_savings_kwh": -5.0});
        let (status, bytes) = post_raw(body.to_string()).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        let message = body["error"].as_str().unwrap();
        assert!(message.starts_with("description: "), "{message}");
        assert!(message.contains("estimated_savings_kwh: range"), "{message}");
    }
}
