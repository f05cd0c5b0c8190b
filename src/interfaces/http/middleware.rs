//! Bearer-token authentication middleware for Axum

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{header, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};

use crate::application::IdentityService;
use crate::domain::DomainError;
use crate::interfaces::http::common::{domain_error, ApiResponse};

/// State needed to turn a bearer token into a `User`
#[derive(Clone)]
pub struct AuthState {
    pub identity: Arc<IdentityService>,
    pub dev_mode: bool,
}

fn extract_token(auth_header: &str) -> Option<&str> {
    auth_header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Resolves `Authorization: Bearer <jwt>` and stores the current
/// [`crate::domain::User`] in the request extensions.
///
/// The user is re-loaded on every request so deactivation takes effect
/// before the token expires.
pub async fn auth_middleware(
    State(auth_state): State<AuthState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let token = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(extract_token)
        .map(String::from);

    let Some(token) = token else {
        return (
            StatusCode::UNAUTHORIZED,
            Json(ApiResponse::<()>::error("Anmeldung erforderlich")),
        )
            .into_response();
    };

    match auth_state.identity.resolve(&token).await {
        Ok(user) => {
            tracing::Span::current().record("user_id", user.id);
            request.extensions_mut().insert(user);
            next.run(request).await
        }
        Err(e @ DomainError::Internal(_)) => domain_error(e, auth_state.dev_mode).into_response(),
        Err(e) => {
            tracing::debug!(error = %e, "Rejected bearer token");
            domain_error(e, auth_state.dev_mode).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bearer_prefix_is_required() {
        assert_eq!(extract_token("Bearer abc.def"), Some("abc.def"));
        assert_eq!(extract_token("Basic dXNlcg=="), None);
        assert_eq!(extract_token("Bearer "), None);
    }
}
