use super::AppState;
use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use subtle::ConstantTimeEq;

use super::team::TeamResponse;

/// Rejects requests without `Authorization: Bearer <configured token>`.
pub async fn require_bearer(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let authorized = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(|token| token_matches(token, &state.bearer_token))
        .unwrap_or(false);

    if authorized {
        next.run(request).await
    } else {
        tracing::warn!("Rejected unauthenticated request to {}", request.uri().path());
        unauthorized()
    }
}

/// Constant-time comparison; an empty configured token matches nothing.
pub fn token_matches(provided: &str, expected: &str) -> bool {
    if expected.is_empty() || provided.len() != expected.len() {
        return false;
    }
    provided.as_bytes().ct_eq(expected.as_bytes()).into()
}

fn unauthorized() -> Response {
    let mut response = (
        StatusCode::UNAUTHORIZED,
        Json(TeamResponse::failure("Unauthorized")),
    )
        .into_response();
    response.headers_mut().insert(
        header::WWW_AUTHENTICATE,
        header::HeaderValue::from_static("Bearer"),
    );
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_matches() {
        assert!(token_matches("secret", "secret"));
        assert!(!token_matches("Secret", "secret"));
        assert!(!token_matches("secret-longer", "secret"));
        assert!(!token_matches("", ""));
    }
}
