use axum::body::Body;
use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::proxy::ProxyState;

/// Denied requests are short-circuited here, before any upstream call.
pub(crate) async fn proxy_auth(
    State(state): State<ProxyState>,
    req: axum::http::Request<Body>,
    next: Next,
) -> Response {
    let header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok());

    if !authorize(state.config.auth_token.as_deref(), header) {
        return (StatusCode::UNAUTHORIZED, "Unauthorized").into_response();
    }

    next.run(req).await
}

/// Permissive when no token is configured; otherwise the header must be
/// exactly `Bearer ` + token.
fn authorize(token: Option<&str>, header: Option<&str>) -> bool {
    let Some(token) = token else {
        return true;
    };
    header
        .and_then(|value| value.strip_prefix("Bearer "))
        .is_some_and(|candidate| candidate == token)
}
