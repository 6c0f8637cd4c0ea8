// src/middleware.rs

use crate::claims::Claims;
use crate::validator::Validator;
use axum::extract::{Request, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use std::sync::Arc;
use tracing::debug;

/// State for the bearer middleware, cloned into every request.
#[derive(Clone)]
pub struct AuthState {
    pub validator: Arc<Validator>,
}

/// Bearer authentication middleware.
///
/// Extracts the credential from the `Authorization` header, verifies it
/// through the [`Validator`], and attaches the resulting [`Claims`] to the
/// request before running the inner handler.
///
/// Every rejection (missing header, malformed scheme, or any verification
/// failure) produces the same `401` with a `WWW-Authenticate: Bearer`
/// challenge. The failure kind is logged but never sent to the client, so a
/// caller cannot probe whether a key was unknown, a signature was wrong, or
/// a token merely expired.
pub async fn require_auth(
    State(state): State<AuthState>,
    mut request: Request,
    next: Next,
) -> Response {
    let Some(token) = bearer_token(request.headers()).map(str::to_string) else {
        debug!("Missing or malformed Authorization header");
        return unauthorized();
    };

    match state.validator.validate_token(&token).await {
        Ok(claims) => {
            insert_claims(&mut request, claims);
            next.run(request).await
        }
        Err(err) => {
            debug!("Bearer token rejected: {}", err);
            unauthorized()
        }
    }
}

/// Extracts the credential from `Authorization: Bearer <token>`.
///
/// The scheme is matched case-insensitively and exactly one credential must
/// follow it.
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let mut parts = value.split_whitespace();
    let scheme = parts.next()?;
    let token = parts.next()?;
    if parts.next().is_some() || !scheme.eq_ignore_ascii_case("Bearer") {
        return None;
    }
    Some(token)
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        [(header::WWW_AUTHENTICATE, "Bearer")],
    )
        .into_response()
}

/// Attaches verified claims to a request for downstream handlers.
pub fn insert_claims<B>(request: &mut axum::http::Request<B>, claims: Claims) {
    request.extensions_mut().insert(claims);
}

/// Read accessor for claims attached by the middleware.
pub trait ClaimsExt {
    /// Returns the verified claims, or `None` when the request never passed
    /// authentication. An anonymous request is therefore distinguishable
    /// from an authenticated one with an empty role list.
    fn claims(&self) -> Option<&Claims>;
}

impl<B> ClaimsExt for axum::http::Request<B> {
    fn claims(&self) -> Option<&Claims> {
        self.extensions().get::<Claims>()
    }
}
