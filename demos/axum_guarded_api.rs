// demos/axum_guarded_api.rs
//
// A minimal API protected by the bearer middleware. Point it at any OIDC
// issuer and call it with a token from that issuer:
//
//   OIDC_ISSUER=https://id.example.com OIDC_AUDIENCE=demo-api \
//     cargo run --example axum_guarded_api
//   curl -H "Authorization: Bearer $TOKEN" http://127.0.0.1:3000/me

use alder_oidc::prelude::*;
use axum::extract::Request;
use axum::routing::get;
use axum::Router;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let issuer = std::env::var("OIDC_ISSUER")
        .unwrap_or_else(|_| "https://accounts.google.com".to_string());
    let audience = std::env::var("OIDC_AUDIENCE").unwrap_or_else(|_| "demo-api".to_string());

    let config = ConfigBuilder::new()
        .issuer_url(&issuer)?
        .audience(audience)
        .build()?;
    let validator = Validator::discover(config).await?;
    let state = AuthState {
        validator: Arc::new(validator),
    };

    let app = Router::new()
        .route("/me", get(me))
        .layer(axum::middleware::from_fn_with_state(state, require_auth));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:3000").await?;
    tracing::info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}

async fn me(request: Request) -> String {
    match request.claims() {
        Some(claims) => format!("hello, {} ({})\n", claims.username, claims.subject),
        None => "hello, anonymous\n".to_string(),
    }
}
