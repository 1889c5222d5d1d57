//! HTTP endpoint verifying provider tokens
//!
//! `POST /api/verify` with a JSON body `{ "token": "<jwt>" }`.
//!
//! | Outcome                          | Status |
//! |----------------------------------|--------|
//! | valid token                      | 200    |
//! | missing or malformed token       | 400    |
//! | token rejected                   | 401    |
//! | key set endpoint unavailable     | 503    |
//! | provider published a broken key  | 500    |
//! | any method other than POST       | 405    |
//!
//! Run with
//!
//! ```not_rust
//! JWKS_URL=https://api.warpcast.com/v2/jwks \
//! EXPECTED_AUD=https://app.example/ \
//! cargo run --example verify_endpoint
//! ```

use std::sync::Arc;

use axum::{
    Router,
    extract::State,
    http::{StatusCode, header::CONTENT_TYPE},
    response::{IntoResponse, Response},
    routing::post,
};
use jwkverify::{Error, ErrorKind, KeySetCache, TokenVerifier, VerifiedToken, VerifierConfig};
use miniserde::Deserialize;
use miniserde::json::{self, Object, Value};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_JWKS_URL: &str = "https://api.warpcast.com/v2/jwks";
const DEFAULT_AUDIENCE: &str = "https://app.example/";
const DEFAULT_BIND: &str = "127.0.0.1:4000";

#[derive(Clone)]
struct AppState {
    verifier: TokenVerifier,
}

#[derive(Deserialize)]
struct VerifyRequest {
    token: Option<String>,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "verify_endpoint=debug,jwkverify=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let jwks_url = std::env::var("JWKS_URL").unwrap_or_else(|_| DEFAULT_JWKS_URL.into());
    let audience = std::env::var("EXPECTED_AUD").unwrap_or_else(|_| DEFAULT_AUDIENCE.into());
    let bind = std::env::var("BIND").unwrap_or_else(|_| DEFAULT_BIND.into());

    let mut config = VerifierConfig::new(jwks_url, audience);
    if let Ok(issuer) = std::env::var("EXPECTED_ISS") {
        config = config.issuer(issuer);
    }

    let cache = Arc::new(KeySetCache::new(&config).expect("key set cache"));
    let verifier = TokenVerifier::new(config, cache).expect("verifier");
    let state = AppState { verifier };

    let app = Router::new()
        .route("/api/verify", post(verify).fallback(method_not_allowed))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(&bind).await.unwrap();
    tracing::info!("listening on {}", listener.local_addr().unwrap());
    axum::serve(listener, app).await.unwrap();
}

async fn verify(State(state): State<AppState>, body: String) -> Response {
    // The body is JSON text regardless of the declared content type
    let token = match json::from_str::<VerifyRequest>(&body) {
        Ok(VerifyRequest { token: Some(token) }) if !token.is_empty() => token,
        _ => return reply(StatusCode::BAD_REQUEST, error_body("no_token", "No token")),
    };

    match state.verifier.verify(&token).await {
        Ok(verified) => reply(StatusCode::OK, success_body(verified)),
        Err(err) => {
            tracing::warn!(kind = %err.kind(), error = %err, "token rejected");
            reply(status_for(&err), error_body(err.kind().as_str(), &err.to_string()))
        }
    }
}

async fn method_not_allowed() -> Response {
    reply(
        StatusCode::METHOD_NOT_ALLOWED,
        error_body("method_not_allowed", "Use POST with JSON { token }"),
    )
}

fn status_for(err: &Error) -> StatusCode {
    match err.kind() {
        ErrorKind::MalformedToken => StatusCode::BAD_REQUEST,
        ErrorKind::KeySetFetch => StatusCode::SERVICE_UNAVAILABLE,
        ErrorKind::ConfigurationInvalid | ErrorKind::InvalidKeyMaterial => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
        _ => StatusCode::UNAUTHORIZED,
    }
}

fn success_body(verified: VerifiedToken) -> Object {
    let (header, payload) = verified.into_parts();
    let mut body = Object::new();
    body.insert("ok".into(), Value::Bool(true));
    body.insert("header".into(), Value::Object(header));
    body.insert("payload".into(), Value::Object(payload));
    body
}

fn error_body(code: &str, message: &str) -> Object {
    let mut body = Object::new();
    body.insert("ok".into(), Value::Bool(false));
    body.insert("error".into(), Value::String(code.into()));
    body.insert("message".into(), Value::String(message.into()));
    body
}

fn reply(status: StatusCode, body: Object) -> Response {
    (
        status,
        [(CONTENT_TYPE, "application/json")],
        json::to_string(&body),
    )
        .into_response()
}
