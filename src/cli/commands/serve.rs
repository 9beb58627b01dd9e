//! HTTP API server for the chat front end.
//!
//! Provides REST endpoints for session creation and retrieval-augmented
//! queries.

use super::{build_backend, build_session_store, build_vector_store};
use crate::auth::{Authenticator, Principal, StaticTokenAuthenticator};
use crate::chat::QueryOrchestrator;
use crate::cli::Output;
use crate::config::Settings;
use crate::error::CineRagError;
use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::error;

/// Shared application state.
struct AppState {
    orchestrator: QueryOrchestrator,
    authenticator: Option<StaticTokenAuthenticator>,
}

/// Run the HTTP API server.
pub async fn run_serve(host: Option<String>, port: Option<u16>, settings: Settings) -> anyhow::Result<()> {
    let vector_store = build_vector_store(&settings)?;
    let session_store = build_session_store(&settings)?;
    let backend = build_backend(&settings, vector_store, None);

    let orchestrator = QueryOrchestrator::new(
        session_store,
        backend,
        settings.chat.history_window,
        settings.completion.timeout_seconds,
    );

    let authenticator = settings
        .auth
        .enabled
        .then(|| StaticTokenAuthenticator::new(settings.auth.tokens.clone()));

    let state = Arc::new(AppState {
        orchestrator,
        authenticator,
    });

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/health", get(health))
        .route("/start_session", post(start_session))
        .route("/query", post(query))
        .layer(cors)
        .with_state(state);

    let host = host.unwrap_or_else(|| settings.server.host.clone());
    let port = port.unwrap_or(settings.server.port);
    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    Output::header("CineRAG API Server");
    println!();
    Output::success(&format!("Listening on http://{}", addr));
    println!();
    println!("Endpoints:");
    Output::kv("Health", "GET  /health");
    Output::kv("Start Session", "POST /start_session");
    Output::kv("Query", "POST /query");
    println!();
    Output::info("Press Ctrl+C to stop the server.");

    axum::serve(listener, app).await?;

    Ok(())
}

// === Request/Response Types ===

#[derive(Deserialize)]
struct StartSessionRequest {
    user_id: String,
}

#[derive(Serialize)]
struct StartSessionResponse {
    session_id: String,
}

#[derive(Deserialize)]
struct QueryRequest {
    user_id: String,
    session_id: String,
    user_query: String,
}

#[derive(Serialize)]
struct QueryResponse {
    answer: String,
}

#[derive(Serialize)]
struct ErrorResponse {
    detail: String,
}

// === Helpers ===

/// Extract the bearer token from the Authorization header.
fn extract_bearer(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Resolve the caller principal, enforcing auth when it is enabled.
fn resolve_principal(
    state: &AppState,
    headers: &HeaderMap,
) -> Result<Option<Principal>, CineRagError> {
    match &state.authenticator {
        None => Ok(None),
        Some(auth) => {
            let token = extract_bearer(headers)
                .ok_or_else(|| CineRagError::Auth("missing bearer token".to_string()))?;
            auth.verify(token).map(Some)
        }
    }
}

fn error_response(e: CineRagError) -> axum::response::Response {
    let status =
        StatusCode::from_u16(e.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    if status == StatusCode::INTERNAL_SERVER_ERROR {
        error!("Request failed: {}", e);
    }
    (
        status,
        Json(ErrorResponse {
            detail: e.to_string(),
        }),
    )
        .into_response()
}

// === Handlers ===

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn start_session(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<StartSessionRequest>,
) -> impl IntoResponse {
    let principal = match resolve_principal(&state, &headers) {
        Ok(p) => p,
        Err(e) => return error_response(e),
    };

    match state
        .orchestrator
        .start_session(&req.user_id, principal.map(|p| p.0))
        .await
    {
        Ok(session_id) => Json(StartSessionResponse { session_id }).into_response(),
        Err(e) => error_response(e),
    }
}

async fn query(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<QueryRequest>,
) -> impl IntoResponse {
    let principal = match resolve_principal(&state, &headers) {
        Ok(p) => p,
        Err(e) => return error_response(e),
    };

    match state
        .orchestrator
        .handle_query(
            &req.user_id,
            &req.session_id,
            &req.user_query,
            principal.as_ref().map(|p| p.as_str()),
        )
        .await
    {
        Ok(answer) => Json(QueryResponse { answer }).into_response(),
        Err(e) => error_response(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_bearer() {
        let mut headers = HeaderMap::new();
        assert_eq!(extract_bearer(&headers), None);

        headers.insert(
            axum::http::header::AUTHORIZATION,
            "Bearer secret-token".parse().unwrap(),
        );
        assert_eq!(extract_bearer(&headers), Some("secret-token"));

        headers.insert(axum::http::header::AUTHORIZATION, "Basic abc".parse().unwrap());
        assert_eq!(extract_bearer(&headers), None);

        headers.insert(axum::http::header::AUTHORIZATION, "Bearer ".parse().unwrap());
        assert_eq!(extract_bearer(&headers), None);
    }
}
