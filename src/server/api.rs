use crate::bot::UpdateHandler;
use crate::models::telegram::Update;
use std::error::Error;
use std::net::SocketAddr;
use axum::{
    body::Bytes,
    extract::rejection::BytesRejection,
    routing::{ get, post },
    Router,
    extract::State,
    response::{ IntoResponse, Response },
    http::StatusCode,
    Json,
};
use serde::Serialize;
use log::{ info, error };

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    message: String,
}

#[derive(Clone)]
pub struct AppState {
    pub handler: UpdateHandler,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(health_handler).fallback(not_found))
        .route("/health", get(health_handler).fallback(not_found))
        .route("/webhook", post(webhook_handler).fallback(not_found))
        .fallback(not_found)
        .with_state(state)
}

pub async fn start_http_server(
    addr: SocketAddr,
    state: AppState
) -> Result<(), Box<dyn Error + Send + Sync>> {
    let listener = tokio::net::TcpListener
        ::bind(addr).await
        .map_err(|e| format!("Failed to bind HTTP server to {}: {}", addr, e))?;
    info!("Webhook server listening on: http://{}", addr);
    axum::serve(listener, router(state).into_make_service()).await?;
    Ok(())
}

async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        message: state.handler.agent().prompts().health_message.clone(),
    })
}

/// An unreadable body (over the size limit, or not JSON) is the only failure
/// surfaced to Telegram; everything past parsing is recovered inside the
/// handler.
async fn webhook_handler(
    State(state): State<AppState>,
    body: Result<Bytes, BytesRejection>
) -> Response {
    let body = match body {
        Ok(body) => body,
        Err(e) => {
            error!("Webhook error: {}", e);
            return (StatusCode::INTERNAL_SERVER_ERROR, "Error").into_response();
        }
    };
    let update = match Update::from_slice(&body) {
        Ok(update) => update,
        Err(e) => {
            error!("Webhook error: {}", e);
            return (StatusCode::INTERNAL_SERVER_ERROR, "Error").into_response();
        }
    };

    state.handler.handle_update(&update).await;
    (StatusCode::OK, "OK").into_response()
}

async fn not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, "Not Found")
}
