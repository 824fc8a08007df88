// Run and routing helpers (build_router, run_server, idle-room sweeper).

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::{routing::get, Json, Router};
use tokio::task::JoinHandle;
use tower_http::services::ServeDir;

use crate::server::registry::RoomRegistry;
use crate::server::AppState;

pub fn build_router(state: AppState) -> Router {
    let router = Router::new()
        .route(
            "/health",
            get(|| async { Json(serde_json::json!({ "ok": true })) }),
        )
        .route("/ws", get(crate::server::ws::ws_handler))
        .route("/events", get(crate::server::sse::events_handler))
        .route("/api/rooms", get(crate::server::http::rooms_handler))
        .route("/api/rooms/:room", get(crate::server::http::room_handler));

    // Optional Display Client bundle; everything else falls through to it.
    let router = match &state.config.static_dir {
        Some(dir) => {
            router.fallback_service(ServeDir::new(dir).append_index_html_on_directories(true))
        }
        None => router,
    };
    router.with_state(state)
}

/// Periodically drop rooms whose roster has been empty for `idle`.
pub fn spawn_sweeper(
    registry: Arc<RoomRegistry>,
    every: Duration,
    idle: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            let removed = registry.sweep_idle(idle).await;
            if !removed.is_empty() {
                tracing::debug!(count = removed.len(), rooms = ?removed, "sweeper pass");
            }
        }
    })
}

pub async fn run_server(addr: SocketAddr, state: AppState) -> Result<()> {
    let app = build_router(state.clone());

    let _sweeper = spawn_sweeper(
        Arc::clone(&state.registry),
        state.config.sweep_interval(),
        state.config.room_idle(),
    );

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind to {}", addr))?;
    let local = listener
        .local_addr()
        .with_context(|| "reading bound listener address")?;

    let display_addr = if local.ip().is_loopback() {
        format!("localhost:{}", local.port())
    } else {
        local.to_string()
    };
    tracing::info!(display_addr = %display_addr, "Castlefall server running");
    tracing::info!(
        ws = %format!("ws://{display_addr}/ws"),
        events = %format!("http://{display_addr}/events?room=<room>"),
        "endpoints"
    );

    axum::serve(listener, app)
        .await
        .with_context(|| "serving HTTP")?;
    Ok(())
}
