//! Liveness probe for the hosting platform.

use std::io;

use axum::{routing::get, Json, Router};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tracing::info;

/// Router exposing the single health route the host polls.
#[must_use]
pub fn app() -> Router {
    Router::new().route("/", get(health_handler))
}

pub async fn bind(port: u16) -> io::Result<TcpListener> {
    let listener = TcpListener::bind(("0.0.0.0", port)).await?;
    info!(port, "liveness endpoint listening");
    Ok(listener)
}

pub async fn serve(listener: TcpListener) -> io::Result<()> {
    axum::serve(listener, app()).await
}

async fn health_handler() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
