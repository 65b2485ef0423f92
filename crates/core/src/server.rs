//! Liveness HTTP endpoint.
//!
//! Hosting platforms poll this to decide the process is alive; it carries no
//! task state and never blocks on the browser.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tracing::info;

use crate::error::Result;

/// Shared state for the liveness handlers.
pub struct AppState {
	started_at: Instant,
}

impl AppState {
	pub fn new() -> Self {
		Self { started_at: Instant::now() }
	}
}

impl Default for AppState {
	fn default() -> Self {
		Self::new()
	}
}

pub fn build_router(state: Arc<AppState>) -> Router {
	Router::new()
		.route("/", get(health))
		.route("/healthz", get(health))
		.with_state(state)
}

async fn health(State(state): State<Arc<AppState>>) -> Json<Value> {
	Json(json!({
		"status": "ok",
		"uptime_secs": state.started_at.elapsed().as_secs(),
		"version": env!("CARGO_PKG_VERSION"),
	}))
}

/// Binds the listen socket, failing fast when the port is taken.
pub async fn bind(port: u16) -> Result<TcpListener> {
	let addr = SocketAddr::from(([0, 0, 0, 0], port));
	Ok(TcpListener::bind(addr).await?)
}

/// Serves the liveness router on an already-bound listener.
pub async fn serve(listener: TcpListener) -> Result<()> {
	let addr = listener.local_addr()?;
	info!(target = "chirp.http", %addr, "liveness endpoint listening");
	let router = build_router(Arc::new(AppState::new()));
	axum::serve(listener, router).await?;
	Ok(())
}
