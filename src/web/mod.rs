//! Browser front end: an upload form that returns the split invoices as
//! download links. Nothing is stored server-side; every download is embedded
//! in the result page.

pub mod handlers;
pub mod html;

use crate::types::{RuleOptions, DEFAULT_MARKERS};
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use html::FormValues;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

#[derive(Clone)]
pub struct AppState {
    defaults: Arc<RuleOptions>,
    max_upload_bytes: usize,
}

impl AppState {
    pub fn new(defaults: RuleOptions, max_upload_bytes: usize) -> Self {
        Self {
            defaults: Arc::new(defaults),
            max_upload_bytes,
        }
    }

    /// Form values pre-filled from the server's rule options.
    pub fn default_form(&self) -> FormValues {
        let markers = if self.defaults.markers.is_empty() {
            DEFAULT_MARKERS.join("\n")
        } else {
            self.defaults.markers.join("\n")
        };

        FormValues {
            markers,
            regex: self.defaults.regex.clone().unwrap_or_default(),
            use_regex: self.defaults.regex.is_some(),
            ignore_case: !self.defaults.case_sensitive,
            scan_chars: self
                .defaults
                .scan_limit
                .map(|n| n.to_string())
                .unwrap_or_default(),
        }
    }
}

pub fn create_router(state: AppState) -> Router {
    let body_limit = state.max_upload_bytes;

    Router::new()
        .route("/", get(handlers::index))
        .route("/split", post(handlers::split))
        .route("/health", get(handlers::health))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}

pub async fn run(addr: SocketAddr, state: AppState) -> anyhow::Result<()> {
    let app = create_router(state);

    let listener = TcpListener::bind(addr).await?;
    info!("Serving invoice splitter on http://{}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
