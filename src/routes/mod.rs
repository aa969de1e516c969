pub mod health;
pub mod history;
pub mod proxy;
pub mod saved;

use crate::config::Config;
use crate::error::{AppError, TransportError};
use crate::proxy::{Executor, FigmaProxyService, ProxyService, UpstreamClient};
use crate::store::{Database, HistoryStore, SavedRequestStore};
use axum::{
    extract::FromRequest,
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;

/// `Json` extractor whose rejections render as the `{success:false, error}` body.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct AppJson<T>(pub T);

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub proxy: Arc<dyn ProxyService>,
    pub saved: SavedRequestStore,
    pub history: HistoryStore,
    /// Forwarded upstream on every execution; absent means executions are rejected.
    pub access_token: Option<String>,
}

impl AppState {
    /// Wires the production service graph from configuration.
    pub fn from_config(config: &Config, db: Arc<Database>) -> Result<Self, TransportError> {
        let history = HistoryStore::new(db.clone(), config.history_limit);
        let upstream = UpstreamClient::from_config(config)?;
        let proxy = FigmaProxyService::arc(Executor::new(upstream, history.clone()));

        Ok(Self {
            proxy,
            saved: SavedRequestStore::new(db),
            history,
            access_token: config.access_token.clone(),
        })
    }
}

/// Builds the `/api` router.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health::health_check))
        .route("/api/figma/proxy", post(proxy::proxy_request))
        .route("/api/figma/page", post(proxy::page_request))
        .route(
            "/api/saved-requests",
            get(saved::list_saved).post(saved::create_saved),
        )
        .route(
            "/api/saved-requests/:id",
            put(saved::update_saved).delete(saved::delete_saved),
        )
        .route("/api/saved-requests/:id/replay", post(saved::replay_saved))
        .route(
            "/api/request-history",
            get(history::list_history).delete(history::clear_history),
        )
        .with_state(state)
}
