//! HTTP server
//!
//! Starts and manages the axum-based HTTP server.

use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::info;

use relay_core::{Config, LlmClient, RelayStore};
use relay_meta::{CloudApi, OauthClient};
use relay_twilio::TwilioClient;

use crate::routes::routes;

/// Shared application state.
///
/// Optional integrations stay None when their credentials are absent;
/// handlers degrade per endpoint instead of failing at startup.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub llm: Arc<LlmClient>,
    pub meta: Option<Arc<CloudApi>>,
    pub twilio: Option<Arc<TwilioClient>>,
    pub oauth: Option<Arc<OauthClient>>,
    pub store: Option<Arc<RelayStore>>,
}

impl AppState {
    /// Assemble state from configuration, building each integration that
    /// has credentials
    pub fn from_config(config: Config, store: Option<RelayStore>) -> crate::Result<Self> {
        let llm = Arc::new(LlmClient::new(config.llm.clone())?);
        let meta = CloudApi::from_config(&config.meta).map(Arc::new);
        let oauth = OauthClient::from_config(&config.meta).map(Arc::new);
        let twilio = config
            .twilio
            .as_ref()
            .map(|t| Arc::new(TwilioClient::from_config(t)));

        Ok(Self {
            config: Arc::new(config),
            llm,
            meta,
            twilio,
            oauth,
            store: store.map(Arc::new),
        })
    }
}

/// Build the application router with middleware applied
pub fn app(state: AppState) -> Router {
    Router::new()
        .merge(routes())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Start the HTTP server and serve until the listener fails
pub async fn start_server(state: AppState) -> anyhow::Result<()> {
    let port = state.config.server.port;
    let addr = SocketAddr::from(([0, 0, 0, 0], port));

    let router = app(state);

    info!("Relay gateway listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router).await?;

    Ok(())
}
