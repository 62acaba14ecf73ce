//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with public and admin surfaces
//! - Wire up middleware (tracing, request timeout, admin auth)
//! - Bind server to listener, serve with graceful shutdown
//!
//! The public surface (`/healthz`, `/verify/{payload}`) is read-only and
//! unauthenticated. Everything that touches request or credential
//! lifecycle is behind the bearer-token admin middleware.

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::chain::ChainClient;
use crate::config::CredchainConfig;
use crate::credentials::CredentialWorkflow;
use crate::http::auth::admin_auth_middleware;
use crate::http::handlers;
use crate::verification::VerificationResolver;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub workflow: Arc<CredentialWorkflow>,
    pub resolver: Arc<VerificationResolver>,
    pub chain: ChainClient,
    pub admin_api_key: String,
}

/// HTTP server for the credential service.
pub struct HttpServer {
    router: Router,
    config: CredchainConfig,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(
        config: CredchainConfig,
        workflow: Arc<CredentialWorkflow>,
        resolver: Arc<VerificationResolver>,
        chain: ChainClient,
    ) -> Self {
        let state = AppState {
            workflow,
            resolver,
            chain,
            admin_api_key: config.admin.api_key.clone(),
        };

        let router = Self::build_router(&config, state);
        Self { router, config }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(config: &CredchainConfig, state: AppState) -> Router {
        let admin = Router::new()
            .route("/status", get(handlers::get_status))
            .route("/requests", post(handlers::submit_request))
            .route("/requests", get(handlers::list_requests))
            .route("/requests/{id}", get(handlers::get_request))
            .route("/requests/{id}/approve", post(handlers::approve_request))
            .route(
                "/requests/{id}/approve-off-chain",
                post(handlers::approve_off_chain),
            )
            .route("/requests/{id}/reject", post(handlers::reject_request))
            .route(
                "/requests/{id}/reconcile",
                post(handlers::reconcile_request),
            )
            .route(
                "/credentials/{number}/revoke",
                post(handlers::revoke_credential),
            )
            .layer(middleware::from_fn_with_state(
                state.clone(),
                admin_auth_middleware,
            ));

        Router::new()
            .route("/healthz", get(handlers::health))
            .route("/verify", get(handlers::verify_query))
            .route("/verify/{payload}", get(handlers::verify))
            .merge(admin)
            .with_state(state)
            .layer(TimeoutLayer::new(Duration::from_secs(
                config.listener.request_timeout_secs,
            )))
            .layer(TraceLayer::new_for_http())
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(self, listener: TcpListener) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            "HTTP server starting"
        );

        let app = self
            .router
            .into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &CredchainConfig {
        &self.config
    }
}

/// Wait for shutdown signal (Ctrl+C).
async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install Ctrl+C handler");
    tracing::info!("Shutdown signal received");
}
