use crate::config::Config;
use crate::handlers::{health_check, issue_token, justify_text, service_stats, AppState, SharedState};
use crate::middleware::logging_middleware;
use axum::routing::{get, post};
use axum::{middleware, Router};
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tokio::task::JoinHandle;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Build the application router over an existing state. Exposed so
/// tests can drive the service in-process.
pub fn build_router(state: SharedState) -> Router {
    Router::new()
        .route("/api/token", post(issue_token))
        .route("/api/justify", post(justify_text))
        .route("/health", get(health_check))
        .route("/stats", get(service_stats))
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive())
                .layer(middleware::from_fn(logging_middleware)),
        )
}

pub struct Server {
    config: Config,
    state: SharedState,
}

impl Server {
    pub fn new(config: Config) -> crate::error::Result<Self> {
        config.validate()?;
        let state = Arc::new(AppState::new(config.clone()));
        Ok(Self { config, state })
    }

    pub async fn run(self) -> Result<(), Box<dyn std::error::Error>> {
        let sweepers = spawn_sweepers(&self.state, &self.config);
        let app = build_router(self.state);

        let listener = tokio::net::TcpListener::bind(self.config.bind_addr).await?;
        tracing::info!("Justifier server listening on {}", self.config.bind_addr);
        tracing::info!("Token issuance at POST /api/token, justification at POST /api/justify");

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        // The sweep loops hold state clones; stop them with the server.
        for handle in sweepers {
            handle.abort();
        }
        Ok(())
    }
}

fn spawn_sweepers(state: &SharedState, config: &Config) -> Vec<JoinHandle<()>> {
    let registry = state.registry.clone();
    let registry_interval = Duration::from_secs(config.registry_sweep_secs);
    let registry_task = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(registry_interval);
        ticker.tick().await; // first tick fires immediately
        loop {
            ticker.tick().await;
            match registry.sweep() {
                Ok(removed) if removed > 0 => {
                    tracing::debug!(
                        target: "justifier::server",
                        removed = removed,
                        "registry sweep deleted terminal tokens"
                    );
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::error!(target: "justifier::server", error = %e, "registry sweep failed");
                }
            }
        }
    });

    let limiter = state.limiter.clone();
    let limiter_interval = Duration::from_secs(config.limiter_sweep_secs);
    let limiter_task = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(limiter_interval);
        ticker.tick().await;
        loop {
            ticker.tick().await;
            match limiter.sweep() {
                Ok(removed) if removed > 0 => {
                    tracing::debug!(
                        target: "justifier::server",
                        removed = removed,
                        "usage sweep dropped expired samples"
                    );
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::error!(target: "justifier::server", error = %e, "usage sweep failed");
                }
            }
        }
    });

    vec![registry_task, limiter_task]
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        },
        _ = terminate => {
            tracing::info!("Received terminate signal, initiating graceful shutdown");
        },
    }
}
