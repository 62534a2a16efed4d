//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router; every request falls through to the dispatcher
//! - Wire up middleware (tracing, timeout, request ID)
//! - Serve on a bound listener until shutdown
//! - Apply registry reloads while serving

use std::sync::Arc;
use std::time::Duration;

use axum::{body::Body, extract::State, http::Request, response::Response, Router};
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::RouterConfig;
use crate::http::request::{propagate_request_id_layer, set_request_id_layer};
use crate::routing::{Dispatcher, Registry};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Arc<Dispatcher>,
}

/// HTTP front end of the router.
pub struct HttpServer {
    router: Router,
    dispatcher: Arc<Dispatcher>,
}

impl HttpServer {
    /// Create a server dispatching against `registry`.
    pub fn new(config: RouterConfig, registry: Registry) -> Self {
        let dispatcher = Arc::new(Dispatcher::new(registry));
        let state = AppState {
            dispatcher: dispatcher.clone(),
        };

        let router = Self::build_router(&config, state);
        Self { router, dispatcher }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &RouterConfig, state: AppState) -> Router {
        Router::new()
            .fallback(dispatch_handler)
            .with_state(state)
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(propagate_request_id_layer())
            .layer(TraceLayer::new_for_http())
            .layer(set_request_id_layer())
    }

    /// Run the server until `shutdown` fires.
    ///
    /// Registries received on `updates` replace the current one; requests in
    /// flight finish against the registry they started with.
    pub async fn run(
        self,
        listener: TcpListener,
        mut updates: mpsc::UnboundedReceiver<Registry>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            services = self.dispatcher.registry().services().len(),
            "HTTP server starting"
        );

        let dispatcher = self.dispatcher.clone();
        let reloader = tokio::spawn(async move {
            while let Some(registry) = updates.recv().await {
                dispatcher.reload(registry);
            }
        });

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        reloader.abort();
        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

async fn dispatch_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    state.dispatcher.dispatch(request).await
}
