//! Shared utilities for integration tests.

use std::net::SocketAddr;

use axum::body::Body;
use axum::http::Request;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use resource_router::routing::PathParams;
use resource_router::{HttpServer, Registry, RouterConfig, Shutdown};

/// A router serving on an ephemeral local port, stopped on drop.
pub struct TestRouter {
    pub addr: SocketAddr,
    pub client: reqwest::Client,
    #[allow(dead_code)]
    pub updates: mpsc::UnboundedSender<Registry>,
    shutdown: Shutdown,
}

impl TestRouter {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

impl Drop for TestRouter {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

/// Start a router for `registry`.
pub async fn start_router(registry: Registry) -> TestRouter {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let mut config = RouterConfig::default();
    config.listener.bind_address = addr.to_string();

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    let (updates, updates_rx) = mpsc::unbounded_channel();
    let server = HttpServer::new(config, registry);

    tokio::spawn(async move {
        let _ = server.run(listener, updates_rx, server_shutdown).await;
    });

    let client = reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap();

    TestRouter {
        addr,
        client,
        updates,
        shutdown,
    }
}

/// Handler answering `label` followed by the bound params, e.g. `users.find id=7`.
#[allow(dead_code)]
pub fn labelled(
    label: &'static str,
) -> impl Fn(Request<Body>, PathParams) -> std::future::Ready<String> + Clone + Send + Sync + 'static
{
    move |_request, params| {
        let params: Vec<String> = params.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
        std::future::ready(format!("{} {}", label, params.join("&")).trim_end().to_string())
    }
}
