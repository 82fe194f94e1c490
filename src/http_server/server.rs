//! # HTTP Server
//!
//! Role routes plus health and metrics, bounded by a per-request timeout.

use std::future::Future;
use std::net::SocketAddr;

use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;

use super::config::HttpServerConfig;
use super::observability_routes::observability_routes;
use super::role_routes::role_routes;
use crate::observability::{Event, Logger};
use crate::registry::RoleRegistry;

/// HTTP server over one registry
pub struct HttpServer {
    config: HttpServerConfig,
    router: Router,
}

impl HttpServer {
    pub fn new(config: HttpServerConfig, registry: RoleRegistry) -> Self {
        let router = Self::build_router(&config, registry);
        Self { config, router }
    }

    fn build_router(config: &HttpServerConfig, registry: RoleRegistry) -> Router {
        let metrics = registry.metrics().clone();

        let origins: Vec<_> = config
            .cors_origins
            .iter()
            .filter_map(|s| s.parse().ok())
            .collect();
        let cors = CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods(Any)
            .allow_headers(Any);

        Router::new()
            .merge(observability_routes(metrics))
            .merge(role_routes(registry))
            .layer(TimeoutLayer::new(config.request_timeout()))
            .layer(cors)
    }

    /// Get the socket address
    pub fn socket_addr(&self) -> String {
        self.config.socket_addr()
    }

    /// Get the router (for testing)
    pub fn router(self) -> Router {
        self.router
    }

    /// Bind and serve until `shutdown` resolves.
    pub async fn start<F>(self, shutdown: F) -> Result<(), std::io::Error>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr: SocketAddr = self.config.socket_addr().parse().map_err(|e| {
            std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("invalid socket address '{}': {}", self.config.socket_addr(), e),
            )
        })?;

        let listener = TcpListener::bind(addr).await?;
        let bound = listener.local_addr()?.to_string();
        Logger::info(
            Event::Serving,
            &[("surface", "http"), ("addr", bound.as_str())],
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown)
            .await
    }
}
