//! Network module with deferred startup lifecycle.
//!
//! `new()` allocates shared state, `start()` binds the TCP listener, and
//! `serve()` accepts connections. Splitting bind from serve lets callers
//! learn the OS-assigned port before traffic flows.

use std::future::Future;
use std::sync::Arc;

use axum::routing::get;
use axum::Router;
use ccip_read_core::{Dispatcher, SelectorRegistry};
use tokio::net::TcpListener;
use tracing::{info, warn};

use super::config::NetworkConfig;
use super::handlers::{
    gateway_routes, health_handler, liveness_handler, readiness_handler, AppState,
};
use super::middleware::apply_http_layers;
use super::shutdown::ShutdownController;

/// Manages the gateway's HTTP server lifecycle.
///
/// 1. `new()` -- allocates the dispatcher and shutdown controller
/// 2. `start()` -- binds the TCP listener
/// 3. `serve()` -- serves until the shutdown future resolves, then drains
pub struct NetworkModule {
    config: NetworkConfig,
    listener: Option<TcpListener>,
    dispatcher: Dispatcher,
    shutdown: Arc<ShutdownController>,
}

impl NetworkModule {
    /// Creates a module for `registry` without binding any port.
    #[must_use]
    pub fn new(config: NetworkConfig, registry: Arc<SelectorRegistry>) -> Self {
        Self {
            config,
            listener: None,
            dispatcher: Dispatcher::new(registry),
            shutdown: Arc::new(ShutdownController::new()),
        }
    }

    /// Shared handle to the shutdown controller.
    #[must_use]
    pub fn shutdown_controller(&self) -> Arc<ShutdownController> {
        Arc::clone(&self.shutdown)
    }

    /// Assembles the router with all routes and middleware.
    ///
    /// Routes:
    /// - `GET /health` -- health JSON
    /// - `GET /health/live` -- liveness probe
    /// - `GET /health/ready` -- readiness probe
    /// - `GET /{sender}/{calldata}.json` -- CCIP-read lookup
    /// - `POST /` -- CCIP-read lookup
    pub fn build_router(&self) -> Router {
        let state = AppState::new(self.dispatcher.clone(), Arc::clone(&self.shutdown));

        let router = Router::new()
            .route("/health", get(health_handler))
            .route("/health/live", get(liveness_handler))
            .route("/health/ready", get(readiness_handler))
            .merge(gateway_routes())
            .with_state(state);

        apply_http_layers(router, &self.config)
    }

    /// Binds the TCP listener and returns the bound port (which differs from
    /// the configured one when port 0 is used).
    ///
    /// # Errors
    ///
    /// Returns an error if the address cannot be bound.
    pub async fn start(&mut self) -> anyhow::Result<u16> {
        let listener = TcpListener::bind(self.config.bind_addr()).await?;
        let port = listener.local_addr()?.port();

        info!(
            host = %self.config.host,
            port,
            functions = self.dispatcher.registry().len(),
            "gateway listener bound"
        );

        self.listener = Some(listener);
        Ok(port)
    }

    /// Serves until `shutdown` resolves, then waits up to `drain_timeout`
    /// for admitted calls to finish.
    ///
    /// # Errors
    ///
    /// Returns an error if the server hits a fatal I/O error.
    ///
    /// # Panics
    ///
    /// Panics if `start()` was not called before `serve()`.
    pub async fn serve(
        mut self,
        shutdown: impl Future<Output = ()> + Send + 'static,
    ) -> anyhow::Result<()> {
        let listener = self
            .listener
            .take()
            .expect("start() must be called before serve()");
        let router = self.build_router();
        let controller = Arc::clone(&self.shutdown);

        controller.set_ready();
        info!("serving CCIP-read requests");

        let signal_controller = Arc::clone(&controller);
        axum::serve(listener, router)
            .with_graceful_shutdown(async move {
                shutdown.await;
                signal_controller.trigger_shutdown();
            })
            .await?;

        if controller.wait_for_drain(self.config.drain_timeout).await {
            info!("all in-flight calls drained");
        } else {
            warn!(
                in_flight = controller.in_flight_count(),
                "drain timeout expired with calls still running"
            );
        }
        Ok(())
    }
}
