//! HTTP handler definitions for the gateway.
//!
//! Defines `AppState` (the shared state carried through axum extractors)
//! and re-exports the handler functions used to build the router.

pub mod gateway;
pub mod health;

pub use gateway::{ccip_get_handler, ccip_post_handler, gateway_routes, GatewayError};
pub use health::{health_handler, liveness_handler, readiness_handler};

use std::sync::Arc;
use std::time::Instant;

use ccip_read_core::Dispatcher;

use super::ShutdownController;

/// Shared application state passed to all axum handlers via `State` extraction.
///
/// Cloning is cheap: the dispatcher shares its registry and the controller
/// sits behind an `Arc`.
#[derive(Clone)]
pub struct AppState {
    /// Decodes calls and runs handler chains.
    pub dispatcher: Dispatcher,
    /// Health state and in-flight call tracking.
    pub shutdown: Arc<ShutdownController>,
    /// Process start time, used for uptime reporting.
    pub start_time: Instant,
}

impl AppState {
    #[must_use]
    pub fn new(dispatcher: Dispatcher, shutdown: Arc<ShutdownController>) -> Self {
        Self {
            dispatcher,
            shutdown,
            start_time: Instant::now(),
        }
    }
}
