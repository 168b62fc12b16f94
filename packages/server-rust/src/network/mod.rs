//! Networking: configuration, HTTP middleware, handlers, and lifecycle.

pub mod config;
pub mod handlers;
pub mod middleware;
pub mod module;
pub mod shutdown;

pub use config::*;
pub use handlers::gateway::gateway_router;
pub use handlers::AppState;
pub use module::NetworkModule;
pub use shutdown::*;
