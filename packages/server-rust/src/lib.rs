//! CCIP-read gateway server: axum transport for `ccip-read-core`.

pub mod network;

pub use network::{gateway_router, NetworkConfig, NetworkModule};
