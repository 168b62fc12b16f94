//! CCIP-read core: function registry, calldata decoding, and handler-chain dispatch.
//!
//! Framework-agnostic. The HTTP layer turns requests into [`GatewayRequest`]
//! values and [`DispatchOutcome`]s back into responses.

pub mod args;
pub mod context;
pub mod decode;
pub mod dispatch;
pub mod function;
pub mod handler;
pub mod names;
pub mod registry;
pub mod request;

pub use args::{abi_value_to_json, DecodedArguments};
pub use context::{CallContext, Transport};
pub use decode::DecodeError;
pub use dispatch::{DispatchError, DispatchOutcome, Dispatcher};
pub use function::{FunctionSpec, ParamSpec};
pub use handler::{
    handler_fn, CallHandler, ChainError, ChainOutcome, GatewayResponse, HandlerChain,
    HandlerOutcome,
};
pub use names::namehash;
pub use registry::{
    DuplicateSelectorPolicy, GatewayConfig, RegisteredFunction, RegistryError, SelectorRegistry,
    SelectorRegistryBuilder,
};
pub use request::{GatewayRequest, PostBody};

// Handler authors work with these directly.
pub use alloy_dyn_abi::DynSolValue;
pub use alloy_primitives::{Selector, B256};
