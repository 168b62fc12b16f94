//! Per-request state threaded through a handler chain.

use std::sync::Arc;

use bytes::Bytes;

use crate::args::DecodedArguments;
use crate::function::FunctionSpec;

/// Which CCIP-read transport delivered the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Transport {
    Get,
    Post,
}

impl Transport {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "get",
            Self::Post => "post",
        }
    }
}

/// Per-call state handed by `&mut` to every unit of a handler chain.
/// Created after a successful decode and dropped when the request completes.
#[derive(Debug, Clone)]
pub struct CallContext {
    /// Transport the call arrived on.
    pub transport: Transport,
    /// Sender address as supplied by the client. Not validated.
    pub sender: String,
    /// Function the calldata was decoded against.
    pub function: Arc<FunctionSpec>,
    /// Full calldata, selector included.
    pub calldata: Bytes,
    /// Decoded arguments keyed by name or position.
    pub args: DecodedArguments,
    /// `signature` field of a POST body, passed through unchanged.
    pub signature: Option<String>,
}
