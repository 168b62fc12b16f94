//! Handler units and the ordered chains they form.
//!
//! A unit inspects the [`CallContext`] and either lets the chain continue or
//! terminates it with a response. Units run strictly in registration order
//! and the first `Respond` stops the chain.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::context::CallContext;

/// Response produced by a handler unit. Transport-agnostic: the HTTP layer
/// maps `status` onto a status code and serializes `body` as JSON.
#[derive(Debug, Clone, PartialEq)]
pub struct GatewayResponse {
    pub status: u16,
    pub body: Value,
}

impl GatewayResponse {
    /// 200 with a JSON body.
    #[must_use]
    pub fn json(body: Value) -> Self {
        Self { status: 200, body }
    }

    #[must_use]
    pub fn with_status(status: u16, body: Value) -> Self {
        Self { status, body }
    }

    /// 200 with the CCIP-read result shape `{"data": "0x..."}`.
    #[must_use]
    pub fn data(bytes: impl AsRef<[u8]>) -> Self {
        Self::json(json!({ "data": format!("0x{}", hex::encode(bytes)) }))
    }

    /// 404 with `{"message": ...}`.
    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::with_status(404, json!({ "message": message.into() }))
    }
}

/// What a unit decided.
#[derive(Debug, Clone, PartialEq)]
pub enum HandlerOutcome {
    /// Run the next unit.
    Continue,
    /// Stop the chain and send this response.
    Respond(GatewayResponse),
}

/// A single unit of a handler chain.
///
/// Errors are not interpreted by the chain; they propagate to the caller of
/// [`HandlerChain::run`] together with the failing unit's position.
#[async_trait]
pub trait CallHandler: Send + Sync + 'static {
    async fn handle(&self, ctx: &mut CallContext) -> anyhow::Result<HandlerOutcome>;
}

/// Adapter turning a synchronous closure into a [`CallHandler`].
pub struct FnHandler<F>(F);

/// Wraps a closure as a handler unit.
pub fn handler_fn<F>(f: F) -> FnHandler<F>
where
    F: Fn(&mut CallContext) -> anyhow::Result<HandlerOutcome> + Send + Sync + 'static,
{
    FnHandler(f)
}

#[async_trait]
impl<F> CallHandler for FnHandler<F>
where
    F: Fn(&mut CallContext) -> anyhow::Result<HandlerOutcome> + Send + Sync + 'static,
{
    async fn handle(&self, ctx: &mut CallContext) -> anyhow::Result<HandlerOutcome> {
        (self.0)(ctx)
    }
}

/// How a chain run ended.
#[derive(Debug, Clone, PartialEq)]
pub enum ChainOutcome {
    /// Unit at position `unit` responded; later units were not run.
    Responded { unit: usize, response: GatewayResponse },
    /// Every unit continued and none produced a response.
    Exhausted,
}

/// A unit failed. Carries the unit's position in the chain.
#[derive(Debug, thiserror::Error)]
#[error("handler unit {unit} failed")]
pub struct ChainError {
    pub unit: usize,
    #[source]
    pub source: anyhow::Error,
}

/// Ordered sequence of handler units bound to one function.
#[derive(Clone, Default)]
pub struct HandlerChain {
    units: Vec<Arc<dyn CallHandler>>,
}

impl HandlerChain {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Chain with a single unit.
    #[must_use]
    pub fn single(handler: impl CallHandler) -> Self {
        Self::new().then(handler)
    }

    /// Appends a unit to the end of the chain.
    #[must_use]
    pub fn then(mut self, handler: impl CallHandler) -> Self {
        self.units.push(Arc::new(handler));
        self
    }

    /// Appends an already shared unit, e.g. one reused across functions.
    #[must_use]
    pub fn then_shared(mut self, handler: Arc<dyn CallHandler>) -> Self {
        self.units.push(handler);
        self
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.units.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Runs units in order until one responds or all have continued.
    ///
    /// # Errors
    ///
    /// Returns [`ChainError`] with the position of the first unit that failed.
    pub async fn run(&self, ctx: &mut CallContext) -> Result<ChainOutcome, ChainError> {
        for (unit, handler) in self.units.iter().enumerate() {
            match handler.handle(ctx).await {
                Ok(HandlerOutcome::Continue) => {}
                Ok(HandlerOutcome::Respond(response)) => {
                    return Ok(ChainOutcome::Responded { unit, response });
                }
                Err(source) => return Err(ChainError { unit, source }),
            }
        }
        Ok(ChainOutcome::Exhausted)
    }
}

impl fmt::Debug for HandlerChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerChain")
            .field("units", &self.units.len())
            .finish()
    }
}
