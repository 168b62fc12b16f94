//! Request decoding and handler-chain dispatch.
//!
//! Flow for one request:
//!
//! 1. Extract calldata from the transport-specific location
//! 2. Resolve the registered function by the 4-byte selector prefix
//! 3. Decode the arguments and build a [`CallContext`]
//! 4. Run the function's handler chain against the context
//!
//! Any failure in steps 1–3 yields [`DispatchOutcome::NotFound`] and the
//! chain is never run. GET and POST share this path.

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, field, info_span, Instrument, Span};

use crate::args::DecodedArguments;
use crate::context::CallContext;
use crate::decode::DecodeError;
use crate::handler::{ChainError, ChainOutcome, GatewayResponse};
use crate::registry::{RegisteredFunction, SelectorRegistry};
use crate::request::GatewayRequest;

/// Result of dispatching one request.
#[derive(Debug, Clone, PartialEq)]
pub enum DispatchOutcome {
    /// A handler unit responded.
    Responded(GatewayResponse),
    /// Every unit continued without responding.
    Exhausted,
    /// The request did not decode against any registered function.
    NotFound(DecodeError),
}

impl DispatchOutcome {
    fn label(&self) -> &'static str {
        match self {
            Self::Responded(_) => "responded",
            Self::Exhausted => "exhausted",
            Self::NotFound(_) => "not_found",
        }
    }
}

/// A handler unit failed while serving a decoded call.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("handler unit {unit} of `{signature}` failed")]
    Handler {
        signature: String,
        unit: usize,
        #[source]
        source: anyhow::Error,
    },
}

/// Decodes inbound requests against a [`SelectorRegistry`] and runs the
/// matching handler chain. Cheap to clone; the registry is shared.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    registry: Arc<SelectorRegistry>,
}

impl Dispatcher {
    #[must_use]
    pub fn new(registry: Arc<SelectorRegistry>) -> Self {
        Self { registry }
    }

    #[must_use]
    pub fn registry(&self) -> &SelectorRegistry {
        &self.registry
    }

    /// Decodes a request into the context its handler chain would receive.
    ///
    /// # Errors
    ///
    /// Returns the [`DecodeError`] describing why the request does not match
    /// a registered function.
    pub fn decode(&self, request: GatewayRequest) -> Result<CallContext, DecodeError> {
        self.prepare(request).map(|(_, ctx)| ctx)
    }

    fn prepare(
        &self,
        request: GatewayRequest,
    ) -> Result<(&RegisteredFunction, CallContext), DecodeError> {
        let transport = request.transport();
        let calldata = request.calldata()?;
        let entry = self.registry.resolve(&calldata)?;
        Span::current().record("selector", field::display(entry.spec.selector()));

        let values = entry.spec.decode(&calldata)?;
        let args = DecodedArguments::new(entry.spec.params(), values);
        let (sender, signature) = request.into_parts();

        let ctx = CallContext {
            transport,
            sender,
            function: Arc::clone(&entry.spec),
            calldata,
            args,
            signature,
        };
        Ok((entry, ctx))
    }

    /// Decodes the request and runs the bound handler chain.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::Handler`] when a unit fails. Decode failures
    /// are not errors; they come back as [`DispatchOutcome::NotFound`].
    pub async fn dispatch(&self, request: GatewayRequest) -> Result<DispatchOutcome, DispatchError> {
        let transport = request.transport().as_str();
        let span = info_span!(
            "ccip_call",
            transport = transport,
            selector = field::Empty,
            outcome = field::Empty,
        );

        async move {
            let start = Instant::now();
            let result = self.run(request).await;

            let outcome = match &result {
                Ok(o) => o.label(),
                Err(_) => "error",
            };
            Span::current().record("outcome", outcome);
            metrics::counter!("ccip_requests_total", "transport" => transport, "outcome" => outcome)
                .increment(1);
            metrics::histogram!("ccip_dispatch_duration_seconds", "transport" => transport)
                .record(start.elapsed().as_secs_f64());

            result
        }
        .instrument(span)
        .await
    }

    async fn run(&self, request: GatewayRequest) -> Result<DispatchOutcome, DispatchError> {
        let (entry, mut ctx) = match self.prepare(request) {
            Ok(prepared) => prepared,
            Err(err) => {
                debug!(error = %err, "calldata rejected");
                return Ok(DispatchOutcome::NotFound(err));
            }
        };

        match entry.chain.run(&mut ctx).await {
            Ok(ChainOutcome::Responded { response, .. }) => Ok(DispatchOutcome::Responded(response)),
            Ok(ChainOutcome::Exhausted) => Ok(DispatchOutcome::Exhausted),
            Err(ChainError { unit, source }) => Err(DispatchError::Handler {
                signature: entry.spec.signature().to_string(),
                unit,
                source,
            }),
        }
    }
}
