use std::collections::HashMap;
use std::sync::Arc;

use alloy_primitives::Selector;
use tracing::{debug, warn};

use crate::decode::{selector_of, DecodeError};
use crate::function::FunctionSpec;
use crate::handler::HandlerChain;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// What to do when two registered signatures share a selector.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DuplicateSelectorPolicy {
    /// Keep the first registration; later ones are shadowed and logged.
    #[default]
    FirstWins,
    /// Fail the registry build.
    Reject,
}

/// Registry-level settings.
#[derive(Debug, Clone, Default)]
pub struct GatewayConfig {
    pub duplicate_selectors: DuplicateSelectorPolicy,
}

/// Configuration errors raised while building a [`SelectorRegistry`].
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum RegistryError {
    #[error("invalid function signature `{signature}`: {reason}")]
    InvalidSignature { signature: String, reason: String },
    #[error("function `{signature}` has an empty handler chain")]
    EmptyChain { signature: String },
    #[error("selector {selector} of `{second}` is already taken by `{first}`")]
    DuplicateSelector {
        selector: Selector,
        first: String,
        second: String,
    },
}

// ---------------------------------------------------------------------------
// SelectorRegistry
// ---------------------------------------------------------------------------

/// A function together with the chain that serves it.
#[derive(Debug, Clone)]
pub struct RegisteredFunction {
    pub spec: Arc<FunctionSpec>,
    pub chain: HandlerChain,
}

/// Immutable selector → function table, built once at startup.
///
/// Entries keep registration order; each selector resolves to exactly one
/// entry. Lookups are shared by both transports, so a GET and a POST carrying
/// the same calldata always reach the same chain.
#[derive(Debug, Default)]
pub struct SelectorRegistry {
    entries: Vec<RegisteredFunction>,
    by_selector: HashMap<Selector, usize>,
}

impl SelectorRegistry {
    #[must_use]
    pub fn builder() -> SelectorRegistryBuilder {
        SelectorRegistryBuilder::default()
    }

    /// Entry registered for `selector`, if any.
    #[must_use]
    pub fn lookup(&self, selector: &Selector) -> Option<&RegisteredFunction> {
        self.by_selector.get(selector).map(|&i| &self.entries[i])
    }

    /// Entry whose selector prefixes `calldata`.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::MissingSelector`] for calldata shorter than four
    /// bytes and [`DecodeError::UnknownSelector`] when nothing is registered
    /// for its prefix.
    pub fn resolve(&self, calldata: &[u8]) -> Result<&RegisteredFunction, DecodeError> {
        let selector = selector_of(calldata)?;
        self.lookup(&selector)
            .ok_or(DecodeError::UnknownSelector { selector })
    }

    /// Routable functions in registration order.
    pub fn functions(&self) -> impl Iterator<Item = &FunctionSpec> {
        self.entries.iter().map(|e| e.spec.as_ref())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ---------------------------------------------------------------------------
// SelectorRegistryBuilder
// ---------------------------------------------------------------------------

/// Collects `(signature, chain)` pairs in order and validates them on build.
#[derive(Debug, Default)]
pub struct SelectorRegistryBuilder {
    config: GatewayConfig,
    pending: Vec<(String, HandlerChain)>,
}

impl SelectorRegistryBuilder {
    #[must_use]
    pub fn config(mut self, config: GatewayConfig) -> Self {
        self.config = config;
        self
    }

    /// Registers a human-readable signature with its handler chain.
    #[must_use]
    pub fn function(mut self, signature: impl Into<String>, chain: HandlerChain) -> Self {
        self.pending.push((signature.into(), chain));
        self
    }

    /// Parses every signature and builds the lookup table.
    ///
    /// Signatures naming non-callable ABI items are skipped without error.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::InvalidSignature`] for unparsable signatures,
    /// [`RegistryError::EmptyChain`] for a function without handlers, and
    /// [`RegistryError::DuplicateSelector`] under
    /// [`DuplicateSelectorPolicy::Reject`].
    pub fn build(self) -> Result<SelectorRegistry, RegistryError> {
        let mut registry = SelectorRegistry::default();

        for (signature, chain) in self.pending {
            let Some(spec) = FunctionSpec::parse(&signature)? else {
                debug!(signature = %signature, "skipping non-function ABI item");
                continue;
            };

            if chain.is_empty() {
                return Err(RegistryError::EmptyChain {
                    signature: spec.signature().to_string(),
                });
            }

            let selector = spec.selector();
            if let Some(&existing) = registry.by_selector.get(&selector) {
                let first = registry.entries[existing].spec.signature().to_string();
                match self.config.duplicate_selectors {
                    DuplicateSelectorPolicy::Reject => {
                        return Err(RegistryError::DuplicateSelector {
                            selector,
                            first,
                            second: spec.signature().to_string(),
                        });
                    }
                    DuplicateSelectorPolicy::FirstWins => {
                        warn!(
                            selector = %selector,
                            first = %first,
                            shadowed = %spec.signature(),
                            "duplicate selector, keeping first registration"
                        );
                        continue;
                    }
                }
            }

            debug!(selector = %selector, signature = %spec.signature(), "registered function");
            registry.by_selector.insert(selector, registry.entries.len());
            registry.entries.push(RegisteredFunction {
                spec: Arc::new(spec),
                chain,
            });
        }

        Ok(registry)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
