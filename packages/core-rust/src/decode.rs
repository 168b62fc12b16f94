//! Decode failures and hex calldata parsing.
//!
//! Every way an inbound request can fail to produce arguments collapses into
//! [`DecodeError`]. Both transports surface it the same way: the handler
//! chain is skipped and the caller receives a not-found result.

use alloy_primitives::Selector;
use bytes::Bytes;

/// Why a request's calldata could not be turned into arguments.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum DecodeError {
    #[error("calldata path segment must end in `.json`")]
    MissingJsonExtension,
    #[error("request body is not a lookup object: {0}")]
    InvalidBody(String),
    #[error("calldata is not valid hex: {0}")]
    InvalidHex(String),
    #[error("calldata is {len} bytes, shorter than a 4-byte selector")]
    MissingSelector { len: usize },
    #[error("no function registered for selector {selector}")]
    UnknownSelector { selector: Selector },
    #[error("selector {found} does not match `{signature}` ({expected})")]
    SelectorMismatch {
        signature: String,
        expected: Selector,
        found: Selector,
    },
    #[error("calldata does not decode as `{signature}`: {reason}")]
    Malformed { signature: String, reason: String },
}

/// Parses hex calldata with an optional `0x` prefix.
///
/// # Errors
///
/// Returns [`DecodeError::InvalidHex`] for odd-length input or non-hex digits.
pub fn parse_hex_calldata(text: &str) -> Result<Bytes, DecodeError> {
    let digits = text
        .strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
        .unwrap_or(text);
    hex::decode(digits)
        .map(Bytes::from)
        .map_err(|e| DecodeError::InvalidHex(e.to_string()))
}

/// Reads the 4-byte selector at the start of calldata.
///
/// # Errors
///
/// Returns [`DecodeError::MissingSelector`] when fewer than four bytes are present.
pub fn selector_of(calldata: &[u8]) -> Result<Selector, DecodeError> {
    calldata
        .first_chunk::<4>()
        .map(|prefix| Selector::from(*prefix))
        .ok_or(DecodeError::MissingSelector {
            len: calldata.len(),
        })
}
