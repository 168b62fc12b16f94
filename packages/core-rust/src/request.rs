//! Transport-level shapes of an inbound CCIP-read request.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::context::Transport;
use crate::decode::{parse_hex_calldata, DecodeError};

/// Extension every GET calldata path segment must carry.
pub const JSON_EXTENSION: &str = ".json";

/// JSON body of a `POST /` lookup.
///
/// `sender` and `data` default to empty strings so that a body missing them
/// fails calldata decoding (not-found) instead of body extraction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostBody {
    /// Address of the contract that raised `OffchainLookup`.
    #[serde(default)]
    pub sender: String,
    /// Full calldata, selector included, hex encoded.
    #[serde(default)]
    pub data: String,
    /// Opaque value handed through to handlers untouched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
}

/// An inbound lookup, as captured by the HTTP layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayRequest {
    /// `GET /{sender}/{calldata}.json`. `calldata` is the raw last path
    /// segment, extension included.
    Get { sender: String, calldata: String },
    /// `POST /` with a JSON body.
    Post(PostBody),
}

impl GatewayRequest {
    #[must_use]
    pub fn transport(&self) -> Transport {
        match self {
            Self::Get { .. } => Transport::Get,
            Self::Post(_) => Transport::Post,
        }
    }

    #[must_use]
    pub fn sender(&self) -> &str {
        match self {
            Self::Get { sender, .. } => sender,
            Self::Post(body) => &body.sender,
        }
    }

    /// Pulls raw calldata bytes out of the transport-specific location.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::MissingJsonExtension`] for a GET segment without
    /// the `.json` suffix and [`DecodeError::InvalidHex`] for non-hex data.
    pub fn calldata(&self) -> Result<Bytes, DecodeError> {
        match self {
            Self::Get { calldata, .. } => {
                let hex = calldata
                    .strip_suffix(JSON_EXTENSION)
                    .ok_or(DecodeError::MissingJsonExtension)?;
                parse_hex_calldata(hex)
            }
            Self::Post(body) => parse_hex_calldata(&body.data),
        }
    }

    /// Splits the request into its sender and pass-through signature.
    #[must_use]
    pub fn into_parts(self) -> (String, Option<String>) {
        match self {
            Self::Get { sender, .. } => (sender, None),
            Self::Post(body) => (body.sender, body.signature),
        }
    }
}
