//! Parsed function signatures: selector, parameter schema, calldata decoding.

use std::borrow::Cow;

use alloy_dyn_abi::{DynSolType, DynSolValue};
use alloy_json_abi::Function;
use alloy_primitives::Selector;

use crate::decode::DecodeError;
use crate::registry::RegistryError;

/// Leading keywords of human-readable ABI items that cannot be called.
const NON_CALLABLE_KEYWORDS: &[&str] = &[
    "event",
    "error",
    "constructor",
    "fallback",
    "receive",
    "struct",
    "modifier",
];

/// One declared input of a registered function.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamSpec {
    /// Declared name, `None` when the signature leaves the parameter unnamed.
    pub name: Option<String>,
    /// Resolved ABI type.
    pub ty: DynSolType,
}

impl ParamSpec {
    /// Key under which this parameter's decoded value is exposed to handlers:
    /// the declared name, or the zero-based position when unnamed.
    #[must_use]
    pub fn key(&self, index: usize) -> Cow<'_, str> {
        match &self.name {
            Some(name) => Cow::Borrowed(name.as_str()),
            None => Cow::Owned(index.to_string()),
        }
    }
}

/// A registered off-chain-readable function.
///
/// Built once from a human-readable signature such as
/// `function text(bytes32 node, string key) view returns (string)` and never
/// mutated afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionSpec {
    name: String,
    signature: String,
    selector: Selector,
    params: Vec<ParamSpec>,
    input_type: DynSolType,
}

impl FunctionSpec {
    /// Parses a human-readable ABI signature.
    ///
    /// Returns `Ok(None)` when the signature describes an ABI item that is not
    /// a callable function (event, error, constructor, ...). Such items are
    /// accepted so callers can pass whole ABI fragments without filtering.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::InvalidSignature`] if the text is not a valid
    /// function signature or one of its parameter types cannot be resolved.
    pub fn parse(signature: &str) -> Result<Option<Self>, RegistryError> {
        let trimmed = signature.trim();
        if let Some(keyword) = leading_keyword(trimmed) {
            if NON_CALLABLE_KEYWORDS.contains(&keyword) {
                return Ok(None);
            }
        }

        let function = Function::parse(trimmed).map_err(|e| RegistryError::InvalidSignature {
            signature: signature.to_string(),
            reason: e.to_string(),
        })?;

        Self::from_abi(&function)
            .map(Some)
            .map_err(|reason| RegistryError::InvalidSignature {
                signature: signature.to_string(),
                reason,
            })
    }

    fn from_abi(function: &Function) -> Result<Self, String> {
        let params = function
            .inputs
            .iter()
            .map(|param| {
                let ty = DynSolType::parse(&param.selector_type()).map_err(|e| e.to_string())?;
                let name = (!param.name.is_empty()).then(|| param.name.clone());
                Ok(ParamSpec { name, ty })
            })
            .collect::<Result<Vec<_>, String>>()?;

        let input_type = DynSolType::Tuple(params.iter().map(|p| p.ty.clone()).collect());

        Ok(Self {
            name: function.name.clone(),
            signature: function.signature(),
            selector: function.selector(),
            params,
            input_type,
        })
    }

    /// Function name, e.g. `text`.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Canonical signature, e.g. `text(bytes32,string)`.
    #[must_use]
    pub fn signature(&self) -> &str {
        &self.signature
    }

    #[must_use]
    pub fn selector(&self) -> Selector {
        self.selector
    }

    /// Declared inputs in declaration order.
    #[must_use]
    pub fn params(&self) -> &[ParamSpec] {
        &self.params
    }

    /// Decodes full calldata (selector included) into one value per input.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::MissingSelector`] for calldata shorter than four
    /// bytes, [`DecodeError::SelectorMismatch`] when the prefix names another
    /// function, and [`DecodeError::Malformed`] when the arguments do not
    /// decode against the declared types.
    pub fn decode(&self, calldata: &[u8]) -> Result<Vec<DynSolValue>, DecodeError> {
        let Some((prefix, tail)) = calldata.split_first_chunk::<4>() else {
            return Err(DecodeError::MissingSelector {
                len: calldata.len(),
            });
        };

        let found = Selector::from(*prefix);
        if found != self.selector {
            return Err(DecodeError::SelectorMismatch {
                signature: self.signature.clone(),
                expected: self.selector,
                found,
            });
        }

        let malformed = |reason: String| DecodeError::Malformed {
            signature: self.signature.clone(),
            reason,
        };

        match self.input_type.abi_decode_params(tail) {
            Ok(DynSolValue::Tuple(values)) if values.len() == self.params.len() => Ok(values),
            Ok(other) => Err(malformed(format!("unexpected decoded shape {other:?}"))),
            Err(e) => Err(malformed(e.to_string())),
        }
    }
}

/// First word of a signature, up to whitespace or an opening parenthesis.
fn leading_keyword(signature: &str) -> Option<&str> {
    signature
        .split(|c: char| c.is_whitespace() || c == '(')
        .next()
        .filter(|word| !word.is_empty())
}
