//! Decoded call arguments keyed by parameter name or position.

use alloy_dyn_abi::DynSolValue;
use serde_json::{Map, Value};

use crate::function::ParamSpec;

/// Ordered mapping from argument key to decoded ABI value.
///
/// Keys follow the declared parameter names, falling back to the zero-based
/// position rendered as a decimal string for unnamed parameters. Iteration
/// order is declaration order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DecodedArguments {
    entries: Vec<(String, DynSolValue)>,
}

impl DecodedArguments {
    /// Pairs decoded values with the parameters they were decoded against.
    #[must_use]
    pub fn new(params: &[ParamSpec], values: Vec<DynSolValue>) -> Self {
        let entries = params
            .iter()
            .enumerate()
            .zip(values)
            .map(|((index, param), value)| (param.key(index).into_owned(), value))
            .collect();
        Self { entries }
    }

    /// Looks up an argument by its key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&DynSolValue> {
        self.entries
            .iter()
            .find_map(|(k, v)| (k == key).then_some(v))
    }

    /// Looks up an argument by declaration position regardless of its key.
    #[must_use]
    pub fn get_index(&self, index: usize) -> Option<&DynSolValue> {
        self.entries.get(index).map(|(_, v)| v)
    }

    /// Convenience accessor for `string` arguments.
    #[must_use]
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(DynSolValue::as_str)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &DynSolValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Renders all arguments as a JSON object (see [`abi_value_to_json`]).
    #[must_use]
    pub fn to_json(&self) -> Value {
        let map: Map<String, Value> = self
            .entries
            .iter()
            .map(|(k, v)| (k.clone(), abi_value_to_json(v)))
            .collect();
        Value::Object(map)
    }
}

/// Renders a decoded ABI value as JSON.
///
/// Integers become decimal strings (they routinely exceed 2^53), byte
/// strings become `0x`-prefixed lowercase hex, addresses are EIP-55
/// checksummed, and arrays and tuples become JSON arrays.
#[must_use]
pub fn abi_value_to_json(value: &DynSolValue) -> Value {
    match value {
        DynSolValue::Bool(b) => Value::Bool(*b),
        DynSolValue::Int(i, _) => Value::String(i.to_string()),
        DynSolValue::Uint(u, _) => Value::String(u.to_string()),
        DynSolValue::FixedBytes(word, size) => Value::String(prefixed_hex(&word.as_slice()[..*size])),
        DynSolValue::Address(address) => Value::String(address.to_checksum(None)),
        DynSolValue::Function(function) => Value::String(prefixed_hex(function.as_slice())),
        DynSolValue::Bytes(bytes) => Value::String(prefixed_hex(bytes)),
        DynSolValue::String(s) => Value::String(s.clone()),
        DynSolValue::Array(items) | DynSolValue::FixedArray(items) | DynSolValue::Tuple(items) => {
            Value::Array(items.iter().map(abi_value_to_json).collect())
        }
        #[allow(unreachable_patterns)]
        _ => Value::Null,
    }
}

fn prefixed_hex(bytes: &[u8]) -> String {
    format!("0x{}", hex::encode(bytes))
}
