//! Schema checks that turn raw node JSON into validated, typed objects.
//!
//! A schema is an allow-list: only the keys it names are read from the input, and a key
//! whose check yields no value is left out of the result. Any failing field fails the
//! whole object.

pub mod formats;

use num_bigint::BigUint;
use num_traits::{ToPrimitive, Zero};
use serde::de::DeserializeOwned;
use serde_json::{json, Map, Value};

use crate::codec::primitives::{format_quantity, parse_quantity, strip_hex_prefix};
use crate::codec::{contract_address, Address};
use crate::error::FormatError;
use crate::models::{Block, BlockHeader, BlockTag, BlockWithTransactions, Filter, Log, Network, Receipt, TransactionResponse};

pub use formats::Formats;

/// Ordered key → check pairs.
pub type Schema = Vec<(&'static str, Check)>;

#[derive(Debug, Clone)]
pub enum Check {
    Address,
    /// 32-byte hash
    Hash,
    /// Arbitrary-precision integer, normalised to a hex quantity
    BigNumber,
    /// Integer that fits in 64 bits, normalised to a JSON number
    Number,
    Bool,
    /// `latest`, `earliest`, `pending` or a block number
    BlockTag,
    /// Any hex string
    Hex,
    /// Hex string of whole bytes
    Data,
    /// Null, a hash, or an OR-group of hashes
    Topic,
    /// Null or missing input yields the default; `None` drops the key
    AllowNull(Box<Check>, Option<Value>),
    ArrayOf(Box<Check>),
    Object(Schema),
}

fn invalid(value: Option<&Value>, reason: &str) -> FormatError {
    FormatError::new("", value.cloned().unwrap_or(Value::Null), reason)
}

impl Check {
    pub fn apply(&self, value: Option<&Value>) -> Result<Option<Value>, FormatError> {
        match self {
            Check::AllowNull(inner, default) => match value {
                None | Some(Value::Null) => Ok(default.clone()),
                Some(value) => inner.apply(Some(value)),
            },
            Check::ArrayOf(inner) => {
                let items = match value {
                    Some(Value::Array(items)) => items,
                    other => return Err(invalid(other, "expected an array")),
                };
                let mut out = Vec::with_capacity(items.len());
                for (index, item) in items.iter().enumerate() {
                    let formatted = inner
                        .apply(Some(item))
                        .map_err(|e| e.nested(&index.to_string()))?;
                    out.push(formatted.unwrap_or(Value::Null));
                }
                Ok(Some(Value::Array(out)))
            }
            Check::Object(schema) => {
                let value = value.ok_or_else(|| invalid(None, "missing object"))?;
                check(schema, value).map(|map| Some(Value::Object(map)))
            }
            scalar => {
                let value = value.ok_or_else(|| invalid(None, "missing value"))?;
                scalar.apply_scalar(value).map(Some)
            }
        }
    }

    fn apply_scalar(&self, value: &Value) -> Result<Value, FormatError> {
        match self {
            Check::Address => {
                let text = value.as_str().ok_or_else(|| invalid(Some(value), "invalid address"))?;
                let address: Address = text
                    .parse()
                    .map_err(|_| invalid(Some(value), "invalid address"))?;
                Ok(json!(address.to_checksum()))
            }
            Check::Hash => format_hash(value),
            Check::BigNumber => Ok(json!(format_quantity(&to_biguint(value)?))),
            Check::Number => {
                let number = to_biguint(value)?
                    .to_u64()
                    .ok_or_else(|| invalid(Some(value), "number overflow"))?;
                Ok(json!(number))
            }
            Check::Bool => match value {
                Value::Bool(b) => Ok(json!(b)),
                Value::String(s) if s == "true" => Ok(json!(true)),
                Value::String(s) if s == "false" => Ok(json!(false)),
                _ => Err(invalid(Some(value), "invalid boolean")),
            },
            Check::BlockTag => match value {
                Value::String(s) if matches!(s.as_str(), "latest" | "earliest" | "pending") => Ok(value.clone()),
                _ => Ok(json!(format_quantity(&to_biguint(value)?))),
            },
            Check::Hex => format_hex(value, false),
            Check::Data => format_hex(value, true),
            Check::Topic => match value {
                Value::Null => Ok(Value::Null),
                Value::Array(items) => {
                    let hashes = items
                        .iter()
                        .enumerate()
                        .map(|(index, item)| format_hash(item).map_err(|e| e.nested(&index.to_string())))
                        .collect::<Result<Vec<_>, _>>()?;
                    Ok(Value::Array(hashes))
                }
                _ => format_hash(value),
            },
            Check::AllowNull(..) | Check::ArrayOf(_) | Check::Object(_) => self
                .apply(Some(value))?
                .ok_or_else(|| invalid(Some(value), "missing value")),
        }
    }
}

fn to_biguint(value: &Value) -> Result<BigUint, FormatError> {
    match value {
        Value::String(s) => parse_quantity(s).ok_or_else(|| invalid(Some(value), "invalid number")),
        Value::Number(n) => n
            .as_u64()
            .map(BigUint::from)
            .ok_or_else(|| invalid(Some(value), "invalid number")),
        _ => Err(invalid(Some(value), "invalid number")),
    }
}

fn format_hex(value: &Value, whole_bytes: bool) -> Result<Value, FormatError> {
    let text = value.as_str().ok_or_else(|| invalid(Some(value), "invalid hex"))?;
    if !text.starts_with("0x") && !text.starts_with("0X") {
        return Err(invalid(Some(value), "invalid hex"));
    }
    let digits = strip_hex_prefix(text);
    if !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(invalid(Some(value), "invalid hex"));
    }
    if whole_bytes && digits.len() % 2 != 0 {
        return Err(invalid(Some(value), "invalid data: odd length"));
    }
    Ok(json!(format!("0x{}", digits.to_ascii_lowercase())))
}

fn format_hash(value: &Value) -> Result<Value, FormatError> {
    let formatted = format_hex(value, true).map_err(|_| invalid(Some(value), "invalid hash"))?;
    match formatted.as_str() {
        Some(s) if s.len() == 66 => Ok(formatted),
        _ => Err(invalid(Some(value), "invalid hash")),
    }
}

/// Project `object` through `schema`.
pub fn check(schema: &Schema, object: &Value) -> Result<Map<String, Value>, FormatError> {
    let input = object
        .as_object()
        .ok_or_else(|| invalid(Some(object), "expected an object"))?;

    let mut out = Map::new();
    for (key, check) in schema {
        if let Some(value) = check.apply(input.get(*key)).map_err(|e| e.nested(key))? {
            out.insert(key.to_string(), value);
        }
    }
    Ok(out)
}

fn typed<T: DeserializeOwned>(kind: &str, map: Map<String, Value>) -> Result<T, FormatError> {
    let value = Value::Object(map);
    serde_json::from_value(value.clone()).map_err(|e| FormatError::new(kind, value, e.to_string()))
}

fn is_zero_hash(value: Option<&Value>) -> bool {
    match value.and_then(Value::as_str) {
        Some(s) => strip_hex_prefix(s).bytes().all(|b| b == b'0'),
        None => false,
    }
}

fn is_absent(object: &Map<String, Value>, key: &str) -> bool {
    object.get(key).map_or(true, Value::is_null)
}

/// Converts node responses into typed models and outbound values into node form.
#[derive(Debug, Clone, Default)]
pub struct Formatter {
    formats: Formats,
}

impl Formatter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn formats(&self) -> &Formats {
        &self.formats
    }

    fn normalize_block(value: &Value) -> Result<Value, FormatError> {
        let mut block = value
            .as_object()
            .cloned()
            .ok_or_else(|| FormatError::new("block", value.clone(), "expected an object"))?;

        if is_absent(&block, "sealer") {
            if let Some(miner) = block.get("miner").filter(|m| !m.is_null()).cloned() {
                block.insert("sealer".to_string(), miner);
            }
        }
        if is_absent(&block, "sealerList") {
            block.insert("sealerList".to_string(), json!([]));
        }
        Ok(Value::Object(block))
    }

    pub fn block(&self, value: &Value) -> Result<Block, FormatError> {
        let mut map = check(&self.formats.block, &Self::normalize_block(value)?)?;
        let transactions = map.remove("transactions").unwrap_or_else(|| json!([]));

        Ok(Block {
            header: typed::<BlockHeader>("block", map)?,
            transactions: serde_json::from_value(transactions.clone())
                .map_err(|e| FormatError::new("transactions", transactions, e.to_string()))?,
        })
    }

    pub fn block_with_transactions(&self, value: &Value) -> Result<BlockWithTransactions, FormatError> {
        let normalized = Self::normalize_block(value)?;
        let map = check(&self.formats.block_header, &normalized)?;

        let transactions = match normalized.get("transactions") {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(items)) => items
                .iter()
                .enumerate()
                .map(|(index, item)| {
                    self.transaction_response(item)
                        .map_err(|e| e.nested(&index.to_string()).nested("transactions"))
                })
                .collect::<Result<Vec<_>, _>>()?,
            Some(other) => {
                return Err(FormatError::new("transactions", other.clone(), "expected an array"));
            }
        };

        Ok(BlockWithTransactions {
            header: typed::<BlockHeader>("block", map)?,
            transactions,
        })
    }

    pub fn transaction_response(&self, value: &Value) -> Result<TransactionResponse, FormatError> {
        let mut tx = value
            .as_object()
            .cloned()
            .ok_or_else(|| FormatError::new("transaction", value.clone(), "expected an object"))?;

        // Some nodes report the zero address as a bare 0x0
        let zero_to = tx
            .get("to")
            .and_then(Value::as_str)
            .and_then(parse_quantity)
            .map_or(false, |n| n.is_zero());
        if zero_to {
            tx.insert("to".to_string(), json!(Address::ZERO.to_checksum()));
        }

        if is_absent(&tx, "data") {
            if let Some(input) = tx.get("input").cloned() {
                tx.insert("data".to_string(), input);
            }
        }
        if is_absent(&tx, "gasLimit") {
            if let Some(gas) = tx.get("gas").cloned() {
                tx.insert("gasLimit".to_string(), gas);
            }
        }

        if is_absent(&tx, "to") && is_absent(&tx, "creates") {
            let from = tx.get("from").and_then(Value::as_str).and_then(|s| s.parse::<Address>().ok());
            let nonce = tx.get("nonce").and_then(|n| to_biguint(n).ok());
            if let (Some(from), Some(nonce)) = (from, nonce) {
                tx.insert("creates".to_string(), json!(contract_address(&from, &nonce).to_checksum()));
            }
        }

        let mut result = check(&self.formats.transaction, &Value::Object(tx.clone()))?;

        let chain_id = match tx.get("chainId").filter(|c| !c.is_null()) {
            Some(chain_id) => to_biguint(chain_id)
                .map_err(|e| e.nested("chainId"))?
                .to_u64()
                .ok_or_else(|| FormatError::new("chainId", chain_id.clone(), "number overflow"))?,
            // Derived from a chain-bound v; anything below 35 means no chain
            None => match result.get("v").and_then(Value::as_u64) {
                Some(v) if v >= 35 => (v - 35) / 2,
                _ => 0,
            },
        };
        result.insert("chainId".to_string(), json!(chain_id));

        if is_zero_hash(result.get("blockHash")) {
            result.insert("blockHash".to_string(), Value::Null);
        }

        typed("transaction", result)
    }

    pub fn receipt(&self, value: &Value) -> Result<Receipt, FormatError> {
        let mut result = check(&self.formats.receipt, value)?;

        // A short root is really a status code
        if let Some(root) = result.get("root").and_then(Value::as_str).map(str::to_string) {
            if root.len() <= 4 {
                let status = parse_quantity(&root).and_then(|n| n.to_u64());
                match status {
                    Some(code @ (0 | 1)) => {
                        if let Some(existing) = result.get("status").and_then(Value::as_u64) {
                            if existing != code {
                                return Err(FormatError::new("status", json!(existing), "alt-root-status/status mismatch"));
                            }
                        }
                        result.insert("status".to_string(), json!(code));
                        result.remove("root");
                    }
                    _ => return Err(FormatError::new("root", json!(root), "invalid alt-root-status")),
                }
            } else if root.len() != 66 {
                return Err(FormatError::new("root", json!(root), "invalid root hash"));
            }
        }

        if result.get("status").map_or(false, |s| !s.is_null()) {
            result.insert("byzantium".to_string(), json!(true));
        }

        typed("receipt", result)
    }

    pub fn log(&self, value: &Value) -> Result<Log, FormatError> {
        typed("log", check(&self.formats.filter_log, value)?)
    }

    /// Outbound filter in node form.
    pub fn filter(&self, filter: &Filter) -> Result<Value, FormatError> {
        let value = serde_json::to_value(filter)
            .map_err(|e| FormatError::new("filter", Value::Null, e.to_string()))?;
        check(&self.formats.filter, &value).map(Value::Object)
    }

    pub fn block_tag(&self, tag: &BlockTag) -> Value {
        json!(tag.to_string())
    }

    /// Network identity from a client version report.
    pub fn network(&self, value: &Value) -> Result<Network, FormatError> {
        let chain_id = value
            .get("Chain Id")
            .ok_or_else(|| FormatError::new("Chain Id", value.clone(), "missing chain id"))?;
        let chain_id = to_biguint(chain_id)
            .map_err(|e| e.nested("Chain Id"))?
            .to_u64()
            .ok_or_else(|| FormatError::new("Chain Id", chain_id.clone(), "number overflow"))?;

        let name = value
            .get("FISCO-BCOS Version")
            .or_else(|| value.get("Client Version"))
            .and_then(Value::as_str)
            .unwrap_or("unknown");

        Ok(Network::new(name, chain_id))
    }
}
