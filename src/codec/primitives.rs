use std::fmt;
use std::str::FromStr;

use num_bigint::BigUint;
use num_traits::Zero;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use sha3::{Digest, Keccak256};

use crate::error::EncodingError;

/// Keccak-256 of `data`.
pub fn keccak256(data: &[u8]) -> H256 {
    let mut out = [0u8; 32];
    out.copy_from_slice(&Keccak256::digest(data));
    H256(out)
}

pub fn strip_hex_prefix(value: &str) -> &str {
    value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
        .unwrap_or(value)
}

/// Decode an even-length hex string, with or without the `0x` prefix.
pub fn decode_hex(value: &str) -> Result<Vec<u8>, EncodingError> {
    let digits = strip_hex_prefix(value.trim());
    if digits.len() % 2 != 0 {
        return Err(EncodingError::InvalidHex(format!("odd length: {}", value)));
    }
    hex::decode(digits).map_err(|e| EncodingError::InvalidHex(format!("{}: {}", value, e)))
}

pub fn encode_hex(bytes: &[u8]) -> String {
    format!("0x{}", hex::encode(bytes))
}

/// Big-endian bytes of `value` with leading zeros removed; zero encodes as no bytes.
pub fn biguint_to_stripped_bytes(value: &BigUint) -> Vec<u8> {
    if value.is_zero() {
        Vec::new()
    } else {
        value.to_bytes_be()
    }
}

/// Parse a quantity given as `0x`-prefixed hex or as decimal digits.
pub fn parse_quantity(value: &str) -> Option<BigUint> {
    let value = value.trim();
    if let Some(digits) = value.strip_prefix("0x").or_else(|| value.strip_prefix("0X")) {
        if digits.is_empty() {
            return Some(BigUint::zero());
        }
        BigUint::parse_bytes(digits.as_bytes(), 16)
    } else if !value.is_empty() && value.bytes().all(|b| b.is_ascii_digit()) {
        BigUint::parse_bytes(value.as_bytes(), 10)
    } else {
        None
    }
}

pub fn format_quantity(value: &BigUint) -> String {
    format!("0x{}", value.to_str_radix(16))
}

/// 20-byte account address, displayed with its mixed-case checksum.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Address([u8; 20]);

impl Address {
    pub const ZERO: Address = Address([0u8; 20]);

    pub fn new(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self, EncodingError> {
        if bytes.len() != 20 {
            return Err(EncodingError::InvalidAddress(format!(
                "expected 20 bytes, got {}",
                bytes.len()
            )));
        }
        let mut out = [0u8; 20];
        out.copy_from_slice(bytes);
        Ok(Self(out))
    }

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 20]
    }

    /// EIP-55 mixed-case checksum encoding.
    pub fn to_checksum(&self) -> String {
        let lower = hex::encode(self.0);
        let hash = keccak256(lower.as_bytes());
        let mut out = String::with_capacity(42);
        out.push_str("0x");
        for (i, c) in lower.chars().enumerate() {
            let byte = hash.0[i / 2];
            let nibble = if i % 2 == 0 { byte >> 4 } else { byte & 0x0f };
            if c.is_ascii_alphabetic() && nibble >= 8 {
                out.push(c.to_ascii_uppercase());
            } else {
                out.push(c);
            }
        }
        out
    }
}

impl FromStr for Address {
    type Err = EncodingError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let digits = strip_hex_prefix(value.trim());
        if digits.len() != 40 || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(EncodingError::InvalidAddress(value.to_string()));
        }
        let bytes = hex::decode(digits).map_err(|_| EncodingError::InvalidAddress(value.to_string()))?;
        let address = Address::from_slice(&bytes)?;

        let has_upper = digits.bytes().any(|b| b.is_ascii_uppercase());
        let has_lower = digits.bytes().any(|b| b.is_ascii_lowercase());
        if has_upper && has_lower && address.to_checksum()[2..] != *digits {
            return Err(EncodingError::InvalidAddress(format!("bad address checksum: {}", value)));
        }
        Ok(address)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_checksum())
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_checksum())
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_checksum())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        value.parse().map_err(de::Error::custom)
    }
}

/// 32-byte hash.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct H256(pub [u8; 32]);

impl H256 {
    pub const ZERO: H256 = H256([0u8; 32]);

    pub fn from_slice(bytes: &[u8]) -> Result<Self, EncodingError> {
        if bytes.len() != 32 {
            return Err(EncodingError::InvalidHash(format!(
                "expected 32 bytes, got {}",
                bytes.len()
            )));
        }
        let mut out = [0u8; 32];
        out.copy_from_slice(bytes);
        Ok(Self(out))
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 32]
    }
}

impl From<[u8; 32]> for H256 {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

impl FromStr for H256 {
    type Err = EncodingError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let digits = strip_hex_prefix(value.trim());
        if digits.len() != 64 {
            return Err(EncodingError::InvalidHash(value.to_string()));
        }
        let bytes = hex::decode(digits).map_err(|_| EncodingError::InvalidHash(value.to_string()))?;
        H256::from_slice(&bytes)
    }
}

impl fmt::Display for H256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for H256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl Serialize for H256 {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for H256 {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        value.parse().map_err(de::Error::custom)
    }
}

/// Opaque byte payload rendered as `0x`-prefixed hex.
#[derive(Clone, PartialEq, Eq, Hash, Default)]
pub struct Bytes(pub Vec<u8>);

impl Bytes {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<u8>> for Bytes {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl From<&[u8]> for Bytes {
    fn from(bytes: &[u8]) -> Self {
        Self(bytes.to_vec())
    }
}

impl FromStr for Bytes {
    type Err = EncodingError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        decode_hex(value).map(Bytes)
    }
}

impl fmt::Display for Bytes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&encode_hex(&self.0))
    }
}

impl fmt::Debug for Bytes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&encode_hex(&self.0))
    }
}

impl Serialize for Bytes {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&encode_hex(&self.0))
    }
}

impl<'de> Deserialize<'de> for Bytes {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        value.parse().map_err(de::Error::custom)
    }
}

/// Serde adapter for `BigUint` as a hex quantity string.
pub mod quantity {
    use super::*;

    pub fn serialize<S: Serializer>(value: &BigUint, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format_quantity(value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<BigUint, D::Error> {
        match serde_json::Value::deserialize(deserializer)? {
            serde_json::Value::String(s) => {
                parse_quantity(&s).ok_or_else(|| de::Error::custom(format!("invalid quantity: {}", s)))
            }
            serde_json::Value::Number(n) => n
                .as_u64()
                .map(BigUint::from)
                .ok_or_else(|| de::Error::custom(format!("invalid quantity: {}", n))),
            other => Err(de::Error::custom(format!("invalid quantity: {}", other))),
        }
    }
}

/// Serde adapter for `Option<BigUint>`; `null` and a missing key both map to `None`.
pub mod option_quantity {
    use super::*;

    pub fn serialize<S: Serializer>(value: &Option<BigUint>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(v) => serializer.serialize_str(&format_quantity(v)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<BigUint>, D::Error> {
        match serde_json::Value::deserialize(deserializer)? {
            serde_json::Value::Null => Ok(None),
            serde_json::Value::String(s) => parse_quantity(&s)
                .map(Some)
                .ok_or_else(|| de::Error::custom(format!("invalid quantity: {}", s))),
            serde_json::Value::Number(n) => n
                .as_u64()
                .map(|v| Some(BigUint::from(v)))
                .ok_or_else(|| de::Error::custom(format!("invalid quantity: {}", n))),
            other => Err(de::Error::custom(format!("invalid quantity: {}", other))),
        }
    }
}
