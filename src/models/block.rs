use std::fmt;
use std::str::FromStr;

use num_bigint::BigUint;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

use crate::codec::primitives::{parse_quantity, quantity, H256};
use crate::codec::Address;
use crate::models::TransactionResponse;

/// Block selector for RPC calls and filter ranges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockTag {
    Latest,
    Earliest,
    Pending,
    Number(u64),
}

impl fmt::Display for BlockTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlockTag::Latest => f.write_str("latest"),
            BlockTag::Earliest => f.write_str("earliest"),
            BlockTag::Pending => f.write_str("pending"),
            BlockTag::Number(n) => write!(f, "0x{:x}", n),
        }
    }
}

impl FromStr for BlockTag {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "latest" => Ok(BlockTag::Latest),
            "earliest" => Ok(BlockTag::Earliest),
            "pending" => Ok(BlockTag::Pending),
            other => parse_quantity(other)
                .and_then(|n| u64::try_from(n).ok())
                .map(BlockTag::Number)
                .ok_or_else(|| format!("invalid block tag: {}", other)),
        }
    }
}

impl From<u64> for BlockTag {
    fn from(number: u64) -> Self {
        BlockTag::Number(number)
    }
}

impl Serialize for BlockTag {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for BlockTag {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match serde_json::Value::deserialize(deserializer)? {
            serde_json::Value::String(s) => s.parse().map_err(de::Error::custom),
            serde_json::Value::Number(n) => n
                .as_u64()
                .map(BlockTag::Number)
                .ok_or_else(|| de::Error::custom(format!("invalid block tag: {}", n))),
            other => Err(de::Error::custom(format!("invalid block tag: {}", other))),
        }
    }
}

/// Fields shared by both block shapes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockHeader {
    #[serde(default)]
    pub hash: Option<H256>,
    pub parent_hash: H256,
    pub number: u64,
    pub timestamp: u64,
    #[serde(with = "quantity")]
    pub gas_limit: BigUint,
    #[serde(with = "quantity")]
    pub gas_used: BigUint,
    /// Index of the sealing node; older nodes report this as `miner`
    #[serde(default)]
    pub sealer: Option<String>,
    #[serde(default)]
    pub sealer_list: Vec<String>,
    #[serde(default)]
    pub state_root: Option<H256>,
    #[serde(default)]
    pub transactions_root: Option<H256>,
    #[serde(default)]
    pub receipts_root: Option<H256>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Block {
    pub header: BlockHeader,
    pub transactions: Vec<H256>,
}

impl Block {
    pub fn number(&self) -> u64 {
        self.header.number
    }

    pub fn hash(&self) -> Option<H256> {
        self.header.hash
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BlockWithTransactions {
    pub header: BlockHeader,
    pub transactions: Vec<TransactionResponse>,
}

impl BlockWithTransactions {
    pub fn number(&self) -> u64 {
        self.header.number
    }

    /// Senders of every transaction in the block.
    pub fn senders(&self) -> Vec<Address> {
        self.transactions.iter().map(|tx| tx.from).collect()
    }
}
