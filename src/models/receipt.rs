use num_bigint::BigUint;
use serde::{Deserialize, Serialize};

use crate::codec::primitives::{option_quantity, quantity};
use crate::codec::{Address, Bytes, H256};

/// An event log. Position fields are absent for logs embedded in some receipts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Log {
    #[serde(default)]
    pub block_number: Option<u64>,
    #[serde(default)]
    pub block_hash: Option<H256>,
    #[serde(default)]
    pub transaction_index: Option<u64>,
    #[serde(default)]
    pub removed: bool,
    pub address: Address,
    pub data: Bytes,
    pub topics: Vec<H256>,
    #[serde(default)]
    pub transaction_hash: Option<H256>,
    #[serde(default)]
    pub log_index: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Receipt {
    #[serde(default)]
    pub to: Option<Address>,
    #[serde(default)]
    pub from: Option<Address>,
    #[serde(default)]
    pub contract_address: Option<Address>,
    pub transaction_index: u64,
    #[serde(default)]
    pub root: Option<String>,
    #[serde(with = "quantity")]
    pub gas_used: BigUint,
    #[serde(default)]
    pub logs_bloom: Option<Bytes>,
    pub block_hash: H256,
    pub transaction_hash: H256,
    pub logs: Vec<Log>,
    pub block_number: u64,
    #[serde(default)]
    pub confirmations: u64,
    #[serde(default, with = "option_quantity")]
    pub cumulative_gas_used: Option<BigUint>,
    #[serde(default)]
    pub status: Option<u64>,
    /// Return data of the call
    #[serde(default)]
    pub output: Option<Bytes>,
    #[serde(default)]
    pub byzantium: bool,
}

impl Receipt {
    /// Confirmations at `current_height`, counting the mining block itself.
    pub fn confirmations_at(&self, current_height: u64) -> u64 {
        confirmations(current_height, self.block_number)
    }
}

/// `max(1, current - mined + 1)`
pub fn confirmations(current_height: u64, mined_at: u64) -> u64 {
    (current_height.saturating_sub(mined_at) + 1).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_confirmation_counting() {
        assert_eq!(confirmations(100, 100), 1);
        assert_eq!(confirmations(105, 100), 6);
        // Cursor behind the mining height still reports one confirmation
        assert_eq!(confirmations(98, 100), 1);
    }
}
