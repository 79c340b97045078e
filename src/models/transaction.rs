use num_bigint::BigUint;
use num_traits::ToPrimitive;
use serde::{Deserialize, Serialize};

use crate::codec::primitives::{option_quantity, quantity};
use crate::codec::{contract_address, Address, Bytes, SignedTransaction, H256};
use crate::error::EncodingError;

/// A transaction as reported by the node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionResponse {
    pub hash: H256,
    #[serde(default)]
    pub block_hash: Option<H256>,
    #[serde(default)]
    pub block_number: Option<u64>,
    #[serde(default)]
    pub transaction_index: Option<u64>,
    #[serde(default)]
    pub confirmations: u64,
    pub from: Address,
    #[serde(default, with = "option_quantity")]
    pub gas_price: Option<BigUint>,
    #[serde(with = "quantity")]
    pub gas_limit: BigUint,
    #[serde(default)]
    pub to: Option<Address>,
    #[serde(with = "quantity")]
    pub value: BigUint,
    #[serde(with = "quantity")]
    pub nonce: BigUint,
    pub data: Bytes,
    #[serde(default, with = "option_quantity")]
    pub r: Option<BigUint>,
    #[serde(default, with = "option_quantity")]
    pub s: Option<BigUint>,
    #[serde(default)]
    pub v: Option<u64>,
    /// Address of the contract this transaction deploys
    #[serde(default)]
    pub creates: Option<Address>,
    #[serde(default)]
    pub raw: Option<Bytes>,
    #[serde(default)]
    pub chain_id: u64,
    #[serde(default, with = "option_quantity")]
    pub block_limit: Option<BigUint>,
    #[serde(default, with = "option_quantity")]
    pub group_id: Option<BigUint>,
    #[serde(default)]
    pub extra_data: Option<Bytes>,
}

impl TransactionResponse {
    pub fn is_mined(&self) -> bool {
        self.block_number.is_some()
    }

    pub fn is_contract_creation(&self) -> bool {
        self.to.is_none()
    }

    /// Response for a transaction this client just submitted; it has no block yet.
    pub fn from_signed(signed: &SignedTransaction, hash: H256, from: Address, raw: &[u8]) -> Result<Self, EncodingError> {
        let tx = &signed.transaction;
        let chain_id = tx
            .chain_id
            .to_u64()
            .ok_or_else(|| EncodingError::ChainIdOverflow(tx.chain_id.to_string()))?;
        let signature = &signed.signature;

        Ok(Self {
            hash,
            block_hash: None,
            block_number: None,
            transaction_index: None,
            confirmations: 0,
            from,
            gas_price: Some(tx.gas_price.clone()),
            gas_limit: tx.gas_limit.clone(),
            to: tx.to,
            value: tx.value.clone(),
            nonce: tx.nonce.clone(),
            data: tx.data.clone(),
            r: Some(BigUint::from_bytes_be(&signature.r)),
            s: Some(BigUint::from_bytes_be(&signature.s)),
            v: Some(signature.v.unwrap_or(27 + u64::from(signature.recovery_param))),
            creates: match tx.to {
                None => Some(contract_address(&from, &tx.nonce)),
                Some(_) => None,
            },
            raw: Some(Bytes::from(raw.to_vec())),
            chain_id,
            block_limit: tx.block_limit.clone(),
            group_id: tx.group_id.clone(),
            extra_data: tx.extra_data.clone(),
        })
    }
}
