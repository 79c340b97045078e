pub mod primitives;
pub mod rlp;
pub mod signature;
pub mod transaction;

pub use primitives::{keccak256, Address, Bytes, H256};
pub use rlp::RlpItem;
pub use signature::{derive_address, recover_address, DigestSigner, KeySource, LocalSigner, SecretKey, Signature};
pub use transaction::{
    contract_address, decode, encode, sign_transaction, DecodedTransaction, Profile, SignedTransaction,
    UnsignedTransaction,
};
