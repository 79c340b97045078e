pub mod block;
pub mod filter;
pub mod network;
pub mod receipt;
pub mod transaction;

pub use block::{Block, BlockHeader, BlockTag, BlockWithTransactions};
pub use filter::{Filter, TopicSet};
pub use network::Network;
pub use receipt::{confirmations, Log, Receipt};
pub use transaction::TransactionResponse;
