pub mod cli;
pub mod codec;
pub mod config;
pub mod error;
pub mod events;
pub mod formatter;
pub mod logging;
pub mod models;
pub mod provider;
pub mod retry;

pub use codec::{
    decode, encode, sign_transaction, Address, Bytes, DecodedTransaction, LocalSigner, Signature, SignedTransaction,
    UnsignedTransaction, H256,
};
pub use config::{AppConfig, ChainConfig, LoggingConfig, PollingConfig, RpcConfig};
pub use error::{ClientError, Result};
pub use events::{listener, Event, EventSpec, EventTag, Listener};
pub use formatter::Formatter;
pub use logging::{init_logging, ErrorLogger, LogContext, MetricsLogger, PerformanceMonitor};
pub use models::{Block, BlockTag, BlockWithTransactions, Filter, Log, Network, Receipt, TransactionResponse};
pub use provider::{BlockId, HttpTransport, JsonRpcSender, PollerConfig, Provider};
pub use retry::{RetryConfig, RetryManager};
