use serde_json::Value;
use thiserror::Error;

/// Main error type for the ledger client
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Encoding error: {0}")]
    Encoding(#[from] EncodingError),

    #[error("Decoding error: {0}")]
    Decoding(#[from] DecodingError),

    #[error("Format error: {0}")]
    Format(#[from] FormatError),

    #[error("Signature error: {0}")]
    Signature(#[from] SignatureError),

    #[error("Network error: {0}")]
    Network(#[from] NetworkError),

    #[error("RPC error: {0}")]
    Rpc(#[from] RpcError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Unsupported operation: {operation}")]
    Unsupported { operation: String },

    #[error("Timeout exceeded after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },
}

/// Malformed or oversized transaction fields
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EncodingError {
    #[error("{field} exceeds maximum length of {max} bytes (got {got})")]
    FieldTooLong {
        field: &'static str,
        max: usize,
        got: usize,
    },

    #[error("chain id {0} is too large to bind into v")]
    ChainIdOverflow(String),

    #[error("transaction chain id conflicts with signature v: expected v={expected}, got v={v}")]
    ChainIdMismatch { v: u64, expected: u64 },

    #[error("Invalid hex string: {0}")]
    InvalidHex(String),

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Invalid hash: {0}")]
    InvalidHash(String),
}

/// Structurally invalid wire bytes
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodingError {
    #[error("RLP decoding failed: {0}")]
    Rlp(String),

    #[error("invalid raw transaction: expected 6, 9, 10 or 13 fields, got {got}")]
    FieldCount { got: usize },

    #[error("invalid {field}: {reason}")]
    InvalidField { field: &'static str, reason: String },
}

/// RPC data that violates the expected schema
#[derive(Error, Debug, Clone, PartialEq)]
#[error("invalid value for {key}: {reason} (value: {value})")]
pub struct FormatError {
    pub key: String,
    pub value: Value,
    pub reason: String,
}

impl FormatError {
    pub fn new(key: &str, value: Value, reason: impl Into<String>) -> Self {
        Self {
            key: key.to_string(),
            value,
            reason: reason.into(),
        }
    }

    /// Prefix the key with the enclosing field, so nested failures read `logs.0.address`.
    pub fn nested(mut self, parent: &str) -> Self {
        self.key = if self.key.is_empty() {
            parent.to_string()
        } else {
            format!("{}.{}", parent, self.key)
        };
        self
    }
}

/// Key handling and signature recovery errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SignatureError {
    #[error("Invalid private key")]
    InvalidPrivateKey,

    #[error("Invalid public key: {0}")]
    InvalidPublicKey(String),

    #[error("Invalid signature: {0}")]
    InvalidSignature(String),

    #[error("Public key recovery failed: {0}")]
    Recovery(String),

    #[error("Signing failed: {0}")]
    Signing(String),
}

/// Transient node failures and chain identity problems
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NetworkError {
    #[error("Transient network failure: {0}")]
    Transient(String),

    #[error("Underlying network changed: expected chain {expected}, got chain {actual}")]
    NetworkChanged { expected: u64, actual: u64 },

    #[error("Network block skew detected: previous {previous_block_number}, now {block_number}")]
    BlockSkew {
        block_number: u64,
        previous_block_number: u64,
    },

    #[error("Could not detect network: {0}")]
    NoNetwork(String),
}

/// JSON-RPC transport errors
#[derive(Error, Debug)]
pub enum RpcError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parsing failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("RPC method error: code={code}, message={message}")]
    Method { code: i64, message: String },

    #[error("Invalid response format: {0}")]
    InvalidResponse(String),

    #[error("Timeout after {seconds} seconds")]
    Timeout { seconds: u64 },

    #[error("Rate limit exceeded, retry after {seconds} seconds")]
    RateLimit { seconds: u64 },

    #[error("Connection failed: {0}")]
    Connection(String),
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid configuration value for {key}: {value}")]
    InvalidValue { key: String, value: String },

    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    #[error("Configuration parsing failed: {0}")]
    Parsing(String),

    #[error("Invalid URL format: {0}")]
    InvalidUrl(String),
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, ClientError>;

/// Error severity levels for logging
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    /// The caller must fix its input or configuration
    Critical,
    /// Functionality is degraded until the node recovers
    High,
    /// Expected to clear up on a later poll
    Medium,
    /// Mostly informational
    Low,
}

impl ClientError {
    /// Get the severity level of an error
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            ClientError::Config(_) => ErrorSeverity::Critical,
            ClientError::Encoding(_) => ErrorSeverity::Critical,
            ClientError::Signature(SignatureError::InvalidPrivateKey) => ErrorSeverity::Critical,

            ClientError::Network(NetworkError::NetworkChanged { .. }) => ErrorSeverity::High,
            ClientError::Network(NetworkError::NoNetwork(_)) => ErrorSeverity::High,
            ClientError::Rpc(RpcError::Connection(_)) => ErrorSeverity::High,
            ClientError::Decoding(_) => ErrorSeverity::High,

            ClientError::Rpc(RpcError::Timeout { .. }) => ErrorSeverity::Medium,
            ClientError::Rpc(RpcError::RateLimit { .. }) => ErrorSeverity::Medium,
            ClientError::Network(NetworkError::Transient(_)) => ErrorSeverity::Medium,
            ClientError::Format(_) => ErrorSeverity::Medium,
            ClientError::Timeout { .. } => ErrorSeverity::Medium,

            ClientError::Network(NetworkError::BlockSkew { .. }) => ErrorSeverity::Low,
            ClientError::Unsupported { .. } => ErrorSeverity::Low,
            _ => ErrorSeverity::Medium,
        }
    }

    /// Check if the error is recoverable (can be retried)
    pub fn is_recoverable(&self) -> bool {
        match self {
            ClientError::Rpc(RpcError::Timeout { .. }) => true,
            ClientError::Rpc(RpcError::RateLimit { .. }) => true,
            ClientError::Rpc(RpcError::Connection(_)) => true,
            ClientError::Rpc(RpcError::Http(e)) => e.is_timeout() || e.is_connect(),
            ClientError::Network(NetworkError::Transient(_)) => true,

            ClientError::Config(_) => false,
            ClientError::Encoding(_) => false,
            ClientError::Decoding(_) => false,
            ClientError::Format(_) => false,

            _ => false,
        }
    }

    /// Get suggested retry delay in seconds for recoverable errors
    pub fn retry_delay(&self) -> Option<u64> {
        if !self.is_recoverable() {
            return None;
        }

        match self {
            ClientError::Rpc(RpcError::RateLimit { seconds }) => Some(*seconds),
            ClientError::Rpc(RpcError::Timeout { .. }) => Some(5),
            ClientError::Rpc(RpcError::Connection(_)) => Some(10),
            ClientError::Network(NetworkError::Transient(_)) => Some(1),
            _ => Some(5),
        }
    }

    pub(crate) fn unsupported(operation: &str) -> Self {
        ClientError::Unsupported {
            operation: operation.to_string(),
        }
    }
}
