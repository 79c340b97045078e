use clap::{Parser, Subcommand};
use serde_json::{json, Value};

use crate::codec::primitives::{decode_hex, format_quantity};
use crate::codec::{decode, DecodedTransaction, Profile, H256};
use crate::config::AppConfig;
use crate::error::{EncodingError, Result, RpcError};
use crate::provider::Provider;

#[derive(Parser, Debug)]
#[command(name = "ledger-cli")]
#[command(about = "Inspect transactions and query a ledger node over JSON-RPC")]
#[command(version = "0.1.0")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Node RPC endpoint, overriding the configuration
    #[arg(long, global = true)]
    pub endpoint: Option<String>,

    /// Group id, overriding the configuration
    #[arg(long, global = true)]
    pub group_id: Option<u64>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Decode a raw transaction given as hex
    Decode { raw: String },
    /// Print the current block height
    BlockNumber,
    /// Wait for a transaction to be mined
    Wait {
        hash: String,
        #[arg(long, default_value = "1")]
        confirmations: u64,
        #[arg(long)]
        timeout_ms: Option<u64>,
    },
    /// Print a sample configuration file
    SampleConfig,
}

impl Cli {
    /// Configuration with the command-line overrides applied.
    pub fn apply_overrides(&self, mut config: AppConfig) -> AppConfig {
        if let Some(endpoint) = &self.endpoint {
            config.rpc.endpoint = endpoint.clone();
        }
        if let Some(group_id) = self.group_id {
            config.chain.group_id = group_id;
        }
        config
    }
}

pub struct CliHandler {
    config: AppConfig,
}

impl CliHandler {
    pub fn new(config: AppConfig) -> Self {
        Self { config }
    }

    pub async fn execute_command(&self, command: &Commands) -> Result<()> {
        match command {
            Commands::Decode { raw } => {
                let bytes = decode_hex(raw)?;
                let decoded = decode(&bytes)?;
                println!("{}", serde_json::to_string_pretty(&describe(&decoded)).map_err(RpcError::Json)?);
            }
            Commands::BlockNumber => {
                let provider = Provider::from_config(&self.config)?;
                println!("{}", provider.get_block_number().await?);
            }
            Commands::Wait {
                hash,
                confirmations,
                timeout_ms,
            } => {
                let hash: H256 = hash.parse().map_err(|_| EncodingError::InvalidHash(hash.clone()))?;
                let provider = Provider::from_config(&self.config)?;
                let receipt = provider.wait_for_transaction(hash, *confirmations, *timeout_ms).await;
                provider.stop();
                let receipt = receipt?;
                println!(
                    "Transaction {} mined in block {} ({} confirmations, status {})",
                    receipt.transaction_hash,
                    receipt.block_number,
                    receipt.confirmations,
                    receipt.status.map_or_else(|| "unknown".to_string(), |s| s.to_string())
                );
            }
            Commands::SampleConfig => {
                println!("{}", AppConfig::generate_sample_config()?);
            }
        }
        Ok(())
    }
}

/// JSON summary of a decoded transaction.
pub fn describe(decoded: &DecodedTransaction) -> Value {
    let tx = decoded.transaction();
    let mut summary = json!({
        "profile": match tx.profile() {
            Profile::Simple => "simple",
            Profile::Extended => "extended",
        },
        "nonce": format_quantity(&tx.nonce),
        "gasPrice": format_quantity(&tx.gas_price),
        "gasLimit": format_quantity(&tx.gas_limit),
        "to": tx.to.map(|to| to.to_checksum()),
        "value": format_quantity(&tx.value),
        "data": tx.data.to_string(),
        "chainId": format_quantity(&tx.chain_id),
        "signed": decoded.signature().is_some(),
    });

    if let Some(block_limit) = &tx.block_limit {
        summary["blockLimit"] = json!(format_quantity(block_limit));
    }
    if let Some(group_id) = &tx.group_id {
        summary["groupId"] = json!(format_quantity(group_id));
    }
    if let Some(extra_data) = &tx.extra_data {
        summary["extraData"] = json!(extra_data.to_string());
    }
    if let Some(signature) = decoded.signature() {
        summary["recoveryParam"] = json!(signature.recovery_param);
        summary["from"] = json!(decoded.from().map(|from| from.to_checksum()));
        summary["hash"] = json!(decoded.hash().map(|hash| hash.to_string()));
    }
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{encode, Bytes, UnsignedTransaction};
    use crate::error::ClientError;
    use num_bigint::BigUint;

    #[test]
    fn test_parse_wait_command() {
        let cli = Cli::parse_from([
            "ledger-cli",
            "wait",
            "0x5f2ad5a1ffa5d5b2ed5cd8ec31bd03d36d2ddc2cbe92e5b1e62ae6ffbd5f4e71",
            "--confirmations",
            "2",
            "--timeout-ms",
            "5000",
            "--endpoint",
            "http://node:8545",
        ]);

        assert_eq!(
            cli.command,
            Commands::Wait {
                hash: "0x5f2ad5a1ffa5d5b2ed5cd8ec31bd03d36d2ddc2cbe92e5b1e62ae6ffbd5f4e71".to_string(),
                confirmations: 2,
                timeout_ms: Some(5000),
            }
        );
        let config = cli.apply_overrides(AppConfig::default());
        assert_eq!(config.rpc.endpoint, "http://node:8545");
        assert_eq!(config.chain.group_id, 1);
    }

    #[test]
    fn test_describe_unsigned_extended() {
        let tx = UnsignedTransaction {
            nonce: BigUint::from(5u32),
            block_limit: Some(BigUint::from(500u32)),
            group_id: Some(BigUint::from(1u32)),
            extra_data: Some(Bytes::new()),
            ..UnsignedTransaction::default()
        };
        let decoded = decode(&encode(&tx, None).unwrap()).unwrap();
        let summary = describe(&decoded);

        assert_eq!(summary["profile"], "extended");
        assert_eq!(summary["nonce"], "0x5");
        assert_eq!(summary["blockLimit"], "0x1f4");
        assert_eq!(summary["to"], Value::Null);
        assert_eq!(summary["signed"], false);
        assert!(summary.get("from").is_none());
    }

    #[tokio::test]
    async fn test_decode_rejects_bad_hex() {
        let handler = CliHandler::new(AppConfig::default());
        let result = handler
            .execute_command(&Commands::Decode { raw: "0xzz".to_string() })
            .await;
        assert!(matches!(result, Err(ClientError::Encoding(_))));
    }
}
