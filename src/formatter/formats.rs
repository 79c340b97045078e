use serde_json::json;

use super::{Check, Schema};

/// Schemas for every object shape the node returns or accepts.
#[derive(Debug, Clone)]
pub struct Formats {
    pub transaction: Schema,
    pub receipt: Schema,
    pub receipt_log: Schema,
    pub block_header: Schema,
    pub block: Schema,
    pub filter: Schema,
    pub filter_log: Schema,
}

fn allow_null(check: Check) -> Check {
    Check::AllowNull(Box::new(check), None)
}

fn array_of(check: Check) -> Check {
    Check::ArrayOf(Box::new(check))
}

impl Default for Formats {
    fn default() -> Self {
        let transaction = vec![
            ("hash", Check::Hash),
            ("blockHash", allow_null(Check::Hash)),
            ("blockNumber", allow_null(Check::Number)),
            ("transactionIndex", allow_null(Check::Number)),
            ("confirmations", Check::AllowNull(Box::new(Check::Number), Some(json!(0)))),
            ("from", Check::Address),
            ("gasPrice", allow_null(Check::BigNumber)),
            ("gasLimit", Check::BigNumber),
            ("to", allow_null(Check::Address)),
            ("value", Check::BigNumber),
            ("nonce", Check::BigNumber),
            ("data", Check::Data),
            ("r", allow_null(Check::BigNumber)),
            ("s", allow_null(Check::BigNumber)),
            ("v", allow_null(Check::Number)),
            ("creates", allow_null(Check::Address)),
            ("raw", allow_null(Check::Data)),
            ("blockLimit", allow_null(Check::BigNumber)),
            ("groupId", allow_null(Check::BigNumber)),
            ("extraData", allow_null(Check::Data)),
        ];

        // Logs embedded in receipts may omit their position fields
        let receipt_log = vec![
            ("transactionIndex", allow_null(Check::Number)),
            ("blockNumber", allow_null(Check::Number)),
            ("transactionHash", allow_null(Check::Hash)),
            ("address", Check::Address),
            ("topics", array_of(Check::Hash)),
            ("data", Check::Data),
            ("logIndex", allow_null(Check::Number)),
            ("blockHash", allow_null(Check::Hash)),
        ];

        let receipt = vec![
            ("to", allow_null(Check::Address)),
            ("from", allow_null(Check::Address)),
            ("contractAddress", allow_null(Check::Address)),
            ("transactionIndex", Check::Number),
            ("root", allow_null(Check::Hex)),
            ("gasUsed", Check::BigNumber),
            ("logsBloom", allow_null(Check::Data)),
            ("blockHash", Check::Hash),
            ("transactionHash", Check::Hash),
            ("logs", array_of(Check::Object(receipt_log.clone()))),
            ("blockNumber", Check::Number),
            ("confirmations", Check::AllowNull(Box::new(Check::Number), Some(json!(0)))),
            ("cumulativeGasUsed", allow_null(Check::BigNumber)),
            ("status", allow_null(Check::Number)),
            ("output", allow_null(Check::Data)),
        ];

        let block_header = vec![
            ("hash", allow_null(Check::Hash)),
            ("parentHash", Check::Hash),
            ("number", Check::Number),
            ("timestamp", Check::Number),
            ("gasLimit", Check::BigNumber),
            ("gasUsed", Check::BigNumber),
            ("sealer", allow_null(Check::Hex)),
            ("sealerList", Check::AllowNull(Box::new(array_of(Check::Hex)), Some(json!([])))),
            ("stateRoot", allow_null(Check::Hash)),
            ("transactionsRoot", allow_null(Check::Hash)),
            ("receiptsRoot", allow_null(Check::Hash)),
        ];

        let mut block = block_header.clone();
        block.push((
            "transactions",
            Check::AllowNull(Box::new(array_of(Check::Hash)), Some(json!([]))),
        ));

        let filter = vec![
            ("fromBlock", allow_null(Check::BlockTag)),
            ("toBlock", allow_null(Check::BlockTag)),
            ("blockHash", allow_null(Check::Hash)),
            ("address", allow_null(Check::Address)),
            ("topics", allow_null(array_of(Check::Topic))),
        ];

        let filter_log = vec![
            ("blockNumber", allow_null(Check::Number)),
            ("blockHash", allow_null(Check::Hash)),
            ("transactionIndex", Check::Number),
            ("removed", Check::AllowNull(Box::new(Check::Bool), Some(json!(false)))),
            ("address", Check::Address),
            ("data", Check::AllowNull(Box::new(Check::Data), Some(json!("0x")))),
            ("topics", array_of(Check::Hash)),
            ("transactionHash", Check::Hash),
            ("logIndex", Check::Number),
        ];

        Self {
            transaction,
            receipt,
            receipt_log,
            block_header,
            block,
            filter,
            filter_log,
        }
    }
}
