use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use num_bigint::BigUint;
use num_traits::ToPrimitive;
use serde_json::{json, Value};
use tokio::time::sleep;

use ledger_client::codec::primitives::{decode_hex, encode_hex, parse_quantity};
use ledger_client::codec::{keccak256, sign_transaction, LocalSigner, UnsignedTransaction};
use ledger_client::error::{ClientError, NetworkError, Result};
use ledger_client::events::{listener, Event, EventSpec};
use ledger_client::models::Filter;
use ledger_client::provider::{JsonRpcSender, PollerConfig, Provider, SeenAt, SeenKey};
use ledger_client::{Address, H256};

const INTERVAL_MS: u64 = 1_000;
const CONTRACT: &str = "0x3535353535353535353535353535353535353535";

/// In-memory node whose answers the test changes between polls.
struct ScriptedNode {
    height: AtomicU64,
    chain_id: AtomicU64,
    fail_block_number: AtomicBool,
    /// transaction hash -> block it was mined in
    receipts: Mutex<HashMap<H256, u64>>,
    broken_receipts: Mutex<HashSet<H256>>,
    /// blocks holding one matching log each
    log_blocks: Mutex<Vec<u64>>,
    calls: Mutex<Vec<(String, Value)>>,
}

impl ScriptedNode {
    fn new(height: u64) -> Arc<Self> {
        Arc::new(Self {
            height: AtomicU64::new(height),
            chain_id: AtomicU64::new(1),
            fail_block_number: AtomicBool::new(false),
            receipts: Mutex::new(HashMap::new()),
            broken_receipts: Mutex::new(HashSet::new()),
            log_blocks: Mutex::new(Vec::new()),
            calls: Mutex::new(Vec::new()),
        })
    }

    fn set_height(&self, height: u64) {
        self.height.store(height, Ordering::SeqCst);
    }

    fn mine(&self, hash: H256, block_number: u64) {
        self.receipts.lock().unwrap().insert(hash, block_number);
    }

    fn calls_to(&self, method: &str) -> Vec<Value> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(m, _)| m == method)
            .map(|(_, params)| params.clone())
            .collect()
    }

    fn receipt(hash: H256, block_number: u64) -> Value {
        json!({
            "transactionHash": hash,
            "transactionIndex": "0x0",
            "blockHash": H256([block_number as u8; 32]),
            "blockNumber": format!("0x{:x}", block_number),
            "gasUsed": "0x5208",
            "status": "0x1",
            "logs": [],
        })
    }

    fn log(block_number: u64) -> Value {
        json!({
            "blockNumber": format!("0x{:x}", block_number),
            "blockHash": H256([block_number as u8; 32]),
            "transactionIndex": "0x0",
            "address": CONTRACT,
            "data": "0x",
            "topics": [H256([0xaa; 32])],
            "transactionHash": H256([0xee; 32]),
            "logIndex": "0x0",
        })
    }
}

fn block_param(value: &Value) -> u64 {
    value
        .as_str()
        .and_then(parse_quantity)
        .and_then(|n| n.to_u64())
        .expect("numeric block parameter")
}

#[async_trait]
impl JsonRpcSender for ScriptedNode {
    async fn send(&self, method: &str, params: Value) -> Result<Value> {
        self.calls.lock().unwrap().push((method.to_string(), params.clone()));
        assert_eq!(params[0], json!(1), "group id leads every call");

        match method {
            "getClientVersion" => Ok(json!({
                "Chain Id": self.chain_id.load(Ordering::SeqCst).to_string(),
                "FISCO-BCOS Version": "2.9.0",
            })),
            "getBlockNumber" => {
                if self.fail_block_number.load(Ordering::SeqCst) {
                    return Err(NetworkError::Transient("node unavailable".to_string()).into());
                }
                Ok(json!(format!("0x{:x}", self.height.load(Ordering::SeqCst))))
            }
            "getTransactionReceipt" => {
                let hash: H256 = params[1].as_str().and_then(|s| s.parse().ok()).expect("hash parameter");
                if self.broken_receipts.lock().unwrap().contains(&hash) {
                    return Err(NetworkError::Transient("receipt lookup failed".to_string()).into());
                }
                Ok(match self.receipts.lock().unwrap().get(&hash) {
                    Some(block_number) => Self::receipt(hash, *block_number),
                    None => Value::Null,
                })
            }
            "getLogs" => {
                let from = block_param(&params[1]["fromBlock"]);
                let to = block_param(&params[1]["toBlock"]);
                let logs: Vec<Value> = self
                    .log_blocks
                    .lock()
                    .unwrap()
                    .iter()
                    .filter(|n| (from..=to).contains(*n))
                    .map(|n| Self::log(*n))
                    .collect();
                Ok(Value::Array(logs))
            }
            "sendRawTransaction" => {
                let raw = decode_hex(params[1].as_str().expect("raw transaction")).expect("hex");
                Ok(json!(keccak256(&raw)))
            }
            other => panic!("unexpected method {}", other),
        }
    }
}

fn test_config() -> PollerConfig {
    PollerConfig {
        interval_ms: INTERVAL_MS,
        fast_block_max_age_ms: 0,
        ..PollerConfig::default()
    }
}

/// Collects every event a listener sees.
fn recorder() -> (ledger_client::Listener, Arc<Mutex<Vec<Event>>>) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    (listener(move |event| sink.lock().unwrap().push(event.clone())), seen)
}

fn block_numbers(events: &Arc<Mutex<Vec<Event>>>) -> Vec<u64> {
    events
        .lock()
        .unwrap()
        .iter()
        .filter_map(|event| match event {
            Event::Block(n) => Some(*n),
            _ => None,
        })
        .collect()
}

/// Let the bootstrap poll run.
async fn settle(provider: &Provider) {
    sleep(Duration::from_millis(1)).await;
    provider.flush_events().await;
}

/// Let exactly one timer-driven poll run.
async fn next_poll(provider: &Provider) {
    sleep(Duration::from_millis(INTERVAL_MS)).await;
    provider.flush_events().await;
}

#[tokio::test(start_paused = true)]
async fn test_block_events_cover_every_height_in_order() {
    let node = ScriptedNode::new(100);
    let provider = Provider::new(node.clone(), test_config());
    let (on_block, blocks) = recorder();

    provider.on("block", on_block).unwrap();
    assert!(provider.polling());
    settle(&provider).await;
    assert_eq!(block_numbers(&blocks), vec![100]);

    node.set_height(103);
    next_poll(&provider).await;
    assert_eq!(block_numbers(&blocks), vec![100, 101, 102, 103]);

    // Unchanged height: nothing new
    next_poll(&provider).await;
    assert_eq!(block_numbers(&blocks), vec![100, 101, 102, 103]);

    provider.stop();
}

#[tokio::test(start_paused = true)]
async fn test_genesis_block_is_emitted_and_queried() {
    let node = ScriptedNode::new(0);
    node.log_blocks.lock().unwrap().push(0);
    let provider = Provider::new(node.clone(), test_config());
    let (on_block, blocks) = recorder();
    let (on_log, logs) = recorder();

    provider.on("block", on_block).unwrap();
    provider
        .on(Filter::new().address(CONTRACT.parse().unwrap()), on_log)
        .unwrap();
    settle(&provider).await;
    assert_eq!(block_numbers(&blocks), vec![0]);
    assert_eq!(logs.lock().unwrap().len(), 1);

    node.set_height(1);
    next_poll(&provider).await;
    assert_eq!(block_numbers(&blocks), vec![0, 1]);

    let queries = node.calls_to("getLogs");
    assert_eq!(queries.len(), 2);
    assert_eq!(queries[0][1]["fromBlock"], json!("0x0"));
    assert_eq!(queries[0][1]["toBlock"], json!("0x0"));
    assert_eq!(queries[1][1]["fromBlock"], json!("0x1"));
    assert_eq!(logs.lock().unwrap().len(), 1);

    provider.stop();
}

#[tokio::test(start_paused = true)]
async fn test_reset_events_block_replays_logs_from_genesis() {
    let node = ScriptedNode::new(4);
    node.log_blocks.lock().unwrap().extend([0, 2]);
    let provider = Provider::new(node.clone(), test_config());
    let (on_block, blocks) = recorder();
    let (on_log, logs) = recorder();

    provider.on("block", on_block).unwrap();
    provider
        .on(Filter::new().address(CONTRACT.parse().unwrap()), on_log)
        .unwrap();
    settle(&provider).await;
    assert!(logs.lock().unwrap().is_empty());

    // Same height, but the replay still runs
    provider.reset_events_block(0).await;
    provider.flush_events().await;

    let replayed: Vec<Option<u64>> = logs
        .lock()
        .unwrap()
        .iter()
        .filter_map(|event| match event {
            Event::Log(log) => Some(log.block_number),
            _ => None,
        })
        .collect();
    assert_eq!(replayed, vec![Some(0), Some(2)]);
    // Block events are not replayed
    assert_eq!(block_numbers(&blocks), vec![4]);

    let last_query = node.calls_to("getLogs").pop().unwrap();
    assert_eq!(last_query[1]["fromBlock"], json!("0x0"));
    assert_eq!(last_query[1]["toBlock"], json!("0x4"));

    provider.stop();
}

#[tokio::test(start_paused = true)]
async fn test_cycle_events_are_ordered() {
    let node = ScriptedNode::new(7);
    let provider = Provider::new(node.clone(), test_config());
    let (sink, events) = recorder();

    for name in ["willPoll", "poll", "block", "didPoll"] {
        provider.on(name, Arc::clone(&sink)).unwrap();
    }
    settle(&provider).await;

    let kinds: Vec<&'static str> = events
        .lock()
        .unwrap()
        .iter()
        .map(|event| match event {
            Event::WillPoll { .. } => "willPoll",
            Event::Poll { block_number: 7, .. } => "poll",
            Event::Block(7) => "block",
            Event::DidPoll { .. } => "didPoll",
            _ => "other",
        })
        .collect();
    assert_eq!(kinds, vec!["willPoll", "poll", "block", "didPoll"]);

    provider.stop();
}

#[tokio::test(start_paused = true)]
async fn test_large_jump_reports_skew_instead_of_replaying() {
    let node = ScriptedNode::new(1_000);
    let config = PollerConfig {
        block_skew_threshold: 100,
        ..test_config()
    };
    let provider = Provider::new(node.clone(), config);
    let (on_block, blocks) = recorder();
    let (on_error, errors) = recorder();
    let (on_log, _) = recorder();

    provider.on("error", on_error).unwrap();
    provider.on("block", on_block).unwrap();
    provider
        .on(Filter::new().address(CONTRACT.parse().unwrap()), on_log)
        .unwrap();
    settle(&provider).await;

    node.set_height(1_400);
    next_poll(&provider).await;

    assert_eq!(block_numbers(&blocks), vec![1_000, 1_400]);
    let errors = errors.lock().unwrap();
    assert_eq!(errors.len(), 1);
    match &errors[0] {
        Event::Error(error) => assert!(matches!(
            **error,
            ClientError::Network(NetworkError::BlockSkew {
                block_number: 1_400,
                previous_block_number: 1_000
            })
        )),
        other => panic!("expected an error event, got {:?}", other),
    }

    // The log query after the jump stays within the range limit
    let last_query = node.calls_to("getLogs").pop().unwrap();
    assert_eq!(last_query[1]["fromBlock"], json!("0x56e"));
    assert_eq!(last_query[1]["toBlock"], json!("0x578"));

    provider.stop();
}

#[tokio::test(start_paused = true)]
async fn test_failed_height_fetch_keeps_the_cursor() {
    let node = ScriptedNode::new(100);
    let provider = Provider::new(node.clone(), test_config());
    let (on_block, blocks) = recorder();
    let (on_error, errors) = recorder();
    let (on_did_poll, did_polls) = recorder();

    provider.on("block", on_block).unwrap();
    provider.on("error", on_error).unwrap();
    provider.on("didPoll", on_did_poll).unwrap();
    settle(&provider).await;
    assert_eq!(did_polls.lock().unwrap().len(), 1);

    node.fail_block_number.store(true, Ordering::SeqCst);
    node.set_height(102);
    next_poll(&provider).await;
    assert_eq!(errors.lock().unwrap().len(), 1);
    // An aborted cycle does not complete
    assert_eq!(did_polls.lock().unwrap().len(), 1);

    node.fail_block_number.store(false, Ordering::SeqCst);
    next_poll(&provider).await;
    assert_eq!(block_numbers(&blocks), vec![100, 101, 102]);

    provider.stop();
}

#[tokio::test(start_paused = true)]
async fn test_receipts_report_confirmations() {
    let node = ScriptedNode::new(104);
    let hash = H256([0x11; 32]);
    node.mine(hash, 100);
    let provider = Provider::new(node.clone(), test_config());

    let receipt = provider.get_transaction_receipt(hash).await.unwrap().unwrap();
    assert_eq!(receipt.block_number, 100);
    assert_eq!(receipt.confirmations, 5);

    let (on_receipt, receipts) = recorder();
    provider.on(hash, on_receipt).unwrap();
    settle(&provider).await;
    node.set_height(106);
    next_poll(&provider).await;

    let confirmations: Vec<u64> = receipts
        .lock()
        .unwrap()
        .iter()
        .filter_map(|event| match event {
            Event::Receipt(receipt) => Some(receipt.confirmations),
            _ => None,
        })
        .collect();
    assert_eq!(confirmations, vec![5, 7]);
    assert_eq!(provider.seen(&SeenKey::Transaction(hash)), Some(SeenAt::Block(100)));

    provider.stop();
}

#[tokio::test(start_paused = true)]
async fn test_one_failing_lookup_does_not_block_others() {
    let node = ScriptedNode::new(50);
    let good = H256([0x01; 32]);
    let bad = H256([0x02; 32]);
    node.mine(good, 50);
    node.broken_receipts.lock().unwrap().insert(bad);
    let provider = Provider::new(node.clone(), test_config());

    let (on_good, good_events) = recorder();
    let (on_bad, bad_events) = recorder();
    let (on_error, errors) = recorder();
    let (on_did_poll, did_polls) = recorder();
    provider.on("error", on_error).unwrap();
    provider.on("didPoll", on_did_poll).unwrap();
    provider.on(good, on_good).unwrap();
    provider.on(bad, on_bad).unwrap();
    settle(&provider).await;

    assert_eq!(good_events.lock().unwrap().len(), 1);
    assert!(bad_events.lock().unwrap().is_empty());
    assert_eq!(errors.lock().unwrap().len(), 1);
    assert_eq!(did_polls.lock().unwrap().len(), 1);

    provider.stop();
}

#[tokio::test(start_paused = true)]
async fn test_eviction_window_and_pending_entries() {
    let node = ScriptedNode::new(100);
    let mined = H256([0x21; 32]);
    node.mine(mined, 100);
    let provider = Provider::new(node.clone(), test_config());

    let (on_block, _) = recorder();
    provider.on("block", on_block).unwrap();
    let (on_receipt, _) = recorder();
    provider.on(mined, Arc::clone(&on_receipt)).unwrap();
    settle(&provider).await;
    assert_eq!(provider.seen(&SeenKey::Transaction(mined)), Some(SeenAt::Block(100)));
    provider.off(mined, Some(&on_receipt));

    // A transaction sent through this client is pending until mined
    let signer = LocalSigner::from_bytes(&[0x46; 32]).unwrap();
    let tx = UnsignedTransaction {
        nonce: BigUint::from(1u32),
        gas_limit: BigUint::from(21_000u32),
        to: Some(Address::from_slice(&[0x35; 20]).unwrap()),
        chain_id: BigUint::from(1u32),
        ..UnsignedTransaction::default()
    };
    let (raw, signed) = sign_transaction(&tx, &signer).unwrap();
    let response = provider.send_transaction(raw.as_slice()).await.unwrap();
    assert_eq!(Some(response.hash), signed.hash);
    assert_eq!(Some(response.from), signed.from);
    assert_eq!(response.confirmations, 0);
    assert_eq!(node.calls_to("sendRawTransaction")[0][1], json!(encode_hex(raw.as_slice())));

    node.set_height(111);
    next_poll(&provider).await;
    assert!(provider.seen(&SeenKey::Transaction(mined)).is_some());

    node.set_height(113);
    next_poll(&provider).await;
    assert!(provider.seen(&SeenKey::Transaction(mined)).is_none());
    assert_eq!(provider.seen(&SeenKey::Transaction(response.hash)), Some(SeenAt::Pending));

    provider.stop();
}

#[tokio::test(start_paused = true)]
async fn test_wait_for_transaction_resolves_on_confirmations() {
    let node = ScriptedNode::new(100);
    let hash = H256([0x31; 32]);
    node.mine(hash, 100);
    let provider = Provider::new(node.clone(), test_config());

    let waiter = {
        let provider = provider.clone();
        tokio::spawn(async move { provider.wait_for_transaction(hash, 2, Some(5_000)).await })
    };
    settle(&provider).await;
    assert_eq!(provider.listener_count(Some(EventSpec::Transaction(hash))), 1);

    node.set_height(101);
    next_poll(&provider).await;

    let receipt = waiter.await.unwrap().unwrap();
    assert_eq!(receipt.transaction_hash, hash);
    assert!(receipt.confirmations >= 2);
    assert_eq!(provider.listener_count(None), 0);
    assert!(!provider.polling());
}

#[tokio::test(start_paused = true)]
async fn test_wait_for_transaction_times_out() {
    let node = ScriptedNode::new(100);
    let hash = H256([0x41; 32]);
    let provider = Provider::new(node.clone(), test_config());

    let result = provider.wait_for_transaction(hash, 2, Some(5_000)).await;

    assert!(matches!(result, Err(ClientError::Timeout { timeout_ms: 5_000 })));
    assert_eq!(provider.listener_count(None), 0);
    assert!(!provider.polling());
}

#[tokio::test(start_paused = true)]
async fn test_equivalent_filters_share_one_subscription() {
    let node = ScriptedNode::new(100);
    node.log_blocks.lock().unwrap().push(101);
    let provider = Provider::new(node.clone(), test_config());

    let a = H256([0xaa; 32]);
    let b = H256([0xbb; 32]);
    let first = Filter::new().address(CONTRACT.parse().unwrap()).topic(vec![b, a]).any_topic();
    let second = Filter::new().address(CONTRACT.parse().unwrap()).topic(vec![a, b, a]);

    let (on_first, first_logs) = recorder();
    let (on_second, second_logs) = recorder();
    provider.on(first, on_first).unwrap();
    provider.on(second.clone(), on_second).unwrap();
    assert_eq!(provider.listener_count(Some(EventSpec::Filter(second))), 2);

    settle(&provider).await;
    node.set_height(101);
    next_poll(&provider).await;

    assert_eq!(first_logs.lock().unwrap().len(), 1);
    assert_eq!(second_logs.lock().unwrap().len(), 1);

    // One query per cycle, each covering only the new block
    let queries = node.calls_to("getLogs");
    assert_eq!(queries.len(), 2);
    assert_eq!(queries[0][1]["fromBlock"], json!("0x64"));
    assert_eq!(queries[1][1]["fromBlock"], json!("0x65"));
    assert_eq!(queries[1][1]["toBlock"], json!("0x65"));

    let log_tx = H256([0xee; 32]);
    assert_eq!(provider.seen(&SeenKey::Transaction(log_tx)), Some(SeenAt::Block(101)));
    assert_eq!(provider.seen(&SeenKey::BlockHash(H256([101; 32]))), Some(SeenAt::Block(101)));

    provider.stop();
}

#[tokio::test(start_paused = true)]
async fn test_network_change_resets_when_following_any_network() {
    let node = ScriptedNode::new(100);
    let config = PollerConfig {
        any_network: true,
        ..test_config()
    };
    let provider = Provider::new(node.clone(), config);
    let (on_block, blocks) = recorder();
    let (on_network, networks) = recorder();

    provider.on("network", on_network).unwrap();
    provider.on("block", on_block).unwrap();
    settle(&provider).await;

    node.chain_id.store(2, Ordering::SeqCst);
    node.set_height(105);
    next_poll(&provider).await;

    // After the reset the new chain starts fresh at its current height
    assert_eq!(block_numbers(&blocks), vec![100, 105]);
    let changes: Vec<(u64, Option<u64>)> = networks
        .lock()
        .unwrap()
        .iter()
        .filter_map(|event| match event {
            Event::Network { new, old } => Some((new.chain_id, old.as_ref().map(|n| n.chain_id))),
            _ => None,
        })
        .collect();
    assert_eq!(changes, vec![(1, None), (2, Some(1))]);

    provider.stop();
}

#[tokio::test(start_paused = true)]
async fn test_network_change_is_an_error_otherwise() {
    let node = ScriptedNode::new(100);
    let provider = Provider::new(node.clone(), test_config());
    let (on_block, blocks) = recorder();
    let (on_error, errors) = recorder();

    provider.on("error", on_error).unwrap();
    provider.on("block", on_block).unwrap();
    settle(&provider).await;

    node.chain_id.store(2, Ordering::SeqCst);
    node.set_height(105);
    next_poll(&provider).await;

    assert_eq!(block_numbers(&blocks), vec![100]);
    let errors = errors.lock().unwrap();
    assert!(matches!(
        &errors[0],
        Event::Error(error) if matches!(
            **error,
            ClientError::Network(NetworkError::NetworkChanged { expected: 1, actual: 2 })
        )
    ));

    provider.stop();
}

#[tokio::test(start_paused = true)]
async fn test_polling_stops_with_the_last_pollable_listener() {
    let node = ScriptedNode::new(10);
    let provider = Provider::new(node.clone(), test_config());
    let (on_block, blocks) = recorder();

    provider.once("block", on_block).unwrap();
    assert!(provider.polling());
    settle(&provider).await;

    assert_eq!(block_numbers(&blocks), vec![10]);
    assert_eq!(provider.listener_count(None), 0);
    assert!(!provider.polling());

    // No timer, so no more height fetches
    let fetched = node.calls_to("getBlockNumber").len();
    node.set_height(20);
    sleep(Duration::from_millis(INTERVAL_MS * 3)).await;
    assert_eq!(node.calls_to("getBlockNumber").len(), fetched);
}
