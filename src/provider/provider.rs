use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::Duration;

use futures::future::join_all;
use log::{info, warn};
use num_traits::ToPrimitive;
use serde_json::{json, Value};
use tokio::sync::{mpsc, watch};
use tokio::time::{interval_at, timeout, Instant, MissedTickBehavior};

use super::poller::{log_range, PollState, SeenAt, SeenKey};
use super::transport::{HttpTransport, JsonRpcSender};
use crate::codec::primitives::{encode_hex, parse_quantity};
use crate::codec::{decode, DecodedTransaction, H256};
use crate::config::AppConfig;
use crate::error::{ClientError, FormatError, NetworkError, Result, RpcError, SignatureError};
use crate::events::{listener, Event, EventRegistry, EventSpec, EventTag, Listener};
use crate::formatter::Formatter;
use crate::logging::{ErrorLogger, LogContext, MetricsLogger, PerformanceMonitor};
use crate::models::{
    confirmations, Block, BlockTag, BlockWithTransactions, Filter, Log, Network, Receipt, TransactionResponse,
};

/// Runtime settings of a [`Provider`].
#[derive(Debug, Clone)]
pub struct PollerConfig {
    pub interval_ms: u64,
    pub block_skew_threshold: u64,
    pub retention_blocks: u64,
    pub max_filter_block_range: u64,
    pub fast_block_max_age_ms: u64,
    pub group_id: u64,
    pub chain_id: u64,
    pub any_network: bool,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            interval_ms: 4_000,
            block_skew_threshold: 1_000,
            retention_blocks: 12,
            max_filter_block_range: 10,
            fast_block_max_age_ms: 2_100,
            group_id: 1,
            chain_id: 1,
            any_network: false,
        }
    }
}

impl From<&AppConfig> for PollerConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            interval_ms: config.polling.interval_ms,
            block_skew_threshold: config.polling.block_skew_threshold,
            retention_blocks: config.polling.retention_blocks,
            max_filter_block_range: config.polling.max_filter_block_range,
            fast_block_max_age_ms: config.polling.fast_block_max_age_ms,
            group_id: config.chain.group_id,
            chain_id: config.chain.chain_id,
            any_network: config.chain.any_network,
        }
    }
}

/// A block by tag or by hash.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockId {
    Tag(BlockTag),
    Hash(H256),
}

impl From<BlockTag> for BlockId {
    fn from(tag: BlockTag) -> Self {
        BlockId::Tag(tag)
    }
}

impl From<u64> for BlockId {
    fn from(number: u64) -> Self {
        BlockId::Tag(BlockTag::Number(number))
    }
}

impl From<H256> for BlockId {
    fn from(hash: H256) -> Self {
        BlockId::Hash(hash)
    }
}

enum Lookup {
    Receipt(H256),
    Logs { tag: EventTag, from: u64, to: u64 },
}

struct ProviderInner {
    sender: Arc<dyn JsonRpcSender>,
    formatter: Formatter,
    registry: EventRegistry,
    config: PollerConfig,
    state: Mutex<PollState>,
    /// Serializes poll cycles
    cycle: tokio::sync::Mutex<()>,
    next_poll_id: AtomicU64,
    network: Mutex<Option<Network>>,
    interval_ms: AtomicU64,
    poller: Mutex<Option<watch::Sender<bool>>>,
    bootstrapped_at: Mutex<Option<Instant>>,
}

/// Read access to a ledger node plus polled event subscriptions.
#[derive(Clone)]
pub struct Provider {
    inner: Arc<ProviderInner>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn quantity_to_u64(method: &str, value: &Value) -> Result<u64> {
    let parsed = match value {
        Value::String(s) => parse_quantity(s).and_then(|n| n.to_u64()),
        Value::Number(n) => n.as_u64(),
        _ => None,
    };
    parsed.ok_or_else(|| {
        RpcError::InvalidResponse(format!("{} returned a non-numeric result: {}", method, value)).into()
    })
}

impl Provider {
    pub fn new(sender: Arc<dyn JsonRpcSender>, config: PollerConfig) -> Self {
        let interval_ms = config.interval_ms;
        Self {
            inner: Arc::new(ProviderInner {
                sender,
                formatter: Formatter::default(),
                registry: EventRegistry::new(),
                config,
                state: Mutex::new(PollState::new()),
                cycle: tokio::sync::Mutex::new(()),
                next_poll_id: AtomicU64::new(0),
                network: Mutex::new(None),
                interval_ms: AtomicU64::new(interval_ms),
                poller: Mutex::new(None),
                bootstrapped_at: Mutex::new(None),
            }),
        }
    }

    /// Provider talking HTTP to the configured endpoint.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let transport = HttpTransport::new(&config.rpc)?;
        Ok(Self::new(Arc::new(transport), PollerConfig::from(config)))
    }

    pub fn formatter(&self) -> &Formatter {
        &self.inner.formatter
    }

    pub fn config(&self) -> &PollerConfig {
        &self.inner.config
    }

    fn state(&self) -> MutexGuard<'_, PollState> {
        lock(&self.inner.state)
    }

    fn params(&self, rest: Vec<Value>) -> Value {
        let mut params = vec![json!(self.inner.config.group_id)];
        params.extend(rest);
        Value::Array(params)
    }

    async fn send(&self, method: &str, rest: Vec<Value>) -> Result<Value> {
        self.inner.sender.send(method, self.params(rest)).await
    }

    // ---- events ----

    fn add_listener(&self, spec: EventSpec, listener: Listener, once: bool) -> Result<()> {
        let tag = EventTag::from(spec);
        if tag == EventTag::Pending {
            return Err(ClientError::unsupported("pending transaction subscriptions"));
        }
        self.inner.registry.add(tag, listener, once);
        self.update_polling();
        Ok(())
    }

    pub fn on(&self, spec: impl Into<EventSpec>, listener: Listener) -> Result<()> {
        self.add_listener(spec.into(), listener, false)
    }

    pub fn once(&self, spec: impl Into<EventSpec>, listener: Listener) -> Result<()> {
        self.add_listener(spec.into(), listener, true)
    }

    /// Without a listener every registration for the event goes.
    pub fn off(&self, spec: impl Into<EventSpec>, listener: Option<&Listener>) -> bool {
        let removed = self.inner.registry.remove(&EventTag::from(spec.into()), listener);
        self.update_polling();
        removed
    }

    pub fn emit(&self, spec: impl Into<EventSpec>, event: Event) -> bool {
        self.dispatch(EventTag::from(spec.into()), event)
    }

    pub fn listener_count(&self, spec: Option<EventSpec>) -> usize {
        self.inner.registry.listener_count(spec.map(EventTag::from).as_ref())
    }

    pub fn listeners(&self, spec: Option<EventSpec>) -> Vec<Listener> {
        self.inner.registry.listeners(spec.map(EventTag::from).as_ref())
    }

    pub fn remove_all_listeners(&self, spec: Option<EventSpec>) {
        self.inner.registry.remove_all_listeners(spec.map(EventTag::from).as_ref());
        self.update_polling();
    }

    /// Wait until every event emitted so far has reached its listeners.
    pub async fn flush_events(&self) {
        self.inner.registry.flush().await;
    }

    fn dispatch(&self, tag: EventTag, event: Event) -> bool {
        let count = self.inner.registry.listener_count(Some(&tag));
        let fired = self.inner.registry.emit(&tag, event);
        if fired {
            MetricsLogger::log_events_dispatched(&tag, count);
            if self.inner.registry.listener_count(Some(&tag)) != count {
                // once-listeners went away
                self.update_polling();
            }
        }
        fired
    }

    fn dispatch_error(&self, error: ClientError, context: LogContext) {
        ErrorLogger::log_error(&error, Some(context));
        self.dispatch(EventTag::Error, Event::Error(Arc::new(error)));
    }

    // ---- polling ----

    fn update_polling(&self) {
        self.set_polling(self.inner.registry.has_pollable());
    }

    pub fn polling(&self) -> bool {
        lock(&self.inner.poller).is_some()
    }

    /// Start or stop the poll timer. An in-flight cycle always runs to completion.
    pub fn set_polling(&self, value: bool) {
        let mut poller = lock(&self.inner.poller);
        if value && poller.is_none() {
            let handle = match tokio::runtime::Handle::try_current() {
                Ok(handle) => handle,
                Err(_) => {
                    warn!("No tokio runtime available; polling not started");
                    return;
                }
            };

            let interval = self.polling_interval();
            let bootstrap = {
                let mut bootstrapped_at = lock(&self.inner.bootstrapped_at);
                match *bootstrapped_at {
                    Some(at) if at.elapsed() < interval => false,
                    _ => {
                        *bootstrapped_at = Some(Instant::now());
                        true
                    }
                }
            };

            let (stop, stopped) = watch::channel(false);
            handle.spawn(polling_loop(Arc::downgrade(&self.inner), interval, bootstrap, stopped));
            *poller = Some(stop);
            info!("Polling started every {}ms", interval.as_millis());
        } else if !value {
            if let Some(stop) = poller.take() {
                let _ = stop.send(true);
                info!("Polling stopped");
            }
        }
    }

    pub fn polling_interval(&self) -> Duration {
        Duration::from_millis(self.inner.interval_ms.load(Ordering::SeqCst))
    }

    /// Takes effect immediately; a running timer is restarted.
    pub fn set_polling_interval(&self, interval_ms: u64) {
        self.inner.interval_ms.store(interval_ms, Ordering::SeqCst);
        if self.polling() {
            self.set_polling(false);
            self.set_polling(true);
        }
    }

    /// Replay events starting at `block_number` on the next cycle.
    pub async fn reset_events_block(&self, block_number: u64) {
        {
            let mut state = self.state();
            // Forces the next cycle to run even at an unchanged height
            state.last_block_number = None;
            state.log_cursor = Some(block_number);
            state.retain_filters(&[]);
        }
        if self.polling() {
            self.poll().await;
        }
    }

    /// Run one poll cycle. Failures are reported as `error` events.
    pub async fn poll(&self) {
        let _cycle = self.inner.cycle.lock().await;
        let poll_id = self.inner.next_poll_id.fetch_add(1, Ordering::SeqCst) + 1;
        let monitor = PerformanceMonitor::new("poll_cycle").with_metadata("poll_id", json!(poll_id));
        let config = &self.inner.config;

        self.dispatch(EventTag::WillPoll, Event::WillPoll { poll_id });

        let height = match self.internal_block_number(self.fast_block_max_age()).await {
            Ok(height) => height,
            Err(error) => {
                self.dispatch_error(error, LogContext::new("poller", "get_block_number").with_poll_id(poll_id));
                return;
            }
        };

        self.dispatch(
            EventTag::Poll,
            Event::Poll {
                poll_id,
                block_number: height,
            },
        );

        let (previous_block_number, lookups) = {
            let mut state = self.state();
            if state.last_block_number == Some(height) {
                drop(state);
                self.dispatch(EventTag::DidPoll, Event::DidPoll { poll_id });
                return;
            }

            LogContext::new("poller", "poll")
                .with_poll_id(poll_id)
                .with_block_number(height)
                .debug(&format!("Poll {} observed block {}", poll_id, height));

            let previous = state.emitted_block;
            match previous {
                Some(emitted) if height.abs_diff(emitted) > config.block_skew_threshold => {
                    let error = ClientError::Network(NetworkError::BlockSkew {
                        block_number: height,
                        previous_block_number: emitted,
                    });
                    LogContext::new("poller", "poll")
                        .with_poll_id(poll_id)
                        .with_block_number(height)
                        .warn("Network block skew detected; skipping block events");
                    self.dispatch(EventTag::Error, Event::Error(Arc::new(error)));
                    self.dispatch(EventTag::Block, Event::Block(height));
                }
                Some(emitted) => {
                    for number in emitted.saturating_add(1)..=height {
                        self.dispatch(EventTag::Block, Event::Block(number));
                    }
                }
                // First cycle: the current height only, not a backlog
                None => {
                    self.dispatch(EventTag::Block, Event::Block(height));
                }
            }

            if previous != Some(height) {
                state.emitted_block = Some(height);
                let evicted = state.evict(height, config.retention_blocks);
                if evicted > 0 {
                    LogContext::new("poller", "evict")
                        .with_block_number(height)
                        .trace(&format!("Evicted {} stale entries", evicted));
                }
            }

            let log_cursor = state.log_cursor;

            let tags = self.inner.registry.tags();
            let filters: Vec<EventTag> = tags
                .iter()
                .filter(|tag| matches!(tag, EventTag::Filter { .. }))
                .cloned()
                .collect();
            state.retain_filters(&filters);

            let mut lookups = Vec::new();
            for tag in tags {
                match tag {
                    EventTag::Transaction(hash) => lookups.push(Lookup::Receipt(hash)),
                    EventTag::Filter { .. } => {
                        let range = log_range(
                            state.filter_block(&tag),
                            log_cursor,
                            height,
                            config.max_filter_block_range,
                        );
                        if let Some((from, to)) = range {
                            lookups.push(Lookup::Logs { tag, from, to });
                        }
                    }
                    _ => {}
                }
            }

            let previous_block_number = state.last_block_number.replace(height);
            state.log_cursor = Some(height.saturating_add(1));
            (previous_block_number, lookups)
        };

        let lookup_count = lookups.len();
        join_all(lookups.into_iter().map(|lookup| self.run_lookup(lookup, height, poll_id))).await;

        MetricsLogger::log_poll_cycle(poll_id, height, lookup_count, monitor.finish());
        LogContext::new("poller", "poll")
            .with_poll_id(poll_id)
            .with_metadata("previous_block_number", json!(previous_block_number))
            .trace("Poll cycle complete");
        self.dispatch(EventTag::DidPoll, Event::DidPoll { poll_id });
    }

    async fn run_lookup(&self, lookup: Lookup, height: u64, poll_id: u64) {
        match lookup {
            Lookup::Receipt(hash) => match self.receipt_at(hash, height).await {
                Ok(Some(receipt)) => {
                    self.state()
                        .record(SeenKey::Transaction(hash), receipt.block_number);
                    self.dispatch(EventTag::Transaction(hash), Event::Receipt(receipt));
                }
                Ok(None) => {}
                Err(error) => self.dispatch_error(
                    error,
                    LogContext::new("poller", "get_transaction_receipt")
                        .with_poll_id(poll_id)
                        .with_transaction_hash(&hash.to_string()),
                ),
            },
            Lookup::Logs { tag, from, to } => {
                let filter = match tag.filter() {
                    Some(filter) => filter.from_block(from).to_block(to),
                    None => return,
                };
                match self.get_logs(&filter).await {
                    Ok(logs) => {
                        {
                            let mut state = self.state();
                            for log in &logs {
                                if let Some(number) = log.block_number {
                                    if let Some(block_hash) = log.block_hash {
                                        state.record(SeenKey::BlockHash(block_hash), number);
                                    }
                                    if let Some(tx_hash) = log.transaction_hash {
                                        state.record(SeenKey::Transaction(tx_hash), number);
                                    }
                                }
                            }
                            state.set_filter_block(tag.clone(), to);
                        }
                        for log in logs {
                            self.dispatch(tag.clone(), Event::Log(log));
                        }
                    }
                    Err(error) => self.dispatch_error(
                        error,
                        LogContext::new("poller", "get_logs")
                            .with_poll_id(poll_id)
                            .with_event_tag(&tag)
                            .with_metadata("from_block", json!(from))
                            .with_metadata("to_block", json!(to)),
                    ),
                }
            }
        }
    }

    /// Where `key` sits in the eviction map, if it is tracked.
    pub fn seen(&self, key: &SeenKey) -> Option<SeenAt> {
        self.state().seen(key)
    }

    fn fast_block_max_age(&self) -> Duration {
        Duration::from_millis(self.inner.config.fast_block_max_age_ms)
    }

    async fn internal_block_number(&self, max_age: Duration) -> Result<u64> {
        if let Some(height) = self.state().fast_block_number(max_age) {
            return Ok(height);
        }

        self.get_network().await?;
        let result = self.send("getBlockNumber", vec![]).await?;
        let height = quantity_to_u64("getBlockNumber", &result)?;
        Ok(self.state().observe_block_number(height))
    }

    // ---- network ----

    /// Ask the node which chain it is on.
    pub async fn detect_network(&self) -> Result<Network> {
        let version = self.send("getClientVersion", vec![]).await?;
        Ok(self.inner.formatter.network(&version)?)
    }

    /// The connected network, checked against the one seen before.
    pub async fn get_network(&self) -> Result<Network> {
        let detected = self.detect_network().await?;
        let known = lock(&self.inner.network).clone();
        let config = &self.inner.config;

        match known {
            Some(known) if known.chain_id == detected.chain_id => Ok(known),
            None => {
                if !config.any_network && detected.chain_id != config.chain_id {
                    return Err(NetworkError::NetworkChanged {
                        expected: config.chain_id,
                        actual: detected.chain_id,
                    }
                    .into());
                }
                *lock(&self.inner.network) = Some(detected.clone());
                self.dispatch(
                    EventTag::Network,
                    Event::Network {
                        new: detected.clone(),
                        old: None,
                    },
                );
                Ok(detected)
            }
            Some(known) => {
                if !config.any_network {
                    return Err(NetworkError::NetworkChanged {
                        expected: known.chain_id,
                        actual: detected.chain_id,
                    }
                    .into());
                }

                LogContext::new("provider", "network")
                    .with_metadata("old_chain_id", json!(known.chain_id))
                    .with_metadata("new_chain_id", json!(detected.chain_id))
                    .warn("Underlying network changed; resetting poll state");
                self.state().reset();
                *lock(&self.inner.network) = Some(detected.clone());
                self.dispatch(
                    EventTag::Network,
                    Event::Network {
                        new: detected.clone(),
                        old: Some(known),
                    },
                );
                Ok(detected)
            }
        }
    }

    // ---- accessors ----

    /// Current height, reusing a recently fetched value.
    pub async fn get_block_number(&self) -> Result<u64> {
        self.internal_block_number(self.fast_block_max_age()).await
    }

    async fn block_params(&self, id: BlockId, with_transactions: bool) -> Result<(&'static str, Vec<Value>)> {
        match id {
            BlockId::Hash(hash) => Ok(("getBlockByHash", vec![json!(hash), json!(with_transactions)])),
            BlockId::Tag(tag) => {
                let number = match tag {
                    BlockTag::Pending => return Err(ClientError::unsupported("pending block tag")),
                    BlockTag::Earliest => 0,
                    BlockTag::Latest => self.get_block_number().await?,
                    BlockTag::Number(number) => number,
                };
                Ok((
                    "getBlockByNumber",
                    vec![self.inner.formatter.block_tag(&BlockTag::Number(number)), json!(with_transactions)],
                ))
            }
        }
    }

    pub async fn get_block(&self, id: impl Into<BlockId>) -> Result<Option<Block>> {
        let (method, params) = self.block_params(id.into(), false).await?;
        let value = self.send(method, params).await?;
        if value.is_null() {
            return Ok(None);
        }
        Ok(Some(self.inner.formatter.block(&value)?))
    }

    /// Transactions carry confirmations counted at the current height.
    pub async fn get_block_with_transactions(&self, id: impl Into<BlockId>) -> Result<Option<BlockWithTransactions>> {
        let (method, params) = self.block_params(id.into(), true).await?;
        let value = self.send(method, params).await?;
        if value.is_null() {
            return Ok(None);
        }
        let mut block = self.inner.formatter.block_with_transactions(&value)?;

        let height = self.get_block_number().await?;
        for tx in &mut block.transactions {
            if let Some(mined_at) = tx.block_number {
                tx.confirmations = confirmations(height, mined_at);
            }
        }
        Ok(Some(block))
    }

    pub async fn get_transaction(&self, hash: H256) -> Result<Option<TransactionResponse>> {
        let value = self.send("getTransactionByHash", vec![json!(hash)]).await?;
        if value.is_null() {
            return Ok(None);
        }
        let mut tx = self.inner.formatter.transaction_response(&value)?;
        if let Some(mined_at) = tx.block_number {
            tx.confirmations = confirmations(self.get_block_number().await?, mined_at);
        }
        Ok(Some(tx))
    }

    /// `None` until the transaction is mined.
    pub async fn get_transaction_receipt(&self, hash: H256) -> Result<Option<Receipt>> {
        let value = self.send("getTransactionReceipt", vec![json!(hash)]).await?;
        if value.is_null() {
            return Ok(None);
        }
        let mut receipt = self.inner.formatter.receipt(&value)?;
        receipt.confirmations = receipt.confirmations_at(self.get_block_number().await?);
        Ok(Some(receipt))
    }

    async fn receipt_at(&self, hash: H256, height: u64) -> Result<Option<Receipt>> {
        let value = self.send("getTransactionReceipt", vec![json!(hash)]).await?;
        if value.is_null() {
            return Ok(None);
        }
        let mut receipt = self.inner.formatter.receipt(&value)?;
        receipt.confirmations = receipt.confirmations_at(height);
        Ok(Some(receipt))
    }

    pub async fn get_logs(&self, filter: &Filter) -> Result<Vec<Log>> {
        if filter.from_block == Some(BlockTag::Pending) || filter.to_block == Some(BlockTag::Pending) {
            return Err(ClientError::unsupported("pending block tag"));
        }
        let value = self.send("getLogs", vec![self.inner.formatter.filter(filter)?]).await?;
        match value {
            Value::Array(items) => items
                .iter()
                .enumerate()
                .map(|(index, item)| {
                    self.inner
                        .formatter
                        .log(item)
                        .map_err(|e| ClientError::from(e.nested(&index.to_string())))
                })
                .collect(),
            other => Err(FormatError::new("logs", other, "expected an array").into()),
        }
    }

    /// Submit a signed transaction. Its hash is tracked as pending until mined.
    pub async fn send_transaction(&self, raw: &[u8]) -> Result<TransactionResponse> {
        let signed = match decode(raw)? {
            DecodedTransaction::Signed(signed) => signed,
            DecodedTransaction::Unsigned(_) => {
                return Err(SignatureError::InvalidSignature("transaction is not signed".to_string()).into());
            }
        };
        let from = signed
            .from
            .ok_or_else(|| SignatureError::Recovery("cannot recover the sender".to_string()))?;

        let result = self.send("sendRawTransaction", vec![json!(encode_hex(raw))]).await?;
        let hash: H256 = result
            .as_str()
            .and_then(|s| s.parse().ok())
            .ok_or_else(|| RpcError::InvalidResponse(format!("sendRawTransaction returned {}", result)))?;
        if signed.hash.map_or(false, |expected| expected != hash) {
            return Err(RpcError::InvalidResponse(format!("transaction hash mismatch: node returned {}", hash)).into());
        }

        self.state().mark_pending(hash);
        LogContext::new("provider", "send_transaction")
            .with_transaction_hash(&hash.to_string())
            .info("Transaction submitted");

        Ok(TransactionResponse::from_signed(&signed, hash, from, raw)?)
    }

    /// Resolve once the receipt for `hash` has at least `confirmations` confirmations.
    ///
    /// A `confirmations` of zero waits for the transaction to be mined. Without a
    /// timeout the wait lasts until the receipt arrives.
    pub async fn wait_for_transaction(&self, hash: H256, confirmations: u64, timeout_ms: Option<u64>) -> Result<Receipt> {
        let confirmations = confirmations.max(1);
        if let Some(receipt) = self.get_transaction_receipt(hash).await? {
            if receipt.confirmations >= confirmations {
                return Ok(receipt);
            }
        }

        let (found, mut receipts) = mpsc::unbounded_channel();
        let watcher = listener(move |event| {
            if let Event::Receipt(receipt) = event {
                if receipt.confirmations >= confirmations {
                    let _ = found.send(receipt.clone());
                }
            }
        });
        // Only the registry keeps the watcher alive, so removing it ends the wait
        let registered = Arc::downgrade(&watcher);
        self.on(hash, watcher)?;

        let outcome = match timeout_ms {
            Some(ms) => timeout(Duration::from_millis(ms), receipts.recv())
                .await
                .map_err(|_| ClientError::Timeout { timeout_ms: ms }),
            None => Ok(receipts.recv().await),
        };
        if let Some(watcher) = registered.upgrade() {
            self.off(hash, Some(&watcher));
        }

        outcome?.ok_or_else(|| {
            NetworkError::Transient(format!("watch for transaction {} was removed", hash)).into()
        })
    }

    /// Stop the poll timer.
    pub fn stop(&self) {
        self.set_polling(false);
    }
}

async fn polling_loop(
    inner: Weak<ProviderInner>,
    interval: Duration,
    bootstrap: bool,
    mut stopped: watch::Receiver<bool>,
) {
    if bootstrap {
        tokio::task::yield_now().await;
        match inner.upgrade() {
            Some(inner) => Provider { inner }.poll().await,
            None => return,
        }
    }

    let mut ticker = interval_at(Instant::now() + interval, interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = stopped.changed() => break,
            _ = ticker.tick() => {
                match inner.upgrade() {
                    Some(inner) => Provider { inner }.poll().await,
                    None => break,
                }
            }
        }
    }
}
