use std::collections::HashMap;
use std::time::Duration;

use tokio::time::Instant;

use crate::codec::H256;
use crate::events::EventTag;

/// Keys of the eviction map.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SeenKey {
    Transaction(H256),
    BlockHash(H256),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeenAt {
    /// Sent by this client and not yet mined; never aged out
    Pending,
    Block(u64),
}

/// Everything the poller remembers between cycles.
#[derive(Debug, Default)]
pub struct PollState {
    /// Last height fully processed
    pub last_block_number: Option<u64>,
    /// Last height a `block` event went out for; `None` until the first one
    pub emitted_block: Option<u64>,
    /// First block no log query has covered yet; `None` until the first cycle
    pub log_cursor: Option<u64>,
    seen: HashMap<SeenKey, SeenAt>,
    /// Last height whose logs were fetched, per filter tag
    filter_blocks: HashMap<EventTag, u64>,
    fast_block: Option<(u64, Instant)>,
    max_internal_block_number: Option<u64>,
}

impl PollState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark_pending(&mut self, hash: H256) {
        self.seen.insert(SeenKey::Transaction(hash), SeenAt::Pending);
    }

    pub fn record(&mut self, key: SeenKey, block_number: u64) {
        self.seen.insert(key, SeenAt::Block(block_number));
    }

    pub fn seen(&self, key: &SeenKey) -> Option<SeenAt> {
        self.seen.get(key).copied()
    }

    /// Drop entries more than `retention` blocks behind `height`. Pending entries stay.
    pub fn evict(&mut self, height: u64, retention: u64) -> usize {
        let before = self.seen.len();
        self.seen.retain(|_, at| match at {
            SeenAt::Pending => true,
            SeenAt::Block(n) => height.saturating_sub(*n) <= retention,
        });
        before - self.seen.len()
    }

    pub fn filter_block(&self, tag: &EventTag) -> Option<u64> {
        self.filter_blocks.get(tag).copied()
    }

    pub fn set_filter_block(&mut self, tag: EventTag, block_number: u64) {
        self.filter_blocks.insert(tag, block_number);
    }

    /// Forget filters nobody listens to anymore.
    pub fn retain_filters(&mut self, active: &[EventTag]) {
        self.filter_blocks.retain(|tag, _| active.contains(tag));
    }

    /// The cached height, when it is younger than `max_age`.
    pub fn fast_block_number(&self, max_age: Duration) -> Option<u64> {
        self.fast_block
            .filter(|(_, at)| at.elapsed() < max_age)
            .map(|(n, _)| n)
    }

    /// Record a freshly fetched height. Heights reported to callers never go backwards.
    pub fn observe_block_number(&mut self, height: u64) -> u64 {
        let height = match self.max_internal_block_number {
            Some(max) if height < max => max,
            _ => height,
        };
        self.max_internal_block_number = Some(height);
        self.fast_block = Some((height, Instant::now()));
        height
    }

    /// Start over, as after a network change.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}

/// Inclusive log range for one filter in a cycle, or `None` when nothing new is covered.
///
/// Starts after the filter's own last block, else at `log_cursor`, else (first cycle)
/// at `height` itself. Never spans more than `max_range` blocks below `height`.
pub fn log_range(
    filter_block: Option<u64>,
    log_cursor: Option<u64>,
    height: u64,
    max_range: u64,
) -> Option<(u64, u64)> {
    let from = match filter_block {
        Some(block) => block.saturating_add(1),
        None => log_cursor.unwrap_or(height),
    };
    let from = from.max(height.saturating_sub(max_range));
    if from > height {
        return None;
    }
    Some((from, height))
}
