use serde::{Deserialize, Serialize};

use crate::codec::{Address, H256};
use crate::models::BlockTag;

/// Topic position: `None` matches anything, otherwise any of the listed topics.
pub type TopicSet = Option<Vec<H256>>;

/// Log filter: emitting address plus a positional topic pattern.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Filter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_block: Option<BlockTag>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to_block: Option<BlockTag>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_hash: Option<H256>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<Address>,
    #[serde(default)]
    pub topics: Vec<TopicSet>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn address(mut self, address: Address) -> Self {
        self.address = Some(address);
        self
    }

    /// Append a position matching any of `topics`.
    pub fn topic(mut self, topics: Vec<H256>) -> Self {
        self.topics.push(Some(topics));
        self
    }

    /// Append a wildcard position.
    pub fn any_topic(mut self) -> Self {
        self.topics.push(None);
        self
    }

    pub fn from_block(mut self, tag: impl Into<BlockTag>) -> Self {
        self.from_block = Some(tag.into());
        self
    }

    pub fn to_block(mut self, tag: impl Into<BlockTag>) -> Self {
        self.to_block = Some(tag.into());
        self
    }
}
