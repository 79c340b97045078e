use std::fmt;

use crate::codec::primitives::encode_hex;
use crate::codec::{Address, H256};
use crate::models::{Filter, TopicSet};

/// What a listener wants to hear about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventSpec {
    Block,
    Pending,
    Error,
    Poll,
    DidPoll,
    WillPoll,
    Network,
    Named(String),
    Transaction(H256),
    Filter(Filter),
}

impl From<&str> for EventSpec {
    fn from(name: &str) -> Self {
        match name {
            "block" => EventSpec::Block,
            "pending" => EventSpec::Pending,
            "error" => EventSpec::Error,
            "poll" => EventSpec::Poll,
            "didPoll" => EventSpec::DidPoll,
            "willPoll" => EventSpec::WillPoll,
            "network" => EventSpec::Network,
            other => match other.strip_prefix("tx:").and_then(|hash| hash.parse().ok()) {
                Some(hash) => EventSpec::Transaction(hash),
                None => EventSpec::Named(other.to_string()),
            },
        }
    }
}

impl From<H256> for EventSpec {
    fn from(hash: H256) -> Self {
        EventSpec::Transaction(hash)
    }
}

impl From<Filter> for EventSpec {
    fn from(filter: Filter) -> Self {
        EventSpec::Filter(filter)
    }
}

/// Canonical key for an [`EventSpec`]. Equal tags mean equal subscriptions.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EventTag {
    Block,
    Pending,
    Error,
    Poll,
    DidPoll,
    WillPoll,
    Network,
    Named(String),
    Transaction(H256),
    /// OR-groups sorted and de-duplicated, trailing wildcards removed
    Filter {
        address: Option<Address>,
        topics: Vec<TopicSet>,
    },
}

impl EventTag {
    pub fn from_spec(spec: &EventSpec) -> Self {
        match spec {
            EventSpec::Block => EventTag::Block,
            EventSpec::Pending => EventTag::Pending,
            EventSpec::Error => EventTag::Error,
            EventSpec::Poll => EventTag::Poll,
            EventSpec::DidPoll => EventTag::DidPoll,
            EventSpec::WillPoll => EventTag::WillPoll,
            EventSpec::Network => EventTag::Network,
            EventSpec::Named(name) => EventTag::Named(name.clone()),
            EventSpec::Transaction(hash) => EventTag::Transaction(*hash),
            EventSpec::Filter(filter) => EventTag::Filter {
                address: filter.address,
                topics: canonical_topics(&filter.topics),
            },
        }
    }

    /// Tags the poller has to do work for.
    pub fn is_pollable(&self) -> bool {
        matches!(
            self,
            EventTag::Block
                | EventTag::Pending
                | EventTag::Poll
                | EventTag::Network
                | EventTag::Transaction(_)
                | EventTag::Filter { .. }
        )
    }

    /// The filter this tag stands for, when it is a filter tag.
    pub fn filter(&self) -> Option<Filter> {
        match self {
            EventTag::Filter { address, topics } => Some(Filter {
                address: *address,
                topics: topics.clone(),
                ..Filter::default()
            }),
            _ => None,
        }
    }
}

impl From<&EventSpec> for EventTag {
    fn from(spec: &EventSpec) -> Self {
        EventTag::from_spec(spec)
    }
}

impl From<EventSpec> for EventTag {
    fn from(spec: EventSpec) -> Self {
        EventTag::from_spec(&spec)
    }
}

fn canonical_topics(topics: &[TopicSet]) -> Vec<TopicSet> {
    let mut canonical: Vec<TopicSet> = topics
        .iter()
        .map(|position| {
            position.as_ref().map(|group| {
                let mut group = group.clone();
                group.sort();
                group.dedup();
                group
            })
        })
        .collect();

    while matches!(canonical.last(), Some(None)) {
        canonical.pop();
    }
    canonical
}

fn serialize_topics(topics: &[TopicSet]) -> String {
    topics
        .iter()
        .map(|position| match position {
            None => "null".to_string(),
            Some(group) => group.iter().map(H256::to_string).collect::<Vec<_>>().join("|"),
        })
        .collect::<Vec<_>>()
        .join("&")
}

impl fmt::Display for EventTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventTag::Block => f.write_str("block"),
            EventTag::Pending => f.write_str("pending"),
            EventTag::Error => f.write_str("error"),
            EventTag::Poll => f.write_str("poll"),
            EventTag::DidPoll => f.write_str("didPoll"),
            EventTag::WillPoll => f.write_str("willPoll"),
            EventTag::Network => f.write_str("network"),
            EventTag::Named(name) => f.write_str(name),
            EventTag::Transaction(hash) => write!(f, "tx:{}", hash),
            EventTag::Filter { address, topics } => {
                let address = address
                    .map(|a| encode_hex(a.as_bytes()))
                    .unwrap_or_else(|| "*".to_string());
                write!(f, "filter:{}:{}", address, serialize_topics(topics))
            }
        }
    }
}
