use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard};

use log::{debug, error};
use serde_json::Value;
use tokio::sync::{mpsc, oneshot};

use super::tag::EventTag;
use crate::error::ClientError;
use crate::models::{Log, Network, Receipt};

/// Payload delivered to listeners.
#[derive(Debug, Clone)]
pub enum Event {
    Block(u64),
    Receipt(Receipt),
    Log(Log),
    Error(Arc<ClientError>),
    Poll { poll_id: u64, block_number: u64 },
    DidPoll { poll_id: u64 },
    WillPoll { poll_id: u64 },
    Network { new: Network, old: Option<Network> },
    Custom(Value),
}

/// Listener identity is the `Arc` pointer.
pub type Listener = Arc<dyn Fn(&Event) + Send + Sync>;

pub fn listener<F>(f: F) -> Listener
where
    F: Fn(&Event) + Send + Sync + 'static,
{
    Arc::new(f)
}

#[derive(Clone)]
struct Registration {
    tag: EventTag,
    listener: Listener,
    once: bool,
}

enum Job {
    Deliver { listeners: Vec<Listener>, event: Event },
    Barrier(oneshot::Sender<()>),
}

/// Listener table plus a single dispatcher that runs listeners in emit order,
/// never from inside `emit` itself.
pub struct EventRegistry {
    registrations: Mutex<Vec<Registration>>,
    sender: mpsc::UnboundedSender<Job>,
    receiver: Mutex<Option<mpsc::UnboundedReceiver<Job>>>,
}

impl Default for EventRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl EventRegistry {
    pub fn new() -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        Self {
            registrations: Mutex::new(Vec::new()),
            sender,
            receiver: Mutex::new(Some(receiver)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Registration>> {
        // A panicking listener never holds this lock, so poisoning carries no torn state
        self.registrations.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Start the dispatcher on the current runtime the first time one is available.
    /// Jobs queued before that are delivered once it starts.
    fn ensure_dispatcher(&self) {
        let mut receiver = self.receiver.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if receiver.is_none() {
            return;
        }
        let handle = match tokio::runtime::Handle::try_current() {
            Ok(handle) => handle,
            Err(_) => return,
        };
        if let Some(mut jobs) = receiver.take() {
            handle.spawn(async move {
                while let Some(job) = jobs.recv().await {
                    match job {
                        Job::Deliver { listeners, event } => {
                            for listener in listeners {
                                if catch_unwind(AssertUnwindSafe(|| listener(&event))).is_err() {
                                    error!("Event listener panicked while handling {:?}", event);
                                }
                            }
                        }
                        Job::Barrier(done) => {
                            let _ = done.send(());
                        }
                    }
                }
                debug!("Event dispatcher stopped");
            });
        }
    }

    pub fn add(&self, tag: EventTag, listener: Listener, once: bool) {
        self.lock().push(Registration { tag, listener, once });
    }

    /// Remove the first registration of `listener` for `tag`, or every registration
    /// for `tag` when no listener is given. Returns whether anything was removed.
    pub fn remove(&self, tag: &EventTag, listener: Option<&Listener>) -> bool {
        let mut registrations = self.lock();
        match listener {
            Some(listener) => {
                match registrations
                    .iter()
                    .position(|r| &r.tag == tag && Arc::ptr_eq(&r.listener, listener))
                {
                    Some(index) => {
                        registrations.remove(index);
                        true
                    }
                    None => false,
                }
            }
            None => {
                let before = registrations.len();
                registrations.retain(|r| &r.tag != tag);
                registrations.len() != before
            }
        }
    }

    /// Queue `event` for every listener of `tag`. Once-registrations are dropped here,
    /// after they have been queued.
    pub fn emit(&self, tag: &EventTag, event: Event) -> bool {
        let listeners: Vec<Listener> = {
            let mut registrations = self.lock();
            let listeners = registrations
                .iter()
                .filter(|r| &r.tag == tag)
                .map(|r| Arc::clone(&r.listener))
                .collect::<Vec<_>>();
            registrations.retain(|r| !(r.once && &r.tag == tag));
            listeners
        };

        if listeners.is_empty() {
            return false;
        }

        self.ensure_dispatcher();
        if self.sender.send(Job::Deliver { listeners, event }).is_err() {
            error!("Event dispatcher is gone; dropping event for {}", tag);
        }
        true
    }

    pub fn listener_count(&self, tag: Option<&EventTag>) -> usize {
        let registrations = self.lock();
        match tag {
            Some(tag) => registrations.iter().filter(|r| &r.tag == tag).count(),
            None => registrations.len(),
        }
    }

    pub fn listeners(&self, tag: Option<&EventTag>) -> Vec<Listener> {
        self.lock()
            .iter()
            .filter(|r| tag.map_or(true, |t| &r.tag == t))
            .map(|r| Arc::clone(&r.listener))
            .collect()
    }

    pub fn remove_all_listeners(&self, tag: Option<&EventTag>) {
        let mut registrations = self.lock();
        match tag {
            Some(tag) => registrations.retain(|r| &r.tag != tag),
            None => registrations.clear(),
        }
    }

    /// Distinct registered tags, in first-registration order.
    pub fn tags(&self) -> Vec<EventTag> {
        let mut tags: Vec<EventTag> = Vec::new();
        for registration in self.lock().iter() {
            if !tags.contains(&registration.tag) {
                tags.push(registration.tag.clone());
            }
        }
        tags
    }

    pub fn has_pollable(&self) -> bool {
        self.lock().iter().any(|r| r.tag.is_pollable())
    }

    /// Resolves once every event emitted before this call has been delivered.
    pub async fn flush(&self) {
        self.ensure_dispatcher();
        let (done, wait) = oneshot::channel();
        if self.sender.send(Job::Barrier(done)).is_ok() {
            let _ = wait.await;
        }
    }
}
