use parking_lot::Mutex;
use std::borrow::Borrow;
use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;
use std::sync::{Arc, Weak};
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, warn};

use super::events::StreamEvent;

/// Live output channels grouped by key.
///
/// Publishing never blocks: every subscriber has its own bounded queue. A
/// subscriber whose queue is closed or full is dropped from the registry,
/// which ends its stream. Keys disappear as soon as their last subscriber
/// goes away.
pub struct BroadcastRegistry<K> {
    inner: Arc<Mutex<Channels<K>>>,
    capacity: usize,
}

struct Channels<K> {
    next_id: u64,
    by_key: HashMap<K, HashMap<u64, mpsc::Sender<StreamEvent>>>,
}

impl<K> Clone for BroadcastRegistry<K> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            capacity: self.capacity,
        }
    }
}

impl<K> BroadcastRegistry<K>
where
    K: Eq + Hash + Clone + Debug,
{
    /// Creates an empty registry; `capacity` is the per-subscriber queue depth
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Channels {
                next_id: 0,
                by_key: HashMap::new(),
            })),
            capacity: capacity.max(1),
        }
    }

    /// Registers a new output channel under `key`.
    ///
    /// The channel stays registered until the returned subscription is dropped.
    pub fn subscribe(&self, key: K) -> Subscription<K> {
        let (sender, receiver) = mpsc::channel(self.capacity);

        let mut channels = self.inner.lock();
        let id = channels.next_id;
        channels.next_id += 1;
        let subscribers = channels.by_key.entry(key.clone()).or_default();
        subscribers.insert(id, sender);

        debug!(
            key = ?key,
            subscriber_id = id,
            subscribers = subscribers.len(),
            "Subscriber registered"
        );

        Subscription {
            key,
            id,
            receiver,
            registry: Arc::downgrade(&self.inner),
        }
    }

    /// Sends `event` to every channel under `key` and returns how many took it.
    pub fn publish<Q>(&self, key: &Q, event: StreamEvent) -> usize
    where
        K: Borrow<Q>,
        Q: Hash + Eq + Debug + ?Sized,
    {
        let mut channels = self.inner.lock();
        let Some(subscribers) = channels.by_key.get_mut(key) else {
            debug!(key = ?key, event = event.name, "No subscribers, event dropped");
            return 0;
        };

        let mut delivered = 0;
        subscribers.retain(|id, sender| match sender.try_send(event.clone()) {
            Ok(()) => {
                delivered += 1;
                true
            }
            Err(TrySendError::Closed(_)) => {
                debug!(key = ?key, subscriber_id = *id, "Removing closed subscriber");
                false
            }
            Err(TrySendError::Full(_)) => {
                warn!(key = ?key, subscriber_id = *id, "Evicting subscriber with a full queue");
                false
            }
        });

        if subscribers.is_empty() {
            channels.by_key.remove(key);
        }

        debug!(key = ?key, event = event.name, delivered = delivered, "Event published");
        delivered
    }

    pub fn subscriber_count<Q>(&self, key: &Q) -> usize
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.inner
            .lock()
            .by_key
            .get(key)
            .map_or(0, |subscribers| subscribers.len())
    }

    /// Number of keys with at least one subscriber
    pub fn key_count(&self) -> usize {
        self.inner.lock().by_key.len()
    }
}

/// One registered output channel; deregisters itself on drop
pub struct Subscription<K: Eq + Hash> {
    key: K,
    id: u64,
    receiver: mpsc::Receiver<StreamEvent>,
    registry: Weak<Mutex<Channels<K>>>,
}

impl<K: Eq + Hash> Subscription<K> {
    pub fn key(&self) -> &K {
        &self.key
    }

    /// Next event, or `None` once the registry has dropped this channel.
    pub async fn recv(&mut self) -> Option<StreamEvent> {
        self.receiver.recv().await
    }
}

impl<K: Eq + Hash> Drop for Subscription<K> {
    fn drop(&mut self) {
        let Some(inner) = self.registry.upgrade() else {
            return;
        };
        let mut channels = inner.lock();
        if let Some(subscribers) = channels.by_key.get_mut(&self.key) {
            subscribers.remove(&self.id);
            if subscribers.is_empty() {
                channels.by_key.remove(&self.key);
            }
        }
        debug!(subscriber_id = self.id, "Subscriber deregistered");
    }
}
