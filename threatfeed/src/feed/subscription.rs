use crate::data::{Event, Filter};

use crossbeam::channel;
use std::collections::HashMap;
use std::sync::{Arc, Weak};
use std::time::Duration;

pub type SubscriptionId = u64;

/// Snapshot delivered to subscribers whenever the buffer or the filter changes.
#[derive(Debug, Clone)]
pub struct FeedUpdate {
    /// Visible events, newest first.
    pub events: Vec<Event>,
    pub filter: Filter,
    /// Unfiltered buffer length.
    pub buffered: usize,
    pub capacity: usize,
}

/// Receiving end of a subscription. Dropping it ends the subscription at the
/// next broadcast.
pub struct Subscriber {
    rx: channel::Receiver<FeedUpdate>,
    _alive: Arc<()>,
}

impl Subscriber {
    pub fn try_recv(&self) -> Result<FeedUpdate, channel::TryRecvError> {
        self.rx.try_recv()
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Result<FeedUpdate, channel::RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }

    /// Drains the queue and returns the newest update, if any.
    pub fn latest(&self) -> Option<FeedUpdate> {
        self.rx.try_iter().last()
    }

    pub fn receiver(&self) -> &channel::Receiver<FeedUpdate> {
        &self.rx
    }
}

struct Subscription {
    tx: channel::Sender<FeedUpdate>,
    // used only to evict the oldest queued update when the queue is full
    stale: channel::Receiver<FeedUpdate>,
    alive: Weak<()>,
}

pub struct SubscriptionManager {
    subscriptions: HashMap<SubscriptionId, Subscription>,
    next_id: SubscriptionId,
}

impl SubscriptionManager {
    pub fn new() -> Self {
        Self {
            subscriptions: HashMap::new(),
            next_id: 0,
        }
    }

    /// `depth` bounds the per-subscriber queue. When it is full the oldest
    /// queued update is replaced, so the newest one always gets through.
    pub fn subscribe(&mut self, depth: usize) -> (SubscriptionId, Subscriber) {
        let (tx, rx) = channel::bounded(depth.max(1));
        let alive = Arc::new(());
        let id = self.next_id;
        self.next_id += 1;
        self.subscriptions.insert(
            id,
            Subscription {
                tx,
                stale: rx.clone(),
                alive: Arc::downgrade(&alive),
            },
        );
        (id, Subscriber { rx, _alive: alive })
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.subscriptions.remove(&id).is_some()
    }

    pub fn unsubscribe_all(&mut self) {
        self.subscriptions.clear();
    }

    pub fn len(&self) -> usize {
        self.subscriptions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscriptions.is_empty()
    }

    /// Sends `update` to every subscriber. Subscribers that were dropped are
    /// forgotten.
    pub fn broadcast(&mut self, update: &FeedUpdate) {
        self.subscriptions.retain(|id, sub| {
            if sub.alive.strong_count() == 0 {
                log::debug!("subscription {} dropped", id);
                return false;
            }
            let mut pending = update.clone();
            loop {
                match sub.tx.try_send(pending) {
                    Ok(()) => return true,
                    Err(channel::TrySendError::Full(u)) => {
                        let _ = sub.stale.try_recv();
                        pending = u;
                    }
                    Err(channel::TrySendError::Disconnected(_)) => return false,
                }
            }
        });
    }
}

impl Default for SubscriptionManager {
    fn default() -> Self {
        Self::new()
    }
}
