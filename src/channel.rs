//! In-memory topic-based publish/subscribe registry, keyed by run identifier.
//!
//! Stands in for a realtime channel: no buffering, no cross-topic delivery,
//! no wildcards. The registry is an explicitly owned value; clones share the
//! same listener map, so the publisher and each subscriber hold a clone
//! instead of reaching for process-global state.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use crate::model::{RunId, StatusEvent};

/// Callback invoked with every event published on a subscribed topic.
pub type Listener = Arc<dyn Fn(&StatusEvent) + Send + Sync + 'static>;

#[derive(Default)]
struct Registry {
    next_id: u64,
    topics: HashMap<RunId, Vec<(u64, Listener)>>,
}

#[derive(Clone, Default)]
pub struct EventChannel {
    registry: Arc<Mutex<Registry>>,
}

impl EventChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver `event` to every listener registered for `topic` at this
    /// moment, in registration order. Listeners registered afterwards never
    /// see the event. Listeners run synchronously in the publisher's task,
    /// outside the registry lock, unshielded.
    pub fn publish(&self, topic: &RunId, event: &StatusEvent) {
        let snapshot: Vec<Listener> = {
            let registry = self.lock();
            match registry.topics.get(topic) {
                Some(listeners) => listeners.iter().map(|(_, l)| Arc::clone(l)).collect(),
                None => return,
            }
        };
        tracing::trace!(topic = %topic, listeners = snapshot.len(), "publish");
        for listener in snapshot {
            listener(event);
        }
    }

    /// Register `listener` for `topic`. The registration stays active until
    /// [`Subscription::unsubscribe`] is called; dropping the subscription
    /// does not unregister it.
    pub fn subscribe(
        &self,
        topic: &RunId,
        listener: impl Fn(&StatusEvent) + Send + Sync + 'static,
    ) -> Subscription {
        let mut registry = self.lock();
        let id = registry.next_id;
        registry.next_id += 1;
        registry
            .topics
            .entry(topic.clone())
            .or_default()
            .push((id, Arc::new(listener)));
        Subscription {
            channel: self.clone(),
            topic: topic.clone(),
            id,
        }
    }

    /// Number of listeners currently registered for `topic`.
    pub fn listener_count(&self, topic: &RunId) -> usize {
        self.lock().topics.get(topic).map_or(0, Vec::len)
    }

    fn remove(&self, topic: &RunId, id: u64) {
        let mut registry = self.lock();
        if let Some(listeners) = registry.topics.get_mut(topic) {
            listeners.retain(|(listener_id, _)| *listener_id != id);
            // Topic entries are created lazily; drop them once empty.
            if listeners.is_empty() {
                registry.topics.remove(topic);
            }
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Registry> {
        // The lock only guards map bookkeeping; listeners run outside it and
        // cannot poison it, so recover rather than propagate.
        self.registry.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Active registration of one listener on one topic.
pub struct Subscription {
    channel: EventChannel,
    topic: RunId,
    id: u64,
}

impl Subscription {
    /// Stop delivery to this listener. Calling more than once is a no-op.
    pub fn unsubscribe(&self) {
        self.channel.remove(&self.topic, self.id);
    }
}
