// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

/// Handle returned by a subscription, used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub u64);

/// A list of channel senders that all receive every published event.
///
/// Generic over the event type so that each collaborator can define its own
/// notification enum.
#[derive(Debug)]
pub struct Subscribers<T: Clone + Send + 'static> {
    next_id: AtomicU64,
    sinks: Mutex<Vec<(SubscriptionId, flume::Sender<T>)>>,
}

impl<T: Clone + Send + 'static> Subscribers<T> {
    /// Creates an empty subscriber list.
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            sinks: Mutex::new(Vec::new()),
        }
    }

    /// Registers a sender and returns the id needed to remove it again.
    pub fn subscribe(&self, sink: flume::Sender<T>) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.lock().push((id, sink));
        log::trace!("Subscriber {:?} registered.", id);
        id
    }

    /// Removes a sender. Returns `false` if the id was unknown.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut sinks = self.lock();
        let before = sinks.len();
        sinks.retain(|(sink_id, _)| *sink_id != id);
        before != sinks.len()
    }

    /// Sends a clone of `event` to every subscriber.
    ///
    /// Subscribers whose receiver has been dropped without unsubscribing are
    /// pruned.
    pub fn publish(&self, event: T) {
        let mut sinks = self.lock();
        sinks.retain(|(id, sink)| {
            if sink.send(event.clone()).is_err() {
                log::warn!("Subscriber {:?} disconnected without unsubscribing.", id);
                false
            } else {
                true
            }
        });
    }

    /// Returns the number of live subscriptions.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Returns true if nobody is subscribed.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<(SubscriptionId, flume::Sender<T>)>> {
        self.sinks
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl<T: Clone + Send + 'static> Default for Subscribers<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flume::TryRecvError;

    #[derive(Debug, Clone, PartialEq)]
    enum TestEvent {
        Changed(u32),
        Reset,
    }

    #[test]
    fn test_publish_reaches_every_subscriber() {
        let subscribers = Subscribers::<TestEvent>::new();
        let (tx1, rx1) = flume::unbounded();
        let (tx2, rx2) = flume::unbounded();
        subscribers.subscribe(tx1);
        subscribers.subscribe(tx2);

        subscribers.publish(TestEvent::Changed(7));

        assert_eq!(rx1.try_recv(), Ok(TestEvent::Changed(7)));
        assert_eq!(rx2.try_recv(), Ok(TestEvent::Changed(7)));
    }

    #[test]
    fn test_unsubscribed_sink_receives_nothing() {
        let subscribers = Subscribers::<TestEvent>::new();
        let (tx, rx) = flume::unbounded();
        let id = subscribers.subscribe(tx);

        assert!(subscribers.unsubscribe(id));
        assert!(
            !subscribers.unsubscribe(id),
            "second unsubscribe is a no-op"
        );
        subscribers.publish(TestEvent::Reset);

        assert_eq!(rx.try_recv(), Err(TryRecvError::Disconnected));
        assert!(subscribers.is_empty());
    }

    #[test]
    fn test_dropped_receiver_is_pruned_on_publish() {
        let subscribers = Subscribers::<TestEvent>::new();
        let (tx, rx) = flume::unbounded();
        subscribers.subscribe(tx);
        drop(rx);

        subscribers.publish(TestEvent::Reset);
        assert_eq!(subscribers.len(), 0);
    }

    #[test]
    fn test_ids_are_unique() {
        let subscribers = Subscribers::<TestEvent>::new();
        let (tx, _rx) = flume::unbounded();
        let a = subscribers.subscribe(tx.clone());
        let b = subscribers.subscribe(tx);
        assert_ne!(a, b);
    }
}
