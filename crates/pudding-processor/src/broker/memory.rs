use async_trait::async_trait;
use bytes::Bytes;
use futures::channel::mpsc;
use futures::StreamExt;
use pudding_utils::error::Report;
use pudding_utils::Result;
use std::collections::{BTreeSet, HashMap, VecDeque};
use std::sync::{Arc, Mutex, PoisonError};

use super::{Acknowledger, Broker, Delivery, DeliveryStream};
use crate::errors::{BindingError, BrokerError};

/// In-process [`Broker`] used by tests.
///
/// Routing is exact topic match only; the event topics have no
/// wildcard patterns so that is all the processor relies on.
#[derive(Debug, Default, Clone)]
pub struct InMemoryBroker {
    inner: Arc<Mutex<Inner>>,
    outcomes: Arc<Mutex<Vec<DeliveryOutcome>>>,
}

#[derive(Debug, Default)]
struct Inner {
    bindings: HashMap<String, BTreeSet<String>>,
    senders: HashMap<String, mpsc::UnboundedSender<Result<Delivery, BrokerError>>>,
    pending: HashMap<String, VecDeque<(String, Bytes)>>,
}

/// Record of how one delivery ended up, in acknowledgement order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryOutcome {
    pub queue: String,
    pub topic: String,
    pub acknowledged: bool,
}

impl InMemoryBroker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Publishes one payload to every queue bound to the topic.
    ///
    /// Queues without an active consumer buffer the message until
    /// [`Broker::consume`] is called.
    pub fn publish(&self, topic: &str, payload: impl Into<Bytes>) {
        let payload = payload.into();
        let mut inner = lock(&self.inner);

        let queues = inner
            .bindings
            .iter()
            .filter(|(_, topics)| topics.contains(topic))
            .map(|(queue, _)| queue.clone())
            .collect::<Vec<_>>();

        for queue in queues {
            let delivery = Delivery::new(
                topic.to_string(),
                payload.clone(),
                Box::new(MemoryAcknowledger {
                    queue: queue.clone(),
                    topic: topic.to_string(),
                    outcomes: Arc::clone(&self.outcomes),
                }),
            );

            let delivered = match inner.senders.get(&queue) {
                Some(sender) => sender.unbounded_send(Ok(delivery)).is_ok(),
                None => false,
            };

            if !delivered {
                inner
                    .pending
                    .entry(queue)
                    .or_default()
                    .push_back((topic.to_string(), payload.clone()));
            }
        }
    }

    /// Everything acknowledged or dead-lettered so far.
    #[must_use]
    pub fn outcomes(&self) -> Vec<DeliveryOutcome> {
        lock(&self.outcomes).clone()
    }
}

#[async_trait]
impl Broker for InMemoryBroker {
    async fn declare_queue(&self, queue: &str) -> Result<(), BindingError> {
        let mut inner = lock(&self.inner);
        inner.bindings.entry(queue.to_string()).or_default();
        Ok(())
    }

    async fn bind_queue(&self, queue: &str, topic: &str) -> Result<(), BindingError> {
        let mut inner = lock(&self.inner);
        let Some(topics) = inner.bindings.get_mut(queue) else {
            return Err(Report::new(BindingError)
                .attach_printable(format!("queue {queue:?} was never declared")));
        };

        topics.insert(topic.to_string());
        Ok(())
    }

    async fn consume(&self, queue: &str) -> Result<DeliveryStream, BrokerError> {
        let (tx, rx) = mpsc::unbounded();
        let mut inner = lock(&self.inner);

        let buffered = inner.pending.remove(queue).unwrap_or_default();
        for (topic, payload) in buffered {
            let delivery = Delivery::new(
                topic.clone(),
                payload,
                Box::new(MemoryAcknowledger {
                    queue: queue.to_string(),
                    topic,
                    outcomes: Arc::clone(&self.outcomes),
                }),
            );

            // the receiver half is still in scope here
            if tx.unbounded_send(Ok(delivery)).is_err() {
                break;
            }
        }

        inner.senders.insert(queue.to_string(), tx);
        Ok(rx.boxed())
    }
}

struct MemoryAcknowledger {
    queue: String,
    topic: String,
    outcomes: Arc<Mutex<Vec<DeliveryOutcome>>>,
}

impl MemoryAcknowledger {
    fn record(self, acknowledged: bool) {
        lock(&self.outcomes).push(DeliveryOutcome {
            queue: self.queue,
            topic: self.topic,
            acknowledged,
        });
    }
}

#[async_trait]
impl Acknowledger for MemoryAcknowledger {
    async fn ack(self: Box<Self>) -> Result<(), BrokerError> {
        self.record(true);
        Ok(())
    }

    async fn reject(self: Box<Self>) -> Result<(), BrokerError> {
        self.record(false);
        Ok(())
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[allow(clippy::unwrap_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn routes_by_exact_topic() {
        let broker = InMemoryBroker::new();
        broker.declare_queue("cache").await.unwrap();
        broker.bind_queue("cache", "event.guild-create").await.unwrap();

        let mut stream = broker.consume("cache").await.unwrap();
        broker.publish("event.guild-create", &b"one"[..]);
        broker.publish("event.guild-delete", &b"two"[..]);

        let delivery = stream.next().await.unwrap().unwrap();
        assert_eq!(delivery.topic, "event.guild-create");
        assert_eq!(&delivery.payload[..], b"one");
    }

    #[tokio::test]
    async fn repeated_bindings_do_not_duplicate_deliveries() {
        let broker = InMemoryBroker::new();
        broker.declare_queue("cache").await.unwrap();
        broker.bind_queue("cache", "event.guild-create").await.unwrap();
        broker.bind_queue("cache", "event.guild-create").await.unwrap();

        let mut stream = broker.consume("cache").await.unwrap();
        broker.publish("event.guild-create", &b"once"[..]);
        broker.publish("event.guild-create", &b"twice"[..]);

        assert_eq!(&stream.next().await.unwrap().unwrap().payload[..], b"once");
        assert_eq!(&stream.next().await.unwrap().unwrap().payload[..], b"twice");
    }

    #[tokio::test]
    async fn buffers_messages_published_before_consuming() {
        let broker = InMemoryBroker::new();
        broker.declare_queue("cache").await.unwrap();
        broker.bind_queue("cache", "event.guild-create").await.unwrap();
        broker.publish("event.guild-create", &b"early"[..]);

        let mut stream = broker.consume("cache").await.unwrap();
        let delivery = stream.next().await.unwrap().unwrap();
        assert_eq!(&delivery.payload[..], b"early");

        delivery.ack().await.unwrap();
        assert_eq!(broker.outcomes().len(), 1);
        assert!(broker.outcomes()[0].acknowledged);
    }

    #[tokio::test]
    async fn binding_an_undeclared_queue_fails() {
        let broker = InMemoryBroker::new();
        assert!(broker.bind_queue("ghost", "event.guild-create").await.is_err());
    }
}
