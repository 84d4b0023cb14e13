use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;
use pudding_utils::Result;
use std::fmt::Debug;
use tracing::warn;

use crate::errors::{BindingError, BrokerError};

mod amqp;
mod memory;

pub use self::amqp::AmqpBroker;
pub use self::memory::{DeliveryOutcome, InMemoryBroker};

pub type DeliveryStream = BoxStream<'static, Result<Delivery, BrokerError>>;

/// Topic-exchange message broker the processor consumes from.
///
/// Implementations must preserve at-least-once delivery: a message
/// stays in its queue until the [`Delivery`] is acknowledged, and
/// redelivery after a crash is expected.
#[async_trait]
pub trait Broker: Send + Sync + 'static {
    /// Declares a durable queue, creating it if needed.
    ///
    /// Declaring an already existing queue is a no-op.
    async fn declare_queue(&self, queue: &str) -> Result<(), BindingError>;

    /// Binds a queue to one routing topic on the gateway exchange.
    ///
    /// Binding the same pair twice is a no-op; the broker must not
    /// duplicate deliveries for repeated bindings.
    async fn bind_queue(&self, queue: &str, topic: &str) -> Result<(), BindingError>;

    /// Opens a stream of deliveries from the given queue.
    async fn consume(&self, queue: &str) -> Result<DeliveryStream, BrokerError>;
}

/// One message pulled from a queue, pending acknowledgement.
pub struct Delivery {
    pub topic: String,
    pub payload: Bytes,
    acker: Box<dyn Acknowledger>,
}

impl Delivery {
    pub(crate) fn new(topic: String, payload: Bytes, acker: Box<dyn Acknowledger>) -> Self {
        Self {
            topic,
            payload,
            acker,
        }
    }

    /// Confirms the message was fully processed; the broker drops it.
    pub async fn ack(self) -> Result<(), BrokerError> {
        self.acker.ack().await
    }

    /// Rejects the message without requeueing it.
    ///
    /// Poisoned payloads go through here so they cannot wedge the
    /// queue with endless redeliveries.
    pub async fn dead_letter(self) -> Result<(), BrokerError> {
        self.acker.reject().await
    }
}

impl Debug for Delivery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Delivery")
            .field("topic", &self.topic)
            .field("payload.len", &self.payload.len())
            .finish_non_exhaustive()
    }
}

#[async_trait]
pub(crate) trait Acknowledger: Send + Sync {
    async fn ack(self: Box<Self>) -> Result<(), BrokerError>;
    async fn reject(self: Box<Self>) -> Result<(), BrokerError>;
}

/// Acknowledges a delivery, downgrading failures to a warning.
///
/// By the time we ack, the database write is already committed; if the
/// broker connection died in between, redelivery will hit an
/// idempotent upsert anyway.
pub(crate) async fn ack_quietly(delivery: Delivery) {
    let topic = delivery.topic.clone();
    if let Err(error) = delivery.ack().await {
        warn!(%error, %topic, "failed to acknowledge delivery");
    }
}
