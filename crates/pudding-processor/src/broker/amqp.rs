use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use lapin::options::{
    BasicAckOptions, BasicConsumeOptions, BasicNackOptions, BasicQosOptions,
    ExchangeDeclareOptions, QueueBindOptions, QueueDeclareOptions,
};
use lapin::types::FieldTable;
use lapin::{Channel, Connection, ConnectionProperties, ExchangeKind};
use pudding_utils::error::tags::Suggestion;
use pudding_utils::error::ResultExt;
use pudding_utils::Result;
use tracing::debug;

use super::{Acknowledger, Broker, Delivery, DeliveryStream};
use crate::errors::{BindingError, BrokerError};

/// AMQP 0.9.1 implementation of [`Broker`] on top of a topic exchange.
pub struct AmqpBroker {
    // dropping the connection closes every channel on it
    _connection: Connection,
    channel: Channel,
    exchange: String,
    durable: bool,
}

impl AmqpBroker {
    /// Connects to the broker and declares the gateway topic exchange.
    pub async fn connect(settings: &pudding_settings::Broker) -> Result<Self, BrokerError> {
        let connection =
            Connection::connect(settings.url(), ConnectionProperties::default())
                .await
                .change_context(BrokerError)
                .attach_printable("could not connect to the message broker")
                .attach(Suggestion::new("check `broker.url` in your settings"))?;

        let channel = connection
            .create_channel()
            .await
            .change_context(BrokerError)?;

        channel
            .basic_qos(settings.prefetch(), BasicQosOptions::default())
            .await
            .change_context(BrokerError)?;

        channel
            .exchange_declare(
                settings.exchange(),
                ExchangeKind::Topic,
                ExchangeDeclareOptions {
                    durable: settings.durable(),
                    ..Default::default()
                },
                FieldTable::default(),
            )
            .await
            .change_context(BrokerError)
            .attach_printable_lazy(|| {
                format!("could not declare exchange {:?}", settings.exchange())
            })?;

        debug!(exchange = %settings.exchange(), "connected to the message broker");

        Ok(Self {
            _connection: connection,
            channel,
            exchange: settings.exchange().to_string(),
            durable: settings.durable(),
        })
    }
}

#[async_trait]
impl Broker for AmqpBroker {
    async fn declare_queue(&self, queue: &str) -> Result<(), BindingError> {
        self.channel
            .queue_declare(
                queue,
                QueueDeclareOptions {
                    durable: self.durable,
                    ..Default::default()
                },
                FieldTable::default(),
            )
            .await
            .change_context(BindingError)
            .attach_printable_lazy(|| format!("could not declare queue {queue:?}"))?;

        Ok(())
    }

    async fn bind_queue(&self, queue: &str, topic: &str) -> Result<(), BindingError> {
        self.channel
            .queue_bind(
                queue,
                &self.exchange,
                topic,
                QueueBindOptions::default(),
                FieldTable::default(),
            )
            .await
            .change_context(BindingError)
            .attach_printable_lazy(|| format!("could not bind queue {queue:?} to {topic:?}"))?;

        Ok(())
    }

    async fn consume(&self, queue: &str) -> Result<DeliveryStream, BrokerError> {
        let consumer = self
            .channel
            .basic_consume(
                queue,
                &format!("{queue}-consumer"),
                BasicConsumeOptions::default(),
                FieldTable::default(),
            )
            .await
            .change_context(BrokerError)
            .attach_printable_lazy(|| format!("could not consume from queue {queue:?}"))?;

        let stream = consumer
            .map(|result| match result {
                Ok(message) => {
                    let lapin::message::Delivery {
                        routing_key,
                        data,
                        acker,
                        ..
                    } = message;

                    Ok(Delivery::new(
                        routing_key.to_string(),
                        Bytes::from(data),
                        Box::new(AmqpAcknowledger { acker }),
                    ))
                }
                Err(error) => Err(error).change_context(BrokerError),
            })
            .boxed();

        Ok(stream)
    }
}

struct AmqpAcknowledger {
    acker: lapin::acker::Acker,
}

#[async_trait]
impl Acknowledger for AmqpAcknowledger {
    async fn ack(self: Box<Self>) -> Result<(), BrokerError> {
        self.acker
            .ack(BasicAckOptions::default())
            .await
            .change_context(BrokerError)
    }

    async fn reject(self: Box<Self>) -> Result<(), BrokerError> {
        self.acker
            .nack(BasicNackOptions {
                requeue: false,
                ..Default::default()
            })
            .await
            .change_context(BrokerError)
    }
}
