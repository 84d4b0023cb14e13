use futures::StreamExt;
use pudding_utils::error::ResultExt;
use pudding_utils::{shutdown, Result};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, info, warn};

use crate::broker::{ack_quietly, Broker, Delivery, DeliveryStream};
use crate::envelope::GatewayEvent;
use crate::errors::{BindingError, BrokerError};
use crate::modules::EventModule;

/// Drives every registered [`EventModule`] from its broker queue.
pub struct Consumer {
    broker: Arc<dyn Broker>,
    modules: Vec<Arc<dyn EventModule>>,
    cancelled: CancellationToken,
    tasks: TaskTracker,
}

impl Consumer {
    #[must_use]
    pub fn new(broker: Arc<dyn Broker>) -> Self {
        Self {
            broker,
            modules: Vec::new(),
            cancelled: CancellationToken::new(),
            tasks: TaskTracker::new(),
        }
    }

    #[must_use]
    pub fn register(mut self, module: impl EventModule) -> Self {
        self.modules.push(Arc::new(module));
        self
    }

    /// Declares every module's queue and binds its topics.
    ///
    /// Declarations are idempotent, so running this on every boot is
    /// safe; messages queued while the processor was down stay put.
    pub async fn setup(&self) -> Result<(), BindingError> {
        for module in &self.modules {
            let queue = module.queue();
            self.broker.declare_queue(queue).await?;

            for topic in module.topics() {
                self.broker
                    .bind_queue(queue, topic)
                    .await
                    .attach_printable_lazy(|| format!("topic = {topic:?}"))?;
            }

            debug!(%queue, topics = ?module.topics(), "bound module queue");
        }

        Ok(())
    }

    /// Consumes from every module queue until shut down.
    ///
    /// Each module gets its own task; events within one queue are
    /// handled strictly one at a time. Returns once every queue task
    /// has drained after [`Consumer::shutdown`].
    pub async fn run(&self) -> Result<(), BrokerError> {
        for module in &self.modules {
            let stream = self.broker.consume(module.queue()).await?;
            let _task = self
                .tasks
                .spawn(run_queue(Arc::clone(module), stream, self.cancelled.clone()));
        }

        info!(modules = %self.modules.len(), "consumer is running");
        self.tasks.close();
        self.tasks.wait().await;

        Ok(())
    }

    /// Stops pulling new deliveries and waits for in-flight events.
    pub async fn shutdown(&self) {
        self.cancelled.cancel();
        self.tasks.close();
        self.tasks.wait().await;
        info!("consumer has shut down");
    }
}

#[tracing::instrument(skip_all, fields(queue = %module.queue()))]
async fn run_queue(
    module: Arc<dyn EventModule>,
    mut stream: DeliveryStream,
    cancelled: CancellationToken,
) {
    loop {
        let next = tokio::select! {
            () = cancelled.cancelled() => break,
            () = shutdown::aborted() => break,
            next = stream.next() => next,
        };

        let delivery = match next {
            Some(Ok(delivery)) => delivery,
            Some(Err(error)) => {
                warn!(%error, "broker stream produced an error");
                continue;
            }
            None => {
                warn!("broker stream has closed");
                break;
            }
        };

        // awaited outside the select so an in-flight event always
        // finishes before shutdown is observed
        handle_delivery(module.as_ref(), delivery).await;
    }
}

async fn handle_delivery(module: &dyn EventModule, delivery: Delivery) {
    let event = match GatewayEvent::decode(&delivery.payload) {
        Ok(event) => event,
        Err(error) => {
            warn!(%error, topic = %delivery.topic, "dead-lettering undecodable payload");
            if let Err(error) = delivery.dead_letter().await {
                warn!(%error, "failed to dead-letter delivery");
            }
            return;
        }
    };

    match module.process(&event).await {
        Ok(()) => ack_quietly(delivery).await,
        Err(error) => {
            warn!(%error, event.kind = %event.kind(), "dead-lettering failed event");
            if let Err(error) = delivery.dead_letter().await {
                warn!(%error, "failed to dead-letter delivery");
            }
        }
    }
}
