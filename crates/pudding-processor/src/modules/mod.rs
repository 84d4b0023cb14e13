use async_trait::async_trait;
use pudding_utils::Result;

use crate::envelope::GatewayEvent;
use crate::errors::ProcessError;

mod cache;

pub use self::cache::CacheModule;

/// One consumer of gateway events with its own queue.
///
/// Every module owns exactly one queue and declares up front which
/// topics it wants routed there. The same event may therefore reach
/// several modules; each handles it independently.
#[async_trait]
pub trait EventModule: Send + Sync + 'static {
    /// Queue this module consumes from. Must be stable across restarts
    /// so unprocessed messages survive a redeploy.
    fn queue(&self) -> &'static str;

    /// Topics routed into this module's queue.
    fn topics(&self) -> &'static [&'static str];

    /// Handles one decoded event.
    ///
    /// Must be idempotent: at-least-once delivery means the same event
    /// can arrive more than once. Returning an error leaves the
    /// delivery unacknowledged for the caller to dead-letter.
    async fn process(&self, event: &GatewayEvent) -> Result<(), ProcessError>;
}
