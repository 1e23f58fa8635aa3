//! Best-effort delivery of engine effects to the chat transport.
//!
//! Effects are only ever delivered after the state change that produced them
//! has been committed, so a failed or slow delivery never undoes anything.

use crate::protocol::Effect;
use async_trait::async_trait;
use std::time::Duration;
use tokio::sync::broadcast;

#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    #[error("no transport connected")]
    NoReceivers,

    #[error("recipient unreachable: {0}")]
    Unreachable(String),
}

/// The transport seam: something that can put an effect in front of users
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn deliver(&self, effect: &Effect) -> Result<(), DeliveryError>;
}

/// Fans effects out to every connected bridge socket
#[derive(Clone)]
pub struct ChannelNotifier {
    tx: broadcast::Sender<Effect>,
}

impl ChannelNotifier {
    pub fn new(tx: broadcast::Sender<Effect>) -> Self {
        Self { tx }
    }
}

#[async_trait]
impl Notifier for ChannelNotifier {
    async fn deliver(&self, effect: &Effect) -> Result<(), DeliveryError> {
        self.tx
            .send(effect.clone())
            .map(|_| ())
            .map_err(|_| DeliveryError::NoReceivers)
    }
}

/// Deliver `effects` in order, each bounded by `timeout`.
/// Failures are logged and dropped, never retried.
pub async fn deliver(notifier: &dyn Notifier, effects: &[Effect], timeout: Duration) {
    for effect in effects {
        match tokio::time::timeout(timeout, notifier.deliver(effect)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::warn!(
                "Dropping effect {} for game {}: {}",
                effect.id,
                effect.game_id,
                e
            ),
            Err(_) => tracing::warn!(
                "Delivery of effect {} for game {} timed out after {:?}",
                effect.id,
                effect.game_id,
                timeout
            ),
        }
    }
}
