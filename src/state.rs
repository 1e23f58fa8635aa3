use crate::broadcast::{ChannelNotifier, Notifier};
use crate::config::EngineConfig;
use crate::protocol::Effect;
use crate::registry::GameRegistry;
use std::sync::Arc;
use tokio::sync::broadcast;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub games: GameRegistry,
    pub notifier: Arc<dyn Notifier>,
    /// Effects for connected bridge sockets (feeds the default notifier)
    pub effects: broadcast::Sender<Effect>,
}

impl AppState {
    pub fn new(config: EngineConfig) -> Self {
        let (tx, _rx) = broadcast::channel(256);
        let notifier = Arc::new(ChannelNotifier::new(tx.clone()));
        Self {
            games: GameRegistry::new(Arc::new(config)),
            notifier,
            effects: tx,
        }
    }

    /// Deliver effects through a custom transport instead of the bridge channel
    pub fn with_notifier(config: EngineConfig, notifier: Arc<dyn Notifier>) -> Self {
        let (tx, _rx) = broadcast::channel(256);
        Self {
            games: GameRegistry::new(Arc::new(config)),
            notifier,
            effects: tx,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        self.games.config()
    }
}
