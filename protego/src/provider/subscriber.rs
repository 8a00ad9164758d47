use tokio::sync::broadcast;

use super::events::{EventKind, ProviderEvent};

/// Scoped subscription to wallet events of selected kinds.
///
/// Holds a broadcast receiver; dropping the subscription removes the
/// listener from the provider.
#[derive(Debug)]
pub struct EventSubscription {
    rx: broadcast::Receiver<ProviderEvent>,
    kinds: Vec<EventKind>,
}

impl EventSubscription {
    pub fn new(rx: broadcast::Receiver<ProviderEvent>, kinds: &[EventKind]) -> Self {
        Self {
            rx,
            kinds: kinds.to_vec(),
        }
    }

    /// Receive the next matching event. Returns `None` if the provider is gone.
    pub async fn next(&mut self) -> Option<ProviderEvent> {
        loop {
            match self.rx.recv().await {
                Ok(event) if self.kinds.contains(&event.kind()) => return Some(event),
                Ok(_) => continue,
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!("wallet event subscription lagged by {n} events");
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    pub fn kinds(&self) -> &[EventKind] {
        &self.kinds
    }
}
