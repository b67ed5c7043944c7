//! Shared network reachability flag

use scout_common::events::{EventBus, ScoutEvent};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::info;

/// Online/offline state shared by every service
///
/// Cloning shares the flag. Transitions publish
/// [`ScoutEvent::ConnectivityChanged`] when an event bus is attached.
#[derive(Clone)]
pub struct Connectivity {
    tx: Arc<watch::Sender<bool>>,
    event_bus: Option<EventBus>,
}

impl Connectivity {
    pub fn new(online: bool) -> Self {
        let (tx, _) = watch::channel(online);
        Self {
            tx: Arc::new(tx),
            event_bus: None,
        }
    }

    /// Same flag, publishing transitions on `event_bus`
    pub fn with_event_bus(mut self, event_bus: EventBus) -> Self {
        self.event_bus = Some(event_bus);
        self
    }

    pub fn is_online(&self) -> bool {
        *self.tx.borrow()
    }

    /// Record a reachability observation; returns true when the state changed
    pub fn set_online(&self, online: bool) -> bool {
        let changed = self.tx.send_if_modified(|current| {
            if *current == online {
                false
            } else {
                *current = online;
                true
            }
        });

        if changed {
            info!(online, "Connectivity changed");
            if let Some(bus) = &self.event_bus {
                bus.emit_lossy(ScoutEvent::ConnectivityChanged {
                    online,
                    timestamp: scout_common::time::now(),
                });
            }
        }
        changed
    }

    /// Receiver that wakes on every transition
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }
}
