use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::types::{WindowIdentity, WindowState};

/// Service-wide notifications fanned out to every Dispatch Channel client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "kebab-case")]
pub enum Event {
    Closed(WindowIdentity),
    StateChanged {
        window: WindowIdentity,
        state: WindowState,
    },
    TabGroupRestored(WindowIdentity),
    TabGroupMinimized(WindowIdentity),
    TabGroupMaximized(WindowIdentity),
    /// Membership of the window's snap or tab group changed.
    GroupChanged(WindowIdentity),
    TabsReordered {
        tabstrip: WindowIdentity,
        order: Vec<WindowIdentity>,
    },
    Shutdown,
    #[serde(other)]
    Unknown,
}

#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<Event>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.sender.subscribe()
    }

    pub fn publish(&self, event: Event) -> usize {
        tracing::trace!(?event, "publish");
        self.sender.send(event).unwrap_or(0)
    }
}
