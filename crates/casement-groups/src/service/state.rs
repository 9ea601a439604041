//! Visual state changes and host notifications.

use std::sync::Arc;

use casement_common::{Event, GroupError, WindowIdentity, WindowState};
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::GroupService;
use crate::host::HostEvent;
use crate::registry::Removal;
use crate::sync::Observation;

impl GroupService {
    pub async fn minimize(&self, window: &WindowIdentity) -> Result<(), GroupError> {
        self.set_group_state(window, WindowState::Minimized).await
    }

    pub async fn restore(&self, window: &WindowIdentity) -> Result<(), GroupError> {
        self.set_group_state(window, WindowState::Normal).await
    }

    pub async fn maximize(&self, window: &WindowIdentity) -> Result<(), GroupError> {
        self.set_group_state(window, WindowState::Maximized).await
    }

    pub async fn minimize_tab_group(&self, tabstrip: &WindowIdentity) -> Result<(), GroupError> {
        self.set_tab_group_state(tabstrip, WindowState::Minimized).await?;
        self.events
            .publish(Event::TabGroupMinimized(tabstrip.clone()));
        Ok(())
    }

    pub async fn restore_tab_group(&self, tabstrip: &WindowIdentity) -> Result<(), GroupError> {
        self.set_tab_group_state(tabstrip, WindowState::Normal).await?;
        self.events.publish(Event::TabGroupRestored(tabstrip.clone()));
        Ok(())
    }

    pub async fn maximize_tab_group(&self, tabstrip: &WindowIdentity) -> Result<(), GroupError> {
        self.set_tab_group_state(tabstrip, WindowState::Maximized).await?;
        self.events
            .publish(Event::TabGroupMaximized(tabstrip.clone()));
        Ok(())
    }

    /// Bring the whole snap group of `window`'s unit, tabs included, to
    /// `target`.
    async fn set_group_state(
        &self,
        window: &WindowIdentity,
        target: WindowState,
    ) -> Result<(), GroupError> {
        let _queue = self
            .serialized(|r| Ok(vec![r.snap_group_id_of(window)?]))
            .await?;
        let scope = self.registry.read().await.sync_scope(window)?;
        let changed = self.sync.broadcast(&scope, target).await?;
        self.publish_states(&changed, target);
        Ok(())
    }

    /// The tabstrip and its own tabs only; snap partners are left alone.
    async fn set_tab_group_state(
        &self,
        tabstrip: &WindowIdentity,
        target: WindowState,
    ) -> Result<(), GroupError> {
        let _queue = self
            .serialized(|r| {
                if !r.is_tabstrip(tabstrip) {
                    return Err(GroupError::NotFound(format!("tab group of tabstrip {tabstrip}")));
                }
                Ok(vec![r.snap_group_id_of(tabstrip)?])
            })
            .await?;
        let scope = {
            let registry = self.registry.read().await;
            let tab_group = registry
                .tab_group_by_tabstrip(tabstrip)
                .ok_or_else(|| GroupError::NotFound(format!("tab group of tabstrip {tabstrip}")))?;
            registry.tab_scope(tab_group)?
        };
        let changed = self.sync.broadcast(&scope, target).await?;
        self.publish_states(&changed, target);
        Ok(())
    }

    fn publish_states(&self, windows: &[WindowIdentity], state: WindowState) {
        for window in windows {
            self.events.publish(Event::StateChanged {
                window: window.clone(),
                state,
            });
        }
    }

    // -- Host events --

    pub async fn handle_host_event(&self, event: HostEvent) -> Result<(), GroupError> {
        match event {
            HostEvent::StateChanged { window, state } => self.on_state_changed(&window, state).await,
            HostEvent::Closed(window) => self.on_closed(&window).await,
        }
    }

    /// A state the host reports that we did not ask for is a user action
    /// and cascades to the rest of the group.
    async fn on_state_changed(
        &self,
        window: &WindowIdentity,
        state: WindowState,
    ) -> Result<(), GroupError> {
        if !self.registry.read().await.contains(window) {
            debug!(window = %window, %state, "state change for untracked window");
            return Ok(());
        }
        let _queue = self
            .serialized(|r| Ok(vec![r.snap_group_id_of(window)?]))
            .await?;
        if self.sync.observe(window, state).await == Observation::Echo {
            debug!(window = %window, %state, "echo ignored");
            return Ok(());
        }
        // Reports queue up behind our own requests; only act on one the host
        // still holds.
        let current = self.call_host(self.host.window_info(window)).await?.state;
        if current != state {
            debug!(window = %window, %state, %current, "stale report ignored");
            return Ok(());
        }
        self.sync.seed(window, state).await;

        info!(window = %window, %state, "user state change, cascading");
        self.events.publish(Event::StateChanged {
            window: window.clone(),
            state,
        });
        let scope = self.registry.read().await.sync_scope(window)?;
        let changed = self.sync.broadcast(&scope, state).await?;
        self.publish_states(&changed, state);
        Ok(())
    }

    async fn on_closed(&self, window: &WindowIdentity) -> Result<(), GroupError> {
        self.tabstrip.lock().await.window_closed(window);
        self.sync.forget(window).await;

        if !self.registry.read().await.contains(window) {
            debug!(window = %window, "close of untracked window");
            return Ok(());
        }
        let _queue = self
            .serialized(|r| Ok(vec![r.snap_group_id_of(window)?]))
            .await?;
        let removal = self.registry.write().await.remove_window(window)?;
        self.events.publish(Event::Closed(window.clone()));

        match removal {
            Removal::Loose { .. } | Removal::Tab { dissolved: None } => {}
            Removal::Tab {
                dissolved: Some(dissolved),
            } => self.finish_dissolve(&dissolved).await,
            Removal::Tabstrip(dissolved) => self.publish_group_changed(&dissolved.released),
        }
        Ok(())
    }

    /// Feed host notifications into [`handle_host_event`] until the host's
    /// channel closes. The subscription is taken before the task starts so
    /// no event emitted after this call is missed.
    ///
    /// [`handle_host_event`]: GroupService::handle_host_event
    pub fn spawn_host_listener(self: &Arc<Self>) -> JoinHandle<()> {
        let mut rx = self.host.subscribe();
        let service = Arc::clone(self);
        tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(event) => {
                        if let Err(e) = service.handle_host_event(event).await {
                            warn!(error = %e, "host event handling failed");
                        }
                    }
                    Err(RecvError::Lagged(n)) => {
                        warn!(skipped = n, "host event listener lagged");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
            debug!("host event listener stopped");
        })
    }
}
