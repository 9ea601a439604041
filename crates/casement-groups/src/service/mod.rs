//! The orchestrator the Dispatch Channel talks to.
//!
//! `GroupService` owns the registry, the synchronizer and the drag
//! controller. Every operation that touches a group first takes that group's
//! queue (see [`queues`]), re-resolves its groups, and retries if membership
//! moved while it waited.

mod membership;
mod queues;
mod state;
mod workspace;

use std::sync::Arc;
use std::time::Duration;

use casement_common::{
    Event, EventBus, GroupError, SnapGroupId, WindowIdentity, WindowState,
};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info};

use crate::host::{self, WindowHost};
use crate::launch::LaunchSpec;
use crate::registry::{GroupMembership, GroupRegistry};
use crate::sync::Synchronizer;
use crate::tabstrip::{DragState, TabstripController};

pub use queues::{GroupQueues, QueueGuard};
pub use workspace::{RestoreReport, RestoredWindow};

/// Runtime knobs, usually filled from the `[sync]` and `[tabstrip]` config
/// sections.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceSettings {
    pub host_timeout: Duration,
    pub tabstrip_url: String,
    pub tabstrip_height: f64,
    pub event_capacity: usize,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            host_timeout: Duration::from_millis(5000),
            tabstrip_url: "http://localhost:9400/tabstrip.html".into(),
            tabstrip_height: 32.0,
            event_capacity: 256,
        }
    }
}

pub struct GroupService {
    registry: RwLock<GroupRegistry>,
    sync: Synchronizer,
    tabstrip: Mutex<TabstripController>,
    queues: GroupQueues,
    host: Arc<dyn WindowHost>,
    events: EventBus,
    settings: ServiceSettings,
}

impl GroupService {
    pub fn new(host: Arc<dyn WindowHost>, settings: ServiceSettings) -> Self {
        Self {
            registry: RwLock::new(GroupRegistry::new()),
            sync: Synchronizer::new(host.clone(), settings.host_timeout),
            tabstrip: Mutex::new(TabstripController::new()),
            queues: GroupQueues::new(),
            events: EventBus::new(settings.event_capacity),
            host,
            settings,
        }
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn settings(&self) -> &ServiceSettings {
        &self.settings
    }

    /// Read-only access to membership, for views and tests.
    pub async fn registry(&self) -> tokio::sync::RwLockReadGuard<'_, GroupRegistry> {
        self.registry.read().await
    }

    /// Take the queues of the groups `resolve` names. If membership changed
    /// while waiting, release and try again with the new groups.
    async fn serialized<F>(&self, resolve: F) -> Result<QueueGuard, GroupError>
    where
        F: Fn(&GroupRegistry) -> Result<Vec<SnapGroupId>, GroupError>,
    {
        loop {
            let keys = resolve(&*self.registry.read().await)?;
            let guard = self.queues.acquire(keys).await;
            let current = queues::normalize(resolve(&*self.registry.read().await)?);
            if current == guard.keys() {
                return Ok(guard);
            }
            debug!(?current, held = ?guard.keys(), "groups moved while queued, retrying");
        }
    }

    async fn call_host<T>(
        &self,
        fut: impl std::future::Future<Output = host::Result<T>>,
    ) -> Result<T, GroupError> {
        host::call(self.settings.host_timeout, fut).await
    }

    // -- Windows --

    /// Start tracking a window the host already knows. The host's current
    /// state seeds the synchronizer's mirror.
    pub async fn register_window(
        &self,
        window: &WindowIdentity,
    ) -> Result<SnapGroupId, GroupError> {
        let info = self.call_host(self.host.window_info(window)).await?;
        let gid = self.registry.write().await.register_window(window.clone());
        if self.sync.mirrored(window).await.is_none() {
            self.sync.seed(window, info.state).await;
        }
        Ok(gid)
    }

    /// Open (or resolve) a window on the host and register it.
    pub async fn launch_window(
        &self,
        spec: &LaunchSpec,
        window_name: &str,
    ) -> Result<WindowIdentity, GroupError> {
        if spec.is_tabstrip() {
            return Err(GroupError::InvalidLaunch(
                "tabstrips are created with their tab group".into(),
            ));
        }
        spec.validate().map_err(GroupError::InvalidLaunch)?;
        let window = self.call_host(self.host.launch(spec, window_name)).await?;
        self.register_window(&window).await?;
        info!(window = %window, app = spec.app_id(), "window launched");
        Ok(window)
    }

    pub async fn group_of(&self, window: &WindowIdentity) -> Result<GroupMembership, GroupError> {
        self.registry.read().await.group_of(window)
    }

    // -- Drag --

    pub async fn start_drag(&self, window: &WindowIdentity) -> Result<(), GroupError> {
        if !self.registry.read().await.contains(window) {
            return Err(GroupError::window_not_found(window));
        }
        self.tabstrip.lock().await.start_drag(window)
    }

    pub async fn end_drag(&self) -> Option<WindowIdentity> {
        self.tabstrip.lock().await.end_drag()
    }

    pub async fn drag_state(&self) -> DragState {
        self.tabstrip.lock().await.state().clone()
    }

    pub async fn mirrored_state(&self, window: &WindowIdentity) -> Option<WindowState> {
        self.sync.mirrored(window).await
    }

    fn publish_group_changed<'a>(&self, windows: impl IntoIterator<Item = &'a WindowIdentity>) {
        for window in windows {
            self.events.publish(Event::GroupChanged(window.clone()));
        }
    }
}

#[cfg(test)]
mod tests;
