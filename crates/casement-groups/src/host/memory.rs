//! In-process window host.
//!
//! Keeps window records in memory and emits the same events a real host
//! would. The server falls back to it when no platform host is attached,
//! and the tests drive it as a fake.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};

use async_trait::async_trait;
use casement_common::{HostError, Rect, WindowIdentity, WindowState};
use tokio::sync::{broadcast, RwLock};

use super::{HostEvent, Result, WindowHost, WindowInfo};
use crate::launch::LaunchSpec;

const DEFAULT_BOUNDS: Rect = Rect {
    x: 0.0,
    y: 0.0,
    width: 800.0,
    height: 600.0,
};

pub struct MemoryHost {
    windows: RwLock<HashMap<WindowIdentity, WindowInfo>>,
    events: broadcast::Sender<HostEvent>,
    next_process: AtomicU64,
    set_state_calls: AtomicUsize,
    online: AtomicBool,
    failing: RwLock<HashSet<WindowIdentity>>,
}

impl MemoryHost {
    pub fn new(event_capacity: usize) -> Self {
        let (events, _) = broadcast::channel(event_capacity);
        Self {
            windows: RwLock::new(HashMap::new()),
            events,
            next_process: AtomicU64::new(1),
            set_state_calls: AtomicUsize::new(0),
            online: AtomicBool::new(true),
            failing: RwLock::new(HashSet::new()),
        }
    }

    /// Number of `set_state` calls received so far.
    pub fn set_state_calls(&self) -> usize {
        self.set_state_calls.load(Ordering::SeqCst)
    }

    /// Make every subsequent call fail, as if the host went away.
    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }

    /// Make `set_state` fail for one window while the rest of the host
    /// keeps working.
    pub async fn fail_window(&self, window: &WindowIdentity, failing: bool) {
        let mut set = self.failing.write().await;
        if failing {
            set.insert(window.clone());
        } else {
            set.remove(window);
        }
    }

    pub async fn state_of(&self, window: &WindowIdentity) -> Option<WindowState> {
        self.windows.read().await.get(window).map(|w| w.state)
    }

    pub async fn bounds_of(&self, window: &WindowIdentity) -> Option<Rect> {
        self.windows.read().await.get(window).map(|w| w.bounds)
    }

    pub async fn window_count(&self) -> usize {
        self.windows.read().await.len()
    }

    pub async fn is_open(&self, window: &WindowIdentity) -> bool {
        self.windows.read().await.contains_key(window)
    }

    /// Change a window's state as if the user did it (not counted as a
    /// service call).
    pub async fn simulate_state_change(&self, window: &WindowIdentity, state: WindowState) -> Result<()> {
        self.apply_state(window, state).await
    }

    fn check_online(&self) -> Result<()> {
        if self.online.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(HostError::Other("host offline".into()))
        }
    }

    async fn apply_state(&self, window: &WindowIdentity, state: WindowState) -> Result<()> {
        let changed = {
            let mut windows = self.windows.write().await;
            let info = windows
                .get_mut(window)
                .ok_or_else(|| HostError::UnknownWindow(window.clone()))?;
            let changed = info.state != state;
            info.state = state;
            changed
        };
        if changed {
            let _ = self.events.send(HostEvent::StateChanged {
                window: window.clone(),
                state,
            });
        }
        Ok(())
    }
}

impl Default for MemoryHost {
    fn default() -> Self {
        Self::new(256)
    }
}

#[async_trait]
impl WindowHost for MemoryHost {
    async fn window_info(&self, window: &WindowIdentity) -> Result<WindowInfo> {
        self.check_online()?;
        self.windows
            .read()
            .await
            .get(window)
            .cloned()
            .ok_or_else(|| HostError::UnknownWindow(window.clone()))
    }

    async fn set_state(&self, window: &WindowIdentity, state: WindowState) -> Result<()> {
        self.check_online()?;
        self.set_state_calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.read().await.contains(window) {
            return Err(HostError::Other(format!("{window} refused state {state}")));
        }
        self.apply_state(window, state).await
    }

    async fn set_bounds(&self, window: &WindowIdentity, bounds: Rect) -> Result<()> {
        self.check_online()?;
        let mut windows = self.windows.write().await;
        let info = windows
            .get_mut(window)
            .ok_or_else(|| HostError::UnknownWindow(window.clone()))?;
        info.bounds = bounds;
        Ok(())
    }

    async fn launch(&self, spec: &LaunchSpec, window_name: &str) -> Result<WindowIdentity> {
        self.check_online()?;
        spec.validate().map_err(HostError::LaunchFailed)?;

        let mut windows = self.windows.write().await;
        let app_id = spec.app_id();
        if let Some(existing) = windows
            .values()
            .find(|w| w.launch.app_id() == app_id && w.identity.window_name == window_name)
        {
            return Ok(existing.identity.clone());
        }

        // Windows of a running app share its process.
        let process_id = windows
            .values()
            .find(|w| w.launch.app_id() == app_id)
            .map(|w| w.identity.process_id.clone())
            .unwrap_or_else(|| {
                let n = self.next_process.fetch_add(1, Ordering::SeqCst);
                format!("{app_id}-{n}")
            });

        let identity = WindowIdentity::new(process_id, window_name);
        windows.insert(
            identity.clone(),
            WindowInfo {
                identity: identity.clone(),
                launch: spec.clone(),
                bounds: DEFAULT_BOUNDS,
                state: WindowState::Normal,
            },
        );
        tracing::debug!(window = %identity, "memory host launched window");
        Ok(identity)
    }

    async fn close(&self, window: &WindowIdentity) -> Result<()> {
        self.check_online()?;
        let removed = self.windows.write().await.remove(window);
        if removed.is_none() {
            return Err(HostError::UnknownWindow(window.clone()));
        }
        let _ = self.events.send(HostEvent::Closed(window.clone()));
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<HostEvent> {
        self.events.subscribe()
    }
}
