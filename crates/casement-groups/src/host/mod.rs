//! Capability interface to the window host.
//!
//! The host is injected into the service as an `Arc<dyn WindowHost>`; nothing
//! in this crate reaches for a global runtime.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use casement_common::{GroupError, HostError, Rect, WindowIdentity, WindowState};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::launch::LaunchSpec;

pub mod memory;

pub type Result<T> = std::result::Result<T, HostError>;

/// What the host knows about a live window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowInfo {
    pub identity: WindowIdentity,
    pub launch: LaunchSpec,
    pub bounds: Rect,
    pub state: WindowState,
}

/// Notifications pushed by the host.
#[derive(Debug, Clone, PartialEq)]
pub enum HostEvent {
    StateChanged {
        window: WindowIdentity,
        state: WindowState,
    },
    Closed(WindowIdentity),
}

#[async_trait]
pub trait WindowHost: Send + Sync {
    async fn window_info(&self, window: &WindowIdentity) -> Result<WindowInfo>;

    async fn set_state(&self, window: &WindowIdentity, state: WindowState) -> Result<()>;

    async fn set_bounds(&self, window: &WindowIdentity, bounds: Rect) -> Result<()>;

    /// Resolve a running window by app id and window name, or create it.
    async fn launch(&self, spec: &LaunchSpec, window_name: &str) -> Result<WindowIdentity>;

    async fn close(&self, window: &WindowIdentity) -> Result<()>;

    fn subscribe(&self) -> broadcast::Receiver<HostEvent>;
}

/// Await a host call, giving up after `timeout`.
pub(crate) async fn call<T>(
    timeout: Duration,
    fut: impl Future<Output = Result<T>>,
) -> std::result::Result<T, GroupError> {
    match tokio::time::timeout(timeout, fut).await {
        Ok(result) => result.map_err(GroupError::from),
        Err(_) => Err(HostError::Timeout(timeout.as_millis() as u64).into()),
    }
}
