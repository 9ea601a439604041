//! Keeps every window in a group in the same visual state.
//!
//! The synchronizer mirrors the state it last asked the host for on each
//! window. A host `state-changed` that matches the mirror is the echo of our
//! own call. Anything else is a user transition, once the host confirms it
//! still holds that state; older echoes overtaken by a newer request fail
//! that check and are dropped.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use casement_common::{GroupError, WindowIdentity, WindowState};
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::host::{self, WindowHost};

/// How a reported host state relates to what was last requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Observation {
    Echo,
    Transition,
}

pub struct Synchronizer {
    host: Arc<dyn WindowHost>,
    host_timeout: Duration,
    mirror: RwLock<HashMap<WindowIdentity, WindowState>>,
}

impl Synchronizer {
    pub fn new(host: Arc<dyn WindowHost>, host_timeout: Duration) -> Self {
        Self {
            host,
            host_timeout,
            mirror: RwLock::new(HashMap::new()),
        }
    }

    pub async fn mirrored(&self, window: &WindowIdentity) -> Option<WindowState> {
        self.mirror.read().await.get(window).copied()
    }

    /// Record a state without calling the host (e.g. on registration).
    pub async fn seed(&self, window: &WindowIdentity, state: WindowState) {
        self.mirror.write().await.insert(window.clone(), state);
    }

    pub async fn forget(&self, window: &WindowIdentity) {
        self.mirror.write().await.remove(window);
    }

    /// Bring every window in `scope` to `target`. Windows already mirrored
    /// in `target` get no host call. Returns the windows changed.
    ///
    /// If any host call fails, the windows already switched are put back in
    /// their previous state and every mirror touched is re-read from the
    /// host, so a failed broadcast leaves the group where it started.
    pub async fn broadcast(
        &self,
        scope: &[WindowIdentity],
        target: WindowState,
    ) -> Result<Vec<WindowIdentity>, GroupError> {
        let pending: Vec<(WindowIdentity, Option<WindowState>)> = {
            let mut mirror = self.mirror.write().await;
            let mut pending = Vec::new();
            for window in scope {
                if mirror.get(window) != Some(&target) {
                    // Mirror first so the host's echo is recognised even if
                    // it arrives before the call returns.
                    let previous = mirror.insert(window.clone(), target);
                    pending.push((window.clone(), previous));
                }
            }
            pending
        };

        debug!(%target, scope = scope.len(), pending = pending.len(), "broadcast");

        let mut first_err = None;
        let mut changed = Vec::with_capacity(pending.len());
        let mut failed = Vec::new();
        for (window, previous) in pending {
            if first_err.is_some() {
                // Not attempted; nothing to undo on the host.
                self.restore_mirror(&window, previous).await;
                continue;
            }
            match self.set_host_state(&window, target).await {
                Ok(()) => changed.push((window, previous)),
                Err(e) => {
                    warn!(window = %window, %target, error = %e, "state broadcast failed");
                    failed.push((window, previous));
                    first_err = Some(e);
                }
            }
        }

        let Some(err) = first_err else {
            return Ok(changed.into_iter().map(|(window, _)| window).collect());
        };

        for (window, previous) in failed {
            // A timed-out call may still have landed.
            if self.reconcile(&window).await == Some(target) {
                changed.push((window, previous));
            }
        }
        self.roll_back(changed).await;
        Err(err)
    }

    /// Put one window in `state` without cascading. Used when replaying a
    /// workspace, where every window's state is recorded individually.
    /// Returns false when the window was already there.
    pub async fn apply_exact(
        &self,
        window: &WindowIdentity,
        state: WindowState,
    ) -> Result<bool, GroupError> {
        {
            let mut mirror = self.mirror.write().await;
            if mirror.get(window) == Some(&state) {
                return Ok(false);
            }
            mirror.insert(window.clone(), state);
        }
        if let Err(e) = self.set_host_state(window, state).await {
            self.reconcile(window).await;
            return Err(e);
        }
        Ok(true)
    }

    /// Classify a state reported by the host. Reports that match what was
    /// last requested are echoes. Anything else is a candidate transition;
    /// the caller confirms it against the host and then [`seed`]s it.
    ///
    /// [`seed`]: Synchronizer::seed
    pub async fn observe(&self, window: &WindowIdentity, reported: WindowState) -> Observation {
        match self.mirror.read().await.get(window) {
            Some(requested) if reported.satisfies(*requested) => Observation::Echo,
            _ => Observation::Transition,
        }
    }

    /// Return switched windows to the state they were mirrored in before a
    /// failed broadcast.
    async fn roll_back(&self, changed: Vec<(WindowIdentity, Option<WindowState>)>) {
        for (window, previous) in changed {
            let Some(previous) = previous else {
                continue;
            };
            self.seed(&window, previous).await;
            if let Err(e) = self.set_host_state(&window, previous).await {
                warn!(window = %window, state = %previous, error = %e, "rollback failed");
                self.reconcile(&window).await;
            } else {
                debug!(window = %window, state = %previous, "rolled back");
            }
        }
    }

    async fn restore_mirror(&self, window: &WindowIdentity, previous: Option<WindowState>) {
        let mut mirror = self.mirror.write().await;
        match previous {
            Some(state) => mirror.insert(window.clone(), state),
            None => mirror.remove(window),
        };
    }

    /// Re-read `window`'s state from the host into the mirror. The mirror is
    /// dropped when the host cannot answer.
    async fn reconcile(&self, window: &WindowIdentity) -> Option<WindowState> {
        match host::call(self.host_timeout, self.host.window_info(window)).await {
            Ok(info) => {
                self.seed(window, info.state).await;
                Some(info.state)
            }
            Err(e) => {
                debug!(window = %window, error = %e, "could not re-read state");
                self.forget(window).await;
                None
            }
        }
    }

    async fn set_host_state(
        &self,
        window: &WindowIdentity,
        state: WindowState,
    ) -> Result<(), GroupError> {
        host::call(self.host_timeout, self.host.set_state(window, state)).await
    }
}
