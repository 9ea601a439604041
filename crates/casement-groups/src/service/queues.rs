//! Per-snap-group FIFO queues.
//!
//! Each snap group id maps to a fair async mutex. Operations take every
//! queue they touch in ascending id order, so two operations never wait on
//! each other in opposite orders.

use std::collections::HashMap;
use std::sync::Arc;

use casement_common::SnapGroupId;
use tokio::sync::{Mutex, OwnedMutexGuard};

#[derive(Default)]
pub struct GroupQueues {
    queues: Mutex<HashMap<SnapGroupId, Arc<Mutex<()>>>>,
}

/// Held for the duration of one operation. Dropping it releases every queue.
pub struct QueueGuard {
    keys: Vec<SnapGroupId>,
    _guards: Vec<OwnedMutexGuard<()>>,
}

impl QueueGuard {
    pub fn keys(&self) -> &[SnapGroupId] {
        &self.keys
    }
}

/// Sort and dedup so the same set of groups always yields the same order.
pub fn normalize(mut keys: Vec<SnapGroupId>) -> Vec<SnapGroupId> {
    keys.sort_unstable();
    keys.dedup();
    keys
}

impl GroupQueues {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn acquire(&self, keys: Vec<SnapGroupId>) -> QueueGuard {
        let keys = normalize(keys);
        let queues: Vec<Arc<Mutex<()>>> = {
            let mut table = self.queues.lock().await;
            // Drop queues nobody holds or waits on.
            table.retain(|_, q| Arc::strong_count(q) > 1);
            keys.iter()
                .map(|k| table.entry(*k).or_default().clone())
                .collect()
        };

        let mut guards = Vec::with_capacity(queues.len());
        for queue in queues {
            guards.push(queue.lock_owned().await);
        }
        QueueGuard {
            keys,
            _guards: guards,
        }
    }

    /// Number of queues currently tracked.
    pub async fn len(&self) -> usize {
        self.queues.lock().await.len()
    }
}
