//! Renderable handles owned by the session.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard, PoisonError};

use log::debug;
use marker_tracking_core::{VisualHandleId, VisualPolicy};
use marker_tracking_registry::VisualAllocator;
use serde::Serialize;

/// State of one renderable.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct VisualHandle {
    pub id: VisualHandleId,
    /// Uniform scale, i.e. the marker edge length in meters.
    pub scale_m: f32,
    pub visible: bool,
    /// Identities currently bound to this handle, in binding order.
    pub bound: Vec<String>,
}

#[derive(Debug, Default)]
struct PoolState {
    handles: BTreeMap<VisualHandleId, VisualHandle>,
    by_identity: HashMap<String, VisualHandleId>,
    next_id: u32,
}

impl PoolState {
    fn create(&mut self, scale_m: f32) -> VisualHandleId {
        let id = VisualHandleId(self.next_id);
        self.next_id += 1;
        self.handles.insert(
            id,
            VisualHandle {
                id,
                scale_m,
                visible: false,
                bound: Vec::new(),
            },
        );
        id
    }
}

/// Pool of visual handles, allocated according to a [`VisualPolicy`].
///
/// With [`VisualPolicy::Shared`] every new identity rebinds the same single
/// handle, so only the most recent marker is represented at its own scale.
#[derive(Debug)]
pub struct VisualPool {
    policy: VisualPolicy,
    state: Mutex<PoolState>,
}

impl VisualPool {
    pub fn new(policy: VisualPolicy) -> Self {
        Self {
            policy,
            state: Mutex::new(PoolState::default()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, PoolState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn policy(&self) -> VisualPolicy {
        self.policy
    }

    pub fn handle(&self, id: VisualHandleId) -> Option<VisualHandle> {
        self.lock().handles.get(&id).cloned()
    }

    pub fn handle_for(&self, identity: &str) -> Option<VisualHandle> {
        let state = self.lock();
        let id = state.by_identity.get(identity)?;
        state.handles.get(id).cloned()
    }

    /// All handles ordered by id.
    pub fn handles(&self) -> Vec<VisualHandle> {
        self.lock().handles.values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.lock().handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().handles.is_empty()
    }

    /// Unbind `identity`. A per-identity handle is destroyed; the shared
    /// handle is hidden once nothing is bound to it.
    pub fn release(&self, identity: &str) -> Option<VisualHandleId> {
        let mut state = self.lock();
        let id = state.by_identity.remove(identity)?;
        match self.policy {
            VisualPolicy::PerIdentity => {
                state.handles.remove(&id);
            }
            VisualPolicy::Shared => {
                if let Some(handle) = state.handles.get_mut(&id) {
                    handle.bound.retain(|b| b != identity);
                    if handle.bound.is_empty() {
                        handle.visible = false;
                    }
                }
            }
        }
        debug!("released {id} from {identity}");
        Some(id)
    }
}

impl VisualAllocator for VisualPool {
    fn acquire(&self, identity: &str, size_m: f32) -> Option<VisualHandleId> {
        let mut state = self.lock();
        if let Some(id) = state.by_identity.get(identity).copied() {
            return Some(id);
        }
        let id = match self.policy {
            VisualPolicy::Shared => {
                let existing = state.handles.keys().next().copied();
                match existing {
                    Some(id) => id,
                    None => state.create(size_m),
                }
            }
            VisualPolicy::PerIdentity => state.create(size_m),
        };
        let handle = state.handles.get_mut(&id)?;
        handle.scale_m = size_m;
        handle.visible = true;
        handle.bound.push(identity.to_owned());
        state.by_identity.insert(identity.to_owned(), id);
        debug!("bound {id} to {identity} at {size_m} m");
        Some(id)
    }
}
