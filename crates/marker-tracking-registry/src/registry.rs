//! Identity-keyed store of tracked markers.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use log::{info, trace};
use marker_tracking_core::{DetectionEvent, MarkerFamily, MarkerSizes, TrackedMarker, VisualHandleId};

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::decode::decode_identity;
use crate::visual::VisualAllocator;

/// Why a detection left the registry untouched.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IgnoreReason {
    /// The payload decoded to an empty identity.
    EmptyIdentity,
    /// The sensor reported a family outside the supported set.
    UnsupportedFamily,
    /// Detection arrived while no scan was running. Never produced by the
    /// registry itself; `SessionController::on_detection` returns it outside
    /// the active state.
    NotScanning,
}

/// Transition applied for one detection.
#[derive(Clone, Debug, PartialEq)]
pub enum DetectionOutcome {
    Created {
        identity: String,
        family: MarkerFamily,
        visual: Option<VisualHandleId>,
    },
    Updated {
        identity: String,
        pose_changed: bool,
    },
    Ignored(IgnoreReason),
}

impl DetectionOutcome {
    pub fn identity(&self) -> Option<&str> {
        match self {
            DetectionOutcome::Created { identity, .. } | DetectionOutcome::Updated { identity, .. } => {
                Some(identity)
            }
            DetectionOutcome::Ignored(_) => None,
        }
    }

    pub fn is_ignored(&self) -> bool {
        matches!(self, DetectionOutcome::Ignored(_))
    }
}

#[derive(Debug, Default)]
struct RegistryState {
    markers: HashMap<String, TrackedMarker>,
    sizes: MarkerSizes,
}

/// Registry of tracked markers, at most one entry per identity.
///
/// All mutation happens under one lock, so detections may be delivered from
/// several threads through a shared `Arc<TrackerRegistry>`.
#[derive(Debug, Default)]
pub struct TrackerRegistry {
    state: Mutex<RegistryState>,
}

impl TrackerRegistry {
    pub fn new(sizes: MarkerSizes) -> Self {
        Self {
            state: Mutex::new(RegistryState {
                markers: HashMap::new(),
                sizes,
            }),
        }
    }

    // The state is consistent between statements, so a poisoned lock is still usable.
    fn lock(&self) -> MutexGuard<'_, RegistryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Resolve one detection and apply at most one create-or-update.
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "debug", skip(self, event, visuals), fields(family = ?event.family()))
    )]
    pub fn on_detection(
        &self,
        event: &DetectionEvent,
        visuals: &dyn VisualAllocator,
    ) -> DetectionOutcome {
        let Some((family, identity)) = decode_identity(&event.data) else {
            trace!("ignoring detection of unsupported marker family");
            return DetectionOutcome::Ignored(IgnoreReason::UnsupportedFamily);
        };
        if identity.is_empty() {
            trace!("ignoring {family} detection with empty payload");
            return DetectionOutcome::Ignored(IgnoreReason::EmptyIdentity);
        }
        if !family.carries_pose() {
            info!("no pose is given for marker type {family}, value is {identity}");
        }
        let event_pose = event.pose.filter(|_| family.carries_pose());

        let mut state = self.lock();
        if let Some(marker) = state.markers.get_mut(&identity) {
            marker.detections += 1;
            let mut pose_changed = false;
            if let Some(pose) = event_pose.filter(|_| marker.family.carries_pose()) {
                pose_changed = marker.pose != Some(pose);
                marker.pose = Some(pose);
            }
            if marker.family != family {
                trace!(
                    "marker {identity} seen as {family}, keeping first-seen family {}",
                    marker.family
                );
            }
            return DetectionOutcome::Updated {
                identity,
                pose_changed,
            };
        }

        let nominal_size = state.sizes.size_for(family);
        let visual = nominal_size.and_then(|size| visuals.acquire(&identity, size));
        state.markers.insert(
            identity.clone(),
            TrackedMarker {
                identity: identity.clone(),
                family,
                nominal_size,
                pose: event_pose,
                visual,
                detections: 1,
            },
        );
        info!("marker found: {family} {identity}");
        DetectionOutcome::Created {
            identity,
            family,
            visual,
        }
    }

    pub fn get(&self, identity: &str) -> Option<TrackedMarker> {
        self.lock().markers.get(identity).cloned()
    }

    pub fn contains(&self, identity: &str) -> bool {
        self.lock().markers.contains_key(identity)
    }

    pub fn len(&self) -> usize {
        self.lock().markers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().markers.is_empty()
    }

    /// All tracked markers, sorted by identity.
    pub fn snapshot(&self) -> Vec<TrackedMarker> {
        let mut out: Vec<TrackedMarker> = self.lock().markers.values().cloned().collect();
        out.sort_by(|a, b| a.identity.cmp(&b.identity));
        out
    }

    /// Drop an entry. Eviction policy is the caller's business.
    pub fn remove(&self, identity: &str) -> Option<TrackedMarker> {
        self.lock().markers.remove(identity)
    }

    pub fn marker_sizes(&self) -> MarkerSizes {
        self.lock().sizes
    }

    /// Sizes used for markers created from now on; existing entries keep theirs.
    pub fn set_marker_sizes(&self, sizes: MarkerSizes) {
        self.lock().sizes = sizes;
    }
}
