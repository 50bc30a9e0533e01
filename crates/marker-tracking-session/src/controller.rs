//! Permission-gated lifecycle around the tracker registry.

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

use crossbeam_channel::{unbounded, Receiver, Sender};
use log::debug;
use marker_tracking_core::{DetectionEvent, MarkerSizes, TrackedMarker, TrackerSettings};
use marker_tracking_registry::{DetectionOutcome, IgnoreReason, TrackerRegistry};
use serde::Serialize;

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::backend::{SettingsCompletion, TrackerBackend};
use crate::diagnostics::Diagnostic;
use crate::dimmer::Dimmer;
use crate::error::SessionError;
use crate::events::{Capability, InputEvent, PermissionOutcome, SessionEvent, SessionSender};
use crate::permission::{PermissionResponder, PermissionService};
use crate::visual_pool::VisualPool;
use crate::worker::DetectionWorker;

/// Lifecycle of a tracking session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Uninitialized,
    AwaitingPermission,
    Active,
    Stopped,
    /// Permission was denied; terminal for this session.
    Disabled,
}

impl SessionState {
    /// Whether discrete user input is being polled in this state.
    pub fn accepts_input(self) -> bool {
        matches!(
            self,
            SessionState::AwaitingPermission | SessionState::Active | SessionState::Stopped
        )
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Uninitialized => "uninitialized",
            SessionState::AwaitingPermission => "awaiting permission",
            SessionState::Active => "active",
            SessionState::Stopped => "stopped",
            SessionState::Disabled => "disabled",
        };
        f.write_str(name)
    }
}

/// Diagnostics kept until [`SessionController::take_diagnostics`]; older ones
/// are dropped first.
pub const DIAGNOSTIC_CAPACITY: usize = 256;

enum Delivery {
    Idle,
    Inline(Receiver<DetectionEvent>),
    Worker(DetectionWorker),
}

enum Pending {
    Event(SessionEvent),
    Detection(DetectionEvent),
    Applied(DetectionOutcome),
}

/// Drives a [`TrackerRegistry`] from permission, input and detection events.
///
/// All notifications are handled one at a time by [`SessionController::pump`]
/// (or the direct `on_*` methods). Detection delivery can be moved onto a
/// worker thread with [`SessionController::spawn_detection_worker`]; the
/// registry lock then serialises mutations.
pub struct SessionController<B: TrackerBackend> {
    state: SessionState,
    settings: TrackerSettings,
    backend: B,
    registry: Arc<TrackerRegistry>,
    visuals: Arc<VisualPool>,
    dimmer: Dimmer,
    delivery: Delivery,
    inbox_tx: Sender<SessionEvent>,
    inbox_rx: Receiver<SessionEvent>,
    diagnostics: VecDeque<Diagnostic>,
}

impl<B: TrackerBackend> SessionController<B> {
    pub fn new(settings: TrackerSettings, backend: B) -> Result<Self, SessionError> {
        settings.validate()?;
        let (inbox_tx, inbox_rx) = unbounded();
        Ok(Self {
            state: SessionState::Uninitialized,
            registry: Arc::new(TrackerRegistry::new(settings.marker_sizes())),
            visuals: Arc::new(VisualPool::new(settings.visual_policy)),
            settings,
            backend,
            dimmer: Dimmer::default(),
            delivery: Delivery::Idle,
            inbox_tx,
            inbox_rx,
            diagnostics: VecDeque::new(),
        })
    }

    /// Set the dimmer's initial visibility.
    pub fn with_dimmer(mut self, dimmer: Dimmer) -> Self {
        self.dimmer = dimmer;
        self
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn settings(&self) -> &TrackerSettings {
        &self.settings
    }

    pub fn registry(&self) -> &Arc<TrackerRegistry> {
        &self.registry
    }

    pub fn visuals(&self) -> &Arc<VisualPool> {
        &self.visuals
    }

    pub fn dimmer(&self) -> Dimmer {
        self.dimmer
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Sender for input, permission and settings notifications.
    pub fn inbox(&self) -> SessionSender {
        SessionSender::new(self.inbox_tx.clone())
    }

    /// `true` while a detection subscription is live.
    pub fn is_subscribed(&self) -> bool {
        !matches!(self.delivery, Delivery::Idle)
    }

    /// Drain diagnostics recorded so far, oldest first. At most
    /// [`DIAGNOSTIC_CAPACITY`] are kept between calls.
    pub fn take_diagnostics(&mut self) -> Vec<Diagnostic> {
        self.diagnostics.drain(..).collect()
    }

    fn record(&mut self, diagnostic: Diagnostic) {
        diagnostic.log();
        if self.diagnostics.len() == DIAGNOSTIC_CAPACITY {
            self.diagnostics.pop_front();
        }
        self.diagnostics.push_back(diagnostic);
    }

    /// Request permission and start polling input.
    pub fn enable(&mut self, permissions: &mut dyn PermissionService) -> Result<(), SessionError> {
        if self.state != SessionState::Uninitialized {
            return Err(SessionError::InvalidState {
                expected: SessionState::Uninitialized,
                actual: self.state,
            });
        }
        self.state = SessionState::AwaitingPermission;
        let capability = Capability::MarkerTracking;
        debug!("requesting {} permission", capability.as_str());
        permissions.request(
            capability,
            PermissionResponder::new(capability, self.inbox_tx.clone()),
        );
        Ok(())
    }

    #[cfg_attr(feature = "tracing", instrument(level = "info", skip(self)))]
    pub fn on_permission(&mut self, outcome: PermissionOutcome) {
        if self.state != SessionState::AwaitingPermission {
            debug!("ignoring permission outcome {outcome:?} while {}", self.state);
            return;
        }
        match outcome {
            PermissionOutcome::Granted => self.activate(),
            PermissionOutcome::Denied | PermissionOutcome::DeniedPermanently => {
                self.state = SessionState::Disabled;
                self.record(Diagnostic::PermissionDenied {
                    permanent: outcome == PermissionOutcome::DeniedPermanently,
                });
            }
        }
    }

    fn activate(&mut self) {
        self.backend.apply_settings(
            &self.settings,
            SettingsCompletion::new(self.inbox_tx.clone()),
        );
        self.registry.set_marker_sizes(self.settings.marker_sizes());
        self.delivery = Delivery::Inline(self.backend.subscribe());
        self.dimmer.activate();
        self.state = SessionState::Active;
        self.record(Diagnostic::TrackingStarted {
            family: self.settings.marker_family,
            dictionary: self.settings.aruco_dictionary,
            camera: self.settings.camera_source,
        });
    }

    pub fn on_settings_applied(&mut self, result: Result<(), String>) {
        match result {
            Ok(()) => debug!("tracker settings applied"),
            Err(reason) => self.record(Diagnostic::SettingsRejected { reason }),
        }
    }

    pub fn on_input(&mut self, input: InputEvent) {
        if !self.state.accepts_input() {
            debug!("ignoring {input:?} while {}", self.state);
            return;
        }
        match input {
            InputEvent::ToggleDimmer => {
                self.dimmer.toggle();
            }
            InputEvent::StopScanning => self.stop_scanning(),
        }
    }

    fn stop_scanning(&mut self) {
        if self.state != SessionState::Active {
            debug!("stop requested while {}", self.state);
            return;
        }
        match std::mem::replace(&mut self.delivery, Delivery::Idle) {
            Delivery::Worker(worker) => {
                let reports = worker.reports().clone();
                let applied = worker.stop();
                debug!("detection worker applied {applied} detections");
                for outcome in reports.try_iter() {
                    self.record_outcome(&outcome);
                }
            }
            Delivery::Inline(rx) => drop(rx),
            Delivery::Idle => {}
        }
        self.backend.stop_scanning();
        self.state = SessionState::Stopped;
        self.record(Diagnostic::ScanningStopped {
            tracked: self.registry.len(),
        });
    }

    /// Apply one detection. Outside the active state the registry is not
    /// consulted and the outcome is `Ignored(NotScanning)`.
    pub fn on_detection(&mut self, event: &DetectionEvent) -> DetectionOutcome {
        if self.state != SessionState::Active {
            debug!("dropping detection while {}", self.state);
            return DetectionOutcome::Ignored(IgnoreReason::NotScanning);
        }
        let outcome = self.registry.on_detection(event, self.visuals.as_ref());
        self.record_outcome(&outcome);
        outcome
    }

    /// Diagnostics are one-shot per identity: only creations produce them.
    fn record_outcome(&mut self, outcome: &DetectionOutcome) {
        let DetectionOutcome::Created {
            identity, family, ..
        } = outcome
        else {
            return;
        };
        self.record(Diagnostic::MarkerFound {
            identity: identity.clone(),
            family: *family,
        });
        if !family.carries_pose() {
            self.record(Diagnostic::PoselessFamilyDetected {
                identity: identity.clone(),
                family: *family,
            });
        }
    }

    pub fn handle_event(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::Permission(outcome) => self.on_permission(outcome),
            SessionEvent::Input(input) => self.on_input(input),
            SessionEvent::SettingsApplied(result) => self.on_settings_applied(result),
        }
    }

    /// Process the notifications pending when the call starts: the inbox
    /// first, then detections (inline or reported by the worker). Returns the
    /// number handled.
    ///
    /// Anything arriving during the call waits for the next one, so a busy
    /// sensor cannot keep `pump` from returning. Follow-ups posted by a state
    /// transition, such as the settings completion on activation, are handled
    /// in the same call.
    pub fn pump(&mut self) -> usize {
        let mut budget = self.backlog();
        let mut handled = 0;
        while handled < budget {
            let Some(next) = self.next_pending() else {
                break;
            };
            let state = self.state;
            match next {
                Pending::Event(event) => self.handle_event(event),
                Pending::Detection(event) => {
                    self.on_detection(&event);
                }
                Pending::Applied(outcome) => self.record_outcome(&outcome),
            }
            handled += 1;
            if self.state != state {
                budget = handled + self.backlog();
            }
        }
        handled
    }

    fn backlog(&self) -> usize {
        let detections = match &self.delivery {
            Delivery::Idle => 0,
            Delivery::Inline(rx) => rx.len(),
            Delivery::Worker(worker) => worker.reports().len(),
        };
        self.inbox_rx.len() + detections
    }

    fn next_pending(&self) -> Option<Pending> {
        if let Ok(event) = self.inbox_rx.try_recv() {
            return Some(Pending::Event(event));
        }
        match &self.delivery {
            Delivery::Idle => None,
            Delivery::Inline(rx) => rx.try_recv().ok().map(Pending::Detection),
            Delivery::Worker(worker) => worker.reports().try_recv().ok().map(Pending::Applied),
        }
    }

    /// Move detection delivery onto a worker thread.
    ///
    /// Returns `Ok(false)` if there is no inline subscription to move. If the
    /// thread cannot be spawned the subscription is dropped.
    pub fn spawn_detection_worker(&mut self) -> std::io::Result<bool> {
        let rx = match std::mem::replace(&mut self.delivery, Delivery::Idle) {
            Delivery::Inline(rx) => rx,
            other => {
                self.delivery = other;
                return Ok(false);
            }
        };
        let worker =
            DetectionWorker::spawn(rx, Arc::clone(&self.registry), Arc::clone(&self.visuals))?;
        self.delivery = Delivery::Worker(worker);
        Ok(true)
    }

    /// Change the marker sizes used for markers created from now on.
    pub fn set_marker_sizes(&mut self, sizes: MarkerSizes) -> Result<(), SessionError> {
        sizes.validate()?;
        self.settings.set_marker_sizes(sizes);
        self.registry.set_marker_sizes(sizes);
        Ok(())
    }

    /// Evict a marker and release its visual handle.
    pub fn remove_marker(&mut self, identity: &str) -> Option<TrackedMarker> {
        let removed = self.registry.remove(identity)?;
        self.visuals.release(identity);
        Some(removed)
    }
}
