use crossbeam_channel::Sender;

use crate::events::{Capability, PermissionOutcome, SessionEvent};

/// External permission subsystem.
pub trait PermissionService {
    /// Start a permission request. The outcome is reported later through
    /// `responder`, from any thread.
    fn request(&mut self, capability: Capability, responder: PermissionResponder);
}

/// Single-shot continuation for a permission request.
///
/// `resolve` consumes the responder, so an outcome is delivered at most once.
#[derive(Debug)]
#[must_use = "a dropped responder leaves the session awaiting permission"]
pub struct PermissionResponder {
    capability: Capability,
    tx: Sender<SessionEvent>,
}

impl PermissionResponder {
    pub(crate) fn new(capability: Capability, tx: Sender<SessionEvent>) -> Self {
        Self { capability, tx }
    }

    pub fn capability(&self) -> Capability {
        self.capability
    }

    pub fn resolve(self, outcome: PermissionOutcome) {
        // A closed inbox means the controller is gone; nothing left to notify.
        let _ = self.tx.send(SessionEvent::Permission(outcome));
    }

    pub fn grant(self) {
        self.resolve(PermissionOutcome::Granted)
    }

    pub fn deny(self) {
        self.resolve(PermissionOutcome::Denied)
    }
}

/// Permission service that answers every request with a fixed outcome.
#[derive(Clone, Copy, Debug)]
pub struct FixedPermission(pub PermissionOutcome);

impl PermissionService for FixedPermission {
    fn request(&mut self, _capability: Capability, responder: PermissionResponder) {
        responder.resolve(self.0);
    }
}

/// Permission service that parks the responder until the host answers.
#[derive(Debug, Default)]
pub struct DeferredPermission {
    pending: Option<PermissionResponder>,
}

impl DeferredPermission {
    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Resolve the parked request; returns `false` if nothing was pending.
    pub fn answer(&mut self, outcome: PermissionOutcome) -> bool {
        match self.pending.take() {
            Some(responder) => {
                responder.resolve(outcome);
                true
            }
            None => false,
        }
    }
}

impl PermissionService for DeferredPermission {
    fn request(&mut self, _capability: Capability, responder: PermissionResponder) {
        self.pending = Some(responder);
    }
}
