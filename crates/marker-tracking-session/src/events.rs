//! Notifications delivered to the session controller.

use crossbeam_channel::Sender;
use serde::{Deserialize, Serialize};

/// Capability the session asks permission for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    MarkerTracking,
}

impl Capability {
    pub fn as_str(self) -> &'static str {
        match self {
            Capability::MarkerTracking => "marker_tracking",
        }
    }
}

/// Result of a permission request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionOutcome {
    Granted,
    Denied,
    /// Denied with "don't ask again".
    DeniedPermanently,
}

/// Discrete, edge-triggered user input.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputEvent {
    ToggleDimmer,
    StopScanning,
}

/// Everything the controller's consumer loop reacts to, apart from detections.
#[derive(Clone, Debug)]
pub enum SessionEvent {
    Permission(PermissionOutcome),
    Input(InputEvent),
    /// Completion of an asynchronous settings application.
    SettingsApplied(Result<(), String>),
}

/// Cloneable handle for posting events into a controller's inbox.
#[derive(Clone, Debug)]
pub struct SessionSender {
    tx: Sender<SessionEvent>,
}

impl SessionSender {
    pub(crate) fn new(tx: Sender<SessionEvent>) -> Self {
        Self { tx }
    }

    /// Post an event; returns `false` if the controller is gone.
    pub fn post(&self, event: SessionEvent) -> bool {
        self.tx.send(event).is_ok()
    }

    pub fn input(&self, input: InputEvent) -> bool {
        self.post(SessionEvent::Input(input))
    }
}
