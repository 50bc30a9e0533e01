//! Replay of recorded tracking sessions.
//!
//! A session script is a JSON document listing the permission outcome and a
//! sequence of steps (detections, user input, size changes, evictions). The
//! script is driven through a real [`SessionController`] backed by an
//! in-process [`DetectionFeed`], and the final state is collected into a
//! [`ReplayReport`].

use std::{fs, path::Path};

use log::info;
use serde::{Deserialize, Serialize};

use crate::core::{
    DetectionEvent, MarkerSizes, SettingsIoError, TrackedMarker, TrackerSettings, VisualPolicy,
};
use crate::session::{
    DetectionFeed, Diagnostic, Dimmer, FeedBackend, FixedPermission, InputEvent,
    PermissionOutcome, SessionController, SessionError, SessionState, VisualHandle,
};

#[derive(thiserror::Error, Debug)]
pub enum ReplayError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Settings(#[from] SettingsIoError),
    #[error(transparent)]
    Session(#[from] SessionError),
}

/// One scripted notification.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScriptStep {
    Detection(DetectionEvent),
    Input(InputEvent),
    SetMarkerSizes(MarkerSizes),
    Remove(String),
}

fn default_permission() -> PermissionOutcome {
    PermissionOutcome::Granted
}

/// Recorded session to replay.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SessionScript {
    #[serde(default)]
    pub settings: TrackerSettings,
    #[serde(default = "default_permission")]
    pub permission: PermissionOutcome,
    #[serde(default)]
    pub dimmer_visible: bool,
    #[serde(default)]
    pub steps: Vec<ScriptStep>,
}

impl SessionScript {
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, ReplayError> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), ReplayError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }
}

/// Final state of a replayed session.
#[derive(Clone, Debug, Serialize)]
pub struct ReplayReport {
    pub state: SessionState,
    pub visual_policy: VisualPolicy,
    pub dimmer: Dimmer,
    pub steps: usize,
    pub markers: Vec<TrackedMarker>,
    pub visuals: Vec<VisualHandle>,
    pub diagnostics: Vec<Diagnostic>,
}

impl ReplayReport {
    pub fn to_json_pretty(&self) -> Result<String, ReplayError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), ReplayError> {
        fs::write(path, self.to_json_pretty()?)?;
        Ok(())
    }
}

/// Drive `script` through a session controller and report the result.
#[cfg_attr(
    feature = "tracing",
    tracing::instrument(level = "info", skip(script), fields(steps = script.steps.len()))
)]
pub fn replay(script: &SessionScript) -> Result<ReplayReport, ReplayError> {
    let feed = DetectionFeed::new();
    let mut controller =
        SessionController::new(script.settings.clone(), FeedBackend::new(feed.clone()))?
            .with_dimmer(Dimmer::new(script.dimmer_visible));
    controller.enable(&mut FixedPermission(script.permission))?;
    controller.pump();

    let inbox = controller.inbox();
    for step in &script.steps {
        match step {
            ScriptStep::Detection(event) => {
                feed.publish(event.clone());
            }
            ScriptStep::Input(input) => {
                inbox.input(*input);
            }
            ScriptStep::SetMarkerSizes(sizes) => controller.set_marker_sizes(*sizes)?,
            ScriptStep::Remove(identity) => {
                controller.remove_marker(identity);
            }
        }
        controller.pump();
    }

    let report = ReplayReport {
        state: controller.state(),
        visual_policy: controller.visuals().policy(),
        dimmer: controller.dimmer(),
        steps: script.steps.len(),
        markers: controller.registry().snapshot(),
        visuals: controller.visuals().handles(),
        diagnostics: controller.take_diagnostics(),
    };
    info!(
        "replayed {} steps: {} markers tracked, session {}",
        report.steps,
        report.markers.len(),
        report.state
    );
    Ok(report)
}
