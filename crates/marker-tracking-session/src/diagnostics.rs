//! Structured diagnostics recorded by the session controller.

use log::{debug, error, info, warn};
use marker_tracking_core::{ArucoDictionary, CameraSource, MarkerFamily};
use serde::Serialize;

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum Diagnostic {
    TrackingStarted {
        family: MarkerFamily,
        dictionary: ArucoDictionary,
        camera: CameraSource,
    },
    MarkerFound {
        identity: String,
        family: MarkerFamily,
    },
    PermissionDenied {
        permanent: bool,
    },
    PoselessFamilyDetected {
        identity: String,
        family: MarkerFamily,
    },
    SettingsRejected {
        reason: String,
    },
    ScanningStopped {
        tracked: usize,
    },
}

impl Diagnostic {
    /// Emit as a log record. Marker-level events are already logged by the
    /// registry and go out at debug level here.
    pub(crate) fn log(&self) {
        match self {
            Diagnostic::TrackingStarted {
                family,
                dictionary,
                camera,
            } => info!("start tracking {family} (dictionary {dictionary}, camera {camera:?})"),
            Diagnostic::MarkerFound { identity, family } => {
                debug!("diagnostic: marker found {family} {identity}")
            }
            Diagnostic::PermissionDenied { permanent } => error!(
                "marker tracking disabled: permission denied{}",
                if *permanent { " permanently" } else { "" }
            ),
            Diagnostic::PoselessFamilyDetected { identity, family } => {
                debug!("diagnostic: pose-less {family} {identity}")
            }
            Diagnostic::SettingsRejected { reason } => {
                warn!("tracker rejected settings: {reason}")
            }
            Diagnostic::ScanningStopped { tracked } => {
                info!("scanning stopped, {tracked} markers kept")
            }
        }
    }
}
