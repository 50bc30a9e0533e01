//! Core types for fiducial marker tracking.
//!
//! This crate is intentionally small. It defines the vocabulary shared by the
//! registry and the session controller (marker families, poses, detection
//! events, tracked markers, tracker settings) and does *not* depend on any
//! concrete sensor backend.

mod dictionary;
mod family;
mod logger;
mod marker;
mod pose;
mod settings;

pub use dictionary::{ArucoDictionary, UnknownDictionary};
pub use family::{MarkerData, MarkerFamily, Payload};
pub use marker::{DetectionEvent, TrackedMarker, VisualHandleId};
pub use pose::Pose;
pub use settings::{
    CameraSource, MarkerSizes, SettingsError, SettingsIoError, TrackerSettings, VisualPolicy,
    DEFAULT_MARKER_SIZE_M,
};

#[cfg(feature = "tracing")]
pub use logger::init_tracing;

pub use logger::{init_with_level, parse_level};
