//! Tracker configuration and its JSON representation.

use crate::{ArucoDictionary, MarkerFamily};
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

#[derive(thiserror::Error, Debug)]
pub enum SettingsIoError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Invalid(#[from] SettingsError),
}

/// Settings validation errors.
#[derive(thiserror::Error, Debug, PartialEq)]
pub enum SettingsError {
    #[error("qr_marker_size_m must be finite and > 0 (got {0})")]
    InvalidQrSize(f32),
    #[error("aruco_marker_size_m must be finite and > 0 (got {0})")]
    InvalidArucoSize(f32),
}

/// Which cameras the backend scans with.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CameraSource {
    /// Headset world cameras.
    #[default]
    World,
    /// Front-facing RGB camera.
    #[serde(alias = "rgb")]
    FrontFacing,
}

impl CameraSource {
    /// Numeric hint passed to the backend: 0 = world cameras, 1 = RGB camera.
    pub fn backend_hint(self) -> u32 {
        match self {
            CameraSource::World => 0,
            CameraSource::FrontFacing => 1,
        }
    }
}

/// How visual handles are assigned to tracked identities.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum VisualPolicy {
    /// One handle for the whole process, rebound to every newly seen marker.
    Shared,
    /// One handle per identity, kept until the identity is removed.
    #[default]
    PerIdentity,
}

/// Physical edge lengths (meters) used for newly created markers.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct MarkerSizes {
    pub qr_m: f32,
    pub aruco_m: f32,
}

impl Default for MarkerSizes {
    fn default() -> Self {
        Self {
            qr_m: DEFAULT_MARKER_SIZE_M,
            aruco_m: DEFAULT_MARKER_SIZE_M,
        }
    }
}

impl MarkerSizes {
    /// Nominal size for a family; barcodes have no spatial extent.
    pub fn size_for(&self, family: MarkerFamily) -> Option<f32> {
        match family {
            MarkerFamily::Qr => Some(self.qr_m),
            MarkerFamily::ArucoOrAprilTag => Some(self.aruco_m),
            MarkerFamily::Ean13 | MarkerFamily::UpcA => None,
        }
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        if !is_valid_size(self.qr_m) {
            return Err(SettingsError::InvalidQrSize(self.qr_m));
        }
        if !is_valid_size(self.aruco_m) {
            return Err(SettingsError::InvalidArucoSize(self.aruco_m));
        }
        Ok(())
    }
}

fn is_valid_size(v: f32) -> bool {
    v.is_finite() && v > 0.0
}

pub const DEFAULT_MARKER_SIZE_M: f32 = 0.1;

fn default_marker_size() -> f32 {
    DEFAULT_MARKER_SIZE_M
}

fn default_true() -> bool {
    true
}

/// Configuration handed to the tracker backend when tracking starts.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrackerSettings {
    #[serde(default = "default_true")]
    pub enable_marker_scanning: bool,
    /// Family the backend is asked to scan for.
    #[serde(default)]
    pub marker_family: MarkerFamily,
    #[serde(default = "default_marker_size")]
    pub qr_marker_size_m: f32,
    #[serde(default)]
    pub aruco_dictionary: ArucoDictionary,
    #[serde(default = "default_marker_size")]
    pub aruco_marker_size_m: f32,
    #[serde(default)]
    pub camera_source: CameraSource,
    #[serde(default)]
    pub visual_policy: VisualPolicy,
}

impl Default for TrackerSettings {
    fn default() -> Self {
        Self {
            enable_marker_scanning: true,
            marker_family: MarkerFamily::Qr,
            qr_marker_size_m: DEFAULT_MARKER_SIZE_M,
            aruco_dictionary: ArucoDictionary::default(),
            aruco_marker_size_m: DEFAULT_MARKER_SIZE_M,
            camera_source: CameraSource::World,
            visual_policy: VisualPolicy::default(),
        }
    }
}

impl TrackerSettings {
    pub fn marker_sizes(&self) -> MarkerSizes {
        MarkerSizes {
            qr_m: self.qr_marker_size_m,
            aruco_m: self.aruco_marker_size_m,
        }
    }

    pub fn set_marker_sizes(&mut self, sizes: MarkerSizes) {
        self.qr_marker_size_m = sizes.qr_m;
        self.aruco_marker_size_m = sizes.aruco_m;
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        self.marker_sizes().validate()
    }

    /// Load and validate settings from a JSON file.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, SettingsIoError> {
        let raw = fs::read_to_string(path)?;
        let settings: Self = serde_json::from_str(&raw)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Write these settings to disk as pretty JSON.
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), SettingsIoError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }
}
