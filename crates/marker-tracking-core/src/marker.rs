use crate::{MarkerData, MarkerFamily, Payload, Pose};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One per-frame observation emitted by the sensor pipeline.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DetectionEvent {
    #[serde(flatten)]
    pub data: MarkerData,
    #[serde(default)]
    pub pose: Option<Pose>,
}

impl DetectionEvent {
    pub fn aruco(id: u32, pose: Option<Pose>) -> Self {
        Self {
            data: MarkerData::ArucoOrAprilTag { id },
            pose,
        }
    }

    pub fn qr(data: impl Into<Payload>, pose: Option<Pose>) -> Self {
        Self {
            data: MarkerData::Qr { data: data.into() },
            pose,
        }
    }

    pub fn ean13(data: impl Into<Payload>) -> Self {
        Self {
            data: MarkerData::Ean13 { data: data.into() },
            pose: None,
        }
    }

    pub fn upc_a(data: impl Into<Payload>) -> Self {
        Self {
            data: MarkerData::UpcA { data: data.into() },
            pose: None,
        }
    }

    /// Attach a pose, whatever the family.
    pub fn with_pose(mut self, pose: Pose) -> Self {
        self.pose = Some(pose);
        self
    }

    #[inline]
    pub fn family(&self) -> Option<MarkerFamily> {
        self.data.family()
    }
}

/// Opaque reference to a renderable owned by the session controller.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VisualHandleId(pub u32);

impl fmt::Display for VisualHandleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "visual#{}", self.0)
    }
}

/// A physical marker resolved to a stable identity.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrackedMarker {
    /// Decoded payload; the registry key.
    pub identity: String,
    /// Family of the first detection; never reassigned.
    pub family: MarkerFamily,
    /// Edge length in meters, fixed at creation. `None` for barcodes.
    pub nominal_size: Option<f32>,
    /// Last known pose. Stays `None` for barcodes.
    pub pose: Option<Pose>,
    /// Renderable bound to this identity, if any.
    pub visual: Option<VisualHandleId>,
    /// Number of detections applied, creation included.
    pub detections: u64,
}

impl TrackedMarker {
    /// `true` if this marker has a spatial anchor.
    pub fn is_spatial(&self) -> bool {
        self.family.carries_pose()
    }
}
