//! Marker identity resolution.
//!
//! [`TrackerRegistry::on_detection`] turns a raw [`DetectionEvent`] into an
//! identity (decimal id for ArUco/AprilTag, ASCII payload otherwise) and
//! applies at most one create-or-update transition:
//! - unknown identity: a new [`TrackedMarker`] is created, sized from the
//!   per-family configuration, and spatial markers get a visual handle from
//!   the supplied [`VisualAllocator`];
//! - known identity: the pose is refreshed, family and size stay as first seen;
//! - empty payloads and unsupported families change nothing.
//!
//! Barcode families (EAN-13, UPC-A) are tracked by identity only and never
//! receive a pose.
//!
//! [`DetectionEvent`]: marker_tracking_core::DetectionEvent
//! [`TrackedMarker`]: marker_tracking_core::TrackedMarker

mod decode;
mod registry;
mod visual;

pub use decode::{ascii_decode, decode_identity};
pub use registry::{DetectionOutcome, IgnoreReason, TrackerRegistry};
pub use visual::{NoVisuals, VisualAllocator};
