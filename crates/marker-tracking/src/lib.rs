//! High-level facade crate for the `marker-tracking-*` workspace.
//!
//! This crate provides:
//! - stable, convenient re-exports of the underlying crates;
//! - [`replay`]: replay of recorded JSON session scripts through a real
//!   session controller, plus the `marker-replay` CLI (feature `cli`).
//!
//! ## Quickstart
//!
//! ```no_run
//! use marker_tracking::core::{DetectionEvent, Pose, TrackerSettings};
//! use marker_tracking::session::{
//!     DetectionFeed, FeedBackend, FixedPermission, PermissionOutcome, SessionController,
//! };
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let feed = DetectionFeed::new();
//! let mut session = SessionController::new(TrackerSettings::default(), FeedBackend::new(feed.clone()))?;
//! session.enable(&mut FixedPermission(PermissionOutcome::Granted))?;
//! session.pump();
//!
//! feed.publish(DetectionEvent::qr("room-exit", Some(Pose::from_position(0.0, 0.0, 1.0))));
//! session.pump();
//! println!("tracked: {}", session.registry().len());
//! # Ok(())
//! # }
//! ```
//!
//! ## API map
//! - `marker_tracking::core`: families, poses, detection events, settings, logger.
//! - `marker_tracking::registry`: identity resolution ([`TrackerRegistry`]).
//! - `marker_tracking::session`: permission-gated [`SessionController`].
//! - `marker_tracking::replay`: JSON session scripts and reports.

pub use marker_tracking_core as core;
pub use marker_tracking_registry as registry;
pub use marker_tracking_session as session;

pub use marker_tracking_core::{DetectionEvent, MarkerFamily, Pose, TrackedMarker, TrackerSettings};
pub use marker_tracking_registry::TrackerRegistry;
pub use marker_tracking_session::{SessionController, SessionState};

pub mod replay;
