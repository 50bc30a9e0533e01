//! Session controller for marker tracking.
//!
//! The [`SessionController`] gates a [`TrackerRegistry`] behind a permission
//! state machine:
//!
//! ```text
//! Uninitialized --enable--> AwaitingPermission --granted--> Active --stop--> Stopped
//!                                    \--denied--> Disabled
//! ```
//!
//! External collaborators plug in through [`PermissionService`] and
//! [`TrackerBackend`]; their asynchronous completions come back as
//! [`SessionEvent`]s in the controller inbox and are processed by
//! [`SessionController::pump`].
//!
//! [`TrackerRegistry`]: marker_tracking_registry::TrackerRegistry

mod backend;
mod controller;
mod diagnostics;
mod dimmer;
mod error;
mod events;
mod feed;
mod permission;
mod visual_pool;
mod worker;

pub use backend::{FeedBackend, SettingsCompletion, TrackerBackend};
pub use controller::{SessionController, SessionState, DIAGNOSTIC_CAPACITY};
pub use diagnostics::Diagnostic;
pub use dimmer::Dimmer;
pub use error::SessionError;
pub use events::{Capability, InputEvent, PermissionOutcome, SessionEvent, SessionSender};
pub use feed::DetectionFeed;
pub use permission::{DeferredPermission, FixedPermission, PermissionResponder, PermissionService};
pub use visual_pool::{VisualHandle, VisualPool};
pub use worker::{DetectionWorker, DETECTION_REPORT_CAPACITY};

pub use marker_tracking_registry::{DetectionOutcome, IgnoreReason};
