use crossbeam_channel::{Receiver, Sender};
use marker_tracking_core::{DetectionEvent, TrackerSettings};

use crate::events::SessionEvent;
use crate::feed::DetectionFeed;

/// External marker-tracking capability.
pub trait TrackerBackend {
    /// Apply settings asynchronously; report the result through `done`.
    fn apply_settings(&mut self, settings: &TrackerSettings, done: SettingsCompletion);
    /// Subscribe to detections. Dropping the receiver unsubscribes.
    fn subscribe(&mut self) -> Receiver<DetectionEvent>;
    /// Ask the backend to stop scanning. Fire-and-forget.
    fn stop_scanning(&mut self);
}

/// Single-shot continuation for a settings application.
#[derive(Debug)]
#[must_use]
pub struct SettingsCompletion {
    tx: Sender<SessionEvent>,
}

impl SettingsCompletion {
    pub(crate) fn new(tx: Sender<SessionEvent>) -> Self {
        Self { tx }
    }

    pub fn complete(self, result: Result<(), String>) {
        let _ = self.tx.send(SessionEvent::SettingsApplied(result));
    }
}

/// Backend driven by an in-process [`DetectionFeed`].
///
/// Settings are accepted (or rejected, see [`FeedBackend::rejecting`])
/// immediately and recorded for inspection.
#[derive(Debug)]
pub struct FeedBackend {
    feed: DetectionFeed,
    applied: Option<TrackerSettings>,
    reject_with: Option<String>,
    scanning: bool,
}

impl FeedBackend {
    pub fn new(feed: DetectionFeed) -> Self {
        Self {
            feed,
            applied: None,
            reject_with: None,
            scanning: false,
        }
    }

    /// Backend whose settings application always fails with `reason`.
    pub fn rejecting(feed: DetectionFeed, reason: impl Into<String>) -> Self {
        Self {
            reject_with: Some(reason.into()),
            ..Self::new(feed)
        }
    }

    pub fn applied_settings(&self) -> Option<&TrackerSettings> {
        self.applied.as_ref()
    }

    pub fn is_scanning(&self) -> bool {
        self.scanning
    }

    pub fn feed(&self) -> &DetectionFeed {
        &self.feed
    }
}

impl TrackerBackend for FeedBackend {
    fn apply_settings(&mut self, settings: &TrackerSettings, done: SettingsCompletion) {
        match &self.reject_with {
            Some(reason) => done.complete(Err(reason.clone())),
            None => {
                self.applied = Some(settings.clone());
                self.scanning = settings.enable_marker_scanning;
                done.complete(Ok(()));
            }
        }
    }

    fn subscribe(&mut self) -> Receiver<DetectionEvent> {
        self.feed.subscribe()
    }

    fn stop_scanning(&mut self) {
        self.scanning = false;
    }
}
