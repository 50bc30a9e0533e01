use std::sync::{Arc, Mutex, PoisonError};

use crossbeam_channel::{unbounded, Receiver, Sender};
use marker_tracking_core::DetectionEvent;

/// Fan-out of detection events to every live subscriber.
///
/// Cloning shares the subscriber list, so a sensor thread can publish while
/// the session subscribes and unsubscribes.
#[derive(Clone, Debug, Default)]
pub struct DetectionFeed {
    subscribers: Arc<Mutex<Vec<Sender<DetectionEvent>>>>,
}

impl DetectionFeed {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self) -> Receiver<DetectionEvent> {
        let (tx, rx) = unbounded();
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(tx);
        rx
    }

    /// Deliver `event` to all subscribers, pruning the ones that hung up.
    /// Returns the number of subscribers reached.
    pub fn publish(&self, event: DetectionEvent) -> usize {
        let mut subscribers = self
            .subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        subscribers.retain(|tx| tx.send(event.clone()).is_ok());
        subscribers.len()
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}
