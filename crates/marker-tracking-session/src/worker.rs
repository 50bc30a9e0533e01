//! Detection delivery on a dedicated thread.

use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{bounded, select, Receiver, Sender, TrySendError};
use log::{debug, warn};
use marker_tracking_core::DetectionEvent;
use marker_tracking_registry::{DetectionOutcome, TrackerRegistry};

use crate::visual_pool::VisualPool;

/// Creations the worker buffers for the controller before dropping reports.
pub const DETECTION_REPORT_CAPACITY: usize = 64;

/// Thread applying detections to a shared registry until cancelled or the
/// source hangs up.
///
/// Only `Created` outcomes are reported back, on a channel bounded by
/// [`DETECTION_REPORT_CAPACITY`]. When the controller falls behind, further
/// reports are dropped; the registry itself is always updated.
#[derive(Debug)]
pub struct DetectionWorker {
    cancel: Option<Sender<()>>,
    reports: Receiver<DetectionOutcome>,
    handle: Option<JoinHandle<u64>>,
}

impl DetectionWorker {
    pub(crate) fn spawn(
        events: Receiver<DetectionEvent>,
        registry: Arc<TrackerRegistry>,
        visuals: Arc<VisualPool>,
    ) -> std::io::Result<Self> {
        let (cancel_tx, cancel_rx) = bounded::<()>(1);
        let (report_tx, report_rx) = bounded(DETECTION_REPORT_CAPACITY);
        let handle = thread::Builder::new()
            .name("marker-detections".into())
            .spawn(move || run(events, cancel_rx, &registry, &visuals, &report_tx))?;
        Ok(Self {
            cancel: Some(cancel_tx),
            reports: report_rx,
            handle: Some(handle),
        })
    }

    /// Creations applied by the worker and not yet consumed.
    pub fn reports(&self) -> &Receiver<DetectionOutcome> {
        &self.reports
    }

    /// Cancel and join. Returns the number of detections applied.
    pub fn stop(mut self) -> u64 {
        self.shutdown()
    }

    fn shutdown(&mut self) -> u64 {
        // Dropping the sender wakes the worker's select.
        self.cancel.take();
        match self.handle.take().map(JoinHandle::join) {
            Some(Ok(applied)) => applied,
            Some(Err(_)) => {
                warn!("detection worker panicked");
                0
            }
            None => 0,
        }
    }
}

impl Drop for DetectionWorker {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn run(
    events: Receiver<DetectionEvent>,
    cancel: Receiver<()>,
    registry: &TrackerRegistry,
    visuals: &VisualPool,
    report: &Sender<DetectionOutcome>,
) -> u64 {
    let mut applied = 0u64;
    let mut dropped = 0u64;
    loop {
        let next = select! {
            recv(cancel) -> _ => None,
            recv(events) -> msg => Some(msg),
        };
        let Some(msg) = next else { break };
        let Ok(event) = msg else {
            debug!("detection source closed");
            break;
        };
        let outcome = registry.on_detection(&event, visuals);
        applied += 1;
        if !matches!(outcome, DetectionOutcome::Created { .. }) {
            continue;
        }
        match report.try_send(outcome) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => dropped += 1,
            // Controller gone; keep applying until cancelled.
            Err(TrySendError::Disconnected(_)) => {}
        }
    }
    if dropped > 0 {
        warn!("detection worker dropped {dropped} creation reports, controller fell behind");
    }
    debug!("detection worker exiting after {applied} detections");
    applied
}
