use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use marker_tracking_core::{
    DetectionEvent, MarkerFamily, MarkerSizes, Pose, TrackerSettings, VisualPolicy,
};
use marker_tracking_session::{
    DeferredPermission, DetectionFeed, DetectionOutcome, Diagnostic, Dimmer, FeedBackend,
    FixedPermission, IgnoreReason, InputEvent, PermissionOutcome, SessionController,
    SessionError, SessionState, DETECTION_REPORT_CAPACITY, DIAGNOSTIC_CAPACITY,
};

fn session(settings: TrackerSettings) -> (SessionController<FeedBackend>, DetectionFeed) {
    let feed = DetectionFeed::new();
    let controller =
        SessionController::new(settings, FeedBackend::new(feed.clone())).expect("valid settings");
    (controller, feed)
}

fn active_session(settings: TrackerSettings) -> (SessionController<FeedBackend>, DetectionFeed) {
    let (mut controller, feed) = session(settings);
    controller
        .enable(&mut FixedPermission(PermissionOutcome::Granted))
        .expect("enable");
    controller.pump();
    assert_eq!(controller.state(), SessionState::Active);
    controller.take_diagnostics();
    (controller, feed)
}

fn pose(x: f32) -> Pose {
    Pose::from_position(x, 0.0, 1.0)
}

#[test]
fn granted_permission_applies_settings_and_subscribes() {
    let settings = TrackerSettings {
        marker_family: MarkerFamily::ArucoOrAprilTag,
        ..TrackerSettings::default()
    };
    let (mut controller, feed) = session(settings.clone());
    let mut permissions = DeferredPermission::default();

    controller.enable(&mut permissions).expect("enable");
    assert_eq!(controller.state(), SessionState::AwaitingPermission);
    assert!(permissions.is_pending());
    assert!(!controller.is_subscribed());

    assert!(permissions.answer(PermissionOutcome::Granted));
    controller.pump();

    assert_eq!(controller.state(), SessionState::Active);
    assert_eq!(controller.backend().applied_settings(), Some(&settings));
    assert!(controller.backend().is_scanning());
    assert!(controller.is_subscribed());
    assert_eq!(feed.subscriber_count(), 1);
    assert!(controller.dimmer().active);

    let diagnostics = controller.take_diagnostics();
    assert_eq!(
        diagnostics,
        vec![Diagnostic::TrackingStarted {
            family: MarkerFamily::ArucoOrAprilTag,
            dictionary: settings.aruco_dictionary,
            camera: settings.camera_source,
        }]
    );
}

#[test]
fn enable_twice_is_rejected() {
    let (mut controller, _feed) = session(TrackerSettings::default());
    let mut permissions = DeferredPermission::default();
    controller.enable(&mut permissions).expect("first enable");
    let err = controller.enable(&mut permissions).expect_err("second enable");
    assert!(matches!(
        err,
        SessionError::InvalidState {
            expected: SessionState::Uninitialized,
            actual: SessionState::AwaitingPermission,
        }
    ));
}

#[test]
fn invalid_settings_are_rejected_up_front() {
    let settings = TrackerSettings {
        qr_marker_size_m: -0.1,
        ..TrackerSettings::default()
    };
    let result = SessionController::new(settings, FeedBackend::new(DetectionFeed::new()));
    assert!(matches!(result, Err(SessionError::InvalidSettings(_))));
}

#[test]
fn scenario_c_denied_permission_disables_the_session() {
    let (mut controller, feed) = session(TrackerSettings::default());
    controller
        .enable(&mut FixedPermission(PermissionOutcome::Denied))
        .expect("enable");
    controller.pump();

    assert_eq!(controller.state(), SessionState::Disabled);
    assert_eq!(feed.subscriber_count(), 0);
    assert!(controller.backend().applied_settings().is_none());

    assert_eq!(feed.publish(DetectionEvent::qr("late", Some(pose(0.0)))), 0);
    let outcome = controller.on_detection(&DetectionEvent::qr("late", Some(pose(0.0))));
    assert_eq!(outcome, DetectionOutcome::Ignored(IgnoreReason::NotScanning));
    assert!(controller.registry().is_empty());

    // No retry: a late grant is ignored.
    controller.on_permission(PermissionOutcome::Granted);
    assert_eq!(controller.state(), SessionState::Disabled);

    // Input polling is off once disabled.
    let before = controller.dimmer();
    controller.on_input(InputEvent::ToggleDimmer);
    assert_eq!(controller.dimmer(), before);

    assert_eq!(
        controller.take_diagnostics(),
        vec![Diagnostic::PermissionDenied { permanent: false }]
    );
}

#[test]
fn permanent_denial_is_reported_as_such() {
    let (mut controller, _feed) = session(TrackerSettings::default());
    controller
        .enable(&mut FixedPermission(PermissionOutcome::DeniedPermanently))
        .expect("enable");
    controller.pump();
    assert_eq!(controller.state(), SessionState::Disabled);
    assert_eq!(
        controller.take_diagnostics(),
        vec![Diagnostic::PermissionDenied { permanent: true }]
    );
}

#[test]
fn scenario_d_stop_scanning_keeps_registry_and_unsubscribes() {
    let (mut controller, feed) = active_session(TrackerSettings::default());
    feed.publish(DetectionEvent::aruco(42, Some(pose(0.0))));
    feed.publish(DetectionEvent::qr("room-exit", Some(pose(1.0))));
    controller.pump();
    let before = controller.registry().snapshot();
    assert_eq!(before.len(), 2);
    controller.take_diagnostics();

    let inbox = controller.inbox();
    assert!(inbox.input(InputEvent::StopScanning));
    // Published after the stop was posted: never applied.
    feed.publish(DetectionEvent::aruco(42, Some(pose(5.0))));
    feed.publish(DetectionEvent::aruco(99, Some(pose(6.0))));
    controller.pump();

    assert_eq!(controller.state(), SessionState::Stopped);
    assert!(!controller.is_subscribed());
    assert!(!controller.backend().is_scanning());
    assert_eq!(controller.registry().snapshot(), before);
    assert_eq!(feed.publish(DetectionEvent::aruco(7, None)), 0);
    assert_eq!(
        controller.take_diagnostics(),
        vec![Diagnostic::ScanningStopped { tracked: 2 }]
    );

    // A second stop is a no-op.
    controller.on_input(InputEvent::StopScanning);
    assert!(controller.take_diagnostics().is_empty());
}

#[test]
fn scenario_e_double_toggle_restores_dimmer() {
    let (controller, _feed) = session(TrackerSettings::default());
    let mut controller = controller.with_dimmer(Dimmer::new(true));
    controller
        .enable(&mut DeferredPermission::default())
        .expect("enable");

    let inbox = controller.inbox();
    inbox.input(InputEvent::ToggleDimmer);
    inbox.input(InputEvent::ToggleDimmer);
    controller.pump();
    assert!(controller.dimmer().visible);

    controller.on_input(InputEvent::ToggleDimmer);
    assert!(!controller.dimmer().visible);
    // Dimmer toggling does not touch the tracking state.
    assert_eq!(controller.state(), SessionState::AwaitingPermission);
}

#[test]
fn toggle_before_enable_is_ignored() {
    let (mut controller, _feed) = session(TrackerSettings::default());
    controller.on_input(InputEvent::ToggleDimmer);
    assert!(!controller.dimmer().visible);
}

#[test]
fn diagnostics_report_found_and_poseless_markers() {
    let (mut controller, feed) = active_session(TrackerSettings::default());
    feed.publish(DetectionEvent::qr("shelf-4", Some(pose(0.0))));
    feed.publish(DetectionEvent::ean13("4006381333931"));
    feed.publish(DetectionEvent::qr("shelf-4", Some(pose(0.5))));
    feed.publish(DetectionEvent::qr("", Some(pose(0.5))));
    controller.pump();

    assert_eq!(
        controller.take_diagnostics(),
        vec![
            Diagnostic::MarkerFound {
                identity: "shelf-4".into(),
                family: MarkerFamily::Qr,
            },
            Diagnostic::MarkerFound {
                identity: "4006381333931".into(),
                family: MarkerFamily::Ean13,
            },
            Diagnostic::PoselessFamilyDetected {
                identity: "4006381333931".into(),
                family: MarkerFamily::Ean13,
            },
        ]
    );
    assert_eq!(controller.registry().len(), 2);
}

#[test]
fn rejected_settings_are_logged_but_not_fatal() {
    let feed = DetectionFeed::new();
    let mut controller = SessionController::new(
        TrackerSettings::default(),
        FeedBackend::rejecting(feed.clone(), "unsupported camera"),
    )
    .expect("controller");
    controller
        .enable(&mut FixedPermission(PermissionOutcome::Granted))
        .expect("enable");
    controller.pump();

    assert_eq!(controller.state(), SessionState::Active);
    let diagnostics = controller.take_diagnostics();
    assert!(diagnostics.contains(&Diagnostic::SettingsRejected {
        reason: "unsupported camera".into()
    }));
}

#[test]
fn visual_handles_follow_the_configured_policy() {
    let (mut per, per_feed) = active_session(TrackerSettings::default());
    let (mut shared, shared_feed) = active_session(TrackerSettings {
        visual_policy: VisualPolicy::Shared,
        qr_marker_size_m: 0.2,
        ..TrackerSettings::default()
    });
    for feed in [&per_feed, &shared_feed] {
        feed.publish(DetectionEvent::qr("a", Some(pose(0.0))));
        feed.publish(DetectionEvent::qr("b", Some(pose(1.0))));
        feed.publish(DetectionEvent::upc_a("036000291452"));
    }
    per.pump();
    shared.pump();

    assert_eq!(per.visuals().len(), 2);
    assert_ne!(
        per.registry().get("a").and_then(|m| m.visual),
        per.registry().get("b").and_then(|m| m.visual)
    );

    assert_eq!(shared.visuals().len(), 1);
    let a = shared.registry().get("a").and_then(|m| m.visual);
    assert!(a.is_some());
    assert_eq!(a, shared.registry().get("b").and_then(|m| m.visual));
    let handle = shared.visuals().handle_for("b").expect("handle");
    assert!(handle.visible);
    assert_eq!(handle.scale_m, 0.2);
}

#[test]
fn remove_marker_releases_its_visual() {
    let (mut controller, feed) = active_session(TrackerSettings::default());
    feed.publish(DetectionEvent::aruco(3, Some(pose(0.0))));
    controller.pump();
    assert_eq!(controller.visuals().len(), 1);

    let removed = controller.remove_marker("3").expect("tracked");
    assert_eq!(removed.identity, "3");
    assert!(controller.visuals().is_empty());
    assert!(controller.remove_marker("3").is_none());
}

#[test]
fn marker_sizes_can_change_at_runtime() {
    let (mut controller, feed) = active_session(TrackerSettings::default());
    feed.publish(DetectionEvent::aruco(1, Some(pose(0.0))));
    controller.pump();

    let bad = MarkerSizes {
        qr_m: 0.1,
        aruco_m: 0.0,
    };
    assert!(controller.set_marker_sizes(bad).is_err());

    controller
        .set_marker_sizes(MarkerSizes {
            qr_m: 0.1,
            aruco_m: 0.25,
        })
        .expect("valid sizes");
    feed.publish(DetectionEvent::aruco(2, Some(pose(0.0))));
    feed.publish(DetectionEvent::aruco(1, Some(pose(1.0))));
    controller.pump();

    assert_eq!(controller.settings().aruco_marker_size_m, 0.25);
    assert_eq!(controller.registry().get("1").and_then(|m| m.nominal_size), Some(0.1));
    assert_eq!(controller.registry().get("2").and_then(|m| m.nominal_size), Some(0.25));
}

#[test]
fn worker_thread_delivery_keeps_identities_unique() {
    let (mut controller, feed) = active_session(TrackerSettings::default());
    assert!(controller.spawn_detection_worker().expect("spawn"));
    assert!(!controller.spawn_detection_worker().expect("already moved"));

    let producers: Vec<_> = (0..3u32)
        .map(|t| {
            let feed = feed.clone();
            thread::spawn(move || {
                for round in 0..100u32 {
                    let id = (round * 7 + t) % 20;
                    feed.publish(DetectionEvent::aruco(id, Some(pose(round as f32))));
                }
            })
        })
        .collect();
    for p in producers {
        p.join().expect("producer");
    }

    let deadline = Instant::now() + Duration::from_secs(10);
    let applied = || -> u64 {
        controller
            .registry()
            .snapshot()
            .iter()
            .map(|m| m.detections)
            .sum()
    };
    while applied() < 300 && Instant::now() < deadline {
        thread::sleep(Duration::from_millis(5));
    }
    assert_eq!(applied(), 300);

    controller.inbox().input(InputEvent::StopScanning);
    controller.pump();

    assert_eq!(controller.state(), SessionState::Stopped);
    assert_eq!(controller.registry().len(), 20);
    assert_eq!(controller.visuals().len(), 20);
    let found = controller
        .take_diagnostics()
        .into_iter()
        .filter(|d| matches!(d, Diagnostic::MarkerFound { .. }))
        .count();
    assert_eq!(found, 20);
}

#[test]
fn detection_before_activation_leaves_registry_untouched() {
    let (mut controller, _feed) = session(TrackerSettings::default());
    let outcome = controller.on_detection(&DetectionEvent::aruco(5, Some(pose(0.0))));
    assert_eq!(outcome, DetectionOutcome::Ignored(IgnoreReason::NotScanning));

    controller
        .enable(&mut DeferredPermission::default())
        .expect("enable");
    let outcome = controller.on_detection(&DetectionEvent::aruco(5, Some(pose(0.0))));
    assert_eq!(outcome, DetectionOutcome::Ignored(IgnoreReason::NotScanning));
    assert!(controller.registry().is_empty());
}

#[test]
fn pump_returns_while_a_producer_keeps_publishing() {
    let (mut controller, feed) = active_session(TrackerSettings::default());
    let running = Arc::new(AtomicBool::new(true));
    let producer = {
        let feed = feed.clone();
        let running = Arc::clone(&running);
        thread::spawn(move || {
            let deadline = Instant::now() + Duration::from_secs(30);
            let mut sent = 0u64;
            while running.load(Ordering::Relaxed) && Instant::now() < deadline {
                feed.publish(DetectionEvent::aruco((sent % 10) as u32, None));
                sent += 1;
            }
            sent
        })
    };
    thread::sleep(Duration::from_millis(20));

    let handled = controller.pump();
    let producer_still_running = !producer.is_finished();
    running.store(false, Ordering::Relaxed);
    let sent = producer.join().expect("producer");

    assert!(producer_still_running, "pump only returned once the producer stopped");
    assert!(handled > 0);
    assert!(handled as u64 <= sent);
    assert!(controller.registry().len() <= 10);
}

#[test]
fn repeated_barcode_reports_poseless_once() {
    let (mut controller, feed) = active_session(TrackerSettings::default());
    for _ in 0..50 {
        feed.publish(DetectionEvent::upc_a("036000291452"));
    }
    controller.pump();

    let poseless = controller
        .take_diagnostics()
        .into_iter()
        .filter(|d| matches!(d, Diagnostic::PoselessFamilyDetected { .. }))
        .count();
    assert_eq!(poseless, 1);
    assert_eq!(
        controller.registry().get("036000291452").map(|m| m.detections),
        Some(50)
    );
}

#[test]
fn diagnostics_buffer_keeps_the_most_recent() {
    let (mut controller, feed) = active_session(TrackerSettings::default());
    let total = DIAGNOSTIC_CAPACITY as u32 + 44;
    for id in 0..total {
        feed.publish(DetectionEvent::aruco(id, Some(pose(0.0))));
    }
    controller.pump();
    assert_eq!(controller.registry().len(), total as usize);

    let diagnostics = controller.take_diagnostics();
    assert_eq!(diagnostics.len(), DIAGNOSTIC_CAPACITY);
    assert_eq!(
        diagnostics.first(),
        Some(&Diagnostic::MarkerFound {
            identity: "44".into(),
            family: MarkerFamily::ArucoOrAprilTag,
        })
    );
    assert_eq!(
        diagnostics.last(),
        Some(&Diagnostic::MarkerFound {
            identity: (total - 1).to_string(),
            family: MarkerFamily::ArucoOrAprilTag,
        })
    );
    assert!(controller.take_diagnostics().is_empty());
}

#[test]
fn worker_reports_are_bounded_when_nobody_pumps() {
    let (mut controller, feed) = active_session(TrackerSettings::default());
    assert!(controller.spawn_detection_worker().expect("spawn"));

    let total = DETECTION_REPORT_CAPACITY as u32 * 2;
    for id in 0..total {
        feed.publish(DetectionEvent::aruco(id, Some(pose(0.0))));
    }
    let deadline = Instant::now() + Duration::from_secs(10);
    while controller.registry().len() < total as usize && Instant::now() < deadline {
        thread::sleep(Duration::from_millis(5));
    }
    assert_eq!(controller.registry().len(), total as usize);

    assert_eq!(controller.pump(), DETECTION_REPORT_CAPACITY);
    let found = controller
        .take_diagnostics()
        .into_iter()
        .filter(|d| matches!(d, Diagnostic::MarkerFound { .. }))
        .count();
    assert_eq!(found, DETECTION_REPORT_CAPACITY);

    // Updates are never reported back.
    feed.publish(DetectionEvent::aruco(0, Some(pose(1.0))));
    let deadline = Instant::now() + Duration::from_secs(10);
    while controller.registry().get("0").map(|m| m.detections) != Some(2)
        && Instant::now() < deadline
    {
        thread::sleep(Duration::from_millis(5));
    }
    assert_eq!(controller.pump(), 0);
}
