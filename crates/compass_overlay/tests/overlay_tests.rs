use compass_core::latlng::LatLng;
use compass_overlay::{
    canvas::{CanvasEvent, DragPhase, OverlayKey},
    measurement::{measurement_session::SessionPhase, segment::TravelState},
};
use compass_travel_providers::time_of_day::TimeOfDaySelection;
use jiff::SignedDuration;

mod setup;

use setup::{Harness, create_config, create_harness, sample};

const A: LatLng = LatLng::new(10.0, 10.0);
const B: LatLng = LatLng::new(10.0, 10.01);

fn measure(harness: &mut Harness) {
    harness.overlay.activate_measurement();
    harness
        .overlay
        .handle_canvas_event(&CanvasEvent::Click { at: A });
    harness
        .overlay
        .handle_canvas_event(&CanvasEvent::Click { at: B });
}

fn travel(harness: &Harness) -> TravelState {
    harness.overlay.measurement().segments()[0].travel_state()
}

#[test]
fn test_distance_filter_retains_two_positions() {
    let mut harness = create_harness(create_config(SignedDuration::ZERO));
    harness.overlay.start_tracking().unwrap();

    harness.source.push(sample(0.0, 0.0, 5.0));
    harness.source.push(sample(0.0, 0.00005, 5.0));
    harness.source.push(sample(0.0, 0.0002, 5.0));

    let accepted = harness.overlay.process_location_updates();
    assert_eq!(accepted.len(), 2);
    assert_eq!(accepted[0].latlng(), LatLng::new(0.0, 0.0));
    assert_eq!(accepted[1].latlng(), LatLng::new(0.0, 0.0002));
    assert_eq!(
        harness.overlay.location().position().map(|p| p.latlng()),
        Some(LatLng::new(0.0, 0.0002))
    );
}

#[tokio::test]
async fn test_measure_then_switch_time_of_day() {
    let mut harness = create_harness(create_config(SignedDuration::ZERO));
    measure(&mut harness);

    let segment = &harness.overlay.measurement().segments()[0];
    let straight = segment.straight_distance.value();
    assert!((straight - 1105.0).abs() <= 1105.0 * 0.05, "{straight}");
    assert_eq!(travel(&harness), TravelState::NoData);

    harness.overlay.settle_travel().await;
    let TravelState::Ready(now) = travel(&harness) else {
        panic!("travel result missing");
    };
    assert_eq!(now.distance_meters, 1300.0);
    assert_eq!(now.duration_seconds, 120.0);

    harness.overlay.select_time_of_day(TimeOfDaySelection::Morning);
    harness.overlay.settle_travel().await;
    let TravelState::Ready(morning) = travel(&harness) else {
        panic!("morning result missing");
    };
    assert_eq!(morning.duration_seconds, 180.0);
    assert_eq!(morning.distance_meters, 1300.0);
    assert_eq!(harness.overlay.measurement().points().len(), 2);

    // Both buckets are cached now
    harness.overlay.select_time_of_day(TimeOfDaySelection::Now);
    assert_eq!(travel(&harness), TravelState::Ready(now));
    assert_eq!(harness.provider.calls(), 2);
}

#[tokio::test]
async fn test_tracking_and_measuring_are_independent() {
    let mut harness = create_harness(create_config(SignedDuration::ZERO));
    harness.overlay.start_tracking().unwrap();
    measure(&mut harness);

    harness.source.push(sample(10.001, 10.001, 5.0));
    harness.overlay.process_location_updates();
    assert_eq!(harness.canvas.pan_count(), 1);
    assert_eq!(harness.overlay.measurement().points().len(), 2);

    harness.overlay.set_auto_follow(false);
    harness.source.push(sample(10.002, 10.002, 5.0));
    assert_eq!(harness.overlay.process_location_updates().len(), 1);
    assert_eq!(harness.canvas.pan_count(), 1);
    assert!(harness.overlay.location().is_active());

    harness.overlay.deactivate_measurement();
    assert!(harness.overlay.location().is_active());
    assert!(harness.canvas.element(OverlayKey::LocationMarker).is_some());

    let state = harness.overlay.state();
    assert!(state.tracking);
    assert!(!state.auto_follow);
    assert_eq!(state.phase, SessionPhase::Idle);
}

#[tokio::test]
async fn test_poor_accuracy_relaxes_zoom() {
    let mut harness = create_harness(create_config(SignedDuration::ZERO));
    harness.overlay.start_tracking().unwrap();

    harness.source.push(sample(10.0, 10.0, 250.0));
    harness.overlay.process_location_updates();

    assert_eq!(harness.canvas.zoom(), Some(15.0));
    assert_eq!(harness.canvas.center(), Some(LatLng::new(10.0, 10.0)));
}

#[tokio::test]
async fn test_removing_a_point_drops_segment_and_lookup() {
    let mut harness = create_harness(create_config(SignedDuration::from_millis(20)));
    measure(&mut harness);

    let first = harness.overlay.measurement().points()[0].id;
    let segment = harness.overlay.measurement().segments()[0].id;
    harness
        .overlay
        .handle_canvas_event(&CanvasEvent::MarkerClick { point: first });

    assert!(harness.overlay.measurement().segments().is_empty());
    assert!(harness.canvas.element(OverlayKey::SegmentLabel(segment)).is_none());
    assert!(harness.canvas.element(OverlayKey::Segment(segment)).is_none());

    tokio::time::sleep(std::time::Duration::from_millis(60)).await;
    assert_eq!(harness.overlay.process_travel_updates(), 0);
    assert_eq!(harness.provider.calls(), 0);
}

#[tokio::test]
async fn test_drag_burst_issues_a_single_lookup() {
    let mut harness = create_harness(create_config(SignedDuration::from_millis(20)));
    measure(&mut harness);
    harness.overlay.settle_travel().await;
    assert_eq!(harness.provider.calls(), 1);

    let point = harness.overlay.measurement().points()[1].id;
    harness.overlay.handle_canvas_event(&CanvasEvent::MarkerDrag {
        point,
        phase: DragPhase::Start,
        at: B,
    });
    for step in 1..=5 {
        let at = LatLng::new(10.0, 10.01 + step as f64 * 0.001);
        harness.overlay.handle_canvas_event(&CanvasEvent::MarkerDrag {
            point,
            phase: DragPhase::Move,
            at,
        });
        let segment = &harness.overlay.measurement().segments()[0];
        assert_eq!(segment.straight_distance, A.haversine_distance(&at));
    }

    let dropped_at = LatLng::new(10.0, 10.02);
    harness.overlay.handle_canvas_event(&CanvasEvent::MarkerDrag {
        point,
        phase: DragPhase::End,
        at: dropped_at,
    });
    assert!(matches!(travel(&harness), TravelState::Stale(_)));

    harness.overlay.settle_travel().await;
    assert!(matches!(travel(&harness), TravelState::Ready(_)));
    assert_eq!(harness.provider.calls(), 2);
    assert_eq!(
        harness.overlay.measurement().segments()[0].straight_distance,
        A.haversine_distance(&dropped_at)
    );
}

#[tokio::test]
async fn test_deactivation_discards_pending_lookups() {
    let mut harness = create_harness(create_config(SignedDuration::from_millis(20)));
    measure(&mut harness);
    harness.overlay.deactivate_measurement();

    tokio::time::sleep(std::time::Duration::from_millis(60)).await;
    assert_eq!(harness.provider.calls(), 0);
    assert_eq!(harness.canvas.total_subscriptions(), 0);
    assert_eq!(harness.canvas.element_count(), 0);
}
