//! Driver-level tests: events in, provider writes and UI intents out.

use super::*;
use super::error::EngineError;
use super::types::{FeatureStatePatch, VisualPatch};

const EMPTY: ScreenPoint = ScreenPoint::new(-500.0, -500.0);
const FEATURE_IDS: [u64; 6] = [1, 2, 3, 7, 8, 42];

fn at(n: u64) -> ScreenPoint {
    ScreenPoint::new(n as f32 * 10.0, 5.0)
}

fn footprint(n: u64) -> FeatureGeometry {
    let lng = 44.79 + n as f64 * 0.001;
    let lat = 41.71;
    let d = 0.0002;
    FeatureGeometry::Polygon(vec![vec![
        GeoPoint::new(lat, lng),
        GeoPoint::new(lat, lng + d),
        GeoPoint::new(lat + d, lng + d),
        GeoPoint::new(lat + d, lng),
        GeoPoint::new(lat, lng),
    ]])
}

fn record(n: u64) -> AnnotationRecord {
    AnnotationRecord {
        id: BuildingId::Int(n),
        anchor: GeoPoint::new(41.71, 44.79),
        title: format!("Building {}", n),
        description: String::new(),
        media: vec![],
    }
}

fn provider() -> RecordingProvider {
    let mut provider = RecordingProvider::default();
    for n in FEATURE_IDS {
        provider.features.push((
            PickResult {
                id: BuildingId::Int(n),
                geometry: footprint(n),
            },
            at(n),
        ));
    }
    provider
}

fn driver(annotated: &[u64]) -> ReconciliationDriver<RecordingProvider> {
    let (store, rejected) = AnnotationStore::from_records(annotated.iter().map(|&n| record(n)));
    assert_eq!(rejected, 0);
    ReconciliationDriver::new(provider(), store, EngineConfig::default())
}

fn id(n: u64) -> BuildingId {
    BuildingId::Int(n)
}

fn move_to(
    d: &mut ReconciliationDriver<RecordingProvider>,
    screen: ScreenPoint,
) -> Vec<FeatureStatePatch> {
    d.handle(PointerEvent::new(PointerEventKind::Move, screen))
}

fn click(
    d: &mut ReconciliationDriver<RecordingProvider>,
    screen: ScreenPoint,
    modifiers: Modifiers,
) -> Vec<FeatureStatePatch> {
    d.handle(PointerEvent::new(PointerEventKind::Click(modifiers), screen))
}

#[test]
fn test_initialize_marks_annotated_buildings() {
    let mut d = driver(&[1, 7]);
    let patches = d.initialize();
    assert_eq!(patches.len(), 2);
    assert!(d.provider().state_of(&id(1)).selected);
    assert!(d.provider().state_of(&id(7)).selected);
    assert!(!d.provider().state_of(&id(2)).selected);
    assert!(d.initialize().is_empty());
}

#[test]
fn test_at_most_one_building_highlighted() {
    let mut d = driver(&[]);
    d.initialize();
    for n in [1, 2, 3, 2, 1] {
        move_to(&mut d, at(n));
        assert_eq!(d.provider().highlighted_count(), 1);
        assert!(d.provider().state_of(&id(n)).highlighted);
    }
    move_to(&mut d, EMPTY);
    assert_eq!(d.provider().highlighted_count(), 0);
    assert_eq!(d.state(), &InteractionState::Idle);
}

#[test]
fn test_hover_change_unhighlights_previous_first() {
    let mut d = driver(&[]);
    move_to(&mut d, at(1));
    let patches = move_to(&mut d, at(2));
    assert_eq!(patches.len(), 2);
    assert_eq!(patches[0].id, id(1));
    assert_eq!(patches[0].patch.highlighted, Some(false));
    assert_eq!(patches[1].id, id(2));
    assert_eq!(patches[1].patch.highlighted, Some(true));
}

#[test]
fn test_repeated_move_over_same_building_is_silent() {
    let mut d = driver(&[3]);
    d.initialize();
    assert_eq!(move_to(&mut d, at(3)).len(), 1);
    assert_eq!(d.drain_intents().count(), 1);

    let writes = d.provider().writes.len();
    assert!(move_to(&mut d, at(3)).is_empty());
    assert_eq!(d.provider().writes.len(), writes);
    assert_eq!(d.drain_intents().count(), 0);
}

#[test]
fn test_no_stale_flags_after_returning_to_idle() {
    let mut d = driver(&[7]);
    d.initialize();
    move_to(&mut d, at(2));
    move_to(&mut d, at(7));
    click(&mut d, at(7), Modifiers::PLAIN);
    d.handle(PointerEvent::new(PointerEventKind::Leave, EMPTY));

    assert_eq!(d.state(), &InteractionState::Idle);
    for n in FEATURE_IDS {
        let state = d.provider().state_of(&id(n));
        assert!(!state.highlighted, "building {} still highlighted", n);
        assert_eq!(state.selected, n == 7, "building {} selected flag", n);
    }
}

#[test]
fn test_plain_click_selects_with_single_patch() {
    let mut d = driver(&[7]);
    let patches = click(&mut d, at(7), Modifiers::PLAIN);
    assert_eq!(d.state(), &InteractionState::Selected(id(7)));
    assert_eq!(
        patches,
        vec![FeatureStatePatch {
            id: id(7),
            patch: VisualPatch {
                highlighted: None,
                selected: Some(true),
            },
        }]
    );
    let intents: Vec<UiIntent> = d.drain_intents().collect();
    assert!(matches!(intents.as_slice(), [UiIntent::ShowPopup { id, .. }] if *id == BuildingId::Int(7)));
}

#[test]
fn test_ctrl_click_then_submit_creates_annotation() {
    let mut d = driver(&[]);
    d.initialize();
    let patches = click(&mut d, at(42), Modifiers::CTRL);
    assert!(patches.is_empty());

    let InteractionState::Pending(pending) = d.state().clone() else {
        panic!("expected pending, got {:?}", d.state());
    };
    assert_eq!(pending.id, id(42));
    // Anchor is the centroid of the clicked footprint
    assert!((pending.anchor.lat - 41.7101).abs() < 1e-9);
    assert!((pending.anchor.lng - (44.79 + 0.042 + 0.0001)).abs() < 1e-9);

    let intents: Vec<UiIntent> = d.drain_intents().collect();
    assert!(matches!(intents.as_slice(), [UiIntent::OpenCreateForm { id, .. }] if *id == BuildingId::Int(42)));

    let submitted = AnnotationRecord {
        id: id(42),
        anchor: GeoPoint::new(41.71, 44.79),
        title: "T".to_string(),
        description: "D".to_string(),
        media: vec![],
    };
    d.submit_create_form(submitted.clone()).unwrap();
    assert_eq!(d.state(), &InteractionState::Idle);
    assert_eq!(d.get_annotation(&id(42)), Some(&submitted));
    assert!(d.provider().state_of(&id(42)).selected);
    assert_eq!(d.list_annotation_ids().count(), 1);
}

#[test]
fn test_ctrl_click_on_annotated_building_is_ignored() {
    let mut d = driver(&[7]);
    d.initialize();
    let writes = d.provider().writes.len();
    assert!(click(&mut d, at(7), Modifiers::CTRL).is_empty());
    assert!(!d.state().is_pending());
    assert_eq!(d.drain_intents().count(), 0);
    assert_eq!(d.provider().writes.len(), writes);
}

#[test]
fn test_invalid_submit_keeps_create_flow_open() {
    let mut d = driver(&[]);
    click(&mut d, at(42), Modifiers::CTRL);

    let mut bad = record(42);
    bad.anchor = GeoPoint::new(f64::NAN, 44.79);
    assert!(matches!(
        d.submit_create_form(bad),
        Err(EngineError::InvalidRecord { .. })
    ));
    assert!(matches!(
        d.submit_create_form(record(8)),
        Err(EngineError::InvalidRecord { .. })
    ));
    assert!(d.state().is_pending());
    assert!(d.store().is_empty());

    d.cancel_create_form();
    assert_eq!(d.state(), &InteractionState::Idle);
    assert!(matches!(
        d.submit_create_form(record(42)),
        Err(EngineError::NoPendingCreate)
    ));
}

#[test]
fn test_pending_ignores_pointer_activity() {
    let mut d = driver(&[7]);
    click(&mut d, at(42), Modifiers::CTRL);
    d.drain_intents().count();

    assert!(move_to(&mut d, at(1)).is_empty());
    assert!(click(&mut d, at(7), Modifiers::PLAIN).is_empty());
    d.handle(PointerEvent::new(PointerEventKind::Leave, EMPTY));
    assert!(d.state().is_pending());
    assert_eq!(d.drain_intents().count(), 0);
}

#[test]
fn test_click_on_selected_navigates() {
    let mut d = driver(&[7]);
    click(&mut d, at(7), Modifiers::PLAIN);
    click(&mut d, at(7), Modifiers::PLAIN);
    let intents: Vec<UiIntent> = d.drain_intents().collect();
    assert_eq!(intents.len(), 2);
    assert_eq!(
        intents[1],
        UiIntent::Navigate {
            route: "/buildings/7".to_string()
        }
    );
    assert_eq!(d.route_for(&id(7)), "/buildings/7");
}

#[test]
fn test_click_after_drag_is_swallowed() {
    let mut d = driver(&[7]);
    d.handle(PointerEvent::new(PointerEventKind::Down, at(7)));
    let dragged = ScreenPoint::new(at(7).x + 0.5, 40.0);
    assert!(move_to(&mut d, dragged).is_empty());
    d.handle(PointerEvent::new(PointerEventKind::Up, dragged));
    assert!(click(&mut d, at(7), Modifiers::PLAIN).is_empty());
    assert_eq!(d.state(), &InteractionState::Idle);

    // A short press without movement still clicks
    d.handle(PointerEvent::new(PointerEventKind::Down, at(7)));
    move_to(&mut d, ScreenPoint::new(at(7).x + 0.5, at(7).y));
    d.handle(PointerEvent::new(PointerEventKind::Up, at(7)));
    click(&mut d, at(7), Modifiers::PLAIN);
    assert_eq!(d.state(), &InteractionState::Selected(id(7)));
}

#[test]
fn test_drag_across_ui_does_not_click_on_release() {
    let mut d = driver(&[7]);
    d.handle(PointerEvent::new(PointerEventKind::Down, at(7)));
    move_to(&mut d, ScreenPoint::new(70.0, 60.0));
    d.handle(PointerEvent::new(PointerEventKind::Leave, ScreenPoint::new(70.0, 60.0)));

    // Back on the map with the button still held
    assert!(move_to(&mut d, at(7)).is_empty());
    d.handle(PointerEvent::new(PointerEventKind::Up, at(7)));
    assert!(click(&mut d, at(7), Modifiers::CTRL).is_empty());
    assert_eq!(d.state(), &InteractionState::Idle);

    move_to(&mut d, ScreenPoint::new(at(7).x + 0.5, at(7).y));
    assert_eq!(d.state(), &InteractionState::Hovering(id(7)));
}

#[test]
fn test_drag_released_off_map_ends_the_drag() {
    let mut d = driver(&[7]);
    d.handle(PointerEvent::new(PointerEventKind::Down, at(7)));
    move_to(&mut d, ScreenPoint::new(70.0, 60.0));
    d.handle(PointerEvent::new(PointerEventKind::Leave, ScreenPoint::new(70.0, 60.0)));
    d.handle(PointerEvent::new(PointerEventKind::Up, ScreenPoint::new(70.0, 60.0)));

    move_to(&mut d, at(7));
    assert_eq!(d.state(), &InteractionState::Hovering(id(7)));
    d.handle(PointerEvent::new(PointerEventKind::Down, at(7)));
    d.handle(PointerEvent::new(PointerEventKind::Up, at(7)));
    click(&mut d, at(7), Modifiers::PLAIN);
    assert_eq!(d.state(), &InteractionState::Selected(id(7)));
}

#[test]
fn test_event_with_attached_feature_skips_provider_pick() {
    let mut d = driver(&[]);
    let pick = PickResult {
        id: BuildingId::from("way/99"),
        geometry: footprint(99),
    };
    let event = PointerEvent::new(PointerEventKind::Click(Modifiers::CTRL), EMPTY).with_feature(pick);
    d.handle(event);
    let InteractionState::Pending(pending) = d.state() else {
        panic!("expected pending");
    };
    assert_eq!(pending.id, BuildingId::from("way/99"));
}

#[test]
fn test_degenerate_footprint_falls_back_to_first_point() {
    let mut d = driver(&[]);
    let sliver = PickResult {
        id: id(50),
        geometry: FeatureGeometry::Polygon(vec![vec![
            GeoPoint::new(41.0, 44.0),
            GeoPoint::new(41.0, 44.1),
        ]]),
    };
    d.handle(PointerEvent::new(PointerEventKind::Click(Modifiers::CTRL), EMPTY).with_feature(sliver));
    let InteractionState::Pending(pending) = d.state() else {
        panic!("expected pending");
    };
    assert_eq!(pending.anchor, GeoPoint::new(41.0, 44.0));
}

#[test]
fn test_malformed_pick_is_ignored() {
    let mut d = driver(&[]);
    let broken = PickResult {
        id: id(51),
        geometry: FeatureGeometry::Polygon(vec![vec![
            GeoPoint::new(41.0, 44.0),
            GeoPoint::new(141.0, 44.1),
            GeoPoint::new(41.1, 44.1),
        ]]),
    };
    let patches = d.handle(
        PointerEvent::new(PointerEventKind::Click(Modifiers::CTRL), EMPTY).with_feature(broken),
    );
    assert!(patches.is_empty());
    assert_eq!(d.state(), &InteractionState::Idle);
}

#[test]
fn test_import_records_marks_new_annotations() {
    let mut d = driver(&[]);
    d.initialize();
    let mut invalid = record(3);
    invalid.anchor = GeoPoint::new(100.0, 0.0);

    let summary = d.import_records(vec![record(1), record(2), invalid]);
    assert_eq!(
        summary,
        ImportSummary {
            imported: 2,
            rejected: 1
        }
    );
    assert!(d.provider().state_of(&id(1)).selected);
    assert!(d.provider().state_of(&id(2)).selected);
    assert!(!d.provider().state_of(&id(3)).selected);
}

#[test]
fn test_reset_provider_state_rewrites_annotations() {
    let mut d = driver(&[1, 2]);
    d.initialize();
    move_to(&mut d, at(3));
    d.provider_mut().states.clear();

    let patches = d.reset_provider_state();
    assert_eq!(patches.len(), 2);
    assert_eq!(d.state(), &InteractionState::Idle);
    assert!(d.provider().state_of(&id(1)).selected);
    assert_eq!(d.provider().highlighted_count(), 0);
}
