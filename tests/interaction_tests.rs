mod common;

use async_trait::async_trait;
use serde_json::json;
use statusmap::prelude::*;
use std::cell::{Cell, RefCell};

const UPPER_CEDAR: (f64, f64) = (-93.2, 43.0);
const BOONE: (f64, f64) = (-93.9, 42.2);
const LAKE_RED_ROCK: (f64, f64) = (-93.2, 41.5);

/// Store lookup that yields to the executor once before answering
struct YieldingLookup {
    store: AttributeStore,
    lookups: Cell<usize>,
}

#[async_trait(?Send)]
impl AttributeLookup for YieldingLookup {
    async fn lookup(&self, id: &FeatureId) -> Option<AttributeRecord> {
        self.lookups.set(self.lookups.get() + 1);
        tokio::task::yield_now().await;
        self.store.get(id).cloned()
    }
}

fn yielding_lookup() -> YieldingLookup {
    let mut store = AttributeStore::new("project_id");
    store
        .load(&common::read_demo("attributes.csv"), AttributeFormat::Csv)
        .unwrap();
    YieldingLookup {
        store,
        lookups: Cell::new(0),
    }
}

fn at(map: &RefCell<HeadlessMap>, (lng, lat): (f64, f64)) -> Point {
    map.borrow().pixel_of(&LatLng::new(lat, lng))
}

#[tokio::test]
async fn test_click_opens_popup_with_add_on_and_frames_camera() {
    let dashboard = common::demo_dashboard();
    let zoom_before = dashboard.map().zoom();
    let point = common::pixel(&dashboard, UPPER_CEDAR.0, UPPER_CEDAR.1);

    let outcome = dashboard.click(point).await;
    assert!(matches!(outcome, ClickOutcome::Opened(_)));

    let map = dashboard.map();
    assert_eq!(map.popup_count(), 1);
    let popup = &map.open_popup().unwrap().content;
    assert_eq!(popup.title, "Iowa BLE Area Info");
    assert_eq!(popup.row("HUC8").unwrap().value, "07080104");
    assert_eq!(popup.row("Model ID").unwrap().value, "M-01");
    assert_eq!(popup.row("Grids TODO").unwrap().value, "No Grids");
    assert!(popup.row("OBJECTID").is_none());

    assert!((5.0..=11.0).contains(&map.zoom()));
    assert_ne!(map.zoom(), zoom_before);
    assert!(map.viewport().center.lat > 43.0);
    assert_eq!(
        dashboard.dispatcher().highlight().feature_id().map(FeatureId::as_str),
        Some("07080104")
    );
}

#[tokio::test]
async fn test_feature_without_record_still_opens() {
    let dashboard = common::demo_dashboard();
    let point = common::pixel(&dashboard, LAKE_RED_ROCK.0, LAKE_RED_ROCK.1);
    assert!(matches!(dashboard.click(point).await, ClickOutcome::Opened(_)));

    let map = dashboard.map();
    let popup = &map.open_popup().unwrap().content;
    assert_eq!(popup.row("HUC8").unwrap().value, "07100008");
    assert!(popup.row("FRP Status").is_none());
}

#[tokio::test]
async fn test_empty_click_closes_popup() {
    let dashboard = common::demo_dashboard();
    let point = common::pixel(&dashboard, UPPER_CEDAR.0, UPPER_CEDAR.1);
    dashboard.click(point).await;
    assert_eq!(dashboard.map().popup_count(), 1);

    let empty = common::pixel(&dashboard, -90.5, 42.0);
    assert_eq!(dashboard.click(empty).await, ClickOutcome::NoFeature);
    assert_eq!(dashboard.map().popup_count(), 0);
    assert!(!dashboard.dispatcher().popup_open());
}

#[tokio::test]
async fn test_secondary_only_hit_opens_nothing() {
    let mut dashboard = common::demo_dashboard();
    dashboard
        .map_mut()
        .set_visibility("areas-interaction", Visibility::None)
        .unwrap();
    let point = common::pixel(&dashboard, UPPER_CEDAR.0, UPPER_CEDAR.1);
    assert_eq!(dashboard.click(point).await, ClickOutcome::MissedPrimary);
    assert_eq!(dashboard.map().popup_count(), 0);
}

#[tokio::test]
async fn test_overlapping_clicks_leave_one_popup_for_the_last() {
    let config = common::demo_config();
    let dispatcher = InteractionDispatcher::from_config(&config);
    let lookup = yielding_lookup();
    let map = RefCell::new(common::demo_map());
    let first = at(&map, UPPER_CEDAR);
    let second = at(&map, BOONE);

    let (a, b) = futures::join!(
        dispatcher.on_click(&map, &lookup, first),
        dispatcher.on_click(&map, &lookup, second)
    );

    assert_eq!(a, ClickOutcome::Superseded);
    assert!(matches!(b, ClickOutcome::Opened(_)));
    assert_eq!(lookup.lookups.get(), 2);

    let map = map.borrow();
    assert_eq!(map.popup_count(), 1);
    let popup = &map.open_popup().unwrap().content;
    assert_eq!(popup.row("HUC8").unwrap().value, "07100004");
    assert_eq!(popup.row("Model ID").unwrap().value, "M-03");
}

#[tokio::test]
async fn test_sequential_clicks_replace_the_popup() {
    let dashboard = common::demo_dashboard();
    let first = common::pixel(&dashboard, UPPER_CEDAR.0, UPPER_CEDAR.1);
    dashboard.click(first).await;

    // The first popup moved the camera
    let second = common::pixel(&dashboard, BOONE.0, BOONE.1);
    assert!(matches!(dashboard.click(second).await, ClickOutcome::Opened(_)));

    let map = dashboard.map();
    assert_eq!(map.popup_count(), 1);
    assert_eq!(
        map.open_popup().unwrap().content.row("HUC8").unwrap().value,
        "07100004"
    );
}

#[test]
fn test_hover_highlights_and_leave_clears() {
    let mut dashboard = common::demo_dashboard();
    let point = common::pixel(&dashboard, UPPER_CEDAR.0, UPPER_CEDAR.1);

    dashboard.handle_event(MapEvent::PointerMove { point });
    assert_eq!(dashboard.map().cursor(), Cursor::Pointer);
    assert_eq!(
        dashboard.map().filter("areas-highlight"),
        Some(&json!(["==", "HUC8", "07080104"]))
    );

    dashboard.handle_event(MapEvent::PointerLeave);
    assert_eq!(dashboard.map().cursor(), Cursor::Default);
    assert!(dashboard.dispatcher().highlight().is_cleared());
    assert_eq!(
        dashboard.map().filter("areas-highlight"),
        Some(&json!(["==", "HUC8", ""]))
    );
}

#[test]
fn test_hover_off_features_acts_like_leave() {
    let mut dashboard = common::demo_dashboard();
    let inside = common::pixel(&dashboard, BOONE.0, BOONE.1);
    let outside = common::pixel(&dashboard, -90.5, 42.0);

    dashboard.handle_event(MapEvent::PointerMove { point: inside });
    assert!(!dashboard.dispatcher().highlight().is_cleared());
    dashboard.handle_event(MapEvent::PointerMove { point: outside });
    assert!(dashboard.dispatcher().highlight().is_cleared());
    assert_eq!(dashboard.map().cursor(), Cursor::Default);
}
