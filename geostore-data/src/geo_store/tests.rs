use super::*;
use geo::Coord;
use geostore_core::{
    AcceptAllStyle, InMemoryElementStore, TagKeyStyle, Tags,
    test_support::{RecordingStore, StoreCall, StoreJournal},
};
use rstest::{fixture, rstest};
use tempfile::TempPath;

mod support {
    include!(concat!(env!("CARGO_MANIFEST_DIR"), "/tests/support.rs"));
}

use support::{assert_close, json_nodes_fixture};

fn levels(start: u8, end: u8) -> LodRange {
    LodRange::new(start, end).expect("valid level range")
}

fn berlin_tile() -> QuadKey {
    QuadKey::from_coordinate(Coord { x: 13.42, y: 52.52 }, 10).expect("valid tile")
}

fn bus_stop(id: u64) -> Element {
    let mut tags = Tags::new();
    tags.insert("highway".to_owned(), "bus_stop".to_owned());
    Element::point(id, tags, Coord { x: 13.4, y: 52.5 })
}

#[fixture]
fn five_nodes() -> TempPath {
    json_nodes_fixture(5)
}

fn with_store(key: &str, store: RecordingStore) -> GeoStore {
    let mut geo_store = GeoStore::new();
    assert!(geo_store.register_store(key, Box::new(store)));
    geo_store
}

#[rstest]
fn duplicate_registration_keeps_the_original() {
    let tile = berlin_tile();
    let (original, original_journal) = RecordingStore::new();
    let (replacement, replacement_journal) = RecordingStore::new();
    let mut geo_store = with_store("roads", original.with_data_in(tile));

    assert!(!geo_store.register_store("roads", Box::new(replacement)));

    assert!(geo_store.has_data(&tile));
    let mut visited = 0;
    geo_store
        .search_tile(&tile, &AcceptAllStyle, &mut |_: &Element| visited += 1, &CancellationToken::new())
        .expect("search succeeds");
    assert_eq!(visited, 0);
    assert_eq!(original_journal.searches(), 1);
    assert!(replacement_journal.calls().is_empty());
    assert_eq!(geo_store.store_keys().collect::<Vec<_>>(), vec!["roads"]);
}

#[rstest]
fn empty_registry_has_no_data() {
    assert!(!GeoStore::new().has_data(&berlin_tile()));
}

#[rstest]
#[case(false, false, false)]
#[case(true, false, true)]
#[case(false, true, true)]
#[case(true, true, true)]
fn has_data_is_true_when_any_store_reports_data(
    #[case] roads: bool,
    #[case] buildings: bool,
    #[case] expected: bool,
) {
    let tile = berlin_tile();
    let mut geo_store = GeoStore::new();
    for (key, has) in [("roads", roads), ("buildings", buildings)] {
        let (store, _) = RecordingStore::new();
        let store = if has { store.with_data_in(tile) } else { store };
        geo_store.register_store(key, Box::new(store));
    }

    assert_eq!(geo_store.has_data(&tile), expected);
}

#[rstest]
fn tile_search_skips_stores_without_data() {
    let tile = berlin_tile();
    let (roads, roads_journal) = RecordingStore::new();
    let (buildings, buildings_journal) = RecordingStore::new();
    let mut geo_store = GeoStore::new();
    geo_store.register_store("roads", Box::new(roads));
    geo_store.register_store("buildings", Box::new(buildings.with_data_in(tile)));

    geo_store
        .search_tile(&tile, &AcceptAllStyle, &mut |_: &Element| {}, &CancellationToken::new())
        .expect("search succeeds");

    assert_eq!(buildings_journal.searches(), 1);
    assert_eq!(roads_journal.searches(), 0);
}

#[rstest]
fn term_search_visits_stores_in_key_order() {
    let cancel = CancellationToken::new();
    let mut geo_store = GeoStore::new();
    for (key, id) in [("zoning", 3), ("addresses", 1), ("roads", 2)] {
        let (store, _) = RecordingStore::new();
        geo_store.register_store(key, Box::new(store));
        geo_store
            .add_element(key, &bus_stop(id), levels(1, 1), &AcceptAllStyle, &cancel)
            .expect("store accepts element");
    }

    let mut ids = Vec::new();
    geo_store
        .search(
            &TermQuery::new("", "bus_stop", ""),
            &BoundingBox::world(),
            levels(1, 1),
            &mut |element: &Element| ids.push(element.id),
            &cancel,
        )
        .expect("search succeeds");

    assert_eq!(ids, vec![1, 2, 3]);
}

#[rstest]
fn single_element_lands_in_range_store() {
    let (store, journal) = RecordingStore::new();
    let mut geo_store = with_store("roads", store);

    let retained = geo_store
        .add_element("roads", &bus_stop(7), levels(1, 1), &AcceptAllStyle, &CancellationToken::new())
        .expect("store accepts element");

    assert!(retained);
    assert_eq!(
        journal.calls(),
        vec![StoreCall::StoreInRange {
            id: 7,
            range: levels(1, 1)
        }]
    );
    assert_eq!(journal.resident_ids(), vec![7]);
}

#[rstest]
fn single_element_is_queryable_at_its_level() {
    let mut geo_store = GeoStore::new();
    geo_store.register_store("roads", Box::new(InMemoryElementStore::new()));
    geo_store
        .add_element("roads", &bus_stop(7), levels(1, 1), &AcceptAllStyle, &CancellationToken::new())
        .expect("store accepts element");

    let tile = QuadKey::from_coordinate(Coord { x: 13.4, y: 52.5 }, 1).expect("valid tile");
    let mut ids = Vec::new();
    geo_store
        .search_tile(
            &tile,
            &AcceptAllStyle,
            &mut |element: &Element| ids.push(element.id),
            &CancellationToken::new(),
        )
        .expect("search succeeds");

    assert_eq!(ids, vec![7]);
    let deeper = QuadKey::from_coordinate(Coord { x: 13.4, y: 52.5 }, 2).expect("valid tile");
    assert!(!geo_store.has_data(&deeper));
}

#[rstest]
fn tile_search_is_not_filtered_by_the_style() {
    let mut geo_store = GeoStore::new();
    geo_store.register_store("transit", Box::new(InMemoryElementStore::new()));
    geo_store
        .add_element("transit", &bus_stop(7), levels(1, 1), &AcceptAllStyle, &CancellationToken::new())
        .expect("store accepts element");

    let tile = QuadKey::from_coordinate(Coord { x: 13.4, y: 52.5 }, 1).expect("valid tile");
    let mut ids = Vec::new();
    geo_store
        .search_tile(
            &tile,
            &TagKeyStyle::new(["building"]),
            &mut |element: &Element| ids.push(element.id),
            &CancellationToken::new(),
        )
        .expect("search succeeds");

    assert_eq!(ids, vec![7]);
}

#[rstest]
fn single_element_write_ignores_cancellation() {
    let (store, journal) = RecordingStore::new();
    let mut geo_store = with_store("roads", store);
    let cancel = CancellationToken::new();
    cancel.cancel();

    let retained = geo_store
        .add_element("roads", &bus_stop(7), levels(1, 1), &AcceptAllStyle, &cancel)
        .expect("store accepts element");

    assert!(retained);
    assert_eq!(
        journal.calls(),
        vec![StoreCall::StoreInRange {
            id: 7,
            range: levels(1, 1)
        }]
    );
    assert!(journal.erases().is_empty());
}

#[rstest]
fn unknown_store_keys_are_reported(five_nodes: TempPath) {
    let mut geo_store = GeoStore::new();
    let cancel = CancellationToken::new();

    let element = geo_store.add_element("roads", &bus_stop(1), levels(1, 1), &AcceptAllStyle, &cancel);
    let path = geo_store.add_path_in_range("roads", &five_nodes, levels(1, 1), &AcceptAllStyle, &cancel);

    assert!(matches!(element, Err(GeoStoreError::MissingStore { ref key }) if key == "roads"));
    assert!(matches!(path, Err(GeoStoreError::MissingStore { .. })));
}

#[rstest]
fn completed_ingestion_erases_nothing(five_nodes: TempPath) {
    let (store, journal) = RecordingStore::new();
    let mut geo_store = with_store("roads", store);

    let summary = geo_store
        .add_path_in_range("roads", &five_nodes, levels(1, 3), &AcceptAllStyle, &CancellationToken::new())
        .expect("ingestion succeeds");

    assert!(!summary.cancelled);
    assert_eq!(summary.retained, 5);
    assert_eq!(journal.writes(), 5);
    assert!(journal.erases().is_empty());
}

#[rstest]
fn cancelled_tile_ingestion_erases_the_tile(five_nodes: TempPath) {
    let tile = berlin_tile();
    let cancel = CancellationToken::new();
    let (store, journal) = RecordingStore::new();
    let mut geo_store = with_store("roads", store.cancelling_after(2, cancel.clone()));

    let summary = geo_store
        .add_path_to_tile("roads", &five_nodes, &tile, &AcceptAllStyle, &cancel)
        .expect("cancellation is not an error");

    assert!(summary.cancelled);
    assert_eq!(journal.writes(), 2);
    assert_eq!(journal.erases(), vec![StoreCall::EraseTile(tile)]);
    assert!(journal.resident_ids().is_empty());
    assert!(!geo_store.has_data(&tile));
}

#[rstest]
fn cancelled_range_ingestion_erases_offered_extent(five_nodes: TempPath) {
    let cancel = CancellationToken::new();
    let (store, journal) = RecordingStore::new();
    let mut geo_store = with_store("roads", store.cancelling_after(3, cancel.clone()));

    let summary = geo_store
        .add_path_in_range("roads", &five_nodes, levels(2, 4), &AcceptAllStyle, &cancel)
        .expect("cancellation is not an error");

    assert_eq!(summary.offered, 3);
    let max = summary.bounds.max().expect("three nodes were offered");
    assert_close(max.x, 13.40 + 0.03);
    assert_close(max.y, 52.50 + 0.03);
    assert_eq!(
        journal.erases(),
        vec![StoreCall::EraseBbox {
            bbox: summary.bounds,
            range: levels(2, 4)
        }]
    );
    assert!(journal.resident_ids().is_empty());
}

#[rstest]
fn cancelled_bbox_ingestion_erases_the_requested_extent(five_nodes: TempPath) {
    let cancel = CancellationToken::new();
    let bbox = BoundingBox::from_bounds(13.0, 52.0, 14.0, 53.0);
    let (store, journal) = RecordingStore::new();
    let mut geo_store = with_store("roads", store.cancelling_after(3, cancel.clone()));

    let summary = geo_store
        .add_path_in_bbox("roads", &five_nodes, &bbox, levels(1, 5), &AcceptAllStyle, &cancel)
        .expect("cancellation is not an error");

    assert!(summary.cancelled);
    let calls = journal.calls();
    assert_eq!(calls.len(), 4);
    assert!(calls.iter().take(3).all(StoreCall::is_write));
    assert_eq!(
        calls.last(),
        Some(&StoreCall::EraseBbox {
            bbox,
            range: levels(1, 5)
        })
    );
    assert!(journal.resident_ids().is_empty());
}

#[rstest]
fn store_failure_rolls_back_partial_writes(five_nodes: TempPath) {
    let (store, journal) = RecordingStore::new();
    let mut geo_store = with_store("roads", store.failing_after(2));

    let result = geo_store.add_path_in_range(
        "roads",
        &five_nodes,
        levels(1, 1),
        &AcceptAllStyle,
        &CancellationToken::new(),
    );

    assert!(matches!(
        result,
        Err(GeoStoreError::Store {
            source: StoreError::Backend(_),
            ..
        })
    ));
    assert_eq!(journal.writes(), 3);
    assert_eq!(journal.erases().len(), 1);
    assert!(journal.resident_ids().is_empty());
}

#[rstest]
fn failure_before_any_element_erases_nothing() {
    let dir = tempfile::tempdir().expect("create temporary directory");
    let (store, journal): (RecordingStore, StoreJournal) = RecordingStore::new();
    let mut geo_store = with_store("roads", store);

    let result = geo_store.add_path_in_range(
        "roads",
        dir.path().join("absent.json"),
        levels(1, 1),
        &AcceptAllStyle,
        &CancellationToken::new(),
    );

    assert!(matches!(
        result,
        Err(GeoStoreError::Ingest {
            source: IngestError::Open { .. },
            ..
        })
    ));
    assert!(journal.calls().is_empty());
}
