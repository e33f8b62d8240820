use cellindex::{
    Circle, Coordinates, FilterCondition, FilterKeys, FilterValue, GeospatialIndex, IndexConfig,
    IndexError, NearestQuery, PointDocument, Rectangle, Shape, ShapeQuery, SortInterval,
    cell_id_for,
};
use geo::polygon;
use std::collections::{BTreeSet, HashMap};

fn keys_in(index: &GeospatialIndex, shape: impl Into<Shape>) -> BTreeSet<String> {
    index
        .query(&ShapeQuery::new(shape, 1_000))
        .unwrap()
        .results
        .into_iter()
        .map(|r| r.key)
        .collect()
}

fn set(keys: &[&str]) -> BTreeSet<String> {
    keys.iter().map(|k| k.to_string()).collect()
}

/// Test 1: Rectangles wrapping the antimeridian
#[test]
fn test_antimeridian_rectangle() {
    let index = GeospatialIndex::memory().unwrap();
    let fiji_east = Coordinates::new(-17.7, 178.4);
    let fiji_west = Coordinates::new(-17.7, -179.2);
    let africa = Coordinates::new(-17.7, 25.0);
    index.insert("east", fiji_east, FilterKeys::new(), None).unwrap();
    index.insert("west", fiji_west, FilterKeys::new(), None).unwrap();
    index.insert("far", africa, FilterKeys::new(), None).unwrap();

    let wrapped = Rectangle::new(-15.0, -20.0, -178.0, 176.0);
    assert_eq!(keys_in(&index, wrapped), set(&["east", "west"]));
}

/// Test 2: Discs crossing the antimeridian
#[test]
fn test_antimeridian_circle_and_nearest() {
    let index = GeospatialIndex::memory().unwrap();
    index
        .insert("east", Coordinates::new(0.0, 179.99), FilterKeys::new(), None)
        .unwrap();
    index
        .insert("west", Coordinates::new(0.0, -179.99), FilterKeys::new(), None)
        .unwrap();

    let disc = Circle::new(Coordinates::new(0.0, 180.0), 5_000.0);
    assert_eq!(keys_in(&index, disc), set(&["east", "west"]));

    let page = index
        .nearest_points(&NearestQuery::new(Coordinates::new(0.0, -179.999), 2))
        .unwrap();
    assert_eq!(page.results[0].key, "west");
    assert_eq!(page.results[1].key, "east");
    assert!(page.results[1].distance < 3_000.0);
}

/// Test 3: Discs around a pole reach every longitude
#[test]
fn test_polar_disc() {
    let index = GeospatialIndex::memory().unwrap();
    for (i, lng) in [-180.0, -120.0, -45.0, 0.0, 60.0, 135.0, 180.0].iter().enumerate() {
        index
            .insert(
                &format!("arctic_{}", i),
                Coordinates::new(89.5, *lng),
                FilterKeys::new(),
                None,
            )
            .unwrap();
    }
    index
        .insert("oslo", Coordinates::new(59.91, 10.75), FilterKeys::new(), None)
        .unwrap();

    let found = keys_in(&index, Circle::new(Coordinates::new(90.0, 0.0), 100_000.0));
    assert_eq!(found.len(), 7);
    assert!(!found.contains("oslo"));
}

/// Test 4: Points on the extreme edges of the grid
#[test]
fn test_extreme_coordinates() {
    let index = GeospatialIndex::memory().unwrap();
    let corners = [
        ("ne", Coordinates::new(90.0, 180.0)),
        ("sw", Coordinates::new(-90.0, -180.0)),
        ("se", Coordinates::new(-90.0, 180.0)),
        ("nw", Coordinates::new(90.0, -180.0)),
        ("origin", Coordinates::new(0.0, 0.0)),
    ];
    for (key, at) in corners {
        index.insert(key, at, FilterKeys::new(), None).unwrap();
        let entry = index.get(key).unwrap().unwrap();
        assert_eq!(entry.cell, cell_id_for(&at, 16).unwrap());
    }

    let world = Rectangle::new(90.0, -90.0, 180.0, -180.0);
    assert_eq!(keys_in(&index, world).len(), 5);

    let huge = Circle::new(Coordinates::new(0.0, 0.0), 30_000_000.0);
    assert_eq!(keys_in(&index, huge).len(), 5);
}

/// Test 5: Invalid inputs are rejected, not clamped
#[test]
fn test_invalid_inputs() {
    let index = GeospatialIndex::memory().unwrap();
    for at in [
        Coordinates::new(90.1, 0.0),
        Coordinates::new(0.0, -180.1),
        Coordinates::new(f64::INFINITY, 0.0),
    ] {
        assert!(matches!(
            index.insert("bad", at, FilterKeys::new(), None),
            Err(IndexError::InvalidArgument(_))
        ));
    }
    assert!(matches!(
        index.query(&ShapeQuery::new(
            Circle::new(Coordinates::new(0.0, 0.0), -5.0),
            10
        )),
        Err(IndexError::InvalidArgument(_))
    ));
    assert!(index.is_empty().unwrap());
}

/// Test 6: Garbage cursors
#[test]
fn test_garbage_cursors() {
    let index = GeospatialIndex::memory().unwrap();
    index
        .insert("a", Coordinates::new(1.0, 1.0), FilterKeys::new(), None)
        .unwrap();
    let rect = Rectangle::new(2.0, 0.0, 2.0, 0.0);
    for token in ["", "not-a-cursor", "eyJ2IjoxfQ"] {
        assert!(matches!(
            index.query(&ShapeQuery::new(rect, 1).with_cursor(Some(token.to_string()))),
            Err(IndexError::InvalidCursor(_))
        ));
    }
}

/// Test 7: A nearest cursor is not a query cursor
#[test]
fn test_cursor_kinds_do_not_mix() {
    let index = GeospatialIndex::memory().unwrap();
    for i in 0..5 {
        index
            .insert(
                &format!("p{}", i),
                Coordinates::new(0.0, i as f64 * 0.001),
                FilterKeys::new(),
                None,
            )
            .unwrap();
    }
    let page = index
        .nearest_points(&NearestQuery::new(Coordinates::new(0.0, 0.0), 2))
        .unwrap();
    assert!(page.next_cursor.is_some());

    let rect = Rectangle::new(1.0, -1.0, 1.0, -1.0);
    assert!(matches!(
        index.query(&ShapeQuery::new(rect, 2).with_cursor(page.next_cursor)),
        Err(IndexError::InvalidCursor(_))
    ));
}

/// Test 8: Sort intervals and array-valued filter attributes
#[test]
fn test_sort_interval_and_array_filters() {
    let index = GeospatialIndex::memory().unwrap();
    let tags = |values: &[&str]| {
        let mut keys = FilterKeys::new();
        keys.insert(
            "tags".into(),
            values
                .iter()
                .map(|v| FilterValue::from(*v))
                .collect::<Vec<_>>()
                .into(),
        );
        keys
    };
    index
        .insert("a", Coordinates::new(1.0, 1.0), tags(&["cafe", "wifi"]), Some(4.5))
        .unwrap();
    index
        .insert("b", Coordinates::new(1.001, 1.0), tags(&["bar"]), Some(3.0))
        .unwrap();
    index
        .insert("c", Coordinates::new(1.002, 1.0), tags(&["cafe"]), Some(2.0))
        .unwrap();
    index
        .insert("d", Coordinates::new(1.003, 1.0), FilterKeys::new(), Some(5.0))
        .unwrap();

    let rect = Rectangle::new(2.0, 0.0, 2.0, 0.0);
    let cafes = index
        .query(&ShapeQuery::new(rect, 10).with_filter(FilterCondition::must("tags", "cafe")))
        .unwrap();
    let keys: BTreeSet<_> = cafes.results.into_iter().map(|r| r.key).collect();
    assert_eq!(keys, set(&["a", "c"]));

    let rated = index
        .query(&ShapeQuery::new(rect, 10).with_sort_interval(SortInterval::at_least(3.0)))
        .unwrap();
    let keys: BTreeSet<_> = rated.results.into_iter().map(|r| r.key).collect();
    assert_eq!(keys, set(&["a", "b", "d"]));

    // a missing attribute only matches null
    let untagged = index
        .query(
            &ShapeQuery::new(rect, 10)
                .with_filter(FilterCondition::must("tags", FilterValue::Null)),
        )
        .unwrap();
    assert_eq!(untagged.results.len(), 1);
    assert_eq!(untagged.results[0].key, "d");
}

/// Test 9: Syncing from a document store keeps one copy per key
#[test]
fn test_sync_keeps_one_copy() {
    let index = GeospatialIndex::memory().unwrap();
    let mut store: HashMap<String, PointDocument> = HashMap::new();

    store.insert(
        "place".into(),
        PointDocument::new(Coordinates::new(38.90, -77.03)),
    );
    index.sync_from(&store, "place").unwrap();

    store.insert(
        "place".into(),
        PointDocument::new(Coordinates::new(40.71, -74.00)).with_sort_key(1.0),
    );
    index.sync_from(&store, "place").unwrap();
    index.sync_from(&store, "place").unwrap();

    assert_eq!(index.len().unwrap(), 1);
    let dc = Rectangle::new(38.995, 38.79, -76.91, -77.12);
    assert!(keys_in(&index, dc).is_empty());

    store.remove("place");
    index.sync_from(&store, "place").unwrap();
    assert!(index.is_empty().unwrap());
}

/// Test 10: Nearest with a zero max distance only returns exact hits
#[test]
fn test_nearest_zero_distance() {
    let index = GeospatialIndex::memory().unwrap();
    let at = Coordinates::new(48.8566, 2.3522);
    index.insert("paris", at, FilterKeys::new(), None).unwrap();
    index
        .insert("nearby", Coordinates::new(48.8567, 2.3522), FilterKeys::new(), None)
        .unwrap();

    let page = index
        .nearest_points(&NearestQuery::new(at, 10).with_max_distance(0.0))
        .unwrap();
    assert_eq!(page.results.len(), 1);
    assert_eq!(page.results[0].key, "paris");
    assert!(page.next_cursor.is_none());
}

/// Test 11: Polygon query with coarse and fine configurations
#[test]
fn test_polygon_under_several_configs() {
    let triangle = polygon![
        (x: -77.10, y: 38.80),
        (x: -76.95, y: 38.80),
        (x: -77.10, y: 38.95),
        (x: -77.10, y: 38.80),
    ];
    for config in [
        IndexConfig::default(),
        IndexConfig::default().with_min_level(2).with_max_level(20).with_level_mod(2),
        IndexConfig::default().with_max_cells(1),
    ] {
        let index = GeospatialIndex::memory_with_config(config).unwrap();
        index
            .insert("inside", Coordinates::new(38.82, -77.08), FilterKeys::new(), None)
            .unwrap();
        index
            .insert("outside", Coordinates::new(38.94, -76.96), FilterKeys::new(), None)
            .unwrap();
        assert_eq!(keys_in(&index, triangle.clone()), set(&["inside"]));
    }
}

/// Test 12: Scan budget bounds the work of one call
#[test]
fn test_scan_budget_with_sparse_matches() {
    let index = GeospatialIndex::memory().unwrap();
    for i in 0..100 {
        let mut keys = FilterKeys::new();
        keys.insert("rare".into(), (i == 99).into());
        index
            .insert(
                &format!("p{:03}", i),
                Coordinates::new(10.0, 10.0 + i as f64 * 0.0001),
                keys,
                None,
            )
            .unwrap();
    }
    let rect = Rectangle::new(10.1, 9.9, 10.1, 9.9);
    let query = ShapeQuery::new(rect, 10)
        .with_filter(FilterCondition::must("rare", true))
        .with_scan_budget(40);

    let mut calls = 0;
    let mut found = Vec::new();
    let mut cursor = None;
    loop {
        let page = index.query(&query.clone().with_cursor(cursor)).unwrap();
        calls += 1;
        found.extend(page.results.into_iter().map(|r| r.key));
        cursor = page.next_cursor;
        if cursor.is_none() {
            break;
        }
    }
    assert_eq!(found, vec!["p099".to_string()]);
    assert_eq!(calls, 3);
}
