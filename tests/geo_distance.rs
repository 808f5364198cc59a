// tests/geo_distance.rs
use event_scout::geo::{distance_miles, rank_by_distance, GeoPoint};

#[test]
fn distance_to_self_is_zero_everywhere() {
    for (lat, lng) in [(0.0, 0.0), (42.0987, -75.9179), (-33.86, 151.21)] {
        assert!(distance_miles(lat, lng, lat, lng).abs() < 1e-9);
    }
}

#[test]
fn distance_is_symmetric() {
    let pairs = [
        ((42.0987, -75.9179), (40.7128, -74.0060)),
        ((51.5074, -0.1278), (-33.86, 151.21)),
    ];
    for ((lat1, lng1), (lat2, lng2)) in pairs {
        let ab = distance_miles(lat1, lng1, lat2, lng2);
        let ba = distance_miles(lat2, lng2, lat1, lng1);
        assert!((ab - ba).abs() < 1e-9);
    }
}

#[test]
fn binghamton_area_two_point_check() {
    let d = distance_miles(42.0987, -75.9179, 42.0897, -75.9679);
    assert!((d - 2.6).abs() < 0.1, "expected ~2.6 miles, got {d}");
}

#[test]
fn filter_keeps_in_radius_sorted_ascending() {
    let origin = GeoPoint::new(42.0, -75.0);
    // Latitude-only offsets: 1 degree of latitude is ~69 miles.
    let near = GeoPoint::new(42.0 + 1.0 / 69.0, -75.0); // ~1 mile
    let mid = GeoPoint::new(42.0 + 10.0 / 69.0, -75.0); // ~10 miles
    let far = GeoPoint::new(42.0 + 60.0 / 69.0, -75.0); // ~60 miles

    let items = vec![("far", Some(far)), ("near", Some(near)), ("mid", Some(mid))];

    let ranked = rank_by_distance(items, origin, 50.0, |(_, p)| *p);

    let names: Vec<&str> = ranked.within.iter().map(|((n, _), _)| *n).collect();
    assert_eq!(names, vec!["near", "mid"]);
    assert!(ranked.within[0].1 < ranked.within[1].1);
    assert!(ranked.unlocated.is_empty());
}

#[test]
fn unlocated_items_are_flagged_not_dropped() {
    let origin = GeoPoint::new(42.0, -75.0);
    let items = vec![
        ("located", Some(GeoPoint::new(42.01, -75.0))),
        ("unknown", None),
    ];

    let ranked = rank_by_distance(items, origin, 50.0, |(_, p)| *p);

    assert_eq!(ranked.within.len(), 1);
    assert_eq!(ranked.unlocated.len(), 1);
    assert_eq!(ranked.unlocated[0].0, "unknown");
}

#[test]
fn stable_sort_preserves_tie_order() {
    let origin = GeoPoint::new(42.0, -75.0);
    let p = GeoPoint::new(42.02, -75.0);
    let items = vec![("first", Some(p)), ("second", Some(p)), ("third", Some(p))];

    let ranked = rank_by_distance(items, origin, 50.0, |(_, p)| *p);

    let names: Vec<&str> = ranked.within.iter().map(|((n, _), _)| *n).collect();
    assert_eq!(names, vec!["first", "second", "third"]);
}
