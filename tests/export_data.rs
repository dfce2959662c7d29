pub mod test_utils;

use std::fs::File;
use std::io::BufReader;

use tempdir::TempDir;
use tripmeter_core::export_data::{route_to_gpx, route_to_gpx_file};

use test_utils::fix;

#[test]
fn gpx() {
    let mut route = test_utils::drive_east(3, 10.0);
    route.push(fix(30.2719716, 120.1642, -1.0, 3));
    let gpx = route_to_gpx(&route).unwrap();

    assert_eq!(gpx.tracks.len(), 1);
    let points = &gpx.tracks[0].segments[0].points;
    assert_eq!(points.len(), 4);
    assert_eq!(points[0].point().x(), 120.163856);
    assert_eq!(points[0].point().y(), 30.2719716);
    assert_eq!(points[0].speed, Some(10.0));
    assert!(points[0].time.is_some());
    // unknown speed is left out
    assert_eq!(points[3].speed, None);
}

#[test]
fn write_and_read_back() {
    let dir = TempDir::new("export_data-write_and_read_back").unwrap();
    let path = dir.path().join("trip.gpx");
    let route = test_utils::drive_east(10, 10.0);

    let mut file = File::create(&path).unwrap();
    route_to_gpx_file(&route, &mut file).unwrap();
    drop(file);

    let gpx = gpx::read(BufReader::new(File::open(&path).unwrap())).unwrap();
    assert_eq!(gpx.creator.as_deref(), Some("tripmeter"));
    let points = &gpx.tracks[0].segments[0].points;
    assert_eq!(points.len(), 10);
    for (point, fix) in points.iter().zip(&route) {
        assert!((point.point().x() - fix.longitude).abs() < 1e-9);
        assert!((point.point().y() - fix.latitude).abs() < 1e-9);
    }
}

#[test]
fn empty_route() {
    let mut buf = Vec::new();
    route_to_gpx_file(&[], &mut buf).unwrap();
    let gpx = gpx::read(buf.as_slice()).unwrap();
    assert_eq!(gpx.tracks.len(), 1);
    assert!(gpx.tracks[0]
        .segments
        .iter()
        .all(|segment| segment.points.is_empty()));
}
