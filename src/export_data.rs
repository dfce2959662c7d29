use std::io::Write;

use anyhow::Result;
use geo_types::Point;
use gpx::{Gpx, GpxVersion, Track, TrackSegment, Waypoint};
use time::OffsetDateTime;

use crate::gps_processor::PositionFix;

const CREATOR: &str = "tripmeter";
const TRACK_NAME: &str = "Trip";

fn fix_to_waypoint(fix: &PositionFix) -> Result<Waypoint> {
    let mut waypoint = Waypoint::new(Point::new(fix.longitude, fix.latitude));
    let nanos = fix
        .timestamp
        .timestamp_nanos_opt()
        .ok_or_else(|| anyhow!("timestamp out of range: {}", fix.timestamp))?;
    waypoint.time = Some(OffsetDateTime::from_unix_timestamp_nanos(nanos as i128)?.into());
    if fix.speed >= 0.0 {
        waypoint.speed = Some(fix.speed);
    }
    Ok(waypoint)
}

pub fn route_to_gpx(route: &[PositionFix]) -> Result<Gpx> {
    let mut segment = TrackSegment::new();
    segment.points = route.iter().map(fix_to_waypoint).collect::<Result<_>>()?;

    let mut track = Track::new();
    track.name = Some(TRACK_NAME.to_string());
    track.segments.push(segment);

    Ok(Gpx {
        version: GpxVersion::Gpx11,
        creator: Some(CREATOR.to_string()),
        tracks: vec![track],
        ..Default::default()
    })
}

pub fn route_to_gpx_file<T: Write>(route: &[PositionFix], writer: &mut T) -> Result<()> {
    let gpx = route_to_gpx(route)?;
    gpx::write(&gpx, writer)?;
    Ok(())
}
