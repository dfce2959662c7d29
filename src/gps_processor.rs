use chrono::{DateTime, Utc};

use crate::utils;

/// Speed reported by the sensor when it has no estimate.
pub const UNKNOWN_SPEED: f64 = -1.0;

pub const MS_TO_KMH: f64 = 3.6;

/// A location update as the platform hands it to us.
#[derive(Clone, Debug, PartialEq)]
pub struct RawData {
    pub latitude: f64,
    pub longitude: f64,
    pub timestamp_ms: Option<i64>,
    // m/s
    pub speed: Option<f64>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct RawHeading {
    pub true_heading: f64,
}

/// A normalized position reading. `speed` is in m/s and negative when the
/// sensor did not know it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PositionFix {
    pub latitude: f64,
    pub longitude: f64,
    pub speed: f64,
    pub timestamp: DateTime<Utc>,
}

impl PositionFix {
    pub fn new(latitude: f64, longitude: f64, speed: f64, timestamp: DateTime<Utc>) -> Self {
        PositionFix {
            latitude,
            longitude,
            speed,
            timestamp,
        }
    }

    pub fn is_moving(&self) -> bool {
        self.speed > 0.0
    }

    /// Clamps or defaults out of range values, the same way `normalize` does
    /// for platform updates. `None` if the coordinates are unusable.
    pub fn normalized(&self) -> Option<PositionFix> {
        if !self.latitude.is_finite() || !self.longitude.is_finite() {
            warn!(
                "dropping location update with invalid coordinates: {}, {}",
                self.latitude, self.longitude
            );
            return None;
        }

        let longitude = if (-180.0..180.0).contains(&self.longitude) {
            self.longitude
        } else {
            (self.longitude + 180.0).rem_euclid(360.0) - 180.0
        };
        // must still be finite once converted to km/h
        let speed = if (self.speed * MS_TO_KMH).is_finite() {
            self.speed
        } else {
            UNKNOWN_SPEED
        };

        Some(PositionFix {
            latitude: self.latitude.clamp(-90.0, 90.0),
            longitude,
            speed,
            timestamp: self.timestamp,
        })
    }

    /// Great-circle distance in meters.
    pub fn distance_to(&self, other: &PositionFix) -> f64 {
        utils::haversine_distance(
            self.latitude,
            self.longitude,
            other.latitude,
            other.longitude,
        )
    }
}

/// True heading in degrees, within [0, 360).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HeadingFix {
    pub true_heading: f64,
}

/// Turns a raw update into a `PositionFix`. Out of range values are clamped
/// or defaulted; only updates without usable coordinates are dropped.
pub fn normalize(raw_data: &RawData, received_timestamp_ms: i64) -> Option<PositionFix> {
    let timestamp = raw_data
        .timestamp_ms
        .and_then(DateTime::<Utc>::from_timestamp_millis)
        .or_else(|| DateTime::<Utc>::from_timestamp_millis(received_timestamp_ms))
        .unwrap_or(DateTime::<Utc>::UNIX_EPOCH);
    PositionFix::new(
        raw_data.latitude,
        raw_data.longitude,
        raw_data.speed.unwrap_or(UNKNOWN_SPEED),
        timestamp,
    )
    .normalized()
}

pub fn normalize_heading(raw_heading: &RawHeading) -> Option<HeadingFix> {
    if !raw_heading.true_heading.is_finite() {
        warn!(
            "dropping heading update with invalid value: {}",
            raw_heading.true_heading
        );
        return None;
    }
    Some(HeadingFix {
        true_heading: raw_heading.true_heading.rem_euclid(360.0),
    })
}

#[cfg(test)]
mod tests {
    use crate::gps_processor::{normalize, RawData, UNKNOWN_SPEED};

    #[test]
    fn missing_speed_is_unknown() {
        let fix = normalize(
            &RawData {
                latitude: 30.2719716,
                longitude: 120.163856,
                timestamp_ms: Some(1697349116449),
                speed: None,
            },
            0,
        )
        .unwrap();
        assert_eq!(fix.speed, UNKNOWN_SPEED);
        assert!(!fix.is_moving());
        assert_eq!(fix.timestamp.timestamp_millis(), 1697349116449);
    }
}
