use crate::config::AggregatorConfig;
use crate::gps_processor::{PositionFix, MS_TO_KMH};

#[derive(Clone, Debug, Default, PartialEq)]
pub struct TripState {
    pub current_speed_kmh: f64,
    pub average_speed_kmh: f64,
    pub trip_distance_m: f64,
    pub speed_sum_kmh: f64,
    pub speed_sample_count: u64,
    pub last_accepted_fix: Option<PositionFix>,
}

/// Turns a stream of position fixes into speed and distance metrics for a
/// single trip.
pub struct TripAggregator {
    config: AggregatorConfig,
    state: TripState,
}

impl TripAggregator {
    pub fn new() -> Self {
        Self::with_config(AggregatorConfig::default())
    }

    pub fn with_config(config: AggregatorConfig) -> Self {
        TripAggregator {
            config,
            state: TripState::default(),
        }
    }

    pub fn state(&self) -> &TripState {
        &self.state
    }

    /// Applies one fix. A fix without usable coordinates leaves the state
    /// untouched.
    pub fn ingest(&mut self, fix: &PositionFix) -> TripState {
        let fix = match fix.normalized() {
            Some(fix) => fix,
            None => return self.state.clone(),
        };
        // negative speed means the sensor does not know
        let observed_speed_kmh = f64::max(0.0, fix.speed * MS_TO_KMH);
        self.state.current_speed_kmh = f64::min(observed_speed_kmh, self.config.max_speed_kmh);

        if let Some(last_fix) = &self.state.last_accepted_fix {
            let distance = last_fix.distance_to(&fix);
            if distance > self.config.jitter_threshold_m {
                self.state.trip_distance_m += distance;
            } else {
                debug!("ignoring {:.3}m as jitter", distance);
            }
        }
        // NOTE: The reference point moves even when the delta above is
        // dropped as jitter, so a slow drift made of sub-threshold steps never
        // adds up to any distance. Known issue, see DESIGN.md.
        self.state.last_accepted_fix = Some(fix);

        let speed_sum_kmh = self.state.speed_sum_kmh + observed_speed_kmh;
        if observed_speed_kmh > self.config.stationary_speed_kmh && speed_sum_kmh.is_finite() {
            self.state.speed_sum_kmh = speed_sum_kmh;
            self.state.speed_sample_count += 1;
            self.state.average_speed_kmh =
                self.state.speed_sum_kmh / self.state.speed_sample_count as f64;
        }

        self.state.clone()
    }

    pub fn reset(&mut self) {
        self.state = TripState::default();
    }
}

#[cfg(test)]
mod tests {
    use chrono::DateTime;

    use crate::gps_processor::PositionFix;
    use crate::trip_aggregator::TripAggregator;

    #[test]
    fn first_fix_has_no_distance() {
        let mut aggregator = TripAggregator::new();
        let state = aggregator.ingest(&PositionFix::new(
            30.2719716,
            120.163856,
            10.0,
            DateTime::from_timestamp(1697349116, 0).unwrap(),
        ));
        assert_eq!(state.trip_distance_m, 0.0);
        assert_eq!(state.speed_sample_count, 1);
        assert!(state.last_accepted_fix.is_some());
    }

    #[test]
    fn reset() {
        let mut aggregator = TripAggregator::new();
        let timestamp = DateTime::from_timestamp(1697349116, 0).unwrap();
        aggregator.ingest(&PositionFix::new(0.0, 0.0, 5.0, timestamp));
        aggregator.ingest(&PositionFix::new(0.0, 0.001, 5.0, timestamp));
        assert!(aggregator.state().trip_distance_m > 0.0);

        aggregator.reset();
        assert_eq!(aggregator.state(), &Default::default());
    }
}
