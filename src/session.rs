use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::config::TripConfig;
use crate::gps_processor::{self, HeadingFix, PositionFix, RawData, RawHeading};
use crate::heading::{Heading, HeadingLabel};
use crate::route_exporter::{ExportError, ExportImage, RouteExporter};
use crate::route_track::RouteTrack;
use crate::trip_aggregator::{TripAggregator, TripState};

/// What the dashboard shows.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct TripMetrics {
    pub current_speed_kmh: f64,
    pub average_speed_kmh: f64,
    pub trip_distance_m: f64,
    pub heading: Option<Heading>,
    pub route_len: usize,
}

/// Receives the outcome of `TripSession::spawn_export`. The session only keeps
/// a weak reference, so a consumer that went away just misses the result.
pub trait ExportConsumer: Send + Sync {
    fn on_export_finished(&self, result: Result<Option<ExportImage>, ExportError>);
}

struct SessionState {
    aggregator: TripAggregator,
    route: RouteTrack,
    heading: Option<Heading>,
}

impl SessionState {
    fn metrics(&self) -> TripMetrics {
        let trip_state = self.aggregator.state();
        TripMetrics {
            current_speed_kmh: trip_state.current_speed_kmh,
            average_speed_kmh: trip_state.average_speed_kmh,
            trip_distance_m: trip_state.trip_distance_m,
            heading: self.heading,
            route_len: self.route.len(),
        }
    }

    fn ingest(&mut self, fix: PositionFix) -> TripState {
        let fix = match fix.normalized() {
            Some(fix) => fix,
            None => return self.aggregator.state().clone(),
        };
        let trip_state = self.aggregator.ingest(&fix);
        self.route.append_if_moving(fix);
        trip_state
    }
}

/// One trip, from start to reset. Every fix is applied to the aggregator and
/// the route under a single lock, so readers never see half of an update.
pub struct TripSession {
    state: Mutex<SessionState>,
    metrics_tx: watch::Sender<TripMetrics>,
}

impl TripSession {
    pub fn new() -> Self {
        Self::with_config(&TripConfig::default())
    }

    pub fn with_config(config: &TripConfig) -> Self {
        let (metrics_tx, _) = watch::channel(TripMetrics::default());
        TripSession {
            state: Mutex::new(SessionState {
                aggregator: TripAggregator::with_config(config.aggregator.clone()),
                route: RouteTrack::new(),
                heading: None,
            }),
            metrics_tx,
        }
    }

    fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, state: &SessionState) {
        self.metrics_tx.send_replace(state.metrics());
    }

    pub fn ingest(&self, fix: PositionFix) -> TripState {
        let mut state = self.lock();
        let trip_state = state.ingest(fix);
        self.publish(&state);
        trip_state
    }

    /// Handles a batch from the platform. Returns the state after the last
    /// usable fix, if any.
    pub fn on_location_update(
        &self,
        mut raw_data_list: Vec<RawData>,
        received_timestamp_ms: i64,
    ) -> Option<TripState> {
        // NOTE: Some platforms deliver a batch out of order.
        raw_data_list.sort_by_key(|raw_data| raw_data.timestamp_ms);

        let mut state = self.lock();
        let mut last_trip_state = None;
        for raw_data in &raw_data_list {
            if let Some(fix) = gps_processor::normalize(raw_data, received_timestamp_ms) {
                last_trip_state = Some(state.ingest(fix));
            }
        }
        if last_trip_state.is_some() {
            self.publish(&state);
        }
        last_trip_state
    }

    pub fn ingest_heading(&self, fix: HeadingFix) -> HeadingLabel {
        let heading = Heading::from(fix);
        let mut state = self.lock();
        state.heading = Some(heading);
        self.publish(&state);
        heading.label
    }

    pub fn on_heading_update(&self, raw_heading: &RawHeading) -> Option<HeadingLabel> {
        gps_processor::normalize_heading(raw_heading).map(|fix| self.ingest_heading(fix))
    }

    pub fn trip_state(&self) -> TripState {
        self.lock().aggregator.state().clone()
    }

    pub fn metrics(&self) -> TripMetrics {
        self.metrics_tx.borrow().clone()
    }

    /// Change notifications; the receiver always holds the latest metrics.
    pub fn subscribe(&self) -> watch::Receiver<TripMetrics> {
        self.metrics_tx.subscribe()
    }

    pub fn route_snapshot(&self) -> Arc<[PositionFix]> {
        self.lock().route.current_route()
    }

    pub fn reset(&self) {
        let mut state = self.lock();
        state.aggregator.reset();
        state.route.reset();
        state.heading = None;
        self.publish(&state);
        info!("trip session reset");
    }

    /// Exports the route as it is right now on the tokio runtime. Ingestion
    /// keeps going meanwhile; later fixes are not part of this export. The
    /// returned handle can be used to cancel it. Must be called from within a
    /// tokio runtime.
    pub fn spawn_export(
        &self,
        exporter: Arc<RouteExporter>,
        consumer: Weak<dyn ExportConsumer>,
    ) -> JoinHandle<()> {
        let route = self.route_snapshot();
        tokio::spawn(async move {
            let result = exporter.export(&route).await;
            match consumer.upgrade() {
                Some(consumer) => consumer.on_export_finished(result),
                None => match result {
                    Ok(_) => info!("export finished but its consumer is gone"),
                    Err(e) => warn!("export failed and its consumer is gone: {}", e),
                },
            }
        })
    }
}
