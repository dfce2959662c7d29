use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use tripmeter_core::gps_processor::PositionFix;
use tripmeter_core::route_exporter::{
    MapSnapshotter, PlainSnapshotter, SnapshotFuture, SnapshotRequest,
};

pub const START_TIMESTAMP_SEC: i64 = 1697349116;

pub fn timestamp(offset_sec: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(START_TIMESTAMP_SEC + offset_sec, 0).unwrap()
}

pub fn fix(latitude: f64, longitude: f64, speed: f64, offset_sec: i64) -> PositionFix {
    PositionFix::new(latitude, longitude, speed, timestamp(offset_sec))
}

/// A drive heading east along a parallel, one fix per second.
pub fn drive_east(count: usize, speed: f64) -> Vec<PositionFix> {
    (0..count)
        .map(|i| fix(30.2719716, 120.163856 + i as f64 * 0.0001, speed, i as i64))
        .collect()
}

pub fn sha256_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    format!("{:x}", hasher.finalize())
}

pub struct FailingSnapshotter;

impl MapSnapshotter for FailingSnapshotter {
    fn snapshot(&self, _request: SnapshotRequest) -> SnapshotFuture {
        Box::pin(async { Err(anyhow::anyhow!("map tiles unavailable")) })
    }
}

/// Wraps `PlainSnapshotter` and remembers what it was asked for.
pub struct RecordingSnapshotter {
    inner: PlainSnapshotter,
    calls: AtomicUsize,
    last_request: Mutex<Option<SnapshotRequest>>,
}

impl RecordingSnapshotter {
    pub fn new() -> Arc<Self> {
        Arc::new(RecordingSnapshotter {
            inner: PlainSnapshotter::new(),
            calls: AtomicUsize::new(0),
            last_request: Mutex::new(None),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Option<SnapshotRequest> {
        self.last_request.lock().unwrap().clone()
    }
}

impl MapSnapshotter for RecordingSnapshotter {
    fn snapshot(&self, request: SnapshotRequest) -> SnapshotFuture {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_request.lock().unwrap() = Some(request.clone());
        self.inner.snapshot(request)
    }
}
