use std::sync::Arc;

use crate::gps_processor::PositionFix;

/// Fixes recorded while moving, in arrival order. Readers get a snapshot so
/// appends never show up mid-iteration.
// TODO: no eviction or decimation yet, a very long trip grows without bound.
pub struct RouteTrack {
    points: Vec<PositionFix>,
    snapshot: Option<Arc<[PositionFix]>>,
}

impl RouteTrack {
    pub fn new() -> Self {
        RouteTrack {
            points: Vec::new(),
            snapshot: None,
        }
    }

    /// Returns whether the fix was appended.
    pub fn append_if_moving(&mut self, fix: PositionFix) -> bool {
        if !fix.is_moving() {
            return false;
        }
        self.points.push(fix);
        self.snapshot = None;
        true
    }

    pub fn current_route(&mut self) -> Arc<[PositionFix]> {
        self.snapshot
            .get_or_insert_with(|| Arc::from(self.points.as_slice()))
            .clone()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn reset(&mut self) {
        self.points.clear();
        self.snapshot = None;
    }
}
