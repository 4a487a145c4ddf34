//! The currently displayed markers.
//!
//! Markers are kept in insertion order with no uniqueness key; duplicate cities are
//! legal and each one is drawn.

use crate::map::cluster::{ClusterPolicy, MapItem};
use crate::map::marker::{create_marker, RenderedMarker};
use crate::models::LocationRecord;
use rayon::prelude::*;
use tracing::{debug, warn};

/// Owns the rendered markers and the clustering policy used to draw them.
#[derive(Debug, Clone, Default)]
pub struct MarkerSet {
    markers: Vec<RenderedMarker>,
    policy: ClusterPolicy,
}

impl MarkerSet {
    pub fn new(policy: ClusterPolicy) -> Self {
        Self {
            markers: Vec::new(),
            policy,
        }
    }

    /// Replaces every displayed marker with markers built from `records`.
    ///
    /// Records the factory rejects are dropped; the rest of the batch is still shown.
    /// Returns the number of markers now displayed.
    pub fn replace_all(&mut self, records: &[LocationRecord]) -> usize {
        self.clear();
        let built: Vec<RenderedMarker> = records.par_iter().filter_map(create_marker).collect();
        let dropped = records.len() - built.len();
        if dropped > 0 {
            warn!("Dropped {} record(s) that could not be placed on the map", dropped);
        }
        self.markers = built;
        debug!("Marker set now holds {} marker(s)", self.markers.len());
        self.markers.len()
    }

    /// Removes every marker. The records they were built from are not touched.
    pub fn clear(&mut self) {
        self.markers.clear();
    }

    pub fn markers(&self) -> &[RenderedMarker] {
        &self.markers
    }

    pub fn len(&self) -> usize {
        self.markers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }

    /// Items to draw at `zoom`.
    pub fn items(&self, zoom: u8) -> Vec<MapItem> {
        self.policy.group(&self.markers, zoom)
    }
}
