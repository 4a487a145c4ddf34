//! Grid clustering of markers in Web Mercator pixel space.
//!
//! Below `disable_at_zoom`, markers whose projected positions share a grid cell of
//! `radius_px` collapse into one count badge. At or above it every marker is drawn
//! on its own.

use crate::map::marker::{LatLng, RenderedMarker};
use std::collections::HashMap;
use std::f64::consts::PI;

const TILE_SIZE: f64 = 256.0;
const MAX_LATITUDE: f64 = 85.051_128_78;

/// Clustering knobs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClusterPolicy {
    pub radius_px: f64,
    pub disable_at_zoom: u8,
}

impl Default for ClusterPolicy {
    fn default() -> Self {
        Self {
            radius_px: 40.0,
            disable_at_zoom: 10,
        }
    }
}

/// What the map draws: a lone marker, or a badge standing for several.
#[derive(Debug, Clone, PartialEq)]
pub enum MapItem {
    /// Index into the marker set.
    Single(usize),
    Cluster {
        center: LatLng,
        /// Indices into the marker set, in insertion order.
        members: Vec<usize>,
    },
}

impl MapItem {
    pub fn count(&self) -> usize {
        match self {
            MapItem::Single(_) => 1,
            MapItem::Cluster { members, .. } => members.len(),
        }
    }
}

/// Projects a position to global pixel coordinates at `zoom`.
pub fn project(position: LatLng, zoom: u8) -> (f64, f64) {
    let scale = TILE_SIZE * 2f64.powi(i32::from(zoom));
    let lat = position.lat.clamp(-MAX_LATITUDE, MAX_LATITUDE).to_radians();
    let x = (position.lng + 180.0) / 360.0 * scale;
    let y = (1.0 - (lat.tan() + 1.0 / lat.cos()).ln() / PI) / 2.0 * scale;
    (x, y)
}

impl ClusterPolicy {
    pub fn clusters_at(&self, zoom: u8) -> bool {
        zoom < self.disable_at_zoom
    }

    /// Groups markers for display at `zoom`. Output order follows the first member
    /// of each group, so identical input yields identical output.
    pub fn group(&self, markers: &[RenderedMarker], zoom: u8) -> Vec<MapItem> {
        if !self.clusters_at(zoom) || self.radius_px <= 0.0 {
            return (0..markers.len()).map(MapItem::Single).collect();
        }

        let mut order: Vec<(i64, i64)> = Vec::new();
        let mut cells: HashMap<(i64, i64), Vec<usize>> = HashMap::new();
        for (index, marker) in markers.iter().enumerate() {
            let (x, y) = project(marker.position, zoom);
            let key = (
                (x / self.radius_px).floor() as i64,
                (y / self.radius_px).floor() as i64,
            );
            cells
                .entry(key)
                .or_insert_with(|| {
                    order.push(key);
                    Vec::new()
                })
                .push(index);
        }

        order
            .into_iter()
            .filter_map(|key| cells.remove(&key))
            .map(|members| {
                if members.len() == 1 {
                    return MapItem::Single(members[0]);
                }
                let n = members.len() as f64;
                let (lat, lng) = members.iter().fold((0.0, 0.0), |(lat, lng), &i| {
                    (lat + markers[i].position.lat, lng + markers[i].position.lng)
                });
                MapItem::Cluster {
                    center: LatLng::new(lat / n, lng / n),
                    members,
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::marker::create_marker;
    use crate::models::LocationRecord;

    fn marker(city: &str, lat: f64, lng: f64) -> RenderedMarker {
        create_marker(&LocationRecord::new(city, "India", "Asia", lat, lng, 80.0)).unwrap()
    }

    #[test]
    fn test_project_origin_is_map_center() {
        let (x, y) = project(LatLng::new(0.0, 0.0), 0);
        assert!((x - 128.0).abs() < 1e-9);
        assert!((y - 128.0).abs() < 1e-9);
    }

    #[test]
    fn test_nearby_markers_cluster_at_low_zoom() {
        let markers = vec![
            marker("Delhi", 28.61, 77.20),
            marker("Noida", 28.53, 77.39),
            marker("Chennai", 13.08, 80.27),
        ];
        let items = ClusterPolicy::default().group(&markers, 4);
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].count(), 2);
        assert_eq!(items[1], MapItem::Single(2));
        assert_eq!(items.iter().map(MapItem::count).sum::<usize>(), 3);
    }

    #[test]
    fn test_no_clustering_at_or_above_threshold() {
        let markers = vec![marker("Delhi", 28.61, 77.20), marker("Delhi", 28.61, 77.20)];
        let items = ClusterPolicy::default().group(&markers, 10);
        assert_eq!(items, vec![MapItem::Single(0), MapItem::Single(1)]);
    }

    #[test]
    fn test_duplicates_collapse_into_cluster_below_threshold() {
        let markers = vec![marker("Delhi", 28.61, 77.20), marker("Delhi", 28.61, 77.20)];
        let items = ClusterPolicy::default().group(&markers, 9);
        match &items[..] {
            [MapItem::Cluster { center, members }] => {
                assert_eq!(members, &vec![0, 1]);
                assert!((center.lat - 28.61).abs() < 1e-9);
            },
            other => panic!("expected one cluster, got {:?}", other),
        }
    }

    #[test]
    fn test_grouping_is_deterministic() {
        let markers = vec![
            marker("Delhi", 28.61, 77.20),
            marker("Mumbai", 19.07, 72.87),
            marker("Noida", 28.53, 77.39),
        ];
        let policy = ClusterPolicy::default();
        assert_eq!(policy.group(&markers, 3), policy.group(&markers, 3));
    }
}
