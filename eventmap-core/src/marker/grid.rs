//! In-memory clustering surface.
//!
//! Markers are projected to web-mercator pixels at the current zoom (256 px
//! tiles) and grouped greedily: each marker joins the first cluster whose seed
//! lies within the cluster radius, otherwise it seeds a new one. A cluster of
//! one is just a marker. Spiderfying a cluster shows its members individually
//! until the next reclustering.

use std::collections::{BTreeMap, HashMap};
use std::f64::consts::PI;

use crate::bounds::{Bounds, LatLng};
use crate::constants::{DEFAULT_CLUSTER_RADIUS_PX, MAX_ZOOM};
use crate::event::EventId;
use crate::marker::surface::{ClusterId, MapSurface, MarkerSpec};

const TILE_SIZE: f64 = 256.0;
const MAX_LATITUDE: f64 = 85.051_128_78;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GridMarker(u64);

/// A cluster of two or more markers.
#[derive(Debug, Clone, PartialEq)]
pub struct Cluster {
    pub id: ClusterId,
    pub center: LatLng,
    pub members: Vec<EventId>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Pixel {
    x: f64,
    y: f64,
}

fn world_size(zoom: u8) -> f64 {
    TILE_SIZE * 2f64.powi(i32::from(zoom))
}

fn project(point: LatLng, zoom: u8) -> Pixel {
    let size = world_size(zoom);
    let lat = point.lat.clamp(-MAX_LATITUDE, MAX_LATITUDE).to_radians();
    Pixel {
        x: (point.lng + 180.0) / 360.0 * size,
        y: (1.0 - (lat.tan() + 1.0 / lat.cos()).ln() / PI) / 2.0 * size,
    }
}

fn unproject(pixel: Pixel, zoom: u8) -> LatLng {
    let size = world_size(zoom);
    let n = PI * (1.0 - 2.0 * pixel.y / size);
    LatLng {
        lat: n.sinh().atan().to_degrees(),
        lng: pixel.x / size * 360.0 - 180.0,
    }
}

pub struct GridClusterSurface {
    markers: BTreeMap<GridMarker, MarkerSpec>,
    next_marker: u64,
    center: LatLng,
    zoom: u8,
    radius_px: f64,
    clusters: Vec<Cluster>,
    membership: HashMap<GridMarker, ClusterId>,
    spiderfied: Option<ClusterId>,
    popup: Option<GridMarker>,
    next_cluster: u64,
}

impl GridClusterSurface {
    pub fn new(center: LatLng, zoom: u8) -> Self {
        GridClusterSurface {
            markers: BTreeMap::new(),
            next_marker: 0,
            center,
            zoom: zoom.min(MAX_ZOOM),
            radius_px: DEFAULT_CLUSTER_RADIUS_PX,
            clusters: Vec::new(),
            membership: HashMap::new(),
            spiderfied: None,
            popup: None,
            next_cluster: 0,
        }
    }

    pub fn with_radius(mut self, radius_px: f64) -> Self {
        self.radius_px = radius_px;
        self
    }

    pub fn center(&self) -> LatLng {
        self.center
    }

    pub fn zoom(&self) -> u8 {
        self.zoom
    }

    pub fn marker_count(&self) -> usize {
        self.markers.len()
    }

    pub fn clusters(&self) -> &[Cluster] {
        &self.clusters
    }

    pub fn spiderfied(&self) -> Option<ClusterId> {
        self.spiderfied
    }

    pub fn spec(&self, marker: GridMarker) -> Option<&MarkerSpec> {
        self.markers.get(&marker)
    }

    /// Markers drawn on their own (not hidden in a cluster).
    pub fn standalone(&self) -> impl Iterator<Item = &MarkerSpec> {
        self.markers
            .iter()
            .filter(|(m, _)| self.visible_parent(m).is_none())
            .map(|(_, spec)| spec)
    }

    /// Event whose popup is open.
    pub fn open_popup_event(&self) -> Option<&EventId> {
        self.popup
            .and_then(|m| self.markers.get(&m))
            .map(|spec| &spec.event_id)
    }

    /// Geographic area visible in a viewport of the given pixel size.
    pub fn visible_bounds(&self, width_px: u32, height_px: u32) -> Bounds {
        let c = project(self.center, self.zoom);
        let half_w = f64::from(width_px) / 2.0;
        let half_h = f64::from(height_px) / 2.0;
        let north_west = unproject(
            Pixel {
                x: c.x - half_w,
                y: c.y - half_h,
            },
            self.zoom,
        );
        let south_east = unproject(
            Pixel {
                x: c.x + half_w,
                y: c.y + half_h,
            },
            self.zoom,
        );
        Bounds {
            north: north_west.lat,
            south: south_east.lat,
            east: south_east.lng,
            west: north_west.lng,
        }
    }

    fn recluster(&mut self) {
        self.clusters.clear();
        self.membership.clear();
        self.spiderfied = None;

        struct Group {
            seed: Pixel,
            members: Vec<GridMarker>,
        }

        let mut groups: Vec<Group> = Vec::new();
        for (marker, spec) in &self.markers {
            let px = project(spec.position, self.zoom);
            let home = groups.iter_mut().find(|g| {
                let dx = g.seed.x - px.x;
                let dy = g.seed.y - px.y;
                (dx * dx + dy * dy).sqrt() <= self.radius_px
            });
            match home {
                Some(group) => group.members.push(*marker),
                None => groups.push(Group {
                    seed: px,
                    members: vec![*marker],
                }),
            }
        }

        for group in groups.into_iter().filter(|g| g.members.len() > 1) {
            self.next_cluster += 1;
            let id = ClusterId(self.next_cluster);

            let count = group.members.len() as f64;
            let (lat_sum, lng_sum) = group
                .members
                .iter()
                .filter_map(|m| self.markers.get(m))
                .fold((0.0, 0.0), |(lat, lng), s| {
                    (lat + s.position.lat, lng + s.position.lng)
                });

            let members = group
                .members
                .iter()
                .filter_map(|m| {
                    self.membership.insert(*m, id);
                    self.markers.get(m).map(|s| s.event_id.clone())
                })
                .collect();

            self.clusters.push(Cluster {
                id,
                center: LatLng {
                    lat: lat_sum / count,
                    lng: lng_sum / count,
                },
                members,
            });
        }
    }
}

impl MapSurface for GridClusterSurface {
    type Marker = GridMarker;

    fn add_marker(&mut self, spec: MarkerSpec) -> GridMarker {
        self.next_marker += 1;
        let marker = GridMarker(self.next_marker);
        self.markers.insert(marker, spec);
        marker
    }

    fn remove_marker(&mut self, marker: GridMarker) {
        self.markers.remove(&marker);
        self.membership.remove(&marker);
        if self.popup == Some(marker) {
            self.popup = None;
        }
    }

    fn refresh_clusters(&mut self) {
        self.recluster();
    }

    fn set_view(&mut self, center: LatLng, zoom: u8) {
        self.center = center;
        self.zoom = zoom.min(MAX_ZOOM);
        self.popup = None;
        self.recluster();
    }

    fn visible_parent(&self, marker: &GridMarker) -> Option<ClusterId> {
        let cluster = self.membership.get(marker).copied()?;
        if self.spiderfied == Some(cluster) {
            return None;
        }
        Some(cluster)
    }

    fn spiderfy(&mut self, cluster: ClusterId) {
        if self.clusters.iter().any(|c| c.id == cluster) {
            self.spiderfied = Some(cluster);
        }
    }

    fn open_popup(&mut self, marker: &GridMarker) {
        if self.markers.contains_key(marker) {
            self.popup = Some(*marker);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::marker::style::{MarkerStyle, Recency};
    use crate::marker::surface::PopupContent;
    use crate::testing::at;

    fn spec(id: &str, lat: f64, lng: f64) -> MarkerSpec {
        MarkerSpec {
            event_id: EventId::from(id),
            position: LatLng::new(lat, lng),
            style: MarkerStyle::for_recency(Recency::Soon),
            saved: false,
            popup: PopupContent {
                title: id.to_string(),
                address: String::new(),
                starts_at: at(2025, 1, 1, 0, 0),
                banner_url: None,
                is_past: false,
            },
        }
    }

    #[test]
    fn test_projection_round_trips() {
        let point = LatLng::new(10.776, 106.700);
        let back = unproject(project(point, 13), 13);
        assert!((back.lat - point.lat).abs() < 1e-9);
        assert!((back.lng - point.lng).abs() < 1e-9);
    }

    #[test]
    fn test_nearby_markers_cluster_at_low_zoom_only() {
        let mut surface = GridClusterSurface::new(LatLng::new(10.776, 106.7), 10);
        let a = surface.add_marker(spec("a", 10.776, 106.700));
        let b = surface.add_marker(spec("b", 10.780, 106.705));
        let far = surface.add_marker(spec("far", 21.028, 105.834));
        surface.refresh_clusters();

        assert_eq!(surface.clusters().len(), 1);
        let cluster = surface.visible_parent(&a).unwrap();
        assert_eq!(surface.visible_parent(&b), Some(cluster));
        assert_eq!(surface.visible_parent(&far), None);

        surface.set_view(LatLng::new(10.776, 106.7), 18);
        assert!(surface.clusters().is_empty());
        assert_eq!(surface.visible_parent(&a), None);
    }

    #[test]
    fn test_spiderfy_reveals_members_until_recluster() {
        let mut surface = GridClusterSurface::new(LatLng::new(10.776, 106.7), 18);
        let a = surface.add_marker(spec("a", 10.776_000, 106.700_000));
        let b = surface.add_marker(spec("b", 10.776_001, 106.700_001));
        surface.refresh_clusters();

        let cluster = surface.visible_parent(&a).unwrap();
        surface.spiderfy(cluster);
        assert_eq!(surface.visible_parent(&a), None);
        assert_eq!(surface.visible_parent(&b), None);

        surface.refresh_clusters();
        assert!(surface.visible_parent(&a).is_some());
    }

    #[test]
    fn test_popup_tracks_marker_lifetime() {
        let mut surface = GridClusterSurface::new(LatLng::new(10.776, 106.7), 13);
        let a = surface.add_marker(spec("a", 10.776, 106.7));
        surface.open_popup(&a);
        assert_eq!(surface.open_popup_event(), Some(&EventId::from("a")));

        surface.remove_marker(a);
        assert_eq!(surface.open_popup_event(), None);
    }

    #[test]
    fn test_visible_bounds_contain_center() {
        let surface = GridClusterSurface::new(LatLng::new(10.776, 106.7), 13);
        let bounds = surface.visible_bounds(1024, 768);

        assert!(bounds.contains_point(surface.center()));
        assert!(bounds.north > bounds.south);
        assert!(bounds.east > bounds.west);
        // 1024 px at zoom 13 is 1024 / 2^21 of the world width
        let expected_lng_span = 1024.0 / world_size(13) * 360.0;
        assert!((bounds.lng_span() - expected_lng_span).abs() < 1e-9);
    }
}
