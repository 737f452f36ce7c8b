//! Two-point route map specification
//!
//! The renderer produces a deck.gl-style description (a point layer, a path
//! layer and an initial view) that the form page draws client-side.

use crate::models::Coordinates;
use serde::Serialize;

const POINT_RADIUS: u32 = 50_000;
const POINT_COLOR: [u8; 4] = [200, 30, 0, 160];
const PATH_WIDTH: u32 = 1_000;
const PATH_COLOR: [u8; 4] = [100, 100, 100, 100];
const PATH_MIN_WIDTH_PIXELS: u32 = 2;
const ZOOM: f64 = 4.0;
const PITCH: f64 = 45.0;

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct MapPoint {
    pub name: String,
    pub lat: f64,
    pub lon: f64,
}

/// A path as `[lon, lat]` pairs
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct MapPath {
    pub path: Vec<[f64; 2]>,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
#[serde(tag = "type")]
pub enum MapLayer {
    ScatterplotLayer {
        data: Vec<MapPoint>,
        get_radius: u32,
        get_color: [u8; 4],
        pickable: bool,
    },
    PathLayer {
        data: Vec<MapPath>,
        get_width: u32,
        get_color: [u8; 4],
        width_min_pixels: u32,
    },
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct ViewState {
    pub latitude: f64,
    pub longitude: f64,
    pub zoom: f64,
    pub pitch: f64,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct MapView {
    pub layers: Vec<MapLayer>,
    pub initial_view_state: ViewState,
    /// Tooltip template; `{name}` is replaced by the hovered point's name
    pub tooltip: String,
    /// Straight-line distance between the two points
    pub distance_km: f64,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct MapRenderer;

impl MapRenderer {
    /// Build the map for a source/destination pair.
    ///
    /// Returns `None` when either point could not be located; the caller
    /// tells the user the map was skipped.
    #[must_use]
    pub fn render(
        &self,
        source: (&str, Option<Coordinates>),
        destination: (&str, Option<Coordinates>),
    ) -> Option<MapView> {
        let (source_name, Some(from)) = source else {
            return None;
        };
        let (destination_name, Some(to)) = destination else {
            return None;
        };

        let center = from.midpoint(&to);

        let points = vec![
            MapPoint {
                name: source_name.to_string(),
                lat: from.latitude,
                lon: from.longitude,
            },
            MapPoint {
                name: destination_name.to_string(),
                lat: to.latitude,
                lon: to.longitude,
            },
        ];

        let layers = vec![
            MapLayer::ScatterplotLayer {
                data: points,
                get_radius: POINT_RADIUS,
                get_color: POINT_COLOR,
                pickable: true,
            },
            MapLayer::PathLayer {
                data: vec![MapPath {
                    path: vec![[from.longitude, from.latitude], [to.longitude, to.latitude]],
                }],
                get_width: PATH_WIDTH,
                get_color: PATH_COLOR,
                width_min_pixels: PATH_MIN_WIDTH_PIXELS,
            },
        ];

        Some(MapView {
            layers,
            initial_view_state: ViewState {
                latitude: center.latitude,
                longitude: center.longitude,
                zoom: ZOOM,
                pitch: PITCH,
            },
            tooltip: "{name}".to_string(),
            distance_km: from.distance_km(&to),
        })
    }
}
