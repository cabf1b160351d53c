use serde::{Deserialize, Serialize};

/// Camera framing a set of points
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MapBounds {
    pub center_lon: f64,
    pub center_lat: f64,
    pub zoom: f64,
}

impl Default for MapBounds {
    fn default() -> Self {
        Self {
            center_lon: 0.0,
            center_lat: 0.0,
            zoom: 1.0,
        }
    }
}

/// Extent above which the whole world is shown
const WORLD_EXTENT: f64 = 220.0;

const WORLD_VIEW: MapBounds = MapBounds {
    center_lon: 6.0,
    center_lat: 4.0,
    zoom: 1.5,
};

/// (exclusive lower bound on the extent in degrees, zoom)
const ZOOM_STEPS: [(f64, f64); 7] = [
    (150.0, 1.7),
    (80.0, 2.5),
    (30.0, 3.0),
    (15.0, 4.0),
    (8.0, 4.6),
    (4.0, 5.2),
    (3.0, 5.7),
];

const CLOSEST_ZOOM: f64 = 7.0;

/// Detail mode leaves room for a side panel by moving the centre west
const DETAIL_SHIFT: f64 = 40.0;
const DETAIL_WORLD_SHIFT: f64 = 55.0;

/// Centre and zoom that frame `points` (`(lon, lat)` pairs).
///
/// The zoom is picked from the larger of the longitude and latitude extents.
/// No points yields the default `(0, 0)` at zoom 1.
pub fn compute_bounds(
    points: impl IntoIterator<Item = (f64, f64)>,
    detail_mode: bool,
) -> MapBounds {
    let mut extent: Option<(f64, f64, f64, f64)> = None;
    for (lon, lat) in points {
        extent = Some(match extent {
            None => (lon, lon, lat, lat),
            Some((min_lon, max_lon, min_lat, max_lat)) => {
                (min_lon.min(lon), max_lon.max(lon), min_lat.min(lat), max_lat.max(lat))
            }
        });
    }

    let Some((min_lon, max_lon, min_lat, max_lat)) = extent else {
        return MapBounds::default();
    };

    let max_diff = (max_lon - min_lon).max(max_lat - min_lat);
    if max_diff > WORLD_EXTENT {
        let mut world = WORLD_VIEW;
        if detail_mode {
            world.center_lon -= DETAIL_WORLD_SHIFT;
        }
        return world;
    }

    let zoom = ZOOM_STEPS
        .iter()
        .find(|(above, _)| max_diff > *above)
        .map_or(CLOSEST_ZOOM, |(_, zoom)| *zoom);

    let shift = if detail_mode { DETAIL_SHIFT / zoom } else { 0.0 };
    MapBounds {
        center_lon: (min_lon + max_lon) / 2.0 - shift,
        center_lat: (min_lat + max_lat) / 2.0,
        zoom,
    }
}
