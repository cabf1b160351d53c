use std::f64::consts::TAU;

const MAX_RING_RADIUS: f64 = 0.5;
const SPREAD: f64 = 0.1;

/// Place point `index` of `total` evenly around a ring centred on `(lon, lat)`.
///
/// The ring shrinks as more points share the centre. `total` of 0 is treated as 1.
pub fn offset_circular(lon: f64, lat: f64, index: usize, total: usize) -> (f64, f64) {
    let total = total.max(1) as f64;
    let angle = index as f64 / total * TAU;
    let radius = MAX_RING_RADIUS.min(0.1 + 0.3 / total.sqrt()) * SPREAD;
    (lon + radius * angle.cos(), lat + radius * angle.sin())
}
