//! Map placement for the atlas engine
//!
//! Entities often share a coordinate (everyone born in Paris sits on the same
//! point). The placers here fan such points out deterministically so each one
//! stays visible and clickable, and [`compute_bounds`] picks a camera that
//! frames a set of points.

pub mod bounds;
pub mod circular;
pub mod grouping;
pub mod spiral;

pub use bounds::{compute_bounds, MapBounds};
pub use circular::offset_circular;
pub use grouping::{group_by_location, LocatedGroup, Placement};
pub use spiral::SpiralPlacer;

/// Anything with an optional `(lon, lat)` position
pub trait Located {
    fn coordinates(&self) -> Option<(f64, f64)>;
}

impl Located for (f64, f64) {
    fn coordinates(&self) -> Option<(f64, f64)> {
        Some(*self)
    }
}
