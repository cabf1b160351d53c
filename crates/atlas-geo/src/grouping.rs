//! Co-location grouping
//!
//! Points are bucketed by coordinates rounded to [`COORDINATE_QUANTUM`]
//! degrees. Inside a bucket every entity gets a sibling index: how many
//! entities before it (ordered by ordinal, then input order) share its
//! rounded ordinal. The spiral placer uses the index to separate entities
//! that would otherwise land on the same spot.

use ahash::AHashMap;
use serde::Serialize;
use tracing::debug;

use crate::spiral::SpiralPlacer;
use crate::Located;

/// Coordinates closer than this (degrees) count as the same location
pub const COORDINATE_QUANTUM: f64 = 1e-4;

/// One entity's slot inside its location group
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Placement {
    /// Index of the entity in the input slice
    pub index: usize,
    pub ordinal: f64,
    pub sibling_index: u32,
}

/// Entities sharing a location
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LocatedGroup {
    pub lon: f64,
    pub lat: f64,
    /// Ordered by ordinal, then input order
    pub members: Vec<Placement>,
}

impl LocatedGroup {
    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Spiral positions of every member, as `(input index, (lon, lat))`
    pub fn place(&self, placer: &SpiralPlacer, zoom: f64) -> Vec<(usize, (f64, f64))> {
        self.members
            .iter()
            .map(|m| {
                let position = placer.offset(self.lon, self.lat, m.ordinal, zoom, m.sibling_index);
                (m.index, position)
            })
            .collect()
    }
}

fn quantize(value: f64) -> i64 {
    (value / COORDINATE_QUANTUM).round() as i64
}

/// Group `items` by location. Items without coordinates are skipped.
///
/// Groups come out in order of first appearance, so the result is
/// deterministic for a given input.
pub fn group_by_location<T, F>(items: &[T], ordinal: F) -> Vec<LocatedGroup>
where
    T: Located,
    F: Fn(&T) -> f64,
{
    let mut slots: AHashMap<(i64, i64), usize> = AHashMap::new();
    let mut groups: Vec<LocatedGroup> = Vec::new();

    for (index, item) in items.iter().enumerate() {
        let Some((lon, lat)) = item.coordinates() else {
            continue;
        };
        if !lon.is_finite() || !lat.is_finite() {
            continue;
        }

        let slot = *slots.entry((quantize(lon), quantize(lat))).or_insert_with(|| {
            groups.push(LocatedGroup {
                lon,
                lat,
                members: Vec::new(),
            });
            groups.len() - 1
        });

        groups[slot].members.push(Placement {
            index,
            ordinal: ordinal(item),
            sibling_index: 0,
        });
    }

    for group in &mut groups {
        group
            .members
            .sort_by(|a, b| a.ordinal.total_cmp(&b.ordinal).then(a.index.cmp(&b.index)));

        let mut seen: AHashMap<i64, u32> = AHashMap::new();
        for member in &mut group.members {
            let count = seen.entry(member.ordinal.round() as i64).or_insert(0);
            member.sibling_index = *count;
            *count += 1;
        }
    }

    debug!(items = items.len(), groups = groups.len(), "Grouped by location");
    groups
}
