//! Log output standing in for the charts and map

use std::sync::atomic::{AtomicUsize, Ordering};

use atlas_core::{PlaybackState, Viewport, ViewportSubscriber, Year};
use atlas_data::{Histogram, LayerEntity, Person};
use atlas_geo::{compute_bounds, group_by_location, Located, SpiralPlacer};
use tracing::{debug, info};

/// Logs every viewport change
#[derive(Default)]
pub struct ViewportLog {
    changes: AtomicUsize,
}

impl ViewportLog {
    pub fn changes(&self) -> usize {
        self.changes.load(Ordering::Relaxed)
    }
}

impl ViewportSubscriber for ViewportLog {
    fn on_viewport_change(&self, viewport: &Viewport, playback: PlaybackState) {
        self.changes.fetch_add(1, Ordering::Relaxed);
        debug!(
            year = viewport.selected_year,
            window = %viewport.window_range,
            full = %viewport.full_range,
            ?playback,
            "Viewport changed"
        );
    }
}

/// One line per bin, scaled against the tallest bin
pub fn log_histogram(layer: &str, histogram: &Histogram) {
    if histogram.is_empty() {
        info!(layer, "No data in window");
        return;
    }

    info!(
        layer,
        bins = histogram.bins.len(),
        bin_width = histogram.bin_width,
        max = histogram.max_value,
        "Histogram"
    );
    for bin in &histogram.bins {
        let bar = bar_length(bin.value, histogram.max_value);
        info!(layer, "{:>6}..{:<6} {:>8.1} {}", bin.start, bin.end, bin.value, "#".repeat(bar));
    }
}

fn bar_length(value: f64, max_value: f64) -> usize {
    const WIDTH: f64 = 40.0;
    if max_value <= 0.0 {
        return 0;
    }
    (value / max_value * WIDTH).round() as usize
}

/// Spiral placement of the people alive at `year`, framed like the map would be
pub fn log_person_placements(people: &[Person], year: Year, placer: &SpiralPlacer) {
    let bounds = compute_bounds(people.iter().filter_map(Located::coordinates), false);
    let groups = group_by_location(people, |person| person.age_at(year).unwrap_or(0) as f64);

    info!(
        layer = Person::KIND.name(),
        year,
        locations = groups.len(),
        zoom = bounds.zoom,
        "Placing people"
    );
    for group in groups.iter().filter(|group| group.len() > 1) {
        for (index, (lon, lat)) in group.place(placer, bounds.zoom) {
            debug!(
                name = %people[index].name,
                base_lon = group.lon,
                base_lat = group.lat,
                lon,
                lat,
                "Placed"
            );
        }
    }
}
