use atlas_core::settings::SpiralSettings;

/// Spiral de-collision of co-located points.
///
/// Each point moves away from its base coordinate along an Archimedean
/// spiral: the angle and the radius both grow with the ordinal (an age or an
/// index). Points that share an ordinal are told apart by a small angular
/// nudge per sibling. The radius halves for every zoom level above the
/// reference zoom so the fan keeps a constant size on screen.
#[derive(Debug, Clone, Default)]
pub struct SpiralPlacer {
    settings: SpiralSettings,
}

impl SpiralPlacer {
    pub fn new(settings: SpiralSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &SpiralSettings {
        &self.settings
    }

    /// Offset position of `(lon, lat)` for the given ordinal. Negative ordinals are treated as 0.
    pub fn offset(
        &self,
        lon: f64,
        lat: f64,
        ordinal: f64,
        zoom: f64,
        sibling_index: u32,
    ) -> (f64, f64) {
        let (dx, dy) = self.displacement(ordinal, zoom, sibling_index);
        (lon + dx, lat + dy)
    }

    /// Distance from the base point for `ordinal` at `zoom`
    pub fn radius(&self, ordinal: f64, zoom: f64) -> f64 {
        let scale = (self.settings.reference_zoom - zoom).exp2();
        self.settings.radius_step * ordinal.max(0.0) * scale
    }

    fn displacement(&self, ordinal: f64, zoom: f64, sibling_index: u32) -> (f64, f64) {
        let step = self.settings.angular_step;
        let ordinal = ordinal.max(0.0);
        let sibling_turn = f64::from(sibling_index) * step / self.settings.sibling_divisor;
        let angle = ordinal * step - sibling_turn;
        let radius = self.radius(ordinal, zoom);
        (radius * angle.cos(), radius * angle.sin())
    }
}
