//! The viewport value and its pure transitions

use serde::{Deserialize, Serialize};

use crate::timeline::{Year, YearRange};

/// The triad every view reads from.
///
/// Invariants, restored by every transition: `window_range` lies inside
/// `full_range` and `selected_year` lies inside `window_range`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    pub full_range: YearRange,
    pub window_range: YearRange,
    pub selected_year: Year,
}

impl Viewport {
    /// Viewport showing all of `full_range` with the first year selected
    pub fn new(full_range: YearRange) -> Self {
        Self {
            full_range,
            window_range: full_range,
            selected_year: full_range.min,
        }
    }

    /// Build a viewport from loose parts, restoring the invariants
    pub fn from_parts(full_range: YearRange, window_range: YearRange, selected_year: Year) -> Self {
        let window_range = window_range.clamp_into(&full_range);
        Self {
            full_range,
            window_range,
            selected_year: window_range.clamp_year(selected_year),
        }
    }

    /// Whether both invariants hold
    pub fn is_consistent(&self) -> bool {
        self.full_range.contains_range(&self.window_range)
            && self.window_range.contains(self.selected_year)
    }

    /// Replace the full range, re-clamping window and selected year into it
    pub fn with_full_range(self, full_range: YearRange) -> Self {
        Self::from_parts(full_range, self.window_range, self.selected_year)
    }

    /// Replace the window, clamped into the full range
    pub fn with_window(self, window_range: YearRange) -> Self {
        Self::from_parts(self.full_range, window_range, self.selected_year)
    }

    /// Select a year, clamped into the window
    pub fn with_selected_year(self, year: Year) -> Self {
        Self {
            selected_year: self.window_range.clamp_year(year),
            ..self
        }
    }

    /// Scale the window around `anchor_year`.
    ///
    /// The new width is `width * scale_factor` bounded by `min_window_years`
    /// and the full span; the anchor keeps its fractional position inside the
    /// window. Non-positive or non-finite factors leave the viewport untouched.
    pub fn zoomed(self, anchor_year: f64, scale_factor: f64, min_window_years: Year) -> Self {
        if !scale_factor.is_finite() || scale_factor <= 0.0 || !anchor_year.is_finite() {
            return self;
        }

        let full_span = self.full_range.span() as f64;
        let width = self.window_range.span() as f64;
        let min_width = (min_window_years.max(0) as f64).min(full_span);
        let new_width = (width * scale_factor).clamp(min_width, full_span);

        let anchor_t = if width > 0.0 {
            ((anchor_year - self.window_range.min as f64) / width).clamp(0.0, 1.0)
        } else {
            0.5
        };
        let start = anchor_year - anchor_t * new_width;

        let start = start.round() as i64;
        let window = range_from_start(start, new_width.round() as i64);
        self.with_fitted_window(window)
    }

    /// Shift the window by `delta_years`, stopping at the full range edges
    pub fn panned(self, delta_years: f64) -> Self {
        if !delta_years.is_finite() {
            return self;
        }
        let delta = delta_years.round() as i64;
        let start = (self.window_range.min as i64).saturating_add(delta);
        let window = range_from_start(start, self.window_range.span());
        self.with_fitted_window(window)
    }

    /// Set an absolute window width, centered on the current window.
    ///
    /// If the selected year would fall outside, the window centers on the
    /// selected year instead.
    pub fn with_window_width(self, width: i64) -> Self {
        let width = width.clamp(0, self.full_range.span());
        let around_mid = centered(self.window_range.midpoint(), width).fit_into(&self.full_range);

        let window = if around_mid.contains(self.selected_year) {
            around_mid
        } else {
            centered(self.selected_year, width).fit_into(&self.full_range)
        };
        self.with_fitted_window(window)
    }

    fn with_fitted_window(self, window: YearRange) -> Self {
        let window_range = window.fit_into(&self.full_range);
        Self {
            window_range,
            selected_year: window_range.clamp_year(self.selected_year),
            ..self
        }
    }
}

const YEAR_SPAN: i64 = Year::MAX as i64 - Year::MIN as i64;

/// Range of `width` years starting at `start`, slid back into representable years
fn range_from_start(start: i64, width: i64) -> YearRange {
    let width = width.clamp(0, YEAR_SPAN);
    let start = start.clamp(Year::MIN as i64, Year::MAX as i64 - width);
    YearRange::new(start as Year, (start + width) as Year)
}

fn centered(center: Year, width: i64) -> YearRange {
    range_from_start(center as i64 - width / 2, width)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn viewport(full: (Year, Year), window: (Year, Year), year: Year) -> Viewport {
        Viewport::from_parts(full.into(), window.into(), year)
    }

    #[test]
    fn test_full_range_change_reclamps_window_and_year() {
        let vp = viewport((1500, 2000), (1800, 1900), 1890);
        let vp = vp.with_full_range(YearRange::new(1700, 1850));
        assert_eq!(vp.window_range, YearRange::new(1800, 1850));
        assert_eq!(vp.selected_year, 1850);
        assert!(vp.is_consistent());
    }

    #[test]
    fn test_full_range_disjoint_resets_window() {
        let vp = viewport((1500, 2000), (1800, 1900), 1850);
        let vp = vp.with_full_range(YearRange::new(-500, -400));
        assert_eq!(vp.window_range, YearRange::new(-500, -400));
        assert_eq!(vp.selected_year, -400);
    }

    #[test]
    fn test_zoom_keeps_anchor_fraction() {
        let vp = viewport((1500, 2000), (1800, 1900), 1850);
        let zoomed = vp.zoomed(1850.0, 0.5, 10);
        assert_eq!(zoomed.window_range, YearRange::new(1825, 1875));

        let zoomed = vp.zoomed(1800.0, 0.5, 10);
        assert_eq!(zoomed.window_range, YearRange::new(1800, 1850));
    }

    #[test]
    fn test_zoom_respects_min_and_full_span() {
        let vp = viewport((1500, 2000), (1800, 1900), 1850);
        assert_eq!(vp.zoomed(1850.0, 0.01, 10).window_range.span(), 10);
        assert_eq!(vp.zoomed(1850.0, 100.0, 10).window_range, YearRange::new(1500, 2000));
    }

    #[test]
    fn test_zoom_out_near_edge_is_translated_inside() {
        let vp = viewport((1500, 2000), (1900, 2000), 1950);
        let zoomed = vp.zoomed(2000.0, 2.0, 10);
        assert_eq!(zoomed.window_range, YearRange::new(1800, 2000));
    }

    #[test]
    fn test_zoom_ignores_invalid_factor() {
        let vp = viewport((1500, 2000), (1800, 1900), 1850);
        assert_eq!(vp.zoomed(1850.0, 0.0, 10), vp);
        assert_eq!(vp.zoomed(1850.0, f64::NAN, 10), vp);
    }

    #[test]
    fn test_pan_stops_at_edge() {
        let vp = viewport((1500, 2000), (1800, 1900), 1850);
        assert_eq!(vp.panned(50.0).window_range, YearRange::new(1850, 1950));
        assert_eq!(vp.panned(500.0).window_range, YearRange::new(1900, 2000));
        assert_eq!(vp.panned(-1000.0).window_range, YearRange::new(1500, 1600));
    }

    #[test]
    fn test_pan_drags_selected_year_along() {
        let vp = viewport((1500, 2000), (1800, 1900), 1810);
        let panned = vp.panned(50.0);
        assert_eq!(panned.selected_year, 1850);
    }

    #[test]
    fn test_window_width_centers_on_midpoint() {
        let vp = viewport((1500, 2000), (1800, 1900), 1850);
        assert_eq!(vp.with_window_width(20).window_range, YearRange::new(1840, 1860));
    }

    #[test]
    fn test_window_width_recenters_on_selected_year() {
        let vp = viewport((1500, 2000), (1800, 1900), 1805);
        let narrowed = vp.with_window_width(20);
        assert_eq!(narrowed.window_range, YearRange::new(1795, 1815));
        assert_eq!(narrowed.selected_year, 1805);
    }

    #[test]
    fn test_zero_span_full_range() {
        let vp = Viewport::new(YearRange::single(1900));
        assert_eq!(vp.zoomed(1900.0, 0.5, 10).window_range, YearRange::single(1900));
        assert_eq!(vp.panned(10.0).window_range, YearRange::single(1900));
        assert_eq!(vp.with_window_width(50).selected_year, 1900);
    }

    #[test]
    fn test_huge_pan_and_zoom_stop_at_edges() {
        let vp = viewport((1500, 2000), (1800, 1900), 1850);
        assert_eq!(vp.panned(1e19).window_range, YearRange::new(1900, 2000));
        assert_eq!(vp.panned(-1e300).window_range, YearRange::new(1500, 1600));
        assert_eq!(vp.zoomed(1e300, 0.5, 10).window_range, YearRange::new(1950, 2000));
        assert_eq!(vp.zoomed(-1e19, 0.5, 10).window_range, YearRange::new(1500, 1550));
    }

    fn arb_viewport() -> impl Strategy<Value = Viewport> {
        (-3000i32..3000, 0i32..3000, -3000i32..3000, -3000i32..3000, -4000i32..4000).prop_map(
            |(min, span, a, b, year)| {
                viewport((min, min + span), (a, b), year)
            },
        )
    }

    fn extreme_years() -> impl Strategy<Value = f64> {
        prop_oneof![
            Just(1e19),
            Just(-1e19),
            Just(1e300),
            Just(-1e300),
            Just(f64::MAX),
            Just(f64::MIN),
        ]
    }

    proptest! {
        #[test]
        fn transitions_preserve_invariants(
            vp in arb_viewport(),
            anchor in -4000.0f64..4000.0,
            scale in 0.01f64..20.0,
            delta in -5000.0f64..5000.0,
            width in -10i64..8000,
            (c, d) in (-3000i32..3000, -3000i32..3000),
        ) {
            prop_assert!(vp.is_consistent());
            prop_assert!(vp.zoomed(anchor, scale, 10).is_consistent());
            prop_assert!(vp.panned(delta).is_consistent());
            prop_assert!(vp.with_window_width(width).is_consistent());
            prop_assert!(vp.with_full_range(YearRange::new(c, d)).is_consistent());
            prop_assert!(vp.with_window(YearRange::new(c, d)).is_consistent());
        }

        #[test]
        fn extreme_inputs_degrade_gracefully(
            vp in arb_viewport(),
            anchor in extreme_years(),
            delta in extreme_years(),
            scale in prop_oneof![Just(1e-300), Just(0.5), Just(1e300)],
        ) {
            let zoomed = vp.zoomed(anchor, scale, 10);
            prop_assert!(zoomed.is_consistent());
            let panned = vp.panned(delta);
            prop_assert!(panned.is_consistent());
            prop_assert_eq!(panned.window_range.span(), vp.window_range.span());
        }

        #[test]
        fn pan_preserves_width_when_possible(vp in arb_viewport(), delta in -5000.0f64..5000.0) {
            prop_assert_eq!(vp.panned(delta).window_range.span(), vp.window_range.span());
        }
    }
}
