//! Engine settings
//!
//! Every tunable constant of the engine (floors, fallback windows, bin width
//! tables, playback pacing, spiral geometry) lives here with its documented
//! default, so a settings file can override any of them.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::timeline::{Year, YearRange};

/// Errors raised while loading settings
#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid settings JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid bin width table: {0}")]
    BinTable(String),

    #[error("Invalid playback settings: {0}")]
    Playback(String),

    #[error("Invalid spiral settings: {0}")]
    Spiral(String),
}

/// All engine settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AtlasSettings {
    pub ranges: RangeSettings,
    pub counting: CountingSettings,
    pub binning: BinningSettings,
    pub playback: PlaybackSettings,
    pub spiral: SpiralSettings,
}

/// Full range computation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RangeSettings {
    /// Earliest year a computed range may start at
    pub floor_year: Year,
    /// Undated people born less than this many years ago count as alive
    pub alive_horizon: Year,
    /// Length of the fallback window ending at the current year
    pub empty_lookback: Year,
    /// Result of a union with no valid input
    pub default_union: YearRange,
}

impl Default for RangeSettings {
    fn default() -> Self {
        Self {
            floor_year: -1500,
            alive_horizon: 100,
            empty_lookback: 10,
            default_union: YearRange::new(1800, 2025),
        }
    }
}

/// Per-year counting
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CountingSettings {
    /// Upper bound on a lifetime; `None` disables the cap
    pub max_age: Option<Year>,
}

impl Default for CountingSettings {
    fn default() -> Self {
        Self { max_age: Some(100) }
    }
}

/// One row of the bin width table: spans up to `max_span` use `width`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BinStep {
    pub max_span: i64,
    pub width: u32,
}

/// Bin width as a step function of the window span.
///
/// The same table drives the histogram bins and the year slider step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BinningSettings {
    /// Steps sorted by `max_span`
    pub steps: Vec<BinStep>,
    /// Width for spans beyond the last step
    pub widest: u32,
}

impl Default for BinningSettings {
    fn default() -> Self {
        Self {
            steps: vec![
                BinStep { max_span: 50, width: 1 },
                BinStep { max_span: 150, width: 2 },
                BinStep { max_span: 500, width: 5 },
                BinStep { max_span: 1500, width: 10 },
            ],
            widest: 20,
        }
    }
}

impl BinningSettings {
    /// Bin width for a window of the given span
    pub fn width_for_span(&self, span: i64) -> u32 {
        self.steps
            .iter()
            .find(|step| span <= step.max_span)
            .map(|step| step.width)
            .unwrap_or(self.widest)
            .max(1)
    }

    /// Check that widths are positive and never shrink as the span grows
    pub fn validate(&self) -> Result<(), SettingsError> {
        let mut previous: Option<BinStep> = None;
        for step in &self.steps {
            if step.width == 0 {
                return Err(SettingsError::BinTable(format!(
                    "zero width for span {}",
                    step.max_span
                )));
            }
            if let Some(prev) = previous {
                if step.max_span <= prev.max_span {
                    return Err(SettingsError::BinTable(format!(
                        "span {} listed after {}",
                        step.max_span, prev.max_span
                    )));
                }
                if step.width < prev.width {
                    return Err(SettingsError::BinTable(format!(
                        "width {} for span {} is narrower than {}",
                        step.width, step.max_span, prev.width
                    )));
                }
            }
            previous = Some(*step);
        }

        if self.widest == 0 {
            return Err(SettingsError::BinTable("zero widest width".to_string()));
        }
        if let Some(last) = previous {
            if self.widest < last.width {
                return Err(SettingsError::BinTable(format!(
                    "widest width {} is narrower than {}",
                    self.widest, last.width
                )));
            }
        }
        Ok(())
    }
}

/// Autoplay and window navigation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackSettings {
    /// Years advanced per tick
    pub tick_years: Year,
    /// Delay between ticks
    pub interval_ms: u64,
    /// Narrowest window a zoom may produce
    pub min_window_years: Year,
    /// Wheel delta to zoom factor: `exp(delta * zoom_intensity)`
    pub zoom_intensity: f64,
}

impl Default for PlaybackSettings {
    fn default() -> Self {
        Self {
            tick_years: 1,
            interval_ms: 100,
            min_window_years: 10,
            zoom_intensity: 0.0015,
        }
    }
}

impl PlaybackSettings {
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.tick_years <= 0 {
            return Err(SettingsError::Playback(format!(
                "tick_years must be positive, got {}",
                self.tick_years
            )));
        }
        if self.interval_ms == 0 {
            return Err(SettingsError::Playback("interval_ms must be positive".to_string()));
        }
        if self.min_window_years < 0 {
            return Err(SettingsError::Playback(format!(
                "min_window_years must not be negative, got {}",
                self.min_window_years
            )));
        }
        if !self.zoom_intensity.is_finite() {
            return Err(SettingsError::Playback("zoom_intensity must be finite".to_string()));
        }
        Ok(())
    }
}

/// Geometry of the co-location spiral
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpiralSettings {
    /// Angle between successive ordinals (radians)
    pub angular_step: f64,
    /// Siblings sharing an ordinal are nudged by `angular_step / sibling_divisor`
    pub sibling_divisor: f64,
    /// Radius added per ordinal at the reference zoom (degrees)
    pub radius_step: f64,
    /// Zoom level at which `radius_step` applies unscaled
    pub reference_zoom: f64,
}

impl Default for SpiralSettings {
    fn default() -> Self {
        Self {
            angular_step: std::f64::consts::TAU / 60.0,
            sibling_divisor: 6.0,
            radius_step: 0.02,
            reference_zoom: 1.5,
        }
    }
}

impl SpiralSettings {
    pub fn validate(&self) -> Result<(), SettingsError> {
        let positive = |value: f64| value.is_finite() && value > 0.0;
        if !positive(self.angular_step) || !positive(self.radius_step) {
            return Err(SettingsError::Spiral(
                "angular_step and radius_step must be positive".to_string(),
            ));
        }
        if !positive(self.sibling_divisor) {
            return Err(SettingsError::Spiral(format!(
                "sibling_divisor must be positive, got {}",
                self.sibling_divisor
            )));
        }
        if !self.reference_zoom.is_finite() {
            return Err(SettingsError::Spiral("reference_zoom must be finite".to_string()));
        }
        Ok(())
    }
}

impl AtlasSettings {
    /// Parse and validate settings from JSON. Missing fields keep their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, SettingsError> {
        let settings: AtlasSettings = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from a JSON file
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        debug!("Loading settings from {:?}", path);
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        self.binning.validate()?;
        self.playback.validate()?;
        self.spiral.validate()?;
        Ok(())
    }

    pub fn to_json(&self) -> Result<String, SettingsError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
