//! Adaptive-width histogram over a per-year count series

use atlas_core::settings::BinningSettings;
use atlas_core::{Bin, YearCount, YearRange};
use serde::{Deserialize, Serialize};

/// How counts inside a bin are combined
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Aggregation {
    #[default]
    Sum,
    /// Mean over the years that actually contributed a count
    Avg,
}

/// Binned counts for one window
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Histogram {
    pub bins: Vec<Bin>,
    /// Largest bin value, for relative scaling. Zero when there are no bins.
    pub max_value: f64,
    pub bin_width: u32,
}

impl Histogram {
    pub fn is_empty(&self) -> bool {
        self.bins.is_empty()
    }

    pub fn total(&self) -> f64 {
        self.bins.iter().map(|bin| bin.value).sum()
    }
}

/// Downsamples per-year counts into bins sized by the window span
#[derive(Debug, Clone, Default)]
pub struct HistogramBinner {
    settings: BinningSettings,
}

impl HistogramBinner {
    pub fn new(settings: BinningSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &BinningSettings {
        &self.settings
    }

    /// Bin width used for `window`
    pub fn width_for(&self, window: YearRange) -> u32 {
        self.settings.width_for_span(window.span())
    }

    /// Bin `counts` over `window`.
    ///
    /// Bin boundaries sit on multiples of the width so a shifted window keeps
    /// the same boundaries; the first and last bins are trimmed to the window.
    pub fn bin(
        &self,
        counts: &[YearCount],
        window: YearRange,
        aggregation: Aggregation,
    ) -> Histogram {
        let width = self.width_for(window);
        let w = width as i64;

        let first_start = (window.min as i64).div_euclid(w) * w;
        let bin_count = ((window.max as i64 - first_start) / w + 1) as usize;

        let mut sums = vec![0u64; bin_count];
        let mut contributing = vec![0u32; bin_count];
        let mut any = false;

        for count in counts.iter().filter(|c| window.contains(c.year)) {
            let index = ((count.year as i64 - first_start) / w) as usize;
            sums[index] += u64::from(count.count);
            contributing[index] += 1;
            any = true;
        }

        if !any {
            return Histogram {
                bins: Vec::new(),
                max_value: 0.0,
                bin_width: width,
            };
        }

        let bins: Vec<Bin> = (0..bin_count)
            .map(|index| {
                let start = first_start + index as i64 * w;
                let end = start + w - 1;
                let value = match aggregation {
                    Aggregation::Sum => sums[index] as f64,
                    Aggregation::Avg if contributing[index] > 0 => {
                        sums[index] as f64 / f64::from(contributing[index])
                    }
                    Aggregation::Avg => 0.0,
                };
                Bin {
                    start: start.max(window.min as i64) as i32,
                    end: end.min(window.max as i64) as i32,
                    value,
                }
            })
            .collect();

        let max_value = bins.iter().map(|bin| bin.value).fold(0.0, f64::max);

        Histogram {
            bins,
            max_value,
            bin_width: width,
        }
    }
}
