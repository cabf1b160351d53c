use std::fmt;
use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

use super::Year;

/// An inclusive span of years with `min <= max`.
///
/// Ranges are plain values: every operation returns a new range instead of
/// mutating in place. Serialized as a two-element array `[min, max]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "(Year, Year)", into = "(Year, Year)")]
pub struct YearRange {
    pub min: Year,
    pub max: Year,
}

impl YearRange {
    /// Create a range from two bounds, swapping them if given out of order
    pub fn new(a: Year, b: Year) -> Self {
        if a <= b {
            Self { min: a, max: b }
        } else {
            Self { min: b, max: a }
        }
    }

    /// A range covering a single year
    pub fn single(year: Year) -> Self {
        Self { min: year, max: year }
    }

    /// Distance between the bounds (`max - min`)
    pub fn span(&self) -> i64 {
        self.max as i64 - self.min as i64
    }

    /// Number of years contained in the range
    pub fn year_count(&self) -> usize {
        (self.span() + 1) as usize
    }

    pub fn contains(&self, year: Year) -> bool {
        self.min <= year && year <= self.max
    }

    /// Whether `other` lies entirely inside this range
    pub fn contains_range(&self, other: &YearRange) -> bool {
        self.min <= other.min && other.max <= self.max
    }

    /// Clamp a year into the range, snapping to the nearer bound
    pub fn clamp_year(&self, year: Year) -> Year {
        year.clamp(self.min, self.max)
    }

    /// Overlap of two ranges, if any
    pub fn intersect(&self, other: &YearRange) -> Option<YearRange> {
        let min = self.min.max(other.min);
        let max = self.max.min(other.max);
        (min <= max).then_some(YearRange { min, max })
    }

    /// Smallest range enclosing both
    pub fn union(&self, other: &YearRange) -> YearRange {
        YearRange {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    /// Intersect with `full`; a window lying completely outside resets to `full`
    pub fn clamp_into(&self, full: &YearRange) -> YearRange {
        self.intersect(full).unwrap_or(*full)
    }

    /// Translate the range into `full` while preserving its width.
    ///
    /// A range at least as wide as `full` becomes `full`.
    pub fn fit_into(&self, full: &YearRange) -> YearRange {
        let width = self.span();
        if width >= full.span() {
            return *full;
        }

        let mut min = self.min as i64;
        let mut max = self.max as i64;
        if min < full.min as i64 {
            min = full.min as i64;
            max = min + width;
        }
        if max > full.max as i64 {
            max = full.max as i64;
            min = max - width;
        }
        YearRange {
            min: min as Year,
            max: max as Year,
        }
    }

    /// Midpoint of the range, rounded toward negative infinity
    pub fn midpoint(&self) -> Year {
        ((self.min as i64 + self.max as i64).div_euclid(2)) as Year
    }

    /// Iterate every year in the range
    pub fn years(&self) -> RangeInclusive<Year> {
        self.min..=self.max
    }
}

impl From<(Year, Year)> for YearRange {
    fn from((a, b): (Year, Year)) -> Self {
        YearRange::new(a, b)
    }
}

impl From<YearRange> for (Year, Year) {
    fn from(range: YearRange) -> Self {
        (range.min, range.max)
    }
}

impl fmt::Display for YearRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.min, self.max)
    }
}
