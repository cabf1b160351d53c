//! Year model shared by every layer of the engine

use serde::{Deserialize, Serialize};

mod coerce;
mod range;

pub use coerce::{coerce_year, YearValue};
pub use range::YearRange;

/// A calendar year. Negative values are BCE.
pub type Year = i32;

/// Number of entities counted for a single year
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearCount {
    pub year: Year,
    pub count: u32,
}

impl YearCount {
    pub fn new(year: Year, count: u32) -> Self {
        Self { year, count }
    }
}

/// An aggregated histogram bucket covering `start..=end`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bin {
    pub start: Year,
    pub end: Year,
    pub value: f64,
}

impl Bin {
    /// Number of years covered by this bin
    pub fn years(&self) -> u32 {
        (self.end as i64 - self.start as i64 + 1) as u32
    }

    /// Year at the middle of the bin, used as the click target
    pub fn midpoint(&self) -> Year {
        ((self.start as i64 + self.end as i64).div_euclid(2)) as Year
    }
}
