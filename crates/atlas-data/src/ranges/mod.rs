//! Full data ranges of datasets and their union

use atlas_core::settings::RangeSettings;
use atlas_core::{Year, YearRange};
use chrono::Datelike;
use tracing::debug;

use crate::entities::{PointInTime, TemporalEntity};

/// How the upper bound of a dataset's range is chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RangeMode {
    /// People: a recently born person with no death year keeps the range open until today
    Persons,
    /// Events: the range ends at the latest known end year
    Events,
}

/// Computes the bounding year range of a dataset.
///
/// The current year is fixed at construction so results do not depend on
/// when they are computed.
#[derive(Debug, Clone)]
pub struct RangeReducer {
    settings: RangeSettings,
    current_year: Year,
}

impl RangeReducer {
    /// Create a reducer using the local clock's year
    pub fn new(settings: RangeSettings) -> Self {
        let current_year = chrono::Local::now().year();
        Self::with_current_year(settings, current_year)
    }

    pub fn with_current_year(settings: RangeSettings, current_year: Year) -> Self {
        Self {
            settings,
            current_year,
        }
    }

    pub fn current_year(&self) -> Year {
        self.current_year
    }

    pub fn settings(&self) -> &RangeSettings {
        &self.settings
    }

    /// Window used when a dataset has no usable year
    pub fn fallback(&self) -> YearRange {
        YearRange::new(
            self.current_year.saturating_sub(self.settings.empty_lookback),
            self.current_year,
        )
    }

    /// Range of a dataset of intervals
    pub fn full_range_of<E: TemporalEntity>(&self, entities: &[E], mode: RangeMode) -> YearRange {
        let Some(raw_min) = entities.iter().filter_map(TemporalEntity::start_year).min() else {
            debug!("No start years in {} entities, using fallback range", entities.len());
            return self.fallback();
        };
        let min = raw_min.max(self.settings.floor_year);

        let someone_alive = mode == RangeMode::Persons
            && entities.iter().any(|entity| match (entity.start_year(), entity.end_year()) {
                (Some(birth), None) => {
                    birth.saturating_add(self.settings.alive_horizon) > self.current_year
                }
                _ => false,
            });

        let max = if someone_alive {
            self.current_year
        } else {
            entities
                .iter()
                .filter_map(TemporalEntity::end_year)
                .max()
                .unwrap_or(self.current_year)
        };

        let range = YearRange {
            min,
            max: max.max(min),
        };
        debug!(?mode, someone_alive, %range, "Computed full range");
        range
    }

    /// Range of a dataset of single-year items
    pub fn full_range_by_year_field<E: PointInTime>(&self, entities: &[E]) -> YearRange {
        let years = entities.iter().filter_map(PointInTime::year);
        let Some((raw_min, raw_max)) = years.fold(None, |acc: Option<(Year, Year)>, year| {
            Some(acc.map_or((year, year), |(lo, hi)| (lo.min(year), hi.max(year))))
        }) else {
            return self.fallback();
        };

        let min = raw_min.max(self.settings.floor_year);
        YearRange {
            min,
            max: raw_max.max(min),
        }
    }

    /// [`union_ranges`] with the configured default
    pub fn union(&self, ranges: &[Option<YearRange>]) -> YearRange {
        union_ranges(ranges, self.settings.default_union)
    }
}

/// Validate raw bounds: both finite and `min <= max`
pub fn valid_range(min: f64, max: f64) -> Option<YearRange> {
    if !min.is_finite() || !max.is_finite() || min > max {
        return None;
    }
    if min < Year::MIN as f64 || max > Year::MAX as f64 {
        return None;
    }
    Some(YearRange {
        min: min as Year,
        max: max as Year,
    })
}

/// Smallest range enclosing every present range, or `default` if there are none
pub fn union_ranges(ranges: &[Option<YearRange>], default: YearRange) -> YearRange {
    ranges
        .iter()
        .flatten()
        .copied()
        .reduce(|acc, range| acc.union(&range))
        .unwrap_or(default)
}

/// Intersect `window` with `full`; a window entirely outside resets to `full`
pub fn clamp_range(window: YearRange, full: YearRange) -> YearRange {
    window.clamp_into(&full)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{MilitaryEvent, Person, Work};
    use proptest::prelude::*;

    fn reducer() -> RangeReducer {
        RangeReducer::with_current_year(RangeSettings::default(), 2025)
    }

    fn default_union() -> YearRange {
        RangeSettings::default().default_union
    }

    #[test]
    fn test_empty_dataset_falls_back_to_last_decade() {
        let people: Vec<Person> = vec![Person::new(1, "?", "unknown", None::<i32>)];
        assert_eq!(
            reducer().full_range_of(&people, RangeMode::Persons),
            YearRange::new(2015, 2025)
        );
        assert_eq!(reducer().full_range_by_year_field::<Work>(&[]), YearRange::new(2015, 2025));
    }

    #[test]
    fn test_min_is_clamped_to_floor() {
        let events = vec![
            MilitaryEvent::new(1, "Ancient", -3000, -2990),
            MilitaryEvent::new(2, "Later", 1500, 1510),
        ];
        assert_eq!(
            reducer().full_range_of(&events, RangeMode::Events),
            YearRange::new(-1500, 1510)
        );
    }

    #[test]
    fn test_recent_undated_person_extends_to_current_year() {
        let people = vec![
            Person::new(1, "Old", 1800, 1870),
            Person::new(2, "Recent", 1950, None::<i32>),
        ];
        assert_eq!(
            reducer().full_range_of(&people, RangeMode::Persons),
            YearRange::new(1800, 2025)
        );
    }

    #[test]
    fn test_old_undated_person_does_not_extend() {
        let people = vec![
            Person::new(1, "Old", 1800, 1870),
            Person::new(2, "Undated", 1850, None::<i32>),
        ];
        assert_eq!(
            reducer().full_range_of(&people, RangeMode::Persons),
            YearRange::new(1800, 1870)
        );
    }

    #[test]
    fn test_events_never_extend() {
        let events = vec![
            MilitaryEvent::new(1, "Closed", 1990, 1995),
            MilitaryEvent::new(2, "Open", 2000, None::<i32>),
        ];
        assert_eq!(reducer().full_range_of(&events, RangeMode::Events), YearRange::new(1990, 1995));

        let open_only = vec![MilitaryEvent::new(1, "Open", 1900, None::<i32>)];
        assert_eq!(
            reducer().full_range_of(&open_only, RangeMode::Events),
            YearRange::new(1900, 2025)
        );
    }

    #[test]
    fn test_range_is_normalized() {
        // Latest end precedes earliest start
        let events = vec![MilitaryEvent::new(1, "Inverted", 1900, 1850)];
        assert_eq!(reducer().full_range_of(&events, RangeMode::Events), YearRange::single(1900));
    }

    #[test]
    fn test_works_range() {
        let works = vec![
            Work::new(1, "a", 1503),
            Work::new(2, "b", "1889-06-01"),
            Work::new(3, "c", -2000),
        ];
        assert_eq!(reducer().full_range_by_year_field(&works), YearRange::new(-1500, 1889));
    }

    #[test]
    fn test_union_defaults() {
        assert_eq!(union_ranges(&[], default_union()), YearRange::new(1800, 2025));
        assert_eq!(union_ranges(&[None, None], default_union()), YearRange::new(1800, 2025));
        assert_eq!(reducer().union(&[None]), YearRange::new(1800, 2025));
    }

    #[test]
    fn test_valid_range() {
        assert_eq!(valid_range(1800.0, 1900.0), Some(YearRange::new(1800, 1900)));
        assert_eq!(valid_range(1900.0, 1800.0), None);
        assert_eq!(valid_range(f64::NAN, 1800.0), None);
        assert_eq!(valid_range(1800.0, f64::INFINITY), None);

        let ranges = [valid_range(f64::NAN, 0.0), valid_range(-10.0, 10.0)];
        assert_eq!(union_ranges(&ranges, default_union()), YearRange::new(-10, 10));
    }

    #[test]
    fn test_clamp_range() {
        let full = YearRange::new(1800, 1900);
        assert_eq!(clamp_range(YearRange::new(1750, 1850), full), YearRange::new(1800, 1850));
        assert_eq!(clamp_range(YearRange::new(1950, 2000), full), full);
    }

    fn arb_range() -> impl Strategy<Value = YearRange> {
        (-3000i32..3000, 0i32..2000).prop_map(|(min, span)| YearRange::new(min, min + span))
    }

    proptest! {
        #[test]
        fn union_of_single_range_is_identity(r in arb_range()) {
            prop_assert_eq!(union_ranges(&[Some(r)], default_union()), r);
        }

        #[test]
        fn union_bounds_every_input(a in arb_range(), b in arb_range()) {
            let u = union_ranges(&[Some(a), None, Some(b)], default_union());
            prop_assert!(u.contains_range(&a));
            prop_assert!(u.contains_range(&b));
        }

        #[test]
        fn clamp_range_stays_inside_full(window in arb_range(), full in arb_range()) {
            let clamped = clamp_range(window, full);
            prop_assert!(full.contains_range(&clamped));
            if window.intersect(&full).is_none() {
                prop_assert_eq!(clamped, full);
            }
        }
    }
}
