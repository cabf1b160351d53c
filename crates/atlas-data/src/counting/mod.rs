//! Per-year counts over a bounded year range
//!
//! Interval datasets use a sweep line over a difference array: one `+1` at
//! each clipped start and one `-1` just past each clipped end, then a prefix
//! sum over the range. This is O(n + span) instead of O(n * span).

use atlas_core::{Year, YearCount, YearRange};

use crate::entities::{PointInTime, TemporalEntity};

/// Options for [`build_alive_counts`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CountOptions {
    /// Cap on `end - start`; guards against bad data producing absurd lifetimes
    pub max_age: Option<Year>,
}

impl Default for CountOptions {
    fn default() -> Self {
        Self { max_age: Some(100) }
    }
}

/// Difference array over a year range
struct Sweep {
    range: YearRange,
    delta: Vec<i64>,
}

impl Sweep {
    fn new(range: YearRange) -> Self {
        Self {
            range,
            delta: vec![0; range.year_count() + 1],
        }
    }

    /// Count `start..=end`, clipped to the range. Empty or inverted spans are skipped.
    fn add(&mut self, start: Year, end: Year) {
        let start = start.max(self.range.min);
        let end = end.min(self.range.max);
        if end < start {
            return;
        }

        let offset = |year: Year| (year as i64 - self.range.min as i64) as usize;
        let (s, e) = (offset(start), offset(end));
        self.delta[s] += 1;
        self.delta[e + 1] -= 1;
    }

    fn finish(self) -> Vec<YearCount> {
        let mut running = 0i64;
        self.range
            .years()
            .zip(self.delta)
            .map(|(year, delta)| {
                running += delta;
                YearCount::new(year, running as u32)
            })
            .collect()
    }
}

/// Number of people alive in each year of `range`.
///
/// Missing death years fall back to `birth + max_age`, or to the end of the
/// range when no cap is set. Known death years are also capped.
pub fn build_alive_counts<'a, E, I>(
    entities: I,
    range: YearRange,
    options: CountOptions,
) -> Vec<YearCount>
where
    E: TemporalEntity + 'a,
    I: IntoIterator<Item = &'a E>,
{
    let mut sweep = Sweep::new(range);

    for entity in entities {
        let Some(birth) = entity.start_year() else {
            continue;
        };

        let mut death = entity.end_year();
        if let Some(max_age) = options.max_age {
            let cap = birth.saturating_add(max_age);
            death = Some(death.map_or(cap, |d| d.min(cap)));
        }

        sweep.add(birth, death.unwrap_or(range.max));
    }

    sweep.finish()
}

/// Number of events active in each year of `range`.
///
/// Events without an end year stay active through the end of the range.
pub fn build_event_counts<'a, E, I>(entities: I, range: YearRange) -> Vec<YearCount>
where
    E: TemporalEntity + 'a,
    I: IntoIterator<Item = &'a E>,
{
    let mut sweep = Sweep::new(range);

    for entity in entities {
        let Some(start) = entity.start_year() else {
            continue;
        };
        let end = entity.end_year().unwrap_or(range.max);
        sweep.add(start, end);
    }

    sweep.finish()
}

/// Number of single-year items (works) per year of `range`
pub fn build_work_counts<'a, E, I>(entities: I, range: YearRange) -> Vec<YearCount>
where
    E: PointInTime + 'a,
    I: IntoIterator<Item = &'a E>,
{
    let mut counts = vec![0u32; range.year_count()];

    for year in entities.into_iter().filter_map(PointInTime::year) {
        if range.contains(year) {
            counts[(year as i64 - range.min as i64) as usize] += 1;
        }
    }

    range
        .years()
        .zip(counts)
        .map(|(year, count)| YearCount::new(year, count))
        .collect()
}

/// Running total of a count series
pub fn cumulative_counts(counts: &[YearCount]) -> Vec<YearCount> {
    let mut running = 0u32;
    counts
        .iter()
        .map(|c| {
            running = running.saturating_add(c.count);
            YearCount::new(c.year, running)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{MilitaryEvent, Person, Work};
    use proptest::prelude::*;

    fn count_at(counts: &[YearCount], year: Year) -> u32 {
        counts.iter().find(|c| c.year == year).map(|c| c.count).unwrap()
    }

    #[test]
    fn test_alive_counts_example() {
        let people = vec![
            Person::new(1, "A", 1800, 1850),
            Person::new(2, "B", 1820, None::<i32>),
        ];
        let range = YearRange::new(1800, 1860);
        let counts = build_alive_counts(&people, range, CountOptions { max_age: Some(100) });

        assert_eq!(counts.len(), 61);
        assert_eq!(counts.first().unwrap().year, 1800);
        assert_eq!(counts.last().unwrap().year, 1860);
        assert_eq!(count_at(&counts, 1830), 2);
        assert_eq!(count_at(&counts, 1855), 1);
        assert_eq!(count_at(&counts, 1810), 1);
        assert_eq!(count_at(&counts, 1850), 2);
    }

    #[test]
    fn test_max_age_caps_known_death() {
        let people = vec![Person::new(1, "Long", 1700, 1900)];
        let range = YearRange::new(1700, 1900);
        let counts = build_alive_counts(&people, range, CountOptions { max_age: Some(100) });
        assert_eq!(count_at(&counts, 1800), 1);
        assert_eq!(count_at(&counts, 1801), 0);
    }

    #[test]
    fn test_without_cap_undated_runs_to_range_end() {
        let people = vec![Person::new(1, "Undated", 1700, None::<i32>)];
        let range = YearRange::new(1700, 2000);
        let counts = build_alive_counts(&people, range, CountOptions { max_age: None });
        assert_eq!(count_at(&counts, 2000), 1);
    }

    #[test]
    fn test_bad_records_contribute_nothing() {
        let people = vec![
            Person::new(1, "Inverted", 1850, 1800),
            Person::new(2, "No birth", "unknown", 1850),
            Person::new(3, "Outside", 1500, 1550),
        ];
        let range = YearRange::new(1800, 1860);
        let counts = build_alive_counts(&people, range, CountOptions::default());
        assert!(counts.iter().all(|c| c.count == 0));
    }

    #[test]
    fn test_bce_event_counts() {
        let events = vec![MilitaryEvent::new(1, "War", -500, -450)];
        let counts = build_event_counts(&events, YearRange::new(-600, -400));

        for c in &counts {
            let expected = u32::from((-500..=-450).contains(&c.year));
            assert_eq!(c.count, expected, "year {}", c.year);
        }
    }

    #[test]
    fn test_open_event_runs_to_range_end() {
        let events = vec![MilitaryEvent::new(1, "Open", 1900, None::<i32>)];
        let counts = build_event_counts(&events, YearRange::new(1890, 1910));
        assert_eq!(count_at(&counts, 1899), 0);
        assert_eq!(count_at(&counts, 1910), 1);
    }

    #[test]
    fn test_work_counts_and_cumulative() {
        let works = vec![
            Work::new(1, "a", 1890),
            Work::new(2, "b", 1890),
            Work::new(3, "c", "1893-05-01"),
            Work::new(4, "d", 1950),
            Work::new(5, "e", None::<i32>),
        ];
        let counts = build_work_counts(&works, YearRange::new(1890, 1895));
        assert_eq!(
            counts.iter().map(|c| c.count).collect::<Vec<_>>(),
            vec![2, 0, 0, 1, 0, 0]
        );

        let cumulative = cumulative_counts(&counts);
        assert_eq!(
            cumulative.iter().map(|c| c.count).collect::<Vec<_>>(),
            vec![2, 2, 2, 3, 3, 3]
        );
    }

    #[test]
    fn test_single_year_range() {
        let events = vec![MilitaryEvent::new(1, "Day", 1815, 1815)];
        let counts = build_event_counts(&events, YearRange::single(1815));
        assert_eq!(counts, vec![YearCount::new(1815, 1)]);
    }

    proptest! {
        #[test]
        fn disjoint_in_range_intervals_sum_to_entity_count(
            lengths in proptest::collection::vec(0i32..20, 1..30),
        ) {
            // Lay intervals end to end with a gap so none overlap
            let mut start = -1000;
            let mut events = Vec::new();
            for (i, len) in lengths.iter().enumerate() {
                events.push(MilitaryEvent::new(i as i64, "e", start, start + len));
                start += len + 2;
            }
            let range = YearRange::new(-1000, start);
            let counts = build_event_counts(&events, range);

            let entity_years: u32 = lengths.iter().map(|len| (*len + 1) as u32).sum();
            prop_assert_eq!(counts.iter().map(|c| c.count).sum::<u32>(), entity_years);
            prop_assert!(counts.iter().all(|c| c.count <= 1));
        }

        #[test]
        fn alive_counts_cover_every_contained_year(
            spans in proptest::collection::vec((1700i32..1900, 0i32..100), 1..20),
            year in 1650i32..2050,
        ) {
            let people: Vec<Person> = spans
                .iter()
                .enumerate()
                .map(|(i, (birth, age))| Person::new(i as i64, "p", *birth, birth + age))
                .collect();
            let range = YearRange::new(1650, 2050);
            let counts = build_alive_counts(&people, range, CountOptions { max_age: Some(100) });

            let expected = spans
                .iter()
                .filter(|(birth, age)| *birth <= year && year <= birth + age)
                .count() as u32;
            prop_assert_eq!(count_at(&counts, year), expected);
        }
    }
}
