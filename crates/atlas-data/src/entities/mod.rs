//! Entity records plotted by the atlas
//!
//! Records mirror the backend payloads. Year fields are kept as loose
//! [`YearValue`]s and only coerced when aggregated, so a malformed date drops
//! the entity from that aggregation instead of failing the whole load.

use std::fmt;

use atlas_core::settings::CountingSettings;
use atlas_core::{Year, YearCount, YearRange, YearValue};
use atlas_geo::Located;
use serde::{Deserialize, Serialize};

use crate::counting::{build_alive_counts, build_event_counts, build_work_counts, CountOptions};
use crate::ranges::{RangeMode, RangeReducer};

/// Anything with a start year and an optional end year
pub trait TemporalEntity {
    fn start_year(&self) -> Option<Year>;
    fn end_year(&self) -> Option<Year>;
}

/// Anything tied to a single year
pub trait PointInTime {
    fn year(&self) -> Option<Year>;
}

/// Dataset kinds shown as map layers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayerKind {
    Persons,
    MilitaryEvents,
    Works,
}

impl LayerKind {
    pub fn name(&self) -> &'static str {
        match self {
            LayerKind::Persons => "persons",
            LayerKind::MilitaryEvents => "military_events",
            LayerKind::Works => "works",
        }
    }

    /// Key of the entity array in the backend's response envelope
    pub fn envelope_key(&self) -> &'static str {
        match self {
            LayerKind::Persons => "humans",
            LayerKind::MilitaryEvents => "military_events",
            LayerKind::Works => "works",
        }
    }
}

impl fmt::Display for LayerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Per-kind aggregation rules used by [`crate::DataLayer`]
pub trait LayerEntity: TemporalEntity + Clone + Send + Sync + 'static {
    const KIND: LayerKind;

    /// Full range of a dataset of this kind
    fn full_range(entities: &[Self], reducer: &RangeReducer) -> YearRange;

    /// Dense per-year counts over `range`
    fn counts(entities: &[Self], range: YearRange, counting: &CountingSettings) -> Vec<YearCount>;

    /// Whether the entity is shown on the map at `year`
    fn is_visible_at(&self, year: Year, _counting: &CountingSettings) -> bool {
        match self.start_year() {
            Some(start) => start <= year && self.end_year().map_or(true, |end| end >= year),
            None => false,
        }
    }
}

/// A person with birth and death years
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Person {
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub birth_date: YearValue,
    #[serde(default)]
    pub death_date: YearValue,
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub lon: Option<f64>,
    #[serde(default)]
    pub city: Option<String>,
    /// Position among people placed at the same city
    #[serde(default)]
    pub city_index: u32,
}

impl Person {
    pub fn new(
        id: i64,
        name: impl Into<String>,
        birth: impl Into<YearValue>,
        death: impl Into<YearValue>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            birth_date: birth.into(),
            death_date: death.into(),
            lat: None,
            lon: None,
            city: None,
            city_index: 0,
        }
    }

    pub fn at(mut self, lon: f64, lat: f64) -> Self {
        self.lon = Some(lon);
        self.lat = Some(lat);
        self
    }

    /// Age at `year`, if born by then
    pub fn age_at(&self, year: Year) -> Option<Year> {
        self.start_year()
            .filter(|birth| *birth <= year)
            .map(|birth| year - birth)
    }
}

impl Located for Person {
    fn coordinates(&self) -> Option<(f64, f64)> {
        Some((self.lon?, self.lat?))
    }
}

impl TemporalEntity for Person {
    fn start_year(&self) -> Option<Year> {
        self.birth_date.year()
    }

    fn end_year(&self) -> Option<Year> {
        self.death_date.year()
    }
}

impl LayerEntity for Person {
    const KIND: LayerKind = LayerKind::Persons;

    fn full_range(entities: &[Self], reducer: &RangeReducer) -> YearRange {
        reducer.full_range_of(entities, RangeMode::Persons)
    }

    fn counts(entities: &[Self], range: YearRange, counting: &CountingSettings) -> Vec<YearCount> {
        build_alive_counts(
            entities,
            range,
            CountOptions {
                max_age: counting.max_age,
            },
        )
    }

    /// Alive at `year`: born, not yet dead, and younger than the age cap
    fn is_visible_at(&self, year: Year, counting: &CountingSettings) -> bool {
        let Some(age) = self.age_at(year) else {
            return false;
        };
        let not_dead = self.end_year().map_or(true, |death| death >= year);
        let under_cap = counting.max_age.map_or(true, |max_age| age < max_age);
        not_dead && under_cap
    }
}

/// A battle, siege or campaign
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MilitaryEvent {
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub start_date: YearValue,
    #[serde(default)]
    pub end_date: YearValue,
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub lon: Option<f64>,
    #[serde(default)]
    pub event_type: Option<String>,
    #[serde(default)]
    pub parent_id: Option<i64>,
}

impl MilitaryEvent {
    pub fn new(
        id: i64,
        name: impl Into<String>,
        start: impl Into<YearValue>,
        end: impl Into<YearValue>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            start_date: start.into(),
            end_date: end.into(),
            lat: None,
            lon: None,
            event_type: None,
            parent_id: None,
        }
    }
}

impl Located for MilitaryEvent {
    fn coordinates(&self) -> Option<(f64, f64)> {
        Some((self.lon?, self.lat?))
    }
}

impl TemporalEntity for MilitaryEvent {
    fn start_year(&self) -> Option<Year> {
        self.start_date.year()
    }

    fn end_year(&self) -> Option<Year> {
        self.end_date.year()
    }
}

impl LayerEntity for MilitaryEvent {
    const KIND: LayerKind = LayerKind::MilitaryEvents;

    fn full_range(entities: &[Self], reducer: &RangeReducer) -> YearRange {
        reducer.full_range_of(entities, RangeMode::Events)
    }

    fn counts(entities: &[Self], range: YearRange, _counting: &CountingSettings) -> Vec<YearCount> {
        build_event_counts(entities, range)
    }
}

/// An artwork or publication created in a single year
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Work {
    pub id: i64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub created_date: YearValue,
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub lon: Option<f64>,
}

impl Work {
    pub fn new(id: i64, title: impl Into<String>, created: impl Into<YearValue>) -> Self {
        Self {
            id,
            title: title.into(),
            created_date: created.into(),
            lat: None,
            lon: None,
        }
    }
}

impl Located for Work {
    fn coordinates(&self) -> Option<(f64, f64)> {
        Some((self.lon?, self.lat?))
    }
}

impl PointInTime for Work {
    fn year(&self) -> Option<Year> {
        self.created_date.year()
    }
}

impl TemporalEntity for Work {
    fn start_year(&self) -> Option<Year> {
        self.year()
    }

    fn end_year(&self) -> Option<Year> {
        self.year()
    }
}

impl LayerEntity for Work {
    const KIND: LayerKind = LayerKind::Works;

    fn full_range(entities: &[Self], reducer: &RangeReducer) -> YearRange {
        reducer.full_range_by_year_field(entities)
    }

    fn counts(entities: &[Self], range: YearRange, _counting: &CountingSettings) -> Vec<YearCount> {
        build_work_counts(entities, range)
    }

    /// Works stay on the map from their creation year on
    fn is_visible_at(&self, year: Year, _counting: &CountingSettings) -> bool {
        self.year().map_or(false, |created| created <= year)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_person_deserializes_backend_shape() {
        let person: Person = serde_json::from_str(
            r#"{ "id": 7, "name": "Edvard Munch", "birth_date": 1863, "death_date": "1944-01-23",
                 "lat": 59.91, "lon": 10.75, "city": "Oslo", "city_index": 2, "qid": "Q41406" }"#,
        )
        .unwrap();
        assert_eq!(person.start_year(), Some(1863));
        assert_eq!(person.end_year(), Some(1944));
        assert_eq!(person.coordinates(), Some((10.75, 59.91)));
        assert_eq!(person.city_index, 2);
    }

    #[test]
    fn test_missing_fields_default() {
        let event: MilitaryEvent =
            serde_json::from_str(r#"{ "id": 1, "start_date": -480 }"#).unwrap();
        assert_eq!(event.start_year(), Some(-480));
        assert_eq!(event.end_year(), None);
        assert_eq!(event.coordinates(), None);
    }

    #[test]
    fn test_person_visibility() {
        let counting = CountingSettings::default();
        let person = Person::new(1, "A", 1800, 1850);
        assert!(!person.is_visible_at(1799, &counting));
        assert!(person.is_visible_at(1800, &counting));
        assert!(person.is_visible_at(1850, &counting));
        assert!(!person.is_visible_at(1851, &counting));

        let undated = Person::new(2, "B", 1800, None::<i32>);
        assert!(undated.is_visible_at(1899, &counting));
        assert!(!undated.is_visible_at(1900, &counting));
    }

    #[test]
    fn test_event_and_work_visibility() {
        let counting = CountingSettings::default();
        let event = MilitaryEvent::new(1, "Siege", 1683, 1683);
        assert!(event.is_visible_at(1683, &counting));
        assert!(!event.is_visible_at(1684, &counting));

        let open = MilitaryEvent::new(2, "Campaign", 1700, None::<i32>);
        assert!(open.is_visible_at(1750, &counting));

        let work = Work::new(1, "The Scream", "1893");
        assert!(!work.is_visible_at(1892, &counting));
        assert!(work.is_visible_at(1900, &counting));
    }
}
