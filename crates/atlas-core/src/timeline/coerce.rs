//! Normalization of loosely typed year fields

use std::fmt;

use chrono::{Datelike, NaiveDate};
use serde::de::{self, Deserializer, IgnoredAny, MapAccess, SeqAccess, Visitor};
use serde::{Deserialize, Serialize, Serializer};

use super::Year;

/// Longest digit run considered when reading a year out of free text
const MAX_YEAR_DIGITS: usize = 6;

/// A year field as it arrives from a data source
#[derive(Debug, Clone, PartialEq, Default)]
pub enum YearValue {
    /// Numeric value, possibly fractional or non-finite
    Number(f64),
    /// Calendar date
    Date(NaiveDate),
    /// Free text such as `"1590-03-01"`, `"-0467"` or `"c. 1450"`
    Text(String),
    /// Absent field or JSON `null`
    #[default]
    Missing,
}

impl YearValue {
    /// Coerce to an integer year, see [`coerce_year`]
    pub fn year(&self) -> Option<Year> {
        coerce_year(self)
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, YearValue::Missing)
    }
}

/// Normalize a year field into an integer year.
///
/// Numbers are truncated toward zero, dates yield their calendar year and
/// text yields its first signed digit run (up to six digits). Anything that
/// cannot be read returns `None`; this never fails.
pub fn coerce_year(value: &YearValue) -> Option<Year> {
    match value {
        YearValue::Number(n) => {
            if !n.is_finite() {
                return None;
            }
            let truncated = n.trunc();
            if truncated < Year::MIN as f64 || truncated > Year::MAX as f64 {
                return None;
            }
            Some(truncated as Year)
        }
        YearValue::Date(date) => Some(date.year()),
        YearValue::Text(text) => parse_leading_year(text),
        YearValue::Missing => None,
    }
}

/// First `-?\d{1,6}` run in `text`
fn parse_leading_year(text: &str) -> Option<Year> {
    let bytes = text.trim().as_bytes();
    let start = bytes.iter().position(u8::is_ascii_digit)?;
    let negative = start > 0 && bytes[start - 1] == b'-';

    let mut year: Year = 0;
    for &b in bytes[start..].iter().take(MAX_YEAR_DIGITS) {
        if !b.is_ascii_digit() {
            break;
        }
        year = year * 10 + Year::from(b - b'0');
    }

    Some(if negative { -year } else { year })
}

impl From<f64> for YearValue {
    fn from(value: f64) -> Self {
        YearValue::Number(value)
    }
}

impl From<i32> for YearValue {
    fn from(value: i32) -> Self {
        YearValue::Number(value as f64)
    }
}

impl From<&str> for YearValue {
    fn from(value: &str) -> Self {
        YearValue::Text(value.to_string())
    }
}

impl From<String> for YearValue {
    fn from(value: String) -> Self {
        YearValue::Text(value)
    }
}

impl From<NaiveDate> for YearValue {
    fn from(value: NaiveDate) -> Self {
        YearValue::Date(value)
    }
}

impl<T: Into<YearValue>> From<Option<T>> for YearValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(YearValue::Missing)
    }
}

impl Serialize for YearValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            YearValue::Number(n) => serializer.serialize_f64(*n),
            YearValue::Date(date) => serializer.collect_str(&date.format("%Y-%m-%d")),
            YearValue::Text(text) => serializer.serialize_str(text),
            YearValue::Missing => serializer.serialize_none(),
        }
    }
}

struct YearValueVisitor;

impl<'de> Visitor<'de> for YearValueVisitor {
    type Value = YearValue;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a year as number, string or null")
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<YearValue, E> {
        Ok(YearValue::Number(v as f64))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<YearValue, E> {
        Ok(YearValue::Number(v as f64))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<YearValue, E> {
        Ok(YearValue::Number(v))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<YearValue, E> {
        Ok(YearValue::Text(v.to_string()))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<YearValue, E> {
        Ok(YearValue::Text(v))
    }

    fn visit_bool<E: de::Error>(self, _v: bool) -> Result<YearValue, E> {
        Ok(YearValue::Missing)
    }

    fn visit_none<E: de::Error>(self) -> Result<YearValue, E> {
        Ok(YearValue::Missing)
    }

    fn visit_unit<E: de::Error>(self) -> Result<YearValue, E> {
        Ok(YearValue::Missing)
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<YearValue, D::Error> {
        deserializer.deserialize_any(YearValueVisitor)
    }

    // Structured values are not years; consume and discard them.
    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<YearValue, A::Error> {
        while seq.next_element::<IgnoredAny>()?.is_some() {}
        Ok(YearValue::Missing)
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<YearValue, A::Error> {
        while map.next_entry::<IgnoredAny, IgnoredAny>()?.is_some() {}
        Ok(YearValue::Missing)
    }
}

impl<'de> Deserialize<'de> for YearValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(YearValueVisitor)
    }
}
