//! Serde helpers for ISO calendar dates where collaborators send `""` to mean
//! "not set".

use chrono::NaiveDate;
use serde::{de, Deserialize, Deserializer, Serializer};

use crate::services::schedule_utils::DATE_FORMAT as FORMAT;

fn parse<E: de::Error>(raw: Option<String>) -> Result<Option<NaiveDate>, E> {
    match raw {
        None => Ok(None),
        Some(value) if value.trim().is_empty() => Ok(None),
        Some(value) => NaiveDate::parse_from_str(value.trim(), FORMAT)
            .map(Some)
            .map_err(|err| E::custom(format!("invalid date {value:?}: {err}"))),
    }
}

/// `Option<NaiveDate>` written as `"YYYY-MM-DD"` or `""`.
pub mod optional {
    use super::*;

    pub fn serialize<S: Serializer>(value: &Option<NaiveDate>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(date) => serializer.serialize_str(&date.format(FORMAT).to_string()),
            None => serializer.serialize_str(""),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<NaiveDate>, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        parse(raw)
    }
}

/// Patch semantics: absent field is `None`, `null`/`""` clears, a date sets.
/// Use with `#[serde(default)]`.
pub mod patch {
    use super::*;

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Option<NaiveDate>>, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        parse(raw).map(Some)
    }
}
