//! Source-language vocabulary lookups.
//!
//! Both tables are plain data handed to the mappers at construction, so a test
//! or a config file can swap in a different vocabulary without touching the
//! lookup logic.

use std::collections::HashMap;

use crate::model::{Condition, ConditionValue};

/// Hungarian weather phrases as they appear on the site, lowercased.
pub const DEFAULT_CONDITIONS: &[(&str, Condition)] = &[
    ("napos", Condition::Sunny),
    ("derült", Condition::Sunny),
    ("borult", Condition::Cloudy),
    ("erősen felhős", Condition::Cloudy),
    ("közepesen felhős", Condition::PartlyCloudy),
    ("gyengén felhős", Condition::PartlyCloudy),
    ("zivatar", Condition::LightningRainy),
    ("zápor", Condition::Rainy),
    ("szitálás", Condition::Rainy),
    ("gyenge eső", Condition::Rainy),
    ("eső", Condition::Rainy),
    ("eső viharos széllel", Condition::Rainy),
    // Not yet seen on the live site, unconfirmed.
    ("köd", Condition::Fog),
    ("párás", Condition::Fog),
    ("pára", Condition::Fog),
    ("villámlás", Condition::Lightning),
    ("erős eső", Condition::Pouring),
    ("jégeső", Condition::Hail),
    ("havazás", Condition::Snowy),
    ("hószállingózás", Condition::Snowy),
    ("havas eső", Condition::SnowyRainy),
    ("fagyott eső", Condition::SnowyRainy),
    ("szeles", Condition::Windy),
    ("száraz zivatar", Condition::Lightning),
];

/// Wind force labels and the speed (km/h) reported for each bucket.
///
/// Buckets are uneven; each value is a hand-picked point inside its range.
/// The unaccented spellings match the class tokens the site emits.
pub const DEFAULT_WIND_FORCES: &[(&str, u32)] = &[
    ("szélcsend", 0),            // 0-1 km/h
    ("gyenge szellő", 4),        // 2-6 km/h
    ("enyhe", 9),                // 7-11 km/h
    ("gyenge", 15),              // 12-19 km/h
    ("mersekelt", 25),           // 20-29 km/h
    ("elenk", 35),               // 30-39 km/h
    ("eros", 45),                // 40-49 km/h
    ("viharos", 55),             // 50-60 km/h
    ("élénk viharos szél", 66),  // 61-72 km/h
    ("heves vihar", 79),         // 73-85 km/h
    ("dühöngő vihar", 93),       // 86-100 km/h
    ("heves szélvész", 108),     // 101-115 km/h
    ("orkán", 118),              // 115-120 km/h
];

#[derive(Debug, Clone)]
pub struct ConditionMapper {
    table: HashMap<String, Condition>,
}

impl ConditionMapper {
    pub fn new<K: Into<String>>(entries: impl IntoIterator<Item = (K, Condition)>) -> Self {
        Self {
            table: entries.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }

    /// Add or replace entries, keeping the rest of the table.
    pub fn with_entries<K: Into<String>>(
        mut self,
        entries: impl IntoIterator<Item = (K, Condition)>,
    ) -> Self {
        self.table
            .extend(entries.into_iter().map(|(k, v)| (k.into(), v)));
        self
    }

    /// Expects a lowercase, trimmed phrase. Unknown phrases come back verbatim.
    pub fn map(&self, phrase: &str) -> ConditionValue {
        match self.table.get(phrase) {
            Some(condition) => ConditionValue::Mapped(*condition),
            None => ConditionValue::Raw(phrase.to_string()),
        }
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

impl Default for ConditionMapper {
    fn default() -> Self {
        Self::new(DEFAULT_CONDITIONS.iter().copied())
    }
}

#[derive(Debug, Clone)]
pub struct WindForceMapper {
    table: HashMap<String, u32>,
}

impl WindForceMapper {
    pub fn new<K: Into<String>>(entries: impl IntoIterator<Item = (K, u32)>) -> Self {
        Self {
            table: entries.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }

    pub fn with_entries<K: Into<String>>(
        mut self,
        entries: impl IntoIterator<Item = (K, u32)>,
    ) -> Self {
        self.table
            .extend(entries.into_iter().map(|(k, v)| (k.into(), v)));
        self
    }

    /// Speed in km/h, or `None` for a label outside the table. A bucket name
    /// means nothing to consumers, so there is no pass-through.
    pub fn map(&self, label: &str) -> Option<u32> {
        self.table.get(label).copied()
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

impl Default for WindForceMapper {
    fn default() -> Self {
        Self::new(DEFAULT_WIND_FORCES.iter().copied())
    }
}

/// Both lookups the orchestrator needs.
#[derive(Debug, Clone, Default)]
pub struct Vocabulary {
    pub conditions: ConditionMapper,
    pub wind: WindForceMapper,
}
