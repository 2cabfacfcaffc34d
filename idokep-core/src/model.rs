use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Canonical weather condition tokens understood by consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Condition {
    ClearNight,
    Cloudy,
    Exceptional,
    Fog,
    Hail,
    Lightning,
    LightningRainy,
    PartlyCloudy,
    Pouring,
    Rainy,
    Snowy,
    SnowyRainy,
    Sunny,
    Windy,
    WindyVariant,
}

impl Condition {
    pub fn as_str(&self) -> &'static str {
        match self {
            Condition::ClearNight => "clear-night",
            Condition::Cloudy => "cloudy",
            Condition::Exceptional => "exceptional",
            Condition::Fog => "fog",
            Condition::Hail => "hail",
            Condition::Lightning => "lightning",
            Condition::LightningRainy => "lightning-rainy",
            Condition::PartlyCloudy => "partlycloudy",
            Condition::Pouring => "pouring",
            Condition::Rainy => "rainy",
            Condition::Snowy => "snowy",
            Condition::SnowyRainy => "snowy-rainy",
            Condition::Sunny => "sunny",
            Condition::Windy => "windy",
            Condition::WindyVariant => "windy-variant",
        }
    }

    pub const fn all() -> &'static [Condition] {
        &[
            Condition::ClearNight,
            Condition::Cloudy,
            Condition::Exceptional,
            Condition::Fog,
            Condition::Hail,
            Condition::Lightning,
            Condition::LightningRainy,
            Condition::PartlyCloudy,
            Condition::Pouring,
            Condition::Rainy,
            Condition::Snowy,
            Condition::SnowyRainy,
            Condition::Sunny,
            Condition::Windy,
            Condition::WindyVariant,
        ]
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Condition {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Condition::all()
            .iter()
            .copied()
            .find(|c| c.as_str() == value)
            .ok_or_else(|| anyhow::anyhow!("Unknown condition token '{value}'."))
    }
}

/// A condition as seen by consumers: either a canonical token or the
/// source phrase passed through verbatim because the vocabulary has no entry for it.
///
/// Serialized as a bare string. Reading one back cannot tell the branches
/// apart, so a `Raw` phrase spelled exactly like a canonical token (say
/// `"sunny"`) deserializes as `Mapped`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ConditionValue {
    Mapped(Condition),
    Raw(String),
}

impl ConditionValue {
    pub fn as_str(&self) -> &str {
        match self {
            ConditionValue::Mapped(condition) => condition.as_str(),
            ConditionValue::Raw(raw) => raw,
        }
    }

    pub fn is(&self, condition: Condition) -> bool {
        matches!(self, ConditionValue::Mapped(c) if *c == condition)
    }
}

impl fmt::Display for ConditionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Canonical tokens become `Mapped`, anything else stays `Raw`.
impl From<String> for ConditionValue {
    fn from(value: String) -> Self {
        match value.parse::<Condition>() {
            Ok(condition) => ConditionValue::Mapped(condition),
            Err(_) => ConditionValue::Raw(value),
        }
    }
}

impl From<ConditionValue> for String {
    fn from(value: ConditionValue) -> Self {
        match value {
            ConditionValue::Mapped(condition) => condition.as_str().to_string(),
            ConditionValue::Raw(raw) => raw,
        }
    }
}

/// The page prints a unit suffix, but every reading is reported in Celsius.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TemperatureUnit {
    #[default]
    #[serde(rename = "°C")]
    Celsius,
}

impl TemperatureUnit {
    pub const fn symbol(&self) -> &'static str {
        match self {
            TemperatureUnit::Celsius => "°C",
        }
    }
}

/// Current conditions for the configured location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherObservation {
    pub condition: ConditionValue,
    pub temperature: f64,
    pub temperature_unit: TemperatureUnit,
    pub icon_url: String,
    pub sunrise: NaiveDateTime,
    pub sunset: NaiveDateTime,
}

/// One daily or hourly forecast slot.
///
/// Daily entries carry `templow` and leave the wind fields empty; hourly
/// entries carry probability and wind and leave `templow` empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastEntry {
    pub datetime: NaiveDateTime,
    pub condition: ConditionValue,
    /// Hourly value, or the daily maximum.
    pub temperature: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub templow: Option<f64>,
    /// Millimetres.
    pub precipitation: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub precipitation_probability: Option<u8>,
    /// km/h, absent when the force label is not in the vocabulary.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wind_speed: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wind_bearing: Option<u16>,
}

/// Snapshot produced by one successful fetch cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultBundle {
    pub location: String,
    pub current: WeatherObservation,
    pub hourly: Vec<ForecastEntry>,
    pub daily: Vec<ForecastEntry>,
}
