use chrono::NaiveTime;
use scraper::{ElementRef, Html, Selector};
use tracing::debug;

use super::{
    attr, find, find_within, parse_clock, phrase, selector, skip_chars, split_last_chars,
    text_content,
};
use crate::error::{Result, ScrapeError};

/// `napkelte ` precedes the sunrise time in the icon's parent text.
const SUNRISE_LABEL_CHARS: usize = 9;
/// `napnyugta ` precedes the sunset time.
const SUNSET_LABEL_CHARS: usize = 10;
/// The temperature ends with a two-character unit, e.g. `°C`.
const TEMPERATURE_UNIT_CHARS: usize = 2;

/// Fields read from the current-conditions page, before any mapping.
#[derive(Debug, Clone, PartialEq)]
pub struct RawCurrent {
    pub sunrise: NaiveTime,
    pub sunset: NaiveTime,
    /// Lowercased weather phrase.
    pub condition: String,
    pub icon_url: String,
    pub temperature: f64,
    pub unit: String,
}

#[derive(Debug)]
pub struct CurrentExtractor {
    sunrise_icon: Selector,
    sunset_icon: Selector,
    condition: Selector,
    lockup: Selector,
    big_icon: Selector,
    temperature: Selector,
}

impl CurrentExtractor {
    pub fn new() -> Result<Self> {
        Ok(Self {
            sunrise_icon: selector(r#"img[src="/assets/icons/sunrise.svg"]"#)?,
            sunset_icon: selector(r#"img[src="/assets/icons/sunset.svg"]"#)?,
            condition: selector("div.ik.current-weather")?,
            lockup: selector("div.current-weather-lockup")?,
            big_icon: selector("img.ik.forecast-bigicon")?,
            temperature: selector("div.ik.current-temperature")?,
        })
    }

    pub fn extract(&self, document: &Html) -> Result<RawCurrent> {
        let sunrise = sun_time(document, &self.sunrise_icon, SUNRISE_LABEL_CHARS, "sunrise")?;
        let sunset = sun_time(document, &self.sunset_icon, SUNSET_LABEL_CHARS, "sunset")?;

        let condition = phrase(&text_content(&find(
            document,
            &self.condition,
            "current condition",
        )?));

        let lockup = find(document, &self.lockup, "current weather icon")?;
        let icon = find_within(lockup, &self.big_icon, "current weather icon")?;
        let icon_url = attr(icon, "src", "current weather icon")?.to_string();

        let temperature_text = text_content(&find(
            document,
            &self.temperature,
            "current temperature",
        )?);
        let (temperature, unit) = split_temperature(&temperature_text)?;

        debug!(
            %sunrise,
            %sunset,
            condition = %condition,
            icon_url = %icon_url,
            temperature,
            unit,
            "Extracted current conditions"
        );

        Ok(RawCurrent {
            sunrise,
            sunset,
            condition,
            icon_url,
            temperature,
            unit: unit.to_string(),
        })
    }
}

fn sun_time(
    document: &Html,
    icon: &Selector,
    label_chars: usize,
    field: &'static str,
) -> Result<NaiveTime> {
    let icon = find(document, icon, field)?;
    let holder = icon
        .parent()
        .and_then(ElementRef::wrap)
        .ok_or(ScrapeError::MissingElement { field })?;

    let text = text_content(&holder).to_lowercase();
    let time = skip_chars(&text, label_chars)
        .ok_or_else(|| ScrapeError::unexpected(field, text.as_str()))?;
    parse_clock(field, time)
}

/// Value and unit by position: the last two characters are the unit.
///
/// Anything but a degree sign followed by `C` in those two characters means the
/// format changed, and slicing further would produce a wrong number.
fn split_temperature(text: &str) -> Result<(f64, &str)> {
    const FIELD: &str = "current temperature";

    let (value, unit) = split_last_chars(text, TEMPERATURE_UNIT_CHARS)
        .ok_or_else(|| ScrapeError::unexpected(FIELD, text))?;

    let mut unit_chars = unit.chars();
    let degree = unit_chars.next().is_some_and(|c| c == '°' || c == '˚');
    let celsius = unit_chars
        .next()
        .is_some_and(|c| c.eq_ignore_ascii_case(&'c'));
    if !(degree && celsius) {
        return Err(ScrapeError::unexpected(FIELD, text));
    }

    let value = value
        .parse()
        .map_err(|_| ScrapeError::unexpected(FIELD, text))?;
    Ok((value, unit))
}
