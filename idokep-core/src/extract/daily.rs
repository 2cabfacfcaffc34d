use regex::Regex;
use scraper::{Html, Selector};
use tracing::debug;

use super::{attr, class_tokens, find, find_within, parse_degrees, phrase, selector, text_content};
use crate::error::{Result, ScrapeError};

/// Tooltip markup is `<div ...><img ...> phrase</div>`; the phrase follows the image.
const TOOLTIP_PHRASE: &str = r"<div[^>]*>\s*<img[^>]*>\s*([^<]+)";

/// One day column from the current-conditions page, before any mapping.
#[derive(Debug, Clone, PartialEq)]
pub struct RawDay {
    pub day_of_month: u32,
    /// Lowercased weather phrase.
    pub condition: String,
    pub max_temperature: f64,
    pub min_temperature: f64,
    /// Millimetres; zero when the column shows no rain indicator.
    pub precipitation: f64,
}

#[derive(Debug)]
pub struct DailyExtractor {
    container: Selector,
    column: Selector,
    day_number: Selector,
    icon_link: Selector,
    temperatures: Selector,
    rain_container: Selector,
    rain_indicator: Selector,
    tooltip_phrase: Regex,
    digits: Regex,
}

impl DailyExtractor {
    pub fn new() -> Result<Self> {
        Ok(Self {
            container: selector("div#dailyForecast")?,
            column: selector("div.dailyForecastCol")?,
            day_number: selector("span.ik.dfDayNum")?,
            icon_link: selector("div.ik.dfIconAlert a")?,
            temperatures: selector("div.ik.min-max-container a")?,
            rain_container: selector("div.ik.rainlevel-container")?,
            rain_indicator: selector("a span")?,
            tooltip_phrase: regex(TOOLTIP_PHRASE)?,
            digits: regex(r"\d+")?,
        })
    }

    /// Columns in document order, which is chronological.
    pub fn extract(&self, document: &Html) -> Result<Vec<RawDay>> {
        let container = find(document, &self.container, "daily forecast")?;

        let days = container
            .select(&self.column)
            .map(|column| self.extract_column(column))
            .collect::<Result<Vec<_>>>()?;

        if days.is_empty() {
            return Err(ScrapeError::MissingElement {
                field: "daily forecast column",
            });
        }
        Ok(days)
    }

    fn extract_column(&self, column: scraper::ElementRef<'_>) -> Result<RawDay> {
        let day_text = text_content(&find_within(column, &self.day_number, "daily day number")?);
        let day_of_month: u32 = day_text
            .parse()
            .map_err(|_| ScrapeError::unexpected("daily day number", day_text.as_str()))?;

        let link = find_within(column, &self.icon_link, "daily condition")?;
        let tooltip = attr(link, "data-bs-content", "daily condition")?;
        let condition = self
            .tooltip_phrase
            .captures(tooltip)
            .and_then(|captures| captures.get(1))
            .map(|phrase_match| phrase(phrase_match.as_str()))
            .ok_or_else(|| ScrapeError::unexpected("daily condition", tooltip))?;

        let mut temperatures = column.select(&self.temperatures);
        let max_link = temperatures.next().ok_or(ScrapeError::MissingElement {
            field: "daily max temperature",
        })?;
        let min_link = temperatures.next().ok_or(ScrapeError::MissingElement {
            field: "daily min temperature",
        })?;
        let max_temperature = parse_degrees("daily max temperature", &text_content(&max_link))?;
        let min_temperature = parse_degrees("daily min temperature", &text_content(&min_link))?;

        let precipitation = match column.select(&self.rain_container).next() {
            Some(rain) => self.rain_level(rain)?,
            None => 0.0,
        };

        debug!(
            day_of_month,
            condition = %condition,
            max_temperature,
            min_temperature,
            precipitation,
            "Extracted daily column"
        );

        Ok(RawDay {
            day_of_month,
            condition,
            max_temperature,
            min_temperature,
            precipitation,
        })
    }

    /// The level sits in the indicator's second class token, e.g. `rainlevel-3`.
    fn rain_level(&self, rain: scraper::ElementRef<'_>) -> Result<f64> {
        const FIELD: &str = "daily precipitation";

        let indicator = find_within(rain, &self.rain_indicator, FIELD)?;
        let tokens = class_tokens(indicator, FIELD)?;
        let token = tokens
            .get(1)
            .ok_or_else(|| ScrapeError::unexpected(FIELD, tokens.join(" ")))?;

        self.digits
            .find(token)
            .and_then(|digits| digits.as_str().parse().ok())
            .ok_or_else(|| ScrapeError::unexpected(FIELD, *token))
    }
}

fn regex(pattern: &'static str) -> Result<Regex> {
    Regex::new(pattern).map_err(|err| ScrapeError::Selector {
        selector: pattern,
        reason: err.to_string(),
    })
}
