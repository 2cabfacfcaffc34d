use std::time::Duration;

use async_trait::async_trait;
use chrono::{Local, NaiveDateTime, NaiveTime};
use reqwest::{Client, Url};
use scraper::Html;
use tracing::{debug, info, instrument, warn};

use crate::{
    error::{Result, ScrapeError},
    extract::Extractors,
    mapping::Vocabulary,
    model::{ForecastEntry, ResultBundle, TemperatureUnit, WeatherObservation},
    resolve::{HourlyTimeline, apply_daynight, resolve_date},
};

use super::WeatherProvider;

pub const DEFAULT_BASE_URL: &str = "https://www.idokep.hu";
pub const DEFAULT_LOCATION: &str = "Budapest";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Current conditions and the daily forecast.
const CURRENT_SECTION: &str = "idojaras";
/// Hourly forecast.
const HOURLY_SECTION: &str = "elorejelzes";

/// Source of "now" for a fetch cycle, local wall-clock time.
pub type Clock = fn() -> NaiveDateTime;

fn local_now() -> NaiveDateTime {
    Local::now().naive_local()
}

/// Scrapes idokep.hu: two pages per cycle, normalized into a [`ResultBundle`].
#[derive(Debug)]
pub struct IdokepProvider {
    http: Client,
    base_url: Url,
    default_location: String,
    vocabulary: Vocabulary,
    extractors: Extractors,
    clock: Clock,
}

#[derive(Debug, Clone)]
pub struct IdokepProviderBuilder {
    base_url: String,
    timeout: Duration,
    default_location: String,
    vocabulary: Vocabulary,
    clock: Clock,
}

impl Default for IdokepProviderBuilder {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            default_location: DEFAULT_LOCATION.to_string(),
            vocabulary: Vocabulary::default(),
            clock: local_now,
        }
    }
}

impl IdokepProviderBuilder {
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn default_location(mut self, location: impl Into<String>) -> Self {
        self.default_location = location.into();
        self
    }

    pub fn vocabulary(mut self, vocabulary: Vocabulary) -> Self {
        self.vocabulary = vocabulary;
        self
    }

    pub fn clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn build(self) -> Result<IdokepProvider> {
        let invalid = |reason: String| ScrapeError::InvalidBaseUrl {
            url: self.base_url.clone(),
            reason,
        };

        let base_url =
            Url::parse(&self.base_url).map_err(|err| invalid(err.to_string()))?;
        if base_url.cannot_be_a_base() {
            return Err(invalid("URL cannot carry a path".to_string()));
        }

        let http = Client::builder()
            .timeout(self.timeout)
            .user_agent(concat!("idokep-core/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(ScrapeError::Client)?;

        Ok(IdokepProvider {
            http,
            base_url,
            default_location: self.default_location,
            vocabulary: self.vocabulary,
            extractors: Extractors::new()?,
            clock: self.clock,
        })
    }
}

impl IdokepProvider {
    pub fn builder() -> IdokepProviderBuilder {
        IdokepProviderBuilder::default()
    }

    /// Provider for the public site with the built-in vocabulary.
    pub fn new() -> Result<Self> {
        Self::builder().build()
    }

    pub fn default_location(&self) -> &str {
        &self.default_location
    }

    /// `<base>/<section>/<location>`, with the location percent-encoded as a
    /// single path segment.
    pub fn page_url(&self, section: &str, location: &str) -> Result<Url> {
        let location = location.trim();
        if location.is_empty() || location == "." || location == ".." {
            return Err(ScrapeError::InvalidLocation(location.to_string()));
        }

        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| ScrapeError::InvalidBaseUrl {
                url: self.base_url.to_string(),
                reason: "URL cannot carry a path".to_string(),
            })?
            .pop_if_empty()
            .push(section)
            .push(location);
        Ok(url)
    }

    /// One fetch cycle as of `now`. Both pages are requested concurrently;
    /// nothing is assembled unless both arrive.
    #[instrument(skip(self))]
    pub async fn fetch_at(
        &self,
        location: Option<&str>,
        now: NaiveDateTime,
    ) -> Result<ResultBundle> {
        let location = location.unwrap_or(self.default_location.as_str()).trim();

        let current_url = self.page_url(CURRENT_SECTION, location)?;
        let hourly_url = self.page_url(HOURLY_SECTION, location)?;

        let (current_page, hourly_page) =
            tokio::try_join!(self.get_page(current_url), self.get_page(hourly_url))?;

        let bundle = self.assemble(location, &current_page, &hourly_page, now)?;
        info!(
            location,
            condition = %bundle.current.condition,
            hourly = bundle.hourly.len(),
            daily = bundle.daily.len(),
            "Fetched weather"
        );
        Ok(bundle)
    }

    /// Parse both pages and normalize them into a bundle.
    ///
    /// `now` supplies today's date for the sun times, the day-of-month
    /// resolution and the first hourly card, and the time of day for the
    /// current condition's day/night check.
    pub fn assemble(
        &self,
        location: &str,
        current_page: &str,
        hourly_page: &str,
        now: NaiveDateTime,
    ) -> Result<ResultBundle> {
        let today = now.date();

        let (raw_current, raw_days) = {
            let document = Html::parse_document(current_page);
            (
                self.extractors.current.extract(&document)?,
                self.extractors.daily.extract(&document)?,
            )
        };
        let raw_hours = self.extractors.hourly.extract(&Html::parse_document(hourly_page))?;

        let (sunrise, sunset) = (raw_current.sunrise, raw_current.sunset);
        let conditions = &self.vocabulary.conditions;

        let current = WeatherObservation {
            condition: apply_daynight(
                conditions.map(&raw_current.condition),
                now.time(),
                sunrise,
                sunset,
            ),
            temperature: raw_current.temperature,
            // The parsed suffix was validated as Celsius by the extractor.
            temperature_unit: TemperatureUnit::Celsius,
            icon_url: raw_current.icon_url,
            sunrise: today.and_time(sunrise),
            sunset: today.and_time(sunset),
        };

        let daily = raw_days
            .into_iter()
            .map(|day| -> Result<ForecastEntry> {
                let date = resolve_date(day.day_of_month, today)?;
                Ok(ForecastEntry {
                    datetime: date.and_time(NaiveTime::default()),
                    condition: conditions.map(&day.condition),
                    temperature: day.max_temperature,
                    templow: Some(day.min_temperature),
                    precipitation: day.precipitation,
                    precipitation_probability: None,
                    wind_speed: None,
                    wind_bearing: None,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let mut timeline = HourlyTimeline::starting(today);
        let hourly = raw_hours
            .into_iter()
            .map(|hour| {
                let wind_speed = self.vocabulary.wind.map(&hour.wind_force);
                if wind_speed.is_none() {
                    debug!(label = %hour.wind_force, "Unknown wind force label");
                }

                ForecastEntry {
                    datetime: timeline.advance(hour.time),
                    condition: apply_daynight(
                        conditions.map(&hour.condition),
                        hour.time,
                        sunrise,
                        sunset,
                    ),
                    temperature: hour.temperature,
                    templow: None,
                    precipitation: hour.precipitation,
                    precipitation_probability: Some(hour.precipitation_probability),
                    wind_speed,
                    wind_bearing: Some(hour.wind_bearing),
                }
            })
            .collect();

        Ok(ResultBundle {
            location: location.to_string(),
            current,
            hourly: chronological("hourly", hourly),
            daily: chronological("daily", daily),
        })
    }

    async fn get_page(&self, url: Url) -> Result<String> {
        debug!(%url, "Fetching page");

        let request_failed = |source| ScrapeError::Request {
            url: url.to_string(),
            source,
        };

        let res = self
            .http
            .get(url.clone())
            .send()
            .await
            .map_err(request_failed)?;

        let status = res.status();
        if !status.is_success() {
            return Err(ScrapeError::Status {
                url: url.to_string(),
                status,
            });
        }

        res.text().await.map_err(request_failed)
    }
}

/// Document order is chronological on the live site; sort anyway and drop
/// entries whose timestamp was already taken.
fn chronological(kind: &'static str, mut entries: Vec<ForecastEntry>) -> Vec<ForecastEntry> {
    if !entries.is_sorted_by_key(|entry| entry.datetime) {
        warn!(kind, "Forecast entries out of order, sorting");
        entries.sort_by_key(|entry| entry.datetime);
    }

    let before = entries.len();
    entries.dedup_by_key(|entry| entry.datetime);
    if entries.len() != before {
        warn!(
            kind,
            dropped = before - entries.len(),
            "Dropped forecast entries with duplicate timestamps"
        );
    }
    entries
}

#[async_trait]
impl WeatherProvider for IdokepProvider {
    async fn fetch(&self, location: Option<&str>) -> Result<ResultBundle> {
        self.fetch_at(location, (self.clock)()).await
    }
}
