use chrono::NaiveTime;
use scraper::{ElementRef, Html, Selector};
use tracing::debug;

use super::{
    attr, child, class_tokens, parse_clock, parse_degrees, phrase, selector, split_last_chars,
    text_content,
};
use crate::error::{Result, ScrapeError};

/// The hour label ends in `:MM`; everything before those three characters is the hour.
const MINUTES_SUFFIX_CHARS: usize = 3;
/// The precipitation comment ends with a two-character unit, which must be `mm`.
const PRECIPITATION_UNIT_CHARS: usize = 2;
const PRECIPITATION_UNIT: &str = "mm";

/// One hour card from the hourly forecast page, before any mapping.
#[derive(Debug, Clone, PartialEq)]
pub struct RawHour {
    pub time: NaiveTime,
    /// Lowercased weather phrase.
    pub condition: String,
    pub temperature: f64,
    pub wind_force: String,
    pub wind_bearing: u16,
    /// Millimetres, from the comment that carries the unrounded figure.
    pub precipitation: f64,
    pub precipitation_probability: u8,
}

#[derive(Debug)]
pub struct HourlyExtractor {
    card: Selector,
    hour: Selector,
    icon_container: Selector,
    link: Selector,
    temperature_graph: Selector,
    temperature_value: Selector,
    wind: Selector,
    wind_icon: Selector,
    rain_level: Selector,
    rain_chance: Selector,
}

impl HourlyExtractor {
    pub fn new() -> Result<Self> {
        Ok(Self {
            card: selector("div.new-hourly-forecast-card")?,
            hour: selector("div.ik.new-hourly-forecast-hour")?,
            icon_container: selector("div.ik.forecast-icon-container")?,
            link: selector("a")?,
            temperature_graph: selector("div.ik.tempBarGraph")?,
            temperature_value: selector("div.ik.tempValue")?,
            wind: selector("div.ik.hourly-wind")?,
            wind_icon: selector("div")?,
            rain_level: selector("div.ik.hourly-rainlevel")?,
            rain_chance: selector("div.ik.hourly-rain-chance")?,
        })
    }

    /// Cards in document order. Dates are assigned later from the hour sequence.
    pub fn extract(&self, document: &Html) -> Result<Vec<RawHour>> {
        let hours = document
            .select(&self.card)
            .map(|card| self.extract_card(card))
            .collect::<Result<Vec<_>>>()?;

        if hours.is_empty() {
            return Err(ScrapeError::MissingElement {
                field: "hourly forecast card",
            });
        }
        Ok(hours)
    }

    fn extract_card(&self, card: ElementRef<'_>) -> Result<RawHour> {
        let time = hour_label(&text_content(&child(card, &self.hour, "hourly hour")?))?;

        let icon_container = child(card, &self.icon_container, "hourly condition")?;
        let icon_link = child(icon_container, &self.link, "hourly condition")?;
        let condition = phrase(attr(icon_link, "data-bs-content", "hourly condition")?);

        let graph = child(card, &self.temperature_graph, "hourly temperature")?;
        let value = child(graph, &self.temperature_value, "hourly temperature")?;
        let value_link = child(value, &self.link, "hourly temperature")?;
        let temperature = parse_degrees("hourly temperature", &text_content(&value_link))?;

        let wind = child(card, &self.wind, "hourly wind")?;
        let wind_link = child(wind, &self.link, "hourly wind")?;
        let wind_icon = child(wind_link, &self.wind_icon, "hourly wind")?;
        let (wind_force, wind_bearing) = wind_tokens(&class_tokens(wind_icon, "hourly wind")?)?;

        let (precipitation, precipitation_probability) =
            match card.select(&self.rain_level).next() {
                Some(level) => (precipitation_comment(level)?, self.rain_chance(card)?),
                None => (0.0, 0),
            };

        debug!(
            %time,
            condition = %condition,
            temperature,
            wind_force,
            wind_bearing,
            precipitation,
            precipitation_probability,
            "Extracted hourly card"
        );

        Ok(RawHour {
            time,
            condition,
            temperature,
            wind_force: wind_force.to_string(),
            wind_bearing,
            precipitation,
            precipitation_probability,
        })
    }

    /// `40%` in the chance element's link.
    fn rain_chance(&self, card: ElementRef<'_>) -> Result<u8> {
        const FIELD: &str = "hourly precipitation probability";

        let chance = child(card, &self.rain_chance, FIELD)?;
        let text = text_content(&child(chance, &self.link, FIELD)?);
        text.strip_suffix('%')
            .and_then(|value| value.trim().parse::<u8>().ok())
            .filter(|percent| *percent <= 100)
            .ok_or_else(|| ScrapeError::unexpected(FIELD, text.as_str()))
    }
}

/// `HH:MM`, with the hour read from everything but the last three characters.
fn hour_label(text: &str) -> Result<NaiveTime> {
    const FIELD: &str = "hourly hour";

    let (hour, minutes) = split_last_chars(text, MINUTES_SUFFIX_CHARS)
        .ok_or_else(|| ScrapeError::unexpected(FIELD, text))?;
    if !minutes.starts_with(':') || hour.parse::<u32>().is_err() {
        return Err(ScrapeError::unexpected(FIELD, text));
    }
    parse_clock(FIELD, text)
}

/// Second-to-last class token is the force label, the last is a one-letter
/// prefix followed by the bearing in degrees, e.g. `r158`.
fn wind_tokens<'a>(tokens: &[&'a str]) -> Result<(&'a str, u16)> {
    const FIELD: &str = "hourly wind";

    let [.., force, bearing] = tokens else {
        return Err(ScrapeError::unexpected(FIELD, tokens.join(" ")));
    };

    let mut chars = bearing.chars();
    let prefixed = chars.next().is_some_and(char::is_alphabetic);
    let degrees = chars
        .as_str()
        .parse::<u16>()
        .ok()
        .filter(|degrees| prefixed && *degrees <= 360)
        .ok_or_else(|| ScrapeError::unexpected(FIELD, *bearing))?;

    Ok((*force, degrees))
}

/// The visible rain figure is rounded; the first comment inside the element
/// carries the precise amount with its unit, e.g. `<!--1.4mm-->`.
///
/// The unit is cut off by position, so anything but `mm` in those two
/// characters means the format changed.
fn precipitation_comment(level: ElementRef<'_>) -> Result<f64> {
    const FIELD: &str = "hourly precipitation";

    let comment = level
        .descendants()
        .find_map(|node| {
            node.value()
                .as_comment()
                .map(|comment| comment.trim().to_string())
        })
        .ok_or(ScrapeError::MissingElement { field: FIELD })?;

    let (value, unit) = split_last_chars(&comment, PRECIPITATION_UNIT_CHARS)
        .ok_or_else(|| ScrapeError::unexpected(FIELD, comment.as_str()))?;
    if !unit.eq_ignore_ascii_case(PRECIPITATION_UNIT) {
        return Err(ScrapeError::unexpected(FIELD, comment.as_str()));
    }

    value
        .trim()
        .parse()
        .map_err(|_| ScrapeError::unexpected(FIELD, comment.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn card(
        hour: &str,
        phrase: &str,
        temperature: &str,
        wind: &str,
        rain: Option<(&str, &str)>,
    ) -> String {
        let (rain_level, rain_chance) = rain
            .map(|(comment, chance)| {
                (
                    format!(r#"<div class="ik hourly-rainlevel"><!--{comment}--><a>1</a></div>"#),
                    format!(r#"<div class="ik hourly-rain-chance"><a>{chance}</a></div>"#),
                )
            })
            .unwrap_or_default();
        format!(
            r#"<div class="new-hourly-forecast-card">
                 <div class="ik new-hourly-forecast-hour">{hour}</div>
                 <div class="ik forecast-icon-container"><a data-bs-content="{phrase}"><img src="/i.svg"></a></div>
                 <div class="ik tempBarGraph"><div class="ik tempValue"><a>{temperature}</a></div></div>
                 <div class="ik hourly-wind"><a><div class="{wind}"></div></a></div>
                 <div class="ik rain-wrapper">{rain_level}</div>
                 {rain_chance}
               </div>"#
        )
    }

    fn page(cards: &[String]) -> Html {
        Html::parse_document(&format!("<div class='hourly'>{}</div>", cards.concat()))
    }

    fn time(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn rainy_card(comment: &str) -> Html {
        page(&[card(
            "10:00",
            "Eső",
            "5°",
            "ik wind enyhe r90",
            Some((comment, "60%")),
        )])
    }

    #[test]
    fn extracts_cards_in_order() {
        let doc = page(&[
            card(
                "23:00",
                "Gyenge eső",
                "0°",
                "ik wind elenk r270",
                Some(("1.4mm", "60%")),
            ),
            card("0:00", "Derült", "-1°", "ik wind szélcsend r0", None),
        ]);

        let hours = HourlyExtractor::new().unwrap().extract(&doc).unwrap();

        assert_eq!(
            hours,
            vec![
                RawHour {
                    time: time(23, 0),
                    condition: "gyenge eső".into(),
                    temperature: 0.0,
                    wind_force: "elenk".into(),
                    wind_bearing: 270,
                    precipitation: 1.4,
                    precipitation_probability: 60,
                },
                RawHour {
                    time: time(0, 0),
                    condition: "derült".into(),
                    temperature: -1.0,
                    wind_force: "szélcsend".into(),
                    wind_bearing: 0,
                    precipitation: 0.0,
                    precipitation_probability: 0,
                },
            ]
        );
    }

    #[test]
    fn hour_must_be_a_direct_child() {
        let nested = card("10:00", "Napos", "5°", "ik wind enyhe r90", None).replace(
            r#"<div class="ik new-hourly-forecast-hour">10:00</div>"#,
            r#"<div><div class="ik new-hourly-forecast-hour">10:00</div></div>"#,
        );
        let err = HourlyExtractor::new()
            .unwrap()
            .extract(&page(&[nested]))
            .unwrap_err();
        assert!(matches!(
            err,
            ScrapeError::MissingElement {
                field: "hourly hour"
            }
        ));
    }

    #[test]
    fn rain_level_without_comment_fails() {
        let doc = page(&[card(
            "10:00",
            "Eső",
            "5°",
            "ik wind enyhe r90",
            Some(("1.4mm", "60%")),
        )
        .replace("<!--1.4mm-->", "")]);
        let err = HourlyExtractor::new().unwrap().extract(&doc).unwrap_err();
        assert!(matches!(
            err,
            ScrapeError::MissingElement {
                field: "hourly precipitation"
            }
        ));
    }

    #[test]
    fn rain_comment_without_unit_fails() {
        let extractor = HourlyExtractor::new().unwrap();
        for comment in ["1.4", "0.25", "1.4cm", "mm"] {
            let err = extractor.extract(&rainy_card(comment)).unwrap_err();
            assert!(
                matches!(
                    err,
                    ScrapeError::UnexpectedValue {
                        field: "hourly precipitation",
                        ..
                    }
                ),
                "{comment}"
            );
        }
    }

    #[test]
    fn rain_comment_unit_ignores_case() {
        let hours = HourlyExtractor::new()
            .unwrap()
            .extract(&rainy_card(" 0.25MM "))
            .unwrap();
        assert_eq!(hours[0].precipitation, 0.25);
    }

    #[test]
    fn rain_level_without_chance_fails() {
        let doc = page(&[card(
            "10:00",
            "Eső",
            "5°",
            "ik wind enyhe r90",
            Some(("0.3mm", "20")),
        )]);
        let err = HourlyExtractor::new().unwrap().extract(&doc).unwrap_err();
        assert!(matches!(
            err,
            ScrapeError::UnexpectedValue {
                field: "hourly precipitation probability",
                ..
            }
        ));
    }

    #[test]
    fn hour_label_reads_hour_before_minutes() {
        assert_eq!(hour_label("14:00").unwrap(), time(14, 0));
        assert_eq!(hour_label("7:30").unwrap(), time(7, 30));
        assert!(hour_label("14h").is_err());
        assert!(hour_label("14:0").is_err());
    }

    #[test]
    fn wind_tokens_use_last_two_positions() {
        assert_eq!(
            wind_tokens(&["ik", "wind-icon", "gyenge", "r158"]).unwrap(),
            ("gyenge", 158)
        );
        assert_eq!(wind_tokens(&["viharos", "d5"]).unwrap(), ("viharos", 5));
    }

    #[test]
    fn malformed_bearing_fails() {
        assert!(wind_tokens(&["ik", "gyenge", "158"]).is_err());
        assert!(wind_tokens(&["ik", "gyenge", "r"]).is_err());
        assert!(wind_tokens(&["ik", "gyenge", "r400"]).is_err());
        assert!(wind_tokens(&["r158"]).is_err());
    }
}
