//! Structural HTML extraction.
//!
//! Each extractor locates its anchor element with a CSS selector, walks a fixed
//! chain of child selectors and reads either text or an attribute. A selector
//! that matches nothing fails the field; the only tolerated absences are the
//! rain elements, which default to zero.

use chrono::NaiveTime;
use scraper::{ElementRef, Html, Selector};

use crate::error::{Result, ScrapeError};

pub mod current;
pub mod daily;
pub mod hourly;

pub use current::{CurrentExtractor, RawCurrent};
pub use daily::{DailyExtractor, RawDay};
pub use hourly::{HourlyExtractor, RawHour};

/// All three page shapes, compiled once.
#[derive(Debug)]
pub struct Extractors {
    pub current: CurrentExtractor,
    pub daily: DailyExtractor,
    pub hourly: HourlyExtractor,
}

impl Extractors {
    pub fn new() -> Result<Self> {
        Ok(Self {
            current: CurrentExtractor::new()?,
            daily: DailyExtractor::new()?,
            hourly: HourlyExtractor::new()?,
        })
    }
}

pub(crate) fn selector(css: &'static str) -> Result<Selector> {
    Selector::parse(css).map_err(|err| ScrapeError::Selector {
        selector: css,
        reason: err.to_string(),
    })
}

pub(crate) fn find<'a>(
    document: &'a Html,
    selector: &Selector,
    field: &'static str,
) -> Result<ElementRef<'a>> {
    document
        .select(selector)
        .next()
        .ok_or(ScrapeError::MissingElement { field })
}

/// First descendant of `scope` matching `selector`.
pub(crate) fn find_within<'a>(
    scope: ElementRef<'a>,
    selector: &Selector,
    field: &'static str,
) -> Result<ElementRef<'a>> {
    scope
        .select(selector)
        .next()
        .ok_or(ScrapeError::MissingElement { field })
}

/// First direct child of `parent` matching `selector`.
pub(crate) fn child<'a>(
    parent: ElementRef<'a>,
    selector: &Selector,
    field: &'static str,
) -> Result<ElementRef<'a>> {
    parent
        .children()
        .filter_map(ElementRef::wrap)
        .find(|element| selector.matches(element))
        .ok_or(ScrapeError::MissingElement { field })
}

pub(crate) fn attr<'a>(
    element: ElementRef<'a>,
    name: &'static str,
    field: &'static str,
) -> Result<&'a str> {
    element
        .value()
        .attr(name)
        .ok_or(ScrapeError::MissingAttribute { field, attr: name })
}

/// Class tokens in attribute order.
pub(crate) fn class_tokens<'a>(
    element: ElementRef<'a>,
    field: &'static str,
) -> Result<Vec<&'a str>> {
    Ok(attr(element, "class", field)?.split_whitespace().collect())
}

pub(crate) fn text_content(element: &ElementRef<'_>) -> String {
    element
        .text()
        .collect::<Vec<_>>()
        .join("")
        .trim()
        .to_string()
}

/// Normalize a weather phrase to the shape the vocabulary is keyed by.
pub(crate) fn phrase(text: &str) -> String {
    text.trim().to_lowercase()
}

/// Drop the first `count` characters. `None` if nothing would remain.
pub(crate) fn skip_chars(text: &str, count: usize) -> Option<&str> {
    text.char_indices().nth(count).map(|(idx, _)| &text[idx..])
}

/// Split off the last `count` characters. `None` if the text is not longer than that.
pub(crate) fn split_last_chars(text: &str, count: usize) -> Option<(&str, &str)> {
    if count == 0 {
        return Some((text, ""));
    }
    let (idx, _) = text.char_indices().rev().nth(count - 1)?;
    if idx == 0 {
        return None;
    }
    Some(text.split_at(idx))
}

/// `H:MM` or `HH:MM`.
pub(crate) fn parse_clock(field: &'static str, text: &str) -> Result<NaiveTime> {
    let text = text.trim();
    let (hour, minute) = text
        .split_once(':')
        .ok_or_else(|| ScrapeError::unexpected(field, text))?;

    let hour: u32 = hour
        .parse()
        .map_err(|_| ScrapeError::unexpected(field, text))?;
    let minute: u32 = minute
        .parse()
        .map_err(|_| ScrapeError::unexpected(field, text))?;

    NaiveTime::from_hms_opt(hour, minute, 0)
        .ok_or_else(|| ScrapeError::unexpected(field, text))
}

/// A temperature label such as `7°` or `-2˚`, with an optional trailing degree sign.
pub(crate) fn parse_degrees(field: &'static str, text: &str) -> Result<f64> {
    let text = text.trim();
    let value = text.trim_end_matches(['°', '˚']);
    value
        .parse()
        .map_err(|_| ScrapeError::unexpected(field, text))
}
