use thiserror::Error;

/// Everything that can sink a fetch cycle.
///
/// The variants exist for diagnostics only: above the coordinator every one of
/// them is reported the same way, as a failed cycle.
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("Failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("Request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} responded with HTTP {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("Invalid location {0:?}")]
    InvalidLocation(String),

    #[error("Invalid base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    #[error("Invalid selector '{selector}': {reason}")]
    Selector {
        selector: &'static str,
        reason: String,
    },

    #[error("Page has no element for '{field}'")]
    MissingElement { field: &'static str },

    #[error("Element for '{field}' has no '{attr}' attribute")]
    MissingAttribute {
        field: &'static str,
        attr: &'static str,
    },

    #[error("Unexpected value for '{field}': {value:?}")]
    UnexpectedValue { field: &'static str, value: String },

    #[error("Invalid date: day {day} does not exist in {year}-{month:02}")]
    InvalidDate { year: i32, month: u32, day: u32 },
}

impl ScrapeError {
    pub(crate) fn unexpected(field: &'static str, value: impl Into<String>) -> Self {
        ScrapeError::UnexpectedValue {
            field,
            value: value.into(),
        }
    }
}

pub type Result<T, E = ScrapeError> = std::result::Result<T, E>;
