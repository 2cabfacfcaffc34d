//! Core library for the `idokep` CLI.
//!
//! This crate defines:
//! - Scraping of the idokep.hu current-conditions and hourly forecast pages
//! - Normalization into a [`ResultBundle`] with standard condition tokens
//! - A polling [`UpdateCoordinator`] and the sensors that read from it
//! - Configuration handling
//!
//! It is used by `idokep-cli`, but can also be reused by other binaries or services.

pub mod config;
pub mod coordinator;
pub mod error;
pub mod extract;
pub mod mapping;
pub mod model;
pub mod provider;
pub mod resolve;
pub mod sensor;

pub use config::Config;
pub use coordinator::{Snapshot, UpdateCoordinator, UpdateFailed};
pub use error::ScrapeError;
pub use model::{
    Condition, ConditionValue, ForecastEntry, ResultBundle, TemperatureUnit, WeatherObservation,
};
pub use provider::{WeatherProvider, idokep::IdokepProvider, provider_from_config};
