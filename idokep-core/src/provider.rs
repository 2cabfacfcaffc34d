use crate::{Config, ResultBundle, error::ScrapeError, provider::idokep::IdokepProvider};
use async_trait::async_trait;
use std::{fmt::Debug, sync::Arc};

pub mod idokep;

/// Something that can run one complete fetch cycle for a location.
#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    /// `None` falls back to the provider's default location.
    async fn fetch(&self, location: Option<&str>) -> Result<ResultBundle, ScrapeError>;
}

/// Construct the provider described by `config`, vocabulary overrides included.
pub fn provider_from_config(config: &Config) -> anyhow::Result<Arc<dyn WeatherProvider>> {
    let vocabulary = config.vocabulary()?;
    let provider = IdokepProvider::builder()
        .base_url(config.base_url())
        .timeout(config.timeout())
        .default_location(config.location())
        .vocabulary(vocabulary)
        .build()?;

    Ok(Arc::new(provider))
}
