//! Periodic refresh of one location's [`ResultBundle`].
//!
//! The coordinator owns the cache. Consumers never fetch on their own: they
//! read the latest [`Snapshot`] or subscribe to be woken after every cycle.

use std::{future::Future, sync::Arc, time::Duration};

use chrono::{DateTime, Utc};
use tokio::{
    sync::{Mutex, watch},
    time::{Instant, MissedTickBehavior, interval_at},
};
use tracing::{info, warn};

use crate::{model::ResultBundle, provider::WeatherProvider};

pub const UPDATE_INTERVAL: Duration = Duration::from_secs(20 * 60);

/// A failed cycle as consumers see it: one human-readable cause.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("Error communicating with idokep.hu: {0}")]
pub struct UpdateFailed(pub String);

/// What the coordinator knows after its latest cycle.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    /// Last successfully fetched bundle, kept across failed cycles.
    pub data: Option<Arc<ResultBundle>>,
    pub last_update_success: bool,
    pub last_error: Option<String>,
    pub last_success_at: Option<DateTime<Utc>>,
}

impl Snapshot {
    /// Entities reading this snapshot should report a value.
    pub fn available(&self) -> bool {
        self.last_update_success && self.data.is_some()
    }
}

#[derive(Debug)]
pub struct UpdateCoordinator {
    provider: Arc<dyn WeatherProvider>,
    location: Option<String>,
    interval: Duration,
    state: watch::Sender<Snapshot>,
    cycle: Mutex<()>,
}

impl UpdateCoordinator {
    /// `location: None` uses the provider's default location.
    pub fn new(
        provider: Arc<dyn WeatherProvider>,
        location: Option<String>,
        interval: Duration,
    ) -> Self {
        let (state, _) = watch::channel(Snapshot::default());
        Self {
            provider,
            location,
            interval,
            state,
            cycle: Mutex::new(()),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Receiver marked changed after every completed cycle, failed ones included.
    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> Snapshot {
        self.state.borrow().clone()
    }

    pub fn data(&self) -> Option<Arc<ResultBundle>> {
        self.state.borrow().data.clone()
    }

    /// Run one fetch cycle. Concurrent callers wait for the cycle in flight.
    pub async fn refresh(&self) -> Result<Arc<ResultBundle>, UpdateFailed> {
        let _cycle = self.cycle.lock().await;

        match self.provider.fetch(self.location.as_deref()).await {
            Ok(bundle) => {
                let bundle = Arc::new(bundle);
                self.state.send_replace(Snapshot {
                    data: Some(Arc::clone(&bundle)),
                    last_update_success: true,
                    last_error: None,
                    last_success_at: Some(Utc::now()),
                });
                Ok(bundle)
            }
            Err(err) => {
                let failure = UpdateFailed(err.to_string());
                warn!(error = %failure, "Update cycle failed, keeping previous data");
                self.state.send_modify(|snapshot| {
                    snapshot.last_update_success = false;
                    snapshot.last_error = Some(failure.0.clone());
                });
                Err(failure)
            }
        }
    }

    /// Initial cycle during setup; the caller decides whether to abort.
    pub async fn first_refresh(&self) -> Result<Arc<ResultBundle>, UpdateFailed> {
        let bundle = self.refresh().await?;
        info!(
            location = %bundle.location,
            interval_secs = self.interval.as_secs(),
            "Coordinator ready"
        );
        Ok(bundle)
    }

    /// Refresh every interval until `shutdown` resolves. A cycle still in
    /// flight at that point is dropped and the cache keeps its last state.
    pub async fn run(&self, shutdown: impl Future<Output = ()>) {
        tokio::pin!(shutdown);

        let mut ticker = interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = &mut shutdown => break,
                _ = ticker.tick() => {
                    tokio::select! {
                        biased;
                        _ = &mut shutdown => break,
                        // Failures are already recorded in the snapshot.
                        _ = self.refresh() => {}
                    }
                }
            }
        }

        info!("Coordinator stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        error::{Result, ScrapeError},
        model::{Condition, ConditionValue, TemperatureUnit, WeatherObservation},
    };
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use std::{
        collections::VecDeque,
        sync::atomic::{AtomicUsize, Ordering},
    };

    fn bundle(temperature: f64) -> ResultBundle {
        let day = NaiveDate::from_ymd_opt(2024, 1, 30).unwrap();
        ResultBundle {
            location: "Budapest".into(),
            current: WeatherObservation {
                condition: ConditionValue::Mapped(Condition::Cloudy),
                temperature,
                temperature_unit: TemperatureUnit::Celsius,
                icon_url: "/assets/icons/borult.svg".into(),
                sunrise: day.and_hms_opt(7, 15, 0).unwrap(),
                sunset: day.and_hms_opt(16, 30, 0).unwrap(),
            },
            hourly: Vec::new(),
            daily: Vec::new(),
        }
    }

    /// Hands out queued results in order, then hangs forever.
    #[derive(Debug, Default)]
    struct ScriptedProvider {
        results: std::sync::Mutex<VecDeque<Result<ResultBundle>>>,
        calls: AtomicUsize,
    }

    impl ScriptedProvider {
        fn hanging() -> Arc<Self> {
            Arc::new(Self::default())
        }

        fn new(results: impl IntoIterator<Item = Result<ResultBundle>>) -> Arc<Self> {
            Arc::new(Self {
                results: std::sync::Mutex::new(results.into_iter().collect()),
                ..Self::default()
            })
        }
    }

    #[async_trait]
    impl WeatherProvider for ScriptedProvider {
        async fn fetch(&self, _location: Option<&str>) -> Result<ResultBundle> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let next = self.results.lock().unwrap().pop_front();
            match next {
                Some(result) => result,
                None => std::future::pending().await,
            }
        }
    }

    fn missing_sunrise() -> ScrapeError {
        ScrapeError::MissingElement { field: "sunrise" }
    }

    #[tokio::test]
    async fn starts_unavailable() {
        let coordinator =
            UpdateCoordinator::new(ScriptedProvider::hanging(), None, UPDATE_INTERVAL);
        let snapshot = coordinator.snapshot();

        assert!(!snapshot.available());
        assert!(snapshot.data.is_none());
        assert!(coordinator.data().is_none());
    }

    #[tokio::test]
    async fn success_replaces_the_bundle() {
        let provider = ScriptedProvider::new([Ok(bundle(1.0)), Ok(bundle(2.0))]);
        let coordinator = UpdateCoordinator::new(provider, None, UPDATE_INTERVAL);

        coordinator.first_refresh().await.unwrap();
        coordinator.refresh().await.unwrap();

        let snapshot = coordinator.snapshot();
        assert!(snapshot.available());
        assert!(snapshot.last_success_at.is_some());
        assert_eq!(snapshot.data.unwrap().current.temperature, 2.0);
    }

    #[tokio::test]
    async fn failure_keeps_previous_bundle() {
        let provider = ScriptedProvider::new([Ok(bundle(1.0)), Err(missing_sunrise())]);
        let coordinator = UpdateCoordinator::new(provider, None, UPDATE_INTERVAL);
        let mut updates = coordinator.subscribe();

        coordinator.refresh().await.unwrap();
        assert!(updates.has_changed().unwrap());
        updates.borrow_and_update();

        let err = coordinator.refresh().await.unwrap_err();
        assert_eq!(err, UpdateFailed("Page has no element for 'sunrise'".into()));

        assert!(updates.has_changed().unwrap());
        let snapshot = updates.borrow_and_update().clone();
        assert!(!snapshot.last_update_success);
        assert!(!snapshot.available());
        assert_eq!(snapshot.last_error.as_deref(), Some("Page has no element for 'sunrise'"));
        assert_eq!(snapshot.data.unwrap().current.temperature, 1.0);
    }

    #[tokio::test]
    async fn first_refresh_surfaces_failure() {
        let provider = ScriptedProvider::new([Err(missing_sunrise())]);
        let coordinator = UpdateCoordinator::new(provider, None, UPDATE_INTERVAL);

        assert!(coordinator.first_refresh().await.is_err());
        assert!(coordinator.data().is_none());
    }

    #[tokio::test]
    async fn run_refreshes_until_shutdown() {
        let provider = ScriptedProvider::new([Ok(bundle(4.0))]);
        let coordinator = UpdateCoordinator::new(provider.clone(), None, Duration::from_millis(10));
        let mut updates = coordinator.subscribe();

        let shutdown = async move {
            let _ = updates.changed().await;
        };
        tokio::time::timeout(Duration::from_secs(5), coordinator.run(shutdown))
            .await
            .unwrap();

        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
        assert!(coordinator.snapshot().available());
    }

    #[tokio::test]
    async fn shutdown_abandons_cycle_in_flight() {
        // The queue is empty, so the first fetch never completes.
        let provider = ScriptedProvider::hanging();
        let coordinator = UpdateCoordinator::new(provider.clone(), None, Duration::from_millis(5));

        let shutdown = tokio::time::sleep(Duration::from_millis(100));
        tokio::time::timeout(Duration::from_secs(5), coordinator.run(shutdown))
            .await
            .unwrap();

        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
        let snapshot = coordinator.snapshot();
        assert!(snapshot.data.is_none());
        assert!(snapshot.last_error.is_none());
    }
}
