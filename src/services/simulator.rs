//! Synthetic stock feed.
//!
//! Each tick produces one observation per (store, product) of the configured
//! areas and overwrites the batch file with the whole batch.

use crate::{
    config::{ProductConfig, SimulatorConfig},
    errors::ServiceError,
    models::{StockObservation, StockStatus},
};
use async_trait::async_trait;
use chrono::Utc;
use rand::Rng;
use std::{
    future::Future,
    path::{Path, PathBuf},
    time::Duration,
};
use tokio::time::{interval, MissedTickBehavior};
use tracing::{error, info, warn};

/// Status draw weights, in percent.
const STATUS_WEIGHTS: [(StockStatus, u32); 3] = [
    (StockStatus::Full, 60),
    (StockStatus::Low, 25),
    (StockStatus::Oos, 15),
];

/// Draws a stock status and a count consistent with it.
pub fn sample_stock<R: Rng + ?Sized>(rng: &mut R) -> (StockStatus, u32) {
    let total: u32 = STATUS_WEIGHTS.iter().map(|(_, w)| w).sum();
    let mut roll = rng.gen_range(0..total);
    let mut status = StockStatus::Oos;
    for (candidate, weight) in STATUS_WEIGHTS {
        if roll < weight {
            status = candidate;
            break;
        }
        roll -= weight;
    }
    let count = match status {
        StockStatus::Full => rng.gen_range(30..=100),
        StockStatus::Low => rng.gen_range(1..=15),
        StockStatus::Oos => 0,
    };
    (status, count)
}

/// Where observations come from.
#[async_trait]
pub trait StockSource: Send + Sync {
    async fn fetch(
        &self,
        area: &str,
        store_id: &str,
        product: &ProductConfig,
    ) -> Result<StockObservation, ServiceError>;
}

/// Randomized stand-in for a real retailer integration
#[derive(Debug, Default, Clone)]
pub struct RandomStockSource;

impl RandomStockSource {
    fn observe(&self, area: &str, store_id: &str, product: &ProductConfig) -> StockObservation {
        let (stock_status, stock_count) = sample_stock(&mut rand::thread_rng());
        StockObservation {
            timestamp: Utc::now(),
            area: area.to_string(),
            store_id: store_id.to_string(),
            product: product.name.clone(),
            stock_status,
            stock_count,
            price: product.price,
        }
    }
}

#[async_trait]
impl StockSource for RandomStockSource {
    async fn fetch(
        &self,
        area: &str,
        store_id: &str,
        product: &ProductConfig,
    ) -> Result<StockObservation, ServiceError> {
        Ok(self.observe(area, store_id, product))
    }
}

/// Writes `bytes` next to `path` and renames it into place.
async fn replace_file(path: &Path, bytes: &[u8]) -> Result<(), ServiceError> {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    tokio::fs::write(&tmp, bytes).await?;
    tokio::fs::rename(&tmp, path).await?;
    Ok(())
}

/// Drives a [`StockSource`] over the configured areas.
pub struct Simulator<S> {
    source: S,
    config: SimulatorConfig,
    output: PathBuf,
}

impl<S: StockSource> Simulator<S> {
    pub fn new(source: S, config: SimulatorConfig, output: PathBuf) -> Self {
        Self {
            source,
            config,
            output,
        }
    }

    fn store_delay(&self) -> Option<Duration> {
        let (min, max) = (self.config.store_delay_min_ms, self.config.store_delay_max_ms);
        if max == 0 {
            return None;
        }
        let ms = rand::thread_rng().gen_range(min.min(max)..=max);
        Some(Duration::from_millis(ms))
    }

    /// Fetches one batch. Stores whose fetch fails are logged and left out.
    pub async fn collect_batch(&self) -> Vec<StockObservation> {
        let mut batch = Vec::new();

        for (area, stores) in &self.config.areas {
            for store_id in stores {
                for product in &self.config.products {
                    match self.source.fetch(area, store_id, product).await {
                        Ok(obs) => {
                            info!(
                                area = %obs.area,
                                store_id = %obs.store_id,
                                status = %obs.stock_status,
                                stock_count = obs.stock_count,
                                "fetched stock"
                            );
                            batch.push(obs);
                        }
                        Err(e) => {
                            error!(area = %area, store_id = %store_id, error = %e, "fetch failed; skipping store");
                        }
                    }

                    if let Some(delay) = self.store_delay() {
                        tokio::time::sleep(delay).await;
                    }
                }
            }
        }

        batch
    }

    /// Runs one tick: collect a batch and overwrite the batch file with it.
    pub async fn run_once(&self) -> Result<Vec<StockObservation>, ServiceError> {
        let batch = self.collect_batch().await;
        let bytes = serde_json::to_vec_pretty(&batch)?;
        replace_file(&self.output, &bytes).await?;
        info!(
            records = batch.len(),
            path = %self.output.display(),
            "batch written"
        );
        Ok(batch)
    }

    /// Ticks every `interval_secs` (at least one second) until `shutdown`
    /// resolves. A failed tick is logged and the loop carries on.
    pub async fn run_until<F>(&self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        let period_secs = self.config.interval_secs.max(1);
        let mut ticker = interval(Duration::from_secs(period_secs));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("simulator stopping");
                    break;
                }
                _ = ticker.tick() => {
                    if let Err(e) = self.run_once().await {
                        warn!(error = %e, "simulator tick failed");
                    }
                    info!("waiting {} seconds for the next batch", period_secs);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};
    use rust_decimal_macros::dec;
    use std::collections::BTreeMap;

    /// Config without store pauses; `stores` are `(area, store_id)` pairs.
    fn quiet_config(stores: &[(&str, &str)]) -> SimulatorConfig {
        let mut areas: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for (area, store_id) in stores {
            areas
                .entry(area.to_string())
                .or_default()
                .push(store_id.to_string());
        }
        SimulatorConfig {
            interval_secs: 1,
            store_delay_min_ms: 0,
            store_delay_max_ms: 0,
            areas,
            products: vec![ProductConfig {
                name: "Mango Oatmeal".into(),
                price: dec!(199.00),
            }],
        }
    }

    struct FlakySource {
        failing_store: &'static str,
    }

    #[async_trait]
    impl StockSource for FlakySource {
        async fn fetch(
            &self,
            area: &str,
            store_id: &str,
            product: &ProductConfig,
        ) -> Result<StockObservation, ServiceError> {
            if store_id == self.failing_store {
                return Err(ServiceError::FetchFailed {
                    store_id: store_id.to_string(),
                    reason: "blocked".into(),
                });
            }
            Ok(RandomStockSource.observe(area, store_id, product))
        }
    }

    #[test]
    fn samples_respect_status_ranges() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut seen = std::collections::HashSet::new();
        for _ in 0..2_000 {
            let (status, count) = sample_stock(&mut rng);
            seen.insert(status);
            match status {
                StockStatus::Full => assert!((30..=100).contains(&count)),
                StockStatus::Low => assert!((1..=15).contains(&count)),
                StockStatus::Oos => assert_eq!(count, 0),
            }
        }
        assert_eq!(seen.len(), 3);
    }

    #[test]
    fn status_frequencies_follow_weights() {
        let mut rng = StdRng::seed_from_u64(42);
        let draws = 20_000;
        let full = (0..draws)
            .filter(|_| sample_stock(&mut rng).0 == StockStatus::Full)
            .count();
        let share = full as f64 / draws as f64;
        assert!((0.55..0.65).contains(&share), "full share was {share}");
    }

    #[tokio::test]
    async fn one_observation_per_store_with_fixed_price() {
        let dir = tempfile::tempdir().unwrap();
        let sim = Simulator::new(
            RandomStockSource,
            quiet_config(&[
                ("400001", "BLK_MUM_101"),
                ("400001", "BLK_MUM_102"),
                ("201301", "BLK_NOI_201"),
            ]),
            dir.path().join("stock_data.json"),
        );

        let batch = sim.run_once().await.unwrap();
        assert_eq!(batch.len(), 3);
        assert!(batch.iter().all(|o| o.price == dec!(199.00)));
        assert!(batch
            .iter()
            .any(|o| o.area == "201301" && o.store_id == "BLK_NOI_201"));
    }

    #[tokio::test]
    async fn failing_store_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let sim = Simulator::new(
            FlakySource {
                failing_store: "BLK_MUM_102",
            },
            quiet_config(&[
                ("400001", "BLK_MUM_101"),
                ("400001", "BLK_MUM_102"),
                ("400001", "BLK_MUM_103"),
            ]),
            dir.path().join("stock_data.json"),
        );

        let batch = sim.run_once().await.unwrap();
        let stores: Vec<_> = batch.iter().map(|o| o.store_id.as_str()).collect();
        assert_eq!(stores, vec!["BLK_MUM_101", "BLK_MUM_103"]);
    }

    #[tokio::test]
    async fn batch_file_is_overwritten_not_appended() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stock_data.json");
        let sim = Simulator::new(
            RandomStockSource,
            quiet_config(&[("400001", "BLK_MUM_101"), ("400001", "BLK_MUM_102")]),
            path.clone(),
        );

        sim.run_once().await.unwrap();
        let second = sim.run_once().await.unwrap();

        let on_disk: Vec<StockObservation> =
            serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
        assert_eq!(on_disk.len(), 2);
        assert_eq!(on_disk, second);
        assert!(!dir.path().join("stock_data.json.tmp").exists());
    }

    #[tokio::test]
    async fn run_until_stops_on_shutdown() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stock_data.json");
        let sim = Simulator::new(
            RandomStockSource,
            quiet_config(&[("400001", "BLK_MUM_101")]),
            path.clone(),
        );

        // The first tick fires immediately; shutdown follows shortly after.
        sim.run_until(tokio::time::sleep(Duration::from_millis(200)))
            .await;
        assert!(path.exists());
    }

    #[tokio::test]
    async fn zero_interval_runs_at_one_second_period() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stock_data.json");
        let mut cfg = quiet_config(&[("400001", "BLK_MUM_101")]);
        cfg.interval_secs = 0;
        let sim = Simulator::new(RandomStockSource, cfg, path.clone());

        sim.run_until(tokio::time::sleep(Duration::from_millis(200)))
            .await;
        assert!(path.exists());
    }
}
