use crate::domain::errors::{PipelineResult, PredictionError};
use crate::domain::ml::bundle::ModelBundle;
use crate::domain::ports::BundleLoader;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tokio::sync::OnceCell;
use tracing::{debug, error, info, warn};

type BundleCell = Arc<OnceCell<Arc<ModelBundle>>>;

/// Process-lifetime cache of loaded bundles, keyed by uppercase ticker.
///
/// Loads are single-flight per ticker: concurrent first requests for the same
/// ticker wait on one load, while other tickers load independently. Failed
/// loads are never stored, so the next request checks the filesystem again.
/// Entries are never evicted or refreshed.
pub struct BundleCache {
    loader: Arc<dyn BundleLoader>,
    entries: RwLock<HashMap<String, BundleCell>>,
}

impl BundleCache {
    pub fn new(loader: Arc<dyn BundleLoader>) -> Self {
        Self {
            loader,
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub async fn get_or_load(&self, ticker: &str) -> PipelineResult<Arc<ModelBundle>> {
        let key = ticker.trim().to_uppercase();
        let cell = self.cell_for(&key);

        if let Some(bundle) = cell.get() {
            debug!("BundleCache: HIT for {}", key);
            return Ok(Arc::clone(bundle));
        }

        // The load runs on its own task so a cancelled caller cannot release
        // the init permit while its blocking load is still in flight.
        let loader = Arc::clone(&self.loader);
        let init_cell = Arc::clone(&cell);
        let init_key = key.clone();
        let result = tokio::spawn(async move {
            init_cell
                .get_or_try_init(|| load_bundle(loader, init_key))
                .await
                .map(Arc::clone)
        })
        .await
        .map_err(|e| {
            error!("BundleCache: init task for {} failed: {}", key, e);
            PredictionError::Internal(format!("bundle init task failed: {}", e))
        })
        .and_then(|r| r);

        match result {
            Ok(bundle) => Ok(bundle),
            Err(e) => {
                warn!("BundleCache: failed to load {}: {}", key, e);
                self.discard_if_unused(&key, &cell);
                Err(e)
            }
        }
    }

    /// True once a bundle for `ticker` has been loaded successfully.
    pub fn is_cached(&self, ticker: &str) -> bool {
        let key = ticker.trim().to_uppercase();
        self.read_entries()
            .get(&key)
            .is_some_and(|cell| cell.initialized())
    }

    /// Number of successfully loaded bundles.
    pub fn len(&self) -> usize {
        self.read_entries()
            .values()
            .filter(|cell| cell.initialized())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn cell_for(&self, key: &str) -> BundleCell {
        if let Some(cell) = self.read_entries().get(key) {
            return Arc::clone(cell);
        }
        let mut entries = self.write_entries();
        Arc::clone(entries.entry(key.to_string()).or_default())
    }

    /// Drop an empty cell nobody else is waiting on, so unknown tickers
    /// do not accumulate entries.
    fn discard_if_unused(&self, key: &str, cell: &BundleCell) {
        let mut entries = self.write_entries();
        let unused = entries.get(key).is_some_and(|current| {
            Arc::ptr_eq(current, cell) && !cell.initialized() && Arc::strong_count(cell) == 2
        });
        if unused {
            entries.remove(key);
        }
    }

    fn read_entries(&self) -> std::sync::RwLockReadGuard<'_, HashMap<String, BundleCell>> {
        match self.entries.read() {
            Ok(guard) => guard,
            Err(poisoned) => {
                error!("BundleCache: entries lock poisoned during read, recovering");
                poisoned.into_inner()
            }
        }
    }

    fn write_entries(&self) -> std::sync::RwLockWriteGuard<'_, HashMap<String, BundleCell>> {
        match self.entries.write() {
            Ok(guard) => guard,
            Err(poisoned) => {
                error!("BundleCache: entries lock poisoned during write, recovering");
                poisoned.into_inner()
            }
        }
    }
}

async fn load_bundle(
    loader: Arc<dyn BundleLoader>,
    key: String,
) -> PipelineResult<Arc<ModelBundle>> {
    info!("BundleCache: MISS for {}. Loading bundle...", key);
    let load_key = key.clone();
    let bundle = tokio::task::spawn_blocking(move || loader.load(&load_key))
        .await
        .map_err(|e| {
            error!("BundleCache: load task for {} failed: {}", key, e);
            PredictionError::Internal(format!("bundle load task failed: {}", e))
        })??;
    info!(
        "BundleCache: loaded {} (lookback={}, features={})",
        key,
        bundle.metadata.lookback,
        bundle.metadata.feature_cols.len()
    );
    Ok(Arc::new(bundle))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::mock::CountingBundleLoader;

    #[tokio::test]
    async fn test_second_load_is_served_from_cache() {
        let loader = Arc::new(CountingBundleLoader::new(0.5));
        let cache = BundleCache::new(loader.clone());

        let first = cache.get_or_load("aapl").await.unwrap();
        let second = cache.get_or_load("AAPL").await.unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(loader.load_count("AAPL"), 1);
        assert!(cache.is_cached("Aapl"));
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn test_failed_load_is_not_cached() {
        let loader = Arc::new(CountingBundleLoader::new(0.5).with_missing("MSFT"));
        let cache = BundleCache::new(loader.clone());

        let err = cache.get_or_load("MSFT").await.unwrap_err();
        assert!(matches!(err, PredictionError::BundleNotFound { .. }));
        assert!(!cache.is_cached("MSFT"));
        assert!(cache.is_empty());

        // Next request tries again instead of remembering the failure.
        let _ = cache.get_or_load("MSFT").await;
        assert_eq!(loader.load_count("MSFT"), 2);
    }
}
