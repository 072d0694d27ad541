//! In-process dataset cache backed by DashMap. Entries are keyed by source
//! paths and revalidated against a SHA-256 fingerprint of the file contents,
//! so an edited export is reloaded on the next lookup.

use crate::loader::{DatasetSource, TableLoader};
use dashmap::DashMap;
use leadboard_core::error::LeadboardResult;
use leadboard_core::types::Dataset;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

struct CacheEntry {
    fingerprint: String,
    dataset: Arc<Dataset>,
    loaded_at: Instant,
}

/// Process-wide holder of parsed source tables.
pub struct DatasetCache {
    store: DashMap<DatasetSource, CacheEntry>,
    loader: TableLoader,
}

impl DatasetCache {
    pub fn new(loader: TableLoader) -> Self {
        Self {
            store: DashMap::new(),
            loader,
        }
    }

    /// Return the dataset for `source`, parsing it only when the files'
    /// fingerprint differs from the cached one.
    pub fn get_or_load(&self, source: &DatasetSource) -> LeadboardResult<Arc<Dataset>> {
        let leads = std::fs::read(&source.leads_path)?;
        let investment = std::fs::read(&source.investment_path)?;
        let fingerprint = fingerprint(&leads, &investment);

        if let Some(entry) = self.store.get(source) {
            if entry.fingerprint == fingerprint {
                metrics::counter!("dataset_cache.hit").increment(1);
                debug!(
                    fingerprint = %fingerprint,
                    age_ms = entry.loaded_at.elapsed().as_millis() as u64,
                    "Dataset cache hit"
                );
                return Ok(entry.dataset.clone());
            }
        }
        metrics::counter!("dataset_cache.miss").increment(1);

        let dataset = Arc::new(self.loader.parse_dataset(&leads, &investment)?);
        info!(
            leads_path = %source.leads_path.display(),
            investment_path = %source.investment_path.display(),
            fingerprint = %fingerprint,
            "Dataset loaded"
        );
        self.store.insert(
            source.clone(),
            CacheEntry {
                fingerprint,
                dataset: dataset.clone(),
                loaded_at: Instant::now(),
            },
        );
        Ok(dataset)
    }

    /// Fingerprint of the cached entry for `source`, if any.
    pub fn fingerprint_of(&self, source: &DatasetSource) -> Option<String> {
        self.store.get(source).map(|e| e.fingerprint.clone())
    }

    pub fn invalidate(&self, source: &DatasetSource) -> bool {
        self.store.remove(source).is_some()
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }
}

impl Default for DatasetCache {
    fn default() -> Self {
        Self::new(TableLoader::default())
    }
}

/// Hex SHA-256 over both tables. Lengths are mixed in so that bytes cannot
/// shift between the two files without changing the digest.
pub fn fingerprint(leads: &[u8], investment: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update((leads.len() as u64).to_le_bytes());
    hasher.update(leads);
    hasher.update((investment.len() as u64).to_le_bytes());
    hasher.update(investment);
    hex::encode(hasher.finalize())
}
