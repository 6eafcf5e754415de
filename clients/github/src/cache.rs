use derive_more::Constructor;
use log::debug;
use repo_roster::api::{LocMode, MetricsBundle, RepoIdentity};
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(30 * 60);

#[derive(Debug, Clone, Constructor)]
struct CacheEntry {
    stored_at: Instant,
    bundle: MetricsBundle,
}

/// Session-scoped store of fetched metrics, keyed by identity and fetch mode.
///
/// Expiry is lazy: an entry older than the TTL reads as a miss but stays in
/// the map until it is overwritten or explicitly invalidated.
#[derive(Debug)]
pub struct MetricsCache {
    ttl: Duration,
    entries: Mutex<HashMap<String, CacheEntry>>,
}

impl Default for MetricsCache {
    fn default() -> Self {
        MetricsCache::new(DEFAULT_CACHE_TTL)
    }
}

impl MetricsCache {
    pub fn new(ttl: Duration) -> Self {
        MetricsCache {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    fn key(identity: &RepoIdentity, mode: LocMode) -> String {
        format!("{}:{}", identity, mode)
    }

    pub async fn get(&self, identity: &RepoIdentity, mode: LocMode) -> Option<MetricsBundle> {
        let entries = self.entries.lock().await;
        let entry = entries.get(&Self::key(identity, mode))?;
        if entry.stored_at.elapsed() >= self.ttl {
            debug!("Cache entry for {} ({}) expired", identity, mode);
            return None;
        }
        Some(entry.bundle.clone())
    }

    pub async fn put(&self, identity: &RepoIdentity, mode: LocMode, bundle: MetricsBundle) {
        self.entries
            .lock()
            .await
            .insert(Self::key(identity, mode), CacheEntry::new(Instant::now(), bundle));
    }

    /// Removes both mode variants for the identity, for a forced refresh.
    pub async fn invalidate(&self, owner: &str, repo: &str) {
        let identity = RepoIdentity::new(owner.to_string(), repo.to_string());
        let mut entries = self.entries.lock().await;
        for mode in [LocMode::Estimate, LocMode::Skip] {
            entries.remove(&Self::key(&identity, mode));
        }
    }

    pub async fn clear(&self) {
        self.entries.lock().await.clear();
    }
}

/// Tests
