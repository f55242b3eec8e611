use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;
use tracing::{debug, warn};

use crate::config::EngineConfig;
use crate::error::SlotError;
use crate::limits::MAX_BUSY_INTERVALS_PER_DAY;
use crate::model::*;

/// Where busy intervals come from (bookings plus specialist/resource gaps).
/// Usually network-bound.
#[async_trait]
pub trait AvailabilitySource: Send + Sync {
    async fn busy_intervals(&self, key: &DayKey) -> Result<Vec<BusyInterval>, SlotError>;
}

/// What the index knows about one resource-day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DayData {
    Busy(Arc<Vec<BusyInterval>>),
    /// Load failed or returned garbage; nothing on this day is bookable.
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadStatus {
    /// Served from cache, no request issued.
    Cached,
    /// Response was the newest for its key and is now cached.
    Applied,
    /// A newer request for the same key was issued meanwhile; response dropped.
    Superseded,
}

struct CacheEntry {
    data: Option<DayData>,
    /// Token of the newest request issued for this key.
    latest_token: u64,
}

/// Per `(resource, date, excluded booking)` cache of busy intervals.
///
/// Every load is tagged with a monotonically increasing token; a response is
/// applied only if its token is still the newest issued for the key, so a slow
/// earlier response never overwrites a newer one. Readers keep seeing the
/// previous data while a load is in flight.
pub struct AvailabilityIndex {
    source: Arc<dyn AvailabilitySource>,
    entries: DashMap<DayKey, CacheEntry>,
    next_token: AtomicU64,
    max_cached_days: usize,
}

impl AvailabilityIndex {
    pub fn new(source: Arc<dyn AvailabilitySource>, config: &EngineConfig) -> Self {
        Self {
            source,
            entries: DashMap::new(),
            next_token: AtomicU64::new(0),
            max_cached_days: config.max_cached_days,
        }
    }

    /// Current data for a key, `None` if nothing has been applied yet.
    pub fn snapshot(&self, key: &DayKey) -> Option<DayData> {
        self.entries.get(key).and_then(|e| e.data.clone())
    }

    pub fn cached_days(&self) -> usize {
        self.entries.len()
    }

    pub fn invalidate(&self, key: &DayKey) {
        self.entries.remove(key);
    }

    /// Fetch busy intervals for `key`. Without `force`, cached data is reused.
    ///
    /// A failed or malformed response is cached as `DayData::Failed` (when it is
    /// the newest) and the error is returned so the caller can surface or retry.
    pub async fn load(&self, key: DayKey, force: bool) -> Result<LoadStatus, SlotError> {
        if !force && self.snapshot(&key).is_some() {
            return Ok(LoadStatus::Cached);
        }

        let token = self.issue(key);
        let started = std::time::Instant::now();
        let result = self
            .source
            .busy_intervals(&key)
            .await
            .and_then(|busy| validate(busy, &key));
        metrics::histogram!(crate::observability::LOAD_DURATION_SECONDS)
            .record(started.elapsed().as_secs_f64());

        let data = match &result {
            Ok(busy) => DayData::Busy(Arc::new(busy.clone())),
            Err(_) => DayData::Failed,
        };

        if !self.complete(&key, token, data) {
            debug!(
                "discarding superseded availability response for {} on {} (token {token})",
                key.resource, key.date
            );
            metrics::counter!(crate::observability::LOADS_TOTAL, "status" => "discarded").increment(1);
            return Ok(LoadStatus::Superseded);
        }

        match result {
            Ok(busy) => {
                debug!(
                    "applied {} busy intervals for {} on {}",
                    busy.len(),
                    key.resource,
                    key.date
                );
                metrics::counter!(crate::observability::LOADS_TOTAL, "status" => "ok").increment(1);
                Ok(LoadStatus::Applied)
            }
            Err(e) => {
                warn!(
                    "availability load for {} on {} failed, day treated as closed: {e}",
                    key.resource, key.date
                );
                metrics::counter!(crate::observability::LOADS_TOTAL, "status" => "failed").increment(1);
                Err(e)
            }
        }
    }

    fn issue(&self, key: DayKey) -> u64 {
        let token = self.next_token.fetch_add(1, Ordering::Relaxed) + 1;
        {
            let mut entry = self.entries.entry(key).or_insert_with(|| CacheEntry {
                data: None,
                latest_token: 0,
            });
            entry.latest_token = token;
        }
        self.evict_over_capacity(&key);
        token
    }

    /// Store `data` if `token` is still the newest for `key`.
    fn complete(&self, key: &DayKey, token: u64, data: DayData) -> bool {
        match self.entries.get_mut(key) {
            Some(mut entry) if entry.latest_token == token => {
                entry.data = Some(data);
                true
            }
            _ => false,
        }
    }

    fn evict_over_capacity(&self, keep: &DayKey) {
        while self.entries.len() > self.max_cached_days {
            let victim = self
                .entries
                .iter()
                .filter(|e| e.key() != keep)
                .min_by_key(|e| e.value().latest_token)
                .map(|e| *e.key());
            let Some(victim) = victim else { break };
            self.entries.remove(&victim);
            metrics::counter!(crate::observability::CACHE_EVICTIONS_TOTAL).increment(1);
        }
    }
}

/// Drop the edited booking and reject malformed responses.
fn validate(busy: Vec<BusyInterval>, key: &DayKey) -> Result<Vec<BusyInterval>, SlotError> {
    if busy.len() > MAX_BUSY_INTERVALS_PER_DAY {
        return Err(SlotError::LimitExceeded("too many busy intervals"));
    }
    if busy.iter().any(|b| b.span.start >= b.span.end) {
        return Err(SlotError::LoadFailed("inverted busy interval".into()));
    }
    Ok(busy
        .into_iter()
        .filter(|b| key.exclude.is_none() || b.id != key.exclude)
        .collect())
}
