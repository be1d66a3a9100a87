use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::clock::Clock;
use crate::config::Config;
use crate::stats::{HouseStatsService, StatsSource};
use crate::store::Store;

#[derive(Clone)]
pub struct AppState {
    store: Arc<Store>,
    house_stats: Arc<HouseStatsService>,
    config: Arc<Config>,
    refresh_running: Arc<AtomicBool>,
    started_at: Instant,
}

/// Held for the duration of a refresh; releases the overlap guard on drop,
/// including when the refresh task panics.
pub struct RefreshGuard {
    running: Arc<AtomicBool>,
}

impl Drop for RefreshGuard {
    fn drop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
    }
}

impl AppState {
    pub fn new(store: Arc<Store>, clock: Arc<dyn Clock>, config: &Config) -> Self {
        let source: Arc<dyn StatsSource> = store.clone();
        let house_stats = HouseStatsService::new(source, clock)
            .with_reference_ttl(Duration::from_secs(config.reference_cache_ttl_secs));

        Self {
            store,
            house_stats: Arc::new(house_stats),
            config: Arc::new(config.clone()),
            refresh_running: Arc::new(AtomicBool::new(false)),
            started_at: Instant::now(),
        }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn house_stats(&self) -> &Arc<HouseStatsService> {
        &self.house_stats
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn uptime_secs(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }

    /// Claims the single in-process refresh slot, or `None` when another
    /// refresh is still running.
    pub fn try_begin_refresh(&self) -> Option<RefreshGuard> {
        self.refresh_running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| RefreshGuard {
                running: self.refresh_running.clone(),
            })
    }

    pub fn is_refresh_running(&self) -> bool {
        self.refresh_running.load(Ordering::SeqCst)
    }
}
