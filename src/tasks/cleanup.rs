//! TTL Cleanup Task
//!
//! Background task that periodically removes expired cache entries.

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, info};

use crate::cache::SharedCache;

/// Shortest sweep period accepted; shorter requests are raised to it.
const MIN_SWEEP_INTERVAL: Duration = Duration::from_millis(10);

/// Spawns a background task that periodically sweeps expired cache entries.
///
/// The sweep only reclaims memory; lookups already ignore expired entries,
/// so nothing depends on it running on time.
///
/// The first sweep runs one `interval` after spawning. Abort the returned
/// handle on shutdown.
pub fn spawn_cleanup_task(cache: SharedCache, interval: Duration) -> JoinHandle<()> {
    let interval = interval.max(MIN_SWEEP_INTERVAL);
    tokio::spawn(async move {
        info!(interval_secs = interval.as_secs_f64(), "Sweeping expired entries periodically");

        let mut ticker = time::interval_at(Instant::now() + interval, interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;

            let (removed, remaining) = {
                let mut store = cache.write().await;
                (store.cleanup_expired(), store.len())
            };

            if removed > 0 {
                info!(removed, remaining, "Swept expired entries");
            } else {
                debug!(remaining, "Sweep found nothing expired");
            }
        }
    })
}
