//! Periodic background refresh of current conditions
//!
//! Locations recently served to a client are re-fetched on a fixed
//! interval so their cached readings stay warm. A refresh overlapping a
//! user-triggered fetch is last-writer-wins; neither side coordinates.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::models::Location;
use crate::{CineSkyConfig, WeatherApiClient, cache};

const TRACKED_KEY: &str = "refresh:tracked";
const MAX_TRACKED: usize = 32;

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Remember a coordinate for background refreshing. Most recently served
/// first; the set is bounded.
pub async fn track(lat: f64, lon: f64) -> Result<()> {
    let entry = (round2(lat), round2(lon));

    let mut tracked: Vec<(f64, f64)> = cache::get(TRACKED_KEY).await?.unwrap_or_default();
    tracked.retain(|e| *e != entry);
    tracked.insert(0, entry);
    tracked.truncate(MAX_TRACKED);

    cache::put(TRACKED_KEY, tracked, cache::PERMANENT_TTL).await
}

/// Spawn the refresh worker. Runs until the process exits.
pub fn spawn(api: Arc<WeatherApiClient>, config: Arc<CineSkyConfig>) -> JoinHandle<()> {
    let interval = Duration::from_secs(u64::from(config.server.refresh_interval_minutes) * 60);

    tokio::spawn(async move {
        info!(
            "Refresh worker started (every {} minutes)",
            config.server.refresh_interval_minutes
        );

        let mut ticker = tokio::time::interval(interval);
        // The first tick fires immediately; nothing is stale yet
        ticker.tick().await;

        loop {
            ticker.tick().await;
            if let Err(e) = refresh_tracked(&api, &config).await {
                warn!("Refresh cycle failed: {}", e);
            }
        }
    })
}

async fn refresh_tracked(api: &WeatherApiClient, config: &CineSkyConfig) -> Result<()> {
    let tracked: Vec<(f64, f64)> = cache::get(TRACKED_KEY).await?.unwrap_or_default();
    if tracked.is_empty() {
        debug!("No tracked locations to refresh");
        return Ok(());
    }

    debug!("Refreshing {} tracked locations", tracked.len());

    for (lat, lon) in tracked {
        match api.current_conditions(lat, lon).await {
            Ok(conditions) => {
                let key = Location::new(lat, lon, String::new()).cache_key("current");
                let ttl = cache::jittered(Duration::from_secs(
                    u64::from(config.server.refresh_interval_minutes) * 60,
                ));
                if let Err(e) = cache::put(&key, conditions, ttl).await {
                    warn!("Failed to store refreshed conditions for {lat:.2},{lon:.2}: {e}");
                }
            }
            // One bad location shouldn't starve the rest
            Err(e) => warn!("Failed to refresh conditions for {lat:.2},{lon:.2}: {e}"),
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round2() {
        assert_eq!(round2(52.5198), 52.52);
        assert_eq!(round2(-0.004), -0.0);
    }
}
