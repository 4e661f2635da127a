//! Periodic cache refresh as an explicitly owned background task.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::company::CompanyCache;
use super::source::RemoteSource;

/// Handle to a spawned periodic-refresh task.
///
/// The task calls `cache.update()` once per period. Dropping or stopping
/// the handle signals shutdown between ticks; an update that is already
/// running is never aborted, because the shutdown signal is only checked
/// while waiting for the next tick.
pub struct RefreshHandle {
  shutdown: watch::Sender<bool>,
  /// Option only so `stop` can take the handle out from under `Drop`.
  task: Option<JoinHandle<()>>,
}

impl RefreshHandle {
  /// Spawn a refresh task over the given cache.
  pub fn spawn<S>(cache: Arc<CompanyCache<S>>, period: Duration) -> Self
  where
    S: RemoteSource + 'static,
  {
    let (shutdown, mut shutdown_rx) = watch::channel(false);

    let task = tokio::spawn(async move {
      let mut ticker = tokio::time::interval(period);
      ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
      // interval fires immediately; the first refresh should wait a full
      // period, as the cache was just filled or is about to be.
      ticker.tick().await;

      loop {
        tokio::select! {
          _ = ticker.tick() => {}
          _ = shutdown_rx.changed() => break,
        }
        match cache.update().await {
          Ok(true) => debug!("scheduled refresh completed"),
          Ok(false) => debug!("scheduled refresh skipped, update already running"),
          Err(e) => warn!("scheduled refresh failed: {e:#}"),
        }
      }
      debug!("refresh task stopped");
    });

    Self {
      shutdown,
      task: Some(task),
    }
  }

  /// Signal shutdown and wait for the task to wind down. An in-flight
  /// update finishes first.
  pub async fn stop(mut self) {
    let _ = self.shutdown.send(true);
    if let Some(task) = self.task.take() {
      let _ = task.await;
    }
  }
}

impl Drop for RefreshHandle {
  fn drop(&mut self) {
    let _ = self.shutdown.send(true);
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::cache::company::tests::{company, page, ScriptedSource};
  use std::sync::atomic::Ordering;

  fn scripted() -> ScriptedSource {
    let mut recent_pages = Vec::new();
    // Enough single-entry pages for any number of ticks.
    for i in 0..64 {
      recent_pages.push(page(vec![company(i, "Acme", 500 + i as i64)], i, false));
    }
    ScriptedSource::new(vec![page(vec![company(1, "Acme", 100)], 1, false)], recent_pages)
  }

  #[tokio::test]
  async fn test_refresh_ticks_update() {
    let source = Arc::new(scripted());
    let cache = Arc::new(CompanyCache::new(Arc::clone(&source)));
    cache.fill().await.unwrap();

    let handle = RefreshHandle::spawn(Arc::clone(&cache), Duration::from_millis(20));
    tokio::time::sleep(Duration::from_millis(70)).await;
    handle.stop().await;

    assert!(source.recent_calls.load(Ordering::SeqCst) >= 2);
    assert!(cache.last_update() >= 500);
  }

  #[tokio::test]
  async fn test_stop_halts_ticking() {
    let source = Arc::new(scripted());
    let cache = Arc::new(CompanyCache::new(Arc::clone(&source)));
    cache.fill().await.unwrap();

    let handle = RefreshHandle::spawn(Arc::clone(&cache), Duration::from_millis(10));
    tokio::time::sleep(Duration::from_millis(35)).await;
    handle.stop().await;

    let calls_at_stop = source.recent_calls.load(Ordering::SeqCst);
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(source.recent_calls.load(Ordering::SeqCst), calls_at_stop);
  }

  #[tokio::test]
  async fn test_first_tick_waits_a_full_period() {
    let source = Arc::new(scripted());
    let cache = Arc::new(CompanyCache::new(Arc::clone(&source)));
    cache.fill().await.unwrap();

    let handle = RefreshHandle::spawn(Arc::clone(&cache), Duration::from_secs(60));
    tokio::time::sleep(Duration::from_millis(30)).await;
    assert_eq!(source.recent_calls.load(Ordering::SeqCst), 0);
    handle.stop().await;
  }
}
