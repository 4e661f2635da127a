//! The in-memory company cache: one memoized full load, then incremental
//! refreshes driven by the recently-modified feed.

use chrono::Utc;
use color_eyre::Result;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::sync::OnceCell;
use tracing::{debug, info};

use super::source::RemoteSource;
use crate::crm::types::{Company, ListOptions};

/// Properties requested for every company on both listing endpoints.
const REQUESTED_PROPERTIES: [&str; 3] = ["createdate", "environment", "name"];

/// Map plus watermark, mutated together under one lock.
struct CacheInner {
  /// Companies keyed by their `name` property. Last write wins on
  /// name collisions across distinct company ids.
  companies: HashMap<String, Company>,
  /// Max `createdate` (ms) known to be fully represented in the cache.
  last_update: i64,
}

/// In-memory cache of company records from a paginated remote source.
///
/// `fill` runs the full listing exactly once per cache instance (all
/// concurrent callers share the one pass); `update` walks the
/// newest-first recently-modified feed until it reaches entries the
/// cache already knows about. Lookups are exact matches on the company
/// `name` property.
///
/// The lock is held only for map mutation, never across page fetches.
pub struct CompanyCache<S> {
  source: S,
  inner: Mutex<CacheInner>,
  /// Memoizes the single full load; left unset on failure so a later
  /// `fill` can retry.
  filled: OnceCell<()>,
  /// At most one incremental update in flight; a contended `update`
  /// skips rather than waits.
  update_in_progress: AtomicBool,
}

impl<S: RemoteSource> CompanyCache<S> {
  /// Create an empty cache over the given source. No background work
  /// starts until `fill` or `update` is called.
  pub fn new(source: S) -> Self {
    Self {
      source,
      inner: Mutex::new(CacheInner {
        companies: HashMap::new(),
        last_update: 0,
      }),
      filled: OnceCell::new(),
      update_in_progress: AtomicBool::new(false),
    }
  }

  fn inner(&self) -> MutexGuard<'_, CacheInner> {
    self.inner.lock().unwrap_or_else(PoisonError::into_inner)
  }

  fn put(inner: &mut CacheInner, company: Company) {
    match company.name() {
      Some(name) => {
        inner.companies.insert(name.to_string(), company);
      }
      None => debug!(id = company.id, "skipping company with no name property"),
    }
  }

  /// Load the complete company listing into the cache.
  ///
  /// No-op if a load already completed; concurrent callers all await the
  /// same underlying pass. On completion the watermark is the maximum
  /// `createdate` seen (0 for an empty dataset). A page-fetch failure
  /// propagates and leaves the cache retryable; companies from earlier
  /// successful pages stay in the map.
  pub async fn fill(&self) -> Result<()> {
    self
      .filled
      .get_or_try_init(|| self.fill_pass())
      .await
      .copied()
  }

  async fn fill_pass(&self) -> Result<()> {
    let mut options = ListOptions::with_properties(REQUESTED_PROPERTIES);
    let mut max_createdate = 0;
    let mut total = 0usize;

    loop {
      let page = self.source.list_all(options.clone()).await?;
      total += page.companies.len();

      let mut inner = self.inner();
      for company in page.companies {
        max_createdate = max_createdate.max(company.createdate().unwrap_or(0));
        Self::put(&mut inner, company);
      }
      drop(inner);

      options.offset = Some(page.offset);
      if !page.has_more {
        break;
      }
    }

    self.inner().last_update = max_createdate;
    info!(companies = total, watermark = max_createdate, "cache filled");
    Ok(())
  }

  /// Pull in companies modified since the last known watermark.
  ///
  /// Fills the cache first if that has not happened yet. Returns
  /// `Ok(false)` without scanning if another update is already in flight
  /// (skip policy); `Ok(true)` once a scan completes. The feed is walked
  /// newest-first until a page's oldest entry is no newer than the
  /// watermark, then the watermark advances to the `createdate` of the
  /// newest entry seen this pass.
  pub async fn update(&self) -> Result<bool> {
    self.fill().await?;

    if self
      .update_in_progress
      .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
      .is_err()
    {
      debug!("update already in progress, skipping");
      return Ok(false);
    }

    // Release the latch on every exit path, error included.
    let result = self.update_pass().await;
    self.update_in_progress.store(false, Ordering::Release);

    result.map(|_| true)
  }

  async fn update_pass(&self) -> Result<()> {
    let watermark = self.inner().last_update;
    // Entries missing a usable createdate must never stop the scan early.
    let far_future = Utc::now().timestamp_millis() + 24 * 60 * 60 * 1000;

    let mut options = ListOptions::with_properties(REQUESTED_PROPERTIES);
    let mut new_watermark = None;
    let mut total = 0usize;

    loop {
      let page = self.source.list_recently_modified(options.clone()).await?;
      total += page.companies.len();

      // The newest entry overall is the first one of the first page that
      // carries a usable createdate.
      new_watermark = new_watermark.or_else(|| page.companies.first().and_then(Company::createdate));
      let oldest = page
        .companies
        .last()
        .and_then(Company::createdate)
        .unwrap_or(far_future);

      let mut inner = self.inner();
      for company in page.companies {
        Self::put(&mut inner, company);
      }
      drop(inner);

      options.offset = Some(page.offset);
      if !page.has_more || oldest <= watermark {
        break;
      }
    }

    if let Some(watermark) = new_watermark {
      self.inner().last_update = watermark;
    }
    debug!(
      companies = total,
      watermark = new_watermark,
      "incremental update finished"
    );
    Ok(())
  }

  /// Exact-match lookup by company name. Case-sensitive; a miss is None.
  pub fn lookup(&self, name: &str) -> Option<Company> {
    self.inner().companies.get(name).cloned()
  }

  /// All currently cached companies, cloned at the moment of the call.
  /// Iterating the returned Vec never observes later mutation.
  pub fn snapshot(&self) -> Vec<Company> {
    self.inner().companies.values().cloned().collect()
  }

  pub fn len(&self) -> usize {
    self.inner().companies.len()
  }

  pub fn is_empty(&self) -> bool {
    self.inner().companies.is_empty()
  }

  /// Current watermark: max `createdate` fully represented in the cache.
  pub fn last_update(&self) -> i64 {
    self.inner().last_update
  }
}
