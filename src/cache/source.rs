//! The remote-source seam the cache fetches through.

use color_eyre::Result;
use std::future::Future;

use crate::crm::types::{CompanyPage, ListOptions};

/// A paginated source of company records.
///
/// The cache only ever talks to the remote API through this trait, so tests
/// can script pages and the HTTP client stays a thin collaborator. Both
/// operations return one page per call; the caller threads `offset` from
/// each page into the next request while `has_more` is set.
pub trait RemoteSource: Send + Sync {
  /// One page of the complete company listing, in no particular order.
  fn list_all(&self, options: ListOptions) -> impl Future<Output = Result<CompanyPage>> + Send;

  /// One page of the recently-modified feed. Companies are ordered
  /// strictly newest-`createdate`-first across the whole feed.
  fn list_recently_modified(
    &self,
    options: ListOptions,
  ) -> impl Future<Output = Result<CompanyPage>> + Send;
}

/// Borrowed and shared sources work anywhere a source does, e.g. when one
/// client is handed to both a cache and other tasks.
impl<S: RemoteSource> RemoteSource for &S {
  async fn list_all(&self, options: ListOptions) -> Result<CompanyPage> {
    (**self).list_all(options).await
  }

  async fn list_recently_modified(&self, options: ListOptions) -> Result<CompanyPage> {
    (**self).list_recently_modified(options).await
  }
}

impl<S: RemoteSource> RemoteSource for std::sync::Arc<S> {
  async fn list_all(&self, options: ListOptions) -> Result<CompanyPage> {
    self.as_ref().list_all(options).await
  }

  async fn list_recently_modified(&self, options: ListOptions) -> Result<CompanyPage> {
    self.as_ref().list_recently_modified(options).await
  }
}
