//! In-memory company cache with incremental refresh.
//!
//! This module is CRM-agnostic: it talks to the remote API only through
//! the `RemoteSource` trait and provides:
//! - A memoized one-time full load of the complete company listing
//! - Incremental refresh from a newest-first recently-modified feed,
//!   bounded by a `createdate` watermark
//! - Exact-match lookup by company name and snapshot iteration
//! - An owned, cancelable periodic-refresh task

mod company;
mod refresh;
pub mod source;

pub use company::CompanyCache;
pub use refresh::RefreshHandle;
pub use source::RemoteSource;
