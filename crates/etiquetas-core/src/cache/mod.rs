//! Local caching module for offline-first rendering.
//!
//! Every data source keeps one entry in the persistent store: the typed
//! payload plus the fetch timestamp and duration. Entries are created or
//! overwritten on every successful fetch, read on mount, and only removed
//! by the explicit "clear cache" action.
//!
//! Freshness is policy per source: the stock lookup expires after 30
//! minutes, unlabeled items after 1 hour, and branch stats accept any
//! cached entry (an explicit refresh exists instead).

pub mod manager;

pub use manager::{is_fresh, stats_key, stock_key, unlabeled_key, CacheManager, CachedData};
