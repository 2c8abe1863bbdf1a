//! Webhook fetch layer.
//!
//! [`WebhookClient`] performs the HTTP GETs; [`DataSource`] describes one
//! page's endpoint, cache key and freshness policy; [`Coordinator`] ties a
//! source, the cache and the fetch capability into the per-page state
//! machine the views consume.

pub mod client;
pub mod coordinator;
pub mod error;
pub mod source;

pub use client::{Fetch, WebhookClient};
pub use coordinator::{Coordinator, LoadState, RefreshOutcome};
pub use error::FetchError;
pub use source::{DataSource, StatsSource, StockSource, UnlabeledSource};
