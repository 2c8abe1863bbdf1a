//! etiquetas-core: the data layer behind the SV labeling dashboards.
//!
//! The dashboards are thin views over this crate. It fetches JSON from the
//! n8n webhooks, caches payloads in a persistent key-value store with
//! per-source expiry, reconciles cache vs. network on mount, and drives a
//! synthetic progress animation decoupled from actual request completion.
//!
//! Main pieces:
//!
//! - [`branch`]: the static table of the three store branches
//! - [`store`]: the injected key-value storage capability
//! - [`cache`]: `CachedData` envelopes and the freshness policy
//! - [`models`]: typed records with total-coercion normalization
//! - [`fetch`]: webhook client and the cache-backed fetch coordinator
//! - [`progress`]: the synthetic progress state machine
//! - [`export`]: spreadsheet export of the in-memory row sets

pub mod branch;
pub mod cache;
pub mod config;
pub mod export;
pub mod fetch;
pub mod models;
pub mod progress;
pub mod store;
pub mod utils;

pub use branch::{Branch, FILIAIS};
pub use cache::{CacheManager, CachedData};
pub use config::Config;
pub use fetch::{Coordinator, Fetch, FetchError, LoadState, RefreshOutcome, WebhookClient};
pub use models::{BranchStats, StockRow, StockSnapshot, UnlabeledItem};
pub use progress::Progress;
pub use store::{DiskStore, MemoryStore, Store};
