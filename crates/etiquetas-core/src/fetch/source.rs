use chrono::Duration;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

use crate::branch::Branch;
use crate::cache::{stats_key, stock_key, unlabeled_key};
use crate::models::{normalize_stock, normalize_unlabeled, BranchStats, StockSnapshot, UnlabeledItem};

// Freshness is configuration, not logic: each source carries its own
// policy and the coordinator never special-cases any of them.

/// Stock lookup entries expire after 30 minutes.
pub const STOCK_MAX_AGE_MINUTES: i64 = 30;

/// Unlabeled item lists expire after 1 hour.
pub const UNLABELED_MAX_AGE_MINUTES: i64 = 60;

/// Branch stats accept any cached entry, but the explicit refresh is
/// allowed at most once per 5 minutes.
pub const FORCE_REFRESH_COOLDOWN_MINUTES: i64 = 5;

/// One page's data source: where it fetches from, where it caches, how
/// long a cached entry stays fresh, and how the raw payload becomes the
/// typed record.
pub trait DataSource: Send + Sync + 'static {
    type Payload: Clone + Serialize + DeserializeOwned + Send + 'static;

    fn cache_key(&self) -> String;

    fn url(&self) -> String;

    /// `None` means any cached entry is acceptable.
    fn max_age(&self) -> Option<Duration>;

    /// Minimum wall-clock time between explicit refreshes, if throttled.
    fn force_cooldown(&self) -> Option<Duration> {
        None
    }

    /// Total normalization: never fails, coerces missing fields to
    /// defaults.
    fn normalize(&self, raw: &Value) -> Self::Payload;
}

/// Per-branch labeling statistics (the dashboard cards and chart).
pub struct StatsSource {
    branch: &'static Branch,
    base: String,
}

impl StatsSource {
    pub fn new(branch: &'static Branch, base: impl Into<String>) -> Self {
        Self {
            branch,
            base: base.into(),
        }
    }
}

impl DataSource for StatsSource {
    type Payload = BranchStats;

    fn cache_key(&self) -> String {
        stats_key(self.branch.id)
    }

    fn url(&self) -> String {
        self.branch.stats_url(&self.base)
    }

    fn max_age(&self) -> Option<Duration> {
        None
    }

    fn force_cooldown(&self) -> Option<Duration> {
        Some(Duration::minutes(FORCE_REFRESH_COOLDOWN_MINUTES))
    }

    fn normalize(&self, raw: &Value) -> Self::Payload {
        BranchStats::from_payload(raw)
    }
}

/// The shared stock lookup table (all branches in one payload).
pub struct StockSource {
    base: String,
}

impl StockSource {
    pub fn new(base: impl Into<String>) -> Self {
        Self { base: base.into() }
    }
}

impl DataSource for StockSource {
    type Payload = StockSnapshot;

    fn cache_key(&self) -> String {
        stock_key()
    }

    fn url(&self) -> String {
        format!("{}/consultaestoque", self.base.trim_end_matches('/'))
    }

    fn max_age(&self) -> Option<Duration> {
        Some(Duration::minutes(STOCK_MAX_AGE_MINUTES))
    }

    fn normalize(&self, raw: &Value) -> Self::Payload {
        normalize_stock(raw)
    }
}

/// Per-branch list of in-stock SKUs without a label.
pub struct UnlabeledSource {
    branch: &'static Branch,
    base: String,
}

impl UnlabeledSource {
    pub fn new(branch: &'static Branch, base: impl Into<String>) -> Self {
        Self {
            branch,
            base: base.into(),
        }
    }
}

impl DataSource for UnlabeledSource {
    type Payload = Vec<UnlabeledItem>;

    fn cache_key(&self) -> String {
        unlabeled_key(self.branch.id)
    }

    fn url(&self) -> String {
        self.branch.unlabeled_url(&self.base)
    }

    fn max_age(&self) -> Option<Duration> {
        Some(Duration::minutes(UNLABELED_MAX_AGE_MINUTES))
    }

    fn normalize(&self, raw: &Value) -> Self::Payload {
        normalize_unlabeled(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "https://n8n.sveletrica.com/webhook";

    #[test]
    fn test_stats_source_policy() {
        let filial = Branch::by_id("sobral").unwrap();
        let source = StatsSource::new(filial, BASE);
        assert_eq!(source.cache_key(), "dashboard_etiquetas_sobral");
        assert_eq!(source.url(), format!("{}/dashboard-etiquetas-sobral", BASE));
        assert_eq!(source.max_age(), None);
        assert_eq!(source.force_cooldown(), Some(Duration::minutes(5)));
    }

    #[test]
    fn test_stock_source_policy() {
        let source = StockSource::new(BASE);
        assert_eq!(source.cache_key(), "consulta_estoque");
        assert_eq!(source.url(), format!("{}/consultaestoque", BASE));
        assert_eq!(source.max_age(), Some(Duration::minutes(30)));
        assert_eq!(source.force_cooldown(), None);
    }

    #[test]
    fn test_unlabeled_source_policy() {
        let filial = Branch::by_id("caucaia").unwrap();
        let source = UnlabeledSource::new(filial, BASE);
        assert_eq!(source.cache_key(), "itens_sem_etiqueta_caucaia");
        assert_eq!(source.url(), format!("{}/items-sem-etiqueta/caucaia", BASE));
        assert_eq!(source.max_age(), Some(Duration::minutes(60)));
    }
}
