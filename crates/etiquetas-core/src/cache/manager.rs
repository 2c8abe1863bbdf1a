use chrono::{DateTime, Duration, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::debug;

use crate::store::{Store, StoreError};

/// A cached fetch result plus the metadata that makes offline-first
/// rendering possible.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedData<T> {
    pub data: T,
    pub cached_at: DateTime<Utc>,
    /// How long the original fetch took, in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_secs: Option<f64>,
}

impl<T> CachedData<T> {
    pub fn new(data: T, duration_secs: Option<f64>) -> Self {
        Self {
            data,
            cached_at: Utc::now(),
            duration_secs,
        }
    }

    pub fn age_minutes(&self) -> i64 {
        (Utc::now() - self.cached_at).num_minutes()
    }

    pub fn age_display(&self) -> String {
        let minutes = self.age_minutes();
        if minutes < 1 {
            // Also covers clock skew (negative age)
            "agora mesmo".to_string()
        } else if minutes < 60 {
            format!("{}min atrás", minutes)
        } else if minutes < 1440 {
            let hours = minutes / 60;
            let remaining_mins = minutes % 60;
            if remaining_mins >= 30 {
                format!("{}h atrás", hours + 1)
            } else {
                format!("{}h atrás", hours)
            }
        } else {
            let days = minutes / 1440;
            let remaining_hours = (minutes % 1440) / 60;
            if remaining_hours >= 12 {
                format!("{}d atrás", days + 1)
            } else {
                format!("{}d atrás", days)
            }
        }
    }
}

/// Whether a cached entry can be used without a network call.
///
/// `None` max-age accepts any entry. An entry from the future (clock skew)
/// counts as fresh. Shape drift is handled structurally before this point:
/// cached payloads deserialize into types whose fields are all required,
/// so an entry written by an older deployment fails to parse and never
/// reaches the policy.
pub fn is_fresh<T>(entry: &CachedData<T>, now: DateTime<Utc>, max_age: Option<Duration>) -> bool {
    match max_age {
        None => true,
        Some(max) => now - entry.cached_at < max,
    }
}

// ============================================================================
// Cache keys
// ============================================================================

// One key per data source, namespaced by branch id so that one branch's
// cache cannot shadow another's.

pub fn stats_key(branch_id: &str) -> String {
    format!("dashboard_etiquetas_{}", branch_id)
}

pub fn stock_key() -> String {
    "consulta_estoque".to_string()
}

pub fn unlabeled_key(branch_id: &str) -> String {
    format!("itens_sem_etiqueta_{}", branch_id)
}

// ============================================================================
// Manager
// ============================================================================

/// Typed reads and writes over the injected [`Store`].
pub struct CacheManager<S: Store> {
    store: S,
}

impl<S: Store> CacheManager<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Load one entry. Any read or parse problem is a silent miss: the
    /// caller falls through to the network.
    pub fn load<T: DeserializeOwned>(&self, key: &str) -> Option<CachedData<T>> {
        let raw = self.store.get(key)?;
        match serde_json::from_str(&raw) {
            Ok(cached) => Some(cached),
            Err(e) => {
                debug!(key, error = %e, "discarding unreadable cache entry");
                None
            }
        }
    }

    /// Write one entry, stamping it with the current time. On failure the
    /// offending key is removed (best effort) so a truncated value never
    /// shadows the next read; other keys are untouched.
    pub fn save<T: Serialize>(
        &self,
        key: &str,
        data: &T,
        duration_secs: Option<f64>,
    ) -> Result<(), StoreError> {
        let entry = CachedData::new(data, duration_secs);
        let raw = serde_json::to_string(&entry)
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        if let Err(e) = self.store.set(key, &raw) {
            self.store.remove(key);
            return Err(e);
        }
        Ok(())
    }

    pub fn remove(&self, key: &str) {
        self.store.remove(key);
    }

    /// Drop every cached entry. The next mount behaves as a cold start.
    pub fn clear(&self) {
        self.store.clear();
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::BranchStats;
    use crate::store::MemoryStore;
    use serde_json::json;

    fn stats() -> BranchStats {
        BranchStats::from_payload(&json!({
            "totalEstoque": 100,
            "produtosEtiquetados": 80,
            "produtosSemEtiqueta": 20,
            "produtosMultiplasEtiquetas": 5,
            "etiquetasDuplicadas": 6,
            "emStkSemEtiq": 20,
            "bindSemStk": 3,
            "skuetiquetados": 75
        }))
    }

    #[test]
    fn test_is_fresh_within_max_age() {
        let now = Utc::now();
        let mut entry = CachedData::new(1u32, None);
        entry.cached_at = now - Duration::minutes(10);
        assert!(is_fresh(&entry, now, Some(Duration::minutes(30))));
    }

    #[test]
    fn test_is_fresh_at_and_past_max_age() {
        let now = Utc::now();
        let mut entry = CachedData::new(1u32, None);
        entry.cached_at = now - Duration::minutes(30);
        assert!(!is_fresh(&entry, now, Some(Duration::minutes(30))));
        entry.cached_at = now - Duration::minutes(40);
        assert!(!is_fresh(&entry, now, Some(Duration::minutes(30))));
    }

    #[test]
    fn test_is_fresh_without_max_age_accepts_anything() {
        let now = Utc::now();
        let mut entry = CachedData::new(1u32, None);
        entry.cached_at = now - Duration::days(400);
        assert!(is_fresh(&entry, now, None));
    }

    #[test]
    fn test_is_fresh_tolerates_clock_skew() {
        let now = Utc::now();
        let mut entry = CachedData::new(1u32, None);
        entry.cached_at = now + Duration::minutes(5);
        assert!(is_fresh(&entry, now, Some(Duration::minutes(30))));
    }

    #[test]
    fn test_save_then_load_roundtrip() {
        let manager = CacheManager::new(MemoryStore::new());
        manager.save("dashboard_etiquetas_sobral", &stats(), Some(12.3)).unwrap();

        let loaded: CachedData<BranchStats> =
            manager.load("dashboard_etiquetas_sobral").unwrap();
        assert_eq!(loaded.data, stats());
        assert_eq!(loaded.duration_secs, Some(12.3));
        assert!(loaded.age_minutes() <= 1);
    }

    #[test]
    fn test_corrupt_entry_is_a_miss() {
        let store = MemoryStore::new();
        store.set("dashboard_etiquetas_sobral", "{not json").unwrap();
        let manager = CacheManager::new(store);
        assert!(manager.load::<BranchStats>("dashboard_etiquetas_sobral").is_none());
    }

    #[test]
    fn test_shape_drift_is_a_miss() {
        // Entry written before skuetiquetados existed: the field is
        // required, so the whole entry reads as absent.
        let store = MemoryStore::new();
        let old = json!({
            "data": {
                "totalEstoque": 10,
                "produtosEtiquetados": 8,
                "produtosSemEtiqueta": 2,
                "produtosMultiplasEtiquetas": 0,
                "etiquetasDuplicadas": 0
            },
            "cached_at": Utc::now()
        });
        store.set("dashboard_etiquetas_sobral", &old.to_string()).unwrap();
        let manager = CacheManager::new(store);
        assert!(manager.load::<BranchStats>("dashboard_etiquetas_sobral").is_none());
    }

    #[test]
    fn test_failed_save_cleans_up_its_own_key_only() {
        let store = std::sync::Arc::new(MemoryStore::new());
        let manager = CacheManager::new(store.clone());
        manager.save("consulta_estoque", &stats(), None).unwrap();
        manager.save("dashboard_etiquetas_sobral", &stats(), None).unwrap();

        store.fail_writes(true);
        assert!(manager.save("dashboard_etiquetas_sobral", &stats(), None).is_err());
        store.fail_writes(false);

        // Offending key was cleaned up, the other source is intact
        assert!(manager.load::<BranchStats>("dashboard_etiquetas_sobral").is_none());
        assert!(manager.load::<BranchStats>("consulta_estoque").is_some());
    }

    #[test]
    fn test_clear_removes_all_keys() {
        let store = std::sync::Arc::new(MemoryStore::new());
        let manager = CacheManager::new(store.clone());
        manager.save(&stats_key("sobral"), &stats(), None).unwrap();
        manager.save(&stock_key(), &stats(), None).unwrap();
        manager.save(&unlabeled_key("caucaia"), &stats(), None).unwrap();

        manager.clear();
        assert!(store.is_empty());
    }

    #[test]
    fn test_keys_are_namespaced_per_branch() {
        assert_eq!(stats_key("sobral"), "dashboard_etiquetas_sobral");
        assert_eq!(stats_key("caucaia"), "dashboard_etiquetas_caucaia");
        assert_ne!(unlabeled_key("sobral"), unlabeled_key("maracanau"));
        assert_eq!(stock_key(), "consulta_estoque");
    }

    #[test]
    fn test_age_display() {
        let entry = CachedData::new(1u32, None);
        assert_eq!(entry.age_display(), "agora mesmo");

        let mut old = CachedData::new(1u32, None);
        old.cached_at = Utc::now() - Duration::minutes(5);
        assert_eq!(old.age_display(), "5min atrás");

        old.cached_at = Utc::now() - Duration::minutes(95);
        assert_eq!(old.age_display(), "2h atrás");
    }
}
