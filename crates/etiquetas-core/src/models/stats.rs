use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use super::coerce_u64;

/// Labeling statistics for one branch, as served by the per-branch
/// dashboard webhook.
///
/// Every field is required in the cached form: an entry cached before a
/// field existed fails to deserialize and counts as a cache miss, which is
/// what invalidates caches across schema migrations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchStats {
    #[serde(rename = "totalEstoque")]
    pub total_estoque: u64,
    #[serde(rename = "produtosEtiquetados")]
    pub produtos_etiquetados: u64,
    #[serde(rename = "produtosSemEtiqueta")]
    pub produtos_sem_etiqueta: u64,
    #[serde(rename = "produtosMultiplasEtiquetas")]
    pub produtos_multiplas_etiquetas: u64,
    #[serde(rename = "etiquetasDuplicadas")]
    pub etiquetas_duplicadas: u64,
    #[serde(rename = "emStkSemEtiq")]
    pub em_stk_sem_etiq: u64,
    #[serde(rename = "bindSemStk")]
    pub bind_sem_stk: u64,
    #[serde(rename = "skuetiquetados")]
    pub sku_etiquetados: u64,
}

impl BranchStats {
    /// Normalize the raw webhook payload. Total coercion: missing or
    /// non-numeric fields become zero, the payload is never rejected.
    pub fn from_payload(raw: &Value) -> Self {
        let stats = Self {
            total_estoque: coerce_u64(raw.get("totalEstoque")),
            produtos_etiquetados: coerce_u64(raw.get("produtosEtiquetados")),
            produtos_sem_etiqueta: coerce_u64(raw.get("produtosSemEtiqueta")),
            produtos_multiplas_etiquetas: coerce_u64(raw.get("produtosMultiplasEtiquetas")),
            etiquetas_duplicadas: coerce_u64(raw.get("etiquetasDuplicadas")),
            em_stk_sem_etiq: coerce_u64(raw.get("emStkSemEtiq")),
            bind_sem_stk: coerce_u64(raw.get("bindSemStk")),
            sku_etiquetados: coerce_u64(raw.get("skuetiquetados")),
        };
        if stats.produtos_multiplas_etiquetas > stats.produtos_etiquetados {
            // Upstream is the system of record; keep the values but flag
            // them. Derived counts clamp instead of going negative.
            warn!(
                produtos_etiquetados = stats.produtos_etiquetados,
                produtos_multiplas_etiquetas = stats.produtos_multiplas_etiquetas,
                "payload reports more multi-label products than labeled products"
            );
        }
        stats
    }

    /// Products in stock still waiting for a label.
    pub fn pendentes(&self) -> u64 {
        self.total_estoque.saturating_sub(self.produtos_etiquetados)
    }

    /// Labels in use minus duplicates: the "Etiquetados" bar.
    pub fn etiquetados_unicos(&self) -> u64 {
        self.produtos_etiquetados.saturating_sub(self.etiquetas_duplicadas)
    }

    /// Share of labeled SKUs net of multi-label products, in percent.
    pub fn percentual_etiquetados(&self) -> f64 {
        if self.sku_etiquetados == 0 {
            return 0.0;
        }
        let unicos = self
            .produtos_etiquetados
            .saturating_sub(self.produtos_multiplas_etiquetas);
        unicos as f64 / self.sku_etiquetados as f64 * 100.0
    }

    /// Some count expressed as a share of the total stock, in percent.
    pub fn percentual_do_total(&self, value: u64) -> f64 {
        if self.total_estoque == 0 {
            return 0.0;
        }
        value as f64 / self.total_estoque as f64 * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_empty_payload_coerces_to_all_zeros() {
        let stats = BranchStats::from_payload(&json!({}));
        assert_eq!(stats.total_estoque, 0);
        assert_eq!(stats.produtos_etiquetados, 0);
        assert_eq!(stats.produtos_sem_etiqueta, 0);
        assert_eq!(stats.produtos_multiplas_etiquetas, 0);
        assert_eq!(stats.etiquetas_duplicadas, 0);
        assert_eq!(stats.em_stk_sem_etiq, 0);
        assert_eq!(stats.bind_sem_stk, 0);
        assert_eq!(stats.sku_etiquetados, 0);
    }

    #[test]
    fn test_string_numbers_are_coerced() {
        // The late-added fields arrive as strings from the n8n flow
        let stats = BranchStats::from_payload(&json!({
            "totalEstoque": 1500,
            "produtosEtiquetados": 1200,
            "emStkSemEtiq": "300",
            "bindSemStk": "12",
            "skuetiquetados": "1188"
        }));
        assert_eq!(stats.em_stk_sem_etiq, 300);
        assert_eq!(stats.bind_sem_stk, 12);
        assert_eq!(stats.sku_etiquetados, 1188);
        assert_eq!(stats.produtos_sem_etiqueta, 0);
    }

    #[test]
    fn test_pendentes() {
        let stats = BranchStats::from_payload(&json!({
            "totalEstoque": 100,
            "produtosEtiquetados": 80
        }));
        assert_eq!(stats.pendentes(), 20);
    }

    #[test]
    fn test_pendentes_clamps_instead_of_underflowing() {
        let stats = BranchStats::from_payload(&json!({
            "totalEstoque": 50,
            "produtosEtiquetados": 80
        }));
        assert_eq!(stats.pendentes(), 0);
    }

    #[test]
    fn test_percentual_clamps_on_invariant_violation() {
        // More multi-label products than labeled products: the derived
        // percentage must not go negative.
        let stats = BranchStats::from_payload(&json!({
            "produtosEtiquetados": 10,
            "produtosMultiplasEtiquetas": 15,
            "skuetiquetados": 100
        }));
        assert_eq!(stats.percentual_etiquetados(), 0.0);
    }

    #[test]
    fn test_percentual_do_total_handles_zero_total() {
        let stats = BranchStats::from_payload(&json!({}));
        assert_eq!(stats.percentual_do_total(10), 0.0);
    }

    #[test]
    fn test_idempotent_normalization() {
        let payload = json!({
            "totalEstoque": 100,
            "produtosEtiquetados": 80,
            "produtosSemEtiqueta": 20,
            "produtosMultiplasEtiquetas": 5,
            "etiquetasDuplicadas": 6,
            "emStkSemEtiq": 20,
            "bindSemStk": 3,
            "skuetiquetados": 75
        });
        assert_eq!(
            BranchStats::from_payload(&payload),
            BranchStats::from_payload(&payload)
        );
    }

    #[test]
    fn test_cached_form_requires_all_fields() {
        // Old deployments cached fewer fields; those entries must fail to
        // deserialize so they read as cache misses.
        let old = json!({
            "totalEstoque": 10,
            "produtosEtiquetados": 8,
            "produtosSemEtiqueta": 2,
            "produtosMultiplasEtiquetas": 0,
            "etiquetasDuplicadas": 0
        });
        assert!(serde_json::from_value::<BranchStats>(old).is_err());
    }

    #[test]
    fn test_serde_roundtrip_keeps_wire_names() {
        let stats = BranchStats::from_payload(&json!({ "totalEstoque": 7 }));
        let value = serde_json::to_value(&stats).unwrap();
        assert_eq!(value["totalEstoque"], 7);
        assert_eq!(value["skuetiquetados"], 0);
        let back: BranchStats = serde_json::from_value(value).unwrap();
        assert_eq!(back, stats);
    }
}
