use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use super::{coerce_f64, coerce_i64, coerce_opt_f64, coerce_opt_string, coerce_string};

/// One row of the stock lookup table, one per SKU.
///
/// Field names mirror the webhook payload (company-suffixed quantity
/// columns and all). The `id` is synthetic: the row's position in the
/// source array at ingestion time, not stable across re-fetches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockRow {
    pub id: usize,
    #[serde(rename = "CdChamada")]
    pub cd_chamada: String,
    #[serde(rename = "NmProduto")]
    pub nm_produto: String,
    #[serde(rename = "NmGrupoProduto")]
    pub nm_grupo_produto: String,
    #[serde(rename = "NmFamiliaProduto")]
    pub nm_familia_produto: String,
    #[serde(rename = "QtEstoque_Empresa1")]
    pub qt_estoque_empresa1: i64,
    #[serde(rename = "QtEstoque_Empresa4")]
    pub qt_estoque_empresa4: i64,
    #[serde(rename = "QtEstoque_Empresa12")]
    pub qt_estoque_empresa12: i64,
    #[serde(rename = "QtEstoque_Empresa59")]
    pub qt_estoque_empresa59: i64,
    #[serde(rename = "QtEstoque_Empresa13")]
    pub qt_estoque_empresa13: i64,
    #[serde(rename = "QtEstoque_Empresa15")]
    pub qt_estoque_empresa15: i64,
    #[serde(rename = "QtEstoque_Empresa17")]
    pub qt_estoque_empresa17: i64,
    /// Computed upstream; not re-derived here.
    #[serde(rename = "StkTotal")]
    pub stk_total: i64,
    #[serde(rename = "VlPreco_Empresa59")]
    pub vl_preco_empresa59: f64,
    #[serde(rename = "PrecoPromo")]
    pub preco_promo: Option<f64>,
    #[serde(rename = "StatusPromo")]
    pub status_promo: Option<String>,
    #[serde(rename = "PrecoDe")]
    pub preco_de: Option<f64>,
    #[serde(rename = "DataInicio")]
    pub data_inicio: Option<String>,
    #[serde(rename = "DataFim")]
    pub data_fim: Option<String>,
    #[serde(rename = "CdSigla")]
    pub cd_sigla: String,
}

impl StockRow {
    fn from_item(id: usize, item: &Value) -> Self {
        Self {
            id,
            cd_chamada: coerce_string(item.get("CdChamada")),
            nm_produto: coerce_string(item.get("NmProduto")),
            nm_grupo_produto: coerce_string(item.get("NmGrupoProduto")),
            nm_familia_produto: coerce_string(item.get("NmFamiliaProduto")),
            qt_estoque_empresa1: coerce_i64(item.get("QtEstoque_Empresa1")),
            qt_estoque_empresa4: coerce_i64(item.get("QtEstoque_Empresa4")),
            qt_estoque_empresa12: coerce_i64(item.get("QtEstoque_Empresa12")),
            qt_estoque_empresa59: coerce_i64(item.get("QtEstoque_Empresa59")),
            qt_estoque_empresa13: coerce_i64(item.get("QtEstoque_Empresa13")),
            qt_estoque_empresa15: coerce_i64(item.get("QtEstoque_Empresa15")),
            qt_estoque_empresa17: coerce_i64(item.get("QtEstoque_Empresa17")),
            stk_total: coerce_i64(item.get("StkTotal")),
            vl_preco_empresa59: coerce_f64(item.get("VlPreco_Empresa59")),
            preco_promo: coerce_opt_f64(item.get("PrecoPromo")),
            status_promo: coerce_opt_string(item.get("StatusPromo")),
            preco_de: coerce_opt_f64(item.get("PrecoDe")),
            data_inicio: coerce_opt_string(item.get("DataInicio")),
            data_fim: coerce_opt_string(item.get("DataFim")),
            cd_sigla: coerce_string(item.get("CdSigla")).trim().to_string(),
        }
    }

    /// Per-location quantities paired with the display names the dashboard
    /// uses for those company codes.
    pub fn quantidades(&self) -> [(&'static str, i64); 7] {
        [
            ("Matriz", self.qt_estoque_empresa1),
            ("CD", self.qt_estoque_empresa4),
            ("Exp BM", self.qt_estoque_empresa12),
            ("Exp WS", self.qt_estoque_empresa59),
            ("Exp Maracanau", self.qt_estoque_empresa13),
            ("Juazeiro", self.qt_estoque_empresa15),
            ("Exp Sobral", self.qt_estoque_empresa17),
        ]
    }
}

/// The normalized stock lookup snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockSnapshot {
    pub rows: Vec<StockRow>,
    /// Upstream refresh time reported by the webhook (`Atualizacao` on the
    /// first element). Authoritative over the local fetch time when present.
    #[serde(rename = "lastUpdate")]
    pub last_update: Option<String>,
}

/// Normalize the raw stock webhook payload.
///
/// A single object is treated as a one-row array. Rows that are not
/// objects are skipped, not fatal.
pub fn normalize_stock(raw: &Value) -> StockSnapshot {
    let items: Vec<&Value> = match raw {
        Value::Array(items) => items.iter().collect(),
        other => vec![other],
    };

    let mut rows = Vec::with_capacity(items.len());
    for (index, item) in items.iter().enumerate() {
        if !item.is_object() {
            warn!(index, "skipping malformed stock row");
            continue;
        }
        rows.push(StockRow::from_item(index, item));
    }

    let last_update = items
        .first()
        .and_then(|item| item.get("Atualizacao"))
        .and_then(|v| v.as_str())
        .map(String::from);

    StockSnapshot { rows, last_update }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_item() -> Value {
        json!({
            "CdChamada": "12345",
            "NmProduto": "DISJUNTOR 32A",
            "NmGrupoProduto": "DISJUNTORES",
            "NmFamiliaProduto": "PROTECAO",
            "QtEstoque_Empresa1": 10,
            "QtEstoque_Empresa4": "5",
            "QtEstoque_Empresa59": 0,
            "StkTotal": 15,
            "VlPreco_Empresa59": 89.9,
            "PrecoPromo": null,
            "StatusPromo": "",
            "CdSigla": " SV ",
            "Atualizacao": "2025-11-03T06:00:00"
        })
    }

    #[test]
    fn test_normalize_assigns_sequential_ids() {
        let snapshot = normalize_stock(&json!([sample_item(), sample_item(), sample_item()]));
        let ids: Vec<_> = snapshot.rows.iter().map(|r| r.id).collect();
        assert_eq!(ids, [0, 1, 2]);
    }

    #[test]
    fn test_normalize_coerces_fields() {
        let snapshot = normalize_stock(&json!([sample_item()]));
        let row = &snapshot.rows[0];
        assert_eq!(row.cd_chamada, "12345");
        assert_eq!(row.qt_estoque_empresa1, 10);
        assert_eq!(row.qt_estoque_empresa4, 5);
        // Missing quantity columns default to zero
        assert_eq!(row.qt_estoque_empresa12, 0);
        assert_eq!(row.vl_preco_empresa59, 89.9);
        assert_eq!(row.preco_promo, None);
        // Empty status means no promotion
        assert_eq!(row.status_promo, None);
        assert_eq!(row.cd_sigla, "SV");
    }

    #[test]
    fn test_normalize_single_object_payload() {
        let snapshot = normalize_stock(&sample_item());
        assert_eq!(snapshot.rows.len(), 1);
        assert_eq!(snapshot.last_update.as_deref(), Some("2025-11-03T06:00:00"));
    }

    #[test]
    fn test_normalize_skips_malformed_rows() {
        let snapshot = normalize_stock(&json!([sample_item(), "garbage", 42, sample_item()]));
        assert_eq!(snapshot.rows.len(), 2);
        // Ids keep the source array positions
        assert_eq!(snapshot.rows[1].id, 3);
    }

    #[test]
    fn test_last_update_comes_from_first_element() {
        let mut second = sample_item();
        second["Atualizacao"] = json!("2025-11-04T06:00:00");
        let snapshot = normalize_stock(&json!([sample_item(), second]));
        assert_eq!(snapshot.last_update.as_deref(), Some("2025-11-03T06:00:00"));

        let no_update = normalize_stock(&json!([{ "CdChamada": "1" }]));
        assert_eq!(no_update.last_update, None);
    }

    #[test]
    fn test_snapshot_serde_roundtrip() {
        let snapshot = normalize_stock(&json!([sample_item()]));
        let raw = serde_json::to_string(&snapshot).unwrap();
        let back: StockSnapshot = serde_json::from_str(&raw).unwrap();
        assert_eq!(back, snapshot);
    }

    #[test]
    fn test_quantidades_order_matches_display_columns() {
        let snapshot = normalize_stock(&json!([sample_item()]));
        let quantidades = snapshot.rows[0].quantidades();
        assert_eq!(quantidades[0], ("Matriz", 10));
        assert_eq!(quantidades[3], ("Exp WS", 0));
        assert_eq!(quantidades[6].0, "Exp Sobral");
    }
}
