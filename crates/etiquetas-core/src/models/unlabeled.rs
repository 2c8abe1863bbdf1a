use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use super::{coerce_i64, coerce_string};

/// One in-stock SKU lacking a label, scoped to a single branch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnlabeledItem {
    pub codigo: String,
    pub nome: String,
    pub estoque: i64,
}

/// Normalize the unlabeled-items webhook payload (an array of
/// `{ codigo, nome, estoque }`). Non-object entries are skipped.
pub fn normalize_unlabeled(raw: &Value) -> Vec<UnlabeledItem> {
    let items = match raw.as_array() {
        Some(items) => items,
        None => {
            warn!("unlabeled payload is not an array, treating as empty");
            return Vec::new();
        }
    };

    items
        .iter()
        .enumerate()
        .filter_map(|(index, item)| {
            if !item.is_object() {
                warn!(index, "skipping malformed unlabeled item");
                return None;
            }
            Some(UnlabeledItem {
                codigo: coerce_string(item.get("codigo")),
                nome: coerce_string(item.get("nome")),
                estoque: coerce_i64(item.get("estoque")),
            })
        })
        .collect()
}
