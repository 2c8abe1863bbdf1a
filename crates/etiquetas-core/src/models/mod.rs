//! Typed records for the three webhook payloads.
//!
//! Each source has exactly one normalization function performing total
//! coercion: missing, null and non-numeric values collapse to a default
//! instead of failing the whole payload. The cached form of every record
//! keeps its fields required, so entries written by an older deployment
//! fail to deserialize and read as cache misses.

pub mod stats;
pub mod stock;
pub mod unlabeled;

pub use stats::BranchStats;
pub use stock::{normalize_stock, StockRow, StockSnapshot};
pub use unlabeled::{normalize_unlabeled, UnlabeledItem};

use serde_json::Value;

// ============================================================================
// Coercion helpers shared by the normalizers
// ============================================================================

/// Non-negative count. Negative and unparseable values coerce to 0.
pub(crate) fn coerce_u64(value: Option<&Value>) -> u64 {
    match value {
        Some(Value::Number(n)) => {
            if let Some(u) = n.as_u64() {
                u
            } else if let Some(f) = n.as_f64() {
                if f > 0.0 {
                    f as u64
                } else {
                    0
                }
            } else {
                0
            }
        }
        Some(Value::String(s)) => {
            let s = s.trim();
            if let Ok(u) = s.parse::<u64>() {
                u
            } else if let Ok(f) = s.parse::<f64>() {
                if f > 0.0 {
                    f as u64
                } else {
                    0
                }
            } else {
                0
            }
        }
        _ => 0,
    }
}

/// Signed quantity (ERP stock levels can go negative).
pub(crate) fn coerce_i64(value: Option<&Value>) -> i64 {
    match value {
        Some(Value::Number(n)) => {
            if let Some(i) = n.as_i64() {
                i
            } else if let Some(f) = n.as_f64() {
                f as i64
            } else {
                0
            }
        }
        Some(Value::String(s)) => {
            let s = s.trim();
            if let Ok(i) = s.parse::<i64>() {
                i
            } else if let Ok(f) = s.parse::<f64>() {
                f as i64
            } else {
                0
            }
        }
        _ => 0,
    }
}

pub(crate) fn coerce_f64(value: Option<&Value>) -> f64 {
    coerce_opt_f64(value).unwrap_or(0.0)
}

/// `None` when the field is missing, null or unparseable.
pub(crate) fn coerce_opt_f64(value: Option<&Value>) -> Option<f64> {
    match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().replace(',', ".").parse::<f64>().ok(),
        _ => None,
    }
}

/// String form of a field; numbers are rendered, everything else is "".
pub(crate) fn coerce_string(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    }
}

/// `None` for missing, null or empty strings.
pub(crate) fn coerce_opt_string(value: Option<&Value>) -> Option<String> {
    let s = coerce_string(value);
    if s.is_empty() {
        None
    } else {
        Some(s)
    }
}
