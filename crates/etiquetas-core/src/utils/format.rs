//! pt-BR formatting: thousands with dots, decimals with commas, BRL
//! currency and dd/mm/aaaa dates.

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};

/// Display timezone. Fortaleza is UTC-3 year-round (Brazil dropped DST).
fn fortaleza_offset() -> FixedOffset {
    FixedOffset::west_opt(3 * 3600).expect("static offset")
}

/// Convert a UTC instant to the store timezone for display.
pub fn fortaleza(instant: DateTime<Utc>) -> DateTime<FixedOffset> {
    instant.with_timezone(&fortaleza_offset())
}

/// 1234567 -> "1.234.567"
pub fn group_thousands(n: i64) -> String {
    let digits = n.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push('.');
        }
        out.push(c);
    }
    if n < 0 {
        format!("-{}", out)
    } else {
        out
    }
}

/// 1234.5 -> "R$ 1.234,50"
pub fn format_brl(value: f64) -> String {
    let cents = (value.abs() * 100.0).round() as i64;
    let sign = if value < 0.0 { "-" } else { "" };
    format!("{}R$ {},{:02}", sign, group_thousands(cents / 100), cents % 100)
}

/// Absent prices render as "-" in tables and exports.
pub fn format_opt_brl(value: Option<f64>) -> String {
    value.map(format_brl).unwrap_or_else(|| "-".to_string())
}

/// ISO date or datetime -> "dd/mm/aaaa". Unparseable input comes back
/// unchanged rather than hiding the row.
pub fn format_date_br(date: &str) -> String {
    if let Ok(dt) = DateTime::parse_from_rfc3339(date) {
        return dt.format("%d/%m/%Y").to_string();
    }
    if let Some(prefix) = date.get(..10) {
        if let Ok(d) = NaiveDate::parse_from_str(prefix, "%Y-%m-%d") {
            return d.format("%d/%m/%Y").to_string();
        }
    }
    date.to_string()
}

/// "dd/mm/aaaa HH:MM:SS" in the store timezone.
pub fn format_datetime_br(instant: DateTime<Utc>) -> String {
    fortaleza(instant).format("%d/%m/%Y %H:%M:%S").to_string()
}

/// Truncate a string to a maximum number of characters, adding an
/// ellipsis if needed.
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else if max_len <= 3 {
        s.chars().take(max_len).collect()
    } else {
        let truncated: String = s.chars().take(max_len - 3).collect();
        format!("{}...", truncated)
    }
}
