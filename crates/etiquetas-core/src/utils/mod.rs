//! Utility functions for pt-BR display formatting.

pub mod format;

// Re-export commonly used functions at module level
pub use format::{
    format_brl, format_date_br, format_datetime_br, format_opt_brl, group_thousands, truncate,
};
