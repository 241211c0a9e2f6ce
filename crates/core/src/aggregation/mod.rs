//! Multi-currency aggregation of account and card balances.
//!
//! # Modules
//!
//! - `types` - Collection items, field layout, totals
//! - `engine` - Conversion and summation
//! - `format` - Space-grouped rendering

pub mod engine;
pub mod format;
pub mod types;

#[cfg(test)]
mod props;

pub use engine::{AggregationEngine, compute_totals};
pub use format::{format_grouped, format_plain};
pub use types::{
    AggregateTotal, AggregationWarning, FieldValue, FinancialItem, ItemKind, RenderMode, SumSpec,
    Totals, TotalsLayout, TotalsView,
};
