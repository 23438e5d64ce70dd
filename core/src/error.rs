use thiserror::Error;

use crate::models::ItemId;

/// Errors raised by ledger and item operations. State is never modified
/// when one of these is returned.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LedgerError {
    #[error("Serving size must be greater than 0 (got {0}g)")]
    InvalidServingSize(i64),

    #[error("{field} must be a non-negative number (got {value})")]
    InvalidNutrient { field: &'static str, value: f64 },

    #[error("No item {0} in that meal")]
    ItemNotFound(ItemId),
}

pub type LedgerResult<T> = std::result::Result<T, LedgerError>;
