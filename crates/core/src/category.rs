use serde::{Deserialize, Serialize};
use std::fmt;

use crate::class::AccountingClass;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryId(pub i64);

impl fmt::Display for CategoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A himoku, the canonical income/expense line item every ledger row is
/// classified under. The resolver scans a class's himoku in ascending
/// `code` order, so more specific names carry lower codes than generic
/// catch-alls.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub id: Option<CategoryId>,
    pub name: String,
    /// Sort code; doubles as the resolver's scan order.
    pub code: i64,
    pub class: AccountingClass,
    pub is_income: bool,
    /// When false the himoku is excluded from cross-ledger totals
    /// (inter-account transfers and the like).
    pub aggregate_flag: bool,
    pub alive: bool,
    /// Fallback himoku for unrecognized descriptions. At most one row
    /// system-wide may carry this (enforced by a partial unique index).
    pub is_default: bool,
}

impl Category {
    pub fn new(name: &str, code: i64, class: AccountingClass, is_income: bool) -> Self {
        Category {
            id: None,
            name: name.to_string(),
            code,
            class,
            is_income,
            aggregate_flag: true,
            alive: true,
            is_default: false,
        }
    }
}
