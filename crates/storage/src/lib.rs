pub mod categories;
pub mod db;
pub mod ledgers;

use thiserror::Error;
use unicode_normalization::UnicodeNormalization;

pub use categories::{categories_for_class, default_category, insert_category};
pub use db::{create_db, DbPool};
pub use ledgers::{
    balance_sheet_for, billing_rows_for, billing_row_count, claim_row_count,
    clear_approval_flags, freeze_period, is_frozen, passbook_needing_approval,
    passbook_row_count, passbook_rows_for, payment_row_count, report_income_by_himoku,
    report_row_count, sum_passbook, sum_payments, sum_report, upsert_balance_sheet,
    upsert_billing_rows, upsert_claim_rows, upsert_passbook_rows, upsert_payment_rows,
    upsert_report_rows, ApprovalRow,
};

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("database error: {0}")]
    Db(#[from] sqlx::Error),
    #[error("corrupt row: {0}")]
    Corrupt(String),
}

/// Normalizes the free-text component of a natural key: NFKC (full-width
/// and half-width forms collide routinely in portal exports) plus
/// whitespace collapse. Applied uniformly to every import type so that
/// re-pasted near-duplicates land on the same key.
pub fn normalize_key(s: &str) -> String {
    let folded: String = s.nfkc().collect();
    folded.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Outcome of a batch upsert: per-row failures are collected, never
/// aborting sibling rows. Successfully-written rows stay committed.
#[derive(Debug)]
pub struct BatchResult<T> {
    pub succeeded: Vec<T>,
    pub failed: Vec<(T, String)>,
}

impl<T> BatchResult<T> {
    pub fn new() -> Self {
        BatchResult { succeeded: Vec::new(), failed: Vec::new() }
    }

    pub fn is_ok(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn error_messages(&self) -> Vec<String> {
        self.failed.iter().map(|(_, message)| message.clone()).collect()
    }
}

impl<T> Default for BatchResult<T> {
    fn default() -> Self {
        Self::new()
    }
}
